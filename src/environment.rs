// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Environment Controller: namespace-scoped access to TLS secrets and ingresses.
//!
//! The reconciler only talks to the cluster through [`EnvironmentController`], which
//! reports a missing object as [`EnvironmentError::NotFound`] and every other failure as
//! [`EnvironmentError::Api`]. [`KubeEnvironment`] is the `kube` implementation.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::api::networking::v1::Ingress;
use kube::api::{DeleteParams, PostParams};
use kube::core::NamespaceResourceScope;
use kube::{Api, Client, Resource};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use tracing::debug;

use crate::constants::APP_NAME;
use crate::errors::EnvironmentError;

/// Get, create, update and delete secrets and routing rules in one namespace.
#[async_trait]
pub trait EnvironmentController: Send + Sync {
    /// Fetch a secret by name.
    async fn get_secret(&self, name: &str) -> Result<Secret, EnvironmentError>;
    /// Create a secret.
    async fn create_secret(&self, secret: &Secret) -> Result<(), EnvironmentError>;
    /// Replace an existing secret.
    async fn update_secret(&self, secret: &Secret) -> Result<(), EnvironmentError>;
    /// Delete a secret by name.
    async fn delete_secret(&self, name: &str) -> Result<(), EnvironmentError>;

    /// Fetch a routing rule by name.
    async fn get_route(&self, name: &str) -> Result<Ingress, EnvironmentError>;
    /// Create a routing rule.
    async fn create_route(&self, route: &Ingress) -> Result<(), EnvironmentError>;
    /// Replace an existing routing rule.
    async fn update_route(&self, route: &Ingress) -> Result<(), EnvironmentError>;
    /// Delete a routing rule by name.
    async fn delete_route(&self, name: &str) -> Result<(), EnvironmentError>;
}

/// [`EnvironmentController`] backed by the Kubernetes API.
#[derive(Clone)]
pub struct KubeEnvironment {
    client: Client,
    namespace: String,
}

impl KubeEnvironment {
    /// Create a controller operating in `namespace`.
    #[must_use]
    pub fn new(client: Client, namespace: impl Into<String>) -> Self {
        Self {
            client,
            namespace: namespace.into(),
        }
    }

    /// Namespace this controller operates in.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn api<T>(&self) -> Api<T>
    where
        T: Resource<DynamicType = (), Scope = NamespaceResourceScope>,
    {
        Api::namespaced(self.client.clone(), &self.namespace)
    }

    async fn get<T>(&self, name: &str) -> Result<T, EnvironmentError>
    where
        T: Resource<DynamicType = (), Scope = NamespaceResourceScope>
            + Clone
            + Debug
            + DeserializeOwned,
    {
        debug!(namespace = %self.namespace, name = %name, kind = %T::kind(&()), "Fetching resource");
        self.api::<T>()
            .get(name)
            .await
            .map_err(|e| classify_error("get", &T::kind(&()), name, &e))
    }

    async fn create<T>(&self, resource: &T) -> Result<(), EnvironmentError>
    where
        T: Resource<DynamicType = (), Scope = NamespaceResourceScope>
            + Clone
            + Debug
            + Serialize
            + DeserializeOwned,
    {
        let name = resource_name(resource);
        let params = PostParams {
            field_manager: Some(APP_NAME.to_string()),
            ..Default::default()
        };

        self.api::<T>()
            .create(&params, resource)
            .await
            .map(|_| ())
            .map_err(|e| classify_error("create", &T::kind(&()), &name, &e))
    }

    async fn replace<T>(&self, resource: &T) -> Result<(), EnvironmentError>
    where
        T: Resource<DynamicType = (), Scope = NamespaceResourceScope>
            + Clone
            + Debug
            + Serialize
            + DeserializeOwned,
    {
        let name = resource_name(resource);
        let params = PostParams {
            field_manager: Some(APP_NAME.to_string()),
            ..Default::default()
        };

        self.api::<T>()
            .replace(&name, &params, resource)
            .await
            .map(|_| ())
            .map_err(|e| classify_error("update", &T::kind(&()), &name, &e))
    }

    async fn delete<T>(&self, name: &str) -> Result<(), EnvironmentError>
    where
        T: Resource<DynamicType = (), Scope = NamespaceResourceScope>
            + Clone
            + Debug
            + DeserializeOwned,
    {
        self.api::<T>()
            .delete(name, &DeleteParams::default())
            .await
            .map(|_| ())
            .map_err(|e| classify_error("delete", &T::kind(&()), name, &e))
    }
}

fn resource_name<T: Resource>(resource: &T) -> String {
    resource.meta().name.clone().unwrap_or_default()
}

/// Map a `kube` error onto the typed environment taxonomy.
///
/// Only an API response with HTTP 404 counts as not found.
pub(crate) fn classify_error(
    operation: &str,
    kind: &str,
    name: &str,
    err: &kube::Error,
) -> EnvironmentError {
    match err {
        kube::Error::Api(api_err) if api_err.code == 404 => EnvironmentError::NotFound {
            kind: kind.to_string(),
            name: name.to_string(),
        },
        other => EnvironmentError::Api {
            operation: operation.to_string(),
            kind: kind.to_string(),
            name: name.to_string(),
            reason: other.to_string(),
        },
    }
}

#[async_trait]
impl EnvironmentController for KubeEnvironment {
    async fn get_secret(&self, name: &str) -> Result<Secret, EnvironmentError> {
        self.get::<Secret>(name).await
    }

    async fn create_secret(&self, secret: &Secret) -> Result<(), EnvironmentError> {
        self.create(secret).await
    }

    async fn update_secret(&self, secret: &Secret) -> Result<(), EnvironmentError> {
        self.replace(secret).await
    }

    async fn delete_secret(&self, name: &str) -> Result<(), EnvironmentError> {
        self.delete::<Secret>(name).await
    }

    async fn get_route(&self, name: &str) -> Result<Ingress, EnvironmentError> {
        self.get::<Ingress>(name).await
    }

    async fn create_route(&self, route: &Ingress) -> Result<(), EnvironmentError> {
        self.create(route).await
    }

    async fn update_route(&self, route: &Ingress) -> Result<(), EnvironmentError> {
        self.replace(route).await
    }

    async fn delete_route(&self, name: &str) -> Result<(), EnvironmentError> {
        self.delete::<Ingress>(name).await
    }
}

#[cfg(test)]
#[path = "environment_tests.rs"]
mod environment_tests;
