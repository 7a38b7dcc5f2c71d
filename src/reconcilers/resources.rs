// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Desired-state builders for the resources written per vanity domain.
//!
//! Each vanity domain owns at most two objects, keyed by names derived from its
//! hostname:
//!
//! - a `kubernetes.io/tls` [`Secret`] named `{resource name}-tls-cert`, only when the
//!   caller supplied certificate material
//! - an [`Ingress`] named `{resource name}` routing the hostname to a backend service
//!
//! The builders are pure; [`merge_secret`] and [`merge_ingress`] fold a desired object
//! into the existing one so an update keeps server-owned metadata.
//!
//! # Example
//!
//! ```rust
//! use vanity_domain_manager::config::ClusterConfig;
//! use vanity_domain_manager::jobs::VanityDomain;
//! use vanity_domain_manager::reconcilers::resources::build_ingress;
//!
//! let cluster = ClusterConfig {
//!     namespace: "default".into(),
//!     service_name: "web".into(),
//!     service_port: 8080,
//!     ..Default::default()
//! };
//! let domain = VanityDomain {
//!     vanity_domain: "shop.example.com".into(),
//!     ..Default::default()
//! };
//!
//! let ingress = build_ingress(&domain, &cluster);
//! assert_eq!(ingress.metadata.name.as_deref(), Some("shop-example-com"));
//! ```

use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::api::networking::v1::{
    HTTPIngressPath, HTTPIngressRuleValue, Ingress, IngressBackend, IngressRule,
    IngressServiceBackend, IngressSpec, IngressTLS, ServiceBackendPort,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::ByteString;
use std::collections::BTreeMap;

use crate::config::ClusterConfig;
use crate::constants::{
    APP_NAME, INGRESS_PATH, INGRESS_PATH_TYPE, SECRET_KEY_CA_CERT, SECRET_KEY_TLS_CERT,
    SECRET_KEY_TLS_KEY, SECRET_TYPE_TLS,
};
use crate::jobs::{DomainCustomCert, VanityDomain};
use crate::labels::{
    CERT_MANAGER_CLUSTER_ISSUER_ANNOTATION, DOMAIN_LABEL, K8S_MANAGED_BY, K8S_PART_OF,
    PROVIDED_LABEL, PROVIDED_TRUE,
};

/// Labels shared by every object written for `domain`.
#[must_use]
pub fn build_labels(domain: &VanityDomain) -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    labels.insert(K8S_MANAGED_BY.to_string(), APP_NAME.to_string());
    labels.insert(K8S_PART_OF.to_string(), APP_NAME.to_string());
    labels.insert(DOMAIN_LABEL.to_string(), domain.vanity_domain.clone());
    labels
}

/// Build the TLS secret holding the caller-supplied key and certificate.
#[must_use]
pub fn build_tls_secret(
    domain: &VanityDomain,
    material: &DomainCustomCert,
    namespace: &str,
) -> Secret {
    let mut labels = build_labels(domain);
    labels.insert(PROVIDED_LABEL.to_string(), PROVIDED_TRUE.to_string());

    let mut data = BTreeMap::new();
    data.insert(
        SECRET_KEY_TLS_KEY.to_string(),
        ByteString(material.key.as_bytes().to_vec()),
    );
    data.insert(
        SECRET_KEY_TLS_CERT.to_string(),
        ByteString(material.cert.as_bytes().to_vec()),
    );
    data.insert(SECRET_KEY_CA_CERT.to_string(), ByteString(Vec::new()));

    Secret {
        metadata: ObjectMeta {
            name: Some(domain.tls_secret_name()),
            namespace: Some(namespace.to_string()),
            labels: Some(labels),
            ..Default::default()
        },
        type_: Some(SECRET_TYPE_TLS.to_string()),
        data: Some(data),
        ..Default::default()
    }
}

/// Build the routing rule for `domain`.
///
/// The backend is the caller's override when one was supplied, otherwise the cluster
/// default. The issuer annotation is only set when the caller supplied no certificate.
#[must_use]
pub fn build_ingress(domain: &VanityDomain, cluster: &ClusterConfig) -> Ingress {
    let (service_name, service_port) = match domain.backend_override() {
        Some((name, port)) => (name.to_string(), port.unwrap_or(cluster.service_port)),
        None => (cluster.service_name.clone(), cluster.service_port),
    };

    let annotations = match cluster.issuer() {
        Some(issuer) if !domain.has_provided_certificate() => {
            let mut annotations = BTreeMap::new();
            annotations.insert(
                CERT_MANAGER_CLUSTER_ISSUER_ANNOTATION.to_string(),
                issuer.to_string(),
            );
            Some(annotations)
        }
        _ => None,
    };

    let backend = IngressBackend {
        service: Some(IngressServiceBackend {
            name: service_name,
            port: Some(ServiceBackendPort {
                number: Some(service_port),
                ..Default::default()
            }),
        }),
        ..Default::default()
    };

    Ingress {
        metadata: ObjectMeta {
            name: Some(domain.resource_name()),
            namespace: Some(cluster.namespace.clone()),
            labels: Some(build_labels(domain)),
            annotations,
            ..Default::default()
        },
        spec: Some(IngressSpec {
            ingress_class_name: cluster
                .ingress_class_name
                .clone()
                .filter(|class| !class.is_empty()),
            rules: Some(vec![IngressRule {
                host: Some(domain.vanity_domain.clone()),
                http: Some(HTTPIngressRuleValue {
                    paths: vec![HTTPIngressPath {
                        path: Some(INGRESS_PATH.to_string()),
                        path_type: INGRESS_PATH_TYPE.to_string(),
                        backend,
                    }],
                }),
            }]),
            tls: Some(vec![IngressTLS {
                hosts: Some(vec![domain.vanity_domain.clone()]),
                secret_name: Some(domain.tls_secret_name()),
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Fold `desired` into `existing`: labels are merged, data is replaced.
///
/// The existing secret type is kept since the API rejects changing it.
#[must_use]
pub fn merge_secret(mut existing: Secret, desired: Secret) -> Secret {
    let labels = existing.metadata.labels.get_or_insert_with(BTreeMap::new);
    labels.extend(desired.metadata.labels.unwrap_or_default());

    existing.data = desired.data;
    existing.string_data = None;
    if existing.type_.is_none() {
        existing.type_ = desired.type_;
    }
    existing
}

/// Fold `desired` into `existing`: labels are merged, the spec is replaced, and the
/// issuer annotation follows the desired object.
#[must_use]
pub fn merge_ingress(mut existing: Ingress, desired: Ingress) -> Ingress {
    let labels = existing.metadata.labels.get_or_insert_with(BTreeMap::new);
    labels.extend(desired.metadata.labels.unwrap_or_default());

    let mut annotations = existing.metadata.annotations.take().unwrap_or_default();
    annotations.remove(CERT_MANAGER_CLUSTER_ISSUER_ANNOTATION);
    annotations.extend(desired.metadata.annotations.unwrap_or_default());
    existing.metadata.annotations = (!annotations.is_empty()).then_some(annotations);

    existing.spec = desired.spec;
    existing
}

#[cfg(test)]
#[path = "resources_tests.rs"]
mod resources_tests;
