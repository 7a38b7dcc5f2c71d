// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! In-memory fakes for the trait seams, shared by unit tests.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::api::networking::v1::Ingress;
use rustls::pki_types::CertificateDer;
use std::collections::{BTreeMap, HashMap};
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use crate::environment::EnvironmentController;
use crate::errors::{EnvironmentError, QueueError, VerificationError};
use crate::jobs::JobStatus;
use crate::queue::{Delivery, MessagePublisher};
use crate::verifiers::{ChainVerifier, NameResolver};

// ============================================================================
// Resolver
// ============================================================================

/// Resolver answering from fixed tables. Unknown names fail the lookup.
#[derive(Default)]
pub struct FakeResolver {
    cnames: HashMap<String, String>,
    addresses: HashMap<String, Vec<IpAddr>>,
    lookups: AtomicUsize,
}

impl FakeResolver {
    pub fn with_cname(mut self, hostname: &str, cname: &str) -> Self {
        self.cnames.insert(hostname.to_string(), cname.to_string());
        self
    }

    pub fn with_addresses(mut self, hostname: &str, addresses: Vec<IpAddr>) -> Self {
        self.addresses.insert(hostname.to_string(), addresses);
        self
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NameResolver for FakeResolver {
    async fn lookup_cname(&self, hostname: &str) -> Result<String, VerificationError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.cnames
            .get(hostname)
            .cloned()
            .ok_or_else(|| VerificationError::DnsLookupFailed {
                hostname: hostname.to_string(),
                reason: "no record found".to_string(),
            })
    }

    async fn lookup_ip(&self, hostname: &str) -> Result<Vec<IpAddr>, VerificationError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.addresses
            .get(hostname)
            .cloned()
            .ok_or_else(|| VerificationError::DnsLookupFailed {
                hostname: hostname.to_string(),
                reason: "no record found".to_string(),
            })
    }
}

// ============================================================================
// Chain verifier
// ============================================================================

/// Chain verifier returning a fixed result.
pub struct FakeVerifier {
    result: Result<(), VerificationError>,
    calls: AtomicUsize,
}

impl FakeVerifier {
    pub fn accepting() -> Self {
        Self {
            result: Ok(()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn rejecting(error: VerificationError) -> Self {
        Self {
            result: Err(error),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ChainVerifier for FakeVerifier {
    fn verify(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _hostname: &str,
        _now: SystemTime,
    ) -> Result<(), VerificationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}

// ============================================================================
// Environment controller
// ============================================================================

/// Environment controller keeping objects in memory and recording every call as
/// `"{operation} {name}"`.
#[derive(Default)]
pub struct InMemoryEnvironment {
    secrets: Mutex<BTreeMap<String, Secret>>,
    routes: Mutex<BTreeMap<String, Ingress>>,
    calls: Mutex<Vec<String>>,
    failures: Mutex<HashMap<String, EnvironmentError>>,
}

impl InMemoryEnvironment {
    /// Fail every call to `operation` (e.g., `get_secret`) with `error`.
    pub fn fail(&self, operation: &str, error: EnvironmentError) {
        self.failures
            .lock()
            .unwrap()
            .insert(operation.to_string(), error);
    }

    pub fn insert_secret(&self, secret: Secret) {
        let name = secret.metadata.name.clone().unwrap_or_default();
        self.secrets.lock().unwrap().insert(name, secret);
    }

    pub fn insert_route(&self, route: Ingress) {
        let name = route.metadata.name.clone().unwrap_or_default();
        self.routes.lock().unwrap().insert(name, route);
    }

    pub fn secret(&self, name: &str) -> Option<Secret> {
        self.secrets.lock().unwrap().get(name).cloned()
    }

    pub fn route(&self, name: &str) -> Option<Ingress> {
        self.routes.lock().unwrap().get(name).cloned()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls other than reads.
    pub fn writes(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|call| !call.starts_with("get_"))
            .collect()
    }

    fn record(&self, operation: &str, name: &str) -> Result<(), EnvironmentError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{operation} {name}"));
        match self.failures.lock().unwrap().get(operation) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

fn not_found(kind: &str, name: &str) -> EnvironmentError {
    EnvironmentError::NotFound {
        kind: kind.to_string(),
        name: name.to_string(),
    }
}

#[async_trait]
impl EnvironmentController for InMemoryEnvironment {
    async fn get_secret(&self, name: &str) -> Result<Secret, EnvironmentError> {
        self.record("get_secret", name)?;
        self.secret(name).ok_or_else(|| not_found("Secret", name))
    }

    async fn create_secret(&self, secret: &Secret) -> Result<(), EnvironmentError> {
        let name = secret.metadata.name.clone().unwrap_or_default();
        self.record("create_secret", &name)?;
        self.insert_secret(secret.clone());
        Ok(())
    }

    async fn update_secret(&self, secret: &Secret) -> Result<(), EnvironmentError> {
        let name = secret.metadata.name.clone().unwrap_or_default();
        self.record("update_secret", &name)?;
        self.insert_secret(secret.clone());
        Ok(())
    }

    async fn delete_secret(&self, name: &str) -> Result<(), EnvironmentError> {
        self.record("delete_secret", name)?;
        self.secrets
            .lock()
            .unwrap()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| not_found("Secret", name))
    }

    async fn get_route(&self, name: &str) -> Result<Ingress, EnvironmentError> {
        self.record("get_route", name)?;
        self.route(name).ok_or_else(|| not_found("Ingress", name))
    }

    async fn create_route(&self, route: &Ingress) -> Result<(), EnvironmentError> {
        let name = route.metadata.name.clone().unwrap_or_default();
        self.record("create_route", &name)?;
        self.insert_route(route.clone());
        Ok(())
    }

    async fn update_route(&self, route: &Ingress) -> Result<(), EnvironmentError> {
        let name = route.metadata.name.clone().unwrap_or_default();
        self.record("update_route", &name)?;
        self.insert_route(route.clone());
        Ok(())
    }

    async fn delete_route(&self, name: &str) -> Result<(), EnvironmentError> {
        self.record("delete_route", name)?;
        self.routes
            .lock()
            .unwrap()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| not_found("Ingress", name))
    }
}

// ============================================================================
// Queue
// ============================================================================

/// Publisher recording every message, optionally failing every publish.
#[derive(Default)]
pub struct RecordingPublisher {
    messages: Mutex<Vec<(String, Vec<u8>)>>,
    failing: Mutex<bool>,
}

impl RecordingPublisher {
    pub fn failing() -> Self {
        Self {
            messages: Mutex::default(),
            failing: Mutex::new(true),
        }
    }

    pub fn subjects(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .map(|(subject, _)| subject.clone())
            .collect()
    }

    pub fn statuses(&self) -> Vec<JobStatus> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .map(|(_, payload)| serde_json::from_slice(payload).unwrap())
            .collect()
    }
}

#[async_trait]
impl MessagePublisher for RecordingPublisher {
    async fn publish(&self, subject: String, payload: Vec<u8>) -> Result<(), QueueError> {
        if *self.failing.lock().unwrap() {
            return Err(QueueError::Publish {
                subject,
                reason: "no responders available for request".to_string(),
            });
        }
        self.messages.lock().unwrap().push((subject, payload));
        Ok(())
    }
}

/// What a [`ScriptedDelivery`] was told to do.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Settlement {
    Ack,
    Nak(Duration),
}

/// Delivery with a fixed payload and delivery count.
pub struct ScriptedDelivery {
    subject: String,
    payload: Vec<u8>,
    delivery_count: Option<u64>,
    settlements: Mutex<Vec<Settlement>>,
}

impl ScriptedDelivery {
    pub fn new(payload: impl Into<Vec<u8>>, delivery_count: u64) -> Self {
        Self {
            subject: "test.vanityDomainVerifier.domainjob.req-1".to_string(),
            payload: payload.into(),
            delivery_count: Some(delivery_count),
            settlements: Mutex::default(),
        }
    }

    /// Delivery whose metadata cannot be read.
    pub fn without_metadata(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            delivery_count: None,
            ..Self::new(payload, 0)
        }
    }

    pub fn settlements(&self) -> Vec<Settlement> {
        self.settlements.lock().unwrap().clone()
    }
}

#[async_trait]
impl Delivery for ScriptedDelivery {
    fn subject(&self) -> &str {
        &self.subject
    }

    fn payload(&self) -> &[u8] {
        &self.payload
    }

    fn delivery_count(&self) -> Result<u64, QueueError> {
        self.delivery_count.ok_or_else(|| QueueError::Metadata {
            subject: self.subject.clone(),
            reason: "message is not bound to a consumer".to_string(),
        })
    }

    async fn ack(&self) -> Result<(), QueueError> {
        self.settlements.lock().unwrap().push(Settlement::Ack);
        Ok(())
    }

    async fn nak_with_delay(&self, delay: Duration) -> Result<(), QueueError> {
        self.settlements.lock().unwrap().push(Settlement::Nak(delay));
        Ok(())
    }
}
