// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

// Common test utilities for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::api::networking::v1::Ingress;
use std::collections::{BTreeMap, HashMap};
use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use vanity_domain_manager::config::ClusterConfig;
use vanity_domain_manager::constants::MAX_DELIVERIES;
use vanity_domain_manager::environment::EnvironmentController;
use vanity_domain_manager::errors::{EnvironmentError, QueueError, VerificationError};
use vanity_domain_manager::jobs::JobStatus;
use vanity_domain_manager::queue::{Delivery, MessagePublisher, Subjects};
use vanity_domain_manager::reconcilers::{DeliveryController, EnvironmentReconciler, JobProcessor};
use vanity_domain_manager::status::StatusPublisher;
use vanity_domain_manager::verifiers::{NameResolver, SystemTrustVerifier};

pub const TEST_ROOT: &str = include_str!("../../src/verifiers/testdata/ca.pem");
pub const LEAF: &str = include_str!("../../src/verifiers/testdata/leaf.pem");

/// 2030-01-01T00:00:00Z, inside the fixture certificate's validity window
pub fn fixture_now() -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(1_893_456_000)
}

pub fn cluster() -> ClusterConfig {
    ClusterConfig {
        namespace: "default".to_string(),
        cert_manager_issuer: Some("letsencrypt-prod".to_string()),
        service_name: "your-service".to_string(),
        service_port: 3000,
        ingress_class_name: None,
    }
}

/// Resolver answering CNAME lookups from a fixed table.
#[derive(Default)]
pub struct StaticResolver {
    cnames: HashMap<String, String>,
    addresses: HashMap<String, Vec<IpAddr>>,
}

impl StaticResolver {
    pub fn cname(mut self, hostname: &str, target: &str) -> Self {
        self.cnames.insert(hostname.to_string(), target.to_string());
        self
    }

    pub fn addresses(mut self, hostname: &str, addresses: &[&str]) -> Self {
        let parsed = addresses.iter().map(|a| a.parse().unwrap()).collect();
        self.addresses.insert(hostname.to_string(), parsed);
        self
    }
}

fn no_record(hostname: &str) -> VerificationError {
    VerificationError::DnsLookupFailed {
        hostname: hostname.to_string(),
        reason: "no record found".to_string(),
    }
}

#[async_trait]
impl NameResolver for StaticResolver {
    async fn lookup_cname(&self, hostname: &str) -> Result<String, VerificationError> {
        self.cnames.get(hostname).cloned().ok_or_else(|| no_record(hostname))
    }

    async fn lookup_ip(&self, hostname: &str) -> Result<Vec<IpAddr>, VerificationError> {
        self.addresses.get(hostname).cloned().ok_or_else(|| no_record(hostname))
    }
}

/// Environment keeping objects in maps and logging each call as `"{operation} {name}"`.
#[derive(Default)]
pub struct MemoryEnvironment {
    secrets: Mutex<BTreeMap<String, Secret>>,
    routes: Mutex<BTreeMap<String, Ingress>>,
    log: Mutex<Vec<String>>,
}

impl MemoryEnvironment {
    pub fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub fn secret(&self, name: &str) -> Option<Secret> {
        self.secrets.lock().unwrap().get(name).cloned()
    }

    pub fn route(&self, name: &str) -> Option<Ingress> {
        self.routes.lock().unwrap().get(name).cloned()
    }

    fn push(&self, operation: &str, name: &str) {
        self.log.lock().unwrap().push(format!("{operation} {name}"));
    }
}

fn not_found(kind: &str, name: &str) -> EnvironmentError {
    EnvironmentError::NotFound {
        kind: kind.to_string(),
        name: name.to_string(),
    }
}

#[async_trait]
impl EnvironmentController for MemoryEnvironment {
    async fn get_secret(&self, name: &str) -> Result<Secret, EnvironmentError> {
        self.push("get_secret", name);
        self.secret(name).ok_or_else(|| not_found("Secret", name))
    }

    async fn create_secret(&self, secret: &Secret) -> Result<(), EnvironmentError> {
        let name = secret.metadata.name.clone().unwrap_or_default();
        self.push("create_secret", &name);
        self.secrets.lock().unwrap().insert(name, secret.clone());
        Ok(())
    }

    async fn update_secret(&self, secret: &Secret) -> Result<(), EnvironmentError> {
        let name = secret.metadata.name.clone().unwrap_or_default();
        self.push("update_secret", &name);
        self.secrets.lock().unwrap().insert(name, secret.clone());
        Ok(())
    }

    async fn delete_secret(&self, name: &str) -> Result<(), EnvironmentError> {
        self.push("delete_secret", name);
        self.secrets
            .lock()
            .unwrap()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| not_found("Secret", name))
    }

    async fn get_route(&self, name: &str) -> Result<Ingress, EnvironmentError> {
        self.push("get_route", name);
        self.route(name).ok_or_else(|| not_found("Ingress", name))
    }

    async fn create_route(&self, route: &Ingress) -> Result<(), EnvironmentError> {
        let name = route.metadata.name.clone().unwrap_or_default();
        self.push("create_route", &name);
        self.routes.lock().unwrap().insert(name, route.clone());
        Ok(())
    }

    async fn update_route(&self, route: &Ingress) -> Result<(), EnvironmentError> {
        let name = route.metadata.name.clone().unwrap_or_default();
        self.push("update_route", &name);
        self.routes.lock().unwrap().insert(name, route.clone());
        Ok(())
    }

    async fn delete_route(&self, name: &str) -> Result<(), EnvironmentError> {
        self.push("delete_route", name);
        self.routes
            .lock()
            .unwrap()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| not_found("Ingress", name))
    }
}

/// Publisher keeping every message in memory.
#[derive(Default)]
pub struct MemoryPublisher {
    messages: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MemoryPublisher {
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
impl MessagePublisher for MemoryPublisher {
    async fn publish(&self, subject: String, payload: Vec<u8>) -> Result<(), QueueError> {
        self.messages.lock().unwrap().push((subject, payload));
        Ok(())
    }
}

/// How a [`QueuedDelivery`] was settled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Settled {
    Ack,
    Nak(Duration),
}

/// Delivery built from a JSON payload with a fixed delivery count.
pub struct QueuedDelivery {
    subject: String,
    payload: Vec<u8>,
    count: u64,
    settled: Mutex<Vec<Settled>>,
}

impl QueuedDelivery {
    pub fn new(subjects: &Subjects, reference_id: &str, payload: &str, count: u64) -> Self {
        Self {
            subject: subjects.job_subject(reference_id),
            payload: payload.as_bytes().to_vec(),
            count,
            settled: Mutex::default(),
        }
    }

    pub fn settled(&self) -> Vec<Settled> {
        self.settled.lock().unwrap().clone()
    }
}

#[async_trait]
impl Delivery for QueuedDelivery {
    fn subject(&self) -> &str {
        &self.subject
    }

    fn payload(&self) -> &[u8] {
        &self.payload
    }

    fn delivery_count(&self) -> Result<u64, QueueError> {
        Ok(self.count)
    }

    async fn ack(&self) -> Result<(), QueueError> {
        self.settled.lock().unwrap().push(Settled::Ack);
        Ok(())
    }

    async fn nak_with_delay(&self, delay: Duration) -> Result<(), QueueError> {
        self.settled.lock().unwrap().push(Settled::Nak(delay));
        Ok(())
    }
}

/// Verifier trusting only the fixture root.
pub fn fixture_verifier() -> SystemTrustVerifier {
    let root = pem::parse(TEST_ROOT).unwrap();
    let mut roots = rustls::RootCertStore::empty();
    roots
        .add(rustls::pki_types::CertificateDer::from(root.into_contents()))
        .unwrap();
    SystemTrustVerifier::with_roots(roots).unwrap()
}

/// Everything a pipeline test needs to drive and inspect one delivery.
pub struct Pipeline {
    pub subjects: Subjects,
    pub environment: Arc<MemoryEnvironment>,
    pub publisher: Arc<MemoryPublisher>,
    pub controller: DeliveryController,
}

pub fn pipeline(resolver: StaticResolver) -> Pipeline {
    let subjects = Subjects::new("test");
    let environment = Arc::new(MemoryEnvironment::default());
    let publisher = Arc::new(MemoryPublisher::default());
    let status = StatusPublisher::new(publisher.clone(), subjects.clone());

    let processor = JobProcessor::new(
        Arc::new(resolver),
        Arc::new(fixture_verifier()),
        EnvironmentReconciler::new(environment.clone(), cluster()),
        status.clone(),
    )
    .with_clock(fixture_now);

    Pipeline {
        subjects,
        environment,
        publisher,
        controller: DeliveryController::new(processor, status, MAX_DELIVERIES),
    }
}
