// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Job and status types exchanged over the durable queue.
//!
//! These types define the JSON wire format shared with job producers and status
//! consumers. Field names are camelCase to match the existing producers:
//!
//! ```json
//! {
//!   "type": "add",
//!   "referenceId": "req-42",
//!   "domain": {
//!     "vanityDomain": "shop.example.com",
//!     "desiredDnsTargetType": "CNAME",
//!     "desiredCNAME": "lb.vendor.net"
//!   }
//! }
//! ```
//!
//! All types are immutable values for the lifetime of one delivery.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::constants::TLS_SECRET_SUFFIX;

/// Treat an explicit JSON `null` the same as an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Caller-supplied TLS material, PEM encoded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainCustomCert {
    /// PEM-encoded private key
    pub key: String,
    /// PEM-encoded certificate (leaf first, optionally followed by intermediates)
    pub cert: String,
}

/// The kind of DNS record a vanity domain is expected to resolve through.
///
/// Unknown values are preserved in [`DnsTargetType::Unsupported`] so that verification
/// can report them instead of the payload failing to parse.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DnsTargetType {
    /// Hostname must be a CNAME for the desired target
    Cname,
    /// Hostname must resolve only to the desired addresses
    A,
    /// Any other value, including the empty string
    Unsupported(String),
}

impl DnsTargetType {
    /// Returns `true` when no target type was supplied at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Unsupported(value) if value.is_empty())
    }

    /// Wire representation of the target type.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Cname => "CNAME",
            Self::A => "A",
            Self::Unsupported(value) => value,
        }
    }
}

impl Default for DnsTargetType {
    fn default() -> Self {
        Self::Unsupported(String::new())
    }
}

impl From<String> for DnsTargetType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "CNAME" => Self::Cname,
            "A" => Self::A,
            _ => Self::Unsupported(value),
        }
    }
}

impl From<DnsTargetType> for String {
    fn from(value: DnsTargetType) -> Self {
        match value {
            DnsTargetType::Unsupported(value) => value,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for DnsTargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Desired state for one vanity domain.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VanityDomain {
    /// The caller-owned hostname (e.g., `shop.example.com`)
    #[serde(default, deserialize_with = "null_as_default")]
    pub vanity_domain: String,

    /// Which record type the hostname must resolve through
    #[serde(rename = "desiredDnsTargetType", default)]
    pub desired_dns_target_type: DnsTargetType,

    /// Desired CNAME target, used when the target type is `CNAME`
    #[serde(
        rename = "desiredCNAME",
        default,
        deserialize_with = "null_as_default"
    )]
    pub desired_cname_target: String,

    /// Desired address set, used when the target type is `A`
    #[serde(
        rename = "desiredARecords",
        default,
        deserialize_with = "null_as_default"
    )]
    pub desired_a_record_targets: Vec<String>,

    /// Optional caller-supplied certificate and key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provided_certificate: Option<DomainCustomCert>,

    /// Optional backend service overriding the cluster default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_service_name: Option<String>,

    /// Optional backend port overriding the cluster default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_service_port: Option<i32>,
}

impl VanityDomain {
    /// Stable resource identifier derived from the hostname.
    #[must_use]
    pub fn resource_name(&self) -> String {
        safe_domain_name(&self.vanity_domain)
    }

    /// Name of the TLS secret referenced by the routing rule.
    #[must_use]
    pub fn tls_secret_name(&self) -> String {
        format!("{}{TLS_SECRET_SUFFIX}", self.resource_name())
    }

    /// Returns `true` when the caller supplied certificate material.
    #[must_use]
    pub fn has_provided_certificate(&self) -> bool {
        self.provided_certificate.is_some()
    }

    /// Caller override for the backend service, if one was supplied.
    ///
    /// The override port is `None` when absent or non-positive.
    #[must_use]
    pub fn backend_override(&self) -> Option<(&str, Option<i32>)> {
        let name = self
            .target_service_name
            .as_deref()
            .filter(|name| !name.is_empty())?;
        let port = self.target_service_port.filter(|port| *port > 0);
        Some((name, port))
    }
}

/// Replace characters that are not valid in Kubernetes object names.
///
/// `shop.example.com` becomes `shop-example-com`.
#[must_use]
pub fn safe_domain_name(hostname: &str) -> String {
    hostname.replace('.', "-")
}

/// What a job asks the system to do with its vanity domain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    /// Apply the domain for the first time
    Add,
    /// Re-apply the domain (handled exactly like [`JobKind::Add`])
    Change,
    /// Tear down the domain
    Remove,
}

impl JobKind {
    /// Lowercase label used on the wire, in logs and in metrics.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Change => "change",
            Self::Remove => "remove",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit of work delivered on the job stream.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainJob {
    /// `add`, `change` or `remove`
    #[serde(rename = "type")]
    pub kind: JobKind,

    /// The vanity domain to process
    pub domain: VanityDomain,

    /// Caller-assigned correlation id, propagated verbatim to every status
    #[serde(rename = "referenceId", default)]
    pub reference_id: String,
}

/// Outcome record published on the status stream.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    /// Whether the job was applied
    pub success: bool,
    /// Correlation id copied from the job
    pub reference_id: String,
    /// Failure description, empty on success
    pub error_message: String,
    /// `true` when the job was given up on after exhausting its deliveries
    pub dropped: bool,
}

impl JobStatus {
    /// Terminal success status.
    #[must_use]
    pub fn succeeded(reference_id: &str) -> Self {
        Self {
            success: true,
            reference_id: reference_id.to_string(),
            error_message: String::new(),
            dropped: false,
        }
    }

    /// Failure status; terminal when `dropped` is `true`.
    #[must_use]
    pub fn failed(reference_id: &str, error_message: &str, dropped: bool) -> Self {
        Self {
            success: false,
            reference_id: reference_id.to_string(),
            error_message: error_message.to_string(),
            dropped,
        }
    }
}

#[cfg(test)]
#[path = "jobs_tests.rs"]
mod jobs_tests;
