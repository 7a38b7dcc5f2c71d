// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! DNS ownership verification.
//!
//! A vanity domain is verified when its live DNS state matches the job:
//!
//! - **CNAME**: the canonical name of the hostname, minus one trailing `.`, equals the
//!   desired target exactly
//! - **A**: every resolved address is a member of the desired set; partial overlap is a
//!   failure
//!
//! Any other target type is rejected as unsupported.

use async_trait::async_trait;
use hickory_resolver::config::LookupIpStrategy;
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::proto::rr::{RData, RecordType};
use hickory_resolver::{ResolveError, Resolver, TokioResolver};
use std::net::IpAddr;
use tracing::{debug, trace};

use crate::constants::MAX_CNAME_CHAIN_DEPTH;
use crate::errors::VerificationError;
use crate::jobs::{DnsTargetType, VanityDomain};

/// Resolver used by the DNS check.
#[async_trait]
pub trait NameResolver: Send + Sync {
    /// Resolve the canonical name of `hostname`, following the CNAME chain.
    ///
    /// A hostname without a CNAME record is its own canonical name. The result is
    /// fully qualified (ends with `.`).
    async fn lookup_cname(&self, hostname: &str) -> Result<String, VerificationError>;

    /// Resolve every address record (A and AAAA) of `hostname`.
    async fn lookup_ip(&self, hostname: &str) -> Result<Vec<IpAddr>, VerificationError>;
}

/// Check the live DNS state of `domain` against its desired targets.
///
/// # Errors
///
/// - [`VerificationError::DnsLookupFailed`] when resolution fails or returns nothing
/// - [`VerificationError::DnsMismatch`] when the records point somewhere else
/// - [`VerificationError::UnsupportedTargetType`] for anything but `CNAME` and `A`
pub async fn verify_dns(
    resolver: &dyn NameResolver,
    domain: &VanityDomain,
) -> Result<(), VerificationError> {
    let hostname = domain.vanity_domain.as_str();

    match &domain.desired_dns_target_type {
        DnsTargetType::Cname => {
            let cname = resolver.lookup_cname(hostname).await?;
            if cname.is_empty() {
                return Err(VerificationError::DnsLookupFailed {
                    hostname: hostname.to_string(),
                    reason: "empty canonical name".to_string(),
                });
            }
            check_cname(hostname, &cname, &domain.desired_cname_target)
        }
        DnsTargetType::A => {
            let addresses = resolver.lookup_ip(hostname).await?;
            if addresses.is_empty() {
                return Err(VerificationError::DnsLookupFailed {
                    hostname: hostname.to_string(),
                    reason: "no address records".to_string(),
                });
            }
            check_addresses(hostname, &addresses, &domain.desired_a_record_targets)
        }
        DnsTargetType::Unsupported(target_type) => Err(VerificationError::UnsupportedTargetType {
            target_type: target_type.clone(),
        }),
    }
}

/// Compare a resolved canonical name with the desired CNAME target.
///
/// Resolvers return fully qualified names, so a single trailing `.` is stripped first.
///
/// # Errors
///
/// Returns [`VerificationError::DnsMismatch`] when the names differ.
pub fn check_cname(hostname: &str, resolved: &str, desired: &str) -> Result<(), VerificationError> {
    let canonical = resolved.strip_suffix('.').unwrap_or(resolved);

    if canonical == desired {
        debug!(hostname = %hostname, cname = %canonical, "CNAME matches desired target");
        Ok(())
    } else {
        Err(VerificationError::DnsMismatch {
            hostname: hostname.to_string(),
            record_type: "CNAME".to_string(),
            found: resolved.to_string(),
            expected: desired.to_string(),
        })
    }
}

/// Require every resolved address to be a member of the desired set.
///
/// Desired entries that are not valid IP addresses never match.
///
/// # Errors
///
/// Returns [`VerificationError::DnsMismatch`] naming the first address outside the set.
pub fn check_addresses(
    hostname: &str,
    resolved: &[IpAddr],
    desired: &[String],
) -> Result<(), VerificationError> {
    let allowed: Vec<IpAddr> = desired
        .iter()
        .filter_map(|target| target.trim().parse().ok())
        .collect();

    if let Some(stray) = resolved.iter().find(|address| !allowed.contains(address)) {
        return Err(VerificationError::DnsMismatch {
            hostname: hostname.to_string(),
            record_type: "A".to_string(),
            found: stray.to_string(),
            expected: format!("one of [{}]", desired.join(", ")),
        });
    }

    debug!(
        hostname = %hostname,
        addresses = resolved.len(),
        "All resolved addresses are desired targets"
    );
    Ok(())
}

/// [`NameResolver`] backed by the host's resolver configuration.
pub struct SystemResolver {
    resolver: TokioResolver,
}

impl SystemResolver {
    /// Build a resolver from the system configuration (`/etc/resolv.conf`).
    ///
    /// Address lookups query both A and AAAA so that an unexpected IPv6 address is
    /// caught as well.
    ///
    /// # Errors
    ///
    /// Returns an error if the system resolver configuration cannot be read.
    pub fn from_system_conf() -> Result<Self, ResolveError> {
        let (config, mut opts) = hickory_resolver::system_conf::read_system_conf()?;
        opts.ip_strategy = LookupIpStrategy::Ipv4AndIpv6;

        let resolver = Resolver::builder_with_config(config, TokioConnectionProvider::default())
            .with_options(opts)
            .build();

        Ok(Self { resolver })
    }
}

fn fully_qualified(hostname: &str) -> String {
    if hostname.ends_with('.') {
        hostname.to_string()
    } else {
        format!("{hostname}.")
    }
}

fn lookup_failed(hostname: &str, err: &ResolveError) -> VerificationError {
    VerificationError::DnsLookupFailed {
        hostname: hostname.to_string(),
        reason: err.to_string(),
    }
}

#[async_trait]
impl NameResolver for SystemResolver {
    async fn lookup_cname(&self, hostname: &str) -> Result<String, VerificationError> {
        let mut current = fully_qualified(hostname);

        for _ in 0..MAX_CNAME_CHAIN_DEPTH {
            match self.resolver.lookup(current.as_str(), RecordType::CNAME).await {
                Ok(lookup) => {
                    let next = lookup.iter().find_map(|rdata| match rdata {
                        RData::CNAME(cname) => Some(cname.0.to_string()),
                        _ => None,
                    });
                    match next {
                        Some(target) => {
                            trace!(from = %current, to = %target, "Following CNAME");
                            current = target;
                        }
                        None => return Ok(current),
                    }
                }
                Err(e) if e.is_nx_domain() => return Err(lookup_failed(hostname, &e)),
                // The name exists but has no CNAME: it is its own canonical name
                Err(e) if e.is_no_records_found() => return Ok(current),
                Err(e) => return Err(lookup_failed(hostname, &e)),
            }
        }

        Ok(current)
    }

    async fn lookup_ip(&self, hostname: &str) -> Result<Vec<IpAddr>, VerificationError> {
        let lookup = self
            .resolver
            .lookup_ip(fully_qualified(hostname))
            .await
            .map_err(|e| lookup_failed(hostname, &e))?;

        Ok(lookup.iter().collect())
    }
}

#[cfg(test)]
#[path = "dns_tests.rs"]
mod dns_tests;
