// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! TLS certificate validation for caller-supplied material.
//!
//! Validation runs in order and stops at the first failure:
//!
//! 1. Decode the first PEM block of the certificate text
//! 2. Parse it as an X.509 certificate
//! 3. Check the validity window against the current time
//! 4. Verify the chain against the ambient trust store, requiring server authentication
//!    usage and a hostname match
//!
//! Any further `CERTIFICATE` blocks in the text are offered to the chain verifier as
//! intermediates. They are never trust anchors.

use rustls::client::danger::ServerCertVerifier;
use rustls::client::WebPkiServerVerifier;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{CertificateError, RootCertStore};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};
use x509_parser::prelude::X509Certificate;

use crate::errors::VerificationError;
use crate::jobs::VanityDomain;

const PEM_CERTIFICATE_TAG: &str = "CERTIFICATE";

/// Verifies a certificate chain for a hostname.
pub trait ChainVerifier: Send + Sync {
    /// Verify `end_entity` (with optional `intermediates`) for `hostname` at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`VerificationError::HostnameMismatch`] when the chain is trusted but not
    /// valid for the hostname, otherwise [`VerificationError::UntrustedChain`].
    fn verify(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        hostname: &str,
        now: SystemTime,
    ) -> Result<(), VerificationError>;
}

/// [`ChainVerifier`] backed by rustls' WebPKI verifier.
pub struct SystemTrustVerifier {
    verifier: Arc<WebPkiServerVerifier>,
}

impl SystemTrustVerifier {
    /// Build a verifier trusting the platform's native root certificates.
    ///
    /// Roots that fail to parse are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error when no usable root certificate was found.
    pub fn from_system_roots() -> Result<Self, VerificationError> {
        let native = rustls_native_certs::load_native_certs();
        for err in &native.errors {
            warn!(error = %err, "Failed to load a native root certificate");
        }

        let mut roots = RootCertStore::empty();
        let (added, ignored) = roots.add_parsable_certificates(native.certs);
        debug!(added, ignored, "Loaded native root certificates");

        Self::with_roots(roots)
    }

    /// Build a verifier trusting exactly `roots`.
    ///
    /// # Errors
    ///
    /// Returns an error when the verifier cannot be built (for example, `roots` is empty).
    pub fn with_roots(roots: RootCertStore) -> Result<Self, VerificationError> {
        let verifier = WebPkiServerVerifier::builder_with_provider(
            Arc::new(roots),
            Arc::new(rustls::crypto::ring::default_provider()),
        )
        .build()
        .map_err(|e| VerificationError::UntrustedChain {
            reason: e.to_string(),
        })?;

        Ok(Self { verifier })
    }
}

impl ChainVerifier for SystemTrustVerifier {
    fn verify(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        hostname: &str,
        now: SystemTime,
    ) -> Result<(), VerificationError> {
        let server_name = ServerName::try_from(hostname.to_string()).map_err(|e| {
            VerificationError::HostnameMismatch {
                hostname: hostname.to_string(),
                reason: e.to_string(),
            }
        })?;

        let since_epoch = now.duration_since(UNIX_EPOCH).unwrap_or(Duration::ZERO);

        self.verifier
            .verify_server_cert(
                end_entity,
                intermediates,
                &server_name,
                &[],
                UnixTime::since_unix_epoch(since_epoch),
            )
            .map(|_| ())
            .map_err(|e| match e {
                rustls::Error::InvalidCertificate(
                    CertificateError::NotValidForName
                    | CertificateError::NotValidForNameContext { .. },
                ) => VerificationError::HostnameMismatch {
                    hostname: hostname.to_string(),
                    reason: e.to_string(),
                },
                other => VerificationError::UntrustedChain {
                    reason: other.to_string(),
                },
            })
    }
}

/// Validate the certificate supplied with `domain` at time `now`.
///
/// # Errors
///
/// Returns the first failing check as a [`VerificationError`]. A domain without a
/// supplied certificate fails with [`VerificationError::PemDecodeFailed`].
pub fn validate_certificate(
    domain: &VanityDomain,
    verifier: &dyn ChainVerifier,
    now: SystemTime,
) -> Result<(), VerificationError> {
    let cert_pem = domain
        .provided_certificate
        .as_ref()
        .map(|provided| provided.cert.as_str())
        .ok_or_else(|| VerificationError::PemDecodeFailed {
            reason: "no certificate was provided".to_string(),
        })?;

    let (leaf, intermediates) = decode_pem_chain(cert_pem)?;

    {
        let certificate = parse_certificate(&leaf)?;
        check_validity(&certificate, now)?;
    }

    verifier.verify(&leaf, &intermediates, &domain.vanity_domain, now)?;

    debug!(hostname = %domain.vanity_domain, "Certificate is valid for vanity domain");
    Ok(())
}

/// Split PEM text into the first block and any following certificate blocks.
fn decode_pem_chain(
    text: &str,
) -> Result<(CertificateDer<'static>, Vec<CertificateDer<'static>>), VerificationError> {
    let mut blocks = pem::parse_many(text)
        .map_err(|e| VerificationError::PemDecodeFailed {
            reason: e.to_string(),
        })?
        .into_iter();

    let first = blocks.next().ok_or_else(|| VerificationError::PemDecodeFailed {
        reason: "no PEM block found".to_string(),
    })?;

    let intermediates = blocks
        .filter(|block| block.tag() == PEM_CERTIFICATE_TAG)
        .map(|block| CertificateDer::from(block.into_contents()))
        .collect();

    Ok((CertificateDer::from(first.into_contents()), intermediates))
}

fn parse_certificate<'a>(der: &'a CertificateDer<'_>) -> Result<X509Certificate<'a>, VerificationError> {
    let (_, certificate) = x509_parser::parse_x509_certificate(der.as_ref()).map_err(|e| {
        VerificationError::ParseFailed {
            reason: e.to_string(),
        }
    })?;
    Ok(certificate)
}

fn check_validity(certificate: &X509Certificate<'_>, now: SystemTime) -> Result<(), VerificationError> {
    let now_secs = match now.duration_since(UNIX_EPOCH) {
        Ok(elapsed) => i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX),
        Err(before_epoch) => {
            i64::try_from(before_epoch.duration().as_secs()).map_or(i64::MIN, |secs| -secs)
        }
    };

    let validity = certificate.validity();

    if now_secs < validity.not_before.timestamp() {
        return Err(VerificationError::NotYetValid {
            not_before: validity.not_before.to_string(),
        });
    }

    if now_secs > validity.not_after.timestamp() {
        return Err(VerificationError::Expired {
            not_after: validity.not_after.to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
#[path = "tls_tests.rs"]
mod tls_tests;
