// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Verification pipeline for vanity domains.
//!
//! Two independent checks run before any environment state is written:
//!
//! 1. [`dns::verify_dns`] proves the caller points the hostname at us
//! 2. [`tls::validate_certificate`] proves caller-supplied material is usable
//!
//! Both are side-effect free and never retry on their own. Lookups and chain
//! verification go through the [`NameResolver`] and [`ChainVerifier`] traits so the
//! pipeline can be exercised without a network or a trust store.

pub mod dns;
pub mod tls;

pub use dns::{verify_dns, NameResolver, SystemResolver};
pub use tls::{validate_certificate, ChainVerifier, SystemTrustVerifier};
