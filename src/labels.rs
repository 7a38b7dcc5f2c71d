// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Common label and annotation constants applied to environment resources.
//!
//! Every secret and ingress written for a vanity domain carries the same label set so
//! operators can find them with a selector.

// ============================================================================
// Kubernetes Standard Labels
// https://kubernetes.io/docs/concepts/overview/working-with-objects/common-labels/
// ============================================================================

/// Standard label for the tool being used to manage the operation of an application
pub const K8S_MANAGED_BY: &str = "app.kubernetes.io/managed-by";

/// Standard label for the name of a higher-level application this one is part of
pub const K8S_PART_OF: &str = "app.kubernetes.io/part-of";

// ============================================================================
// Vanity Domain Labels
// ============================================================================

/// Label holding the vanity hostname a resource was created for
pub const DOMAIN_LABEL: &str = "Domain";

/// Label marking a TLS secret whose material was supplied by the caller
pub const PROVIDED_LABEL: &str = "Provided";

/// Value of [`PROVIDED_LABEL`] for caller-supplied material
pub const PROVIDED_TRUE: &str = "true";

// ============================================================================
// Annotations
// ============================================================================

/// cert-manager annotation requesting automated issuance from a cluster issuer
pub const CERT_MANAGER_CLUSTER_ISSUER_ANNOTATION: &str = "cert-manager.io/cluster-issuer";
