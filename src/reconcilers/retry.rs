// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Retry policy for failed deliveries.
//!
//! A failed delivery is redelivered after an exponential backoff until the maximum
//! delivery count is reached, at which point it is dropped.
//!
//! # Retry Schedule
//!
//! With a base delay of 30 seconds:
//!
//! 1. 30s
//! 2. 60s
//! 3. 2m
//! 4. 4m
//! 5. 8m
//! 6. 16m
//! 7. 32m
//! 8. 64m
//! 9. 128m
//! 10. dropped (with the default maximum of 10 deliveries)

use std::time::Duration;

use crate::constants::BASE_RETRY_DELAY_SECS;

/// What to do with a delivery after processing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeliveryDecision {
    /// Processing succeeded; remove the message
    Ack,
    /// Processing failed; publish a non-terminal status and redeliver after the delay
    RetryAfter(Duration),
    /// Processing failed for the last allowed time; publish a dropped status and remove
    /// the message
    Drop,
}

impl DeliveryDecision {
    /// Metric label for the decision.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ack => "ack",
            Self::RetryAfter(_) => "retry",
            Self::Drop => "drop",
        }
    }
}

/// Backoff before the redelivery that follows delivery `delivery_count`.
///
/// `30s × 2^(delivery_count − 1)`. A count of 0 is treated as the first delivery and
/// the doubling saturates instead of overflowing.
#[must_use]
pub fn retry_delay(delivery_count: u64) -> Duration {
    let exponent = delivery_count.max(1) - 1;
    let multiplier = u32::try_from(exponent)
        .ok()
        .and_then(|exp| 1_u64.checked_shl(exp))
        .unwrap_or(u64::MAX);

    Duration::from_secs(BASE_RETRY_DELAY_SECS.saturating_mul(multiplier))
}

/// Decide the fate of a delivery from its processing `outcome`, how many times it has
/// been delivered, and the maximum number of deliveries.
#[must_use]
pub fn decide<E>(
    outcome: &Result<(), E>,
    delivery_count: u64,
    max_deliveries: u64,
) -> DeliveryDecision {
    if outcome.is_ok() {
        DeliveryDecision::Ack
    } else if delivery_count >= max_deliveries {
        DeliveryDecision::Drop
    } else {
        DeliveryDecision::RetryAfter(retry_delay(delivery_count))
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod retry_tests;
