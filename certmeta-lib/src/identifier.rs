//! Stable identifiers for signatures and diagnostic certificate numbers.
//!
//! [`deterministic_id`] derives a short label from a signing time and the
//! canonical identity bytes of a token.  MD5 is used only to shorten the
//! label; the result carries no security property.
//!
//! [`CertificateNumbering`] hands out small integers to certificates so that
//! reports can refer to "certificate 3" instead of a DN and serial pair.

use crate::digest::{compute_digest, DigestAlgorithm};
use num_bigint::BigInt;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use time::{Duration, OffsetDateTime};
use tracing::debug;

/// Seconds between the Unix epoch and 1970-04-23T00:00:00Z.
const FALLBACK_SIGNING_TIME_SECONDS: i64 = 9_676_800;

/// Instant used in place of a missing signing time.
pub fn fallback_signing_time() -> OffsetDateTime {
    OffsetDateTime::UNIX_EPOCH + Duration::seconds(FALLBACK_SIGNING_TIME_SECONDS)
}

fn signing_time_seconds(signing_time: Option<OffsetDateTime>) -> i64 {
    signing_time.unwrap_or_else(fallback_signing_time).unix_timestamp()
}

fn format_id(parts: &[&[u8]]) -> String {
    format!("id-{}", hex::encode(compute_digest(DigestAlgorithm::Md5, parts)))
}

/// Identifier of a signature, timestamp or other token.
///
/// The signing time is taken in UTC at whole-second precision; sub-second
/// parts and the offset do not influence the result.
pub fn deterministic_id(signing_time: Option<OffsetDateTime>, token_identity: &[u8]) -> String {
    let seconds = signing_time_seconds(signing_time).to_be_bytes();
    format_id(&[&seconds, token_identity])
}

/// Identifier of a counter-signature over the signature whose identity is
/// `master_identity`.
pub fn counter_signature_deterministic_id(
    signing_time: Option<OffsetDateTime>,
    token_identity: &[u8],
    master_identity: &[u8],
) -> String {
    let seconds = signing_time_seconds(signing_time).to_be_bytes();
    format_id(&[&seconds, token_identity, master_identity])
}

// ---------------------------------------------------------------------------
// Certificate numbering
// ---------------------------------------------------------------------------

/// How [`CertificateNumbering`] picks the number of a new certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NumberingMode {
    /// 1, 2, 3, ... in order of first appearance.
    Sequential,
    /// Derived from the issuer DN and serial number, identical across runs.
    ///
    /// A number already taken in the registry is resolved by moving to the
    /// next free value, so the numbers of a colliding pair depend on the
    /// order in which the pairs were first assigned. Pairs without a
    /// collision get the same number in every registry.
    Deterministic,
}

#[derive(Debug, Default)]
struct NumberingState {
    table: HashMap<(String, BigInt), u32>,
    used: HashSet<u32>,
    counter: u32,
}

/// Registry of the numbers assigned to `(issuer DN, serial)` pairs.
///
/// The registry is shared by reference; all methods take `&self`.
#[derive(Debug)]
pub struct CertificateNumbering {
    mode: NumberingMode,
    state: Mutex<NumberingState>,
}

impl Default for CertificateNumbering {
    fn default() -> Self {
        Self::new(NumberingMode::Sequential)
    }
}

impl CertificateNumbering {
    pub fn new(mode: NumberingMode) -> Self {
        CertificateNumbering {
            mode,
            state: Mutex::new(NumberingState::default()),
        }
    }

    pub fn mode(&self) -> NumberingMode {
        self.mode
    }

    fn lock(&self) -> MutexGuard<'_, NumberingState> {
        // The state stays consistent across a panic in another holder.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of `(issuer_dn, serial)`, assigning one on first sight.
    ///
    /// Assigned numbers are unique within the registry and never 0. In
    /// [`NumberingMode::Deterministic`] they stay below `2^31`.
    pub fn assign(&self, issuer_dn: &str, serial: &BigInt) -> u32 {
        let mut state = self.lock();
        let key = (issuer_dn.to_string(), serial.clone());
        if let Some(number) = state.table.get(&key) {
            return *number;
        }

        let number = match self.mode {
            NumberingMode::Sequential => {
                state.counter = state.counter.wrapping_add(1);
                state.counter
            }
            NumberingMode::Deterministic => {
                let mut candidate = deterministic_number(issuer_dn, serial);
                while candidate == 0 || state.used.contains(&candidate) {
                    candidate = (candidate + 1) & 0x7FFF_FFFF;
                }
                candidate
            }
        };

        debug!(issuer = issuer_dn, %serial, number, "assigned certificate number");
        state.used.insert(number);
        state.table.insert(key, number);
        number
    }

    /// Previously assigned number, without assigning one.
    pub fn get(&self, issuer_dn: &str, serial: &BigInt) -> Option<u32> {
        self.lock()
            .table
            .get(&(issuer_dn.to_string(), serial.clone()))
            .copied()
    }

    /// Forget every assignment and restart the counter.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.table.clear();
        state.used.clear();
        state.counter = 0;
    }

    pub fn len(&self) -> usize {
        self.lock().table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// First four bytes of `SHA-1(issuer_dn || 0x00 || serial)`, top bit cleared.
fn deterministic_number(issuer_dn: &str, serial: &BigInt) -> u32 {
    let digest = compute_digest(
        DigestAlgorithm::Sha1,
        &[issuer_dn.as_bytes(), &[0x00], &serial.to_signed_bytes_be()],
    );
    let mut prefix = [0u8; 4];
    for (dst, src) in prefix.iter_mut().zip(digest.iter()) {
        *dst = *src;
    }
    u32::from_be_bytes(prefix) & 0x7FFF_FFFF
}
