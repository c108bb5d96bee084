//! CRL entry revocation reasons.
//!
//! The `reasonCode` CRL entry extension (RFC 5280 Section 5.3.1) is an
//! `ENUMERATED` wrapped in the extension `OCTET STRING`.  Some CRLs in the
//! wild carry a malformed value here; decoding therefore never fails and
//! falls back to [`RevocationReason::Unknown`].

use crate::asn1;
use crate::digest::{compute_digest, DigestAlgorithm};
use crate::oid;
use crate::util;
use crate::CertMetaError;
use der_parser::ber::BerObjectContent;
use serde::Serialize;
use tracing::warn;

/// CRL reason codes.  Code 7 is unassigned by RFC 5280 and doubles as the
/// value for a reason that could not be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RevocationReason {
    Unspecified,
    KeyCompromise,
    CaCompromise,
    AffiliationChanged,
    Superseded,
    CessationOfOperation,
    CertificateHold,
    Unknown,
    RemoveFromCrl,
    PrivilegeWithdrawn,
    AaCompromise,
}

impl RevocationReason {
    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            0 => Some(RevocationReason::Unspecified),
            1 => Some(RevocationReason::KeyCompromise),
            2 => Some(RevocationReason::CaCompromise),
            3 => Some(RevocationReason::AffiliationChanged),
            4 => Some(RevocationReason::Superseded),
            5 => Some(RevocationReason::CessationOfOperation),
            6 => Some(RevocationReason::CertificateHold),
            7 => Some(RevocationReason::Unknown),
            8 => Some(RevocationReason::RemoveFromCrl),
            9 => Some(RevocationReason::PrivilegeWithdrawn),
            10 => Some(RevocationReason::AaCompromise),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            RevocationReason::Unspecified => 0,
            RevocationReason::KeyCompromise => 1,
            RevocationReason::CaCompromise => 2,
            RevocationReason::AffiliationChanged => 3,
            RevocationReason::Superseded => 4,
            RevocationReason::CessationOfOperation => 5,
            RevocationReason::CertificateHold => 6,
            RevocationReason::Unknown => 7,
            RevocationReason::RemoveFromCrl => 8,
            RevocationReason::PrivilegeWithdrawn => 9,
            RevocationReason::AaCompromise => 10,
        }
    }

    /// RFC 5280-style name of the reason.
    pub fn name(self) -> &'static str {
        match self {
            RevocationReason::Unspecified => "unspecified",
            RevocationReason::KeyCompromise => "keyCompromise",
            RevocationReason::CaCompromise => "cACompromise",
            RevocationReason::AffiliationChanged => "affiliationChanged",
            RevocationReason::Superseded => "superseded",
            RevocationReason::CessationOfOperation => "cessationOfOperation",
            RevocationReason::CertificateHold => "certificateHold",
            RevocationReason::Unknown => "unknown",
            RevocationReason::RemoveFromCrl => "removeFromCRL",
            RevocationReason::PrivilegeWithdrawn => "privilegeWithdrawn",
            RevocationReason::AaCompromise => "aACompromise",
        }
    }
}

impl std::fmt::Display for RevocationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Decode the value of a CRL entry `reasonCode` extension.
///
/// `extension_value` is the DER `OCTET STRING` wrapping the `ENUMERATED`.
/// Any decoding problem yields [`RevocationReason::Unknown`].
pub fn decode_crl_revocation_reason(extension_value: &[u8]) -> RevocationReason {
    match decode_reason_code(extension_value) {
        Ok(reason) => reason,
        Err(e) => {
            if tracing::enabled!(tracing::Level::DEBUG) {
                warn!(
                    "Unable to decode CRL entry extension '{}': {}. Obtained binaries: '{}'",
                    oid::CRL_REASON_CODE,
                    e,
                    util::base64_line(extension_value)
                );
            } else {
                warn!(
                    "Unable to decode CRL entry extension '{}': {}",
                    oid::CRL_REASON_CODE,
                    e
                );
            }
            RevocationReason::Unknown
        }
    }
}

fn decode_reason_code(extension_value: &[u8]) -> Result<RevocationReason, CertMetaError> {
    let inner = asn1::unwrap_octet_string(extension_value)?;
    reason_from_enumerated(inner)
}

/// Decode a bare `CRLReason ::= ENUMERATED` TLV.
pub(crate) fn reason_from_enumerated(tlv: &[u8]) -> Result<RevocationReason, CertMetaError> {
    let node = asn1::parse_primitive(tlv)?;
    match node.content {
        BerObjectContent::Enum(code) => RevocationReason::from_code(code).ok_or_else(|| {
            CertMetaError::MalformedAsn1(format!("CRL reason code {} out of range", code))
        }),
        _ => Err(CertMetaError::MalformedAsn1(
            "CRL reason is not an ENUMERATED".into(),
        )),
    }
}

/// Cache key of the revocation token fetched from a CRL distribution point.
pub fn crl_revocation_token_key(url: &str) -> String {
    hex::encode(compute_digest(DigestAlgorithm::Sha1, &[url.as_bytes()]))
}
