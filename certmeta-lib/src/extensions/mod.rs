//! Certificate extension decoding.
//!
//! [`decode_extensions`] walks the critical and non-critical extension OIDs of
//! a certificate, routes each one through a fixed dispatch table and collects
//! the results into a [`CertificateExtensions`] aggregate.
//!
//! Every table row carries its own [`FailurePolicy`].  Most decoders are
//! best-effort: a malformed value is logged and the extension is left out of
//! the aggregate.  The key identifier extensions are structurally trivial, so
//! a decode failure there is returned to the caller instead.

mod decoders;
mod qc;

pub use decoders::preferred_ca_issuers_url;

use crate::fields::{CertificateExtension, CertificateExtensions, ExtensionKind, OtherExtension, RawExtension};
use crate::util;
use crate::CertMetaError;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, warn};

/// Access to the extensions of one certificate.
pub trait ExtensionSource {
    /// OIDs of the extensions marked critical, in certificate order.
    fn critical_extension_oids(&self) -> Vec<String>;

    /// OIDs of the extensions not marked critical, in certificate order.
    fn non_critical_extension_oids(&self) -> Vec<String>;

    /// The DER `OCTET STRING` holding the value of extension `oid`.
    fn extension_value(&self, oid: &str) -> Option<Vec<u8>>;
}

/// An owned, explicitly assembled [`ExtensionSource`].
///
/// Useful when the extension values were obtained without an X.509 parser,
/// e.g. from a validation report or a test vector.
#[derive(Debug, Clone, Default)]
pub struct ExtensionValues {
    critical: Vec<String>,
    non_critical: Vec<String>,
    values: HashMap<String, Vec<u8>>,
}

impl ExtensionValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an extension.  `value` is the DER `OCTET STRING` wrapping the
    /// extension structure.  Re-adding an OID replaces its value.
    pub fn insert(&mut self, oid: impl Into<String>, critical: bool, value: Vec<u8>) {
        let oid = oid.into();
        let list = if critical {
            &mut self.critical
        } else {
            &mut self.non_critical
        };
        if !list.contains(&oid) {
            list.push(oid.clone());
        }
        self.values.insert(oid, value);
    }

    /// Builder form of [`ExtensionValues::insert`].
    pub fn with(mut self, oid: impl Into<String>, critical: bool, value: Vec<u8>) -> Self {
        self.insert(oid, critical, value);
        self
    }
}

impl ExtensionSource for ExtensionValues {
    fn critical_extension_oids(&self) -> Vec<String> {
        self.critical.clone()
    }

    fn non_critical_extension_oids(&self) -> Vec<String> {
        self.non_critical.clone()
    }

    fn extension_value(&self, oid: &str) -> Option<Vec<u8>> {
        self.values.get(oid).cloned()
    }
}

/// What the registry does with a decoder error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Log a warning and leave the extension out of the aggregate.
    Omit,
    /// Return the error from [`decode_extensions`].
    Propagate,
}

/// Options for [`decode_extensions_with_options`].
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    /// Propagate decode failures of the Authority and Subject Key Identifier
    /// extensions.  When false they are omitted like every other extension.
    pub strict_key_identifiers: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions {
            strict_key_identifiers: true,
        }
    }
}

type DecodeFn = fn(&RawExtension) -> Result<CertificateExtension, CertMetaError>;

struct DecoderEntry {
    kind: ExtensionKind,
    policy: FailurePolicy,
    decode: DecodeFn,
}

static DECODERS: &[DecoderEntry] = &[
    DecoderEntry {
        kind: ExtensionKind::SubjectKeyIdentifier,
        policy: FailurePolicy::Propagate,
        decode: |raw| {
            decoders::decode_subject_key_identifier(raw)
                .map(CertificateExtension::SubjectKeyIdentifier)
        },
    },
    DecoderEntry {
        kind: ExtensionKind::AuthorityKeyIdentifier,
        policy: FailurePolicy::Propagate,
        decode: |raw| {
            decoders::decode_authority_key_identifier(raw)
                .map(CertificateExtension::AuthorityKeyIdentifier)
        },
    },
    DecoderEntry {
        kind: ExtensionKind::AuthorityInformationAccess,
        policy: FailurePolicy::Omit,
        decode: |raw| {
            decoders::decode_authority_information_access(raw)
                .map(CertificateExtension::AuthorityInformationAccess)
        },
    },
    DecoderEntry {
        kind: ExtensionKind::CrlDistributionPoints,
        policy: FailurePolicy::Omit,
        decode: |raw| {
            decoders::decode_crl_distribution_points(raw)
                .map(CertificateExtension::CrlDistributionPoints)
        },
    },
    DecoderEntry {
        kind: ExtensionKind::BasicConstraints,
        policy: FailurePolicy::Omit,
        decode: |raw| {
            decoders::decode_basic_constraints(raw).map(CertificateExtension::BasicConstraints)
        },
    },
    DecoderEntry {
        kind: ExtensionKind::KeyUsage,
        policy: FailurePolicy::Omit,
        decode: |raw| decoders::decode_key_usage(raw).map(CertificateExtension::KeyUsage),
    },
    DecoderEntry {
        kind: ExtensionKind::ExtendedKeyUsage,
        policy: FailurePolicy::Omit,
        decode: |raw| {
            decoders::decode_extended_key_usage(raw).map(CertificateExtension::ExtendedKeyUsage)
        },
    },
    DecoderEntry {
        kind: ExtensionKind::CertificatePolicies,
        policy: FailurePolicy::Omit,
        decode: |raw| {
            decoders::decode_certificate_policies(raw)
                .map(CertificateExtension::CertificatePolicies)
        },
    },
    DecoderEntry {
        kind: ExtensionKind::SubjectAlternativeNames,
        policy: FailurePolicy::Omit,
        decode: |raw| {
            decoders::decode_subject_alternative_names(raw)
                .map(CertificateExtension::SubjectAlternativeNames)
        },
    },
    DecoderEntry {
        kind: ExtensionKind::OcspNoCheck,
        policy: FailurePolicy::Omit,
        decode: |raw| Ok(CertificateExtension::OcspNoCheck(decoders::decode_ocsp_no_check(raw))),
    },
    DecoderEntry {
        kind: ExtensionKind::ValidityAssuredShortTerm,
        policy: FailurePolicy::Omit,
        decode: |raw| {
            Ok(CertificateExtension::ValidityAssuredShortTerm(
                decoders::decode_validity_assured_short_term(raw),
            ))
        },
    },
    DecoderEntry {
        kind: ExtensionKind::QcStatements,
        policy: FailurePolicy::Omit,
        decode: |raw| qc::decode_qc_statements(raw).map(CertificateExtension::QcStatements),
    },
];

fn lookup(oid: &str) -> Option<&'static DecoderEntry> {
    DECODERS.iter().find(|entry| entry.kind.oid() == oid)
}

/// Failure policy applied to `kind` under `options`.
pub fn failure_policy(kind: ExtensionKind, options: &DecodeOptions) -> FailurePolicy {
    let table_policy = DECODERS
        .iter()
        .find(|entry| entry.kind == kind)
        .map_or(FailurePolicy::Omit, |entry| entry.policy);
    if table_policy == FailurePolicy::Propagate && !options.strict_key_identifiers {
        FailurePolicy::Omit
    } else {
        table_policy
    }
}

/// Decode every extension of `source` with the default [`DecodeOptions`].
pub fn decode_extensions<S: ExtensionSource + ?Sized>(
    source: &S,
) -> Result<CertificateExtensions, CertMetaError> {
    decode_extensions_with_options(source, &DecodeOptions::default())
}

/// Decode every extension of `source`.
///
/// Critical OIDs are visited first; an OID listed in both sets is decoded
/// once and reported as critical.  Unknown OIDs become
/// [`OtherExtension`]s.  The only errors returned are those of decoders whose
/// [`FailurePolicy`] is `Propagate`.
pub fn decode_extensions_with_options<S: ExtensionSource + ?Sized>(
    source: &S,
    options: &DecodeOptions,
) -> Result<CertificateExtensions, CertMetaError> {
    let critical = source.critical_extension_oids();
    let non_critical = source.non_critical_extension_oids();

    let mut seen = BTreeSet::new();
    let mut result = CertificateExtensions::default();

    for oid in critical.iter().chain(non_critical.iter()) {
        if !seen.insert(oid.as_str()) {
            continue;
        }

        let Some(octets) = source.extension_value(oid) else {
            warn!("No value for certificate extension with OID '{}'", oid);
            continue;
        };

        let raw = RawExtension {
            oid: oid.clone(),
            octets,
            critical: critical.contains(oid),
        };

        let Some(entry) = lookup(oid) else {
            warn!("Not supported certificate extension with OID '{}'", oid);
            result.push(CertificateExtension::Other(OtherExtension { raw }));
            continue;
        };

        debug!(oid = %oid, critical = raw.critical, "decoding {}", entry.kind.name());
        match (entry.decode)(&raw) {
            Ok(extension) => result.push(extension),
            Err(e) => match failure_policy(entry.kind, options) {
                FailurePolicy::Propagate => {
                    return Err(CertMetaError::ExtensionError {
                        name: entry.kind.name(),
                        reason: e.to_string(),
                    });
                }
                FailurePolicy::Omit => {
                    if tracing::enabled!(tracing::Level::DEBUG) {
                        warn!(
                            "Unable to decode {} extension: {}. Obtained binaries: '{}'",
                            entry.kind.name(),
                            e,
                            util::base64_line(&raw.octets)
                        );
                    } else {
                        warn!("Unable to decode {} extension: {}", entry.kind.name(), e);
                    }
                }
            },
        }
    }

    Ok(result)
}
