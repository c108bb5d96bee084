//! Decoders for the RFC 5280 extensions and the ETSI revocation markers.
//!
//! Each decoder takes the raw extension (value still wrapped in its
//! `OCTET STRING`) and either returns the typed structure or an error; the
//! registry decides what an error means.

use crate::asn1::{self, AsnNode};
use crate::fields::{
    AuthorityInformationAccess, AuthorityKeyIdentifier, BasicConstraints, CertificatePolicies,
    CertificatePolicy, CrlDistributionPoints, ExtendedKeyUsages, KeyUsage, KeyUsageBit,
    OcspNoCheck, RawExtension, SubjectAlternativeNames, SubjectKeyIdentifier,
    ValidityAssuredShortTerm,
};
use crate::oid;
use crate::util::{der_wrap, der_wrap_all};
use crate::CertMetaError;
use der_parser::asn1_rs::Any;
use der_parser::ber::BerObjectContent;
use der_parser::oid::Oid;
use std::borrow::Cow;
use tracing::{debug, warn};
use x509_parser::prelude::{FromDer, X509Name};

fn malformed(what: impl std::fmt::Display) -> CertMetaError {
    CertMetaError::MalformedAsn1(what.to_string())
}

// ---------------------------------------------------------------------------
// GeneralName
// ---------------------------------------------------------------------------

/// `uniformResourceIdentifier [6] IA5String`, or `None` for any other form.
fn general_name_uri(node: &AsnNode<'_>) -> Option<String> {
    asn1::context_content(node, 6)
        .and_then(|bytes| std::str::from_utf8(bytes).ok())
        .map(str::to_string)
}

/// String form of the GeneralName kinds that have one.
fn general_name_string(node: &AsnNode<'_>) -> Option<String> {
    let tag = asn1::context_tag(node)?;
    let content = asn1::context_content(node, tag)?;
    match tag {
        // rfc822Name, dNSName, uniformResourceIdentifier
        1 | 2 | 6 => std::str::from_utf8(content).ok().map(str::to_string),
        4 => X509Name::from_der(content).ok().map(|(_, name)| name.to_string()),
        7 => Some(format_ip_bytes(content)),
        8 => Some(Oid::new(Cow::Borrowed(content)).to_id_string()),
        _ => None,
    }
}

fn format_ip_bytes(bytes: &[u8]) -> String {
    if let Ok(octets) = <[u8; 4]>::try_from(bytes) {
        std::net::Ipv4Addr::from(octets).to_string()
    } else if let Ok(octets) = <[u8; 16]>::try_from(bytes) {
        std::net::Ipv6Addr::from(octets).to_string()
    } else {
        hex::encode(bytes)
    }
}

// ---------------------------------------------------------------------------
// Key identifiers
// ---------------------------------------------------------------------------

pub(crate) fn decode_subject_key_identifier(
    raw: &RawExtension,
) -> Result<SubjectKeyIdentifier, CertMetaError> {
    let inner = asn1::unwrap_octet_string(&raw.octets)?;
    let node = asn1::parse_primitive(inner)?;
    match node.content {
        BerObjectContent::OctetString(key_id) => Ok(SubjectKeyIdentifier {
            raw: raw.clone(),
            key_identifier: key_id.to_vec(),
        }),
        _ => Err(malformed("SubjectKeyIdentifier is not an OCTET STRING")),
    }
}

/// ```text
/// AuthorityKeyIdentifier ::= SEQUENCE {
///     keyIdentifier             [0] KeyIdentifier           OPTIONAL,
///     authorityCertIssuer       [1] GeneralNames            OPTIONAL,
///     authorityCertSerialNumber [2] CertificateSerialNumber OPTIONAL }
/// ```
pub(crate) fn decode_authority_key_identifier(
    raw: &RawExtension,
) -> Result<AuthorityKeyIdentifier, CertMetaError> {
    let items = asn1::sequence_from_octet_string(&raw.octets)?;

    let mut key_identifier = None;
    let mut issuer_names = None;
    let mut serial = None;
    for item in &items {
        match asn1::context_tag(item) {
            Some(0) => key_identifier = asn1::context_content(item, 0).map(<[u8]>::to_vec),
            Some(1) => issuer_names = asn1::context_content(item, 1),
            Some(2) => serial = asn1::context_content(item, 2),
            _ => return Err(malformed("unexpected element in AuthorityKeyIdentifier")),
        }
    }

    let authority_cert_issuer_serial = match (issuer_names, serial) {
        (Some(names), Some(serial)) => {
            // IssuerSerial ::= SEQUENCE { issuer GeneralNames, serialNumber INTEGER }
            let general_names = der_wrap(0x30, names)?;
            let serial_number = der_wrap(0x02, serial)?;
            Some(der_wrap_all(0x30, &[&general_names, &serial_number])?)
        }
        _ => None,
    };

    Ok(AuthorityKeyIdentifier {
        raw: raw.clone(),
        key_identifier,
        authority_cert_issuer_serial,
    })
}

// ---------------------------------------------------------------------------
// Access locations
// ---------------------------------------------------------------------------

/// Split the access descriptions by method, keeping URI locations only.
pub(crate) fn decode_authority_information_access(
    raw: &RawExtension,
) -> Result<AuthorityInformationAccess, CertMetaError> {
    let descriptions = asn1::sequence_from_octet_string(&raw.octets)?;
    if descriptions.is_empty() {
        return Err(malformed("AuthorityInformationAccess has no access description"));
    }

    let mut ca_issuers = Vec::new();
    let mut ocsp = Vec::new();
    for description in &descriptions {
        let fields = asn1::sequence_items(description)?;
        let (Some(method), Some(location)) = (fields.first(), fields.get(1)) else {
            return Err(malformed("incomplete AccessDescription"));
        };
        let method = asn1::oid_string(method)?;
        let Some(uri) = general_name_uri(location) else {
            continue;
        };
        match method.as_str() {
            oid::ACCESS_CA_ISSUERS => ca_issuers.push(uri),
            oid::ACCESS_OCSP => ocsp.push(uri),
            _ => {}
        }
    }

    Ok(AuthorityInformationAccess {
        raw: raw.clone(),
        ca_issuers,
        ocsp,
    })
}

/// Pick one issuer certificate URL: the first HTTP(S) one, else the first.
pub fn preferred_ca_issuers_url(urls: &[String]) -> Option<&str> {
    urls.iter()
        .find(|url| {
            let lower = url.to_ascii_lowercase();
            lower.starts_with("http://") || lower.starts_with("https://")
        })
        .or_else(|| urls.first())
        .map(String::as_str)
}

impl AuthorityInformationAccess {
    /// See [`preferred_ca_issuers_url`].
    pub fn preferred_ca_issuer(&self) -> Option<&str> {
        preferred_ca_issuers_url(&self.ca_issuers)
    }
}

/// ```text
/// DistributionPoint ::= SEQUENCE {
///     distributionPoint [0] DistributionPointName OPTIONAL, ... }
/// DistributionPointName ::= CHOICE {
///     fullName                [0] GeneralNames,
///     nameRelativeToCRLIssuer [1] RelativeDistinguishedName }
/// ```
pub(crate) fn decode_crl_distribution_points(
    raw: &RawExtension,
) -> Result<CrlDistributionPoints, CertMetaError> {
    let points = asn1::sequence_from_octet_string(&raw.octets)?;

    let mut urls = Vec::new();
    for point in &points {
        for field in asn1::sequence_items(point)? {
            let Some(point_name) = asn1::context_content(field, 0) else {
                continue;
            };
            for (_, name) in asn1::read_elements(point_name)? {
                let Some(full_name) = asn1::context_content(&name, 0) else {
                    continue;
                };
                for (_, general_name) in asn1::read_elements(full_name)? {
                    if let Some(uri) = general_name_uri(&general_name) {
                        urls.push(uri);
                    }
                }
            }
        }
    }

    Ok(CrlDistributionPoints {
        raw: raw.clone(),
        urls,
    })
}

// ---------------------------------------------------------------------------
// Constraints and usages
// ---------------------------------------------------------------------------

pub(crate) fn decode_basic_constraints(
    raw: &RawExtension,
) -> Result<BasicConstraints, CertMetaError> {
    let items = asn1::sequence_from_octet_string(&raw.octets)?;

    let mut ca = false;
    let mut path_len = None;
    for item in &items {
        match &item.content {
            BerObjectContent::Boolean(value) => ca = *value,
            BerObjectContent::Integer(_) => path_len = Some(asn1::small_integer(item)?),
            _ => return Err(malformed("unexpected element in BasicConstraints")),
        }
    }

    let path_len_constraint = match (ca, path_len) {
        (false, _) => -1,
        (true, Some(n)) if n >= 0 => n,
        (true, Some(n)) => return Err(malformed(format!("negative pathLenConstraint {}", n))),
        (true, None) => i64::MAX,
    };

    Ok(BasicConstraints {
        raw: raw.clone(),
        ca: path_len_constraint != -1,
        path_len_constraint,
    })
}

pub(crate) fn decode_key_usage(raw: &RawExtension) -> Result<KeyUsage, CertMetaError> {
    let inner = asn1::unwrap_octet_string(&raw.octets)?;
    let node = asn1::parse_primitive(inner)?;
    let BerObjectContent::BitString(_, bit_string) = &node.content else {
        return Err(malformed("KeyUsage is not a BIT STRING"));
    };

    let data = bit_string.data;
    let bits = KeyUsageBit::ALL
        .iter()
        .enumerate()
        .filter(|(position, _)| {
            data.get(position / 8)
                .is_some_and(|byte| byte & (0x80 >> (position % 8)) != 0)
        })
        .map(|(_, bit)| *bit)
        .collect();

    Ok(KeyUsage {
        raw: raw.clone(),
        bits,
    })
}

pub(crate) fn decode_extended_key_usage(
    raw: &RawExtension,
) -> Result<ExtendedKeyUsages, CertMetaError> {
    let items = asn1::sequence_from_octet_string(&raw.octets)?;
    let oids = items
        .iter()
        .map(asn1::oid_string)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ExtendedKeyUsages {
        raw: raw.clone(),
        oids,
    })
}

/// `CPSuri ::= IA5String`.  An undecodable value leaves the policy without
/// a CPS pointer.
fn cps_uri(value: &Any<'_>) -> Option<String> {
    match asn1::any_string_value(value) {
        Ok(uri) => Some(uri),
        Err(e) => {
            warn!("Unable to extract CPS URI of a certificate policy: {}", e);
            None
        }
    }
}

/// ```text
/// PolicyInformation ::= SEQUENCE {
///     policyIdentifier   CertPolicyId,
///     policyQualifiers   SEQUENCE OF PolicyQualifierInfo OPTIONAL }
/// PolicyQualifierInfo ::= SEQUENCE {
///     policyQualifierId  PolicyQualifierId,
///     qualifier          ANY DEFINED BY policyQualifierId }
/// ```
///
/// Walked undecoded: user notices may hold BMP text that der-parser cannot
/// parse as part of a tree.  User notices are not decoded.  When a policy
/// carries several CPS qualifiers the last one is kept.
pub(crate) fn decode_certificate_policies(
    raw: &RawExtension,
) -> Result<CertificatePolicies, CertMetaError> {
    let inner = asn1::unwrap_octet_string(&raw.octets)?;
    let items = asn1::any_elements(inner)?;

    let mut policies = Vec::with_capacity(items.len());
    for information in &items {
        let fields = asn1::any_members(information)?;
        let policy_oid = fields
            .first()
            .ok_or_else(|| malformed("PolicyInformation without policyIdentifier"))?;

        let mut cps_url = None;
        if let Some(qualifiers) = fields.get(1) {
            for qualifier in asn1::any_members(qualifiers)? {
                let parts = asn1::any_members(&qualifier)?;
                let (Some(id), Some(value)) = (parts.first(), parts.get(1)) else {
                    continue;
                };
                match asn1::any_oid_string(id)?.as_str() {
                    oid::QT_CPS => cps_url = cps_uri(value),
                    oid::QT_UNOTICE => {}
                    other => debug!("Ignoring policy qualifier with OID '{}'", other),
                }
            }
        }

        policies.push(CertificatePolicy {
            oid: asn1::any_oid_string(policy_oid)?,
            cps_url,
        });
    }

    Ok(CertificatePolicies {
        raw: raw.clone(),
        policies,
    })
}

pub(crate) fn decode_subject_alternative_names(
    raw: &RawExtension,
) -> Result<SubjectAlternativeNames, CertMetaError> {
    let items = asn1::sequence_from_octet_string(&raw.octets)?;
    let names = items.iter().filter_map(general_name_string).collect();
    Ok(SubjectAlternativeNames {
        raw: raw.clone(),
        names,
    })
}

// ---------------------------------------------------------------------------
// NULL-valued markers
// ---------------------------------------------------------------------------

fn is_null_marker(octets: &[u8]) -> bool {
    asn1::unwrap_octet_string(octets)
        .and_then(asn1::parse_primitive)
        .is_ok_and(|node| asn1::is_null(&node))
}

/// id-pkix-ocsp-nocheck (RFC 6960 Section 4.2.2.2.1).
pub(crate) fn decode_ocsp_no_check(raw: &RawExtension) -> OcspNoCheck {
    OcspNoCheck {
        raw: raw.clone(),
        present: is_null_marker(&raw.octets),
    }
}

/// ext-etsi-valassured-ST-certs (ETSI EN 319 412-1 Section 5.2.2).
pub(crate) fn decode_validity_assured_short_term(raw: &RawExtension) -> ValidityAssuredShortTerm {
    ValidityAssuredShortTerm {
        raw: raw.clone(),
        present: is_null_marker(&raw.octets),
    }
}
