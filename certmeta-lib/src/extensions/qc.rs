//! Qualified certificate statements (RFC 3739, ETSI EN 319 412-5).
//!
//! ```text
//! QCStatements ::= SEQUENCE OF QCStatement
//! QCStatement  ::= SEQUENCE { statementId OBJECT IDENTIFIER,
//!                             statementInfo ANY DEFINED BY statementId OPTIONAL }
//! ```
//!
//! Statements are decoded independently.  A statement that fails to decode
//! is logged and leaves its field empty; it never fails the extension.

use crate::asn1::{self, AsnNode};
use crate::fields::{
    PdsLocation, Psd2QcType, QcLimitValue, QcStatements, QcType, RawExtension, RoleOfPsp,
    SemanticsIdentifier,
};
use crate::oid;
use crate::util;
use crate::CertMetaError;
use der_parser::ber::BerObjectContent;
use tracing::warn;

fn malformed(what: impl std::fmt::Display) -> CertMetaError {
    CertMetaError::MalformedAsn1(what.to_string())
}

pub(crate) fn decode_qc_statements(raw: &RawExtension) -> Result<QcStatements, CertMetaError> {
    let statements = asn1::sequence_from_octet_string(&raw.octets)?;

    let mut result = QcStatements {
        raw: raw.clone(),
        ..QcStatements::default()
    };

    for statement in &statements {
        let (statement_id, info) = match split_statement(statement) {
            Ok(parts) => parts,
            Err(e) => {
                log_failure("QCStatement", &e, Some(statement));
                continue;
            }
        };

        match statement_id.as_str() {
            oid::QCS_COMPLIANCE => result.qc_compliance = true,
            oid::QCS_QSCD => result.qc_qscd = true,
            oid::QCS_LIMIT_VALUE => {
                result.qc_limit_value = recover("QcLimitValue", info, limit_value);
            }
            oid::QCS_RETENTION_PERIOD => {
                result.qc_eu_retention_period =
                    recover("QcEuRetentionPeriod", info, retention_period);
            }
            oid::QCS_PDS => {
                result.qc_eu_pds = recover("QcEuPDS", info, pds_locations).unwrap_or_default();
            }
            oid::QCS_QC_TYPE => {
                result.qc_types = recover("QcTypes", info, qc_types).unwrap_or_default();
            }
            oid::QCS_CC_LEGISLATION => {
                result.qc_legislation_country_codes =
                    recover("QcCClegislation", info, legislation_country_codes)
                        .unwrap_or_default();
            }
            oid::QCS_PKIX_SYNTAX_V2 => {
                result.qc_semantics_identifier =
                    recover("QcSemanticsIdentifier", info, semantics_identifier).flatten();
            }
            oid::QCS_PSD2 => {
                result.psd2_qc_type = recover("PSD2-QcStatement", info, psd2_qc_type);
            }
            other => {
                warn!("Not supported QcStatement with OID '{}'", other);
                result.other_oids.push(other.to_string());
            }
        }
    }

    Ok(result)
}

fn split_statement<'n, 'a>(
    statement: &'n AsnNode<'a>,
) -> Result<(String, Option<&'n AsnNode<'a>>), CertMetaError> {
    let parts = asn1::sequence_items(statement)?;
    let id = parts
        .first()
        .ok_or_else(|| malformed("QCStatement without statementId"))?;
    Ok((asn1::oid_string(id)?, parts.get(1)))
}

/// Run a statement decoder, turning any failure into a logged `None`.
fn recover<T>(
    what: &str,
    info: Option<&AsnNode<'_>>,
    decode: impl FnOnce(&AsnNode<'_>) -> Result<T, CertMetaError>,
) -> Option<T> {
    let result = match info {
        Some(node) => decode(node),
        None => Err(malformed("missing statementInfo")),
    };
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            log_failure(what, &e, info);
            None
        }
    }
}

fn log_failure(what: &str, error: &CertMetaError, node: Option<&AsnNode<'_>>) {
    if tracing::enabled!(tracing::Level::DEBUG) {
        let binaries = node
            .and_then(|n| asn1::encode_der(n).ok())
            .map(|der| util::base64_line(&der))
            .unwrap_or_default();
        warn!(
            "Unable to extract {}: {}. Obtained binaries: '{}'",
            what, error, binaries
        );
    } else {
        warn!("Unable to extract {}: {}", what, error);
    }
}

/// ```text
/// MonetaryValue ::= SEQUENCE {
///     currency Iso4217CurrencyCode,   -- PrintableString or INTEGER
///     amount   INTEGER,
///     exponent INTEGER }
/// ```
fn limit_value(node: &AsnNode<'_>) -> Result<QcLimitValue, CertMetaError> {
    let fields = asn1::sequence_items(node)?;
    let (Some(currency), Some(amount), Some(exponent)) = (fields.first(), fields.get(1), fields.get(2))
    else {
        return Err(malformed("incomplete MonetaryValue"));
    };

    let currency = match currency.content {
        BerObjectContent::Integer(_) => asn1::small_integer(currency)?.to_string(),
        _ => asn1::string_value(currency)?,
    };

    Ok(QcLimitValue {
        currency,
        amount: asn1::small_integer(amount)?,
        exponent: asn1::small_integer(exponent)?,
    })
}

fn retention_period(node: &AsnNode<'_>) -> Result<i32, CertMetaError> {
    let years = asn1::small_integer(node)?;
    i32::try_from(years).map_err(|_| malformed(format!("retention period {} out of range", years)))
}

/// `QcEuPDS ::= SEQUENCE OF SEQUENCE { url IA5String, language PrintableString }`
fn pds_locations(node: &AsnNode<'_>) -> Result<Vec<PdsLocation>, CertMetaError> {
    let mut locations = Vec::new();
    for entry in asn1::sequence_items(node)? {
        let Ok(fields) = asn1::sequence_items(entry) else {
            warn!("QcEuPDS entry is not a SEQUENCE, skipped");
            continue;
        };
        let (Some(url), Some(language)) = (fields.first(), fields.get(1)) else {
            return Err(malformed("incomplete PdsLocation"));
        };
        locations.push(PdsLocation {
            url: asn1::string_value(url)?,
            language: asn1::string_value(language)?,
        });
    }
    Ok(locations)
}

/// `QcType ::= SEQUENCE OF OBJECT IDENTIFIER`; unknown types are dropped.
fn qc_types(node: &AsnNode<'_>) -> Result<Vec<QcType>, CertMetaError> {
    let mut types = Vec::new();
    for entry in asn1::sequence_items(node)? {
        let Ok(type_oid) = asn1::oid_string(entry) else {
            warn!("QcType entry is not an OBJECT IDENTIFIER, skipped");
            continue;
        };
        match QcType::from_oid(&type_oid) {
            Some(qc_type) => types.push(qc_type),
            None => warn!("Not supported QcType with OID '{}'", type_oid),
        }
    }
    Ok(types)
}

/// `QcCClegislation ::= SEQUENCE OF CountryName`
fn legislation_country_codes(node: &AsnNode<'_>) -> Result<Vec<String>, CertMetaError> {
    asn1::sequence_items(node)?
        .iter()
        .map(asn1::string_value)
        .collect()
}

/// ```text
/// SemanticsInformation ::= SEQUENCE {
///     semanticsIdentifier        OBJECT IDENTIFIER OPTIONAL,
///     nameRegistrationAuthorities NameRegistrationAuthorities OPTIONAL }
/// ```
fn semantics_identifier(node: &AsnNode<'_>) -> Result<Option<SemanticsIdentifier>, CertMetaError> {
    let fields = asn1::sequence_items(node)?;
    let Some(first) = fields.first() else {
        return Ok(None);
    };
    let BerObjectContent::OID(_) = first.content else {
        return Ok(None);
    };
    let identifier = asn1::oid_string(first)?;
    let known = SemanticsIdentifier::from_oid(&identifier);
    if known.is_none() {
        warn!("Not supported semantics identifier with OID '{}'", identifier);
    }
    Ok(known)
}

/// ```text
/// PSD2QcType ::= SEQUENCE {
///     rolesOfPSP RolesOfPSP,      -- SEQUENCE OF SEQUENCE { roleOfPspOid, roleOfPspName }
///     nCAName    NCAName,
///     nCAId      NCAId }
/// ```
fn psd2_qc_type(node: &AsnNode<'_>) -> Result<Psd2QcType, CertMetaError> {
    let fields = asn1::sequence_items(node)?;
    let (Some(roles), Some(nca_name), Some(nca_id)) = (fields.first(), fields.get(1), fields.get(2))
    else {
        return Err(malformed("incomplete PSD2QcType"));
    };

    let roles = asn1::sequence_items(roles)?
        .iter()
        .map(|role| -> Result<RoleOfPsp, CertMetaError> {
            let parts = asn1::sequence_items(role)?;
            let (Some(role_oid), Some(name)) = (parts.first(), parts.get(1)) else {
                return Err(malformed("incomplete RoleOfPSP"));
            };
            Ok(RoleOfPsp {
                oid: asn1::oid_string(role_oid)?,
                name: asn1::string_value(name)?,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Psd2QcType {
        roles,
        nca_name: asn1::string_value(nca_name)?,
        nca_id: asn1::string_value(nca_id)?,
    })
}
