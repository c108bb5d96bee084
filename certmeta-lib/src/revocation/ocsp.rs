//! OCSP certificate identity (RFC 6960).
//!
//! ```text
//! CertID ::= SEQUENCE {
//!     hashAlgorithm   AlgorithmIdentifier,
//!     issuerNameHash  OCTET STRING,  -- hash of issuer's DN
//!     issuerKeyHash   OCTET STRING,  -- hash of issuer's public key
//!     serialNumber    CertificateSerialNumber }
//!
//! SingleResponse ::= SEQUENCE {
//!     certID              CertID,
//!     certStatus          CertStatus,
//!     thisUpdate          GeneralizedTime,
//!     nextUpdate          [0] EXPLICIT GeneralizedTime OPTIONAL,
//!     singleExtensions    [1] EXPLICIT Extensions OPTIONAL }
//! ```
//!
//! Responders disagree on whether the `hashAlgorithm` parameters are an
//! explicit `NULL` or absent.  [`CertificateId`] therefore has no structural
//! equality; identities are compared with [`CertificateId::matches`], which
//! ignores the parameters.

use super::crl::{reason_from_enumerated, RevocationReason};
use crate::asn1::{self, AsnNode};
use crate::digest::{compute_digest, DigestAlgorithm};
use crate::oid;
use crate::util::{der_wrap, der_wrap_all};
use crate::CertMetaError;
use der_parser::ber::BerObjectContent;
use num_bigint::BigInt;
use serde::{Serialize, Serializer};
use tracing::{debug, warn};
use x509_parser::prelude::{FromDer, X509Certificate};
use x509_parser::time::ASN1Time;

fn malformed(what: impl std::fmt::Display) -> CertMetaError {
    CertMetaError::MalformedAsn1(what.to_string())
}

fn serialize_bigint<S: Serializer>(value: &BigInt, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(value)
}

fn hex_bytes<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&hex::encode(bytes))
}

/// DER encoding of ASN.1 `NULL`.
const DER_NULL: [u8; 2] = [0x05, 0x00];

/// Identity of a certificate within an OCSP exchange.
#[derive(Debug, Clone, Serialize)]
pub struct CertificateId {
    pub hash_algorithm_oid: String,
    /// DER of the `hashAlgorithm` parameters; `None` when absent.
    #[serde(skip)]
    pub hash_algorithm_parameters: Option<Vec<u8>>,
    #[serde(serialize_with = "hex_bytes")]
    pub issuer_name_hash: Vec<u8>,
    #[serde(serialize_with = "hex_bytes")]
    pub issuer_key_hash: Vec<u8>,
    #[serde(serialize_with = "serialize_bigint")]
    pub serial_number: BigInt,
}

impl CertificateId {
    /// Build an identity from already extracted certificate fields.
    ///
    /// `issuer_name` is the DER of the issuer's subject `Name`;
    /// `issuer_public_key` is the value of its `subjectPublicKey` BIT STRING.
    /// The parameters are encoded as `NULL`.
    pub fn from_parts(
        algorithm: DigestAlgorithm,
        issuer_name: &[u8],
        issuer_public_key: &[u8],
        serial_number: BigInt,
    ) -> Self {
        CertificateId {
            hash_algorithm_oid: algorithm.oid().to_string(),
            hash_algorithm_parameters: Some(DER_NULL.to_vec()),
            issuer_name_hash: compute_digest(algorithm, &[issuer_name]),
            issuer_key_hash: compute_digest(algorithm, &[issuer_public_key]),
            serial_number,
        }
    }

    /// Parse a DER `CertID`.
    pub fn from_der(bytes: &[u8]) -> Result<Self, CertMetaError> {
        let node = asn1::parse_primitive(bytes)?;
        Self::from_node(&node)
    }

    fn from_node(node: &AsnNode<'_>) -> Result<Self, CertMetaError> {
        let fields = asn1::sequence_items(node)?;
        let (Some(algorithm), Some(name_hash), Some(key_hash), Some(serial)) =
            (fields.first(), fields.get(1), fields.get(2), fields.get(3))
        else {
            return Err(malformed("incomplete CertID"));
        };

        let algorithm = asn1::sequence_items(algorithm)?;
        let algorithm_oid = algorithm
            .first()
            .ok_or_else(|| malformed("AlgorithmIdentifier without algorithm"))?;
        let parameters = algorithm.get(1).map(asn1::encode_der).transpose()?;

        Ok(CertificateId {
            hash_algorithm_oid: asn1::oid_string(algorithm_oid)?,
            hash_algorithm_parameters: parameters,
            issuer_name_hash: octet_string(name_hash)?.to_vec(),
            issuer_key_hash: octet_string(key_hash)?.to_vec(),
            serial_number: asn1::integer_value(serial)?,
        })
    }

    /// DER `CertID`, e.g. for an OCSP request.
    pub fn to_der(&self) -> Result<Vec<u8>, CertMetaError> {
        let algorithm = DigestAlgorithm::from_oid(&self.hash_algorithm_oid)?;
        let parameters = self.hash_algorithm_parameters.as_deref().unwrap_or_default();
        let algorithm_identifier = der_wrap_all(0x30, &[algorithm.oid_der(), parameters])?;
        let name_hash = der_wrap(0x04, &self.issuer_name_hash)?;
        let key_hash = der_wrap(0x04, &self.issuer_key_hash)?;
        let serial = der_wrap(0x02, &self.serial_number.to_signed_bytes_be())?;
        der_wrap_all(0x30, &[&algorithm_identifier, &name_hash, &key_hash, &serial])
    }

    /// Digest algorithm named by `hash_algorithm_oid`.
    pub fn digest_algorithm(&self) -> Result<DigestAlgorithm, CertMetaError> {
        DigestAlgorithm::from_oid(&self.hash_algorithm_oid)
    }

    /// Logical identity: algorithm OID, both hashes and the serial number.
    /// The algorithm parameters are not compared.
    pub fn matches(&self, other: &CertificateId) -> bool {
        self.hash_algorithm_oid == other.hash_algorithm_oid
            && self.issuer_key_hash == other.issuer_key_hash
            && self.issuer_name_hash == other.issuer_name_hash
            && self.serial_number == other.serial_number
    }
}

fn octet_string<'a>(node: &AsnNode<'a>) -> Result<&'a [u8], CertMetaError> {
    match node.content {
        BerObjectContent::OctetString(bytes) => Ok(bytes),
        _ => Err(malformed("expected OCTET STRING")),
    }
}

/// SHA-1 [`CertificateId`] of `cert` as issued by `issuer`.
pub fn build_certificate_id(
    cert: &X509Certificate<'_>,
    issuer: &X509Certificate<'_>,
) -> Result<CertificateId, CertMetaError> {
    build_certificate_id_with(cert, issuer, oid::SHA1)
}

/// [`CertificateId`] of `cert` computed with the hash algorithm `hash_algorithm_oid`.
pub fn build_certificate_id_with(
    cert: &X509Certificate<'_>,
    issuer: &X509Certificate<'_>,
    hash_algorithm_oid: &str,
) -> Result<CertificateId, CertMetaError> {
    let algorithm = DigestAlgorithm::from_oid(hash_algorithm_oid)?;
    Ok(CertificateId::from_parts(
        algorithm,
        issuer.subject().as_raw(),
        &issuer.public_key().subject_public_key.data,
        BigInt::from_signed_bytes_be(cert.raw_serial()),
    ))
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Status reported for one certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CertStatus {
    Good,
    Revoked {
        /// Unix timestamp (seconds, UTC).
        revocation_time: i64,
        reason: Option<RevocationReason>,
    },
    Unknown,
}

#[derive(Debug, Clone, Serialize)]
pub struct SingleResponse {
    pub cert_id: CertificateId,
    pub status: CertStatus,
    /// Unix timestamp (seconds, UTC).
    pub this_update: i64,
    pub next_update: Option<i64>,
}

impl SingleResponse {
    pub fn from_der(bytes: &[u8]) -> Result<Self, CertMetaError> {
        let elements = asn1::constructed_elements(bytes)?;
        let mut fields = elements.iter();

        let (_, cert_id) = fields
            .next()
            .ok_or_else(|| malformed("SingleResponse without certID"))?;
        let (_, status) = fields
            .next()
            .ok_or_else(|| malformed("SingleResponse without certStatus"))?;
        let (this_update, _) = fields
            .next()
            .ok_or_else(|| malformed("SingleResponse without thisUpdate"))?;

        let mut next_update = None;
        for (_, field) in fields {
            if let Some(explicit) = asn1::context_content(field, 0) {
                next_update = Some(parse_time(explicit)?);
            }
        }

        Ok(SingleResponse {
            cert_id: CertificateId::from_node(cert_id)?,
            status: parse_cert_status(status)?,
            this_update: parse_time(this_update)?,
            next_update,
        })
    }

    /// Digest algorithm the responder used for this response's identity.
    pub fn digest_algorithm(&self) -> Result<DigestAlgorithm, CertMetaError> {
        self.cert_id.digest_algorithm()
    }
}

/// ```text
/// CertStatus ::= CHOICE {
///     good        [0] IMPLICIT NULL,
///     revoked     [1] IMPLICIT RevokedInfo,
///     unknown     [2] IMPLICIT UnknownInfo }
/// RevokedInfo ::= SEQUENCE {
///     revocationTime     GeneralizedTime,
///     revocationReason   [0] EXPLICIT CRLReason OPTIONAL }
/// ```
fn parse_cert_status(node: &AsnNode<'_>) -> Result<CertStatus, CertMetaError> {
    match asn1::context_tag(node) {
        Some(0) => Ok(CertStatus::Good),
        Some(2) => Ok(CertStatus::Unknown),
        Some(1) => {
            let content =
                asn1::context_content(node, 1).ok_or_else(|| malformed("malformed RevokedInfo"))?;
            let elements = asn1::read_elements(content)?;
            let (revocation_time, _) = elements
                .first()
                .ok_or_else(|| malformed("RevokedInfo without revocationTime"))?;
            let reason = match elements.get(1).and_then(|(_, n)| asn1::context_content(n, 0)) {
                Some(explicit) => Some(reason_from_enumerated(explicit)?),
                None => None,
            };
            Ok(CertStatus::Revoked {
                revocation_time: parse_time(revocation_time)?,
                reason,
            })
        }
        _ => Err(malformed("unexpected CertStatus")),
    }
}

fn parse_time(tlv: &[u8]) -> Result<i64, CertMetaError> {
    let (_, time) = ASN1Time::from_der(tlv).map_err(|e| malformed(format!("invalid time: {}", e)))?;
    Ok(time.timestamp())
}

/// The decoded part of a `BasicOCSPResponse`.  The signature is not verified.
#[derive(Debug, Clone, Serialize)]
pub struct BasicOcspResponse {
    /// Unix timestamp (seconds, UTC).
    pub produced_at: i64,
    pub responses: Vec<SingleResponse>,
}

impl BasicOcspResponse {
    /// ```text
    /// BasicOCSPResponse ::= SEQUENCE {
    ///     tbsResponseData  ResponseData, signatureAlgorithm, signature, certs }
    /// ResponseData ::= SEQUENCE {
    ///     version      [0] EXPLICIT Version DEFAULT v1,
    ///     responderID  ResponderID,         -- [1] byName | [2] byKey
    ///     producedAt   GeneralizedTime,
    ///     responses    SEQUENCE OF SingleResponse,
    ///     responseExtensions [1] EXPLICIT Extensions OPTIONAL }
    /// ```
    pub fn from_der(bytes: &[u8]) -> Result<Self, CertMetaError> {
        let outer = asn1::constructed_elements(bytes)?;
        let (tbs, _) = outer
            .first()
            .ok_or_else(|| malformed("BasicOCSPResponse without tbsResponseData"))?;

        let tbs_fields = asn1::constructed_elements(tbs)?;
        let mut fields = tbs_fields
            .iter()
            .skip_while(|(_, node)| asn1::context_tag(node) == Some(0));

        match fields.next() {
            Some((_, responder)) if matches!(asn1::context_tag(responder), Some(1 | 2)) => {}
            _ => return Err(malformed("ResponseData without responderID")),
        }
        let (produced_at, _) = fields
            .next()
            .ok_or_else(|| malformed("ResponseData without producedAt"))?;
        let (responses, _) = fields
            .next()
            .ok_or_else(|| malformed("ResponseData without responses"))?;

        let responses = asn1::constructed_elements(responses)?
            .into_iter()
            .map(|(span, _)| SingleResponse::from_der(span))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(count = responses.len(), "decoded OCSP single responses");
        Ok(BasicOcspResponse {
            produced_at: parse_time(produced_at)?,
            responses,
        })
    }

    /// Single responses whose identity matches `cert` issued by `issuer`.
    ///
    /// Each response is compared against an identity rebuilt with that
    /// response's own hash algorithm.
    pub fn responses_for<'r>(
        &'r self,
        cert: &X509Certificate<'_>,
        issuer: &X509Certificate<'_>,
    ) -> Vec<&'r SingleResponse> {
        self.responses
            .iter()
            .filter(|response| {
                match build_certificate_id_with(cert, issuer, &response.cert_id.hash_algorithm_oid) {
                    Ok(local) => matches(&local, response),
                    Err(e) => {
                        warn!("Unable to build CertID for OCSP single response: {}", e);
                        false
                    }
                }
            })
            .collect()
    }

    /// The matching single response with the most recent `thisUpdate`.
    pub fn latest_response_for<'r>(
        &'r self,
        cert: &X509Certificate<'_>,
        issuer: &X509Certificate<'_>,
    ) -> Option<&'r SingleResponse> {
        self.responses_for(cert, issuer)
            .into_iter()
            .max_by_key(|response| response.this_update)
    }
}

/// Single responses of `basic` that are about `cert` issued by `issuer`.
pub fn single_responses_for<'r>(
    basic: &'r BasicOcspResponse,
    cert: &X509Certificate<'_>,
    issuer: &X509Certificate<'_>,
) -> Vec<&'r SingleResponse> {
    basic.responses_for(cert, issuer)
}

pub fn latest_single_response_for<'r>(
    basic: &'r BasicOcspResponse,
    cert: &X509Certificate<'_>,
    issuer: &X509Certificate<'_>,
) -> Option<&'r SingleResponse> {
    basic.latest_response_for(cert, issuer)
}

/// Whether `response` is about the certificate identified by `local`.
pub fn matches(local: &CertificateId, response: &SingleResponse) -> bool {
    local.matches(&response.cert_id)
}

/// Decode an `OCSPResponse` envelope down to its `BasicOCSPResponse`.
///
/// ```text
/// OCSPResponse ::= SEQUENCE {
///     responseStatus  OCSPResponseStatus,   -- ENUMERATED
///     responseBytes   [0] EXPLICIT ResponseBytes OPTIONAL }
/// ResponseBytes ::= SEQUENCE { responseType OBJECT IDENTIFIER, response OCTET STRING }
/// ```
pub fn parse_ocsp_response(bytes: &[u8]) -> Result<BasicOcspResponse, CertMetaError> {
    let root = asn1::parse_primitive(bytes)?;
    let fields = asn1::sequence_items(&root)?;

    match fields.first().map(|status| &status.content) {
        Some(BerObjectContent::Enum(0)) => {}
        Some(BerObjectContent::Enum(status)) => {
            return Err(CertMetaError::OcspError(format!(
                "responder returned status {}",
                status
            )));
        }
        _ => return Err(malformed("OCSPResponse without responseStatus")),
    }

    let response_bytes = fields
        .get(1)
        .and_then(|node| asn1::context_content(node, 0))
        .ok_or_else(|| CertMetaError::OcspError("successful response without responseBytes".into()))?;
    let response_bytes = asn1::as_sequence(asn1::parse_primitive(response_bytes)?)?;
    let (Some(response_type), Some(response)) = (response_bytes.first(), response_bytes.get(1)) else {
        return Err(malformed("incomplete ResponseBytes"));
    };

    let response_type = asn1::oid_string(response_type)?;
    if response_type != oid::OCSP_BASIC {
        return Err(CertMetaError::OcspError(format!(
            "unsupported response type {}",
            response_type
        )));
    }

    BasicOcspResponse::from_der(octet_string(response)?)
}

/// Cache key of an OCSP token: SHA-1 of `certificate_key ":" url`, in hex.
pub fn ocsp_revocation_token_key(certificate_key: &str, url: &str) -> String {
    hex::encode(compute_digest(
        DigestAlgorithm::Sha1,
        &[certificate_key.as_bytes(), b":", url.as_bytes()],
    ))
}
