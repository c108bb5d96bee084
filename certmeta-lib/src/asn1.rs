//! Generic ASN.1 layer over der-parser.
//!
//! Extension values arrive as a DER `OCTET STRING` wrapping the structure
//! defined for their OID.  The functions here peel that envelope, expose the
//! parsed node tree, and re-encode nodes when a canonical DER form is needed
//! for digesting.

use crate::digest::{compute_digest, DigestAlgorithm};
use crate::util::der_wrap;
use crate::CertMetaError;
use der_parser::asn1_rs::{Any, Class, FromBer, Tag};
use der_parser::ber::{parse_ber, BerObject, BerObjectContent};
use num_bigint::BigInt;

/// A decoded ASN.1 value borrowing from its source buffer.
pub type AsnNode<'a> = BerObject<'a>;

fn malformed(what: impl std::fmt::Display) -> CertMetaError {
    CertMetaError::MalformedAsn1(what.to_string())
}

/// Decode exactly one BER/DER object.
///
/// Trailing bytes after the object are rejected: a partially consumed input
/// is never reported as success.
pub fn parse_primitive(bytes: &[u8]) -> Result<AsnNode<'_>, CertMetaError> {
    if bytes.is_empty() {
        return Err(malformed("empty input"));
    }
    let (rem, node) = parse_ber(bytes).map_err(malformed)?;
    if !rem.is_empty() {
        return Err(malformed(format!(
            "{} trailing bytes after ASN.1 object",
            rem.len()
        )));
    }
    Ok(node)
}

/// Strip one `OCTET STRING` envelope and return its contents.
pub fn unwrap_octet_string(bytes: &[u8]) -> Result<&[u8], CertMetaError> {
    let node = parse_primitive(bytes)?;
    match node.content {
        BerObjectContent::OctetString(inner) => Ok(inner),
        _ => Err(malformed(format!(
            "expected OCTET STRING, found {:?}",
            node.header.tag()
        ))),
    }
}

/// Unwrap an octet-string envelope and decode the `SEQUENCE` inside it.
pub fn sequence_from_octet_string(bytes: &[u8]) -> Result<Vec<AsnNode<'_>>, CertMetaError> {
    let inner = unwrap_octet_string(bytes)?;
    as_sequence(parse_primitive(inner)?)
}

/// Take the members of a `SEQUENCE` node.
pub fn as_sequence(node: AsnNode<'_>) -> Result<Vec<AsnNode<'_>>, CertMetaError> {
    match node.content {
        BerObjectContent::Sequence(items) => Ok(items),
        _ => Err(malformed(format!(
            "expected SEQUENCE, found {:?}",
            node.header.tag()
        ))),
    }
}

/// Borrow the members of a `SEQUENCE` node.
pub fn sequence_items<'n, 'a>(node: &'n AsnNode<'a>) -> Result<&'n [AsnNode<'a>], CertMetaError> {
    match &node.content {
        BerObjectContent::Sequence(items) => Ok(items),
        _ => Err(malformed(format!(
            "expected SEQUENCE, found {:?}",
            node.header.tag()
        ))),
    }
}

/// Decode a run of concatenated TLVs, keeping the raw span of each.
///
/// Used for the contents of context-specific tags, which der-parser leaves
/// undecoded, and wherever the exact encoded bytes of a member are needed.
pub fn read_elements(mut bytes: &[u8]) -> Result<Vec<(&[u8], AsnNode<'_>)>, CertMetaError> {
    let mut out = Vec::new();
    while !bytes.is_empty() {
        let (rem, node) = parse_ber(bytes).map_err(malformed)?;
        let consumed = bytes.len() - rem.len();
        let span = bytes.get(..consumed).ok_or_else(|| malformed("element overrun"))?;
        out.push((span, node));
        bytes = rem;
    }
    Ok(out)
}

/// Members of the constructed value encoded in `tlv`, each with its raw span.
pub fn constructed_elements(tlv: &[u8]) -> Result<Vec<(&[u8], AsnNode<'_>)>, CertMetaError> {
    let (_, any) = Any::from_ber(tlv).map_err(malformed)?;
    if !any.header.is_constructed() {
        return Err(malformed(format!(
            "expected a constructed value, found {:?}",
            any.header.tag()
        )));
    }
    read_elements(any.data)
}

/// Canonical DER re-encoding.
///
/// Constructed `SEQUENCE`/`SET` values and constructed tagged values are
/// rebuilt from their members with minimal definite lengths, and `SET`
/// members are sorted by encoding (X.690 Section 11.6).  Tagged values with
/// a tag number above 30 are serialized as-is.
pub fn encode_der(node: &AsnNode<'_>) -> Result<Vec<u8>, CertMetaError> {
    match &node.content {
        BerObjectContent::Sequence(items) => {
            let parts = items.iter().map(encode_der).collect::<Result<Vec<_>, _>>()?;
            der_wrap(0x30, &parts.concat())
        }
        BerObjectContent::Set(items) => {
            let mut parts = items.iter().map(encode_der).collect::<Result<Vec<_>, _>>()?;
            parts.sort();
            der_wrap(0x31, &parts.concat())
        }
        BerObjectContent::Unknown(any) if any.header.is_constructed() && any.header.tag().0 < 31 => {
            let identifier = ((any.header.class() as u8) << 6) | 0x20 | any.header.tag().0 as u8;
            let parts = read_elements(any.data)?
                .iter()
                .map(|(_, member)| encode_der(member))
                .collect::<Result<Vec<_>, _>>()?;
            der_wrap(identifier, &parts.concat())
        }
        _ => encode_ber(node),
    }
}

/// Serialize a node as-is, with definite lengths.
pub fn encode_ber(node: &AsnNode<'_>) -> Result<Vec<u8>, CertMetaError> {
    node.to_vec()
        .map_err(|e| CertMetaError::EncodingError(format!("{:?}", e)))
}

/// Dotted string form of an `OBJECT IDENTIFIER` node.
pub fn oid_string(node: &AsnNode<'_>) -> Result<String, CertMetaError> {
    node.as_oid()
        .map(|oid| oid.to_id_string())
        .map_err(|e| malformed(format!("expected OBJECT IDENTIFIER: {:?}", e)))
}

/// Text of any of the ASN.1 character string types.
///
/// der-parser hands out `BMPString` and `UniversalString` contents
/// undecoded; they are converted from UTF-16BE and UCS-4 here.
pub fn string_value(node: &AsnNode<'_>) -> Result<String, CertMetaError> {
    match node.content {
        BerObjectContent::BmpString(raw) => decode_bmp_string(raw.as_bytes()),
        BerObjectContent::UniversalString(raw) => decode_universal_string(raw),
        _ => node
            .as_str()
            .map(str::to_string)
            .map_err(|e| malformed(format!("expected a character string: {:?}", e))),
    }
}

fn decode_bmp_string(raw: &[u8]) -> Result<String, CertMetaError> {
    if raw.len() % 2 != 0 {
        return Err(malformed("BMPString of odd length"));
    }
    let units = raw.chunks_exact(2).map(|pair| {
        let mut unit = [0u8; 2];
        unit.copy_from_slice(pair);
        u16::from_be_bytes(unit)
    });
    char::decode_utf16(units)
        .collect::<Result<String, _>>()
        .map_err(|e| malformed(format!("invalid BMPString: {}", e)))
}

fn decode_universal_string(raw: &[u8]) -> Result<String, CertMetaError> {
    if raw.len() % 4 != 0 {
        return Err(malformed("UniversalString length not a multiple of 4"));
    }
    raw.chunks_exact(4)
        .map(|quad| {
            let mut code = [0u8; 4];
            code.copy_from_slice(quad);
            let value = u32::from_be_bytes(code);
            char::from_u32(value)
                .ok_or_else(|| malformed(format!("invalid UniversalString code point {:#x}", value)))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Undecoded walking
// ---------------------------------------------------------------------------

/// Members of a constructed value, left undecoded.
///
/// der-parser only accepts a `BMPString` whose raw bytes also happen to be
/// valid UTF-8, so a tree holding non-ASCII BMP text cannot be parsed as a
/// whole.  Structures that carry free text are walked with these `Any`
/// helpers instead, decoding each member only when it is read.
pub fn any_members<'a>(any: &Any<'a>) -> Result<Vec<Any<'a>>, CertMetaError> {
    if !any.header.is_constructed() {
        return Err(malformed(format!(
            "expected a constructed value, found {:?}",
            any.header.tag()
        )));
    }
    let mut bytes = any.data;
    let mut out = Vec::new();
    while !bytes.is_empty() {
        let (rem, member) = Any::from_ber(bytes).map_err(malformed)?;
        out.push(member);
        bytes = rem;
    }
    Ok(out)
}

/// Members of the single constructed value encoded in `tlv`, undecoded.
pub fn any_elements(tlv: &[u8]) -> Result<Vec<Any<'_>>, CertMetaError> {
    let (rem, any) = Any::from_ber(tlv).map_err(malformed)?;
    if !rem.is_empty() {
        return Err(malformed(format!(
            "{} trailing bytes after ASN.1 object",
            rem.len()
        )));
    }
    any_members(&any)
}

/// Dotted string form of an undecoded `OBJECT IDENTIFIER`.
pub fn any_oid_string(any: &Any<'_>) -> Result<String, CertMetaError> {
    any.as_oid()
        .map(|oid| oid.to_id_string())
        .map_err(|e| malformed(format!("expected OBJECT IDENTIFIER: {}", e)))
}

/// Text of an undecoded character string.
pub fn any_string_value(any: &Any<'_>) -> Result<String, CertMetaError> {
    if any.header.class() != Class::Universal || any.header.is_constructed() {
        return Err(malformed("expected a character string"));
    }
    match any.header.tag() {
        Tag::BmpString => decode_bmp_string(any.data),
        Tag::UniversalString => decode_universal_string(any.data),
        Tag::Utf8String
        | Tag::PrintableString
        | Tag::Ia5String
        | Tag::VisibleString
        | Tag::NumericString
        | Tag::TeletexString
        | Tag::GeneralString
        | Tag::GraphicString => std::str::from_utf8(any.data)
            .map(str::to_string)
            .map_err(|e| malformed(format!("invalid character string: {}", e))),
        other => Err(malformed(format!(
            "expected a character string, found {:?}",
            other
        ))),
    }
}

/// Value of an `INTEGER` node as a signed big integer.
pub fn integer_value(node: &AsnNode<'_>) -> Result<BigInt, CertMetaError> {
    match &node.content {
        BerObjectContent::Integer(bytes) => Ok(BigInt::from_signed_bytes_be(bytes)),
        _ => Err(malformed(format!(
            "expected INTEGER, found {:?}",
            node.header.tag()
        ))),
    }
}

/// Value of an `INTEGER` node that must fit an `i64`.
pub fn small_integer(node: &AsnNode<'_>) -> Result<i64, CertMetaError> {
    let value = integer_value(node)?;
    i64::try_from(&value).map_err(|_| malformed(format!("INTEGER {} out of range", value)))
}

pub fn is_null(node: &AsnNode<'_>) -> bool {
    matches!(node.content, BerObjectContent::Null)
}

/// Tag number of a context-specific node.
pub fn context_tag(node: &AsnNode<'_>) -> Option<u32> {
    if node.header.class() == Class::ContextSpecific {
        Some(node.header.tag().0)
    } else {
        None
    }
}

/// Contents octets of a context-specific node carrying tag `[tag]`.
pub fn context_content<'a>(node: &AsnNode<'a>, tag: u32) -> Option<&'a [u8]> {
    if node.header.class() != Class::ContextSpecific || node.header.tag() != Tag(tag) {
        return None;
    }
    match &node.content {
        BerObjectContent::Unknown(any) => Some(any.data),
        _ => None,
    }
}

/// Digest of a signature policy document.
///
/// The document starts with `SEQUENCE { signPolicyHashAlg, signPolicyInfo, ... }`;
/// the digest covers `DER(signPolicyHashAlg) || DER(signPolicyInfo)`.
pub fn asn1_signature_policy_digest(
    algorithm: DigestAlgorithm,
    policy_bytes: &[u8],
) -> Result<Vec<u8>, CertMetaError> {
    let root = parse_primitive(policy_bytes)?;
    let items = sequence_items(&root)?;
    let hash_alg = items
        .first()
        .ok_or_else(|| malformed("signature policy without hash algorithm"))?;
    let policy_info = items
        .get(1)
        .ok_or_else(|| malformed("signature policy without SignPolicyInfo"))?;
    sequence_items(hash_alg)?;
    sequence_items(policy_info)?;

    let hash_alg_der = encode_der(hash_alg)?;
    let policy_info_der = encode_der(policy_info)?;
    Ok(compute_digest(algorithm, &[&hash_alg_der, &policy_info_der]))
}
