#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    clippy::indexing_slicing
)]
//! The generic ASN.1 layer: strict single-object parsing, canonical
//! re-encoding and signature policy digests.

mod common;

use certmeta_lib::asn1;
use certmeta_lib::{asn1_signature_policy_digest, compute_digest, CertMetaError, DigestAlgorithm};
use common::*;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// AlgorithmIdentifier { sha256, NULL }
fn sha256_algorithm_identifier() -> Vec<u8> {
    seq(&[oid("2.16.840.1.101.3.4.2.1"), null()])
}

/// SignPolicyInfo stand-in: SEQUENCE { OID 1.0.6.1.1 }
fn policy_info() -> Vec<u8> {
    seq(&[oid("1.0.6.1.1")])
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

#[test]
fn parse_rejects_empty_and_trailing_input() {
    assert!(matches!(
        asn1::parse_primitive(&[]),
        Err(CertMetaError::MalformedAsn1(_))
    ));

    let mut with_trailer = integer(5);
    with_trailer.push(0x00);
    assert!(matches!(
        asn1::parse_primitive(&with_trailer),
        Err(CertMetaError::MalformedAsn1(_))
    ));

    let five = integer(5);
    let node = asn1::parse_primitive(&five).unwrap();
    assert_eq!(asn1::small_integer(&node).unwrap(), 5);
}

#[test]
fn octet_string_envelope() {
    let wrapped = octet_string(&seq(&[integer(1), integer(2)]));
    let items = asn1::sequence_from_octet_string(&wrapped).unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(asn1::small_integer(&items[1]).unwrap(), 2);

    // A bare SEQUENCE is not an extension value.
    assert!(asn1::unwrap_octet_string(&seq(&[integer(1)])).is_err());
}

#[test]
fn context_specific_contents() {
    let uri_name = tlv(0x86, b"http://a.example");
    let node = asn1::parse_primitive(&uri_name).unwrap();
    assert_eq!(asn1::context_tag(&node), Some(6));
    assert_eq!(asn1::context_content(&node, 6), Some(&b"http://a.example"[..]));
    assert_eq!(asn1::context_content(&node, 0), None);

    let null_der = null();
    let universal = asn1::parse_primitive(&null_der).unwrap();
    assert!(asn1::is_null(&universal));
    assert_eq!(asn1::context_tag(&universal), None);
}

#[test]
fn constructed_elements_keep_raw_spans() {
    let first = integer(300);
    let second = ia5("x");
    let outer = seq(&[first.clone(), second.clone()]);
    let elements = asn1::constructed_elements(&outer).unwrap();
    assert_eq!(elements.len(), 2);
    assert_eq!(elements[0].0, &first[..]);
    assert_eq!(elements[1].0, &second[..]);

    assert!(asn1::constructed_elements(&integer(1)).is_err());
}

#[test]
fn wide_character_strings_are_decoded() {
    // BMPString "hi"
    let bmp = tlv(0x1E, &[0x00, 0x68, 0x00, 0x69]);
    let node = asn1::parse_primitive(&bmp).unwrap();
    assert_eq!(asn1::string_value(&node).unwrap(), "hi");

    // UniversalString "A"
    let universal = tlv(0x1C, &[0x00, 0x00, 0x00, 0x41]);
    let node = asn1::parse_primitive(&universal).unwrap();
    assert_eq!(asn1::string_value(&node).unwrap(), "A");

    let bad_code_point = tlv(0x1C, &[0x00, 0x11, 0x00, 0x00]);
    let node = asn1::parse_primitive(&bad_code_point).unwrap();
    assert!(asn1::string_value(&node).is_err());
}

#[test]
fn undecoded_members_allow_non_ascii_bmp_text() {
    // SEQUENCE { OID 1.2.3, BMPString U+00E9 }; der-parser rejects the tree.
    let value = seq(&[oid("1.2.3"), tlv(0x1E, &[0x00, 0xE9])]);
    assert!(asn1::parse_primitive(&value).is_err());

    let members = asn1::any_elements(&value).unwrap();
    assert_eq!(members.len(), 2);
    assert_eq!(asn1::any_oid_string(&members[0]).unwrap(), "1.2.3");
    assert_eq!(asn1::any_string_value(&members[1]).unwrap(), "\u{e9}");
    assert!(asn1::any_string_value(&members[0]).is_err());

    let mut with_trailer = value.clone();
    with_trailer.push(0x00);
    assert!(asn1::any_elements(&with_trailer).is_err());
    assert!(asn1::any_elements(&integer(1)).is_err());
}

// ---------------------------------------------------------------------------
// Re-encoding
// ---------------------------------------------------------------------------

#[test]
fn der_reencoding_sorts_set_members() {
    let set = tlv(0x31, &[integer(2), integer(1)].concat());
    let node = asn1::parse_primitive(&set).unwrap();
    let der = asn1::encode_der(&node).unwrap();
    assert_eq!(der, tlv(0x31, &[integer(1), integer(2)].concat()));
}

#[test]
fn der_reencoding_sorts_sets_under_tagged_values() {
    // SEQUENCE { [0] { SET { 2, 1 } } }
    let unsorted = tlv(0x31, &[integer(2), integer(1)].concat());
    let sorted = tlv(0x31, &[integer(1), integer(2)].concat());
    let value = seq(&[tlv(0xA0, &unsorted)]);
    let node = asn1::parse_primitive(&value).unwrap();
    assert_eq!(asn1::encode_der(&node).unwrap(), seq(&[tlv(0xA0, &sorted)]));

    // Primitive tagged values are kept verbatim.
    let primitive = seq(&[tlv(0x80, &[0x02, 0x01])]);
    let node = asn1::parse_primitive(&primitive).unwrap();
    assert_eq!(asn1::encode_der(&node).unwrap(), primitive);
}

#[test]
fn der_reencoding_is_identity_on_der_input() {
    let value = seq(&[oid("1.2.3"), seq(&[printable("EUR"), integer(-1)])]);
    let node = asn1::parse_primitive(&value).unwrap();
    assert_eq!(asn1::encode_der(&node).unwrap(), value);
}

// ---------------------------------------------------------------------------
// Signature policy digest
// ---------------------------------------------------------------------------

#[test]
fn signature_policy_digest_covers_algorithm_and_info() {
    let algorithm = sha256_algorithm_identifier();
    let info = policy_info();
    let document = seq(&[algorithm.clone(), info.clone(), octet_string(&[0xAA, 0xBB])]);

    let digest = asn1_signature_policy_digest(DigestAlgorithm::Sha256, &document).unwrap();
    assert_eq!(
        hex::encode(&digest),
        "7d4cb68d964f5aebea9cebedf65924f85a3bbe14d1e13746629afef1d9c8ccfa"
    );
    assert_eq!(digest, compute_digest(DigestAlgorithm::Sha256, &[algorithm.as_slice(), info.as_slice()]));
}

#[test]
fn signature_policy_digest_rejects_short_documents() {
    let document = seq(&[sha256_algorithm_identifier()]);
    assert!(asn1_signature_policy_digest(DigestAlgorithm::Sha256, &document).is_err());
    assert!(asn1_signature_policy_digest(DigestAlgorithm::Sha256, &integer(1)).is_err());
}

#[test]
fn digest_algorithms_resolve_by_oid() {
    assert_eq!(
        DigestAlgorithm::from_oid("1.3.14.3.2.26").unwrap(),
        DigestAlgorithm::Sha1
    );
    assert_eq!(DigestAlgorithm::Sha512.oid(), "2.16.840.1.101.3.4.2.3");
    assert!(matches!(
        DigestAlgorithm::from_oid("1.2.840.10045.4.3.2"),
        Err(CertMetaError::DigestUnavailable(_))
    ));
    assert_eq!(compute_digest(DigestAlgorithm::Md5, &[&b""[..]]).len(), 16);
    assert_eq!(compute_digest(DigestAlgorithm::Sha384, &[&b"a"[..], &b"b"[..]]).len(), 48);
}
