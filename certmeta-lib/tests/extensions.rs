#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    clippy::indexing_slicing
)]
//! Extension decoding against generated certificates and hand-built values.
//!
//! The certificates under `tests/fixtures` are produced by
//! `tests/fixtures/generate.py`.

mod common;

use certmeta_lib::*;
use common::*;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn leaf() -> CertificateExtensions {
    parse_certificate_extensions(&fixture("leaf.pem")).expect("leaf extensions")
}

fn ca() -> CertificateExtensions {
    parse_certificate_extensions(&fixture("ca.der")).expect("CA extensions")
}

fn single(oid_str: &str, critical: bool, value: Vec<u8>) -> ExtensionValues {
    ExtensionValues::new().with(oid_str, critical, value)
}

/// PolicyInformation carrying one `id-qt-cps` qualifier per entry of `cps`.
fn policy_with_cps(policy_oid: &str, cps: &[Vec<u8>]) -> Vec<u8> {
    let qualifiers: Vec<Vec<u8>> = cps
        .iter()
        .map(|value| seq(&[oid(oid::QT_CPS), value.clone()]))
        .collect();
    seq(&[oid(policy_oid), seq(&qualifiers)])
}

fn decode_policies(policies: &[Vec<u8>]) -> Vec<CertificatePolicy> {
    let exts = decode_extensions(&single(
        oid::EXT_CERTIFICATE_POLICIES,
        false,
        ext_value(&seq(policies)),
    ))
    .unwrap();
    exts.certificate_policies()
        .expect("policies decoded")
        .policies
        .clone()
}

// ---------------------------------------------------------------------------
// Certificate fixtures
// ---------------------------------------------------------------------------

#[test]
fn pem_and_der_decode_identically() {
    let from_pem = parse_certificate_extensions(&fixture("leaf.pem")).unwrap();
    let from_der = parse_certificate_extensions(&fixture("leaf.der")).unwrap();
    assert_eq!(from_pem, from_der);

    let options = DecodeOptions::default();
    let explicit_pem = certificate_extensions_from_pem(&fixture("leaf.pem"), &options).unwrap();
    let explicit_der = certificate_extensions_from_der(&fixture("leaf.der"), &options).unwrap();
    assert_eq!(explicit_pem, explicit_der);
}

#[test]
fn pem_entry_point_rejects_der() {
    let err = certificate_extensions_from_pem(&fixture("leaf.der"), &DecodeOptions::default())
        .unwrap_err();
    assert!(matches!(err, CertMetaError::PemError(_)));
}

#[test]
fn garbage_input_is_a_parse_error() {
    assert!(matches!(
        parse_certificate_extensions(b"not a certificate"),
        Err(CertMetaError::ParseError(_))
    ));
    assert!(matches!(
        parse_certificate_extensions(b""),
        Err(CertMetaError::ParseError(_))
    ));
}

#[test]
fn leaf_authority_information_access() {
    let exts = leaf();
    let aia = exts.authority_information_access().expect("AIA present");
    assert_eq!(
        aia.ca_issuers,
        vec![
            "ldap://ldap.example.com/cn=Certmeta%20Test%20CA".to_string(),
            "http://ca.example.com/ca.crt".to_string(),
        ]
    );
    assert_eq!(aia.ocsp, vec!["http://ocsp.example.com".to_string()]);
    assert_eq!(aia.preferred_ca_issuer(), Some("http://ca.example.com/ca.crt"));
    assert_eq!(exts.ocsp_access_urls(), aia.ocsp);
    assert_eq!(exts.ca_issuers_access_urls(), aia.ca_issuers);
}

#[test]
fn leaf_crl_distribution_points() {
    let exts = leaf();
    assert_eq!(
        exts.crl_access_urls(),
        vec![
            "http://crl.example.com/ca.crl".to_string(),
            "ldap://ldap.example.com/ca.crl".to_string(),
        ]
    );
}

#[test]
fn basic_constraints_of_leaf_and_ca() {
    let leaf_bc = leaf().basic_constraints().cloned().expect("leaf BC");
    assert!(!leaf_bc.ca);
    assert_eq!(leaf_bc.path_len_constraint, -1);
    assert!(leaf_bc.raw.critical);

    let ca_bc = ca().basic_constraints().cloned().expect("CA BC");
    assert!(ca_bc.ca);
    assert_eq!(ca_bc.path_len_constraint, i64::MAX);
}

#[test]
fn key_usage_bits() {
    let leaf_ku = leaf().key_usage().cloned().expect("leaf KU");
    assert_eq!(
        leaf_ku.bits,
        vec![KeyUsageBit::DigitalSignature, KeyUsageBit::NonRepudiation]
    );
    assert!(leaf_ku.raw.critical);

    let ca_ku = ca().key_usage().cloned().expect("CA KU");
    assert!(ca_ku.has(KeyUsageBit::KeyCertSign));
    assert!(ca_ku.has(KeyUsageBit::CrlSign));
    assert!(!ca_ku.has(KeyUsageBit::DigitalSignature));
}

#[test]
fn extended_key_usage_oids() {
    let exts = leaf();
    let eku = exts.extended_key_usage().expect("EKU");
    assert_eq!(eku.oids, vec!["1.3.6.1.5.5.7.3.2", "1.3.6.1.5.5.7.3.4"]);
}

#[test]
fn certificate_policies_keep_last_cps() {
    let exts = leaf();
    let policies = &exts.certificate_policies().expect("policies").policies;
    assert_eq!(policies.len(), 2);
    assert_eq!(policies[0].oid, "1.3.6.1.4.1.99999.10.1");
    // Two CPS qualifiers on the first policy; the second one is kept.
    assert_eq!(policies[0].cps_url.as_deref(), Some("https://cps2.example.com"));
    assert_eq!(policies[1].oid, "0.4.0.194112.1.2");
    assert_eq!(policies[1].cps_url, None);
}

#[test]
fn subject_alternative_names() {
    let exts = leaf();
    let san = exts.subject_alternative_names().expect("SAN");
    assert_eq!(
        san.names,
        vec!["leaf.example.com", "leaf@example.com", "192.0.2.7"]
    );
}

#[test]
fn key_identifiers_link_leaf_to_ca() {
    let leaf_exts = leaf();
    let ca_exts = ca();
    let ca_ski = ca_exts.subject_key_identifier().expect("CA SKI");
    assert_eq!(ca_ski.key_identifier.len(), 20);

    let aki = leaf_exts.authority_key_identifier().expect("leaf AKI");
    assert_eq!(aki.key_identifier.as_ref(), Some(&ca_ski.key_identifier));

    // IssuerSerial ::= SEQUENCE { GeneralNames, INTEGER 0x1001 }
    let issuer_serial = aki.authority_cert_issuer_serial.as_ref().expect("IssuerSerial");
    assert_eq!(issuer_serial[0], 0x30);
    assert!(issuer_serial.ends_with(&[0x02, 0x02, 0x10, 0x01]));

    assert!(leaf_exts.subject_key_identifier().is_some());
}

#[test]
fn ocsp_no_check_marker() {
    let exts = leaf();
    assert!(exts.has_ocsp_no_check());
    assert!(!exts.has_val_assured_short_term_certs());
    assert!(!ca().has_ocsp_no_check());
}

#[test]
fn unknown_extension_is_kept_raw() {
    let exts = leaf();
    let others = exts.other_extensions();
    assert_eq!(others.len(), 1);
    assert_eq!(others[0].raw.oid, "1.3.6.1.4.1.99999.7");
    assert!(!others[0].raw.critical);
    assert_eq!(others[0].raw.octets, octet_string(&utf8("hello")));
}

#[test]
fn raw_octets_are_the_extension_octet_string() {
    let exts = leaf();
    let raw = exts.find_by_oid(oid::EXT_SUBJECT_ALT_NAME).expect("SAN raw");
    assert_eq!(raw.octets[0], 0x04);
    assert_eq!(exts.raw_extensions().count(), exts.len());
    // 11 known kinds on the leaf plus the unknown one.
    assert_eq!(exts.len(), 12);
}

#[test]
fn display_text_marks_critical_extensions() {
    let text = display_text(&leaf());
    assert!(text.contains("Basic Constraints: [critical] CA:FALSE"));
    assert!(text.contains("CA Issuers - URI:http://ca.example.com/ca.crt"));
    assert!(text.contains("OCSP - URI:http://ocsp.example.com"));
    assert!(text.contains("1.3.6.1.4.1.99999.7:"));
}

#[test]
fn json_output_is_valid() {
    let json = to_json(&leaf()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    let aia = &value["known"]["authority_information_access"];
    assert_eq!(aia["ocsp"][0], "http://ocsp.example.com");
}

// ---------------------------------------------------------------------------
// Hand-built extension values
// ---------------------------------------------------------------------------

#[test]
fn aia_buckets_urls_by_access_method() {
    let aia = seq(&[
        access_description(oid::ACCESS_CA_ISSUERS, "http://ca.example.org/ca.cer"),
        access_description(oid::ACCESS_OCSP, "http://ocsp.example.org"),
        access_description(oid::ACCESS_CA_ISSUERS, "ldap://ldap.example.org/ca"),
    ]);
    let exts = decode_extensions(&single(
        oid::EXT_AUTHORITY_INFO_ACCESS,
        false,
        ext_value(&aia),
    ))
    .unwrap();

    assert_eq!(exts.ocsp_access_urls(), vec!["http://ocsp.example.org"]);
    let ca_issuers = exts.ca_issuers_access_urls();
    assert_eq!(
        ca_issuers,
        vec!["http://ca.example.org/ca.cer", "ldap://ldap.example.org/ca"]
    );
    assert_eq!(
        preferred_ca_issuers_url(&ca_issuers),
        Some("http://ca.example.org/ca.cer")
    );
}

#[test]
fn preferred_ca_issuer_falls_back_to_first_url() {
    let urls = vec![
        "ldap://ldap.example.org/a".to_string(),
        "ldap://ldap.example.org/b".to_string(),
    ];
    assert_eq!(preferred_ca_issuers_url(&urls), Some("ldap://ldap.example.org/a"));
    assert_eq!(
        preferred_ca_issuers_url(&["HTTPS://CA.EXAMPLE.ORG".to_string()]),
        Some("HTTPS://CA.EXAMPLE.ORG")
    );
    assert_eq!(preferred_ca_issuers_url(&[]), None);
}

#[test]
fn malformed_aki_propagates_by_default() {
    // keyIdentifier tagged as a universal INTEGER instead of [0].
    let bad_aki = seq(&[integer(5)]);
    let source = single(oid::EXT_AUTHORITY_KEY_ID, false, ext_value(&bad_aki));

    let err = decode_extensions(&source).unwrap_err();
    match err {
        CertMetaError::ExtensionError { name, .. } => assert_eq!(name, "Authority Key Identifier"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn malformed_ski_propagates_by_default() {
    let source = single(oid::EXT_SUBJECT_KEY_ID, false, ext_value(&integer(1)));
    assert!(matches!(
        decode_extensions(&source),
        Err(CertMetaError::ExtensionError { .. })
    ));
}

#[test]
fn lenient_options_omit_malformed_key_identifiers() {
    let source = ExtensionValues::new()
        .with(oid::EXT_AUTHORITY_KEY_ID, false, ext_value(&seq(&[integer(5)])))
        .with(oid::EXT_BASIC_CONSTRAINTS, true, ext_value(&seq(&[boolean(true)])));
    let options = DecodeOptions {
        strict_key_identifiers: false,
    };

    let exts = decode_extensions_with_options(&source, &options).unwrap();
    assert!(exts.authority_key_identifier().is_none());
    assert!(exts.basic_constraints().is_some());
}

#[test]
fn malformed_aia_is_omitted_not_propagated() {
    let source = ExtensionValues::new()
        .with(oid::EXT_AUTHORITY_INFO_ACCESS, false, ext_value(&integer(7)))
        .with(oid::EXT_KEY_USAGE, true, ext_value(&[0x03, 0x02, 0x07, 0x80]));

    let exts = decode_extensions(&source).unwrap();
    assert!(exts.authority_information_access().is_none());
    assert!(exts.ocsp_access_urls().is_empty());
    assert!(exts.key_usage().is_some());
}

#[test]
fn empty_aia_is_omitted() {
    let source = single(oid::EXT_AUTHORITY_INFO_ACCESS, false, ext_value(&seq(&[])));
    let exts = decode_extensions(&source).unwrap();
    assert!(exts.is_empty());
}

#[test]
fn failure_policies() {
    let strict = DecodeOptions::default();
    let lenient = DecodeOptions {
        strict_key_identifiers: false,
    };
    assert_eq!(
        failure_policy(ExtensionKind::AuthorityKeyIdentifier, &strict),
        FailurePolicy::Propagate
    );
    assert_eq!(
        failure_policy(ExtensionKind::SubjectKeyIdentifier, &strict),
        FailurePolicy::Propagate
    );
    assert_eq!(
        failure_policy(ExtensionKind::AuthorityKeyIdentifier, &lenient),
        FailurePolicy::Omit
    );
    assert_eq!(
        failure_policy(ExtensionKind::AuthorityInformationAccess, &strict),
        FailurePolicy::Omit
    );
    assert_eq!(
        failure_policy(ExtensionKind::QcStatements, &strict),
        FailurePolicy::Omit
    );
}

#[test]
fn oid_in_both_sets_is_decoded_once_as_critical() {
    let value = ext_value(&seq(&[boolean(true), integer(0)]));
    let source = ExtensionValues::new()
        .with(oid::EXT_BASIC_CONSTRAINTS, false, value.clone())
        .with(oid::EXT_BASIC_CONSTRAINTS, true, value);

    let exts = decode_extensions(&source).unwrap();
    assert_eq!(exts.len(), 1);
    let bc = exts.basic_constraints().unwrap();
    assert!(bc.raw.critical);
    assert!(bc.ca);
    assert_eq!(bc.path_len_constraint, 0);
}

/// A source that lists an OID but cannot produce its value.
struct ListedWithoutValue;

impl ExtensionSource for ListedWithoutValue {
    fn critical_extension_oids(&self) -> Vec<String> {
        vec![oid::EXT_KEY_USAGE.to_string()]
    }

    fn non_critical_extension_oids(&self) -> Vec<String> {
        Vec::new()
    }

    fn extension_value(&self, _oid: &str) -> Option<Vec<u8>> {
        None
    }
}

#[test]
fn listed_oid_without_value_is_skipped() {
    let exts = decode_extensions(&ListedWithoutValue).unwrap();
    assert!(exts.is_empty());
}

#[test]
fn unknown_oid_becomes_other_extension() {
    let value = ext_value(&null());
    let exts = decode_extensions(&single("1.2.3.4.5", true, value.clone())).unwrap();
    assert!(exts.iter().next().is_none());
    let other = &exts.other_extensions()[0];
    assert_eq!(other.raw.oid, "1.2.3.4.5");
    assert!(other.raw.critical);
    assert_eq!(other.raw.octets, value);
}

#[test]
fn null_markers() {
    let present = decode_extensions(&single(
        oid::EXT_VALASSURED_ST_CERTS,
        false,
        ext_value(&null()),
    ))
    .unwrap();
    assert!(present.has_val_assured_short_term_certs());

    // Listed, but not carrying the NULL value.
    let wrong_value =
        decode_extensions(&single(oid::EXT_OCSP_NOCHECK, false, ext_value(&integer(1)))).unwrap();
    assert!(wrong_value.ocsp_no_check().is_some());
    assert!(!wrong_value.has_ocsp_no_check());
}

#[test]
fn basic_constraints_not_ca_ignores_path_len() {
    let values = [
        seq(&[]),
        seq(&[boolean(false), integer(3)]),
        // cA omitted (DEFAULT FALSE) but a path length present.
        seq(&[integer(3)]),
    ];
    for value in values {
        let exts =
            decode_extensions(&single(oid::EXT_BASIC_CONSTRAINTS, true, ext_value(&value)))
                .unwrap();
        let bc = exts.basic_constraints().unwrap();
        assert!(!bc.ca);
        assert_eq!(bc.path_len_constraint, -1);
    }
}

#[test]
fn basic_constraints_ca_with_path_len() {
    let exts = decode_extensions(&single(
        oid::EXT_BASIC_CONSTRAINTS,
        true,
        ext_value(&seq(&[boolean(true), integer(3)])),
    ))
    .unwrap();
    let bc = exts.basic_constraints().unwrap();
    assert!(bc.ca);
    assert_eq!(bc.path_len_constraint, 3);
}

#[test]
fn certificate_policies_last_cps_wins() {
    let policies = decode_policies(&[policy_with_cps(
        "1.2.3.4",
        &[ia5("http://first.example"), ia5("http://second.example")],
    )]);
    assert_eq!(policies[0].cps_url.as_deref(), Some("http://second.example"));
}

#[test]
fn undecodable_cps_keeps_the_policy() {
    let policies = decode_policies(&[
        seq(&[oid("1.2.3.4")]),
        policy_with_cps("0.4.0.194112.1.2", &[integer(1)]),
    ]);
    assert_eq!(policies.len(), 2);
    assert_eq!(policies[0].oid, "1.2.3.4");
    assert_eq!(policies[0].cps_url, None);
    assert_eq!(policies[1].oid, "0.4.0.194112.1.2");
    assert_eq!(policies[1].cps_url, None);
}

#[test]
fn bmp_string_cps_is_decoded_as_utf16() {
    // BMPString "hi"
    let bmp = tlv(0x1E, &[0x00, 0x68, 0x00, 0x69]);
    let policies = decode_policies(&[policy_with_cps("1.2.3.4", &[bmp])]);
    assert_eq!(policies[0].cps_url.as_deref(), Some("hi"));

    // Non-ASCII BMP text: U+00E9 U+20AC
    let accented = tlv(0x1E, &[0x00, 0xE9, 0x20, 0xAC]);
    let policies = decode_policies(&[policy_with_cps("1.2.3.4", &[accented])]);
    assert_eq!(policies[0].cps_url.as_deref(), Some("\u{e9}\u{20ac}"));

    // Odd length is not UTF-16; the policy stays, without CPS.
    let broken = tlv(0x1E, &[0x00, 0x68, 0x00]);
    let policies = decode_policies(&[policy_with_cps("1.2.3.4", &[broken])]);
    assert_eq!(policies[0].oid, "1.2.3.4");
    assert_eq!(policies[0].cps_url, None);
}

#[test]
fn user_notice_with_bmp_text_does_not_hide_the_cps() {
    // UserNotice { explicitText BMPString "\u{e9}t\u{e9}" }
    let notice_text = tlv(0x1E, &[0x00, 0xE9, 0x00, 0x74, 0x00, 0xE9]);
    let user_notice = seq(&[oid(oid::QT_UNOTICE), seq(&[notice_text])]);
    let cps = seq(&[oid(oid::QT_CPS), ia5("https://cps.example.org")]);
    let policy = seq(&[oid("1.2.3.4"), seq(&[user_notice, cps])]);

    let policies = decode_policies(&[policy]);
    assert_eq!(policies.len(), 1);
    assert_eq!(policies[0].cps_url.as_deref(), Some("https://cps.example.org"));
}

#[test]
fn crl_distribution_points_skip_relative_names() {
    // DistributionPoint { [0] { [1] RDN } } followed by one with a fullName URI.
    let relative = seq(&[tlv(0xA0, &tlv(0xA1, &[]))]);
    let full = seq(&[tlv(0xA0, &tlv(0xA0, &uri("http://crl.example.org/1.crl")))]);
    let exts = decode_extensions(&single(
        oid::EXT_CRL_DISTRIBUTION_POINTS,
        false,
        ext_value(&seq(&[relative, full])),
    ))
    .unwrap();
    assert_eq!(exts.crl_access_urls(), vec!["http://crl.example.org/1.crl"]);
}

#[test]
fn unknown_oid_tolerated_in_either_position() {
    let known = ext_value(&seq(&[boolean(true)]));
    let unknown = ext_value(&utf8("opaque"));

    let known_critical = ExtensionValues::new()
        .with(oid::EXT_BASIC_CONSTRAINTS, true, known.clone())
        .with("1.2.3.4.99", false, unknown.clone());
    let unknown_critical = ExtensionValues::new()
        .with("1.2.3.4.99", true, unknown)
        .with(oid::EXT_BASIC_CONSTRAINTS, false, known);

    for source in [known_critical, unknown_critical] {
        let exts = decode_extensions(&source).unwrap();
        assert_eq!(exts.iter().count(), 1);
        assert!(exts.basic_constraints().is_some());
        assert_eq!(exts.other_extensions().len(), 1);
        assert_eq!(exts.other_extensions()[0].raw.oid, "1.2.3.4.99");
    }
}

// ---------------------------------------------------------------------------
// Fidelity against the certificate
// ---------------------------------------------------------------------------

#[test]
fn critical_flags_and_octets_match_the_certificate() {
    use x509_parser::prelude::{FromDer, X509Certificate};

    let der = fixture("leaf.der");
    let (_, cert) = X509Certificate::from_der(&der).unwrap();
    let exts = certificate_extensions_from_der(&der, &DecodeOptions::default()).unwrap();

    assert_eq!(exts.len(), cert.extensions().len());
    for ext in cert.extensions() {
        let raw = exts
            .find_by_oid(&ext.oid.to_id_string())
            .unwrap_or_else(|| panic!("missing {}", ext.oid));
        assert_eq!(raw.critical, ext.critical, "critical flag of {}", raw.oid);
        assert_eq!(raw.octets, octet_string(ext.value), "octets of {}", raw.oid);
    }
}
