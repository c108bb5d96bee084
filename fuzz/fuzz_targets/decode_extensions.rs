#![no_main]

use certmeta_lib::{
    decode_extensions, oid, parse_certificate_extensions, DecodeOptions, ExtensionValues,
};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Certificate input, PEM or DER. The decoders must never panic.
    if let Ok(extensions) = parse_certificate_extensions(data) {
        let _ = extensions.ocsp_access_urls();
        let _ = extensions.ca_issuers_access_urls();
        let _ = extensions.crl_access_urls();
        let _ = certmeta_lib::display_text(&extensions);
        let _ = certmeta_lib::to_json(&extensions);
    }

    // The same bytes as the value of every known extension.
    let mut values = ExtensionValues::new();
    for ext_oid in [
        oid::EXT_SUBJECT_KEY_ID,
        oid::EXT_AUTHORITY_KEY_ID,
        oid::EXT_AUTHORITY_INFO_ACCESS,
        oid::EXT_CRL_DISTRIBUTION_POINTS,
        oid::EXT_BASIC_CONSTRAINTS,
        oid::EXT_KEY_USAGE,
        oid::EXT_EXTENDED_KEY_USAGE,
        oid::EXT_CERTIFICATE_POLICIES,
        oid::EXT_SUBJECT_ALT_NAME,
        oid::EXT_OCSP_NOCHECK,
        oid::EXT_VALASSURED_ST_CERTS,
        oid::EXT_QC_STATEMENTS,
    ] {
        values.insert(ext_oid, false, data.to_vec());
    }
    let _ = decode_extensions(&values);
    let lenient = DecodeOptions {
        strict_key_identifiers: false,
    };
    let _ = certmeta_lib::decode_extensions_with_options(&values, &lenient);
});
