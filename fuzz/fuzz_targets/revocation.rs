#![no_main]

use certmeta_lib::{
    decode_crl_revocation_reason, parse_ocsp_response, CertificateId, SingleResponse,
};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Reason decoding falls back instead of failing.
    let _ = decode_crl_revocation_reason(data);

    let _ = parse_ocsp_response(data);
    let _ = SingleResponse::from_der(data);

    // A decoded CertID must re-encode without panicking.
    if let Ok(cert_id) = CertificateId::from_der(data) {
        let _ = cert_id.to_der();
        assert!(cert_id.matches(&cert_id));
    }
});
