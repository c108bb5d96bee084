//! Revocation data: CRL entry reasons and OCSP certificate identity.

mod crl;
mod ocsp;

pub use crl::{crl_revocation_token_key, decode_crl_revocation_reason, RevocationReason};
pub use ocsp::{
    build_certificate_id, build_certificate_id_with, latest_single_response_for, matches,
    ocsp_revocation_token_key, parse_ocsp_response, single_responses_for, BasicOcspResponse,
    CertStatus, CertificateId, SingleResponse,
};
