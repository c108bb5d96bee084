//! Certificate parsing from PEM and DER formats.
//!
//! Bridges x509-parser certificates to [`ExtensionSource`] so that the
//! extension decoders and the OCSP identity builders can run on raw
//! certificate files.

use crate::extensions::{decode_extensions_with_options, DecodeOptions, ExtensionSource};
use crate::fields::CertificateExtensions;
use crate::revocation::{build_certificate_id, CertificateId};
use crate::util;
use crate::CertMetaError;
use std::borrow::Cow;
use x509_parser::prelude::*;

impl ExtensionSource for X509Certificate<'_> {
    fn critical_extension_oids(&self) -> Vec<String> {
        self.extensions()
            .iter()
            .filter(|ext| ext.critical)
            .map(|ext| ext.oid.to_id_string())
            .collect()
    }

    fn non_critical_extension_oids(&self) -> Vec<String> {
        self.extensions()
            .iter()
            .filter(|ext| !ext.critical)
            .map(|ext| ext.oid.to_id_string())
            .collect()
    }

    fn extension_value(&self, oid: &str) -> Option<Vec<u8>> {
        // x509-parser hands out the contents of extnValue; restore the
        // OCTET STRING envelope.
        self.extensions()
            .iter()
            .find(|ext| ext.oid.to_id_string() == oid)
            .and_then(|ext| util::der_wrap(0x04, ext.value).ok())
    }
}

/// Certificate DER from PEM or DER input (auto-detected).
///
/// If the input begins with `-----BEGIN` (after stripping whitespace), it is
/// treated as PEM. Otherwise it is treated as DER.
fn certificate_der(input: &[u8]) -> Result<Cow<'_, [u8]>, CertMetaError> {
    if input.is_empty() {
        return Err(CertMetaError::ParseError("empty input".into()));
    }
    if !util::is_pem(input) {
        return Ok(Cow::Borrowed(input));
    }

    let (_, pem) = x509_parser::pem::parse_x509_pem(input)
        .map_err(|e| CertMetaError::PemError(format!("{}", e)))?;

    if pem.label != "CERTIFICATE"
        && pem.label != "TRUSTED CERTIFICATE"
        && pem.label != "X509 CERTIFICATE"
    {
        return Err(CertMetaError::PemError(format!(
            "expected CERTIFICATE, got {}",
            pem.label
        )));
    }
    Ok(Cow::Owned(pem.contents))
}

fn parse_x509(der: &[u8]) -> Result<X509Certificate<'_>, CertMetaError> {
    let (_, x509) =
        X509Certificate::from_der(der).map_err(|e| CertMetaError::ParseError(format!("{}", e)))?;
    Ok(x509)
}

/// Decode the extensions of a certificate given as PEM or DER (auto-detected),
/// with the default [`DecodeOptions`].
pub fn parse_certificate_extensions(input: &[u8]) -> Result<CertificateExtensions, CertMetaError> {
    let der = certificate_der(input)?;
    certificate_extensions_from_der(&der, &DecodeOptions::default())
}

/// Decode the extensions of a DER certificate.
pub fn certificate_extensions_from_der(
    der: &[u8],
    options: &DecodeOptions,
) -> Result<CertificateExtensions, CertMetaError> {
    let x509 = parse_x509(der)?;
    decode_extensions_with_options(&x509, options)
}

/// Decode the extensions of a PEM certificate.
pub fn certificate_extensions_from_pem(
    pem: &[u8],
    options: &DecodeOptions,
) -> Result<CertificateExtensions, CertMetaError> {
    if !util::is_pem(pem) {
        return Err(CertMetaError::PemError("missing PEM header".into()));
    }
    let der = certificate_der(pem)?;
    certificate_extensions_from_der(&der, options)
}

/// SHA-1 OCSP [`CertificateId`] of `cert` issued by `issuer`; both PEM or DER.
pub fn certificate_id_from_der(cert: &[u8], issuer: &[u8]) -> Result<CertificateId, CertMetaError> {
    let cert_der = certificate_der(cert)?;
    let issuer_der = certificate_der(issuer)?;
    build_certificate_id(&parse_x509(&cert_der)?, &parse_x509(&issuer_der)?)
}
