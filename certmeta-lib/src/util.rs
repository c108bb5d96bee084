//! Shared encoding utilities.

use crate::CertMetaError;
use base64::Engine;

/// Format bytes as colon-separated uppercase hex (e.g., "AB:CD:EF").
pub fn hex_colon_upper(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(":")
}

/// Encode bytes as single-line base64, used when logging offending binaries.
pub fn base64_line(data: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(data)
}

/// Maximum content length for DER TLV encoding with a 3-byte length field.
const MAX_DER_CONTENT_LEN: usize = 0xFF_FFFF; // 16 MiB

/// Wrap content bytes in a DER tag-length-value envelope.
///
/// Supports content lengths up to [`MAX_DER_CONTENT_LEN`] (16 MiB).
/// Returns an error if content exceeds this limit.
pub fn der_wrap(tag: u8, content: &[u8]) -> Result<Vec<u8>, CertMetaError> {
    let len = content.len();
    if len > MAX_DER_CONTENT_LEN {
        return Err(CertMetaError::EncodingError(format!(
            "DER content length {} exceeds maximum supported ({})",
            len, MAX_DER_CONTENT_LEN
        )));
    }
    let mut buf = Vec::with_capacity(1 + 4 + len);
    buf.push(tag);
    if len < 0x80 {
        buf.push(len as u8);
    } else if len < 0x100 {
        buf.push(0x81);
        buf.push(len as u8);
    } else if len < 0x1_0000 {
        buf.push(0x82);
        buf.push((len >> 8) as u8);
        buf.push(len as u8);
    } else {
        buf.push(0x83);
        buf.push((len >> 16) as u8);
        buf.push((len >> 8) as u8);
        buf.push(len as u8);
    }
    buf.extend_from_slice(content);
    Ok(buf)
}

/// Concatenate already-encoded TLVs and wrap them in a constructed envelope.
pub fn der_wrap_all(tag: u8, parts: &[&[u8]]) -> Result<Vec<u8>, CertMetaError> {
    der_wrap(tag, &parts.concat())
}

/// Whether `input` looks like PEM (starts with `-----BEGIN` after whitespace).
pub fn is_pem(input: &[u8]) -> bool {
    input
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .and_then(|start| input.get(start..))
        .is_some_and(|rest| rest.starts_with(b"-----BEGIN"))
}
