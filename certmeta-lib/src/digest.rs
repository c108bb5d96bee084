//! Message digest computation over the RustCrypto hash implementations.

use crate::oid;
use crate::CertMetaError;
use digest::Digest;
use serde::Serialize;

/// Digest algorithms usable for OCSP certificate identifiers and
/// deterministic identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DigestAlgorithm {
    Md5,
    Sha1,
    Sha256,
    Sha384,
    Sha512,
}

impl DigestAlgorithm {
    /// Resolve a hash algorithm OID (dotted form).
    ///
    /// An OID without a digest implementation is a [`CertMetaError::DigestUnavailable`].
    pub fn from_oid(oid_str: &str) -> Result<Self, CertMetaError> {
        match oid_str {
            oid::MD5 => Ok(DigestAlgorithm::Md5),
            oid::SHA1 => Ok(DigestAlgorithm::Sha1),
            oid::SHA256 => Ok(DigestAlgorithm::Sha256),
            oid::SHA384 => Ok(DigestAlgorithm::Sha384),
            oid::SHA512 => Ok(DigestAlgorithm::Sha512),
            other => Err(CertMetaError::DigestUnavailable(format!(
                "no digest implementation for OID {}",
                other
            ))),
        }
    }

    /// Dotted OID of the algorithm.
    pub fn oid(self) -> &'static str {
        match self {
            DigestAlgorithm::Md5 => oid::MD5,
            DigestAlgorithm::Sha1 => oid::SHA1,
            DigestAlgorithm::Sha256 => oid::SHA256,
            DigestAlgorithm::Sha384 => oid::SHA384,
            DigestAlgorithm::Sha512 => oid::SHA512,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DigestAlgorithm::Md5 => "MD5",
            DigestAlgorithm::Sha1 => "SHA-1",
            DigestAlgorithm::Sha256 => "SHA-256",
            DigestAlgorithm::Sha384 => "SHA-384",
            DigestAlgorithm::Sha512 => "SHA-512",
        }
    }

    /// DER encoding of the algorithm OID (tag, length and value).
    pub(crate) fn oid_der(self) -> &'static [u8] {
        match self {
            DigestAlgorithm::Md5 => &[0x06, 0x08, 0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x02, 0x05],
            DigestAlgorithm::Sha1 => &[0x06, 0x05, 0x2b, 0x0e, 0x03, 0x02, 0x1a],
            DigestAlgorithm::Sha256 => &[
                0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x01,
            ],
            DigestAlgorithm::Sha384 => &[
                0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x02,
            ],
            DigestAlgorithm::Sha512 => &[
                0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x03,
            ],
        }
    }
}

impl std::fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Digest the concatenation of `parts` without materializing it.
pub fn compute_digest(algorithm: DigestAlgorithm, parts: &[&[u8]]) -> Vec<u8> {
    fn run<D: Digest>(parts: &[&[u8]]) -> Vec<u8> {
        let mut hasher = D::new();
        for part in parts {
            hasher.update(part);
        }
        hasher.finalize().to_vec()
    }

    match algorithm {
        DigestAlgorithm::Md5 => run::<md5::Md5>(parts),
        DigestAlgorithm::Sha1 => run::<sha1::Sha1>(parts),
        DigestAlgorithm::Sha256 => run::<sha2::Sha256>(parts),
        DigestAlgorithm::Sha384 => run::<sha2::Sha384>(parts),
        DigestAlgorithm::Sha512 => run::<sha2::Sha512>(parts),
    }
}
