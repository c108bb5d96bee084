//! Centralized OID string constants used throughout certmeta-lib.
//!
//! Object Identifiers (OIDs) are defined by ITU-T X.660 and referenced by
//! RFC 5280 (X.509 extensions), RFC 6960 (OCSP), RFC 3739 (qualified
//! certificate statements) and the ETSI EN 319 412 profiles.  Grouping them
//! here avoids magic strings scattered across modules and gives each OID a
//! readable name.

// ── X.509v3 extensions (RFC 5280 Section 4.2) ───────────────────────────

pub const EXT_SUBJECT_KEY_ID: &str = "2.5.29.14";
pub const EXT_KEY_USAGE: &str = "2.5.29.15";
pub const EXT_SUBJECT_ALT_NAME: &str = "2.5.29.17";
pub const EXT_BASIC_CONSTRAINTS: &str = "2.5.29.19";
pub const EXT_CRL_DISTRIBUTION_POINTS: &str = "2.5.29.31";
pub const EXT_CERTIFICATE_POLICIES: &str = "2.5.29.32";
pub const EXT_AUTHORITY_KEY_ID: &str = "2.5.29.35";
pub const EXT_EXTENDED_KEY_USAGE: &str = "2.5.29.37";

// ── CRL entry extensions (RFC 5280 Section 5.3) ─────────────────────────

pub const CRL_REASON_CODE: &str = "2.5.29.21";

// ── PKIX Authority Information Access (RFC 5280 Section 4.2.2) ──────────

pub const EXT_AUTHORITY_INFO_ACCESS: &str = "1.3.6.1.5.5.7.1.1";
pub const ACCESS_OCSP: &str = "1.3.6.1.5.5.7.48.1";
pub const ACCESS_CA_ISSUERS: &str = "1.3.6.1.5.5.7.48.2";

// ── Policy qualifiers (RFC 5280 Section 4.2.1.4) ────────────────────────

pub const QT_CPS: &str = "1.3.6.1.5.5.7.2.1";
pub const QT_UNOTICE: &str = "1.3.6.1.5.5.7.2.2";

// ── OCSP (RFC 6960) ──────────────────────────────────────────────────────

pub const OCSP_BASIC: &str = "1.3.6.1.5.5.7.48.1.1";
pub const EXT_OCSP_NOCHECK: &str = "1.3.6.1.5.5.7.48.1.5";

// ── ETSI EN 319 412-1: validity assured short-term certificates ─────────

pub const EXT_VALASSURED_ST_CERTS: &str = "0.4.0.194121.2.1";

// ── Qualified certificate statements (RFC 3739, ETSI EN 319 412-5) ──────

pub const EXT_QC_STATEMENTS: &str = "1.3.6.1.5.5.7.1.3";
pub const QCS_PKIX_SYNTAX_V2: &str = "1.3.6.1.5.5.7.11.2";
pub const QCS_COMPLIANCE: &str = "0.4.0.1862.1.1";
pub const QCS_LIMIT_VALUE: &str = "0.4.0.1862.1.2";
pub const QCS_RETENTION_PERIOD: &str = "0.4.0.1862.1.3";
pub const QCS_QSCD: &str = "0.4.0.1862.1.4";
pub const QCS_PDS: &str = "0.4.0.1862.1.5";
pub const QCS_QC_TYPE: &str = "0.4.0.1862.1.6";
pub const QCS_CC_LEGISLATION: &str = "0.4.0.1862.1.7";

pub const QCT_ESIGN: &str = "0.4.0.1862.1.6.1";
pub const QCT_ESEAL: &str = "0.4.0.1862.1.6.2";
pub const QCT_WEB: &str = "0.4.0.1862.1.6.3";

// ── ETSI EN 319 412-1 semantics identifiers ─────────────────────────────

pub const SEMANTICS_NATURAL: &str = "0.4.0.194121.1.1";
pub const SEMANTICS_LEGAL: &str = "0.4.0.194121.1.2";
pub const SEMANTICS_EIDAS_NATURAL: &str = "0.4.0.194121.1.3";
pub const SEMANTICS_EIDAS_LEGAL: &str = "0.4.0.194121.1.4";

// ── ETSI TS 119 495: PSD2 qualified certificate statement ───────────────

pub const QCS_PSD2: &str = "0.4.0.19495.2";
pub const PSD2_ROLE_ACCOUNT_SERVICING: &str = "0.4.0.19495.1.1";
pub const PSD2_ROLE_PAYMENT_INITIATION: &str = "0.4.0.19495.1.2";
pub const PSD2_ROLE_ACCOUNT_INFORMATION: &str = "0.4.0.19495.1.3";
pub const PSD2_ROLE_ISSUING_CARD_PAYMENT: &str = "0.4.0.19495.1.4";

// ── Digest algorithms ────────────────────────────────────────────────────

pub const MD5: &str = "1.2.840.113549.2.5";
pub const SHA1: &str = "1.3.14.3.2.26";
pub const SHA256: &str = "2.16.840.1.101.3.4.2.1";
pub const SHA384: &str = "2.16.840.1.101.3.4.2.2";
pub const SHA512: &str = "2.16.840.1.101.3.4.2.3";
