//! Decoded certificate extension data types.

use crate::oid;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

fn hex_bytes<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&hex::encode(bytes))
}

fn hex_bytes_opt<S: Serializer>(bytes: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
    match bytes {
        Some(b) => s.serialize_some(&hex::encode(b)),
        None => s.serialize_none(),
    }
}

/// An extension exactly as found on the certificate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RawExtension {
    /// Extension OID in dotted form.
    pub oid: String,
    /// The DER `OCTET STRING` carrying the extension value, verbatim.
    #[serde(serialize_with = "hex_bytes")]
    pub octets: Vec<u8>,
    /// Whether the OID was listed among the critical extensions.
    pub critical: bool,
}

/// Known extension types, one aggregate slot each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtensionKind {
    SubjectKeyIdentifier,
    AuthorityKeyIdentifier,
    AuthorityInformationAccess,
    CrlDistributionPoints,
    BasicConstraints,
    KeyUsage,
    ExtendedKeyUsage,
    CertificatePolicies,
    SubjectAlternativeNames,
    OcspNoCheck,
    ValidityAssuredShortTerm,
    QcStatements,
}

impl ExtensionKind {
    pub fn oid(self) -> &'static str {
        match self {
            ExtensionKind::SubjectKeyIdentifier => oid::EXT_SUBJECT_KEY_ID,
            ExtensionKind::AuthorityKeyIdentifier => oid::EXT_AUTHORITY_KEY_ID,
            ExtensionKind::AuthorityInformationAccess => oid::EXT_AUTHORITY_INFO_ACCESS,
            ExtensionKind::CrlDistributionPoints => oid::EXT_CRL_DISTRIBUTION_POINTS,
            ExtensionKind::BasicConstraints => oid::EXT_BASIC_CONSTRAINTS,
            ExtensionKind::KeyUsage => oid::EXT_KEY_USAGE,
            ExtensionKind::ExtendedKeyUsage => oid::EXT_EXTENDED_KEY_USAGE,
            ExtensionKind::CertificatePolicies => oid::EXT_CERTIFICATE_POLICIES,
            ExtensionKind::SubjectAlternativeNames => oid::EXT_SUBJECT_ALT_NAME,
            ExtensionKind::OcspNoCheck => oid::EXT_OCSP_NOCHECK,
            ExtensionKind::ValidityAssuredShortTerm => oid::EXT_VALASSURED_ST_CERTS,
            ExtensionKind::QcStatements => oid::EXT_QC_STATEMENTS,
        }
    }

    /// Human-readable name, as printed by `openssl x509 -text` where it has one.
    pub fn name(self) -> &'static str {
        match self {
            ExtensionKind::SubjectKeyIdentifier => "Subject Key Identifier",
            ExtensionKind::AuthorityKeyIdentifier => "Authority Key Identifier",
            ExtensionKind::AuthorityInformationAccess => "Authority Information Access",
            ExtensionKind::CrlDistributionPoints => "CRL Distribution Points",
            ExtensionKind::BasicConstraints => "Basic Constraints",
            ExtensionKind::KeyUsage => "Key Usage",
            ExtensionKind::ExtendedKeyUsage => "Extended Key Usage",
            ExtensionKind::CertificatePolicies => "Certificate Policies",
            ExtensionKind::SubjectAlternativeNames => "Subject Alternative Name",
            ExtensionKind::OcspNoCheck => "OCSP No Check",
            ExtensionKind::ValidityAssuredShortTerm => "Validity Assured Short-Term",
            ExtensionKind::QcStatements => "Qualified Certificate Statements",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubjectKeyIdentifier {
    pub raw: RawExtension,
    #[serde(serialize_with = "hex_bytes")]
    pub key_identifier: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorityKeyIdentifier {
    pub raw: RawExtension,
    #[serde(serialize_with = "hex_bytes_opt")]
    pub key_identifier: Option<Vec<u8>>,
    /// DER `IssuerSerial` built from `authorityCertIssuer` and
    /// `authorityCertSerialNumber` when both are present.
    #[serde(serialize_with = "hex_bytes_opt")]
    pub authority_cert_issuer_serial: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorityInformationAccess {
    pub raw: RawExtension,
    /// `caIssuers` URIs in encounter order.
    pub ca_issuers: Vec<String>,
    /// `ocsp` URIs in encounter order.
    pub ocsp: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrlDistributionPoints {
    pub raw: RawExtension,
    pub urls: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BasicConstraints {
    pub raw: RawExtension,
    pub ca: bool,
    /// `-1` when the subject is not a CA, `i64::MAX` for a CA without a
    /// path length constraint.
    pub path_len_constraint: i64,
}

/// The nine named bits of the Key Usage extension (RFC 5280 Section 4.2.1.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum KeyUsageBit {
    DigitalSignature,
    NonRepudiation,
    KeyEncipherment,
    DataEncipherment,
    KeyAgreement,
    KeyCertSign,
    CrlSign,
    EncipherOnly,
    DecipherOnly,
}

impl KeyUsageBit {
    /// All bits, indexed by bit position.
    pub const ALL: [KeyUsageBit; 9] = [
        KeyUsageBit::DigitalSignature,
        KeyUsageBit::NonRepudiation,
        KeyUsageBit::KeyEncipherment,
        KeyUsageBit::DataEncipherment,
        KeyUsageBit::KeyAgreement,
        KeyUsageBit::KeyCertSign,
        KeyUsageBit::CrlSign,
        KeyUsageBit::EncipherOnly,
        KeyUsageBit::DecipherOnly,
    ];

    pub fn name(self) -> &'static str {
        match self {
            KeyUsageBit::DigitalSignature => "Digital Signature",
            KeyUsageBit::NonRepudiation => "Non Repudiation",
            KeyUsageBit::KeyEncipherment => "Key Encipherment",
            KeyUsageBit::DataEncipherment => "Data Encipherment",
            KeyUsageBit::KeyAgreement => "Key Agreement",
            KeyUsageBit::KeyCertSign => "Certificate Sign",
            KeyUsageBit::CrlSign => "CRL Sign",
            KeyUsageBit::EncipherOnly => "Encipher Only",
            KeyUsageBit::DecipherOnly => "Decipher Only",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyUsage {
    pub raw: RawExtension,
    pub bits: Vec<KeyUsageBit>,
}

impl KeyUsage {
    pub fn has(&self, bit: KeyUsageBit) -> bool {
        self.bits.contains(&bit)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtendedKeyUsages {
    pub raw: RawExtension,
    pub oids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CertificatePolicy {
    pub oid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cps_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CertificatePolicies {
    pub raw: RawExtension,
    pub policies: Vec<CertificatePolicy>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubjectAlternativeNames {
    pub raw: RawExtension,
    pub names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OcspNoCheck {
    pub raw: RawExtension,
    /// True when the extension value is the expected ASN.1 `NULL`.
    pub present: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidityAssuredShortTerm {
    pub raw: RawExtension,
    /// True when the extension value is the expected ASN.1 `NULL`.
    pub present: bool,
}

// ---------------------------------------------------------------------------
// Qualified certificate statements
// ---------------------------------------------------------------------------

/// `MonetaryValue` of a QcLimitValue statement: `amount * 10^exponent`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QcLimitValue {
    /// ISO 4217 alphabetic code, or the numeric code in decimal.
    pub currency: String,
    pub amount: i64,
    pub exponent: i64,
}

/// PKI disclosure statement location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PdsLocation {
    pub url: String,
    pub language: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum QcType {
    Esign,
    Eseal,
    Web,
}

impl QcType {
    pub fn from_oid(oid_str: &str) -> Option<Self> {
        match oid_str {
            oid::QCT_ESIGN => Some(QcType::Esign),
            oid::QCT_ESEAL => Some(QcType::Eseal),
            oid::QCT_WEB => Some(QcType::Web),
            _ => None,
        }
    }

    pub fn oid(self) -> &'static str {
        match self {
            QcType::Esign => oid::QCT_ESIGN,
            QcType::Eseal => oid::QCT_ESEAL,
            QcType::Web => oid::QCT_WEB,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SemanticsIdentifier {
    Natural,
    Legal,
    EidasNatural,
    EidasLegal,
}

impl SemanticsIdentifier {
    pub fn from_oid(oid_str: &str) -> Option<Self> {
        match oid_str {
            oid::SEMANTICS_NATURAL => Some(SemanticsIdentifier::Natural),
            oid::SEMANTICS_LEGAL => Some(SemanticsIdentifier::Legal),
            oid::SEMANTICS_EIDAS_NATURAL => Some(SemanticsIdentifier::EidasNatural),
            oid::SEMANTICS_EIDAS_LEGAL => Some(SemanticsIdentifier::EidasLegal),
            _ => None,
        }
    }

    pub fn oid(self) -> &'static str {
        match self {
            SemanticsIdentifier::Natural => oid::SEMANTICS_NATURAL,
            SemanticsIdentifier::Legal => oid::SEMANTICS_LEGAL,
            SemanticsIdentifier::EidasNatural => oid::SEMANTICS_EIDAS_NATURAL,
            SemanticsIdentifier::EidasLegal => oid::SEMANTICS_EIDAS_LEGAL,
        }
    }
}

/// Roles of a payment service provider (ETSI TS 119 495).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PspRole {
    AccountServicing,
    PaymentInitiation,
    AccountInformation,
    IssuingOfCardBasedPayment,
}

impl PspRole {
    pub fn from_oid(oid_str: &str) -> Option<Self> {
        match oid_str {
            oid::PSD2_ROLE_ACCOUNT_SERVICING => Some(PspRole::AccountServicing),
            oid::PSD2_ROLE_PAYMENT_INITIATION => Some(PspRole::PaymentInitiation),
            oid::PSD2_ROLE_ACCOUNT_INFORMATION => Some(PspRole::AccountInformation),
            oid::PSD2_ROLE_ISSUING_CARD_PAYMENT => Some(PspRole::IssuingOfCardBasedPayment),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleOfPsp {
    pub oid: String,
    pub name: String,
}

impl RoleOfPsp {
    pub fn role(&self) -> Option<PspRole> {
        PspRole::from_oid(&self.oid)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Psd2QcType {
    pub roles: Vec<RoleOfPsp>,
    pub nca_name: String,
    pub nca_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QcStatements {
    pub raw: RawExtension,
    pub qc_compliance: bool,
    pub qc_limit_value: Option<QcLimitValue>,
    pub qc_eu_retention_period: Option<i32>,
    pub qc_qscd: bool,
    pub qc_eu_pds: Vec<PdsLocation>,
    pub qc_types: Vec<QcType>,
    pub qc_legislation_country_codes: Vec<String>,
    pub qc_semantics_identifier: Option<SemanticsIdentifier>,
    pub psd2_qc_type: Option<Psd2QcType>,
    /// Statement OIDs without a decoder.
    pub other_oids: Vec<String>,
}

impl QcStatements {
    /// Whether a statement with the given OID was decoded (or at least seen,
    /// for statements without a decoder).
    pub fn is_qc_statement_present(&self, statement_oid: &str) -> bool {
        match statement_oid {
            oid::QCS_COMPLIANCE => self.qc_compliance,
            oid::QCS_LIMIT_VALUE => self.qc_limit_value.is_some(),
            oid::QCS_RETENTION_PERIOD => self.qc_eu_retention_period.is_some(),
            oid::QCS_QSCD => self.qc_qscd,
            oid::QCS_PDS => !self.qc_eu_pds.is_empty(),
            oid::QCS_QC_TYPE => !self.qc_types.is_empty(),
            oid::QCS_CC_LEGISLATION => !self.qc_legislation_country_codes.is_empty(),
            oid::QCS_PKIX_SYNTAX_V2 => self.qc_semantics_identifier.is_some(),
            oid::QCS_PSD2 => self.psd2_qc_type.is_some(),
            other => self.other_oids.iter().any(|o| o == other),
        }
    }

    pub fn is_qc_type_present(&self, qc_type_oid: &str) -> bool {
        self.qc_types.iter().any(|t| t.oid() == qc_type_oid)
    }

    pub fn is_qc_legislation_present(&self, country_code: &str) -> bool {
        self.qc_legislation_country_codes
            .iter()
            .any(|c| c == country_code)
    }
}

// ---------------------------------------------------------------------------
// Aggregate
// ---------------------------------------------------------------------------

/// An extension with no decoder; only the raw form is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OtherExtension {
    pub raw: RawExtension,
}

/// One decoded extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CertificateExtension {
    SubjectKeyIdentifier(SubjectKeyIdentifier),
    AuthorityKeyIdentifier(AuthorityKeyIdentifier),
    AuthorityInformationAccess(AuthorityInformationAccess),
    CrlDistributionPoints(CrlDistributionPoints),
    BasicConstraints(BasicConstraints),
    KeyUsage(KeyUsage),
    ExtendedKeyUsage(ExtendedKeyUsages),
    CertificatePolicies(CertificatePolicies),
    SubjectAlternativeNames(SubjectAlternativeNames),
    OcspNoCheck(OcspNoCheck),
    ValidityAssuredShortTerm(ValidityAssuredShortTerm),
    QcStatements(QcStatements),
    Other(OtherExtension),
}

impl CertificateExtension {
    pub fn raw(&self) -> &RawExtension {
        match self {
            CertificateExtension::SubjectKeyIdentifier(e) => &e.raw,
            CertificateExtension::AuthorityKeyIdentifier(e) => &e.raw,
            CertificateExtension::AuthorityInformationAccess(e) => &e.raw,
            CertificateExtension::CrlDistributionPoints(e) => &e.raw,
            CertificateExtension::BasicConstraints(e) => &e.raw,
            CertificateExtension::KeyUsage(e) => &e.raw,
            CertificateExtension::ExtendedKeyUsage(e) => &e.raw,
            CertificateExtension::CertificatePolicies(e) => &e.raw,
            CertificateExtension::SubjectAlternativeNames(e) => &e.raw,
            CertificateExtension::OcspNoCheck(e) => &e.raw,
            CertificateExtension::ValidityAssuredShortTerm(e) => &e.raw,
            CertificateExtension::QcStatements(e) => &e.raw,
            CertificateExtension::Other(e) => &e.raw,
        }
    }

    /// Aggregate slot of this extension; `None` for [`CertificateExtension::Other`].
    pub fn kind(&self) -> Option<ExtensionKind> {
        let kind = match self {
            CertificateExtension::SubjectKeyIdentifier(_) => ExtensionKind::SubjectKeyIdentifier,
            CertificateExtension::AuthorityKeyIdentifier(_) => {
                ExtensionKind::AuthorityKeyIdentifier
            }
            CertificateExtension::AuthorityInformationAccess(_) => {
                ExtensionKind::AuthorityInformationAccess
            }
            CertificateExtension::CrlDistributionPoints(_) => ExtensionKind::CrlDistributionPoints,
            CertificateExtension::BasicConstraints(_) => ExtensionKind::BasicConstraints,
            CertificateExtension::KeyUsage(_) => ExtensionKind::KeyUsage,
            CertificateExtension::ExtendedKeyUsage(_) => ExtensionKind::ExtendedKeyUsage,
            CertificateExtension::CertificatePolicies(_) => ExtensionKind::CertificatePolicies,
            CertificateExtension::SubjectAlternativeNames(_) => {
                ExtensionKind::SubjectAlternativeNames
            }
            CertificateExtension::OcspNoCheck(_) => ExtensionKind::OcspNoCheck,
            CertificateExtension::ValidityAssuredShortTerm(_) => {
                ExtensionKind::ValidityAssuredShortTerm
            }
            CertificateExtension::QcStatements(_) => ExtensionKind::QcStatements,
            CertificateExtension::Other(_) => return None,
        };
        Some(kind)
    }

    pub fn oid(&self) -> &str {
        &self.raw().oid
    }

    pub fn is_critical(&self) -> bool {
        self.raw().critical
    }
}

/// All extensions of one certificate.
///
/// Known extensions occupy at most one slot per [`ExtensionKind`]; the rest
/// are kept in encounter order.  A failed decode leaves its slot empty, so
/// callers must treat every accessor as optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CertificateExtensions {
    known: BTreeMap<ExtensionKind, CertificateExtension>,
    other: Vec<OtherExtension>,
}

impl CertificateExtensions {
    pub(crate) fn push(&mut self, extension: CertificateExtension) {
        match extension {
            CertificateExtension::Other(other) => self.other.push(other),
            known => {
                if let Some(kind) = known.kind() {
                    self.known.insert(kind, known);
                }
            }
        }
    }

    pub fn get(&self, kind: ExtensionKind) -> Option<&CertificateExtension> {
        self.known.get(&kind)
    }

    pub fn contains(&self, kind: ExtensionKind) -> bool {
        self.known.contains_key(&kind)
    }

    /// Decoded known extensions, ordered by kind.
    pub fn iter(&self) -> impl Iterator<Item = &CertificateExtension> {
        self.known.values()
    }

    pub fn other_extensions(&self) -> &[OtherExtension] {
        &self.other
    }

    /// Raw form of every extension in the aggregate, known ones first.
    pub fn raw_extensions(&self) -> impl Iterator<Item = &RawExtension> {
        self.known
            .values()
            .map(CertificateExtension::raw)
            .chain(self.other.iter().map(|o| &o.raw))
    }

    /// Raw form of the extension with the given OID, known or not.
    pub fn find_by_oid(&self, oid_str: &str) -> Option<&RawExtension> {
        self.raw_extensions().find(|raw| raw.oid == oid_str)
    }

    pub fn len(&self) -> usize {
        self.known.len() + self.other.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty() && self.other.is_empty()
    }

    pub fn subject_key_identifier(&self) -> Option<&SubjectKeyIdentifier> {
        match self.get(ExtensionKind::SubjectKeyIdentifier)? {
            CertificateExtension::SubjectKeyIdentifier(e) => Some(e),
            _ => None,
        }
    }

    pub fn authority_key_identifier(&self) -> Option<&AuthorityKeyIdentifier> {
        match self.get(ExtensionKind::AuthorityKeyIdentifier)? {
            CertificateExtension::AuthorityKeyIdentifier(e) => Some(e),
            _ => None,
        }
    }

    pub fn authority_information_access(&self) -> Option<&AuthorityInformationAccess> {
        match self.get(ExtensionKind::AuthorityInformationAccess)? {
            CertificateExtension::AuthorityInformationAccess(e) => Some(e),
            _ => None,
        }
    }

    pub fn crl_distribution_points(&self) -> Option<&CrlDistributionPoints> {
        match self.get(ExtensionKind::CrlDistributionPoints)? {
            CertificateExtension::CrlDistributionPoints(e) => Some(e),
            _ => None,
        }
    }

    pub fn basic_constraints(&self) -> Option<&BasicConstraints> {
        match self.get(ExtensionKind::BasicConstraints)? {
            CertificateExtension::BasicConstraints(e) => Some(e),
            _ => None,
        }
    }

    pub fn key_usage(&self) -> Option<&KeyUsage> {
        match self.get(ExtensionKind::KeyUsage)? {
            CertificateExtension::KeyUsage(e) => Some(e),
            _ => None,
        }
    }

    pub fn extended_key_usage(&self) -> Option<&ExtendedKeyUsages> {
        match self.get(ExtensionKind::ExtendedKeyUsage)? {
            CertificateExtension::ExtendedKeyUsage(e) => Some(e),
            _ => None,
        }
    }

    pub fn certificate_policies(&self) -> Option<&CertificatePolicies> {
        match self.get(ExtensionKind::CertificatePolicies)? {
            CertificateExtension::CertificatePolicies(e) => Some(e),
            _ => None,
        }
    }

    pub fn subject_alternative_names(&self) -> Option<&SubjectAlternativeNames> {
        match self.get(ExtensionKind::SubjectAlternativeNames)? {
            CertificateExtension::SubjectAlternativeNames(e) => Some(e),
            _ => None,
        }
    }

    pub fn ocsp_no_check(&self) -> Option<&OcspNoCheck> {
        match self.get(ExtensionKind::OcspNoCheck)? {
            CertificateExtension::OcspNoCheck(e) => Some(e),
            _ => None,
        }
    }

    pub fn validity_assured_short_term(&self) -> Option<&ValidityAssuredShortTerm> {
        match self.get(ExtensionKind::ValidityAssuredShortTerm)? {
            CertificateExtension::ValidityAssuredShortTerm(e) => Some(e),
            _ => None,
        }
    }

    pub fn qc_statements(&self) -> Option<&QcStatements> {
        match self.get(ExtensionKind::QcStatements)? {
            CertificateExtension::QcStatements(e) => Some(e),
            _ => None,
        }
    }

    /// OCSP responder URLs from the AIA extension.
    pub fn ocsp_access_urls(&self) -> Vec<String> {
        self.authority_information_access()
            .map(|aia| aia.ocsp.clone())
            .unwrap_or_default()
    }

    /// Issuer certificate URLs from the AIA extension.
    pub fn ca_issuers_access_urls(&self) -> Vec<String> {
        self.authority_information_access()
            .map(|aia| aia.ca_issuers.clone())
            .unwrap_or_default()
    }

    pub fn crl_access_urls(&self) -> Vec<String> {
        self.crl_distribution_points()
            .map(|cdp| cdp.urls.clone())
            .unwrap_or_default()
    }

    pub fn has_ocsp_no_check(&self) -> bool {
        self.ocsp_no_check().is_some_and(|e| e.present)
    }

    pub fn has_val_assured_short_term_certs(&self) -> bool {
        self.validity_assured_short_term().is_some_and(|e| e.present)
    }
}
