//! Human-readable and JSON formatting of decoded extensions.

use crate::fields::{CertificateExtension, CertificateExtensions, QcStatements};
use crate::util;
use crate::CertMetaError;

/// Format decoded extensions as human-readable text, in the layout of
/// `openssl x509 -text`.
pub fn display_text(extensions: &CertificateExtensions) -> String {
    let mut out = String::new();

    out.push_str("Extensions:\n");
    for ext in extensions.iter() {
        format_extension(&mut out, ext);
    }
    for other in extensions.other_extensions() {
        let raw = &other.raw;
        let critical_str = if raw.critical { " [critical]" } else { "" };
        let hex = hex::encode(&raw.octets);
        out.push_str(&format!("  {}:{}", raw.oid, critical_str));
        if hex.len() <= 40 {
            out.push_str(&format!(" {}\n", hex));
        } else {
            out.push_str(&format!(" {}...\n", hex.get(..40).unwrap_or(hex.as_str())));
        }
    }

    out
}

fn format_extension(out: &mut String, ext: &CertificateExtension) {
    let critical_str = if ext.is_critical() { " [critical]" } else { "" };
    let name = ext.kind().map_or("Unknown", |kind| kind.name());

    match ext {
        CertificateExtension::SubjectKeyIdentifier(ski) => {
            out.push_str(&format!(
                "  {}:{} {}\n",
                name,
                critical_str,
                util::hex_colon_upper(&ski.key_identifier)
            ));
        }
        CertificateExtension::AuthorityKeyIdentifier(aki) => match &aki.key_identifier {
            Some(kid) => out.push_str(&format!(
                "  {}:{} keyid:{}\n",
                name,
                critical_str,
                util::hex_colon_upper(kid)
            )),
            None => out.push_str(&format!("  {}:{}\n", name, critical_str)),
        },
        CertificateExtension::AuthorityInformationAccess(aia) => {
            out.push_str(&format!("  {}:{}\n", name, critical_str));
            for url in &aia.ocsp {
                out.push_str(&format!("    OCSP - URI:{}\n", url));
            }
            for url in &aia.ca_issuers {
                out.push_str(&format!("    CA Issuers - URI:{}\n", url));
            }
        }
        CertificateExtension::CrlDistributionPoints(crl) => {
            out.push_str(&format!("  {}:{}\n", name, critical_str));
            for url in &crl.urls {
                out.push_str(&format!("    URI:{}\n", url));
            }
        }
        CertificateExtension::BasicConstraints(bc) => {
            let pl = if bc.ca && bc.path_len_constraint != i64::MAX {
                format!(", pathlen:{}", bc.path_len_constraint)
            } else {
                String::new()
            };
            out.push_str(&format!(
                "  {}:{} CA:{}{}\n",
                name,
                critical_str,
                if bc.ca { "TRUE" } else { "FALSE" },
                pl
            ));
        }
        CertificateExtension::KeyUsage(ku) => {
            let names: Vec<&str> = ku.bits.iter().map(|bit| bit.name()).collect();
            out.push_str(&format!("  {}:{} {}\n", name, critical_str, names.join(", ")));
        }
        CertificateExtension::ExtendedKeyUsage(eku) => {
            out.push_str(&format!(
                "  {}:{} {}\n",
                name,
                critical_str,
                eku.oids.join(", ")
            ));
        }
        CertificateExtension::CertificatePolicies(policies) => {
            out.push_str(&format!("  {}:{}\n", name, critical_str));
            for policy in &policies.policies {
                out.push_str(&format!("    Policy: {}\n", policy.oid));
                if let Some(cps) = &policy.cps_url {
                    out.push_str(&format!("      CPS: {}\n", cps));
                }
            }
        }
        CertificateExtension::SubjectAlternativeNames(san) => {
            out.push_str(&format!("  {}:{}\n", name, critical_str));
            for entry in &san.names {
                out.push_str(&format!("    {}\n", entry));
            }
        }
        CertificateExtension::OcspNoCheck(marker) => {
            out.push_str(&format!("  {}:{} {}\n", name, critical_str, marker.present));
        }
        CertificateExtension::ValidityAssuredShortTerm(marker) => {
            out.push_str(&format!("  {}:{} {}\n", name, critical_str, marker.present));
        }
        CertificateExtension::QcStatements(qc) => {
            out.push_str(&format!("  {}:{}\n", name, critical_str));
            format_qc_statements(out, qc);
        }
        CertificateExtension::Other(other) => {
            out.push_str(&format!("  {}:{}\n", other.raw.oid, critical_str));
        }
    }
}

fn format_qc_statements(out: &mut String, qc: &QcStatements) {
    if qc.qc_compliance {
        out.push_str("    QcCompliance\n");
    }
    if qc.qc_qscd {
        out.push_str("    QcSSCD\n");
    }
    if let Some(limit) = &qc.qc_limit_value {
        out.push_str(&format!(
            "    QcLimitValue: {} * 10^{} {}\n",
            limit.amount, limit.exponent, limit.currency
        ));
    }
    if let Some(years) = qc.qc_eu_retention_period {
        out.push_str(&format!("    QcEuRetentionPeriod: {} years\n", years));
    }
    for pds in &qc.qc_eu_pds {
        out.push_str(&format!("    QcEuPDS: {} ({})\n", pds.url, pds.language));
    }
    for qc_type in &qc.qc_types {
        out.push_str(&format!("    QcType: {:?}\n", qc_type));
    }
    if !qc.qc_legislation_country_codes.is_empty() {
        out.push_str(&format!(
            "    QcCClegislation: {}\n",
            qc.qc_legislation_country_codes.join(", ")
        ));
    }
    if let Some(semantics) = qc.qc_semantics_identifier {
        out.push_str(&format!("    Semantics Identifier: {}\n", semantics.oid()));
    }
    if let Some(psd2) = &qc.psd2_qc_type {
        out.push_str(&format!("    PSD2: {} ({})\n", psd2.nca_name, psd2.nca_id));
        for role in &psd2.roles {
            out.push_str(&format!("      Role: {} ({})\n", role.name, role.oid));
        }
    }
    for other in &qc.other_oids {
        out.push_str(&format!("    {}\n", other));
    }
}

/// Serialize decoded extensions to a pretty-printed JSON string.
pub fn to_json(extensions: &CertificateExtensions) -> Result<String, CertMetaError> {
    serde_json::to_string_pretty(extensions).map_err(CertMetaError::Json)
}
