//! Input validation helpers
//!
//! Email checks used by sign-up support and account provisioning, plus the
//! shape check applied to uploaded trade-data documents before they are
//! forwarded upstream.

use crate::types::TradeDataDocument;

/// University domains eligible for the student program
pub const UNIVERSITY_EMAIL_DOMAINS: &[&str] = &[
    "hku.hk",
    "connect.hku.hk",
    "graduate.hku.hk",
    "cuhk.edu.hk",
    "link.cuhk.edu.hk",
    "ust.hk",
    "connect.ust.hk",
    "polyu.edu.hk",
    "connect.polyu.hk",
    "cityu.edu.hk",
    "my.cityu.edu.hk",
    "gapps.cityu.edu.hk",
    "hkbu.edu.hk",
    "life.hkbu.edu.hk",
    "associate.hkbu.edu.hk",
    "ln.edu.hk",
    "s.eduhk.hk",
    "eduhk.hk",
    "hkmu.edu.hk",
    "ouhk.edu.hk",
    "hksyu.edu",
    "hsu.edu.hk",
    "cihe.edu.hk",
    "sf.edu.hk",
];

/// Minimal structural email check: exactly one `@` with a dotted domain.
///
/// Deliverability is the identity provider's problem; this only rejects
/// obviously malformed input before it reaches an upstream service.
pub fn is_valid_email(email: &str) -> bool {
    let mut parts = email.split('@');
    let (local, domain) = match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => (local, domain),
        _ => return false,
    };

    if local.is_empty() || domain.is_empty() || email.contains(char::is_whitespace) {
        return false;
    }

    domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

/// Extract the lowercase domain part of an email, if present
pub fn email_domain(email: &str) -> Option<String> {
    email.split('@').nth(1).map(|domain| domain.to_lowercase())
}

/// True when the email's domain belongs to a participating university
pub fn is_university_email(email: &str) -> bool {
    match email_domain(email) {
        Some(domain) => UNIVERSITY_EMAIL_DOMAINS.contains(&domain.as_str()),
        None => false,
    }
}

/// Validate an uploaded trade-data document.
///
/// The document must carry the MT5 login it belongs to; everything else is
/// shape-checked by deserialization before this runs.
pub fn validate_upload(document: &TradeDataDocument) -> Result<&str, String> {
    match document.mt5_login.as_deref() {
        None | Some("") => Err("mt5Login is required".to_string()),
        Some(login) if login.chars().any(char::is_whitespace) => {
            Err("mt5Login must not contain whitespace".to_string())
        }
        Some(login) => Ok(login),
    }
}
