//! Format checks for the string-typed fields that carry a stricter contract.

use chrono::DateTime;
use lazy_static::lazy_static;
use regex::Regex;
use url::Url;
use uuid::Uuid;

lazy_static! {
    // Local part, then dot-separated host labels ending in an alphabetic TLD.
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[A-Za-z0-9_'+%.-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)*\.[A-Za-z]{2,}$"
    ).unwrap();
}

pub fn is_email(s: &str) -> bool {
    let Some((local, _)) = s.split_once('@') else {
        return false;
    };
    !local.starts_with('.') && !local.ends_with('.') && !s.contains("..") && EMAIL_REGEX.is_match(s)
}

/// Absolute URL with a scheme. Relative references fail to parse without a base.
pub fn is_url(s: &str) -> bool {
    Url::parse(s).is_ok()
}

pub fn is_uuid(s: &str) -> bool {
    Uuid::parse_str(s).is_ok()
}

/// RFC 3339 date-time: `YYYY-MM-DDTHH:MM:SS[.frac]` with a `Z` or numeric
/// `±HH:MM` offset. Any offset is accepted and stored as UTC; dates alone and
/// offset-less times are rejected.
pub fn is_timestamp(s: &str) -> bool {
    DateTime::parse_from_rfc3339(s).is_ok()
}
