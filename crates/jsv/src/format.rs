//! `format` validators.
//!
//! Each format is a plain `fn(&str) -> bool` registered under its name with
//! the drafts that define it. Non-string instances are never checked.

use std::collections::HashMap;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::{Arc, OnceLock};

use chrono::NaiveDate;
use parking_lot::RwLock;
use regex::Regex;
use url::Url;

use crate::draft::{Draft, DraftMask};

pub type FormatCheck = fn(&str) -> bool;

#[derive(Debug, Clone, Copy)]
pub struct FormatDefinition {
    pub drafts: DraftMask,
    pub check: FormatCheck,
}

#[derive(Debug, Default)]
pub struct FormatRegistry {
    formats: RwLock<HashMap<String, FormatDefinition>>,
}

impl FormatRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every built-in format.
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        for (name, drafts, check) in DEFAULT_FORMATS {
            registry.register(name, *drafts, *check);
        }
        registry
    }

    pub fn global() -> Arc<FormatRegistry> {
        static GLOBAL: OnceLock<Arc<FormatRegistry>> = OnceLock::new();
        GLOBAL
            .get_or_init(|| Arc::new(FormatRegistry::with_defaults()))
            .clone()
    }

    /// Registers (or replaces) the validator for `name`.
    pub fn register(&self, name: &str, drafts: DraftMask, check: FormatCheck) {
        self.formats
            .write()
            .insert(name.to_string(), FormatDefinition { drafts, check });
    }

    /// The validator for `name`, if one applies to `draft`.
    pub fn get(&self, name: &str, draft: Draft) -> Option<FormatCheck> {
        self.formats
            .read()
            .get(name)
            .filter(|def| def.drafts.contains(draft))
            .map(|def| def.check)
    }

    pub fn reset(&self) {
        let mut formats = self.formats.write();
        formats.clear();
        for (name, drafts, check) in DEFAULT_FORMATS {
            formats.insert(
                name.to_string(),
                FormatDefinition {
                    drafts: *drafts,
                    check: *check,
                },
            );
        }
    }
}

const FROM_06: DraftMask = DraftMask::since(Draft::Draft06);
const FROM_07: DraftMask = DraftMask::since(Draft::Draft07);

const DEFAULT_FORMATS: &[(&str, DraftMask, FormatCheck)] = &[
    ("date-time", DraftMask::ALL, is_date_time),
    ("date", FROM_07, is_date),
    ("time", FROM_07, is_time),
    ("duration", DraftMask::DRAFT2019_09, is_duration),
    ("email", DraftMask::ALL, is_email),
    ("idn-email", FROM_07, is_idn_email),
    ("hostname", DraftMask::ALL, is_hostname),
    ("idn-hostname", FROM_07, is_idn_hostname),
    ("ipv4", DraftMask::ALL, is_ipv4),
    ("ipv6", DraftMask::ALL, is_ipv6),
    ("uri", DraftMask::ALL, is_uri),
    ("uri-reference", FROM_06, is_uri_reference),
    ("iri", FROM_07, is_uri),
    ("iri-reference", FROM_07, is_uri_reference),
    ("uri-template", FROM_06, is_uri_template),
    ("json-pointer", FROM_06, is_json_pointer),
    ("relative-json-pointer", FROM_07, is_relative_json_pointer),
    ("regex", FROM_07, is_regex),
    ("uuid", DraftMask::DRAFT2019_09, is_uuid),
];

fn regex(cell: &'static OnceLock<Option<Regex>>, pattern: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| Regex::new(pattern).ok()).as_ref()
}

fn is_date_time(s: &str) -> bool {
    match s.find(['T', 't']) {
        Some(i) => is_date(&s[..i]) && is_time(&s[i + 1..]),
        None => false,
    }
}

fn is_date(s: &str) -> bool {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    let Some(re) = regex(&RE, r"^\d{4}-\d{2}-\d{2}$") else {
        return false;
    };
    re.is_match(s) && NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

fn is_time(s: &str) -> bool {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    let Some(re) = regex(
        &RE,
        r"^(\d{2}):(\d{2}):(\d{2})(\.\d+)?([zZ]|([+-])(\d{2}):(\d{2}))$",
    ) else {
        return false;
    };
    let Some(caps) = re.captures(s) else {
        return false;
    };
    let num = |i: usize| -> u32 {
        caps.get(i)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(u32::MAX)
    };
    let (hour, minute, second) = (num(1), num(2), num(3));
    if hour > 23 || minute > 59 || second > 60 {
        return false;
    }
    if caps.get(6).is_some() && (num(7) > 23 || num(8) > 59) {
        return false;
    }
    if second == 60 {
        // A leap second is only valid at 23:59:60 UTC.
        let (offset_h, offset_m) = if caps.get(6).is_some() {
            let sign: i64 = if caps.get(6).map(|m| m.as_str()) == Some("-") { -1 } else { 1 };
            (sign * i64::from(num(7)), sign * i64::from(num(8)))
        } else {
            (0, 0)
        };
        let utc_minutes =
            (i64::from(hour) * 60 + i64::from(minute) - offset_h * 60 - offset_m).rem_euclid(24 * 60);
        return utc_minutes == 23 * 60 + 59;
    }
    true
}

fn is_duration(s: &str) -> bool {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    let Some(re) = regex(
        &RE,
        r"^P(?:\d+W|(?:\d+Y(?:\d+M(?:\d+D)?)?|\d+M(?:\d+D)?|\d+D)(?:T(?:\d+H(?:\d+M(?:\d+S)?)?|\d+M(?:\d+S)?|\d+S))?|T(?:\d+H(?:\d+M(?:\d+S)?)?|\d+M(?:\d+S)?|\d+S))$",
    ) else {
        return false;
    };
    re.is_match(s)
}

fn split_email(s: &str) -> Option<(&str, &str)> {
    let (local, domain) = s.rsplit_once('@')?;
    if local.is_empty()
        || local.starts_with('.')
        || local.ends_with('.')
        || local.contains("..")
        || local.contains(char::is_whitespace)
    {
        return None;
    }
    Some((local, domain))
}

fn is_email(s: &str) -> bool {
    match split_email(s) {
        Some((local, domain)) => local.is_ascii() && (is_hostname(domain) || is_ip_literal(domain)),
        None => false,
    }
}

fn is_idn_email(s: &str) -> bool {
    match split_email(s) {
        Some((_, domain)) => is_idn_hostname(domain) || is_ip_literal(domain),
        None => false,
    }
}

fn is_ip_literal(domain: &str) -> bool {
    let Some(inner) = domain.strip_prefix('[').and_then(|d| d.strip_suffix(']')) else {
        return false;
    };
    match inner.strip_prefix("IPv6:") {
        Some(v6) => is_ipv6(v6),
        None => is_ipv4(inner),
    }
}

fn check_labels(s: &str, label_char: fn(char) -> bool) -> bool {
    let s = s.strip_suffix('.').unwrap_or(s);
    if s.is_empty() || s.len() > 253 {
        return false;
    }
    s.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(label_char)
    })
}

fn is_hostname(s: &str) -> bool {
    check_labels(s, |c| c.is_ascii_alphanumeric() || c == '-')
}

fn is_idn_hostname(s: &str) -> bool {
    check_labels(s, |c| c.is_alphanumeric() || c == '-')
}

fn is_ipv4(s: &str) -> bool {
    s.parse::<Ipv4Addr>().is_ok()
}

fn is_ipv6(s: &str) -> bool {
    s.parse::<Ipv6Addr>().is_ok()
}

fn has_invalid_uri_chars(s: &str) -> bool {
    s.chars()
        .any(|c| c.is_whitespace() || matches!(c, '\\' | '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`'))
}

fn is_uri(s: &str) -> bool {
    !has_invalid_uri_chars(s) && Url::parse(s).is_ok()
}

fn is_uri_reference(s: &str) -> bool {
    static BASE: OnceLock<Option<Url>> = OnceLock::new();
    if has_invalid_uri_chars(s) {
        return false;
    }
    match BASE.get_or_init(|| Url::parse("http://example.invalid/").ok()) {
        Some(base) => base.join(s).is_ok(),
        None => false,
    }
}

fn is_uri_template(s: &str) -> bool {
    let mut open = false;
    for c in s.chars() {
        match c {
            '{' if open => return false,
            '{' => open = true,
            '}' if !open => return false,
            '}' => open = false,
            _ => {}
        }
    }
    !open
}

fn is_json_pointer(s: &str) -> bool {
    jsv_pointer::validate_json_pointer(s).is_ok()
}

fn is_relative_json_pointer(s: &str) -> bool {
    jsv_pointer::validate_relative_json_pointer(s).is_ok()
}

fn is_regex(s: &str) -> bool {
    Regex::new(s).is_ok()
}

fn is_uuid(s: &str) -> bool {
    s.len() == 36 && s.as_bytes()[8] == b'-' && uuid::Uuid::parse_str(s).is_ok()
}
