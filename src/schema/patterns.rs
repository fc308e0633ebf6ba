//! Shared regular expressions for field validation

use once_cell::sync::Lazy;
use regex::Regex;

/// Loose email shape: something@something.tld, no whitespace
pub static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex")
});

/// Saudi mobile number with optional +966 / 966 / 0 prefix
pub static SAUDI_PHONE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\+966|966|0)?5\d{8}$").expect("valid phone regex"));

/// Saudi national id (citizens start with 1, residents with 2)
pub static SAUDI_NATIONAL_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[12]\d{9}$").expect("valid national id regex"));

/// Saudi IBAN: SA followed by 22 digits
pub static SAUDI_IBAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^SA\d{22}$").expect("valid iban regex"));

/// Hex color like #1A2B3C
pub static HEX_COLOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("valid color regex"));

/// Normalize a phone number before matching: drop spaces and dashes
pub fn normalize_phone(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace() && *c != '-').collect()
}
