use lazy_static::lazy_static;
use regex::Regex;
use time::{format_description::BorrowedFormatItem, macros::format_description, Date};

pub const MAX_DESCRIPTION_LEN: usize = 500;

pub const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex =
            Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Password policy: at least 8 characters with one uppercase letter, one
/// lowercase letter, one digit and one special character.
pub fn is_strong_password(password: &str) -> bool {
    lazy_static! {
        static ref UPPER_RE: Regex = Regex::new(r"[A-Z]").unwrap();
        static ref LOWER_RE: Regex = Regex::new(r"[a-z]").unwrap();
        static ref DIGIT_RE: Regex = Regex::new(r"\d").unwrap();
        static ref SPECIAL_RE: Regex = Regex::new(r#"[!@#$%^&*(),.?":{}|<>]"#).unwrap();
    }
    password.len() >= 8
        && UPPER_RE.is_match(password)
        && LOWER_RE.is_match(password)
        && DIGIT_RE.is_match(password)
        && SPECIAL_RE.is_match(password)
}

/// Parses a `YYYY-MM-DD` calendar date.
pub fn parse_date(input: &str) -> Option<Date> {
    Date::parse(input, DATE_FORMAT).ok()
}

pub fn is_valid_description(description: &str) -> bool {
    !description.is_empty() && description.chars().count() <= MAX_DESCRIPTION_LEN
}

/// Escapes LIKE wildcards so user keywords match as literal substrings.
pub fn escape_like(keyword: &str) -> String {
    let mut escaped = String::with_capacity(keyword.len());
    for c in keyword.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
