//! Field format checks.
//!
//! Each check is a plain predicate. Callers turn a `false` into a
//! field-specific [`ValidationError`](crate::error::ValidationError) and a
//! security event.

use std::sync::LazyLock;

use regex::Regex;

static NAME: LazyLock<Regex> = LazyLock::new(|| compile(r"^[A-Za-z\s\-']{2,50}$"));
static STUDENT_ID: LazyLock<Regex> = LazyLock::new(|| compile(r"^[A-Za-z0-9_-]{3,20}$"));
static EMAIL_LOCAL_PART: LazyLock<Regex> = LazyLock::new(|| compile(r"^[A-Za-z0-9._%+-]+$"));

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid built-in pattern {pattern:?}: {e}"))
}

/// Letters, whitespace, hyphens and apostrophes; 2 to 50 characters.
pub fn is_valid_name(name: &str) -> bool {
    NAME.is_match(name)
}

/// ASCII letters, digits, `-` and `_`; 3 to 20 characters.
pub fn is_valid_student_id(student_id: &str) -> bool {
    STUDENT_ID.is_match(student_id)
}

/// `local@domain` where `domain` is exactly the configured school domain.
///
/// `domain` comes from configuration and is compared literally, so it never
/// participates in pattern matching.
pub fn is_valid_email(email: &str, domain: &str) -> bool {
    match email.split_once('@') {
        Some((local, rest)) => rest == domain && EMAIL_LOCAL_PART.is_match(local),
        None => false,
    }
}

/// Case-insensitive suffix check, used when vetting sign-in identities.
///
/// `allowed` may be given with or without the leading `@`.
pub fn is_valid_domain(email: &str, allowed: &str) -> bool {
    let allowed = allowed.trim_start_matches('@');
    if allowed.is_empty() {
        return false;
    }
    email
        .to_ascii_lowercase()
        .ends_with(&format!("@{}", allowed.to_ascii_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOMAIN: &str = "g.cjc.edu.ph";

    #[test]
    fn email_must_match_school_domain() {
        assert!(is_valid_email("user@g.cjc.edu.ph", DOMAIN));
        assert!(is_valid_email("first.last+funrun@g.cjc.edu.ph", DOMAIN));
        assert!(!is_valid_email("user@gmail.com", DOMAIN));
        assert!(!is_valid_email("not-an-email", DOMAIN));
        assert!(!is_valid_email("@g.cjc.edu.ph", DOMAIN));
        assert!(!is_valid_email("a@b@g.cjc.edu.ph", DOMAIN));
        assert!(!is_valid_email("user@evil.g.cjc.edu.ph", DOMAIN));
        assert!(!is_valid_email("user@g.cjc.edu.ph.evil.com", DOMAIN));
    }

    #[test]
    fn email_domain_is_not_a_pattern() {
        // '.' in the configured domain must not act as a wildcard.
        assert!(!is_valid_email("user@gXcjcXeduXph", DOMAIN));
    }

    #[test]
    fn student_id_format() {
        assert!(is_valid_student_id("AB-12_3"));
        assert!(is_valid_student_id("2024-00123"));
        assert!(!is_valid_student_id("ab"));
        assert!(!is_valid_student_id("has space"));
        assert!(!is_valid_student_id("this-id-is-way-too-long-123"));
        assert!(!is_valid_student_id("id;drop"));
    }

    #[test]
    fn name_format() {
        assert!(is_valid_name("Juan Dela Cruz"));
        assert!(is_valid_name("Mary-Jane O'Neil"));
        assert!(!is_valid_name("J"));
        assert!(!is_valid_name("R2-D2"));
        assert!(!is_valid_name(&"a".repeat(51)));
    }

    #[test]
    fn domain_check_is_case_insensitive() {
        assert!(is_valid_domain("Finance@G.CJC.EDU.PH", "g.cjc.edu.ph"));
        assert!(is_valid_domain("finance@g.cjc.edu.ph", "@g.cjc.edu.ph"));
        assert!(!is_valid_domain("finance@gmail.com", "g.cjc.edu.ph"));
        assert!(!is_valid_domain("finance@notg.cjc.edu.ph", "g.cjc.edu.ph"));
        assert!(!is_valid_domain("finance@g.cjc.edu.ph", ""));
    }
}
