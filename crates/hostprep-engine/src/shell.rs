//! Shell command assembly guards
//!
//! Operator-supplied values (domains, paths, package names) are validated
//! against allow-listed character classes before they are interpolated into
//! command text. Values that must be carried verbatim go through `quote`.

use crate::error::EngineError;

/// POSIX single-quote a value
///
/// Safe for arbitrary content: embedded single quotes are closed, escaped
/// and reopened.
#[must_use]
pub fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\"'\"'"))
}

/// Validate a generic token: alphanumerics plus `. _ / - : @ +`
///
/// # Errors
/// `EngineError::UnsafeToken` when any other character is present
pub fn validate_token<'a>(field: &'static str, value: &'a str) -> Result<&'a str, EngineError> {
    if value.is_empty()
        || !value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '/' | '-' | ':' | '@' | '+'))
    {
        return Err(EngineError::UnsafeToken {
            field,
            value: value.to_string(),
        });
    }
    Ok(value)
}

/// Validate a single path segment: alphanumerics plus `. _ -`
///
/// # Errors
/// `EngineError::UnsafeToken` for separators, traversal or anything outside
/// the class
pub fn validate_name<'a>(field: &'static str, value: &'a str) -> Result<&'a str, EngineError> {
    let valid = !value.is_empty()
        && value != "."
        && value != ".."
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));

    if valid {
        Ok(value)
    } else {
        Err(EngineError::UnsafeToken {
            field,
            value: value.to_string(),
        })
    }
}

/// Validate a DNS name: dot-separated labels of alphanumerics and hyphens
///
/// # Errors
/// `EngineError::UnsafeToken` for empty labels, leading/trailing hyphens or
/// any character outside the label class
pub fn validate_domain(value: &str) -> Result<&str, EngineError> {
    let valid = !value.is_empty()
        && value.len() <= 253
        && value.split('.').all(|label| {
            !label.is_empty()
                && label.len() <= 63
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        });

    if valid {
        Ok(value)
    } else {
        Err(EngineError::UnsafeToken {
            field: "domain",
            value: value.to_string(),
        })
    }
}

/// Validate an email address as `local@domain`
///
/// Intentionally narrow: the local part allows `. _ % + -` plus
/// alphanumerics, the domain part follows `validate_domain`.
///
/// # Errors
/// `EngineError::UnsafeToken` when the address falls outside that shape
pub fn validate_email(value: &str) -> Result<&str, EngineError> {
    let reject = || EngineError::UnsafeToken {
        field: "email",
        value: value.to_string(),
    };

    let (local, domain) = value.split_once('@').ok_or_else(reject)?;

    let local_ok = !local.is_empty()
        && local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '%' | '+' | '-'));

    if !local_ok || validate_domain(domain).is_err() {
        return Err(reject());
    }
    Ok(value)
}

/// Validate an absolute remote path with no parent traversal
///
/// # Errors
/// `EngineError::UnsafeToken` for relative paths, `..` segments or
/// characters outside `[A-Za-z0-9._/-]`
pub fn validate_abs_path(value: &str) -> Result<&str, EngineError> {
    let valid = value.starts_with('/')
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '/' | '-'))
        && !value.split('/').any(|seg| seg == "..");

    if valid {
        Ok(value)
    } else {
        Err(EngineError::UnsafeToken {
            field: "path",
            value: value.to_string(),
        })
    }
}

/// Validate a Debian package name
///
/// Lowercase alphanumerics plus `+ - .`, at least two characters, starting
/// alphanumeric (dpkg's own naming rule).
///
/// # Errors
/// `EngineError::UnsafeToken` when the name falls outside that shape
pub fn validate_package(value: &str) -> Result<&str, EngineError> {
    let mut chars = value.chars();
    let first_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c.is_ascii_digit());

    let valid = first_ok
        && value.len() >= 2
        && value
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '+' | '-' | '.'));

    if valid {
        Ok(value)
    } else {
        Err(EngineError::UnsafeToken {
            field: "package",
            value: value.to_string(),
        })
    }
}
