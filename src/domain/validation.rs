//! Field rules shared by the services before anything reaches storage.

use rust_decimal::Decimal;
use url::Url;

use super::error::DomainError;

pub const NAME_LEN: (usize, usize) = (2, 30);
pub const USERNAME_LEN: (usize, usize) = (2, 20);
pub const PASSWORD_MIN_LEN: usize = 8;
pub const POST_TITLE_LEN: (usize, usize) = (2, 30);
pub const POST_TEXT_LEN: (usize, usize) = (1, 63_206);
pub const LEDGER_DESCRIPTION_MAX: usize = 256;
pub const LEDGER_CATEGORY_MAX: usize = 50;
pub const PARTITION_NAME_MAX: usize = 128;
pub const PARTITION_DESCRIPTION_MAX: usize = 512;

pub fn char_len_between(
    field: &'static str,
    value: &str,
    (min, max): (usize, usize),
) -> Result<(), DomainError> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(DomainError::validation(
            field,
            format!("must be between {min} and {max} characters"),
        ));
    }
    Ok(())
}

pub fn non_empty(field: &'static str, value: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(field, "must not be empty"));
    }
    Ok(())
}

pub fn max_chars(field: &'static str, value: &str, max: usize) -> Result<(), DomainError> {
    if value.chars().count() > max {
        return Err(DomainError::validation(
            field,
            format!("must be at most {max} characters"),
        ));
    }
    Ok(())
}

pub fn display_name(value: &str) -> Result<(), DomainError> {
    char_len_between("name", value, NAME_LEN)
}

/// Usernames are lowercase ASCII letters and digits only.
pub fn username(value: &str) -> Result<(), DomainError> {
    char_len_between("username", value, USERNAME_LEN)?;
    if !value
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
    {
        return Err(DomainError::validation(
            "username",
            "may only contain lowercase letters and digits",
        ));
    }
    Ok(())
}

pub fn email(value: &str) -> Result<(), DomainError> {
    let invalid = || DomainError::validation("email", "is not a valid email address");
    let (local, domain) = value.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') || value.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let mut labels = domain.split('.');
    let well_formed = domain.contains('.') && labels.all(|label| !label.is_empty());
    if !well_formed {
        return Err(invalid());
    }
    Ok(())
}

pub fn password(value: &str) -> Result<(), DomainError> {
    if value.chars().count() < PASSWORD_MIN_LEN {
        return Err(DomainError::validation(
            "password",
            format!("must be at least {PASSWORD_MIN_LEN} characters"),
        ));
    }
    Ok(())
}

pub fn web_url(field: &'static str, value: &str) -> Result<(), DomainError> {
    url_with_scheme(field, value, &["http", "https"])
}

pub fn media_url(value: &str) -> Result<(), DomainError> {
    url_with_scheme("media_url", value, &["http", "https", "ftp"])
}

fn url_with_scheme(field: &'static str, value: &str, schemes: &[&str]) -> Result<(), DomainError> {
    let parsed =
        Url::parse(value).map_err(|err| DomainError::validation(field, err.to_string()))?;
    if !schemes.contains(&parsed.scheme()) {
        return Err(DomainError::validation(
            field,
            format!("must use one of the schemes: {}", schemes.join(", ")),
        ));
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(DomainError::validation(field, "must include a host"));
    }
    Ok(())
}

pub fn post_title(value: &str) -> Result<(), DomainError> {
    char_len_between("title", value, POST_TITLE_LEN)
}

pub fn post_text(value: &str) -> Result<(), DomainError> {
    char_len_between("text", value, POST_TEXT_LEN)
}

pub fn positive_amount(field: &'static str, value: Decimal) -> Result<(), DomainError> {
    if value <= Decimal::ZERO {
        return Err(DomainError::validation(field, "must be greater than zero"));
    }
    Ok(())
}

pub fn non_negative_amount(field: &'static str, value: Decimal) -> Result<(), DomainError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(DomainError::validation(field, "must not be negative"));
    }
    Ok(())
}

pub fn positive_i32(field: &'static str, value: i32) -> Result<(), DomainError> {
    if value <= 0 {
        return Err(DomainError::validation(field, "must be greater than zero"));
    }
    Ok(())
}

pub fn non_negative_i64(field: &'static str, value: i64) -> Result<(), DomainError> {
    if value < 0 {
        return Err(DomainError::validation(field, "must not be negative"));
    }
    Ok(())
}
