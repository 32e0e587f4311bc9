use std::sync::LazyLock;

use regex::Regex;

use super::ApiError;

/// Special characters a password must draw from at least once.
pub const PASSWORD_SPECIAL_CHARS: &str = "!@#$%^&*()-_=+[]{};:,.<>?/";

const MIN_PASSWORD_LEN: usize = 10;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$")
        .expect("email regex must compile")
});

pub fn validate_username(username: &str) -> Result<&str, ApiError> {
    if username.is_empty() {
        return Err(ApiError::validation("username", "Username is required"));
    }

    if username.chars().count() > 20 {
        return Err(ApiError::validation(
            "username",
            "Username must be 20 characters or less",
        ));
    }

    Ok(username)
}

pub fn validate_password(password: &str) -> Result<&str, ApiError> {
    if password.is_empty() {
        return Err(ApiError::validation("password", "Password is required"));
    }

    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::validation(
            "password",
            format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }

    if !password.chars().any(|c| PASSWORD_SPECIAL_CHARS.contains(c)) {
        return Err(ApiError::validation(
            "password",
            format!("Password must contain at least one of: {PASSWORD_SPECIAL_CHARS}"),
        ));
    }

    Ok(password)
}

/// Plaintext password and its confirmation must match exactly before any
/// hashing is attempted.
pub fn validate_confirmation(password: &str, confirmation: &str) -> Result<(), ApiError> {
    if password == confirmation {
        Ok(())
    } else {
        Err(ApiError::validation(
            "password_confirm",
            "Passwords do not match",
        ))
    }
}

pub fn validate_email(email: &str) -> Result<&str, ApiError> {
    if email.is_empty() {
        return Err(ApiError::validation("email", "Email is required"));
    }

    if email.chars().count() > 50 {
        return Err(ApiError::validation(
            "email",
            "Email must be 50 characters or less",
        ));
    }

    if !EMAIL_RE.is_match(email) {
        return Err(ApiError::validation("email", "Email address is not valid"));
    }

    Ok(email)
}

pub fn validate_name(field: &'static str, value: &str) -> Result<(), ApiError> {
    if value.is_empty() {
        return Err(ApiError::validation(field, "This field is required"));
    }

    if value.chars().count() > 30 {
        return Err(ApiError::validation(
            field,
            "Must be 30 characters or less",
        ));
    }

    Ok(())
}

pub fn validate_title(title: &str) -> Result<&str, ApiError> {
    if title.is_empty() {
        return Err(ApiError::validation("title", "Title is required"));
    }

    if title.chars().count() > 100 {
        return Err(ApiError::validation(
            "title",
            "Title must be 100 characters or less",
        ));
    }

    Ok(title)
}

/// Content is required but deliberately unbounded.
pub fn validate_content(content: &str) -> Result<&str, ApiError> {
    if content.is_empty() {
        return Err(ApiError::validation("content", "Content is required"));
    }

    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username(&"a".repeat(20)).is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username(&"a".repeat(21)).is_err());
    }

    #[test]
    fn test_limits_count_characters_not_bytes() {
        // 18 characters, 21 bytes
        assert!(validate_username("JoséMaríaFernández").is_ok());
        assert!(validate_username(&"é".repeat(20)).is_ok());
        assert!(validate_username(&"é".repeat(21)).is_err());

        assert!(validate_name("first_name", &"ж".repeat(30)).is_ok());
        assert!(validate_title(&"é".repeat(100)).is_ok());

        // 8 characters is short even though it is 16 bytes
        assert!(validate_password(&format!("{}!", "ж".repeat(7))).is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("Secret123!").is_ok());
        assert!(validate_password("with-a-dash-is-fine").is_ok());
        assert!(validate_password("").is_err());
        assert!(validate_password("short!").is_err());
        // long enough but no special character
        assert!(validate_password("abcdefghijkl").is_err());
    }

    #[test]
    fn test_validate_confirmation() {
        assert!(validate_confirmation("Secret123!", "Secret123!").is_ok());
        assert!(validate_confirmation("Secret123!", "Secret124!").is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("alice@x.com").is_ok());
        assert!(validate_email("first.last+tag@sub.domain.org").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("missing@tld").is_err());
        let long = format!("{}@x.com", "a".repeat(50));
        assert!(validate_email(&long).is_err());
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("first_name", "Alice").is_ok());
        assert!(validate_name("first_name", "").is_err());
        assert!(validate_name("last_name", &"a".repeat(31)).is_err());
    }

    #[test]
    fn test_validate_title_and_content() {
        assert!(validate_title("t1").is_ok());
        assert!(validate_title("").is_err());
        assert!(validate_title(&"a".repeat(101)).is_err());

        assert!(validate_content("anything").is_ok());
        assert!(validate_content(&"a".repeat(100_000)).is_ok());
        assert!(validate_content("").is_err());
    }
}
