//! Field rules shared by account creation, editing and self-service.

pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 64;
pub const NICKNAME_MAX_LEN: usize = 64;
pub const EMAIL_MAX_LEN: usize = 120;

pub fn validate_username(username: &str) -> Result<&str, String> {
    let trimmed = username.trim();
    let len = trimmed.chars().count();

    if !(USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&len) {
        return Err(format!(
            "Username must be between {USERNAME_MIN_LEN} and {USERNAME_MAX_LEN} characters"
        ));
    }

    if trimmed.chars().any(char::is_whitespace) {
        return Err("Username cannot contain whitespace".to_string());
    }

    Ok(trimmed)
}

/// Blank nicknames become `None`.
pub fn validate_nickname(nickname: &str) -> Result<Option<&str>, String> {
    let trimmed = nickname.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    if trimmed.chars().count() > NICKNAME_MAX_LEN {
        return Err(format!(
            "Nickname must be {NICKNAME_MAX_LEN} characters or less"
        ));
    }

    Ok(Some(trimmed))
}

/// Blank emails become `None`.
pub fn validate_email(email: &str) -> Result<Option<&str>, String> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    if trimmed.len() > EMAIL_MAX_LEN {
        return Err(format!("Email must be {EMAIL_MAX_LEN} characters or less"));
    }

    let valid = match trimmed.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !trimmed.chars().any(char::is_whitespace)
        }
        None => false,
    };

    if !valid {
        return Err(format!("Invalid email address: {trimmed}"));
    }

    Ok(Some(trimmed))
}

pub fn validate_password(password: &str, min_len: usize) -> Result<(), String> {
    if password.chars().count() < min_len {
        return Err(format!("Password must be at least {min_len} characters"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username() {
        assert_eq!(validate_username("  alice "), Ok("alice"));
        assert!(validate_username("ab").is_err());
        assert!(validate_username(&"x".repeat(65)).is_err());
        assert!(validate_username("bad name").is_err());
    }

    #[test]
    fn test_validate_nickname() {
        assert_eq!(validate_nickname("   "), Ok(None));
        assert_eq!(validate_nickname(" Bob "), Ok(Some("Bob")));
        assert!(validate_nickname(&"n".repeat(65)).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert_eq!(validate_email(""), Ok(None));
        assert_eq!(validate_email(" a@b.co "), Ok(Some("a@b.co")));
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("a@b").is_err());
        assert!(validate_email("a@@b.com").is_err());
        assert!(validate_email("@b.com").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("short", 10).is_err());
        assert!(validate_password("long-enough-pw", 10).is_ok());
    }
}
