use crate::error::{AppError, Result};

/// Validates a submitted login principal (work id or identity number).
pub fn validate_principal(principal: &str) -> Result<()> {
    if principal.trim().is_empty() {
        return Err(AppError::Validation(
            "Work id cannot be empty".to_string(),
        ));
    }

    if principal.len() > 255 {
        return Err(AppError::Validation(
            "Work id must be at most 255 characters".to_string(),
        ));
    }

    Ok(())
}

/// Validates a submitted password.
pub fn validate_password(password: &str) -> Result<()> {
    if password.is_empty() {
        return Err(AppError::Validation(
            "Password cannot be empty".to_string(),
        ));
    }

    if password.len() > 255 {
        return Err(AppError::Validation(
            "Password must be at most 255 characters".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_and_oversized_inputs() {
        assert!(validate_principal("").is_err());
        assert!(validate_principal("   ").is_err());
        assert!(validate_principal(&"x".repeat(256)).is_err());
        assert!(validate_principal("T1001").is_ok());

        assert!(validate_password("").is_err());
        assert!(validate_password(&"x".repeat(256)).is_err());
        assert!(validate_password("p@ss").is_ok());
    }
}
