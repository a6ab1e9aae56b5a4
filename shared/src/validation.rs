//! Field validation helpers shared by the domain models and request DTOs

use rust_decimal::Decimal;

use crate::error::{DomainError, DomainResult};

/// Reject values below zero
pub fn non_negative(field: &str, value: Decimal) -> DomainResult<()> {
    if value < Decimal::ZERO {
        return Err(DomainError::validation(field, "must not be negative"));
    }
    Ok(())
}

/// Reject zero and negative values
pub fn positive(field: &str, value: Decimal) -> DomainResult<()> {
    if value <= Decimal::ZERO {
        return Err(DomainError::validation(field, "must be positive"));
    }
    Ok(())
}

/// Trimmed non-blank text, or a validation error naming `field`
pub fn required_text(field: &str, value: Option<String>) -> DomainResult<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| DomainError::validation(field, "is required"))
}

/// Clamp a requested page size into `1..=max`, using `default` when absent
pub fn clamp_limit(requested: Option<i64>, default: i64, max: i64) -> i64 {
    requested.unwrap_or(default).clamp(1, max.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_checks() {
        assert!(non_negative("q", Decimal::ZERO).is_ok());
        assert!(non_negative("q", Decimal::NEGATIVE_ONE).is_err());
        assert!(positive("q", Decimal::ZERO).is_err());
        assert!(positive("q", Decimal::ONE).is_ok());
    }

    #[test]
    fn required_text_trims() {
        assert_eq!(required_text("t", Some("  hi ".into())).unwrap(), "hi");
        assert!(required_text("t", Some("   ".into())).is_err());
        assert!(required_text("t", None).is_err());
    }

    #[test]
    fn limits_are_clamped() {
        assert_eq!(clamp_limit(None, 50, 200), 50);
        assert_eq!(clamp_limit(Some(0), 50, 200), 1);
        assert_eq!(clamp_limit(Some(1000), 50, 200), 200);
    }
}
