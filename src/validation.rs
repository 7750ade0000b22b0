//! Custom field rules for `validator` derives.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use validator::ValidationError;

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(message.into())
}

pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(invalid("not_blank", "Required field"));
    }
    Ok(())
}

/// Product names are stored trimmed, so the bounds apply to the trimmed text.
pub fn product_name(value: &str) -> Result<(), ValidationError> {
    let len = value.trim().chars().count();
    if !(5..=60).contains(&len) {
        return Err(invalid("length", "Name must have between 5 and 60 characters"));
    }
    Ok(())
}

pub fn positive(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() || value.is_zero() {
        return Err(invalid("positive", "Price must be positive"));
    }
    Ok(())
}

pub fn not_in_future(value: &DateTime<Utc>) -> Result<(), ValidationError> {
    if *value > Utc::now() {
        return Err(invalid("past_or_present", "Date cannot be in the future"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn blank_strings_fail() {
        assert!(not_blank("  ").is_err());
        assert!(not_blank("Books").is_ok());
    }

    #[test]
    fn product_name_is_measured_after_trimming() {
        assert!(product_name("ab     ").is_err());
        assert!(product_name("   Phone X   ").is_ok());
        assert!(product_name(&"x".repeat(61)).is_err());
        assert!(product_name(&format!("  {}  ", "x".repeat(60))).is_ok());
    }

    #[test]
    fn price_must_be_strictly_positive() {
        assert!(positive(&Decimal::ZERO).is_err());
        assert!(positive(&Decimal::new(-1, 2)).is_err());
        assert!(positive(&Decimal::new(80000, 2)).is_ok());
    }

    #[test]
    fn future_dates_fail() {
        assert!(not_in_future(&(Utc::now() + Duration::days(1))).is_err());
        assert!(not_in_future(&(Utc::now() - Duration::days(1))).is_ok());
    }
}
