//! Validation utilities for the Poultry Farm Management Platform

use rust_decimal::Decimal;

// ============================================================================
// General Validations
// ============================================================================

/// Validate email format (basic check)
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.contains('@') && email.contains('.') && email.len() >= 5 {
        Ok(())
    } else {
        Err("Invalid email format")
    }
}

/// Validate password strength
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters");
    }
    Ok(())
}

/// Validate a display name (farms, warehouses, catalog entries)
pub fn validate_name(name: &str) -> Result<(), &'static str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("Name cannot be empty");
    }
    if trimmed.chars().count() > 150 {
        return Err("Name must be at most 150 characters");
    }
    Ok(())
}

/// Validate phone number: 7-15 digits, optional leading '+', separators allowed
pub fn validate_phone(phone: &str) -> Result<(), &'static str> {
    let body = phone.strip_prefix('+').unwrap_or(phone);
    if !body
        .chars()
        .all(|c| c.is_ascii_digit() || c == ' ' || c == '-')
    {
        return Err("Phone number may only contain digits, spaces and dashes");
    }

    let digits = body.chars().filter(|c| c.is_ascii_digit()).count();
    if !(7..=15).contains(&digits) {
        return Err("Phone number must have between 7 and 15 digits");
    }
    Ok(())
}

// ============================================================================
// Inventory Validations
// ============================================================================

/// Quantities moved through the ledger must be positive
pub fn validate_quantity(quantity: Decimal) -> Result<(), &'static str> {
    if quantity <= Decimal::ZERO {
        return Err("Quantity must be greater than zero");
    }
    Ok(())
}

/// Prices, weights and expense amounts may be zero but not negative
pub fn validate_amount(amount: Decimal) -> Result<(), &'static str> {
    if amount < Decimal::ZERO {
        return Err("Amount cannot be negative");
    }
    Ok(())
}

/// Medicine windows are expressed in flock-age days
pub fn validate_day_range(day_from: i32, day_to: i32) -> Result<(), &'static str> {
    if day_from < 0 {
        return Err("Day range cannot start before placement");
    }
    if day_from > day_to {
        return Err("Day range start must not be after its end");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email_valid() {
        assert!(validate_email("farmer@example.com").is_ok());
        assert!(validate_email("user.name@domain.co").is_ok());
    }

    #[test]
    fn test_validate_email_invalid() {
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("no@domain").is_err());
        assert!(validate_email("@.").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("password123").is_ok());
        assert!(validate_password("12345678").is_ok());
        assert!(validate_password("short").is_err());
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("North Farm").is_ok());
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"x".repeat(151)).is_err());
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("0501234567").is_ok());
        assert!(validate_phone("+966 50 123 4567").is_ok());
        assert!(validate_phone("050-123-4567").is_ok());
        assert!(validate_phone("12345").is_err());
        assert!(validate_phone("abcdefghij").is_err());
        assert!(validate_phone("+1234567890123456").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(Decimal::ONE).is_ok());
        assert!(validate_quantity(Decimal::ZERO).is_err());
        assert!(validate_quantity(Decimal::NEGATIVE_ONE).is_err());
    }

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount(Decimal::ZERO).is_ok());
        assert!(validate_amount(Decimal::NEGATIVE_ONE).is_err());
    }

    #[test]
    fn test_validate_day_range() {
        assert!(validate_day_range(0, 0).is_ok());
        assert!(validate_day_range(7, 14).is_ok());
        assert!(validate_day_range(-1, 3).is_err());
        assert!(validate_day_range(10, 3).is_err());
    }
}
