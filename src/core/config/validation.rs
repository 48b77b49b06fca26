//! Validation helper functions for configuration types.

use crate::core::errors::{DupdetectError, Result};

/// Validate that a usize value is greater than zero.
pub fn validate_positive_usize(value: usize, field: &str) -> Result<()> {
    if value == 0 {
        return Err(DupdetectError::validation(format!(
            "{} must be greater than 0",
            field
        )));
    }
    Ok(())
}

/// Validate that an f64 value lies in the half-open unit interval (0.0, 1.0].
pub fn validate_unit_interval(value: f64, field: &str) -> Result<()> {
    if !(value > 0.0 && value <= 1.0) {
        return Err(DupdetectError::validation(format!(
            "{} must be in (0.0, 1.0], got {}",
            field, value
        )));
    }
    Ok(())
}

/// Trial-division primality test up to the square root of `number`.
pub fn is_prime(number: u64) -> bool {
    if number < 2 {
        return false;
    }
    let mut divisor = 2u64;
    while divisor
        .checked_mul(divisor)
        .is_some_and(|square| square <= number)
    {
        if number % divisor == 0 {
            return false;
        }
        divisor += 1;
    }
    true
}

/// Validate that a modulus is prime.
pub fn validate_prime(value: u64, field: &str) -> Result<()> {
    if !is_prime(value) {
        return Err(DupdetectError::validation_mismatch(
            field,
            "prime",
            value.to_string(),
        ));
    }
    Ok(())
}
