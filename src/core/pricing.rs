//! Price arithmetic shared by quotes and booking rows.

use crate::errors::{AppError, AppResult};

/// Round to two decimals (smallest currency subunit).
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

pub fn validate_discount(discount_percentage: f64) -> AppResult<()> {
    if !discount_percentage.is_finite() || !(0.0..=100.0).contains(&discount_percentage) {
        return Err(AppError::Validation(format!(
            "discount must be between 0 and 100, got {}",
            discount_percentage
        )));
    }
    Ok(())
}

pub fn validate_price(station_id: &str, price: f64) -> AppResult<()> {
    if !price.is_finite() || price < 0.0 {
        return Err(AppError::Validation(format!(
            "price for station {} must be a non-negative amount, got {}",
            station_id, price
        )));
    }
    Ok(())
}

/// `original × (1 − discount/100)`, rounded to two decimals.
pub fn final_price(original_price: f64, discount_percentage: f64) -> f64 {
    round2(original_price * (1.0 - discount_percentage / 100.0))
}
