//! Cost ledger for work-order materials.
//!
//! Pure arithmetic over `Decimal`: a material line total is
//! `quantity_needed * unit_cost`, and a work order's material total is the
//! sum of its line totals. Totals are always recomputed here, never taken
//! from a client payload.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::CoreError;

/// Currency precision for unit costs and totals (`NUMERIC(12,2)`).
pub const CURRENCY_SCALE: u32 = 2;

/// Precision of stored quantities (`NUMERIC(12,3)`).
pub const QUANTITY_SCALE: u32 = 3;

/// Round a quantity the way the `quantity_needed` column stores it.
pub fn round_quantity(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(QUANTITY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Round an amount the way the currency columns store it.
pub fn round_currency(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(CURRENCY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Compute the total for one material line.
///
/// Rounded to [`CURRENCY_SCALE`] places, half away from zero. Fails on
/// arithmetic overflow instead of panicking.
pub fn line_total(quantity: Decimal, unit_cost: Decimal) -> Result<Decimal, CoreError> {
    quantity
        .checked_mul(unit_cost)
        .map(round_currency)
        .ok_or_else(|| {
            CoreError::Validation(format!(
                "Line total overflows for quantity {quantity} x unit cost {unit_cost}"
            ))
        })
}

/// Sum the line totals of a set of `(quantity, unit_cost)` pairs.
pub fn materials_total<I>(lines: I) -> Result<Decimal, CoreError>
where
    I: IntoIterator<Item = (Decimal, Decimal)>,
{
    lines.into_iter().try_fold(Decimal::ZERO, |acc, (qty, cost)| {
        let line = line_total(qty, cost)?;
        acc.checked_add(line)
            .ok_or_else(|| CoreError::Validation("Materials total overflows".to_string()))
    })
}

/// Validator hook: quantities must be strictly positive.
pub fn validate_quantity(value: &Decimal) -> Result<(), validator::ValidationError> {
    if value.is_sign_positive() && !value.is_zero() {
        Ok(())
    } else {
        let mut err = validator::ValidationError::new("positive");
        err.message = Some("must be greater than zero".into());
        Err(err)
    }
}

/// Validator hook: monetary amounts must not be negative.
pub fn validate_amount(value: &Decimal) -> Result<(), validator::ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        let mut err = validator::ValidationError::new("non_negative");
        err.message = Some("must not be negative".into());
        Err(err)
    } else {
        Ok(())
    }
}

/// Check an optional amount outside of a derive (e.g. `estimated_cost`).
pub fn check_optional_amount(field: &str, value: Option<Decimal>) -> Result<(), CoreError> {
    match value {
        Some(v) if v.is_sign_negative() && !v.is_zero() => Err(CoreError::InvalidField {
            field: field.to_string(),
            message: "must not be negative".to_string(),
        }),
        _ => Ok(()),
    }
}
