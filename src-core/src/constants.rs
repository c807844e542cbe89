use rust_decimal::Decimal;

/// Presentation scales. Internal accounting keeps full `Decimal` precision;
/// rounding happens only when values cross the serialization boundary.
pub const UNITS_DECIMAL_PRECISION: u32 = 3;
pub const NAV_DECIMAL_PRECISION: u32 = 4;
pub const AMOUNT_DECIMAL_PRECISION: u32 = 2;

/// Tolerance on the last unit digit, used when comparing cached aggregates
/// against a log replay and when checking a SELL against held units.
pub const UNIT_EPSILON: Decimal = Decimal::from_parts(1, 0, 0, false, 6);

/// Valid provider scheme code range.
pub const SCHEME_CODE_MIN: i32 = 100_000;
pub const SCHEME_CODE_MAX: i32 = 999_999;

pub const TX_TYPE_BUY: &str = "BUY";
pub const TX_TYPE_SELL: &str = "SELL";

pub fn is_units_significant(units: &Decimal) -> bool {
    units.abs() > UNIT_EPSILON
}

pub fn is_valid_scheme_code(code: i32) -> bool {
    (SCHEME_CODE_MIN..=SCHEME_CODE_MAX).contains(&code)
}
