use crate::errors::CalcError;

// factor tables: how many base units per 1 of the named unit,
// one table per physical dimension

const LENGTH_IN_M: &[(&str, f64)] = &[
    ("m", 1.0),
    ("meter", 1.0),
    ("meters", 1.0),
    ("km", 1000.0),
    ("kilometer", 1000.0),
    ("kilometers", 1000.0),
    ("cm", 0.01),
    ("mm", 0.001),
    ("mi", 1609.344),
    ("mile", 1609.344),
    ("miles", 1609.344),
    ("yd", 0.9144),
    ("yard", 0.9144),
    ("ft", 0.3048),
    ("foot", 0.3048),
    ("feet", 0.3048),
    ("in", 0.0254),
    ("inch", 0.0254),
    ("inches", 0.0254),
];

const MASS_IN_KG: &[(&str, f64)] = &[
    ("kg", 1.0),
    ("kilogram", 1.0),
    ("kilograms", 1.0),
    ("g", 0.001),
    ("gram", 0.001),
    ("grams", 0.001),
    ("lb", 0.45359237),
    ("pound", 0.45359237),
    ("pounds", 0.45359237),
    ("oz", 0.028349523125),
    ("ounce", 0.028349523125),
    ("ounces", 0.028349523125),
];

const VOLUME_IN_L: &[(&str, f64)] = &[
    ("l", 1.0),
    ("liter", 1.0),
    ("liters", 1.0),
    ("ml", 0.001),
    ("milliliter", 0.001),
    ("gal", 3.785411784),
    ("gallon", 3.785411784),
    ("gallons", 3.785411784),
];

const TABLES: &[&[(&str, f64)]] = &[LENGTH_IN_M, MASS_IN_KG, VOLUME_IN_L];

fn factor_in(table: &[(&str, f64)], unit: &str) -> Option<f64> {
    table
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(unit))
        .map(|(_, factor)| *factor)
}

fn known(unit: &str) -> bool {
    TABLES.iter().any(|t| factor_in(t, unit).is_some())
}

/// Converts between two units of the same physical dimension. Unit names
/// are matched case-insensitively; a cross-dimension request is an error,
/// never a silent number.
pub fn convert(value: f64, from_unit: &str, to_unit: &str) -> Result<f64, CalcError> {
    for table in TABLES {
        if let (Some(from_factor), Some(to_factor)) =
            (factor_in(table, from_unit), factor_in(table, to_unit))
        {
            return Ok(value * from_factor / to_factor);
        }
    }
    if !known(from_unit) {
        return Err(CalcError::UnsupportedUnit(from_unit.to_string()));
    }
    if !known(to_unit) {
        return Err(CalcError::UnsupportedUnit(to_unit.to_string()));
    }
    Err(CalcError::IncompatibleUnits(
        from_unit.to_string(),
        to_unit.to_string(),
    ))
}
