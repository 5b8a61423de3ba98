use std::fmt;

/// Every failure the evaluator can produce. The engine maps these onto the
/// four user-visible categories (division by zero, invalid argument,
/// overflow, generic invalid expression) when it builds the display string.
#[derive(Debug, Clone, PartialEq)]
pub enum CalcError {
    StrToInt(String),
    StrToFloat(String),

    DividedByZero,
    Overflow,

    NotForComplex(String),
    InvalidArgument(String, String),
    UnsupportedUnit(String),
    IncompatibleUnits(String, String),
    UnsupportedResultType,

    EmptyValue,
    InvalidOp(String),
    TooManyOps,
    OpenBracketMismatch,
    ClosingBracketMismatch,
    FunctionUnfinished(String),
    FunctionNoArgs(String),
    FunctionNotEnoughArgs(String, usize),
    EmptyExpression,
    InsufficientOps,
    UnknownName(String),

    ParseFailed(String),

    Unreachable,
}

impl fmt::Display for CalcError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self {
            CalcError::StrToInt(s) => write!(f, "Failed to convert '{}' to integer", s),
            CalcError::StrToFloat(s) => write!(f, "Failed to convert '{}' to float", s),

            CalcError::DividedByZero => write!(f, "Division by zero"),
            CalcError::Overflow => write!(f, "Number too large"),

            CalcError::NotForComplex(s) => write!(f, "Function '{}' is not supported for complex numbers", s),
            CalcError::InvalidArgument(func, detail) => write!(f, "Invalid argument for '{}': {}", func, detail),
            CalcError::UnsupportedUnit(u) => write!(f, "Unsupported unit '{}'", u),
            CalcError::IncompatibleUnits(a, b) => write!(f, "Incompatible units '{}' and '{}'", a, b),
            CalcError::UnsupportedResultType => write!(f, "Unsupported result type"),

            CalcError::EmptyValue => write!(f, "Nor value neither operator found"),
            CalcError::InvalidOp(s) => write!(f, "Invalid operator '{}'", s),
            CalcError::TooManyOps => write!(f, "Too many operators"),
            CalcError::OpenBracketMismatch => write!(f, "Mismatched opening bracket"),
            CalcError::ClosingBracketMismatch => write!(f, "Mismatched closing bracket"),
            CalcError::FunctionUnfinished(s) => write!(f, "Closing bracket for function '{}' not found", s),
            CalcError::FunctionNoArgs(s) => write!(f, "Function '{}' requires an argument", s),
            CalcError::FunctionNotEnoughArgs(s, i) => write!(f, "Function '{}' requires at least {} arguments", s, i),
            CalcError::EmptyExpression => write!(f, "Nothing to calculate"),
            CalcError::InsufficientOps => write!(f, "Too many numbers"),
            CalcError::UnknownName(s) => write!(f, "Name '{}' is not defined", s),

            CalcError::ParseFailed(s) => write!(f, "Failed to parse expression: {}", s),

            CalcError::Unreachable => write!(f, "unreachable"),
        }
    }
}
