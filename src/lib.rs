//! # Calculator expression engine
//!
//! The core of a desktop calculator: everything between the string a user
//! types and the string shown back. A front end owns one [`engine::CalculatorEngine`]
//! and talks to it through `evaluate(text) -> text` plus a handful of
//! memory, history, and session accessors.
//!
//! Evaluation happens in two stages. The preprocessor first rewrites
//! user-facing syntax into a canonical form:
//! * `×` and `÷` become `*` and `/`, `^` becomes `**`
//! * `ANS` is replaced with the last successful result
//! * a percent postfix on a literal number, `50%`, becomes `(50/100)`
//! * a standalone `i` (or `I`) becomes the imaginary unit
//! * implicit multiplication is inserted: `2(3+4)`, `(3+4)2`, `2pi`
//!
//! The canonical text is then parsed against a closed token grammar and
//! evaluated over a fixed namespace. Only numbers, the constants `pi`, `e`,
//! and `ans`, the builtin functions, brackets, and the operators
//! `+ - * / **` exist; there is no assignment, no statements, and nothing
//! from the host environment to escape into.
//!
//! Numbers are big integers, floats, or complex numbers. Arithmetic
//! promotes upward when types mix and never demotes: `sqrt(-4)` stays the
//! complex number `2j` even though its real part is zero.
//!
//! The list of supported functions:
//! * trigonometric, degrees in: sin, cos, tan
//! * inverse trigonometric, degrees out: asin, acos, atan
//! * logarithms: ln (natural), log (base 10)
//! * square root (negative reals go complex): sqrt
//! * factorial of non-negative integers: factorial
//! * angle conversion: rad, deg
//! * unit conversion between quoted unit names: convert(1, "km", "m")
//! * memory recall: mr()
//! * primitives: abs, round, min, max
//!
//! Callers may register extra named functions before evaluation; they are
//! merged into the namespace, which is rebuilt for every call.
//!
//! `evaluate` never panics and never returns an error type: every failure
//! is folded into a display string starting with `"Error:"`, the tape
//! records it, and the last answer keeps its previous value.

#[macro_use]
extern crate pest_derive;

pub mod engine;
pub mod errors;
pub mod parse;
pub mod preprocess;
pub mod session;
pub mod stack;
pub mod units;
pub mod value;
