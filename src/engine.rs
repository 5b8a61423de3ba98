use std::collections::HashMap;
use std::path::PathBuf;

use tracing::debug;

use crate::errors::CalcError;
use crate::parse::{eval, Namespace, UserFunc};
use crate::preprocess::preprocess;
use crate::session::{self, SessionSnapshot, StoredNumber};
use crate::units;
use crate::value::{CalcResult, Value};

/// Live history cap; the persisted slice is smaller
const HISTORY_CAP: usize = 1000;
const PERSISTED_HISTORY: usize = 200;

/// Single numeric accumulator behind the MC/MR/M+/M- keys
#[derive(Default)]
pub struct MemoryRegister {
    value: Value,
}

impl MemoryRegister {
    pub fn clear(&mut self) {
        self.value = Value::default();
    }

    pub fn recall(&self) -> Value {
        self.value.clone()
    }

    pub fn add(&mut self, v: Value) -> CalcResult {
        let sum = self.value.clone().addition(v)?;
        self.value = sum.clone();
        Ok(sum)
    }

    pub fn subtract(&mut self, v: Value) -> CalcResult {
        let diff = self.value.clone().subtract(v)?;
        self.value = diff.clone();
        Ok(diff)
    }

    fn set(&mut self, v: Value) {
        self.value = v;
    }
}

/// Insertion-ordered tape of (raw expression, displayed result) pairs.
/// Append-only apart from the retention cap and explicit clear.
#[derive(Default)]
pub struct HistoryLog {
    entries: Vec<(String, String)>,
}

impl HistoryLog {
    pub fn append(&mut self, expression: &str, result: &str) {
        self.entries.push((expression.to_string(), result.to_string()));
        if self.entries.len() > HISTORY_CAP {
            let excess = self.entries.len() - HISTORY_CAP;
            self.entries.drain(..excess);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    fn persisted(&self) -> Vec<(String, String)> {
        let skip = self.entries.len().saturating_sub(PERSISTED_HISTORY);
        self.entries[skip..].to_vec()
    }
}

/// The calculator core. Owns memory, the last answer, and the tape;
/// `evaluate` is the single string-in/string-out entry point a front end
/// needs. Not internally synchronized: one owner at a time.
pub struct CalculatorEngine {
    memory: MemoryRegister,
    last_answer: Value,
    history: HistoryLog,
    user_functions: HashMap<String, UserFunc>,
    session_path: Option<PathBuf>,
}

impl Default for CalculatorEngine {
    fn default() -> Self {
        CalculatorEngine::new()
    }
}

impl CalculatorEngine {
    /// Engine without durable state
    pub fn new() -> Self {
        CalculatorEngine {
            memory: MemoryRegister::default(),
            last_answer: Value::default(),
            history: HistoryLog::default(),
            user_functions: HashMap::new(),
            session_path: None,
        }
    }

    /// Engine persisting to `path`; a prior session there is loaded eagerly
    pub fn with_session<P: Into<PathBuf>>(path: P) -> Self {
        let mut engine = CalculatorEngine::new();
        engine.session_path = Some(path.into());
        engine.load_session();
        engine
    }

    /// Makes `name(...)` callable inside expressions. Identifiers are
    /// lowercased during evaluation, so the registered name is too.
    pub fn register_function(&mut self, name: &str, f: UserFunc) {
        self.user_functions.insert(name.to_lowercase(), f);
    }

    /// Evaluates user input and returns the display string. Never fails:
    /// errors come back as `"Error: ..."` text. Both outcomes are recorded
    /// on the tape; the last answer only moves on success.
    pub fn evaluate(&mut self, expression: &str) -> String {
        let canonical = preprocess(expression, &self.last_answer);
        debug!(raw = expression, canonical = %canonical, "evaluating");
        let ns = Namespace::with_functions(
            self.last_answer.clone(),
            self.memory.recall(),
            &self.user_functions,
        );
        let text = match eval(&canonical, &ns).and_then(Value::coerce) {
            Ok(v) => {
                let text = format!("{}", v);
                self.last_answer = v;
                text
            }
            Err(e) => display_error(&e),
        };
        self.history.append(expression, &text);
        text
    }

    pub fn last_answer(&self) -> Value {
        self.last_answer.clone()
    }

    // ----------------------------- Memory ----------------------------------

    pub fn memory_clear(&mut self) {
        self.memory.clear();
    }

    pub fn memory_recall(&self) -> Value {
        self.memory.recall()
    }

    pub fn memory_add(&mut self, v: Value) -> CalcResult {
        self.memory.add(v)
    }

    pub fn memory_subtract(&mut self, v: Value) -> CalcResult {
        self.memory.subtract(v)
    }

    // ----------------------------- History ---------------------------------

    pub fn history(&self) -> &[(String, String)] {
        self.history.entries()
    }

    pub fn history_clear(&mut self) {
        self.history.clear();
    }

    // ----------------------------- Units ------------------------------------

    pub fn convert_units(&self, value: f64, from_unit: &str, to_unit: &str) -> Result<f64, CalcError> {
        units::convert(value, from_unit, to_unit)
    }

    // ----------------------------- Session ---------------------------------

    /// The serializable projection of the current state
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            memory_value: StoredNumber::from_value(&self.memory.recall()),
            last_answer: StoredNumber::from_value(&self.last_answer),
            history: self.history.persisted(),
        }
    }

    pub fn restore(&mut self, snapshot: SessionSnapshot) {
        self.memory.set(snapshot.memory_value.into_value());
        self.last_answer = snapshot.last_answer.into_value();
        self.history = HistoryLog {
            entries: snapshot.history,
        };
    }

    /// Best effort; without a configured path this is a no-op
    pub fn save_session(&self) {
        if let Some(path) = &self.session_path {
            session::save_to(path, &self.snapshot());
        }
    }

    /// Best effort; a missing or corrupt file resets to the empty defaults
    pub fn load_session(&mut self) {
        if let Some(path) = self.session_path.clone() {
            let snapshot = session::load_from(&path);
            self.restore(snapshot);
        }
    }
}

/// Exhaustive mapping from evaluator failures to the user-visible message.
/// Parser and evaluator internals stay generic so no internal structure
/// leaks into the display.
fn display_error(err: &CalcError) -> String {
    match err {
        CalcError::DividedByZero => "Error: Division by zero".to_string(),
        CalcError::Overflow => "Error: Number too large".to_string(),

        CalcError::NotForComplex(..)
        | CalcError::InvalidArgument(..)
        | CalcError::UnsupportedUnit(..)
        | CalcError::IncompatibleUnits(..)
        | CalcError::UnsupportedResultType => format!("Error: {}", err),

        CalcError::StrToInt(..)
        | CalcError::StrToFloat(..)
        | CalcError::EmptyValue
        | CalcError::InvalidOp(..)
        | CalcError::TooManyOps
        | CalcError::OpenBracketMismatch
        | CalcError::ClosingBracketMismatch
        | CalcError::FunctionUnfinished(..)
        | CalcError::FunctionNoArgs(..)
        | CalcError::FunctionNotEnoughArgs(..)
        | CalcError::EmptyExpression
        | CalcError::InsufficientOps
        | CalcError::UnknownName(..)
        | CalcError::ParseFailed(..)
        | CalcError::Unreachable => "Error: Invalid expression".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;

    #[test]
    fn test_evaluate_and_ans() {
        let mut engine = CalculatorEngine::new();
        assert_eq!(engine.evaluate("3+4"), "7");
        assert_eq!(engine.evaluate("ANS*2"), "14");
        assert_eq!(engine.last_answer(), Value::Int(BigInt::from(14)));
    }

    #[test]
    fn test_error_keeps_last_answer() {
        let mut engine = CalculatorEngine::new();
        engine.evaluate("3+4");
        let before = engine.last_answer();
        assert_eq!(engine.evaluate("1/0"), "Error: Division by zero");
        assert_eq!(engine.last_answer(), before);
        assert_eq!(engine.evaluate("ANS*2"), "14");
    }

    #[test]
    fn test_error_messages() {
        let mut engine = CalculatorEngine::new();
        assert_eq!(engine.evaluate("2+"), "Error: Invalid expression");
        assert_eq!(engine.evaluate("nosuch(1)"), "Error: Invalid expression");
        assert_eq!(
            engine.evaluate("factorial(-1)"),
            "Error: Invalid argument for 'factorial': only defined for non-negative integers"
        );
        assert_eq!(engine.evaluate("10**10**10**10"), "Error: Number too large");
        assert_eq!(
            engine.evaluate("convert(1, \"smoot\", \"m\")"),
            "Error: Unsupported unit 'smoot'"
        );
    }

    #[test]
    fn test_errors_recorded_in_history() {
        let mut engine = CalculatorEngine::new();
        engine.evaluate("1/0");
        let history = engine.history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].0, "1/0");
        assert_eq!(history[0].1, "Error: Division by zero");
    }

    #[test]
    fn test_memory_ops() {
        let mut engine = CalculatorEngine::new();
        assert_eq!(engine.memory_recall(), Value::default());
        engine.memory_add(Value::Float(2.5)).unwrap();
        engine.memory_add(Value::Float(1.5)).unwrap();
        assert_eq!(engine.memory_recall(), Value::Float(4.0));
        engine.memory_subtract(Value::Float(1.0)).unwrap();
        assert_eq!(engine.memory_recall(), Value::Float(3.0));
        assert_eq!(engine.evaluate("mr()+1"), "4");
        engine.memory_clear();
        assert_eq!(engine.memory_recall(), Value::default());
    }

    #[test]
    fn test_history_cap() {
        let mut engine = CalculatorEngine::new();
        for _i in 0..1050 {
            engine.evaluate("1+1");
        }
        assert_eq!(engine.history().len(), 1000);
        assert_eq!(engine.snapshot().history.len(), 200);
    }

    #[test]
    fn test_history_clear() {
        let mut engine = CalculatorEngine::new();
        engine.evaluate("1+1");
        engine.history_clear();
        assert!(engine.history().is_empty());
    }

    #[test]
    fn test_user_function() {
        let mut engine = CalculatorEngine::new();
        engine.register_function(
            "triple",
            Box::new(|args| args[0].clone().multiply(Value::Float(3.0))),
        );
        assert_eq!(engine.evaluate("triple(4)"), "12");
    }
}
