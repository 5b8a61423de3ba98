use std::collections::HashMap;
use std::f64::consts::{E, PI};

use pest::Parser;

use crate::errors::*;
use crate::stack::{Stack, UNARY_MINUS};
use crate::value::*;

#[derive(Parser)]
#[grammar = "calc.pest"]
pub struct CalcParser;

/// Caller-registered function; receives the evaluated arguments in call order
pub type UserFunc = Box<dyn Fn(&[Value]) -> CalcResult>;

/// The closed set of names visible to a single evaluation. Rebuilt by the
/// engine for every call; nothing outside it can be resolved.
pub struct Namespace<'a> {
    ans: Value,
    memory: Value,
    user_funcs: Option<&'a HashMap<String, UserFunc>>,
}

impl<'a> Namespace<'a> {
    pub fn new(ans: Value, memory: Value) -> Self {
        Namespace {
            ans,
            memory,
            user_funcs: None,
        }
    }

    pub fn with_functions(ans: Value, memory: Value, funcs: &'a HashMap<String, UserFunc>) -> Self {
        Namespace {
            ans,
            memory,
            user_funcs: Some(funcs),
        }
    }

    /// Constant lookup. Identifiers are lowercased before they get here, so
    /// `ANS` and `PI` resolve as well.
    pub(crate) fn constant(&self, name: &str) -> Option<Value> {
        match name {
            "pi" => Some(Value::Float(PI)),
            "e" => Some(Value::Float(E)),
            "ans" => Some(self.ans.clone()),
            _ => None,
        }
    }

    pub(crate) fn memory(&self) -> Value {
        self.memory.clone()
    }

    pub(crate) fn user_func(&self, name: &str) -> Option<&'a UserFunc> {
        match self.user_funcs {
            Some(funcs) => funcs.get(name),
            None => None,
        }
    }

    pub(crate) fn is_user_func(&self, name: &str) -> bool {
        self.user_func(name).is_some()
    }
}

macro_rules! process_value {
    ($stk:ident, $last_value:ident, $last_func:ident, $v:expr) => {
        if $last_func {
            // value directly after a function name: wrap it in brackets
            $stk.push("(", None)?;
            $stk.push("", Some($v))?;
            $stk.push(")", None)?;
        } else {
            if $last_value {
                $stk.push("*", None)?;
            }
            $stk.push("", Some($v))?;
        }
        $last_value = true;
        $last_func = false;
    };
}

/// Evaluates canonical expression text against a namespace and returns
/// either the resulting value or a typed error
pub fn eval(expr: &str, ns: &Namespace) -> CalcResult {
    let pairs = match CalcParser::parse(Rule::expr, expr) {
        Ok(p) => p,
        Err(..) => return Err(CalcError::ParseFailed("invalid expression".to_string())),
    };

    let mut stk = Stack::new(ns);
    let mut last_value = false;
    let mut last_func = false;
    let mut after_open = false;

    for pair in pairs {
        let rule = pair.as_rule();
        let val = pair.as_span().as_str().to_lowercase();
        let was_after_open = after_open;
        after_open = false;
        match rule {
            Rule::int => {
                let v = Value::from_str_integer(&val)?;
                process_value!(stk, last_value, last_func, v);
            }
            Rule::float => {
                let v = Value::from_str_float(&val)?;
                process_value!(stk, last_value, last_func, v);
            }
            Rule::imag => {
                let v = Value::from_str_imag(&val)?;
                process_value!(stk, last_value, last_func, v);
            }
            Rule::string => {
                let v = Value::Str(val[1..val.len() - 1].to_string());
                process_value!(stk, last_value, last_func, v);
            }
            Rule::open_b => {
                if last_value {
                    stk.push("*", None)?;
                }
                stk.push("(", None)?;
                last_value = false;
                last_func = false;
                after_open = true;
            }
            Rule::close_b => {
                if was_after_open {
                    // empty argument list: do not count an argument
                    stk.close_empty()?;
                } else {
                    stk.push(")", None)?;
                }
                last_value = true;
                last_func = false;
            }
            Rule::arg_sep => {
                stk.push(",", None)?;
                last_value = false;
                last_func = false;
            }
            Rule::operator => {
                if val == "+" && !last_value {
                    // unary plus is a no-op
                } else if val == "-" && !last_value {
                    stk.push(UNARY_MINUS, None)?;
                    last_func = false;
                } else {
                    stk.push(&val, None)?;
                    last_value = false;
                    last_func = false;
                }
            }
            Rule::ident => {
                if stk.is_func(&val) {
                    if last_value {
                        stk.push("*", None)?;
                    } else if last_func {
                        stk.increase_func_argc()?;
                    }
                    stk.push(&val, None)?;
                    last_value = false;
                    last_func = true;
                } else if let Some(v) = ns.constant(&val) {
                    process_value!(stk, last_value, last_func, v);
                } else {
                    return Err(CalcError::UnknownName(val));
                }
            }
            Rule::EOI => {}
            _ => return Err(CalcError::Unreachable),
        }
    }
    stk.calculate()
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;
    use num_complex::Complex;

    fn ns() -> Namespace<'static> {
        Namespace::new(Value::default(), Value::default())
    }

    #[test]
    fn test_expr() {
        let v = eval("2+3", &ns());
        assert_eq!(v, Ok(Value::Int(BigInt::from(5))));
        let v = eval("2+3*4", &ns());
        assert_eq!(v, Ok(Value::Int(BigInt::from(14))));
        let v = eval("(3+2)*(4-9)", &ns());
        assert_eq!(v, Ok(Value::Int(BigInt::from(-25))));
        let v = eval("(3+2)(4-9)", &ns());
        assert_eq!(v, Ok(Value::Int(BigInt::from(-25))));
        let v = eval("2**3**2", &ns());
        assert_eq!(v, Ok(Value::Int(BigInt::from(512))));
        let v = eval("7/2", &ns());
        assert_eq!(v, Ok(Value::Float(3.5)));
    }

    #[test]
    fn test_unary_minus() {
        let v = eval("-3", &ns());
        assert_eq!(v, Ok(Value::Int(BigInt::from(-3))));
        // unary minus binds looser than the power operator
        let v = eval("-2**2", &ns());
        assert_eq!(v, Ok(Value::Int(BigInt::from(-4))));
        let v = eval("2**-2", &ns());
        assert_eq!(v, Ok(Value::Float(0.25)));
        let v = eval("--5", &ns());
        assert_eq!(v, Ok(Value::Int(BigInt::from(5))));
        let v = eval("2*-3", &ns());
        assert_eq!(v, Ok(Value::Int(BigInt::from(-6))));
    }

    #[test]
    fn test_constants() {
        let v = eval("pi", &ns());
        assert_eq!(v, Ok(Value::Float(PI)));
        let v = eval("2*e", &ns());
        assert_eq!(v, Ok(Value::Float(2.0 * E)));
        let state = Namespace::new(Value::Int(BigInt::from(7)), Value::default());
        let v = eval("ans*2", &state);
        assert_eq!(v, Ok(Value::Int(BigInt::from(14))));
    }

    #[test]
    fn test_functions() {
        let v = eval("sin(90)", &ns()).unwrap();
        assert_eq!(format!("{}", v), "1");
        let v = eval("asin(1)", &ns()).unwrap();
        assert_eq!(format!("{}", v), "90");
        let v = eval("sqrt(-4)", &ns());
        assert_eq!(v, Ok(Value::Complex(Complex::new(0.0, 2.0))));
        let v = eval("factorial(5)", &ns());
        assert_eq!(v, Ok(Value::Int(BigInt::from(120))));
        let v = eval("3*sin(90)", &ns()).unwrap();
        assert_eq!(format!("{}", v), "3");
        let v = eval("min(3,8,2)", &ns());
        assert_eq!(v, Ok(Value::Int(BigInt::from(2))));
        let v = eval("max(3,8,2)", &ns());
        assert_eq!(v, Ok(Value::Int(BigInt::from(8))));
        let v = eval("abs(0-7)", &ns());
        assert_eq!(v, Ok(Value::Int(BigInt::from(7))));
    }

    #[test]
    fn test_imag_literal() {
        let v = eval("(i1)", &ns());
        assert_eq!(v, Ok(Value::Complex(Complex::new(0.0, 1.0))));
        let v = eval("2*(i1)", &ns());
        assert_eq!(v, Ok(Value::Complex(Complex::new(0.0, 2.0))));
        let v = eval("(i1)*(i1)", &ns());
        assert_eq!(v, Ok(Value::Complex(Complex::new(-1.0, 0.0))));
        let v = eval("3.0-i4.0", &ns());
        assert_eq!(v, Ok(Value::Complex(Complex::new(3.0, -4.0))));
    }

    #[test]
    fn test_convert_call() {
        let v = eval("convert(1, \"km\", \"m\")", &ns());
        assert_eq!(v, Ok(Value::Float(1000.0)));
        let v = eval("convert(1, \"kg\", \"m\")", &ns());
        assert_eq!(
            v,
            Err(CalcError::IncompatibleUnits("kg".to_string(), "m".to_string()))
        );
    }

    #[test]
    fn test_memory_recall_call() {
        let state = Namespace::new(Value::default(), Value::Int(BigInt::from(5)));
        let v = eval("mr()+1", &state);
        assert_eq!(v, Ok(Value::Int(BigInt::from(6))));
        let v = eval("2*mr()", &state);
        assert_eq!(v, Ok(Value::Int(BigInt::from(10))));
    }

    #[test]
    fn test_user_functions() {
        let mut funcs: HashMap<String, UserFunc> = HashMap::new();
        funcs.insert(
            "double".to_string(),
            Box::new(|args: &[Value]| args[0].clone().multiply(Value::Float(2.0))),
        );
        let state = Namespace::with_functions(Value::default(), Value::default(), &funcs);
        let v = eval("double(4)+1", &state);
        assert_eq!(v, Ok(Value::Float(9.0)));
    }

    #[test]
    fn test_errors() {
        let v = eval("1/0", &ns());
        assert_eq!(v, Err(CalcError::DividedByZero));
        let v = eval("2+x", &ns());
        assert_eq!(v, Err(CalcError::UnknownName("x".to_string())));
        let v = eval("2+@", &ns());
        assert!(matches!(v, Err(CalcError::ParseFailed(..))));
        let v = eval("", &ns());
        assert_eq!(v, Err(CalcError::EmptyExpression));
        let v = eval("sin()", &ns());
        assert_eq!(v, Err(CalcError::FunctionNoArgs("sin".to_string())));
        let v = eval("factorial(2.5)", &ns());
        assert!(matches!(v, Err(CalcError::InvalidArgument(..))));
    }
}
