use num_traits::ToPrimitive;

use crate::errors::*;
use crate::parse::{Namespace, UserFunc};
use crate::units;
use crate::value::*;

use lazy_static::lazy_static;

#[derive(Clone, Debug)]
pub(crate) enum Entry {
    Val(Value),
    Op(String, i32, bool),
    OpenB,
    Func(String, usize),
}

/// Shunting-yard evaluator: tokens are pushed in reading order, operators
/// queue up by priority, and `calculate` folds the resulting RPN output.
pub(crate) struct Stack<'a> {
    ns: &'a Namespace<'a>,
    queue: Vec<Entry>,
    output: Vec<Entry>,
    values: Vec<Value>,
}

pub(crate) const UNARY_MINUS: &str = "---";

lazy_static! {
    pub(crate) static ref STD_FUNCS: Vec<&'static str> = [
        "sin",
        "cos",
        "tan",
        "asin",
        "acos",
        "atan",
        "ln",
        "log",
        "sqrt",
        "factorial",
        "rad",
        "deg",
        "convert",
        "mr",
        "abs",
        "round",
        "min",
        "max",
    ]
    .to_vec();
}

macro_rules! one_arg_op {
    ($id:ident, $vid:ident) => {
        fn $id(&mut self) -> CalcErrorResult {
            if self.values.is_empty() {
                return Err(CalcError::TooManyOps);
            }

            let v = self.values.pop().unwrap();
            let v = v.$vid()?;
            self.values.push(v);
            Ok(())
        }
    };
}
macro_rules! two_arg_op {
    ($id:ident, $vid:ident) => {
        fn $id(&mut self) -> CalcErrorResult {
            if self.values.len() < 2 {
                return Err(CalcError::TooManyOps);
            }

            let v2 = self.values.pop().unwrap();
            let v1 = self.values.pop().unwrap();
            let v = v1.$vid(v2)?;
            self.values.push(v);
            Ok(())
        }
    };
}
macro_rules! function_op {
    ($id:ident, $vid:ident) => {
        fn $id(&mut self, args: usize) -> CalcErrorResult {
            if args == 0 {
                return Err(CalcError::FunctionNoArgs(stringify!($id).to_string()));
            }
            if self.values.len() < args {
                return Err(CalcError::FunctionUnfinished(stringify!($id).to_string()));
            }

            // extra arguments are dropped, the first one is used
            let mut v = self.values.pop().unwrap();
            for _i in 0..args - 1 {
                v = self.values.pop().unwrap();
            }
            let v = v.$vid()?;
            self.values.push(v);
            Ok(())
        }
    };
}

impl<'a> Stack<'a> {
    // unary minus sits between the power operator and multiplication so
    // `-2**2` keeps the usual arithmetic reading
    fn priority(op: &str) -> (i32, bool) {
        match op {
            "**" => (17, true),
            UNARY_MINUS => (14, true),
            "*" | "/" => (12, false),
            "+" | "-" => (8, false),
            _ => (0, false), // invalid op
        }
    }

    pub(crate) fn is_func(&self, s: &str) -> bool {
        STD_FUNCS.iter().any(|fname| *fname == s) || self.ns.is_user_func(s)
    }

    // move operators from the queue to output while the top operator in the
    // queue has equal or greater priority
    fn pop_while_priority(&mut self, priority: i32) {
        loop {
            if self.queue.is_empty() {
                return;
            }
            // queue is not empty, so unwrap is OK
            let e = self.queue.pop().unwrap();
            match &e {
                Entry::OpenB => {
                    self.queue.push(e);
                    return;
                }
                Entry::Func(..) => {
                    self.output.push(e);
                }
                Entry::Op(_, p, right) => {
                    if *p > priority || (*p == priority && !*right) {
                        self.output.push(e);
                    } else {
                        self.queue.push(e);
                        return;
                    }
                }
                _ => return, // unreachable
            }
        }
    }

    fn update_func_args(&mut self) {
        if let Some(q) = self.queue.pop() {
            match &q {
                Entry::Func(name, args) => {
                    self.queue.push(Entry::Func(name.to_string(), args + 1));
                }
                _ => self.queue.push(q),
            }
        }
    }

    // move operators from the queue to output until the first bracket
    // or first argument separator
    fn pop_until_bracket(&mut self, keep_bracket: bool, count_arg: bool) -> CalcErrorResult {
        loop {
            if self.queue.is_empty() {
                return Err(CalcError::ClosingBracketMismatch);
            }

            // unwrap is ok - vector is not empty
            let e = self.queue.pop().unwrap();
            match &e {
                Entry::Val(..) | Entry::Op(..) | Entry::Func(..) => self.output.push(e),
                Entry::OpenB => {
                    if count_arg {
                        self.update_func_args();
                    }
                    if keep_bracket {
                        self.queue.push(Entry::OpenB);
                    }
                    return Ok(());
                }
            }
        }
    }

    // move all operators from queue to output
    // Must be called only after the expression ends.
    fn pop_all(&mut self) -> CalcErrorResult {
        while let Some(v) = self.queue.pop() {
            match &v {
                Entry::OpenB => {} // do nothing - allows to omit last closing brackets
                Entry::Op(..) => self.output.push(v),
                Entry::Func(..) => self.output.push(v),
                _ => return Err(CalcError::Unreachable),
            }
        }
        Ok(())
    }

    // ------------ PUBLIC -----------------

    pub(crate) fn new(ns: &'a Namespace<'a>) -> Self {
        Stack {
            ns,
            queue: Vec::new(),
            output: Vec::new(),
            values: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, op: &str, val: Option<Value>) -> CalcErrorResult {
        if op.is_empty() {
            if let Some(v) = val {
                self.output.push(Entry::Val(v))
            } else {
                return Err(CalcError::EmptyValue);
            }
            return Ok(());
        }

        if self.is_func(op) {
            self.queue.push(Entry::Func(op.to_owned(), 0));
            return Ok(());
        }

        if op == "(" {
            self.queue.push(Entry::OpenB);
            return Ok(());
        }
        if op == ")" {
            return self.pop_until_bracket(false, true);
        }
        if op == "," {
            return self.pop_until_bracket(true, true);
        }

        let (pri, right_assoc) = Stack::priority(op);
        if pri == 0 {
            return Err(CalcError::InvalidOp(op.to_owned()));
        }

        // prefix operator: nothing to its left can be complete yet
        if op == UNARY_MINUS {
            self.queue.push(Entry::Op(op.to_owned(), pri, right_assoc));
            return Ok(());
        }

        self.pop_while_priority(pri);
        self.queue.push(Entry::Op(op.to_owned(), pri, right_assoc));

        Ok(())
    }

    /// Closing bracket of an empty argument list, e.g. `mr()`
    pub(crate) fn close_empty(&mut self) -> CalcErrorResult {
        self.pop_until_bracket(false, false)
    }

    pub(crate) fn increase_func_argc(&mut self) -> CalcErrorResult {
        if let Some(e) = self.queue.pop() {
            match &e {
                Entry::Func(fname, argc) => {
                    self.queue.push(Entry::Func(fname.to_string(), argc + 1));
                }
                _ => self.queue.push(e),
            }
        }
        Ok(())
    }

    pub(crate) fn calculate(&mut self) -> CalcResult {
        self.pop_all()?;
        if self.output.is_empty() {
            return Err(CalcError::EmptyExpression);
        }

        self.values = Vec::new();
        for i in 0..self.output.len() {
            let o = self.output[i].clone();
            match o {
                Entry::Val(v) => {
                    self.values.push(v);
                }
                Entry::Op(op, ..) => {
                    self.process_operator(&op)?;
                }
                Entry::Func(fname, args) => {
                    self.process_function(&fname, args)?;
                }
                _ => return Err(CalcError::Unreachable),
            }
        }

        if self.values.len() != 1 {
            return Err(CalcError::InsufficientOps);
        }

        // values is never empty after calculation - unwrap is fine
        Ok(self.values.pop().unwrap())
    }

    fn process_operator(&mut self, op: &str) -> CalcErrorResult {
        match op {
            "/" => self.divide(),
            "*" => self.multiply(),
            "+" => self.addition(),
            "-" => self.subtract(),
            "**" => self.power(),
            UNARY_MINUS => self.negate(),
            _ => Err(CalcError::InvalidOp(op.to_string())),
        }
    }

    fn process_function(&mut self, fname: &str, args: usize) -> CalcErrorResult {
        match fname {
            "sin" => self.sin(args),
            "cos" => self.cos(args),
            "tan" => self.tan(args),
            "asin" => self.asin(args),
            "acos" => self.acos(args),
            "atan" => self.atan(args),
            "ln" => self.ln(args),
            "log" => self.log(args),
            "sqrt" => self.sqrt(args),
            "factorial" => self.factorial(args),
            "rad" => self.rad(args),
            "deg" => self.deg(args),
            "abs" => self.abs(args),
            "round" => self.round(args),
            "min" => self.min(args),
            "max" => self.max(args),
            "convert" => self.convert(args),
            "mr" => self.memory_recall(args),
            _ => {
                let ns = self.ns;
                match ns.user_func(fname) {
                    Some(f) => self.user_call(fname, args, f),
                    None => Err(CalcError::InvalidOp(fname.to_string())),
                }
            }
        }
    }

    one_arg_op!(negate, negate);

    two_arg_op!(power, power);
    two_arg_op!(divide, divide);
    two_arg_op!(addition, addition);
    two_arg_op!(subtract, subtract);
    two_arg_op!(multiply, multiply);

    function_op!(sin, sin_deg);
    function_op!(cos, cos_deg);
    function_op!(tan, tan_deg);
    function_op!(asin, asin_deg);
    function_op!(acos, acos_deg);
    function_op!(atan, atan_deg);
    function_op!(ln, ln);
    function_op!(log, log10);
    function_op!(sqrt, sqrt);
    function_op!(factorial, fact);
    function_op!(rad, to_rad);
    function_op!(deg, to_deg);
    function_op!(abs, abs);

    fn round(&mut self, args: usize) -> CalcErrorResult {
        if args == 0 {
            return Err(CalcError::FunctionNoArgs("round".to_string()));
        }
        if self.values.len() < args {
            return Err(CalcError::FunctionUnfinished("round".to_string()));
        }
        if args == 1 {
            let v = self.values.pop().unwrap();
            let v = v.round_to(None)?;
            self.values.push(v);
            return Ok(());
        }

        // round(x, ndigits); anything beyond the second argument is dropped
        for _i in 0..args - 2 {
            let _ = self.values.pop().unwrap();
        }
        let nd = self.values.pop().unwrap();
        let x = self.values.pop().unwrap();
        let nd = match nd {
            Value::Int(i) => match i.to_i32() {
                Some(n) => n,
                None => return Err(CalcError::Overflow),
            },
            Value::Float(g) if g.trunc() == g => g as i32,
            _ => {
                return Err(CalcError::InvalidArgument(
                    "round".to_string(),
                    "ndigits must be an integer".to_string(),
                ))
            }
        };
        let v = x.round_to(Some(nd))?;
        self.values.push(v);
        Ok(())
    }

    fn min(&mut self, args: usize) -> CalcErrorResult {
        if args < 2 || self.values.len() < args {
            return Err(CalcError::FunctionNotEnoughArgs("min".to_string(), 2));
        }
        let mut v = self.values.pop().unwrap();
        for _i in 0..args - 1 {
            let tmp = self.values.pop().unwrap();
            v = v.min_of(tmp)?;
        }
        self.values.push(v);
        Ok(())
    }

    fn max(&mut self, args: usize) -> CalcErrorResult {
        if args < 2 || self.values.len() < args {
            return Err(CalcError::FunctionNotEnoughArgs("max".to_string(), 2));
        }
        let mut v = self.values.pop().unwrap();
        for _i in 0..args - 1 {
            let tmp = self.values.pop().unwrap();
            v = v.max_of(tmp)?;
        }
        self.values.push(v);
        Ok(())
    }

    fn convert(&mut self, args: usize) -> CalcErrorResult {
        if args < 3 || self.values.len() < args {
            return Err(CalcError::FunctionNotEnoughArgs("convert".to_string(), 3));
        }
        for _i in 0..args - 3 {
            let _ = self.values.pop().unwrap();
        }
        let to_unit = self.values.pop().unwrap();
        let from_unit = self.values.pop().unwrap();
        let value = self.values.pop().unwrap();
        let (from_unit, to_unit) = match (from_unit, to_unit) {
            (Value::Str(f), Value::Str(t)) => (f, t),
            _ => {
                return Err(CalcError::InvalidArgument(
                    "convert".to_string(),
                    "unit names must be quoted strings".to_string(),
                ))
            }
        };
        let x = value.as_real("convert")?;
        let res = units::convert(x, &from_unit, &to_unit)?;
        self.values.push(Value::Float(res));
        Ok(())
    }

    fn memory_recall(&mut self, args: usize) -> CalcErrorResult {
        if args != 0 {
            return Err(CalcError::InvalidArgument(
                "mr".to_string(),
                "takes no arguments".to_string(),
            ));
        }
        self.values.push(self.ns.memory());
        Ok(())
    }

    fn user_call(&mut self, fname: &str, args: usize, f: &UserFunc) -> CalcErrorResult {
        if self.values.len() < args {
            return Err(CalcError::FunctionUnfinished(fname.to_string()));
        }
        let mut argv = Vec::with_capacity(args);
        for _i in 0..args {
            argv.push(self.values.pop().unwrap());
        }
        argv.reverse();
        let v = f(&argv)?;
        self.values.push(v);
        Ok(())
    }
}
