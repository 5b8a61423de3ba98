use num_bigint::BigInt;
use num_complex::Complex;
use num_traits::{FromPrimitive, One, Pow, Signed, ToPrimitive, Zero};
use std::fmt;
use std::str;

use crate::errors::*;

/// Expression calculation result: either value or error
pub type CalcResult = Result<Value, CalcError>;
pub(crate) type CalcErrorResult = Result<(), CalcError>;

/// Supported value types. `Str` carries quoted unit names into `convert`
/// calls; it never survives as a final result.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Big integer number
    Int(BigInt),
    /// Float number
    Float(f64),
    /// Complex number
    Complex(Complex<f64>),
    /// Quoted string argument (unit names only)
    Str(String),
}

/// Components smaller than this are shown as zero when a complex number is
/// rendered. Display-only; the stored value keeps both parts.
const DISPLAY_EPSILON: f64 = 1e-12;
const DISPLAY_DIGITS: i32 = 15;

const F64_BUF_LEN: usize = 48;
fn roundtrip_f64(g: f64) -> String {
    let mut buf = [b'\0'; F64_BUF_LEN];
    match dtoa::write(&mut buf[..], g) {
        Ok(len) => match str::from_utf8(&buf[..len]) {
            Ok(s) => s.to_string(),
            Err(..) => format!("{}", g),
        },
        Err(..) => format!("{}", g),
    }
}

fn strip_fraction_zeros(s: &str) -> String {
    if !s.contains('.') {
        return s.to_string();
    }
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Renders a float with 15 significant digits, trailing fractional zeros
/// stripped. A float equal to its truncation prints as a plain integer.
fn format_f64(g: f64) -> String {
    if !g.is_finite() {
        return format!("{}", g);
    }
    if g == 0.0 {
        return "0".to_string();
    }
    if g.trunc() == g {
        if let Some(i) = BigInt::from_f64(g) {
            return i.to_string();
        }
    }
    let mag = g.abs().log10().floor() as i32;
    if mag < -4 || mag >= DISPLAY_DIGITS {
        let s = format!("{:.*e}", (DISPLAY_DIGITS - 1) as usize, g);
        match s.find('e') {
            Some(pos) => {
                let (mantissa, exp) = s.split_at(pos);
                format!("{}{}", strip_fraction_zeros(mantissa), exp)
            }
            None => s,
        }
    } else {
        let decimals = (DISPLAY_DIGITS - 1 - mag) as usize;
        strip_fraction_zeros(&format!("{:.*}", decimals, g))
    }
}

/// Full-precision literal text that still parses after the implicit
/// multiplication rewrite runs over it: a bare exponent marker would be
/// torn into `1*e300`, so exponent notation becomes `m*10**e`.
pub(crate) fn canonical_f64(g: f64) -> String {
    let s = roundtrip_f64(g);
    match s.find(|c| c == 'e' || c == 'E') {
        Some(pos) => {
            let (mantissa, exp) = s.split_at(pos);
            format!("{}*10**{}", mantissa, &exp[1..])
        }
        None => s,
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self {
            Value::Int(ref i) => write!(f, "{}", i),
            Value::Float(ref g) => write!(f, "{}", format_f64(*g)),
            Value::Complex(ref c) => {
                let re = if c.re.abs() < DISPLAY_EPSILON { 0.0 } else { c.re };
                let im = if c.im.abs() < DISPLAY_EPSILON { 0.0 } else { c.im };
                if re == 0.0 {
                    write!(f, "{}j", format_f64(im))
                } else if im >= 0.0 {
                    write!(f, "{}+{}j", format_f64(re), format_f64(im))
                } else {
                    write!(f, "{}-{}j", format_f64(re), format_f64(-im))
                }
            }
            Value::Str(ref s) => write!(f, "{}", s),
        }
    }
}

fn int_to_f64(i: &BigInt) -> Result<f64, CalcError> {
    match i.to_f64() {
        Some(f) if f.is_finite() => Ok(f),
        _ => Err(CalcError::Overflow),
    }
}

fn f64_to_int(f: f64) -> Result<BigInt, CalcError> {
    match BigInt::from_f64(f) {
        Some(i) => Ok(i),
        None => Err(CalcError::Overflow),
    }
}

macro_rules! basic_op {
    ($id:ident, $op:tt) => {
        pub fn $id(self, rhs: Value) -> CalcResult {
            match (&self, &rhs) {
                (Value::Str(..), ..) | (.., Value::Str(..)) => Err(CalcError::UnsupportedResultType),
                (Value::Complex(..), ..) | (.., Value::Complex(..)) => {
                    let c1 = self.raw_complex()?;
                    let c2 = rhs.raw_complex()?;
                    Value::finite(Value::Complex(c1 $op c2))
                }
                (Value::Float(..), ..) | (.., Value::Float(..)) => {
                    let f1 = self.raw_f64()?;
                    let f2 = rhs.raw_f64()?;
                    Value::finite(Value::Float(f1 $op f2))
                }
                _ => {
                    let i1 = self.raw_int()?;
                    let i2 = rhs.raw_int()?;
                    Ok(Value::Int(i1 $op i2))
                }
            }
        }
    };
}

macro_rules! trig_deg_op {
    ($id:ident, $f:ident) => {
        /// Argument in degrees
        pub fn $id(self) -> CalcResult {
            let f = self.as_real(stringify!($f))?;
            Ok(Value::Float(f.to_radians().$f()))
        }
    };
}

macro_rules! atrig_deg_op {
    ($id:ident, $f:ident) => {
        /// Result in degrees; the argument must lie in [-1, 1]
        pub fn $id(self) -> CalcResult {
            let f = self.as_real(stringify!($f))?;
            if !(-1.0..=1.0).contains(&f) {
                return Err(CalcError::InvalidArgument(
                    stringify!($f).to_string(),
                    "math domain error".to_string(),
                ));
            }
            Ok(Value::Float(f.$f().to_degrees()))
        }
    };
}

impl Default for Value {
    fn default() -> Value {
        Value::Int(BigInt::zero())
    }
}

impl Value {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn is_zero(&self) -> bool {
        match &self {
            Value::Int(i) => i.is_zero(),
            Value::Float(g) => *g == 0.0,
            Value::Complex(c) => c.is_zero(),
            Value::Str(..) => false,
        }
    }

    // --------------------------------

    /// Real-number view for functions that only accept reals
    pub(crate) fn as_real(&self, func: &str) -> Result<f64, CalcError> {
        match self {
            Value::Int(i) => int_to_f64(i),
            Value::Float(g) => Ok(*g),
            Value::Complex(..) => Err(CalcError::NotForComplex(func.to_string())),
            Value::Str(..) => Err(CalcError::InvalidArgument(
                func.to_string(),
                "expects a number".to_string(),
            )),
        }
    }

    fn raw_f64(self) -> Result<f64, CalcError> {
        match self {
            Value::Int(i) => int_to_f64(&i),
            Value::Float(g) => Ok(g),
            Value::Complex(c) => Ok(c.re),
            Value::Str(..) => Err(CalcError::Unreachable),
        }
    }

    fn raw_int(self) -> Result<BigInt, CalcError> {
        match self {
            Value::Int(i) => Ok(i),
            _ => Err(CalcError::Unreachable),
        }
    }

    fn raw_complex(self) -> Result<Complex<f64>, CalcError> {
        match self {
            Value::Complex(c) => Ok(c),
            Value::Float(g) => Ok(Complex::new(g, 0.0)),
            Value::Int(i) => {
                let f = int_to_f64(&i)?;
                Ok(Complex::new(f, 0.0))
            }
            Value::Str(..) => Err(CalcError::Unreachable),
        }
    }

    fn finite(v: Value) -> CalcResult {
        match &v {
            Value::Float(g) if !g.is_finite() => Err(CalcError::Overflow),
            Value::Complex(c) if !(c.re.is_finite() && c.im.is_finite()) => Err(CalcError::Overflow),
            _ => Ok(v),
        }
    }

    /// Final-result check: only finite numbers may leave the evaluator
    pub fn coerce(self) -> CalcResult {
        match &self {
            Value::Str(..) => Err(CalcError::UnsupportedResultType),
            _ => Value::finite(self),
        }
    }

    //---------------------------------------------

    pub fn from_str_integer(s: &str) -> CalcResult {
        match s.parse::<BigInt>() {
            Ok(i) => Ok(Value::Int(i)),
            Err(..) => Err(CalcError::StrToInt(s.to_owned())),
        }
    }

    pub fn from_str_float(s: &str) -> CalcResult {
        match s.parse::<f64>() {
            Ok(f) => Ok(Value::Float(f)),
            Err(..) => Err(CalcError::StrToFloat(s.to_owned())),
        }
    }

    /// Imaginary literal in the `i<number>` spelling, e.g. `i2` or `i0.5`
    pub fn from_str_imag(s: &str) -> CalcResult {
        match s[1..].parse::<f64>() {
            Ok(f) => Ok(Value::Complex(Complex::new(0.0, f))),
            Err(..) => Err(CalcError::StrToFloat(s.to_owned())),
        }
    }

    /// Literal text that round-trips through the token grammar. Complex
    /// numbers use the `re+i<im>` spelling so the digit-letter implicit
    /// multiplication rewrite cannot split them.
    pub fn to_canonical(&self) -> String {
        match &self {
            Value::Int(i) => i.to_string(),
            Value::Float(g) => canonical_f64(*g),
            Value::Complex(c) => {
                if c.im >= 0.0 {
                    format!("{}+i{}", canonical_f64(c.re), canonical_f64(c.im))
                } else {
                    format!("{}-i{}", canonical_f64(c.re), canonical_f64(-c.im))
                }
            }
            Value::Str(s) => format!("\"{}\"", s),
        }
    }

    //---------------------------------------------

    basic_op!(addition, +);
    basic_op!(subtract, -);
    basic_op!(multiply, *);

    pub fn divide(self, rhs: Value) -> CalcResult {
        if rhs.is_zero() {
            return Err(CalcError::DividedByZero);
        }
        match (&self, &rhs) {
            (Value::Str(..), ..) | (.., Value::Str(..)) => Err(CalcError::UnsupportedResultType),
            (Value::Complex(..), ..) | (.., Value::Complex(..)) => {
                let c2 = rhs.raw_complex()?;
                let c1 = self.raw_complex()?;
                Value::finite(Value::Complex(c1 / c2))
            }
            (Value::Float(..), ..) | (.., Value::Float(..)) => {
                let f2 = rhs.raw_f64()?;
                let f1 = self.raw_f64()?;
                Value::finite(Value::Float(f1 / f2))
            }
            _ => {
                let i2 = rhs.raw_int()?;
                let i1 = self.raw_int()?;
                if (&i1 % &i2).is_zero() {
                    return Ok(Value::Int(i1 / i2));
                }
                match (i1.to_f64(), i2.to_f64()) {
                    (Some(f1), Some(f2)) if f1.is_finite() && f2.is_finite() => {
                        Ok(Value::Float(f1 / f2))
                    }
                    // quotient of two huge integers: fall back to exact division
                    (_, _) => Ok(Value::Int(i1 / i2)),
                }
            }
        }
    }

    pub fn power(self, rhs: Value) -> CalcResult {
        let negative_exp = match &rhs {
            Value::Int(i) => i.is_negative(),
            Value::Float(g) => *g < 0.0,
            _ => false,
        };
        if self.is_zero() && negative_exp {
            return Err(CalcError::DividedByZero);
        }
        match (&self, &rhs) {
            (Value::Str(..), ..) | (.., Value::Str(..)) => Err(CalcError::UnsupportedResultType),
            (Value::Complex(..), ..) | (.., Value::Complex(..)) => {
                let c2 = rhs.raw_complex()?;
                let c1 = self.raw_complex()?;
                Value::finite(Value::Complex(c1.powc(c2)))
            }
            (Value::Int(i1), Value::Int(i2)) => {
                if i2.is_negative() {
                    let f1 = int_to_f64(i1)?;
                    let f2 = int_to_f64(i2)?;
                    return Value::finite(Value::Float(f1.powf(f2)));
                }
                let exp = match i2.to_u32() {
                    Some(e) => e,
                    None => return Err(CalcError::Overflow),
                };
                Ok(Value::Int(Pow::pow(i1, exp)))
            }
            _ => {
                let f2 = rhs.raw_f64()?;
                let f1 = self.raw_f64()?;
                if f1 < 0.0 && f2.trunc() != f2 {
                    // negative base with fractional exponent lands in the complex plane
                    let c = Complex::new(f1, 0.0).powc(Complex::new(f2, 0.0));
                    return Value::finite(Value::Complex(c));
                }
                Value::finite(Value::Float(f1.powf(f2)))
            }
        }
    }

    pub fn negate(self) -> CalcResult {
        match self {
            Value::Int(i) => Ok(Value::Int(-i)),
            Value::Float(g) => Ok(Value::Float(-g)),
            Value::Complex(c) => Ok(Value::Complex(-c)),
            Value::Str(..) => Err(CalcError::UnsupportedResultType),
        }
    }

    //---------------------------------------------

    trig_deg_op!(sin_deg, sin);
    trig_deg_op!(cos_deg, cos);
    trig_deg_op!(tan_deg, tan);

    atrig_deg_op!(asin_deg, asin);
    atrig_deg_op!(acos_deg, acos);

    /// Result in degrees
    pub fn atan_deg(self) -> CalcResult {
        let f = self.as_real("atan")?;
        Ok(Value::Float(f.atan().to_degrees()))
    }

    /// Natural logarithm
    pub fn ln(self) -> CalcResult {
        let f = self.as_real("ln")?;
        if f <= 0.0 {
            return Err(CalcError::InvalidArgument(
                "ln".to_string(),
                "math domain error".to_string(),
            ));
        }
        Ok(Value::Float(f.ln()))
    }

    /// Base-10 logarithm
    pub fn log10(self) -> CalcResult {
        let f = self.as_real("log")?;
        if f <= 0.0 {
            return Err(CalcError::InvalidArgument(
                "log".to_string(),
                "math domain error".to_string(),
            ));
        }
        Ok(Value::Float(f.log10()))
    }

    pub fn sqrt(self) -> CalcResult {
        match &self {
            Value::Complex(c) => Ok(Value::Complex(c.sqrt())),
            Value::Float(f) => {
                if *f >= 0.0 {
                    Ok(Value::Float(f.sqrt()))
                } else {
                    Ok(Value::Complex(Complex::new(0.0, (-f).sqrt())))
                }
            }
            Value::Int(i) => {
                if *i < BigInt::zero() {
                    let f = int_to_f64(&-i.clone())?;
                    Ok(Value::Complex(Complex::new(0.0, f.sqrt())))
                } else {
                    let sq = i.sqrt();
                    if &sq * &sq == *i {
                        Ok(Value::Int(sq))
                    } else {
                        let f = int_to_f64(i)?;
                        Ok(Value::Float(f.sqrt()))
                    }
                }
            }
            Value::Str(..) => Err(CalcError::InvalidArgument(
                "sqrt".to_string(),
                "expects a number".to_string(),
            )),
        }
    }

    pub fn fact(self) -> CalcResult {
        let domain_err = || {
            CalcError::InvalidArgument(
                "factorial".to_string(),
                "only defined for non-negative integers".to_string(),
            )
        };
        let n = match &self {
            Value::Int(i) => i.clone(),
            Value::Float(f) => {
                if f.trunc() != *f {
                    return Err(domain_err());
                }
                f64_to_int(*f)?
            }
            Value::Complex(..) | Value::Str(..) => return Err(domain_err()),
        };
        if n < BigInt::zero() {
            return Err(domain_err());
        }
        let mut res = BigInt::one();
        let mut cnt = BigInt::one();
        while cnt <= n {
            res *= cnt.clone();
            cnt += BigInt::one();
        }
        Ok(Value::Int(res))
    }

    pub fn to_rad(self) -> CalcResult {
        let f = self.as_real("rad")?;
        Ok(Value::Float(f.to_radians()))
    }

    pub fn to_deg(self) -> CalcResult {
        let f = self.as_real("deg")?;
        Ok(Value::Float(f.to_degrees()))
    }

    pub fn abs(self) -> CalcResult {
        match self {
            Value::Int(i) => Ok(Value::Int(i.abs())),
            Value::Float(g) => Ok(Value::Float(g.abs())),
            // magnitude of a complex number is real
            Value::Complex(c) => Ok(Value::Float(c.norm())),
            Value::Str(..) => Err(CalcError::InvalidArgument(
                "abs".to_string(),
                "expects a number".to_string(),
            )),
        }
    }

    /// Half-away-from-zero rounding; with `ndigits` the result stays a float
    pub fn round_to(self, ndigits: Option<i32>) -> CalcResult {
        match ndigits {
            None => match self {
                Value::Int(..) => Ok(self),
                Value::Float(g) => Ok(Value::Int(f64_to_int(g.round())?)),
                Value::Complex(..) => Err(CalcError::NotForComplex("round".to_string())),
                Value::Str(..) => Err(CalcError::InvalidArgument(
                    "round".to_string(),
                    "expects a number".to_string(),
                )),
            },
            Some(n) => {
                let f = self.as_real("round")?;
                let p = 10f64.powi(n);
                Value::finite(Value::Float((f * p).round() / p))
            }
        }
    }

    pub fn min_of(self, rhs: Value) -> CalcResult {
        let a = self.as_real("min")?;
        let b = rhs.as_real("min")?;
        Ok(if b < a { rhs } else { self })
    }

    pub fn max_of(self, rhs: Value) -> CalcResult {
        let a = self.as_real("max")?;
        let b = rhs.as_real("max")?;
        Ok(if b > a { rhs } else { self })
    }
}
