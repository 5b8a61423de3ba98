use dcalc_lib::engine::CalculatorEngine;
use dcalc_lib::value::Value;
use num_bigint::BigInt;
use num_complex::Complex;

#[test]
fn test_arithmetic_precedence() {
    let mut engine = CalculatorEngine::new();
    assert_eq!(engine.evaluate("2+3*4"), "14");
    assert_eq!(engine.evaluate("(2+3)*4"), "20");
    assert_eq!(engine.evaluate("2**3**2"), "512");
    assert_eq!(engine.evaluate("-2**2"), "-4");
    assert_eq!(engine.evaluate("7/2"), "3.5");
    assert_eq!(engine.evaluate("2^10"), "1024");
    assert_eq!(engine.evaluate("10÷4"), "2.5");
    assert_eq!(engine.evaluate("6×7"), "42");
}

#[test]
fn test_percent_and_implicit_multiplication() {
    let mut engine = CalculatorEngine::new();
    assert_eq!(engine.evaluate("50%"), "0.5");
    assert_eq!(engine.evaluate("2(3+4)"), "14");
    assert_eq!(engine.evaluate("(3+4)2"), "14");
    assert_eq!(engine.evaluate("2pi*0"), "0");
    assert_eq!(engine.evaluate("200*10%"), "20");
}

#[test]
fn test_ans_flow() {
    let mut engine = CalculatorEngine::new();
    assert_eq!(engine.evaluate("3+4"), "7");
    assert_eq!(engine.evaluate("ANS*2"), "14");
    // a failed evaluation leaves ANS alone
    assert!(engine.evaluate("1/0").starts_with("Error:"));
    assert_eq!(engine.evaluate("ANS"), "14");
}

#[test]
fn test_degree_trig() {
    let mut engine = CalculatorEngine::new();
    assert_eq!(engine.evaluate("sin(90)"), "1");
    assert_eq!(engine.evaluate("cos(60)"), "0.5");
    assert_eq!(engine.evaluate("asin(1)"), "90");
    assert_eq!(engine.evaluate("atan(1)"), "45");
}

#[test]
fn test_complex_results() {
    let mut engine = CalculatorEngine::new();
    assert_eq!(engine.evaluate("sqrt(-4)"), "2j");
    assert_eq!(engine.evaluate("i*i"), "-1+0j");
    assert_eq!(engine.evaluate("2*i+1"), "1+2j");
}

#[test]
fn test_factorial() {
    let mut engine = CalculatorEngine::new();
    assert_eq!(engine.evaluate("factorial(5)"), "120");
    assert!(engine.evaluate("factorial(-1)").starts_with("Error:"));
    assert!(engine.evaluate("factorial(2.5)").starts_with("Error:"));
}

#[test]
fn test_unit_conversion() {
    let mut engine = CalculatorEngine::new();
    assert_eq!(engine.evaluate("convert(1, \"km\", \"m\")"), "1000");
    let res = engine.evaluate("convert(1, \"kg\", \"m\")");
    assert_eq!(res, "Error: Incompatible units 'kg' and 'm'");
    // the direct accessor reports typed errors
    assert_eq!(engine.convert_units(1.0, "km", "m"), Ok(1000.0));
    assert!(engine.convert_units(1.0, "kg", "m").is_err());
}

#[test]
fn test_memory_in_expressions() {
    let mut engine = CalculatorEngine::new();
    engine.memory_add(Value::Int(BigInt::from(10))).unwrap();
    assert_eq!(engine.evaluate("mr()*3"), "30");
    engine.memory_subtract(Value::Int(BigInt::from(4))).unwrap();
    assert_eq!(engine.evaluate("mr()"), "6");
}

#[test]
fn test_history_retention() {
    let mut engine = CalculatorEngine::new();
    for i in 0..1050 {
        engine.evaluate(&format!("{}+1", i));
    }
    assert_eq!(engine.history().len(), 1000);
    // the oldest entries were dropped silently
    assert_eq!(engine.history()[0].0, "50+1");
    assert_eq!(engine.snapshot().history.len(), 200);
}

#[test]
fn test_session_roundtrip() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("session.json");

    {
        let mut engine = CalculatorEngine::with_session(&path);
        engine
            .memory_add(Value::Complex(Complex::new(3.0, -4.0)))
            .unwrap();
        engine.evaluate("1+1");
        engine.save_session();
    }

    let engine = CalculatorEngine::with_session(&path);
    assert_eq!(
        engine.memory_recall(),
        Value::Complex(Complex::new(3.0, -4.0))
    );
    assert_eq!(engine.last_answer(), Value::Float(2.0));
    assert_eq!(engine.history().len(), 1);
    assert_eq!(engine.history()[0], ("1+1".to_string(), "2".to_string()));
}

#[test]
fn test_session_missing_or_corrupt() {
    let dir = tempfile::tempdir().expect("tmp dir");

    let engine = CalculatorEngine::with_session(dir.path().join("absent.json"));
    assert_eq!(engine.memory_recall(), Value::Float(0.0));
    assert!(engine.history().is_empty());

    let path = dir.path().join("broken.json");
    std::fs::write(&path, "]]] definitely not json").expect("write");
    let engine = CalculatorEngine::with_session(&path);
    assert_eq!(engine.memory_recall(), Value::Float(0.0));
    assert!(engine.history().is_empty());
}

#[test]
fn test_error_display() {
    let mut engine = CalculatorEngine::new();
    assert_eq!(engine.evaluate("1/0"), "Error: Division by zero");
    assert_eq!(engine.evaluate("(3+2)%"), "Error: Invalid expression");
    assert_eq!(engine.evaluate("unknown_name"), "Error: Invalid expression");
    assert_eq!(engine.evaluate(""), "Error: Invalid expression");
    // the engine survives every failure
    assert_eq!(engine.evaluate("2+2"), "4");
}

#[test]
fn test_user_function_extension() {
    let mut engine = CalculatorEngine::new();
    engine.register_function(
        "hypot",
        Box::new(|args| {
            let a = args[0].clone().multiply(args[0].clone())?;
            let b = args[1].clone().multiply(args[1].clone())?;
            a.addition(b)?.sqrt()
        }),
    );
    assert_eq!(engine.evaluate("hypot(3, 4)"), "5");
}
