//! Rewrites user-facing calculator syntax into the canonical form the token
//! grammar accepts. The rules run in a fixed order because later ones depend
//! on the tokens the earlier ones produce:
//!
//! 1. trim surrounding whitespace
//! 2. normalize multiplication and division glyphs to `*` and `/`
//! 3. rewrite `^` to `**`
//! 4. substitute the standalone `ANS` token with the last answer literal
//! 5. rewrite a literal percent postfix `50%` to `(50/100)`
//! 6. rewrite a standalone `i`/`I` to the imaginary-unit literal
//! 7. insert implicit multiplication signs
//!
//! Every rule is a single left-to-right pass. The percent rule only matches
//! a literal number directly before `%`; a computed sub-expression such as
//! `(3+2)%` is left alone and rejected later by the grammar.

use crate::value::Value;

fn is_word(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Pure and total: never fails, worst case the returned text does not parse
pub fn preprocess(raw: &str, last_answer: &Value) -> String {
    let mut s = raw.trim().to_string();
    s = s.replace('×', "*").replace('÷', "/");
    s = s.replace('^', "**");
    s = replace_ans(&s, last_answer);
    s = rewrite_percent(&s);
    s = rewrite_imaginary(&s);
    insert_implicit_mul(&s)
}

// `ANS` is case-sensitive and must stand alone; the replacement is wrapped
// in brackets so the surrounding expression cannot capture its sign
fn replace_ans(s: &str, last_answer: &Value) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len());
    let mut i = 0;
    while i < chars.len() {
        let standalone = chars[i] == 'A'
            && i + 3 <= chars.len()
            && chars[i + 1] == 'N'
            && chars[i + 2] == 'S'
            && (i == 0 || !is_word(chars[i - 1]))
            && (i + 3 == chars.len() || !is_word(chars[i + 3]));
        if standalone {
            out.push('(');
            out.push_str(&last_answer.to_canonical());
            out.push(')');
            i += 3;
        } else {
            out.push(chars[i]);
            i += 1;
        }
    }
    out
}

// `50%` becomes `(50/100)`; only a literal number counts, and only when it
// does not continue an identifier (`x50%` stays untouched)
fn rewrite_percent(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len() + 8);
    let mut i = 0;
    while i < chars.len() {
        if chars[i].is_ascii_digit() && (i == 0 || !is_word(chars[i - 1])) {
            let start = i;
            while i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            }
            if i + 1 < chars.len() && chars[i] == '.' && chars[i + 1].is_ascii_digit() {
                i += 1;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
            }
            let lit: String = chars[start..i].iter().collect();
            if i < chars.len() && chars[i] == '%' {
                out.push('(');
                out.push_str(&lit);
                out.push_str("/100)");
                i += 1;
            } else {
                out.push_str(&lit);
            }
        } else {
            out.push(chars[i]);
            i += 1;
        }
    }
    out
}

// a standalone `i` or `I` becomes the bracketed imaginary literal `(i1)`;
// the spelling survives the implicit multiplication pass below
fn rewrite_imaginary(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len() + 8);
    for i in 0..chars.len() {
        let standalone = (chars[i] == 'i' || chars[i] == 'I')
            && (i == 0 || !is_word(chars[i - 1]))
            && (i + 1 == chars.len() || !is_word(chars[i + 1]));
        if standalone {
            out.push_str("(i1)");
        } else {
            out.push(chars[i]);
        }
    }
    out
}

// three adjacency cases: `2(`, `)2`, and `2pi`
fn insert_implicit_mul(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len() + 4);
    for i in 0..chars.len() {
        out.push(chars[i]);
        if i + 1 < chars.len() {
            let a = chars[i];
            let b = chars[i + 1];
            let needs_mul = (a.is_ascii_digit() && b == '(')
                || (a == ')' && b.is_ascii_digit())
                || (a.is_ascii_digit() && b.is_ascii_alphabetic());
            if needs_mul {
                out.push('*');
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;
    use num_complex::Complex;

    fn prep(s: &str) -> String {
        preprocess(s, &Value::default())
    }

    #[test]
    fn test_glyphs_and_power() {
        assert_eq!(prep("6×7"), "6*7");
        assert_eq!(prep("10÷4"), "10/4");
        assert_eq!(prep("2^10"), "2**10");
        assert_eq!(prep("  2 + 3  "), "2 + 3");
        assert_eq!(prep(""), "");
    }

    #[test]
    fn test_ans() {
        let ans = Value::Int(BigInt::from(7));
        assert_eq!(preprocess("ANS*2", &ans), "(7)*2");
        assert_eq!(preprocess("2+ANS", &ans), "2+(7)");
        // not a standalone token
        assert_eq!(preprocess("TRANS", &ans), "TRANS");
        assert_eq!(preprocess("ANSWER", &ans), "ANSWER");
        // lowercase is not substituted
        assert_eq!(preprocess("ans", &ans), "ans");
        let ans = Value::Complex(Complex::new(3.0, -4.0));
        assert_eq!(preprocess("ANS", &ans), "(3.0-i4.0)");
    }

    #[test]
    fn test_percent() {
        assert_eq!(prep("50%"), "(50/100)");
        assert_eq!(prep("200*10%"), "200*(10/100)");
        assert_eq!(prep("12.5%"), "(12.5/100)");
        // identifiers ending in digits are untouched
        assert_eq!(prep("x50%"), "x50%");
        // only a literal number is rewritten
        assert_eq!(prep("(3+2)%"), "(3+2)%");
    }

    #[test]
    fn test_imaginary() {
        assert_eq!(prep("i"), "(i1)");
        assert_eq!(prep("2*I"), "2*(i1)");
        assert_eq!(prep("2+i"), "2+(i1)");
        // no word boundary, left for the evaluator to reject
        assert_eq!(prep("2i"), "2*i");
        assert_eq!(prep("sin(1)"), "sin(1)");
    }

    #[test]
    fn test_implicit_multiplication() {
        assert_eq!(prep("2(3+4)"), "2*(3+4)");
        assert_eq!(prep("(3+4)2"), "(3+4)*2");
        assert_eq!(prep("2pi"), "2*pi");
        assert_eq!(prep("3sin(90)"), "3*sin(90)");
        assert_eq!(prep("2(3)4"), "2*(3)*4");
    }

    #[test]
    fn test_rule_order() {
        // ANS substitution happens before implicit multiplication, and the
        // canonical complex spelling is immune to the digit-letter rule
        let ans = Value::Complex(Complex::new(3.0, 4.0));
        assert_eq!(preprocess("2ANS", &ans), "2*(3.0+i4.0)");
        // percent runs before implicit multiplication
        assert_eq!(prep("2(50%)"), "2*((50/100))");
    }
}
