//! Formulary Core - Fundamental types
//!
//! This crate provides the core types used throughout Formulary:
//! - `Number`: Arbitrary precision decimal numbers
//! - `Value`: Runtime values (numbers, text, records, lists)
//! - `FormulaError`: Structured errors relayed unchanged through resolution

mod number;
mod value;
mod error;

pub use number::{Number, NumberError, DEFAULT_PRECISION};
pub use value::Value;
pub use error::{FormulaError, ErrorContext, Severity, codes};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{Number, Value, FormulaError, Severity};
    pub use crate::error::codes;
}

/// Build a record value: `record! { One: 1, Inner: record! { Three: 3 } }`
#[macro_export]
macro_rules! record {
    {} => { $crate::Value::Object(std::collections::HashMap::new()) };
    { $($key:ident : $value:expr),* $(,)? } => {{
        let mut map = std::collections::HashMap::new();
        $(
            map.insert(stringify!($key).to_string(), $crate::Value::from($value));
        )*
        $crate::Value::Object(map)
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    mod number_tests {
        use super::*;

        #[test]
        fn test_from_i64() {
            let n = Number::from_i64(42);
            assert_eq!(n.to_i64(), Some(42));
        }

        #[test]
        fn test_from_str_decimal() {
            let n = Number::from_str("3.14").unwrap();
            assert!(!n.is_integer());
            assert_eq!(n.to_string(), "3.14");
        }

        #[test]
        fn test_from_str_scientific() {
            let n = Number::from_str("1.5e2").unwrap();
            assert_eq!(n.to_i64(), Some(150));
        }

        #[test]
        fn test_from_str_scientific_integer_mantissa() {
            let avogadro = Number::from_str("602214076e15").unwrap();
            let expected = Number::from_str("602214076000000000000000").unwrap();
            assert_eq!(avogadro, expected);
        }

        #[test]
        fn test_from_str_rejects_garbage() {
            assert!(Number::from_str("abc").is_err());
            assert!(Number::from_str("").is_err());
        }

        #[test]
        fn test_display_integer_has_no_point() {
            let n = Number::from_i64(5).sub(&Number::from_i64(1));
            assert_eq!(n.to_string(), "4");
        }

        #[test]
        fn test_display_exact_fraction() {
            let n = Number::from_i64(12).checked_div(&Number::from_i64(5)).unwrap();
            assert_eq!(n.to_string(), "2.4");
        }

        #[test]
        fn test_display_negative() {
            let n = Number::from_i64(-7).checked_div(&Number::from_i64(4)).unwrap();
            assert_eq!(n.to_string(), "-1.75");
        }

        #[test]
        fn test_display_round_trips() {
            for text in ["0.005", "123.456", "-42", "1000000"] {
                let n = Number::from_str(text).unwrap();
                assert_eq!(n.to_string(), text);
                assert_eq!(Number::from_str(&n.to_string()).unwrap(), n);
            }
        }

        #[test]
        fn test_from_f64() {
            assert_eq!(Number::from_f64(2.5).unwrap().to_string(), "2.5");
            assert!(Number::from_f64(f64::NAN).is_err());
        }

        #[test]
        fn test_div_by_zero() {
            let a = Number::from_i64(42);
            assert!(a.checked_div(&Number::from_i64(0)).is_err());
        }

        #[test]
        fn test_rem() {
            let a = Number::from_i64(7);
            assert_eq!(a.checked_rem(&Number::from_i64(3)).unwrap().to_i64(), Some(1));
            let b = Number::from_i64(-7);
            assert_eq!(b.checked_rem(&Number::from_i64(3)).unwrap().to_i64(), Some(-1));
        }

        #[test]
        fn test_pow_integer() {
            let two = Number::from_i64(2);
            assert_eq!(two.pow(10).unwrap().to_i64(), Some(1024));
            assert_eq!(two.pow(-2).unwrap().to_string(), "0.25");
        }

        #[test]
        fn test_pow_real_fractional() {
            let four = Number::from_i64(4);
            let half = Number::from_str("0.5").unwrap();
            let result = four.pow_real(&half).unwrap();
            let f = result.to_f64().unwrap();
            assert!((f - 2.0).abs() < 1e-9, "4^0.5 should be 2, got: {}", f);
        }

        #[test]
        fn test_sqrt() {
            let n = Number::from_i64(16).sqrt().unwrap();
            assert_eq!(n.to_i64(), Some(4));
            assert!(Number::from_i64(-1).sqrt().is_err());
        }

        #[test]
        fn test_floor_ceil_trunc() {
            let n = Number::from_str("-2.5").unwrap();
            assert_eq!(n.floor().to_i64(), Some(-3));
            assert_eq!(n.ceil().to_i64(), Some(-2));
            assert_eq!(n.trunc().to_i64(), Some(-2));
        }

        #[test]
        fn test_round_to() {
            let n = Number::from_str("3.14159").unwrap();
            assert_eq!(n.round_to(2).to_string(), "3.14");
            assert_eq!(Number::from_str("2.5").unwrap().round_to(0).to_string(), "3");
            assert_eq!(Number::from_str("-2.5").unwrap().round_to(0).to_string(), "-3");
        }
    }

    mod value_tests {
        use super::*;

        #[test]
        fn test_dotted_path() {
            let env = record! { Input: record! { Inner: record! { Three: 3 } } };
            let v = env.get_path(["Input", "Inner", "Three"]).unwrap();
            assert_eq!(v.as_number().unwrap().to_i64(), Some(3));
        }

        #[test]
        fn test_missing_field() {
            let rec = record! { One: 1 };
            let err = rec.get("Two").unwrap_err();
            assert_eq!(err.code, codes::UNDEFINED_FIELD);
        }

        #[test]
        fn test_field_on_scalar() {
            let err = Value::from(1).get("x").unwrap_err();
            assert_eq!(err.code, codes::TYPE_ERROR);
        }

        #[test]
        fn test_to_literal() {
            assert_eq!(Value::from(4).to_literal().unwrap(), "4");
            assert_eq!(Value::from(-3).to_literal().unwrap(), "(-3)");
            assert_eq!(Value::from(true).to_literal().unwrap(), "true");
            assert_eq!(Value::from("a \"b\"").to_literal().unwrap(), "\"a \\\"b\\\"\"");
            assert_eq!(
                Value::List(vec![Value::from(1), Value::from("x")]).to_literal().unwrap(),
                "[1, \"x\"]"
            );
            let err = record! { a: 1 }.to_literal().unwrap_err();
            assert_eq!(err.code, codes::NOT_A_LITERAL);
        }

        #[test]
        fn test_from_json() {
            let json = serde_json::json!({ "Input": { "One": 1, "Rate": 0.25, "Tags": ["a"] } });
            let v = Value::from_json(json).unwrap();
            assert_eq!(v.get_path(["Input", "Rate"]).unwrap().to_string(), "0.25");
            assert_eq!(v.get_path(["Input", "Tags"]).unwrap().as_list().unwrap().len(), 1);
        }

        #[test]
        fn test_to_json() {
            let v = record! {
                Rate: Number::from_str("0.25").unwrap(),
                Tags: vec![Value::from("a")],
                On: true,
            };
            assert_eq!(
                v.to_json(),
                serde_json::json!({ "Rate": 0.25, "Tags": ["a"], "On": true })
            );
            // beyond f64 range the decimal text is kept
            let huge = Value::Number(Number::from_str("1e1000000").unwrap());
            assert_eq!(huge.to_json(), serde_json::json!("1e1000000"));
        }

        #[test]
        fn test_display_object_sorted() {
            let v = record! { b: 2, a: 1 };
            assert_eq!(v.to_string(), "{a: 1, b: 2}");
        }
    }

    mod error_tests {
        use super::*;

        #[test]
        fn test_display_is_message_only() {
            let err = FormulaError::formula_not_found("inner_formula");
            assert_eq!(err.to_string(), "formula 'inner_formula' does not exist");
            assert_eq!(err.code, codes::FORMULA_NOT_FOUND);
        }

        #[test]
        fn test_describe() {
            let err = FormulaError::div_zero();
            assert_eq!(
                err.describe(),
                "[DIV_ZERO] Division by zero (suggestion: Ensure divisor is not zero)"
            );
        }

        #[test]
        fn test_innermost_formula_context_kept() {
            let err = FormulaError::div_zero().with_formula("1 / 0").with_formula("formula.x + 1");
            assert_eq!(err.context.unwrap().formula.as_deref(), Some("1 / 0"));
        }

        #[test]
        fn test_from_number_error() {
            let err: FormulaError = NumberError::DivisionByZero.into();
            assert_eq!(err.code, codes::DIV_ZERO);
        }
    }
}
