use super::{ValidationError, ValidationOptions, Validator};
use crate::value::Value;

/// Accepts booleans, `0`/`1` and the usual truthy/falsy words.
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanValidator;

const TRUTHY: &[&str] = &["true", "1", "yes", "on"];
const FALSY: &[&str] = &["false", "0", "no", "off", ""];

impl Validator for BooleanValidator {
    fn code(&self) -> u32 {
        1001
    }

    fn validate(
        &self,
        value: &Value,
        _options: &ValidationOptions,
    ) -> Result<Value, ValidationError> {
        if let Value::Bool(b) = value {
            return Ok(Value::Bool(*b));
        }
        if let Some(n) = value.as_i128() {
            return match n {
                0 => Ok(Value::Bool(false)),
                1 => Ok(Value::Bool(true)),
                _ => Err(self.error(format!("{} is not a boolean", n))),
            };
        }
        if let Some(s) = value.as_str() {
            let word = s.trim().to_ascii_lowercase();
            if TRUTHY.contains(&word.as_str()) {
                return Ok(Value::Bool(true));
            }
            if FALSY.contains(&word.as_str()) {
                return Ok(Value::Bool(false));
            }
            return Err(self.error(format!("{:?} is not a boolean", s)));
        }
        Err(self.error(format!("expected a boolean, got {}", value.type_name())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(value: impl Into<Value>) -> Result<Value, ValidationError> {
        BooleanValidator.validate(&value.into(), &ValidationOptions::default())
    }

    #[test]
    fn test_words() {
        for word in ["true", "YES", " on ", "1"] {
            assert_eq!(check(word).unwrap(), Value::Bool(true), "{word}");
        }
        for word in ["false", "No", "off", "0", ""] {
            assert_eq!(check(word).unwrap(), Value::Bool(false), "{word}");
        }
    }

    #[test]
    fn test_numbers_and_bools() {
        assert_eq!(check(1u8).unwrap(), Value::Bool(true));
        assert_eq!(check(false).unwrap(), Value::Bool(false));
        assert_eq!(check(2i32).unwrap_err().code, 1001);
        assert!(check("maybe").is_err());
        assert!(check(1.0f64).is_err());
    }
}
