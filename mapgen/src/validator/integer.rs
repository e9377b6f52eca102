use super::{ValidationError, ValidationOptions, Validator};
use crate::value::Value;

/// Integer range check.
///
/// Bounds come from `min`/`max` when given, otherwise from the `preset`
/// storage range. Integer strings are accepted and converted.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntegerValidator;

impl IntegerValidator {
    fn bounds(options: &ValidationOptions) -> (Option<i128>, Option<i128>) {
        let preset = options.preset.map(|p| p.range());
        (
            options.min.or(preset.map(|(min, _)| min)),
            options.max.or(preset.map(|(_, max)| max)),
        )
    }
}

impl Validator for IntegerValidator {
    fn code(&self) -> u32 {
        1002
    }

    fn validate(
        &self,
        value: &Value,
        options: &ValidationOptions,
    ) -> Result<Value, ValidationError> {
        let (n, normalized) = match value.as_i128() {
            Some(n) => (n, value.clone()),
            None => {
                let text = value
                    .as_str()
                    .ok_or_else(|| self.error(format!("expected an integer, got {}", value.type_name())))?;
                let n: i128 = text
                    .trim()
                    .parse()
                    .map_err(|_| self.error(format!("{:?} is not an integer", text)))?;
                let normalized = match i64::try_from(n) {
                    Ok(v) => Value::I64(v),
                    Err(_) => u64::try_from(n)
                        .map(Value::U64)
                        .map_err(|_| self.error(format!("{} does not fit in 64 bits", n)))?,
                };
                (n, normalized)
            }
        };

        let (min, max) = Self::bounds(options);
        if let Some(min) = min {
            if n < min {
                return Err(self.error(format!("{} is lower than the minimum {}", n, min)));
            }
        }
        if let Some(max) = max {
            if n > max {
                return Err(self.error(format!("{} is greater than the maximum {}", n, max)));
            }
        }
        Ok(normalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::IntegerPreset;

    #[test]
    fn test_explicit_range() {
        let options = ValidationOptions::new().min(0).max(100);
        assert_eq!(
            IntegerValidator.validate(&Value::I32(100), &options).unwrap(),
            Value::I32(100)
        );
        let err = IntegerValidator.validate(&Value::I32(101), &options).unwrap_err();
        assert_eq!(err.code, 1002);
        assert!(IntegerValidator.validate(&Value::I64(-1), &options).is_err());
    }

    #[test]
    fn test_preset_range() {
        let options = ValidationOptions::new().preset(IntegerPreset::TinyIntUnsigned);
        assert!(IntegerValidator.validate(&Value::U8(255), &options).is_ok());
        assert!(IntegerValidator.validate(&Value::I32(256), &options).is_err());
        assert!(IntegerValidator.validate(&Value::I32(-1), &options).is_err());

        // explicit bounds win over the preset
        let options = options.max(10);
        assert!(IntegerValidator.validate(&Value::I32(11), &options).is_err());
    }

    #[test]
    fn test_strings() {
        let options = ValidationOptions::new();
        assert_eq!(
            IntegerValidator.validate(&Value::from(" 42 "), &options).unwrap(),
            Value::I64(42)
        );
        assert_eq!(
            IntegerValidator
                .validate(&Value::from("18446744073709551615"), &options)
                .unwrap(),
            Value::U64(u64::MAX)
        );
        assert!(IntegerValidator.validate(&Value::from("4.2"), &options).is_err());
        assert!(IntegerValidator.validate(&Value::F64(1.0), &options).is_err());
    }
}
