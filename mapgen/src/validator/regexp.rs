use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

use regex::Regex;

use super::{ValidationError, ValidationOptions, Validator};
use crate::value::Value;

/// Match the value against the `pattern` option.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexpValidator;

/// Compiled patterns, shared by every call.
fn compile(pattern: &str) -> Result<Regex, regex::Error> {
    static CACHE: OnceLock<Mutex<HashMap<String, Regex>>> = OnceLock::new();
    let cache = CACHE.get_or_init(|| Mutex::new(HashMap::new()));
    let mut cache = cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    if let Some(re) = cache.get(pattern) {
        return Ok(re.clone());
    }
    let re = Regex::new(pattern)?;
    cache.insert(pattern.to_string(), re.clone());
    Ok(re)
}

impl Validator for RegexpValidator {
    fn code(&self) -> u32 {
        1005
    }

    fn validate(
        &self,
        value: &Value,
        options: &ValidationOptions,
    ) -> Result<Value, ValidationError> {
        let pattern = options
            .pattern
            .as_deref()
            .ok_or_else(|| self.error("no pattern was configured"))?;
        let re = compile(pattern)
            .map_err(|e| self.error(format!("invalid pattern {:?}: {}", pattern, e)))?;

        let text = match value {
            Value::String(s) => s.clone(),
            Value::Bytes(_) | Value::Json(_) => {
                return Err(self.error(format!("cannot match a {} value", value.type_name())))
            }
            other => other.to_key_string(),
        };
        if re.is_match(&text) {
            Ok(value.clone())
        } else {
            Err(self.error(format!("{:?} does not match {:?}", text, pattern)))
        }
    }
}
