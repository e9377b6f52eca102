use super::{ValidationError, ValidationOptions, Validator};
use crate::value::Value;

const MAX_LENGTH: usize = 253;
const MAX_LABEL_LENGTH: usize = 63;

/// Domain name check: at most 253 characters, labels of 1 to 63 characters.
///
/// With the `hostname` option, labels must also be made of letters, digits
/// and hyphens, and may not start or end with a hyphen.
#[derive(Debug, Clone, Copy, Default)]
pub struct DomainValidator;

impl DomainValidator {
    /// Why `domain` is invalid, if it is.
    pub(crate) fn check(domain: &str, hostname: bool) -> Option<String> {
        let trimmed = domain.strip_suffix('.').unwrap_or(domain);
        if trimmed.is_empty() {
            return Some("domain is empty".to_string());
        }
        if trimmed.len() > MAX_LENGTH {
            return Some(format!("domain is longer than {} characters", MAX_LENGTH));
        }
        for label in trimmed.split('.') {
            if label.is_empty() {
                return Some(format!("{:?} has an empty label", domain));
            }
            if label.len() > MAX_LABEL_LENGTH {
                return Some(format!(
                    "label {:?} is longer than {} characters",
                    label, MAX_LABEL_LENGTH
                ));
            }
            if hostname {
                if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
                    return Some(format!("label {:?} has invalid characters", label));
                }
                if label.starts_with('-') || label.ends_with('-') {
                    return Some(format!("label {:?} starts or ends with a hyphen", label));
                }
            }
        }
        None
    }
}

impl Validator for DomainValidator {
    fn code(&self) -> u32 {
        1003
    }

    fn validate(
        &self,
        value: &Value,
        options: &ValidationOptions,
    ) -> Result<Value, ValidationError> {
        let domain = value
            .as_str()
            .ok_or_else(|| self.error(format!("expected a domain, got {}", value.type_name())))?;
        match Self::check(domain, options.hostname) {
            Some(reason) => Err(self.error(reason)),
            None => Ok(Value::String(domain.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(domain: &str, hostname: bool) -> Result<Value, ValidationError> {
        DomainValidator.validate(
            &Value::from(domain),
            &ValidationOptions::new().hostname(hostname),
        )
    }

    #[test]
    fn test_lengths() {
        assert!(check("example.com", false).is_ok());
        assert!(check("example.com.", false).is_ok());
        assert!(check(&format!("{}.com", "a".repeat(63)), false).is_ok());
        assert!(check(&format!("{}.com", "a".repeat(64)), false).is_err());
        assert!(check(&vec!["abcdefghi"; 26].join("."), false).is_err());
        assert!(check("a..b", false).is_err());
        assert!(check("", false).is_err());
    }

    #[test]
    fn test_hostname_labels() {
        assert!(check("my_host.example", false).is_ok());
        assert!(check("my_host.example", true).is_err());
        assert!(check("-bad.example", true).is_err());
        assert!(check("bad-.example", true).is_err());
        let err = check("good-host.example", true);
        assert!(err.is_ok());
        assert_eq!(check("x y", true).unwrap_err().code, 1003);
    }
}
