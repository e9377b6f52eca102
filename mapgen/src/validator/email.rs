use std::sync::OnceLock;

use regex::Regex;

use super::domain::DomainValidator;
use super::{ValidationError, ValidationOptions, Validator};
use crate::value::Value;

const MAX_LOCAL_LENGTH: usize = 64;

/// `local@domain`, with the domain checked as a hostname.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmailValidator;

fn local_part_re() -> Option<&'static Regex> {
    static LOCAL_RE: OnceLock<Option<Regex>> = OnceLock::new();
    LOCAL_RE
        .get_or_init(|| {
            Regex::new(r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*$")
                .ok()
        })
        .as_ref()
}

impl Validator for EmailValidator {
    fn code(&self) -> u32 {
        1004
    }

    fn validate(
        &self,
        value: &Value,
        _options: &ValidationOptions,
    ) -> Result<Value, ValidationError> {
        let email = value
            .as_str()
            .ok_or_else(|| self.error(format!("expected an email, got {}", value.type_name())))?;
        let (local, domain) = email
            .rsplit_once('@')
            .ok_or_else(|| self.error(format!("{:?} has no @", email)))?;

        if local.is_empty() || local.len() > MAX_LOCAL_LENGTH {
            return Err(self.error(format!("{:?} has an invalid local part length", email)));
        }
        let local_ok = local_part_re().map_or(false, |re| re.is_match(local));
        if !local_ok {
            return Err(self.error(format!("{:?} has an invalid local part", email)));
        }
        if let Some(reason) = DomainValidator::check(domain, true) {
            return Err(self.error(format!("{:?}: {}", email, reason)));
        }
        Ok(Value::String(email.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(email: &str) -> Result<Value, ValidationError> {
        EmailValidator.validate(&Value::from(email), &ValidationOptions::default())
    }

    #[test]
    fn test_valid() {
        assert!(check("alice@example.com").is_ok());
        assert!(check("first.last+tag@mail.example.org").is_ok());
    }

    #[test]
    fn test_invalid() {
        assert!(check("alice").is_err());
        assert!(check("@example.com").is_err());
        assert!(check("a..b@example.com").is_err());
        assert!(check("alice@-example.com").is_err());
        assert!(check("alice@exa_mple.com").is_err());
        assert_eq!(check("a b@example.com").unwrap_err().code, 1004);
    }
}
