//! Placeholder allocation and the bind list

use std::collections::HashMap;

use super::ident::placeholder_base;
use crate::value::Value;

/// One placeholder and the value bound to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub placeholder: String,
    pub field: String,
    pub value: Value,
}

/// Ordered placeholder → value map.
///
/// A non-unique bind reuses the field's shared placeholder (replacing its
/// value); a unique bind always allocates a fresh one, suffixed `_1`, `_2`...
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    entries: Vec<Binding>,
    shared: HashMap<String, String>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `value` for `field` and return the placeholder name (without `:`).
    pub fn bind(&mut self, field: &str, value: Value, unique: bool) -> String {
        if !unique {
            if let Some(placeholder) = self.shared.get(field) {
                let placeholder = placeholder.clone();
                if let Some(entry) = self.entries.iter_mut().find(|b| b.placeholder == placeholder)
                {
                    entry.value = value;
                }
                return placeholder;
            }
        }

        let placeholder = self.allocate(&placeholder_base(field));
        self.entries.push(Binding {
            placeholder: placeholder.clone(),
            field: field.to_string(),
            value,
        });
        if !unique {
            self.shared.insert(field.to_string(), placeholder.clone());
        }
        placeholder
    }

    fn allocate(&self, base: &str) -> String {
        if !self.contains(base) {
            return base.to_string();
        }
        (1..)
            .map(|n| format!("{}_{}", base, n))
            .find(|candidate| !self.contains(candidate))
            .unwrap_or_else(|| base.to_string())
    }

    /// Whether `placeholder` has a bound value.
    pub fn contains(&self, placeholder: &str) -> bool {
        self.entries.iter().any(|b| b.placeholder == placeholder)
    }

    /// Value bound to `placeholder`.
    pub fn get(&self, placeholder: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|b| b.placeholder == placeholder)
            .map(|b| &b.value)
    }

    /// Every binding, in the order placeholders were allocated.
    pub fn all(&self) -> &[Binding] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.shared.clear();
    }
}
