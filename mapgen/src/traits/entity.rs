//! Entity trait implemented by generated data holders

use crate::traits::FromRow;
use crate::value::Value;

/// A generated entity: one table row with its column metadata.
///
/// The `values` methods feed the query builder's SET clause; the constants
/// let runtime helpers build field lists and primary-key predicates without
/// per-table code.
pub trait Entity: FromRow + Send + Sync {
    /// Table the entity maps.
    const TABLE: &'static str;

    /// Primary key columns, in declaration order.
    const PRIMARY_KEYS: &'static [&'static str];

    /// Auto-increment column, skipped on INSERT and written back afterwards.
    const AUTO_INCREMENT: Option<&'static str>;

    /// All `(column, value)` pairs.
    fn values(&self) -> Vec<(&'static str, Value)>;

    /// `(column, value)` pairs for the primary key columns.
    fn primary_key_values(&self) -> Vec<(&'static str, Value)> {
        self.values()
            .into_iter()
            .filter(|(column, _)| Self::PRIMARY_KEYS.contains(column))
            .collect()
    }

    /// `(column, value)` pairs written by INSERT.
    ///
    /// This excludes the auto-increment column.
    fn insert_values(&self) -> Vec<(&'static str, Value)> {
        self.values()
            .into_iter()
            .filter(|(column, _)| Some(*column) != Self::AUTO_INCREMENT)
            .collect()
    }

    /// `(column, value)` pairs written by UPDATE: everything but the key.
    fn update_values(&self) -> Vec<(&'static str, Value)> {
        self.values()
            .into_iter()
            .filter(|(column, _)| !Self::PRIMARY_KEYS.contains(column))
            .collect()
    }

    /// Store the id returned by an INSERT into the auto-increment field.
    fn set_auto_increment_id(&mut self, _id: u64) {}
}
