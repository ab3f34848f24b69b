// src/patch.rs

use chrono::{DateTime, NaiveDate, Utc};

/// New value for one column. `None` inside a nullable variant clears the column.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(Option<String>),
    Int(i32),
    BigInt(i64),
    Date(Option<NaiveDate>),
    Timestamp(DateTime<Utc>),
}

/// Ordered column -> value assignments for a partial update.
///
/// Columns absent from the patch are left untouched by the store. Column names come
/// from per-entity whitelists in `models`, never from caller input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Patch {
    fields: Vec<(&'static str, FieldValue)>,
}

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `column = value` when `value` is present.
    pub fn set_if<T>(&mut self, column: &'static str, value: Option<T>, wrap: impl FnOnce(T) -> FieldValue) {
        if let Some(v) = value {
            self.fields.retain(|(c, _)| *c != column);
            self.fields.push((column, wrap(v)));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[cfg(test)]
    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(c, _)| *c == column).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &FieldValue)> {
        self.fields.iter().map(|(c, v)| (*c, v))
    }
}
