use serde::Serialize;

use crate::query::Value;

/// Ordered bound parameters. Placeholders are `@p_1, @p_2, ...` in the order they
/// were added, which is the order they appear in the SQL text.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Parameters {
    values: Vec<Value>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `value` and returns its placeholder.
    pub fn add(&mut self, value: Value) -> String {
        self.values.push(value);
        placeholder(self.values.len())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Looks a value up by placeholder name (`@p_2` or `p_2`).
    pub fn get(&self, name: &str) -> Option<&Value> {
        let index: usize = name
            .trim_start_matches('@')
            .strip_prefix("p_")?
            .parse()
            .ok()?;
        index.checked_sub(1).and_then(|i| self.values.get(i))
    }

    /// `(placeholder, value)` pairs in emission order.
    pub fn iter(&self) -> impl Iterator<Item = (String, &Value)> {
        self.values
            .iter()
            .enumerate()
            .map(|(i, value)| (placeholder(i + 1), value))
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

fn placeholder(position: usize) -> String {
    format!("@p_{}", position)
}
