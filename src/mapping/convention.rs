use serde::{Deserialize, Serialize};

/// Naming and sizing defaults applied to properties that do not configure them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Convention {
    pub string_length: u16,
    pub decimal_precision: u8,
    pub decimal_scale: u8,
    pub pluralize_table_names: bool,
    pub auto_generated_keys: bool,
}

impl Default for Convention {
    fn default() -> Self {
        Convention {
            string_length: 255,
            decimal_precision: 18,
            decimal_scale: 10,
            pluralize_table_names: true,
            auto_generated_keys: true,
        }
    }
}

impl Convention {
    pub fn table_for(&self, entity: &str) -> String {
        if self.pluralize_table_names {
            pluralize(entity)
        } else {
            entity.to_string()
        }
    }

    pub fn primary_key_of(&self, entity: &str) -> String {
        format!("{}Id", entity)
    }

    /// Database column backing a reference property (`Author` -> `AuthorId`).
    pub fn reference_column_for(&self, property: &str) -> String {
        format!("{}Id", property)
    }
}

/// English plural of a (PascalCase) entity name.
pub fn pluralize(word: &str) -> String {
    let lower = word.to_ascii_lowercase();
    let ends_with_consonant_y = lower.ends_with('y')
        && lower
            .chars()
            .rev()
            .nth(1)
            .is_some_and(|c| !"aeiou".contains(c));

    if ends_with_consonant_y {
        format!("{}ies", &word[..word.len() - 1])
    } else if ["s", "x", "z", "ch", "sh"].iter().any(|s| lower.ends_with(s)) {
        format!("{}es", word)
    } else {
        format!("{}s", word)
    }
}
