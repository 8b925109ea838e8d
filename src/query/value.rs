use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use uuid::Uuid;

/// A literal or bound parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Exact decimal kept in its textual form
    Decimal(String),
    Text(String),
    Guid(Uuid),
    DateTime(NaiveDateTime),
    Bytes(Vec<u8>),
    /// An entity used as a value: references compare and store its primary key
    Entity(Box<Record>),
    Collection(Vec<Record>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Entity(record) => Some(record),
            _ => None,
        }
    }

    /// SQL-style comparison: `None` when either side is null or the kinds differ.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Int(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
            (Value::Float(a), Value::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Value::Decimal(a), Value::Decimal(b)) => {
                let (a, b) = (a.parse::<f64>().ok()?, b.parse::<f64>().ok()?);
                a.partial_cmp(&b)
            }
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            (Value::Guid(a), Value::Guid(b)) => Some(a.cmp(b)),
            (Value::DateTime(a), Value::DateTime(b)) => Some(a.cmp(b)),
            (Value::Bytes(a), Value::Bytes(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Stable textual identity, used to group rows by key.
    pub fn identity_key(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{:?}", self))
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v.into())
                }
            }
        )*
    };
}

value_from! {
    bool => Bool,
    i16 => Int,
    i32 => Int,
    i64 => Int,
    u8 => Int,
    u16 => Int,
    u32 => Int,
    f32 => Float,
    f64 => Float,
    String => Text,
    Uuid => Guid,
    NaiveDateTime => DateTime,
    Vec<u8> => Bytes,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<Record> for Value {
    fn from(v: Record) -> Self {
        Value::Entity(Box::new(v))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// What the writers need from an entity instance.
pub trait Entity {
    /// Name of the mapped entity type.
    fn entity_name(&self) -> &str;

    /// Current value of a property, `None` when it was never set.
    fn value(&self, property: &str) -> Option<Value>;

    /// Assigns a property; used to write generated keys back after an insert.
    fn set_value(&mut self, property: &str, value: Value);
}

/// Dynamic entity instance: an entity name plus property values in insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub entity: String,
    values: Vec<(String, Value)>,
}

impl Record {
    pub fn new(entity: impl Into<String>) -> Self {
        Record {
            entity: entity.into(),
            values: Vec::new(),
        }
    }

    pub fn with(mut self, property: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(property, value);
        self
    }

    pub fn set(&mut self, property: impl Into<String>, value: impl Into<Value>) {
        let property = property.into();
        let value = value.into();
        match self.values.iter_mut().find(|(name, _)| *name == property) {
            Some(slot) => slot.1 = value,
            None => self.values.push((property, value)),
        }
    }

    pub fn get(&self, property: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(name, _)| name == property)
            .map(|(_, value)| value)
    }

    /// The referenced record of a fetched or stubbed reference property.
    pub fn reference(&self, property: &str) -> Option<&Record> {
        self.get(property).and_then(Value::as_record)
    }

    /// The children of a fetched collection property.
    pub fn collection(&self, property: &str) -> Option<&[Record]> {
        match self.get(property) {
            Some(Value::Collection(items)) => Some(items),
            _ => None,
        }
    }

    pub fn values(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl Entity for Record {
    fn entity_name(&self) -> &str {
        &self.entity
    }

    fn value(&self, property: &str) -> Option<Value> {
        self.get(property).cloned()
    }

    fn set_value(&mut self, property: &str, value: Value) {
        self.set(property, value);
    }
}
