//! Value types for value-object attributes.
//!
//! Values are the data stored in object attribute slots. Scalars (Null, Bool,
//! Int, Float, Str), the three collection families (List, Map, Set) and
//! nested value-objects are supported.

use crate::object::{CopyMemo, Object};
use std::collections::BTreeMap;
use std::fmt;

/// An attribute value, or an element of one.
#[derive(Debug, Clone)]
pub enum Value {
    /// Explicit null.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer; also satisfies `Float` types.
    Int(i64),
    /// Float, not hashable.
    Float(f64),
    /// UTF-8 string.
    Str(String),
    /// Ordered sequence of values.
    List(Vec<Value>),
    /// Mapping from hashable keys to values.
    Map(ValueMap),
    /// Set of values, identified by their identity key.
    Set(ValueSet),
    /// Nested value-object (a shared handle).
    Object(Object),
}

/// Mapping storage.
pub type ValueMap = BTreeMap<Key, Value>;

/// Keyword arguments, in call order.
pub type Attrs = Vec<(String, Value)>;

impl Value {
    /// Explicit null, as opposed to a missing value.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns true if this is a nested value-object.
    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as float; integers widen.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&ValueMap> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_set(&self) -> Option<&ValueSet> {
        match self {
            Value::Set(set) => Some(set),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Short label used in type-mismatch messages.
    pub fn type_name(&self) -> String {
        match self {
            Value::Null => "null".into(),
            Value::Bool(_) => "bool".into(),
            Value::Int(_) => "int".into(),
            Value::Float(_) => "float".into(),
            Value::Str(_) => "str".into(),
            Value::List(_) => "list".into(),
            Value::Map(_) => "map".into(),
            Value::Set(_) => "set".into(),
            Value::Object(obj) => obj.class_name(),
        }
    }

    /// The key identifying this value inside a set or as a mapping key.
    ///
    /// Scalars (other than floats) are their own key. A value-object is
    /// identified by the value of its class's key attribute, if it has one.
    pub fn identity_key(&self) -> Option<Key> {
        match self {
            Value::Object(obj) => obj.key_value().and_then(|k| Key::from_value(&k)),
            other => Key::from_value(other),
        }
    }

    /// Independent copy: nested objects are copied rather than shared.
    pub fn deep_copy(&self) -> Value {
        self.deep_copy_with(&mut CopyMemo::default())
    }

    pub(crate) fn deep_copy_with(&self, memo: &mut CopyMemo) -> Value {
        match self {
            Value::List(items) => Value::List(items.iter().map(|v| v.deep_copy_with(memo)).collect()),
            Value::Map(map) => Value::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.deep_copy_with(memo)))
                    .collect(),
            ),
            Value::Set(set) => Value::Set(ValueSet {
                items: set
                    .items
                    .iter()
                    .map(|(k, v)| (k.clone(), v.deep_copy_with(memo)))
                    .collect(),
            }),
            Value::Object(obj) => Value::Object(obj.deep_copy_with(memo)),
            scalar => scalar.clone(),
        }
    }

    /// Build a list value from anything convertible.
    pub fn list<T: Into<Value>>(items: impl IntoIterator<Item = T>) -> Value {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    /// Build a map value from key/value pairs.
    pub fn map<K: Into<Key>, V: Into<Value>>(entries: impl IntoIterator<Item = (K, V)>) -> Value {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Build a set value. Unhashable items are rejected and returned.
    pub fn set<T: Into<Value>>(items: impl IntoIterator<Item = T>) -> Result<Value, Value> {
        ValueSet::from_values(items.into_iter().map(Into::into)).map(Value::Set)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => (*a as f64) == *b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Set(a), Value::Set(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(fl) => write!(f, "{:?}", fl),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Map(map) => {
                write!(f, "{{")?;
                for (i, (key, item)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, item)?;
                }
                write!(f, "}}")
            }
            Value::Set(set) => {
                if set.is_empty() {
                    return write!(f, "set()");
                }
                write!(f, "{{")?;
                for (i, item) in set.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "}}")
            }
            Value::Object(obj) => write!(f, "{}", obj),
        }
    }
}

// ==================== Keys ====================

/// A hashable, ordered scalar used as a mapping key or set identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
}

impl Key {
    /// Convert a scalar value into a key. Floats and containers have no key.
    pub fn from_value(value: &Value) -> Option<Key> {
        match value {
            Value::Null => Some(Key::Null),
            Value::Bool(b) => Some(Key::Bool(*b)),
            Value::Int(i) => Some(Key::Int(*i)),
            Value::Str(s) => Some(Key::Str(s.clone())),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Key::Null => Value::Null,
            Key::Bool(b) => Value::Bool(*b),
            Key::Int(i) => Value::Int(*i),
            Key::Str(s) => Value::Str(s.clone()),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.to_value().fmt(f)
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Str(s.to_string())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Str(s)
    }
}

impl From<i64> for Key {
    fn from(i: i64) -> Self {
        Key::Int(i)
    }
}

impl From<bool> for Key {
    fn from(b: bool) -> Self {
        Key::Bool(b)
    }
}

// ==================== Sets ====================

/// A set of values, each stored under its identity key.
///
/// For keyed value-objects the identity is the key attribute, so two objects
/// with the same key cannot both be members.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueSet {
    items: BTreeMap<Key, Value>,
}

impl ValueSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect values into a set; the first unhashable value is returned as the error.
    pub fn from_values(values: impl IntoIterator<Item = Value>) -> Result<Self, Value> {
        let mut set = ValueSet::new();
        for value in values {
            set.insert(value)?;
        }
        Ok(set)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Insert a value, returning the member it displaced (if any).
    pub fn insert(&mut self, value: Value) -> Result<Option<Value>, Value> {
        match value.identity_key() {
            Some(key) => Ok(self.items.insert(key, value)),
            None => Err(value),
        }
    }

    pub fn get(&self, key: &Key) -> Option<&Value> {
        self.items.get(key)
    }

    pub fn contains_key(&self, key: &Key) -> bool {
        self.items.contains_key(key)
    }

    /// Membership by value: the identity key must match and the member must be equal.
    pub fn contains(&self, value: &Value) -> bool {
        value
            .identity_key()
            .and_then(|key| self.items.get(&key))
            .is_some_and(|member| member == value)
    }

    pub fn remove(&mut self, key: &Key) -> Option<Value> {
        self.items.remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.items.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.items.keys()
    }
}

impl IntoIterator for ValueSet {
    type Item = Value;
    type IntoIter = std::collections::btree_map::IntoValues<Key, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_values()
    }
}

// ==================== Conversions ====================

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<ValueMap> for Value {
    fn from(map: ValueMap) -> Self {
        Value::Map(map)
    }
}

impl From<ValueSet> for Value {
    fn from(set: ValueSet) -> Self {
        Value::Set(set)
    }
}

impl From<Object> for Value {
    fn from(obj: Object) -> Self {
        Value::Object(obj)
    }
}

impl From<Key> for Value {
    fn from(key: Key) -> Self {
        key.to_value()
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}

/// Helper macro to build keyword-argument lists.
#[macro_export]
macro_rules! attrs {
    () => {
        $crate::Attrs::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {
        {
            let mut attrs = $crate::Attrs::new();
            $(
                attrs.push(($key.to_string(), $crate::Value::from($value)));
            )+
            attrs
        }
    };
}
