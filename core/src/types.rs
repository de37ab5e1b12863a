//! Type expressions for declared attributes.
//!
//! A `TypeExpr` is the runtime schema of an attribute's type. The mutation
//! engine inspects it to decide which operations apply (scalar vs. one of
//! the three collection families), what the item type is, whether a nested
//! value-object class is involved, and whether a candidate value fits.

use crate::error::{SchemaError, SchemaResult};
use crate::value::{Key, Value};
use regex_lite::Regex;
use std::fmt;
use std::sync::Arc;

/// The collection family a type belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    Sequence,
    Mapping,
    Set,
}

/// A declared attribute type.
#[derive(Debug, Clone)]
pub enum TypeExpr {
    /// Accepts anything.
    Any,
    Null,
    Bool,
    Int,
    /// Accepts ints as well (numeric tower).
    Float,
    Str,
    /// One of a fixed set of values.
    Literal(Vec<Value>),
    List(Box<TypeExpr>),
    Map(Box<TypeExpr>, Box<TypeExpr>),
    Set(Box<TypeExpr>),
    Union(Vec<TypeExpr>),
    /// A value-object class, matched by name through its ancestry.
    Class(String),
    /// A string-keyed map with a fixed set of required/optional fields.
    Record(Vec<RecordField>),
    /// A base type narrowed by a predicate.
    Validated(Validated),
}

/// A field of a record type.
#[derive(Debug, Clone)]
pub struct RecordField {
    pub name: String,
    pub ty: TypeExpr,
    pub required: bool,
}

impl RecordField {
    pub fn required(name: impl Into<String>, ty: TypeExpr) -> Self {
        Self {
            name: name.into(),
            ty,
            required: true,
        }
    }

    pub fn optional(name: impl Into<String>, ty: TypeExpr) -> Self {
        Self {
            name: name.into(),
            ty,
            required: false,
        }
    }
}

/// Predicate used by validated types.
pub type Validator = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// A named base type with an extra predicate.
#[derive(Clone)]
pub struct Validated {
    pub name: String,
    pub base: Box<TypeExpr>,
    validator: Validator,
}

impl fmt::Debug for Validated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validated")
            .field("name", &self.name)
            .field("base", &self.base)
            .finish_non_exhaustive()
    }
}

/// Numeric bounds for `TypeExpr::bounded`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    lower: Option<(f64, bool)>,
    upper: Option<(f64, bool)>,
}

impl Bounds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ge(mut self, bound: f64) -> Self {
        self.lower = Some((bound, true));
        self
    }

    pub fn gt(mut self, bound: f64) -> Self {
        self.lower = Some((bound, false));
        self
    }

    pub fn le(mut self, bound: f64) -> Self {
        self.upper = Some((bound, true));
        self
    }

    pub fn lt(mut self, bound: f64) -> Self {
        self.upper = Some((bound, false));
        self
    }

    fn contains(&self, x: f64) -> bool {
        let above = match self.lower {
            Some((b, true)) => x >= b,
            Some((b, false)) => x > b,
            None => true,
        };
        let below = match self.upper {
            Some((b, true)) => x <= b,
            Some((b, false)) => x < b,
            None => true,
        };
        above && below
    }

    fn label(&self) -> String {
        let lower = match self.lower {
            Some((b, true)) => format!("[{}", b),
            Some((b, false)) => format!("({}", b),
            None => "(-∞".to_string(),
        };
        let upper = match self.upper {
            Some((b, true)) => format!("{}]", b),
            Some((b, false)) => format!("{})", b),
            None => "∞)".to_string(),
        };
        format!("{}, {}", lower, upper)
    }
}

impl TypeExpr {
    // ==================== Constructors ====================

    pub fn list(item: TypeExpr) -> Self {
        TypeExpr::List(Box::new(item))
    }

    pub fn map(key: TypeExpr, value: TypeExpr) -> Self {
        TypeExpr::Map(Box::new(key), Box::new(value))
    }

    pub fn set(item: TypeExpr) -> Self {
        TypeExpr::Set(Box::new(item))
    }

    pub fn class(name: impl Into<String>) -> Self {
        TypeExpr::Class(name.into())
    }

    /// `T | null`.
    pub fn optional(inner: TypeExpr) -> Self {
        TypeExpr::Union(vec![inner, TypeExpr::Null])
    }

    pub fn union(arms: impl IntoIterator<Item = TypeExpr>) -> Self {
        TypeExpr::Union(arms.into_iter().collect())
    }

    pub fn literal<T: Into<Value>>(values: impl IntoIterator<Item = T>) -> Self {
        TypeExpr::Literal(values.into_iter().map(Into::into).collect())
    }

    pub fn record(fields: impl IntoIterator<Item = RecordField>) -> Self {
        TypeExpr::Record(fields.into_iter().collect())
    }

    /// Narrow `base` by an arbitrary predicate.
    pub fn validated(
        name: impl Into<String>,
        base: TypeExpr,
        validator: impl Fn(&Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        TypeExpr::Validated(Validated {
            name: name.into(),
            base: Box::new(base),
            validator: Arc::new(validator),
        })
    }

    /// Numeric type restricted to a range, labelled e.g. `int∊[0, 10)`.
    pub fn bounded(base: TypeExpr, bounds: Bounds) -> Self {
        let name = format!("{}∊{}", base.label(), bounds.label());
        TypeExpr::validated(name, base, move |v| {
            v.as_float().is_some_and(|x| bounds.contains(x))
        })
    }

    /// String type whose values must fully match `pattern`.
    pub fn matching(pattern: &str) -> SchemaResult<Self> {
        let anchored = format!("^(?:{})$", pattern);
        let regex = Regex::new(&anchored).map_err(|e| SchemaError::InvalidPattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;
        let name = format!("str∊/{}/", pattern);
        Ok(TypeExpr::validated(name, TypeExpr::Str, move |v| {
            v.as_str().is_some_and(|s| regex.is_match(s))
        }))
    }

    // ==================== Classification ====================

    /// Which collection family this type denotes, if any.
    pub fn collection_kind(&self) -> Option<CollectionKind> {
        match self {
            TypeExpr::List(_) => Some(CollectionKind::Sequence),
            TypeExpr::Map(_, _) => Some(CollectionKind::Mapping),
            TypeExpr::Set(_) => Some(CollectionKind::Set),
            _ => None,
        }
    }

    /// Item type of a collection; `Any` for everything else.
    pub fn item_type(&self) -> TypeExpr {
        match self {
            TypeExpr::List(item) | TypeExpr::Set(item) => (**item).clone(),
            TypeExpr::Map(_, value) => (**value).clone(),
            _ => TypeExpr::Any,
        }
    }

    /// Key type of a mapping; `Any` for everything else.
    pub fn mapping_key_type(&self) -> TypeExpr {
        match self {
            TypeExpr::Map(key, _) => (**key).clone(),
            _ => TypeExpr::Any,
        }
    }

    /// The nested value-object class named by this type.
    ///
    /// With `allow_polymorphic`, a union with exactly one class arm also
    /// counts. Zero or several matches yield `None`.
    pub fn value_object_class(&self, allow_polymorphic: bool) -> Option<&str> {
        match self {
            TypeExpr::Class(name) => Some(name),
            TypeExpr::Union(arms) if allow_polymorphic => {
                let mut classes = arms.iter().filter_map(|arm| match arm {
                    TypeExpr::Class(name) => Some(name.as_str()),
                    _ => None,
                });
                match (classes.next(), classes.next()) {
                    (Some(name), None) => Some(name),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// True for integer-valued types, which are ambiguous as sequence keys.
    pub fn is_integral(&self) -> bool {
        match self {
            TypeExpr::Int => true,
            TypeExpr::Literal(values) => {
                !values.is_empty() && values.iter().all(|v| matches!(v, Value::Int(_)))
            }
            TypeExpr::Validated(v) => v.base.is_integral(),
            _ => false,
        }
    }

    /// True when every value of this type converts to a `Key`.
    pub fn is_hashable_scalar(&self) -> bool {
        match self {
            TypeExpr::Null | TypeExpr::Bool | TypeExpr::Int | TypeExpr::Str => true,
            TypeExpr::Literal(values) => values.iter().all(|v| Key::from_value(v).is_some()),
            TypeExpr::Union(arms) => arms.iter().all(TypeExpr::is_hashable_scalar),
            TypeExpr::Validated(v) => v.base.is_hashable_scalar(),
            _ => false,
        }
    }

    /// Value used when a value of this type is needed but none exists.
    pub fn default_value(&self) -> Option<Value> {
        match self {
            TypeExpr::Bool => Some(Value::Bool(false)),
            TypeExpr::Int => Some(Value::Int(0)),
            TypeExpr::Float => Some(Value::Float(0.0)),
            TypeExpr::Str => Some(Value::Str(String::new())),
            TypeExpr::List(_) => Some(Value::List(Vec::new())),
            TypeExpr::Map(_, _) => Some(Value::Map(Default::default())),
            TypeExpr::Set(_) => Some(Value::Set(Default::default())),
            _ => None,
        }
    }

    // ==================== Checking ====================

    /// Recursively check a value against this type.
    pub fn check(&self, value: &Value) -> bool {
        match (self, value) {
            (TypeExpr::Any, _) => true,
            (TypeExpr::Null, Value::Null) => true,
            (TypeExpr::Bool, Value::Bool(_)) => true,
            (TypeExpr::Int, Value::Int(_)) => true,
            (TypeExpr::Float, Value::Float(_) | Value::Int(_)) => true,
            (TypeExpr::Str, Value::Str(_)) => true,
            (TypeExpr::Literal(options), v) => options.iter().any(|o| literal_eq(o, v)),
            (TypeExpr::List(item), Value::List(items)) => items.iter().all(|v| item.check(v)),
            (TypeExpr::Set(item), Value::Set(set)) => set.iter().all(|v| item.check(v)),
            (TypeExpr::Map(key, item), Value::Map(map)) => map
                .iter()
                .all(|(k, v)| key.check(&k.to_value()) && item.check(v)),
            (TypeExpr::Union(arms), v) => arms.iter().any(|arm| arm.check(v)),
            (TypeExpr::Class(name), Value::Object(obj)) => obj.is_instance_of(name),
            (TypeExpr::Record(fields), Value::Map(map)) => check_record(fields, map),
            (TypeExpr::Validated(v), value) => v.base.check(value) && (v.validator)(value),
            _ => false,
        }
    }

    /// Human readable label used in error messages.
    pub fn label(&self) -> String {
        match self {
            TypeExpr::Any => "any".into(),
            TypeExpr::Null => "null".into(),
            TypeExpr::Bool => "bool".into(),
            TypeExpr::Int => "int".into(),
            TypeExpr::Float => "float".into(),
            TypeExpr::Str => "str".into(),
            TypeExpr::Literal(values) => {
                let items: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                format!("literal[{}]", items.join(", "))
            }
            TypeExpr::List(item) => format!("list[{}]", item.label()),
            TypeExpr::Map(key, value) => format!("map[{}, {}]", key.label(), value.label()),
            TypeExpr::Set(item) => format!("set[{}]", item.label()),
            TypeExpr::Union(arms) => {
                let labels: Vec<String> = arms.iter().map(TypeExpr::label).collect();
                labels.join(" | ")
            }
            TypeExpr::Class(name) => name.clone(),
            TypeExpr::Record(fields) => {
                let labels: Vec<String> = fields
                    .iter()
                    .map(|f| {
                        let marker = if f.required { "" } else { "?" };
                        format!("{}{}: {}", f.name, marker, f.ty.label())
                    })
                    .collect();
                format!("{{{}}}", labels.join(", "))
            }
            TypeExpr::Validated(v) => v.name.clone(),
        }
    }

    /// Visit every class name referenced by this type.
    pub fn referenced_classes(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_classes(&mut out);
        out
    }

    fn collect_classes<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            TypeExpr::Class(name) => out.push(name),
            TypeExpr::List(t) | TypeExpr::Set(t) => t.collect_classes(out),
            TypeExpr::Map(k, v) => {
                k.collect_classes(out);
                v.collect_classes(out);
            }
            TypeExpr::Union(arms) => arms.iter().for_each(|a| a.collect_classes(out)),
            TypeExpr::Record(fields) => fields.iter().for_each(|f| f.ty.collect_classes(out)),
            TypeExpr::Validated(v) => v.base.collect_classes(out),
            _ => {}
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Literal matching is exact: `1` does not match `true` or `1.0`.
fn literal_eq(option: &Value, value: &Value) -> bool {
    match (option, value) {
        (Value::Int(a), Value::Int(b)) => a == b,
        (Value::Float(a), Value::Float(b)) => a == b,
        (Value::Int(_), _) | (_, Value::Int(_)) => false,
        (a, b) => a == b,
    }
}

fn check_record(fields: &[RecordField], map: &crate::value::ValueMap) -> bool {
    for (key, _) in map.iter() {
        let known = matches!(key, Key::Str(s) if fields.iter().any(|f| &f.name == s));
        if !known {
            return false;
        }
    }
    fields.iter().all(|field| match map.get(&Key::Str(field.name.clone())) {
        Some(v) => field.ty.check(v),
        None => !field.required,
    })
}
