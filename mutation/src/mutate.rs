//! The value mutation primitive shared by every generated method.
//!
//! `mutate_value` takes an existing value (possibly missing) and folds in a
//! replacement, a preparer, a constructor, nested attribute patches and
//! transforms, in that order. Attribute, item and whole-object methods are
//! all expressed in terms of it.

use crate::lifecycle;
use crate::ops::attr::{self, Write};
use std::rc::Rc;
use valobj_core::{
    Attrs, Call, Key, Maybe, Missing, MutationError, MutationResult, Present, Registry,
    Transform, TypeExpr, Value,
};

/// How to build a value when none exists.
#[derive(Clone)]
pub enum Constructor {
    /// Instantiate a value-object class from the accepted keyword arguments.
    Class {
        registry: Rc<Registry>,
        class: String,
    },
    /// Start from a fixed zero value (`0`, `""`, an empty collection).
    Value(Value),
}

impl Constructor {
    /// Constructor implied by a declared type, if it has one.
    pub fn for_type(registry: &Rc<Registry>, ty: &TypeExpr) -> Option<Constructor> {
        if let Some(class) = ty.value_object_class(true) {
            return Some(Constructor::Class {
                registry: registry.clone(),
                class: class.to_string(),
            });
        }
        ty.default_value().map(Constructor::Value)
    }

    /// Build a value, consuming the attrs the constructor accepts.
    fn build(&self, attrs: &mut Attrs) -> MutationResult<Value> {
        match self {
            Constructor::Value(value) => Ok(value.clone()),
            Constructor::Class { registry, class } => {
                let def = registry.require_class(class)?;
                let accepts_all = def.init_overflow_attr.is_some();
                let (used, rest): (Attrs, Attrs) = attrs.drain(..).partition(|(name, _)| {
                    accepts_all
                        || def.attr(name).is_some_and(|a| {
                            a.init && a.property.as_ref().map_or(true, |p| p.overridable)
                        })
                });
                *attrs = rest;
                let obj = lifecycle::instantiate(registry, class, used)?;
                Ok(Value::Object(obj))
            }
        }
    }
}

/// The pieces of a single value mutation.
pub struct ValueMutation<'a> {
    pub new: Maybe<Value>,
    /// Discard the old value even when no new one is given.
    pub replace: bool,
    /// Applied to a newly supplied value only.
    pub prepare: Option<&'a dyn Fn(Value) -> MutationResult<Value>>,
    pub constructor: Option<Constructor>,
    pub attrs: Attrs,
    pub transform: Option<Transform>,
    pub attr_transforms: Vec<(String, Transform)>,
    /// Qualified name used in error messages.
    pub context: &'a str,
}

impl<'a> ValueMutation<'a> {
    pub fn new(context: &'a str) -> Self {
        Self {
            new: Missing,
            replace: false,
            prepare: None,
            constructor: None,
            attrs: Attrs::new(),
            transform: None,
            attr_transforms: Vec::new(),
            context,
        }
    }

    /// Copy the value-level arguments of a call.
    pub fn from_call(call: Call, context: &'a str) -> Self {
        Self {
            new: call.value,
            replace: call.replace,
            attrs: call.attrs,
            transform: call.transform,
            attr_transforms: call.attr_transforms,
            ..Self::new(context)
        }
    }
}

/// Fold a mutation into `old`.
///
/// Steps, in order:
/// 1. take the new value (prepared), else the old value unless `replace`;
/// 2. construct a value if there is still none and a constructor exists;
/// 3. apply leftover `attrs` through the value's own `with_` methods;
/// 4. apply `transform`, then each of `attr_transforms`.
///
/// Values that did not come out of the constructor are copied before they
/// are patched, so the caller's old and new values are never modified.
pub fn mutate_value(old: Maybe<Value>, mutation: ValueMutation<'_>) -> MutationResult<Maybe<Value>> {
    let ValueMutation {
        new,
        replace,
        prepare,
        constructor,
        mut attrs,
        transform,
        attr_transforms,
        context,
    } = mutation;

    let mut owned = false;
    let mut value = match (new, replace) {
        (Present(v), _) => Present(match prepare {
            Some(prepare) => prepare(v)?,
            None => v,
        }),
        (Missing, false) => old,
        (Missing, true) => Missing,
    };

    if value.is_missing() {
        if let Some(constructor) = &constructor {
            value = Present(constructor.build(&mut attrs)?);
            owned = true;
        }
    }

    if !attrs.is_empty() {
        let Present(current) = value else {
            return Err(MutationError::missing_value(context));
        };
        value = Present(apply_attrs(current, attrs, owned, context)?);
        owned = true;
    }

    if let Some(transform) = transform {
        let Present(current) = value else {
            return Err(MutationError::missing_value(context));
        };
        value = Present(transform(current)?);
    }

    if !attr_transforms.is_empty() {
        let Present(current) = value else {
            return Err(MutationError::missing_value(context));
        };
        value = Present(apply_attr_transforms(current, attr_transforms, owned, context)?);
    }

    Ok(value)
}

fn apply_attrs(value: Value, attrs: Attrs, owned: bool, context: &str) -> MutationResult<Value> {
    match value {
        Value::Object(obj) => {
            let obj = if owned { obj } else { obj.deep_copy() };
            for (name, v) in attrs {
                attr::with_attr_mode(&obj, &name, Call::new().value(v), Write::Force)?;
            }
            Ok(Value::Object(obj))
        }
        Value::Map(mut map) => {
            for (name, v) in attrs {
                map.insert(Key::Str(name), v);
            }
            Ok(Value::Map(map))
        }
        _ => {
            let keyword = attrs.into_iter().next().map(|(k, _)| k).unwrap_or_default();
            Err(MutationError::invalid_keyword(context, keyword))
        }
    }
}

fn apply_attr_transforms(
    value: Value,
    transforms: Vec<(String, Transform)>,
    owned: bool,
    context: &str,
) -> MutationResult<Value> {
    match value {
        Value::Object(obj) => {
            let obj = if owned { obj } else { obj.deep_copy() };
            for (name, f) in transforms {
                let call = Call {
                    transform: Some(f),
                    ..Call::new()
                };
                attr::transform_attr_mode(&obj, &name, call, Write::Force)?;
            }
            Ok(Value::Object(obj))
        }
        Value::Map(mut map) => {
            for (name, f) in transforms {
                let key = Key::Str(name);
                let current = map
                    .remove(&key)
                    .ok_or_else(|| MutationError::key_not_found(context, key.to_string()))?;
                map.insert(key, f(current)?);
            }
            Ok(Value::Map(map))
        }
        _ => {
            let keyword = transforms.into_iter().next().map(|(k, _)| k).unwrap_or_default();
            Err(MutationError::invalid_keyword(context, keyword))
        }
    }
}
