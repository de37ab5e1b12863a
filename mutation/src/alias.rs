//! Aliased attributes: values read from, and optionally written to, another
//! attribute path of the same instance.
//!
//! A path is a chain of attribute steps (`origin.x`) and string-keyed mapping
//! lookups (`meta["owner"]`). Passthrough writes rebuild every value on the
//! path, so nested objects are copied rather than shared with the receiver.

use crate::lifecycle;
use crate::ops::attr::{self, Write};
use tracing::warn;
use valobj_core::{
    Alias, AliasStep, AttrSpec, Call, ClassDef, Key, Maybe, Missing, MutationError,
    MutationResult, Object, Present, Value,
};

/// What a passthrough write does at the end of the path.
pub(crate) enum Leaf {
    Set(Value),
    Remove,
}

enum Step {
    Found(Value),
    Unset,
    Broken,
}

/// Read the aliased value.
///
/// An unset step yields the fallback, or `Missing` without one. A step that
/// does not fit the value it is applied to yields the fallback, or an error.
/// The transform applies to resolved values only.
pub(crate) fn resolve(obj: &Object, class: &ClassDef, spec: &AttrSpec, alias: &Alias) -> MutationResult<Maybe<Value>> {
    if alias.deprecated {
        warn!(attr = %spec.qualified(&class.name), path = %alias.path, "reading deprecated alias");
    }
    let mut current = Value::Object(obj.clone());
    for step in &alias.steps {
        match follow(&current, step)? {
            Step::Found(value) => current = value,
            Step::Unset if alias.fallback.is_none() => return Ok(Missing),
            Step::Broken if alias.fallback.is_none() => {
                return Err(MutationError::broken_alias(spec.qualified(&class.name), &alias.path));
            }
            Step::Unset | Step::Broken => {
                return Ok(alias.fallback.as_ref().map(Value::deep_copy).into());
            }
        }
    }
    match &alias.transform {
        Some(f) => f(current).map(Present),
        None => Ok(Present(current)),
    }
}

fn follow(value: &Value, step: &AliasStep) -> MutationResult<Step> {
    Ok(match (value, step) {
        (Value::Null, _) => Step::Unset,
        (Value::Object(obj), AliasStep::Attr(name)) => {
            let class = obj.class();
            match class.attr(name) {
                Some(spec) => match lifecycle::current_value(obj, &class, spec)? {
                    Present(value) => Step::Found(value),
                    Missing => Step::Unset,
                },
                None => Step::Broken,
            }
        }
        (Value::Map(map), AliasStep::Key(key)) => match map.get(&Key::Str(key.clone())) {
            Some(value) => Step::Found(value.clone()),
            None => Step::Unset,
        },
        _ => Step::Broken,
    })
}

/// Write `leaf` at the end of the alias path of `target`.
///
/// `target` is the write target already chosen by the caller, so the first
/// step is written to it directly.
pub(crate) fn write_through(
    target: &Object,
    class: &ClassDef,
    spec: &AttrSpec,
    alias: &Alias,
    leaf: Leaf,
) -> MutationResult<()> {
    let site = Site {
        qualified: spec.qualified(&class.name),
        alias,
    };
    if alias.deprecated {
        warn!(attr = %site.qualified, path = %alias.path, "writing deprecated alias");
    }
    write_object(&site, target, &alias.steps, leaf, Write::Force)?;
    Ok(())
}

struct Site<'a> {
    qualified: String,
    alias: &'a Alias,
}

impl Site<'_> {
    fn broken(&self) -> MutationError {
        MutationError::broken_alias(&self.qualified, &self.alias.path)
    }
}

fn write_object(
    site: &Site<'_>,
    obj: &Object,
    steps: &[AliasStep],
    leaf: Leaf,
    mode: Write,
) -> MutationResult<Object> {
    let Some((AliasStep::Attr(name), rest)) = steps.split_first() else {
        return Err(site.broken());
    };
    if rest.is_empty() {
        return match leaf {
            Leaf::Set(value) => attr::with_attr_mode(obj, name, Call::new().value(value), mode),
            Leaf::Remove => attr::reset_attr_mode(obj, name, mode),
        };
    }
    let current = lifecycle::get_attr(obj, name)?;
    let updated = write_value(site, current, rest, leaf)?;
    attr::with_attr_mode(obj, name, Call::new().value(updated), mode)
}

fn write_value(site: &Site<'_>, value: Value, steps: &[AliasStep], leaf: Leaf) -> MutationResult<Value> {
    match (value, steps) {
        (Value::Object(obj), [AliasStep::Attr(_), ..]) => {
            Ok(Value::Object(write_object(site, &obj, steps, leaf, Write::Copy)?))
        }
        (Value::Map(mut map), [AliasStep::Key(key), rest @ ..]) => {
            let slot = Key::Str(key.clone());
            match (leaf, rest) {
                (Leaf::Set(value), []) => {
                    map.insert(slot, value);
                }
                (Leaf::Remove, []) => {
                    map.remove(&slot)
                        .ok_or_else(|| MutationError::key_not_found(&site.qualified, key))?;
                }
                (leaf, rest) => {
                    let inner = map
                        .remove(&slot)
                        .ok_or_else(|| MutationError::key_not_found(&site.qualified, key))?;
                    map.insert(slot, write_value(site, inner, rest, leaf)?);
                }
            }
            Ok(Value::Map(map))
        }
        _ => Err(site.broken()),
    }
}
