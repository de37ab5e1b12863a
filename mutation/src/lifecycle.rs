//! Instance lifecycle: construction, attribute access, and invalidation.

use crate::alias::{self, Leaf};
use crate::mutate::ValueMutation;
use crate::ops::attr::{self, Write};
use crate::validation;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::{debug, trace};
use valobj_core::{
    AttrSpec, Attrs, Call, ClassDef, Key, Maybe, Missing, MutationError, MutationResult, Object,
    Present, Registry, Value, ValueMap,
};

// ==================== Construction ====================

/// Construct an instance of `class` from keyword arguments.
///
/// Attributes are populated base class first, each from its keyword or its
/// default, through the same preparation and type checks as `with_`.
/// Unrecognised keywords go to the overflow attribute when the class has
/// one. The post-init hook runs last, while the instance is still mutable.
pub fn instantiate(registry: &Rc<Registry>, class: &str, kwargs: Attrs) -> MutationResult<Object> {
    let obj = Object::blank(registry, class)?;
    let def = obj.class();
    let overflow_attr = def.init_overflow_attr.as_deref();

    let mut provided: HashMap<String, Value> = HashMap::new();
    let mut overflow = ValueMap::new();
    for (name, value) in kwargs {
        let accepted = Some(name.as_str()) != overflow_attr
            && def.attr(&name).is_some_and(|a| {
                a.init && a.property.as_ref().map_or(true, |p| p.overridable)
            });
        if accepted {
            provided.insert(name, value);
        } else if overflow_attr.is_some() {
            overflow.insert(Key::Str(name), value);
        } else {
            return Err(MutationError::invalid_keyword(format!("{}()", def.name), name));
        }
    }

    for spec in def.attrs() {
        if Some(spec.name.as_str()) == overflow_attr {
            continue;
        }
        let value = match provided.remove(&spec.name) {
            Some(value) => Present(value),
            None if spec.is_computed() || spec.is_alias() => Missing,
            None => spec.default_value(),
        };
        if let Present(value) = value {
            populate(&obj, &def, spec, value)?;
        }
    }

    if let Some(name) = overflow_attr {
        let spec = validation::require_attr(&def, name)?;
        let mut extra = match spec.default_value() {
            Present(Value::Map(map)) => map,
            _ => ValueMap::new(),
        };
        extra.extend(overflow);
        obj.set_slot(name, Value::Map(extra));
    }

    if let Some(hook) = def.post_init() {
        hook(&obj)?;
    }
    obj.set_initializing(false);
    trace!(class = %def.name, "instantiated");
    Ok(obj)
}

/// Prepare, check, and store one attribute value.
fn populate(obj: &Object, class: &ClassDef, spec: &AttrSpec, value: Value) -> MutationResult<()> {
    if !spec.managed {
        obj.set_slot(&spec.name, value);
        return Ok(());
    }
    let context = spec.qualified(&class.name);
    let mut mutation = ValueMutation::new(&context);
    mutation.new = Present(value);
    if let Present(value) = attr::prepare_attr_value(obj, class, spec, Missing, mutation)? {
        validation::check_value(class, spec, &value)?;
        obj.set_slot(&spec.name, value);
    }
    Ok(())
}

// ==================== Access ====================

/// Read an attribute, computing it if it is a computed attribute.
pub fn get_attr(obj: &Object, name: &str) -> MutationResult<Value> {
    let class = obj.class();
    let spec = validation::require_attr(&class, name)?;
    match current_value(obj, &class, spec)? {
        Present(value) => Ok(value),
        Missing => Err(MutationError::unassigned(&class.name, name)),
    }
}

/// The current value of an attribute, or `Missing` if it is unassigned.
///
/// A stored value wins over both a getter and an alias path.
pub(crate) fn current_value(
    obj: &Object,
    class: &ClassDef,
    spec: &AttrSpec,
) -> MutationResult<Maybe<Value>> {
    if let Some(value) = obj.slot(&spec.name) {
        return Ok(Present(value));
    }
    if let Some(link) = &spec.alias {
        let value = alias::resolve(obj, class, spec, link)?;
        if let Present(value) = &value {
            validation::check_value(class, spec, value)?;
        }
        return Ok(value);
    }
    let Some(property) = &spec.property else {
        return Ok(Missing);
    };

    let raw = (property.getter)(obj)?;
    let context = spec.qualified(&class.name);
    let mut mutation = ValueMutation::new(&context);
    mutation.new = Present(raw);
    let value = attr::prepare_attr_value(obj, class, spec, Missing, mutation)?;
    if let Present(value) = &value {
        validation::check_value(class, spec, value)?;
        if property.cache {
            obj.set_slot(&spec.name, value.clone());
        }
    }
    Ok(value)
}

/// Assign an attribute in place (`obj.attr = value`).
pub fn set_attr(obj: &Object, name: &str, value: Value) -> MutationResult<()> {
    attr::with_attr_mode(obj, name, Call::new().value(value), Write::Inplace)?;
    Ok(())
}

/// Delete an attribute in place, restoring its default if it has one.
pub fn delete_attr(obj: &Object, name: &str) -> MutationResult<()> {
    attr::reset_attr_mode(obj, name, Write::Inplace)?;
    Ok(())
}

// ==================== Defaults and invalidation ====================

/// Store a prepared value, or forward it along a passthrough alias.
pub(crate) fn store(target: &Object, class: &ClassDef, spec: &AttrSpec, value: Value) -> MutationResult<()> {
    match &spec.alias {
        Some(link) if link.passthrough => {
            alias::write_through(target, class, spec, link, Leaf::Set(value))
        }
        _ => {
            target.set_slot(&spec.name, value);
            Ok(())
        }
    }
}

/// Clear an attribute and repopulate it from its default.
///
/// Computed attributes and aliases are only cleared, so their getter or
/// path is read again.
pub(crate) fn restore_default(obj: &Object, class: &ClassDef, spec: &AttrSpec) -> MutationResult<()> {
    obj.clear_slot(&spec.name);
    if spec.is_computed() || spec.is_alias() {
        return Ok(());
    }
    if let Present(value) = spec.default_value() {
        populate(obj, class, spec, value)?;
    }
    Ok(())
}

/// Reset every attribute invalidated by a change to `attr`.
///
/// Skipped while the instance is being constructed. Invalidation does not
/// cascade: resetting a dependent does not reset its own dependents.
pub(crate) fn invalidate(obj: &Object, class: &ClassDef, attr: &str) -> MutationResult<()> {
    if obj.is_initializing() {
        return Ok(());
    }
    for dependent in class.dependents_of(attr) {
        let Some(spec) = class.attr(dependent) else {
            continue;
        };
        debug!(class = %class.name, trigger = attr, dependent, "invalidating attribute");
        restore_default(obj, class, spec)?;
    }
    Ok(())
}
