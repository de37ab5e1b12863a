//! Attribute-level operations: `with_<a>`, `update_<a>`, `transform_<a>`, `reset_<a>`.

use crate::alias::{self, Leaf};
use crate::collections;
use crate::lifecycle;
use crate::mutate::{mutate_value, Constructor, ValueMutation};
use crate::validation;
use tracing::trace;
use valobj_core::{
    AttrSpec, Call, ClassDef, Maybe, Missing, MutationError, MutationResult, Object, Present,
    Value,
};

/// Where a mutation is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Write {
    /// A deep copy of the receiver (copy-on-write).
    Copy,
    /// The receiver itself; rejected on frozen instances.
    Inplace,
    /// The receiver itself, which is a private copy owned by the caller.
    Force,
}

impl Write {
    pub(crate) fn of(call: &Call) -> Self {
        if call.inplace {
            Write::Inplace
        } else {
            Write::Copy
        }
    }
}

/// The object a mutation of `attr` is written to.
pub(crate) fn write_target(obj: &Object, attr: &str, mode: Write) -> MutationResult<Object> {
    match mode {
        Write::Copy => Ok(obj.deep_copy()),
        Write::Inplace => {
            obj.ensure_mutable(attr)?;
            Ok(obj.clone())
        }
        Write::Force => Ok(obj.clone()),
    }
}

// ==================== Public operations ====================

/// `with_<a>`: set or patch an attribute.
pub fn with_attr(obj: &Object, name: &str, call: Call) -> MutationResult<Object> {
    if !call.when {
        return Ok(obj.clone());
    }
    let mode = Write::of(&call);
    with_attr_mode(obj, name, call, mode)
}

/// `update_<a>`: like `with_<a>`, but the attribute must already be set.
pub fn update_attr(obj: &Object, name: &str, call: Call) -> MutationResult<Object> {
    if !call.when {
        return Ok(obj.clone());
    }
    let mode = Write::of(&call);
    set_attr_value(obj, name, call, mode, true)
}

/// `transform_<a>`: replace an attribute with a function of its current value.
pub fn transform_attr(obj: &Object, name: &str, call: Call) -> MutationResult<Object> {
    if !call.when {
        return Ok(obj.clone());
    }
    let mode = Write::of(&call);
    transform_attr_mode(obj, name, call, mode)
}

/// `reset_<a>`: restore an attribute to its default, or unset it.
pub fn reset_attr(obj: &Object, name: &str, call: Call) -> MutationResult<Object> {
    if !call.when {
        return Ok(obj.clone());
    }
    reset_attr_mode(obj, name, Write::of(&call))
}

// ==================== Mode-aware implementations ====================

pub(crate) fn with_attr_mode(obj: &Object, name: &str, call: Call, mode: Write) -> MutationResult<Object> {
    set_attr_value(obj, name, call, mode, false)
}

fn set_attr_value(
    obj: &Object,
    name: &str,
    call: Call,
    mode: Write,
    require_existing: bool,
) -> MutationResult<Object> {
    let class = obj.class();
    let attr = validation::require_attr(&class, name)?;
    validation::ensure_writable(&class, attr)?;
    let method = if require_existing { "update_" } else { "with_" };
    trace!(class = %class.name, attr = name, method, ?mode, "attribute mutation");

    if !attr.managed {
        let Present(value) = call.value else {
            return Err(MutationError::missing_argument(format!("{}{}", method, name), "value"));
        };
        if require_existing && !obj.has_slot(name) {
            return Err(MutationError::unassigned(&class.name, name));
        }
        let target = write_target(obj, name, mode)?;
        target.set_slot(name, value);
        lifecycle::invalidate(&target, &class, name)?;
        return Ok(target);
    }

    validation::check_nested_keywords(
        &obj.registry(),
        &format!("{}{}", method, name),
        &attr.ty,
        call.attrs.iter().map(|(k, _)| k.as_str()),
    )?;
    let old = lifecycle::current_value(obj, &class, attr)?;
    if require_existing && old.is_missing() {
        return Err(MutationError::unassigned(&class.name, name));
    }
    let context = attr.qualified(&class.name);
    let mutation = ValueMutation {
        new: call.value,
        replace: call.replace,
        attrs: call.attrs,
        ..ValueMutation::new(&context)
    };
    let value = prepare_attr_value(obj, &class, attr, old, mutation)?;
    assign(obj, &class, attr, value, mode)
}

pub(crate) fn transform_attr_mode(
    obj: &Object,
    name: &str,
    call: Call,
    mode: Write,
) -> MutationResult<Object> {
    let class = obj.class();
    let attr = validation::require_attr(&class, name)?;
    validation::ensure_writable(&class, attr)?;
    trace!(class = %class.name, attr = name, ?mode, "attribute transform");

    if !attr.managed {
        let current = obj
            .slot(name)
            .ok_or_else(|| MutationError::unassigned(&class.name, name))?;
        let value = match &call.transform {
            Some(f) => f(current)?,
            None => current,
        };
        let target = write_target(obj, name, mode)?;
        target.set_slot(name, value);
        lifecycle::invalidate(&target, &class, name)?;
        return Ok(target);
    }

    validation::check_nested_keywords(
        &obj.registry(),
        &format!("transform_{}", name),
        &attr.ty,
        call.attr_transforms.iter().map(|(k, _)| k.as_str()),
    )?;
    let old = lifecycle::current_value(obj, &class, attr)?;
    let context = attr.qualified(&class.name);
    let mutation = ValueMutation {
        transform: call.transform,
        attr_transforms: call.attr_transforms,
        ..ValueMutation::new(&context)
    };
    let value = prepare_attr_value(obj, &class, attr, old, mutation)?;
    assign(obj, &class, attr, value, mode)
}

pub(crate) fn reset_attr_mode(obj: &Object, name: &str, mode: Write) -> MutationResult<Object> {
    let class = obj.class();
    let attr = validation::require_attr(&class, name)?;
    let target = write_target(obj, name, mode)?;
    match &attr.alias {
        Some(link) if link.passthrough => {
            alias::write_through(&target, &class, attr, link, Leaf::Remove)?
        }
        _ => lifecycle::restore_default(&target, &class, attr)?,
    }
    lifecycle::invalidate(&target, &class, name)?;
    Ok(target)
}

// ==================== Shared steps ====================

/// Run a mutation through an attribute's preparer and constructor.
///
/// Newly supplied collections are then rebuilt item by item so the item
/// preparer and keyed uniqueness apply to them as well.
pub(crate) fn prepare_attr_value(
    obj: &Object,
    class: &ClassDef,
    attr: &AttrSpec,
    old: Maybe<Value>,
    mutation: ValueMutation<'_>,
) -> MutationResult<Maybe<Value>> {
    let fresh = old.is_missing()
        || mutation.new.is_present()
        || mutation.replace
        || mutation.transform.is_some();
    let registry = obj.registry();
    let preparer = attr.preparer.clone();
    let prepare = |value: Value| match &preparer {
        Some(p) => p(obj, value),
        None => Ok(value),
    };

    let mut mutation = mutation;
    mutation.prepare = Some(&prepare);
    mutation.constructor = Constructor::for_type(&registry, &attr.ty);
    match mutate_value(old, mutation)? {
        Present(value) if fresh && attr.is_collection() => {
            Ok(Present(collections::prepare_collection(obj, class, attr, value)?))
        }
        other => Ok(other),
    }
}

/// Type-check a prepared value and store it on the write target.
///
/// A missing value leaves the attribute untouched. Passthrough aliases store
/// through their path.
pub(crate) fn assign(
    obj: &Object,
    class: &ClassDef,
    attr: &AttrSpec,
    value: Maybe<Value>,
    mode: Write,
) -> MutationResult<Object> {
    if mode == Write::Inplace {
        obj.ensure_mutable(&attr.name)?;
    }
    let value = match value {
        Present(value) => value,
        Missing => return write_target(obj, &attr.name, mode),
    };
    validation::check_value(class, attr, &value)?;
    let target = write_target(obj, &attr.name, mode)?;
    lifecycle::store(&target, class, attr, value)?;
    lifecycle::invalidate(&target, class, &attr.name)?;
    Ok(target)
}
