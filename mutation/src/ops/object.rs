//! Whole-object operations: `update`, `transform`, `reset`.

use super::attr::{write_target, Write};
use crate::lifecycle;
use crate::mutate::{mutate_value, Constructor, ValueMutation};
use crate::validation;
use tracing::trace;
use valobj_core::{
    Call, ClassDef, Missing, MutationError, MutationResult, Object, Present, TypeExpr, Value,
    ANY_ATTR,
};

/// `update`: patch several attributes at once, or start from a new value.
///
/// With `replace`, the object is rebuilt from the given attrs alone.
pub fn update(obj: &Object, call: Call) -> MutationResult<Object> {
    if !call.when {
        return Ok(obj.clone());
    }
    let class = obj.class();
    let registry = obj.registry();
    let self_type = TypeExpr::class(&class.name);
    validation::check_nested_keywords(
        &registry,
        "update",
        &self_type,
        call.attrs.iter().map(|(k, _)| k.as_str()),
    )?;
    let mode = Write::of(&call);
    trace!(class = %class.name, ?mode, "object update");

    let fresh = !call.attrs.is_empty() || (call.value.is_missing() && call.replace);
    let context = class.name.clone();
    let mutation = ValueMutation {
        new: call.value,
        replace: call.replace,
        constructor: Some(Constructor::Class {
            registry: registry.clone(),
            class: class.name.clone(),
        }),
        attrs: call.attrs,
        ..ValueMutation::new(&context)
    };
    let result = match mutate_value(Present(Value::Object(obj.clone())), mutation)? {
        Present(value) => expect_instance(&class, &self_type, value)?,
        Missing => obj.clone(),
    };
    let result = if fresh { result } else { result.deep_copy() };
    finish(obj, result, mode)
}

/// `transform`: apply a function to the whole object and/or to some of its attributes.
pub fn transform(obj: &Object, call: Call) -> MutationResult<Object> {
    if !call.when {
        return Ok(obj.clone());
    }
    let class = obj.class();
    let self_type = TypeExpr::class(&class.name);
    validation::check_nested_keywords(
        &obj.registry(),
        "transform",
        &self_type,
        call.attr_transforms.iter().map(|(k, _)| k.as_str()),
    )?;
    let mode = Write::of(&call);
    trace!(class = %class.name, ?mode, "object transform");

    let base = obj.deep_copy();
    let context = class.name.clone();
    let mutation = ValueMutation {
        transform: call.transform,
        attr_transforms: call.attr_transforms,
        ..ValueMutation::new(&context)
    };
    let result = match mutate_value(Present(Value::Object(base.clone())), mutation)? {
        Present(value) => expect_instance(&class, &self_type, value)?,
        Missing => base,
    };
    finish(obj, result, mode)
}

/// `reset`: restore every attribute to its default (or unset it).
pub fn reset(obj: &Object, call: Call) -> MutationResult<Object> {
    if !call.when {
        return Ok(obj.clone());
    }
    let class = obj.class();
    let mode = Write::of(&call);
    trace!(class = %class.name, ?mode, "object reset");

    let target = write_target(obj, ANY_ATTR, mode)?;
    for spec in class.attrs() {
        lifecycle::restore_default(&target, &class, spec)?;
    }
    Ok(target)
}

fn expect_instance(class: &ClassDef, self_type: &TypeExpr, value: Value) -> MutationResult<Object> {
    match value {
        Value::Object(obj) if self_type.check(&Value::Object(obj.clone())) => Ok(obj),
        other => Err(MutationError::type_mismatch(
            &class.name,
            other.to_string(),
            self_type.label(),
        )),
    }
}

/// Return `result`, or copy it into the receiver for in-place calls.
fn finish(obj: &Object, result: Object, mode: Write) -> MutationResult<Object> {
    match mode {
        Write::Copy => Ok(result),
        Write::Inplace | Write::Force => {
            if mode == Write::Inplace {
                obj.ensure_mutable(ANY_ATTR)?;
            }
            obj.replace_slots(&result);
            Ok(obj.clone())
        }
    }
}
