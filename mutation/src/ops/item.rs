//! Item-level operations on collection attributes:
//! `get_<s>`, `with_<s>`, `update_<s>`, `transform_<s>`, `without_<s>`.
//!
//! The collection is read from the write target (the receiver, or its copy),
//! mutated as a working copy, and written back only once the whole operation
//! has succeeded. A failed in-place call therefore leaves the receiver as it was.

use super::attr::{write_target, Write};
use crate::collections::{self, CollectionMutator, ItemContext};
use crate::lifecycle;
use crate::validation;
use tracing::trace;
use valobj_core::{Attrs, Call, MutationError, MutationResult, Object, Value};

/// `get_<s>`: the located item, or the items matching attribute filters.
///
/// A target and filters are mutually exclusive, and `all_matches` only
/// applies to filters. With `raise_if_missing` unset, a missing item reads
/// as null.
pub fn get_item(obj: &Object, attr: &str, call: Call) -> MutationResult<Value> {
    let class = obj.class();
    let (spec, kind) = validation::require_collection(&class, attr)?;
    let current = lifecycle::current_value(obj, &class, spec)?;
    let ctx = ItemContext::new(obj, &class, spec);
    let method = ctx.method("get_");

    if call.target.is_present() || (call.filters.is_empty() && !call.all_matches) {
        if !call.filters.is_empty() {
            return Err(MutationError::unexpected_argument(method, "attr_filters"));
        }
        if call.all_matches {
            return Err(MutationError::unexpected_argument(method, "all_matches"));
        }
        let mutator = collections::mutator_for(ctx, kind, current)?;
        return match mutator.get_item(&call) {
            Err(err) if err.is_missing_target() && !call.raise_if_missing => Ok(Value::Null),
            other => other,
        };
    }

    let names = call.filters.iter().map(|(name, _)| name.as_str());
    validation::check_nested_keywords(&ctx.registry, &method, &spec.item_type(), names)?;
    let mut matches = Vec::new();
    for item in collections::items_of(&current) {
        if matches_filters(&item, &call.filters)? {
            matches.push(item);
        }
    }
    if call.all_matches {
        return Ok(Value::List(matches));
    }
    match matches.into_iter().next() {
        Some(item) => Ok(item),
        None if call.raise_if_missing => {
            let filters: Vec<String> = call
                .filters
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect();
            Err(MutationError::item_not_found(ctx.qualified(), filters.join(", ")))
        }
        None => Ok(Value::Null),
    }
}

/// True if `item` is a value object whose attributes equal every filter.
///
/// Unset attributes, and attributes a subclass item lacks, do not match.
fn matches_filters(item: &Value, filters: &Attrs) -> MutationResult<bool> {
    let Some(obj) = item.as_object() else {
        return Ok(false);
    };
    for (name, expected) in filters {
        match lifecycle::get_attr(obj, name) {
            Ok(value) if &value == expected => {}
            Ok(_) => return Ok(false),
            Err(err) if err.is_missing_target() => return Ok(false),
            Err(MutationError::UnknownAttribute { .. }) => return Ok(false),
            Err(err) => return Err(err),
        }
    }
    Ok(true)
}

/// `with_<s>`: add an item, or patch the one located.
pub fn with_item(obj: &Object, attr: &str, call: Call) -> MutationResult<Object> {
    item_op(obj, attr, call, "with_", |m, call| m.with_item(call))
}

/// `update_<s>`: patch an item that must already exist.
pub fn update_item(obj: &Object, attr: &str, call: Call) -> MutationResult<Object> {
    item_op(obj, attr, call, "update_", |m, call| m.update_item(call))
}

/// `transform_<s>`: transform an item that must already exist.
pub fn transform_item(obj: &Object, attr: &str, call: Call) -> MutationResult<Object> {
    item_op(obj, attr, call, "transform_", |m, call| m.transform_item(call))
}

/// `without_<s>`: remove an item that must already exist.
pub fn without_item(obj: &Object, attr: &str, call: Call) -> MutationResult<Object> {
    item_op(obj, attr, call, "without_", |m, call| m.without_item(call))
}

fn item_op(
    obj: &Object,
    attr: &str,
    call: Call,
    prefix: &str,
    op: impl FnOnce(&mut dyn CollectionMutator, Call) -> MutationResult<()>,
) -> MutationResult<Object> {
    if !call.when {
        return Ok(obj.clone());
    }
    let class = obj.class();
    let (spec, kind) = validation::require_collection(&class, attr)?;
    validation::ensure_writable(&class, spec)?;
    let mode = Write::of(&call);
    let target = write_target(obj, attr, mode)?;

    let ctx = ItemContext::new(&target, &class, spec);
    let method = ctx.method(prefix);
    let nested = call
        .attrs
        .iter()
        .map(|(k, _)| k.as_str())
        .chain(call.attr_transforms.iter().map(|(k, _)| k.as_str()));
    validation::check_nested_keywords(&ctx.registry, &method, &spec.item_type(), nested)?;
    trace!(class = %class.name, attr, method = %method, ?mode, "item mutation");

    let current = lifecycle::current_value(&target, &class, spec)?;
    let mut mutator = collections::mutator_for(ctx, kind, current)?;
    op(mutator.as_mut(), call)?;
    let value = mutator.into_value();

    validation::check_value(&class, spec, &value)?;
    lifecycle::store(&target, &class, spec, value)?;
    lifecycle::invalidate(&target, &class, attr)?;
    Ok(target)
}
