//! Method dispatch by name.
//!
//! `invoke` is the dynamic entry point: it resolves a method in the class's
//! method table, rejects arguments the method does not accept, and routes
//! generated methods to their operation. User-defined methods are called
//! as they are.

use crate::ops::{attr, item, object};
use tracing::trace;
use valobj_core::{Call, MethodDef, MethodKind, MutationError, MutationResult, Object, Value};

/// Call the method `method` of `obj`.
///
/// Mutating methods return the resulting object (the receiver itself for
/// in-place calls and `when(false)`); `get_<s>` returns the item.
pub fn invoke(obj: &Object, method: &str, call: Call) -> MutationResult<Value> {
    let class = obj.class();
    let def = class
        .method(method)
        .cloned()
        .ok_or_else(|| MutationError::unknown_method(&class.name, method))?;

    let (kind, attr_name) = match def {
        MethodDef::User(f) => {
            trace!(class = %class.name, method, "invoking user method");
            return f(obj, call);
        }
        MethodDef::Generated { kind, attr } => (kind, attr.unwrap_or_default()),
    };

    let (collection, keyed) = class
        .attr(&attr_name)
        .map_or((None, false), |spec| (spec.collection, spec.item_key_attr.is_some()));
    let accepted = kind.accepts(collection, keyed);
    if let Some(arg) = call.supplied().into_iter().find(|arg| !accepted.contains(arg)) {
        return Err(MutationError::unexpected_argument(method, arg.name()));
    }
    trace!(class = %class.name, method, ?kind, "invoking generated method");

    let attr = attr_name.as_str();
    let result = match kind {
        MethodKind::WithAttr => attr::with_attr(obj, attr, call)?,
        MethodKind::UpdateAttr => attr::update_attr(obj, attr, call)?,
        MethodKind::TransformAttr => attr::transform_attr(obj, attr, call)?,
        MethodKind::ResetAttr => attr::reset_attr(obj, attr, call)?,
        MethodKind::GetItem => return item::get_item(obj, attr, call),
        MethodKind::WithItem => item::with_item(obj, attr, call)?,
        MethodKind::UpdateItem => item::update_item(obj, attr, call)?,
        MethodKind::TransformItem => item::transform_item(obj, attr, call)?,
        MethodKind::WithoutItem => item::without_item(obj, attr, call)?,
        MethodKind::Update => object::update(obj, call)?,
        MethodKind::Transform => object::transform(obj, call)?,
        MethodKind::Reset => object::reset(obj, call)?,
    };
    Ok(Value::Object(result))
}
