//! Method-call syntax for objects and registries.
//!
//! ```ignore
//! use valobj_mutation::{Instantiate, Mutate};
//!
//! let spec = registry.instantiate("Gauge", attrs! { "count" => 1i64 })?;
//! let spec = spec.with_item("items", Call::new().key("a").attr("value", 2i64))?;
//! assert_eq!(spec.get("count")?, Value::Int(1));
//! ```
//!
//! These call the generated operations directly, by attribute name. A
//! user-defined method that shadows a generated one is only reached through
//! [`Mutate::invoke`].

use crate::executor;
use crate::lifecycle;
use crate::ops::{attr, item, object};
use std::rc::Rc;
use valobj_core::{Attrs, Call, MutationResult, Object, Registry, Value};

/// Attribute access and mutation on an instance.
pub trait Mutate {
    /// Read an attribute.
    fn get(&self, attr: &str) -> MutationResult<Value>;

    /// Assign an attribute in place.
    fn set(&self, attr: &str, value: impl Into<Value>) -> MutationResult<()>;

    /// Delete an attribute in place, restoring its default if it has one.
    fn delete(&self, attr: &str) -> MutationResult<()>;

    fn with_attr(&self, attr: &str, call: Call) -> MutationResult<Object>;
    fn update_attr(&self, attr: &str, call: Call) -> MutationResult<Object>;
    fn transform_attr(&self, attr: &str, call: Call) -> MutationResult<Object>;
    fn reset_attr(&self, attr: &str, call: Call) -> MutationResult<Object>;

    /// Item methods take the name of the collection attribute, not the item.
    fn get_item(&self, attr: &str, call: Call) -> MutationResult<Value>;
    fn with_item(&self, attr: &str, call: Call) -> MutationResult<Object>;
    fn update_item(&self, attr: &str, call: Call) -> MutationResult<Object>;
    fn transform_item(&self, attr: &str, call: Call) -> MutationResult<Object>;
    fn without_item(&self, attr: &str, call: Call) -> MutationResult<Object>;

    fn update(&self, call: Call) -> MutationResult<Object>;
    fn transform(&self, call: Call) -> MutationResult<Object>;
    fn reset(&self, call: Call) -> MutationResult<Object>;

    /// Call a method by name, as listed in the class's method table.
    fn invoke(&self, method: &str, call: Call) -> MutationResult<Value>;
}

impl Mutate for Object {
    fn get(&self, attr: &str) -> MutationResult<Value> {
        lifecycle::get_attr(self, attr)
    }

    fn set(&self, attr: &str, value: impl Into<Value>) -> MutationResult<()> {
        lifecycle::set_attr(self, attr, value.into())
    }

    fn delete(&self, attr: &str) -> MutationResult<()> {
        lifecycle::delete_attr(self, attr)
    }

    fn with_attr(&self, attr: &str, call: Call) -> MutationResult<Object> {
        attr::with_attr(self, attr, call)
    }

    fn update_attr(&self, attr: &str, call: Call) -> MutationResult<Object> {
        attr::update_attr(self, attr, call)
    }

    fn transform_attr(&self, attr: &str, call: Call) -> MutationResult<Object> {
        attr::transform_attr(self, attr, call)
    }

    fn reset_attr(&self, attr: &str, call: Call) -> MutationResult<Object> {
        attr::reset_attr(self, attr, call)
    }

    fn get_item(&self, attr: &str, call: Call) -> MutationResult<Value> {
        item::get_item(self, attr, call)
    }

    fn with_item(&self, attr: &str, call: Call) -> MutationResult<Object> {
        item::with_item(self, attr, call)
    }

    fn update_item(&self, attr: &str, call: Call) -> MutationResult<Object> {
        item::update_item(self, attr, call)
    }

    fn transform_item(&self, attr: &str, call: Call) -> MutationResult<Object> {
        item::transform_item(self, attr, call)
    }

    fn without_item(&self, attr: &str, call: Call) -> MutationResult<Object> {
        item::without_item(self, attr, call)
    }

    fn update(&self, call: Call) -> MutationResult<Object> {
        object::update(self, call)
    }

    fn transform(&self, call: Call) -> MutationResult<Object> {
        object::transform(self, call)
    }

    fn reset(&self, call: Call) -> MutationResult<Object> {
        object::reset(self, call)
    }

    fn invoke(&self, method: &str, call: Call) -> MutationResult<Value> {
        executor::invoke(self, method, call)
    }
}

/// Construction of instances from a registry.
pub trait Instantiate {
    fn instantiate(&self, class: &str, attrs: Attrs) -> MutationResult<Object>;
}

impl Instantiate for Rc<Registry> {
    fn instantiate(&self, class: &str, attrs: Attrs) -> MutationResult<Object> {
        lifecycle::instantiate(self, class, attrs)
    }
}
