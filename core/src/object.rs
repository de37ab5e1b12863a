//! Value-object instances.
//!
//! An `Object` is a shared handle to instance state: attribute slots, the
//! resolved class, and the lifecycle flag used during construction. Cloning
//! the handle aliases the instance; `deep_copy` creates an independent one.
//!
//! The slot accessors here are raw: they do not type-check, honour frozen
//! state, or run invalidation. The mutation engine layers those rules on top.

use crate::class::ClassDef;
use crate::error::{MutationError, MutationResult};
use crate::options::ReprOptions;
use crate::registry::Registry;
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// A value-object instance handle.
#[derive(Clone)]
pub struct Object(Rc<RefCell<ObjectState>>);

struct ObjectState {
    class: Rc<ClassDef>,
    registry: Rc<Registry>,
    slots: HashMap<String, Value>,
    /// Set while the constructor is populating attributes.
    initializing: bool,
}

/// Copies already made during one deep copy, by source identity.
#[derive(Default)]
pub(crate) struct CopyMemo {
    copies: HashMap<*const RefCell<ObjectState>, Object>,
}

impl Object {
    /// An instance with no attributes set, in the initializing state.
    pub fn blank(registry: &Rc<Registry>, class: &str) -> MutationResult<Object> {
        let class = registry.require_class(class)?;
        Ok(Object(Rc::new(RefCell::new(ObjectState {
            class,
            registry: registry.clone(),
            slots: HashMap::new(),
            initializing: true,
        }))))
    }

    // ==================== Identity ====================

    pub fn class(&self) -> Rc<ClassDef> {
        self.0.borrow().class.clone()
    }

    pub fn class_name(&self) -> String {
        self.0.borrow().class.name.clone()
    }

    pub fn registry(&self) -> Rc<Registry> {
        self.0.borrow().registry.clone()
    }

    /// True if both handles refer to the same instance.
    pub fn ptr_eq(a: &Object, b: &Object) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }

    pub fn is_instance_of(&self, class: &str) -> bool {
        self.0.borrow().class.is_subclass_of(class)
    }

    /// Value of the key attribute, if the class is keyed and the key is set.
    pub fn key_value(&self) -> Option<Value> {
        let state = self.0.borrow();
        let key = state.class.key.as_deref()?;
        state.slots.get(key).cloned()
    }

    // ==================== Lifecycle ====================

    pub fn is_initializing(&self) -> bool {
        self.0.borrow().initializing
    }

    pub fn set_initializing(&self, initializing: bool) {
        self.0.borrow_mut().initializing = initializing;
    }

    /// Frozen classes reject in-place mutation once construction is over.
    pub fn is_frozen(&self) -> bool {
        let state = self.0.borrow();
        state.class.frozen && !state.initializing
    }

    /// Fail with `FrozenInstance` if `attr` may not be mutated in place.
    pub fn ensure_mutable(&self, attr: &str) -> MutationResult<()> {
        if self.is_frozen() {
            return Err(MutationError::frozen_instance(self.class_name(), attr));
        }
        Ok(())
    }

    // ==================== Raw slots ====================

    /// Stored value of `name` (a shallow clone: nested objects stay shared).
    pub fn slot(&self, name: &str) -> Option<Value> {
        self.0.borrow().slots.get(name).cloned()
    }

    pub fn has_slot(&self, name: &str) -> bool {
        self.0.borrow().slots.contains_key(name)
    }

    pub fn set_slot(&self, name: impl Into<String>, value: Value) {
        self.0.borrow_mut().slots.insert(name.into(), value);
    }

    pub fn clear_slot(&self, name: &str) -> Option<Value> {
        self.0.borrow_mut().slots.remove(name)
    }

    /// Overwrite every slot with those of `other`, sharing its values.
    pub fn replace_slots(&self, other: &Object) {
        if Object::ptr_eq(self, other) {
            return;
        }
        let slots = other.0.borrow().slots.clone();
        self.0.borrow_mut().slots = slots;
    }

    // ==================== Copying ====================

    /// Independent copy of this instance.
    ///
    /// Attributes marked `do_not_copy` are shared with the copy; everything
    /// else is copied recursively. Aliasing within the copied graph is preserved.
    pub fn deep_copy(&self) -> Object {
        self.deep_copy_with(&mut CopyMemo::default())
    }

    pub(crate) fn deep_copy_with(&self, memo: &mut CopyMemo) -> Object {
        let ptr = Rc::as_ptr(&self.0);
        if let Some(copy) = memo.copies.get(&ptr) {
            return copy.clone();
        }

        let (class, registry, slots, initializing) = {
            let state = self.0.borrow();
            (
                state.class.clone(),
                state.registry.clone(),
                state.slots.clone(),
                state.initializing,
            )
        };
        let copy = Object(Rc::new(RefCell::new(ObjectState {
            class: class.clone(),
            registry,
            slots: HashMap::new(),
            initializing,
        })));
        memo.copies.insert(ptr, copy.clone());

        let copied: HashMap<String, Value> = slots
            .into_iter()
            .map(|(name, value)| {
                let shared = class.attr(&name).is_some_and(|a| a.do_not_copy);
                let value = if shared {
                    value
                } else {
                    value.deep_copy_with(memo)
                };
                (name, value)
            })
            .collect();
        copy.0.borrow_mut().slots = copied;
        copy
    }

    // ==================== Representation ====================

    /// Render with explicit options.
    pub fn repr_with(&self, options: &ReprOptions) -> String {
        let class = self.class();
        let names: Vec<String> = match &options.include {
            Some(include) => include.clone(),
            None => class
                .attrs()
                .filter(|a| a.repr)
                .map(|a| a.name.clone())
                .collect(),
        };
        let values: Vec<(String, Option<Value>)> = names
            .into_iter()
            .filter(|n| !options.exclude.contains(n))
            .map(|n| {
                let value = self.slot(&n);
                (n, value)
            })
            .collect();

        if options.indent != Some(true) {
            let parts: Vec<String> = values
                .iter()
                .map(|(n, v)| format!("{}={}", n, self.render(v.as_ref(), false)))
                .collect();
            let single = format!("{}({})", class.name, parts.join(", "));
            if options.indent == Some(false)
                || (single.len() <= options.threshold && !parts.iter().any(|p| p.contains('\n')))
            {
                return single;
            }
        }

        if values.is_empty() {
            return format!("{}()", class.name);
        }
        let parts: Vec<String> = values
            .iter()
            .map(|(n, v)| format!("{}={}", n, self.render(v.as_ref(), true)))
            .collect();
        format!("{}(\n{}\n)", class.name, indent_block(&parts.join(",\n")))
    }

    fn render(&self, value: Option<&Value>, indent: bool) -> String {
        match value {
            None => "MISSING".to_string(),
            Some(value) => render_value(value, indent, self),
        }
    }
}

fn indent_block(text: &str) -> String {
    text.lines()
        .map(|line| format!("    {}", line))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_value(value: &Value, indent: bool, owner: &Object) -> String {
    match value {
        Value::Object(obj) if Object::ptr_eq(obj, owner) => "<self>".to_string(),
        Value::Object(obj) => obj.repr_with(&ReprOptions::default().with_indent(indent)),
        Value::List(items) if indent && !items.is_empty() => {
            let parts: Vec<String> = items.iter().map(|v| render_value(v, true, owner)).collect();
            format!("[\n{}\n]", indent_block(&parts.join(",\n")))
        }
        Value::Map(map) if indent && !map.is_empty() => {
            let parts: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}: {}", k, render_value(v, true, owner)))
                .collect();
            format!("{{\n{}\n}}", indent_block(&parts.join(",\n")))
        }
        Value::Set(set) if indent && !set.is_empty() => {
            let parts: Vec<String> = set.iter().map(|v| render_value(v, true, owner)).collect();
            format!("{{\n{}\n}}", indent_block(&parts.join(",\n")))
        }
        Value::List(items) => {
            let parts: Vec<String> = items.iter().map(|v| render_value(v, false, owner)).collect();
            format!("[{}]", parts.join(", "))
        }
        other => other.to_string(),
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr_with(&ReprOptions::default()))
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr_with(&ReprOptions::default().with_indent(false)))
    }
}

/// Structural equality over every attribute with `compare` set.
impl PartialEq for Object {
    fn eq(&self, other: &Object) -> bool {
        if Object::ptr_eq(self, other) {
            return true;
        }
        let class = self.class();
        if class.name != other.class_name() {
            return false;
        }
        let equal = class
            .attrs()
            .filter(|a| a.compare)
            .all(|a| self.slot(&a.name) == other.slot(&a.name));
        equal
    }
}
