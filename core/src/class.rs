//! Resolved value-object class definitions.

use crate::attr::AttrSpec;
use crate::error::MutationResult;
use crate::methods::{MethodDef, MethodTable};
use crate::object::Object;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Hook run once construction has populated every attribute.
pub type PostInit = Rc<dyn Fn(&Object) -> MutationResult<()>>;

/// Wildcard trigger: invalidated by any attribute mutation.
pub const ANY_ATTR: &str = "*";

/// A resolved value-object class.
pub struct ClassDef {
    /// Class name.
    pub name: String,
    /// Direct parents, in declaration order.
    pub parents: Vec<String>,
    /// This class followed by every ancestor, nearest first.
    pub mro: Vec<String>,
    /// Key attribute identifying instances in keyed collections.
    pub key: Option<String>,
    pub frozen: bool,
    /// Attribute collecting unrecognised constructor keywords.
    pub init_overflow_attr: Option<String>,
    pub(crate) attrs: Vec<AttrSpec>,
    pub(crate) attr_index: HashMap<String, usize>,
    /// trigger attribute -> attributes reset when it changes.
    pub(crate) invalidation: HashMap<String, Vec<String>>,
    pub(crate) methods: MethodTable,
    pub(crate) post_init: Option<PostInit>,
}

impl ClassDef {
    // ==================== Attributes ====================

    /// Get an attribute spec by name.
    pub fn attr(&self, name: &str) -> Option<&AttrSpec> {
        self.attr_index.get(name).map(|&i| &self.attrs[i])
    }

    /// All attributes in declaration order (inherited ones first).
    pub fn attrs(&self) -> impl Iterator<Item = &AttrSpec> {
        self.attrs.iter()
    }

    pub fn managed_attrs(&self) -> impl Iterator<Item = &AttrSpec> {
        self.attrs.iter().filter(|a| a.managed)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr_index.contains_key(name)
    }

    /// Resolved key attribute, if the class is keyed.
    pub fn key_attr(&self) -> Option<&AttrSpec> {
        self.key.as_deref().and_then(|k| self.attr(k))
    }

    /// Attributes to reset after `attr` changes, excluding `attr` itself.
    pub fn dependents_of(&self, attr: &str) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for trigger in [attr, ANY_ATTR] {
            if let Some(dependents) = self.invalidation.get(trigger) {
                for dependent in dependents {
                    if dependent != attr && !out.contains(&dependent.as_str()) {
                        out.push(dependent);
                    }
                }
            }
        }
        out
    }

    // ==================== Hierarchy ====================

    /// True if this class is `name` or inherits from it.
    pub fn is_subclass_of(&self, name: &str) -> bool {
        self.mro.iter().any(|c| c == name)
    }

    // ==================== Methods ====================

    pub fn method(&self, name: &str) -> Option<&MethodDef> {
        self.methods.get(name)
    }

    pub fn methods(&self) -> &MethodTable {
        &self.methods
    }

    pub fn post_init(&self) -> Option<&PostInit> {
        self.post_init.as_ref()
    }
}

impl fmt::Debug for ClassDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDef")
            .field("name", &self.name)
            .field("mro", &self.mro)
            .field("key", &self.key)
            .field("frozen", &self.frozen)
            .field("attrs", &self.attrs)
            .field("methods", &self.methods)
            .finish_non_exhaustive()
    }
}
