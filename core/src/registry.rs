//! The Registry - immutable lookup of value-object classes.

use crate::class::ClassDef;
use crate::error::{MutationError, MutationResult};
use std::collections::HashMap;
use std::rc::Rc;

/// The Registry provides runtime lookup of class definitions.
/// It is immutable after construction and shared by every object it creates.
#[derive(Debug, Default)]
pub struct Registry {
    /// Class definitions by name.
    classes: HashMap<String, Rc<ClassDef>>,
    /// Class names in declaration order.
    order: Vec<String>,
}

impl Registry {
    pub(crate) fn new(classes: HashMap<String, Rc<ClassDef>>, order: Vec<String>) -> Self {
        Self { classes, order }
    }

    // ==================== Class Lookups ====================

    /// Get a class definition by name.
    pub fn class(&self, name: &str) -> Option<&Rc<ClassDef>> {
        self.classes.get(name)
    }

    /// Get a class definition by name, failing with `UnknownClass`.
    pub fn require_class(&self, name: &str) -> MutationResult<Rc<ClassDef>> {
        self.classes
            .get(name)
            .cloned()
            .ok_or_else(|| MutationError::unknown_class(name))
    }

    pub fn has_class(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// Class definitions in declaration order.
    pub fn classes(&self) -> impl Iterator<Item = &Rc<ClassDef>> {
        self.order.iter().filter_map(|name| self.classes.get(name))
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    // ==================== Hierarchy ====================

    /// True if `child` is `parent` or inherits from it.
    pub fn is_subclass(&self, child: &str, parent: &str) -> bool {
        self.classes
            .get(child)
            .is_some_and(|class| class.is_subclass_of(parent))
    }

    /// Every registered class accepted where `name` is expected.
    pub fn subclasses_of(&self, name: &str) -> Vec<&str> {
        self.order
            .iter()
            .filter(|c| self.is_subclass(c, name))
            .map(String::as_str)
            .collect()
    }
}
