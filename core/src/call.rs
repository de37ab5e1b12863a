//! Arguments for generated mutation methods.

use crate::error::MutationResult;
use crate::missing::{Maybe, Missing, Present};
use crate::value::{Attrs, Value};
use std::fmt;
use std::rc::Rc;

/// A unary transform applied to an attribute or item.
pub type Transform = Rc<dyn Fn(Value) -> MutationResult<Value>>;

/// Names of the arguments a generated method may accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CallArg {
    Value,
    Target,
    ByIndex,
    Insert,
    Replace,
    Inplace,
    When,
    Attrs,
    Transform,
    AttrTransforms,
    Filters,
    AllMatches,
    RaiseIfMissing,
}

impl CallArg {
    pub fn name(&self) -> &'static str {
        match self {
            CallArg::Value => "value",
            CallArg::Target => "target",
            CallArg::ByIndex => "by_index",
            CallArg::Insert => "insert",
            CallArg::Replace => "replace",
            CallArg::Inplace => "inplace",
            CallArg::When => "if_",
            CallArg::Attrs => "attrs",
            CallArg::Transform => "transform",
            CallArg::AttrTransforms => "attr_transforms",
            CallArg::Filters => "attr_filters",
            CallArg::AllMatches => "all_matches",
            CallArg::RaiseIfMissing => "raise_if_missing",
        }
    }
}

/// Argument bag for a generated method call.
///
/// ```ignore
/// let call = Call::new().key("a").attr("value", 2i64);
/// let spec = spec.invoke("with_item", call)?;
/// ```
#[derive(Clone)]
pub struct Call {
    /// New value (or item).
    pub value: Maybe<Value>,
    /// Index, key, or existing value locating an item.
    pub target: Maybe<Value>,
    /// Force (or forbid) positional interpretation of `target`.
    pub by_index: Option<bool>,
    /// Insert before `target` rather than replacing it.
    pub insert: bool,
    /// Rebuild nested value-objects from scratch rather than patching.
    pub replace: bool,
    /// Mutate the receiver rather than a copy.
    pub inplace: bool,
    /// When false the call is a no-op returning the receiver.
    pub when: bool,
    /// Nested attribute patches.
    pub attrs: Attrs,
    pub transform: Option<Transform>,
    pub attr_transforms: Vec<(String, Transform)>,
    /// `get_<s>`: match items whose nested attributes equal these values.
    pub filters: Attrs,
    /// `get_<s>`: return every match as a list.
    pub all_matches: bool,
    /// `get_<s>`: when false, a missing item reads as null.
    pub raise_if_missing: bool,
}

impl Default for Call {
    fn default() -> Self {
        Self {
            value: Missing,
            target: Missing,
            by_index: None,
            insert: false,
            replace: false,
            inplace: false,
            when: true,
            attrs: Attrs::new(),
            transform: None,
            attr_transforms: Vec::new(),
            filters: Attrs::new(),
            all_matches: false,
            raise_if_missing: true,
        }
    }
}

impl Call {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.value = Present(value.into());
        self
    }

    /// Locate an item by position.
    pub fn index(mut self, index: i64) -> Self {
        self.target = Present(Value::Int(index));
        self.by_index = Some(true);
        self
    }

    /// Locate an item by key (mappings and keyed collections).
    pub fn key(mut self, key: impl Into<Value>) -> Self {
        self.target = Present(key.into());
        self
    }

    /// Locate an item by an existing value, or an index/key.
    pub fn target(mut self, target: impl Into<Value>) -> Self {
        self.target = Present(target.into());
        self
    }

    pub fn by_index(mut self, by_index: bool) -> Self {
        self.by_index = Some(by_index);
        self
    }

    pub fn insert(mut self) -> Self {
        self.insert = true;
        self
    }

    pub fn replace(mut self) -> Self {
        self.replace = true;
        self
    }

    pub fn inplace(mut self) -> Self {
        self.inplace = true;
        self
    }

    /// Conditional execution (`if_`).
    pub fn when(mut self, condition: bool) -> Self {
        self.when = condition;
        self
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    pub fn attrs(mut self, attrs: Attrs) -> Self {
        self.attrs.extend(attrs);
        self
    }

    pub fn transform(mut self, f: impl Fn(Value) -> MutationResult<Value> + 'static) -> Self {
        self.transform = Some(Rc::new(f));
        self
    }

    pub fn attr_transform(
        mut self,
        name: impl Into<String>,
        f: impl Fn(Value) -> MutationResult<Value> + 'static,
    ) -> Self {
        self.attr_transforms.push((name.into(), Rc::new(f)));
        self
    }

    /// Select items by a nested attribute value.
    pub fn filter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push((name.into(), value.into()));
        self
    }

    pub fn all_matches(mut self) -> Self {
        self.all_matches = true;
        self
    }

    /// Read a missing item as null instead of failing.
    pub fn missing_ok(mut self) -> Self {
        self.raise_if_missing = false;
        self
    }

    /// Arguments that differ from their defaults.
    pub fn supplied(&self) -> Vec<CallArg> {
        let mut args = Vec::new();
        if self.value.is_present() {
            args.push(CallArg::Value);
        }
        if self.target.is_present() {
            args.push(CallArg::Target);
        }
        if self.by_index.is_some() {
            args.push(CallArg::ByIndex);
        }
        if self.insert {
            args.push(CallArg::Insert);
        }
        if self.replace {
            args.push(CallArg::Replace);
        }
        if self.inplace {
            args.push(CallArg::Inplace);
        }
        if !self.when {
            args.push(CallArg::When);
        }
        if !self.attrs.is_empty() {
            args.push(CallArg::Attrs);
        }
        if self.transform.is_some() {
            args.push(CallArg::Transform);
        }
        if !self.attr_transforms.is_empty() {
            args.push(CallArg::AttrTransforms);
        }
        if !self.filters.is_empty() {
            args.push(CallArg::Filters);
        }
        if self.all_matches {
            args.push(CallArg::AllMatches);
        }
        if !self.raise_if_missing {
            args.push(CallArg::RaiseIfMissing);
        }
        args
    }
}

impl fmt::Debug for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let attr_transforms: Vec<&str> =
            self.attr_transforms.iter().map(|(k, _)| k.as_str()).collect();
        f.debug_struct("Call")
            .field("value", &self.value.as_ref().map(|v| v.to_string()))
            .field("target", &self.target.as_ref().map(|v| v.to_string()))
            .field("by_index", &self.by_index)
            .field("insert", &self.insert)
            .field("replace", &self.replace)
            .field("inplace", &self.inplace)
            .field("when", &self.when)
            .field("attrs", &self.attrs)
            .field("transform", &self.transform.is_some())
            .field("attr_transforms", &attr_transforms)
            .field("filters", &self.filters)
            .field("all_matches", &self.all_matches)
            .field("raise_if_missing", &self.raise_if_missing)
            .finish()
    }
}
