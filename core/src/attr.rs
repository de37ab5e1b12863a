//! Attribute declarations and resolved attribute specs.
//!
//! `AttrDef` is what a class author writes. `AttrSpec` is the resolved,
//! immutable record produced by the registry builder, with the collection
//! classification and nested-class references filled in.

use crate::call::Transform;
use crate::error::MutationResult;
use crate::missing::{Maybe, Missing, Present};
use crate::object::Object;
use crate::types::{CollectionKind, TypeExpr};
use crate::value::Value;
use regex_lite::Regex;
use std::fmt;
use std::rc::Rc;

/// Produces a fresh default value for each instance.
pub type DefaultFactory = Rc<dyn Fn() -> Value>;

/// Coerces a candidate value before it is type-checked: `(instance, candidate) -> value`.
pub type Preparer = Rc<dyn Fn(&Object, Value) -> MutationResult<Value>>;

/// Computes a derived attribute from the instance.
pub type Getter = Rc<dyn Fn(&Object) -> MutationResult<Value>>;

/// The declared default of an attribute.
#[derive(Clone, Default)]
pub enum AttrDefault {
    #[default]
    None,
    Value(Value),
    Factory(DefaultFactory),
}

impl fmt::Debug for AttrDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrDefault::None => write!(f, "None"),
            AttrDefault::Value(v) => write!(f, "Value({})", v),
            AttrDefault::Factory(_) => write!(f, "Factory(..)"),
        }
    }
}

/// A computed attribute (getter plus caching behaviour).
#[derive(Clone)]
pub struct Property {
    pub getter: Getter,
    /// Store the computed value on first access.
    pub cache: bool,
    /// Allow assignment to override the computed value.
    pub overridable: bool,
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("cache", &self.cache)
            .field("overridable", &self.overridable)
            .finish_non_exhaustive()
    }
}

/// One step of an alias path: `.name` or `["key"]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AliasStep {
    Attr(String),
    Key(String),
}

impl fmt::Display for AliasStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AliasStep::Attr(name) => write!(f, ".{}", name),
            AliasStep::Key(key) => write!(f, "[{:?}]", key),
        }
    }
}

/// An attribute that reads, and optionally writes, another attribute path.
#[derive(Clone)]
pub struct Alias {
    pub path: String,
    /// Filled in by the registry builder.
    pub steps: Vec<AliasStep>,
    /// Forward assignment and deletion to the aliased path instead of
    /// storing a local override.
    pub passthrough: bool,
    pub transform: Option<Transform>,
    /// Read when some step of the path is unset.
    pub fallback: Option<Value>,
    /// Log a warning on every access.
    pub deprecated: bool,
}

impl Alias {
    fn new(path: String) -> Self {
        Self {
            path,
            steps: Vec::new(),
            passthrough: false,
            transform: None,
            fallback: None,
            deprecated: false,
        }
    }

    /// The attribute of the owning instance the path starts from.
    pub fn root(&self) -> Option<&str> {
        match self.steps.first() {
            Some(AliasStep::Attr(name)) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Debug for Alias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Alias")
            .field("path", &self.path)
            .field("passthrough", &self.passthrough)
            .field("fallback", &self.fallback)
            .field("deprecated", &self.deprecated)
            .finish_non_exhaustive()
    }
}

/// Split `foo.bar["baz"]` into steps. The path must start with an attribute name.
pub(crate) fn parse_alias_path(path: &str) -> Option<Vec<AliasStep>> {
    let step = Regex::new(
        r#"^(?:(\.)?([A-Za-z_][A-Za-z0-9_]*)|\["((?:[^"\\]|\\.)*)"\]|\['((?:[^'\\]|\\.)*)'\])"#,
    )
    .ok()?;
    let mut steps = Vec::new();
    let mut rest = path;
    while !rest.is_empty() {
        let caps = step.captures(rest)?;
        if let Some(name) = caps.get(2) {
            // Attribute steps after the first need their dot, the first must not have one.
            if caps.get(1).is_some() == steps.is_empty() {
                return None;
            }
            steps.push(AliasStep::Attr(name.as_str().to_string()));
        } else {
            let quoted = caps.get(3).or_else(|| caps.get(4))?;
            steps.push(AliasStep::Key(unescape(quoted.as_str())));
        }
        rest = &rest[caps.get(0)?.end()..];
    }
    matches!(steps.first(), Some(AliasStep::Attr(_))).then_some(steps)
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.extend(chars.next()),
            c => out.push(c),
        }
    }
    out
}

// ==================== Declaration ====================

/// Attribute definition as declared on a class.
#[derive(Clone)]
pub struct AttrDef {
    pub name: String,
    pub ty: TypeExpr,
    pub(crate) default: Option<Value>,
    pub(crate) default_factory: Option<DefaultFactory>,
    pub(crate) init: bool,
    pub(crate) repr: bool,
    pub(crate) compare: bool,
    pub(crate) do_not_copy: bool,
    pub(crate) invalidated_by: Vec<String>,
    pub(crate) item_name: Option<String>,
    pub(crate) preparer: Option<Preparer>,
    pub(crate) item_preparer: Option<Preparer>,
    pub(crate) property: Option<Property>,
    pub(crate) alias: Option<Alias>,
}

impl AttrDef {
    /// Create a new attribute definition.
    pub fn new(name: impl Into<String>, ty: TypeExpr) -> Self {
        Self {
            name: name.into(),
            ty,
            default: None,
            default_factory: None,
            init: true,
            repr: true,
            compare: true,
            do_not_copy: false,
            invalidated_by: Vec::new(),
            item_name: None,
            preparer: None,
            item_preparer: None,
            property: None,
            alias: None,
        }
    }

    /// Set a default value (deep-copied into each instance).
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Set a default factory, invoked once per instance.
    pub fn default_factory(mut self, factory: impl Fn() -> Value + 'static) -> Self {
        self.default_factory = Some(Rc::new(factory));
        self
    }

    /// Exclude from the constructor; the attribute is populated from its default only.
    pub fn no_init(mut self) -> Self {
        self.init = false;
        self
    }

    pub fn no_repr(mut self) -> Self {
        self.repr = false;
        self
    }

    pub fn no_compare(mut self) -> Self {
        self.compare = false;
        self
    }

    /// Share this attribute by reference between an instance and its copies.
    pub fn do_not_copy(mut self) -> Self {
        self.do_not_copy = true;
        self
    }

    /// Reset this attribute whenever one of `triggers` is mutated (`"*"` = any attribute).
    pub fn invalidated_by<S: Into<String>>(mut self, triggers: impl IntoIterator<Item = S>) -> Self {
        self.invalidated_by.extend(triggers.into_iter().map(Into::into));
        self
    }

    /// Override the singular name used for item-level methods.
    pub fn item_name(mut self, name: impl Into<String>) -> Self {
        self.item_name = Some(name.into());
        self
    }

    pub fn preparer(mut self, f: impl Fn(&Object, Value) -> MutationResult<Value> + 'static) -> Self {
        self.preparer = Some(Rc::new(f));
        self
    }

    /// Preparer applied to each collection item before it is inserted.
    pub fn item_preparer(
        mut self,
        f: impl Fn(&Object, Value) -> MutationResult<Value> + 'static,
    ) -> Self {
        self.item_preparer = Some(Rc::new(f));
        self
    }

    /// Make this a computed attribute.
    pub fn computed(mut self, getter: impl Fn(&Object) -> MutationResult<Value> + 'static) -> Self {
        self.property = Some(Property {
            getter: Rc::new(getter),
            cache: false,
            overridable: false,
        });
        self
    }

    /// Cache a computed attribute after first access.
    pub fn cached(mut self) -> Self {
        if let Some(property) = self.property.as_mut() {
            property.cache = true;
        }
        self
    }

    /// Allow a computed attribute to be overridden by assignment.
    pub fn overridable(mut self) -> Self {
        if let Some(property) = self.property.as_mut() {
            property.overridable = true;
        }
        self
    }

    /// Read this attribute from another attribute path, such as `origin.x`
    /// or `meta["owner"]`.
    ///
    /// Assigning an alias stores a local override unless it is a passthrough.
    /// Aliases stay out of the constructor, the repr, and comparisons.
    pub fn alias(mut self, path: impl Into<String>) -> Self {
        self.alias = Some(Alias::new(path.into()));
        self.init = false;
        self.repr = false;
        self.compare = false;
        self
    }

    /// Write and delete through the alias path.
    pub fn passthrough(mut self) -> Self {
        if let Some(alias) = self.alias.as_mut() {
            alias.passthrough = true;
        }
        self
    }

    /// Apply `f` to the aliased value on every read.
    pub fn alias_transform(mut self, f: impl Fn(Value) -> MutationResult<Value> + 'static) -> Self {
        if let Some(alias) = self.alias.as_mut() {
            alias.transform = Some(Rc::new(f));
        }
        self
    }

    /// A passthrough alias kept for an attribute's former name; accesses are logged.
    pub fn deprecated_alias(self, path: impl Into<String>) -> Self {
        let mut def = self.alias(path).passthrough();
        if let Some(alias) = def.alias.as_mut() {
            alias.deprecated = true;
        }
        def
    }

    /// Value read when the aliased path is unset.
    pub fn fallback(mut self, value: impl Into<Value>) -> Self {
        if let Some(alias) = self.alias.as_mut() {
            alias.fallback = Some(value.into());
        }
        self
    }
}

impl fmt::Debug for AttrDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttrDef")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("default", &self.default)
            .finish_non_exhaustive()
    }
}

// ==================== Resolved spec ====================

/// Resolved metadata for one attribute of a class.
#[derive(Clone)]
pub struct AttrSpec {
    pub name: String,
    /// Class that declared this attribute.
    pub owner: String,
    pub ty: TypeExpr,
    pub default: AttrDefault,
    pub init: bool,
    pub repr: bool,
    pub compare: bool,
    pub do_not_copy: bool,
    pub invalidated_by: Vec<String>,
    /// Managed attributes get generated methods and type checks.
    pub managed: bool,
    pub collection: Option<CollectionKind>,
    pub item_type: Option<TypeExpr>,
    /// Nested value-object class of `ty`.
    pub spec_type: Option<String>,
    /// Nested value-object class of `item_type`.
    pub item_spec_type: Option<String>,
    /// Key attribute of `item_spec_type`, if it declares one.
    pub item_key_attr: Option<String>,
    /// Type of that key attribute.
    pub key_type: Option<TypeExpr>,
    /// Singular name for item-level methods.
    pub item_name: Option<String>,
    pub preparer: Option<Preparer>,
    pub item_preparer: Option<Preparer>,
    pub property: Option<Property>,
    pub alias: Option<Alias>,
}

impl AttrSpec {
    /// Resolve a definition; derived fields are filled by the registry builder.
    pub(crate) fn from_def(def: AttrDef, owner: &str) -> Self {
        let default = match (def.default, def.default_factory) {
            (_, Some(factory)) => AttrDefault::Factory(factory),
            (Some(value), None) => AttrDefault::Value(value),
            (None, None) => AttrDefault::None,
        };
        let collection = def.ty.collection_kind();
        let item_type = collection.map(|_| def.ty.item_type());
        Self {
            name: def.name,
            owner: owner.to_string(),
            ty: def.ty,
            default,
            init: def.init,
            repr: def.repr,
            compare: def.compare,
            do_not_copy: def.do_not_copy,
            invalidated_by: def.invalidated_by,
            managed: true,
            collection,
            item_type,
            spec_type: None,
            item_spec_type: None,
            item_key_attr: None,
            key_type: None,
            item_name: def.item_name,
            preparer: def.preparer,
            item_preparer: def.item_preparer,
            property: def.property,
            alias: def.alias,
        }
    }

    pub fn is_collection(&self) -> bool {
        self.collection.is_some()
    }

    pub fn is_computed(&self) -> bool {
        self.property.is_some()
    }

    pub fn is_alias(&self) -> bool {
        self.alias.is_some()
    }

    pub fn has_default(&self) -> bool {
        !matches!(self.default, AttrDefault::None)
    }

    /// A fresh copy of the default, or `Missing` if there is none.
    pub fn default_value(&self) -> Maybe<Value> {
        match &self.default {
            AttrDefault::None => Missing,
            AttrDefault::Value(v) => Present(v.deep_copy()),
            AttrDefault::Factory(factory) => Present(factory()),
        }
    }

    /// Item type, or `Any` for scalar attributes.
    pub fn item_type(&self) -> TypeExpr {
        self.item_type.clone().unwrap_or(TypeExpr::Any)
    }

    /// `Class.attr` as used in error messages.
    pub fn qualified(&self, class_name: &str) -> String {
        format!("{}.{}", class_name, self.name)
    }
}

impl fmt::Debug for AttrSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttrSpec")
            .field("name", &self.name)
            .field("owner", &self.owner)
            .field("ty", &self.ty)
            .field("default", &self.default)
            .field("managed", &self.managed)
            .field("collection", &self.collection)
            .field("item_spec_type", &self.item_spec_type)
            .field("item_name", &self.item_name)
            .field("alias", &self.alias)
            .finish_non_exhaustive()
    }
}
