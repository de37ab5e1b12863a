//! Method tables: the generated mutation methods of a class.
//!
//! Method synthesis happens once, when the registry is built. Each managed
//! attribute contributes `with_`/`update_`/`transform_`/`reset_` methods,
//! collection attributes add the singular item methods, and every class gets
//! the whole-object `update`/`transform`/`reset`. A user-defined method of
//! the same name always wins.

use crate::attr::AttrSpec;
use crate::call::{Call, CallArg};
use crate::error::MutationResult;
use crate::object::Object;
use crate::types::CollectionKind;
use crate::value::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;

/// A hand-written method registered on a class.
pub type UserMethod = Rc<dyn Fn(&Object, Call) -> MutationResult<Value>>;

/// The operation a generated method performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodKind {
    WithAttr,
    UpdateAttr,
    TransformAttr,
    ResetAttr,
    GetItem,
    WithItem,
    UpdateItem,
    TransformItem,
    WithoutItem,
    Update,
    Transform,
    Reset,
}

impl MethodKind {
    /// Arguments accepted by this kind of method for an attribute of the given shape.
    pub fn accepts(&self, collection: Option<CollectionKind>, keyed: bool) -> &'static [CallArg] {
        use CallArg::*;
        match (self, collection) {
            (MethodKind::WithAttr | MethodKind::Update, _) => {
                &[Value, Replace, Inplace, When, Attrs]
            }
            (MethodKind::UpdateAttr, _) => &[Value, Replace, Inplace, When, Attrs],
            (MethodKind::TransformAttr | MethodKind::Transform, _) => {
                &[Transform, Inplace, When, AttrTransforms]
            }
            (MethodKind::ResetAttr | MethodKind::Reset, _) => &[Inplace, When],
            (MethodKind::GetItem, Some(CollectionKind::Sequence)) => {
                &[Target, ByIndex, Filters, AllMatches, RaiseIfMissing]
            }
            (MethodKind::GetItem, _) => &[Target, Filters, AllMatches, RaiseIfMissing],
            (MethodKind::WithItem, Some(CollectionKind::Sequence)) => {
                &[Value, Target, ByIndex, Insert, Replace, Inplace, When, Attrs]
            }
            (MethodKind::WithItem, Some(CollectionKind::Mapping)) if keyed => {
                &[Value, Replace, Inplace, When, Attrs]
            }
            (MethodKind::WithItem, Some(CollectionKind::Mapping)) => {
                &[Value, Target, Replace, Inplace, When, Attrs]
            }
            (MethodKind::WithItem, _) => &[Value, Replace, Inplace, When, Attrs],
            (MethodKind::UpdateItem, Some(CollectionKind::Sequence)) => {
                &[Value, Target, ByIndex, Replace, Inplace, When, Attrs]
            }
            (MethodKind::UpdateItem, _) => &[Value, Target, Replace, Inplace, When, Attrs],
            (MethodKind::TransformItem, Some(CollectionKind::Sequence)) => {
                &[Target, ByIndex, Transform, Inplace, When, AttrTransforms]
            }
            (MethodKind::TransformItem, _) => &[Target, Transform, Inplace, When, AttrTransforms],
            (MethodKind::WithoutItem, Some(CollectionKind::Sequence)) => {
                &[Target, ByIndex, Inplace, When]
            }
            (MethodKind::WithoutItem, _) => &[Target, Inplace, When],
        }
    }

    fn prefix(&self) -> &'static str {
        match self {
            MethodKind::WithAttr | MethodKind::WithItem => "with_",
            MethodKind::UpdateAttr | MethodKind::UpdateItem => "update_",
            MethodKind::TransformAttr | MethodKind::TransformItem => "transform_",
            MethodKind::ResetAttr => "reset_",
            MethodKind::GetItem => "get_",
            MethodKind::WithoutItem => "without_",
            MethodKind::Update => "update",
            MethodKind::Transform => "transform",
            MethodKind::Reset => "reset",
        }
    }
}

/// An entry of a method table.
#[derive(Clone)]
pub enum MethodDef {
    Generated {
        kind: MethodKind,
        /// Attribute the method operates on (`None` for whole-object methods).
        attr: Option<String>,
    },
    User(UserMethod),
}

impl fmt::Debug for MethodDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodDef::Generated { kind, attr } => f
                .debug_struct("Generated")
                .field("kind", kind)
                .field("attr", attr)
                .finish(),
            MethodDef::User(_) => write!(f, "User(..)"),
        }
    }
}

/// All methods available on a class, by name.
#[derive(Debug, Clone, Default)]
pub struct MethodTable {
    methods: BTreeMap<String, MethodDef>,
}

impl MethodTable {
    /// Synthesize the methods for `attrs`, keeping every name in `user`.
    pub fn synthesize(attrs: &[AttrSpec], user: &HashMap<String, UserMethod>) -> Self {
        let mut table = MethodTable::default();
        for (name, method) in user {
            table.methods.insert(name.clone(), MethodDef::User(method.clone()));
        }

        for kind in [MethodKind::Update, MethodKind::Transform, MethodKind::Reset] {
            table.add_generated(kind.prefix().to_string(), kind, None);
        }

        for attr in attrs.iter().filter(|a| a.managed) {
            for kind in [
                MethodKind::WithAttr,
                MethodKind::UpdateAttr,
                MethodKind::TransformAttr,
                MethodKind::ResetAttr,
            ] {
                let name = format!("{}{}", kind.prefix(), attr.name);
                table.add_generated(name, kind, Some(&attr.name));
            }

            if let (Some(_), Some(item)) = (attr.collection, attr.item_name.as_deref()) {
                for kind in [
                    MethodKind::GetItem,
                    MethodKind::WithItem,
                    MethodKind::UpdateItem,
                    MethodKind::TransformItem,
                    MethodKind::WithoutItem,
                ] {
                    let name = format!("{}{}", kind.prefix(), item);
                    table.add_generated(name, kind, Some(&attr.name));
                }
            }
        }
        table
    }

    /// Generated methods never clobber an existing entry.
    fn add_generated(&mut self, name: String, kind: MethodKind, attr: Option<&str>) {
        self.methods.entry(name).or_insert_with(|| MethodDef::Generated {
            kind,
            attr: attr.map(str::to_string),
        });
    }

    pub fn get(&self, name: &str) -> Option<&MethodDef> {
        self.methods.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Number of user-defined entries.
    pub fn user_count(&self) -> usize {
        self.methods
            .values()
            .filter(|m| matches!(m, MethodDef::User(_)))
            .count()
    }
}
