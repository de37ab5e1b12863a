//! valobj Core
//!
//! This crate provides the schema and data model for value objects:
//! - Values (the `Value` enum, hashable `Key`s, `ValueSet`)
//! - The `Maybe` sentinel separating "not supplied" from explicit null
//! - Type expressions and their classification (`TypeExpr`)
//! - Attribute and class definitions, built through `RegistryBuilder`
//! - Method tables synthesized for each class
//! - The `Object` instance handle (slots, equality, representation, deep copy)
//! - Error types shared with the mutation engine

mod attr;
mod builder;
mod call;
mod class;
mod error;
mod methods;
mod missing;
pub mod naming;
mod object;
mod options;
mod registry;
mod types;
mod value;

pub use attr::{
    Alias, AliasStep, AttrDef, AttrDefault, AttrSpec, DefaultFactory, Getter, Preparer, Property,
};
pub use builder::{ClassBuilder, RegistryBuilder};
pub use call::{Call, CallArg, Transform};
pub use class::{ClassDef, PostInit, ANY_ATTR};
pub use error::{MutationError, MutationResult, SchemaError, SchemaResult};
pub use methods::{MethodDef, MethodKind, MethodTable, UserMethod};
pub use missing::{Maybe, Missing, Present};
pub use object::Object;
pub use options::{ClassOptions, KeyOption, ReprOptions};
pub use registry::Registry;
pub use types::{Bounds, CollectionKind, RecordField, TypeExpr, Validated, Validator};
pub use value::{Attrs, Key, Value, ValueMap, ValueSet};
