//! valobj Mutation
//!
//! The mutation engine behind the generated methods of value objects.
//!
//! Responsibilities:
//! - Construct instances and run their lifecycle hooks
//! - Fold replacements, nested patches, and transforms into values
//! - Locate, insert, and remove collection items
//! - Enforce types, frozen instances, and attribute invalidation
//!
//! # Module Structure
//!
//! - `mutate` - `mutate_value`, the primitive every operation is built on
//! - `lifecycle` - construction, attribute access, defaults, and invalidation
//! - `alias` - reading and writing through aliased attribute paths
//! - `collections/` - sequence, mapping, and set mutators
//! - `ops/` - attribute, item, and whole-object operations
//! - `executor` - dispatch of methods by name
//! - `ext` - the `Mutate` and `Instantiate` extension traits
//! - `validation` - shared checks

mod alias;
mod collections;
mod executor;
mod ext;
mod lifecycle;
mod mutate;
mod ops;
mod validation;

pub use executor::invoke;
pub use ext::{Instantiate, Mutate};
pub use lifecycle::{delete_attr, get_attr, instantiate, set_attr};
pub use mutate::{mutate_value, Constructor, ValueMutation};
pub use ops::attr::{reset_attr, transform_attr, update_attr, with_attr};
pub use ops::item::{get_item, transform_item, update_item, with_item, without_item};
pub use ops::object::{reset, transform, update};
pub use valobj_core::{MutationError, MutationResult};
