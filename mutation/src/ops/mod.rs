//! Mutation operation implementations.
//!
//! Each family of generated methods lives in its own module:
//! - `attr` - `with_`/`update_`/`transform_`/`reset_` on a single attribute
//! - `item` - the singular item methods of collection attributes
//! - `object` - whole-object `update`/`transform`/`reset`

pub(crate) mod attr;
pub(crate) mod item;
pub(crate) mod object;
