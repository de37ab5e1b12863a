//! Error types for value-object declaration and mutation.
//!
//! `SchemaError` is raised while classes are being declared; `MutationError`
//! is raised at runtime by object access and the mutation engine. Runtime
//! messages always carry the qualified `Type.attr` name.

use thiserror::Error;

/// Result type for runtime object operations.
pub type MutationResult<T> = Result<T, MutationError>;

/// Result type for class declaration.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors raised while operating on value-object instances.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MutationError {
    #[error("Attempt to set `{attr}` with an invalid type [got `{value}`; expecting `{expected}`].")]
    TypeMismatch {
        attr: String,
        value: String,
        expected: String,
    },

    #[error("Attempted to add an invalid item `{item}` to `{attr}`. Expected item of type `{expected}`.")]
    InvalidItem {
        attr: String,
        item: String,
        expected: String,
    },

    #[error("Cannot mutate attribute `{attr}` of a frozen `{type_name}` instance.")]
    FrozenInstance { type_name: String, attr: String },

    #[error("`{type_name}` instance does not have attribute `{attr}` set.")]
    Unassigned { type_name: String, attr: String },

    #[error("`{type_name}` has no attribute `{attr}`.")]
    UnknownAttribute { type_name: String, attr: String },

    #[error("Attribute `{attr}` is read-only.")]
    ReadOnlyAttribute { attr: String },

    #[error("Key `{key}` not found in collection `{attr}`.")]
    KeyNotFound { attr: String, key: String },

    #[error("Index `{index}` not found in collection `{attr}`.")]
    IndexOutOfRange { attr: String, index: String },

    #[error("Item `{item}` not found in collection `{attr}`.")]
    ItemNotFound { attr: String, item: String },

    #[error("Item with key `{key}` already in collection `{attr}`.")]
    KeyCollision { attr: String, key: String },

    #[error("Invalid index `{index}` for collection `{attr}`.")]
    InvalidIndex { attr: String, index: String },

    #[error("Item `{item}` in collection `{attr}` has no usable key.")]
    Unhashable { attr: String, item: String },

    #[error("`{method}` got an unexpected keyword argument `{keyword}`.")]
    InvalidKeyword { method: String, keyword: String },

    #[error("`{method}` does not accept the `{argument}` argument.")]
    UnexpectedArgument { method: String, argument: String },

    #[error("`{method}` requires the `{argument}` argument.")]
    MissingArgument { method: String, argument: String },

    #[error("Cannot use attrs or transforms on a missing value without a constructor (`{context}`).")]
    MissingValue { context: String },

    #[error("`{attr}` is not a collection.")]
    NotACollection { attr: String },

    #[error("`{type_name}` has no method `{method}`.")]
    UnknownMethod { type_name: String, method: String },

    #[error("Unknown value-object class: {name}")]
    UnknownClass { name: String },

    #[error("Alias `{attr}` cannot follow `{path}` on the current value.")]
    BrokenAlias { attr: String, path: String },

    #[error("{message}")]
    Custom { message: String },
}

impl MutationError {
    pub fn type_mismatch(
        attr: impl Into<String>,
        value: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            attr: attr.into(),
            value: value.into(),
            expected: expected.into(),
        }
    }

    pub fn invalid_item(
        attr: impl Into<String>,
        item: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self::InvalidItem {
            attr: attr.into(),
            item: item.into(),
            expected: expected.into(),
        }
    }

    pub fn frozen_instance(type_name: impl Into<String>, attr: impl Into<String>) -> Self {
        Self::FrozenInstance {
            type_name: type_name.into(),
            attr: attr.into(),
        }
    }

    pub fn unassigned(type_name: impl Into<String>, attr: impl Into<String>) -> Self {
        Self::Unassigned {
            type_name: type_name.into(),
            attr: attr.into(),
        }
    }

    pub fn unknown_attribute(type_name: impl Into<String>, attr: impl Into<String>) -> Self {
        Self::UnknownAttribute {
            type_name: type_name.into(),
            attr: attr.into(),
        }
    }

    pub fn read_only(attr: impl Into<String>) -> Self {
        Self::ReadOnlyAttribute { attr: attr.into() }
    }

    pub fn key_not_found(attr: impl Into<String>, key: impl Into<String>) -> Self {
        Self::KeyNotFound {
            attr: attr.into(),
            key: key.into(),
        }
    }

    pub fn index_out_of_range(attr: impl Into<String>, index: impl Into<String>) -> Self {
        Self::IndexOutOfRange {
            attr: attr.into(),
            index: index.into(),
        }
    }

    pub fn item_not_found(attr: impl Into<String>, item: impl Into<String>) -> Self {
        Self::ItemNotFound {
            attr: attr.into(),
            item: item.into(),
        }
    }

    pub fn key_collision(attr: impl Into<String>, key: impl Into<String>) -> Self {
        Self::KeyCollision {
            attr: attr.into(),
            key: key.into(),
        }
    }

    pub fn invalid_index(attr: impl Into<String>, index: impl Into<String>) -> Self {
        Self::InvalidIndex {
            attr: attr.into(),
            index: index.into(),
        }
    }

    pub fn unhashable(attr: impl Into<String>, item: impl Into<String>) -> Self {
        Self::Unhashable {
            attr: attr.into(),
            item: item.into(),
        }
    }

    pub fn invalid_keyword(method: impl Into<String>, keyword: impl Into<String>) -> Self {
        Self::InvalidKeyword {
            method: method.into(),
            keyword: keyword.into(),
        }
    }

    pub fn unexpected_argument(method: impl Into<String>, argument: impl Into<String>) -> Self {
        Self::UnexpectedArgument {
            method: method.into(),
            argument: argument.into(),
        }
    }

    pub fn missing_argument(method: impl Into<String>, argument: impl Into<String>) -> Self {
        Self::MissingArgument {
            method: method.into(),
            argument: argument.into(),
        }
    }

    pub fn missing_value(context: impl Into<String>) -> Self {
        Self::MissingValue {
            context: context.into(),
        }
    }

    pub fn not_a_collection(attr: impl Into<String>) -> Self {
        Self::NotACollection { attr: attr.into() }
    }

    pub fn unknown_method(type_name: impl Into<String>, method: impl Into<String>) -> Self {
        Self::UnknownMethod {
            type_name: type_name.into(),
            method: method.into(),
        }
    }

    pub fn unknown_class(name: impl Into<String>) -> Self {
        Self::UnknownClass { name: name.into() }
    }

    pub fn broken_alias(attr: impl Into<String>, path: impl Into<String>) -> Self {
        Self::BrokenAlias {
            attr: attr.into(),
            path: path.into(),
        }
    }

    /// Error raised from user-supplied hooks (getters, post-init, methods).
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom {
            message: message.into(),
        }
    }

    /// True for the "target must already exist" family of errors.
    pub fn is_missing_target(&self) -> bool {
        matches!(
            self,
            Self::KeyNotFound { .. }
                | Self::IndexOutOfRange { .. }
                | Self::ItemNotFound { .. }
                | Self::Unassigned { .. }
        )
    }
}

/// Errors raised while declaring value-object classes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("Duplicate class name: {0}")]
    DuplicateClass(String),

    #[error("Unknown parent class: {0}")]
    UnknownParent(String),

    #[error("`{attr}` refers to unknown value-object class `{class}`")]
    UnknownClassReference { attr: String, class: String },

    #[error("Private attribute `{attr}` cannot be managed")]
    PrivateAttribute { attr: String },

    #[error("`{attr}` is a sequence of items keyed by an integer; use a mapping instead")]
    IntegralSequenceKey { attr: String },

    #[error("`{attr}` declares both a default value and a default factory")]
    ConflictingDefaults { attr: String },

    #[error("Key attribute `{key}` is not an attribute of `{class}`")]
    UnknownKeyAttribute { class: String, key: String },

    #[error("Key attribute `{class}.{key}` must be settable from the constructor")]
    KeyNotInitializable { class: String, key: String },

    #[error("`{attr}` is invalidated by unknown attribute `{trigger}`")]
    UnknownInvalidator { attr: String, trigger: String },

    #[error("`{attr}` holds a set of `{item}`, which has no hashable identity")]
    UnhashableSetItem { attr: String, item: String },

    #[error("`{attr}` is a mapping keyed by `{key}`, which is not hashable")]
    UnhashableMapKey { attr: String, key: String },

    #[error("`{class}` asks to manage unknown attribute `{attr}`")]
    UnknownManagedAttribute { class: String, attr: String },

    #[error("Overflow attribute `{class}.{attr}` must be a mapping")]
    InvalidOverflowAttribute { class: String, attr: String },

    #[error("Invalid pattern `{pattern}`: {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("`{attr}` aliases malformed path `{path}`")]
    InvalidAliasPath { attr: String, path: String },

    #[error("`{attr}` aliases unknown attribute `{target}`")]
    UnknownAliasTarget { attr: String, target: String },

    #[error("`{attr}` is part of an alias cycle")]
    CyclicAlias { attr: String },

    #[error("`{attr}` declares both an alias and a computed getter")]
    ConflictingAlias { attr: String },
}
