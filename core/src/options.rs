//! Class-level declaration options.

use crate::types::TypeExpr;

/// Key declaration for a class.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum KeyOption {
    /// Use the parent's key, if any.
    #[default]
    Inherit,
    Key(String),
    /// Explicitly drop an inherited key.
    NoKey,
}

/// Options for a value-object class.
///
/// Unset options (`None`, `Inherit`) take the value of the first parent.
#[derive(Debug, Clone, Default)]
pub struct ClassOptions {
    pub key: KeyOption,
    pub frozen: Option<bool>,
    /// Share every attribute by reference on copy.
    pub do_not_copy: Option<bool>,
    /// Share only these attributes by reference on copy.
    pub do_not_copy_attrs: Vec<String>,
    /// Manage only these attributes; other declared attributes become plain fields.
    pub attrs: Option<Vec<String>>,
    /// Declare or re-type attributes; beats the type given on the attribute itself.
    pub attrs_typed: Vec<(String, TypeExpr)>,
    /// Attributes excluded from management.
    pub attrs_skip: Vec<String>,
    pub init_overflow_attr: Option<String>,
}

impl ClassOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = KeyOption::Key(key.into());
        self
    }

    pub fn without_key(mut self) -> Self {
        self.key = KeyOption::NoKey;
        self
    }

    pub fn with_frozen(mut self, frozen: bool) -> Self {
        self.frozen = Some(frozen);
        self
    }

    pub fn with_do_not_copy(mut self, do_not_copy: bool) -> Self {
        self.do_not_copy = Some(do_not_copy);
        self
    }

    pub fn with_do_not_copy_attrs<S: Into<String>>(mut self, attrs: impl IntoIterator<Item = S>) -> Self {
        self.do_not_copy_attrs.extend(attrs.into_iter().map(Into::into));
        self
    }

    pub fn with_attrs<S: Into<String>>(mut self, attrs: impl IntoIterator<Item = S>) -> Self {
        self.attrs = Some(attrs.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_attr_typed(mut self, name: impl Into<String>, ty: TypeExpr) -> Self {
        self.attrs_typed.push((name.into(), ty));
        self
    }

    pub fn with_attrs_skip<S: Into<String>>(mut self, attrs: impl IntoIterator<Item = S>) -> Self {
        self.attrs_skip.extend(attrs.into_iter().map(Into::into));
        self
    }

    pub fn with_init_overflow_attr(mut self, name: impl Into<String>) -> Self {
        self.init_overflow_attr = Some(name.into());
        self
    }
}

/// Options for rendering an object.
#[derive(Debug, Clone, PartialEq)]
pub struct ReprOptions {
    /// Attributes to render, in order; defaults to every attribute with `repr` set.
    pub include: Option<Vec<String>>,
    pub exclude: Vec<String>,
    /// `Some(true)` always indents, `Some(false)` never does, `None` decides by length.
    pub indent: Option<bool>,
    /// Length above which the single-line form is abandoned.
    pub threshold: usize,
}

impl Default for ReprOptions {
    fn default() -> Self {
        Self {
            include: None,
            exclude: Vec::new(),
            indent: None,
            threshold: 100,
        }
    }
}

impl ReprOptions {
    pub fn with_include<S: Into<String>>(mut self, attrs: impl IntoIterator<Item = S>) -> Self {
        self.include = Some(attrs.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_exclude<S: Into<String>>(mut self, attrs: impl IntoIterator<Item = S>) -> Self {
        self.exclude.extend(attrs.into_iter().map(Into::into));
        self
    }

    pub fn with_indent(mut self, indent: bool) -> Self {
        self.indent = Some(indent);
        self
    }

    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.threshold = threshold;
        self
    }
}
