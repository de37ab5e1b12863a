//! Shared validation helpers for mutation operations.

use valobj_core::{
    AttrSpec, ClassDef, CollectionKind, MutationError, MutationResult, Registry, TypeExpr, Value,
};

/// Look up an attribute, failing with `UnknownAttribute`.
pub(crate) fn require_attr<'c>(class: &'c ClassDef, name: &str) -> MutationResult<&'c AttrSpec> {
    class
        .attr(name)
        .ok_or_else(|| MutationError::unknown_attribute(&class.name, name))
}

/// Look up a collection attribute and its kind.
pub(crate) fn require_collection<'c>(
    class: &'c ClassDef,
    name: &str,
) -> MutationResult<(&'c AttrSpec, CollectionKind)> {
    let attr = require_attr(class, name)?;
    match attr.collection {
        Some(kind) if attr.managed => Ok((attr, kind)),
        _ => Err(MutationError::not_a_collection(attr.qualified(&class.name))),
    }
}

/// Computed attributes only accept assignment when declared overridable.
pub(crate) fn ensure_writable(class: &ClassDef, attr: &AttrSpec) -> MutationResult<()> {
    match &attr.property {
        Some(property) if !property.overridable => {
            Err(MutationError::read_only(attr.qualified(&class.name)))
        }
        _ => Ok(()),
    }
}

/// Check a candidate value against the attribute's declared type.
///
/// Unmanaged attributes accept anything.
pub(crate) fn check_value(class: &ClassDef, attr: &AttrSpec, value: &Value) -> MutationResult<()> {
    if !attr.managed || attr.ty.check(value) {
        return Ok(());
    }
    Err(MutationError::type_mismatch(
        attr.qualified(&class.name),
        value.to_string(),
        attr.ty.label(),
    ))
}

/// Check that every nested keyword names an attribute of the nested type.
///
/// Value-object types accept their own attribute names (any name, with an
/// overflow attribute); record types accept their field names; plain maps
/// and `any` accept everything. Other types accept no keywords at all.
pub(crate) fn check_nested_keywords<'k>(
    registry: &Registry,
    method: &str,
    ty: &TypeExpr,
    keywords: impl IntoIterator<Item = &'k str>,
) -> MutationResult<()> {
    for keyword in keywords {
        if !accepts_keyword(registry, ty, keyword) {
            return Err(MutationError::invalid_keyword(method, keyword));
        }
    }
    Ok(())
}

fn accepts_keyword(registry: &Registry, ty: &TypeExpr, keyword: &str) -> bool {
    if let Some(class) = ty.value_object_class(true) {
        return registry.class(class).is_some_and(|c| {
            c.init_overflow_attr.is_some()
                || registry
                    .subclasses_of(class)
                    .iter()
                    .filter_map(|name| registry.class(name))
                    .any(|sub| sub.has_attr(keyword))
        });
    }
    match ty {
        TypeExpr::Any | TypeExpr::Map(_, _) => true,
        TypeExpr::Record(fields) => fields.iter().any(|f| f.name == keyword),
        TypeExpr::Union(arms) => arms.iter().any(|arm| accepts_keyword(registry, arm, keyword)),
        TypeExpr::Validated(v) => accepts_keyword(registry, &v.base, keyword),
        _ => false,
    }
}
