//! Shared class registries for scenarios.

use std::rc::Rc;

use valobj_core::{AttrDef, Call, ClassOptions, Registry, RegistryBuilder, TypeExpr, Value, ValueSet};
use valobj_mutation::{get_attr, with_attr};

fn empty_list() -> Value {
    Value::list(Vec::<Value>::new())
}

fn empty_set() -> Value {
    Value::Set(ValueSet::new())
}

fn empty_map() -> Value {
    Value::map(Vec::<(&str, Value)>::new())
}

/// The inventory domain.
///
/// - `Item(key, value, tags)`: keyed by `key`
/// - `Point(x, y)`: frozen
/// - `Shelf(label, items)`
/// - `Inventory`: one attribute per collection family, plus nested
///   `origin` and `shelf` objects and a cached `total` of `numbers`
///
/// `Inventory.with_name` is a user method that upper-cases the new name.
pub fn inventory() -> Rc<Registry> {
    let mut builder = RegistryBuilder::new();
    let declared = declare_inventory(&mut builder);
    match declared.and_then(|_| builder.build()) {
        Ok(registry) => registry,
        Err(e) => panic!("inventory registry: {}", e),
    }
}

fn declare_inventory(builder: &mut RegistryBuilder) -> valobj_core::SchemaResult<()> {
    builder
        .add_class("Item")
        .key("key")
        .attr(AttrDef::new("key", TypeExpr::Str))
        .attr(AttrDef::new("value", TypeExpr::Int).default(0i64))
        .attr(AttrDef::new("tags", TypeExpr::list(TypeExpr::Str)).default_factory(empty_list))
        .done()?;

    builder
        .add_class("Point")
        .frozen()
        .attr(AttrDef::new("x", TypeExpr::Int).default(0i64))
        .attr(AttrDef::new("y", TypeExpr::Int).default(0i64))
        .done()?;

    builder
        .add_class("Shelf")
        .attr(AttrDef::new("label", TypeExpr::Str).default(""))
        .attr(AttrDef::new("items", TypeExpr::list(TypeExpr::class("Item"))).default_factory(empty_list))
        .done()?;

    builder
        .add_class("Inventory")
        .attr(AttrDef::new("name", TypeExpr::Str).default(""))
        .attr(AttrDef::new("items", TypeExpr::list(TypeExpr::class("Item"))).default_factory(empty_list))
        .attr(
            AttrDef::new("entries", TypeExpr::map(TypeExpr::Str, TypeExpr::class("Item")))
                .default_factory(empty_map),
        )
        .attr(AttrDef::new("members", TypeExpr::set(TypeExpr::class("Item"))).default_factory(empty_set))
        .attr(AttrDef::new("scores", TypeExpr::map(TypeExpr::Str, TypeExpr::Int)).default_factory(empty_map))
        .attr(AttrDef::new("numbers", TypeExpr::list(TypeExpr::Int)).default_factory(empty_list))
        .attr(AttrDef::new("labels", TypeExpr::set(TypeExpr::Str)).default_factory(empty_set))
        .attr(AttrDef::new("origin", TypeExpr::optional(TypeExpr::class("Point"))))
        .attr(AttrDef::new("shelf", TypeExpr::class("Shelf")))
        .attr(
            AttrDef::new("total", TypeExpr::Int)
                .computed(|obj| {
                    let numbers = get_attr(obj, "numbers")?;
                    let total = numbers
                        .as_list()
                        .map_or(0, |items| items.iter().filter_map(Value::as_int).sum());
                    Ok(Value::Int(total))
                })
                .cached()
                .invalidated_by(["numbers"]),
        )
        .method("with_name", |obj, call| {
            let name = call
                .value
                .into_option()
                .and_then(|v| v.as_str().map(str::to_uppercase))
                .unwrap_or_default();
            with_attr(obj, "name", Call::new().value(name)).map(Value::Object)
        })
        .done()?;

    builder
        .add_class("Note")
        .options(ClassOptions::new().with_init_overflow_attr("extra"))
        .attr(AttrDef::new("text", TypeExpr::Str))
        .attr(AttrDef::new("extra", TypeExpr::map(TypeExpr::Str, TypeExpr::Any)).default_factory(empty_map))
        .done()
}

/// A two-level hierarchy for subclass and polymorphic checks.
///
/// `Shape(name)` with subclasses `Circle(radius)` and `Square(side)`;
/// `Drawing` holds a list of shapes and an optional `focus: Circle`.
pub fn shapes() -> Rc<Registry> {
    let mut builder = RegistryBuilder::new();
    let declared = declare_shapes(&mut builder);
    match declared.and_then(|_| builder.build()) {
        Ok(registry) => registry,
        Err(e) => panic!("shapes registry: {}", e),
    }
}

fn declare_shapes(builder: &mut RegistryBuilder) -> valobj_core::SchemaResult<()> {
    builder
        .add_class("Shape")
        .attr(AttrDef::new("name", TypeExpr::Str).default(""))
        .done()?;
    builder
        .add_class("Circle")
        .extends("Shape")
        .attr(AttrDef::new("radius", TypeExpr::Int).default(1i64))
        .done()?;
    builder
        .add_class("Square")
        .extends("Shape")
        .attr(AttrDef::new("side", TypeExpr::Int).default(1i64))
        .done()?;
    builder
        .add_class("Drawing")
        .attr(AttrDef::new("shapes", TypeExpr::list(TypeExpr::class("Shape"))).default_factory(empty_list))
        .attr(AttrDef::new("focus", TypeExpr::optional(TypeExpr::class("Circle"))))
        .done()
}

/// Aliased attributes on `Badge(key, origin: Point, meta, labels)`.
///
/// - `title` reads `key`; assignments are kept as a local override
/// - `x` writes through to `origin.x`
/// - `owner` writes through to `meta["owner"]` and reads `"nobody"` when unset
/// - `code` is `key` upper-cased
/// - `id` is a deprecated name for `key`
/// - `tags` writes through to the `labels` list
pub fn badges() -> Rc<Registry> {
    let mut builder = RegistryBuilder::new();
    let declared = declare_badges(&mut builder);
    match declared.and_then(|_| builder.build()) {
        Ok(registry) => registry,
        Err(e) => panic!("badges registry: {}", e),
    }
}

fn declare_badges(builder: &mut RegistryBuilder) -> valobj_core::SchemaResult<()> {
    builder
        .add_class("Point")
        .frozen()
        .attr(AttrDef::new("x", TypeExpr::Int).default(0i64))
        .done()?;
    builder
        .add_class("Badge")
        .attr(AttrDef::new("key", TypeExpr::Str))
        .attr(AttrDef::new("origin", TypeExpr::optional(TypeExpr::class("Point"))))
        .attr(AttrDef::new("meta", TypeExpr::map(TypeExpr::Str, TypeExpr::Str)).default_factory(empty_map))
        .attr(AttrDef::new("labels", TypeExpr::list(TypeExpr::Str)).default_factory(empty_list))
        .attr(AttrDef::new("title", TypeExpr::Str).alias("key"))
        .attr(AttrDef::new("x", TypeExpr::Int).alias("origin.x").passthrough())
        .attr(
            AttrDef::new("owner", TypeExpr::Str)
                .alias(r#"meta["owner"]"#)
                .passthrough()
                .fallback("nobody"),
        )
        .attr(
            AttrDef::new("code", TypeExpr::Str)
                .alias("key")
                .alias_transform(|v| Ok(Value::from(v.as_str().unwrap_or_default().to_uppercase()))),
        )
        .attr(AttrDef::new("id", TypeExpr::Str).deprecated_alias("key"))
        .attr(AttrDef::new("tags", TypeExpr::list(TypeExpr::Str)).alias("labels").passthrough())
        .done()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inventory_methods() {
        let registry = inventory();
        let class = registry.require_class("Inventory").unwrap();

        for name in ["with_item", "with_entry", "without_member", "update_score", "get_number", "with_label"] {
            assert!(class.method(name).is_some(), "missing {}", name);
        }
    }

    #[test]
    fn test_shapes_hierarchy() {
        let registry = shapes();

        assert!(registry.is_subclass("Circle", "Shape"));
        assert!(!registry.is_subclass("Shape", "Circle"));
    }

    #[test]
    fn test_badge_aliases_get_methods() {
        let registry = badges();
        let class = registry.require_class("Badge").unwrap();

        for name in ["with_title", "reset_owner", "with_tag", "without_tag"] {
            assert!(class.method(name).is_some(), "missing {}", name);
        }
        assert!(class.attr("x").unwrap().is_alias());
    }
}
