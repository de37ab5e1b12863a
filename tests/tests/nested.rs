//! Nested patches: keyword arguments routed through the nested object's own methods.

use pretty_assertions::assert_eq;
use valobj_tests::prelude::*;

mod origin_patches {
    use super::*;

    pub fn scenario() -> Scenario {
        Scenario::new("origin_patches")
            .registry(fixtures::inventory())
            .start("Inventory", attrs! {})
            .step(
                "construct",
                |inv| inv.with_attr("origin", Call::new().attr("x", 1i64).attr("y", 2i64)),
                |a| a.attr("origin.x", 1i64).attr("origin.y", 2i64),
            )
            // Patching keeps the attributes that are not named
            .step(
                "patch_x",
                |inv| inv.with_attr("origin", Call::new().attr("x", 5i64)),
                |a| a.attr("origin.x", 5i64).attr("origin.y", 2i64).unchanged(),
            )
            // With replace, the nested value is rebuilt from the keywords alone
            .step(
                "replace",
                |inv| inv.with_attr("origin", Call::new().replace().attr("x", 7i64)),
                |a| a.attr("origin.x", 7i64).attr("origin.y", 0i64),
            )
            .step(
                "transform_nested_attr",
                |inv| {
                    inv.transform_attr(
                        "origin",
                        Call::new().attr_transform("y", |v| Ok(Value::Int(v.as_int().unwrap_or(0) - 1))),
                    )
                },
                |a| a.attr("origin.x", 7i64).attr("origin.y", -1i64),
            )
            .step(
                "unknown_nested_keyword",
                |inv| inv.with_attr("origin", Call::new().attr("z", 1i64)),
                |a| a.error(MutationError::invalid_keyword("with_origin", "z")).unchanged(),
            )
            .step(
                "nested_type_error",
                |inv| inv.with_attr("origin", Call::new().attr("x", "far")),
                |a| a.error_matches(r"`Point\.x` with an invalid type").unchanged(),
            )
    }

    #[test]
    fn test_nested_patches_on_frozen_child() {
        scenario().run().unwrap();
    }
}

mod shelf_items {
    use super::*;

    pub fn scenario() -> Scenario {
        Scenario::new("shelf_items")
            .registry(fixtures::inventory())
            .start("Inventory", attrs! {})
            .step(
                "construct_shelf",
                |inv| inv.with_attr("shelf", Call::new().attr("label", "top").attr("items", Value::list(["a", "b"]))),
                |a| a.attr("shelf.label", "top").keys("shelf.items", ["a", "b"]),
            )
            // A grandchild key collision surfaces unchanged
            .step(
                "duplicate_grandchild_keys",
                |inv| inv.with_attr("shelf", Call::new().attr("items", Value::list(["c", "c"]))),
                |a| a.error(MutationError::key_collision("Shelf.items", "\"c\"")).unchanged(),
            )
            .step(
                "update_several",
                |inv| {
                    inv.update(
                        Call::new()
                            .attr("name", "warehouse")
                            .attr("numbers", Value::list([1i64, 2])),
                    )
                },
                |a| {
                    a.attr("name", "warehouse")
                        .attr("numbers", Value::list([1i64, 2]))
                        .attr("shelf.label", "top")
                },
            )
            .step(
                "update_unknown_keyword",
                |inv| inv.update(Call::new().attr("colour", "red")),
                |a| a.error(MutationError::invalid_keyword("update", "colour")),
            )
    }

    #[test]
    fn test_nested_patches_keep_child_invariants() {
        scenario().run().unwrap();
    }
}

#[test]
fn test_nested_patch_matches_direct_patch() {
    // GIVEN an inventory with an origin
    let registry = fixtures::inventory();
    let inv = registry.instantiate("Inventory", attrs! {}).unwrap();
    let inv = inv.with_attr("origin", Call::new().attr("x", 1i64)).unwrap();
    let origin = inv.get("origin").unwrap().as_object().cloned().unwrap();

    // WHEN the origin is patched through its parent and directly
    let through_parent = inv.with_attr("origin", Call::new().attr("x", 10i64)).unwrap();
    let direct = origin.with_attr("x", Call::new().value(10i64)).unwrap();

    // THEN both produce equal children and the original child is untouched
    assert_eq!(through_parent.get("origin").unwrap(), Value::Object(direct));
    assert_eq!(origin.get("x").unwrap(), Value::Int(1));
}

#[test]
fn test_nested_error_matches_direct_error() {
    let registry = fixtures::inventory();
    let shelf = registry.instantiate("Shelf", attrs! {}).unwrap();
    let inv = registry
        .instantiate("Inventory", attrs! { "shelf" => shelf.clone() })
        .unwrap();

    let through_parent = inv
        .with_attr("shelf", Call::new().attr("items", Value::list(["a", "a"])))
        .unwrap_err();
    let direct = shelf
        .with_attr("items", Call::new().value(Value::list(["a", "a"])))
        .unwrap_err();

    assert_eq!(through_parent, direct);
}

#[test]
fn test_item_patch_reaches_grandchildren() {
    // GIVEN an item with tags
    let registry = fixtures::inventory();
    let inv = registry.instantiate("Inventory", attrs! {}).unwrap();
    let inv = inv
        .with_item("items", Call::new().attr("key", "a").attr("tags", Value::list(["x"])))
        .unwrap();

    // WHEN the tags of that item are transformed through the collection
    let inv = inv
        .transform_item(
            "items",
            Call::new().key("a").attr_transform("tags", |tags| {
                let mut tags = tags.as_list().map(<[Value]>::to_vec).unwrap_or_default();
                tags.push(Value::from("y"));
                Ok(Value::List(tags))
            }),
        )
        .unwrap();

    // THEN
    let item = inv.get_item("items", Call::new().key("a")).unwrap();
    assert_eq!(
        item.as_object().unwrap().get("tags").unwrap(),
        Value::list(["x", "y"])
    );
}

#[test]
fn test_polymorphic_item_keywords() {
    let registry = fixtures::shapes();
    let drawing = registry.instantiate("Drawing", attrs! {}).unwrap();
    let circle = registry.instantiate("Circle", attrs! { "radius" => 3i64 }).unwrap();

    // Subclass attributes are accepted for an item declared as the base class
    let drawing = drawing.with_item("shapes", Call::new().value(circle)).unwrap();
    let drawing = drawing
        .update_item("shapes", Call::new().index(0).attr("radius", 4i64))
        .unwrap();

    let shape = drawing.get_item("shapes", Call::new().index(0)).unwrap();
    let shape = shape.as_object().unwrap();
    assert_eq!(shape.class_name(), "Circle");
    assert_eq!(shape.get("radius").unwrap(), Value::Int(4));
    assert_eq!(
        drawing
            .update_item("shapes", Call::new().index(0).attr("sides", 4i64))
            .unwrap_err(),
        MutationError::invalid_keyword("update_shape", "sides")
    );
}
