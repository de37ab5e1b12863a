//! Instance lifecycle: construction, copy-on-write, invalidation, equality.

use pretty_assertions::assert_eq;
use valobj_tests::prelude::*;

mod computed_total {
    use super::*;

    fn read_total(inv: &Object) -> Result<Object, MutationError> {
        inv.get("total")?;
        Ok(inv.clone())
    }

    pub fn scenario() -> Scenario {
        Scenario::new("computed_total")
            .registry(fixtures::inventory())
            .start("Inventory", attrs! { "numbers" => Value::list([1i64, 2]) })
            .step("read", read_total, |a| a.attr("total", 3i64).same_object())
            // Mutating the trigger drops the cached value
            .step(
                "append_inplace",
                |inv| inv.with_item("numbers", Call::new().value(4i64).inplace()),
                |a| a.same_object().attr("total", 7i64),
            )
            .step(
                "copy_recomputes",
                |inv| inv.with_attr("numbers", Call::new().value(Value::list([10i64]))),
                |a| a.new_object().attr("total", 10i64),
            )
            .step(
                "reset_recomputes",
                |inv| inv.reset_attr("numbers", Call::new()),
                |a| a.attr("total", 0i64),
            )
            .step(
                "unrelated_attr_keeps_total",
                |inv| inv.with_attr("name", Call::new().value("x")),
                |a| a.attr("total", 0i64).attr("name", "x"),
            )
    }

    #[test]
    fn test_computed_attribute_invalidation() {
        scenario().run().unwrap();
    }
}

mod copy_on_write {
    use super::*;

    pub fn scenario() -> Scenario {
        Scenario::new("copy_on_write")
            .registry(fixtures::inventory())
            .start("Inventory", attrs! { "name" => "a", "numbers" => Value::list([1i64]) })
            .step(
                "copy",
                |inv| inv.with_item("numbers", Call::new().value(2i64)),
                |a| a.new_object().unchanged().attr("numbers", Value::list([1i64, 2])),
            )
            .step(
                "inplace",
                |inv| inv.with_item("numbers", Call::new().value(3i64).inplace()),
                |a| a.same_object().attr("numbers", Value::list([1i64, 2, 3])),
            )
            .step(
                "update_inplace",
                |inv| inv.update(Call::new().attr("name", "b").inplace()),
                |a| a.same_object().attr("name", "b").attr("numbers", Value::list([1i64, 2, 3])),
            )
            .step(
                "transform_whole_object",
                |inv| {
                    inv.transform(Call::new().transform(|v| {
                        let obj = v.as_object().cloned().ok_or_else(|| MutationError::custom("not an object"))?;
                        obj.with_attr("name", Call::new().value("c")).map(Value::Object)
                    }))
                },
                |a| a.new_object().unchanged().attr("name", "c"),
            )
            .step(
                "reset_inplace",
                |inv| inv.reset(Call::new().inplace()),
                |a| a.same_object().attr("name", "").len("numbers", 0),
            )
    }

    #[test]
    fn test_copy_on_write_and_inplace() {
        scenario().run().unwrap();
    }
}

#[test]
fn test_construction_defaults_and_keywords() {
    let registry = fixtures::inventory();

    let inv = registry.instantiate("Inventory", attrs! { "name" => "depot" }).unwrap();

    assert_eq!(inv.get("name").unwrap(), Value::from("depot"));
    assert_eq!(inv.get("numbers").unwrap(), Value::list(Vec::<Value>::new()));
    assert_eq!(
        registry.instantiate("Inventory", attrs! { "colour" => "red" }).unwrap_err(),
        MutationError::invalid_keyword("Inventory()", "colour")
    );
    assert!(matches!(
        registry.instantiate("Inventory", attrs! { "numbers" => "1, 2" }),
        Err(MutationError::TypeMismatch { .. })
    ));
    assert_eq!(
        registry.instantiate("Warehouse", attrs! {}).unwrap_err(),
        MutationError::unknown_class("Warehouse")
    );
}

#[test]
fn test_default_factories_are_not_shared() {
    let registry = fixtures::inventory();
    let first = registry.instantiate("Inventory", attrs! {}).unwrap();
    let second = registry.instantiate("Inventory", attrs! {}).unwrap();

    first.with_item("numbers", Call::new().value(1i64).inplace()).unwrap();

    assert_eq!(second.get("numbers").unwrap(), Value::list(Vec::<Value>::new()));
}

#[test]
fn test_overflow_keywords() {
    let registry = fixtures::inventory();

    let note = registry
        .instantiate("Note", attrs! { "text" => "hi", "mood" => "calm" })
        .unwrap();

    assert_eq!(note.get("extra").unwrap(), Value::map([("mood", "calm")]));
    assert_eq!(note.get("text").unwrap(), Value::from("hi"));
}

#[test]
fn test_deep_copy_is_independent() {
    // GIVEN an inventory holding an item
    let registry = fixtures::inventory();
    let inv = registry
        .instantiate("Inventory", attrs! {})
        .unwrap()
        .with_item("items", Call::new().attr("key", "a"))
        .unwrap();

    // WHEN the copy's item is patched in place
    let copy = inv.deep_copy();
    copy.update_item("items", Call::new().key("a").attr("value", 5i64).inplace())
        .unwrap();

    // THEN the original is untouched and the two no longer compare equal
    let item = inv.get_item("items", Call::new().key("a")).unwrap();
    assert_eq!(item.as_object().unwrap().get("value").unwrap(), Value::Int(0));
    assert_ne!(inv, copy);
    assert_eq!(inv, inv.deep_copy());
}

#[test]
fn test_equality_is_structural() {
    let registry = fixtures::inventory();
    let a = registry.instantiate("Point", attrs! { "x" => 1i64 }).unwrap();
    let b = registry.instantiate("Point", attrs! { "x" => 1i64, "y" => 0i64 }).unwrap();
    let c = registry.instantiate("Point", attrs! { "x" => 2i64 }).unwrap();

    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(a.to_string(), "Point(x=1, y=0)");
}
