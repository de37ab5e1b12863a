//! Set attributes: identity, idempotent adds, and keyed members.

use valobj_core::ValueSet;
use pretty_assertions::assert_eq;
use valobj_tests::prelude::*;

fn labels<const N: usize>(values: [&str; N]) -> Value {
    Value::Set(ValueSet::from_values(values.into_iter().map(Value::from)).unwrap())
}

mod scalar_members {
    use super::*;

    pub fn scenario() -> Scenario {
        Scenario::new("scalar_members")
            .registry(fixtures::inventory())
            .start("Inventory", attrs! {})
            .step(
                "add",
                |inv| inv.with_item("labels", Call::new().value("red")),
                |a| a.attr("labels", labels(["red"])),
            )
            // Adding an equal member again is a no-op
            .step(
                "add_again",
                |inv| inv.with_item("labels", Call::new().value("red")),
                |a| a.attr("labels", labels(["red"])).new_object(),
            )
            .step(
                "replace_member",
                |inv| inv.with_item("labels", Call::new().target("red").value("blue")),
                |a| a.attr("labels", labels(["blue"])),
            )
            .step(
                "remove_absent",
                |inv| inv.without_item("labels", Call::new().target("green")),
                |a| {
                    a.error(MutationError::item_not_found("Inventory.labels", "\"green\""))
                        .unchanged()
                },
            )
            .step(
                "remove",
                |inv| inv.without_item("labels", Call::new().target("blue")),
                |a| a.len("labels", 0),
            )
    }

    #[test]
    fn test_scalar_set_members() {
        scenario().run().unwrap();
    }
}

mod keyed_members {
    use super::*;

    pub fn scenario() -> Scenario {
        Scenario::new("keyed_members")
            .registry(fixtures::inventory())
            .start("Inventory", attrs! {})
            .step(
                "add_a",
                |inv| inv.with_item("members", Call::new().attr("key", "a").attr("value", 1i64)),
                |a| a.keys("members", ["a"]),
            )
            // A bare key locates the member with that key
            .step(
                "patch_a",
                |inv| inv.with_item("members", Call::new().key("a").attr("value", 2i64)),
                |a| {
                    a.keys("members", ["a"]).assert_fn(|inv| {
                        inv.get_item("members", Call::new().key("a"))
                            .ok()
                            .and_then(|m| m.as_object()?.get("value").ok())
                            == Some(Value::Int(2))
                    })
                },
            )
            .step(
                "add_b",
                |inv| inv.with_item("members", Call::new().value("b")),
                |a| a.keys("members", ["a", "b"]),
            )
            // A different member with an existing identity collides
            .step(
                "rekey_into_collision",
                |inv| inv.update_item("members", Call::new().key("b").attr("key", "a")),
                |a| a.error(MutationError::key_collision("Inventory.members", "\"a\"")).unchanged(),
            )
            .step(
                "update_missing",
                |inv| inv.update_item("members", Call::new().key("z").attr("value", 1i64)),
                |a| a.error(MutationError::key_not_found("Inventory.members", "\"z\"")),
            )
            .step(
                "remove_by_key",
                |inv| inv.without_item("members", Call::new().key("a")),
                |a| a.keys("members", ["b"]),
            )
    }

    #[test]
    fn test_keyed_set_members() {
        scenario().run().unwrap();
    }
}

#[test]
fn test_list_assigned_to_set_is_converted() {
    let registry = fixtures::inventory();
    let inv = registry.instantiate("Inventory", attrs! {}).unwrap();

    let inv = inv
        .with_attr("labels", Call::new().value(Value::list(["b", "a", "b"])))
        .unwrap();

    assert_eq!(inv.get("labels").unwrap(), labels(["a", "b"]));
}

// ========== TEST: get_member_by_attribute_filters ==========
#[test]
fn test_get_member_by_attribute_filters() {
    let registry = fixtures::inventory();
    let inv = registry
        .instantiate("Inventory", attrs! {})
        .unwrap()
        .with_item("members", Call::new().attr("key", "a").attr("value", 1i64))
        .unwrap()
        .with_item("members", Call::new().attr("key", "b").attr("value", 2i64))
        .unwrap();

    let member = inv.get_item("members", Call::new().filter("value", 2i64)).unwrap();

    assert_eq!(member.as_object().unwrap().key_value(), Some(Value::from("b")));
    assert_eq!(
        inv.get_item("members", Call::new().filter("value", 5i64).missing_ok()).unwrap(),
        Value::Null
    );
    assert_eq!(inv.get_item("labels", Call::new().key("x").missing_ok()).unwrap(), Value::Null);
}
