//! Mapping attributes: upserts, strict updates, and keyed entries.

use pretty_assertions::assert_eq;
use valobj_tests::prelude::*;

fn entry_value(inv: &Object, key: &str) -> Option<i64> {
    let entry = inv.get_item("entries", Call::new().key(key)).ok()?;
    entry.as_object()?.get("value").ok()?.as_int()
}

mod scores {
    use super::*;

    pub fn scenario() -> Scenario {
        Scenario::new("scores")
            .registry(fixtures::inventory())
            .start("Inventory", attrs! {})
            .step(
                "upsert_new",
                |inv| inv.with_item("scores", Call::new().key("alice").value(1i64)),
                |a| a.attr("scores", Value::map([("alice", 1i64)])),
            )
            .step(
                "upsert_existing",
                |inv| inv.with_item("scores", Call::new().key("alice").value(5i64)),
                |a| a.attr("scores", Value::map([("alice", 5i64)])),
            )
            // update_ never inserts
            .step(
                "update_missing",
                |inv| inv.update_item("scores", Call::new().key("bob").value(2i64)),
                |a| {
                    a.error(MutationError::key_not_found("Inventory.scores", "\"bob\""))
                        .unchanged()
                },
            )
            .step(
                "transform_existing",
                |inv| {
                    inv.transform_item(
                        "scores",
                        Call::new()
                            .key("alice")
                            .transform(|v| Ok(Value::Int(v.as_int().unwrap_or(0) + 1))),
                    )
                },
                |a| a.attr("scores", Value::map([("alice", 6i64)])),
            )
            .step(
                "value_without_key",
                |inv| inv.with_item("scores", Call::new().value(3i64)),
                |a| a.error(MutationError::missing_argument("with_score", "key")),
            )
            .step(
                "wrong_key_type",
                |inv| inv.with_item("scores", Call::new().key(1i64).value(3i64)),
                |a| a.error_matches("invalid type").unchanged(),
            )
            .step(
                "remove",
                |inv| inv.without_item("scores", Call::new().key("alice")),
                |a| a.len("scores", 0),
            )
    }

    #[test]
    fn test_mapping_upsert_versus_update() {
        scenario().run().unwrap();
    }
}

mod keyed_entries {
    use super::*;

    pub fn scenario() -> Scenario {
        Scenario::new("keyed_entries")
            .registry(fixtures::inventory())
            .start("Inventory", attrs! {})
            // The entry key comes from the item's own key attribute
            .step(
                "add_from_attrs",
                |inv| inv.with_item("entries", Call::new().attr("key", "a").attr("value", 1i64)),
                |a| a.keys("entries", ["a"]).assert_fn(|inv| entry_value(inv, "a") == Some(1)),
            )
            .step(
                "add_bare_key",
                |inv| inv.with_item("entries", Call::new().value("b")),
                |a| a.keys("entries", ["a", "b"]).assert_fn(|inv| entry_value(inv, "b") == Some(0)),
            )
            .step(
                "patch_by_key",
                |inv| inv.update_item("entries", Call::new().key("b").attr("value", 9i64)),
                |a| a.assert_fn(|inv| entry_value(inv, "b") == Some(9)),
            )
            // Changing an item's key moves its entry
            .step(
                "rekey",
                |inv| inv.update_item("entries", Call::new().key("b").attr("key", "c")),
                |a| a.keys("entries", ["a", "c"]).assert_fn(|inv| entry_value(inv, "c") == Some(9)),
            )
            .step(
                "rekey_into_collision",
                |inv| inv.update_item("entries", Call::new().key("c").attr("key", "a")),
                |a| a.error(MutationError::key_collision("Inventory.entries", "\"a\"")).unchanged(),
            )
            .step(
                "nested_keyword_typo",
                |inv| inv.with_item("entries", Call::new().key("a").attr("valeu", 1i64)),
                |a| a.error(MutationError::invalid_keyword("with_entry", "valeu")),
            )
    }

    #[test]
    fn test_keyed_entries_follow_their_keys() {
        scenario().run().unwrap();
    }
}

#[test]
fn test_assign_list_to_keyed_mapping() {
    // GIVEN
    let registry = fixtures::inventory();
    let inv = registry.instantiate("Inventory", attrs! {}).unwrap();

    // WHEN a list of bare keys is assigned to a mapping of keyed items
    let inv = inv
        .with_attr("entries", Call::new().value(Value::list(["x", "y"])))
        .unwrap();

    // THEN each key becomes an entry holding an item with that key
    let entries = inv.get("entries").unwrap();
    let keys: Vec<String> = entries.as_map().unwrap().keys().map(|k| k.to_string()).collect();
    assert_eq!(keys, vec!["\"x\"", "\"y\""]);
}

// ========== TEST: get_entry_by_attribute_filters ==========
#[test]
fn test_get_entry_by_attribute_filters() {
    // GIVEN two entries with the same value
    let registry = fixtures::inventory();
    let inv = registry
        .instantiate("Inventory", attrs! {})
        .unwrap()
        .with_item("entries", Call::new().attr("key", "a").attr("value", 3i64))
        .unwrap()
        .with_item("entries", Call::new().attr("key", "b").attr("value", 3i64))
        .unwrap();

    // WHEN
    let all = inv
        .get_item("entries", Call::new().filter("value", 3i64).all_matches())
        .unwrap();

    // THEN
    assert_eq!(all.as_list().unwrap().len(), 2);
    assert_eq!(inv.get_item("entries", Call::new().key("z").missing_ok()).unwrap(), Value::Null);
    assert_eq!(
        inv.get_item("scores", Call::new().filter("value", 1i64)).unwrap_err(),
        MutationError::invalid_keyword("get_score", "value")
    );
}
