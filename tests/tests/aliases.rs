//! Aliased attributes: local overrides, passthrough writes, fallbacks.

use pretty_assertions::assert_eq;
use valobj_tests::prelude::*;

mod local_override {
    use super::*;

    pub fn scenario() -> Scenario {
        Scenario::new("local_override")
            .registry(fixtures::badges())
            .start("Badge", attrs! { "key" => "a" })
            .step(
                "reads_through",
                |b| Ok(b.clone()),
                |a| a.attr("title", "a").attr("code", "A").attr("owner", "nobody").unset("x"),
            )
            .step(
                "with_title",
                |b| b.with_attr("title", Call::new().value("b")),
                |a| a.attr("title", "b").attr("key", "a").attr("code", "A").new_object().unchanged(),
            )
            .step(
                "reset_title",
                |b| b.reset_attr("title", Call::new()),
                |a| a.attr("title", "a"),
            )
            .step(
                "transformed_alias_is_type_checked",
                |b| b.with_attr("code", Call::new().value(1i64)),
                |a| a.error_matches(r"`Badge\.code` with an invalid type").unchanged(),
            )
    }

    #[test]
    fn test_local_override() {
        scenario().run().unwrap();
    }
}

mod passthrough {
    use super::*;

    pub fn scenario() -> Scenario {
        Scenario::new("passthrough")
            .registry(fixtures::badges())
            .start("Badge", attrs! { "key" => "a" })
            .step(
                "with_origin",
                |b| b.with_attr("origin", Call::new().attr("x", 1i64)),
                |a| a.attr("x", 1i64),
            )
            .step(
                "with_x",
                |b| b.with_attr("x", Call::new().value(5i64)),
                |a| a.attr("origin.x", 5i64).attr("x", 5i64).unchanged(),
            )
            .step(
                "reset_x",
                |b| b.reset_attr("x", Call::new()),
                |a| a.attr("origin.x", 0i64),
            )
            .step(
                "with_owner",
                |b| b.with_attr("owner", Call::new().value("ann")),
                |a| a.attr("meta", Value::map([("owner", "ann")])).attr("owner", "ann"),
            )
            .step(
                "reset_owner",
                |b| b.reset_attr("owner", Call::new()),
                |a| a.attr("owner", "nobody").len("meta", 0),
            )
            .step(
                "reset_owner_again",
                |b| b.reset_attr("owner", Call::new()),
                |a| {
                    a.error(MutationError::key_not_found("Badge.owner", "owner"))
                        .missing_target()
                        .unchanged()
                },
            )
            .step(
                "with_deprecated_id",
                |b| b.with_attr("id", Call::new().value("z")),
                |a| a.attr("key", "z").attr("title", "z").attr("id", "z"),
            )
            .step(
                "with_tag",
                |b| b.with_item("tags", Call::new().value("red")),
                |a| a.attr("labels", Value::list(["red"])).attr("tags", Value::list(["red"])),
            )
            .step(
                "without_tag",
                |b| b.without_item("tags", Call::new().index(0)),
                |a| a.len("labels", 0),
            )
    }

    #[test]
    fn test_passthrough() {
        scenario().run().unwrap();
    }
}

#[test]
fn test_aliases_stay_out_of_constructor() {
    let registry = fixtures::badges();

    let err = registry.instantiate("Badge", attrs! { "title" => "t" }).unwrap_err();

    assert_eq!(err, MutationError::invalid_keyword("Badge()", "title"));
}

#[test]
fn test_override_is_not_compared() {
    // GIVEN two equal badges
    let registry = fixtures::badges();
    let a = registry.instantiate("Badge", attrs! { "key" => "k" }).unwrap();
    let b = registry.instantiate("Badge", attrs! { "key" => "k" }).unwrap();

    // WHEN only one carries a local override
    a.set("title", "other").unwrap();

    // THEN they still compare equal
    assert_eq!(a.get("title").unwrap(), Value::from("other"));
    assert_eq!(a, b);
}

#[test]
fn test_passthrough_on_frozen_nested_value_copies() {
    let registry = fixtures::badges();
    let origin = registry.instantiate("Point", attrs! { "x" => 2i64 }).unwrap();
    let badge = registry.instantiate("Badge", attrs! { "key" => "k", "origin" => origin.clone() }).unwrap();

    badge.set("x", 9i64).unwrap();

    assert_eq!(badge.get("x").unwrap(), Value::Int(9));
    assert_eq!(origin.get("x").unwrap(), Value::Int(2));
}
