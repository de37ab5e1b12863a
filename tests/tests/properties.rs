//! Randomized checks against simple models, with fixed seeds.

use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::rc::Rc;
use valobj_core::{AttrDef, Registry, RegistryBuilder, TypeExpr};
use valobj_tests::prelude::*;

const SEEDS: [u64; 4] = [1, 7, 42, 2024];
const STEPS: usize = 60;
const KEYS: [&str; 4] = ["a", "b", "c", "d"];

fn numbers(inv: &Object) -> Vec<i64> {
    inv.get("numbers")
        .unwrap()
        .as_list()
        .unwrap()
        .iter()
        .map(|v| v.as_int().unwrap())
        .collect()
}

fn items(inv: &Object) -> Vec<(String, i64)> {
    inv.get("items")
        .unwrap()
        .as_list()
        .unwrap()
        .iter()
        .map(|item| {
            let item = item.as_object().unwrap();
            let key = item.get("key").unwrap().as_str().unwrap().to_string();
            let value = item.get("value").unwrap().as_int().unwrap();
            (key, value)
        })
        .collect()
}

// ========== TEST: sequence_ops_match_vec_model ==========
#[test]
fn test_sequence_ops_match_vec_model() {
    for seed in SEEDS {
        // GIVEN an empty list and its model
        let mut rng = StdRng::seed_from_u64(seed);
        let registry = fixtures::inventory();
        let mut inv = registry.instantiate("Inventory", attrs! {}).unwrap();
        let mut model: Vec<i64> = Vec::new();

        // WHEN random positional operations are applied to both
        for _ in 0..STEPS {
            let value = rng.gen_range(0..100i64);
            let inplace = rng.gen_bool(0.5);
            let call = |c: Call| if inplace { c.inplace() } else { c };
            let len = model.len() as i64;
            match rng.gen_range(0..4) {
                0 => {
                    inv = inv.with_item("numbers", call(Call::new().value(value))).unwrap();
                    model.push(value);
                }
                1 => {
                    let index = rng.gen_range(-(len + 1)..=len + 1);
                    let result = inv.with_item("numbers", call(Call::new().index(index).value(value).insert()));
                    inv = result.unwrap();
                    let at = if index < 0 { (len + index).max(0) } else { index.min(len) };
                    model.insert(at as usize, value);
                }
                2 if len > 0 => {
                    let index = rng.gen_range(-len..len);
                    inv = inv.with_item("numbers", call(Call::new().index(index).value(value))).unwrap();
                    let at = if index < 0 { len + index } else { index };
                    model[at as usize] = value;
                }
                3 if len > 0 => {
                    let index = rng.gen_range(0..len);
                    inv = inv.without_item("numbers", call(Call::new().index(index))).unwrap();
                    model.remove(index as usize);
                }
                _ => {
                    let err = inv
                        .update_item("numbers", call(Call::new().index(len).value(value)))
                        .unwrap_err();
                    assert!(err.is_missing_target());
                }
            }

            // THEN the list always matches the model
            assert_eq!(numbers(&inv), model, "seed {}", seed);
        }
    }
}

// ========== TEST: keyed_sequence_never_duplicates_keys ==========
#[test]
fn test_keyed_sequence_never_duplicates_keys() {
    for seed in SEEDS {
        let mut rng = StdRng::seed_from_u64(seed);
        let registry = fixtures::inventory();
        let mut inv = registry.instantiate("Inventory", attrs! {}).unwrap();
        let mut model: Vec<(String, i64)> = Vec::new();

        for _ in 0..STEPS {
            let key = KEYS[rng.gen_range(0..KEYS.len())];
            let value = rng.gen_range(0..10i64);
            let position = model.iter().position(|(k, _)| k == key);
            match rng.gen_range(0..3) {
                0 => {
                    // Upsert: patch when the key exists, append otherwise
                    inv = inv
                        .with_item("items", Call::new().attr("key", key).attr("value", value))
                        .unwrap();
                    match position {
                        Some(i) => model[i].1 = value,
                        None => model.push((key.to_string(), value)),
                    }
                }
                1 => {
                    let result = inv.update_item("items", Call::new().key(key).attr("value", value));
                    match position {
                        Some(i) => {
                            inv = result.unwrap();
                            model[i].1 = value;
                        }
                        None => assert_eq!(
                            result.unwrap_err(),
                            MutationError::key_not_found("Inventory.items", format!("{:?}", key))
                        ),
                    }
                }
                _ => {
                    let result = inv.without_item("items", Call::new().key(key));
                    match position {
                        Some(i) => {
                            inv = result.unwrap();
                            model.remove(i);
                        }
                        None => assert!(result.unwrap_err().is_missing_target()),
                    }
                }
            }

            let current = items(&inv);
            assert_eq!(current, model, "seed {}", seed);
            let mut keys: Vec<&String> = current.iter().map(|(k, _)| k).collect();
            keys.sort();
            keys.dedup();
            assert_eq!(keys.len(), current.len(), "seed {}", seed);
        }
    }
}

// ========== TEST: copy_on_write_never_touches_the_receiver ==========
#[test]
fn test_copy_on_write_never_touches_the_receiver() {
    for seed in SEEDS {
        // GIVEN a populated inventory and a snapshot of it
        let mut rng = StdRng::seed_from_u64(seed);
        let registry = fixtures::inventory();
        let original = registry
            .instantiate(
                "Inventory",
                attrs! { "name" => "depot", "numbers" => Value::list([1i64, 2, 3]) },
            )
            .unwrap()
            .with_item("items", Call::new().attr("key", "a"))
            .unwrap()
            .with_attr("origin", Call::new().attr("x", 1i64))
            .unwrap();
        let snapshot = original.deep_copy();

        // WHEN random copy-mode operations are applied to it
        for _ in 0..STEPS {
            let value = rng.gen_range(0..100i64);
            let result = match rng.gen_range(0..6) {
                0 => original.with_attr("name", Call::new().value(format!("n{}", value))),
                1 => original.with_item("numbers", Call::new().value(value)),
                2 => original.update_item("items", Call::new().key("a").attr("value", value)),
                3 => original.with_attr("origin", Call::new().attr("y", value)),
                4 => original.reset(Call::new()),
                _ => original.without_item("numbers", Call::new().index(0)),
            };

            // THEN each result is a new instance and the receiver is untouched
            let result = result.unwrap();
            assert!(!Object::ptr_eq(&result, &original));
            assert_eq!(original, snapshot, "seed {}", seed);
        }
    }
}

fn calc_registry() -> Rc<Registry> {
    let mut builder = RegistryBuilder::new();
    builder
        .add_class("Calc")
        .attr(AttrDef::new("n", TypeExpr::Int).default(1i64))
        .attr(
            AttrDef::new("derived", TypeExpr::list(TypeExpr::Int))
                .computed(|obj| Ok(Value::list([obj.get("n")?]))),
        )
        .done()
        .unwrap();
    builder.build().unwrap()
}

// ========== TEST: computed_collections_reject_item_writes ==========
#[test]
fn test_computed_collections_reject_item_writes() {
    for seed in SEEDS {
        // GIVEN a list computed from `n`
        let mut rng = StdRng::seed_from_u64(seed);
        let registry = calc_registry();
        let calc = registry.instantiate("Calc", attrs! {}).unwrap();

        for _ in 0..STEPS {
            // WHEN any item method targets the computed list
            let value = rng.gen_range(0..100i64);
            let call = if rng.gen_bool(0.5) {
                Call::new().index(0).value(value).inplace()
            } else {
                Call::new().index(0).value(value)
            };
            let result = match rng.gen_range(0..4) {
                0 => calc.with_item("derived", Call::new().value(value)),
                1 => calc.update_item("derived", call),
                2 => calc.transform_item("derived", Call::new().index(0).transform(Ok)),
                _ => calc.without_item("derived", Call::new().index(0)),
            };

            // THEN it is rejected and the getter still drives the value
            assert_eq!(
                result.unwrap_err(),
                MutationError::read_only("Calc.derived"),
                "seed {}",
                seed
            );
            calc.set("n", value).unwrap();
            assert_eq!(calc.get("derived").unwrap(), Value::list([value]), "seed {}", seed);
        }
    }
}
