//! Update Property Tests
//!
//! Behavioural properties of `UpdateEngine::apply`:
//! - The base record is never mutated, even on failure
//! - Entries apply sequentially in document order
//! - Inverse operator pairs round-trip
//! - Dotted paths leave sibling branches intact

use aero_update::{
    apply, FieldKind, FieldRules, FieldTypeMap, Record, Rule, RuleSet, UpdateDocument, UpdateEngine,
    UpdateError, UpdateOperator,
};
use serde_json::{json, Value};

// =============================================================================
// Helper Functions
// =============================================================================

fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        other => panic!("not an object: {}", other),
    }
}

fn user_types() -> FieldTypeMap {
    FieldTypeMap::new()
        .with("name", FieldKind::String)
        .with("age", FieldKind::Int)
        .with("score", FieldKind::Float)
        .with("active", FieldKind::Bool)
        .with("tags", FieldKind::array(FieldKind::String))
        .with("nums", FieldKind::array(FieldKind::Int))
        .with(
            "profile",
            FieldKind::object_with([
                ("bio", FieldKind::String),
                ("visits", FieldKind::Int),
                ("links", FieldKind::array(FieldKind::String)),
            ]),
        )
}

fn run(base: &Record, update: Value) -> Result<Record, UpdateError> {
    let update = UpdateDocument::from_json(&update)?;
    apply(base, &update, &RuleSet::new(), &user_types())
}

// =============================================================================
// Worked Scenario
// =============================================================================

#[test]
fn test_set_push_inc_scenario() {
    let base = record(json!({"name": "john", "tags": ["a", "b"], "age": 5}));

    let out = run(
        &base,
        json!({
            "$set": {"name": "Five"},
            "$push": {"tags": {"$each": ["c"], "$position": 0}},
            "$inc": {"age": 3}
        }),
    )
    .unwrap();

    assert_eq!(
        Value::Object(out),
        json!({"name": "Five", "tags": ["c", "a", "b"], "age": 8})
    );
}

#[test]
fn test_replace_and_slice_scenarios() {
    let base = record(json!({"name": "foo baz foo"}));
    let out = run(
        &base,
        json!({"$replace": {"name": {"$searchValue": "foo", "$replaceValue": "bar"}}}),
    )
    .unwrap();
    assert_eq!(out["name"], json!("bar baz foo"));

    let base = record(json!({"name": "HelloWorld"}));
    let out = run(&base, json!({"$slice": {"name": {"$begin": 0, "$end": 3}}})).unwrap();
    assert_eq!(out["name"], json!("Hel"));
}

#[test]
fn test_unknown_operator_rejected() {
    let base = record(json!({"name": "x"}));
    let err = run(&base, json!({"$frobnicate": {"name": 1}})).unwrap_err();
    assert_eq!(err, UpdateError::unknown_operator("$frobnicate"));
}

// =============================================================================
// Idempotence and Round-Trip Tests
// =============================================================================

/// Applying the same `$set` twice equals applying it once.
#[test]
fn test_set_is_idempotent() {
    let base = record(json!({"name": "a", "profile": {"bio": "x", "visits": 1}}));
    let update = json!({"$set": {"name": "b", "profile.bio": "y"}});

    let once = run(&base, update.clone()).unwrap();
    let twice = run(&once, update).unwrap();
    assert_eq!(once, twice);
}

/// `$inc` then `$dec` by the same amount restores the value.
#[test]
fn test_inc_dec_round_trip() {
    for (start, delta) in [(5, 3), (-10, 7), (0, 0), (1_000_000, 999_999)] {
        let base = record(json!({"age": start}));
        let up = run(&base, json!({"$inc": {"age": delta}})).unwrap();
        let down = run(&up, json!({"$dec": {"age": delta}})).unwrap();
        assert_eq!(down["age"], json!(start));
    }
}

/// `$push` then `$pop: 1` restores the array.
#[test]
fn test_push_pop_round_trip() {
    let base = record(json!({"tags": ["a", "b"]}));
    let pushed = run(&base, json!({"$push": {"tags": "c"}})).unwrap();
    assert_eq!(pushed["tags"], json!(["a", "b", "c"]));

    let popped = run(&pushed, json!({"$pop": {"tags": 1}})).unwrap();
    assert_eq!(popped["tags"], base["tags"]);
}

/// `$addToSet` twice with the same operand equals once.
#[test]
fn test_add_to_set_twice() {
    let base = record(json!({"tags": ["a"]}));
    let update = json!({"$addToSet": {"tags": {"$each": ["b", "a", "c"]}}});

    let once = run(&base, update.clone()).unwrap();
    let twice = run(&once, update).unwrap();
    assert_eq!(once["tags"], json!(["a", "b", "c"]));
    assert_eq!(once, twice);
}

/// `$toggle` twice restores a boolean.
#[test]
fn test_toggle_twice() {
    let base = record(json!({"active": true}));
    let once = run(&base, json!({"$toggle": {"active": true}})).unwrap();
    let twice = run(&once, json!({"$toggle": {"active": true}})).unwrap();
    assert_eq!(once["active"], json!(false));
    assert_eq!(twice["active"], json!(true));
}

// =============================================================================
// Ordering Tests
// =============================================================================

/// A `$set` followed by `$inc` on the same field composes.
#[test]
fn test_document_order_is_observable() {
    let base = record(json!({"age": 100}));
    let out = run(&base, json!({"$set": {"age": 1}, "$inc": {"age": 2}})).unwrap();
    assert_eq!(out["age"], json!(3));

    let out = run(&base, json!({"$inc": {"age": 2}, "$set": {"age": 1}})).unwrap();
    assert_eq!(out["age"], json!(1));
}

// =============================================================================
// Dotted Path Tests
// =============================================================================

#[test]
fn test_dotted_set_preserves_siblings() {
    let base = record(json!({"profile": {"bio": "x", "visits": 1}, "name": "n"}));
    let out = run(&base, json!({"$set": {"profile.bio": "y"}})).unwrap();
    assert_eq!(out["profile"], json!({"bio": "y", "visits": 1}));
    assert_eq!(out["name"], json!("n"));
}

#[test]
fn test_dotted_typed_operators() {
    let base = record(json!({"profile": {"visits": 1, "links": []}}));
    let out = run(
        &base,
        json!({
            "$inc": {"profile.visits": 1},
            "$push": {"profile.links": "https://example.com"}
        }),
    )
    .unwrap();
    assert_eq!(out["profile"], json!({"visits": 2, "links": ["https://example.com"]}));
}

#[test]
fn test_dotted_set_creates_intermediates() {
    let base = Record::new();
    let out = run(&base, json!({"$set": {"a.b.c": 1}})).unwrap();
    assert_eq!(out["a"], json!({"b": {"c": 1}}));
}

#[test]
fn test_dotted_path_through_scalar_rejected() {
    let base = record(json!({"name": "x"}));
    let err = run(&base, json!({"$set": {"name.first": "y"}})).unwrap_err();
    assert!(matches!(err, UpdateError::Path { .. }));
}

// =============================================================================
// Atomicity Tests
// =============================================================================

/// A failing entry leaves the base unchanged and yields no partial record.
#[test]
fn test_failure_leaves_base_unchanged() {
    let base = record(json!({"name": "a", "age": 1, "profile": {"bio": "x"}}));
    let snapshot = base.clone();

    let err = run(
        &base,
        json!({
            "$set": {"name": "b", "profile.bio": "z"},
            "$div": {"age": 0}
        }),
    )
    .unwrap_err();

    assert!(matches!(err, UpdateError::Operator { .. }));
    assert_eq!(base, snapshot);
}

/// Validation failure blocks the write and reports the field and rule.
#[test]
fn test_validation_gates_the_write() {
    let rules = RuleSet::new().with("age", FieldRules::new().with(Rule::LessThan(10.0)));
    let base = record(json!({"age": 5}));
    let update = UpdateDocument::new()
        .with(UpdateOperator::Set, "name", json!("kept?"))
        .with(UpdateOperator::Inc, "age", json!(50));

    let err = apply(&base, &update, &rules, &user_types()).unwrap_err();
    match err {
        UpdateError::Validation { field, rule, .. } => {
            assert_eq!(field, "age");
            assert_eq!(rule, "$lessThan");
        }
        other => panic!("expected validation error, got {:?}", other),
    }
    assert_eq!(base, record(json!({"age": 5})));
}

/// Global operators skip validation entirely.
#[test]
fn test_set_skips_validation() {
    let rules = RuleSet::new().with("age", FieldRules::new().with(Rule::LessThan(10.0)));
    let update = UpdateDocument::new().with(UpdateOperator::Set, "age", json!(50));

    let out = apply(&Record::new(), &update, &rules, &user_types()).unwrap();
    assert_eq!(out["age"], json!(50));
}

/// Operands that only parameterise a transform are not checked against rules.
#[test]
fn test_ruled_string_field_accepts_parameter_operands() {
    let rules = RuleSet::new().with(
        "name",
        FieldRules::new().with(Rule::MinLength(1)).with(Rule::MaxLength(50)),
    );
    let base = record(json!({"name": "  helloWorld "}));

    let update = UpdateDocument::from_json(&json!({
        "$trim": {"name": true},
        "$capitalize": {"name": true},
        "$replace": {"name": {"$searchValue": "World", "$replaceValue": "There"}},
        "$slice": {"name": {"$begin": 0, "$end": 8}},
        "$substr": {"name": 1},
        "$uppercase": {"name": true}
    }))
    .unwrap();

    let out = apply(&base, &update, &rules, &user_types()).unwrap();
    assert_eq!(out["name"], json!("ELLOTHE"));
}

#[test]
fn test_ruled_numeric_field_accepts_unary_operators() {
    let rules = RuleSet::new().with("age", FieldRules::new().with(Rule::LessThan(1000.0)));
    let base = record(json!({"age": 16}));

    let update = UpdateDocument::new()
        .with(UpdateOperator::Sqrt, "age", json!(true))
        .with(UpdateOperator::Round, "age", json!(0))
        .with(UpdateOperator::Abs, "age", json!(true));
    let out = apply(&base, &update, &rules, &user_types()).unwrap();
    assert_eq!(out["age"], json!(4));

    let update = UpdateDocument::new().with(UpdateOperator::Random, "age", json!(true));
    assert!(apply(&base, &update, &rules, &user_types()).is_ok());
}

/// `$replace` validates the replacement text, the value it writes.
#[test]
fn test_replace_validates_replacement_value() {
    let rules = RuleSet::new().with("name", FieldRules::new().with(Rule::MaxLength(5)));
    let base = record(json!({"name": "ab"}));

    let update = UpdateDocument::new().with(
        UpdateOperator::Replace,
        "name",
        json!({"$searchValue": "b", "$replaceValue": "far too long"}),
    );
    match apply(&base, &update, &rules, &user_types()).unwrap_err() {
        UpdateError::Validation { field, rule, .. } => {
            assert_eq!(field, "name");
            assert_eq!(rule, "$maxLength");
        }
        other => panic!("expected validation error, got {:?}", other),
    }

    let rules = RuleSet::new().with("name", FieldRules::new().with(Rule::Trim));
    let update = UpdateDocument::new().with(
        UpdateOperator::Replace,
        "name",
        json!({"$searchValue": "b", "$replaceValue": "  c "}),
    );
    let out = apply(&base, &update, &rules, &user_types()).unwrap();
    assert_eq!(out["name"], json!("ac"));
}

// =============================================================================
// Type Gating Tests
// =============================================================================

#[test]
fn test_type_mismatch_reports_declared_type() {
    let base = record(json!({"tags": ["a"]}));
    let err = run(&base, json!({"$inc": {"tags": 1}})).unwrap_err();
    assert_eq!(err, UpdateError::type_mismatch("$inc", "tags", "array"));
}

#[test]
fn test_undeclared_field_rejected_for_typed_family() {
    let err = run(&Record::new(), json!({"$append": {"nickname": "x"}})).unwrap_err();
    assert_eq!(err, UpdateError::type_mismatch("$append", "nickname", "undeclared"));
}

#[test]
fn test_clear_follows_declaration_not_runtime_shape() {
    let base = record(json!({"tags": ["a"], "profile": {"bio": "x"}, "name": "n"}));
    let out = run(&base, json!({"$clear": {"tags": true, "profile": true}})).unwrap();
    assert_eq!(out["tags"], json!([]));
    assert_eq!(out["profile"], json!({}));

    assert!(run(&base, json!({"$clear": {"name": true}})).is_err());
}

// =============================================================================
// Array Operator Tests
// =============================================================================

#[test]
fn test_slice_array_clamps_and_rejects_inverted_bounds() {
    let base = record(json!({"nums": [1, 2, 3]}));
    let out = run(&base, json!({"$sliceArray": {"nums": {"$begin": -5, "$end": 1000}}})).unwrap();
    assert_eq!(out["nums"], json!([1, 2, 3]));

    let err = run(&base, json!({"$sliceArray": {"nums": {"$begin": 2, "$end": 1}}})).unwrap_err();
    assert!(matches!(err, UpdateError::Operator { .. }));
}

#[test]
fn test_pull_then_concat() {
    let base = record(json!({"nums": [5, 1, 8, 3]}));
    let out = run(
        &base,
        json!({
            "$pull": {"nums": {"$gte": 5}},
            "$concat": {"nums": [9]}
        }),
    )
    .unwrap();
    assert_eq!(out["nums"], json!([1, 3, 9]));
}

// =============================================================================
// Engine Reuse Tests
// =============================================================================

/// One engine applied to one cached base from many threads never leaks state.
#[test]
fn test_shared_base_across_threads() {
    use std::sync::Arc;
    use std::thread;

    let engine = Arc::new(UpdateEngine::default());
    let base = Arc::new(record(json!({"profile": {"visits": 0}})));
    let types = Arc::new(user_types());

    let handles: Vec<_> = (1..=8)
        .map(|i| {
            let engine = Arc::clone(&engine);
            let base = Arc::clone(&base);
            let types = Arc::clone(&types);
            thread::spawn(move || {
                let update = UpdateDocument::new().with(UpdateOperator::Inc, "profile.visits", json!(i));
                let out = engine.apply(&base, &update, &RuleSet::new(), &types).unwrap();
                (i, out["profile"]["visits"].clone())
            })
        })
        .collect();

    for handle in handles {
        let (i, visits) = handle.join().unwrap();
        assert_eq!(visits, json!(i));
    }
    assert_eq!(base["profile"], json!({"visits": 0}));
    assert_eq!(engine.metrics().snapshot().applies_committed, 8);
}
