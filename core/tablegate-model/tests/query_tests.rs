use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::{Value, json};
use tablegate_model::{Condition, Filter, Query, QueryError, Record, RecordExt};

fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        _ => panic!("fixture must be an object"),
    }
}

// ── Query builder ────────────────────────────────────────────────

#[test]
fn empty_query_is_empty_object() {
    let q = Query::new();
    assert!(q.is_empty());
    assert_eq!(Value::from(q), json!({}));
}

#[test]
fn equality_and_operators_build_wire_shape() {
    let q = Query::new().eq("username", "bob").lt("age", 5);
    assert_eq!(q.to_value(), json!({"username": "bob", "age": {"$lt": 5}}));
    assert_eq!(q.fields().collect::<Vec<_>>(), vec!["username", "age"]);
}

#[test]
fn operators_on_same_field_accumulate() {
    let q = Query::new().gt("age", 1).lt("age", 9);
    assert_eq!(Value::from(q), json!({"age": {"$gt": 1, "$lt": 9}}));
}

#[test]
fn operator_after_equality_replaces_it() {
    let q = Query::new().eq("age", 3).gte("age", 4);
    assert_eq!(Value::from(q), json!({"age": {"$gte": 4}}));
}

#[test]
fn equality_after_operator_replaces_it() {
    let q = Query::new().lte("age", 4).eq("age", 3);
    assert_eq!(Value::from(q), json!({"age": 3}));
}

#[test]
fn is_in_builds_array_operand() {
    let q = Query::new().is_in("role", ["ADMIN", "USER"]).ne("age", Value::Null);
    assert_eq!(
        Value::from(q),
        json!({"role": {"$in": ["ADMIN", "USER"]}, "age": {"$ne": null}})
    );
}

// ── Condition parsing ────────────────────────────────────────────

#[test]
fn scalar_parses_as_equality() {
    assert_eq!(
        Condition::parse("f", &json!("x")).unwrap(),
        vec![Condition::Eq(json!("x"))]
    );
}

#[test]
fn plain_object_parses_as_equality() {
    let clause = json!({"nested": 1});
    assert_eq!(
        Condition::parse("f", &clause).unwrap(),
        vec![Condition::Eq(clause.clone())]
    );
}

#[test]
fn unknown_operator_is_rejected() {
    let err = Condition::parse("age", &json!({"$like": "%a"})).unwrap_err();
    assert_eq!(
        err,
        QueryError::UnknownOperator {
            field: "age".into(),
            operator: "$like".into()
        }
    );
}

#[test]
fn in_without_array_is_rejected() {
    let err = Condition::parse("role", &json!({"$in": "ADMIN"})).unwrap_err();
    assert!(matches!(err, QueryError::InvalidOperand { .. }));
}

// ── Filter evaluation ────────────────────────────────────────────

#[test]
fn filter_rejects_non_object() {
    assert_eq!(Filter::parse(&json!([1, 2])).unwrap_err(), QueryError::NotAnObject);
}

#[test]
fn null_and_empty_filter_match_everything() {
    let r = record(json!({"id": "a", "age": 3}));
    assert!(Filter::parse(&Value::Null).unwrap().matches(&r));
    assert!(Filter::parse(&json!({})).unwrap().matches(&r));
}

#[test]
fn filter_combines_clauses_with_and() {
    let filter = Filter::parse(&json!({"role": "USER", "age": {"$gt": 18, "$lt": 30}})).unwrap();
    assert!(filter.matches(&record(json!({"role": "USER", "age": 20}))));
    assert!(!filter.matches(&record(json!({"role": "ADMIN", "age": 20}))));
    assert!(!filter.matches(&record(json!({"role": "USER", "age": 30}))));
    assert!(!filter.matches(&record(json!({"role": "USER"}))));
}

#[test]
fn numbers_compare_by_value() {
    let filter = Filter::parse(&json!({"third": 5})).unwrap();
    assert!(filter.matches(&record(json!({"third": 5.0}))));
}

#[test]
fn strings_compare_lexicographically() {
    let filter = Filter::parse(&json!({"username": {"$lt": "m"}})).unwrap();
    assert!(filter.matches(&record(json!({"username": "alice"}))));
    assert!(!filter.matches(&record(json!({"username": "zoe"}))));
}

#[test]
fn missing_column_equals_null() {
    let filter = Filter::parse(&json!({"age": null})).unwrap();
    assert!(filter.matches(&record(json!({"id": "x"}))));
    let ne = Filter::parse(&json!({"age": {"$ne": null}})).unwrap();
    assert!(!ne.matches(&record(json!({"id": "x"}))));
}

#[test]
fn mixed_types_never_order() {
    let filter = Filter::parse(&json!({"age": {"$lt": "10"}})).unwrap();
    assert!(!filter.matches(&record(json!({"age": 5}))));
}

// ── RecordExt ────────────────────────────────────────────────────

#[test]
fn record_accessors() {
    let r = record(json!({"name": "n", "age": 7, "ratio": 0.5, "ok": true, "gone": null}));
    assert_eq!(r.get_str("name"), Some("n"));
    assert_eq!(r.get_i64("age"), Some(7));
    assert_eq!(r.get_f64("ratio"), Some(0.5));
    assert_eq!(r.get_bool("ok"), Some(true));
    assert!(r.is_null("gone"));
    assert!(r.is_null("absent"));
    assert!(!r.is_null("name"));
}

// ── Properties ───────────────────────────────────────────────────

proptest! {
    /// `$lt` and `$gte` partition the integers.
    #[test]
    fn lt_and_gte_are_complementary(value in -1000i64..1000, bound in -1000i64..1000) {
        let r = record(json!({"n": value}));
        let lt = Filter::parse(&json!({"n": {"$lt": bound}})).unwrap();
        let gte = Filter::parse(&json!({"n": {"$gte": bound}})).unwrap();
        prop_assert_ne!(lt.matches(&r), gte.matches(&r));
    }

    /// A query built with the builder parses back into a filter that
    /// accepts exactly the values in its range.
    #[test]
    fn builder_range_matches_expected(value in -100i64..100, lo in -100i64..0, hi in 0i64..100) {
        let filter = Filter::parse(&Query::new().gt("n", lo).lt("n", hi).into()).unwrap();
        let r = record(json!({"n": value}));
        prop_assert_eq!(filter.matches(&r), value > lo && value < hi);
    }
}
