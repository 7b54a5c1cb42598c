use pretty_assertions::assert_eq;
use serde_json::json;
use tablegate_access::{
    AccessError, AtBoundary, BackendError, BackendViolation, CallError, ConstraintKind,
    ConstraintViolation, Envelope, ErrorEnvelope, Operation, StepError, classify_backend_error,
    into_envelopes,
};

fn violations(kinds: &[(&str, &str)]) -> BackendError {
    BackendError::Validation {
        violations: kinds
            .iter()
            .map(|(path, kind)| BackendViolation::new(*path, *kind))
            .collect(),
    }
}

// ── classify_backend_error ──────────────────────────────────────

#[test]
fn unique_and_not_null_are_both_reported() {
    let err = classify_backend_error(&violations(&[
        ("first", BackendViolation::UNIQUE),
        ("second", BackendViolation::NOT_NULL),
    ]));

    assert_eq!(err.name(), "DatabaseError");
    assert_eq!(
        err.to_string(),
        "Details: NOT NULL constraint not respected; UNIQUE constraint not respected;"
    );
    assert_eq!(
        err.data(),
        Some(json!([
            { "field": "first", "type": "unique" },
            { "field": "second", "type": "notNull" }
        ]))
    );
}

#[test]
fn summary_mentions_each_class_once() {
    let err = classify_backend_error(&violations(&[
        ("a", BackendViolation::NOT_NULL),
        ("b", BackendViolation::NOT_NULL),
    ]));
    assert_eq!(err.to_string(), "Details: NOT NULL constraint not respected;");
}

#[test]
fn unrecognised_violation_type_is_unknown() {
    let err = classify_backend_error(&violations(&[("age", "Validation isInt on age failed")]));
    let AccessError::Database { message, violations } = err else {
        panic!("expected a database error");
    };
    assert_eq!(message, "Details: Unknown error;");
    assert_eq!(
        violations,
        [ConstraintViolation {
            field: "age".into(),
            kind: ConstraintKind::Unknown("Validation isInt on age failed".into()),
        }]
    );
}

#[test]
fn engine_error_keeps_its_message() {
    let err = classify_backend_error(&BackendError::engine("no such table: Users"));
    assert_eq!(
        err,
        AccessError::Database {
            message: "no such table: Users".into(),
            violations: vec![],
        }
    );
    assert_eq!(err.data(), None);
}

#[test]
fn unrecognised_error_shape_is_unknown_database_error() {
    let err = classify_backend_error(&BackendError::Other {
        name: "ConnectionRefused".into(),
        message: "connect ECONNREFUSED".into(),
    });
    assert_eq!(err.name(), "DatabaseError");
    assert_eq!(err.to_string(), "Unknown Error");
}

// ── Boundary rule ───────────────────────────────────────────────

#[test]
fn classified_errors_pass_through_every_boundary() {
    let original = AccessError::missing("query");
    for op in [
        Operation::Find,
        Operation::Count,
        Operation::Insert,
        Operation::InsertMany,
        Operation::UpdateById,
        Operation::UpdateMany,
        Operation::RemoveById,
        Operation::RemoveMany,
        Operation::RemoveAll,
    ] {
        assert_eq!(op.settle(StepError::Classified(original.clone())), original);
        assert_eq!(
            op.settle(StepError::Call(CallError::Rejected(original.clone()))),
            original
        );
    }
}

#[test]
fn backend_errors_are_classified_only_at_writes() {
    let backend = violations(&[("username", BackendViolation::UNIQUE)]);
    let step = || StepError::Call(backend.clone().into());

    for op in [
        Operation::Insert,
        Operation::InsertMany,
        Operation::UpdateById,
        Operation::UpdateMany,
    ] {
        assert_eq!(op.settle(step()).name(), "DatabaseError");
    }
    for op in [
        Operation::Find,
        Operation::Count,
        Operation::RemoveById,
        Operation::RemoveMany,
        Operation::RemoveAll,
    ] {
        assert_eq!(op.settle(step()).name(), "UnknownError");
    }
}

#[test]
fn transport_errors_are_flattened_with_operation_message() {
    let step = || StepError::Call(CallError::transport("timeout"));
    assert_eq!(
        Operation::Count.settle(step()),
        AccessError::unknown("Internal Error: something went wrong while searching for entities")
    );
    assert_eq!(
        Operation::UpdateMany.settle(step()),
        AccessError::unknown("Internal Error: something went wrong while updating the entities")
    );
    assert_eq!(
        Operation::RemoveMany.settle(step()),
        AccessError::unknown("Internal Error: something went wrong while deleting the entities")
    );
}

#[test]
fn malformed_replies_are_flattened() {
    let err = Operation::Insert.settle(StepError::MalformedReply("no id".into()));
    assert_eq!(err.name(), "UnknownError");
}

#[test]
fn nothing_found_is_restated_by_existence_checked_operations() {
    let step = || StepError::Classified(AccessError::nothing_found("Search Complete: 0 element found"));
    assert_eq!(
        Operation::UpdateById.settle(step()),
        AccessError::nothing_found("Nothing was updated")
    );
    assert_eq!(
        Operation::UpdateMany.settle(step()),
        AccessError::nothing_found("Nothing was updated")
    );
    assert_eq!(
        Operation::RemoveById.settle(step()),
        AccessError::nothing_found("Wrong id: nothing was deleted")
    );
    assert_eq!(
        Operation::Find.settle(step()),
        AccessError::nothing_found("Search Complete: 0 element found")
    );
}

#[test]
fn at_boundary_settles_errors_and_keeps_values() {
    let ok: Result<u64, StepError> = Ok(3);
    assert_eq!(ok.at_boundary(Operation::Count), Ok(3));

    let failed: Result<u64, StepError> = Err(CallError::transport("down").into());
    assert_eq!(
        failed.at_boundary(Operation::RemoveAll).unwrap_err().name(),
        "UnknownError"
    );
}

// ── Envelopes ───────────────────────────────────────────────────

#[test]
fn error_envelope_carries_name_message_and_data() {
    let err = classify_backend_error(&violations(&[("token", BackendViolation::NOT_NULL)]));
    let envelope = ErrorEnvelope::from(&err);
    assert_eq!(
        serde_json::to_value(&envelope).unwrap(),
        json!({
            "name": "DatabaseError",
            "message": "Details: NOT NULL constraint not respected;",
            "data": [{ "field": "token", "type": "notNull" }]
        })
    );
}

#[test]
fn error_envelope_omits_absent_data() {
    let envelope = ErrorEnvelope::from(AccessError::MissingTableName);
    assert_eq!(
        serde_json::to_value(&envelope).unwrap(),
        json!({ "name": "MissingTableName", "message": "Missing table name" })
    );
}

#[test]
fn success_envelope_serializes_flat() {
    let envelope = Envelope::success("Count Complete: 4 element(s) found", 4u64);
    assert_eq!(
        serde_json::to_value(&envelope).unwrap(),
        json!({
            "name": "Operation Successful",
            "message": "Count Complete: 4 element(s) found",
            "data": 4
        })
    );
    assert_eq!(envelope.map(|n| n * 2).data, 8);
}

#[test]
fn into_envelopes_converts_only_errors() {
    let failed: Result<Envelope<()>, AccessError> = Err(AccessError::InvalidFilter);
    let envelope = into_envelopes(failed).unwrap_err();
    assert_eq!(envelope.name, "InvalidFilter");
    assert_eq!(envelope.message, "Invalid filter. No fields found.");
}
