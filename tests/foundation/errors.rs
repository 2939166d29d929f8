//! Integration tests for Error types
//!
//! Tests error construction, display, context, and error kinds.

use termcore_foundation::{Error, ErrorContext, ErrorKind, Layout, Type};

// =============================================================================
// Error Construction
// =============================================================================

#[test]
fn error_type_mismatch() {
    let err = Error::type_mismatch(Type::Int, Type::Str);
    assert!(matches!(err.kind, ErrorKind::TypeMismatch { .. }));
    assert_eq!(err.to_string(), "type mismatch: expected int, got str");
}

#[test]
fn error_finalized() {
    let err = Error::finalized();
    assert!(matches!(err.kind, ErrorKind::FinalizedMutation));
    assert!(err.to_string().contains("finalized"));
}

#[test]
fn error_unsupported() {
    let err = Error::unsupported("offset", Layout::UriOnly);
    let msg = err.to_string();
    assert!(msg.contains("offset"));
    assert!(msg.contains("UriOnly"));
}

#[test]
fn error_missing_parameter() {
    let err = Error::missing_parameter("color");
    assert!(matches!(err.kind, ErrorKind::MissingParameter(ref l) if l == "color"));
    assert!(err.to_string().contains("color"));
}

#[test]
fn error_arity_mismatch() {
    let err = Error::arity_mismatch(2, 3);
    assert_eq!(err.to_string(), "arity mismatch: expected 2, got 3");
}

// =============================================================================
// Error Context
// =============================================================================

#[test]
fn context_is_attached() {
    let err = Error::invalid_argument("bad")
        .with_context(ErrorContext::new().with_operation("insert_all").with_index(4));
    let context = err.context.as_ref().unwrap();
    assert_eq!(context.operation.as_deref(), Some("insert_all"));
    assert_eq!(context.index, Some(4));
    assert_eq!(context.to_string(), "in insert_all at element 4");
}

#[test]
fn frames_accumulate() {
    let err = Error::invalid_argument("bad").in_frame("compose").in_frame("closure");
    let context = err.context.unwrap();
    assert_eq!(context.stack, vec!["compose".to_string(), "closure".to_string()]);
}

#[test]
fn error_is_std_error() {
    fn takes_error(_: &dyn std::error::Error) {}
    takes_error(&Error::finalized());
}
