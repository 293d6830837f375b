//! Dispatch Tests
//!
//! Tests for turning classified messages into outcomes.

use std::error::Error as _;
use std::io;

use p4tagged::classify::{AuthFailureKind, AuthRules};
use p4tagged::dispatch::{dispatch, Dispatcher};
use p4tagged::error::{ConnectionError, ErrorKind, P4Error};
use p4tagged::protocol::{decode, Row, ServerMessage, Severity};

fn pack(severity: u32, generic: u32, subsystem: u32, sub_code: u32) -> u32 {
    (severity << 28) | (generic << 16) | (subsystem << 10) | sub_code
}

fn message(severity: u32, fmt: &str) -> ServerMessage {
    let row = Row::new()
        .with("code0", pack(severity, 0, 6, 1).to_string())
        .with("fmt0", fmt);
    decode(&row).unwrap()
}

// =============================================================================
// Basic Dispatch Tests
// =============================================================================

#[test]
fn test_access_failure() {
    let row = Row::new()
        .with("code0", "822483067")
        .with("fmt0", "Access for user '%user%' has not been enabled by 'p4 protect'.")
        .with("user", "bob");
    let message = decode(&row).unwrap();

    match dispatch(message) {
        Err(P4Error::Access { kind, message }) => {
            assert_eq!(kind, AuthFailureKind::NotLoggedIn);
            assert_eq!(
                message.text(),
                "Access for user 'bob' has not been enabled by 'p4 protect'."
            );
        }
        other => panic!("Expected access error, got {:?}", other),
    }
}

#[test]
fn test_request_failure() {
    let err = dispatch(message(3, "//depot/x - no such file(s).")).unwrap_err();

    assert_eq!(err.kind(), Some(ErrorKind::Request));
    assert_eq!(err.auth_failure(), None);
    assert_eq!(
        err.server_message().map(|m| m.text()),
        Some("//depot/x - no such file(s).")
    );
}

#[test]
fn test_fatal_is_error() {
    let err = dispatch(message(4, "Server is shutting down.")).unwrap_err();
    assert!(matches!(err, P4Error::Request(_)));
}

#[test]
fn test_non_errors_pass_through() {
    for severity in [0, 1, 2] {
        let msg = message(severity, "Password invalid.");
        let passed = dispatch(msg.clone()).unwrap();
        assert_eq!(passed, msg);
    }
}

#[test]
fn test_access_error_kind() {
    let err = dispatch(message(3, "Your session has expired, please login again.")).unwrap_err();
    assert_eq!(
        err.kind(),
        Some(ErrorKind::Access(AuthFailureKind::SessionExpired))
    );
    assert_eq!(err.auth_failure(), Some(AuthFailureKind::SessionExpired));
    assert!(err.to_string().contains("session expired"));
}

#[test]
fn test_request_error_keeps_all_members() {
    let row = Row::new()
        .with("code0", pack(1, 0, 6, 1).to_string())
        .with("fmt0", "Processing %file%")
        .with("code1", pack(3, 0, 6, 2).to_string())
        .with("fmt1", "Failed on %file%")
        .with("file", "a.c");

    let err = dispatch(decode(&row).unwrap()).unwrap_err();
    let carried = err.server_message().unwrap();
    assert_eq!(carried.len(), 2);
    assert_eq!(carried.named_arguments().get("file"), Some(&"a.c"));
}

// =============================================================================
// Dispatcher Variant Tests
// =============================================================================

#[test]
fn test_check_warnings() {
    let rules = AuthRules::standard();
    let dispatcher = Dispatcher::new(&rules);

    let err = dispatcher.check_warnings(&message(2, "No files to reconcile.")).unwrap_err();
    assert!(matches!(err, P4Error::Request(_)));

    assert!(dispatcher.check_warnings(&message(1, "ok")).is_ok());
    // Errors are not this check's concern
    assert!(dispatcher.check_warnings(&message(3, "bad")).is_ok());
}

#[test]
fn test_check_file_errors() {
    let rules = AuthRules::standard();
    let dispatcher = Dispatcher::new(&rules);

    assert!(dispatcher.check_file_errors(&message(3, "//x - no such file(s).")).is_ok());

    let err = dispatcher
        .check_file_errors(&message(3, "Perforce password (P4PASSWD) invalid or unset."))
        .unwrap_err();
    assert_eq!(err.auth_failure(), Some(AuthFailureKind::NotLoggedIn));
}

#[test]
fn test_check_errors_only() {
    let rules = AuthRules::standard();
    let dispatcher = Dispatcher::new(&rules);

    let row = Row::new()
        .with("code0", pack(1, 0, 6, 1).to_string())
        .with("fmt0", "info one")
        .with("code1", pack(3, 0, 6, 2).to_string())
        .with("fmt1", "failure one")
        .with("code2", pack(2, 0, 6, 3).to_string())
        .with("fmt2", "warning one")
        .with("code3", pack(4, 0, 6, 4).to_string())
        .with("fmt3", "fatal one");

    let err = dispatcher.check_errors_only(decode(&row).unwrap()).unwrap_err();
    let carried = err.server_message().unwrap();
    let texts: Vec<_> = carried.all_messages().iter().map(|m| m.text()).collect();
    assert_eq!(texts, vec!["failure one", "fatal one"]);
    assert_eq!(carried.severity(), Severity::Fatal);

    let benign = message(2, "warning only");
    assert_eq!(dispatcher.check_errors_only(benign.clone()).unwrap(), benign);
}

#[test]
fn test_dispatch_opt() {
    let rules = AuthRules::standard();
    let dispatcher = Dispatcher::new(&rules);

    assert!(dispatcher.dispatch_opt(None).unwrap().is_none());
    assert!(dispatcher.dispatch_opt(Some(message(1, "x"))).unwrap().is_some());
    assert!(dispatcher.dispatch_opt(Some(message(3, "x"))).is_err());
}

#[test]
fn test_custom_rules_change_classification() {
    let rules = AuthRules::new(Vec::new());
    let dispatcher = Dispatcher::new(&rules);

    let err = dispatcher
        .dispatch(message(3, "Password invalid."))
        .unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::Request));
}

// =============================================================================
// Connection Error Tests
// =============================================================================

#[test]
fn test_connection_error_passes_through() {
    let source = io::Error::new(io::ErrorKind::ConnectionRefused, "refused");
    let err: P4Error = ConnectionError::with_source("connect to ssl:perforce:1666 failed", source).into();

    assert_eq!(err.kind(), Some(ErrorKind::Connection));
    assert!(err.server_message().is_none());
    assert!(err.to_string().contains("ssl:perforce:1666"));
    assert!(err.source().is_some());
}

#[test]
fn test_local_errors_have_no_kind() {
    let err = P4Error::InvalidArgument("blank".to_string());
    assert_eq!(err.kind(), None);

    let err: P4Error = io::Error::new(io::ErrorKind::NotFound, "gone").into();
    assert_eq!(err.kind(), None);
}
