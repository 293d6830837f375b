//! Classification Tests
//!
//! Tests for severity classification and auth failure detection.

use std::sync::Arc;

use p4tagged::classify::{
    classify, detect, AuthFailureKind, AuthRule, AuthRules, Classification, Classify,
};
use p4tagged::protocol::{decode, GenericCode, RawCode, Row, ServerMessage, Severity};

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
// Severity Classification Tests
// =============================================================================

#[test]
fn test_severity_mapping() {
    assert_eq!(classify(&Severity::Empty), Classification::None);
    assert_eq!(classify(&Severity::Info), Classification::Info);
    assert_eq!(classify(&Severity::Warning), Classification::Warning);
    assert_eq!(classify(&Severity::Failed), Classification::Error);
    assert_eq!(classify(&Severity::Fatal), Classification::Fatal);
    assert_eq!(classify(&Severity::Unknown(7)), Classification::Fatal);
}

#[test]
fn test_severity_monotonicity() {
    for a in 0..16u32 {
        for b in 0..16u32 {
            let sa = RawCode::new(pack(a, 0, 0, 0)).severity();
            let sb = RawCode::new(pack(b, 0, 0, 0)).severity();
            if sa < sb {
                assert!(
                    classify(&sa) <= classify(&sb),
                    "{} classified stricter than {}",
                    sa,
                    sb
                );
            }
        }
    }
}

#[test]
fn test_in_error() {
    assert!(!Severity::Warning.in_error());
    assert!(Severity::Failed.in_error());
    assert!(Severity::Fatal.in_error());
    assert!(Classification::Error.is_error());
    assert!(!Classification::Warning.is_error());
}

#[test]
fn test_composite_classified_by_top() {
    let row = Row::new()
        .with("code0", pack(1, 0, 6, 1).to_string())
        .with("code1", pack(4, 0, 6, 2).to_string())
        .with("code2", pack(2, 0, 6, 3).to_string());
    let message = decode(&row).unwrap();

    assert_eq!(classify(&message), Classification::Fatal);
    assert_eq!(classify(message.top()), Classification::Fatal);
    assert_eq!(classify(&message.all_messages()[0]), Classification::Info);
    assert!(message.in_error());
}

#[test]
fn test_classification_display() {
    assert_eq!(Classification::Warning.to_string(), "warning");
    assert_eq!(Classification::None.to_string(), "none");
}

// =============================================================================
// Auth Failure Detection Tests
// =============================================================================

#[test]
fn test_detect_standard_fragments() {
    let cases = [
        (
            "Perforce password (P4PASSWD) invalid or unset.",
            AuthFailureKind::NotLoggedIn,
        ),
        (
            "Access for user '%user%' has not been enabled by 'p4 protect'.",
            AuthFailureKind::NotLoggedIn,
        ),
        (
            "Your session has expired, please login again.",
            AuthFailureKind::SessionExpired,
        ),
        (
            "Your session was logged out, please login again.",
            AuthFailureKind::SessionExpired,
        ),
        (
            "Perforce password (%'P4PASSWD'%) invalid or unset.",
            AuthFailureKind::NotLoggedIn,
        ),
        (
            "Single sign-on on client failed: %result%",
            AuthFailureKind::SsoFailure,
        ),
        ("Password invalid.", AuthFailureKind::PasswordInvalid),
        ("No such file(s).", AuthFailureKind::None),
    ];

    for (fmt, expected) in cases {
        assert_eq!(detect(&message(3, fmt)), expected, "format: {}", fmt);
    }
}

#[test]
fn test_detect_matches_rendered_text() {
    // Fragment only appears after rendering
    let row = Row::new()
        .with("code0", pack(3, 0, 6, 1).to_string())
        .with("fmt0", "%prefix% has not been enabled")
        .with("prefix", "Access for user 'bob'");
    let message = decode(&row).unwrap();

    assert_eq!(detect(&message), AuthFailureKind::NotLoggedIn);
}

#[test]
fn test_detect_case_insensitive() {
    assert_eq!(
        detect(&message(3, "YOUR SESSION HAS EXPIRED")),
        AuthFailureKind::SessionExpired
    );
}

#[test]
fn test_detect_table_order() {
    // Matches both rule 3 and rule 7; rule 3 comes first
    let msg = message(3, "Password invalid. Your session has expired.");
    assert_eq!(detect(&msg), AuthFailureKind::SessionExpired);
}

#[test]
fn test_detect_any_member() {
    let row = Row::new()
        .with("code0", pack(3, 0, 6, 1).to_string())
        .with("fmt0", "Operation failed.")
        .with("code1", pack(1, 0, 6, 2).to_string())
        .with("fmt1", "Password invalid.");
    let message = decode(&row).unwrap();

    assert_eq!(detect(&message), AuthFailureKind::PasswordInvalid);
}

#[test]
fn test_standard_table() {
    let rules = AuthRules::standard();
    assert_eq!(rules.len(), 7);
    assert_eq!(rules.rules()[0].kind, AuthFailureKind::NotLoggedIn);
    assert_eq!(rules.rules()[6].kind, AuthFailureKind::PasswordInvalid);

    // Built once and shared
    assert!(Arc::ptr_eq(&rules, &AuthRules::standard()));
    assert_eq!(AuthRules::default(), *rules);
}

#[test]
fn test_custom_generic_rule() {
    let rules = AuthRules::new(vec![
        AuthRule::generic(GenericCode::PROTECT, AuthFailureKind::NotLoggedIn),
        AuthRule::fragment("ticket", AuthFailureKind::SessionExpired),
    ]);

    let protect = decode(
        &Row::new()
            .with("code0", pack(3, 0x06, 6, 1).to_string())
            .with("fmt0", "You don't have permission."),
    )
    .unwrap();
    assert_eq!(rules.detect(&protect), AuthFailureKind::NotLoggedIn);

    assert_eq!(
        rules.detect(&message(3, "Your ticket is gone")),
        AuthFailureKind::SessionExpired
    );
    assert_eq!(rules.detect(&message(3, "Password invalid.")), AuthFailureKind::None);
}

#[test]
fn test_empty_rule_table() {
    let rules = AuthRules::new(Vec::new());
    assert!(rules.is_empty());
    assert_eq!(
        rules.detect(&message(3, "Password invalid.")),
        AuthFailureKind::None
    );
}
