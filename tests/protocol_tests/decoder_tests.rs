//! Decoder Tests
//!
//! Tests for message decoding and aggregation.

use p4tagged::protocol::{
    decode, decode_across_rows, GenericCode, MessageDecoder, Row, ServerMessage, Severity,
    TaggedDecoder,
};

fn pack(severity: u32, generic: u32, subsystem: u32, sub_code: u32) -> u32 {
    (severity << 28) | (generic << 16) | (subsystem << 10) | sub_code
}

fn info_code() -> String {
    pack(1, 0, 6, 1).to_string()
}

fn warning_code() -> String {
    pack(2, 0x11, 6, 2).to_string()
}

fn error_code() -> String {
    pack(3, 0x06, 6, 123).to_string()
}

fn message_row(code: &str, fmt: &str) -> Row {
    Row::new().with("code0", code).with("fmt0", fmt)
}

// =============================================================================
// Single Row Decoding
// =============================================================================

#[test]
fn test_round_trip_render() {
    let code = info_code();
    let row = message_row(&code, "hello %name%").with("name", "world");

    let message = decode(&row).expect("row carries a message");
    assert_eq!(message.len(), 1);

    let single = message.top();
    assert_eq!(single.raw_code().to_string(), code);
    assert_eq!(single.text(), "hello world");
    assert_eq!(single.format(), "hello %name%");
    assert_eq!(single.index(), 0);
    assert_eq!(single.argument("name"), Some("world"));
}

#[test]
fn test_decode_is_idempotent() {
    let row = message_row(&error_code(), "Access for user '%user%'").with("user", "bob");

    let first = decode(&row);
    let second = decode(&row);
    assert!(first.is_some());
    assert_eq!(first, second);
}

#[test]
fn test_sparse_termination() {
    let row = Row::new()
        .with("code0", info_code())
        .with("fmt0", "first")
        .with("code2", error_code())
        .with("fmt2", "never seen");

    let message = decode(&row).unwrap();
    assert_eq!(message.len(), 1);
    assert_eq!(message.top().index(), 0);
    assert_eq!(message.severity(), Severity::Info);
}

#[test]
fn test_pure_data_row() {
    let row = Row::from([("depotFile", "//depot/a.c"), ("rev", "3")]);

    assert!(decode(&row).is_none());
    assert_eq!(row.get_str("depotFile"), Some("//depot/a.c"));
    assert_eq!(row.len(), 2);
}

#[test]
fn test_blank_code_terminates() {
    let row = Row::new()
        .with("code0", "  ")
        .with("fmt0", "ignored")
        .with("code1", error_code());

    assert!(decode(&row).is_none());
}

#[test]
fn test_missing_format_renders_empty() {
    let row = Row::new().with("code0", info_code());
    let message = decode(&row).unwrap();
    assert_eq!(message.text(), "");
    assert_eq!(message.top().format(), "");
}

#[test]
fn test_unparsable_code_decoded_leniently() {
    let row = message_row("not-a-number", "strange %x%").with("x", "thing");

    let message = decode(&row).unwrap();
    assert_eq!(message.severity(), Severity::Empty);
    assert_eq!(message.raw_code().value(), 0);
    assert_eq!(message.generic(), GenericCode::NONE);
    assert_eq!(message.text(), "strange thing");
}

#[test]
fn test_multiple_messages_in_row() {
    let row = Row::new()
        .with("code0", info_code())
        .with("fmt0", "first %a%")
        .with("code1", error_code())
        .with("fmt1", "second %b%")
        .with("code2", warning_code())
        .with("fmt2", "third")
        .with("a", "A")
        .with("b", "B");

    let message = TaggedDecoder.decode(&row).unwrap();
    let texts: Vec<_> = message.all_messages().iter().map(|m| m.text()).collect();
    assert_eq!(texts, vec!["first A", "second B", "third"]);

    let indices: Vec<_> = message.all_messages().iter().map(|m| m.index()).collect();
    assert_eq!(indices, vec![0, 1, 2]);

    // Top is the highest severity
    assert_eq!(message.top().index(), 1);
    assert_eq!(message.severity(), Severity::Failed);
    assert!(message.is_error());
}

#[test]
fn test_decode_messages_without_aggregation() {
    let row = Row::new()
        .with("code0", info_code())
        .with("code1", warning_code());

    let messages = TaggedDecoder::new().decode_messages(&row);
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].severity(), Severity::Warning);
}

// =============================================================================
// Aggregation Tests
// =============================================================================

#[test]
fn test_top_is_first_of_max_severity() {
    let row = Row::new()
        .with("code0", info_code())
        .with("fmt0", "info")
        .with("code1", error_code())
        .with("fmt1", "first error")
        .with("code2", error_code())
        .with("fmt2", "second error");

    let message = decode(&row).unwrap();
    assert_eq!(message.text(), "first error");
}

#[test]
fn test_decode_across_rows() {
    let rows = vec![
        message_row(&info_code(), "one"),
        Row::from([("depotFile", "//a")]),
        message_row(&error_code(), "two"),
        message_row(&error_code(), "three"),
    ];

    let message = decode_across_rows(&rows).unwrap();
    assert_eq!(message.len(), 3);
    assert_eq!(message.text(), "two");
    assert_eq!(message.to_string(), "one\ntwo\nthree");
}

#[test]
fn test_decode_across_rows_without_messages() {
    let rows = vec![Row::from([("a", "1")]), Row::from([("b", "2")])];
    assert!(decode_across_rows(&rows).is_none());
    assert!(decode_across_rows(&[]).is_none());
}

#[test]
fn test_decode_each_row() {
    let rows = vec![
        message_row(&error_code(), "bad %f%").with("f", "a.c"),
        Row::from([("depotFile", "//b")]),
        message_row(&info_code(), "ok"),
    ];

    let messages = TaggedDecoder.decode_each_row(&rows);
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].text(), "bad a.c");
    assert!(messages[1].is_info());
}

#[test]
fn test_merge_keeps_order_and_top() {
    let a = decode(&message_row(&warning_code(), "warn")).unwrap();
    let b = decode(&message_row(&info_code(), "info")).unwrap();

    let merged = a.merge(b);
    assert_eq!(merged.len(), 2);
    assert_eq!(merged.text(), "warn");
    assert!(merged.is_warning());
}

// =============================================================================
// Composite Accessor Tests
// =============================================================================

fn mixed_message() -> ServerMessage {
    let row = Row::new()
        .with("code0", info_code())
        .with("fmt0", "Counter %counter% set.")
        .with("code1", warning_code())
        .with("fmt1", "%path% - no such file(s).")
        .with("code2", info_code())
        .with("fmt2", "Done with %counter%.")
        .with("counter", "change")
        .with("path", "//depot/x");
    decode(&row).unwrap()
}

#[test]
fn test_info_strings() {
    let message = mixed_message();
    assert_eq!(message.first_info_string(), "Counter change set.");
    assert_eq!(
        message.all_info_strings(" | "),
        "Counter change set. | Done with change."
    );
    assert_eq!(message.all_info_text(), "Counter change set.\nDone with change.");
}

#[test]
fn test_severity_queries() {
    let message = mixed_message();
    assert!(message.is_warning());
    assert!(!message.is_info());
    assert!(!message.is_error());
    assert!(message.is_info_or_error());
    assert!(message.has_severity(Severity::Warning));
    assert!(!message.has_severity(Severity::Failed));

    assert_eq!(message.for_severity(Severity::Info).count(), 3);
    assert_eq!(message.for_severity(Severity::Warning).count(), 1);
    assert_eq!(message.for_exact_severity(Severity::Info).count(), 2);
}

#[test]
fn test_fragment_matching() {
    let message = mixed_message();
    // Rendered text
    assert!(message.has_fragment("//depot/x - no such"));
    // Format string
    assert!(message.has_fragment("%path% - no such file"));
    // Case-insensitive
    assert!(message.has_fragment("NO SUCH FILE"));
    assert!(!message.has_fragment("access for user"));
}

#[test]
fn test_named_arguments() {
    let message = mixed_message();
    let args = message.named_arguments();
    assert_eq!(args.get("counter"), Some(&"change"));
    assert_eq!(args.get("path"), Some(&"//depot/x"));
    assert_eq!(args.len(), 2);
}

#[test]
fn test_code_string() {
    let row = message_row(&error_code(), "x");
    let message = decode(&row).unwrap();
    assert_eq!(message.code(), "6:6:123 (6267)");
    assert_eq!(message.unique_code(), 6267);
    assert_eq!(message.sub_code(), 123);
}
