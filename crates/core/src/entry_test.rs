use super::*;

#[test]
fn test_message_under_limit_untouched() {
    let mut entry = Entry::new();
    entry.set_message("short message", 1024);
    assert_eq!(entry.message(), "short message");
    assert!(!entry.message_truncated());
}

#[test]
fn test_message_truncation_exact_length() {
    let mut entry = Entry::new();
    let long = "x".repeat(500);
    entry.set_message(&long, 100);

    assert!(entry.message_truncated());
    assert_eq!(entry.message().len(), 100 + TRUNCATION_MARKER.len());
    assert!(entry.message().ends_with(TRUNCATION_MARKER));
    assert!(entry.message().starts_with(&"x".repeat(100)));
}

#[test]
fn test_message_truncation_respects_char_boundary() {
    let mut entry = Entry::new();
    // Each 'é' is 2 bytes; limit 5 falls mid-character.
    let msg = "ééééééé";
    entry.set_message(msg, 5);
    assert!(entry.message_truncated());
    assert!(entry.message().starts_with("éé"));
    assert!(entry.message().ends_with(TRUNCATION_MARKER));
}

#[test]
fn test_fields_capacity_drops_extras() {
    let mut entry = Entry::new();
    for i in 0..MAX_FIELDS {
        assert!(entry.add_field(&format!("k{i}"), Value::Int(i as i64)));
    }
    assert!(!entry.add_field("overflow", Value::Bool(true)));
    assert_eq!(entry.fields().len(), MAX_FIELDS);
    assert!(entry.field("overflow").is_none());
}

#[test]
fn test_field_value_kinds() {
    let mut entry = Entry::new();
    entry.add_field("s", Value::Str("text"));
    entry.add_field("i", Value::Int(-7));
    entry.add_field("f", Value::Float(2.5));
    entry.add_field("b", Value::Bool(true));

    match entry.field("s").unwrap() {
        FieldValue::Str(s) => assert_eq!(*s, "text"),
        other => panic!("wrong kind: {other:?}"),
    }
    assert_eq!(entry.field("i"), Some(&FieldValue::Int(-7)));
    assert_eq!(entry.field("f"), Some(&FieldValue::Float(2.5)));
    assert_eq!(entry.field("b"), Some(&FieldValue::Bool(true)));
}

#[test]
fn test_tags_and_metrics_bounded() {
    let mut entry = Entry::new();
    for i in 0..MAX_TAGS {
        assert!(entry.add_tag(&format!("tag{i}")));
    }
    assert!(!entry.add_tag("extra"));
    assert_eq!(entry.tags().count(), MAX_TAGS);

    for i in 0..MAX_METRICS {
        assert!(entry.add_metric(&format!("m{i}"), i as f64));
    }
    assert!(!entry.add_metric("extra", 0.0));
    assert_eq!(entry.metrics().len(), MAX_METRICS);
}

#[test]
fn test_reset_clears_all_sections() {
    let mut entry = Entry::new();
    entry.set_level(Level::Error);
    entry.set_message("boom", 1024);
    entry.add_field("k", Value::Int(1));
    entry.add_tag("t");
    entry.add_metric("m", 1.0);
    entry.set_trace_id("abc");
    entry.set_caller("src/main.rs", 42);
    entry.set_duration(std::time::Duration::from_millis(5));
    entry.set_error("io");
    entry.set_stack_trace("frame 0");

    entry.reset();

    assert_eq!(entry.level(), Level::Info);
    assert_eq!(entry.message(), "");
    assert!(entry.fields().is_empty());
    assert_eq!(entry.tags().count(), 0);
    assert!(entry.metrics().is_empty());
    assert_eq!(entry.trace_id(), "");
    assert!(entry.caller().is_none());
    assert!(entry.duration().is_none());
    assert_eq!(entry.error(), "");
    assert_eq!(entry.stack_trace(), "");
}

#[test]
fn test_long_field_value_truncated_not_dropped() {
    let mut entry = Entry::new();
    let long = "v".repeat(1000);
    entry.add_field("key", Value::Str(&long));
    match entry.field("key").unwrap() {
        FieldValue::Str(s) => assert_eq!(s.len(), 256),
        other => panic!("wrong kind: {other:?}"),
    }
}
