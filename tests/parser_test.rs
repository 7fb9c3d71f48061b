//! Tabular parser behaviour on realistic and malformed input.

use vibration_rss::data::parser::{parse, DropReason};
use vibration_rss::error::AnalysisError;

#[test]
fn test_row_drop_tolerance() {
    let parsed = parse("frequency,a,b\n1,2,3\nx,2,3\n2,bad,3\n3,4,5").unwrap();

    assert_eq!(parsed.report.valid_rows(), 2);
    assert_eq!(parsed.report.dropped_rows(), 2);

    let records = parsed.table.records();
    assert_eq!(records[0].frequency, 1.0);
    assert_eq!(records[0].get("a"), Some(2.0));
    assert_eq!(records[0].get("b"), Some(3.0));
    assert_eq!(records[1].frequency, 3.0);
    assert_eq!(records[1].get("a"), Some(4.0));
    assert_eq!(records[1].get("b"), Some(5.0));
}

#[test]
fn test_header_only_input_is_empty_result() {
    let err = parse("frequency,a").unwrap_err();
    assert!(matches!(err, AnalysisError::EmptyResult));
    assert_eq!(err.to_string(), "No valid data rows found in CSV");
}

#[test]
fn test_structural_errors() {
    for raw in ["", "   \n  \n"] {
        let err = parse(raw).unwrap_err();
        assert!(matches!(err, AnalysisError::Format(_)), "{raw:?}");
        assert!(err.to_string().contains("at least 2 rows"));
    }

    let err = parse("frequency\n1\n2").unwrap_err();
    assert!(matches!(err, AnalysisError::Format(_)));
    assert!(err.to_string().contains("at least 2 columns"));
}

#[test]
fn test_first_header_is_positional() {
    // any label works for the frequency column
    let parsed = parse("Hz,Node_1_X\n5,1\n").unwrap();
    assert_eq!(parsed.columns.names(), ["Node_1_X"]);
    assert_eq!(parsed.table.records()[0].frequency, 5.0);
}

#[test]
fn test_field_count_mismatch_reason() {
    let parsed = parse("f,a,b\n1,2\n2,3,4\n").unwrap();
    assert_eq!(
        parsed.report.dropped[0].reason,
        DropReason::FieldCount {
            expected: 3,
            found: 2
        }
    );
    assert_eq!(parsed.report.dropped[0].line, 2);
}

#[test]
fn test_lowercase_sensor_export() {
    let raw = "\
Frequency (Hz),Node_8000001_tm_x_file_1,Node_8000001_tm_y_file_1,Node_8000001_tm_z_file_1
0,0.00,0.00,0.00
1,1.5e-3,2.0e-3,0
2,\"3.1\",\"4.2\",\"5.3\"
";
    let parsed = parse(raw).unwrap();
    assert_eq!(parsed.table.len(), 3);
    assert_eq!(parsed.columns.len(), 3);
    assert_eq!(
        parsed.table.records()[2].get("Node_8000001_tm_z_file_1"),
        Some(5.3)
    );
}

#[test]
fn test_negative_and_exponent_values() {
    let parsed = parse("f,a\n-1,-2.5E2\n").unwrap();
    let record = &parsed.table.records()[0];
    assert_eq!(record.frequency, -1.0);
    assert_eq!(record.get("a"), Some(-250.0));
}
