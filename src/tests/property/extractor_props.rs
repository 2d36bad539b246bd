//! Property-based tests for the balanced-delimiter extractor.

use proptest::prelude::*;
use serde_json::{Map, Value};

use crate::core::extract::extract_value;

fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i32>().prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
        // Braces and brackets inside strings must not confuse the scanner
        "[a-zA-Z0-9 {}\\[\\]\"\\\\:,]{0,12}".prop_map(Value::from),
        Just(Value::Null),
    ]
}

fn json_value() -> impl Strategy<Value = Value> {
    leaf().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect::<Map<_, _>>())),
        ]
    })
}

fn container() -> impl Strategy<Value = Value> {
    json_value().prop_filter("top level must be an object or array", |v| v.is_object() || v.is_array())
}

/// Prose without delimiters or fences.
fn prose() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 .,:!?\n]{0,40}"
}

proptest! {
    #[test]
    fn fenced_value_is_returned_exactly(value in container(), before in prose(), after in prose()) {
        let raw = format!("{before}```json\n{value:#}\n```{after}");
        prop_assert_eq!(extract_value(&raw).unwrap(), value);
    }

    #[test]
    fn prose_wrapped_value_is_returned_exactly(value in container(), before in prose(), after in prose()) {
        let raw = format!("{before}{value}{after}");
        prop_assert_eq!(extract_value(&raw).unwrap(), value);
    }

    #[test]
    fn truncated_value_is_an_error(value in container(), before in prose(), cut in 0.0f64..1.0) {
        let serialized = value.to_string();
        // Keep at least the opener, drop at least the final closer
        let keep = 1 + ((serialized.len() - 1) as f64 * cut) as usize;
        let keep = keep.min(serialized.len() - 1);
        prop_assume!(serialized.is_char_boundary(keep));
        let raw = format!("{before}{}", &serialized[..keep]);
        prop_assert!(extract_value(&raw).is_err());
    }
}
