//! Parameter value coercion for the execution handoff.
//!
//! UI controls and incoming connections hand over loosely-typed values
//! (strings from text inputs, numbers from sliders, comma-joined lists from
//! upstream nodes). The execution layer submits a typed JSON body, so every
//! value is coerced to its descriptor kind before it enters `request_json`.

use serde_json::{Number, Value, json};
use wavespeed_types::ParamKind;

/// Coerces `value` to the JSON shape expected for a parameter of `kind`.
///
/// Coercion is best-effort: a value that cannot be converted is passed
/// through unchanged rather than dropped, leaving upstream validation to the
/// API.
pub fn coerce_value(value: &Value, kind: ParamKind) -> Value {
    match kind {
        ParamKind::Text => coerce_text(value),
        ParamKind::Integer => coerce_integer(value),
        ParamKind::Float => coerce_float(value),
        ParamKind::Boolean => coerce_boolean(value),
        ParamKind::Enum => value.clone(),
        ParamKind::ArrayOfPrimitive => coerce_array(value, ParamKind::Text),
        ParamKind::ArrayOfObject => coerce_array(value, ParamKind::Enum),
    }
}

/// Splits a comma-joined list into trimmed, non-empty items.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn coerce_text(value: &Value) -> Value {
    match value {
        Value::String(_) => value.clone(),
        Value::Null => Value::String(String::new()),
        other => Value::String(stringify(other)),
    }
}

fn coerce_integer(value: &Value) -> Value {
    match value {
        Value::Number(number) => match number.as_i64() {
            Some(_) => value.clone(),
            None => number
                .as_f64()
                .map(|float| json!(float.round() as i64))
                .unwrap_or_else(|| value.clone()),
        },
        Value::String(text) => text
            .trim()
            .parse::<i64>()
            .map(|parsed| json!(parsed))
            .or_else(|_| text.trim().parse::<f64>().map(|parsed| json!(parsed.round() as i64)))
            .unwrap_or_else(|_| value.clone()),
        _ => value.clone(),
    }
}

fn coerce_float(value: &Value) -> Value {
    match value {
        Value::Number(_) => value.clone(),
        Value::String(text) => text
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| value.clone()),
        _ => value.clone(),
    }
}

fn coerce_boolean(value: &Value) -> Value {
    match value {
        Value::Bool(_) => value.clone(),
        Value::String(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => json!(true),
            "false" | "0" | "no" | "" => json!(false),
            _ => value.clone(),
        },
        Value::Number(number) => json!(number.as_f64().is_some_and(|float| float != 0.0)),
        _ => value.clone(),
    }
}

fn coerce_array(value: &Value, item_kind: ParamKind) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.iter().map(|item| coerce_value(item, item_kind)).collect()),
        Value::String(text) => Value::Array(
            split_list(text)
                .into_iter()
                .map(|item| coerce_value(&Value::String(item), item_kind))
                .collect(),
        ),
        Value::Null => Value::Array(Vec::new()),
        other => Value::Array(vec![coerce_value(other, item_kind)]),
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_parse_from_strings_and_round_from_floats() {
        assert_eq!(coerce_value(&json!("42"), ParamKind::Integer), json!(42));
        assert_eq!(coerce_value(&json!("3.7"), ParamKind::Integer), json!(4));
        assert_eq!(coerce_value(&json!(3.2), ParamKind::Integer), json!(3));
        assert_eq!(coerce_value(&json!(7), ParamKind::Integer), json!(7));
    }

    #[test]
    fn unparseable_values_pass_through_unchanged() {
        assert_eq!(coerce_value(&json!("not a number"), ParamKind::Integer), json!("not a number"));
        assert_eq!(coerce_value(&json!("maybe"), ParamKind::Boolean), json!("maybe"));
    }

    #[test]
    fn booleans_accept_common_textual_forms() {
        assert_eq!(coerce_value(&json!("true"), ParamKind::Boolean), json!(true));
        assert_eq!(coerce_value(&json!("0"), ParamKind::Boolean), json!(false));
        assert_eq!(coerce_value(&json!(""), ParamKind::Boolean), json!(false));
        assert_eq!(coerce_value(&json!(1), ParamKind::Boolean), json!(true));
    }

    #[test]
    fn comma_joined_strings_become_arrays() {
        assert_eq!(
            coerce_value(&json!("a.png, b.png ,, c.png"), ParamKind::ArrayOfPrimitive),
            json!(["a.png", "b.png", "c.png"])
        );
    }

    #[test]
    fn scalar_fed_to_array_parameter_wraps_into_a_single_element() {
        assert_eq!(coerce_value(&json!("one.png"), ParamKind::ArrayOfPrimitive), json!(["one.png"]));
        assert_eq!(coerce_value(&Value::Null, ParamKind::ArrayOfPrimitive), json!([]));
    }

    #[test]
    fn text_coercion_stringifies_non_strings() {
        assert_eq!(coerce_value(&json!(12), ParamKind::Text), json!("12"));
        assert_eq!(coerce_value(&Value::Null, ParamKind::Text), json!(""));
    }

    #[test]
    fn split_list_drops_empty_segments() {
        assert_eq!(split_list(" a , , b,"), vec!["a".to_string(), "b".to_string()]);
        assert!(split_list("  ").is_empty());
    }
}
