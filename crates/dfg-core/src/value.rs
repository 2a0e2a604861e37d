use serde_yaml::{Number, Value};

/// Shape name used in diagnostics.
pub fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(tagged) => kind(&tagged.value),
    }
}

/// Stringifies a scalar. Null becomes the empty string; sequences and mappings
/// have no scalar rendering.
///
/// Strings come out as written and integers in decimal. Finite floats print in their
/// shortest form without a trailing `.0`, so `1e3` renders as `1000` and `1.0`
/// as `1`. Infinities and NaN keep the YAML spelling (`.inf`, `.nan`).
pub fn render_scalar(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::Bool(value) => Some(value.to_string()),
        Value::Number(value) => Some(render_number(value)),
        Value::String(value) => Some(value.clone()),
        Value::Tagged(tagged) => render_scalar(&tagged.value),
        Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

fn render_number(number: &Number) -> String {
    match number.as_f64() {
        Some(float) if number.is_f64() && float.is_finite() => float.to_string(),
        _ => number.to_string(),
    }
}

pub fn render_scalar_array(value: &Value) -> Option<Vec<String>> {
    let Value::Sequence(values) = value else {
        return None;
    };

    values.iter().map(render_scalar).collect()
}

/// Document flags are set only by the literal values `true` or `yes`.
pub fn is_truthy(value: &Value) -> bool {
    matches!(render_scalar(value).as_deref(), Some("true" | "yes"))
}
