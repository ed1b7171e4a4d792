//! Defensive JSON extraction from model output

use serde_json::Value;

/// Slice from the first `{` to the last `}`, skipping prose and code fences
pub fn extract_json(response: &str) -> Option<&str> {
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    (end > start).then(|| &response[start..=end])
}

/// Parse the JSON object embedded in a model response
pub fn parse_object(response: &str) -> std::result::Result<Value, String> {
    let json_str = extract_json(response).ok_or_else(|| {
        format!(
            "no JSON object in model response: {:?}",
            truncate(response, 120)
        )
    })?;
    let value: Value =
        serde_json::from_str(json_str).map_err(|e| format!("JSON parse error: {}", e))?;
    if value.is_object() {
        Ok(value)
    } else {
        Err("model response is not a JSON object".to_string())
    }
}

/// String form of a JSON scalar; `None` for null, arrays and objects
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// First present key among `keys`
pub fn field<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| value.get(*k))
        .find(|v| !v.is_null())
}

pub(crate) fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}
