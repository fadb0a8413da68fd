use serde_json::Value;

/// Converts a 1-based line and column, as reported by the JSON and YAML
/// parsers, into a byte offset into `source`. Positions past the end clamp
/// to the source length.
pub fn offset_from_line_and_column(source: &str, line: usize, column: usize) -> usize {
    let mut offset = 0;
    for (index, text) in source.split_inclusive('\n').enumerate() {
        if index + 1 == line {
            let within = text
                .char_indices()
                .nth(column.saturating_sub(1))
                .map_or(text.len(), |(i, _)| i);
            return offset + within;
        }
        offset += text.len();
    }
    source.len()
}

/// Lowercases and strips `-`, `_`, `.` and whitespace so that `fontStretch`,
/// `font-stretch` and `FONT_STRETCH` compare equal.
pub fn normalize_id(id: &str) -> String {
    id.chars()
        .filter(|c| !matches!(c, '-' | '_' | '.') && !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Short name of a JSON value's kind for error messages.
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Leading numeric part of a literal: `16` for `16`, `"16px"` or `"1.5rem"`.
pub fn leading_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let s = s.trim();
            let end = s
                .char_indices()
                .find(|(i, c)| !(c.is_ascii_digit() || *c == '.' || (*i == 0 && (*c == '-' || *c == '+'))))
                .map_or(s.len(), |(i, _)| i);
            s[..end].parse().ok()
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_offset_from_line_and_column() {
        let source = "{\n  \"a\": 1,\n  \"b\": x\n}";
        assert_eq!(offset_from_line_and_column(source, 1, 1), 0);
        assert_eq!(offset_from_line_and_column(source, 3, 8), source.find('x').unwrap());
        assert_eq!(offset_from_line_and_column(source, 99, 1), source.len());
    }

    #[test]
    fn test_normalize_id() {
        assert_eq!(normalize_id("font-stretch"), "fontstretch");
        assert_eq!(normalize_id("FONT_STRETCH"), "fontstretch");
        assert_eq!(normalize_id("fontStretch"), "fontstretch");
    }

    #[test]
    fn test_leading_number() {
        assert_eq!(leading_number(&json!(16)), Some(16.0));
        assert_eq!(leading_number(&json!("16px")), Some(16.0));
        assert_eq!(leading_number(&json!("-0.5rem")), Some(-0.5));
        assert_eq!(leading_number(&json!("auto")), None);
        assert_eq!(leading_number(&json!(true)), None);
    }
}
