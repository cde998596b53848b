use serde_json::Value;

use crate::errors::ExtractError;

/// Take the span from the first `[` to the last `]`, inclusive. The full
/// bracketed span is used as-is; no heuristic shortening, so a truncated
/// response surfaces as a parse failure instead of a silently smaller batch.
pub fn extract_array_span(raw: &str) -> Result<&str, ExtractError> {
    let start = raw.find('[').ok_or(ExtractError::NoArrayFound)?;
    let end = raw.rfind(']').ok_or(ExtractError::NoArrayFound)?;
    if end <= start {
        return Err(ExtractError::NoArrayFound);
    }
    Ok(&raw[start..=end])
}

/// Parse the candidate array strictly; on failure run one tolerant repair
/// pass and re-parse. A `[[ ... ]]` single-nested array is unwrapped.
pub fn parse_candidates(span: &str) -> Result<Vec<Value>, ExtractError> {
    let arr = match serde_json::from_str::<Value>(span) {
        Ok(v) => v,
        Err(strict_err) => {
            let repaired = repair_json(span);
            serde_json::from_str::<Value>(&repaired)
                .map_err(|_| ExtractError::UnrecoverableJson(strict_err.to_string()))?
        }
    };
    let mut items = match arr {
        Value::Array(items) => items,
        _ => return Err(ExtractError::NoArrayFound),
    };
    if items.len() == 1 && items[0].is_array() {
        match items.pop() {
            Some(Value::Array(inner)) => items = inner,
            _ => unreachable!(),
        }
    }
    Ok(items)
}

/// Best-effort structural repair of damaged JSON: drops trailing commas,
/// closes an unterminated string, and appends the closers still missing at
/// end of input. Heuristic by design; callers must re-parse to find out
/// whether it worked.
pub fn repair_json(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    let mut stack: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for ch in text.chars() {
        if in_string {
            out.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => {
                in_string = true;
                out.push(ch);
            }
            '[' => {
                stack.push(']');
                out.push(ch);
            }
            '{' => {
                stack.push('}');
                out.push(ch);
            }
            ']' | '}' => {
                drop_trailing_comma(&mut out);
                if stack.last() == Some(&ch) {
                    stack.pop();
                }
                out.push(ch);
            }
            _ => out.push(ch),
        }
    }

    if in_string {
        out.push('"');
    }
    drop_trailing_comma(&mut out);
    while let Some(closer) = stack.pop() {
        out.push(closer);
    }
    out
}

// Remove a comma that would directly precede a closing bracket, ignoring
// whitespace between the two.
fn drop_trailing_comma(out: &mut String) {
    let trimmed_len = out.trim_end().len();
    if out[..trimmed_len].ends_with(',') {
        let tail = out.split_off(trimmed_len - 1);
        let rest: String = tail.chars().skip(1).collect();
        out.push_str(&rest);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_is_first_open_to_last_close() {
        let raw = "here you go: [1, 2] and also [3]";
        assert_eq!(extract_array_span(raw).expect("span"), "[1, 2] and also [3]");
    }

    #[test]
    fn missing_or_inverted_brackets() {
        assert!(matches!(
            extract_array_span("no array here"),
            Err(ExtractError::NoArrayFound)
        ));
        assert!(matches!(
            extract_array_span("] backwards ["),
            Err(ExtractError::NoArrayFound)
        ));
    }

    #[test]
    fn strict_parse_passes_through() {
        let items = parse_candidates(r#"[{"type":"tf"},{"type":"mcq"}]"#).expect("parse");
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn trailing_comma_is_repaired() {
        let span = r#"[ {"type":"tf","question_ar":"هل؟"}, ]"#;
        let items = parse_candidates(span).expect("repaired parse");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["type"], "tf");
    }

    #[test]
    fn unterminated_string_and_missing_closers() {
        let span = r#"[{"type":"tf","question_ar":"هل السماء زرقاء"#;
        let items = parse_candidates(span).expect("repaired parse");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["question_ar"], "هل السماء زرقاء");
    }

    #[test]
    fn nested_single_array_is_unwrapped() {
        let items = parse_candidates(r#"[[{"a":1},{"a":2}]]"#).expect("parse");
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn hopeless_input_reports_unrecoverable() {
        assert!(matches!(
            parse_candidates("[}{]"),
            Err(ExtractError::UnrecoverableJson(_))
        ));
    }
}
