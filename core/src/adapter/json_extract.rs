//! Bracket-counting JSON extraction from free-form prose (spec.md §4.4,
//! §9). Replaces the source's fragile "first `{` to last `}`" approach with
//! a scan that respects string literals and escapes, so braces quoted
//! inside a JSON string value never desynchronize the nesting count.

/// Return the first balanced `{...}` substring of `text`, or `None` if no
/// `{` is present or the braces never balance. Callers should treat `None`
/// as an `API_PARSE_ERROR` (spec.md §9).
pub fn extract_json_object(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let start = text.find('{')?;

    let mut depth: i32 = 0;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &byte) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }

        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=offset]);
                }
            }
            _ => {}
        }
    }
    None
}
