//! Helpers for picking usable fragments out of untrusted oracle text.

/// Remove a surrounding Markdown code fence, if present.
///
/// Only the first fenced block is kept; text outside it is discarded. Input
/// without fences is returned trimmed.
pub fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    let Some(start) = trimmed.find("```") else {
        return trimmed.to_string();
    };
    let after_open = &trimmed[start + 3..];
    // Skip the info string (e.g. "json" or "rust") up to the end of the line.
    let body_start = after_open.find('\n').map(|i| i + 1).unwrap_or(after_open.len());
    let body = &after_open[body_start..];
    match body.find("```") {
        Some(end) => body[..end].trim().to_string(),
        None => body.trim().to_string(),
    }
}

/// Find the first method body in generated source.
///
/// The span between the first `{` after a `fn` or `def` signature and its
/// matching `}` is returned. When no signature is present the whole
/// (fence-stripped) text is treated as the body. The result must contain a
/// `return`, otherwise it is rejected.
pub fn extract_method_body(text: &str) -> Option<String> {
    let code = strip_code_fences(text);
    let body = find_braced_body(&code).unwrap_or_else(|| code.clone());
    let body = body.trim();
    if body.is_empty() || !body.contains("return") {
        return None;
    }
    Some(body.to_string())
}

fn find_braced_body(code: &str) -> Option<String> {
    let sig = code.find("fn ").or_else(|| code.find("def "))?;
    let open = sig + code[sig..].find('{')?;
    let mut depth = 0usize;
    for (offset, ch) in code[open..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(code[open + 1..open + offset].to_string());
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_fences() {
        assert_eq!(strip_code_fences("```json\n[1, 2]\n```"), "[1, 2]");
        assert_eq!(strip_code_fences("Here:\n```\nabc\n```\nthanks"), "abc");
        assert_eq!(strip_code_fences("  plain  "), "plain");
        assert_eq!(strip_code_fences("```rust\nunterminated"), "unterminated");
    }

    #[test]
    fn test_extract_body_from_function() {
        let text = "```rust\nfn run(input: Value) -> Value {\n    let x = 1;\n    if x > 0 { return input; }\n    return Value::Null;\n}\n```";
        let body = extract_method_body(text).unwrap();
        assert!(body.starts_with("let x = 1;"));
        assert!(body.ends_with("return Value::Null;"));
    }

    #[test]
    fn test_body_requires_return() {
        assert!(extract_method_body("fn run() { 42 }").is_none());
        assert!(extract_method_body("").is_none());
        assert_eq!(
            extract_method_body("return input.to_uppercase();").as_deref(),
            Some("return input.to_uppercase();")
        );
    }
}
