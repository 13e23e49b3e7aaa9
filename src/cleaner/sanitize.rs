//! Repair of non-standard JSON number tokens.
//!
//! Python's `json.dumps` writes float NaN and infinities as bare `NaN`,
//! `Infinity` and `-Infinity`, which strict JSON parsers reject. These tokens
//! are rewritten to `null` when they appear outside string literals.

use std::borrow::Cow;

const TOKENS: [&str; 4] = ["-Infinity", "Infinity", "-NaN", "NaN"];

/// Replace bare non-finite number tokens with `null`.
pub fn sanitize_non_finite(payload: &str) -> Cow<'_, str> {
    if !payload.contains("NaN") && !payload.contains("Infinity") {
        return Cow::Borrowed(payload);
    }

    let mut out = String::with_capacity(payload.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut i = 0;

    while i < payload.len() {
        let rest = &payload[i..];
        let Some(c) = rest.chars().next() else {
            break;
        };

        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
        } else if c == '"' {
            in_string = true;
        } else if let Some(token) = TOKENS.iter().find(|t| rest.starts_with(**t)) {
            let before_ok = out
                .chars()
                .last()
                .map_or(true, |p| !p.is_ascii_alphanumeric());
            let after_ok = rest[token.len()..]
                .chars()
                .next()
                .map_or(true, |n| !n.is_ascii_alphanumeric());
            if before_ok && after_ok {
                out.push_str("null");
                i += token.len();
                continue;
            }
        }

        out.push(c);
        i += c.len_utf8();
    }

    Cow::Owned(out)
}
