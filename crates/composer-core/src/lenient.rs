//! Tolerant JSON extraction from free-form model output.
//!
//! Models wrap JSON in code fences, use typographic quotes, leave trailing
//! commas and put raw newlines inside strings. `parse_lenient_json` repairs
//! those and extracts the outermost object, or gives up with `None`.

use serde_json::Value;

const FENCE: &str = "```";

/// Extract and parse the outermost `{...}` object in `text`.
///
/// Returns `None` when nothing parseable is found; never panics.
pub fn parse_lenient_json(text: &str) -> Option<Value> {
    let body = extract_fenced(text);
    let normalized = normalize_quotes(body);
    let sliced = slice_object(&normalized)?;
    let repaired = escape_newlines_in_strings(&strip_trailing_commas(sliced));

    match parse_object(&repaired) {
        Some(v) => Some(v),
        None => {
            log::debug!("lenient JSON: first parse failed, retrying without tabs");
            parse_object(&repaired.replace('\t', " "))
        }
    }
}

fn parse_object(text: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(text) {
        Ok(v) if v.is_object() => Some(v),
        _ => None,
    }
}

/// Interior of the first fenced block, or the whole text when unfenced.
fn extract_fenced(text: &str) -> &str {
    let Some(start) = text.find(FENCE) else {
        return text;
    };
    let after = &text[start + FENCE.len()..];

    // Skip an info string such as `json` on the opening fence line
    let body = match after.find('\n') {
        Some(nl) if is_info_string(&after[..nl]) => &after[nl + 1..],
        _ => strip_json_tag(after),
    };

    match body.find(FENCE) {
        Some(end) => &body[..end],
        None => body,
    }
}

fn is_info_string(line: &str) -> bool {
    line.trim()
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn strip_json_tag(s: &str) -> &str {
    let trimmed = s.trim_start();
    match trimmed.get(..4) {
        Some(tag) if tag.eq_ignore_ascii_case("json") => &trimmed[4..],
        _ => s,
    }
}

fn normalize_quotes(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{2033}' => '"',
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' | '\u{2032}' => '\'',
            other => other,
        })
        .collect()
}

/// From the first `{` to the last `}` inclusive.
fn slice_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Drop commas that directly precede `}` or `]` outside of strings.
fn strip_trailing_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut scanner = StringScanner::default();

    for (i, &c) in chars.iter().enumerate() {
        if scanner.feed(c) {
            out.push(c);
            continue;
        }
        if c == ',' {
            let next = chars[i + 1..].iter().find(|n| !n.is_whitespace());
            if matches!(next, Some('}') | Some(']')) {
                continue;
            }
        }
        out.push(c);
    }
    out
}

/// Replace raw line breaks inside string literals with their escapes.
fn escape_newlines_in_strings(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut scanner = StringScanner::default();

    for c in text.chars() {
        let inside = scanner.feed(c);
        match c {
            '\n' if inside => out.push_str("\\n"),
            '\r' if inside => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out
}

/// Char-by-char tracker of whether we are inside a double-quoted string.
#[derive(Default)]
struct StringScanner {
    in_string: bool,
    escaped: bool,
}

impl StringScanner {
    /// Consume `c`; returns true when `c` belongs to a string literal
    /// (including its quotes).
    fn feed(&mut self, c: char) -> bool {
        if self.in_string {
            if self.escaped {
                self.escaped = false;
            } else if c == '\\' {
                self.escaped = true;
            } else if c == '"' {
                self.in_string = false;
            }
            return true;
        }
        if c == '"' {
            self.in_string = true;
            return true;
        }
        false
    }
}
