//! Bounded text rewrites applied around parsing and writing of whole paste buffers.
//!
//! The rule set is fixed: a handful of engine quirks that would otherwise break the grammar.

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::ops::Range;

/// Prefix given to keys that collide with a declared attribute of another type.
pub const MARKER: &str = "_UNT_";

const DROPPED_LINES: [&str; 4] = [
    "LocalVariables(",
    "Children(",
    "CustomProperties UserDefinedPin (",
    "CustomProperties  (",
];

const EMPTY_LINKS: &str = ",LinkedTo=()";

lazy_static! {
    static ref AMBIGUOUS_KEYS: Regex =
        Regex::new(r"(?m)(^|[\s(,])(R=True|G=True|B=True|A=\(Expression=|B=\(Expression=)").unwrap();
    static ref NAN: Regex = Regex::new(r"\bNaN\b").unwrap();
    static ref MARKER_TEXT: Regex = Regex::new(&regex::escape(MARKER)).unwrap();
}

/// Byte ranges of the double-quoted strings in `text`, quotes included.
///
/// A backslash escapes the next character. An unterminated string runs to the end of the text.
fn string_spans(text: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut open = None;
    let mut escaped = false;
    for (i, c) in text.char_indices() {
        match open {
            None if c == '"' => open = Some(i),
            None => {}
            Some(_) if escaped => escaped = false,
            Some(_) if c == '\\' => escaped = true,
            Some(start) if c == '"' => {
                spans.push(start..i + 1);
                open = None;
            }
            Some(_) => {}
        }
    }
    if let Some(start) = open {
        spans.push(start..text.len());
    }
    spans
}

fn in_spans(spans: &[Range<usize>], offset: usize) -> bool {
    let after = spans.partition_point(|span| span.end <= offset);
    spans.get(after).map_or(false, |span| span.start <= offset)
}

/// Like `Regex::replace_all`, but matches starting inside a quoted string are kept as they are.
fn replace_outside_strings<'t>(
    pattern: &Regex,
    text: &'t str,
    mut replace: impl FnMut(&Captures<'_>) -> String,
) -> Cow<'t, str> {
    if !pattern.is_match(text) {
        return Cow::Borrowed(text);
    }
    let spans = string_spans(text);
    pattern.replace_all(text, |caps: &Captures<'_>| {
        let whole = &caps[0];
        let start = caps.get(0).map_or(0, |m| m.start());
        if in_spans(&spans, start) {
            whole.to_string()
        } else {
            replace(caps)
        }
    })
}

/// Rewrites raw paste text so that the grammar accepts it.
///
/// Text inside quoted strings is never marked or rewritten.
pub fn pre_parse(text: &str) -> String {
    let mut hits = 0;
    let marked = replace_outside_strings(&AMBIGUOUS_KEYS, text, |caps| {
        hits += 1;
        format!("{}{MARKER}{}", &caps[1], &caps[2])
    });
    if hits > 0 {
        log::debug!("tagged {hits} ambiguous attribute key(s) with `{MARKER}`");
    }

    let mut kept = String::with_capacity(marked.len());
    let mut dropped = 0;
    for line in marked.split_inclusive('\n') {
        if DROPPED_LINES.iter().any(|pattern| line.contains(pattern)) {
            dropped += 1;
            continue;
        }
        kept.push_str(line);
    }
    if dropped > 0 {
        log::debug!("dropped {dropped} unsupported line(s)");
    }

    let kept = kept.replace(EMPTY_LINKS, "");
    replace_outside_strings(&NAN, &kept, |_| "0".to_string()).into_owned()
}

/// Removes marker text that survived into written output, leaving quoted strings alone.
pub fn post_write(text: &str) -> String {
    replace_outside_strings(&MARKER_TEXT, text, |_| String::new()).into_owned()
}

pub fn strip_marker(key: &str) -> &str {
    key.strip_prefix(MARKER).unwrap_or(key)
}
