//! Text primitives shared by the validators. Everything here is single-pass or
//! works inside a bounded window, so adversarial input stays linear.

use once_cell::sync::Lazy;
use regex::Regex;

/// Longest brace-delimited body inspected when looking inside a constructor.
pub const MAX_BLOCK_WINDOW: usize = 64 * 1024;

/// `(function name?(args) {` or `((args) => {`, optionally async.
pub static IIFE_OPEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\(\s*(?:async\s+)?function\b\s*\w*\s*\([^)]*\)\s*\{|\(\s*(?:async\s*)?\([^)]*\)\s*=>\s*\{")
        .expect("static pattern")
});

pub static CONSTRUCTOR_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bconstructor\s*\([^)]*\)\s*\{").expect("static pattern"));

/// One line of source text with its 1-based number and starting byte offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Line<'a> {
    pub number: usize,
    pub offset: usize,
    pub text: &'a str,
}

impl Line<'_> {
    pub fn is_comment(&self) -> bool {
        is_comment_line(self.text)
    }
}

/// Lines without their terminators (`\n` or `\r\n`).
pub fn lines(text: &str) -> impl Iterator<Item = Line<'_>> {
    let mut offset = 0;
    text.split('\n').enumerate().map(move |(i, raw)| {
        let line = Line {
            number: i + 1,
            offset,
            text: raw.strip_suffix('\r').unwrap_or(raw),
        };
        offset += raw.len() + 1;
        line
    })
}

/// A line counts as commented when its first non-blank characters are `//`.
pub fn is_comment_line(line: &str) -> bool {
    line.trim_start().starts_with("//")
}

/// True when a `//` comment opens earlier on the line holding `pos`.
pub fn is_commented_at(text: &str, pos: usize) -> bool {
    let line_start = text[..pos].rfind('\n').map_or(0, |i| i + 1);
    text[line_start..pos].contains("//")
}

/// Byte offset to 1-based line number lookups.
#[derive(Clone, Debug)]
pub struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
        Self { starts }
    }

    pub fn line_of(&self, offset: usize) -> usize {
        match self.starts.binary_search(&offset) {
            Ok(i) => i + 1,
            Err(i) => i,
        }
    }
}

/// Markers not present verbatim in `text`, in configured order.
pub fn missing_literals<'a>(text: &str, required: &'a [String]) -> Vec<&'a str> {
    required
        .iter()
        .map(String::as_str)
        .filter(|m| !text.contains(m))
        .collect()
}

/// Text between the brace at `open` and its matching close brace. An unbalanced
/// block yields everything up to the window limit.
pub fn block_body(text: &str, open: usize) -> &str {
    let bytes = text.as_bytes();
    if bytes.get(open) != Some(&b'{') {
        return "";
    }
    let limit = text.len().min(open.saturating_add(MAX_BLOCK_WINDOW));
    let mut depth = 0usize;
    for (i, b) in bytes[open..limit].iter().enumerate() {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return &text[open + 1..open + i];
                }
            }
            _ => {}
        }
    }
    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[open + 1..end]
}

pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => chars.all(|c| c.is_ascii_alphanumeric() || c == '_'),
        _ => false,
    }
}
