//! Inline passes: emphasis, code and line breaks.

use once_cell::sync::Lazy;
use regex::Regex;

static BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("valid bold pattern"));
static FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(.*?)```").expect("valid fence pattern"));
static CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`(.+?)`").expect("valid code pattern"));

pub fn bold(text: &str) -> String {
    BOLD.replace_all(text, "<strong>${1}</strong>").into_owned()
}

/// Single-asterisk emphasis.
///
/// An opening `*` counts only at the very start of the text or after a
/// character other than `*`; that character is kept. The first emphasized
/// character must not be whitespace, the span stays on one line, and the
/// closing `*` must not be followed by another `*`. The shortest span that
/// satisfies this wins.
pub fn italic(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        if i == 0 && chars[0] == '*' {
            if let Some(close) = find_emphasis_close(&chars, 0) {
                push_emphasis(&mut out, &chars[1..close]);
                i = close + 1;
                continue;
            }
        }

        if chars[i] != '*' && chars.get(i + 1) == Some(&'*') {
            if let Some(close) = find_emphasis_close(&chars, i + 1) {
                out.push(chars[i]);
                push_emphasis(&mut out, &chars[i + 2..close]);
                i = close + 1;
                continue;
            }
        }

        out.push(chars[i]);
        i += 1;
    }

    out
}

/// Index of the `*` closing the span opened at `open`, if any.
fn find_emphasis_close(chars: &[char], open: usize) -> Option<usize> {
    let first = *chars.get(open + 1)?;
    if first.is_whitespace() {
        return None;
    }

    let mut end = open + 2;
    loop {
        let ch = *chars.get(end)?;
        if ch == '*' && chars.get(end + 1) != Some(&'*') {
            return Some(end);
        }
        if is_line_terminator(ch) {
            return None;
        }
        end += 1;
    }
}

fn push_emphasis(out: &mut String, inner: &[char]) {
    out.push_str("<em>");
    out.extend(inner);
    out.push_str("</em>");
}

const fn is_line_terminator(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// Triple-backtick blocks, which may span lines.
pub fn fenced_code(text: &str) -> String {
    FENCE
        .replace_all(text, "<pre><code>${1}</code></pre>")
        .into_owned()
}

pub fn inline_code(text: &str) -> String {
    CODE.replace_all(text, "<code>${1}</code>").into_owned()
}

pub fn line_breaks(text: &str) -> String {
    text.replace('\n', "<br>")
}
