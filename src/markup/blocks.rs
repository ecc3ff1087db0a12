//! Line-oriented passes: headings, rules, quotes and lists.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static H3: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^### (.+)$").expect("valid h3 pattern"));
static H2: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^## (.+)$").expect("valid h2 pattern"));
static H1: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^# (.+)$").expect("valid h1 pattern"));
static RULE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^---$").expect("valid rule pattern"));
static QUOTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^> (.+)$").expect("valid quote pattern"));
static ORDERED_RUN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[0-9]+\. .+(?:\n[0-9]+\. .+)*").expect("valid ordered list pattern")
});
static UNORDERED_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^- .+(?:\n- .+)*").expect("valid unordered list pattern"));

/// `#`, `##` and `###` headings. Deeper levels are left alone.
pub fn headings(text: &str) -> String {
    let text = H3.replace_all(text, "<h3>${1}</h3>");
    let text = H2.replace_all(&text, "<h2>${1}</h2>");
    H1.replace_all(&text, "<h1>${1}</h1>").into_owned()
}

pub fn rules(text: &str) -> String {
    RULE.replace_all(text, "<hr>").into_owned()
}

/// Single-line block quotes; consecutive quote lines are not merged.
pub fn quotes(text: &str) -> String {
    QUOTE
        .replace_all(text, "<blockquote>${1}</blockquote>")
        .into_owned()
}

/// Collapse each run of `1. item` lines into one `<ol>`.
pub fn ordered_lists(text: &str) -> String {
    ORDERED_RUN
        .replace_all(text, |caps: &Captures<'_>| {
            list_block("ol", &caps[0], |line| {
                line.split_once(". ").map_or(line, |(_, item)| item)
            })
        })
        .into_owned()
}

/// Collapse each run of `- item` lines into one `<ul>`.
pub fn unordered_lists(text: &str) -> String {
    UNORDERED_RUN
        .replace_all(text, |caps: &Captures<'_>| {
            list_block("ul", &caps[0], |line| line.strip_prefix("- ").unwrap_or(line))
        })
        .into_owned()
}

fn list_block(tag: &str, run: &str, item_text: impl Fn(&str) -> &str) -> String {
    let items: String = run
        .split('\n')
        .map(|line| format!("<li>{}</li>", item_text(line)))
        .collect();
    format!("<{tag}>{items}</{tag}>")
}
