//! Minimal markdown preview.
//!
//! Supports `#`/`##`/`###` headings, `**bold**`, `*italic*` and `` `code` `` spans,
//! one block per input line. User text is HTML-escaped before any tag is inserted,
//! so the output can be injected into a document as is.

use std::sync::OnceLock;

use regex::Regex;

const EMPTY_PARAGRAPH: &str = "<p></p>";

fn heading_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(#{1,3})\s+").unwrap())
}

fn code_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"`([^`]+)`").unwrap())
}

fn bold_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\*\*([^*]+)\*\*").unwrap())
}

fn italic_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\*([^*]+)\*").unwrap())
}

/// Render `md` to an HTML fragment, blocks separated by `\n`.
pub fn render_markdown(md: &str) -> String {
    if md.is_empty() {
        return EMPTY_PARAGRAPH.to_string();
    }

    md.split('\n')
        .map(|line| render_line(line.strip_suffix('\r').unwrap_or(line)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_line(line: &str) -> String {
    if let Some(marker) = heading_re().captures(line) {
        let level = marker[1].len();
        let text = &line[marker[0].len()..];
        return format!("<h{level}>{}</h{level}>", format_inline(text));
    }

    if line.trim().is_empty() {
        return EMPTY_PARAGRAPH.to_string();
    }

    format!("<p>{}</p>", format_inline(line))
}

/// Escape, then apply code, bold and italic spans in that order.
fn format_inline(text: &str) -> String {
    let escaped = escape_html(text);
    let out = code_re().replace_all(&escaped, "<code>${1}</code>");
    let out = bold_re().replace_all(&out, "<strong>${1}</strong>");
    let out = italic_re().replace_all(&out, "<em>${1}</em>");
    out.into_owned()
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
