use aho_corasick::AhoCorasick;
use once_cell::sync::Lazy;

// Static initialization: automaton is built only once, thread-safe
static TEXT_ESCAPER: Lazy<Option<AhoCorasick>> =
    Lazy::new(|| AhoCorasick::builder().build(["&", "<", ">"]).ok());

static ATTR_ESCAPER: Lazy<Option<AhoCorasick>> = Lazy::new(|| {
    AhoCorasick::builder()
        .build(["&", "<", ">", "\"", "\t", "\n", "\r"])
        .ok()
});

/// Escape character data for use between tags.
///
/// # Examples
///
/// ```
/// use office_service::common::xml::escape_text;
/// assert_eq!(escape_text("a & b"), "a &amp; b");
/// assert_eq!(escape_text("\"quoted\""), "\"quoted\"");
/// ```
#[inline]
pub fn escape_text(s: &str) -> String {
    match TEXT_ESCAPER.as_ref() {
        Some(ac) => ac.replace_all(s, &["&amp;", "&lt;", "&gt;"]),
        None => fallback_escape(s, false),
    }
}

/// Escape a value for use inside a double-quoted attribute.
///
/// Whitespace control characters are written as character references so
/// they survive attribute value normalization on the next parse.
#[inline]
pub fn escape_attr(s: &str) -> String {
    match ATTR_ESCAPER.as_ref() {
        Some(ac) => ac.replace_all(
            s,
            &["&amp;", "&lt;", "&gt;", "&quot;", "&#9;", "&#10;", "&#13;"],
        ),
        None => fallback_escape(s, true),
    }
}

fn fallback_escape(s: &str, attr: bool) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attr => out.push_str("&quot;"),
            '\t' if attr => out.push_str("&#9;"),
            '\n' if attr => out.push_str("&#10;"),
            '\r' if attr => out.push_str("&#13;"),
            c => out.push(c),
        }
    }
    out
}

/// Resolve a single entity or character reference name (the part between
/// `&` and `;`).
pub fn resolve_reference(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let num = name.strip_prefix('#')?;
            let code = if let Some(hex) = num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                num.parse::<u32>().ok()?
            };
            char::from_u32(code)
        },
    }
}

/// Unescape XML entities and character references.
///
/// Unknown or malformed references are left unchanged.
///
/// # Examples
///
/// ```
/// use office_service::common::xml::unescape_xml;
/// assert_eq!(unescape_xml("&lt;a &amp; b&gt;"), "<a & b>");
/// assert_eq!(unescape_xml("&#65;&#x42;"), "AB");
/// assert_eq!(unescape_xml("&amp;lt;"), "&lt;");
/// assert_eq!(unescape_xml("&invalid;"), "&invalid;");
/// assert_eq!(unescape_xml("&amp"), "&amp");
/// ```
pub fn unescape_xml(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        let resolved = tail
            .find(';')
            .filter(|&end| end <= 12)
            .and_then(|end| resolve_reference(&tail[1..end]).map(|c| (c, end)));
        match resolved {
            Some((c, end)) => {
                out.push(c);
                rest = &tail[end + 1..];
            },
            None => {
                out.push('&');
                rest = &tail[1..];
            },
        }
    }
    out.push_str(rest);
    out
}
