//! HTML escaping and allow-list sanitization.
//!
//! # Responsibility
//! - Escape plain text for safe embedding in element bodies and attributes.
//! - Reduce user-authored HTML to a small allow-list of formatting tags.
//!
//! # Invariants
//! - Sanitizer output never contains `<a>`, `<script>` or `<style>` elements,
//!   so anchors found after cross-referencing are engine-generated.
//! - Kept tags lose all attributes.
//! - Existing character entities are not escaped twice.

use crate::text::view::{DecodedView, TAG_PLACEHOLDER};
use once_cell::sync::Lazy;
use regex::Regex;

static SCRIPT_BLOCK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>.*?(</script\s*>|$)").expect("valid script regex")
});
static STYLE_BLOCK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<style\b[^>]*>.*?(</style\s*>|$)").expect("valid style regex")
});
static COMMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<!--.*?(-->|$)").expect("valid comment regex"));
static TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<(/?)([A-Za-z][A-Za-z0-9]*)\b[^<>]*?(/?)>").expect("valid tag regex")
});
static ENTITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^&(?:#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[A-Za-z][A-Za-z0-9]{1,31});")
        .expect("valid entity regex")
});

const DEFAULT_ALLOWED_TAGS: &[&str] = &[
    "p",
    "br",
    "em",
    "strong",
    "b",
    "i",
    "u",
    "ul",
    "ol",
    "li",
    "blockquote",
];

/// Escapes `&`, `<`, `>`, `"` and `'` for element bodies and attribute values.
pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Reduces an HTML fragment to the text a reader sees.
///
/// Tags become single spaces, entities are decoded and non-breaking spaces
/// become plain spaces. Used only for matching, never for output.
pub fn to_plain_text(html: &str) -> String {
    DecodedView::new(html)
        .text()
        .chars()
        .map(|ch| match ch {
            TAG_PLACEHOLDER | '\u{a0}' => ' ',
            other => other,
        })
        .collect()
}

/// Decodes one character entity at the start of `source`.
///
/// Returns the decoded char and the entity's byte length. Unknown named
/// entities and invalid code points yield `None` and stay literal.
pub(crate) fn decode_entity(source: &str) -> Option<(char, usize)> {
    let entity = ENTITY_RE.find(source)?.as_str();
    let body = &entity[1..entity.len() - 1];
    let decoded = match body {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        _ => {
            let code = if let Some(hex) = body.strip_prefix("#x").or_else(|| body.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok()?
            } else if let Some(decimal) = body.strip_prefix('#') {
                decimal.parse::<u32>().ok()?
            } else {
                return None;
            };
            char::from_u32(code)?
        }
    };
    Some((decoded, entity.len()))
}

/// Sanitizer applied to user-authored rich text before cross-referencing.
///
/// Implementations must remove user-supplied anchors; re-sanitizing engine
/// output would strip the generated links.
pub trait HtmlSanitizer {
    fn sanitize(&self, html: &str) -> String;
}

/// Regex-driven allow-list sanitizer.
#[derive(Debug, Clone)]
pub struct AllowListSanitizer {
    allowed_tags: Vec<String>,
}

impl Default for AllowListSanitizer {
    fn default() -> Self {
        Self {
            allowed_tags: DEFAULT_ALLOWED_TAGS
                .iter()
                .map(|tag| (*tag).to_string())
                .collect(),
        }
    }
}

impl AllowListSanitizer {
    /// Builds a sanitizer with a custom tag allow-list.
    ///
    /// `a`, `script` and `style` are always rejected even when listed.
    pub fn with_allowed_tags<I, T>(tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let allowed_tags = tags
            .into_iter()
            .map(|tag| tag.as_ref().trim().to_ascii_lowercase())
            .filter(|tag| !tag.is_empty() && !matches!(tag.as_str(), "a" | "script" | "style"))
            .collect();
        Self { allowed_tags }
    }

    fn is_allowed(&self, tag: &str) -> bool {
        self.allowed_tags.iter().any(|allowed| allowed == tag)
    }
}

impl HtmlSanitizer for AllowListSanitizer {
    fn sanitize(&self, html: &str) -> String {
        let without_scripts = SCRIPT_BLOCK_RE.replace_all(html, "");
        let without_styles = STYLE_BLOCK_RE.replace_all(&without_scripts, "");
        let source = COMMENT_RE.replace_all(&without_styles, "");

        let mut out = String::with_capacity(source.len());
        let mut cursor = 0;
        for caps in TAG_RE.captures_iter(&source) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            push_escaped_text(&mut out, &source[cursor..whole.start()]);
            cursor = whole.end();

            let name = caps[2].to_ascii_lowercase();
            if !self.is_allowed(&name) {
                continue;
            }
            let closing = &caps[1] == "/";
            if closing {
                out.push_str(&format!("</{name}>"));
            } else {
                out.push_str(&format!("<{name}>"));
            }
        }
        push_escaped_text(&mut out, &source[cursor..]);
        out
    }
}

/// Escapes a text run that sits between tags, leaving valid entities intact.
///
/// Uses the same entity set as `escape_html`.
fn push_escaped_text(out: &mut String, text: &str) {
    for (idx, ch) in text.char_indices() {
        match ch {
            '&' if ENTITY_RE.is_match(&text[idx..]) => out.push('&'),
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{decode_entity, escape_html, to_plain_text, AllowListSanitizer, HtmlSanitizer};

    #[test]
    fn escape_html_covers_markup_characters() {
        assert_eq!(
            escape_html(r#"<b>"Fish" & 'Chips'</b>"#),
            "&lt;b&gt;&quot;Fish&quot; &amp; &#39;Chips&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn plain_text_drops_tags_and_decodes_entities() {
        assert_eq!(
            to_plain_text("<p>Fish &amp; <em>Chips</em></p>"),
            " Fish &  Chips  "
        );
    }

    #[test]
    fn entities_decode_by_name_and_code_point() {
        assert_eq!(decode_entity("&#39;s"), Some(('\'', 5)));
        assert_eq!(decode_entity("&#x41;"), Some(('A', 6)));
        assert_eq!(decode_entity("&nbsp;Fishing"), Some(('\u{a0}', 6)));
        assert_eq!(decode_entity("&copy;"), None);
        assert_eq!(decode_entity("& Chips"), None);
    }

    #[test]
    fn plain_text_turns_nbsp_into_spaces() {
        assert_eq!(to_plain_text("Reef&nbsp;Fishing"), "Reef Fishing");
    }

    #[test]
    fn sanitizer_drops_scripts_and_unwraps_user_anchors() {
        let sanitizer = AllowListSanitizer::default();
        let out = sanitizer.sanitize(
            r#"<p onclick="x()">Go <a href="http://evil">fishing</a></p><script>alert(1)</script>"#,
        );
        assert_eq!(out, "<p>Go fishing</p>");
    }

    #[test]
    fn sanitizer_escapes_stray_brackets_but_keeps_entities() {
        let sanitizer = AllowListSanitizer::default();
        let out = sanitizer.sanitize("a < b &amp; c & d");
        assert_eq!(out, "a &lt; b &amp; c &amp; d");
    }

    #[test]
    fn sanitized_text_matches_escaped_titles() {
        let sanitizer = AllowListSanitizer::default();
        let out = sanitizer.sanitize("<p>Maria's \"Feast\"</p>");
        assert!(out.contains(&escape_html(r#"Maria's "Feast""#)));
    }

    #[test]
    fn custom_allow_list_never_admits_anchors() {
        let sanitizer = AllowListSanitizer::with_allowed_tags(["A", "em"]);
        let out = sanitizer.sanitize(r#"<em>x</em><a href="y">z</a>"#);
        assert_eq!(out, "<em>x</em>z");
    }
}
