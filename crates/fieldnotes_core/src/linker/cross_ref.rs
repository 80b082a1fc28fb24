//! Title/ID cross-reference rewriter.
//!
//! # Responsibility
//! - Index a candidate snapshot once (slug, id, title pattern).
//! - Rewrite sanitized HTML in `Auto` or `Manual` mode.
//!
//! # Invariants
//! - Candidates are tried longest slug first; ties keep discovery order.
//! - Auto matching runs on the entity-decoded text; titles never match
//!   across tags, and whitespace between title words may be any run of
//!   spaces, including `&nbsp;`.
//! - An Auto match overlapping an existing anchor element or any tag is
//!   skipped. A Manual reference is skipped only when it overlaps an anchor
//!   or its braces sit inside a tag.
//! - A key shared by different record ids is never linked.
//! - The anchor label is always the candidate's canonical title.

use crate::model::record::RecordId;
use crate::model::reference::ReferenceCandidate;
use crate::text::{
    anchor_spans, escape_html, protected_spans, slugify, tag_spans, to_plain_text, DecodedView,
    TextSpan,
};
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt::{Display, Formatter};
use std::time::Instant;

static MANUAL_REFERENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([^{}]*)\}").expect("valid manual reference regex"));
static ANCHOR_HREF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)<a\s+href="([^"]*)""#).expect("valid anchor href regex"));

/// How a field's references are discovered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossReferenceMode {
    /// Link every title mention found in the text.
    #[default]
    Auto,
    /// Link only `{title}` / `{id}` segments; everything else stays plain.
    Manual,
}

impl CrossReferenceMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Manual => "manual",
        }
    }
}

impl Display for CrossReferenceMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of one rewrite call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteReport {
    pub html: String,
    /// Ids of all records linked from `html`, in first-mention order.
    pub linked_record_ids: Vec<RecordId>,
    /// Ambiguous keys that were mentioned but left unlinked.
    pub skipped_ambiguous: Vec<String>,
}

#[derive(Debug, Clone)]
struct IndexedCandidate {
    candidate: ReferenceCandidate,
    /// Escaped canonical title used as the anchor label.
    label: String,
    href: String,
    /// Case-insensitive title pattern over decoded text.
    pattern: Regex,
}

/// Candidate index reusable across many fields of one save.
#[derive(Debug, Clone, Default)]
pub struct CrossReferencer {
    ordered: Vec<IndexedCandidate>,
    by_key: HashMap<String, usize>,
    by_href: HashMap<String, usize>,
    by_id: HashMap<RecordId, usize>,
    ambiguous: BTreeSet<String>,
}

impl CrossReferencer {
    /// Indexes a candidate snapshot.
    ///
    /// Unlinkable candidates are dropped, exact duplicates (same key and id)
    /// collapse, and keys claimed by more than one id become ambiguous.
    pub fn new<I>(candidates: I) -> Self
    where
        I: IntoIterator<Item = ReferenceCandidate>,
    {
        let mut unique: Vec<ReferenceCandidate> = Vec::new();
        let mut owner_by_key: HashMap<String, RecordId> = HashMap::new();
        let mut ambiguous = BTreeSet::new();

        for candidate in candidates {
            if !candidate.is_linkable() {
                debug!(
                    "event=xref_index module=linker status=skipped reason=unlinkable record_id={}",
                    candidate.record_id
                );
                continue;
            }
            match owner_by_key.get(&candidate.normalized_key) {
                Some(owner) if *owner == candidate.record_id => {}
                Some(_) => {
                    ambiguous.insert(candidate.normalized_key.clone());
                }
                None => {
                    owner_by_key.insert(candidate.normalized_key.clone(), candidate.record_id);
                    unique.push(candidate);
                }
            }
        }

        unique.retain(|candidate| !ambiguous.contains(&candidate.normalized_key));
        unique.sort_by(|a, b| key_len(b).cmp(&key_len(a)));

        let mut ordered = Vec::with_capacity(unique.len());
        for candidate in unique {
            let label = escape_html(candidate.display_title.trim());
            let pattern = match RegexBuilder::new(&title_pattern(&candidate.display_title))
                .case_insensitive(true)
                .build()
            {
                Ok(pattern) => pattern,
                Err(err) => {
                    warn!(
                        "event=xref_index module=linker status=skipped reason=pattern record_id={} error={}",
                        candidate.record_id, err
                    );
                    continue;
                }
            };
            let href = escape_html(&candidate.normalized_key);
            ordered.push(IndexedCandidate {
                candidate,
                label,
                href,
                pattern,
            });
        }

        let mut by_key = HashMap::new();
        let mut by_href = HashMap::new();
        let mut by_id = HashMap::new();
        for (idx, entry) in ordered.iter().enumerate() {
            by_key.insert(entry.candidate.normalized_key.clone(), idx);
            by_href.insert(entry.href.clone(), idx);
            by_id.entry(entry.candidate.record_id).or_insert(idx);
        }

        Self {
            ordered,
            by_key,
            by_href,
            by_id,
            ambiguous,
        }
    }

    /// Number of linkable, unambiguous candidates.
    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// Keys that resolve to more than one record.
    pub fn ambiguous_keys(&self) -> impl Iterator<Item = &str> {
        self.ambiguous.iter().map(String::as_str)
    }

    /// Rewrites one sanitized HTML field.
    pub fn rewrite(&self, html: &str, mode: CrossReferenceMode) -> RewriteReport {
        let started_at = Instant::now();
        let (rewritten, skipped_ambiguous) = match mode {
            CrossReferenceMode::Auto => self.rewrite_auto(html),
            CrossReferenceMode::Manual => self.rewrite_manual(html),
        };
        let linked_record_ids = self.linked_record_ids(&rewritten);

        debug!(
            "event=xref_rewrite module=linker status=ok mode={} candidates={} links={} skipped_ambiguous={} duration_us={}",
            mode,
            self.ordered.len(),
            linked_record_ids.len(),
            skipped_ambiguous.len(),
            started_at.elapsed().as_micros()
        );

        RewriteReport {
            html: rewritten,
            linked_record_ids,
            skipped_ambiguous,
        }
    }

    fn rewrite_auto(&self, html: &str) -> (String, Vec<String>) {
        let slug_text = slugify(&to_plain_text(html));
        let mut current = html.to_string();

        for entry in &self.ordered {
            if !slug_text.contains(entry.candidate.normalized_key.as_str()) {
                continue;
            }
            if let Some(next) = link_occurrences(&current, entry) {
                current = next;
            }
        }

        let skipped = self
            .ambiguous
            .iter()
            .filter(|key| slug_text.contains(key.as_str()))
            .cloned()
            .collect();
        (current, skipped)
    }

    fn rewrite_manual(&self, html: &str) -> (String, Vec<String>) {
        let anchors = anchor_spans(html);
        let tags = tag_spans(html);
        let mut skipped = BTreeSet::new();
        let mut out = String::with_capacity(html.len());
        let mut cursor = 0;

        for caps in MANUAL_REFERENCE_RE.captures_iter(html) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            let open_brace = TextSpan::new(whole.start(), whole.start() + 1);
            let close_brace = TextSpan::new(whole.end() - 1, whole.end());
            if TextSpan::new(whole.start(), whole.end()).overlaps_any(&anchors)
                || open_brace.overlaps_any(&tags)
                || close_brace.overlaps_any(&tags)
            {
                continue;
            }
            let inner = caps.get(1).map_or("", |m| m.as_str());

            out.push_str(&html[cursor..whole.start()]);
            cursor = whole.end();

            match self.resolve_manual(inner, &mut skipped) {
                Some(entry) => out.push_str(&render_anchor(entry)),
                None => {
                    debug!(
                        "event=xref_manual_miss module=linker status=degraded reference_len={}",
                        inner.len()
                    );
                    out.push_str(inner);
                }
            }
        }
        out.push_str(&html[cursor..]);

        (out, skipped.into_iter().collect())
    }

    /// Resolves brace contents by slug first, then by numeric id.
    ///
    /// Formatting tags inside the braces are ignored for resolution.
    fn resolve_manual(
        &self,
        inner: &str,
        skipped: &mut BTreeSet<String>,
    ) -> Option<&IndexedCandidate> {
        let plain = to_plain_text(inner);
        let key = slugify(&plain);
        if key.is_empty() {
            return None;
        }
        if let Some(idx) = self.by_key.get(&key) {
            return self.ordered.get(*idx);
        }
        if self.ambiguous.contains(&key) {
            skipped.insert(key);
            return None;
        }

        let trimmed = plain.trim();
        let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
        let record_id = digits.parse::<RecordId>().ok()?;
        self.by_id
            .get(&record_id)
            .and_then(|idx| self.ordered.get(*idx))
    }

    /// Ids of indexed records that `html`'s anchors point at, first mention first.
    pub fn linked_record_ids(&self, html: &str) -> Vec<RecordId> {
        let mut seen = HashSet::new();
        ANCHOR_HREF_RE
            .captures_iter(html)
            .filter_map(|caps| caps.get(1))
            .filter_map(|href| self.by_href.get(href.as_str()))
            .filter_map(|idx| self.ordered.get(*idx))
            .map(|entry| entry.candidate.record_id)
            .filter(|record_id| seen.insert(*record_id))
            .collect()
    }
}

/// One-shot rewrite of `plain_text` against `candidates`.
pub fn rewrite_cross_references(
    plain_text: &str,
    candidates: &[ReferenceCandidate],
    mode: CrossReferenceMode,
) -> String {
    CrossReferencer::new(candidates.iter().cloned())
        .rewrite(plain_text, mode)
        .html
}

/// Links every eligible occurrence of `entry` left to right.
///
/// Matches are found in the decoded view and spliced back at their source
/// ranges. Returns `None` when nothing was linked.
fn link_occurrences(html: &str, entry: &IndexedCandidate) -> Option<String> {
    let view = DecodedView::new(html);
    let text = view.text();
    let protected = protected_spans(html);
    let mut out = String::with_capacity(html.len() + 32);
    let mut cursor = 0;
    let mut search_from = 0;
    let mut linked = 0usize;

    while let Some(found) = entry.pattern.find_at(text, search_from) {
        if found.start() == found.end() {
            break;
        }
        let source = view.source_span(found.start(), found.end());
        let Some(span) = source.filter(|span| {
            !span.overlaps_any(&protected) && on_word_boundary(text, found.start(), found.end())
        }) else {
            search_from = next_char_start(text, found.start());
            continue;
        };

        out.push_str(&html[cursor..span.start]);
        out.push_str(&render_anchor(entry));
        cursor = span.end;
        search_from = found.end();
        linked += 1;
    }

    if linked == 0 {
        return None;
    }
    out.push_str(&html[cursor..]);
    Some(out)
}

/// Alphanumeric title edges must not touch alphanumeric neighbours.
fn on_word_boundary(text: &str, start: usize, end: usize) -> bool {
    let matched = &text[start..end];
    let starts_alnum = matched.chars().next().is_some_and(char::is_alphanumeric);
    let ends_alnum = matched.chars().next_back().is_some_and(char::is_alphanumeric);
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();

    !(starts_alnum && before.is_some_and(char::is_alphanumeric))
        && !(ends_alnum && after.is_some_and(char::is_alphanumeric))
}

/// Escaped title words joined by any whitespace run.
fn title_pattern(title: &str) -> String {
    title
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+")
}

fn next_char_start(html: &str, idx: usize) -> usize {
    idx + html[idx..].chars().next().map_or(1, char::len_utf8)
}

fn render_anchor(entry: &IndexedCandidate) -> String {
    format!(r#"<a href="{}">{}</a>"#, entry.href, entry.label)
}

fn key_len(candidate: &ReferenceCandidate) -> usize {
    candidate.normalized_key.chars().count()
}

#[cfg(test)]
mod tests {
    use super::{CrossReferenceMode, CrossReferencer};
    use crate::model::reference::ReferenceCandidate;

    #[test]
    fn index_collapses_exact_duplicates_and_flags_collisions() {
        let referencer = CrossReferencer::new(vec![
            ReferenceCandidate::new(1, "Reef Fishing"),
            ReferenceCandidate::new(1, "Reef Fishing"),
            ReferenceCandidate::new(2, "Canoe Race"),
            ReferenceCandidate::new(3, "canoe race!"),
            ReferenceCandidate::new(4, "   "),
        ]);

        assert_eq!(referencer.len(), 1);
        assert_eq!(referencer.ambiguous_keys().collect::<Vec<_>>(), vec!["canoe-race"]);
    }

    #[test]
    fn single_letter_title_does_not_link_inside_words() {
        let referencer = CrossReferencer::new(vec![ReferenceCandidate::new(1, "A")]);
        let report = referencer.rewrite("A canoe and a paddle", CrossReferenceMode::Auto);
        assert_eq!(
            report.html,
            r#"<a href="a">A</a> canoe and <a href="a">A</a> paddle"#
        );
        assert_eq!(report.linked_record_ids, vec![1]);
    }

    #[test]
    fn titles_with_markup_characters_match_decoded_text() {
        let referencer = CrossReferencer::new(vec![ReferenceCandidate::new(5, "Fish & Chips")]);
        let report = referencer.rewrite("We ate fish &amp; chips.", CrossReferenceMode::Auto);
        assert_eq!(
            report.html,
            r#"We ate <a href="fish-chips">Fish &amp; Chips</a>."#
        );
    }

    #[test]
    fn title_words_match_across_entity_spaces() {
        let referencer = CrossReferencer::new(vec![ReferenceCandidate::new(1, "Reef Fishing")]);
        let report = referencer.rewrite("<p>Reef&nbsp;Fishing\ntoday</p>", CrossReferenceMode::Auto);
        assert_eq!(
            report.html,
            "<p><a href=\"reef-fishing\">Reef Fishing</a>\ntoday</p>"
        );
    }

    #[test]
    fn titles_do_not_match_across_tags() {
        let referencer = CrossReferencer::new(vec![ReferenceCandidate::new(1, "Reef Fishing")]);
        let report = referencer.rewrite("Reef <em>Fishing</em>", CrossReferenceMode::Auto);
        assert_eq!(report.html, "Reef <em>Fishing</em>");
        assert!(report.linked_record_ids.is_empty());
    }

    #[test]
    fn braces_inside_anchors_are_left_alone() {
        let referencer = CrossReferencer::new(vec![ReferenceCandidate::new(1, "Reef Fishing")]);
        let html = r#"<a href="x">{Reef Fishing}</a> {Reef <em>Fishing</em>}"#;
        let report = referencer.rewrite(html, CrossReferenceMode::Manual);
        assert_eq!(
            report.html,
            r#"<a href="x">{Reef Fishing}</a> <a href="reef-fishing">Reef Fishing</a>"#
        );
    }

    #[test]
    fn manual_mode_resolves_numeric_ids() {
        let referencer = CrossReferencer::new(vec![ReferenceCandidate::new(42, "Harvest Feast")]);
        let report = referencer.rewrite("See {#42} and {42}.", CrossReferenceMode::Manual);
        assert_eq!(
            report.html,
            r#"See <a href="harvest-feast">Harvest Feast</a> and <a href="harvest-feast">Harvest Feast</a>."#
        );
        assert_eq!(report.linked_record_ids, vec![42]);
    }

    #[test]
    fn ambiguous_mentions_are_reported_not_linked() {
        let referencer = CrossReferencer::new(vec![
            ReferenceCandidate::new(2, "Canoe Race"),
            ReferenceCandidate::new(3, "Canoe race"),
        ]);
        let report = referencer.rewrite("The canoe race began.", CrossReferenceMode::Auto);
        assert_eq!(report.html, "The canoe race began.");
        assert!(report.linked_record_ids.is_empty());
        assert_eq!(report.skipped_ambiguous, vec!["canoe-race".to_string()]);
    }
}
