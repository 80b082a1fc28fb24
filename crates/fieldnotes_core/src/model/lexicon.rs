//! Lexicon entry read model.
//!
//! # Responsibility
//! - Represent dictionary entries as one tagged union over words, verbs and
//!   phrases.
//! - Answer `matches(token)` uniformly so the highlighter never inspects
//!   variant-specific fields.
//!
//! # Invariants
//! - Matching is case-insensitive; callers pass lowercase tokens.
//! - A verb spelling variation never resolves to a conjugation slot; it is
//!   reported as checked with a slot-less link.

use log::debug;
use serde::{Deserialize, Serialize};

/// Dictionary entry as stored by the lexicon collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LexiconEntry {
    Word(WordEntry),
    Verb(VerbEntry),
    Phrase(PhraseEntry),
}

/// Plain word with optional alternative spellings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordEntry {
    pub canonical_form: String,
    #[serde(default)]
    pub spelling_variations: Vec<String>,
    /// Whether a reviewer confirmed this spelling.
    #[serde(default)]
    pub checked: bool,
    pub detail_url: String,
    /// Free-text definition; may mention culture events by title.
    #[serde(default)]
    pub gloss: String,
}

/// One cell of a verb paradigm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conjugation {
    /// Paradigm slot id, e.g. `1sg_present`. Used as the link fragment.
    pub slot: String,
    pub form: String,
    #[serde(default)]
    pub checked: bool,
}

/// Verb with its conjugation paradigm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerbEntry {
    pub infinitive: String,
    #[serde(default)]
    pub conjugations: Vec<Conjugation>,
    #[serde(default)]
    pub spelling_variations: Vec<String>,
    pub detail_url: String,
    /// Free-text definition; may mention culture events by title.
    #[serde(default)]
    pub gloss: String,
}

/// Fixed expression. Only single-word phrases can match a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhraseEntry {
    pub text: String,
    #[serde(default)]
    pub checked: bool,
    pub detail_url: String,
    /// Free-text definition; may mention culture events by title.
    #[serde(default)]
    pub gloss: String,
}

/// Where inside an entry a token matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchSource {
    CanonicalForm,
    WordVariation,
    Phrase,
    Conjugation { slot: String },
    VerbVariation,
}

/// Successful lookup result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexiconMatch {
    pub checked: bool,
    /// Dictionary page for the entry, with a `#slot` fragment for conjugations.
    pub link: String,
    pub source: MatchSource,
}

/// Lookup precedence group. Lower groups win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntryClass {
    Word,
    Phrase,
    Verb,
}

impl LexiconEntry {
    pub fn class(&self) -> EntryClass {
        match self {
            Self::Word(_) => EntryClass::Word,
            Self::Phrase(_) => EntryClass::Phrase,
            Self::Verb(_) => EntryClass::Verb,
        }
    }

    /// Human-readable head of the entry.
    pub fn headword(&self) -> &str {
        match self {
            Self::Word(word) => &word.canonical_form,
            Self::Verb(verb) => &verb.infinitive,
            Self::Phrase(phrase) => &phrase.text,
        }
    }

    pub fn detail_url(&self) -> &str {
        match self {
            Self::Word(word) => &word.detail_url,
            Self::Verb(verb) => &verb.detail_url,
            Self::Phrase(phrase) => &phrase.detail_url,
        }
    }

    pub fn gloss(&self) -> &str {
        match self {
            Self::Word(word) => &word.gloss,
            Self::Verb(verb) => &verb.gloss,
            Self::Phrase(phrase) => &phrase.gloss,
        }
    }

    pub fn set_gloss(&mut self, gloss: String) {
        match self {
            Self::Word(word) => word.gloss = gloss,
            Self::Verb(verb) => verb.gloss = gloss,
            Self::Phrase(phrase) => phrase.gloss = gloss,
        }
    }

    /// Lowercased surface forms this entry can match, in preference order.
    pub fn surface_forms(&self) -> Vec<String> {
        let raw: Vec<&str> = match self {
            Self::Word(word) => std::iter::once(word.canonical_form.as_str())
                .chain(word.spelling_variations.iter().map(String::as_str))
                .collect(),
            Self::Verb(verb) => verb
                .conjugations
                .iter()
                .map(|conjugation| conjugation.form.as_str())
                .chain(verb.spelling_variations.iter().map(String::as_str))
                .collect(),
            Self::Phrase(phrase) => vec![phrase.text.as_str()],
        };

        raw.into_iter()
            .map(|form| form.trim().to_lowercase())
            .filter(|form| !form.is_empty())
            .collect()
    }

    /// Matches one lowercase token against this entry.
    pub fn matches(&self, token: &str) -> Option<LexiconMatch> {
        match self {
            Self::Word(word) => {
                if same_form(&word.canonical_form, token) {
                    Some(LexiconMatch {
                        checked: word.checked,
                        link: word.detail_url.clone(),
                        source: MatchSource::CanonicalForm,
                    })
                } else if word
                    .spelling_variations
                    .iter()
                    .any(|variation| same_form(variation, token))
                {
                    Some(LexiconMatch {
                        checked: word.checked,
                        link: word.detail_url.clone(),
                        source: MatchSource::WordVariation,
                    })
                } else {
                    None
                }
            }
            Self::Phrase(phrase) => {
                same_form(&phrase.text, token).then(|| LexiconMatch {
                    checked: phrase.checked,
                    link: phrase.detail_url.clone(),
                    source: MatchSource::Phrase,
                })
            }
            Self::Verb(verb) => verb.match_conjugation(token),
        }
    }
}

impl VerbEntry {
    fn match_conjugation(&self, token: &str) -> Option<LexiconMatch> {
        if let Some(conjugation) = self
            .conjugations
            .iter()
            .find(|conjugation| same_form(&conjugation.form, token))
        {
            return Some(LexiconMatch {
                checked: conjugation.checked,
                link: slot_link(&self.detail_url, &conjugation.slot),
                source: MatchSource::Conjugation {
                    slot: conjugation.slot.clone(),
                },
            });
        }

        if self
            .spelling_variations
            .iter()
            .any(|variation| same_form(variation, token))
        {
            debug!(
                "event=conjugation_slot_unresolved module=lexicon status=fallback infinitive={}",
                self.infinitive
            );
            return Some(LexiconMatch {
                checked: true,
                link: self.detail_url.clone(),
                source: MatchSource::VerbVariation,
            });
        }

        None
    }
}

fn same_form(form: &str, token: &str) -> bool {
    form.trim().to_lowercase() == token
}

fn slot_link(detail_url: &str, slot: &str) -> String {
    let slot = slot.trim();
    if slot.is_empty() {
        detail_url.to_string()
    } else {
        format!("{detail_url}#{slot}")
    }
}
