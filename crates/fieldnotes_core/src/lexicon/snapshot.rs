//! Immutable lexicon index.
//!
//! # Invariants
//! - Every indexed form is trimmed and lowercased.
//! - Within one entry class the first registered entry owns a form.
//! - Lookup walks classes in `EntryClass` order and asks the owning entry to
//!   confirm the match, so the index never disagrees with `matches`.

use crate::model::lexicon::{EntryClass, LexiconEntry, LexiconMatch};
use std::collections::HashMap;

/// Read-only dictionary snapshot for one highlighting call.
#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    entries: Vec<LexiconEntry>,
    words: HashMap<String, usize>,
    phrases: HashMap<String, usize>,
    verbs: HashMap<String, usize>,
}

impl Lexicon {
    pub fn new(entries: Vec<LexiconEntry>) -> Self {
        let mut lexicon = Self {
            entries: Vec::with_capacity(entries.len()),
            ..Self::default()
        };
        for entry in entries {
            lexicon.insert(entry);
        }
        lexicon
    }

    fn insert(&mut self, entry: LexiconEntry) {
        let idx = self.entries.len();
        let index = match entry.class() {
            EntryClass::Word => &mut self.words,
            EntryClass::Phrase => &mut self.phrases,
            EntryClass::Verb => &mut self.verbs,
        };
        for form in entry.surface_forms() {
            index.entry(form).or_insert(idx);
        }
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[LexiconEntry] {
        &self.entries
    }

    /// Looks up one token; the token is lowercased here.
    pub fn lookup(&self, token: &str) -> Option<LexiconMatch> {
        let token = token.to_lowercase();
        [&self.words, &self.phrases, &self.verbs]
            .into_iter()
            .filter_map(|index| index.get(&token))
            .filter_map(|idx| self.entries.get(*idx))
            .find_map(|entry| entry.matches(&token))
    }
}

impl FromIterator<LexiconEntry> for Lexicon {
    fn from_iter<T: IntoIterator<Item = LexiconEntry>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::Lexicon;
    use crate::model::lexicon::{
        Conjugation, LexiconEntry, MatchSource, PhraseEntry, VerbEntry, WordEntry,
    };

    fn word(form: &str, checked: bool) -> LexiconEntry {
        LexiconEntry::Word(WordEntry {
            canonical_form: form.to_string(),
            spelling_variations: Vec::new(),
            checked,
            detail_url: format!("/lexicon/words/{form}"),
            gloss: String::new(),
        })
    }

    #[test]
    fn words_take_precedence_over_verbs() {
        let lexicon: Lexicon = vec![
            LexiconEntry::Verb(VerbEntry {
                infinitive: "sala".to_string(),
                conjugations: vec![Conjugation {
                    slot: "imperative".to_string(),
                    form: "sala".to_string(),
                    checked: true,
                }],
                spelling_variations: Vec::new(),
                detail_url: "/lexicon/verbs/sala".to_string(),
                gloss: String::new(),
            }),
            word("sala", false),
        ]
        .into_iter()
        .collect();

        let found = lexicon.lookup("Sala").expect("sala should match");
        assert_eq!(found.source, MatchSource::CanonicalForm);
        assert_eq!(found.link, "/lexicon/words/sala");
        assert!(!found.checked);
    }

    #[test]
    fn first_registered_word_owns_a_form() {
        let lexicon = Lexicon::new(vec![word("tama", true), word("tama", false)]);
        assert!(lexicon.lookup("tama").expect("tama should match").checked);
        assert_eq!(lexicon.len(), 2);
    }

    #[test]
    fn single_word_phrase_matches_before_verbs() {
        let lexicon = Lexicon::new(vec![LexiconEntry::Phrase(PhraseEntry {
            text: "Ulo".to_string(),
            checked: true,
            detail_url: "/lexicon/phrases/ulo".to_string(),
            gloss: String::new(),
        })]);
        assert_eq!(
            lexicon.lookup("ulo").map(|found| found.source),
            Some(MatchSource::Phrase)
        );
        assert!(lexicon.lookup("missing").is_none());
    }
}
