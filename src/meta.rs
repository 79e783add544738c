//! Text statistics stored alongside each interview.
//!
//! The meta document is derived data: it is recomputed from the
//! normalized paragraphs whenever an interview is (re)inserted and is
//! never edited on its own.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tantivy::tokenizer::{
    Language,
    RawTokenizer,
    Stemmer,
    TextAnalyzer,
    TokenStream,
};

use crate::{
    entities::{self, NamedEntity},
    normalizer::NormalizedInterview,
    stopwords,
    text_util,
};

/// Name reported to API clients next to the stemmed counts.
pub const STEMMER_NAME: &str = "Snowball Portuguese Stemmer";

/// Statistics for one field (text, questions or answers).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldMeta {
    /// Token → occurrence count, stopwords and punctuation excluded.
    pub bow: BTreeMap<String, u64>,
    /// Stem → summed count of every `bow` token sharing that stem.
    pub bow_stemmed: BTreeMap<String, u64>,
    pub ne: Vec<NamedEntity>,
}

/// Rows written before meta existed hold `{}`, which reads as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterviewMeta {
    pub text: FieldMeta,
    pub questions: FieldMeta,
    pub answers: FieldMeta,
}

/// Snowball stemmer for single, already lowercased words.
pub struct PortugueseStemmer {
    analyzer: TextAnalyzer,
}

impl Default for PortugueseStemmer {
    fn default() -> Self {
        Self::new()
    }
}

impl PortugueseStemmer {
    pub fn new() -> Self {
        let analyzer = TextAnalyzer::builder(RawTokenizer::default())
            .filter(Stemmer::new(Language::Portuguese))
            .build();
        Self { analyzer }
    }

    pub fn stem(&mut self, word: &str) -> String {
        let mut stream = self.analyzer.token_stream(word);
        let mut stemmed = None;
        while stream.advance() {
            stemmed = Some(stream.token().text.clone());
        }
        match stemmed {
            Some(s) if !s.is_empty() => s,
            _ => word.to_string(),
        }
    }
}

/// Count word tokens of `text`, leaving out stopwords and punctuation.
pub fn bag_of_words(text: &str) -> BTreeMap<String, u64> {
    let mut bow = BTreeMap::new();
    for token in text_util::tokenize(text) {
        if text_util::is_word(&token) && !stopwords::is_stopword(&token) {
            *bow.entry(token).or_insert(0) += 1;
        }
    }
    bow
}

/// Fold a bag-of-words onto word stems.
pub fn stem_bag(
    bow: &BTreeMap<String, u64>,
    stemmer: &mut PortugueseStemmer,
) -> BTreeMap<String, u64> {
    let mut stemmed = BTreeMap::new();
    for (token, count) in bow {
        *stemmed.entry(stemmer.stem(token)).or_insert(0) += count;
    }
    stemmed
}

pub fn field_meta(text: &str, stemmer: &mut PortugueseStemmer) -> FieldMeta {
    let bow = bag_of_words(text);
    let bow_stemmed = stem_bag(&bow, stemmer);
    FieldMeta {
        bow,
        bow_stemmed,
        ne: entities::extract(text),
    }
}

/// Build the meta document for a normalized interview.
pub fn generate(interview: &NormalizedInterview) -> InterviewMeta {
    let mut stemmer = PortugueseStemmer::new();
    InterviewMeta {
        text: field_meta(&interview.joined_text(), &mut stemmer),
        questions: field_meta(&interview.joined_questions(), &mut stemmer),
        answers: field_meta(&interview.joined_answers(), &mut stemmer),
    }
}

/// Stems found by only one of two derivations of the same text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StemDifference {
    pub only_in_database: Vec<String>,
    pub only_in_meta: Vec<String>,
}

/// Compare `field.bow_stemmed` with the lexemes PostgreSQL extracted.
pub fn compare_stems(
    field: &FieldMeta,
    lexemes: &[String],
) -> StemDifference {
    let lexeme_set: BTreeSet<&str> =
        lexemes.iter().map(String::as_str).collect();
    StemDifference {
        only_in_database: lexeme_set
            .iter()
            .filter(|l| !field.bow_stemmed.contains_key(**l))
            .map(|l| l.to_string())
            .collect(),
        only_in_meta: field
            .bow_stemmed
            .keys()
            .filter(|k| !lexeme_set.contains(k.as_str()))
            .cloned()
            .collect(),
    }
}
