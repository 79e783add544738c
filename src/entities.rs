use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::text_util::{split_sentences, strip_trailing_dot, word_tokens};

/// Lowercase words allowed inside a multi-word name ("Maria da Silva",
/// "Confederação Brasileira de Ginástica").
const CONNECTORS: &[&str] = &["da", "de", "do", "das", "dos", "e"];

/// A proper-name mention found in a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedEntity {
    pub entity: String,
    /// Zero-based index of the sentence the mention occurs in.
    pub sentence: usize,
}

fn is_capitalized(token: &str) -> bool {
    token.chars().next().is_some_and(char::is_uppercase)
}

/// Find runs of capitalized words in `text`.
///
/// A run may contain connectors but never starts or ends on one. A
/// single capitalized word at the start of a sentence only counts when
/// the same word also shows up capitalized mid-sentence somewhere in the
/// text, which separates names from ordinary sentence openings.
pub fn extract(text: &str) -> Vec<NamedEntity> {
    let sentences: Vec<Vec<&str>> = split_sentences(text)
        .into_iter()
        .map(|s| word_tokens(s).into_iter().map(strip_trailing_dot).collect())
        .collect();

    let mid_sentence_caps: HashSet<&str> = sentences
        .iter()
        .flat_map(|tokens| tokens.iter().skip(1))
        .copied()
        .filter(|t| is_capitalized(t))
        .collect();

    let mut found = Vec::new();
    for (sentence_idx, tokens) in sentences.iter().enumerate() {
        let mut i = 0;
        while i < tokens.len() {
            if !is_capitalized(tokens[i]) {
                i += 1;
                continue;
            }

            let start = i;
            let mut end = i + 1;
            while end < tokens.len() {
                if is_capitalized(tokens[end]) {
                    end += 1;
                } else if CONNECTORS.contains(&tokens[end])
                    && tokens.get(end + 1).is_some_and(|t| is_capitalized(t))
                {
                    end += 2;
                } else {
                    break;
                }
            }

            let single_opening = start == 0 && end == 1;
            if !single_opening || mid_sentence_caps.contains(tokens[0]) {
                found.push(NamedEntity {
                    entity: tokens[start..end].join(" "),
                    sentence: sentence_idx,
                });
            }
            i = end;
        }
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(text: &str) -> Vec<String> {
        extract(text).into_iter().map(|e| e.entity).collect()
    }

    #[test]
    fn finds_multi_word_names_with_connectors() {
        assert_eq!(
            names("Eu treinei com Maria da Silva no clube."),
            vec!["Maria da Silva"]
        );
    }

    #[test]
    fn connector_at_the_end_is_not_included() {
        assert_eq!(names("Fui para São Paulo de ônibus."), vec!["São Paulo"]);
    }

    #[test]
    fn ordinary_sentence_openings_are_ignored() {
        assert!(names("Comecei cedo. Treinava todo dia.").is_empty());
    }

    #[test]
    fn opening_word_counts_when_seen_mid_sentence() {
        let found = extract("Curitiba foi incrível. Voltei para Curitiba.");
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].entity, "Curitiba");
        assert_eq!(found[0].sentence, 0);
        assert_eq!(found[1].sentence, 1);
    }

    #[test]
    fn opening_run_of_several_words_counts() {
        assert_eq!(
            names("Daiane dos Santos competiu."),
            vec!["Daiane dos Santos"]
        );
    }

    #[test]
    fn empty_text_has_no_entities() {
        assert!(extract("").is_empty());
    }
}
