use std::sync::LazyLock;

use regex::Regex;

/// Words (with inner hyphens, apostrophes and dots, e.g. `pan-americano`,
/// `d'água`, `1.500`) optionally followed by one dot, or a single
/// punctuation character.
static WORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\w+(?:[-'’.]\w+)*\.?|[^\w\s]").expect("word pattern")
});

static TRAILING_DOT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^.]+\.$").expect("trailing dot pattern"));

/// Split text into sentences.
///
/// A sentence ends at a newline, or at `.`, `!`, `?` or `…` followed by
/// whitespace or the end of input. Empty sentences are dropped.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        let end = match c {
            '\n' => Some((idx, idx + 1)),
            '.' | '!' | '?' | '…' => match chars.peek() {
                None => Some((idx + c.len_utf8(), idx + c.len_utf8())),
                Some((_, next)) if next.is_whitespace() => {
                    Some((idx + c.len_utf8(), idx + c.len_utf8()))
                }
                _ => None,
            },
            _ => None,
        };

        if let Some((sentence_end, next_start)) = end {
            push_trimmed(&mut sentences, &text[start..sentence_end]);
            start = next_start;
        }
    }
    push_trimmed(&mut sentences, &text[start..]);

    sentences
}

fn push_trimmed<'a>(out: &mut Vec<&'a str>, s: &'a str) {
    let s = s.trim();
    if !s.is_empty() {
        out.push(s);
    }
}

/// Split one sentence into word and punctuation tokens.
pub fn word_tokens(sentence: &str) -> Vec<&str> {
    WORD_RE.find_iter(sentence).map(|m| m.as_str()).collect()
}

/// Drop the final dot of a token that has exactly one dot, at the end.
///
/// `"fim."` becomes `"fim"`, while abbreviations such as `"a.c."` and lone
/// `"."` punctuation are left alone.
pub fn strip_trailing_dot(token: &str) -> &str {
    if TRAILING_DOT_RE.is_match(token) {
        &token[..token.len() - 1]
    } else {
        token
    }
}

/// Lowercase, split into sentences and words, and strip trailing dots.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    split_sentences(&lowered)
        .into_iter()
        .flat_map(word_tokens)
        .map(|tok| strip_trailing_dot(tok).to_string())
        .collect()
}

/// Whether a token contains at least one letter or digit.
pub fn is_word(token: &str) -> bool {
    token.chars().any(char::is_alphanumeric)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentences_split_on_terminal_punctuation() {
        let s = split_sentences("Comecei cedo. Treinava muito! E você?");
        assert_eq!(s, vec!["Comecei cedo.", "Treinava muito!", "E você?"]);
    }

    #[test]
    fn sentences_split_on_newlines() {
        let s = split_sentences("primeira linha\nsegunda linha\n\n");
        assert_eq!(s, vec!["primeira linha", "segunda linha"]);
    }

    #[test]
    fn numbers_do_not_end_sentences() {
        let s = split_sentences("Foram 1.500 pessoas.");
        assert_eq!(s, vec!["Foram 1.500 pessoas."]);
    }

    #[test]
    fn empty_text_has_no_sentences() {
        assert!(split_sentences("").is_empty());
        assert!(split_sentences("  \n ").is_empty());
    }

    #[test]
    fn word_tokens_keep_hyphenated_words() {
        let t = word_tokens("desse pan-americano, de 91");
        assert_eq!(t, vec!["desse", "pan-americano", ",", "de", "91"]);
    }

    #[test]
    fn word_tokens_attach_final_dot() {
        assert_eq!(word_tokens("acabou."), vec!["acabou."]);
    }

    #[test]
    fn strip_trailing_dot_rules() {
        assert_eq!(strip_trailing_dot("fim."), "fim");
        assert_eq!(strip_trailing_dot("a.c."), "a.c.");
        assert_eq!(strip_trailing_dot("."), ".");
        assert_eq!(strip_trailing_dot("fim"), "fim");
    }

    #[test]
    fn tokenize_lowercases_and_strips() {
        let t = tokenize("Ginástica é vida. Ginástica!");
        assert_eq!(t, vec!["ginástica", "é", "vida", "ginástica", "!"]);
    }

    #[test]
    fn is_word_filters_punctuation() {
        assert!(is_word("treino"));
        assert!(is_word("91"));
        assert!(!is_word(","));
        assert!(!is_word("—"));
    }
}
