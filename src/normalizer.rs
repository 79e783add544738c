//! Rule-based normalization of interview transcripts.
//!
//! The transcripts were typed by different people over several years and
//! follow one of a handful of layouts. Each layout is recognised from fixed
//! markers in its first paragraphs and rewritten into the same canonical
//! shape: the running text plus the question and answer paragraphs.

use std::fmt;

use serde::Serialize;

use crate::{
    error::{Error, Result},
    source_doc::SourceDocument,
};

const TRANSCRIPT_START: &str = "Início da transcrição";
const ATHLETE_HEADER: &str = "Atleta: ";
const USP_SPEAKER: &str = "USP – ";
const BORN_FEMALE: &str = " nascida em ";
const BORN_MALE: &str = " nascido em ";
const INTERVIEW_DATE: &str = "Entrevista realizada em ";
const TRANSCRIPT_TITLE: &str = "Transcrição";

/// Speaker labels that mark a paragraph as a question.
const ATHLETE_NAME_ASKERS: &[&str] = &["Kátia", "Entrevistador"];
const ONE_ONE_ABBR_ASKERS: &[&str] = &["USP"];
const ALL_NONBOLD_ASKERS: &[&str] =
    &["Kátia", "Entrevistador", "ENTREVISTADORA"];

/// The known transcript layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Dialect {
    /// Questions in bold, answers in regular weight, opened by a
    /// "Início da transcrição" line.
    BoldNonbold,
    /// "Atleta: …" header, every paragraph prefixed by `Speaker: `.
    AthleteName,
    /// Speakers abbreviated, `USP – ` for the interviewer.
    OneOneAbbr,
    /// Biographical preamble, then strictly alternating question/answer.
    BlackColored,
    /// "Transcrição …" header, `Speaker: ` prefixes, nothing in bold.
    AllNonboldNames,
}

impl Dialect {
    /// Recognise the layout of `doc`. Rules are tried in declaration order
    /// and the first match wins.
    pub fn detect(doc: &SourceDocument) -> Option<Self> {
        let first = doc.paragraph(0);
        if first == TRANSCRIPT_START {
            Some(Self::BoldNonbold)
        } else if first.contains(ATHLETE_HEADER) {
            Some(Self::AthleteName)
        } else if doc.paragraph(1).contains(USP_SPEAKER)
            || doc.paragraph(2).contains(USP_SPEAKER)
        {
            Some(Self::OneOneAbbr)
        } else if first.contains(BORN_FEMALE) || first.contains(BORN_MALE) {
            Some(Self::BlackColored)
        } else if first.contains(TRANSCRIPT_TITLE) {
            Some(Self::AllNonboldNames)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BoldNonbold => "bold-nonbold",
            Self::AthleteName => "athlete-name",
            Self::OneOneAbbr => "one-one-abbr",
            Self::BlackColored => "black-colored",
            Self::AllNonboldNames => "all-nonbold-names",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transcript in canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedInterview {
    pub dialect: Dialect,
    pub text: Vec<String>,
    pub questions: Vec<String>,
    pub answers: Vec<String>,
}

impl NormalizedInterview {
    pub fn joined_text(&self) -> String {
        self.text.join("\n")
    }

    pub fn joined_questions(&self) -> String {
        self.questions.join("\n")
    }

    pub fn joined_answers(&self) -> String {
        self.answers.join("\n")
    }
}

/// Rewrite `doc` into canonical form.
///
/// Fails with [`Error::UnknownDialect`] when no layout rule matches.
pub fn normalize(doc: SourceDocument) -> Result<NormalizedInterview> {
    let dialect = Dialect::detect(&doc).ok_or_else(|| {
        Error::UnknownDialect(describe_opening(doc.paragraph(0)))
    })?;
    tracing::debug!(%dialect, paragraphs = doc.text.len(), "normalizing");

    let SourceDocument {
        mut text,
        mut bold,
        nonbold,
    } = doc;

    let normalized = match dialect {
        Dialect::BoldNonbold => {
            text.remove(0);
            if bold.first().is_some_and(|b| b == TRANSCRIPT_START) {
                bold.remove(0);
            }
            if let Some(first) = bold.first_mut() {
                let prefix = format!("{TRANSCRIPT_START} ");
                if first.contains(&prefix) {
                    *first = first.replace(&prefix, "");
                }
            }
            NormalizedInterview {
                dialect,
                text,
                questions: bold,
                answers: nonbold,
            }
        }
        Dialect::AthleteName => {
            drain_front(&mut text, 2);
            split_speakers(dialect, text, bold, ": ", ATHLETE_NAME_ASKERS)
        }
        Dialect::OneOneAbbr => {
            drain_front(&mut text, 1);
            split_speakers(dialect, text, bold, " – ", ONE_ONE_ABBR_ASKERS)
        }
        Dialect::BlackColored => {
            if let Some(pos) =
                text.iter().position(|p| p.contains(INTERVIEW_DATE))
            {
                drain_front(&mut text, pos + 1);
            }
            let mut questions = Vec::new();
            let mut answers = Vec::new();
            for (idx, paragraph) in text.iter().enumerate() {
                if idx % 2 == 0 {
                    questions.push(paragraph.clone());
                } else {
                    answers.push(paragraph.clone());
                }
            }
            NormalizedInterview {
                dialect,
                text,
                questions,
                answers,
            }
        }
        Dialect::AllNonboldNames => {
            let title = format!("{TRANSCRIPT_TITLE} ");
            if text.first().is_some_and(|p| p.contains(&title)) {
                drain_front(&mut text, 1);
                split_speakers(dialect, text, bold, ": ", ALL_NONBOLD_ASKERS)
            } else {
                NormalizedInterview {
                    dialect,
                    text,
                    questions: bold,
                    answers: nonbold,
                }
            }
        }
    };

    Ok(trim_all(normalized))
}

fn drain_front(paragraphs: &mut Vec<String>, count: usize) {
    let count = count.min(paragraphs.len());
    paragraphs.drain(..count);
}

/// Attribute each paragraph to the interviewer or the interviewee by its
/// speaker prefix, removing the prefix from the running text.
///
/// Paragraphs without a prefix continue the interviewee's answer.
fn split_speakers(
    dialect: Dialect,
    paragraphs: Vec<String>,
    mut questions: Vec<String>,
    separator: &str,
    askers: &[&str],
) -> NormalizedInterview {
    let mut text = Vec::with_capacity(paragraphs.len());
    let mut answers = Vec::new();

    for paragraph in paragraphs {
        match paragraph.split_once(separator) {
            Some((speaker, said)) => {
                let said = trim_spaces(said);
                if askers.contains(&trim_spaces(speaker)) {
                    questions.push(said.to_string());
                } else {
                    answers.push(said.to_string());
                }
                text.push(said.to_string());
            }
            None => {
                let paragraph = trim_spaces(&paragraph);
                answers.push(paragraph.to_string());
                text.push(paragraph.to_string());
            }
        }
    }

    NormalizedInterview {
        dialect,
        text,
        questions,
        answers,
    }
}

fn trim_spaces(s: &str) -> &str {
    s.trim_matches(' ')
}

fn trim_all(mut interview: NormalizedInterview) -> NormalizedInterview {
    for list in [
        &mut interview.text,
        &mut interview.questions,
        &mut interview.answers,
    ] {
        for paragraph in list.iter_mut() {
            let trimmed = trim_spaces(paragraph);
            if trimmed.len() != paragraph.len() {
                *paragraph = trimmed.to_string();
            }
        }
    }
    interview
}

fn describe_opening(first: &str) -> String {
    let opening: String = first.chars().take(60).collect();
    format!("document opening with {opening:?}")
}
