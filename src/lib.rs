//! icgeo - a store of athlete interview transcripts with a REST API.
//!
//! Transcripts arrive as the JSON output of a docx-to-JSON converter. They
//! are normalized into running text, questions and answers, annotated with
//! word statistics and named entities, and stored in PostgreSQL, which
//! handles full-text search over them.
//!
//! # Quick start
//!
//! ```no_run
//! use icgeo::{meta, normalizer, source_doc::SourceDocument};
//!
//! let doc = SourceDocument::load("07 - Ana.json".as_ref()).unwrap();
//! let interview = normalizer::normalize(doc).unwrap();
//! let meta = meta::generate(&interview);
//!
//! println!("{} layout, {} questions", interview.dialect, interview.questions.len());
//! for (stem, count) in &meta.answers.bow_stemmed {
//!     println!("{stem}: {count}");
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod ingestion;
pub mod meta;
pub mod normalizer;
pub mod password;
pub mod source_doc;
pub mod stopwords;
pub mod text_util;
pub mod walker;

pub use config::Settings;
pub use error::{Error, Result};
pub use meta::InterviewMeta;
pub use normalizer::{Dialect, NormalizedInterview};
pub use source_doc::SourceDocument;
