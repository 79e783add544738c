use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use rayon::prelude::*;
use sqlx::PgPool;

use crate::{
    db::{self, InterviewRecord},
    error::Result,
    meta,
    normalizer::{self, Dialect},
    source_doc::SourceDocument,
    walker::SourceFile,
};

/// A source file turned into a ready-to-insert row.
#[derive(Debug, Clone)]
pub struct PreparedInterview {
    pub dialect: Dialect,
    pub record: InterviewRecord,
}

/// Load, normalize and derive meta for one converter output file.
pub fn prepare(id: i32, path: &Path) -> Result<PreparedInterview> {
    let doc = SourceDocument::load(path)?;
    let interview = normalizer::normalize(doc)?;
    let meta = serde_json::to_value(meta::generate(&interview))?;
    Ok(PreparedInterview {
        dialect: interview.dialect,
        record: InterviewRecord {
            id,
            text: interview.joined_text(),
            questions: interview.joined_questions(),
            answers: interview.joined_answers(),
            meta,
        },
    })
}

/// A file that could not be loaded, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct LoadReport {
    pub inserted: usize,
    /// Ids that already existed and were left alone.
    pub unchanged: usize,
    pub failed: Vec<LoadFailure>,
}

/// Prepare every file in parallel.
///
/// Files that fail to parse or match no layout become failures. When two
/// files share an id only the first (in input order) is kept.
pub fn prepare_files(
    files: &[SourceFile],
) -> (Vec<(SourceFile, PreparedInterview)>, Vec<LoadFailure>) {
    let results: Vec<_> = files
        .par_iter()
        .map(|file| (file, prepare(file.id, &file.absolute_path)))
        .collect();

    let mut prepared = Vec::with_capacity(results.len());
    let mut failed = Vec::new();
    let mut seen: HashMap<i32, &Path> = HashMap::new();

    for (file, result) in results {
        if let Some(first) = seen.get(&file.id) {
            failed.push(LoadFailure {
                path: file.relative_path.clone(),
                reason: format!(
                    "duplicate id {} (already taken by {})",
                    file.id,
                    first.display()
                ),
            });
            continue;
        }
        seen.insert(file.id, &file.relative_path);

        match result {
            Ok(p) => prepared.push((file.clone(), p)),
            Err(e) => failed.push(LoadFailure {
                path: file.relative_path.clone(),
                reason: e.to_string(),
            }),
        }
    }

    (prepared, failed)
}

/// Prepare `files` and insert them one by one.
///
/// A failing file is reported and the rest still load.
pub async fn load(
    pool: &PgPool,
    files: &[SourceFile],
    replace: bool,
) -> LoadReport {
    let (prepared, failed) = prepare_files(files);
    let mut report = LoadReport {
        failed,
        ..Default::default()
    };

    for (file, p) in &prepared {
        match db::insert_interview(pool, &p.record, replace).await {
            Ok(true) => {
                tracing::info!(
                    id = p.record.id,
                    dialect = %p.dialect,
                    file = %file.relative_path.display(),
                    "interview inserted"
                );
                report.inserted += 1;
            }
            Ok(false) => {
                tracing::info!(id = p.record.id, "interview already present");
                report.unchanged += 1;
            }
            Err(e) => {
                tracing::error!(id = p.record.id, error = %e, "insert failed");
                report.failed.push(LoadFailure {
                    path: file.relative_path.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    const ATHLETE_DOC: &str = r#"{
        "text": [
            "Atleta: Ana Souza",
            "Data: 2010",
            "Kátia: Quando você começou?",
            "Ana: Comecei em Curitiba aos sete anos."
        ],
        "bold": [],
        "nonbold": []
    }"#;

    fn write(dir: &Path, name: &str, content: &str) -> SourceFile {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        SourceFile {
            id: crate::walker::id_from_file_name(name).unwrap(),
            relative_path: PathBuf::from(name),
            absolute_path: path,
        }
    }

    #[test]
    fn prepare_builds_a_full_record() {
        let tmp = tempfile::tempdir().unwrap();
        let file = write(tmp.path(), "04.json", ATHLETE_DOC);

        let p = prepare(file.id, &file.absolute_path).unwrap();
        assert_eq!(p.dialect, Dialect::AthleteName);
        assert_eq!(p.record.id, 4);
        assert_eq!(p.record.questions, "Quando você começou?");
        assert_eq!(p.record.answers, "Comecei em Curitiba aos sete anos.");
        assert!(p.record.meta["answers"]["bow"]["comecei"].is_number());
    }

    #[test]
    fn prepare_reports_bad_json() {
        let tmp = tempfile::tempdir().unwrap();
        let file = write(tmp.path(), "05.json", "{not json");
        assert!(matches!(
            prepare(file.id, &file.absolute_path),
            Err(crate::Error::InvalidSource { .. })
        ));
    }

    #[test]
    fn prepare_files_separates_failures() {
        let tmp = tempfile::tempdir().unwrap();
        let files = vec![
            write(tmp.path(), "01.json", ATHLETE_DOC),
            write(tmp.path(), "02.json", r#"{"text": ["Sem cabeçalho"]}"#),
            write(tmp.path(), "03.json", ATHLETE_DOC),
        ];

        let (prepared, failed) = prepare_files(&files);
        let ids: Vec<_> = prepared.iter().map(|(_, p)| p.record.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].path, PathBuf::from("02.json"));
    }

    #[test]
    fn duplicate_ids_keep_the_first_file() {
        let tmp = tempfile::tempdir().unwrap();
        let files = vec![
            write(tmp.path(), "07 - a.json", ATHLETE_DOC),
            write(tmp.path(), "07 - b.json", ATHLETE_DOC),
        ];

        let (prepared, failed) = prepare_files(&files);
        assert_eq!(prepared.len(), 1);
        assert_eq!(prepared[0].0.relative_path, PathBuf::from("07 - a.json"));
        assert_eq!(failed.len(), 1);
        assert!(failed[0].reason.contains("duplicate id 7"));
    }
}
