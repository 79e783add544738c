//! PostgreSQL access: the connection pool, migrations and every query the
//! API and the loader run.
//!
//! Full-text matching is left to PostgreSQL. `interviews.tstext` is a
//! generated `tsvector` over `text`, and searches go through
//! `websearch_to_tsquery('portuguese', …)`.

use serde_json::Value;
use sqlx::{
    PgExecutor,
    PgPool,
    Row,
    migrate::Migrator,
    postgres::{PgPoolOptions, PgRow},
};

use crate::{
    config::{DatabaseConfig, ServerConfig},
    error::Result,
};

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Open a pool and check that at least one connection succeeds.
pub async fn connect_pool(
    database: &DatabaseConfig,
    server: &ServerConfig,
) -> Result<PgPool> {
    let pool = pool_options(server)
        .connect_with(database.connect_options())
        .await?;
    tracing::info!(
        host = %database.host,
        dbname = %database.dbname,
        min = server.min_connections,
        max = server.max_connections,
        "connection pool created"
    );
    Ok(pool)
}

/// A pool that defers connecting until the first query.
pub fn lazy_pool(database: &DatabaseConfig, server: &ServerConfig) -> PgPool {
    pool_options(server).connect_lazy_with(database.connect_options())
}

fn pool_options(server: &ServerConfig) -> PgPoolOptions {
    PgPoolOptions::new()
        .min_connections(server.min_connections)
        .max_connections(server.max_connections)
}

pub async fn migrate(pool: &PgPool) -> Result<()> {
    MIGRATOR.run(pool).await?;
    Ok(())
}

pub async fn ping(pool: &PgPool) -> Result<()> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

// -- Interviews --

/// Which columns of `interviews` a query returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    All,
    Text,
    Questions,
    Answers,
    Meta,
}

impl Projection {
    /// Parse the trailing path segment of an interview route.
    pub fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "text" => Some(Self::Text),
            "questions" => Some(Self::Questions),
            "answers" => Some(Self::Answers),
            "meta" => Some(Self::Meta),
            _ => None,
        }
    }

    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Self::All => &["id", "text", "questions", "answers", "meta"],
            Self::Text => &["id", "text"],
            Self::Questions => &["id", "questions"],
            Self::Answers => &["id", "answers"],
            Self::Meta => &["id", "meta"],
        }
    }
}

/// Which rows of `interviews` a query returns.
#[derive(Debug, Clone, Copy)]
pub enum Filter<'a> {
    All,
    Ids(&'a [i32]),
    Search { query: &'a str, ranked: bool },
}

/// Rows in column order, ready to serialize.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    pub column_names: Vec<&'static str>,
    pub rows: Vec<Vec<Value>>,
}

fn select_sql(projection: Projection, filter: &Filter<'_>) -> String {
    let columns = projection.columns().join(", ");
    let tail = match filter {
        Filter::All => "ORDER BY id".to_string(),
        Filter::Ids(_) => "WHERE id = ANY($1) ORDER BY id".to_string(),
        Filter::Search { ranked: false, .. } => {
            "WHERE tstext @@ websearch_to_tsquery('portuguese', $1) \
             ORDER BY id"
                .to_string()
        }
        Filter::Search { ranked: true, .. } => {
            "WHERE tstext @@ websearch_to_tsquery('portuguese', $1) \
             ORDER BY ts_rank_cd(tstext, \
             websearch_to_tsquery('portuguese', $1), 1|4|32) DESC, id"
                .to_string()
        }
    };
    format!("SELECT {columns} FROM interviews {tail}")
}

fn row_values(row: &PgRow, projection: Projection) -> Result<Vec<Value>> {
    let mut values = Vec::with_capacity(projection.columns().len());
    for &column in projection.columns() {
        let value = match column {
            "id" => Value::from(row.try_get::<i32, _>(column)?),
            "meta" => row
                .try_get::<Option<Value>, _>(column)?
                .unwrap_or(Value::Null),
            _ => row
                .try_get::<Option<String>, _>(column)?
                .map(Value::String)
                .unwrap_or(Value::Null),
        };
        values.push(value);
    }
    Ok(values)
}

pub async fn fetch_interviews(
    pool: &PgPool,
    projection: Projection,
    filter: Filter<'_>,
) -> Result<RowSet> {
    let sql = select_sql(projection, &filter);
    let query = sqlx::query(&sql);
    let query = match filter {
        Filter::All => query,
        Filter::Ids(ids) => query.bind(ids.to_vec()),
        Filter::Search { query: q, .. } => query.bind(q.to_string()),
    };

    let rows = query.fetch_all(pool).await?;
    tracing::debug!(rows = rows.len(), ?projection, "fetched interviews");

    let rows = rows
        .iter()
        .map(|row| row_values(row, projection))
        .collect::<Result<Vec<_>>>()?;

    Ok(RowSet {
        column_names: projection.columns().to_vec(),
        rows,
    })
}

/// A fully prepared interview row.
#[derive(Debug, Clone, PartialEq)]
pub struct InterviewRecord {
    pub id: i32,
    pub text: String,
    pub questions: String,
    pub answers: String,
    pub meta: Value,
}

/// Insert an interview. Returns whether a row was written.
///
/// An existing id is left untouched unless `replace` is set, in which case
/// every column is rewritten together so `meta` never drifts from the text.
pub async fn insert_interview(
    executor: impl PgExecutor<'_>,
    record: &InterviewRecord,
    replace: bool,
) -> Result<bool> {
    let conflict = if replace {
        "ON CONFLICT (id) DO UPDATE SET text = EXCLUDED.text, \
         questions = EXCLUDED.questions, answers = EXCLUDED.answers, \
         meta = EXCLUDED.meta"
    } else {
        "ON CONFLICT (id) DO NOTHING"
    };
    let sql = format!(
        "INSERT INTO interviews (id, text, questions, answers, meta) \
         VALUES ($1, $2, $3, $4, $5) {conflict}"
    );
    let result = sqlx::query(&sql)
        .bind(record.id)
        .bind(&record.text)
        .bind(&record.questions)
        .bind(&record.answers)
        .bind(&record.meta)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Stored meta next to the lexemes PostgreSQL derives from the same text.
#[derive(Debug, Clone)]
pub struct LexemeComparison {
    pub id: i32,
    pub meta: Option<Value>,
    pub lexemes: Vec<String>,
}

pub async fn fetch_lexeme_comparisons(
    pool: &PgPool,
) -> Result<Vec<LexemeComparison>> {
    let rows = sqlx::query(
        "SELECT id, meta, \
         tsvector_to_array(to_tsvector('portuguese', text)) AS lexemes \
         FROM interviews ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            Ok(LexemeComparison {
                id: row.try_get("id")?,
                meta: row.try_get("meta")?,
                lexemes: row.try_get("lexemes")?,
            })
        })
        .collect()
}

// -- API users --

pub async fn find_user_hash(
    executor: impl PgExecutor<'_>,
    username: &str,
) -> Result<Option<String>> {
    let hash = sqlx::query_scalar::<_, String>(
        "SELECT password FROM api_users WHERE username = $1",
    )
    .bind(username)
    .fetch_optional(executor)
    .await?;
    Ok(hash)
}

pub async fn create_user(
    executor: impl PgExecutor<'_>,
    username: &str,
    password_hash: &str,
) -> Result<()> {
    sqlx::query("INSERT INTO api_users (username, password) VALUES ($1, $2)")
        .bind(username)
        .bind(password_hash)
        .execute(executor)
        .await?;
    Ok(())
}

/// Returns the number of rows changed (0 when the user does not exist).
pub async fn update_user_password(
    executor: impl PgExecutor<'_>,
    username: &str,
    password_hash: &str,
) -> Result<u64> {
    let result =
        sqlx::query("UPDATE api_users SET password = $2 WHERE username = $1")
            .bind(username)
            .bind(password_hash)
            .execute(executor)
            .await?;
    Ok(result.rows_affected())
}

pub async fn delete_user(
    executor: impl PgExecutor<'_>,
    username: &str,
) -> Result<u64> {
    let result = sqlx::query("DELETE FROM api_users WHERE username = $1")
        .bind(username)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projection_segments() {
        assert_eq!(Projection::from_segment("text"), Some(Projection::Text));
        assert_eq!(Projection::from_segment("meta"), Some(Projection::Meta));
        assert_eq!(Projection::from_segment("all"), None);
        assert_eq!(Projection::from_segment("Text"), None);
    }

    #[test]
    fn projections_always_lead_with_id() {
        for p in [
            Projection::All,
            Projection::Text,
            Projection::Questions,
            Projection::Answers,
            Projection::Meta,
        ] {
            assert_eq!(p.columns()[0], "id");
        }
    }

    #[test]
    fn select_all_is_ordered_by_id() {
        assert_eq!(
            select_sql(Projection::Text, &Filter::All),
            "SELECT id, text FROM interviews ORDER BY id"
        );
    }

    #[test]
    fn select_by_ids_binds_an_array() {
        let sql = select_sql(Projection::All, &Filter::Ids(&[1, 2]));
        assert!(sql.starts_with(
            "SELECT id, text, questions, answers, meta FROM interviews"
        ));
        assert!(sql.contains("id = ANY($1)"));
    }

    #[test]
    fn search_uses_portuguese_websearch() {
        let plain = select_sql(
            Projection::Meta,
            &Filter::Search {
                query: "x",
                ranked: false,
            },
        );
        assert!(plain.contains("websearch_to_tsquery('portuguese', $1)"));
        assert!(plain.ends_with("ORDER BY id"));

        let ranked = select_sql(
            Projection::Meta,
            &Filter::Search {
                query: "x",
                ranked: true,
            },
        );
        assert!(ranked.contains("ts_rank_cd"));
        assert!(ranked.ends_with("DESC, id"));
    }

    #[test]
    fn migrations_are_embedded() {
        assert!(MIGRATOR.iter().count() >= 1);
    }
}
