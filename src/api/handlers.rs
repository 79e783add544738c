use std::sync::LazyLock;

use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{Connection, PgConnection};

use super::{
    AppState,
    auth::{AuthUser, BasicCredentials},
    error::ApiError,
};
use crate::{
    db::{self, Filter, Projection},
    meta::STEMMER_NAME,
    password,
    stopwords,
};

static ID_LIST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\d+\s*(?:,\s*\d+\s*)*,?\s*$").expect("valid regex")
});

/// The first path segment of `/interviews/<selector>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    All,
    Ids(Vec<i32>),
    Search(String),
}

impl Selector {
    /// `all` wins over an id list, which wins over a search string.
    ///
    /// A digit list whose values do not fit an interview id is treated as
    /// a search string.
    pub fn parse(raw: &str) -> Self {
        if raw == "all" {
            return Self::All;
        }
        if let Some(ids) = parse_id_list(raw) {
            return Self::Ids(ids);
        }
        Self::Search(raw.to_string())
    }
}

/// Parse `"1, 2, 3 ,4,"` into `[1, 2, 3, 4]`.
pub fn parse_id_list(raw: &str) -> Option<Vec<i32>> {
    if !ID_LIST_RE.is_match(raw) {
        return None;
    }
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| part.parse().ok())
        .collect()
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub order: Option<String>,
}

impl ListParams {
    fn ranked(&self) -> Result<bool, ApiError> {
        match self.order.as_deref() {
            None | Some("id") => Ok(false),
            Some("rank") => Ok(true),
            Some(other) => Err(ApiError::BadRequest(format!(
                "Unknown order '{other}'. Expected 'id' or 'rank'."
            ))),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InterviewsResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_ids_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_ids: Option<Vec<i32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_string: Option<String>,
    pub row_count: usize,
    pub column_names: Vec<&'static str>,
    pub rows: Vec<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stemmer: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stopwords: Option<&'static [&'static str]>,
}

impl InterviewsResponse {
    fn new(
        selector: &Selector,
        projection: Projection,
        rows: db::RowSet,
    ) -> Self {
        let (search_ids_count, search_ids, search_string) = match selector {
            Selector::All => (None, None, None),
            Selector::Ids(ids) => (Some(ids.len()), Some(ids.clone()), None),
            Selector::Search(s) => (None, None, Some(s.clone())),
        };
        let with_meta = projection == Projection::Meta;
        Self {
            search_ids_count,
            search_ids,
            search_string,
            row_count: rows.rows.len(),
            column_names: rows.column_names,
            rows: rows.rows,
            stemmer: with_meta.then_some(STEMMER_NAME),
            stopwords: with_meta.then_some(stopwords::PORTUGUESE),
        }
    }
}

async fn list(
    state: &AppState,
    selector: String,
    projection: Projection,
    params: &ListParams,
) -> Result<Json<InterviewsResponse>, ApiError> {
    let ranked = params.ranked()?;
    let selector = Selector::parse(&selector);
    let filter = match &selector {
        Selector::All => Filter::All,
        Selector::Ids(ids) => Filter::Ids(ids),
        Selector::Search(query) => Filter::Search { query, ranked },
    };

    let rows = db::fetch_interviews(&state.pool, projection, filter).await?;
    Ok(Json(InterviewsResponse::new(&selector, projection, rows)))
}

pub async fn interviews(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(selector): Path<String>,
    Query(params): Query<ListParams>,
) -> Result<Json<InterviewsResponse>, ApiError> {
    list(&state, selector, Projection::All, &params).await
}

pub async fn interview_field(
    _user: AuthUser,
    State(state): State<AppState>,
    Path((selector, field)): Path<(String, String)>,
    Query(params): Query<ListParams>,
) -> Result<Json<InterviewsResponse>, ApiError> {
    let projection = Projection::from_segment(&field).ok_or_else(|| {
        ApiError::NotFound(format!("Unknown interview field '{field}'."))
    })?;
    list(&state, selector, projection, &params).await
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    match db::ping(&state.pool).await {
        Ok(()) => (StatusCode::OK, Json(serde_json::json!({"status": "ok"}))),
        Err(e) => {
            tracing::error!(error = %e, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({
                    "status": "unavailable",
                    "message": e.to_string(),
                })),
            )
        }
    }
}

// -- Users --

const CREATE_USER_PARAMS: &str =
    "json:[new_username, new_password]\nauthorization:[username, password]\n";
const UPDATE_PASSWORD_PARAMS: &str =
    "json:[new_password]\nauthorization:[username, password]";
const DELETE_USER_PARAMS: &str =
    "json:[username]\nauthorization:[username, password]";

#[derive(Debug, Default, Deserialize)]
struct UserRequest {
    username: Option<String>,
    new_username: Option<String>,
    new_password: Option<String>,
}

impl UserRequest {
    /// A body that is absent or not JSON counts as having no keys.
    fn from_body(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_default()
    }
}

async fn hash_password(
    password: String,
    rounds: u32,
) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || password::hash(&password, rounds))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))
}

/// Open a connection that acts as the database role in the request's
/// Basic credentials.
async fn connect_as(
    state: &AppState,
    creds: &BasicCredentials,
) -> Result<PgConnection, ApiError> {
    let options = state
        .database
        .connect_options_as(&creds.username, &creds.password);
    Ok(PgConnection::connect_with(&options).await?)
}

pub async fn create_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let request = UserRequest::from_body(&body);
    let (Some(creds), Some(new_username), Some(new_password)) = (
        BasicCredentials::from_headers(&headers),
        request.new_username,
        request.new_password,
    ) else {
        return Err(ApiError::MissingParameters(CREATE_USER_PARAMS));
    };

    let hash = hash_password(new_password, state.pbkdf2_rounds).await?;
    let mut conn = connect_as(&state, &creds).await?;
    db::create_user(&mut conn, &new_username, &hash).await?;
    conn.close().await?;

    tracing::info!(
        role = %creds.username,
        username = %new_username,
        "api user created"
    );
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "API user created successfully.",
            "username": new_username,
        })),
    ))
}

pub async fn update_password(
    user: AuthUser,
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let Some(new_password) = UserRequest::from_body(&body).new_password else {
        return Err(ApiError::MissingParameters(UPDATE_PASSWORD_PARAMS));
    };

    let hash = hash_password(new_password, state.pbkdf2_rounds).await?;
    db::update_user_password(&state.pool, &user.username, &hash).await?;

    tracing::info!(username = %user.username, "api user password changed");
    Ok(Json(serde_json::json!({
        "message": "Password changed successfully.",
        "username": user.username,
    })))
}

pub async fn delete_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let request = UserRequest::from_body(&body);
    let (Some(creds), Some(username)) =
        (BasicCredentials::from_headers(&headers), request.username)
    else {
        return Err(ApiError::MissingParameters(DELETE_USER_PARAMS));
    };

    let mut conn = connect_as(&state, &creds).await?;
    let deleted = db::delete_user(&mut conn, &username).await?;
    conn.close().await?;

    tracing::info!(
        role = %creds.username,
        %username,
        deleted,
        "api user deleted"
    );
    Ok(Json(serde_json::json!({ "username": username })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_lists_accept_spaces_and_trailing_commas() {
        assert_eq!(
            parse_id_list("1, 2, 3 ,4,5 , 6, 11, 20, "),
            Some(vec![1, 2, 3, 4, 5, 6, 11, 20])
        );
        assert_eq!(parse_id_list("7"), Some(vec![7]));
        assert_eq!(parse_id_list(" 7 ,"), Some(vec![7]));
    }

    #[test]
    fn id_lists_reject_other_text() {
        assert_eq!(parse_id_list(""), None);
        assert_eq!(parse_id_list(","), None);
        assert_eq!(parse_id_list("1,,2"), None);
        assert_eq!(parse_id_list("1,a"), None);
        assert_eq!(parse_id_list("-1"), None);
    }

    #[test]
    fn oversized_ids_are_not_an_id_list() {
        assert_eq!(parse_id_list("99999999999"), None);
    }

    #[test]
    fn selector_precedence() {
        assert_eq!(Selector::parse("all"), Selector::All);
        assert_eq!(Selector::parse("3,4"), Selector::Ids(vec![3, 4]));
        assert_eq!(
            Selector::parse("ginástica olímpica"),
            Selector::Search("ginástica olímpica".into())
        );
        assert_eq!(Selector::parse("All"), Selector::Search("All".into()));
        assert_eq!(
            Selector::parse("99999999999"),
            Selector::Search("99999999999".into())
        );
    }

    #[test]
    fn order_param() {
        assert!(!ListParams::default().ranked().unwrap());
        let rank = ListParams {
            order: Some("rank".into()),
        };
        assert!(rank.ranked().unwrap());
        let bogus = ListParams {
            order: Some("date".into()),
        };
        assert!(bogus.ranked().is_err());
    }

    fn rowset(projection: Projection) -> db::RowSet {
        db::RowSet {
            column_names: projection.columns().to_vec(),
            rows: vec![vec![Value::from(1), Value::Null]],
        }
    }

    #[test]
    fn id_list_response_echoes_ids() {
        let selector = Selector::Ids(vec![1, 5]);
        let response = InterviewsResponse::new(
            &selector,
            Projection::Text,
            rowset(Projection::Text),
        );
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["search_ids_count"], 2);
        assert_eq!(json["search_ids"], serde_json::json!([1, 5]));
        assert_eq!(json["row_count"], 1);
        assert_eq!(json["column_names"], serde_json::json!(["id", "text"]));
        assert!(json.get("search_string").is_none());
        assert!(json.get("stemmer").is_none());
    }

    #[test]
    fn search_meta_response_describes_derivation() {
        let selector = Selector::Search("salto".into());
        let response = InterviewsResponse::new(
            &selector,
            Projection::Meta,
            rowset(Projection::Meta),
        );
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["search_string"], "salto");
        assert_eq!(json["stemmer"], STEMMER_NAME);
        assert!(json["stopwords"].as_array().unwrap().len() > 100);
        assert!(json.get("search_ids").is_none());
    }

    #[test]
    fn user_request_tolerates_bad_bodies() {
        assert!(UserRequest::from_body(b"").new_password.is_none());
        assert!(UserRequest::from_body(b"not json").username.is_none());
        let req = UserRequest::from_body(
            br#"{"new_username": "ana", "new_password": "pw"}"#,
        );
        assert_eq!(req.new_username.as_deref(), Some("ana"));
        assert_eq!(req.new_password.as_deref(), Some("pw"));
    }
}
