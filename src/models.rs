use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;

use crate::error::ServiceError;

// --- Core Application Schemas (Mapped to Database) ---

/// Member
///
/// Canonical identity record from the `members` table. The `role` field is
/// the RBAC marker: 'user' or 'admin'.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Default)]
pub struct Member {
    pub id: i64,
    /// Login identifier; unique.
    pub username: String,
    /// Display name shown as the post author.
    pub nickname: String,
    pub role: String,
}

impl Member {
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

/// Post
///
/// A post record from the `posts` table, joined with the author's nickname.
/// `published` controls whether non-owners may read the content; `listed`
/// controls whether the post appears in the public listing. Authorship is
/// fixed at creation; `modify` only touches title, content, and
/// `modified_date`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Default)]
pub struct Post {
    pub id: i64,
    pub author_id: i64,
    /// Loaded via a JOIN with `members` in the repository queries.
    #[sqlx(default)]
    pub author_name: String,
    pub title: String,
    pub content: String,
    pub published: bool,
    pub listed: bool,
    pub created_date: DateTime<Utc>,
    pub modified_date: DateTime<Utc>,
}

/// SearchKeywordType
///
/// Which post field the keyword filter applies to. Accepts both lowercase
/// and uppercase spellings in query strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SearchKeywordType {
    #[default]
    #[serde(alias = "TITLE")]
    Title,
    #[serde(alias = "CONTENT")]
    Content,
}

/// PostPage
///
/// One page of posts plus the derived paging counters. Produced by the
/// repository; not persisted.
#[derive(Debug, Clone, Default)]
pub struct PostPage {
    pub items: Vec<Post>,
    pub current_page_no: u32,
    pub total_pages: u32,
    pub total_items: i64,
}

impl PostPage {
    /// Builds a page result, deriving `total_pages` as
    /// ceil(total_items / page_size).
    pub fn new(items: Vec<Post>, current_page_no: u32, page_size: u32, total_items: i64) -> Self {
        let page_size = i64::from(page_size.max(1));
        let total_pages = ((total_items + page_size - 1) / page_size).max(0) as u32;
        Self {
            items,
            current_page_no,
            total_pages,
            total_items,
        }
    }
}

// --- Request Payloads (Input Schemas) ---

/// WritePostRequest
///
/// Input payload for POST /posts. `published` and `listed` default to false
/// when omitted, so a bare {title, content} body creates a private draft.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct WritePostRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub listed: bool,
}

impl WritePostRequest {
    pub fn validate(&self) -> Result<(), ServiceError> {
        validate_not_blank(&[("title", &self.title), ("content", &self.content)])
    }
}

/// ModifyPostRequest
///
/// Input payload for PUT /posts/{id}. Only title and content are mutable.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ModifyPostRequest {
    pub title: String,
    pub content: String,
}

impl ModifyPostRequest {
    pub fn validate(&self) -> Result<(), ServiceError> {
        validate_not_blank(&[("title", &self.title), ("content", &self.content)])
    }
}

/// FieldError
///
/// One failed constraint on one request field. Handlers run validation as
/// an explicit first step; the errors are folded into the fixed
/// `"{field} : {constraint} : {message}"` line format clients parse.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub field: &'static str,
    pub constraint: &'static str,
    pub message: &'static str,
}

/// Checks that every named field is non-blank. Failures are reported
/// together, sorted by field name, joined with newlines.
fn validate_not_blank(fields: &[(&'static str, &str)]) -> Result<(), ServiceError> {
    let mut errors: Vec<FieldError> = fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| FieldError {
            field,
            constraint: "NotBlank",
            message: "must not be blank",
        })
        .collect();

    if errors.is_empty() {
        return Ok(());
    }

    errors.sort_by_key(|e| e.field);
    let msg = errors
        .iter()
        .map(|e| format!("{} : {} : {}", e.field, e.constraint, e.message))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ServiceError::Validation(msg))
}

// --- Response Schemas (Output) ---

/// PostDto
///
/// List-item projection of a post. Deliberately omits `content`: the listing
/// endpoints must not leak post bodies, only the single-post endpoint
/// returns them (after the access-policy check).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PostDto {
    pub id: i64,
    #[ts(type = "string")]
    pub created_date: DateTime<Utc>,
    #[ts(type = "string")]
    pub modified_date: DateTime<Utc>,
    pub title: String,
    pub author_id: i64,
    pub author_name: String,
    pub published: bool,
    pub listed: bool,
}

impl From<&Post> for PostDto {
    fn from(post: &Post) -> Self {
        Self {
            id: post.id,
            created_date: post.created_date,
            modified_date: post.modified_date,
            title: post.title.clone(),
            author_id: post.author_id,
            author_name: post.author_name.clone(),
            published: post.published,
            listed: post.listed,
        }
    }
}

/// PostWithContentDto
///
/// Full projection of a post including the body. Returned by the single-post
/// read and by the write/modify handlers.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PostWithContentDto {
    pub id: i64,
    #[ts(type = "string")]
    pub created_date: DateTime<Utc>,
    #[ts(type = "string")]
    pub modified_date: DateTime<Utc>,
    pub title: String,
    pub content: String,
    pub author_id: i64,
    pub author_name: String,
    pub published: bool,
    pub listed: bool,
}

impl From<&Post> for PostWithContentDto {
    fn from(post: &Post) -> Self {
        Self {
            id: post.id,
            created_date: post.created_date,
            modified_date: post.modified_date,
            title: post.title.clone(),
            content: post.content.clone(),
            author_id: post.author_id,
            author_name: post.author_name.clone(),
            published: post.published,
            listed: post.listed,
        }
    }
}

/// PageDto
///
/// Output schema for the listing endpoints: the page items plus the paging
/// counters the frontend renders.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PageDto {
    pub items: Vec<PostDto>,
    pub current_page_no: u32,
    pub total_pages: u32,
    pub total_items: i64,
}

impl From<&PostPage> for PageDto {
    fn from(page: &PostPage) -> Self {
        Self {
            items: page.items.iter().map(PostDto::from).collect(),
            current_page_no: page.current_page_no,
            total_pages: page.total_pages,
            total_items: page.total_items,
        }
    }
}

/// PostStatisticsDto
///
/// Output schema for the admin statistics endpoint (GET /posts/statistics).
/// Also maps directly from the single aggregate row the repository selects.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PostStatisticsDto {
    pub post_count: i64,
    pub post_published_count: i64,
    pub post_listed_count: i64,
}

/// RsData
///
/// The uniform response envelope: a `"<http-class>-<seq>"` code, a
/// human-readable message, and an optional payload. The HTTP status is
/// derived from the numeric prefix of `code` when the envelope is converted
/// into a response, so "201-1" becomes HTTP 201.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RsData<T> {
    pub code: String,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> RsData<T> {
    pub fn new(code: impl Into<String>, msg: impl Into<String>, data: T) -> Self {
        Self {
            code: code.into(),
            msg: msg.into(),
            data: Some(data),
        }
    }

    /// Envelope without a payload (e.g., deletion confirmations).
    pub fn of(code: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            msg: msg.into(),
            data: None,
        }
    }

    /// The HTTP status class encoded in the leading segment of `code`.
    pub fn status_code(&self) -> axum::http::StatusCode {
        self.code
            .split('-')
            .next()
            .and_then(|prefix| prefix.parse::<u16>().ok())
            .and_then(|status| axum::http::StatusCode::from_u16(status).ok())
            .unwrap_or(axum::http::StatusCode::OK)
    }
}

impl<T: Serialize> axum::response::IntoResponse for RsData<T> {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), axum::Json(self)).into_response()
    }
}
