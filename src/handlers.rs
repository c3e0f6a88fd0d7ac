use crate::{
    AppState,
    auth::AuthUser,
    error::ServiceError,
    models::{
        ModifyPostRequest, PageDto, PostStatisticsDto, PostWithContentDto, RsData,
        SearchKeywordType, WritePostRequest,
    },
    policy,
};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

// --- Filter Structs ---

/// PostListQuery
///
/// Accepted query parameters for both listing endpoints, bound by axum's
/// Query extractor. Defaults: page 1, three items per page, title search,
/// empty keyword.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct PostListQuery {
    /// 1-indexed page number.
    #[serde(default = "default_page")]
    pub page: u32,
    /// Items per page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Which field the keyword applies to: title or content.
    #[serde(default)]
    pub keyword_type: SearchKeywordType,
    /// Case-sensitive substring to search for; empty means no filter.
    #[serde(default)]
    pub keyword: String,
}

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    3
}

// --- Handlers ---

/// get_posts
///
/// [Public Route] Paginated public listing. Only posts with both
/// `listed=true` and `published=true` appear; the filter is enforced
/// unconditionally in the repository query.
#[utoipa::path(
    get,
    path = "/posts",
    params(PostListQuery),
    responses((status = 200, description = "Paginated public post list", body = PageDto))
)]
pub async fn get_posts(
    State(state): State<AppState>,
    Query(query): Query<PostListQuery>,
) -> Result<RsData<PageDto>, ServiceError> {
    let page = state
        .repo
        .list_posts(query.page, query.page_size, query.keyword_type, &query.keyword)
        .await?;

    Ok(RsData::new(
        "200-1",
        "글 목록 조회가 완료되었습니다.",
        PageDto::from(&page),
    ))
}

/// get_my_posts
///
/// [Authenticated Route] Paginated listing of the actor's own posts.
/// Deliberately applies no listed/published filter: the owner sees their
/// drafts and unlisted posts.
#[utoipa::path(
    get,
    path = "/posts/mine",
    params(PostListQuery),
    responses((status = 200, description = "Paginated own post list", body = PageDto))
)]
pub async fn get_my_posts(
    actor: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<PostListQuery>,
) -> Result<RsData<PageDto>, ServiceError> {
    let page = state
        .repo
        .list_posts_by_author(
            actor.id,
            query.page,
            query.page_size,
            query.keyword_type,
            &query.keyword,
        )
        .await?;

    Ok(RsData::new(
        "200-1",
        "내 글 목록 조회가 완료되었습니다.",
        PageDto::from(&page),
    ))
}

/// get_post
///
/// [Public Route] Single post read, content included. Published posts need
/// no token. For a private post the actor must be present (401 otherwise)
/// and pass the access policy (author or admin).
#[utoipa::path(
    get,
    path = "/posts/{id}",
    params(("id" = i64, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Found", body = PostWithContentDto),
        (status = 403, description = "Private post"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_post(
    actor: Option<AuthUser>,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<RsData<PostWithContentDto>, ServiceError> {
    let post = state
        .repo
        .get_post(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("존재하지 않는 글입니다.".to_string()))?;

    if !post.published {
        let actor =
            actor.ok_or_else(|| ServiceError::Unauthorized("잘못된 인증키입니다.".to_string()))?;
        policy::can_access(&actor, &post)?;
    }

    Ok(RsData::new(
        "200-1",
        format!("{}번 글을 조회하였습니다.", id),
        PostWithContentDto::from(&post),
    ))
}

/// write_post
///
/// [Authenticated Route] Creates a post owned by the actor. Validation of
/// the required fields runs before anything touches the store.
#[utoipa::path(
    post,
    path = "/posts",
    request_body = WritePostRequest,
    responses(
        (status = 201, description = "Created", body = PostWithContentDto),
        (status = 400, description = "Validation failure")
    )
)]
pub async fn write_post(
    actor: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<WritePostRequest>,
) -> Result<RsData<PostWithContentDto>, ServiceError> {
    payload.validate()?;

    let post = state
        .repo
        .create_post(
            actor.id,
            &payload.title,
            &payload.content,
            payload.published,
            payload.listed,
        )
        .await?;

    Ok(RsData::new(
        "201-1",
        format!("{}번 글 작성이 완료되었습니다.", post.id),
        PostWithContentDto::from(&post),
    ))
}

/// modify_post
///
/// [Authenticated Route] Updates title and content of the actor's own post.
/// Validation first, then existence, then the author-only policy check, so
/// a blank body reports 400 even against someone else's post.
#[utoipa::path(
    put,
    path = "/posts/{id}",
    params(("id" = i64, Path, description = "Post ID")),
    request_body = ModifyPostRequest,
    responses(
        (status = 200, description = "Updated", body = PostWithContentDto),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn modify_post(
    actor: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<ModifyPostRequest>,
) -> Result<RsData<PostWithContentDto>, ServiceError> {
    payload.validate()?;

    let post = state
        .repo
        .get_post(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("존재하지 않는 글입니다.".to_string()))?;
    policy::can_modify(&actor, &post)?;

    let updated = state
        .repo
        .update_post(id, &payload.title, &payload.content)
        .await?
        .ok_or_else(|| ServiceError::NotFound("존재하지 않는 글입니다.".to_string()))?;

    Ok(RsData::new(
        "200-1",
        format!("{}번 글 수정이 완료되었습니다.", id),
        PostWithContentDto::from(&updated),
    ))
}

/// delete_post
///
/// [Authenticated Route] Deletes a post. Allowed for the author and for
/// admins (moderation override); everyone else gets the policy's 403.
#[utoipa::path(
    delete,
    path = "/posts/{id}",
    params(("id" = i64, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 403, description = "Not the author or an admin"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_post(
    actor: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<RsData<()>, ServiceError> {
    let post = state
        .repo
        .get_post(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("존재하지 않는 글입니다.".to_string()))?;
    policy::can_delete(&actor, &post)?;

    state.repo.delete_post(id).await?;

    Ok(RsData::of(
        "200-1",
        format!("{}번 글 삭제가 완료되었습니다.", id),
    ))
}

/// get_statistics
///
/// [Admin Route] Aggregate post counters. Explicitly checks the 'admin'
/// role of the resolved actor before touching the store.
#[utoipa::path(
    get,
    path = "/posts/statistics",
    responses(
        (status = 200, description = "Counters", body = PostStatisticsDto),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn get_statistics(
    actor: AuthUser,
    State(state): State<AppState>,
) -> Result<RsData<PostStatisticsDto>, ServiceError> {
    if !actor.is_admin() {
        return Err(ServiceError::Forbidden("접근 권한이 없습니다.".to_string()));
    }

    let statistics = state.repo.get_statistics().await?;

    Ok(RsData::new(
        "200-1",
        "통계 조회가 완료되었습니다.",
        statistics,
    ))
}
