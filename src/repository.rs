use crate::models::{Member, Post, PostPage, PostStatisticsDto, SearchKeywordType};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, query_builder::QueryBuilder};
use std::sync::{Arc, Mutex};

/// Repository Trait
///
/// Abstract contract for all persistence operations, so handlers talk to
/// the data layer without knowing the implementation (Postgres in
/// production, the in-memory mock in tests).
///
/// **Send + Sync + async_trait** keep the trait object (`Arc<dyn
/// Repository>`) shareable across axum's task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Members (identity lookups for authentication) ---
    async fn get_member(&self, id: i64) -> Result<Option<Member>, sqlx::Error>;

    // --- Post retrieval ---
    async fn get_post(&self, id: i64) -> Result<Option<Post>, sqlx::Error>;

    /// Public listing: `listed = true AND published = true`, newest first,
    /// with the optional keyword filter applied to the selected field.
    async fn list_posts(
        &self,
        page: u32,
        page_size: u32,
        keyword_type: SearchKeywordType,
        keyword: &str,
    ) -> Result<PostPage, sqlx::Error>;

    /// Owner listing: restricted to `author_id`, with NO listed/published
    /// filter. The owner sees their own drafts and unlisted posts.
    async fn list_posts_by_author(
        &self,
        author_id: i64,
        page: u32,
        page_size: u32,
        keyword_type: SearchKeywordType,
        keyword: &str,
    ) -> Result<PostPage, sqlx::Error>;

    // --- Post mutations ---
    async fn create_post(
        &self,
        author_id: i64,
        title: &str,
        content: &str,
        published: bool,
        listed: bool,
    ) -> Result<Post, sqlx::Error>;

    /// Updates title/content and bumps `modified_date`. Returns None when
    /// the id does not exist. Authorization happens in the handler, before
    /// this is called.
    async fn update_post(
        &self,
        id: i64,
        title: &str,
        content: &str,
    ) -> Result<Option<Post>, sqlx::Error>;

    /// Returns true if a row was deleted.
    async fn delete_post(&self, id: i64) -> Result<bool, sqlx::Error>;

    // --- Aggregates ---
    async fn get_statistics(&self) -> Result<PostStatisticsDto, sqlx::Error>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the
/// application state.
pub type RepositoryState = Arc<dyn Repository>;

// Shared SELECT list for post queries; the author's nickname rides along
// from the members join.
const POST_COLUMNS: &str = "p.id, p.author_id, m.nickname AS author_name, p.title, p.content, \
     p.published, p.listed, p.created_date, p.modified_date";

/// PostgresRepository
///
/// The concrete implementation backed by PostgreSQL.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Shared paging query behind both listings. `visible_only` applies the
    /// public listing filter; `author_id` restricts to one author. The
    /// keyword filter is parameterized through QueryBuilder bindings, never
    /// interpolated.
    async fn fetch_page(
        &self,
        author_id: Option<i64>,
        visible_only: bool,
        page: u32,
        page_size: u32,
        keyword_type: SearchKeywordType,
        keyword: &str,
    ) -> Result<PostPage, sqlx::Error> {
        let page = page.max(1);
        let page_size = page_size.max(1);

        let mut count_builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM posts p WHERE true");
        push_filters(
            &mut count_builder,
            author_id,
            visible_only,
            keyword_type,
            keyword,
        );
        let total_items: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {POST_COLUMNS} FROM posts p JOIN members m ON m.id = p.author_id WHERE true"
        ));
        push_filters(&mut builder, author_id, visible_only, keyword_type, keyword);
        builder.push(" ORDER BY p.id DESC LIMIT ");
        builder.push_bind(i64::from(page_size));
        builder.push(" OFFSET ");
        builder.push_bind(i64::from(page - 1) * i64::from(page_size));

        let items = builder
            .build_query_as::<Post>()
            .fetch_all(&self.pool)
            .await?;

        Ok(PostPage::new(items, page, page_size, total_items))
    }
}

/// Escapes LIKE metacharacters so the keyword always matches as a literal
/// substring, never as a pattern.
fn escape_like(keyword: &str) -> String {
    keyword
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Appends the dynamic WHERE conditions shared by the count and page
/// queries. The keyword match is a case-sensitive literal substring match
/// on the selected field only.
fn push_filters(
    builder: &mut QueryBuilder<'_, Postgres>,
    author_id: Option<i64>,
    visible_only: bool,
    keyword_type: SearchKeywordType,
    keyword: &str,
) {
    if visible_only {
        builder.push(" AND p.listed = true AND p.published = true");
    }
    if let Some(author_id) = author_id {
        builder.push(" AND p.author_id = ");
        builder.push_bind(author_id);
    }
    if !keyword.is_empty() {
        match keyword_type {
            SearchKeywordType::Title => builder.push(" AND p.title LIKE "),
            SearchKeywordType::Content => builder.push(" AND p.content LIKE "),
        };
        builder.push_bind(format!("%{}%", escape_like(keyword)));
        builder.push(" ESCAPE '\\'");
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn get_member(&self, id: i64) -> Result<Option<Member>, sqlx::Error> {
        sqlx::query_as::<_, Member>(
            "SELECT id, username, nickname, role FROM members WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_post(&self, id: i64) -> Result<Option<Post>, sqlx::Error> {
        sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM posts p JOIN members m ON m.id = p.author_id \
             WHERE p.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn list_posts(
        &self,
        page: u32,
        page_size: u32,
        keyword_type: SearchKeywordType,
        keyword: &str,
    ) -> Result<PostPage, sqlx::Error> {
        self.fetch_page(None, true, page, page_size, keyword_type, keyword)
            .await
    }

    async fn list_posts_by_author(
        &self,
        author_id: i64,
        page: u32,
        page_size: u32,
        keyword_type: SearchKeywordType,
        keyword: &str,
    ) -> Result<PostPage, sqlx::Error> {
        self.fetch_page(Some(author_id), false, page, page_size, keyword_type, keyword)
            .await
    }

    async fn create_post(
        &self,
        author_id: i64,
        title: &str,
        content: &str,
        published: bool,
        listed: bool,
    ) -> Result<Post, sqlx::Error> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO posts (author_id, title, content, published, listed, created_date, modified_date) \
             VALUES ($1, $2, $3, $4, $5, NOW(), NOW()) RETURNING id",
        )
        .bind(author_id)
        .bind(title)
        .bind(content)
        .bind(published)
        .bind(listed)
        .fetch_one(&self.pool)
        .await?;

        // Re-read through the joined query so author_name is populated.
        self.get_post(id).await?.ok_or(sqlx::Error::RowNotFound)
    }

    async fn update_post(
        &self,
        id: i64,
        title: &str,
        content: &str,
    ) -> Result<Option<Post>, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE posts SET title = $2, content = $3, modified_date = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(title)
        .bind(content)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_post(id).await
    }

    async fn delete_post(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_statistics(&self) -> Result<PostStatisticsDto, sqlx::Error> {
        // One aggregate query, so the three counters come from the same
        // snapshot even under concurrent writes.
        sqlx::query_as::<_, PostStatisticsDto>(
            "SELECT COUNT(*) AS post_count, \
             COUNT(*) FILTER (WHERE published) AS post_published_count, \
             COUNT(*) FILTER (WHERE listed) AS post_listed_count \
             FROM posts",
        )
        .fetch_one(&self.pool)
        .await
    }
}

// --- The Mock Implementation (For Tests) ---

/// MockRepository
///
/// In-memory implementation of `Repository` with the same query semantics
/// as the Postgres one (id-descending order, case-sensitive keyword match,
/// identical visibility filters). Lets the full router be exercised in
/// tests without a database.
#[derive(Default)]
pub struct MockRepository {
    inner: Mutex<MockData>,
}

#[derive(Default)]
struct MockData {
    members: Vec<Member>,
    posts: Vec<Post>,
    next_member_id: i64,
    next_post_id: i64,
}

impl MockRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a member and returns it with its assigned id.
    pub fn add_member(&self, username: &str, nickname: &str, role: &str) -> Member {
        let mut data = self.inner.lock().expect("mock repository poisoned");
        data.next_member_id += 1;
        let member = Member {
            id: data.next_member_id,
            username: username.to_string(),
            nickname: nickname.to_string(),
            role: role.to_string(),
        };
        data.members.push(member.clone());
        member
    }

    /// Seeds a post for the given author and returns it with its assigned id.
    pub fn add_post(
        &self,
        author: &Member,
        title: &str,
        content: &str,
        published: bool,
        listed: bool,
    ) -> Post {
        let now = Utc::now();
        let mut data = self.inner.lock().expect("mock repository poisoned");
        data.next_post_id += 1;
        let post = Post {
            id: data.next_post_id,
            author_id: author.id,
            author_name: author.nickname.clone(),
            title: title.to_string(),
            content: content.to_string(),
            published,
            listed,
            created_date: now,
            modified_date: now,
        };
        data.posts.push(post.clone());
        post
    }

    fn page_of(
        posts: Vec<Post>,
        page: u32,
        page_size: u32,
        keyword_type: SearchKeywordType,
        keyword: &str,
    ) -> PostPage {
        let page = page.max(1);
        let page_size = page_size.max(1);

        let mut matching: Vec<Post> = posts
            .into_iter()
            .filter(|post| matches_keyword(post, keyword_type, keyword))
            .collect();
        matching.sort_by(|a, b| b.id.cmp(&a.id));

        let total_items = matching.len() as i64;
        let offset = ((page - 1) as usize) * (page_size as usize);
        let items: Vec<Post> = matching
            .into_iter()
            .skip(offset)
            .take(page_size as usize)
            .collect();

        PostPage::new(items, page, page_size, total_items)
    }
}

fn matches_keyword(post: &Post, keyword_type: SearchKeywordType, keyword: &str) -> bool {
    if keyword.is_empty() {
        return true;
    }
    match keyword_type {
        SearchKeywordType::Title => post.title.contains(keyword),
        SearchKeywordType::Content => post.content.contains(keyword),
    }
}

#[async_trait]
impl Repository for MockRepository {
    async fn get_member(&self, id: i64) -> Result<Option<Member>, sqlx::Error> {
        let data = self.inner.lock().expect("mock repository poisoned");
        Ok(data.members.iter().find(|m| m.id == id).cloned())
    }

    async fn get_post(&self, id: i64) -> Result<Option<Post>, sqlx::Error> {
        let data = self.inner.lock().expect("mock repository poisoned");
        Ok(data.posts.iter().find(|p| p.id == id).cloned())
    }

    async fn list_posts(
        &self,
        page: u32,
        page_size: u32,
        keyword_type: SearchKeywordType,
        keyword: &str,
    ) -> Result<PostPage, sqlx::Error> {
        let posts: Vec<Post> = {
            let data = self.inner.lock().expect("mock repository poisoned");
            data.posts
                .iter()
                .filter(|p| p.listed && p.published)
                .cloned()
                .collect()
        };
        Ok(Self::page_of(posts, page, page_size, keyword_type, keyword))
    }

    async fn list_posts_by_author(
        &self,
        author_id: i64,
        page: u32,
        page_size: u32,
        keyword_type: SearchKeywordType,
        keyword: &str,
    ) -> Result<PostPage, sqlx::Error> {
        let posts: Vec<Post> = {
            let data = self.inner.lock().expect("mock repository poisoned");
            data.posts
                .iter()
                .filter(|p| p.author_id == author_id)
                .cloned()
                .collect()
        };
        Ok(Self::page_of(posts, page, page_size, keyword_type, keyword))
    }

    async fn create_post(
        &self,
        author_id: i64,
        title: &str,
        content: &str,
        published: bool,
        listed: bool,
    ) -> Result<Post, sqlx::Error> {
        let author = self
            .get_member(author_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;
        Ok(self.add_post(&author, title, content, published, listed))
    }

    async fn update_post(
        &self,
        id: i64,
        title: &str,
        content: &str,
    ) -> Result<Option<Post>, sqlx::Error> {
        let mut data = self.inner.lock().expect("mock repository poisoned");
        let Some(post) = data.posts.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        post.title = title.to_string();
        post.content = content.to_string();
        post.modified_date = Utc::now();
        Ok(Some(post.clone()))
    }

    async fn delete_post(&self, id: i64) -> Result<bool, sqlx::Error> {
        let mut data = self.inner.lock().expect("mock repository poisoned");
        let before = data.posts.len();
        data.posts.retain(|p| p.id != id);
        Ok(data.posts.len() < before)
    }

    async fn get_statistics(&self) -> Result<PostStatisticsDto, sqlx::Error> {
        let data = self.inner.lock().expect("mock repository poisoned");
        Ok(PostStatisticsDto {
            post_count: data.posts.len() as i64,
            post_published_count: data.posts.iter().filter(|p| p.published).count() as i64,
            post_listed_count: data.posts.iter().filter(|p| p.listed).count() as i64,
        })
    }
}
