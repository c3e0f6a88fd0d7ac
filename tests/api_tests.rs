use blog_api::{
    AppConfig, AppState, create_router,
    auth::create_token,
    models::Member,
    repository::{MockRepository, RepositoryState},
};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::net::TcpListener;

/// A running application instance on an ephemeral port, backed by the
/// in-memory repository so tests need no database.
struct TestApp {
    address: String,
    repo: Arc<MockRepository>,
    config: AppConfig,
}

impl TestApp {
    fn token_for(&self, member: &Member) -> String {
        create_token(&self.config.jwt_secret, member.id, 3600).expect("token signing failed")
    }
}

async fn spawn_app() -> TestApp {
    let repo = Arc::new(MockRepository::new());
    let config = AppConfig::default();

    let state = AppState {
        repo: repo.clone() as RepositoryState,
        config: config.clone(),
    };
    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp {
        address,
        repo,
        config,
    }
}

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let response = client
        .get(format!("{}/health", app.address))
        .send()
        .await
        .expect("req fail");
    assert!(response.status().is_success());
}

#[tokio::test]
async fn test_public_list_pagination_and_envelope() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let author = app.repo.add_member("user1", "유저1", "user");
    for i in 1..=7 {
        app.repo.add_post(
            &author,
            &format!("title{}", i),
            &format!("content{}", i),
            true,
            true,
        );
    }
    // Neither a draft nor an unlisted post may appear in the public list.
    app.repo.add_post(&author, "draft", "hidden body", false, true);
    app.repo.add_post(&author, "unlisted", "hidden body", true, false);

    let response = client
        .get(format!("{}/posts?page=1&pageSize=3", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "200-1");
    assert_eq!(body["msg"], "글 목록 조회가 완료되었습니다.");
    assert_eq!(body["data"]["currentPageNo"], 1);
    assert_eq!(body["data"]["totalItems"], 7);
    assert_eq!(body["data"]["totalPages"], 3);

    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 3);
    // Newest first.
    assert_eq!(items[0]["title"], "title7");
    // List items carry metadata only, never the post body.
    assert!(items[0].get("content").is_none());
    assert_eq!(items[0]["authorName"], "유저1");
}

#[tokio::test]
async fn test_public_list_keyword_search() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let author = app.repo.add_member("user1", "유저1", "user");
    app.repo.add_post(&author, "Rust pagination", "alpha", true, true);
    app.repo.add_post(&author, "cooking notes", "rust removal", true, true);
    app.repo.add_post(&author, "rust tips", "beta", true, true);

    // Title search is case-sensitive: "Rust" matches one title only.
    let body: Value = client
        .get(format!(
            "{}/posts?keywordType=title&keyword=Rust",
            app.address
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["totalItems"], 1);
    assert_eq!(body["data"]["items"][0]["title"], "Rust pagination");

    // Content search only looks at the body field.
    let body: Value = client
        .get(format!(
            "{}/posts?keywordType=content&keyword=rust",
            app.address
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["totalItems"], 1);
    assert_eq!(body["data"]["items"][0]["title"], "cooking notes");

    // Uppercase keywordType spellings are accepted as aliases.
    let body: Value = client
        .get(format!(
            "{}/posts?keywordType=CONTENT&keyword=rust",
            app.address
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["totalItems"], 1);
    assert_eq!(body["data"]["items"][0]["title"], "cooking notes");
}

#[tokio::test]
async fn test_my_posts_include_drafts() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let author = app.repo.add_member("user1", "유저1", "user");
    let other = app.repo.add_member("user2", "유저2", "user");
    app.repo.add_post(&author, "public", "body", true, true);
    app.repo.add_post(&author, "draft", "body", false, false);
    app.repo.add_post(&other, "someone else", "body", true, true);

    let body: Value = client
        .get(format!("{}/posts/mine", app.address))
        .bearer_auth(app.token_for(&author))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["code"], "200-1");
    assert_eq!(body["msg"], "내 글 목록 조회가 완료되었습니다.");
    // The owner sees drafts and unlisted posts, but nobody else's posts.
    assert_eq!(body["data"]["totalItems"], 2);
}

#[tokio::test]
async fn test_my_posts_require_token() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/posts/mine", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "401-1");
    assert_eq!(body["msg"], "잘못된 인증키입니다.");
}

#[tokio::test]
async fn test_get_post_published_needs_no_token() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let author = app.repo.add_member("user1", "유저1", "user");
    let post = app.repo.add_post(&author, "hello", "world", true, true);

    let response = client
        .get(format!("{}/posts/{}", app.address, post.id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "200-1");
    assert_eq!(body["msg"], format!("{}번 글을 조회하였습니다.", post.id));
    assert_eq!(body["data"]["content"], "world");
    assert_eq!(body["data"]["authorId"], author.id);
}

#[tokio::test]
async fn test_get_post_not_found() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/posts/-1", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "404-1");
    assert_eq!(body["msg"], "존재하지 않는 글입니다.");
}

#[tokio::test]
async fn test_get_private_post_access_rules() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let author = app.repo.add_member("user1", "유저1", "user");
    let stranger = app.repo.add_member("user2", "유저2", "user");
    let admin = app.repo.add_member("admin", "관리자", "admin");
    let post = app.repo.add_post(&author, "secret", "hidden", false, false);

    // Anonymous: the private branch demands a token.
    let response = client
        .get(format!("{}/posts/{}", app.address, post.id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "401-1");

    // Stranger: authenticated but denied by the policy.
    let response = client
        .get(format!("{}/posts/{}", app.address, post.id))
        .bearer_auth(app.token_for(&stranger))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "403-1");
    assert_eq!(body["msg"], "비공개 설정된 글입니다.");

    // Author and admin both read it.
    for member in [&author, &admin] {
        let response = client
            .get(format!("{}/posts/{}", app.address, post.id))
            .bearer_auth(app.token_for(member))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
    }
}

#[tokio::test]
async fn test_write_post() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let author = app.repo.add_member("user1", "유저1", "user");

    let response = client
        .post(format!("{}/posts", app.address))
        .bearer_auth(app.token_for(&author))
        .json(&json!({
            "title": "새로운 글 제목",
            "content": "새로운 글 내용",
            "published": true,
            "listed": true
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "201-1");
    let id = body["data"]["id"].as_i64().unwrap();
    assert_eq!(body["msg"], format!("{}번 글 작성이 완료되었습니다.", id));
    assert_eq!(body["data"]["title"], "새로운 글 제목");
    assert_eq!(body["data"]["authorId"], author.id);
    assert_eq!(body["data"]["published"], true);
}

#[tokio::test]
async fn test_write_post_rejects_bad_token() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/posts", app.address))
        .bearer_auth("WRONG_ACCESS_TOKEN")
        .json(&json!({ "title": "t", "content": "c" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "401-1");
    assert_eq!(body["msg"], "잘못된 인증키입니다.");
}

#[tokio::test]
async fn test_write_post_validates_blank_fields() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let author = app.repo.add_member("user1", "유저1", "user");

    let response = client
        .post(format!("{}/posts", app.address))
        .bearer_auth(app.token_for(&author))
        .json(&json!({ "title": "", "content": "" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "400-1");
    assert_eq!(
        body["msg"],
        "content : NotBlank : must not be blank\ntitle : NotBlank : must not be blank"
    );
}

#[tokio::test]
async fn test_modify_post_author_only() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let author = app.repo.add_member("user1", "유저1", "user");
    let stranger = app.repo.add_member("user2", "유저2", "user");
    let admin = app.repo.add_member("admin", "관리자", "admin");
    let post = app.repo.add_post(&author, "old title", "old content", true, true);

    // Stranger is denied.
    let response = client
        .put(format!("{}/posts/{}", app.address, post.id))
        .bearer_auth(app.token_for(&stranger))
        .json(&json!({ "title": "hijack", "content": "hijack" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "403-1");
    assert_eq!(body["msg"], "자신이 작성한 글만 수정 가능합니다.");

    // Admins are not exempt from the author-only rule.
    let response = client
        .put(format!("{}/posts/{}", app.address, post.id))
        .bearer_auth(app.token_for(&admin))
        .json(&json!({ "title": "hijack", "content": "hijack" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    // The author succeeds.
    let response = client
        .put(format!("{}/posts/{}", app.address, post.id))
        .bearer_auth(app.token_for(&author))
        .json(&json!({ "title": "new title", "content": "new content" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "200-1");
    assert_eq!(
        body["msg"],
        format!("{}번 글 수정이 완료되었습니다.", post.id)
    );
    assert_eq!(body["data"]["title"], "new title");
}

#[tokio::test]
async fn test_modify_post_validates_blank_fields() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let author = app.repo.add_member("user1", "유저1", "user");
    let post = app.repo.add_post(&author, "old", "old", true, true);

    let response = client
        .put(format!("{}/posts/{}", app.address, post.id))
        .bearer_auth(app.token_for(&author))
        .json(&json!({ "title": "", "content": "" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "400-1");
    assert_eq!(
        body["msg"],
        "content : NotBlank : must not be blank\ntitle : NotBlank : must not be blank"
    );
}

#[tokio::test]
async fn test_delete_post_owner_or_admin() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let author = app.repo.add_member("user1", "유저1", "user");
    let stranger = app.repo.add_member("user2", "유저2", "user");
    let admin = app.repo.add_member("admin", "관리자", "admin");
    let first = app.repo.add_post(&author, "one", "body", true, true);
    let second = app.repo.add_post(&author, "two", "body", true, true);

    // Stranger is denied.
    let response = client
        .delete(format!("{}/posts/{}", app.address, first.id))
        .bearer_auth(app.token_for(&stranger))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["msg"], "자신이 작성한 글만 삭제 가능합니다.");

    // The author deletes their own post; the envelope carries no data.
    let response = client
        .delete(format!("{}/posts/{}", app.address, first.id))
        .bearer_auth(app.token_for(&author))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "200-1");
    assert_eq!(
        body["msg"],
        format!("{}번 글 삭제가 완료되었습니다.", first.id)
    );
    assert!(body.get("data").is_none());

    // An admin may delete any member's post.
    let response = client
        .delete(format!("{}/posts/{}", app.address, second.id))
        .bearer_auth(app.token_for(&admin))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    // Both are gone.
    let response = client
        .get(format!("{}/posts/{}", app.address, second.id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_statistics_admin_only() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let user = app.repo.add_member("user1", "유저1", "user");
    let admin = app.repo.add_member("admin", "관리자", "admin");
    app.repo.add_post(&user, "a", "body", true, true);
    app.repo.add_post(&user, "b", "body", true, false);
    app.repo.add_post(&user, "c", "body", false, false);

    // Regular member is refused.
    let response = client
        .get(format!("{}/posts/statistics", app.address))
        .bearer_auth(app.token_for(&user))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "403-1");
    assert_eq!(body["msg"], "접근 권한이 없습니다.");

    // Admin gets the counters.
    let response = client
        .get(format!("{}/posts/statistics", app.address))
        .bearer_auth(app.token_for(&admin))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "200-1");
    assert_eq!(body["msg"], "통계 조회가 완료되었습니다.");
    assert_eq!(body["data"]["postCount"], 3);
    assert_eq!(body["data"]["postPublishedCount"], 2);
    assert_eq!(body["data"]["postListedCount"], 1);
}

#[tokio::test]
async fn test_forged_token_is_rejected() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let member = app.repo.add_member("user1", "유저1", "user");
    let forged = create_token("some-other-secret", member.id, 3600).unwrap();

    let response = client
        .get(format!("{}/posts/mine", app.address))
        .bearer_auth(forged)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "401-1");
    assert_eq!(body["msg"], "잘못된 인증키입니다.");
}

#[tokio::test]
async fn test_token_for_deleted_member_is_rejected() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    // Valid signature, but the subject never existed in the store.
    let ghost_token = create_token(&app.config.jwt_secret, 9999, 3600).unwrap();

    let response = client
        .get(format!("{}/posts/mine", app.address))
        .bearer_auth(ghost_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}
