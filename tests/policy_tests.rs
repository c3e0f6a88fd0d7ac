use blog_api::{ServiceError, auth::AuthUser, models::Post, policy};
use chrono::Utc;

// --- Fixtures ---

fn actor(id: i64, role: &str) -> AuthUser {
    AuthUser {
        id,
        role: role.to_string(),
    }
}

fn post(author_id: i64, published: bool) -> Post {
    let now = Utc::now();
    Post {
        id: 1,
        author_id,
        author_name: "author".to_string(),
        title: "title".to_string(),
        content: "content".to_string(),
        published,
        listed: true,
        created_date: now,
        modified_date: now,
    }
}

// --- can_access ---

#[test]
fn published_post_is_accessible_to_anyone() {
    let stranger = actor(99, "user");
    assert!(policy::can_access(&stranger, &post(1, true)).is_ok());
}

#[test]
fn private_post_is_denied_to_strangers() {
    let stranger = actor(99, "user");
    let err = policy::can_access(&stranger, &post(1, false)).unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));
    assert_eq!(err.to_string(), "비공개 설정된 글입니다.");
}

#[test]
fn private_post_is_accessible_to_author() {
    let author = actor(1, "user");
    assert!(policy::can_access(&author, &post(1, false)).is_ok());
}

#[test]
fn private_post_is_accessible_to_admin() {
    let admin = actor(99, "admin");
    assert!(policy::can_access(&admin, &post(1, false)).is_ok());
}

// --- can_modify ---

#[test]
fn author_may_modify_own_post() {
    let author = actor(1, "user");
    assert!(policy::can_modify(&author, &post(1, true)).is_ok());
}

#[test]
fn stranger_may_not_modify() {
    let stranger = actor(99, "user");
    let err = policy::can_modify(&stranger, &post(1, true)).unwrap_err();
    assert_eq!(err.to_string(), "자신이 작성한 글만 수정 가능합니다.");
}

#[test]
fn admin_may_not_modify_others_posts() {
    // Modification is author-only; the admin override applies to deletion,
    // not editing.
    let admin = actor(99, "admin");
    assert!(policy::can_modify(&admin, &post(1, true)).is_err());
}

// --- can_delete ---

#[test]
fn author_may_delete_own_post() {
    let author = actor(1, "user");
    assert!(policy::can_delete(&author, &post(1, true)).is_ok());
}

#[test]
fn admin_may_delete_any_post() {
    let admin = actor(99, "admin");
    assert!(policy::can_delete(&admin, &post(1, true)).is_ok());
}

#[test]
fn stranger_may_not_delete() {
    let stranger = actor(99, "user");
    let err = policy::can_delete(&stranger, &post(1, true)).unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));
    assert_eq!(err.to_string(), "자신이 작성한 글만 삭제 가능합니다.");
}

// --- error mapping ---

#[test]
fn forbidden_maps_to_403_1() {
    let stranger = actor(99, "user");
    let err = policy::can_delete(&stranger, &post(1, true)).unwrap_err();
    assert_eq!(err.code(), "403-1");
    assert_eq!(err.status(), axum::http::StatusCode::FORBIDDEN);
}
