//! Post access policy.
//!
//! Pure predicates over (actor, post). No side effects: each function either
//! returns Ok or the Forbidden error carrying the message the API surfaces.
//! Handlers resolve the actor once (via the `AuthUser` extractor) and pass
//! it in explicitly; the policy never reaches into ambient request state.

use crate::{auth::AuthUser, error::ServiceError, models::Post};

/// Whether `actor` may view the post's content.
///
/// Published posts are readable by anyone; private posts only by their
/// author or an admin.
pub fn can_access(actor: &AuthUser, post: &Post) -> Result<(), ServiceError> {
    if post.published || actor.id == post.author_id || actor.is_admin() {
        return Ok(());
    }
    Err(ServiceError::Forbidden("비공개 설정된 글입니다.".to_string()))
}

/// Whether `actor` may modify the post. Author only; admins are not exempt.
pub fn can_modify(actor: &AuthUser, post: &Post) -> Result<(), ServiceError> {
    if actor.id == post.author_id {
        return Ok(());
    }
    Err(ServiceError::Forbidden(
        "자신이 작성한 글만 수정 가능합니다.".to_string(),
    ))
}

/// Whether `actor` may delete the post. Author or admin.
pub fn can_delete(actor: &AuthUser, post: &Post) -> Result<(), ServiceError> {
    if actor.id == post.author_id || actor.is_admin() {
        return Ok(());
    }
    Err(ServiceError::Forbidden(
        "자신이 작성한 글만 삭제 가능합니다.".to_string(),
    ))
}
