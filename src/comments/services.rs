use tracing::info;
use uuid::Uuid;

use crate::{
    comments::repo_types::{CommentRow, NewComment},
    error::AppError,
    messages::{self, NOT_AUTHOR_DELETE, NOT_AUTHOR_UPDATE},
    ownership::ensure_owner,
    schedules::{
        dto::ScheduleResponse,
        services::{find_or_404, with_comments},
    },
    state::AppState,
};

/// Loads a comment addressed through `schedule_id`; a comment that lives
/// under another schedule is treated as missing.
async fn find_in_schedule(
    st: &AppState,
    schedule_id: Uuid,
    comment_id: Uuid,
) -> Result<CommentRow, AppError> {
    find_or_404(st, schedule_id).await?;
    st.comments
        .find(comment_id)
        .await?
        .filter(|c| c.schedule_id == schedule_id)
        .ok_or_else(|| AppError::NotFound(messages::not_found(comment_id)))
}

pub async fn create(
    st: &AppState,
    schedule_id: Uuid,
    owner_id: Uuid,
    contents: &str,
) -> Result<ScheduleResponse, AppError> {
    st.users
        .find_by_id(owner_id)
        .await?
        .ok_or_else(|| AppError::NotFound(messages::not_found(owner_id)))?;
    let schedule = find_or_404(st, schedule_id).await?;

    let comment = st
        .comments
        .insert(NewComment {
            schedule_id,
            owner_id,
            contents: contents.to_string(),
        })
        .await?;
    info!(comment_id = %comment.id, %schedule_id, "comment created");
    with_comments(st, schedule).await
}

pub async fn update(
    st: &AppState,
    schedule_id: Uuid,
    comment_id: Uuid,
    principal_id: Uuid,
    contents: &str,
) -> Result<ScheduleResponse, AppError> {
    let existing = find_in_schedule(st, schedule_id, comment_id).await?;
    ensure_owner(existing.owner_id, principal_id, NOT_AUTHOR_UPDATE)?;

    st.comments
        .update(comment_id, contents.to_string())
        .await?
        .ok_or_else(|| AppError::NotFound(messages::not_found(comment_id)))?;
    info!(%comment_id, "comment updated");
    let schedule = find_or_404(st, schedule_id).await?;
    with_comments(st, schedule).await
}

pub async fn delete(
    st: &AppState,
    schedule_id: Uuid,
    comment_id: Uuid,
    principal_id: Uuid,
) -> Result<(), AppError> {
    let existing = find_in_schedule(st, schedule_id, comment_id).await?;
    ensure_owner(existing.owner_id, principal_id, NOT_AUTHOR_DELETE)?;

    if !st.comments.delete(comment_id).await? {
        return Err(AppError::NotFound(messages::not_found(comment_id)));
    }
    info!(%comment_id, "comment deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{auth::services::sign_up, config::AppConfig, schedules::services as schedules};

    struct Fixture {
        st: AppState,
        alice: Uuid,
        bob: Uuid,
        schedule: Uuid,
    }

    async fn fixture() -> Fixture {
        let st = AppState::in_memory(AppConfig::default());
        let alice = sign_up(st.users.as_ref(), "alice", "pw1", "a@x.com")
            .await
            .unwrap()
            .id;
        let bob = sign_up(st.users.as_ref(), "bob", "pw2", "b@x.com")
            .await
            .unwrap()
            .id;
        let schedule = schedules::create(&st, alice, "plan", "body").await.unwrap().id;
        Fixture {
            st,
            alice,
            bob,
            schedule,
        }
    }

    #[tokio::test]
    async fn anyone_may_comment_and_comments_keep_creation_order() {
        let f = fixture().await;
        create(&f.st, f.schedule, f.bob, "first").await.unwrap();
        let resp = create(&f.st, f.schedule, f.alice, "second").await.unwrap();

        let texts: Vec<_> = resp.comments.iter().map(|c| c.contents.as_str()).collect();
        assert_eq!(texts, ["first", "second"]);
        assert_eq!(resp.comments[0].name, "bob");
    }

    #[tokio::test]
    async fn comment_on_missing_schedule_is_not_found() {
        let f = fixture().await;
        let err = create(&f.st, Uuid::new_v4(), f.bob, "hi").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn schedule_owner_cannot_edit_someone_elses_comment() {
        let f = fixture().await;
        let resp = create(&f.st, f.schedule, f.bob, "mine").await.unwrap();
        let comment_id = resp.comments[0].id;

        let err = update(&f.st, f.schedule, comment_id, f.alice, "hijack")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(ref m) if m == NOT_AUTHOR_UPDATE));
        let err = delete(&f.st, f.schedule, comment_id, f.alice)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let resp = update(&f.st, f.schedule, comment_id, f.bob, "edited")
            .await
            .unwrap();
        assert_eq!(resp.comments[0].contents, "edited");

        delete(&f.st, f.schedule, comment_id, f.bob).await.unwrap();
        assert!(schedules::get(&f.st, f.schedule).await.unwrap().comments.is_empty());
    }

    #[tokio::test]
    async fn comment_addressed_through_wrong_schedule_is_not_found() {
        let f = fixture().await;
        let other = schedules::create(&f.st, f.bob, "other", "c").await.unwrap().id;
        let comment_id = create(&f.st, f.schedule, f.bob, "x").await.unwrap().comments[0].id;

        let err = update(&f.st, other, comment_id, f.bob, "y").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn deleting_schedule_removes_its_comments() {
        let f = fixture().await;
        let comment_id = create(&f.st, f.schedule, f.bob, "x").await.unwrap().comments[0].id;

        schedules::delete(&f.st, f.schedule, f.alice).await.unwrap();
        assert!(f.st.comments.find(comment_id).await.unwrap().is_none());
    }
}
