use tracing::info;
use uuid::Uuid;

use crate::{
    comments::dto::CommentResponse,
    error::AppError,
    messages::{self, NOT_AUTHOR_DELETE, NOT_AUTHOR_UPDATE},
    ownership::ensure_owner,
    schedules::{
        dto::{PageResponse, ScheduleResponse, ScheduleSummary},
        repo_types::{NewSchedule, ScheduleChanges, ScheduleRow},
    },
    state::AppState,
};

pub(crate) async fn find_or_404(st: &AppState, id: Uuid) -> Result<ScheduleRow, AppError> {
    st.schedules
        .find(id)
        .await?
        .ok_or_else(|| AppError::NotFound(messages::not_found(id)))
}

/// Attaches the schedule's comments in creation order.
pub(crate) async fn with_comments(
    st: &AppState,
    row: ScheduleRow,
) -> Result<ScheduleResponse, AppError> {
    let comments = st
        .comments
        .list_by_schedule(row.id)
        .await?
        .into_iter()
        .map(CommentResponse::from)
        .collect();
    Ok(ScheduleResponse::new(row, comments))
}

pub async fn create(
    st: &AppState,
    owner_id: Uuid,
    title: &str,
    contents: &str,
) -> Result<ScheduleResponse, AppError> {
    st.users
        .find_by_id(owner_id)
        .await?
        .ok_or_else(|| AppError::NotFound(messages::not_found(owner_id)))?;

    let row = st
        .schedules
        .insert(NewSchedule {
            owner_id,
            title: title.trim().to_string(),
            contents: contents.to_string(),
        })
        .await?;
    info!(schedule_id = %row.id, %owner_id, "schedule created");
    Ok(ScheduleResponse::new(row, Vec::new()))
}

pub async fn list_all(st: &AppState) -> Result<Vec<ScheduleSummary>, AppError> {
    let rows = st.schedules.list().await?;
    Ok(rows.into_iter().map(ScheduleSummary::from).collect())
}

pub async fn list_mine(st: &AppState, owner_id: Uuid) -> Result<Vec<ScheduleSummary>, AppError> {
    let rows = st.schedules.list_by_owner(owner_id).await?;
    Ok(rows.into_iter().map(ScheduleSummary::from).collect())
}

/// `page_num` is 1-based.
pub async fn page(
    st: &AppState,
    page_num: u32,
    page_size: u32,
) -> Result<PageResponse<ScheduleSummary>, AppError> {
    let limit = i64::from(page_size);
    let offset = i64::from(page_num.saturating_sub(1)) * limit;
    let (rows, total) = st.schedules.page(limit, offset).await?;
    let items = rows.into_iter().map(ScheduleSummary::from).collect();
    Ok(PageResponse::new(items, page_num, page_size, total))
}

pub async fn get(st: &AppState, id: Uuid) -> Result<ScheduleResponse, AppError> {
    let row = find_or_404(st, id).await?;
    with_comments(st, row).await
}

pub async fn update(
    st: &AppState,
    id: Uuid,
    principal_id: Uuid,
    title: Option<&str>,
    contents: Option<&str>,
) -> Result<ScheduleResponse, AppError> {
    let existing = find_or_404(st, id).await?;
    ensure_owner(existing.owner_id, principal_id, NOT_AUTHOR_UPDATE)?;

    let changes = ScheduleChanges {
        title: title.map(|t| t.trim().to_string()),
        contents: contents.map(str::to_string),
    };
    let row = st
        .schedules
        .update(id, changes)
        .await?
        .ok_or_else(|| AppError::NotFound(messages::not_found(id)))?;
    info!(schedule_id = %id, "schedule updated");
    with_comments(st, row).await
}

pub async fn delete(st: &AppState, id: Uuid, principal_id: Uuid) -> Result<(), AppError> {
    let existing = find_or_404(st, id).await?;
    ensure_owner(existing.owner_id, principal_id, NOT_AUTHOR_DELETE)?;

    if !st.schedules.delete_cascade(id).await? {
        return Err(AppError::NotFound(messages::not_found(id)));
    }
    info!(schedule_id = %id, "schedule deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{auth::services::sign_up, config::AppConfig};

    async fn setup() -> (AppState, Uuid, Uuid) {
        let st = AppState::in_memory(AppConfig::default());
        let alice = sign_up(st.users.as_ref(), "alice", "pw1", "a@x.com")
            .await
            .unwrap();
        let bob = sign_up(st.users.as_ref(), "bob", "pw2", "b@x.com")
            .await
            .unwrap();
        (st, alice.id, bob.id)
    }

    #[tokio::test]
    async fn create_requires_existing_owner() {
        let st = AppState::in_memory(AppConfig::default());
        let err = create(&st, Uuid::new_v4(), "t", "c").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn only_owner_may_update_regardless_of_fields() {
        let (st, alice, bob) = setup().await;
        let s = create(&st, alice, "plan", "body").await.unwrap();

        for (title, contents) in [(Some("x"), None), (None, Some("y")), (None, None)] {
            let err = update(&st, s.id, bob, title, contents).await.unwrap_err();
            assert!(matches!(err, AppError::Forbidden(ref m) if m == NOT_AUTHOR_UPDATE));
        }
        let unchanged = get(&st, s.id).await.unwrap();
        assert_eq!(unchanged.title, "plan");

        let changed = update(&st, s.id, alice, Some("new"), None).await.unwrap();
        assert_eq!(changed.title, "new");
        assert_eq!(changed.contents, "body");
        assert_eq!(changed.name, "alice");
    }

    #[tokio::test]
    async fn only_owner_may_delete() {
        let (st, alice, bob) = setup().await;
        let s = create(&st, alice, "plan", "body").await.unwrap();

        let err = delete(&st, s.id, bob).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert!(get(&st, s.id).await.is_ok());

        delete(&st, s.id, alice).await.unwrap();
        let err = get(&st, s.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn missing_schedule_is_not_found_before_ownership() {
        let (st, alice, _) = setup().await;
        let err = update(&st, Uuid::new_v4(), alice, Some("x"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn pages_are_most_recently_updated_first() {
        let (st, alice, _) = setup().await;
        let mut ids = Vec::new();
        for i in 0..15 {
            ids.push(create(&st, alice, &format!("s{i}"), "c").await.unwrap().id);
        }

        let first = page(&st, 1, 10).await.unwrap();
        assert_eq!(first.items.len(), 10);
        assert_eq!(first.total_items, 15);
        assert_eq!(first.total_pages, 2);
        assert_eq!(first.items[0].id, ids[14]);
        assert_eq!(first.items[9].id, ids[5]);

        let second = page(&st, 2, 10).await.unwrap();
        assert_eq!(second.items.len(), 5);
        assert_eq!(second.items[4].id, ids[0]);
    }

    #[tokio::test]
    async fn list_mine_filters_by_owner() {
        let (st, alice, bob) = setup().await;
        create(&st, alice, "a1", "c").await.unwrap();
        create(&st, bob, "b1", "c").await.unwrap();
        create(&st, alice, "a2", "c").await.unwrap();

        let mine = list_mine(&st, alice).await.unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|s| s.name == "alice"));
        assert_eq!(list_all(&st).await.unwrap().len(), 3);
    }
}
