//! In-process store used when no `DATABASE_URL` is configured, and by tests.
//!
//! All tables sit behind one `RwLock`; every mutation, cascades included,
//! runs under a single write guard and is therefore atomic.

use std::{cmp::Reverse, collections::HashMap, sync::Arc};

use anyhow::anyhow;
use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    auth::{
        repo::UserRepo,
        repo_types::{NewUser, User, UserChanges},
    },
    comments::{
        repo::CommentRepo,
        repo_types::{CommentRow, NewComment},
    },
    error::StoreError,
    messages,
    schedules::{
        repo::ScheduleRepo,
        repo_types::{NewSchedule, ScheduleChanges, ScheduleRow, ScheduleSummaryRow},
    },
};

#[derive(Debug, Clone)]
struct ScheduleRecord {
    id: Uuid,
    owner_id: Uuid,
    title: String,
    contents: String,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
    // tie-breaker for equal timestamps
    touched: u64,
}

#[derive(Debug, Clone)]
struct CommentRecord {
    id: Uuid,
    schedule_id: Uuid,
    owner_id: Uuid,
    contents: String,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
    created_seq: u64,
}

#[derive(Default)]
struct Tables {
    seq: u64,
    users: HashMap<Uuid, User>,
    schedules: HashMap<Uuid, ScheduleRecord>,
    comments: HashMap<Uuid, CommentRecord>,
}

impl Tables {
    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    fn username(&self, id: Uuid) -> Result<String, StoreError> {
        self.users
            .get(&id)
            .map(|u| u.username.clone())
            .ok_or_else(|| StoreError::Backend(anyhow!("dangling owner reference {id}")))
    }

    fn schedule_row(&self, r: &ScheduleRecord) -> Result<ScheduleRow, StoreError> {
        Ok(ScheduleRow {
            id: r.id,
            owner_id: r.owner_id,
            owner_name: self.username(r.owner_id)?,
            title: r.title.clone(),
            contents: r.contents.clone(),
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }

    fn summary_row(&self, r: &ScheduleRecord) -> Result<ScheduleSummaryRow, StoreError> {
        let comment_count = self
            .comments
            .values()
            .filter(|c| c.schedule_id == r.id)
            .count() as i64;
        Ok(ScheduleSummaryRow {
            id: r.id,
            owner_name: self.username(r.owner_id)?,
            title: r.title.clone(),
            contents: r.contents.clone(),
            created_at: r.created_at,
            updated_at: r.updated_at,
            comment_count,
        })
    }

    fn comment_row(&self, r: &CommentRecord) -> Result<CommentRow, StoreError> {
        Ok(CommentRow {
            id: r.id,
            schedule_id: r.schedule_id,
            owner_id: r.owner_id,
            owner_name: self.username(r.owner_id)?,
            contents: r.contents.clone(),
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }

    /// Schedules matching `keep`, most recently updated first.
    fn sorted_schedules<F>(&self, keep: F) -> Vec<&ScheduleRecord>
    where
        F: Fn(&ScheduleRecord) -> bool,
    {
        let mut out: Vec<&ScheduleRecord> = self.schedules.values().filter(|s| keep(s)).collect();
        out.sort_by_key(|s| Reverse((s.updated_at, s.touched)));
        out
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        let mut t = self.inner.write().await;
        if t.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict(messages::EMAIL_TAKEN.into()));
        }
        let now = OffsetDateTime::now_utc();
        let row = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        };
        t.users.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let t = self.inner.read().await;
        Ok(t.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let t = self.inner.read().await;
        Ok(t.users.get(&id).cloned())
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>, StoreError> {
        let mut t = self.inner.write().await;
        let Some(user) = t.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(username) = changes.username {
            user.username = username;
        }
        if let Some(hash) = changes.password_hash {
            user.password_hash = hash;
        }
        user.updated_at = OffsetDateTime::now_utc();
        Ok(Some(user.clone()))
    }

    async fn delete_cascade(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut t = self.inner.write().await;
        if !t.users.contains_key(&id) {
            return Ok(false);
        }
        let owned: Vec<Uuid> = t
            .schedules
            .values()
            .filter(|s| s.owner_id == id)
            .map(|s| s.id)
            .collect();
        t.comments
            .retain(|_, c| c.owner_id != id && !owned.contains(&c.schedule_id));
        t.schedules.retain(|_, s| s.owner_id != id);
        t.users.remove(&id);
        Ok(true)
    }
}

#[async_trait]
impl ScheduleRepo for MemoryStore {
    async fn insert(&self, schedule: NewSchedule) -> Result<ScheduleRow, StoreError> {
        let mut t = self.inner.write().await;
        if !t.users.contains_key(&schedule.owner_id) {
            return Err(StoreError::Backend(anyhow!(
                "owner {} does not exist",
                schedule.owner_id
            )));
        }
        let now = OffsetDateTime::now_utc();
        let touched = t.next_seq();
        let record = ScheduleRecord {
            id: Uuid::new_v4(),
            owner_id: schedule.owner_id,
            title: schedule.title,
            contents: schedule.contents,
            created_at: now,
            updated_at: now,
            touched,
        };
        let row = t.schedule_row(&record)?;
        t.schedules.insert(record.id, record);
        Ok(row)
    }

    async fn find(&self, id: Uuid) -> Result<Option<ScheduleRow>, StoreError> {
        let t = self.inner.read().await;
        let row = t.schedules.get(&id).map(|r| t.schedule_row(r)).transpose()?;
        Ok(row)
    }

    async fn list(&self) -> Result<Vec<ScheduleSummaryRow>, StoreError> {
        let t = self.inner.read().await;
        let rows = t
            .sorted_schedules(|_| true)
            .into_iter()
            .map(|r| t.summary_row(r))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<ScheduleSummaryRow>, StoreError> {
        let t = self.inner.read().await;
        let rows = t
            .sorted_schedules(|s| s.owner_id == owner_id)
            .into_iter()
            .map(|r| t.summary_row(r))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    async fn page(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<ScheduleSummaryRow>, i64), StoreError> {
        let t = self.inner.read().await;
        let all = t.sorted_schedules(|_| true);
        let total = all.len() as i64;
        let rows = all
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .map(|r| t.summary_row(r))
            .collect::<Result<Vec<_>, _>>()?;
        Ok((rows, total))
    }

    async fn update(
        &self,
        id: Uuid,
        changes: ScheduleChanges,
    ) -> Result<Option<ScheduleRow>, StoreError> {
        let mut t = self.inner.write().await;
        let touched = t.next_seq();
        let Some(record) = t.schedules.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(title) = changes.title {
            record.title = title;
        }
        if let Some(contents) = changes.contents {
            record.contents = contents;
        }
        record.updated_at = OffsetDateTime::now_utc();
        record.touched = touched;
        let record = record.clone();
        t.schedule_row(&record).map(Some)
    }

    async fn delete_cascade(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut t = self.inner.write().await;
        if t.schedules.remove(&id).is_none() {
            return Ok(false);
        }
        t.comments.retain(|_, c| c.schedule_id != id);
        Ok(true)
    }
}

#[async_trait]
impl CommentRepo for MemoryStore {
    async fn insert(&self, comment: NewComment) -> Result<CommentRow, StoreError> {
        let mut t = self.inner.write().await;
        if !t.schedules.contains_key(&comment.schedule_id) {
            return Err(StoreError::Backend(anyhow!(
                "schedule {} does not exist",
                comment.schedule_id
            )));
        }
        let now = OffsetDateTime::now_utc();
        let created_seq = t.next_seq();
        let record = CommentRecord {
            id: Uuid::new_v4(),
            schedule_id: comment.schedule_id,
            owner_id: comment.owner_id,
            contents: comment.contents,
            created_at: now,
            updated_at: now,
            created_seq,
        };
        let row = t.comment_row(&record)?;
        t.comments.insert(record.id, record);
        Ok(row)
    }

    async fn find(&self, id: Uuid) -> Result<Option<CommentRow>, StoreError> {
        let t = self.inner.read().await;
        let row = t.comments.get(&id).map(|r| t.comment_row(r)).transpose()?;
        Ok(row)
    }

    async fn list_by_schedule(&self, schedule_id: Uuid) -> Result<Vec<CommentRow>, StoreError> {
        let t = self.inner.read().await;
        let mut records: Vec<&CommentRecord> = t
            .comments
            .values()
            .filter(|c| c.schedule_id == schedule_id)
            .collect();
        records.sort_by_key(|c| (c.created_at, c.created_seq));
        let rows = records
            .into_iter()
            .map(|r| t.comment_row(r))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    async fn update(&self, id: Uuid, contents: String) -> Result<Option<CommentRow>, StoreError> {
        let mut t = self.inner.write().await;
        let Some(record) = t.comments.get_mut(&id) else {
            return Ok(None);
        };
        record.contents = contents;
        record.updated_at = OffsetDateTime::now_utc();
        let record = record.clone();
        t.comment_row(&record).map(Some)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut t = self.inner.write().await;
        Ok(t.comments.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn user(store: &MemoryStore, name: &str, email: &str) -> User {
        UserRepo::insert(
            store,
            NewUser {
                username: name.into(),
                email: email.into(),
                password_hash: "hash".into(),
            },
        )
        .await
        .unwrap()
    }

    async fn schedule(store: &MemoryStore, owner: Uuid, title: &str) -> ScheduleRow {
        ScheduleRepo::insert(
            store,
            NewSchedule {
                owner_id: owner,
                title: title.into(),
                contents: "body".into(),
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let store = MemoryStore::new();
        user(&store, "alice", "a@x.com").await;
        let err = UserRepo::insert(
            &store,
            NewUser {
                username: "eve".into(),
                email: "a@x.com".into(),
                password_hash: "h".into(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn update_moves_schedule_to_front() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice", "a@x.com").await;
        let first = schedule(&store, alice.id, "first").await;
        schedule(&store, alice.id, "second").await;

        ScheduleRepo::update(
            &store,
            first.id,
            ScheduleChanges {
                title: Some("again".into()),
                contents: None,
            },
        )
        .await
        .unwrap()
        .unwrap();

        let listed = ScheduleRepo::list(&store).await.unwrap();
        assert_eq!(listed[0].id, first.id);
        assert_eq!(listed[0].title, "again");
        assert_eq!(listed[0].contents, "body");
    }

    #[tokio::test]
    async fn user_cascade_leaves_no_orphans() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice", "a@x.com").await;
        let bob = user(&store, "bob", "b@x.com").await;
        let a_sched = schedule(&store, alice.id, "a").await;
        let b_sched = schedule(&store, bob.id, "b").await;
        for (sched, author) in [(a_sched.id, bob.id), (b_sched.id, alice.id), (b_sched.id, bob.id)] {
            CommentRepo::insert(
                &store,
                NewComment {
                    schedule_id: sched,
                    owner_id: author,
                    contents: "hi".into(),
                },
            )
            .await
            .unwrap();
        }

        assert!(UserRepo::delete_cascade(&store, alice.id).await.unwrap());

        assert!(ScheduleRepo::find(&store, a_sched.id).await.unwrap().is_none());
        assert!(CommentRepo::list_by_schedule(&store, a_sched.id)
            .await
            .unwrap()
            .is_empty());
        let remaining = CommentRepo::list_by_schedule(&store, b_sched.id).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].owner_id, bob.id);
        assert!(!UserRepo::delete_cascade(&store, alice.id).await.unwrap());
    }

    #[tokio::test]
    async fn page_reports_total() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice", "a@x.com").await;
        for i in 0..3 {
            schedule(&store, alice.id, &format!("s{i}")).await;
        }
        let (rows, total) = ScheduleRepo::page(&store, 2, 2).await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title, "s0");
    }
}
