//! Channel persistence.

use std::collections::{BTreeSet, HashMap};

use {anyhow::Result, async_trait::async_trait, sqlx::SqlitePool};

use crate::model::Channel;

/// Persistence for channels and their member rows.
#[async_trait]
pub trait ChannelStore: Send + Sync {
    async fn insert(&self, channel: &Channel) -> Result<()>;
    async fn update(&self, channel: &Channel) -> Result<()>;
    /// Returns `false` when no channel with that id existed.
    async fn delete(&self, id: &str) -> Result<bool>;
    async fn get(&self, id: &str) -> Result<Option<Channel>>;
    /// Channels the subject is a member of, newest first.
    async fn list_for_member(&self, subject_id: &str) -> Result<Vec<Channel>>;
}

/// Internal row type for sqlx mapping. Members live in their own table.
#[derive(sqlx::FromRow)]
struct ChannelRow {
    id: String,
    name: String,
    description: Option<String>,
    image_ref: Option<String>,
    creator_id: String,
    created_at: i64,
}

impl ChannelRow {
    fn into_channel(self, members: BTreeSet<String>) -> Channel {
        Channel {
            id: self.id,
            name: self.name,
            description: self.description,
            image_ref: self.image_ref,
            creator_id: self.creator_id,
            members,
            created_at: self.created_at,
        }
    }
}

/// SQLite-backed channel store.
pub struct SqliteChannelStore {
    pool: SqlitePool,
}

impl SqliteChannelStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Initialize the channel table schema.
    pub async fn init(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS channels (
                id          TEXT    PRIMARY KEY,
                name        TEXT    NOT NULL,
                description TEXT,
                image_ref   TEXT,
                creator_id  TEXT    NOT NULL,
                created_at  INTEGER NOT NULL
            )"#,
        )
        .execute(pool)
        .await?;
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS channel_members (
                channel_id TEXT NOT NULL,
                subject_id TEXT NOT NULL,
                PRIMARY KEY (channel_id, subject_id)
            )"#,
        )
        .execute(pool)
        .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_channel_members_subject \
             ON channel_members (subject_id)",
        )
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Member sets for the given channels, keyed by channel id.
    async fn members_for(
        &self,
        channel_ids: &[String],
    ) -> Result<HashMap<String, BTreeSet<String>>> {
        if channel_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let placeholders = vec!["?"; channel_ids.len()].join(", ");
        let sql = format!(
            "SELECT channel_id, subject_id FROM channel_members \
             WHERE channel_id IN ({placeholders})"
        );
        let mut query = sqlx::query_as::<_, (String, String)>(&sql);
        for id in channel_ids {
            query = query.bind(id);
        }
        let rows = query.fetch_all(&self.pool).await?;
        let mut members: HashMap<String, BTreeSet<String>> = HashMap::new();
        for (channel_id, subject_id) in rows {
            members.entry(channel_id).or_default().insert(subject_id);
        }
        Ok(members)
    }
}

#[async_trait]
impl ChannelStore for SqliteChannelStore {
    async fn insert(&self, channel: &Channel) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"INSERT INTO channels (id, name, description, image_ref, creator_id, created_at)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&channel.id)
        .bind(&channel.name)
        .bind(&channel.description)
        .bind(&channel.image_ref)
        .bind(&channel.creator_id)
        .bind(channel.created_at)
        .execute(&mut *tx)
        .await?;
        for member in &channel.members {
            sqlx::query("INSERT INTO channel_members (channel_id, subject_id) VALUES (?, ?)")
                .bind(&channel.id)
                .bind(member)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn update(&self, channel: &Channel) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("UPDATE channels SET name = ?, description = ?, image_ref = ? WHERE id = ?")
            .bind(&channel.name)
            .bind(&channel.description)
            .bind(&channel.image_ref)
            .bind(&channel.id)
            .execute(&mut *tx)
            .await?;
        // Member rows are replaced wholesale so the stored set always
        // mirrors the aggregate.
        sqlx::query("DELETE FROM channel_members WHERE channel_id = ?")
            .bind(&channel.id)
            .execute(&mut *tx)
            .await?;
        for member in &channel.members {
            sqlx::query("INSERT INTO channel_members (channel_id, subject_id) VALUES (?, ?)")
                .bind(&channel.id)
                .bind(member)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM channel_members WHERE channel_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM channels WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get(&self, id: &str) -> Result<Option<Channel>> {
        let row = sqlx::query_as::<_, ChannelRow>("SELECT * FROM channels WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        let mut members = self.members_for(std::slice::from_ref(&row.id)).await?;
        let set = members.remove(&row.id).unwrap_or_default();
        Ok(Some(row.into_channel(set)))
    }

    async fn list_for_member(&self, subject_id: &str) -> Result<Vec<Channel>> {
        let rows = sqlx::query_as::<_, ChannelRow>(
            r#"SELECT c.* FROM channels c
               JOIN channel_members m ON m.channel_id = c.id
               WHERE m.subject_id = ?
               ORDER BY c.created_at DESC, c.id"#,
        )
        .bind(subject_id)
        .fetch_all(&self.pool)
        .await?;
        let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
        let mut members = self.members_for(&ids).await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let set = members.remove(&row.id).unwrap_or_default();
                row.into_channel(set)
            })
            .collect())
    }
}
