use crate::entities::{deletion_log, prelude::*};
use anyhow::Result;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};

pub struct DeletionLogRepository {
    conn: DatabaseConnection,
}

impl DeletionLogRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn map_model(r: deletion_log::Model) -> LogEntry {
        LogEntry {
            id: r.id,
            mtype: r.mtype,
            title: r.title,
            year: r.year,
            path: r.path,
            season: r.season,
            episode: r.episode,
            image: r.image,
            del_time: r.del_time,
            unique_key: r.unique_key,
        }
    }

    pub async fn append(&self, entry: NewLogEntry) -> Result<()> {
        let active_model = deletion_log::ActiveModel {
            mtype: Set(entry.mtype),
            title: Set(entry.title),
            year: Set(entry.year),
            path: Set(entry.path),
            season: Set(entry.season),
            episode: Set(entry.episode),
            image: Set(entry.image),
            del_time: Set(entry.del_time),
            unique_key: Set(entry.unique_key),
            ..Default::default()
        };

        DeletionLog::insert(active_model)
            .exec_without_returning(&self.conn)
            .await?;
        Ok(())
    }

    /// All entries, newest deletion first.
    pub async fn list(&self) -> Result<Vec<LogEntry>> {
        let rows = DeletionLog::find()
            .order_by_desc(deletion_log::Column::DelTime)
            .order_by_desc(deletion_log::Column::Id)
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(Self::map_model).collect())
    }

    /// Removes the entry with the given composite key. Returns false when no
    /// such entry exists.
    pub async fn delete_by_unique(&self, unique_key: &str) -> Result<bool> {
        let result = DeletionLog::delete_many()
            .filter(deletion_log::Column::UniqueKey.eq(unique_key))
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected > 0)
    }

    pub async fn clear(&self) -> Result<u64> {
        let result = DeletionLog::delete_many().exec(&self.conn).await?;
        Ok(result.rows_affected)
    }
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub id: i32,
    pub mtype: String,
    pub title: String,
    pub year: Option<String>,
    pub path: String,
    pub season: Option<String>,
    pub episode: Option<String>,
    pub image: Option<String>,
    pub del_time: String,
    pub unique_key: String,
}

#[derive(Debug, Clone, Default)]
pub struct NewLogEntry {
    pub mtype: String,
    pub title: String,
    pub year: Option<String>,
    pub path: String,
    pub season: Option<String>,
    pub episode: Option<String>,
    pub image: Option<String>,
    pub del_time: String,
    pub unique_key: String,
}
