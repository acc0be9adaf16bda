use crate::entities::{prelude::*, transfer_history};
use anyhow::Result;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};

pub struct TransferHistoryRepository {
    conn: DatabaseConnection,
}

/// Composite lookup key; `None` fields are not filtered on. The resolver
/// decides which combination applies to a given deletion.
#[derive(Debug, Clone, Default)]
pub struct TransferQuery {
    pub tmdbid: Option<i64>,
    pub mtype: Option<String>,
    pub season: Option<String>,
    pub episode: Option<String>,
    pub dest: Option<String>,
}

impl TransferHistoryRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn map_model(r: transfer_history::Model) -> TransferRecord {
        TransferRecord {
            id: r.id,
            title: r.title,
            tmdbid: r.tmdbid,
            year: r.year,
            mtype: r.mtype,
            season: r.season,
            episode: r.episode,
            src: r.src,
            dest: r.dest,
            download_hash: r.download_hash,
            image: r.image,
        }
    }

    pub async fn find_by(&self, query: &TransferQuery) -> Result<Vec<TransferRecord>> {
        let mut find = TransferHistory::find();

        if let Some(tmdbid) = query.tmdbid {
            find = find.filter(transfer_history::Column::Tmdbid.eq(tmdbid));
        }
        if let Some(mtype) = &query.mtype {
            find = find.filter(transfer_history::Column::Mtype.eq(mtype));
        }
        if let Some(season) = &query.season {
            find = find.filter(transfer_history::Column::Season.eq(season));
        }
        if let Some(episode) = &query.episode {
            find = find.filter(transfer_history::Column::Episode.eq(episode));
        }
        if let Some(dest) = &query.dest {
            find = find.filter(transfer_history::Column::Dest.eq(dest));
        }

        let rows = find
            .order_by_asc(transfer_history::Column::Id)
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(Self::map_model).collect())
    }

    pub async fn delete(&self, id: i32) -> Result<()> {
        TransferHistory::delete_by_id(id).exec(&self.conn).await?;
        Ok(())
    }

    /// Inserts a row the way the external transfer pipeline would. Used by
    /// tooling and tests; the sync path itself never creates records.
    pub async fn insert(&self, record: NewTransferRecord) -> Result<i32> {
        let active_model = transfer_history::ActiveModel {
            title: Set(record.title),
            tmdbid: Set(record.tmdbid),
            year: Set(record.year),
            mtype: Set(record.mtype),
            season: Set(record.season),
            episode: Set(record.episode),
            src: Set(record.src),
            dest: Set(record.dest),
            download_hash: Set(record.download_hash),
            image: Set(record.image),
            ..Default::default()
        };

        let result = TransferHistory::insert(active_model)
            .exec(&self.conn)
            .await?;
        Ok(result.last_insert_id)
    }
}

#[derive(Debug, Clone)]
pub struct TransferRecord {
    pub id: i32,
    pub title: String,
    pub tmdbid: Option<i64>,
    pub year: Option<String>,
    pub mtype: String,
    pub season: Option<String>,
    pub episode: Option<String>,
    pub src: Option<String>,
    pub dest: Option<String>,
    pub download_hash: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct NewTransferRecord {
    pub title: String,
    pub tmdbid: Option<i64>,
    pub year: Option<String>,
    pub mtype: String,
    pub season: Option<String>,
    pub episode: Option<String>,
    pub src: Option<String>,
    pub dest: Option<String>,
    pub download_hash: Option<String>,
    pub image: Option<String>,
}
