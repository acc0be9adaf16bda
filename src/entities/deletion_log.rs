use sea_orm::entity::prelude::*;

/// Append-only record of completed deletion cascades, shown to the user and
/// deletable only through the explicit per-entry action.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "deletion_log")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub mtype: String,
    pub title: String,
    pub year: Option<String>,
    pub path: String,
    pub season: Option<String>,
    pub episode: Option<String>,
    pub image: Option<String>,
    pub del_time: String,
    /// Composite key `name:tmdbid:timestamp`; only ever used to delete this
    /// entry, never to look up transfer records.
    #[sea_orm(unique)]
    pub unique_key: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
