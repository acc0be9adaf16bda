use sea_orm::entity::prelude::*;

/// Transfer-history rows are created by the external transfer pipeline; this
/// service only reads and deletes them.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "transfer_history")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    pub tmdbid: Option<i64>,
    pub year: Option<String>,
    /// `Movie` or `TV`.
    pub mtype: String,
    /// Season label, `S{nn}`.
    pub season: Option<String>,
    /// Episode label, `E{nn}`.
    pub episode: Option<String>,
    /// Original file in the download area.
    pub src: Option<String>,
    /// Library-side hard link / destination file.
    pub dest: Option<String>,
    /// Links the source file back to a download task.
    pub download_hash: Option<String>,
    pub image: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
