use crate::db::LogEntry;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LogEntryDto {
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

impl From<LogEntry> for LogEntryDto {
    fn from(entry: LogEntry) -> Self {
        Self {
            mtype: entry.mtype,
            title: entry.title,
            year: entry.year,
            path: entry.path,
            season: entry.season,
            episode: entry.episode,
            image: entry.image,
            del_time: entry.del_time,
            unique_key: entry.unique_key,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ClearedDto {
    pub removed: u64,
}
