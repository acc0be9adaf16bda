/// File extensions that mark a file as transferable media. Directory pruning
/// refuses to remove any tree still holding one of these.
pub const MEDIA_EXTENSIONS: &[&str] = &[
    "mkv", "mp4", "avi", "mov", "mpeg", "mpg", "wmv", "m4v", "flv", "ts", "m2ts", "iso", "rmvb",
    "strm", "webm",
];

/// Fallback notification image when neither the transfer record nor the image
/// lookup yields anything.
pub const DEFAULT_NOTIFICATION_ICON: &str = "https://emby.media/notificationicon.png";

pub mod tmdb {
    pub const IMAGE_BASE: &str = "https://image.tmdb.org";

    pub const DEFAULT_IMAGE_PREFIX: &str = "w500";
}

pub mod prune {
    /// How many ancestor directories a single pruning pass may remove.
    pub const MAX_ANCESTOR_LEVELS: usize = 3;
}
