//! [`SyncDelService`] implementation over the sea-orm history store.

use crate::config::{SyncConfig, SyncType};
use crate::constants::DEFAULT_NOTIFICATION_ICON;
use crate::db::{
    DeletionLogRepository, LogEntry, NewLogEntry, TransferHistoryRepository, TransferQuery,
    TransferRecord,
};
use crate::domain::events::{EventBus, MediaEvent, Outcome, OutboundEvent};
use crate::domain::{DeletionRequest, EpisodeLabel, MediaKind, SeasonLabel};
use crate::kill_switch::KillSwitch;
use crate::library;
use crate::services::image::{MediaImageService, normalize_image_url};
use crate::services::notify::{DeletionNotice, Notifier, build_summary};
use crate::services::sync_service::{SyncDelService, SyncError};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

pub struct SeaOrmSyncDelService {
    sync: SyncConfig,
    transfers: TransferHistoryRepository,
    log: DeletionLogRepository,
    kill_switch: KillSwitch,
    images: Arc<dyn MediaImageService>,
    notifier: Arc<dyn Notifier>,
    event_bus: EventBus,
}

/// What the resolver found for one deletion.
struct Resolution {
    description: String,
    records: Vec<TransferRecord>,
}

#[async_trait::async_trait]
impl SyncDelService for SeaOrmSyncDelService {
    async fn handle_webhook_event(&self, event: &MediaEvent) -> Result<Outcome, SyncError> {
        if !self.active() || self.sync.sync_type != SyncType::Webhook {
            return Ok(Outcome::Ignored);
        }
        if event.event != "library.deleted" && event.event != "ItemDeleted" {
            return Ok(Outcome::Ignored);
        }

        let media_name = event.item_name.clone().unwrap_or_default();
        let media_path = event.item_path.clone().unwrap_or_default();

        if self.excluded(&media_path) {
            info!("{media_path} is under an excluded path, skipping deletion sync");
            return Ok(Outcome::Skipped {
                reason: "excluded path".to_string(),
            });
        }

        // Season deletions legitimately arrive without a tmdb id; everything
        // else needs one to match safely.
        if event.tmdb_id.is_none() && event.raw_media_type() != Some("Season") {
            error!("Deletion event for {media_name} carries no tmdb id, not syncing");
            return Ok(Outcome::Rejected {
                reason: "missing tmdb id".to_string(),
            });
        }

        self.sync_del(DeletionRequest {
            kind_raw: event.raw_media_type().unwrap_or_default().to_string(),
            name: media_name,
            path: media_path,
            tmdb_id: event.tmdb_id.clone(),
            season: event.season_id.clone(),
            episode: event.episode_id.clone(),
        })
        .await
    }

    async fn handle_scripter_event(&self, event: &MediaEvent) -> Result<Outcome, SyncError> {
        if !self.active() || self.sync.sync_type != SyncType::Plugin {
            return Ok(Outcome::Ignored);
        }
        if event.event != "media_del" {
            return Ok(Outcome::Ignored);
        }

        let Some(isvirtual) = event.item_isvirtual.as_deref() else {
            // An old scripter build that predates the isvirtual field would
            // feed us phantom deletions; shut the sync down until upgraded.
            error!(
                "Scripter payload has no item_isvirtual field, disabling deletion sync; upgrade the scripter plugin"
            );
            self.kill_switch
                .trip()
                .map_err(|e| SyncError::Internal(e.to_string()))?;
            return Ok(Outcome::Disabled);
        };
        if isvirtual == "True" {
            return Ok(Outcome::Ignored);
        }

        let media_name = event.item_name.clone().unwrap_or_default();
        let media_path = event.item_path.clone().unwrap_or_default();

        if self.excluded(&media_path) {
            info!("{media_path} is under an excluded path, skipping deletion sync");
            return Ok(Outcome::Skipped {
                reason: "excluded path".to_string(),
            });
        }

        let tmdb_ok = event
            .tmdb_id
            .as_deref()
            .is_some_and(|id| !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()));
        if !tmdb_ok {
            error!("Scripter deletion for {media_name} has no usable tmdb id, not syncing");
            return Ok(Outcome::Rejected {
                reason: "missing tmdb id".to_string(),
            });
        }

        self.sync_del(DeletionRequest {
            kind_raw: event.raw_media_type().unwrap_or_default().to_string(),
            name: media_name,
            path: media_path,
            tmdb_id: event.tmdb_id.clone(),
            season: event.season_id.clone(),
            episode: event.episode_id.clone(),
        })
        .await
    }

    async fn deletion_log(&self) -> Result<Vec<LogEntry>, SyncError> {
        self.log.list().await.map_err(SyncError::from)
    }

    async fn delete_log_entry(&self, unique_key: &str) -> Result<(), SyncError> {
        if self
            .log
            .delete_by_unique(unique_key)
            .await
            .map_err(SyncError::from)?
        {
            Ok(())
        } else {
            Err(SyncError::LogEntryNotFound(unique_key.to_string()))
        }
    }

    async fn clear_log(&self) -> Result<u64, SyncError> {
        self.log.clear().await.map_err(SyncError::from)
    }
}

impl SeaOrmSyncDelService {
    pub fn new(
        sync: SyncConfig,
        transfers: TransferHistoryRepository,
        log: DeletionLogRepository,
        kill_switch: KillSwitch,
        images: Arc<dyn MediaImageService>,
        notifier: Arc<dyn Notifier>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            sync,
            transfers,
            log,
            kill_switch,
            images,
            notifier,
            event_bus,
        }
    }

    fn active(&self) -> bool {
        self.sync.enabled && !self.kill_switch.is_tripped()
    }

    fn excluded(&self, media_path: &str) -> bool {
        !media_path.is_empty() && library::is_excluded(media_path, &self.sync.exclude_prefixes())
    }

    /// The cascade shared by both channels: remap the path, resolve transfer
    /// records, delete rows and files, then log and notify.
    async fn sync_del(&self, request: DeletionRequest) -> Result<Outcome, SyncError> {
        if request.kind_raw.is_empty() {
            error!(
                "Skipping deletion sync for {}: no media type on the event",
                request.name
            );
            return Ok(Outcome::Rejected {
                reason: "missing media type".to_string(),
            });
        }

        let mapped = library::remap_path(&request.path, &self.sync.path_mappings());

        // A path that is back on disk means a re-transfer, not a deletion.
        if !mapped.is_empty() && Path::new(&mapped).exists() {
            warn!("Transfer path {mapped} still present or regenerated, skipping");
            return Ok(Outcome::Skipped {
                reason: "path still present on disk".to_string(),
            });
        }

        let Some(resolution) = self.resolve(&request, &mapped).await? else {
            return Ok(Outcome::Rejected {
                reason: "unusable season/episode number".to_string(),
            });
        };

        info!("Syncing deletion of {}", resolution.description);

        if resolution.records.is_empty() {
            warn!(
                "{} {}: no matching transfer records; check the path mapping and tmdb id",
                request.kind_raw, request.name
            );
            return Ok(Outcome::Skipped {
                reason: "no matching transfer records".to_string(),
            });
        }
        let records = resolution.records;

        info!("Matched {} transfer records, deleting", records.len());

        let mut year: Option<String> = None;
        let mut image = DEFAULT_NOTIFICATION_ICON.to_string();
        let mut deleted_records = 0usize;
        // Populated only by a downloader feedback channel; downloader handling
        // is delegated to the DownloadFileDeleted consumer, so these stay empty.
        let deleted_torrents: Vec<String> = Vec::new();
        let paused_torrents: Vec<String> = Vec::new();
        let torrent_errors = 0usize;

        for record in &records {
            if !request.name.contains(&record.title) {
                warn!(
                    "Transfer record {} '{}' (tmdb {:?}) does not match deleted media '{}', skipping to avoid mis-deletion",
                    record.id, record.title, record.tmdbid, request.name
                );
                continue;
            }
            if let Some(img) = &record.image {
                image = normalize_image_url(img);
            }
            year = record.year.clone().or(year);

            self.transfers.delete(record.id).await?;
            deleted_records += 1;

            if self.sync.del_source {
                self.delete_files(record).await;
            }
        }

        info!("Deletion sync of {} complete", resolution.description);

        let kind = MediaKind::from_raw(&request.kind_raw);
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

        if self.sync.notify {
            let backdrop = self
                .images
                .backdrop(
                    request.tmdb_id.as_deref(),
                    kind,
                    request.season.as_deref(),
                    request.episode.as_deref(),
                )
                .await
                .unwrap_or_default()
                .unwrap_or_else(|| image.clone());

            let notice = DeletionNotice {
                title: "Media deletion sync complete".to_string(),
                text: build_summary(
                    &resolution.description,
                    records.len(),
                    &deleted_torrents,
                    &paused_torrents,
                    torrent_errors,
                    &timestamp,
                ),
                image: backdrop,
            };
            if let Err(e) = self.notifier.notify(&notice).await {
                warn!("Deletion notification failed: {e}");
            }
        }

        let poster = self
            .images
            .poster(request.tmdb_id.as_deref(), kind)
            .await
            .unwrap_or_default()
            .unwrap_or(image);

        let unique_key = format!(
            "{}:{}:{}",
            request.name,
            request.tmdb_id.as_deref().unwrap_or(""),
            timestamp
        );

        self.log
            .append(NewLogEntry {
                mtype: kind.as_str().to_string(),
                title: request.name.clone(),
                year,
                path: mapped,
                season: digits_or_none(request.season.as_deref()),
                episode: digits_or_none(request.episode.as_deref()),
                image: Some(poster),
                del_time: timestamp,
                unique_key,
            })
            .await?;

        Ok(Outcome::Completed { deleted_records })
    }

    /// Deletes the destination hard link and the source file, pruning emptied
    /// directories and signalling the downloader manager for tracked sources.
    /// File removals are best-effort.
    async fn delete_files(&self, record: &TransferRecord) {
        let Some(src) = record.src.as_deref() else {
            return;
        };
        if !library::is_media_file(Path::new(src)) {
            return;
        }

        if let Some(dest) = record.dest.as_deref() {
            let dest_path = Path::new(dest);
            if dest_path.exists() {
                if let Err(e) = tokio::fs::remove_file(dest_path).await {
                    warn!("Failed to remove destination file {dest}: {e}");
                }
                library::remove_empty_parents(dest_path).await;
            }
        }

        let src_path = Path::new(src);
        if src_path.exists() {
            info!("Removing source file {src}");
            if let Err(e) = tokio::fs::remove_file(src_path).await {
                warn!("Failed to remove source file {src}: {e}");
            } else {
                info!("Source file {src} removed");
            }
            library::remove_empty_parents(src_path).await;

            if let Some(hash) = &record.download_hash {
                info!("Notifying downloader manager: src {src}, download hash {hash}");
                let _ = self.event_bus.send(OutboundEvent::DownloadFileDeleted {
                    src: src.to_string(),
                    hash: hash.clone(),
                });
            }
        }
    }

    /// Picks the lookup strategy for the deletion tuple and runs it.
    /// `Ok(None)` means a season/episode field was present but not a usable
    /// number (already logged); an empty record set inside `Some` is the
    /// no-match case.
    async fn resolve(
        &self,
        request: &DeletionRequest,
        mapped_path: &str,
    ) -> Result<Option<Resolution>, SyncError> {
        let kind = MediaKind::from_raw(&request.kind_raw);
        let tmdb_num = request.tmdb_num();
        let tmdb_display = request.tmdb_id.as_deref().unwrap_or("");

        // A tmdb id we cannot parse must match nothing. Dropping the filter
        // instead would let a whole-series lookup sweep every TV record that
        // happens to pass the title guard.
        if request.tmdb_id.is_some() && tmdb_num.is_none() {
            warn!(
                "tmdb id '{tmdb_display}' on {} is not numeric, no transfer records can match",
                request.name
            );
            let noun = match kind {
                MediaKind::Movie => "movie",
                MediaKind::Tv => "series",
            };
            return Ok(Some(Resolution {
                description: format!("{noun} {} {tmdb_display}", request.name),
                records: Vec::new(),
            }));
        }

        let (description, query) =
            match (kind, request.season.as_deref(), request.episode.as_deref()) {
                (MediaKind::Movie, _, _) => (
                    format!("movie {} {tmdb_display}", request.name),
                    TransferQuery {
                        tmdbid: tmdb_num,
                        mtype: Some(MediaKind::Movie.as_str().to_string()),
                        dest: Some(mapped_path.to_string()),
                        ..TransferQuery::default()
                    },
                ),
                (MediaKind::Tv, None, None) => (
                    format!("series {} {tmdb_display}", request.name),
                    TransferQuery {
                        tmdbid: tmdb_num,
                        mtype: Some(MediaKind::Tv.as_str().to_string()),
                        ..TransferQuery::default()
                    },
                ),
                (MediaKind::Tv, Some(season), None) => {
                    let Some(season_label) = SeasonLabel::parse(season) else {
                        error!(
                            "Season deletion sync for {} failed: '{season}' is not a usable season number",
                            request.name
                        );
                        return Ok(None);
                    };
                    let description =
                        format!("series {} {season_label} {tmdb_display}", request.name);
                    let query = if tmdb_num.is_some() {
                        TransferQuery {
                            tmdbid: tmdb_num,
                            mtype: Some(MediaKind::Tv.as_str().to_string()),
                            season: Some(season_label.to_string()),
                            ..TransferQuery::default()
                        }
                    } else {
                        // Some webhook sources omit the tmdb id on season
                        // deletions; fall back to the destination path.
                        TransferQuery {
                            mtype: Some(MediaKind::Tv.as_str().to_string()),
                            season: Some(season_label.to_string()),
                            dest: Some(mapped_path.to_string()),
                            ..TransferQuery::default()
                        }
                    };
                    (description, query)
                }
                (MediaKind::Tv, Some(season), Some(episode)) => {
                    let (Some(season_label), Some(episode_label)) =
                        (SeasonLabel::parse(season), EpisodeLabel::parse(episode))
                    else {
                        error!(
                            "Episode deletion sync for {} failed: season '{season}' / episode '{episode}' not usable",
                            request.name
                        );
                        return Ok(None);
                    };
                    (
                        format!(
                            "series {} {season_label}{episode_label} {tmdb_display}",
                            request.name
                        ),
                        TransferQuery {
                            tmdbid: tmdb_num,
                            mtype: Some(MediaKind::Tv.as_str().to_string()),
                            season: Some(season_label.to_string()),
                            episode: Some(episode_label.to_string()),
                            dest: Some(mapped_path.to_string()),
                            ..TransferQuery::default()
                        },
                    )
                }
                // An episode without its season does not map to any stored
                // shape; resolve to nothing and let the no-match path handle it.
                (MediaKind::Tv, None, Some(_)) => {
                    return Ok(Some(Resolution {
                        description: format!("series {} {tmdb_display}", request.name),
                        records: Vec::new(),
                    }));
                }
            };

        let records = self.transfers.find_by(&query).await?;
        Ok(Some(Resolution {
            description,
            records,
        }))
    }
}

fn digits_or_none(raw: Option<&str>) -> Option<String> {
    raw.filter(|s| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()))
        .map(str::to_string)
}
