//! End-to-end deletion sync flows over a temp sqlite store.

use mediasweep::config::{SyncConfig, SyncType};
use mediasweep::db::{NewTransferRecord, Store};
use mediasweep::domain::events::{MediaEvent, Outcome, OutboundEvent};
use mediasweep::kill_switch::KillSwitch;
use mediasweep::services::{
    DeletionNotice, NoArtworkService, Notifier, SeaOrmSyncDelService, SyncDelService,
};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

/// Captures notices so tests can assert on the summary text.
#[derive(Default)]
struct RecordingNotifier {
    notices: Mutex<Vec<DeletionNotice>>,
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notice: &DeletionNotice) -> anyhow::Result<()> {
        self.notices.lock().unwrap().push(notice.clone());
        Ok(())
    }
}

struct Harness {
    store: Store,
    service: SeaOrmSyncDelService,
    notifier: Arc<RecordingNotifier>,
    outbound: broadcast::Receiver<OutboundEvent>,
    data_dir: PathBuf,
}

impl Drop for Harness {
    fn drop(&mut self) {
        std::fs::remove_dir_all(&self.data_dir).ok();
    }
}

async fn harness(sync: SyncConfig) -> Harness {
    let data_dir =
        std::env::temp_dir().join(format!("mediasweep-sync-test-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&data_dir).unwrap();

    let db_path = data_dir.join("test.db");
    let store = Store::new(&format!("sqlite:{}", db_path.display()))
        .await
        .expect("failed to open store");

    let notifier = Arc::new(RecordingNotifier::default());
    let (bus, outbound) = broadcast::channel(16);

    let service = SeaOrmSyncDelService::new(
        sync,
        store.transfer_history(),
        store.deletion_log(),
        KillSwitch::new(&data_dir),
        Arc::new(NoArtworkService),
        notifier.clone(),
        bus,
    );

    Harness {
        store,
        service,
        notifier,
        outbound,
        data_dir,
    }
}

fn enabled_webhook() -> SyncConfig {
    SyncConfig {
        enabled: true,
        sync_type: SyncType::Webhook,
        ..SyncConfig::default()
    }
}

fn enabled_plugin() -> SyncConfig {
    SyncConfig {
        enabled: true,
        sync_type: SyncType::Plugin,
        ..SyncConfig::default()
    }
}

fn movie_record(dest: &str) -> NewTransferRecord {
    NewTransferRecord {
        title: "The Matrix".to_string(),
        tmdbid: Some(603),
        year: Some("1999".to_string()),
        mtype: "Movie".to_string(),
        dest: Some(dest.to_string()),
        image: Some("/matrix-poster.jpg".to_string()),
        ..NewTransferRecord::default()
    }
}

fn movie_event(path: &str) -> MediaEvent {
    MediaEvent {
        event: "library.deleted".to_string(),
        media_type: Some("Movie".to_string()),
        item_name: Some("The Matrix".to_string()),
        item_path: Some(path.to_string()),
        tmdb_id: Some("603".to_string()),
        ..MediaEvent::default()
    }
}

#[tokio::test]
async fn movie_deletion_end_to_end() {
    let h = harness(enabled_webhook()).await;
    h.store
        .transfer_history()
        .insert(movie_record("/library/The Matrix/The Matrix.mkv"))
        .await
        .unwrap();

    let outcome = h
        .service
        .handle_webhook_event(&movie_event("/library/The Matrix/The Matrix.mkv"))
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::Completed { deleted_records: 1 });

    // Transfer row is gone.
    let remaining = h
        .store
        .transfer_history()
        .find_by(&mediasweep::db::TransferQuery::default())
        .await
        .unwrap();
    assert!(remaining.is_empty());

    // One log entry, carrying year and the record's poster.
    let log = h.service.deletion_log().await.unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].mtype, "Movie");
    assert_eq!(log[0].title, "The Matrix");
    assert_eq!(log[0].year.as_deref(), Some("1999"));
    assert_eq!(
        log[0].image.as_deref(),
        Some("https://image.tmdb.org/t/p/w500/matrix-poster.jpg")
    );
    assert!(log[0].unique_key.starts_with("The Matrix:603:"));

    // Notification fired with the summary text.
    let notices = h.notifier.notices.lock().unwrap();
    assert_eq!(notices.len(), 1);
    assert!(notices[0].text.contains("movie The Matrix 603"));
    assert!(notices[0].text.contains("Removed 1 transfer records"));
}

#[tokio::test]
async fn second_run_finds_nothing() {
    let h = harness(enabled_webhook()).await;
    h.store
        .transfer_history()
        .insert(movie_record("/library/The Matrix/The Matrix.mkv"))
        .await
        .unwrap();

    let event = movie_event("/library/The Matrix/The Matrix.mkv");
    let first = h.service.handle_webhook_event(&event).await.unwrap();
    assert_eq!(first, Outcome::Completed { deleted_records: 1 });

    let second = h.service.handle_webhook_event(&event).await.unwrap();
    assert_eq!(
        second,
        Outcome::Skipped {
            reason: "no matching transfer records".to_string()
        }
    );

    // Only the first run logged anything.
    assert_eq!(h.service.deletion_log().await.unwrap().len(), 1);
}

#[tokio::test]
async fn webhook_without_tmdb_is_rejected() {
    let h = harness(enabled_webhook()).await;

    let mut event = movie_event("/library/The Matrix/The Matrix.mkv");
    event.tmdb_id = None;

    let outcome = h.service.handle_webhook_event(&event).await.unwrap();
    assert_eq!(
        outcome,
        Outcome::Rejected {
            reason: "missing tmdb id".to_string()
        }
    );
    assert!(h.service.deletion_log().await.unwrap().is_empty());
}

#[tokio::test]
async fn non_numeric_tmdb_matches_no_records() {
    let h = harness(enabled_webhook()).await;
    h.store
        .transfer_history()
        .insert(NewTransferRecord {
            title: "Dexter".to_string(),
            tmdbid: Some(1396),
            mtype: "TV".to_string(),
            dest: Some("/library/Dexter".to_string()),
            ..NewTransferRecord::default()
        })
        .await
        .unwrap();

    // An IMDB id in the tmdb field must not widen the lookup to every TV
    // record that happens to pass the title guard.
    let event = MediaEvent {
        event: "library.deleted".to_string(),
        media_type: Some("Series".to_string()),
        item_name: Some("Dexter: New Blood".to_string()),
        item_path: Some("/library/Dexter New Blood".to_string()),
        tmdb_id: Some("tt0133093".to_string()),
        ..MediaEvent::default()
    };

    let outcome = h.service.handle_webhook_event(&event).await.unwrap();
    assert_eq!(
        outcome,
        Outcome::Skipped {
            reason: "no matching transfer records".to_string()
        }
    );

    let remaining = h
        .store
        .transfer_history()
        .find_by(&mediasweep::db::TransferQuery::default())
        .await
        .unwrap();
    assert_eq!(remaining.len(), 1);
    assert!(h.service.deletion_log().await.unwrap().is_empty());
}

#[tokio::test]
async fn season_deletion_without_tmdb_falls_back_to_dest() {
    let h = harness(enabled_webhook()).await;
    h.store
        .transfer_history()
        .insert(NewTransferRecord {
            title: "Breaking Bad".to_string(),
            tmdbid: Some(1396),
            mtype: "TV".to_string(),
            season: Some("S02".to_string()),
            dest: Some("/library/Breaking Bad/Season 2".to_string()),
            ..NewTransferRecord::default()
        })
        .await
        .unwrap();

    let event = MediaEvent {
        event: "library.deleted".to_string(),
        media_type: Some("Season".to_string()),
        item_name: Some("Breaking Bad".to_string()),
        item_path: Some("/library/Breaking Bad/Season 2".to_string()),
        season_id: Some("2".to_string()),
        ..MediaEvent::default()
    };

    let outcome = h.service.handle_webhook_event(&event).await.unwrap();
    assert_eq!(outcome, Outcome::Completed { deleted_records: 1 });

    let log = h.service.deletion_log().await.unwrap();
    assert_eq!(log[0].season.as_deref(), Some("2"));
    assert!(log[0].episode.is_none());
}

#[tokio::test]
async fn season_deletion_removes_remaining_dest_files() {
    let h = harness(SyncConfig {
        del_source: true,
        ..enabled_webhook()
    })
    .await;

    // The server deleted the season dir entry, but the episode file the
    // transfer pipeline linked is still around.
    let dest_dir = h.data_dir.join("fs/library/Breaking Bad/Season 2");
    std::fs::create_dir_all(&dest_dir).unwrap();
    let dest = dest_dir.join("e01.mkv");
    std::fs::write(&dest, b"x").unwrap();

    h.store
        .transfer_history()
        .insert(NewTransferRecord {
            title: "Breaking Bad".to_string(),
            tmdbid: Some(1396),
            mtype: "TV".to_string(),
            season: Some("S02".to_string()),
            src: Some("/downloads/gone/e01.mkv".to_string()),
            dest: Some(dest.to_str().unwrap().to_string()),
            ..NewTransferRecord::default()
        })
        .await
        .unwrap();

    let event = MediaEvent {
        event: "library.deleted".to_string(),
        media_type: Some("Season".to_string()),
        item_name: Some("Breaking Bad".to_string()),
        item_path: Some("/library/Breaking Bad/Season 2".to_string()),
        tmdb_id: Some("1396".to_string()),
        season_id: Some("2".to_string()),
        ..MediaEvent::default()
    };

    let outcome = h.service.handle_webhook_event(&event).await.unwrap();
    assert_eq!(outcome, Outcome::Completed { deleted_records: 1 });
    assert!(!dest.exists());
    assert!(!dest_dir.exists());
}

#[tokio::test]
async fn episode_deletion_uses_padded_labels() {
    let h = harness(enabled_webhook()).await;
    h.store
        .transfer_history()
        .insert(NewTransferRecord {
            title: "Breaking Bad".to_string(),
            tmdbid: Some(1396),
            mtype: "TV".to_string(),
            season: Some("S02".to_string()),
            episode: Some("E05".to_string()),
            dest: Some("/library/Breaking Bad/Season 2/e05.mkv".to_string()),
            ..NewTransferRecord::default()
        })
        .await
        .unwrap();

    let event = MediaEvent {
        event: "ItemDeleted".to_string(),
        media_type: Some("Episode".to_string()),
        item_name: Some("Breaking Bad".to_string()),
        item_path: Some("/library/Breaking Bad/Season 2/e05.mkv".to_string()),
        tmdb_id: Some("1396".to_string()),
        season_id: Some("2".to_string()),
        episode_id: Some("5".to_string()),
        ..MediaEvent::default()
    };

    let outcome = h.service.handle_webhook_event(&event).await.unwrap();
    assert_eq!(outcome, Outcome::Completed { deleted_records: 1 });

    // Raw numbers in the log, padded labels in the notification.
    let log = h.service.deletion_log().await.unwrap();
    assert_eq!(log[0].season.as_deref(), Some("2"));
    assert_eq!(log[0].episode.as_deref(), Some("5"));

    let notices = h.notifier.notices.lock().unwrap();
    assert!(notices[0].text.contains("S02E05"));
}

#[tokio::test]
async fn invalid_season_number_is_rejected() {
    let h = harness(enabled_webhook()).await;

    let event = MediaEvent {
        event: "library.deleted".to_string(),
        media_type: Some("Season".to_string()),
        item_name: Some("Breaking Bad".to_string()),
        item_path: Some("/library/Breaking Bad/Specials".to_string()),
        season_id: Some("2a".to_string()),
        ..MediaEvent::default()
    };

    let outcome = h.service.handle_webhook_event(&event).await.unwrap();
    assert_eq!(
        outcome,
        Outcome::Rejected {
            reason: "unusable season/episode number".to_string()
        }
    );
}

#[tokio::test]
async fn excluded_paths_are_skipped() {
    let h = harness(SyncConfig {
        exclude_path: "/library/keep, /cloud".to_string(),
        ..enabled_webhook()
    })
    .await;

    let outcome = h
        .service
        .handle_webhook_event(&movie_event("/library/keep/The Matrix/The Matrix.mkv"))
        .await
        .unwrap();
    assert_eq!(
        outcome,
        Outcome::Skipped {
            reason: "excluded path".to_string()
        }
    );
}

#[tokio::test]
async fn path_still_on_disk_is_skipped() {
    let h = harness(enabled_webhook()).await;
    let dest = h.data_dir.join("The Matrix.mkv");
    std::fs::write(&dest, b"x").unwrap();
    h.store
        .transfer_history()
        .insert(movie_record(dest.to_str().unwrap()))
        .await
        .unwrap();

    let outcome = h
        .service
        .handle_webhook_event(&movie_event(dest.to_str().unwrap()))
        .await
        .unwrap();
    assert_eq!(
        outcome,
        Outcome::Skipped {
            reason: "path still present on disk".to_string()
        }
    );

    // Nothing was deleted.
    assert!(dest.exists());
    assert!(h.service.deletion_log().await.unwrap().is_empty());
}

#[tokio::test]
async fn title_mismatch_keeps_the_record() {
    let h = harness(enabled_webhook()).await;
    h.store
        .transfer_history()
        .insert(NewTransferRecord {
            title: "Completely Different Film".to_string(),
            tmdbid: Some(603),
            mtype: "Movie".to_string(),
            dest: Some("/library/The Matrix/The Matrix.mkv".to_string()),
            ..NewTransferRecord::default()
        })
        .await
        .unwrap();

    let outcome = h
        .service
        .handle_webhook_event(&movie_event("/library/The Matrix/The Matrix.mkv"))
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::Completed { deleted_records: 0 });

    let remaining = h
        .store
        .transfer_history()
        .find_by(&mediasweep::db::TransferQuery::default())
        .await
        .unwrap();
    assert_eq!(remaining.len(), 1);
}

#[tokio::test]
async fn library_path_remap_matches_local_dest() {
    let h = harness(SyncConfig {
        library_path: "/emby/movies:/mnt/media/movies".to_string(),
        ..enabled_webhook()
    })
    .await;
    h.store
        .transfer_history()
        .insert(movie_record("/mnt/media/movies/The Matrix/The Matrix.mkv"))
        .await
        .unwrap();

    let outcome = h
        .service
        .handle_webhook_event(&movie_event("/emby/movies/The Matrix/The Matrix.mkv"))
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::Completed { deleted_records: 1 });

    // The log records the remapped path.
    let log = h.service.deletion_log().await.unwrap();
    assert_eq!(log[0].path, "/mnt/media/movies/The Matrix/The Matrix.mkv");
}

#[tokio::test]
async fn del_source_removes_file_and_signals_downloader() {
    let mut h = harness(SyncConfig {
        del_source: true,
        ..enabled_webhook()
    })
    .await;

    let src_dir = h.data_dir.join("fs/downloads/The.Matrix.1999");
    std::fs::create_dir_all(&src_dir).unwrap();
    let src = src_dir.join("The.Matrix.1999.mkv");
    std::fs::write(&src, b"x").unwrap();

    let mut record = movie_record("/library/The Matrix/The Matrix.mkv");
    record.src = Some(src.to_str().unwrap().to_string());
    record.download_hash = Some("abc123".to_string());
    h.store.transfer_history().insert(record).await.unwrap();

    let outcome = h
        .service
        .handle_webhook_event(&movie_event("/library/The Matrix/The Matrix.mkv"))
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::Completed { deleted_records: 1 });

    // Source file and its emptied directory are gone.
    assert!(!src.exists());
    assert!(!src_dir.exists());

    // The downloader manager got told.
    let event = h.outbound.try_recv().unwrap();
    let OutboundEvent::DownloadFileDeleted { src: evt_src, hash } = event;
    assert_eq!(evt_src, src.to_str().unwrap());
    assert_eq!(hash, "abc123");
}

#[tokio::test]
async fn scripter_without_isvirtual_trips_the_kill_switch() {
    let h = harness(enabled_plugin()).await;

    let event = MediaEvent {
        event: "media_del".to_string(),
        item_type: Some("Movie".to_string()),
        item_name: Some("The Matrix".to_string()),
        tmdb_id: Some("603".to_string()),
        ..MediaEvent::default()
    };

    let outcome = h.service.handle_scripter_event(&event).await.unwrap();
    assert_eq!(outcome, Outcome::Disabled);
    assert!(KillSwitch::new(&h.data_dir).is_tripped());

    // Everything after the fault is ignored until an operator resets.
    let mut valid = event.clone();
    valid.item_isvirtual = Some("False".to_string());
    let outcome = h.service.handle_scripter_event(&valid).await.unwrap();
    assert_eq!(outcome, Outcome::Ignored);
}

#[tokio::test]
async fn scripter_ignores_virtual_items() {
    let h = harness(enabled_plugin()).await;

    let event = MediaEvent {
        event: "media_del".to_string(),
        item_type: Some("Episode".to_string()),
        item_name: Some("Breaking Bad".to_string()),
        tmdb_id: Some("1396".to_string()),
        item_isvirtual: Some("True".to_string()),
        ..MediaEvent::default()
    };

    let outcome = h.service.handle_scripter_event(&event).await.unwrap();
    assert_eq!(outcome, Outcome::Ignored);
    assert!(!KillSwitch::new(&h.data_dir).is_tripped());
}

#[tokio::test]
async fn scripter_requires_numeric_tmdb() {
    let h = harness(enabled_plugin()).await;

    let event = MediaEvent {
        event: "media_del".to_string(),
        item_type: Some("Movie".to_string()),
        item_name: Some("The Matrix".to_string()),
        item_isvirtual: Some("False".to_string()),
        ..MediaEvent::default()
    };

    let outcome = h.service.handle_scripter_event(&event).await.unwrap();
    assert_eq!(
        outcome,
        Outcome::Rejected {
            reason: "missing tmdb id".to_string()
        }
    );
}

#[tokio::test]
async fn disabled_sync_ignores_everything() {
    let h = harness(SyncConfig::default()).await;

    let outcome = h
        .service
        .handle_webhook_event(&movie_event("/library/The Matrix/The Matrix.mkv"))
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::Ignored);
}

#[tokio::test]
async fn wrong_channel_is_ignored() {
    // Webhook events while configured for the script plugin, and vice versa.
    let h = harness(enabled_plugin()).await;
    let outcome = h
        .service
        .handle_webhook_event(&movie_event("/library/The Matrix/The Matrix.mkv"))
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::Ignored);

    let h = harness(enabled_webhook()).await;
    let event = MediaEvent {
        event: "media_del".to_string(),
        item_type: Some("Movie".to_string()),
        tmdb_id: Some("603".to_string()),
        item_isvirtual: Some("False".to_string()),
        ..MediaEvent::default()
    };
    let outcome = h.service.handle_scripter_event(&event).await.unwrap();
    assert_eq!(outcome, Outcome::Ignored);
}

#[tokio::test]
async fn log_entries_delete_by_unique_key() {
    let h = harness(enabled_webhook()).await;
    h.store
        .transfer_history()
        .insert(movie_record("/library/The Matrix/The Matrix.mkv"))
        .await
        .unwrap();
    h.service
        .handle_webhook_event(&movie_event("/library/The Matrix/The Matrix.mkv"))
        .await
        .unwrap();

    let log = h.service.deletion_log().await.unwrap();
    let key = log[0].unique_key.clone();

    h.service.delete_log_entry(&key).await.unwrap();
    assert!(h.service.deletion_log().await.unwrap().is_empty());

    // A second delete reports not-found.
    assert!(h.service.delete_log_entry(&key).await.is_err());
}
