//! Domain services.

pub mod image;
pub mod notify;
pub mod sync_service;
pub mod sync_service_impl;

pub use image::{MediaImageService, NoArtworkService};
pub use notify::{DeletionNotice, LogNotifier, Notifier, WebhookNotifier};
pub use sync_service::{SyncDelService, SyncError};
pub use sync_service_impl::SeaOrmSyncDelService;
