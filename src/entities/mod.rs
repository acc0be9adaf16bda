pub mod deletion_log;
pub mod transfer_history;

pub mod prelude {
    pub use super::deletion_log::Entity as DeletionLog;
    pub use super::transfer_history::Entity as TransferHistory;
}
