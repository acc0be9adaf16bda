pub mod deletion_log;
pub mod transfer_history;
