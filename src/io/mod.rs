pub mod config_io;
pub mod file_store;
pub mod lock;
pub mod memory_store;
pub mod recovery;
pub mod store;
pub mod watcher;
