pub mod file;
pub mod memory;
pub mod traits;

use crate::{config::Config, error::Result};
use std::sync::Arc;

pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use traits::KeyValueStorage;

pub fn open_storage(config: &Config) -> Result<Arc<dyn KeyValueStorage>> {
    let backend: Arc<dyn KeyValueStorage> = match &config.storage_dir {
        Some(dir) => {
            log::info!("Using file storage at {}", dir.display());
            Arc::new(FileStorage::new(dir)?)
        }
        None => {
            log::info!("Using in-memory storage; history is lost on exit");
            Arc::new(MemoryStorage::new())
        }
    };
    Ok(backend)
}
