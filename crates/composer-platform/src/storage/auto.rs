//! Pick a storage backend from configuration.
//!
//! `Auto` prefers IndexedDB and falls back to memory. An explicit
//! `IndexedDb` choice still degrades to memory rather than leaving the panel
//! without storage; the fallback is logged.

use std::rc::Rc;
use composer_core::ports::StoragePort;
use composer_types::config::{StorageBackendType, StorageConfig};
use super::{IndexedDbStorage, MemoryStorage};

pub async fn open_storage(config: &StorageConfig) -> Rc<dyn StoragePort> {
    match config.backend {
        StorageBackendType::Memory => {
            log::info!("Storage backend: memory (configured)");
            Rc::new(MemoryStorage::new())
        }
        StorageBackendType::Auto | StorageBackendType::IndexedDb => match IndexedDbStorage::open().await {
            Ok(idb) => {
                log::info!("Storage backend: IndexedDB");
                Rc::new(idb)
            }
            Err(e) => {
                log::warn!("IndexedDB unavailable ({}), saved items will not survive a reload", e);
                Rc::new(MemoryStorage::new())
            }
        },
    }
}
