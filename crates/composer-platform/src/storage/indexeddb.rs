//! IndexedDB storage backend.
//!
//! One object store of byte values keyed by the persistence key
//! (`savedItems`, `templateAnswers`, `userProfile`, `composer:config`).
//! Writes resolve only after the request succeeds, so a read that follows
//! a completed write sees it.

use async_trait::async_trait;
use js_sys::{Array, Uint8Array};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{IdbDatabase, IdbObjectStore, IdbRequest, IdbTransactionMode};

use composer_core::ports::StoragePort;
use composer_types::{ComposerError, Result};

const DB_NAME: &str = "composer_storage";
const STORE_NAME: &str = "kv";
const DB_VERSION: u32 = 1;

pub struct IndexedDbStorage {
    db: IdbDatabase,
}

impl IndexedDbStorage {
    /// Open (or create) the database.
    pub async fn open() -> Result<Self> {
        let window = web_sys::window()
            .ok_or_else(|| ComposerError::Storage("No window object".to_string()))?;

        let factory = window
            .indexed_db()
            .map_err(storage_err)?
            .ok_or_else(|| ComposerError::Storage("IndexedDB not available".to_string()))?;

        let open_req = factory.open_with_u32(DB_NAME, DB_VERSION).map_err(storage_err)?;

        let upgrade_req = open_req.clone();
        let onupgrade = Closure::once(move |_event: web_sys::Event| {
            let db = upgrade_req
                .result()
                .ok()
                .and_then(|r| r.dyn_into::<IdbDatabase>().ok());
            match db {
                Some(db) if !db.object_store_names().contains(STORE_NAME) => {
                    if let Err(e) = db.create_object_store(STORE_NAME) {
                        log::error!("Could not create object store: {:?}", e);
                    }
                }
                Some(_) => {}
                None => log::error!("IndexedDB upgrade without a database"),
            }
        });
        open_req.set_onupgradeneeded(Some(onupgrade.as_ref().unchecked_ref()));
        onupgrade.forget();

        let db: IdbDatabase = await_request(&open_req)
            .await?
            .dyn_into()
            .map_err(storage_err)?;

        log::debug!("Opened IndexedDB '{}' v{}", DB_NAME, DB_VERSION);
        Ok(Self { db })
    }

    fn store(&self, mode: IdbTransactionMode) -> Result<IdbObjectStore> {
        self.db
            .transaction_with_str_and_mode(STORE_NAME, mode)
            .and_then(|tx| tx.object_store(STORE_NAME))
            .map_err(storage_err)
    }
}

#[async_trait(?Send)]
impl StoragePort for IndexedDbStorage {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let store = self.store(IdbTransactionMode::Readonly)?;
        let req = store.get(&JsValue::from_str(key)).map_err(storage_err)?;
        let result = await_request(&req).await?;

        if result.is_undefined() || result.is_null() {
            return Ok(None);
        }
        Ok(Some(Uint8Array::new(&result).to_vec()))
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let store = self.store(IdbTransactionMode::Readwrite)?;
        let req = store
            .put_with_key(&Uint8Array::from(value), &JsValue::from_str(key))
            .map_err(storage_err)?;
        await_request(&req).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let store = self.store(IdbTransactionMode::Readwrite)?;
        let req = store.delete(&JsValue::from_str(key)).map_err(storage_err)?;
        await_request(&req).await?;
        Ok(())
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
        let store = self.store(IdbTransactionMode::Readonly)?;
        let req = store.get_all_keys().map_err(storage_err)?;
        let keys: Array = await_request(&req).await?.dyn_into().map_err(storage_err)?;

        Ok(keys
            .iter()
            .filter_map(|k| k.as_string())
            .filter(|k| k.starts_with(prefix))
            .collect())
    }

    fn backend_name(&self) -> &str {
        "indexeddb"
    }
}

fn storage_err(e: impl std::fmt::Debug) -> ComposerError {
    ComposerError::Storage(format!("{:?}", e))
}

/// Resolve an `IdbRequest` through a Promise so it can be awaited.
async fn await_request(req: &IdbRequest) -> Result<JsValue> {
    let success_req = req.clone();
    let callback_req = req.clone();

    let promise = js_sys::Promise::new(&mut move |resolve, reject| {
        let result_req = success_req.clone();
        let onsuccess = Closure::once(move |_: web_sys::Event| {
            let value = result_req.result().unwrap_or(JsValue::UNDEFINED);
            let _ = resolve.call1(&JsValue::NULL, &value);
        });
        let onerror = Closure::once(move |_: web_sys::Event| {
            let _ = reject.call1(&JsValue::NULL, &JsValue::from_str("IndexedDB request failed"));
        });
        callback_req.set_onsuccess(Some(onsuccess.as_ref().unchecked_ref()));
        callback_req.set_onerror(Some(onerror.as_ref().unchecked_ref()));
        onsuccess.forget();
        onerror.forget();
    });

    JsFuture::from(promise).await.map_err(storage_err)
}
