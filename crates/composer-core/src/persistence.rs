//! Persistence helpers: saved items, remembered template answers and the
//! user profile, stored as JSON under fixed keys of a `StoragePort`.
//!
//! Every write is a read-modify-write of the whole value, serialized per key
//! with an async mutex so two writers cannot drop each other's updates.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use futures::lock::Mutex;
use serde::{de::DeserializeOwned, Serialize};

use composer_types::{
    Result,
    store::{
        SavedGroup, SavedItem, TemplateAnswers, UserProfile, DEFAULT_SAVED_ITEMS_CAP,
        SAVED_ITEMS_KEY, TEMPLATE_ANSWERS_KEY, UNTAGGED_LABEL, USER_PROFILE_KEY,
    },
};
use crate::ports::StoragePort;
use crate::tag_prompt::TagPrompt;

pub struct Persistence {
    storage: Rc<dyn StoragePort>,
    locks: RefCell<HashMap<String, Rc<Mutex<()>>>>,
    cap: usize,
}

impl Persistence {
    pub fn new(storage: Rc<dyn StoragePort>) -> Self {
        Self::with_cap(storage, DEFAULT_SAVED_ITEMS_CAP)
    }

    pub fn with_cap(storage: Rc<dyn StoragePort>, cap: usize) -> Self {
        Self {
            storage,
            locks: RefCell::new(HashMap::new()),
            cap: cap.max(1),
        }
    }

    pub fn backend_name(&self) -> &str {
        self.storage.backend_name()
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    // ─── Saved items ─────────────────────────────────────────

    /// Saved items, newest first.
    pub async fn saved_items(&self) -> Result<Vec<SavedItem>> {
        Ok(self.read(SAVED_ITEMS_KEY).await?.unwrap_or_default())
    }

    /// Insert at the head of the list, evicting the oldest past the cap.
    pub async fn save_item(&self, text: &str, tag: &str) -> Result<SavedItem> {
        let lock = self.lock_for(SAVED_ITEMS_KEY);
        let _guard = lock.lock().await;

        let mut items = self.saved_items().await?;
        let item = SavedItem::new(text, tag);
        items.insert(0, item.clone());
        if items.len() > self.cap {
            let evicted = items.len() - self.cap;
            items.truncate(self.cap);
            log::debug!("Saved items over cap, evicted {} oldest", evicted);
        }
        self.write(SAVED_ITEMS_KEY, &items).await?;
        Ok(item)
    }

    /// Save with `tag`, asking the user for one first when it is `None`.
    pub async fn save_item_prompted(
        &self,
        text: &str,
        tag: Option<String>,
        prompt: &TagPrompt,
    ) -> Result<SavedItem> {
        let tag = match tag {
            Some(tag) => tag,
            None => prompt.ask().await,
        };
        self.save_item(text, &tag).await
    }

    /// Remove an item by id. Returns whether anything was removed.
    pub async fn delete_saved_item(&self, id: &str) -> Result<bool> {
        let lock = self.lock_for(SAVED_ITEMS_KEY);
        let _guard = lock.lock().await;

        let mut items = self.saved_items().await?;
        let before = items.len();
        items.retain(|item| item.id != id);
        if items.len() == before {
            return Ok(false);
        }
        self.write(SAVED_ITEMS_KEY, &items).await?;
        Ok(true)
    }

    pub async fn grouped_saved_items(&self) -> Result<Vec<SavedGroup>> {
        Ok(group_saved_items(&self.saved_items().await?))
    }

    // ─── Template answers ────────────────────────────────────

    /// All remembered answers for one template. Unreadable storage yields an
    /// empty map.
    pub async fn template_answers(&self, template: &str) -> BTreeMap<String, String> {
        match self.read::<TemplateAnswers>(TEMPLATE_ANSWERS_KEY).await {
            Ok(answers) => answers.unwrap_or_default().for_template(template),
            Err(e) => {
                log::warn!("Template answers unavailable: {}", e);
                BTreeMap::new()
            }
        }
    }

    pub async fn template_answer(&self, template: &str, field: &str) -> Option<String> {
        match self.read::<TemplateAnswers>(TEMPLATE_ANSWERS_KEY).await {
            Ok(answers) => answers?.get(template, field).map(String::from),
            Err(e) => {
                log::warn!("Template answers unavailable: {}", e);
                None
            }
        }
    }

    pub async fn set_template_answer(&self, template: &str, field: &str, value: &str) -> Result<()> {
        let lock = self.lock_for(TEMPLATE_ANSWERS_KEY);
        let _guard = lock.lock().await;

        let mut answers: TemplateAnswers = self.read(TEMPLATE_ANSWERS_KEY).await?.unwrap_or_default();
        answers.set(template, field, value);
        self.write(TEMPLATE_ANSWERS_KEY, &answers).await
    }

    // ─── User profile ────────────────────────────────────────

    pub async fn user_profile(&self) -> Result<UserProfile> {
        Ok(self.read(USER_PROFILE_KEY).await?.unwrap_or_default())
    }

    pub async fn set_user_profile(&self, profile: &UserProfile) -> Result<()> {
        let lock = self.lock_for(USER_PROFILE_KEY);
        let _guard = lock.lock().await;
        self.write(USER_PROFILE_KEY, profile).await
    }

    // ─── Raw access ──────────────────────────────────────────

    fn lock_for(&self, key: &str) -> Rc<Mutex<()>> {
        self.locks
            .borrow_mut()
            .entry(key.to_string())
            .or_insert_with(|| Rc::new(Mutex::new(())))
            .clone()
    }

    /// Decode a stored value. A value that no longer decodes is treated as
    /// absent so the next write replaces it.
    async fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(bytes) = self.storage.get(key).await? else {
            return Ok(None);
        };
        match serde_json::from_slice(&bytes) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                log::warn!("Discarding unreadable value at '{}': {}", key, e);
                Ok(None)
            }
        }
    }

    async fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec(value)?;
        self.storage.set(key, &bytes).await
    }
}

/// Group items by their exact tag. Groups sort alphabetically ignoring case
/// ("Work" and "work" stay apart but sit together), "Untagged" last.
/// Items keep their newest-first order inside each group.
pub fn group_saved_items(items: &[SavedItem]) -> Vec<SavedGroup> {
    let mut tagged: BTreeMap<(String, String), SavedGroup> = BTreeMap::new();
    let mut untagged: Vec<SavedItem> = Vec::new();

    for item in items {
        if item.tag.trim().is_empty() {
            untagged.push(item.clone());
            continue;
        }
        tagged
            .entry((item.tag.to_lowercase(), item.tag.clone()))
            .or_insert_with(|| SavedGroup {
                label: item.tag.clone(),
                untagged: false,
                items: Vec::new(),
            })
            .items
            .push(item.clone());
    }

    let mut groups: Vec<SavedGroup> = tagged.into_values().collect();
    if !untagged.is_empty() {
        groups.push(SavedGroup {
            label: UNTAGGED_LABEL.to_string(),
            untagged: true,
            items: untagged,
        });
    }
    groups
}
