use crate::{error::Result, storage::KeyValueStorage};
use std::sync::Arc;

pub const API_KEY_STORAGE_KEY: &str = "togetherApiKey";

pub struct UserSettings {
    storage: Arc<dyn KeyValueStorage>,
    api_key: String,
}

impl UserSettings {
    pub fn load(storage: Arc<dyn KeyValueStorage>) -> Self {
        let api_key = match storage.get_item(API_KEY_STORAGE_KEY) {
            Ok(key) => key.unwrap_or_default(),
            Err(e) => {
                log::error!("Failed to read stored API key: {}", e);
                String::new()
            }
        };
        Self { storage, api_key }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.is_empty()
    }

    pub fn set_api_key(&mut self, key: impl Into<String>) -> Result<()> {
        self.api_key = key.into();
        if self.api_key.is_empty() {
            log::debug!("Clearing stored API key");
            self.storage.remove_item(API_KEY_STORAGE_KEY)
        } else {
            self.storage.set_item(API_KEY_STORAGE_KEY, &self.api_key)
        }
    }
}
