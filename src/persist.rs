//! Persistence boundary: a synchronous single-blob store and the saved-state codec.

use serde::{Deserialize, Serialize};

/// Synchronous key-value slot holding one JSON blob per app variant.
pub trait KeyValueStore {
    fn load(&self) -> Option<String>;
    /// Fire-and-forget: implementations log failures instead of returning them.
    fn save(&mut self, blob: &str);
}

/// In-memory store for host-side use and tests.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    blob: Option<String>,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blob(blob: impl Into<String>) -> Self {
        Self {
            blob: Some(blob.into()),
            writes: 0,
        }
    }

    pub fn blob(&self) -> Option<&str> {
        self.blob.as_deref()
    }

    /// Number of `save` calls so far.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self) -> Option<String> {
        self.blob.clone()
    }

    fn save(&mut self, blob: &str) {
        self.blob = Some(blob.to_string());
        self.writes += 1;
    }
}

/// Wire shape of the saved economy: `{ stars, unlocked, activeCharId }`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveData {
    #[serde(default)]
    pub stars: u32,
    #[serde(default)]
    pub unlocked: Vec<String>,
    #[serde(default)]
    pub active_char_id: Option<String>,
}

impl SaveData {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// Read and decode the blob. Missing and corrupt content both come back as
/// `None`; corruption is logged.
pub fn load_save(store: &impl KeyValueStore) -> Option<SaveData> {
    let json = store.load()?;
    match SaveData::from_json(&json) {
        Ok(data) => Some(data),
        Err(err) => {
            log::warn!("corrupt save data, using defaults: {err}");
            None
        }
    }
}

pub fn write_save(store: &mut impl KeyValueStore, data: &SaveData) {
    match data.to_json() {
        Ok(json) => store.save(&json),
        Err(err) => log::error!("could not encode save data: {err}"),
    }
}
