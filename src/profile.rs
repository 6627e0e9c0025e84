//! Persisted economy: star balance plus unlocked / active characters.
//! Every mutation is written straight back to the store.

use crate::persist::{KeyValueStore, SaveData, load_save, write_save};
use crate::registry::{CharacterRegistry, RegistryError};

pub struct Profile<S: KeyValueStore> {
    registry: CharacterRegistry,
    stars: u32,
    store: S,
}

impl<S: KeyValueStore> Profile<S> {
    /// Load saved state on top of a fresh registry. Missing or unusable
    /// content leaves the defaults in place (0 stars, default character).
    pub fn load(mut registry: CharacterRegistry, store: S) -> Self {
        let mut stars = 0;
        match load_save(&store) {
            None => log::debug!("no saved profile, starting fresh"),
            Some(data) => {
                stars = data.stars;
                for id in &data.unlocked {
                    if !registry.mark_unlocked(id) {
                        log::warn!("ignoring unknown unlocked character '{id}'");
                    }
                }
                if let Some(id) = data.active_char_id.as_deref() {
                    if let Err(err) = registry.set_active(id) {
                        log::warn!(
                            "invalid active character '{id}' ({err}), resetting to {}",
                            registry.default_id()
                        );
                        registry.reset_active();
                    }
                }
            }
        }
        Self {
            registry,
            stars,
            store,
        }
    }

    pub fn stars(&self) -> u32 {
        self.stars
    }

    pub fn registry(&self) -> &CharacterRegistry {
        &self.registry
    }

    pub fn active_id(&self) -> &'static str {
        self.registry.active_id()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Add reward currency; returns the new balance.
    pub fn earn(&mut self, amount: u32) -> u32 {
        if amount == 0 {
            return self.stars;
        }
        self.stars = self.stars.saturating_add(amount);
        log::info!("earned {amount} star(s), balance {}", self.stars);
        self.save();
        self.stars
    }

    /// Buy a character: the debit and the unlock land together or not at
    /// all. Returns the remaining balance.
    pub fn purchase(&mut self, id: &str) -> Result<u32, RegistryError> {
        let debit = self.registry.unlock(id, self.stars)?;
        self.stars -= debit;
        self.registry.mark_unlocked(id);
        log::info!("unlocked '{id}' for {debit} stars, balance {}", self.stars);
        self.save();
        Ok(self.stars)
    }

    pub fn select(&mut self, id: &str) -> Result<(), RegistryError> {
        self.registry.set_active(id)?;
        self.save();
        Ok(())
    }

    pub fn snapshot(&self) -> SaveData {
        SaveData {
            stars: self.stars,
            unlocked: self.registry.unlocked_ids(),
            active_char_id: Some(self.registry.active_id().to_string()),
        }
    }

    fn save(&mut self) {
        let data = self.snapshot();
        write_save(&mut self.store, &data);
    }
}
