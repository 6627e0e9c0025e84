//! Character catalog, unlock rules and the active-character pointer.

use serde::Serialize;
use thiserror::Error;

use crate::mood::Mood;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("unknown character '{0}'")]
    NotFound(String),

    #[error("you need {cost} stars to unlock {name}!")]
    InsufficientFunds {
        name: String,
        cost: u32,
        available: u32,
    },

    #[error("{0} is still locked")]
    NotUnlocked(String),

    #[error("{0} is already unlocked")]
    AlreadyUnlocked(String),

    #[error("duplicate character id '{0}'")]
    DuplicateId(String),

    #[error("catalog has no free character to fall back on")]
    NoFreeCharacter,
}

/// One selectable guardian. `assets` maps a purpose (a mood name or `bg`) to
/// an asset reference understood by the host page.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    pub id: &'static str,
    pub name: &'static str,
    pub cost: u32,
    pub unlocked: bool,
    pub theme: &'static str,
    pub assets: &'static [(&'static str, &'static str)],
}

impl Character {
    pub fn asset(&self, purpose: &str) -> Option<&'static str> {
        self.assets
            .iter()
            .find(|(p, _)| *p == purpose)
            .map(|(_, a)| *a)
    }

    pub fn mood_asset(&self, mood: Mood) -> Option<&'static str> {
        self.asset(mood.as_str())
    }
}

// -----------------------------------------------------------------------------
// Built-in catalogs
// -----------------------------------------------------------------------------

pub const ZEN_CHARACTERS: &[Character] = &[
    Character {
        id: "cat",
        name: "Ginger",
        cost: 0,
        unlocked: true,
        theme: "theme-cat",
        assets: &[
            ("sleep", "cat-sleeping.png"),
            ("alert", "cat-alert.png"),
            ("angry", "cat-angry.png"),
            ("bg", "bg-livingroom.png"),
        ],
    },
    Character {
        id: "owl",
        name: "Prof. Hoot",
        cost: 50,
        unlocked: false,
        theme: "theme-owl",
        assets: &[
            ("sleep", "owl-sleeping.png"),
            ("alert", "owl-alert.png"),
            ("angry", "owl-angry.png"),
            ("bg", "bg-forest.png"),
        ],
    },
    Character {
        id: "dragon",
        name: "Sparky",
        cost: 150,
        unlocked: false,
        theme: "theme-dragon",
        assets: &[
            ("sleep", "dragon-sleeping.png"),
            ("alert", "dragon-alert.png"),
            ("angry", "dragon-angry.png"),
            ("bg", "bg-cave.png"),
        ],
    },
];

/// The classic app has a single fat ginger cat drawn from animated gifs.
pub const CLASSIC_CHARACTERS: &[Character] = &[Character {
    id: "cat",
    name: "Ginger",
    cost: 0,
    unlocked: true,
    theme: "theme-classic",
    assets: &[
        ("sleep", "./cats-sleeping.gif"),
        ("alert", "./cat-really.gif"),
        ("angry", "./angry cat.gif"),
    ],
}];

// -----------------------------------------------------------------------------
// Registry
// -----------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct CharacterRegistry {
    characters: Vec<Character>,
    default_id: &'static str,
    active_id: &'static str,
}

impl CharacterRegistry {
    /// Build a registry from a catalog. The first zero-cost character becomes
    /// the default, is forced unlocked, and starts active.
    pub fn new(catalog: &[Character]) -> Result<Self, RegistryError> {
        let mut characters: Vec<Character> = Vec::with_capacity(catalog.len());
        for c in catalog {
            if characters.iter().any(|existing| existing.id == c.id) {
                return Err(RegistryError::DuplicateId(c.id.to_string()));
            }
            characters.push(c.clone());
        }
        let default = characters
            .iter_mut()
            .find(|c| c.cost == 0)
            .ok_or(RegistryError::NoFreeCharacter)?;
        default.unlocked = true;
        let default_id = default.id;
        Ok(Self {
            characters,
            default_id,
            active_id: default_id,
        })
    }

    pub fn characters(&self) -> &[Character] {
        &self.characters
    }

    pub fn default_id(&self) -> &'static str {
        self.default_id
    }

    pub fn active_id(&self) -> &'static str {
        self.active_id
    }

    pub fn active(&self) -> Option<&Character> {
        self.get(self.active_id)
    }

    pub fn get(&self, id: &str) -> Option<&Character> {
        self.characters.iter().find(|c| c.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut Character> {
        self.characters.iter_mut().find(|c| c.id == id)
    }

    /// Check a purchase. On success returns the amount to debit; the caller
    /// applies the debit and `mark_unlocked` together.
    pub fn unlock(&self, id: &str, available_stars: u32) -> Result<u32, RegistryError> {
        let c = self
            .get(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        if c.unlocked {
            return Err(RegistryError::AlreadyUnlocked(c.name.to_string()));
        }
        if available_stars < c.cost {
            return Err(RegistryError::InsufficientFunds {
                name: c.name.to_string(),
                cost: c.cost,
                available: available_stars,
            });
        }
        Ok(c.cost)
    }

    /// Flip the unlocked flag. Returns false for unknown ids.
    pub fn mark_unlocked(&mut self, id: &str) -> bool {
        match self.get_mut(id) {
            Some(c) => {
                c.unlocked = true;
                true
            }
            None => false,
        }
    }

    pub fn set_active(&mut self, id: &str) -> Result<(), RegistryError> {
        let c = self
            .get(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        if !c.unlocked {
            return Err(RegistryError::NotUnlocked(c.name.to_string()));
        }
        self.active_id = c.id;
        Ok(())
    }

    /// Put the active pointer back on the default character.
    pub fn reset_active(&mut self) {
        self.active_id = self.default_id;
    }

    pub fn unlocked_ids(&self) -> Vec<String> {
        self.characters
            .iter()
            .filter(|c| c.unlocked)
            .map(|c| c.id.to_string())
            .collect()
    }
}
