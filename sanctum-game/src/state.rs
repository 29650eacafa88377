use std::collections::BTreeMap;
use std::hash::Hasher;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use twox_hash::XxHash64;

use crate::companions::{Companion, default_roster};
use crate::constants::{
    BASE_MAX_FOCUS, DURABILITY_MAX, DURABILITY_MIN, RESOURCE_FLOOR, SCENE_INTRO, STAT_MAX,
    STAT_MIN,
};
use crate::data::{ContentPack, DailyFlag};
use crate::minigame::{MinigamePhase, MinigameSession};

/// Once-per-day bookkeeping, cleared at every rollover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DailyFlags {
    pub meditated: bool,
    pub talked: bool,
    pub discussed: bool,
    pub minigame_played: bool,
}

impl DailyFlags {
    #[must_use]
    pub const fn is_set(&self, flag: DailyFlag) -> bool {
        match flag {
            DailyFlag::Meditated => self.meditated,
            DailyFlag::Talked => self.talked,
            DailyFlag::Discussed => self.discussed,
        }
    }

    pub const fn set(&mut self, flag: DailyFlag) {
        match flag {
            DailyFlag::Meditated => self.meditated = true,
            DailyFlag::Talked => self.talked = true,
            DailyFlag::Discussed => self.discussed = true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConceptState {
    pub built: bool,
    pub durability: i32,
}

impl Default for ConceptState {
    fn default() -> Self {
        Self {
            built: false,
            durability: DURABILITY_MAX,
        }
    }
}

impl ConceptState {
    /// Apply a durability delta, clamped to its bounds. Reaching the floor
    /// unbuilds the concept. Returns the applied delta.
    pub fn adjust_durability(&mut self, delta: i32) -> i32 {
        let before = self.durability;
        self.durability = self
            .durability
            .saturating_add(delta)
            .clamp(DURABILITY_MIN, DURABILITY_MAX);
        if self.durability <= DURABILITY_MIN {
            self.built = false;
        }
        self.durability - before
    }

    #[must_use]
    pub const fn is_standing(&self) -> bool {
        self.built && self.durability > DURABILITY_MIN
    }
}

/// The single persistent player state.
///
/// Missing fields in older snapshots fall back to the defaults below and are
/// then topped up from the content pack by [`PlayerState::patch_with`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerState {
    pub day: u32,
    pub stats: BTreeMap<String, i32>,
    pub focus: i32,
    pub max_focus: i32,
    pub resources: BTreeMap<String, i32>,
    pub companions: Vec<Companion>,
    pub max_companions: usize,
    pub concepts: BTreeMap<String, ConceptState>,
    pub sanctuary_level: u32,
    pub scene: String,
    pub last_played: Option<NaiveDate>,
    pub manual_advances_today: u32,
    pub daily_event_fired: bool,
    pub daily_bonus: BTreeMap<String, i32>,
    pub daily_flags: DailyFlags,
    pub pending_companion: Option<Companion>,
    pub minigame: Option<MinigameSession>,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            day: 1,
            stats: BTreeMap::new(),
            focus: BASE_MAX_FOCUS,
            max_focus: BASE_MAX_FOCUS,
            resources: BTreeMap::new(),
            companions: Vec::new(),
            max_companions: 0,
            concepts: BTreeMap::new(),
            sanctuary_level: 0,
            scene: String::from(SCENE_INTRO),
            last_played: None,
            manual_advances_today: 0,
            daily_event_fired: false,
            daily_bonus: BTreeMap::new(),
            daily_flags: DailyFlags::default(),
            pending_companion: None,
            minigame: None,
        }
    }
}

impl PlayerState {
    /// Fresh state for a first run or a reset.
    #[must_use]
    pub fn new(content: &ContentPack, today: NaiveDate) -> Self {
        let mut state = Self {
            last_played: Some(today),
            ..Self::default()
        };
        state.patch_with(content);
        state
    }

    /// Fill in anything the content pack defines that the state lacks, then
    /// re-establish every bound.
    pub fn patch_with(&mut self, content: &ContentPack) {
        self.day = self.day.max(1);
        for stat in &content.stats {
            self.stats.entry(stat.id.clone()).or_insert(stat.start);
        }
        for resource in &content.resources {
            self.resources
                .entry(resource.id.clone())
                .or_insert(resource.start);
        }
        for concept in &content.concepts {
            self.concepts.entry(concept.key.clone()).or_default();
        }
        if self.companions.is_empty() {
            self.companions = default_roster(&content.companions);
        }
        if self.max_companions == 0 {
            self.max_companions = content.companions.max;
        }
        if self.scene.is_empty() {
            self.scene = String::from(SCENE_INTRO);
        }
        self.max_focus = self.max_focus.max(0);
        self.focus = self.focus.clamp(0, self.max_focus);
        for value in self.stats.values_mut() {
            *value = (*value).clamp(STAT_MIN, STAT_MAX);
        }
        for companion in &mut self.companions {
            companion.adjust_trust(0);
        }
        for concept in self.concepts.values_mut() {
            concept.adjust_durability(0);
        }
    }

    #[must_use]
    pub fn stat(&self, id: &str) -> i32 {
        self.stats.get(id).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn resource(&self, id: &str) -> i32 {
        self.resources.get(id).copied().unwrap_or(0)
    }

    /// Apply a stat delta clamped to the stat bounds. Returns the applied
    /// delta.
    pub fn adjust_stat(&mut self, id: &str, delta: i32) -> i32 {
        let value = self.stats.entry(id.to_string()).or_insert(0);
        let before = *value;
        *value = value.saturating_add(delta).clamp(STAT_MIN, STAT_MAX);
        *value - before
    }

    /// Apply a resource delta. Losses stop at the floor but never lift a
    /// resource that upkeep already pushed below it. Returns the applied
    /// delta.
    pub fn adjust_resource(&mut self, id: &str, delta: i32) -> i32 {
        let value = self.resources.entry(id.to_string()).or_insert(0);
        let before = *value;
        let next = value.saturating_add(delta);
        *value = if delta < 0 {
            next.max(RESOURCE_FLOOR.min(before))
        } else {
            next
        };
        *value - before
    }

    /// Unfloored drain used by daily upkeep.
    pub fn drain_resource(&mut self, id: &str, amount: i32) {
        let value = self.resources.entry(id.to_string()).or_insert(0);
        *value = value.saturating_sub(amount);
    }

    /// Apply a focus delta within `[0, max_focus]`. Returns the applied
    /// delta.
    pub fn adjust_focus(&mut self, delta: i32) -> i32 {
        let before = self.focus;
        self.focus = self.focus.saturating_add(delta).clamp(0, self.max_focus.max(0));
        self.focus - before
    }

    #[must_use]
    pub fn companion(&self, id: &str) -> Option<&Companion> {
        self.companions.iter().find(|companion| companion.id == id)
    }

    pub fn companion_mut(&mut self, id: &str) -> Option<&mut Companion> {
        self.companions.iter_mut().find(|companion| companion.id == id)
    }

    #[must_use]
    pub fn has_companion_room(&self) -> bool {
        self.companions.len() < self.max_companions
    }

    /// Built and above zero durability.
    #[must_use]
    pub fn concept_standing(&self, key: &str) -> bool {
        self.concepts.get(key).is_some_and(ConceptState::is_standing)
    }

    #[must_use]
    pub fn bonus(&self, key: &str) -> i32 {
        self.daily_bonus.get(key).copied().unwrap_or(0)
    }

    /// A minigame session that still accepts input.
    #[must_use]
    pub fn active_minigame(&self) -> Option<&MinigameSession> {
        self.minigame
            .as_ref()
            .filter(|session| session.phase != MinigamePhase::Scored)
    }

    /// Serialize to the persisted snapshot format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse a persisted snapshot; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot is not valid state JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Stable fingerprint of the full state, used to compare runs.
    #[must_use]
    pub fn digest(&self) -> u64 {
        let mut hasher = XxHash64::with_seed(0);
        if let Ok(bytes) = serde_json::to_vec(self) {
            hasher.write(&bytes);
        }
        hasher.finish()
    }
}
