//! Centralized balance and tuning constants for Sanctum game logic.
//!
//! Content packs describe what happens; these values pin down the
//! deterministic arithmetic around it (bounds, daily budget, upkeep).

// Persistence ----------------------------------------------------------------
pub const SAVE_KEY: &str = "sanctuary-save";

// Daily budget ---------------------------------------------------------------
pub const BASE_MAX_FOCUS: i32 = 10;
pub const FOCUS_COST_PER_ACTION: i32 = 1;
pub const MANUAL_ADVANCE_CAP: u32 = 5;

// Bounds ---------------------------------------------------------------------
pub const STAT_MIN: i32 = 0;
pub const STAT_MAX: i32 = 100;
pub const TRUST_MIN: i32 = 0;
pub const TRUST_MAX: i32 = 100;
pub const DURABILITY_MIN: i32 = 0;
pub const DURABILITY_MAX: i32 = 100;
pub const RESOURCE_FLOOR: i32 = 0;

// Companions -----------------------------------------------------------------
pub const DEFAULT_MAX_COMPANIONS: usize = 5;
pub const NEW_COMPANION_TRUST: i32 = 50;
pub const COMPANION_ID_ATTEMPTS: u64 = 16;

// Rollover -------------------------------------------------------------------
pub const CONCEPT_DAILY_DECAY: i32 = 1;
pub const UPKEEP_PER_COMPANION: i32 = 2;
pub const UPKEEP_HARMONY_PENALTY: i32 = 10;
pub const UPKEEP_RESOURCE: &str = "inspiration";
pub const UPKEEP_PENALTY_STAT: &str = "harmony";

// Gathering ------------------------------------------------------------------
pub const GATHER_BASE_CHANCE: f64 = 0.60;
pub const GATHER_LEVEL_STEP: f64 = 0.10;
pub const GATHER_CHANCE_CAP: f64 = 0.95;
pub const GATHER_BONUS_KEY: &str = "gathering";
pub const GATHER_YIELD_BASE: i32 = 5;
pub const GATHER_YIELD_VARIANCE: i32 = 2;

// Scenes ---------------------------------------------------------------------
pub const SCENE_INTRO: &str = "intro";
pub const SCENE_GATHERING: &str = "action_inspiration_gathering";
pub const SCENE_CONCEPTS: &str = "action_concept_management";
pub const SCENE_EXPLORATION: &str = "deep_exploration_menu";
pub const SCENE_MINIGAME_PREFIX: &str = "minigame_";
