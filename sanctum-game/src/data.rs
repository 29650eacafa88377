//! Declarative content pack: stats, resources, concepts, companions and every
//! weighted outcome table the engine consults.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    DEFAULT_MAX_COMPANIONS, GATHER_BASE_CHANCE, GATHER_BONUS_KEY, GATHER_CHANCE_CAP,
    GATHER_LEVEL_STEP, GATHER_YIELD_BASE, GATHER_YIELD_VARIANCE, NEW_COMPANION_TRUST,
    UPKEEP_HARMONY_PENALTY, UPKEEP_PENALTY_STAT, UPKEEP_PER_COMPANION, UPKEEP_RESOURCE,
};

const BUILTIN_CONTENT: &str = include_str!("../assets/content/sanctuary.json");

/// Errors raised while loading or validating a content pack.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("content JSON is malformed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("content file could not be read: {0}")]
    Io(#[from] std::io::Error),
    #[error("content pack defines no stats")]
    NoStats,
    #[error("table `{table}` has no unconditional entry to fall back on")]
    MissingFallback { table: String },
    #[error("table `{table}` references unknown stat `{stat}`")]
    UnknownStat { table: String, stat: String },
    #[error("table `{table}` references unknown resource `{resource}`")]
    UnknownResource { table: String, resource: String },
    #[error("table `{table}` references unknown concept `{concept}`")]
    UnknownConcept { table: String, concept: String },
    #[error("table `{table}` references unknown action `{action}`")]
    UnknownAction { table: String, action: String },
    #[error("probability {value} in `{table}` is outside [0, 1]")]
    Probability { table: String, value: f64 },
}

/// A bounded stat or an unbounded resource with its starting value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeterDef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub start: i32,
}

/// Eligibility predicate attached to table entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    StatBelow { stat: String, value: i32 },
    StatAbove { stat: String, value: i32 },
    StatAtLeast { stat: String, value: i32 },
    StatAtMost { stat: String, value: i32 },
    ResourceBelow { resource: String, value: i32 },
    /// `resource < factor * companion_count`
    ResourceBelowPerCompanion { resource: String, factor: i32 },
    CompanionsAtLeast { count: usize },
    CompanionRoomAvailable,
    AnyCompanionTrustBelow { value: i32 },
    SubjectTrustBelow { value: i32 },
    SubjectPersonality { personality: String },
    SubjectSkill { skill: String },
    ConceptBuilt { concept: String },
    AnyOf(Vec<Condition>),
}

/// What a numeric effect lands on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    Stat(String),
    Resource(String),
    Focus,
    /// The companion the action is about.
    SubjectTrust,
    /// The second companion named by a two-party action.
    OtherTrust,
    /// The first companion whose trust is below the given value.
    FirstTrustBelow(i32),
    /// Every companion, rolled separately.
    AllTrust,
    /// Every built concept, one shared roll.
    BuiltConcepts,
}

/// A single declarative effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectSpec {
    /// `+random_range(base, variance)`, always one draw.
    Gain {
        target: Target,
        base: i32,
        #[serde(default)]
        variance: i32,
    },
    /// `-random_range(base, variance)`, always one draw.
    Lose {
        target: Target,
        base: i32,
        #[serde(default)]
        variance: i32,
    },
    /// Fixed delta without touching the stream.
    Shift { target: Target, amount: i32 },
    /// Daily bonus in percentage points.
    Bonus { key: String, points: i32 },
    /// Adjust the day's focus capacity. Increases refill focus; decreases
    /// respect `floor` and clamp the current focus.
    MaxFocus { delta: i32, floor: i32 },
    /// One draw against `probability`; nested effects apply on success.
    Chance {
        probability: f64,
        effects: Vec<EffectSpec>,
        #[serde(default)]
        message: String,
    },
    /// Generate a candidate companion and hold it for the player's decision.
    StageCompanion,
}

/// Weighted entry of an outcome table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeEntry {
    pub id: String,
    #[serde(default)]
    pub when: Vec<Condition>,
    pub weight: u32,
    #[serde(default)]
    pub effects: Vec<EffectSpec>,
    #[serde(default)]
    pub message: String,
}

/// Daily flags an action may set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DailyFlag {
    Meditated,
    Talked,
    Discussed,
}

/// How an action picks the companion it concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectRule {
    #[default]
    None,
    /// One uniform draw over the roster.
    Random,
    /// Supplied by the caller (dispute settlement).
    Named,
}

/// Extra price of an action beyond its single focus point.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActionCost {
    #[serde(default)]
    pub focus: i32,
    #[serde(default)]
    pub resources: BTreeMap<String, i32>,
}

impl ActionCost {
    #[must_use]
    pub fn is_free(&self) -> bool {
        self.focus <= 0 && self.resources.values().all(|amount| *amount <= 0)
    }
}

/// A focus-gated action backed by an outcome table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDef {
    #[serde(default)]
    pub flag: Option<DailyFlag>,
    #[serde(default)]
    pub once_per_day: bool,
    #[serde(default)]
    pub repeat_message: String,
    #[serde(default)]
    pub subject: SubjectRule,
    #[serde(default)]
    pub cost: ActionCost,
    #[serde(default)]
    pub shortfall: String,
    pub outcomes: Vec<OutcomeEntry>,
    #[serde(default)]
    pub next_scene: Option<String>,
}

/// Daily story event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDef {
    pub id: String,
    pub weight: u32,
    #[serde(default)]
    pub when: Vec<Condition>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub on_trigger: Vec<EffectSpec>,
    /// Response actions offered while this event is the active scene.
    #[serde(default)]
    pub responses: Vec<String>,
}

/// One side of a threshold rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cascade {
    pub threshold: i32,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub effects: Vec<EffectSpec>,
}

/// Threshold rule over one stat: `high` fires at `stat >= threshold`, `low`
/// fires at `stat < threshold`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatRule {
    pub stat: String,
    #[serde(default)]
    pub high: Option<Cascade>,
    #[serde(default)]
    pub low: Option<Cascade>,
}

/// Absorbing end state, checked in listed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndingDef {
    pub scene: String,
    pub when: Vec<Condition>,
    #[serde(default)]
    pub text: String,
}

/// Buildable concept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptDef {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub cost: BTreeMap<String, i32>,
    #[serde(default)]
    pub requires: Option<String>,
    #[serde(default)]
    pub rewards: Vec<EffectSpec>,
    #[serde(default)]
    pub message: String,
}

/// Skill tag and the resource it trickles each day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillDef {
    pub name: String,
    #[serde(default)]
    pub resource: Option<String>,
    #[serde(default = "SkillDef::default_amount")]
    pub amount: i32,
    #[serde(default)]
    pub message: String,
}

impl SkillDef {
    const fn default_amount() -> i32 {
        1
    }
}

/// Roster entry as written in content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanionSeed {
    pub id: String,
    pub name: String,
    pub personality: String,
    pub skill: String,
    pub trust: i32,
}

/// Starting roster plus the pools new companions are drawn from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanionPool {
    pub starting: Vec<CompanionSeed>,
    #[serde(default = "CompanionPool::default_max")]
    pub max: usize,
    pub names: Vec<String>,
    pub personalities: Vec<String>,
    pub skills: Vec<SkillDef>,
    #[serde(default = "CompanionPool::default_trust")]
    pub starting_trust: i32,
    #[serde(default)]
    pub arrival_message: String,
}

impl CompanionPool {
    const fn default_max() -> usize {
        DEFAULT_MAX_COMPANIONS
    }

    const fn default_trust() -> i32 {
        NEW_COMPANION_TRUST
    }

    #[must_use]
    pub fn skill(&self, name: &str) -> Option<&SkillDef> {
        self.skills.iter().find(|skill| skill.name == name)
    }
}

/// Gathering tuning and messages. `{resource}` is replaced by the resource
/// name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatherDef {
    pub resources: Vec<String>,
    #[serde(default = "GatherDef::default_base")]
    pub base_chance: f64,
    #[serde(default = "GatherDef::default_step")]
    pub level_step: f64,
    #[serde(default = "GatherDef::default_cap")]
    pub chance_cap: f64,
    #[serde(default = "GatherDef::default_bonus_key")]
    pub bonus_key: String,
    #[serde(default = "GatherDef::default_yield_base")]
    pub yield_base: i32,
    #[serde(default = "GatherDef::default_yield_variance")]
    pub yield_variance: i32,
    #[serde(default)]
    pub success: String,
    #[serde(default)]
    pub failure: String,
}

impl GatherDef {
    const fn default_base() -> f64 {
        GATHER_BASE_CHANCE
    }

    const fn default_step() -> f64 {
        GATHER_LEVEL_STEP
    }

    const fn default_cap() -> f64 {
        GATHER_CHANCE_CAP
    }

    fn default_bonus_key() -> String {
        String::from(GATHER_BONUS_KEY)
    }

    const fn default_yield_base() -> i32 {
        GATHER_YIELD_BASE
    }

    const fn default_yield_variance() -> i32 {
        GATHER_YIELD_VARIANCE
    }
}

/// Maintenance of a standing concept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurifyDef {
    pub cost: BTreeMap<String, i32>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub shortfall: String,
}

/// Daily upkeep drawn per companion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpkeepDef {
    #[serde(default = "UpkeepDef::default_resource")]
    pub resource: String,
    #[serde(default = "UpkeepDef::default_per_companion")]
    pub per_companion: i32,
    #[serde(default = "UpkeepDef::default_penalty_stat")]
    pub penalty_stat: String,
    #[serde(default = "UpkeepDef::default_penalty")]
    pub penalty: i32,
    #[serde(default)]
    pub warning: String,
}

impl UpkeepDef {
    fn default_resource() -> String {
        String::from(UPKEEP_RESOURCE)
    }

    const fn default_per_companion() -> i32 {
        UPKEEP_PER_COMPANION
    }

    fn default_penalty_stat() -> String {
        String::from(UPKEEP_PENALTY_STAT)
    }

    const fn default_penalty() -> i32 {
        UPKEEP_HARMONY_PENALTY
    }
}

impl Default for UpkeepDef {
    fn default() -> Self {
        Self {
            resource: Self::default_resource(),
            per_companion: Self::default_per_companion(),
            penalty_stat: Self::default_penalty_stat(),
            penalty: Self::default_penalty(),
            warning: String::new(),
        }
    }
}

/// Score band of the sequence minigame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardTier {
    pub min_score: u32,
    #[serde(default)]
    pub effects: Vec<EffectSpec>,
    #[serde(default)]
    pub message: String,
}

/// Minigame flavors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MinigameKind {
    /// Memorize and repeat a growing symbol sequence.
    Sequence {
        symbols: Vec<String>,
        #[serde(default = "MinigameKind::default_base_length")]
        base_length: usize,
        #[serde(default = "MinigameKind::default_points")]
        points_per_symbol: u32,
        tiers: Vec<RewardTier>,
    },
    /// Ends on request with a fixed score and reward.
    Fixed {
        score: u32,
        #[serde(default)]
        effects: Vec<EffectSpec>,
        #[serde(default)]
        message: String,
    },
}

impl MinigameKind {
    const fn default_base_length() -> usize {
        3
    }

    const fn default_points() -> u32 {
        10
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinigameDef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub kind: MinigameKind,
}

/// Complete content pack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentPack {
    pub stats: Vec<MeterDef>,
    pub resources: Vec<MeterDef>,
    pub concepts: Vec<ConceptDef>,
    pub companions: CompanionPool,
    pub actions: BTreeMap<String, ActionDef>,
    /// Action ids offered by the deep exploration menu.
    #[serde(default)]
    pub exploration: Vec<String>,
    pub events: Vec<EventDef>,
    #[serde(default)]
    pub stat_rules: Vec<StatRule>,
    #[serde(default)]
    pub endings: Vec<EndingDef>,
    #[serde(default)]
    pub minigames: Vec<MinigameDef>,
    #[serde(default)]
    pub upkeep: UpkeepDef,
    pub gathering: GatherDef,
    pub purify: PurifyDef,
    #[serde(default)]
    pub day_message: String,
    #[serde(default)]
    pub collapse_message: String,
}

impl ContentPack {
    /// Parse a content pack from JSON without validating it.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into a content pack.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Parse and validate a content pack.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails or the pack violates a structural
    /// rule (see [`ContentPack::validate`]).
    pub fn load(json: &str) -> Result<Self, ContentError> {
        let pack = Self::from_json(json)?;
        pack.validate()?;
        Ok(pack)
    }

    /// The pack embedded in the crate.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded asset fails to parse or validate.
    pub fn builtin() -> Result<Self, ContentError> {
        Self::load(BUILTIN_CONTENT)
    }

    #[must_use]
    pub fn stat(&self, id: &str) -> Option<&MeterDef> {
        self.stats.iter().find(|stat| stat.id == id)
    }

    #[must_use]
    pub fn resource(&self, id: &str) -> Option<&MeterDef> {
        self.resources.iter().find(|resource| resource.id == id)
    }

    #[must_use]
    pub fn concept(&self, key: &str) -> Option<&ConceptDef> {
        self.concepts.iter().find(|concept| concept.key == key)
    }

    #[must_use]
    pub fn action(&self, id: &str) -> Option<&ActionDef> {
        self.actions.get(id)
    }

    #[must_use]
    pub fn event(&self, id: &str) -> Option<&EventDef> {
        self.events.iter().find(|event| event.id == id)
    }

    #[must_use]
    pub fn ending(&self, scene: &str) -> Option<&EndingDef> {
        self.endings.iter().find(|ending| ending.scene == scene)
    }

    #[must_use]
    pub fn minigame(&self, id: &str) -> Option<&MinigameDef> {
        self.minigames.iter().find(|game| game.id == id)
    }

    /// Check structural rules: every table has an unconditional entry, and
    /// every stat, resource, concept and action reference resolves.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn validate(&self) -> Result<(), ContentError> {
        if self.stats.is_empty() {
            return Err(ContentError::NoStats);
        }
        let refs = RefIndex::new(self);

        for (id, action) in &self.actions {
            let table = format!("actions.{id}");
            if !action.outcomes.iter().any(|entry| entry.when.is_empty()) {
                return Err(ContentError::MissingFallback { table });
            }
            for resource in action.cost.resources.keys() {
                refs.resource(&table, resource)?;
            }
            for entry in &action.outcomes {
                refs.conditions(&table, &entry.when)?;
                refs.effects(&table, &entry.effects)?;
            }
        }

        if !self.events.iter().any(|event| event.when.is_empty()) {
            return Err(ContentError::MissingFallback {
                table: String::from("events"),
            });
        }
        for event in &self.events {
            let table = format!("events.{}", event.id);
            refs.conditions(&table, &event.when)?;
            refs.effects(&table, &event.on_trigger)?;
            for response in &event.responses {
                refs.action(&table, response)?;
            }
        }
        for activity in &self.exploration {
            refs.action("exploration", activity)?;
        }

        for rule in &self.stat_rules {
            let table = format!("stat_rules.{}", rule.stat);
            refs.stat(&table, &rule.stat)?;
            for cascade in rule.high.iter().chain(rule.low.iter()) {
                refs.effects(&table, &cascade.effects)?;
            }
        }
        for ending in &self.endings {
            refs.conditions(&format!("endings.{}", ending.scene), &ending.when)?;
        }
        for concept in &self.concepts {
            let table = format!("concepts.{}", concept.key);
            for resource in concept.cost.keys() {
                refs.resource(&table, resource)?;
            }
            if let Some(required) = &concept.requires {
                refs.concept(&table, required)?;
            }
            refs.effects(&table, &concept.rewards)?;
        }
        for skill in &self.companions.skills {
            if let Some(resource) = &skill.resource {
                refs.resource("companions.skills", resource)?;
            }
        }
        for resource in &self.gathering.resources {
            refs.resource("gathering", resource)?;
        }
        for resource in self.purify.cost.keys() {
            refs.resource("purify", resource)?;
        }
        refs.resource("upkeep", &self.upkeep.resource)?;
        refs.stat("upkeep", &self.upkeep.penalty_stat)?;
        for game in &self.minigames {
            let table = format!("minigames.{}", game.id);
            match &game.kind {
                MinigameKind::Sequence { tiers, .. } => {
                    for tier in tiers {
                        refs.effects(&table, &tier.effects)?;
                    }
                }
                MinigameKind::Fixed { effects, .. } => refs.effects(&table, effects)?,
            }
        }
        Ok(())
    }
}

struct RefIndex<'a> {
    stats: BTreeSet<&'a str>,
    resources: BTreeSet<&'a str>,
    concepts: BTreeSet<&'a str>,
    actions: BTreeSet<&'a str>,
}

impl<'a> RefIndex<'a> {
    fn new(pack: &'a ContentPack) -> Self {
        Self {
            stats: pack.stats.iter().map(|stat| stat.id.as_str()).collect(),
            resources: pack.resources.iter().map(|res| res.id.as_str()).collect(),
            concepts: pack.concepts.iter().map(|c| c.key.as_str()).collect(),
            actions: pack.actions.keys().map(String::as_str).collect(),
        }
    }

    fn stat(&self, table: &str, stat: &str) -> Result<(), ContentError> {
        if self.stats.contains(stat) {
            Ok(())
        } else {
            Err(ContentError::UnknownStat {
                table: table.to_string(),
                stat: stat.to_string(),
            })
        }
    }

    fn resource(&self, table: &str, resource: &str) -> Result<(), ContentError> {
        if self.resources.contains(resource) {
            Ok(())
        } else {
            Err(ContentError::UnknownResource {
                table: table.to_string(),
                resource: resource.to_string(),
            })
        }
    }

    fn concept(&self, table: &str, concept: &str) -> Result<(), ContentError> {
        if self.concepts.contains(concept) {
            Ok(())
        } else {
            Err(ContentError::UnknownConcept {
                table: table.to_string(),
                concept: concept.to_string(),
            })
        }
    }

    fn action(&self, table: &str, action: &str) -> Result<(), ContentError> {
        if self.actions.contains(action) {
            Ok(())
        } else {
            Err(ContentError::UnknownAction {
                table: table.to_string(),
                action: action.to_string(),
            })
        }
    }

    fn conditions(&self, table: &str, conditions: &[Condition]) -> Result<(), ContentError> {
        for condition in conditions {
            match condition {
                Condition::StatBelow { stat, .. }
                | Condition::StatAbove { stat, .. }
                | Condition::StatAtLeast { stat, .. }
                | Condition::StatAtMost { stat, .. } => self.stat(table, stat)?,
                Condition::ResourceBelow { resource, .. }
                | Condition::ResourceBelowPerCompanion { resource, .. } => {
                    self.resource(table, resource)?;
                }
                Condition::ConceptBuilt { concept } => self.concept(table, concept)?,
                Condition::AnyOf(inner) => self.conditions(table, inner)?,
                Condition::CompanionsAtLeast { .. }
                | Condition::CompanionRoomAvailable
                | Condition::AnyCompanionTrustBelow { .. }
                | Condition::SubjectTrustBelow { .. }
                | Condition::SubjectPersonality { .. }
                | Condition::SubjectSkill { .. } => {}
            }
        }
        Ok(())
    }

    fn target(&self, table: &str, target: &Target) -> Result<(), ContentError> {
        match target {
            Target::Stat(stat) => self.stat(table, stat),
            Target::Resource(resource) => self.resource(table, resource),
            Target::Focus
            | Target::SubjectTrust
            | Target::OtherTrust
            | Target::FirstTrustBelow(_)
            | Target::AllTrust
            | Target::BuiltConcepts => Ok(()),
        }
    }

    fn effects(&self, table: &str, effects: &[EffectSpec]) -> Result<(), ContentError> {
        for effect in effects {
            match effect {
                EffectSpec::Gain { target, .. }
                | EffectSpec::Lose { target, .. }
                | EffectSpec::Shift { target, .. } => self.target(table, target)?,
                EffectSpec::Chance {
                    probability,
                    effects,
                    ..
                } => {
                    if !(0.0..=1.0).contains(probability) {
                        return Err(ContentError::Probability {
                            table: table.to_string(),
                            value: *probability,
                        });
                    }
                    self.effects(table, effects)?;
                }
                EffectSpec::Bonus { .. } | EffectSpec::MaxFocus { .. } | EffectSpec::StageCompanion => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "stats": [{"id": "insight", "name": "Insight", "start": 50}],
        "resources": [{"id": "knowledge", "name": "Knowledge", "start": 10}],
        "concepts": [],
        "companions": {
            "starting": [],
            "names": ["Aron"],
            "personalities": ["mystic"],
            "skills": [{"name": "insight", "resource": "knowledge"}]
        },
        "actions": {
            "meditate": {
                "outcomes": [
                    {"id": "calm", "weight": 1, "effects": [
                        {"gain": {"target": {"stat": "insight"}, "base": 5, "variance": 2}}
                    ]}
                ]
            }
        },
        "events": [{"id": "intro", "weight": 0}],
        "upkeep": {"resource": "knowledge", "penalty_stat": "insight"},
        "gathering": {"resources": ["knowledge"]},
        "purify": {"cost": {"knowledge": 10}}
    }"#;

    #[test]
    fn minimal_pack_parses_with_defaults() {
        let pack = ContentPack::load(MINIMAL).unwrap();
        assert_eq!(pack.companions.max, DEFAULT_MAX_COMPANIONS);
        assert_eq!(pack.companions.skills[0].amount, 1);
        assert_eq!(pack.upkeep.per_companion, UPKEEP_PER_COMPANION);
        assert!((pack.gathering.chance_cap - GATHER_CHANCE_CAP).abs() < f64::EPSILON);
        assert_eq!(
            pack.actions["meditate"].outcomes[0].effects[0],
            EffectSpec::Gain {
                target: Target::Stat(String::from("insight")),
                base: 5,
                variance: 2
            }
        );
    }

    #[test]
    fn tables_without_fallback_are_rejected() {
        let mut pack = ContentPack::from_json(MINIMAL).unwrap();
        pack.events[0].when = vec![Condition::CompanionRoomAvailable];
        assert!(matches!(
            pack.validate(),
            Err(ContentError::MissingFallback { table }) if table == "events"
        ));
    }

    #[test]
    fn unknown_references_are_rejected() {
        let mut pack = ContentPack::from_json(MINIMAL).unwrap();
        pack.stat_rules.push(StatRule {
            stat: String::from("courage"),
            high: None,
            low: None,
        });
        assert!(matches!(
            pack.validate(),
            Err(ContentError::UnknownStat { stat, .. }) if stat == "courage"
        ));
    }

    #[test]
    fn chance_probability_must_be_a_probability() {
        let mut pack = ContentPack::from_json(MINIMAL).unwrap();
        pack.events[0].on_trigger.push(EffectSpec::Chance {
            probability: 1.5,
            effects: Vec::new(),
            message: String::new(),
        });
        assert!(matches!(
            pack.validate(),
            Err(ContentError::Probability { .. })
        ));
    }

    #[test]
    fn conditions_use_tagged_json() {
        let parsed: Vec<Condition> = serde_json::from_str(
            r#"[
                "companion_room_available",
                {"stat_below": {"stat": "harmony", "value": 40}},
                {"any_of": [{"concept_built": {"concept": "vision_altar"}}]}
            ]"#,
        )
        .unwrap();
        assert_eq!(parsed[0], Condition::CompanionRoomAvailable);
        assert!(matches!(&parsed[2], Condition::AnyOf(inner) if inner.len() == 1));
    }

    #[test]
    fn builtin_pack_is_valid() {
        let pack = ContentPack::builtin().unwrap();
        assert_eq!(pack.stats.len(), 5);
        assert!(pack.event("intro").is_some());
    }
}
