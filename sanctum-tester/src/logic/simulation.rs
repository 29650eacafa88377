use std::collections::BTreeMap;
use std::fmt::Write as _;

use anyhow::Result;
use chrono::{Days, NaiveDate};
use sanctum_game::constants::{
    DURABILITY_MAX, DURABILITY_MIN, RESOURCE_FLOOR, STAT_MAX, STAT_MIN, TRUST_MAX, TRUST_MIN,
};
use sanctum_game::{BuiltinContent, ContentPack, GameEngine, MemoryStorage, PlayerState};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::logic::policy::GameplayStrategy;
use crate::logic::seeds::run_seed;

/// Stop a day after this many consecutive no-op actions.
const STALL_LIMIT: usize = 3;

/// Configuration for a simulation session.
#[derive(Debug, Clone, Copy)]
pub struct SimulationConfig {
    pub start: NaiveDate,
    pub days: u32,
    pub strategy: GameplayStrategy,
    pub max_actions_per_day: usize,
}

impl SimulationConfig {
    #[must_use]
    pub const fn new(start: NaiveDate, strategy: GameplayStrategy) -> Self {
        Self {
            start,
            days: 30,
            strategy,
            max_actions_per_day: 40,
        }
    }

    #[must_use]
    pub const fn with_days(mut self, days: u32) -> Self {
        self.days = days;
        self
    }
}

/// Outcome of one simulated run.
#[derive(Debug, Clone, Serialize)]
pub struct RunRecord {
    pub start: NaiveDate,
    pub strategy: String,
    pub days_played: u32,
    pub ending: Option<String>,
    pub actions: usize,
    pub rejected: usize,
    pub draws: u64,
    pub companions: usize,
    pub concepts_built: usize,
    pub stats: BTreeMap<String, i32>,
    pub resources: BTreeMap<String, i32>,
    /// SHA-256 over every message the run produced.
    pub digest: String,
    pub violations: Vec<String>,
}

/// Per-strategy rollup of many runs.
#[derive(Debug, Clone, Serialize)]
pub struct StrategySummary {
    pub strategy: String,
    pub runs: usize,
    pub survived: usize,
    pub endings: BTreeMap<String, usize>,
    pub mean_days: f64,
    pub mean_actions: f64,
    pub violations: usize,
}

/// Play `config.days` calendar days with the configured strategy against an
/// in-memory save.
///
/// # Errors
///
/// Returns an error if the engine cannot load content or persist state.
pub fn run_simulation(config: &SimulationConfig) -> Result<RunRecord> {
    let mut policy = config.strategy.create_policy(run_seed(config.start));
    let mut engine = GameEngine::open(BuiltinContent, MemoryStorage::default(), config.start)?;
    let mut hasher = Sha256::new();
    hasher.update(engine.message().as_bytes());

    let mut record = RunRecord {
        start: config.start,
        strategy: config.strategy.label().to_string(),
        days_played: 0,
        ending: None,
        actions: 0,
        rejected: 0,
        draws: 0,
        companions: 0,
        concepts_built: 0,
        stats: BTreeMap::new(),
        resources: BTreeMap::new(),
        digest: String::new(),
        violations: Vec::new(),
    };

    for offset in 0..config.days {
        if offset > 0 {
            let Some(today) = config.start.checked_add_days(Days::new(u64::from(offset))) else {
                break;
            };
            if let Some(report) = engine.sync_date(today)? {
                hasher.update(report.message.as_bytes());
            }
        }
        record.days_played = engine.state().day;
        note_violations(&mut record, engine.state(), engine.content());
        if engine.is_over() {
            break;
        }

        let mut stalls = 0;
        for _ in 0..config.max_actions_per_day {
            let Some(action) = policy.next_action(engine.state(), engine.content()) else {
                break;
            };
            let before = engine.state().clone();
            let message = engine.dispatch(&action)?;
            hasher.update(message.as_bytes());
            record.actions += 1;
            if engine.state() == &before {
                record.rejected += 1;
                stalls += 1;
                if stalls >= STALL_LIMIT {
                    log::debug!("{} stalled on day {}", policy.name(), before.day);
                    break;
                }
            } else {
                stalls = 0;
            }
            note_violations(&mut record, engine.state(), engine.content());
        }
        record.draws = record.draws.saturating_add(engine.draws());
        if engine.is_over() {
            break;
        }
    }

    let state = engine.state();
    record.ending = engine.summary().map(|summary| summary.ending);
    record.companions = state.companions.len();
    record.concepts_built = state.concepts.values().filter(|c| c.built).count();
    record.stats.clone_from(&state.stats);
    record.resources.clone_from(&state.resources);
    record.digest = hex(&hasher.finalize());
    log::info!(
        "{} from {}: day {} {}",
        record.strategy,
        record.start,
        record.days_played,
        record.ending.as_deref().unwrap_or("survived")
    );
    Ok(record)
}

fn note_violations(record: &mut RunRecord, state: &PlayerState, content: &ContentPack) {
    for violation in check_invariants(state, content) {
        log::warn!("day {}: {violation}", state.day);
        record.violations.push(format!("day {}: {violation}", state.day));
    }
}

/// Bounds every reachable state must respect.
#[must_use]
pub fn check_invariants(state: &PlayerState, content: &ContentPack) -> Vec<String> {
    let mut violations = Vec::new();
    for (id, value) in &state.stats {
        if !(STAT_MIN..=STAT_MAX).contains(value) {
            violations.push(format!("stat {id} out of bounds: {value}"));
        }
    }
    for (id, value) in &state.resources {
        if *value < RESOURCE_FLOOR && *id != content.upkeep.resource {
            violations.push(format!("resource {id} below floor: {value}"));
        }
    }
    for companion in &state.companions {
        if !(TRUST_MIN..=TRUST_MAX).contains(&companion.trust) {
            violations.push(format!("{} trust out of bounds: {}", companion.name, companion.trust));
        }
    }
    for (key, concept) in &state.concepts {
        if !(DURABILITY_MIN..=DURABILITY_MAX).contains(&concept.durability) {
            violations.push(format!("{key} durability out of bounds: {}", concept.durability));
        }
        if concept.built && concept.durability <= DURABILITY_MIN {
            violations.push(format!("{key} standing at zero durability"));
        }
    }
    if state.focus < 0 || state.focus > state.max_focus {
        violations.push(format!("focus {} outside 0..={}", state.focus, state.max_focus));
    }
    if state.companions.len() > content.companions.max {
        violations.push(format!("roster of {} exceeds {}", state.companions.len(), content.companions.max));
    }
    violations
}

/// Roll run records up per strategy, in first-seen order.
#[must_use]
pub fn summarize(records: &[RunRecord]) -> Vec<StrategySummary> {
    let mut summaries: Vec<StrategySummary> = Vec::new();
    for record in records {
        let index = if let Some(index) = summaries.iter().position(|s| s.strategy == record.strategy) {
            index
        } else {
            summaries.push(StrategySummary {
                strategy: record.strategy.clone(),
                runs: 0,
                survived: 0,
                endings: BTreeMap::new(),
                mean_days: 0.0,
                mean_actions: 0.0,
                violations: 0,
            });
            summaries.len() - 1
        };
        let summary = &mut summaries[index];
        summary.runs += 1;
        match &record.ending {
            Some(ending) => *summary.endings.entry(ending.clone()).or_default() += 1,
            None => summary.survived += 1,
        }
        summary.mean_days += f64::from(record.days_played);
        #[allow(clippy::cast_precision_loss)]
        {
            summary.mean_actions += record.actions as f64;
        }
        summary.violations += record.violations.len();
    }
    for summary in &mut summaries {
        #[allow(clippy::cast_precision_loss)]
        let runs = summary.runs.max(1) as f64;
        summary.mean_days /= runs;
        summary.mean_actions /= runs;
    }
    summaries
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, byte| {
        let _ = write!(out, "{byte:02x}");
        out
    })
}
