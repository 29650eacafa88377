//! Sanctum Game Engine
//!
//! Platform-agnostic core of the Inner Sanctuary narrative game: a daily
//! seeded random stream, condition-gated weighted outcome tables, once per
//! day stat cascades and a flat action surface. Rendering and input live
//! elsewhere.

pub mod actions;
pub mod companions;
pub mod constants;
pub mod data;
pub mod effects;
pub mod encounters;
pub mod minigame;
pub mod numbers;
pub mod persistence;
pub mod resolver;
pub mod result;
pub mod rng;
pub mod rollover;
pub mod seed;
pub mod selection;
pub mod state;

use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;

// Re-export commonly used types
pub use actions::{Action, ActionContext, Menu, Step, gather_chance, perform};
pub use companions::Companion;
pub use data::{ContentError, ContentPack};
pub use minigame::{MinigameInput, MinigamePhase, MinigameSession};
pub use persistence::{FileStorage, GameStorage, MemoryStorage};
pub use result::{ResultSummary, result_summary};
pub use rng::{DailyRng, random_range};
pub use rollover::DayReport;
pub use seed::daily_seed;
pub use selection::{Scope, Selection, Weighted, select};
pub use state::{ConceptState, DailyFlags, PlayerState};

use crate::constants::SAVE_KEY;
use crate::rollover::{begin_new_date, is_ended, needs_new_date, roll_over};

/// Trait for abstracting content loading
/// Platform-specific implementations should provide this
pub trait DataLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load and validate the content pack.
    ///
    /// # Errors
    ///
    /// Returns an error if the content cannot be read, parsed or validated.
    fn load_content(&self) -> Result<ContentPack, Self::Error>;
}

/// The pack compiled into the crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinContent;

impl DataLoader for BuiltinContent {
    type Error = ContentError;

    fn load_content(&self) -> Result<ContentPack, Self::Error> {
        ContentPack::builtin()
    }
}

/// A pack read from a JSON file.
#[derive(Debug, Clone)]
pub struct FileContent {
    pub path: PathBuf,
}

impl DataLoader for FileContent {
    type Error = ContentError;

    fn load_content(&self) -> Result<ContentPack, Self::Error> {
        let json = std::fs::read_to_string(&self.path)?;
        ContentPack::load(&json)
    }
}

/// Main game engine: content, storage, the calendar date and the day's
/// random stream around one persistent [`PlayerState`].
pub struct GameEngine<L, S>
where
    L: DataLoader,
    S: GameStorage,
{
    data_loader: L,
    storage: S,
    content: ContentPack,
    state: PlayerState,
    rng: DailyRng,
    today: NaiveDate,
    message: String,
}

impl<L, S> GameEngine<L, S>
where
    L: DataLoader,
    S: GameStorage,
{
    /// Load content and the saved state, then run today's rollover if the
    /// save is new or was last played on another date.
    ///
    /// # Errors
    ///
    /// Returns an error if content cannot be loaded or storage fails.
    pub fn open(data_loader: L, storage: S, today: NaiveDate) -> anyhow::Result<Self> {
        let content = data_loader
            .load_content()
            .context("loading content pack")?;
        let restored = persistence::load_state(&storage, SAVE_KEY, &content, today)?;
        let rng = DailyRng::for_day(today, restored.state.day);
        let mut engine = Self {
            data_loader,
            storage,
            content,
            state: restored.state,
            rng,
            today,
            message: String::new(),
        };
        if restored.fresh {
            log::info!("starting a new sanctuary on {today}");
        }
        engine.sync_date(today)?;
        if engine.message.is_empty() {
            engine.message = rollover_scene_text(&engine.state, &engine.content);
        }
        Ok(engine)
    }

    /// Move the engine clock to `today`, rolling the day over once when the
    /// date changed. Returns the rollover report if one ran. An ended game
    /// stays on its ending scene.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting the new state fails.
    pub fn sync_date(&mut self, today: NaiveDate) -> anyhow::Result<Option<DayReport>> {
        self.today = today;
        if self.is_over() {
            return Ok(None);
        }
        let mut next = self.state.clone();
        if needs_new_date(&next, today) {
            begin_new_date(&mut next, today);
        }
        let report = roll_over(&mut next, &self.content, today, &mut self.rng);
        if next != self.state {
            self.state = next;
            self.persist()?;
        }
        if let Some(report) = &report {
            self.message.clone_from(&report.message);
        }
        Ok(report)
    }

    /// Perform one action against the current state and persist the result
    /// when it changed anything.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting the new state fails.
    pub fn dispatch(&mut self, action: &Action) -> anyhow::Result<&str> {
        let mut ctx = ActionContext {
            content: &self.content,
            today: self.today,
            rng: &mut self.rng,
        };
        let step = perform(&self.state, action, &mut ctx);
        if step.changed {
            self.state = step.state;
            self.persist()?;
        }
        self.message = step.message;
        Ok(&self.message)
    }

    /// Discard the save and start over on the current date.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails.
    pub fn reset(&mut self) -> anyhow::Result<&str> {
        self.storage
            .delete_snapshot(SAVE_KEY)
            .context("deleting snapshot")?;
        self.content = self
            .data_loader
            .load_content()
            .context("reloading content pack")?;
        self.state = PlayerState::new(&self.content, self.today);
        self.message.clear();
        self.sync_date(self.today)?;
        Ok(&self.message)
    }

    fn persist(&self) -> anyhow::Result<()> {
        persistence::save_state(&self.storage, SAVE_KEY, &self.state)
    }

    #[must_use]
    pub const fn state(&self) -> &PlayerState {
        &self.state
    }

    #[must_use]
    pub const fn content(&self) -> &ContentPack {
        &self.content
    }

    /// Latest rollover or action message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub const fn today(&self) -> NaiveDate {
        self.today
    }

    /// Draws taken from today's stream so far.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.rng.draws()
    }

    #[must_use]
    pub fn is_over(&self) -> bool {
        is_ended(&self.state, &self.content)
    }

    #[must_use]
    pub fn summary(&self) -> Option<ResultSummary> {
        result_summary(&self.state, &self.content)
    }
}

fn rollover_scene_text(state: &PlayerState, content: &ContentPack) -> String {
    if let Some(ending) = content.ending(&state.scene) {
        return ending.text.clone();
    }
    content
        .event(&state.scene)
        .map(|event| encounters::event_text(event, state))
        .unwrap_or_default()
}
