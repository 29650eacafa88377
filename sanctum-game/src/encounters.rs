//! Daily event selection and triggering.

use rand::RngCore;

use crate::data::{ContentPack, EventDef};
use crate::effects::{Applied, EffectContext, apply_effects, render};
use crate::selection::{Scope, select};
use crate::state::PlayerState;

/// Event chosen for the day together with the roll that chose it.
#[derive(Debug, Clone, PartialEq)]
pub struct EventPick {
    pub event_id: String,
    pub roll: Option<f64>,
    pub message: String,
}

/// Select today's event, make it the active scene and run its trigger
/// effects. Returns `None` only for content without a fallback event.
pub fn trigger_daily_event<R: RngCore + ?Sized>(
    state: &mut PlayerState,
    content: &ContentPack,
    rng: &mut R,
) -> Option<EventPick> {
    let (event, roll) = {
        let picked = select(&content.events, &Scope::new(state), rng)?;
        (picked.entry, picked.roll)
    };
    state.scene.clone_from(&event.id);

    let mut applied = Applied::default();
    apply_effects(
        state,
        &event.on_trigger,
        &EffectContext::new(content),
        rng,
        &mut applied,
    );
    let text = event_text(event, state);
    log::info!("day {} event: {}", state.day, event.id);
    Some(EventPick {
        event_id: event.id.clone(),
        roll,
        message: applied.describe(&text),
    })
}

/// Event text with the staged companion filled in.
#[must_use]
pub fn event_text(event: &EventDef, state: &PlayerState) -> String {
    let name = state.pending_companion.as_ref().map(|companion| companion.name.as_str());
    render(&event.text, name)
}
