//! Effect application and the change ledger behind every message.

use rand::RngCore;
use smallvec::SmallVec;

use crate::companions::draft_companion;
use crate::data::{ContentPack, EffectSpec, Target};
use crate::rng::{next_unit, random_range};
use crate::state::PlayerState;

/// One applied delta, labelled for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub label: String,
    pub amount: i32,
}

pub type ChangeSet = SmallVec<[Change; 6]>;

/// Everything an effect list did: numeric changes plus extra message
/// fragments from chance rolls and collapses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Applied {
    pub changes: ChangeSet,
    pub notes: Vec<String>,
}

impl Applied {
    fn record(&mut self, label: impl Into<String>, amount: i32) {
        if amount != 0 {
            self.changes.push(Change {
                label: label.into(),
                amount,
            });
        }
    }

    /// Net change recorded under `label`.
    #[must_use]
    pub fn net(&self, label: &str) -> i32 {
        self.changes
            .iter()
            .filter(|change| change.label == label)
            .map(|change| change.amount)
            .sum()
    }

    /// `(+5 Insight, -3 Harmony)`, or empty when nothing changed.
    #[must_use]
    pub fn suffix(&self) -> String {
        if self.changes.is_empty() {
            return String::new();
        }
        let parts: Vec<String> = self
            .changes
            .iter()
            .map(|change| format!("{:+} {}", change.amount, change.label))
            .collect();
        format!("({})", parts.join(", "))
    }

    /// Compose `text`, the change suffix and any notes into one message.
    #[must_use]
    pub fn describe(&self, text: &str) -> String {
        let suffix = self.suffix();
        join_fragments(
            std::iter::once(text)
                .chain(std::iter::once(suffix.as_str()))
                .chain(self.notes.iter().map(String::as_str)),
        )
    }
}

/// Join non-empty fragments with single spaces.
pub fn join_fragments<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    parts
        .into_iter()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Replace the `{companion}` placeholder.
#[must_use]
pub fn render(template: &str, companion: Option<&str>) -> String {
    match companion {
        Some(name) => template.replace("{companion}", name),
        None => template.to_string(),
    }
}

/// Who an effect list is about.
#[derive(Debug, Clone, Copy)]
pub struct EffectContext<'a> {
    pub content: &'a ContentPack,
    pub subject: Option<&'a str>,
    pub other: Option<&'a str>,
}

impl<'a> EffectContext<'a> {
    #[must_use]
    pub const fn new(content: &'a ContentPack) -> Self {
        Self {
            content,
            subject: None,
            other: None,
        }
    }

    #[must_use]
    pub const fn with_subject(mut self, subject: Option<&'a str>) -> Self {
        self.subject = subject;
        self
    }

    #[must_use]
    pub const fn with_other(mut self, other: Option<&'a str>) -> Self {
        self.other = other;
        self
    }
}

/// Apply `effects` in order, drawing from `rng` as each one requires.
pub fn apply_effects<R: RngCore + ?Sized>(
    state: &mut PlayerState,
    effects: &[EffectSpec],
    ctx: &EffectContext<'_>,
    rng: &mut R,
    applied: &mut Applied,
) {
    for effect in effects {
        apply_effect(state, effect, ctx, rng, applied);
    }
}

fn apply_effect<R: RngCore + ?Sized>(
    state: &mut PlayerState,
    effect: &EffectSpec,
    ctx: &EffectContext<'_>,
    rng: &mut R,
    applied: &mut Applied,
) {
    match effect {
        EffectSpec::Gain {
            target,
            base,
            variance,
        } => apply_rolled(state, target, *base, *variance, 1, ctx, rng, applied),
        EffectSpec::Lose {
            target,
            base,
            variance,
        } => apply_rolled(state, target, *base, *variance, -1, ctx, rng, applied),
        EffectSpec::Shift { target, amount } => apply_delta(state, target, *amount, ctx, applied),
        EffectSpec::Bonus { key, points } => {
            let entry = state.daily_bonus.entry(key.clone()).or_insert(0);
            *entry = entry.saturating_add(*points);
        }
        EffectSpec::MaxFocus { delta, floor } => {
            let before = state.max_focus;
            if *delta > 0 {
                state.max_focus = state.max_focus.saturating_add(*delta);
                state.focus = state.max_focus;
            } else {
                state.max_focus = state.max_focus.saturating_add(*delta).max(*floor);
                state.focus = state.focus.min(state.max_focus);
            }
            applied.record("Max Focus", state.max_focus - before);
        }
        EffectSpec::Chance {
            probability,
            effects,
            message,
        } => {
            if next_unit(rng) < *probability {
                apply_effects(state, effects, ctx, rng, applied);
                if !message.is_empty() {
                    applied.notes.push(message.clone());
                }
            }
        }
        EffectSpec::StageCompanion => {
            let drafted = draft_companion(&ctx.content.companions, &state.companions, state.day, rng);
            if let Some(companion) = &drafted {
                log::debug!("staged companion {} ({})", companion.name, companion.id);
            }
            state.pending_companion = drafted;
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn apply_rolled<R: RngCore + ?Sized>(
    state: &mut PlayerState,
    target: &Target,
    base: i32,
    variance: i32,
    sign: i32,
    ctx: &EffectContext<'_>,
    rng: &mut R,
    applied: &mut Applied,
) {
    if matches!(target, Target::AllTrust) {
        for idx in 0..state.companions.len() {
            let amount = random_range(rng, base, variance) * sign;
            if let Some(companion) = state.companions.get_mut(idx) {
                let delta = companion.adjust_trust(amount);
                applied.record(format!("{} trust", companion.name), delta);
            }
        }
        return;
    }
    let amount = random_range(rng, base, variance) * sign;
    apply_delta(state, target, amount, ctx, applied);
}

fn apply_delta(
    state: &mut PlayerState,
    target: &Target,
    amount: i32,
    ctx: &EffectContext<'_>,
    applied: &mut Applied,
) {
    match target {
        Target::Stat(id) => {
            let delta = state.adjust_stat(id, amount);
            applied.record(meter_name(ctx.content.stat(id).map(|m| m.name.as_str()), id), delta);
        }
        Target::Resource(id) => {
            let delta = state.adjust_resource(id, amount);
            applied.record(
                meter_name(ctx.content.resource(id).map(|m| m.name.as_str()), id),
                delta,
            );
        }
        Target::Focus => {
            let delta = state.adjust_focus(amount);
            applied.record("Focus", delta);
        }
        Target::SubjectTrust => adjust_named_trust(state, ctx.subject, amount, applied),
        Target::OtherTrust => adjust_named_trust(state, ctx.other, amount, applied),
        Target::FirstTrustBelow(limit) => {
            let id = state
                .companions
                .iter()
                .find(|companion| companion.trust < *limit)
                .map(|companion| companion.id.clone());
            adjust_named_trust(state, id.as_deref(), amount, applied);
        }
        Target::AllTrust => {
            for companion in &mut state.companions {
                let delta = companion.adjust_trust(amount);
                applied.record(format!("{} trust", companion.name), delta);
            }
        }
        Target::BuiltConcepts => {
            let mut total = 0;
            for (key, concept) in &mut state.concepts {
                if !concept.built {
                    continue;
                }
                total += concept.adjust_durability(amount);
                if !concept.built {
                    let name = ctx.content.concept(key).map_or(key.as_str(), |c| c.name.as_str());
                    applied
                        .notes
                        .push(ctx.content.collapse_message.replace("{concept}", name));
                }
            }
            applied.record("Durability", total);
        }
    }
}

fn adjust_named_trust(state: &mut PlayerState, id: Option<&str>, amount: i32, applied: &mut Applied) {
    let Some(id) = id else {
        return;
    };
    if let Some(companion) = state.companion_mut(id) {
        let delta = companion.adjust_trust(amount);
        applied.record(format!("{} trust", companion.name), delta);
    }
}

fn meter_name<'a>(name: Option<&'a str>, id: &'a str) -> &'a str {
    name.unwrap_or(id)
}
