//! Weighted outcome selection over condition-gated tables.
//!
//! Eligible entries keep their table order. A single draw `r = u * total`
//! picks the first entry whose running weight exceeds `r`. When nothing
//! eligible carries weight, the first unconditional entry wins without a
//! draw.

use rand::RngCore;

use crate::companions::Companion;
use crate::data::{Condition, EventDef, OutcomeEntry};
use crate::numbers::usize_to_i32;
use crate::rng::next_unit;
use crate::state::PlayerState;

/// What conditions are evaluated against.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    pub state: &'a PlayerState,
    pub subject: Option<&'a Companion>,
}

impl<'a> Scope<'a> {
    #[must_use]
    pub const fn new(state: &'a PlayerState) -> Self {
        Self {
            state,
            subject: None,
        }
    }

    #[must_use]
    pub const fn with_subject(state: &'a PlayerState, subject: Option<&'a Companion>) -> Self {
        Self { state, subject }
    }
}

impl Condition {
    #[must_use]
    pub fn holds(&self, scope: &Scope<'_>) -> bool {
        let state = scope.state;
        match self {
            Self::StatBelow { stat, value } => state.stat(stat) < *value,
            Self::StatAbove { stat, value } => state.stat(stat) > *value,
            Self::StatAtLeast { stat, value } => state.stat(stat) >= *value,
            Self::StatAtMost { stat, value } => state.stat(stat) <= *value,
            Self::ResourceBelow { resource, value } => state.resource(resource) < *value,
            Self::ResourceBelowPerCompanion { resource, factor } => {
                let companions = usize_to_i32(state.companions.len());
                state.resource(resource) < factor.saturating_mul(companions)
            }
            Self::CompanionsAtLeast { count } => state.companions.len() >= *count,
            Self::CompanionRoomAvailable => state.has_companion_room(),
            Self::AnyCompanionTrustBelow { value } => {
                state.companions.iter().any(|companion| companion.trust < *value)
            }
            Self::SubjectTrustBelow { value } => {
                scope.subject.is_some_and(|subject| subject.trust < *value)
            }
            Self::SubjectPersonality { personality } => scope
                .subject
                .is_some_and(|subject| subject.personality == *personality),
            Self::SubjectSkill { skill } => {
                scope.subject.is_some_and(|subject| subject.skill == *skill)
            }
            Self::ConceptBuilt { concept } => state.concept_standing(concept),
            Self::AnyOf(inner) => inner.iter().any(|condition| condition.holds(scope)),
        }
    }
}

/// All conditions hold.
#[must_use]
pub fn all_hold(conditions: &[Condition], scope: &Scope<'_>) -> bool {
    conditions.iter().all(|condition| condition.holds(scope))
}

/// A table row the selector can draw from.
pub trait Weighted {
    fn id(&self) -> &str;
    fn weight(&self) -> u32;
    fn conditions(&self) -> &[Condition];
}

impl Weighted for OutcomeEntry {
    fn id(&self) -> &str {
        &self.id
    }

    fn weight(&self) -> u32 {
        self.weight
    }

    fn conditions(&self) -> &[Condition] {
        &self.when
    }
}

impl Weighted for EventDef {
    fn id(&self) -> &str {
        &self.id
    }

    fn weight(&self) -> u32 {
        self.weight
    }

    fn conditions(&self) -> &[Condition] {
        &self.when
    }
}

/// Selector result: the chosen entry, its table index and the roll that
/// chose it (`None` when the fallback resolved without a draw).
#[derive(Debug, Clone, Copy)]
pub struct Selection<'a, T> {
    pub entry: &'a T,
    pub index: usize,
    pub roll: Option<f64>,
}

/// Pick one entry from `table`. Returns `None` only for a table with no
/// eligible weight and no unconditional entry, which validated content
/// never has.
pub fn select<'a, T, R>(table: &'a [T], scope: &Scope<'_>, rng: &mut R) -> Option<Selection<'a, T>>
where
    T: Weighted,
    R: RngCore + ?Sized,
{
    let eligible: Vec<(usize, &T)> = table
        .iter()
        .enumerate()
        .filter(|(_, entry)| all_hold(entry.conditions(), scope))
        .collect();
    let total: u64 = eligible.iter().map(|(_, entry)| u64::from(entry.weight())).sum();

    if total == 0 {
        let picked = fallback(table);
        if let Some(selection) = &picked {
            log::debug!("selection fell back to {}", selection.entry.id());
        }
        return picked;
    }

    #[allow(clippy::cast_precision_loss)]
    let roll = next_unit(rng) * total as f64;
    let mut cumulative = 0_u64;
    for (index, entry) in &eligible {
        cumulative += u64::from(entry.weight());
        #[allow(clippy::cast_precision_loss)]
        let bound = cumulative as f64;
        if roll < bound {
            log::debug!(
                "selected {} (roll {roll:.3} of {total}, {} eligible)",
                entry.id(),
                eligible.len()
            );
            return Some(Selection {
                entry: *entry,
                index: *index,
                roll: Some(roll),
            });
        }
    }

    fallback(table).map(|selection| Selection {
        roll: Some(roll),
        ..selection
    })
}

fn fallback<T: Weighted>(table: &[T]) -> Option<Selection<'_, T>> {
    table
        .iter()
        .enumerate()
        .find(|(_, entry)| entry.conditions().is_empty())
        .map(|(index, entry)| Selection {
            entry,
            index,
            roll: None,
        })
}
