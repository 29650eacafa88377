use std::fmt;
use std::str::FromStr;

use anyhow::bail;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use sanctum_game::data::SubjectRule;
use sanctum_game::{Action, ContentPack, MinigameInput, MinigamePhase, PlayerState};

/// Sequence games are abandoned once they reach this stage.
const SEQUENCE_STAGE_LIMIT: u32 = 2;
/// Durability below which a built concept gets purified.
const PURIFY_BELOW: i32 = 70;

/// Policy interface for automated play strategies.
pub trait PlayerPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Next action to take today, or `None` to end the day.
    fn next_action(&mut self, state: &PlayerState, content: &ContentPack) -> Option<Action>;
}

/// Built-in gameplay strategies for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameplayStrategy {
    Balanced,
    Random,
    Idle,
}

impl GameplayStrategy {
    pub const ALL: [Self; 3] = [Self::Balanced, Self::Random, Self::Idle];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Balanced => "Balanced",
            Self::Random => "Random",
            Self::Idle => "Idle",
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn PlayerPolicy> {
        match self {
            Self::Balanced => Box::new(BalancedPolicy),
            Self::Random => Box::new(RandomPolicy::new(seed)),
            Self::Idle => Box::new(IdlePolicy),
        }
    }
}

impl fmt::Display for GameplayStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for GameplayStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "balanced" => Ok(Self::Balanced),
            "random" => Ok(Self::Random),
            "idle" => Ok(Self::Idle),
            other => bail!("Unknown strategy: {other}"),
        }
    }
}

struct BalancedPolicy;
struct IdlePolicy;

struct RandomPolicy {
    rng: ChaCha20Rng,
}

impl RandomPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }
}

impl PlayerPolicy for BalancedPolicy {
    fn name(&self) -> &'static str {
        "Balanced"
    }

    fn next_action(&mut self, state: &PlayerState, content: &ContentPack) -> Option<Action> {
        if let Some(action) = minigame_move(state) {
            return Some(action);
        }
        if state.pending_companion.is_some() {
            return Some(if state.has_companion_room() {
                Action::WelcomeCompanion
            } else {
                Action::RejectCompanion
            });
        }
        if state.focus <= 0 {
            return None;
        }
        if let Some(action) = event_responses(state, content).into_iter().next() {
            return Some(action);
        }
        let flags = state.daily_flags;
        if !flags.meditated {
            return Some(Action::Meditate);
        }
        if !flags.talked && !state.companions.is_empty() {
            return Some(Action::TalkToCompanion);
        }
        if let Some(concept) = purify_candidate(state, content) {
            return Some(Action::Purify { concept });
        }
        if let Some(concept) = affordable_concepts(state, content).into_iter().next() {
            return Some(Action::Build { concept });
        }
        if !flags.minigame_played && !content.minigames.is_empty() {
            return Some(Action::PlayMinigame);
        }
        if !flags.discussed && state.companions.len() > 1 {
            return Some(Action::HoldDiscussion);
        }
        content
            .gathering
            .resources
            .iter()
            .min_by_key(|resource| state.resource(resource))
            .map(|resource| Action::Gather {
                resource: resource.clone(),
            })
    }
}

impl PlayerPolicy for RandomPolicy {
    fn name(&self) -> &'static str {
        "Random"
    }

    fn next_action(&mut self, state: &PlayerState, content: &ContentPack) -> Option<Action> {
        if let Some(action) = minigame_move(state) {
            return Some(action);
        }
        if state.pending_companion.is_some() {
            let options = [
                Action::WelcomeCompanion,
                Action::ObserveCompanion,
                Action::RejectCompanion,
            ];
            return Some(options[self.rng.gen_range(0..options.len())].clone());
        }
        if state.focus <= 0 || self.rng.gen_ratio(1, 8) {
            return None;
        }
        let mut options = vec![
            Action::Meditate,
            Action::TalkToCompanion,
            Action::HoldDiscussion,
            Action::PlayMinigame,
        ];
        options.extend(event_responses(state, content));
        options.extend(content.gathering.resources.iter().map(|resource| Action::Gather {
            resource: resource.clone(),
        }));
        options.extend(
            affordable_concepts(state, content)
                .into_iter()
                .map(|concept| Action::Build { concept }),
        );
        options.extend(purify_candidate(state, content).map(|concept| Action::Purify { concept }));
        options.extend(content.exploration.iter().map(|activity| Action::Explore {
            activity: activity.clone(),
        }));
        let pick = self.rng.gen_range(0..options.len());
        Some(options.swap_remove(pick))
    }
}

impl PlayerPolicy for IdlePolicy {
    fn name(&self) -> &'static str {
        "Idle"
    }

    fn next_action(&mut self, _state: &PlayerState, _content: &ContentPack) -> Option<Action> {
        None
    }
}

/// Play an open minigame perfectly until the stage limit, then cash out.
fn minigame_move(state: &PlayerState) -> Option<Action> {
    let session = state.active_minigame()?;
    let input = match session.phase {
        MinigamePhase::Displaying => MinigameInput::RevealComplete,
        MinigamePhase::AwaitingInput
            if session.sequence.is_empty() || session.stage >= SEQUENCE_STAGE_LIMIT =>
        {
            MinigameInput::Finish
        }
        MinigamePhase::AwaitingInput => match session.sequence.get(session.input.len()) {
            Some(symbol) => MinigameInput::Enter {
                symbol: symbol.clone(),
            },
            None => MinigameInput::Submit,
        },
        MinigamePhase::Scored => return None,
    };
    Some(Action::Minigame(input))
}

/// Every response the active event offers, shaped for dispatch.
fn event_responses(state: &PlayerState, content: &ContentPack) -> Vec<Action> {
    let Some(event) = content.event(&state.scene) else {
        return Vec::new();
    };
    event
        .responses
        .iter()
        .filter_map(|response| {
            let def = content.action(response)?;
            match def.subject {
                SubjectRule::Named => match state.companions.as_slice() {
                    [first, second, ..] => Some(Action::SettleDispute {
                        first: first.id.clone(),
                        second: second.id.clone(),
                    }),
                    _ => None,
                },
                _ => Some(Action::Respond {
                    response: response.clone(),
                }),
            }
        })
        .collect()
}

fn affordable_concepts(state: &PlayerState, content: &ContentPack) -> Vec<String> {
    content
        .concepts
        .iter()
        .filter(|def| !state.concepts.get(&def.key).is_some_and(|c| c.built))
        .filter(|def| {
            def.requires
                .as_ref()
                .is_none_or(|required| state.concept_standing(required))
        })
        .filter(|def| {
            def.cost
                .iter()
                .all(|(resource, amount)| state.resource(resource) >= *amount)
        })
        .map(|def| def.key.clone())
        .collect()
}

fn purify_candidate(state: &PlayerState, content: &ContentPack) -> Option<String> {
    let affordable = content
        .purify
        .cost
        .iter()
        .all(|(resource, amount)| state.resource(resource) >= *amount);
    if !affordable {
        return None;
    }
    state
        .concepts
        .iter()
        .filter(|(_, concept)| concept.built && concept.durability < PURIFY_BELOW)
        .min_by_key(|(_, concept)| concept.durability)
        .map(|(key, _)| key.clone())
}
