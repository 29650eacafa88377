//! Player actions as pure transitions over [`PlayerState`].
//!
//! [`perform`] never mutates its input: it clones the state, applies the
//! action to the clone and returns it with the message to show. Rejected
//! actions return an unchanged clone and take no draws.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DURABILITY_MAX, FOCUS_COST_PER_ACTION, SCENE_CONCEPTS, SCENE_EXPLORATION, SCENE_GATHERING,
    SCENE_INTRO, SCENE_MINIGAME_PREFIX,
};
use crate::data::{ActionDef, ContentPack, EffectSpec, SubjectRule, Target};
use crate::effects::{Applied, EffectContext, apply_effects, join_fragments, render};
use crate::minigame::{MinigameInput, MinigameSession, Transition, minigame_for_day, reward_for};
use crate::numbers::points_to_probability;
use crate::rng::{DailyRng, next_unit, pick_index};
use crate::rollover::{is_ended, manual_next_day};
use crate::selection::{Scope, select};
use crate::state::PlayerState;

const NOT_ENOUGH_FOCUS: &str = "You do not have enough focus.";
const GAME_ENDED: &str = "The sanctuary has fallen silent. Start a new game to continue.";
const UNKNOWN_ACTION: &str = "Nothing happens.";
const NO_COMPANIONS: &str = "There is no one in the sanctuary to talk to.";
const NOT_A_RESPONSE: &str = "That is not a way to respond right now.";
const NEEDS_TWO_COMPANIONS: &str = "Choose two different seekers to hear out.";
const ALREADY_BUILT: &str = "That concept already stands in the sanctuary.";
const MISSING_PREREQUISITE: &str = "Another concept must stand before this one can be built.";
const BUILD_SHORTFALL: &str = "You lack the resources to build it.";
const NOTHING_TO_PURIFY: &str = "That concept does not need purification.";
const NO_PENDING_COMPANION: &str = "No seeker is waiting for an answer.";
const NO_ROOM: &str = "The sanctuary has no room for another seeker.";
const OBSERVE_COMPANION: &str = "You decide to observe {companion} a little longer.";
const REJECT_COMPANION: &str = "You send {companion} on their way.";
const MINIGAME_PLAYED: &str = "You already played today's minigame.";
const NO_MINIGAME: &str = "There is no minigame running.";
const MINIGAME_REVEALED: &str = "Now repeat the symbols.";
const MINIGAME_CORRECT: &str = "Correct! On to the next stage.";
const MINIGAME_CLEARED: &str = "Input cleared.";
const MANUAL_CAP_REACHED: &str = "You cannot advance the day manually any more today. Try again tomorrow.";

/// Menus reachable without spending focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Menu {
    Intro,
    Gathering,
    Concepts,
    Exploration,
}

impl Menu {
    #[must_use]
    pub const fn scene(self) -> &'static str {
        match self {
            Self::Intro => SCENE_INTRO,
            Self::Gathering => SCENE_GATHERING,
            Self::Concepts => SCENE_CONCEPTS,
            Self::Exploration => SCENE_EXPLORATION,
        }
    }
}

/// Everything a player can do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Meditate,
    TalkToCompanion,
    HoldDiscussion,
    Gather { resource: String },
    Build { concept: String },
    Purify { concept: String },
    /// One of the deep exploration activities.
    Explore { activity: String },
    /// A response offered by the active daily event.
    Respond { response: String },
    /// Hear `first` out before `second` in a dispute.
    SettleDispute { first: String, second: String },
    WelcomeCompanion,
    ObserveCompanion,
    RejectCompanion,
    PlayMinigame,
    Minigame(MinigameInput),
    Navigate(Menu),
    NextDay,
}

/// Result of a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub state: PlayerState,
    pub message: String,
    pub changed: bool,
}

/// What an action runs against.
#[derive(Debug)]
pub struct ActionContext<'a> {
    pub content: &'a ContentPack,
    pub today: NaiveDate,
    pub rng: &'a mut DailyRng,
}

/// Apply `action` to a copy of `state`.
pub fn perform(state: &PlayerState, action: &Action, ctx: &mut ActionContext<'_>) -> Step {
    let mut next = state.clone();
    let message = if is_ended(state, ctx.content) {
        String::from(GAME_ENDED)
    } else {
        match apply(&mut next, action, ctx) {
            Ok(message) => message,
            Err(rejection) => {
                next = state.clone();
                rejection.to_string()
            }
        }
    };
    let changed = next != *state;
    log::debug!("{action:?} -> changed={changed}");
    Step {
        state: next,
        message,
        changed,
    }
}

type Outcome = Result<String, &'static str>;

fn apply(state: &mut PlayerState, action: &Action, ctx: &mut ActionContext<'_>) -> Outcome {
    match action {
        Action::Meditate => run_action(state, ctx, "meditate", None),
        Action::TalkToCompanion => run_action(state, ctx, "talk", None),
        Action::HoldDiscussion => run_action(state, ctx, "discussion", None),
        Action::Gather { resource } => gather(state, ctx, resource),
        Action::Build { concept } => build(state, ctx, concept),
        Action::Purify { concept } => purify(state, ctx, concept),
        Action::Explore { activity } => {
            if !ctx.content.exploration.contains(activity) {
                return Err(UNKNOWN_ACTION);
            }
            run_action(state, ctx, activity, None)
        }
        Action::Respond { response } => respond(state, ctx, response),
        Action::SettleDispute { first, second } => settle_dispute(state, ctx, first, second),
        Action::WelcomeCompanion => welcome(state, ctx.content),
        Action::ObserveCompanion => observe(state),
        Action::RejectCompanion => reject(state),
        Action::PlayMinigame => play_minigame(state, ctx),
        Action::Minigame(input) => minigame_input(state, ctx, input),
        Action::Navigate(menu) => {
            state.scene = String::from(menu.scene());
            Ok(String::new())
        }
        Action::NextDay => manual_next_day(state, ctx.content, ctx.today, ctx.rng)
            .map(|report| report.message)
            .ok_or(MANUAL_CAP_REACHED),
    }
}

fn spend_focus(state: &mut PlayerState) -> Result<(), &'static str> {
    if state.focus < FOCUS_COST_PER_ACTION {
        return Err(NOT_ENOUGH_FOCUS);
    }
    state.focus -= FOCUS_COST_PER_ACTION;
    Ok(())
}

/// Who a two-party action is about.
struct Parties {
    subject: String,
    other: String,
}

fn run_action(
    state: &mut PlayerState,
    ctx: &mut ActionContext<'_>,
    id: &str,
    parties: Option<Parties>,
) -> Outcome {
    let content = ctx.content;
    let def = content.action(id).ok_or(UNKNOWN_ACTION)?;
    if def.subject == SubjectRule::Random && state.companions.is_empty() {
        return Err(NO_COMPANIONS);
    }
    spend_focus(state)?;

    let (subject, other) = match (def.subject, parties) {
        (SubjectRule::Random, _) => {
            let idx = pick_index(ctx.rng, state.companions.len());
            let id = idx.and_then(|idx| state.companions.get(idx)).map(|c| c.id.clone());
            (id, None)
        }
        (SubjectRule::Named, Some(parties)) => (Some(parties.subject), Some(parties.other)),
        _ => (None, None),
    };
    let subject_name = subject
        .as_deref()
        .and_then(|id| state.companion(id))
        .map(|companion| companion.name.clone());

    if def.once_per_day && def.flag.is_some_and(|flag| state.daily_flags.is_set(flag)) {
        return Ok(render(&def.repeat_message, subject_name.as_deref()));
    }

    if !can_pay(state, def) {
        move_to_next_scene(state, def);
        return Ok(def.shortfall.clone());
    }
    pay(state, def);

    let entry = {
        let companion = subject.as_deref().and_then(|id| state.companion(id));
        select(&def.outcomes, &Scope::with_subject(state, companion), ctx.rng)
            .ok_or(UNKNOWN_ACTION)?
            .entry
    };
    let effect_ctx = EffectContext::new(content)
        .with_subject(subject.as_deref())
        .with_other(other.as_deref());
    let mut applied = Applied::default();
    apply_effects(state, &entry.effects, &effect_ctx, ctx.rng, &mut applied);

    if let Some(flag) = def.flag {
        state.daily_flags.set(flag);
    }
    move_to_next_scene(state, def);
    log::debug!("{id} resolved to {}", entry.id);
    Ok(applied.describe(&render(&entry.message, subject_name.as_deref())))
}

fn can_pay(state: &PlayerState, def: &ActionDef) -> bool {
    state.focus >= def.cost.focus
        && def
            .cost
            .resources
            .iter()
            .all(|(resource, amount)| state.resource(resource) >= *amount)
}

fn pay(state: &mut PlayerState, def: &ActionDef) {
    if def.cost.is_free() {
        return;
    }
    state.adjust_focus(-def.cost.focus.max(0));
    for (resource, amount) in &def.cost.resources {
        state.adjust_resource(resource, -*amount);
    }
}

fn move_to_next_scene(state: &mut PlayerState, def: &ActionDef) {
    if let Some(scene) = &def.next_scene {
        state.scene.clone_from(scene);
    }
}

fn respond(state: &mut PlayerState, ctx: &mut ActionContext<'_>, response: &str) -> Outcome {
    let content = ctx.content;
    let event = content.event(&state.scene).ok_or(NOT_A_RESPONSE)?;
    if !event.responses.iter().any(|offered| offered == response) {
        return Err(NOT_A_RESPONSE);
    }
    if content
        .action(response)
        .is_some_and(|def| def.subject == SubjectRule::Named)
    {
        return Err(NEEDS_TWO_COMPANIONS);
    }
    run_action(state, ctx, response, None)
}

fn settle_dispute(
    state: &mut PlayerState,
    ctx: &mut ActionContext<'_>,
    first: &str,
    second: &str,
) -> Outcome {
    let content = ctx.content;
    let event = content.event(&state.scene).ok_or(NOT_A_RESPONSE)?;
    let response = event
        .responses
        .iter()
        .find(|id| {
            content
                .action(id)
                .is_some_and(|def| def.subject == SubjectRule::Named)
        })
        .ok_or(NOT_A_RESPONSE)?;
    if first == second || state.companion(first).is_none() || state.companion(second).is_none() {
        return Err(NEEDS_TWO_COMPANIONS);
    }
    let parties = Parties {
        subject: first.to_string(),
        other: second.to_string(),
    };
    run_action(state, ctx, response, Some(parties))
}

fn gather(state: &mut PlayerState, ctx: &mut ActionContext<'_>, resource: &str) -> Outcome {
    let content = ctx.content;
    let gathering = &content.gathering;
    if !gathering.resources.iter().any(|id| id == resource) {
        return Err(UNKNOWN_ACTION);
    }
    spend_focus(state)?;

    let chance = gather_chance(state, content);
    let name = content
        .resource(resource)
        .map_or(resource, |def| def.name.as_str());
    if next_unit(ctx.rng) < chance {
        let effects = [EffectSpec::Gain {
            target: Target::Resource(resource.to_string()),
            base: gathering.yield_base,
            variance: gathering.yield_variance,
        }];
        let mut applied = Applied::default();
        apply_effects(state, &effects, &EffectContext::new(content), ctx.rng, &mut applied);
        Ok(applied.describe(&gathering.success.replace("{resource}", name)))
    } else {
        Ok(gathering.failure.replace("{resource}", name))
    }
}

/// Gathering success chance for the current state.
#[must_use]
pub fn gather_chance(state: &PlayerState, content: &ContentPack) -> f64 {
    let gathering = &content.gathering;
    let bonus = points_to_probability(state.bonus(&gathering.bonus_key));
    let chance = gathering.level_step.mul_add(f64::from(state.sanctuary_level), gathering.base_chance);
    (chance + bonus).min(gathering.chance_cap)
}

fn build(state: &mut PlayerState, ctx: &mut ActionContext<'_>, key: &str) -> Outcome {
    let content = ctx.content;
    let def = content.concept(key).ok_or(UNKNOWN_ACTION)?;
    if state.concepts.get(key).is_some_and(|concept| concept.built) {
        return Err(ALREADY_BUILT);
    }
    if let Some(required) = &def.requires
        && !state.concept_standing(required)
    {
        return Err(MISSING_PREREQUISITE);
    }
    spend_focus(state)?;

    if !def.cost.iter().all(|(resource, amount)| state.resource(resource) >= *amount) {
        return Ok(String::from(BUILD_SHORTFALL));
    }
    for (resource, amount) in &def.cost {
        state.adjust_resource(resource, -*amount);
    }
    let concept = state.concepts.entry(key.to_string()).or_default();
    concept.built = true;
    concept.durability = DURABILITY_MAX;
    state.sanctuary_level = state.sanctuary_level.saturating_add(1);

    let mut applied = Applied::default();
    apply_effects(state, &def.rewards, &EffectContext::new(content), ctx.rng, &mut applied);
    log::info!("built {key}, sanctuary level {}", state.sanctuary_level);
    Ok(applied.describe(&def.message))
}

fn purify(state: &mut PlayerState, ctx: &ActionContext<'_>, key: &str) -> Outcome {
    let content = ctx.content;
    let def = content.concept(key).ok_or(UNKNOWN_ACTION)?;
    let needs_care = state
        .concepts
        .get(key)
        .is_some_and(|concept| concept.built && concept.durability < DURABILITY_MAX);
    if !needs_care {
        return Err(NOTHING_TO_PURIFY);
    }
    spend_focus(state)?;

    let purify = &content.purify;
    if !purify.cost.iter().all(|(resource, amount)| state.resource(resource) >= *amount) {
        return Ok(purify.shortfall.clone());
    }
    for (resource, amount) in &purify.cost {
        state.adjust_resource(resource, -*amount);
    }
    if let Some(concept) = state.concepts.get_mut(key) {
        concept.durability = DURABILITY_MAX;
    }
    Ok(purify.message.replace("{concept}", &def.name))
}

fn welcome(state: &mut PlayerState, content: &ContentPack) -> Outcome {
    let pending = state.pending_companion.as_ref().ok_or(NO_PENDING_COMPANION)?;
    if !state.has_companion_room() || state.companion(&pending.id).is_some() {
        return Err(NO_ROOM);
    }
    let companion = state.pending_companion.take().ok_or(NO_PENDING_COMPANION)?;
    let message = render(&content.companions.arrival_message, Some(&companion.name));
    log::info!("{} joined the sanctuary", companion.name);
    state.companions.push(companion);
    state.scene = String::from(SCENE_INTRO);
    Ok(message)
}

fn observe(state: &mut PlayerState) -> Outcome {
    let pending = state.pending_companion.as_ref().ok_or(NO_PENDING_COMPANION)?;
    let message = render(OBSERVE_COMPANION, Some(&pending.name));
    state.scene = String::from(SCENE_INTRO);
    Ok(message)
}

fn reject(state: &mut PlayerState) -> Outcome {
    let companion = state.pending_companion.take().ok_or(NO_PENDING_COMPANION)?;
    state.scene = String::from(SCENE_INTRO);
    Ok(render(REJECT_COMPANION, Some(&companion.name)))
}

fn play_minigame(state: &mut PlayerState, ctx: &mut ActionContext<'_>) -> Outcome {
    if state.daily_flags.minigame_played {
        return Err(MINIGAME_PLAYED);
    }
    let content = ctx.content;
    let def = minigame_for_day(&content.minigames, state.day).ok_or(UNKNOWN_ACTION)?;
    spend_focus(state)?;

    state.daily_flags.minigame_played = true;
    state.minigame = Some(MinigameSession::start(def, ctx.rng));
    state.scene = format!("{SCENE_MINIGAME_PREFIX}{}", def.id);
    Ok(def.description.clone())
}

fn minigame_input(
    state: &mut PlayerState,
    ctx: &mut ActionContext<'_>,
    input: &MinigameInput,
) -> Outcome {
    let content = ctx.content;
    let id = state.active_minigame().map(|session| session.id.clone()).ok_or(NO_MINIGAME)?;
    let def = content.minigame(&id).ok_or(NO_MINIGAME)?;
    let Some(session) = state.minigame.as_mut() else {
        return Err(NO_MINIGAME);
    };
    match session.handle(def, input, ctx.rng) {
        Transition::Ignored => Ok(String::new()),
        Transition::Revealed => Ok(String::from(MINIGAME_REVEALED)),
        Transition::Entered => Ok(session.input.join(" ")),
        Transition::Cleared => Ok(String::from(MINIGAME_CLEARED)),
        Transition::Advanced { .. } => Ok(String::from(MINIGAME_CORRECT)),
        Transition::Finished { score } => {
            let mut applied = Applied::default();
            let mut text = String::new();
            if let Some((effects, message)) = reward_for(def, score) {
                apply_effects(state, effects, &EffectContext::new(content), ctx.rng, &mut applied);
                text = message.to_string();
            }
            state.scene = String::from(SCENE_INTRO);
            log::info!("{id} scored {score}");
            let score_line = format!("Score: {score}.");
            Ok(join_fragments([applied.describe(&text).as_str(), score_line.as_str()]))
        }
    }
}
