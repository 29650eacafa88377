//! Day transition: resets, cascades, trickle, decay, upkeep, endings and the
//! daily event, in that order.

use chrono::NaiveDate;

use crate::companions::skill_trickle;
use crate::constants::{BASE_MAX_FOCUS, CONCEPT_DAILY_DECAY, MANUAL_ADVANCE_CAP};
use crate::data::{ContentPack, EndingDef};
use crate::effects::join_fragments;
use crate::encounters::trigger_daily_event;
use crate::numbers::usize_to_i32;
use crate::resolver::resolve_stat_rules;
use crate::rng::DailyRng;
use crate::selection::{Scope, all_hold};
use crate::state::{DailyFlags, PlayerState};

/// What a rollover did.
#[derive(Debug, Clone, PartialEq)]
pub struct DayReport {
    pub day: u32,
    pub event: Option<String>,
    pub ending: Option<String>,
    pub message: String,
}

/// The stored state was last played on another calendar date.
#[must_use]
pub fn needs_new_date(state: &PlayerState, today: NaiveDate) -> bool {
    state.last_played != Some(today)
}

/// Move the counters onto a new calendar date. The rollover itself still
/// has to run.
pub fn begin_new_date(state: &mut PlayerState, today: NaiveDate) {
    state.day = state.day.saturating_add(1);
    state.manual_advances_today = 0;
    state.daily_event_fired = false;
    state.last_played = Some(today);
    log::info!("new calendar date {today}, day {}", state.day);
}

/// First ending whose conditions hold, in content order.
#[must_use]
pub fn check_ending<'a>(state: &PlayerState, content: &'a ContentPack) -> Option<&'a EndingDef> {
    let scope = Scope::new(state);
    content
        .endings
        .iter()
        .find(|ending| all_hold(&ending.when, &scope))
}

/// The active scene is an ending.
#[must_use]
pub fn is_ended(state: &PlayerState, content: &ContentPack) -> bool {
    content.ending(&state.scene).is_some()
}

/// Run the day transition once. Rebuilds `rng` from `(today, day)` so every
/// draw of the day, rollover and actions alike, comes from one stream.
/// Returns `None` when today's rollover already ran or the game has ended.
pub fn roll_over(
    state: &mut PlayerState,
    content: &ContentPack,
    today: NaiveDate,
    rng: &mut DailyRng,
) -> Option<DayReport> {
    if state.daily_event_fired || is_ended(state, content) {
        return None;
    }
    *rng = DailyRng::for_day(today, state.day);

    state.focus = BASE_MAX_FOCUS;
    state.max_focus = BASE_MAX_FOCUS;
    state.daily_flags = DailyFlags::default();
    state.daily_bonus.clear();
    state.minigame = None;
    state.pending_companion = None;
    state.daily_event_fired = true;

    let mut fragments = vec![content.day_message.clone()];
    fragments.extend(resolve_stat_rules(state, content, rng));
    fragments.extend(apply_skill_trickle(state, content));
    fragments.extend(decay_concepts(state, content));
    fragments.extend(apply_upkeep(state, content));

    let mut report = DayReport {
        day: state.day,
        event: None,
        ending: None,
        message: String::new(),
    };

    if let Some(ending) = check_ending(state, content) {
        state.scene.clone_from(&ending.scene);
        fragments.push(ending.text.clone());
        log::info!("day {} ended the game: {}", state.day, ending.scene);
        report.ending = Some(ending.scene.clone());
    } else if let Some(pick) = trigger_daily_event(state, content, rng) {
        fragments.push(pick.message);
        report.event = Some(pick.event_id);
    }

    report.message = join_fragments(fragments.iter().map(String::as_str));
    log::debug!("rollover for day {} took {} draws", state.day, rng.draws());
    Some(report)
}

/// Player-requested advance within the same calendar date, capped per date.
/// Returns `None` when the cap is reached.
pub fn manual_next_day(
    state: &mut PlayerState,
    content: &ContentPack,
    today: NaiveDate,
    rng: &mut DailyRng,
) -> Option<DayReport> {
    if state.manual_advances_today >= MANUAL_ADVANCE_CAP {
        return None;
    }
    state.day = state.day.saturating_add(1);
    state.manual_advances_today += 1;
    state.daily_event_fired = false;
    roll_over(state, content, today, rng)
}

fn apply_skill_trickle(state: &mut PlayerState, content: &ContentPack) -> Vec<String> {
    let trickles: Vec<(String, i32, String)> = state
        .companions
        .iter()
        .filter_map(|companion| skill_trickle(&content.companions, companion))
        .map(|(resource, amount, message)| (resource.to_string(), amount, message))
        .collect();
    trickles
        .into_iter()
        .map(|(resource, amount, message)| {
            state.adjust_resource(&resource, amount);
            message
        })
        .collect()
}

fn decay_concepts(state: &mut PlayerState, content: &ContentPack) -> Vec<String> {
    let mut collapsed = Vec::new();
    for (key, concept) in &mut state.concepts {
        if !concept.built {
            continue;
        }
        concept.adjust_durability(-CONCEPT_DAILY_DECAY);
        if !concept.built {
            let name = content.concept(key).map_or(key.as_str(), |def| def.name.as_str());
            collapsed.push(content.collapse_message.replace("{concept}", name));
        }
    }
    collapsed
}

fn apply_upkeep(state: &mut PlayerState, content: &ContentPack) -> Option<String> {
    let upkeep = &content.upkeep;
    let drain = upkeep
        .per_companion
        .saturating_mul(usize_to_i32(state.companions.len()));
    state.drain_resource(&upkeep.resource, drain);
    if state.resource(&upkeep.resource) >= 0 {
        return None;
    }
    let applied = state.adjust_stat(&upkeep.penalty_stat, -upkeep.penalty);
    let stat = content
        .stat(&upkeep.penalty_stat)
        .map_or(upkeep.penalty_stat.as_str(), |def| def.name.as_str());
    log::warn!("upkeep left {} at {}", upkeep.resource, state.resource(&upkeep.resource));
    Some(format!("{} ({applied:+} {stat})", upkeep.warning))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, day).unwrap()
    }

    fn setup() -> (ContentPack, PlayerState) {
        let content = ContentPack::builtin().unwrap();
        let state = PlayerState::new(&content, date(1));
        (content, state)
    }

    #[test]
    fn rollover_runs_once_per_day() {
        let (content, mut state) = setup();
        let mut rng = DailyRng::new(0);
        let first = roll_over(&mut state, &content, date(1), &mut rng).unwrap();
        assert!(first.message.starts_with("A new day begins."));
        let snapshot = state.clone();
        assert!(roll_over(&mut state, &content, date(1), &mut rng).is_none());
        assert_eq!(state, snapshot);
    }

    #[test]
    fn trickle_and_upkeep_touch_resources() {
        let (content, mut state) = setup();
        let mut rng = DailyRng::new(0);
        roll_over(&mut state, &content, date(1), &mut rng).unwrap();
        // Elara trickles inspiration, Kael knowledge, two companions drain 4
        assert_eq!(state.resource("inspiration"), 7);
        assert!(state.resource("knowledge") >= 11);
    }

    #[test]
    fn daily_resets_restore_focus_and_flags() {
        let (content, mut state) = setup();
        state.focus = 0;
        state.max_focus = 6;
        state.daily_flags.meditated = true;
        state.daily_bonus.insert(String::from("gathering"), 40);
        let mut rng = DailyRng::new(0);
        roll_over(&mut state, &content, date(1), &mut rng).unwrap();
        assert_eq!(state.max_focus, 10);
        assert!(!state.daily_flags.meditated);
        assert_eq!(state.bonus("gathering"), 0);
        assert!(state.daily_event_fired);
    }

    #[test]
    fn concept_at_one_durability_collapses() {
        let (content, mut state) = setup();
        let altar = state.concepts.get_mut("vision_altar").unwrap();
        altar.built = true;
        altar.durability = 1;
        let mut rng = DailyRng::new(0);
        let report = roll_over(&mut state, &content, date(1), &mut rng).unwrap();
        assert!(!state.concepts["vision_altar"].built);
        assert_eq!(state.concepts["vision_altar"].durability, 0);
        assert!(report.message.contains("Altar of Vision has collapsed!"));
    }

    #[test]
    fn upkeep_debt_costs_harmony() {
        let (content, mut state) = setup();
        state.resources.insert(String::from("inspiration"), 0);
        let mut rng = DailyRng::new(0);
        let report = roll_over(&mut state, &content, date(1), &mut rng).unwrap();
        // +1 trickle, -4 upkeep
        assert_eq!(state.resource("inspiration"), -3);
        assert!(report.message.contains("ran dry"));
        assert!(state.stat("harmony") <= 40);
    }

    #[test]
    fn endings_follow_priority_and_skip_events() {
        let (content, mut state) = setup();
        state.stats.insert(String::from("meaning"), 0);
        state.stats.insert(String::from("empathy"), 0);
        let mut rng = DailyRng::new(0);
        let report = roll_over(&mut state, &content, date(1), &mut rng).unwrap();
        assert_eq!(report.ending.as_deref(), Some("game_over_meaning"));
        assert!(report.event.is_none());
        assert_eq!(state.scene, "game_over_meaning");
        assert!(is_ended(&state, &content));
    }

    #[test]
    fn resource_ending_scales_with_roster() {
        let (content, mut state) = setup();
        state.resources.insert(String::from("inspiration"), -8);
        let mut rng = DailyRng::new(0);
        let report = roll_over(&mut state, &content, date(1), &mut rng).unwrap();
        // -8 + 1 - 4 = -11 < -10
        assert_eq!(report.ending.as_deref(), Some("game_over_resources"));
    }

    #[test]
    fn ended_games_do_not_roll_over() {
        let (content, mut state) = setup();
        state.scene = String::from("game_over_insight");
        state.daily_event_fired = false;
        state.focus = 0;
        let snapshot = state.clone();
        let mut rng = DailyRng::new(0);
        assert!(roll_over(&mut state, &content, date(1), &mut rng).is_none());
        assert_eq!(state, snapshot);
        assert_eq!(rng.draws(), 0);
    }

    #[test]
    fn manual_advances_are_capped() {
        let (content, mut state) = setup();
        let mut rng = DailyRng::new(0);
        roll_over(&mut state, &content, date(1), &mut rng).unwrap();
        for expected_day in 2..=6 {
            let report = manual_next_day(&mut state, &content, date(1), &mut rng).unwrap();
            assert_eq!(report.day, expected_day);
            state.scene = String::from("intro");
            state.stats.values_mut().for_each(|value| *value = 50);
            state.resources.insert(String::from("inspiration"), 50);
        }
        assert!(manual_next_day(&mut state, &content, date(1), &mut rng).is_none());
        assert_eq!(state.day, 6);
    }

    #[test]
    fn new_date_bumps_day_and_clears_counters() {
        let (_, mut state) = setup();
        state.manual_advances_today = 5;
        state.daily_event_fired = true;
        assert!(needs_new_date(&state, date(2)));
        begin_new_date(&mut state, date(2));
        assert_eq!(state.day, 2);
        assert_eq!(state.manual_advances_today, 0);
        assert!(!state.daily_event_fired);
        assert!(!needs_new_date(&state, date(2)));
    }

    #[test]
    fn stream_is_rebuilt_from_date_and_day() {
        let (content, state) = setup();
        let mut a = state.clone();
        let mut b = state;
        let mut rng_a = DailyRng::new(1);
        let mut rng_b = DailyRng::new(2);
        roll_over(&mut a, &content, date(1), &mut rng_a).unwrap();
        roll_over(&mut b, &content, date(1), &mut rng_b).unwrap();
        assert_eq!(a, b);
        assert_eq!(rng_a, rng_b);
    }
}
