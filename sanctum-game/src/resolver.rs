//! Once-per-day threshold rules over the bounded stats.

use std::collections::BTreeMap;

use rand::RngCore;

use crate::data::{Cascade, ContentPack};
use crate::effects::{Applied, EffectContext, apply_effects};
use crate::state::PlayerState;

/// Run every stat rule in content order and return one message fragment per
/// cascade that fired.
///
/// Thresholds are compared against the stats as they stood before the first
/// rule ran, so a cascade never triggers a later rule on the same day.
pub fn resolve_stat_rules<R: RngCore + ?Sized>(
    state: &mut PlayerState,
    content: &ContentPack,
    rng: &mut R,
) -> Vec<String> {
    let snapshot: BTreeMap<String, i32> = state.stats.clone();
    let ctx = EffectContext::new(content);
    let mut fragments = Vec::new();

    for rule in &content.stat_rules {
        let value = snapshot.get(&rule.stat).copied().unwrap_or(0);
        if let Some(high) = rule.high.as_ref().filter(|cascade| value >= cascade.threshold) {
            fragments.push(fire(state, high, &ctx, rng));
            log::debug!("{} high cascade at {value}", rule.stat);
        }
        if let Some(low) = rule.low.as_ref().filter(|cascade| value < cascade.threshold) {
            fragments.push(fire(state, low, &ctx, rng));
            log::debug!("{} low cascade at {value}", rule.stat);
        }
    }
    fragments
}

fn fire<R: RngCore + ?Sized>(
    state: &mut PlayerState,
    cascade: &Cascade,
    ctx: &EffectContext<'_>,
    rng: &mut R,
) -> String {
    let mut applied = Applied::default();
    apply_effects(state, &cascade.effects, ctx, rng, &mut applied);
    applied.describe(&cascade.message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::testing::ScriptedRng;
    use chrono::NaiveDate;

    fn setup() -> (ContentPack, PlayerState) {
        let content = ContentPack::builtin().unwrap();
        let state = PlayerState::new(&content, NaiveDate::from_ymd_opt(2026, 3, 9).unwrap());
        (content, state)
    }

    #[test]
    fn middling_stats_fire_nothing() {
        let (content, mut state) = setup();
        let mut rng = ScriptedRng::from_units(&[0.5]);
        let fragments = resolve_stat_rules(&mut state, &content, &mut rng);
        assert!(fragments.is_empty());
        assert_eq!(rng.calls, 0);
    }

    #[test]
    fn high_insight_grants_gathering_bonus() {
        let (content, mut state) = setup();
        state.stats.insert(String::from("insight"), 70);
        let mut rng = ScriptedRng::from_units(&[0.5]);
        let fragments = resolve_stat_rules(&mut state, &content, &mut rng);
        assert_eq!(fragments.len(), 1);
        assert_eq!(state.bonus("gathering"), 10);
        assert_eq!(rng.calls, 0);
    }

    #[test]
    fn rules_read_the_snapshot_not_live_values() {
        let (content, mut state) = setup();
        // low insight drains harmony below its low threshold, but the
        // harmony rule still sees the pre-resolution 30
        state.stats.insert(String::from("insight"), 10);
        state.stats.insert(String::from("harmony"), 30);
        let mut rng = ScriptedRng::from_units(&[0.999]);
        let fragments = resolve_stat_rules(&mut state, &content, &mut rng);
        assert_eq!(fragments.len(), 1);
        assert_eq!(state.stat("harmony"), 23);
        assert_eq!(state.max_focus, 10);
    }

    #[test]
    fn low_harmony_shrinks_focus_and_wears_concepts() {
        let (content, mut state) = setup();
        state.stats.insert(String::from("harmony"), 20);
        state.concepts.get_mut("meditation_room").unwrap().built = true;
        let mut rng = ScriptedRng::from_units(&[0.0]);
        let fragments = resolve_stat_rules(&mut state, &content, &mut rng);
        assert_eq!(state.max_focus, 9);
        assert_eq!(state.focus, 9);
        assert_eq!(state.concepts["meditation_room"].durability, 99);
        assert_eq!(rng.calls, 1);
        assert!(fragments[0].starts_with("Broken harmony"));
    }

    #[test]
    fn inspiration_chance_draws_after_the_gain() {
        let (content, mut state) = setup();
        state.stats.insert(String::from("inspiration"), 80);
        let mut rng = ScriptedRng::from_units(&[0.5, 0.1, 0.0]);
        let fragments = resolve_stat_rules(&mut state, &content, &mut rng);
        assert_eq!(rng.calls, 3);
        assert_eq!(state.stat("insight"), 55);
        assert_eq!(state.resource("deep_understanding"), 0);
        assert!(fragments[0].ends_with("You uncovered deep understanding!"));
    }
}
