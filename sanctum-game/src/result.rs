//! End-of-game summary.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::data::ContentPack;
use crate::state::PlayerState;

/// Summary of a finished run for display or reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSummary {
    pub ending: String,
    pub headline: String,
    pub days: u32,
    pub companions: usize,
    pub concepts_built: usize,
    pub sanctuary_level: u32,
    pub stats: BTreeMap<String, i32>,
    pub resources: BTreeMap<String, i32>,
}

/// Summarize `state` if it sits in an ending scene.
#[must_use]
pub fn result_summary(state: &PlayerState, content: &ContentPack) -> Option<ResultSummary> {
    let ending = content.ending(&state.scene)?;
    Some(ResultSummary {
        ending: ending.scene.clone(),
        headline: ending.text.clone(),
        days: state.day,
        companions: state.companions.len(),
        concepts_built: state.concepts.values().filter(|c| c.built).count(),
        sanctuary_level: state.sanctuary_level,
        stats: state.stats.clone(),
        resources: state.resources.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn only_endings_summarize() {
        let content = ContentPack::builtin().unwrap();
        let mut state = PlayerState::new(&content, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        assert!(result_summary(&state, &content).is_none());

        state.scene = String::from("game_over_empathy");
        state.day = 9;
        let summary = result_summary(&state, &content).unwrap();
        assert_eq!(summary.ending, "game_over_empathy");
        assert_eq!(summary.days, 9);
        assert_eq!(summary.companions, 2);
        assert_eq!(summary.concepts_built, 0);
    }
}
