//! The daily minigame as a nested state machine.
//!
//! A sequence session cycles `Displaying -> AwaitingInput -> Displaying`
//! while the player keeps repeating the symbols correctly and lands in
//! `Scored` on the first mistake. Fixed sessions wait for `Finish`.

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::data::{EffectSpec, MinigameDef, MinigameKind};
use crate::rng::pick_index;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MinigamePhase {
    Displaying,
    AwaitingInput,
    Scored,
}

/// Player input routed to the running session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MinigameInput {
    /// The presentation layer finished showing the sequence.
    RevealComplete,
    Enter { symbol: String },
    Reset,
    Submit,
    Finish,
}

/// What a single input did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Ignored,
    Revealed,
    Entered,
    Cleared,
    /// Correct repetition; the next, longer sequence is on display.
    Advanced { gained: u32 },
    Finished { score: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinigameSession {
    pub id: String,
    pub phase: MinigamePhase,
    pub stage: u32,
    pub score: u32,
    #[serde(default)]
    pub sequence: Vec<String>,
    #[serde(default)]
    pub input: Vec<String>,
}

impl MinigameSession {
    /// Open a session. Sequence games draw their first sequence (one draw per
    /// symbol); fixed games take no draws.
    pub fn start<R: RngCore + ?Sized>(def: &MinigameDef, rng: &mut R) -> Self {
        let mut session = Self {
            id: def.id.clone(),
            phase: MinigamePhase::AwaitingInput,
            stage: 0,
            score: 0,
            sequence: Vec::new(),
            input: Vec::new(),
        };
        if let MinigameKind::Sequence {
            symbols,
            base_length,
            ..
        } = &def.kind
        {
            session.sequence = draw_sequence(symbols, *base_length, rng);
            session.phase = MinigamePhase::Displaying;
        }
        session
    }

    /// Feed one input. Everything except `RevealComplete` is ignored while
    /// the sequence is on display, and everything is ignored once scored.
    pub fn handle<R: RngCore + ?Sized>(
        &mut self,
        def: &MinigameDef,
        input: &MinigameInput,
        rng: &mut R,
    ) -> Transition {
        match (self.phase, input) {
            (MinigamePhase::Scored, _) => Transition::Ignored,
            (MinigamePhase::Displaying, MinigameInput::RevealComplete) => {
                self.phase = MinigamePhase::AwaitingInput;
                Transition::Revealed
            }
            (MinigamePhase::Displaying, _) => Transition::Ignored,
            (MinigamePhase::AwaitingInput, MinigameInput::RevealComplete) => Transition::Ignored,
            (MinigamePhase::AwaitingInput, MinigameInput::Enter { symbol }) => {
                match &def.kind {
                    MinigameKind::Sequence { symbols, .. } if symbols.contains(symbol) => {
                        self.input.push(symbol.clone());
                        Transition::Entered
                    }
                    _ => Transition::Ignored,
                }
            }
            (MinigamePhase::AwaitingInput, MinigameInput::Reset) => {
                self.input.clear();
                Transition::Cleared
            }
            (MinigamePhase::AwaitingInput, MinigameInput::Submit) => self.submit(def, rng),
            (MinigamePhase::AwaitingInput, MinigameInput::Finish) => {
                if let MinigameKind::Fixed { score, .. } = &def.kind {
                    self.score = *score;
                }
                self.phase = MinigamePhase::Scored;
                Transition::Finished { score: self.score }
            }
        }
    }

    fn submit<R: RngCore + ?Sized>(&mut self, def: &MinigameDef, rng: &mut R) -> Transition {
        let MinigameKind::Sequence {
            symbols,
            base_length,
            points_per_symbol,
            ..
        } = &def.kind
        else {
            return Transition::Ignored;
        };

        if self.input == self.sequence {
            let gained = u32::try_from(self.sequence.len())
                .unwrap_or(u32::MAX)
                .saturating_mul(*points_per_symbol);
            self.score = self.score.saturating_add(gained);
            self.stage = self.stage.saturating_add(1);
            let length = base_length.saturating_add(usize::try_from(self.stage).unwrap_or(0));
            self.sequence = draw_sequence(symbols, length, rng);
            self.input.clear();
            self.phase = MinigamePhase::Displaying;
            log::debug!("{} advanced to stage {} ({} points)", self.id, self.stage, self.score);
            Transition::Advanced { gained }
        } else {
            self.phase = MinigamePhase::Scored;
            Transition::Finished { score: self.score }
        }
    }
}

fn draw_sequence<R: RngCore + ?Sized>(symbols: &[String], length: usize, rng: &mut R) -> Vec<String> {
    (0..length)
        .filter_map(|_| pick_index(rng, symbols.len()).and_then(|idx| symbols.get(idx)).cloned())
        .collect()
}

/// Reward effects and message for a final score: the first tier whose
/// minimum the score reaches, or the fixed reward.
#[must_use]
pub fn reward_for(def: &MinigameDef, score: u32) -> Option<(&[EffectSpec], &str)> {
    match &def.kind {
        MinigameKind::Sequence { tiers, .. } => tiers
            .iter()
            .find(|tier| score >= tier.min_score)
            .map(|tier| (tier.effects.as_slice(), tier.message.as_str())),
        MinigameKind::Fixed {
            effects, message, ..
        } => Some((effects.as_slice(), message.as_str())),
    }
}

/// Today's minigame: the catalogue is walked one entry per in-game day.
#[must_use]
pub fn minigame_for_day(games: &[MinigameDef], day: u32) -> Option<&MinigameDef> {
    if games.is_empty() {
        return None;
    }
    let count = u32::try_from(games.len()).unwrap_or(u32::MAX);
    let idx = day.saturating_sub(1) % count;
    games.get(usize::try_from(idx).unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ContentPack;
    use crate::rng::testing::ScriptedRng;

    fn games() -> Vec<MinigameDef> {
        ContentPack::builtin().unwrap().minigames
    }

    fn sequence_game() -> MinigameDef {
        games().remove(0)
    }

    fn enter_all(session: &mut MinigameSession, def: &MinigameDef, rng: &mut ScriptedRng) {
        for symbol in session.sequence.clone() {
            session.handle(def, &MinigameInput::Enter { symbol }, rng);
        }
    }

    #[test]
    fn start_draws_one_symbol_per_slot() {
        let def = sequence_game();
        let mut rng = ScriptedRng::from_units(&[0.0, 0.95]);
        let session = MinigameSession::start(&def, &mut rng);
        assert_eq!(rng.calls, 3);
        assert_eq!(session.phase, MinigamePhase::Displaying);
        assert_eq!(session.sequence, vec!["\u{25b3}", "\u{2295}", "\u{25b3}"]);
    }

    #[test]
    fn input_is_ignored_while_displaying() {
        let def = sequence_game();
        let mut rng = ScriptedRng::from_units(&[0.3]);
        let mut session = MinigameSession::start(&def, &mut rng);
        let symbol = session.sequence[0].clone();
        assert_eq!(
            session.handle(&def, &MinigameInput::Enter { symbol }, &mut rng),
            Transition::Ignored
        );
        assert_eq!(session.handle(&def, &MinigameInput::Submit, &mut rng), Transition::Ignored);
        assert!(session.input.is_empty());
    }

    #[test]
    fn correct_rounds_score_and_grow() {
        let def = sequence_game();
        let mut rng = ScriptedRng::from_units(&[0.42]);
        let mut session = MinigameSession::start(&def, &mut rng);
        session.handle(&def, &MinigameInput::RevealComplete, &mut rng);
        enter_all(&mut session, &def, &mut rng);
        let outcome = session.handle(&def, &MinigameInput::Submit, &mut rng);
        assert_eq!(outcome, Transition::Advanced { gained: 30 });
        assert_eq!(session.stage, 1);
        assert_eq!(session.sequence.len(), 4);
        assert_eq!(session.phase, MinigamePhase::Displaying);

        session.handle(&def, &MinigameInput::RevealComplete, &mut rng);
        enter_all(&mut session, &def, &mut rng);
        session.handle(&def, &MinigameInput::Submit, &mut rng);
        assert_eq!(session.score, 70);
        assert_eq!(reward_for(&def, session.score).unwrap().0.len(), 4);
    }

    #[test]
    fn first_round_clear_reaches_the_middle_tier() {
        let def = sequence_game();
        let mut rng = ScriptedRng::from_units(&[0.17]);
        let mut session = MinigameSession::start(&def, &mut rng);
        assert_eq!(session.sequence.len(), 3);
        session.handle(&def, &MinigameInput::RevealComplete, &mut rng);
        enter_all(&mut session, &def, &mut rng);
        session.handle(&def, &MinigameInput::Submit, &mut rng);
        session.handle(&def, &MinigameInput::RevealComplete, &mut rng);
        assert_eq!(
            session.handle(&def, &MinigameInput::Finish, &mut rng),
            Transition::Finished { score: 30 }
        );
        let (effects, message) = reward_for(&def, session.score).unwrap();
        assert_eq!(effects.len(), 3);
        assert_eq!(message, "A fine reading of the symbols!");
    }

    #[test]
    fn mistake_scores_the_session() {
        let def = sequence_game();
        let mut rng = ScriptedRng::from_units(&[0.0]);
        let mut session = MinigameSession::start(&def, &mut rng);
        session.handle(&def, &MinigameInput::RevealComplete, &mut rng);
        session.handle(
            &def,
            &MinigameInput::Enter {
                symbol: String::from("\u{2605}"),
            },
            &mut rng,
        );
        assert_eq!(session.handle(&def, &MinigameInput::Reset, &mut rng), Transition::Cleared);
        assert!(session.input.is_empty());
        assert_eq!(
            session.handle(&def, &MinigameInput::Submit, &mut rng),
            Transition::Finished { score: 0 }
        );
        assert_eq!(session.phase, MinigamePhase::Scored);
        assert_eq!(session.handle(&def, &MinigameInput::Finish, &mut rng), Transition::Ignored);
    }

    #[test]
    fn unknown_symbols_are_not_entered() {
        let def = sequence_game();
        let mut rng = ScriptedRng::from_units(&[0.0]);
        let mut session = MinigameSession::start(&def, &mut rng);
        session.handle(&def, &MinigameInput::RevealComplete, &mut rng);
        let outcome = session.handle(
            &def,
            &MinigameInput::Enter {
                symbol: String::from("x"),
            },
            &mut rng,
        );
        assert_eq!(outcome, Transition::Ignored);
    }

    #[test]
    fn tiers_pick_by_score() {
        let def = sequence_game();
        assert_eq!(reward_for(&def, 60).unwrap().0.len(), 4);
        assert_eq!(reward_for(&def, 51).unwrap().0.len(), 4);
        assert_eq!(reward_for(&def, 50).unwrap().0.len(), 3);
        assert_eq!(reward_for(&def, 20).unwrap().0.len(), 1);
    }

    #[test]
    fn fixed_games_finish_on_request() {
        let def = games().remove(2);
        let mut rng = ScriptedRng::from_units(&[0.5]);
        let mut session = MinigameSession::start(&def, &mut rng);
        assert_eq!(rng.calls, 0);
        assert_eq!(session.phase, MinigamePhase::AwaitingInput);
        assert_eq!(
            session.handle(&def, &MinigameInput::Finish, &mut rng),
            Transition::Finished { score: 15 }
        );
    }

    #[test]
    fn catalogue_rotates_by_day() {
        let games = games();
        assert_eq!(minigame_for_day(&games, 1).unwrap().id, "symbol_sequence");
        assert_eq!(minigame_for_day(&games, 3).unwrap().id, "future_sight");
        assert_eq!(minigame_for_day(&games, 6).unwrap().id, "symbol_sequence");
        assert!(minigame_for_day(&[], 1).is_none());
    }
}
