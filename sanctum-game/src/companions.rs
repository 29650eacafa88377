//! Companion roster: the starting seekers, daily skill trickle and drafting
//! of newcomers.

use std::hash::Hasher;

use rand::RngCore;
use serde::{Deserialize, Serialize};
use twox_hash::XxHash64;

use crate::constants::{COMPANION_ID_ATTEMPTS, TRUST_MAX, TRUST_MIN};
use crate::data::{CompanionPool, CompanionSeed};
use crate::rng::pick_index;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Companion {
    pub id: String,
    pub name: String,
    pub personality: String,
    pub skill: String,
    pub trust: i32,
}

impl Companion {
    /// Apply a trust delta, clamped to the trust bounds. Returns the applied
    /// delta.
    pub fn adjust_trust(&mut self, delta: i32) -> i32 {
        let before = self.trust;
        self.trust = self.trust.saturating_add(delta).clamp(TRUST_MIN, TRUST_MAX);
        self.trust - before
    }

    /// Short description used in event text.
    #[must_use]
    pub fn describe(&self) -> String {
        format!("{} ({}, {})", self.name, self.personality, self.skill)
    }
}

impl From<&CompanionSeed> for Companion {
    fn from(seed: &CompanionSeed) -> Self {
        Self {
            id: seed.id.clone(),
            name: seed.name.clone(),
            personality: seed.personality.clone(),
            skill: seed.skill.clone(),
            trust: seed.trust.clamp(TRUST_MIN, TRUST_MAX),
        }
    }
}

/// Starting roster from the content pack.
#[must_use]
pub fn default_roster(pool: &CompanionPool) -> Vec<Companion> {
    pool.starting.iter().map(Companion::from).collect()
}

/// Daily trickle earned through a companion's skill: the resource id, the
/// amount and the rendered message.
#[must_use]
pub fn skill_trickle<'a>(
    pool: &'a CompanionPool,
    companion: &Companion,
) -> Option<(&'a str, i32, String)> {
    let skill = pool.skill(&companion.skill)?;
    let resource = skill.resource.as_deref()?;
    let message = skill.message.replace("{companion}", &companion.name);
    Some((resource, skill.amount, message))
}

/// Draft a new companion. Takes exactly three draws (name, personality,
/// skill); the id is a hash of the draft, so it never touches the stream.
pub fn draft_companion<R: RngCore + ?Sized>(
    pool: &CompanionPool,
    roster: &[Companion],
    day: u32,
    rng: &mut R,
) -> Option<Companion> {
    let name = pick_from(&pool.names, rng);
    let personality = pick_from(&pool.personalities, rng);
    let skill_names: Vec<&str> = pool.skills.iter().map(|skill| skill.name.as_str()).collect();
    let skill = pick_index(rng, skill_names.len()).and_then(|idx| skill_names.get(idx).copied());

    let (name, personality, skill) = (name?, personality?, skill?);
    let id = unique_id(roster, day, name, personality, skill);
    Some(Companion {
        id,
        name: name.to_string(),
        personality: personality.to_string(),
        skill: skill.to_string(),
        trust: pool.starting_trust.clamp(TRUST_MIN, TRUST_MAX),
    })
}

fn pick_from<'a, R: RngCore + ?Sized>(items: &'a [String], rng: &mut R) -> Option<&'a str> {
    pick_index(rng, items.len())
        .and_then(|idx| items.get(idx))
        .map(String::as_str)
}

fn unique_id(roster: &[Companion], day: u32, name: &str, personality: &str, skill: &str) -> String {
    let mut candidate = String::new();
    for attempt in 0..COMPANION_ID_ATTEMPTS {
        let mut hasher = XxHash64::with_seed(attempt);
        hasher.write_u32(day);
        hasher.write_usize(roster.len());
        hasher.write(name.as_bytes());
        hasher.write(personality.as_bytes());
        hasher.write(skill.as_bytes());
        candidate = format!("c{:012x}", hasher.finish() & 0xFFFF_FFFF_FFFF);
        if roster.iter().all(|companion| companion.id != candidate) {
            return candidate;
        }
    }
    format!("{candidate}-{}", roster.len())
}
