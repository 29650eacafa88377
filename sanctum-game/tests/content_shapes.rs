use chrono::NaiveDate;
use sanctum_game::data::Condition;
use sanctum_game::{ContentError, ContentPack, DailyRng, PlayerState, Scope, select};
use serde_json::Value;

const PACK: &str = include_str!("../assets/content/sanctuary.json");

fn pack_value() -> Value {
    serde_json::from_str(PACK).unwrap()
}

fn load(value: &Value) -> Result<ContentPack, ContentError> {
    ContentPack::load(&serde_json::to_string(value).unwrap())
}

#[test]
fn builtin_pack_validates() {
    let pack = ContentPack::builtin().unwrap();
    assert_eq!(pack.stats.len(), 5);
    assert_eq!(pack.resources.len(), 4);
    assert_eq!(pack.concepts.len(), 5);
    assert_eq!(pack.endings.len(), 6);
    assert!(pack.events.iter().any(|event| event.id == "intro" && event.when.is_empty()));
}

#[test]
fn every_response_is_a_known_action() {
    let pack = ContentPack::builtin().unwrap();
    for event in &pack.events {
        for response in &event.responses {
            assert!(pack.action(response).is_some(), "{} -> {response}", event.id);
        }
    }
}

#[test]
fn every_stat_has_an_ending() {
    let pack = ContentPack::builtin().unwrap();
    for stat in &pack.stats {
        let scene = format!("game_over_{}", stat.id);
        assert!(pack.ending(&scene).is_some(), "no ending for {}", stat.id);
    }
}

#[test]
fn tables_without_fallback_are_rejected() {
    let mut value = pack_value();
    let outcomes = value["actions"]["meditate"]["outcomes"].as_array_mut().unwrap();
    for entry in outcomes.iter_mut() {
        entry["when"] = serde_json::json!([{ "companions_at_least": { "count": 9 } }]);
    }
    let err = load(&value).unwrap_err();
    assert!(matches!(err, ContentError::MissingFallback { ref table } if table == "actions.meditate"));
}

#[test]
fn unknown_references_are_rejected() {
    let mut value = pack_value();
    value["upkeep"]["penalty_stat"] = Value::from("serenity");
    let err = load(&value).unwrap_err();
    assert!(matches!(err, ContentError::UnknownStat { ref stat, .. } if stat == "serenity"));

    let mut value = pack_value();
    value["exploration"] = serde_json::json!(["levitate"]);
    assert!(matches!(load(&value), Err(ContentError::UnknownAction { .. })));
}

#[test]
fn empty_stats_are_rejected() {
    let mut value = pack_value();
    value["stats"] = serde_json::json!([]);
    assert!(matches!(load(&value), Err(ContentError::NoStats)));
}

#[test]
fn malformed_json_reports_parse_errors() {
    let err = ContentPack::load("{ \"stats\": ").unwrap_err();
    assert!(err.to_string().starts_with("content JSON is malformed"));
}

fn unreachable() -> Vec<Condition> {
    vec![Condition::CompanionsAtLeast { count: usize::MAX }]
}

#[test]
fn every_table_falls_back_to_its_unconditional_entry() {
    let pack = ContentPack::builtin().unwrap();
    let state = PlayerState::new(&pack, NaiveDate::from_ymd_opt(2026, 6, 1).unwrap());
    let scope = Scope::new(&state);

    for (id, action) in &pack.actions {
        let expected = action.outcomes.iter().position(|entry| entry.when.is_empty()).unwrap();
        let mut table = action.outcomes.clone();
        for entry in &mut table {
            if entry.when.is_empty() {
                entry.weight = 0;
            } else {
                entry.when = unreachable();
            }
        }
        let mut rng = DailyRng::new(5);
        let picked = select(&table, &scope, &mut rng).unwrap();
        assert_eq!(picked.index, expected, "actions.{id}");
        assert!(picked.roll.is_none(), "actions.{id}");
        assert_eq!(rng.draws(), 0, "actions.{id}");
    }

    let expected = pack.events.iter().position(|event| event.when.is_empty()).unwrap();
    let mut events = pack.events.clone();
    for event in &mut events {
        if event.when.is_empty() {
            event.weight = 0;
        } else {
            event.when = unreachable();
        }
    }
    let mut rng = DailyRng::new(5);
    let picked = select(&events, &scope, &mut rng).unwrap();
    assert_eq!(picked.entry.id, pack.events[expected].id);
    assert_eq!(rng.draws(), 0);
}
