//! End-to-end ranking behaviour.

use inspector_core::{DisplayName, Inspectable, TypeRegistry};
use inspector_search::{
    Candidate, SearchEngine, SearchSettings, tag_candidates, type_candidates,
};
use rstest::rstest;

fn names(candidates: &[Candidate], engine: &SearchEngine, pattern: &str) -> Vec<String> {
    engine
        .rank(candidates, pattern)
        .iter()
        .map(|hit| candidates[hit.index].name.clone())
        .collect()
}

fn health_mana() -> Vec<Candidate> {
    vec![
        Candidate::new("Player Health"),
        Candidate::new("Player Mana"),
        Candidate::new("Enemy Health"),
    ]
}

fn parallel(workers: usize) -> SearchEngine {
    SearchEngine::new(SearchSettings {
        worker_threads: Some(workers),
        min_parallel: 0,
        ..SearchSettings::default()
    })
}

#[rstest]
#[case(SearchEngine::default())]
#[case(parallel(1))]
#[case(parallel(3))]
fn initials_rank_player_health_first(#[case] engine: SearchEngine) {
    let candidates = health_mana();
    let results = engine.rank(&candidates, "ph");
    assert_eq!(results.best.map(|b| b.index), Some(0));
    // "Enemy Health" scores below the best, if at all
    let ranked = names(&candidates, &engine, "ph");
    let player = ranked.iter().position(|n| n == "Player Health");
    let enemy = ranked.iter().position(|n| n == "Enemy Health");
    assert!(enemy.is_none() || enemy > player);
}

#[test]
fn substring_keeps_close_secondary_results() {
    let candidates = health_mana();
    let ranked = names(&candidates, &SearchEngine::default(), "health");
    // shorter field, higher coverage
    assert_eq!(ranked, vec!["Enemy Health", "Player Health"]);
}

#[test]
fn weak_matches_fall_below_threshold() {
    let candidates = vec![
        Candidate::new("Transform"),
        Candidate::new("TextRenderer").with_synonym("Label"),
        Candidate::new("Terrain Tile"),
    ];
    let engine = SearchEngine::default();
    let results = engine.rank(&candidates, "transform");
    assert_eq!(results.best.map(|b| b.index), Some(0));
    assert!(results.secondary.is_empty());
}

#[test]
fn synonyms_and_categories_match() {
    let candidates = vec![
        Candidate::new("TextRenderer").with_synonym("Label"),
        Candidate::new("Rigidbody").with_category("Physics"),
    ];
    let engine = SearchEngine::default();
    assert_eq!(names(&candidates, &engine, "label"), vec!["TextRenderer"]);
    assert_eq!(names(&candidates, &engine, "physics"), vec!["Rigidbody"]);
}

fn generated(count: usize) -> Vec<Candidate> {
    const WORDS: [&str; 8] = [
        "Player", "Enemy", "Health", "Mana", "Camera", "Light", "Mesh", "Renderer",
    ];
    (0..count)
        .map(|i| {
            let a = WORDS[i % WORDS.len()];
            let b = WORDS[(i / WORDS.len()) % WORDS.len()];
            Candidate::new(format!("{a}{b}{i}")).with_category(WORDS[(i * 7) % WORDS.len()])
        })
        .collect()
}

#[rstest]
#[case("ph")]
#[case("mesh")]
#[case("cam li")]
#[case("renderer")]
fn parallel_matches_sequential(#[case] pattern: &str) {
    let candidates = generated(1000);
    let sequential = SearchEngine::new(SearchSettings {
        worker_threads: Some(1),
        ..SearchSettings::default()
    })
    .rank(&candidates, pattern);
    for workers in [2, 4, 7] {
        assert_eq!(parallel(workers).rank(&candidates, pattern), sequential);
    }
    assert!(!sequential.is_empty());
}

#[test]
fn equal_scores_break_ties_by_index() {
    let candidates = vec![
        Candidate::new("Light"),
        Candidate::new("Light"),
        Candidate::new("Light"),
    ];
    let results = parallel(3).rank(&candidates, "light");
    assert_eq!(results.best.map(|b| b.index), Some(0));
    let rest: Vec<usize> = results.secondary.iter().map(|s| s.index).collect();
    assert_eq!(rest, vec![1, 2]);
}

#[derive(Clone, Default, Inspectable)]
#[inspect(attr = DisplayName("Hit Points"))]
struct HealthComponent {
    pub value: f32,
}

#[derive(Clone, Default, Inspectable)]
struct ManaComponent {
    pub value: f32,
}

#[test]
fn type_picker_candidates() {
    let registry = TypeRegistry::new();
    registry.register_type::<HealthComponent>();
    registry.register_type::<ManaComponent>();
    let candidates = type_candidates(&registry);
    assert_eq!(candidates.len(), 2);

    let health = candidates
        .iter()
        .find(|c| c.name == "HealthComponent")
        .unwrap();
    assert_eq!(health.category, "ranking");
    assert_eq!(health.synonyms, vec!["Hit Points"]);

    let ranked = names(&candidates, &SearchEngine::default(), "hit points");
    assert_eq!(ranked, vec!["HealthComponent"]);
}

#[test]
fn tag_picker_candidates() {
    let candidates = tag_candidates(["Enemy/Boss", "Enemy/Minion", "Player"]);
    let engine = SearchEngine::default();
    assert_eq!(names(&candidates, &engine, "boss"), vec!["Boss"]);
    let enemies = names(&candidates, &engine, "enemy");
    assert_eq!(enemies, vec!["Boss", "Minion"]);
}
