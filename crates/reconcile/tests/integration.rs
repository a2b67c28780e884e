use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use mindrift_reconcile::capability::FixedCandidates;
use mindrift_reconcile::text::{GlossaryEntry, GlossaryOracle, NormalizedEditDistance, WordEditDistance};
use mindrift_reconcile::{
    build_report, reconcile, CancelToken, CapabilityError, Element, ReconcileConfig, ReconcileError,
    ReconcileOptions, TrackedPair,
};

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_config(name: &str) -> ReconcileConfig {
    let toml = std::fs::read_to_string(fixtures_dir().join(name)).unwrap();
    ReconcileConfig::from_toml(&toml).unwrap()
}

const S0: &str = "Change the user ID generation method to a secure implementation using UUID or similar.";
const D0: &str = "ユーザーIDの生成方法をUUIDなどを使った安全な実装に変更する。";
const D1: &str = "ユーザーIDの生成方法をUUID v4などを使った安全な実装に変更する。";
const RETRANSLATION: &str = "Switch to a secure implementation, such as UUID v4, for how user IDs are generated.";
const MINIMAL_EDIT: &str = "Change the user ID generation method to a secure implementation using UUID v4 or similar.";

fn uuid_glossary() -> GlossaryOracle {
    GlossaryOracle::new(vec![
        GlossaryEntry::new("v4", "v4"),
        GlossaryEntry::new("UUID", "UUID"),
        GlossaryEntry::new("secure", "安全"),
    ])
}

// -------------------------------------------------------------------------
// UUID v4 scenario
// -------------------------------------------------------------------------

#[test]
fn uuid_v4_minimal_edit_beats_retranslation() {
    let generator = FixedCandidates::new(vec![RETRANSLATION.to_string(), MINIMAL_EDIT.to_string()]);
    let result = reconcile(
        &S0.to_string(),
        &D0.to_string(),
        &D1.to_string(),
        &uuid_glossary(),
        &NormalizedEditDistance,
        &generator,
        &ReconcileOptions::default(),
    )
    .unwrap();

    assert_eq!(result.source, MINIMAL_EDIT);
    assert_eq!(result.selected_index, Some(1));
    assert_eq!(result.consistent_count(), 2);
    assert!(result.diff < 0.05, "diff was {}", result.diff);
}

#[test]
fn uuid_v4_with_reported_distances() {
    // Distances as a reviewer scored them, rather than computed.
    let metric = |c: &String, _s0: &String| -> Result<f64, CapabilityError> {
        Ok(if c == RETRANSLATION { 0.8 } else { 0.05 })
    };
    let generator = FixedCandidates::new(vec![RETRANSLATION.to_string(), MINIMAL_EDIT.to_string()]);
    let result = reconcile(
        &S0.to_string(),
        &D0.to_string(),
        &D1.to_string(),
        &uuid_glossary(),
        &metric,
        &generator,
        &ReconcileOptions::default(),
    )
    .unwrap();
    assert_eq!(result.source, MINIMAL_EDIT);
    assert_eq!(result.diff, 0.05);
}

#[test]
fn uuid_v4_stale_source_is_rejected() {
    // The unchanged source is offered but no longer matches the destination.
    let generator = FixedCandidates::new(vec![MINIMAL_EDIT.to_string()]);
    let result = reconcile(
        &S0.to_string(),
        &D0.to_string(),
        &D1.to_string(),
        &uuid_glossary(),
        &WordEditDistance,
        &generator,
        &ReconcileOptions::default().with_source_included(),
    )
    .unwrap();
    assert_eq!(result.source, MINIMAL_EDIT);
    assert!(!result.evaluations[0].consistent);
}

#[test]
fn elements_with_domain_tags() {
    let s0 = Element::tagged(S0, "en");
    let d0 = Element::tagged(D0, "ja");
    let d1 = Element::tagged(D1, "ja");
    let generator = FixedCandidates::new(vec![
        Element::tagged(RETRANSLATION, "en"),
        Element::tagged(MINIMAL_EDIT, "en"),
    ]);
    let result = reconcile(&s0, &d0, &d1, &uuid_glossary(), &NormalizedEditDistance, &generator, &ReconcileOptions::default())
        .unwrap();
    assert_eq!(result.source, Element::tagged(MINIMAL_EDIT, "en"));
}

// -------------------------------------------------------------------------
// Config-driven runs
// -------------------------------------------------------------------------

#[test]
fn parallel_fixture_selects_same_winner() {
    let config = load_config("parallel.toml");
    let options = config.options();
    assert_eq!(options.concurrency, 4);

    let mut candidates: Vec<String> = (0..30).map(|i| format!("{RETRANSLATION} ({i})")).collect();
    candidates.insert(7, MINIMAL_EDIT.to_string());
    let generator = FixedCandidates::new(candidates);

    let result = reconcile(
        &S0.to_string(),
        &D0.to_string(),
        &D1.to_string(),
        &uuid_glossary(),
        &NormalizedEditDistance,
        &generator,
        &options,
    )
    .unwrap();

    // include_source puts s0 at index 0, so the minimal edit sits at 8.
    assert_eq!(result.source, MINIMAL_EDIT);
    assert_eq!(result.selected_index, Some(8));
    // max_candidates = 16 cuts the tail.
    assert_eq!(result.evaluated(), 16);
    assert_eq!(result.within_tolerance, Some(true));

    let report = build_report(&result, &options);
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["summary"]["selected_index"], 8);
    assert_eq!(json["summary"]["evaluated"], 16);
    assert_eq!(json["ranking"][0]["index"], 8);
    assert_eq!(json["meta"]["concurrency"], 4);
}

#[test]
fn prompt_fixture_renders_delta() {
    let config = load_config("delta-prompt.toml");
    let prompt = config.prompt.build().unwrap();
    let text = prompt.render(S0, D0, D1);
    assert!(text.contains(&format!("Source: {S0}")));
    assert!(text.contains("+ v4"));
}

// -------------------------------------------------------------------------
// Cancellation
// -------------------------------------------------------------------------

#[test]
fn caller_cancellation_mid_run() {
    let token = CancelToken::new();
    let calls = AtomicUsize::new(0);
    let oracle = |_: &String, _: &String| -> Result<bool, CapabilityError> {
        if calls.fetch_add(1, Ordering::SeqCst) == 2 {
            token.cancel();
        }
        Ok(true)
    };
    let generator = FixedCandidates::new((0..10).map(|i| i.to_string()).collect());
    let err = reconcile(
        &"s".to_string(),
        &"d0".to_string(),
        &"d1".to_string(),
        &oracle,
        &NormalizedEditDistance,
        &generator,
        &ReconcileOptions::default().with_cancel(token.clone()),
    )
    .unwrap_err();
    assert_eq!(err, ReconcileError::Cancelled);
}

#[test]
fn deadline_expires_under_parallel_evaluation() {
    let oracle = |_: &String, _: &String| -> Result<bool, CapabilityError> {
        std::thread::sleep(Duration::from_millis(25));
        Ok(true)
    };
    let generator = FixedCandidates::new((0..20).map(|i| i.to_string()).collect());
    let err = reconcile(
        &"s".to_string(),
        &"d0".to_string(),
        &"d1".to_string(),
        &oracle,
        &NormalizedEditDistance,
        &generator,
        &ReconcileOptions::default().with_concurrency(2).with_deadline(Duration::from_millis(10)),
    )
    .unwrap_err();
    assert_eq!(err, ReconcileError::Cancelled);
}

// -------------------------------------------------------------------------
// Tracked pair across several edits
// -------------------------------------------------------------------------

#[test]
fn tracked_pair_follows_edits_on_both_sides() {
    let oracle = uuid_glossary();
    let options = ReconcileOptions::default();
    let mut tracked = TrackedPair::new(S0.to_string(), D0.to_string());

    tracked
        .update_destination(
            D1.to_string(),
            &oracle,
            &NormalizedEditDistance,
            &FixedCandidates::new(vec![RETRANSLATION.to_string(), MINIMAL_EDIT.to_string()]),
            &options,
        )
        .unwrap();
    assert_eq!(tracked.source(), MINIMAL_EDIT);

    // Now the English side drops "secure"; the Japanese side must follow.
    let edited = MINIMAL_EDIT.replace("a secure implementation", "an implementation");
    let d2 = "ユーザーIDの生成方法をUUID v4などを使った実装に変更する。";
    tracked
        .update_source(
            edited.clone(),
            &oracle,
            &NormalizedEditDistance,
            &FixedCandidates::new(vec![D1.to_string(), d2.to_string()]),
            &options,
        )
        .unwrap();
    assert_eq!(tracked.source(), &edited);
    assert_eq!(tracked.destination(), d2);
    assert_eq!(tracked.history().len(), 2);
    assert!(tracked.total_drift() > 0.0);
}
