//! Integration test harness
//!
//! End-to-end scenarios over the public API: theme composition, content
//! resolution, preference persistence and the onboarding flow.

mod common;

use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tempfile::TempDir;

use persona_kit::error::{Error, ErrorCode, Result};
use persona_kit::{
    compose, ContentNode, ContentResolver, Experience, FilePreferenceStore, FlowSignal,
    MemoryPreferenceStore, OnboardingEvent, OnboardingFlow, OnboardingState, PersonaKey,
    PreferenceStore, ThemeRegistry, TokenSet,
};

// ─────────────────────────────────────────────────────────────────
// Test Fixtures
// ─────────────────────────────────────────────────────────────────

/// Store whose first `failures` saves fail, then succeed.
struct FlakyStore {
    inner: MemoryPreferenceStore,
    failures: AtomicUsize,
}

impl FlakyStore {
    fn new(failures: usize) -> Self {
        Self {
            inner: MemoryPreferenceStore::new(),
            failures: AtomicUsize::new(failures),
        }
    }
}

#[async_trait]
impl PreferenceStore for FlakyStore {
    async fn load(&self) -> Result<Option<PersonaKey>> {
        self.inner.load().await
    }

    async fn save(&self, persona: PersonaKey) -> Result<()> {
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(Error::preference_write(persona, "disk full"));
        }
        self.inner.save(persona).await
    }

    async fn clear(&self) -> Result<()> {
        self.inner.clear().await
    }
}

fn bundled() -> Arc<ThemeRegistry> {
    Arc::new(ThemeRegistry::bundled(PersonaKey::Male).unwrap())
}

fn lesson() -> ContentNode {
    ContentNode::from_path(&common::fixture_path("lesson.json")).unwrap()
}

// ─────────────────────────────────────────────────────────────────
// Theme Tests
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_every_persona_covers_base_tokens() {
    let registry = bundled();
    let base_paths = registry.base().leaf_paths();
    assert!(!base_paths.is_empty());

    for persona in PersonaKey::all() {
        let theme = registry.resolve(*persona);
        for path in &base_paths {
            assert!(
                theme.tokens.contains_path(path),
                "{} theme is missing {}",
                persona,
                path
            );
        }
    }
}

#[test]
fn test_compose_twice_equals_once() {
    let registry = bundled();
    let overlay = registry.override_for(PersonaKey::Female).unwrap();

    let once = compose(registry.base(), overlay);
    let twice = compose(&once, overlay);
    assert_eq!(once.to_value(), twice.to_value());
}

#[test]
fn test_unknown_persona_shares_default_theme() {
    let registry = bundled();
    let unknown = registry.resolve_str("unknown-persona");
    let default = registry.resolve(registry.default_persona());
    assert!(Arc::ptr_eq(&unknown, &default));
}

#[test]
fn test_registry_from_bundled_directory_matches_bundled() {
    let from_dir = ThemeRegistry::from_dir(&common::bundled_themes_dir(), PersonaKey::Male).unwrap();
    let bundled = bundled();

    for persona in PersonaKey::all() {
        assert_eq!(
            from_dir.resolve(*persona).tokens.to_value(),
            bundled.resolve(*persona).tokens.to_value()
        );
    }
}

#[test]
fn test_registry_from_json_directory() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("base.json"),
        r##"{"colors": {"primary": "#000000", "text": "#111111"}}"##,
    )
    .unwrap();
    fs::write(dir.path().join("male.json"), r##"{"colors": {"primary": "#0000ff"}}"##).unwrap();
    fs::write(dir.path().join("female.json"), r##"{"colors": {"primary": "#ff00ff"}}"##).unwrap();

    let registry = ThemeRegistry::from_dir(dir.path(), PersonaKey::Female).unwrap();
    let female = registry.resolve(PersonaKey::Female);
    assert_eq!(female.get_str("colors.primary"), Some("#ff00ff"));
    assert_eq!(female.get_str("colors.text"), Some("#111111"));
    assert!(Arc::ptr_eq(&registry.resolve_str("nope"), &female));
}

#[test]
fn test_registry_rejects_dotted_token_keys() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("base.toml"), "[spacing]\n\"0.5\" = 2\nmd = 16\n").unwrap();
    fs::write(dir.path().join("male.toml"), "[spacing]\n\"0.5\" = 3\n").unwrap();
    fs::write(dir.path().join("female.toml"), "").unwrap();

    let err = ThemeRegistry::from_dir(dir.path(), PersonaKey::Male).unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidTokenSet);
    assert!(err.to_string().contains("0.5"));
}

#[test]
fn test_override_changing_token_kind_is_rejected() {
    let base = TokenSet::from_toml_str("base", "[colors]\nprimary = \"#000\"\n").unwrap();
    let male = TokenSet::from_toml_str("male", "colors = \"#fff\"\n").unwrap();
    let female = TokenSet::from_toml_str("female", "[colors]\nprimary = \"#f0f\"\n").unwrap();

    let overrides = [(PersonaKey::Male, male), (PersonaKey::Female, female)]
        .into_iter()
        .collect();
    let err = ThemeRegistry::new(base, overrides, PersonaKey::Male).unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidTokenSet);
}

// ─────────────────────────────────────────────────────────────────
// Content Tests
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_resolved_lesson_has_no_variants() {
    let resolver = ContentResolver::new(PersonaKey::Male);
    for persona in PersonaKey::all() {
        let resolved = resolver.resolve(&lesson(), *persona);
        assert!(resolved.is_resolved());
        assert_eq!(resolver.resolve(&resolved, *persona), resolved);
    }
}

#[test]
fn test_default_used_when_persona_missing() {
    let resolver = ContentResolver::default();
    let node = ContentNode::from_value(json!({
        "$variants": { "female": "x", "default": "y" }
    }))
    .unwrap();

    assert_eq!(resolver.resolve(&node, PersonaKey::Male).as_str(), Some("y"));
    assert_eq!(resolver.resolve_str(&node, "robot").as_str(), Some("y"));
    assert_eq!(resolver.resolve(&node, PersonaKey::Female).as_str(), Some("x"));
}

#[test]
fn test_persona_only_variants() {
    let resolver = ContentResolver::default();
    let node = ContentNode::from_value(json!({
        "$variants": { "male": "x", "female": "z" }
    }))
    .unwrap();

    assert_eq!(resolver.resolve(&node, PersonaKey::Male).as_str(), Some("x"));
    assert_eq!(resolver.resolve(&node, PersonaKey::Female).as_str(), Some("z"));
}

#[test]
fn test_lesson_resolution_per_persona() {
    let resolver = ContentResolver::default();
    let female = resolver.resolve(&lesson(), PersonaKey::Female).to_value();

    assert_eq!(female["title"], json!("Meet your AI companion"));
    assert_eq!(female["intro"], json!("Let's explore what it can do together."));
    assert_eq!(female["steps"], json!(["Open the studio", "Type your first prompt"]));
    assert_eq!(female["duration_minutes"], json!(5));
}

#[test]
fn test_missing_variant_is_reported_not_fatal() {
    let resolver = ContentResolver::default();
    let node = ContentNode::from_value(json!({
        "hint": { "$variants": { "female": "b", "beta": "a" } }
    }))
    .unwrap();

    let (resolved, fallbacks) = resolver.resolve_with_report(&node, PersonaKey::Male);
    assert_eq!(resolved.get("hint").and_then(ContentNode::as_str), Some("a"));
    assert_eq!(fallbacks.len(), 1);
    assert_eq!(fallbacks[0].chosen, "beta");
    assert_eq!(fallbacks[0].to_error().code(), ErrorCode::MissingVariant);
}

// ─────────────────────────────────────────────────────────────────
// Onboarding Scenarios
// ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_fresh_install_select_confirm() {
    let store = Arc::new(MemoryPreferenceStore::new());
    let (mut flow, mut signals) = OnboardingFlow::new(store.clone());

    assert_eq!(flow.start().await, OnboardingState::Selection);
    assert_eq!(
        flow.dispatch(OnboardingEvent::Select(PersonaKey::Female)).await.unwrap(),
        OnboardingState::Preview(PersonaKey::Female)
    );
    assert_eq!(
        flow.dispatch(OnboardingEvent::Confirm).await.unwrap(),
        OnboardingState::Committed(PersonaKey::Female)
    );

    assert_eq!(store.save_calls(), 1);
    assert_eq!(store.peek(), Some(PersonaKey::Female));
    assert_eq!(signals.recv().await, Some(FlowSignal::Proceed(PersonaKey::Female)));
}

#[tokio::test]
async fn test_stored_preference_skips_selection() {
    let store = Arc::new(MemoryPreferenceStore::with_preference(PersonaKey::Male));
    let (mut flow, mut signals) = OnboardingFlow::new(store.clone());

    assert_eq!(flow.start().await, OnboardingState::Committed(PersonaKey::Male));
    assert_eq!(signals.recv().await, Some(FlowSignal::Skip(PersonaKey::Male)));
    assert_eq!(store.save_calls(), 0);
}

#[tokio::test]
async fn test_failed_save_then_retry() {
    let store = Arc::new(FlakyStore::new(1));
    let (mut flow, _signals) = OnboardingFlow::new(store.clone());
    flow.start().await;
    flow.dispatch(OnboardingEvent::Select(PersonaKey::Male)).await.unwrap();

    let err = flow.dispatch(OnboardingEvent::Confirm).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::PreferenceWrite);
    assert!(err.is_user_facing());
    assert_eq!(flow.state(), OnboardingState::Preview(PersonaKey::Male));

    assert_eq!(
        flow.dispatch(OnboardingEvent::Confirm).await.unwrap(),
        OnboardingState::Committed(PersonaKey::Male)
    );
    assert_eq!(store.load().await.unwrap(), Some(PersonaKey::Male));
}

#[tokio::test]
async fn test_choice_survives_restart_with_file_store() {
    let dir = TempDir::new().unwrap();

    let store = Arc::new(FilePreferenceStore::new(dir.path(), "persona"));
    let (mut flow, _signals) = OnboardingFlow::new(store);
    flow.start().await;
    flow.dispatch(OnboardingEvent::Select(PersonaKey::Female)).await.unwrap();
    flow.dispatch(OnboardingEvent::Confirm).await.unwrap();

    // A new process sees the stored choice
    let store = Arc::new(FilePreferenceStore::new(dir.path(), "persona"));
    let (mut flow, _signals) = OnboardingFlow::new(store);
    assert_eq!(flow.start().await, OnboardingState::Committed(PersonaKey::Female));
}

#[test]
fn test_experience_end_to_end() {
    tokio_test::block_on(async {
        let store = Arc::new(MemoryPreferenceStore::new());
        let mut exp = Experience::new(bundled(), store.clone()).await;
        assert_eq!(exp.onboarding_state(), OnboardingState::Selection);

        exp.dispatch(OnboardingEvent::Select(PersonaKey::Female)).await.unwrap();
        exp.dispatch(OnboardingEvent::Back).await.unwrap();
        exp.dispatch(OnboardingEvent::Select(PersonaKey::Male)).await.unwrap();
        let state = exp.dispatch(OnboardingEvent::Confirm).await.unwrap();
        assert_eq!(state, OnboardingState::Committed(PersonaKey::Male));

        let persona = state.persona().unwrap();
        let theme = exp.get_theme(persona.slug());
        assert_eq!(theme.persona, PersonaKey::Male);

        let content = exp.get_content(&lesson(), persona.slug());
        assert_eq!(content.get("title").and_then(ContentNode::as_str), Some("Meet your AI co-pilot"));

        let err = exp.dispatch(OnboardingEvent::Back).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidTransition);
        assert_eq!(exp.onboarding_state(), OnboardingState::Committed(PersonaKey::Male));
    });
}
