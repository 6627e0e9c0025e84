// Integration tests (native) for the `zen-guardians` crate.
// Everything here runs on the host: storage is a MemoryStore and the
// microphone is a ScriptedSource, so no browser API is touched.

use zen_guardians::config::VariantConfig;
use zen_guardians::persist::{KeyValueStore, MemoryStore, SaveData};
use zen_guardians::registry::{CharacterRegistry, RegistryError, ZEN_CHARACTERS};
use zen_guardians::sampler::{NoiseSource, ScriptedSource};
use zen_guardians::{
    AppStatus, MicAccess, MicError, Mood, NoiseApp, Profile, SessionEvent, StartRefused,
};

const FPS: f64 = 60.0;

fn at(frame: u32) -> f64 {
    frame as f64 * 1000.0 / FPS
}

fn zen_profile(store: MemoryStore) -> Profile<MemoryStore> {
    let registry = CharacterRegistry::new(ZEN_CHARACTERS).expect("zen catalog is valid");
    Profile::load(registry, store)
}

fn saved(profile: &Profile<MemoryStore>) -> SaveData {
    SaveData::from_json(profile.store().blob().expect("profile was saved")).expect("valid json")
}

// --- Persistence ---------------------------------------------------------------

#[test]
fn saved_blob_restores_balance_unlocks_and_active() {
    let blob = r#"{"stars":12,"unlocked":["cat","owl"],"activeCharId":"owl"}"#;
    let profile = zen_profile(MemoryStore::with_blob(blob));
    assert_eq!(profile.stars(), 12);
    assert_eq!(profile.active_id(), "owl");
    assert_eq!(profile.registry().unlocked_ids(), vec!["cat", "owl"]);
    assert!(!profile.registry().get("dragon").unwrap().unlocked);
}

#[test]
fn active_character_that_is_not_unlocked_falls_back_to_default() {
    let blob = r#"{"stars":3,"unlocked":["cat"],"activeCharId":"dragon"}"#;
    let profile = zen_profile(MemoryStore::with_blob(blob));
    assert_eq!(profile.stars(), 3);
    assert_eq!(profile.active_id(), "cat");
}

#[test]
fn corrupt_or_missing_blob_yields_defaults() {
    for store in [
        MemoryStore::new(),
        MemoryStore::with_blob("not json at all"),
        MemoryStore::with_blob(r#"{"stars":-4,"unlocked":["owl"]}"#),
    ] {
        let profile = zen_profile(store);
        assert_eq!(profile.stars(), 0);
        assert_eq!(profile.active_id(), "cat");
        assert_eq!(profile.registry().unlocked_ids(), vec!["cat"]);
    }
}

#[test]
fn unknown_ids_in_blob_are_ignored() {
    let blob = r#"{"stars":7,"unlocked":["cat","unicorn"],"activeCharId":"unicorn"}"#;
    let profile = zen_profile(MemoryStore::with_blob(blob));
    assert_eq!(profile.stars(), 7);
    assert_eq!(profile.active_id(), "cat");
    assert_eq!(profile.registry().unlocked_ids(), vec!["cat"]);
}

// --- Purchases -----------------------------------------------------------------

#[test]
fn purchase_with_too_few_stars_changes_nothing() {
    let mut profile = zen_profile(MemoryStore::with_blob(r#"{"stars":40,"unlocked":["cat"]}"#));
    let err = profile.purchase("owl").unwrap_err();
    assert_eq!(err.to_string(), "you need 50 stars to unlock Prof. Hoot!");
    assert_eq!(profile.stars(), 40);
    assert!(!profile.registry().get("owl").unwrap().unlocked);
    assert_eq!(profile.store().writes(), 0);
}

#[test]
fn purchase_debits_unlocks_and_saves_together() {
    let mut profile = zen_profile(MemoryStore::with_blob(r#"{"stars":60,"unlocked":["cat"]}"#));
    assert_eq!(profile.purchase("owl"), Ok(10));
    assert_eq!(profile.stars(), 10);

    let data = saved(&profile);
    assert_eq!(data.stars, 10);
    assert!(data.unlocked.contains(&"owl".to_string()));

    // Buying the same guardian twice is refused and costs nothing.
    assert_eq!(
        profile.purchase("owl"),
        Err(RegistryError::AlreadyUnlocked("Prof. Hoot".into()))
    );
    assert_eq!(profile.stars(), 10);
}

#[test]
fn select_requires_unlocked_character() {
    let mut profile = zen_profile(MemoryStore::new());
    assert_eq!(
        profile.select("dragon"),
        Err(RegistryError::NotUnlocked("Sparky".into()))
    );
    assert_eq!(
        profile.select("phoenix"),
        Err(RegistryError::NotFound("phoenix".into()))
    );
    assert_eq!(profile.active_id(), "cat");
}

#[test]
fn reloading_after_purchase_and_select_reproduces_state() {
    let mut profile = zen_profile(MemoryStore::with_blob(r#"{"stars":200,"unlocked":["cat"]}"#));
    profile.purchase("dragon").unwrap();
    profile.select("dragon").unwrap();
    let blob = profile.store().blob().unwrap().to_string();

    let reloaded = zen_profile(MemoryStore::with_blob(blob));
    assert_eq!(reloaded.stars(), 50);
    assert_eq!(reloaded.active_id(), "dragon");
    assert_eq!(reloaded.snapshot(), profile.snapshot());
}

// --- End to end ----------------------------------------------------------------

fn run(app: &mut NoiseApp<MemoryStore>, source: &mut impl NoiseSource, frames: u32) -> Vec<SessionEvent> {
    let mut events = Vec::new();
    for f in 1..=frames {
        events.extend(app.frame(source.amplitude(), at(f)));
    }
    events
}

#[test]
fn quiet_zen_session_banks_a_star_every_600_frames() {
    let mut app = NoiseApp::new(VariantConfig::zen(), MemoryStore::new()).unwrap();
    app.begin(MicAccess::Granted(()), at(0)).unwrap();
    assert_eq!(app.status(), AppStatus::Running);

    let mut silence = ScriptedSource::new(Vec::new());
    let events = run(&mut app, &mut silence, 1200);

    let earned: u32 = events
        .iter()
        .filter_map(|e| match e {
            SessionEvent::CurrencyEarned { amount } => Some(*amount),
            _ => None,
        })
        .sum();
    assert_eq!(earned, 2);
    assert_eq!(app.profile().stars(), 2);
    assert_eq!(saved(app.profile()).stars, 2);
    assert_eq!(app.mood(), Mood::Sleep);
}

#[test]
fn noise_wakes_guardian_and_forfeits_the_streak() {
    let mut app = NoiseApp::new(VariantConfig::zen(), MemoryStore::new()).unwrap();
    app.begin(MicAccess::Granted(()), at(0)).unwrap();
    let threshold = app.threshold();

    // 500 quiet frames, one shout, then quiet again.
    let mut samples = vec![0.0; 500];
    samples.push(threshold * 2.0);
    let mut source = ScriptedSource::new(samples);
    let events = run(&mut app, &mut source, 501);

    assert_eq!(app.mood(), Mood::Angry);
    assert!(events.contains(&SessionEvent::MoodChanged { mood: Mood::Angry }));
    assert_eq!(app.message(), app.config().messages.angry);
    assert_eq!(app.profile().stars(), 0);

    // The guardian only settles once the cooldown has run on quiet input.
    for f in 502..=700 {
        app.frame(0.0, at(f));
    }
    assert_eq!(app.mood(), Mood::Sleep);
    assert!(app.session().unwrap().quiet_streak_frames() < 600);
    assert_eq!(app.profile().stars(), 0);
}

#[test]
fn denied_microphone_leaves_app_idle_with_message() {
    let mut app = NoiseApp::new(VariantConfig::zen(), MemoryStore::new()).unwrap();
    assert_eq!(app.begin(MicAccess::<()>::Denied, 0.0).unwrap_err().error, MicError::Denied);
    assert_eq!(app.status(), AppStatus::Idle);
    assert_eq!(app.message(), app.config().messages.mic_denied);
    assert!(app.frame(255.0, 16.0).is_empty());
}

#[test]
fn second_start_is_rejected_while_running() {
    let mut app = NoiseApp::new(VariantConfig::zen(), MemoryStore::new()).unwrap();
    app.begin(MicAccess::Granted(()), 0.0).unwrap();
    assert_eq!(
        app.begin(MicAccess::Granted(()), 10.0),
        Err(StartRefused {
            error: MicError::AlreadyRunning,
            handle: Some(()),
        })
    );
    app.stop();
    assert_eq!(app.status(), AppStatus::Idle);
    assert!(app.begin(MicAccess::Granted(()), 20.0).is_ok());
}

/// Stand-in microphone that records whether it was released.
#[derive(Debug)]
struct FakeMic {
    released: std::rc::Rc<std::cell::Cell<bool>>,
}

impl FakeMic {
    fn release(self) {
        self.released.set(true);
    }
}

#[test]
fn overlapping_starts_release_the_extra_microphone() {
    let mut app = NoiseApp::new(VariantConfig::zen(), MemoryStore::new()).unwrap();
    let first = std::rc::Rc::new(std::cell::Cell::new(false));
    let second = std::rc::Rc::new(std::cell::Cell::new(false));

    let kept = app
        .begin(MicAccess::Granted(FakeMic { released: first.clone() }), 0.0)
        .unwrap();
    // The caller owns whatever comes back in the refusal and releases it.
    let refused = app
        .begin(MicAccess::Granted(FakeMic { released: second.clone() }), 5.0)
        .unwrap_err();
    assert_eq!(refused.error, MicError::AlreadyRunning);
    refused.handle.expect("extra mic handed back").release();

    assert!(second.get());
    assert!(!first.get());
    assert_eq!(app.status(), AppStatus::Running);
    kept.release();
    assert!(first.get());
}

#[test]
fn sensitivity_extremes() {
    let mut app = NoiseApp::new(VariantConfig::zen(), MemoryStore::new()).unwrap();
    app.begin(MicAccess::Granted(()), 0.0).unwrap();

    // Slider at 0: even a maxed-out reading never disturbs.
    app.set_sensitivity(0);
    app.frame(255.0, at(1));
    assert_eq!(app.mood(), Mood::Sleep);

    // Slider at 100: any sound at all disturbs.
    app.set_sensitivity(100);
    app.frame(1.0, at(2));
    assert!(app.mood().is_disturbed());

    // Out-of-range input is clamped.
    app.set_sensitivity(250);
    assert_eq!(app.sensitivity(), 100);
}

#[test]
fn classic_session_reaches_milestones_on_uninterrupted_quiet() {
    let mut app = NoiseApp::new(VariantConfig::classic(), MemoryStore::new()).unwrap();
    app.begin(MicAccess::Granted(()), at(0)).unwrap();

    let mut silence = ScriptedSource::new(Vec::new());
    let events = run(&mut app, &mut silence, 60 * 61);
    assert!(events.contains(&SessionEvent::MilestoneReached { id: "pillow".into() }));
    assert!(!events.iter().any(|e| matches!(e, SessionEvent::CurrencyEarned { .. })));

    // A loud frame restarts the quiet clock.
    let threshold = app.threshold();
    app.frame(threshold * 2.0, at(60 * 61 + 1));
    assert_eq!(app.session().unwrap().elapsed_secs(), 0);
    assert!(app.session().unwrap().milestones().milestones()[0].reached);
}

#[test]
fn events_serialize_for_the_host_page() {
    let json = serde_json::to_string(&SessionEvent::MoodChanged { mood: Mood::Angry }).unwrap();
    assert_eq!(json, r#"{"type":"moodChanged","mood":"angry"}"#);
    let json = serde_json::to_string(&SessionEvent::CurrencyEarned { amount: 1 }).unwrap();
    assert_eq!(json, r#"{"type":"currencyEarned","amount":1}"#);
}

#[test]
fn memory_store_counts_writes() {
    let mut store = MemoryStore::new();
    assert_eq!(store.load(), None);
    store.save("{}");
    store.save(r#"{"stars":1}"#);
    assert_eq!(store.writes(), 2);
    assert_eq!(store.load().as_deref(), Some(r#"{"stars":1}"#));
}

// --- Catalogs ------------------------------------------------------------------

#[test]
fn builtin_catalogs_are_well_formed() {
    use zen_guardians::registry::CLASSIC_CHARACTERS;
    for catalog in [ZEN_CHARACTERS, CLASSIC_CHARACTERS] {
        let registry = CharacterRegistry::new(catalog).expect("catalog builds");
        assert_eq!(catalog.iter().filter(|c| c.cost == 0).count(), 1);
        assert!(registry.get(registry.default_id()).unwrap().unlocked);
        for c in catalog {
            for mood in [Mood::Sleep, Mood::Alert, Mood::Angry] {
                assert!(c.mood_asset(mood).is_some(), "{} has no {} asset", c.id, mood.as_str());
            }
            assert_eq!(c.unlocked, c.cost == 0, "only free guardians start unlocked");
        }
    }
}

#[test]
fn zen_costs_ascend() {
    let costs: Vec<u32> = ZEN_CHARACTERS.iter().map(|c| c.cost).collect();
    assert_eq!(costs, vec![0, 50, 150]);
}
