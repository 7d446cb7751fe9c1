//! Behaviour of the generation workflow against in-memory fakes of every port.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use mindload_core::{
    AchievementTracker, EnforcementResult, Flashcard, GenerationDepth, GenerationEngine,
    GenerationError, GenerationOrchestrator, GenerationRequest, PortError, PortResult,
    ProcessOutcome, Quiz, QuizQuestion, QuotaLedger, StudySet, StudySetLibrary, StudySetStore, Tier,
    UserEconomy, DEGRADED_NOTICE,
};
use uuid::Uuid;

//=========================================================================================
// Fakes
//=========================================================================================

struct FakeLedger {
    block_reason: Option<String>,
    check_fails: bool,
    /// Charges that will still succeed. `None` means unlimited.
    charges_left: Mutex<Option<usize>>,
    charge_errors: bool,
    tier: Tier,
    checks: AtomicUsize,
    charges: AtomicUsize,
}

impl FakeLedger {
    fn allowing() -> Self {
        Self {
            block_reason: None,
            check_fails: false,
            charges_left: Mutex::new(None),
            charge_errors: false,
            tier: Tier::Free,
            checks: AtomicUsize::new(0),
            charges: AtomicUsize::new(0),
        }
    }

    fn blocking(reason: &str) -> Self {
        Self {
            block_reason: Some(reason.to_string()),
            ..Self::allowing()
        }
    }

    fn with_charges_left(self, n: usize) -> Self {
        *self.charges_left.lock().unwrap() = Some(n);
        self
    }

    fn checks(&self) -> usize {
        self.checks.load(Ordering::SeqCst)
    }

    fn charges(&self) -> usize {
        self.charges.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuotaLedger for FakeLedger {
    async fn can_generate_content(
        &self,
        _user_id: Uuid,
        _request: &GenerationRequest,
    ) -> PortResult<EnforcementResult> {
        self.checks.fetch_add(1, Ordering::SeqCst);
        if self.check_fails {
            return Err(PortError::Unexpected("ledger offline".to_string()));
        }
        Ok(match &self.block_reason {
            Some(reason) => EnforcementResult::blocked(reason.clone()),
            None => EnforcementResult::allowed(),
        })
    }

    async fn use_credits_for_generation(
        &self,
        _user_id: Uuid,
        _request: &GenerationRequest,
    ) -> PortResult<bool> {
        self.charges.fetch_add(1, Ordering::SeqCst);
        if self.charge_errors {
            return Err(PortError::Unexpected("ledger write failed".to_string()));
        }
        let mut left = self.charges_left.lock().unwrap();
        match left.as_mut() {
            None => Ok(true),
            Some(0) => Ok(false),
            Some(n) => {
                *n -= 1;
                Ok(true)
            }
        }
    }

    async fn user_economy(&self, user_id: Uuid) -> PortResult<UserEconomy> {
        Ok(UserEconomy::new(user_id, self.tier, Utc::now()))
    }
}

struct FakeEngine {
    /// `None` makes the call fail.
    flashcards: Option<usize>,
    questions: Option<usize>,
    flashcard_calls: AtomicUsize,
    quiz_calls: AtomicUsize,
}

impl FakeEngine {
    fn returning(flashcards: Option<usize>, questions: Option<usize>) -> Self {
        Self {
            flashcards,
            questions,
            flashcard_calls: AtomicUsize::new(0),
            quiz_calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.flashcard_calls.load(Ordering::SeqCst) + self.quiz_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerationEngine for FakeEngine {
    async fn generate_flashcards_from_content(
        &self,
        _text: &str,
        _count: usize,
        _depth: GenerationDepth,
    ) -> PortResult<Vec<Flashcard>> {
        self.flashcard_calls.fetch_add(1, Ordering::SeqCst);
        let n = self
            .flashcards
            .ok_or_else(|| PortError::Unexpected("model timed out".to_string()))?;
        Ok((0..n)
            .map(|i| Flashcard::new(format!("front {}", i), format!("back {}", i)))
            .collect())
    }

    async fn generate_quiz_questions_from_content(
        &self,
        _text: &str,
        _count: usize,
        _depth: GenerationDepth,
    ) -> PortResult<Vec<QuizQuestion>> {
        self.quiz_calls.fetch_add(1, Ordering::SeqCst);
        let n = self
            .questions
            .ok_or_else(|| PortError::Unexpected("model timed out".to_string()))?;
        Ok((0..n)
            .map(|i| QuizQuestion {
                question: format!("question {}", i),
                options: vec!["yes".to_string(), "no".to_string()],
                correct_answer: 0,
                explanation: None,
            })
            .collect())
    }
}

#[derive(Default)]
struct MemoryStore {
    sets: Mutex<HashMap<Uuid, StudySet>>,
    fail_writes: bool,
    updates: AtomicUsize,
}

impl MemoryStore {
    fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    fn all(&self) -> Vec<StudySet> {
        self.sets.lock().unwrap().values().cloned().collect()
    }

    fn insert(&self, set: StudySet) {
        self.sets.lock().unwrap().insert(set.id, set);
    }

    fn updates(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StudySetStore for MemoryStore {
    async fn add_study_set(&self, study_set: &StudySet) -> PortResult<()> {
        if self.fail_writes {
            return Err(PortError::Unexpected("disk full".to_string()));
        }
        self.sets
            .lock()
            .unwrap()
            .entry(study_set.id)
            .or_insert_with(|| study_set.clone());
        Ok(())
    }

    async fn update_study_set(&self, study_set: &StudySet) -> PortResult<()> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes {
            return Err(PortError::Unexpected("disk full".to_string()));
        }
        let mut sets = self.sets.lock().unwrap();
        if !sets.contains_key(&study_set.id) {
            return Err(PortError::NotFound(study_set.id.to_string()));
        }
        sets.insert(study_set.id, study_set.clone());
        Ok(())
    }

    async fn get_study_set(&self, user_id: Uuid, study_set_id: Uuid) -> PortResult<StudySet> {
        self.sets
            .lock()
            .unwrap()
            .get(&study_set_id)
            .filter(|s| s.user_id == user_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(study_set_id.to_string()))
    }

    async fn list_study_sets(&self, user_id: Uuid) -> PortResult<Vec<StudySet>> {
        Ok(self
            .all()
            .into_iter()
            .filter(|s| s.user_id == user_id)
            .collect())
    }

    async fn delete_study_set(&self, user_id: Uuid, study_set_id: Uuid) -> PortResult<()> {
        let mut sets = self.sets.lock().unwrap();
        match sets.get(&study_set_id) {
            Some(s) if s.user_id == user_id => {
                sets.remove(&study_set_id);
                Ok(())
            }
            _ => Err(PortError::NotFound(study_set_id.to_string())),
        }
    }
}

#[derive(Default)]
struct FakeTracker {
    fail: bool,
    sets_created: AtomicUsize,
    cards_created: AtomicUsize,
}

#[async_trait]
impl AchievementTracker for FakeTracker {
    async fn track_study_set_created(&self, _user_id: Uuid) -> PortResult<()> {
        if self.fail {
            return Err(PortError::Unexpected("achievements offline".to_string()));
        }
        self.sets_created.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn track_cards_created(&self, _user_id: Uuid, count: usize) -> PortResult<()> {
        self.cards_created.fetch_add(count, Ordering::SeqCst);
        Ok(())
    }
}

struct Harness {
    ledger: Arc<FakeLedger>,
    engine: Arc<FakeEngine>,
    store: Arc<MemoryStore>,
    tracker: Arc<FakeTracker>,
    orchestrator: GenerationOrchestrator,
}

fn harness(ledger: FakeLedger, engine: FakeEngine, store: MemoryStore, tracker: FakeTracker) -> Harness {
    let ledger = Arc::new(ledger);
    let engine = Arc::new(engine);
    let store = Arc::new(store);
    let tracker = Arc::new(tracker);
    let orchestrator = GenerationOrchestrator::new(
        ledger.clone(),
        engine.clone(),
        store.clone(),
        tracker.clone(),
    );
    Harness {
        ledger,
        engine,
        store,
        tracker,
        orchestrator,
    }
}

fn default_harness(engine: FakeEngine) -> Harness {
    harness(
        FakeLedger::allowing(),
        engine,
        MemoryStore::default(),
        FakeTracker::default(),
    )
}

/// Lets spawned best-effort tasks run on the current-thread test runtime.
async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

const NOTES: &str = "Lecture notes on mitosis";

//=========================================================================================
// process_content
//=========================================================================================

#[tokio::test]
async fn clamps_flashcards_and_attaches_one_quiz() {
    let h = default_harness(FakeEngine::returning(Some(20), Some(10)));
    let user_id = Uuid::new_v4();

    let outcome = h
        .orchestrator
        .process_content(user_id, NOTES, "Mitosis", 10, 15)
        .await
        .unwrap();

    let ProcessOutcome::Generated(set) = outcome else {
        panic!("expected generated outcome");
    };
    assert_eq!(NOTES.chars().count(), 24);
    assert_eq!(set.flashcards.len(), 15);
    assert_eq!(set.quizzes.len(), 1);
    assert_eq!(set.quizzes[0].questions.len(), 10);
    assert_eq!(set.content, NOTES);
    assert_eq!(h.ledger.checks(), 1);
    assert_eq!(h.ledger.charges(), 1);

    let stored = h.store.all();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0], set);
}

#[tokio::test]
async fn keeps_fewer_flashcards_than_requested() {
    let h = default_harness(FakeEngine::returning(Some(4), None));

    let outcome = h
        .orchestrator
        .process_content(Uuid::new_v4(), NOTES, "Mitosis", 0, 15)
        .await
        .unwrap();

    assert_eq!(outcome.study_set().flashcards.len(), 4);
    assert!(outcome.study_set().quizzes.is_empty());
    assert!(outcome.notice().is_none());
}

#[tokio::test]
async fn only_requested_kinds_are_generated() {
    let h = default_harness(FakeEngine::returning(Some(5), Some(5)));

    h.orchestrator
        .process_content(Uuid::new_v4(), NOTES, "Mitosis", 5, 0)
        .await
        .unwrap();

    assert_eq!(h.engine.flashcard_calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.engine.quiz_calls.load(Ordering::SeqCst), 1);
    let set = &h.store.all()[0];
    assert!(set.flashcards.is_empty());
    assert_eq!(set.quizzes[0].questions.len(), 5);
}

#[tokio::test]
async fn zero_selection_touches_no_collaborator() {
    let h = default_harness(FakeEngine::returning(Some(5), Some(5)));

    let err = h
        .orchestrator
        .process_content(Uuid::new_v4(), "x", "X", 0, 0)
        .await
        .unwrap_err();

    assert!(matches!(err, GenerationError::InvalidSelection));
    assert_eq!(h.ledger.checks(), 0);
    assert_eq!(h.ledger.charges(), 0);
    assert_eq!(h.engine.calls(), 0);
    assert!(h.store.all().is_empty());
}

#[tokio::test]
async fn blocked_quota_reports_ledger_reason() {
    let h = harness(
        FakeLedger::blocking("Daily limit reached"),
        FakeEngine::returning(Some(5), Some(5)),
        MemoryStore::default(),
        FakeTracker::default(),
    );

    let err = h
        .orchestrator
        .process_content(Uuid::new_v4(), NOTES, "Mitosis", 5, 5)
        .await
        .unwrap_err();

    match err {
        GenerationError::QuotaBlocked(reason) => assert_eq!(reason, "Daily limit reached"),
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(h.ledger.charges(), 0);
    assert_eq!(h.engine.calls(), 0);
    assert!(h.store.all().is_empty());
}

#[tokio::test]
async fn unreachable_ledger_blocks_generation() {
    let ledger = FakeLedger {
        check_fails: true,
        ..FakeLedger::allowing()
    };
    let h = harness(
        ledger,
        FakeEngine::returning(Some(5), Some(5)),
        MemoryStore::default(),
        FakeTracker::default(),
    );

    let err = h
        .orchestrator
        .process_content(Uuid::new_v4(), NOTES, "Mitosis", 5, 5)
        .await
        .unwrap_err();

    assert!(matches!(err, GenerationError::QuotaBlocked(_)));
    assert_eq!(h.ledger.charges(), 0);
}

#[tokio::test]
async fn refused_charge_stops_before_generation() {
    let h = harness(
        FakeLedger::allowing().with_charges_left(0),
        FakeEngine::returning(Some(5), Some(5)),
        MemoryStore::default(),
        FakeTracker::default(),
    );

    let err = h
        .orchestrator
        .process_content(Uuid::new_v4(), NOTES, "Mitosis", 5, 5)
        .await
        .unwrap_err();

    assert!(matches!(err, GenerationError::ChargeFailed));
    assert_eq!(err.to_string(), "Failed to consume credits");
    assert_eq!(h.ledger.charges(), 1);
    assert_eq!(h.engine.calls(), 0);
    assert!(h.store.all().is_empty());
}

#[tokio::test]
async fn charge_error_is_not_retried() {
    let ledger = FakeLedger {
        charge_errors: true,
        ..FakeLedger::allowing()
    };
    let h = harness(
        ledger,
        FakeEngine::returning(Some(5), Some(5)),
        MemoryStore::default(),
        FakeTracker::default(),
    );

    let err = h
        .orchestrator
        .process_content(Uuid::new_v4(), NOTES, "Mitosis", 5, 5)
        .await
        .unwrap_err();

    assert!(matches!(err, GenerationError::ChargeFailed));
    assert_eq!(h.ledger.charges(), 1);
    assert_eq!(h.engine.calls(), 0);
}

#[tokio::test]
async fn failed_generation_saves_working_set() {
    let h = default_harness(FakeEngine::returning(None, None));
    let user_id = Uuid::new_v4();

    let outcome = h
        .orchestrator
        .process_content(user_id, NOTES, "Mitosis", 10, 15)
        .await
        .unwrap();

    let ProcessOutcome::Degraded { study_set, notice } = outcome else {
        panic!("expected degraded outcome");
    };
    assert_eq!(notice, DEGRADED_NOTICE);
    assert_eq!(study_set.content, NOTES);
    assert!(study_set.flashcards.is_empty());
    assert!(study_set.quizzes.is_empty());
    assert_eq!(h.ledger.charges(), 1);
    assert_eq!(h.store.all(), vec![study_set]);

    settle().await;
    assert_eq!(h.tracker.sets_created.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn empty_generation_is_degraded_not_success() {
    let h = default_harness(FakeEngine::returning(Some(0), Some(0)));

    let outcome = h
        .orchestrator
        .process_content(Uuid::new_v4(), NOTES, "Mitosis", 10, 15)
        .await
        .unwrap();

    assert!(matches!(outcome, ProcessOutcome::Degraded { .. }));
    assert!(outcome.study_set().is_empty());
}

#[tokio::test]
async fn partial_failure_keeps_the_successful_half() {
    let h = default_harness(FakeEngine::returning(Some(6), None));

    let outcome = h
        .orchestrator
        .process_content(Uuid::new_v4(), NOTES, "Mitosis", 10, 15)
        .await
        .unwrap();

    let ProcessOutcome::Generated(set) = outcome else {
        panic!("expected generated outcome");
    };
    assert_eq!(set.flashcards.len(), 6);
    assert!(set.quizzes.is_empty());
}

#[tokio::test]
async fn storage_failure_is_reported() {
    let h = harness(
        FakeLedger::allowing(),
        FakeEngine::returning(Some(5), Some(5)),
        MemoryStore::failing(),
        FakeTracker::default(),
    );

    let err = h
        .orchestrator
        .process_content(Uuid::new_v4(), NOTES, "Mitosis", 5, 5)
        .await
        .unwrap_err();

    assert!(matches!(err, GenerationError::PersistenceFailure(_)));
    assert!(err.to_string().starts_with("Failed to process content"));
    assert_eq!(h.ledger.charges(), 1);
}

#[tokio::test]
async fn achievements_are_tracked_after_success() {
    let h = default_harness(FakeEngine::returning(Some(8), Some(3)));

    h.orchestrator
        .process_content(Uuid::new_v4(), NOTES, "Mitosis", 3, 8)
        .await
        .unwrap();
    settle().await;

    assert_eq!(h.tracker.sets_created.load(Ordering::SeqCst), 1);
    assert_eq!(h.tracker.cards_created.load(Ordering::SeqCst), 8);
}

#[tokio::test]
async fn achievement_failure_does_not_undo_the_set() {
    let h = harness(
        FakeLedger::allowing(),
        FakeEngine::returning(Some(8), Some(3)),
        MemoryStore::default(),
        FakeTracker {
            fail: true,
            ..FakeTracker::default()
        },
    );

    let outcome = h
        .orchestrator
        .process_content(Uuid::new_v4(), NOTES, "Mitosis", 3, 8)
        .await;
    settle().await;

    assert!(outcome.is_ok());
    assert_eq!(h.store.all().len(), 1);
}

#[tokio::test]
async fn concurrent_calls_each_charge_once() {
    let h = harness(
        FakeLedger::allowing().with_charges_left(1),
        FakeEngine::returning(Some(5), Some(5)),
        MemoryStore::default(),
        FakeTracker::default(),
    );
    let user_id = Uuid::new_v4();

    let (first, second) = futures::join!(
        h.orchestrator.process_content(user_id, NOTES, "One", 5, 5),
        h.orchestrator.process_content(user_id, NOTES, "Two", 5, 5),
    );

    assert_eq!(h.ledger.checks(), 2);
    assert_eq!(h.ledger.charges(), 2);
    let results = [first.is_ok(), second.is_ok()];
    assert_eq!(results.iter().filter(|ok| **ok).count(), 1);
    assert_eq!(h.store.all().len(), 1);
}

//=========================================================================================
// refresh_study_set
//=========================================================================================

fn seeded_set(user_id: Uuid) -> StudySet {
    StudySet::new(
        user_id,
        "Mitosis",
        NOTES,
        vec![Flashcard::new("old front", "old back")],
        None,
    )
}

#[tokio::test]
async fn refresh_replaces_material_in_place() {
    let h = default_harness(FakeEngine::returning(Some(40), Some(40)));
    let user_id = Uuid::new_v4();
    let original = seeded_set(user_id);
    h.store.insert(original.clone());

    let refreshed = h
        .orchestrator
        .refresh_study_set(user_id, original.id)
        .await
        .unwrap();

    let (cards, questions) = Tier::Free.refresh_counts();
    assert_eq!(refreshed.id, original.id);
    assert_eq!(refreshed.content, original.content);
    assert_eq!(refreshed.flashcards.len(), cards);
    assert_eq!(refreshed.question_count(), questions);
    assert!(refreshed.last_studied_at >= original.last_studied_at);
    assert_eq!(h.store.all(), vec![refreshed]);
    assert_eq!(h.ledger.checks(), 1);
    assert_eq!(h.ledger.charges(), 1);
}

#[tokio::test]
async fn failed_refresh_leaves_set_untouched() {
    let h = default_harness(FakeEngine::returning(None, None));
    let user_id = Uuid::new_v4();
    let original = seeded_set(user_id);
    h.store.insert(original.clone());

    let err = h
        .orchestrator
        .refresh_study_set(user_id, original.id)
        .await
        .unwrap_err();

    assert!(matches!(err, GenerationError::GenerationUnavailable));
    assert_eq!(h.store.all(), vec![original]);
    assert_eq!(h.ledger.charges(), 1);
}

fn seeded_set_with_quiz(user_id: Uuid) -> StudySet {
    let question = QuizQuestion {
        question: "What divides in mitosis?".to_string(),
        options: vec!["The nucleus".to_string(), "The membrane".to_string()],
        correct_answer: 0,
        explanation: None,
    };
    StudySet::new(
        user_id,
        "Mitosis",
        NOTES,
        vec![Flashcard::new("old front", "old back")],
        Quiz::from_questions("Mitosis", vec![question]),
    )
}

#[tokio::test]
async fn refresh_with_failed_quiz_call_keeps_stored_quiz() {
    let h = default_harness(FakeEngine::returning(Some(40), None));
    let user_id = Uuid::new_v4();
    let original = seeded_set_with_quiz(user_id);
    h.store.insert(original.clone());

    let err = h
        .orchestrator
        .refresh_study_set(user_id, original.id)
        .await
        .unwrap_err();

    assert!(matches!(err, GenerationError::GenerationUnavailable));
    let stored = h.store.all();
    assert_eq!(stored, vec![original]);
    assert_eq!(stored[0].quizzes.len(), 1);
}

#[tokio::test]
async fn refresh_with_failed_flashcard_call_keeps_stored_cards() {
    let h = default_harness(FakeEngine::returning(None, Some(40)));
    let user_id = Uuid::new_v4();
    let original = seeded_set_with_quiz(user_id);
    h.store.insert(original.clone());

    let err = h
        .orchestrator
        .refresh_study_set(user_id, original.id)
        .await
        .unwrap_err();

    assert!(matches!(err, GenerationError::GenerationUnavailable));
    assert_eq!(h.store.all(), vec![original]);
}

#[tokio::test]
async fn refresh_of_missing_set_is_not_found() {
    let h = default_harness(FakeEngine::returning(Some(5), Some(5)));
    let missing = Uuid::new_v4();

    let err = h
        .orchestrator
        .refresh_study_set(Uuid::new_v4(), missing)
        .await
        .unwrap_err();

    assert!(matches!(err, GenerationError::NotFound(id) if id == missing));
    assert_eq!(h.ledger.checks(), 0);
}

#[tokio::test]
async fn blocked_refresh_does_not_charge() {
    let h = harness(
        FakeLedger::blocking("Monthly credit limit reached"),
        FakeEngine::returning(Some(5), Some(5)),
        MemoryStore::default(),
        FakeTracker::default(),
    );
    let user_id = Uuid::new_v4();
    let original = seeded_set(user_id);
    h.store.insert(original.clone());

    let err = h
        .orchestrator
        .refresh_study_set(user_id, original.id)
        .await
        .unwrap_err();

    assert!(matches!(err, GenerationError::QuotaBlocked(_)));
    assert_eq!(h.ledger.charges(), 0);
    assert_eq!(h.store.all(), vec![original]);
}

//=========================================================================================
// StudySetLibrary
//=========================================================================================

#[tokio::test]
async fn library_renames_and_toggles_notifications() {
    let store = Arc::new(MemoryStore::default());
    let library = StudySetLibrary::new(store.clone());
    let user_id = Uuid::new_v4();
    let original = seeded_set(user_id);
    store.insert(original.clone());

    let renamed = library.rename(user_id, original.id, "  Cell division ").await.unwrap();
    assert_eq!(renamed.title, "Cell division");
    assert_eq!(renamed.id, original.id);

    let muted = library.set_notifications(user_id, original.id, false).await.unwrap();
    assert!(!muted.notifications_enabled);
    assert_eq!(muted.title, "Cell division");

    assert_eq!(library.get(user_id, original.id).await.unwrap(), muted);
    assert_eq!(library.list(user_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn library_rejects_blank_titles_and_foreign_sets() {
    let store = Arc::new(MemoryStore::default());
    let library = StudySetLibrary::new(store.clone());
    let owner = Uuid::new_v4();
    let original = seeded_set(owner);
    store.insert(original.clone());

    let err = library.rename(owner, original.id, "   ").await.unwrap_err();
    assert!(matches!(err, GenerationError::InvalidTitle));

    let stranger = Uuid::new_v4();
    let err = library.delete(stranger, original.id).await.unwrap_err();
    assert!(matches!(err, GenerationError::NotFound(_)));

    library.delete(owner, original.id).await.unwrap();
    assert!(library.list(owner).await.unwrap().is_empty());
}

#[tokio::test]
async fn library_applies_title_and_reminders_in_one_write() {
    let store = Arc::new(MemoryStore::default());
    let library = StudySetLibrary::new(store.clone());
    let user_id = Uuid::new_v4();
    let original = seeded_set(user_id);
    store.insert(original.clone());

    let updated = library
        .update(user_id, original.id, Some("Cell division"), Some(false))
        .await
        .unwrap();

    assert_eq!(updated.title, "Cell division");
    assert!(!updated.notifications_enabled);
    assert_eq!(store.updates(), 1);
    assert_eq!(store.all(), vec![updated]);
}

#[tokio::test]
async fn library_blank_title_blocks_the_whole_update() {
    let store = Arc::new(MemoryStore::default());
    let library = StudySetLibrary::new(store.clone());
    let user_id = Uuid::new_v4();
    let original = seeded_set(user_id);
    store.insert(original.clone());

    let err = library
        .update(user_id, original.id, Some("  "), Some(false))
        .await
        .unwrap_err();

    assert!(matches!(err, GenerationError::InvalidTitle));
    assert_eq!(store.updates(), 0);
    assert_eq!(store.all(), vec![original]);
}
