//! @ai:module:intent Orchestrate one submission: validate, gate, execute, compare, record
//! @ai:module:layer application
//! @ai:module:public_api Evaluator, Verdict, SubmissionResponse, SubmissionRequest

pub mod verdict;

pub use verdict::{
    ResponseStatus, SubmissionRequest, SubmissionResponse, Verdict, CORRECT_MESSAGE,
    INVALID_REQUEST_MESSAGE, MISMATCH_MESSAGE,
};

use crate::attempts::{
    gate, record_failure, record_success, status, AttemptKey, AttemptRecord, AttemptStatus,
    AttemptStore, Clock, Gate, LockoutPolicy,
};
use crate::catalog::{ExerciseCatalog, ReferenceSolution};
use crate::config::TaskbankConfig;
use crate::error::{Error, Result};
use crate::runner::{CodeExecutor, ExecutionLimits, Language};

const DEFAULT_MIN_CODE_LENGTH: usize = 5;

/// @ai:intent Runs submissions against reference solutions with per-client lockout
///
/// This is the only component that writes attempt records.
pub struct Evaluator<C, S, E, K> {
    catalog: C,
    store: S,
    executor: E,
    clock: K,
    policy: LockoutPolicy,
    limits: ExecutionLimits,
    min_code_length: usize,
}

impl<C, S, E, K> Evaluator<C, S, E, K>
where
    C: ExerciseCatalog,
    S: AttemptStore,
    E: CodeExecutor,
    K: Clock,
{
    /// @ai:intent Create an evaluator with default limits and lockout policy
    /// @ai:effects pure
    pub fn new(catalog: C, store: S, executor: E, clock: K) -> Self {
        Self {
            catalog,
            store,
            executor,
            clock,
            policy: LockoutPolicy::default(),
            limits: ExecutionLimits::default(),
            min_code_length: DEFAULT_MIN_CODE_LENGTH,
        }
    }

    /// @ai:intent Create an evaluator using configured limits and policy
    /// @ai:effects pure
    pub fn from_config(config: &TaskbankConfig, catalog: C, store: S, executor: E, clock: K) -> Self {
        Self::new(catalog, store, executor, clock)
            .with_policy(LockoutPolicy::from_config(&config.lockout))
            .with_limits(ExecutionLimits {
                compile_timeout: config.evaluation.compile_timeout(),
                run_timeout: config.evaluation.run_timeout(),
            })
            .with_min_code_length(config.evaluation.min_code_length)
    }

    pub fn with_policy(mut self, policy: LockoutPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_limits(mut self, limits: ExecutionLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_min_code_length(mut self, min_code_length: usize) -> Self {
        self.min_code_length = min_code_length;
        self
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// @ai:intent Resolve the language and reference solution for an exercise
    /// @ai:post errors are Not-Found conditions; nothing is mutated
    /// @ai:effects pure
    fn resolve(&self, exercise_id: &str, language_id: &str) -> Result<(Language, &ReferenceSolution)> {
        let language = Language::from_id(language_id)
            .ok_or_else(|| Error::LanguageNotFound(language_id.to_string()))?;

        self.catalog
            .exercise(exercise_id)
            .ok_or_else(|| Error::ExerciseNotFound(exercise_id.to_string()))?;

        let reference = self
            .catalog
            .reference_solution(exercise_id, language)
            .ok_or_else(|| Error::SolutionNotFound {
                exercise_id: exercise_id.to_string(),
                language: language.to_string(),
            })?;

        Ok((language, reference))
    }

    /// @ai:intent Evaluate one submission and update the client's attempt record
    /// @ai:pre code is the raw submitted text; surrounding whitespace is ignored
    /// @ai:post Err means no attempt was consumed and no code was run
    /// @ai:effects state:write, fs:write, process
    pub async fn submit(
        &self,
        exercise_id: &str,
        language_id: &str,
        client: &str,
        code: &str,
    ) -> Result<Verdict> {
        let (language, reference) = self.resolve(exercise_id, language_id)?;

        let code = code.trim();
        if code.chars().count() < self.min_code_length {
            return Err(Error::InvalidInput(format!(
                "Code must be at least {} characters long",
                self.min_code_length
            )));
        }

        let key = AttemptKey::new(client, exercise_id, language);
        let stored = self.load_record(&key).await?;

        let record = match gate(&stored, self.clock.now(), &self.policy) {
            Gate::Open(record) => record,
            Gate::Blocked { seconds_remaining } => {
                tracing::info!("{} is blocked for {}s more", key, seconds_remaining);
                return Ok(Verdict::Blocked {
                    time_left: seconds_remaining,
                    hint: None,
                });
            }
        };

        let result = self.executor.execute(language, code, self.limits).await;

        let failure = if !result.succeeded {
            Some(format!(
                "Code execution failed: {}",
                result.diagnostic.unwrap_or_default()
            ))
        } else if !taskbank_normalize::equivalent(
            code,
            &reference.code,
            Some(language.normalizer_language()),
        ) {
            Some(MISMATCH_MESSAGE.to_string())
        } else {
            None
        };

        let Some(message) = failure else {
            let record = record_success(&self.policy);
            self.store.put(&key, record.clone()).await?;
            tracing::info!("{}: correct", key);
            return Ok(Verdict::Correct {
                attempts_left: record.attempts_left,
            });
        };

        let record = record_failure(&record, self.clock.now(), &self.policy);
        self.store.put(&key, record.clone()).await?;

        if record.is_blocked {
            tracing::info!("{}: incorrect, blocked for {}s", key, self.policy.block_seconds());
            return Ok(Verdict::Blocked {
                time_left: self.policy.block_seconds(),
                hint: Some(reference.hint.clone()),
            });
        }

        tracing::info!("{}: incorrect, {} attempts left", key, record.attempts_left);
        Ok(Verdict::Incorrect {
            attempts_left: record.attempts_left,
            message,
        })
    }

    /// @ai:intent Evaluate a raw `{"code": ...}` request body into its JSON response
    /// @ai:effects state:write, fs:write, process
    pub async fn submit_json(
        &self,
        exercise_id: &str,
        language_id: &str,
        client: &str,
        body: &str,
    ) -> SubmissionResponse {
        let request: SubmissionRequest = match serde_json::from_str(body) {
            Ok(request) => request,
            Err(e) => {
                tracing::debug!("Rejecting malformed request body: {}", e);
                return SubmissionResponse::error(INVALID_REQUEST_MESSAGE);
            }
        };

        match self.submit(exercise_id, language_id, client, &request.code).await {
            Ok(verdict) => verdict.into(),
            Err(e) => {
                tracing::info!("Submission for {} rejected: {}", exercise_id, e);
                SubmissionResponse::from(&e)
            }
        }
    }

    /// @ai:intent Stored record for a key, or a fresh one under this evaluator's policy
    /// @ai:effects state:read
    async fn load_record(&self, key: &AttemptKey) -> Result<AttemptRecord> {
        Ok(self
            .store
            .get(key)
            .await?
            .unwrap_or_else(|| AttemptRecord::fresh(&self.policy)))
    }

    /// @ai:intent Report the client's attempt state without changing it
    /// @ai:effects state:read
    pub async fn status(&self, exercise_id: &str, language_id: &str, client: &str) -> Result<AttemptStatus> {
        let language = Language::from_id(language_id)
            .ok_or_else(|| Error::LanguageNotFound(language_id.to_string()))?;
        self.catalog
            .exercise(exercise_id)
            .ok_or_else(|| Error::ExerciseNotFound(exercise_id.to_string()))?;

        let key = AttemptKey::new(client, exercise_id, language);
        let record = self.load_record(&key).await?;
        Ok(status(&record, self.clock.now(), &self.policy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attempts::{ManualClock, MemoryStore};
    use crate::catalog::{Exercise, InMemoryCatalog};
    use crate::runner::ExecutionResult;
    use chrono::{TimeDelta, TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const REFERENCE: &str = "def add(a, b):\n    return a + b\n\nprint(add(1, 2))\n";
    const HINT: &str = "Return the sum of both arguments";

    /// Executor that never spawns anything and counts how often it was asked to.
    struct RecordingExecutor {
        outcome: ExecutionResult,
        calls: Arc<AtomicUsize>,
    }

    impl CodeExecutor for RecordingExecutor {
        async fn execute(&self, _: Language, _: &str, _: ExecutionLimits) -> ExecutionResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome.clone()
        }
    }

    fn catalog() -> InMemoryCatalog {
        InMemoryCatalog::new()
            .with_exercise(Exercise {
                id: "add".to_string(),
                title: "Add".to_string(),
                description: "Print the sum of 1 and 2".to_string(),
            })
            .with_solution(ReferenceSolution {
                exercise_id: "add".to_string(),
                language: Language::Python,
                code: REFERENCE.to_string(),
                hint: HINT.to_string(),
            })
    }

    fn start() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
    }

    type TestEvaluator = Evaluator<InMemoryCatalog, MemoryStore, RecordingExecutor, Arc<ManualClock>>;

    struct Harness {
        evaluator: TestEvaluator,
        clock: Arc<ManualClock>,
        calls: Arc<AtomicUsize>,
    }

    fn harness(outcome: ExecutionResult) -> Harness {
        let clock = Arc::new(ManualClock::new(start()));
        let calls = Arc::new(AtomicUsize::new(0));
        let executor = RecordingExecutor {
            outcome,
            calls: calls.clone(),
        };

        Harness {
            evaluator: Evaluator::new(catalog(), MemoryStore::new(), executor, clock.clone()),
            clock,
            calls,
        }
    }

    fn key() -> AttemptKey {
        AttemptKey::new("client-1", "add", Language::Python)
    }

    async fn submit_json(h: &Harness, code: &str) -> serde_json::Value {
        let body = json!({ "code": code }).to_string();
        let response = h.evaluator.submit_json("add", "python", "client-1", &body).await;
        serde_json::to_value(response).unwrap()
    }

    #[tokio::test]
    async fn test_correct_submission() {
        let h = harness(ExecutionResult::success());

        let response = submit_json(&h, REFERENCE).await;
        assert_eq!(
            response,
            json!({"status": "correct", "attempts_left": 3, "message": "Correct solution!"})
        );
        assert_eq!(h.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_comment_and_whitespace_differences_are_correct() {
        let h = harness(ExecutionResult::success());
        let submitted = "  def add(a,  b):  # sum\n\n        return a + b\nprint(add(1, 2))";

        let verdict = h.evaluator.submit("add", "python", "client-1", submitted).await.unwrap();
        assert_eq!(verdict, Verdict::Correct { attempts_left: 3 });
    }

    #[tokio::test]
    async fn test_correct_twice_stays_at_three() {
        let h = harness(ExecutionResult::success());

        for _ in 0..2 {
            let verdict = h.evaluator.submit("add", "python", "client-1", REFERENCE).await.unwrap();
            assert_eq!(verdict, Verdict::Correct { attempts_left: 3 });
        }
    }

    #[tokio::test]
    async fn test_three_broken_submissions_block_with_hint() {
        let h = harness(ExecutionResult::failure("SyntaxError: invalid syntax"));
        let broken = "def add(a, b) return a + b";

        let first = submit_json(&h, broken).await;
        assert_eq!(
            first,
            json!({
                "status": "incorrect",
                "attempts_left": 2,
                "message": "Code execution failed: SyntaxError: invalid syntax"
            })
        );

        let second = submit_json(&h, broken).await;
        assert_eq!(second["status"], "incorrect");
        assert_eq!(second["attempts_left"], 1);

        let third = submit_json(&h, broken).await;
        assert_eq!(
            third,
            json!({"status": "blocked", "time_left": 10, "hint": HINT})
        );

        let record = h.evaluator.store().get(&key()).await.unwrap().unwrap();
        assert_eq!(record.attempts_left, 0);
        assert!(record.is_blocked);
        assert_eq!(record.block_until, Some(start() + TimeDelta::seconds(10)));
    }

    #[tokio::test]
    async fn test_mismatch_is_incorrect_without_leaking_reference() {
        let h = harness(ExecutionResult::success());

        let verdict = h
            .evaluator
            .submit("add", "python", "client-1", "print(3)")
            .await
            .unwrap();

        assert_eq!(
            verdict,
            Verdict::Incorrect {
                attempts_left: 2,
                message: MISMATCH_MESSAGE.to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_short_code_is_rejected_without_side_effects() {
        let h = harness(ExecutionResult::success());
        let record = AttemptRecord {
            attempts_left: 2,
            is_blocked: false,
            block_until: None,
        };
        h.evaluator.store().put(&key(), record).await.unwrap();

        let response = submit_json(&h, "  ab  ").await;
        assert_eq!(
            response,
            json!({"status": "error", "message": "Code must be at least 5 characters long"})
        );
        assert_eq!(h.calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.evaluator.store().get(&key()).await.unwrap().unwrap().attempts_left, 2);
    }

    #[tokio::test]
    async fn test_length_counts_characters_not_bytes() {
        let h = harness(ExecutionResult::success());

        let err = h.evaluator.submit("add", "python", "client-1", "ééé").await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        h.evaluator.submit("add", "python", "client-1", "ééééé").await.unwrap();
        assert_eq!(h.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_malformed_body_is_invalid_request() {
        let h = harness(ExecutionResult::success());

        for body in ["not json", "{}", r#"{"code": 5}"#] {
            let response = h.evaluator.submit_json("add", "python", "client-1", body).await;
            assert_eq!(response, SubmissionResponse::error("Invalid request"));
        }
        assert_eq!(h.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_blocked_submission_does_not_execute() {
        let h = harness(ExecutionResult::failure("boom"));
        for _ in 0..3 {
            h.evaluator.submit("add", "python", "client-1", "print(0)").await.unwrap();
        }
        assert_eq!(h.calls.load(Ordering::SeqCst), 3);

        h.clock.advance(TimeDelta::milliseconds(3_500));
        let response = submit_json(&h, REFERENCE).await;
        assert_eq!(response, json!({"status": "blocked", "time_left": 7}));

        h.clock.advance(TimeDelta::seconds(2));
        let response = submit_json(&h, REFERENCE).await;
        assert_eq!(response, json!({"status": "blocked", "time_left": 5}));

        assert_eq!(h.calls.load(Ordering::SeqCst), 3);
        assert!(h.evaluator.store().get(&key()).await.unwrap().unwrap().is_blocked);
    }

    #[tokio::test]
    async fn test_expired_block_evaluates_in_same_call() {
        let h = harness(ExecutionResult::success());
        let record = AttemptRecord {
            attempts_left: 0,
            is_blocked: true,
            block_until: Some(start() + TimeDelta::seconds(10)),
        };
        h.evaluator.store().put(&key(), record).await.unwrap();

        h.clock.advance(TimeDelta::seconds(10));
        let verdict = h.evaluator.submit("add", "python", "client-1", "print(0)").await.unwrap();

        assert_eq!(
            verdict,
            Verdict::Incorrect {
                attempts_left: 2,
                message: MISMATCH_MESSAGE.to_string(),
            }
        );
        assert_eq!(h.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_lockouts_are_per_client_and_language() {
        let h = harness(ExecutionResult::failure("boom"));
        for _ in 0..3 {
            h.evaluator.submit("add", "python", "client-1", "print(0)").await.unwrap();
        }

        let other = h.evaluator.submit("add", "python", "client-2", "print(0)").await.unwrap();
        assert!(matches!(other, Verdict::Incorrect { attempts_left: 2, .. }));
    }

    #[tokio::test]
    async fn test_not_found_errors_are_distinct() {
        let h = harness(ExecutionResult::success());

        let err = h.evaluator.submit("nope", "python", "c", REFERENCE).await.unwrap_err();
        assert!(matches!(err, Error::ExerciseNotFound(_)));

        let err = h.evaluator.submit("add", "cobol", "c", REFERENCE).await.unwrap_err();
        assert!(matches!(err, Error::LanguageNotFound(_)));

        let err = h.evaluator.submit("add", "java", "c", REFERENCE).await.unwrap_err();
        assert!(matches!(err, Error::SolutionNotFound { .. }));
        assert!(err.is_not_found());

        assert_eq!(h.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_language_accepts_numeric_ids() {
        let h = harness(ExecutionResult::success());
        let verdict = h.evaluator.submit("add", "1", "client-1", REFERENCE).await.unwrap();
        assert_eq!(verdict, Verdict::Correct { attempts_left: 3 });
    }

    #[tokio::test]
    async fn test_status_is_read_only() {
        let h = harness(ExecutionResult::failure("boom"));

        assert_eq!(
            h.evaluator.status("add", "python", "client-1").await.unwrap(),
            AttemptStatus::Active { attempts_left: 3 }
        );

        for _ in 0..3 {
            h.evaluator.submit("add", "python", "client-1", "print(0)").await.unwrap();
        }
        h.clock.advance(TimeDelta::seconds(4));

        assert_eq!(
            h.evaluator.status("add", "python", "client-1").await.unwrap(),
            AttemptStatus::Blocked { time_left: 6 }
        );
        assert!(h.evaluator.store().get(&key()).await.unwrap().unwrap().is_blocked);
    }

    #[tokio::test]
    async fn test_configured_lockout_applies_to_new_clients() {
        let mut config = TaskbankConfig::default();
        config.lockout.max_attempts = 5;
        config.lockout.block_seconds = 30;

        let clock = Arc::new(ManualClock::new(start()));
        let executor = RecordingExecutor {
            outcome: ExecutionResult::failure("boom"),
            calls: Arc::new(AtomicUsize::new(0)),
        };
        let evaluator = Evaluator::from_config(
            &config,
            catalog(),
            MemoryStore::new(),
            executor,
            clock.clone(),
        );

        assert_eq!(
            evaluator.status("add", "python", "client-1").await.unwrap(),
            AttemptStatus::Active { attempts_left: 5 }
        );

        let first = evaluator.submit("add", "python", "client-1", "print(0)").await.unwrap();
        assert!(matches!(first, Verdict::Incorrect { attempts_left: 4, .. }));

        for left in (1..4).rev() {
            let verdict = evaluator.submit("add", "python", "client-1", "print(0)").await.unwrap();
            assert!(matches!(verdict, Verdict::Incorrect { attempts_left, .. } if attempts_left == left));
        }

        let fifth = evaluator.submit("add", "python", "client-1", "print(0)").await.unwrap();
        assert_eq!(
            fifth,
            Verdict::Blocked {
                time_left: 30,
                hint: Some(HINT.to_string()),
            }
        );

        clock.advance(TimeDelta::seconds(30));
        assert_eq!(
            evaluator.status("add", "python", "client-1").await.unwrap(),
            AttemptStatus::Active { attempts_left: 5 }
        );
    }

    #[tokio::test]
    async fn test_correct_submission_restores_configured_attempts() {
        let mut config = TaskbankConfig::default();
        config.lockout.max_attempts = 7;

        let evaluator = Evaluator::from_config(
            &config,
            catalog(),
            MemoryStore::new(),
            RecordingExecutor {
                outcome: ExecutionResult::success(),
                calls: Arc::new(AtomicUsize::new(0)),
            },
            Arc::new(ManualClock::new(start())),
        );

        let verdict = evaluator.submit("add", "python", "client-1", REFERENCE).await.unwrap();
        assert_eq!(verdict, Verdict::Correct { attempts_left: 7 });
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_compiled_run_timeout_is_incorrect_and_cleaned_up() {
        use crate::config::ToolchainConfig;
        use crate::runner::Sandbox;
        use std::time::Duration;

        if !crate::runner::sandbox::host_has("g++", "--version") {
            return;
        }

        let scratch = tempfile::tempdir().unwrap();
        let pid_file = scratch.path().join("pid.txt");
        let spin = format!(
            "#include <fstream>\n#include <unistd.h>\nint main() {{\n    std::ofstream({:?}) << getpid();\n    volatile unsigned long n = 0;\n    while (true) {{ n++; }}\n}}\n",
            pid_file.to_string_lossy()
        );

        let catalog = InMemoryCatalog::new()
            .with_exercise(Exercise {
                id: "spin".to_string(),
                title: "Spin".to_string(),
                description: String::new(),
            })
            .with_solution(ReferenceSolution {
                exercise_id: "spin".to_string(),
                language: Language::Cpp,
                code: "int main() { return 0; }".to_string(),
                hint: String::new(),
            });

        let evaluator = Evaluator::new(
            catalog,
            MemoryStore::new(),
            Sandbox::new(ToolchainConfig::default()),
            Arc::new(ManualClock::new(start())),
        )
        .with_limits(ExecutionLimits {
            compile_timeout: Duration::from_secs(60),
            run_timeout: Duration::from_secs(1),
        });

        let verdict = evaluator.submit("spin", "cpp", "client-1", &spin).await.unwrap();
        let Verdict::Incorrect {
            attempts_left,
            message,
        } = verdict
        else {
            panic!("expected incorrect, got {:?}", verdict);
        };
        assert_eq!(attempts_left, 2);
        assert!(message.contains("timed out"), "{}", message);

        let pid: i32 = std::fs::read_to_string(&pid_file).unwrap().trim().parse().unwrap();
        assert!(crate::runner::process::tests::wait_until_dead(pid).await);
    }
}
