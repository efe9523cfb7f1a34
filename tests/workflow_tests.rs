//! Interactive drafting loop tests with scripted collaborators

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use terraform_ai::services::Completer;
use terraform_ai::terraform::Provisioner;
use terraform_ai::utils::error::DraftStep;
use terraform_ai::utils::files::FileStore;
use terraform_ai::workflow::{
    DecisionSource, Draft, Mode, Outcome, UserAction, Workflow, INIT_DIRECTIVE, NAME_DIRECTIVE, RUN_DIRECTIVE,
};
use terraform_ai::{AppError, AppResult};
use tokio_util::sync::CancellationToken;

const BUCKET: &str = "resource \"aws_s3_bucket\" \"logs\" {\n  bucket = \"logs\"\n}";
const PROVIDER: &str = "provider \"aws\" {\n  region = \"us-east-1\"\n}";

/// Answers from a script and records what it was asked
#[derive(Default)]
struct ScriptedCompleter {
    replies: Mutex<VecDeque<AppResult<String>>>,
    calls: Mutex<Vec<(Vec<String>, String)>>,
    buffered: Mutex<Vec<String>>,
}

impl ScriptedCompleter {
    fn new(replies: Vec<AppResult<String>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
            buffered: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<(Vec<String>, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Completer for ScriptedCompleter {
    async fn complete(
        &self,
        history: &[String],
        _model: &str,
        directive: &str,
        _cancel: &CancellationToken,
    ) -> AppResult<String> {
        self.calls.lock().unwrap().push((history.to_vec(), directive.to_string()));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AppError::Transport("script exhausted".to_string())))
    }

    async fn complete_buffered(
        &self,
        history: &[String],
        model: &str,
        directive: &str,
        cancel: &CancellationToken,
    ) -> AppResult<String> {
        self.buffered.lock().unwrap().push(directive.to_string());
        self.complete(history, model, directive, cancel).await
    }
}

#[derive(Default)]
struct ScriptedDecisions {
    actions: Mutex<VecDeque<UserAction>>,
    retry: bool,
    seen: Mutex<Vec<Draft>>,
    errors_seen: Mutex<usize>,
}

impl ScriptedDecisions {
    fn new(actions: Vec<UserAction>, retry: bool) -> Arc<Self> {
        Arc::new(Self {
            actions: Mutex::new(actions.into()),
            retry,
            ..Default::default()
        })
    }
}

#[async_trait]
impl DecisionSource for ScriptedDecisions {
    async fn decide(&self, draft: &Draft, _cancel: &CancellationToken) -> AppResult<UserAction> {
        self.seen.lock().unwrap().push(draft.clone());
        Ok(self.actions.lock().unwrap().pop_front().unwrap_or(UserAction::Abort))
    }

    async fn retry_after_error(&self, _error: &AppError, _cancel: &CancellationToken) -> AppResult<bool> {
        *self.errors_seen.lock().unwrap() += 1;
        Ok(self.retry)
    }
}

#[derive(Default)]
struct RecordingStore {
    files: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl FileStore for RecordingStore {
    async fn store(&self, name: &str, content: &str) -> AppResult<()> {
        self.files.lock().unwrap().push((name.to_string(), content.to_string()));
        Ok(())
    }
}

#[derive(Default)]
struct RecordingProvisioner {
    runs: Mutex<Vec<&'static str>>,
}

#[async_trait]
impl Provisioner for RecordingProvisioner {
    async fn init(&self) -> AppResult<()> {
        self.runs.lock().unwrap().push("init");
        Ok(())
    }

    async fn apply(&self) -> AppResult<()> {
        self.runs.lock().unwrap().push("apply");
        Ok(())
    }
}

struct Harness {
    completer: Arc<ScriptedCompleter>,
    decisions: Arc<ScriptedDecisions>,
    store: Arc<RecordingStore>,
    provisioner: Arc<RecordingProvisioner>,
    workflow: Workflow,
}

fn harness(replies: Vec<AppResult<String>>, actions: Vec<UserAction>, retry: bool) -> Harness {
    let completer = ScriptedCompleter::new(replies);
    let decisions = ScriptedDecisions::new(actions, retry);
    let store = Arc::new(RecordingStore::default());
    let provisioner = Arc::new(RecordingProvisioner::default());
    let workflow = Workflow::new(
        completer.clone(),
        decisions.clone(),
        store.clone(),
        provisioner.clone(),
        "gpt-4",
    );

    Harness {
        completer,
        decisions,
        store,
        provisioner,
        workflow,
    }
}

fn prompt(text: &str) -> Vec<String> {
    text.split(' ').map(str::to_string).collect()
}

#[tokio::test]
async fn test_run_apply_stores_and_applies() {
    let h = harness(
        vec![Ok(format!("```hcl\n{}\n```", BUCKET)), Ok("logs_bucket.tf\n".to_string())],
        vec![UserAction::Apply],
        false,
    );

    let outcome = h
        .workflow
        .run(Mode::Run, &prompt("create a logs bucket"), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        outcome,
        Outcome::Applied {
            file_name: "logs_bucket.tf".to_string()
        }
    );

    let calls = h.completer.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0], (vec!["create a logs bucket".to_string()], RUN_DIRECTIVE.to_string()));
    assert_eq!(calls[1].1, NAME_DIRECTIVE);
    // only the file name is drafted off the streamed output
    assert_eq!(*h.completer.buffered.lock().unwrap(), vec![NAME_DIRECTIVE.to_string()]);

    // fences are stripped before the user sees the draft
    assert_eq!(h.decisions.seen.lock().unwrap()[0].template, BUCKET);
    assert_eq!(
        *h.store.files.lock().unwrap(),
        vec![("logs_bucket.tf".to_string(), BUCKET.to_string())]
    );
    assert_eq!(*h.provisioner.runs.lock().unwrap(), vec!["apply"]);
}

#[tokio::test]
async fn test_init_stores_provider_file() {
    let h = harness(vec![Ok(PROVIDER.to_string())], vec![UserAction::Apply], false);

    let outcome = h
        .workflow
        .run(Mode::Init, &prompt("aws in us-east-1"), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        outcome,
        Outcome::Applied {
            file_name: "provider.tf".to_string()
        }
    );
    let calls = h.completer.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].1, INIT_DIRECTIVE);
    assert_eq!(h.store.files.lock().unwrap()[0].0, "provider.tf");
    assert_eq!(*h.provisioner.runs.lock().unwrap(), vec!["init"]);
}

#[tokio::test]
async fn test_reprompt_extends_history() {
    let h = harness(
        vec![Ok("first draft".to_string()), Ok(PROVIDER.to_string())],
        vec![UserAction::Reprompt, UserAction::Apply],
        false,
    );

    h.workflow
        .run(Mode::Init, &prompt("aws"), &CancellationToken::new())
        .await
        .unwrap();

    let calls = h.completer.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].0, vec!["aws"]);
    assert_eq!(calls[1].0, vec!["aws", "first draft"]);
}

#[tokio::test]
async fn test_abort_has_no_side_effects() {
    let h = harness(
        vec![Ok(BUCKET.to_string()), Ok("bucket.tf".to_string())],
        vec![UserAction::Abort],
        false,
    );

    let outcome = h
        .workflow
        .run(Mode::Run, &prompt("bucket"), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::Aborted);
    assert!(h.store.files.lock().unwrap().is_empty());
    assert!(h.provisioner.runs.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_empty_prompt_rejected() {
    let h = harness(vec![], vec![], false);

    let err = h
        .workflow
        .run(Mode::Run, &["  ".to_string()], &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Configuration(_)));
    assert!(h.completer.calls().is_empty());
}

#[tokio::test]
async fn test_fatal_error_aborts_without_retry_prompt() {
    let h = harness(
        vec![Err(AppError::PromptTooLarge {
            model: "gpt-4".to_string(),
            prompt_tokens: 9000,
            context_window: 8192,
        })],
        vec![],
        true,
    );

    let err = h
        .workflow
        .run(Mode::Run, &prompt("huge"), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(err.is_fatal());
    assert!(matches!(err, AppError::Step { step: DraftStep::Template, .. }));
    assert_eq!(*h.decisions.errors_seen.lock().unwrap(), 0);
    assert!(h.store.files.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_retryable_error_offers_retry() {
    let h = harness(
        vec![
            Err(AppError::Timeout),
            Ok(BUCKET.to_string()),
            Ok("bucket.tf".to_string()),
        ],
        vec![UserAction::Apply],
        true,
    );

    let outcome = h
        .workflow
        .run(Mode::Run, &prompt("bucket"), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        outcome,
        Outcome::Applied {
            file_name: "bucket.tf".to_string()
        }
    );
    assert_eq!(*h.decisions.errors_seen.lock().unwrap(), 1);
}

#[tokio::test]
async fn test_declined_retry_reports_failing_step() {
    let h = harness(
        vec![
            Ok(BUCKET.to_string()),
            Err(AppError::RemoteApi {
                status: 500,
                error_type: "server_error".to_string(),
                message: "boom".to_string(),
            }),
        ],
        vec![],
        false,
    );

    let err = h
        .workflow
        .run(Mode::Run, &prompt("bucket"), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(err.to_string().starts_with("drafting the file name failed"));
    assert_eq!(err.status(), Some(500));
    assert!(h.decisions.seen.lock().unwrap().is_empty());
    assert!(h.store.files.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_template_not_stored() {
    let h = harness(
        vec![Ok("Sure! I cannot help with that.".to_string())],
        vec![UserAction::Apply],
        false,
    );

    let err = h
        .workflow
        .run(Mode::Init, &prompt("aws"), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Template(_)));
    assert!(h.store.files.lock().unwrap().is_empty());
    assert!(h.provisioner.runs.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_unusable_file_name_replaced() {
    let h = harness(
        vec![Ok(BUCKET.to_string()), Ok("Here is a name: bucket".to_string())],
        vec![UserAction::Apply],
        false,
    );

    let outcome = h
        .workflow
        .run(Mode::Run, &prompt("bucket"), &CancellationToken::new())
        .await
        .unwrap();

    match outcome {
        Outcome::Applied { file_name } => {
            assert!(file_name.starts_with("terraform-"));
            assert!(file_name.ends_with(".tf"));
        }
        Outcome::Aborted => panic!("expected the draft to be applied"),
    }
}

#[tokio::test]
async fn test_cancelled_before_store() {
    let h = harness(vec![Ok(PROVIDER.to_string())], vec![UserAction::Apply], false);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = h.workflow.run(Mode::Init, &prompt("aws"), &cancel).await.unwrap_err();

    assert!(matches!(err, AppError::Cancelled));
    assert!(h.store.files.lock().unwrap().is_empty());
}
