use anyhow::{anyhow, Result};
use log::info;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::error::LoadError;
use crate::models::conversation::{ConversationTurn, MemoryWindow};
use crate::models::dataset::{Dataset, DatasetSummary};
use crate::models::response::SessionInfo;
use crate::services::agent::AnalystAgent;
use crate::services::loader::{load_dataset, load_path};
use crate::services::orchestrator::{Orchestrator, Reply};

/// One user's dataset, bound agent and conversation
pub struct Session {
    id: Uuid,
    dataset: Option<Arc<Dataset>>,
    agent: Option<Arc<dyn AnalystAgent>>,
    memory: MemoryWindow,
    history: Vec<ConversationTurn>,
    initial_analysis_done: bool,
    orchestrator: Arc<Orchestrator>,
}

impl Session {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            id: Uuid::new_v4(),
            dataset: None,
            agent: None,
            memory: MemoryWindow::new(orchestrator.memory_window()),
            history: Vec::new(),
            initial_analysis_done: false,
            orchestrator,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn dataset(&self) -> Option<Arc<Dataset>> {
        self.dataset.clone()
    }

    pub fn agent(&self) -> Option<Arc<dyn AnalystAgent>> {
        self.agent.clone()
    }

    pub fn memory(&self) -> &MemoryWindow {
        &self.memory
    }

    pub fn history(&self) -> &[ConversationTurn] {
        &self.history
    }

    pub fn is_loaded(&self) -> bool {
        self.dataset.is_some()
    }

    pub fn initial_analysis_done(&self) -> bool {
        self.initial_analysis_done
    }

    /// Load a file from disk; on failure the current dataset stays in place
    pub fn load(&mut self, path: &Path) -> Result<DatasetSummary, LoadError> {
        let dataset = load_path(path)?;
        Ok(self.install(dataset))
    }

    pub fn load_bytes(&mut self, bytes: Vec<u8>, filename: &str) -> Result<DatasetSummary, LoadError> {
        let dataset = load_dataset(bytes, filename)?;
        Ok(self.install(dataset))
    }

    fn install(&mut self, dataset: Dataset) -> DatasetSummary {
        let dataset = Arc::new(dataset);
        let summary = dataset.summary();
        self.agent = Some(self.orchestrator.bind(dataset.clone()));
        self.dataset = Some(dataset);
        self.memory.clear();
        self.history.clear();
        self.initial_analysis_done = false;
        info!(
            "📂 Session {} loaded {} ({} rows, {} columns)",
            self.id, summary.filename, summary.row_count, summary.column_count
        );
        summary
    }

    pub async fn ask(&mut self, question: &str) -> Reply {
        let orchestrator = self.orchestrator.clone();
        orchestrator.ask(self, question).await
    }

    pub async fn initial_analysis(&mut self) -> Option<Reply> {
        let orchestrator = self.orchestrator.clone();
        orchestrator.initial_analysis(self).await
    }

    pub async fn quick_action(&mut self, index: usize) -> Option<Reply> {
        let orchestrator = self.orchestrator.clone();
        orchestrator.quick_action(self, index).await
    }

    /// Forget the dataset and the conversation
    pub fn reset(&mut self) {
        self.dataset = None;
        self.agent = None;
        self.memory.clear();
        self.history.clear();
        self.initial_analysis_done = false;
        info!("🧹 Session {} reset", self.id);
    }

    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            data_loaded: self.dataset.is_some(),
            has_dataset: self.dataset.is_some(),
            has_agent: self.agent.is_some(),
            conversation_length: self.history.len(),
            memory_length: self.memory.len(),
            initial_analysis_done: self.initial_analysis_done,
        }
    }

    pub(crate) fn record_exchange(&mut self, question: &str, answer: &str, charts: Vec<PathBuf>) {
        self.memory.push(question, answer);
        self.history.push(ConversationTurn::user(question));
        self.history.push(ConversationTurn::assistant(answer, charts));
    }

    /// The prompt goes to memory only; history shows just the answer
    pub(crate) fn record_initial_analysis(&mut self, prompt: &str, answer: &str, charts: Vec<PathBuf>) {
        self.memory.push(prompt, answer);
        self.history.push(ConversationTurn::assistant(answer, charts));
        self.initial_analysis_done = true;
    }
}

pub type SharedSession = Arc<tokio::sync::Mutex<Session>>;

/// In-memory store for dashboard sessions
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<Uuid, SharedSession>>>,
    orchestrator: Arc<Orchestrator>,
}

impl SessionStore {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            orchestrator,
        }
    }

    /// Start a new empty session
    pub fn create(&self) -> Result<(Uuid, SharedSession)> {
        let session = Session::new(self.orchestrator.clone());
        let id = session.id();
        let shared = Arc::new(tokio::sync::Mutex::new(session));

        let mut sessions = self
            .sessions
            .lock()
            .map_err(|_| anyhow!("Failed to acquire lock on sessions"))?;
        sessions.insert(id, shared.clone());
        info!("🆕 Created session {}", id);
        Ok((id, shared))
    }

    pub fn get(&self, id: &Uuid) -> Result<Option<SharedSession>> {
        let sessions = self
            .sessions
            .lock()
            .map_err(|_| anyhow!("Failed to acquire lock on sessions"))?;
        Ok(sessions.get(id).cloned())
    }

    pub fn remove(&self, id: &Uuid) -> Result<bool> {
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|_| anyhow!("Failed to acquire lock on sessions"))?;
        Ok(sessions.remove(id).is_some())
    }

    pub fn len(&self) -> Result<usize> {
        let sessions = self
            .sessions
            .lock()
            .map_err(|_| anyhow!("Failed to acquire lock on sessions"))?;
        Ok(sessions.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AgentError;
    use crate::services::agent::{AgentFactory, AgentOutput};
    use async_trait::async_trait;

    struct Echo;

    #[async_trait]
    impl AnalystAgent for Echo {
        async fn invoke(&self, input: &str) -> Result<AgentOutput, AgentError> {
            Ok(AgentOutput::text(format!("echo: {}", input)))
        }
    }

    struct EchoFactory;

    impl AgentFactory for EchoFactory {
        fn bind(&self, _dataset: Arc<Dataset>) -> Arc<dyn AnalystAgent> {
            Arc::new(Echo)
        }
    }

    fn orchestrator() -> Arc<Orchestrator> {
        Arc::new(Orchestrator::new(Arc::new(EchoFactory), 10, 3))
    }

    const CSV: &[u8] = b"category,amount\nBooks,1\nGames,2\n";

    #[tokio::test]
    async fn load_clears_conversation() {
        let mut session = Session::new(orchestrator());
        session.load_bytes(CSV.to_vec(), "a.csv").unwrap();
        session.ask("first").await;
        assert_eq!(session.info().memory_length, 1);
        assert_eq!(session.info().conversation_length, 2);

        session.load_bytes(CSV.to_vec(), "b.csv").unwrap();
        let info = session.info();
        assert!(info.data_loaded && info.has_agent);
        assert_eq!(info.memory_length, 0);
        assert_eq!(info.conversation_length, 0);
        assert_eq!(session.dataset().unwrap().filename(), "b.csv");
    }

    #[test]
    fn failed_load_keeps_previous_dataset() {
        let mut session = Session::new(orchestrator());
        session.load_bytes(CSV.to_vec(), "a.csv").unwrap();
        let err = session.load_bytes(b"%PDF".to_vec(), "report.pdf").unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedFormat { .. }));
        assert_eq!(session.dataset().unwrap().filename(), "a.csv");
    }

    #[tokio::test]
    async fn reset_drops_everything() {
        let mut session = Session::new(orchestrator());
        session.load_bytes(CSV.to_vec(), "a.csv").unwrap();
        session.ask("q").await;
        session.reset();
        assert_eq!(
            session.info(),
            SessionInfo {
                data_loaded: false,
                has_dataset: false,
                has_agent: false,
                conversation_length: 0,
                memory_length: 0,
                initial_analysis_done: false,
            }
        );
    }

    #[test]
    fn store_creates_and_removes() {
        let store = SessionStore::new(orchestrator());
        let (id, _) = store.create().unwrap();
        assert!(store.get(&id).unwrap().is_some());
        assert_eq!(store.len().unwrap(), 1);
        assert!(store.remove(&id).unwrap());
        assert!(store.get(&id).unwrap().is_none());
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn poisoned_store_reports_an_error() {
        let store = SessionStore::new(orchestrator());
        let sessions = store.sessions.clone();
        let _ = std::thread::spawn(move || {
            let _guard = sessions.lock().unwrap();
            panic!("lock holder crashed");
        })
        .join();

        assert!(store.len().is_err());
        assert!(store.is_empty().is_err());
        assert!(store.create().is_err());
    }
}
