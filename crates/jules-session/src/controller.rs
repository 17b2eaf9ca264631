//! Session controller: owns the client, the active session and its poller.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use jules_client::JulesClient;
use jules_core::{
    ActivityId, ChatMessage, ClientError, Connector, CreateSessionRequest, CredentialStore,
    FeedView, LogEntry, SdkConfig, Session, Source, SourceContext, keys,
};
use jules_transport::HttpConnector;

use crate::{
    feeds::Feeds,
    poller::{ActivityPoller, PollerHandle, PollerState},
};

/// Controller error.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("client not initialized: set a non-blank API key first")]
    NotInitialized,
    #[error("session not configured")]
    NoActiveSession,
    /// The client was rebound or released while a session was being created.
    #[error("client changed while the session was being created")]
    Superseded,
    #[error(transparent)]
    Client(#[from] ClientError),
}

#[derive(Default)]
struct ControllerState {
    client: Option<JulesClient>,
    /// Bumped whenever `client` is bound or released.
    generation: u64,
    active_session: Option<Session>,
    poller: Option<PollerHandle>,
    sources: Vec<Source>,
}

impl ControllerState {
    /// Stop the poller and forget the session. Keeps the client.
    fn end_session(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.stop();
        }
        self.active_session = None;
    }
}

/// Drives one agent session at a time.
///
/// Every operation reports failures to the message and log feeds and also
/// returns them. The internal lock is never held across an await.
pub struct SessionController {
    connector: Arc<dyn Connector>,
    config: SdkConfig,
    feeds: Feeds,
    state: Mutex<ControllerState>,
}

impl SessionController {
    /// Create an uninitialized controller.
    #[must_use]
    pub fn new(connector: Arc<dyn Connector>, config: SdkConfig) -> Self {
        Self {
            connector,
            config,
            feeds: Feeds::new(),
            state: Mutex::new(ControllerState::default()),
        }
    }

    /// Controller that talks HTTP to `config.base_url`.
    #[must_use]
    pub fn http(config: SdkConfig) -> Self {
        Self::new(Arc::new(HttpConnector::new(config.clone())), config)
    }

    #[must_use]
    pub const fn config(&self) -> &SdkConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ----------------------------------------------------------------------------
    // Initialization
    // ----------------------------------------------------------------------------

    /// Bind the client to `api_key`. Performs no I/O.
    ///
    /// A blank key leaves the controller uninitialized, tearing down any
    /// current client and session. Rebinding to a new key also ends the
    /// current session. Returns whether a client is now bound.
    pub fn initialize(&self, api_key: &str) -> bool {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            self.shutdown();
            self.feeds
                .log_warn("API key is blank; client not initialized");
            return false;
        }

        match self.connector.connect(api_key) {
            Ok(transport) => {
                let mut state = self.lock();
                state.end_session();
                state.client = Some(JulesClient::new(transport));
                state.generation += 1;
                drop(state);
                self.feeds.log_info("Client initialized");
                true
            }
            Err(err) => {
                self.feeds
                    .report_error(format!("Error initializing client: {err}"));
                false
            }
        }
    }

    /// Initialize from the `api_key` entry of `store`.
    pub fn initialize_from_store(&self, store: &dyn CredentialStore) -> bool {
        let api_key = store.get(keys::API_KEY).unwrap_or_default();
        self.initialize(&api_key)
    }

    /// Stop polling and release the client. Idempotent.
    pub fn shutdown(&self) {
        let mut state = self.lock();
        let was_bound = state.client.is_some() || state.active_session.is_some();
        state.end_session();
        if state.client.take().is_some() {
            state.generation += 1;
        }
        drop(state);
        if was_bound {
            tracing::info!("session controller shut down");
        }
    }

    // ----------------------------------------------------------------------------
    // Sources
    // ----------------------------------------------------------------------------

    /// Fetch and cache every source.
    ///
    /// # Errors
    /// Returns error if uninitialized or the listing fails.
    pub async fn load_sources(&self) -> Result<Vec<Source>, SessionError> {
        let client = self.client()?;
        match client.list_all_sources().await {
            Ok(sources) => {
                self.lock().sources.clone_from(&sources);
                self.feeds.log_info(format!("Loaded {} sources", sources.len()));
                Ok(sources)
            }
            Err(err) => {
                self.feeds
                    .report_error(format!("Error loading sources: {err}"));
                Err(err.into())
            }
        }
    }

    /// Sources cached by the last [`load_sources`](Self::load_sources).
    #[must_use]
    pub fn sources(&self) -> Vec<Source> {
        self.lock().sources.clone()
    }

    // ----------------------------------------------------------------------------
    // Sessions
    // ----------------------------------------------------------------------------

    /// Create a session on `source` and start polling it.
    ///
    /// On success the previous session's poller is stopped and the cursor
    /// starts empty. On failure any existing session is left running.
    ///
    /// # Errors
    /// Returns error if uninitialized or the server call fails.
    pub async fn create_session(
        &self,
        source: &Source,
        prompt: &str,
    ) -> Result<Session, SessionError> {
        let (client, generation) = {
            let state = self.lock();
            (state.client.clone(), state.generation)
        };
        let client = client.ok_or_else(|| self.state_error(SessionError::NotInitialized))?;
        let request = CreateSessionRequest::new(prompt, SourceContext::from_source(source));

        let session = match client.create_session(&request).await {
            Ok(session) => session,
            Err(err) => {
                self.feeds
                    .report_error(format!("Error creating session: {err}"));
                return Err(err.into());
            }
        };

        let mut state = self.lock();
        if state.generation != generation || state.client.is_none() {
            drop(state);
            tracing::warn!(session_id = %session.id, "client changed during create; session not activated");
            return Err(self.state_error(SessionError::Superseded));
        }
        state.end_session();
        let poller = ActivityPoller::new(
            session.id.clone(),
            client,
            self.feeds.clone(),
            self.config.poll_interval,
        );
        state.poller = Some(poller.spawn());
        state.active_session = Some(session.clone());
        drop(state);

        self.feeds.log_info(format!("Session created: {}", session.id));
        Ok(session)
    }

    /// Send `text` to the active session.
    ///
    /// The user message is appended before the request is issued and stays
    /// in the feed whatever the outcome. The agent's answer arrives later
    /// through the poller.
    ///
    /// # Errors
    /// Returns error if no session is active or the send fails.
    pub async fn send_message(&self, text: &str) -> Result<(), SessionError> {
        let (client, session_id) = {
            let state = self.lock();
            let Some((client, session_id)) = active(&state) else {
                drop(state);
                return Err(self.state_error(SessionError::NoActiveSession));
            };
            self.feeds.push_message(ChatMessage::user(text));
            drop(state);
            (client, session_id)
        };

        match client.send_message(&session_id, text).await {
            Ok(_) => {
                tracing::debug!(session_id = %session_id, "message sent");
                Ok(())
            }
            Err(err) => {
                self.feeds
                    .report_error(format!("Error sending message: {err}"));
                Err(err.into())
            }
        }
    }

    /// Approve the plan proposed for the active session.
    ///
    /// # Errors
    /// Returns error if no session is active or the call fails.
    pub async fn approve_plan(&self) -> Result<(), SessionError> {
        let target = active(&self.lock());
        let Some((client, session_id)) = target else {
            return Err(self.state_error(SessionError::NoActiveSession));
        };

        match client.approve_plan(&session_id).await {
            Ok(()) => {
                self.feeds
                    .log_info(format!("Plan approved for session {session_id}"));
                Ok(())
            }
            Err(err) => {
                self.feeds
                    .report_error(format!("Error approving plan: {err}"));
                Err(err.into())
            }
        }
    }

    // ----------------------------------------------------------------------------
    // Observers
    // ----------------------------------------------------------------------------

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.lock().client.is_some()
    }

    #[must_use]
    pub fn active_session(&self) -> Option<Session> {
        self.lock().active_session.clone()
    }

    /// Last activity surfaced for the active session.
    #[must_use]
    pub fn cursor(&self) -> Option<ActivityId> {
        self.lock().poller.as_ref().and_then(PollerHandle::cursor)
    }

    /// State of the active session's poller, if one was started.
    #[must_use]
    pub fn poller_state(&self) -> Option<PollerState> {
        self.lock().poller.as_ref().map(PollerHandle::state)
    }

    #[must_use]
    pub fn messages(&self) -> FeedView<ChatMessage> {
        self.feeds.messages()
    }

    #[must_use]
    pub fn logs(&self) -> FeedView<LogEntry> {
        self.feeds.logs()
    }

    /// Append a diagnostic entry on behalf of the presentation layer.
    pub fn add_log(&self, text: impl Into<String>) {
        self.feeds.log_info(text);
    }

    // ----------------------------------------------------------------------------
    // Helpers
    // ----------------------------------------------------------------------------

    fn client(&self) -> Result<JulesClient, SessionError> {
        let client = self.lock().client.clone();
        client.ok_or_else(|| self.state_error(SessionError::NotInitialized))
    }

    fn state_error(&self, err: SessionError) -> SessionError {
        self.feeds.report_error(err.to_string());
        err
    }
}

/// Client and session id, if a session is active.
fn active(state: &ControllerState) -> Option<(JulesClient, String)> {
    let client = state.client.clone()?;
    let session = state.active_session.as_ref()?;
    Some((client, session.id.clone()))
}
