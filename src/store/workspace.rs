use std::sync::Arc;

use chrono::NaiveDate;
use tokio::task::JoinHandle;

use crate::agenda;
use crate::client::{ApiError, ResourceClient};
use crate::models::{Company, CompanyId, CreateCompanyInput, Obligation};
use crate::session::SessionProvider;

use super::collection::{Action, LoadStatus, Transition};
use super::companies::CompanyStore;
use super::dashboard::DashboardStore;
use super::obligations::ObligationStore;
use super::selection::SelectionCoordinator;

/// Obligations due soon, grouped by company.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReminderDigest {
    /// Every company whose obligations loaded, with those due in the window
    /// (possibly none), earliest first.
    pub due: Vec<(Company, Vec<Obligation>)>,
    /// Companies whose obligations could not be loaded, with the error.
    pub failed: Vec<(Company, String)>,
}

impl ReminderDigest {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Everything a signed-in user sees, wired to one session.
///
/// When the session is replaced (sign-in, refresh, sign-out) the selection and
/// every store are torn down. Requests already in flight are dropped on
/// arrival because their session epoch no longer matches.
#[derive(Debug)]
pub struct Workspace {
    pub companies: CompanyStore,
    pub obligations: ObligationStore,
    pub dashboard: DashboardStore,
    selection: Arc<SelectionCoordinator>,
    client: ResourceClient,
}

impl Workspace {
    /// A workspace that is not subscribed to session changes: after a
    /// sign-out its selection survives until [`teardown`](Self::teardown) is
    /// called or [`watch_session`](Self::watch_session) is running. Use
    /// [`connected`](Self::connected) unless the session never changes.
    pub fn new(client: ResourceClient) -> Self {
        let selection = Arc::new(SelectionCoordinator::new());
        Self {
            companies: CompanyStore::new(client.clone()),
            obligations: ObligationStore::new(client.clone(), selection.clone()),
            dashboard: DashboardStore::new(client.clone()),
            selection,
            client,
        }
    }

    /// A workspace already torn down on every change of `session`. Must be
    /// called inside a Tokio runtime.
    pub fn connected(client: ResourceClient, session: &SessionProvider) -> Arc<Self> {
        let workspace = Arc::new(Self::new(client));
        // Detached; the task ends when the provider is dropped.
        drop(workspace.watch_session(session));
        workspace
    }

    pub fn client(&self) -> &ResourceClient {
        &self.client
    }

    /// Register a company, then reload the list from the server.
    pub async fn create_company(&self, input: CreateCompanyInput) -> Result<Company, ApiError> {
        let outcome = self.companies.submit(input).await?;
        self.companies.load().await;
        outcome.entity()
    }

    pub async fn select_company(&self, id: Option<CompanyId>) -> Transition {
        self.obligations.select_parent(id).await
    }

    /// Walk every loaded company and collect its pending obligations due
    /// within `window_days` of `today`. Leaves the last company selected.
    pub async fn reminders(&self, today: NaiveDate, window_days: i64) -> ReminderDigest {
        let mut digest = ReminderDigest::default();
        for company in self.companies.state().items {
            self.select_company(Some(company.id)).await;
            let state = self.obligations.state();
            if state.status == LoadStatus::Ready {
                let due = agenda::due_within(&state.items, today, window_days)
                    .into_iter()
                    .cloned()
                    .collect();
                digest.due.push((company, due));
            } else {
                let error = state.error.unwrap_or_else(|| "obligations not loaded".into());
                tracing::warn!("Reminders skip {}: {}", company.display_name, error);
                digest.failed.push((company, error));
            }
        }
        digest
    }

    /// Drop the selection and all loaded data.
    pub fn teardown(&self) {
        let epoch = self.client.session_epoch();
        self.selection.clear();
        self.companies
            .collection()
            .dispatch(Action::SessionChanged { epoch });
        self.obligations
            .collection()
            .dispatch(Action::SessionChanged { epoch });
        self.dashboard.clear();
    }

    /// Tear the workspace down every time `session` changes. The task ends
    /// when the provider is dropped.
    pub fn watch_session(self: &Arc<Self>, session: &SessionProvider) -> JoinHandle<()> {
        let mut rx = session.subscribe();
        let workspace = Arc::clone(self);
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let signed_in = rx.borrow_and_update().session.is_some();
                tracing::info!(
                    "Session changed ({}), clearing workspace",
                    if signed_in { "signed in" } else { "signed out" }
                );
                workspace.teardown();
            }
        })
    }
}
