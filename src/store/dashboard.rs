use std::sync::Mutex;

use crate::client::ResourceClient;
use crate::models::DashboardSummary;

use super::collection::{LoadStatus, Transition};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardState {
    pub summary: Option<DashboardSummary>,
    pub status: LoadStatus,
    pub error: Option<String>,
    seq: u64,
}

/// The overview screen: one summary, refreshed on demand.
#[derive(Debug)]
pub struct DashboardStore {
    client: ResourceClient,
    state: Mutex<DashboardState>,
}

impl DashboardStore {
    pub fn new(client: ResourceClient) -> Self {
        Self {
            client,
            state: Mutex::new(DashboardState::default()),
        }
    }

    pub async fn load(&self) -> Transition {
        let epoch = self.client.session_epoch();
        let seq = {
            let mut state = self.lock();
            state.seq += 1;
            state.status = LoadStatus::Loading;
            state.error = None;
            state.seq
        };

        let result = self.client.dashboard_summary().await;

        let mut state = self.lock();
        if state.seq != seq || self.client.session_epoch() != epoch {
            return Transition::Discarded;
        }
        match result {
            Ok(summary) => {
                state.summary = Some(summary);
                state.status = LoadStatus::Ready;
            }
            Err(e) => {
                tracing::warn!("Loading dashboard failed: {}", e);
                state.status = LoadStatus::Failed;
                state.error = Some(e.to_string());
            }
        }
        Transition::Applied
    }

    pub fn clear(&self) {
        let mut state = self.lock();
        let seq = state.seq + 1;
        *state = DashboardState {
            seq,
            ..DashboardState::default()
        };
    }

    pub fn state(&self) -> DashboardState {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DashboardState> {
        self.state.lock().expect("dashboard lock poisoned")
    }
}
