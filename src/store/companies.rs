use crate::client::{ApiError, ResourceClient};
use crate::models::{Company, CreateCompanyInput};

use super::collection::{Collection, CollectionState, Transition};
use super::dispatcher::{Mutation, MutationDispatcher, MutationOutcome};

/// The signed-in user's companies.
#[derive(Debug)]
pub struct CompanyStore {
    client: ResourceClient,
    dispatcher: MutationDispatcher,
    collection: Collection<Company>,
}

impl CompanyStore {
    pub fn new(client: ResourceClient) -> Self {
        Self {
            dispatcher: MutationDispatcher::new(client.clone()),
            client,
            collection: Collection::new(),
        }
    }

    /// Fetch the full list and replace the items. Failures are stored in the
    /// state, never returned. Only the latest call may commit.
    pub async fn load(&self) -> Transition {
        let tag = self.collection.begin(self.client.session_epoch());
        let result = self.client.list_companies().await;
        if let Err(e) = &result {
            tracing::warn!("Loading companies failed: {}", e);
        }
        let transition = self
            .collection
            .commit(tag, self.client.session_epoch(), result);
        if transition == Transition::Discarded {
            tracing::debug!("Discarded stale company list");
        }
        transition
    }

    /// Register a company. The list is not touched; call [`load`](Self::load)
    /// afterwards to see it.
    pub async fn create(&self, input: CreateCompanyInput) -> Result<Company, ApiError> {
        self.submit(input).await?.entity()
    }

    pub(crate) async fn submit(&self, input: CreateCompanyInput) -> Result<MutationOutcome, ApiError> {
        self.dispatcher.mutate(Mutation::CreateCompany(input)).await
    }

    pub fn state(&self) -> CollectionState<Company> {
        self.collection.snapshot()
    }

    pub(crate) fn collection(&self) -> &Collection<Company> {
        &self.collection
    }
}
