use std::sync::Arc;

use crate::client::{ApiError, ResourceClient};
use crate::models::*;

use super::collection::{Action, Collection, CollectionState, Transition};
use super::dispatcher::{Mutation, MutationDispatcher};
use super::selection::{Selection, SelectionCoordinator, SelectionTicket};

/// Asks the user before something destructive happens.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F: Fn(&str) -> bool> Confirm for F {
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    Removed,
    Declined,
}

/// Obligations of the selected company.
///
/// Every fetch is tied to the selection it was issued under. A response for a
/// company that is no longer selected, or for an older load of the same
/// company, is dropped instead of overwriting the list.
#[derive(Debug)]
pub struct ObligationStore {
    client: ResourceClient,
    dispatcher: MutationDispatcher,
    selection: Arc<SelectionCoordinator>,
    collection: Collection<Obligation>,
}

impl ObligationStore {
    pub fn new(client: ResourceClient, selection: Arc<SelectionCoordinator>) -> Self {
        Self {
            dispatcher: MutationDispatcher::new(client.clone()),
            client,
            selection,
            collection: Collection::new(),
        }
    }

    /// Change the selected company. `None` clears the list and goes idle;
    /// `Some` clears it and loads the new company's obligations.
    pub async fn select_parent(&self, parent: Option<CompanyId>) -> Transition {
        match parent {
            None => {
                self.selection.clear();
                self.collection.dispatch(Action::Clear)
            }
            Some(parent) => {
                let ticket = self.selection.select(parent);
                self.collection.dispatch(Action::Clear);
                self.fetch(ticket).await
            }
        }
    }

    /// Reload `parent`'s obligations. Does nothing unless `parent` is the
    /// selected company.
    pub async fn load(&self, parent: CompanyId) -> Transition {
        match self.selection.ticket_for(parent) {
            Some(ticket) => self.fetch(ticket).await,
            None => {
                tracing::warn!("Ignoring load for company {} which is not selected", parent);
                Transition::Discarded
            }
        }
    }

    async fn fetch(&self, ticket: SelectionTicket) -> Transition {
        let tag = self.collection.begin(self.client.session_epoch());
        let result = self.client.list_obligations(ticket.parent()).await;

        if !self.selection.is_current(&ticket) {
            tracing::debug!(
                "Discarded obligations of company {}: selection changed",
                ticket.parent()
            );
            return Transition::Discarded;
        }
        if let Err(e) = &result {
            tracing::warn!("Loading obligations of company {} failed: {}", ticket.parent(), e);
        }
        let transition = self
            .collection
            .commit(tag, self.client.session_epoch(), result);
        if transition == Transition::Applied {
            self.selection.resolve(&ticket);
        }
        transition
    }

    /// Create an obligation under the selected company and reload the list.
    pub async fn create(&self, input: CreateObligationInput) -> Result<Obligation, ApiError> {
        let parent = self.require_parent(input.company_id)?;
        let outcome = self
            .dispatcher
            .mutate(Mutation::CreateObligation(input))
            .await?;
        // The row exists once the POST succeeds, whatever the reply decodes to.
        self.load(parent).await;
        outcome.entity()
    }

    /// Flip `completed` on one obligation and reload the list. On failure the
    /// list is left as it was.
    pub async fn toggle_completed(&self, obligation: &Obligation) -> Result<(), ApiError> {
        let parent = self.require_parent(obligation.company_id)?;
        let patch = UpdateObligationInput::completed(!obligation.completed);
        self.dispatcher
            .mutate(Mutation::UpdateObligation(obligation.id, patch))
            .await?;
        self.load(parent).await;
        Ok(())
    }

    /// Delete an obligation after the user confirms. A declined confirmation
    /// sends nothing.
    pub async fn remove(
        &self,
        id: ObligationId,
        confirm: &impl Confirm,
    ) -> Result<Removal, ApiError> {
        let parent = self
            .selection
            .parent()
            .ok_or_else(|| ApiError::Invalid("no company selected".into()))?;
        if !confirm.confirm("Are you sure you want to delete this obligation?") {
            return Ok(Removal::Declined);
        }
        self.dispatcher
            .mutate(Mutation::DeleteObligation(id))
            .await?;
        self.load(parent).await;
        Ok(Removal::Removed)
    }

    pub fn selection(&self) -> Selection {
        self.selection.current()
    }

    pub fn state(&self) -> CollectionState<Obligation> {
        self.collection.snapshot()
    }

    pub(crate) fn collection(&self) -> &Collection<Obligation> {
        &self.collection
    }

    fn require_parent(&self, company_id: CompanyId) -> Result<CompanyId, ApiError> {
        match self.selection.parent() {
            Some(parent) if parent == company_id => Ok(parent),
            Some(parent) => Err(ApiError::Invalid(format!(
                "obligation belongs to company {}, but company {} is selected",
                company_id, parent
            ))),
            None => Err(ApiError::Invalid("no company selected".into())),
        }
    }
}
