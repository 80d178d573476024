//! Which company is active.

use std::sync::Mutex;

use crate::models::CompanyId;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    NoneSelected,
    /// Chosen, with its obligations still loading.
    Selecting(CompanyId),
    Selected(CompanyId),
}

impl Selection {
    pub fn parent(&self) -> Option<CompanyId> {
        match self {
            Self::NoneSelected => None,
            Self::Selecting(id) | Self::Selected(id) => Some(*id),
        }
    }
}

/// Proof that a load was issued for a particular selection. Only a ticket
/// from the live selection may commit into the obligation list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionTicket {
    parent: CompanyId,
    generation: u64,
}

impl SelectionTicket {
    pub fn parent(&self) -> CompanyId {
        self.parent
    }
}

#[derive(Debug, Default)]
struct Inner {
    selection: Selection,
    generation: u64,
}

#[derive(Debug, Default)]
pub struct SelectionCoordinator {
    inner: Mutex<Inner>,
}

impl SelectionCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Selection {
        self.lock().selection
    }

    pub fn parent(&self) -> Option<CompanyId> {
        self.current().parent()
    }

    /// Select `parent`, superseding whatever was selected or loading before.
    pub fn select(&self, parent: CompanyId) -> SelectionTicket {
        let mut inner = self.lock();
        inner.generation += 1;
        inner.selection = Selection::Selecting(parent);
        tracing::debug!("Selecting company {}", parent);
        SelectionTicket {
            parent,
            generation: inner.generation,
        }
    }

    /// Ticket for reloading `parent` without changing the selection, if it
    /// is the live selection.
    pub fn ticket_for(&self, parent: CompanyId) -> Option<SelectionTicket> {
        let inner = self.lock();
        (inner.selection.parent() == Some(parent)).then_some(SelectionTicket {
            parent,
            generation: inner.generation,
        })
    }

    pub fn is_current(&self, ticket: &SelectionTicket) -> bool {
        let inner = self.lock();
        inner.generation == ticket.generation && inner.selection.parent() == Some(ticket.parent)
    }

    /// The load for `ticket` finished. Returns false if it was superseded.
    pub fn resolve(&self, ticket: &SelectionTicket) -> bool {
        let mut inner = self.lock();
        if inner.generation != ticket.generation || inner.selection.parent() != Some(ticket.parent)
        {
            return false;
        }
        inner.selection = Selection::Selected(ticket.parent);
        true
    }

    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.generation += 1;
        inner.selection = Selection::NoneSelected;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("selection lock poisoned")
    }
}
