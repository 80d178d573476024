//! Client-side state: the company list, the selected company's obligations,
//! the dashboard, and the pieces that keep them consistent with the server.
//!
//! Nothing here patches server data locally. Mutations go through the
//! [`MutationDispatcher`] and are followed by a re-fetch of the affected
//! collection.

mod collection;
mod companies;
mod dashboard;
mod dispatcher;
mod obligations;
mod selection;
mod workspace;

pub use collection::*;
pub use companies::CompanyStore;
pub use dashboard::{DashboardState, DashboardStore};
pub use dispatcher::*;
pub use obligations::{Confirm, ObligationStore, Removal};
pub use selection::*;
pub use workspace::{ReminderDigest, Workspace};
