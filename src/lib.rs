//! Client for the TrámiteFácil obligations API.
//!
//! The library keeps a company list and the selected company's obligations in
//! sync with the server:
//!
//! - [`session::SessionProvider`] owns the signed-in session and announces changes.
//! - [`client::ResourceClient`] sends authenticated requests and types failures.
//! - [`store`] holds the collections, the selection and the mutation dispatcher.
//! - [`render`] turns store snapshots into text for the CLI.

pub mod client;
pub mod config;
pub mod render;
pub mod session;
pub mod store;

pub use tramite_core::{agenda, format, models};
