//! Core library for TrámiteFácil: domain models, due date handling and
//! Spanish (Costa Rica) formatting. No I/O lives here.

pub mod agenda;
pub mod format;
pub mod models;
