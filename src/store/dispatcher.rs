//! Create, update and delete against the API.
//!
//! A mutation is exactly one request. Nothing is patched locally: on success
//! the outcome names the collection the caller must re-fetch.

use reqwest::Method;
use serde_json::Value;

use crate::client::{decode, encode, ApiError, ResourceClient};
use crate::models::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Company,
    Obligation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Update,
    Delete,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    CreateCompany(CreateCompanyInput),
    CreateObligation(CreateObligationInput),
    UpdateObligation(ObligationId, UpdateObligationInput),
    DeleteObligation(ObligationId),
}

impl Mutation {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::CreateCompany(_) => ResourceKind::Company,
            Self::CreateObligation(_) | Self::UpdateObligation(..) | Self::DeleteObligation(_) => {
                ResourceKind::Obligation
            }
        }
    }

    pub fn operation(&self) -> Operation {
        match self {
            Self::CreateCompany(_) | Self::CreateObligation(_) => Operation::Create,
            Self::UpdateObligation(..) => Operation::Update,
            Self::DeleteObligation(_) => Operation::Delete,
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::CreateCompany(input) => input.validate(),
            Self::CreateObligation(input) => input.validate(),
            Self::UpdateObligation(_, input) => input.validate(),
            Self::DeleteObligation(_) => Ok(()),
        }
    }

    fn route(&self) -> Result<(Method, String, Option<Value>), ApiError> {
        Ok(match self {
            Self::CreateCompany(input) => (Method::POST, "/empresas/".into(), Some(encode(input)?)),
            Self::CreateObligation(input) => {
                (Method::POST, "/obligaciones/".into(), Some(encode(input)?))
            }
            Self::UpdateObligation(id, input) => (
                Method::PATCH,
                format!("/obligaciones/{}", id),
                Some(encode(input)?),
            ),
            Self::DeleteObligation(id) => (Method::DELETE, format!("/obligaciones/{}", id), None),
        })
    }
}

/// A successful mutation: what to re-fetch, and the server's response body.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationOutcome {
    pub refetch: ResourceKind,
    pub operation: Operation,
    pub body: Value,
}

impl MutationOutcome {
    /// Decode the entity the server returned for a create or update.
    pub fn entity<T: serde::de::DeserializeOwned>(self) -> Result<T, ApiError> {
        decode(self.body)
    }
}

#[derive(Debug, Clone)]
pub struct MutationDispatcher {
    client: ResourceClient,
}

impl MutationDispatcher {
    pub fn new(client: ResourceClient) -> Self {
        Self { client }
    }

    pub async fn mutate(&self, mutation: Mutation) -> Result<MutationOutcome, ApiError> {
        mutation.validate()?;
        let kind = mutation.kind();
        let operation = mutation.operation();
        let (method, path, body) = mutation.route()?;

        match self.client.request(method, &path, body.as_ref()).await {
            Ok(body) => {
                tracing::debug!("{:?} {:?} succeeded", operation, kind);
                Ok(MutationOutcome {
                    refetch: kind,
                    operation,
                    body,
                })
            }
            Err(e) => {
                tracing::warn!("{:?} {:?} failed: {}", operation, kind, e);
                Err(e)
            }
        }
    }
}
