use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{require, ValidationError};

/// Server-assigned identifier of a [`Company`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompanyId(pub i64);

impl fmt::Display for CompanyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CompanyId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(CompanyId)
    }
}

/// A company registered by the signed-in user.
///
/// Companies are the top-level organizational unit: obligations are always
/// listed, created and displayed under one of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    /// Trade name shown in lists (`nombre_comercial`).
    #[serde(rename = "nombre_comercial")]
    pub display_name: String,
    /// Registered legal name (`razon_social`).
    #[serde(rename = "razon_social")]
    pub legal_name: String,
    /// Legal identification number (`cedula_juridica`).
    #[serde(rename = "cedula_juridica")]
    pub external_identifier: String,
    #[serde(rename = "telefono", default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Input for registering a new company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateCompanyInput {
    #[serde(rename = "nombre_comercial")]
    pub display_name: String,
    #[serde(rename = "razon_social")]
    pub legal_name: String,
    #[serde(rename = "cedula_juridica")]
    pub external_identifier: String,
    #[serde(rename = "telefono", default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl CreateCompanyInput {
    /// All three names are required by the API; reject blanks up front.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("trade name", &self.display_name)?;
        require("legal name", &self.legal_name)?;
        require("legal id", &self.external_identifier)?;
        Ok(())
    }
}
