use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{null_as_default, require, CompanyId, ValidationError};

/// Server-assigned identifier of an [`Obligation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObligationId(pub i64);

impl fmt::Display for ObligationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ObligationId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(ObligationId)
    }
}

/// A recurring or one-off financial obligation of a company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obligation {
    pub id: ObligationId,
    #[serde(rename = "empresa_id")]
    pub company_id: CompanyId,
    #[serde(rename = "titulo")]
    pub title: String,
    /// Calendar due date. Never carries a time or a timezone.
    #[serde(rename = "fecha_vencimiento", with = "crate::format::due_date")]
    pub due_date: NaiveDate,
    #[serde(
        rename = "monto_estimado",
        default,
        with = "rust_decimal::serde::float_option"
    )]
    pub estimated_amount: Option<Decimal>,
    #[serde(rename = "frecuencia", default, deserialize_with = "null_as_default")]
    pub frequency: Frequency,
    #[serde(rename = "completada", default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// How often an obligation repeats.
///
/// `Annual` exists on the wire but is not offered for new obligations yet.
/// The API stores the field as free text, so any other value read back is
/// kept verbatim in `Other` and shown as written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Frequency {
    #[default]
    Once,
    Monthly,
    Annual,
    Other(String),
}

impl Frequency {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Once => "Única",
            Self::Monthly => "Mensual",
            Self::Annual => "Anual",
            Self::Other(name) => name,
        }
    }

    /// Whether new obligations may be created with this frequency.
    pub fn is_selectable(&self) -> bool {
        matches!(self, Self::Once | Self::Monthly)
    }
}

impl From<String> for Frequency {
    fn from(name: String) -> Self {
        match name.as_str() {
            "Única" => Self::Once,
            "Mensual" => Self::Monthly,
            "Anual" => Self::Annual,
            _ => Self::Other(name),
        }
    }
}

impl From<Frequency> for String {
    fn from(frequency: Frequency) -> Self {
        match frequency {
            Frequency::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown frequency '{0}'")]
pub struct UnknownFrequency(pub String);

impl FromStr for Frequency {
    type Err = UnknownFrequency;

    /// Accepts the wire names (with or without accent) and the English names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "única" | "unica" | "once" => Ok(Self::Once),
            "mensual" | "monthly" => Ok(Self::Monthly),
            "anual" | "annual" => Ok(Self::Annual),
            _ => Err(UnknownFrequency(s.to_string())),
        }
    }
}

/// Input for creating an obligation under a company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateObligationInput {
    #[serde(rename = "empresa_id")]
    pub company_id: CompanyId,
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "fecha_vencimiento", with = "crate::format::due_date")]
    pub due_date: NaiveDate,
    #[serde(
        rename = "monto_estimado",
        default,
        with = "rust_decimal::serde::float_option"
    )]
    pub estimated_amount: Option<Decimal>,
    #[serde(rename = "frecuencia", default)]
    pub frequency: Frequency,
}

impl CreateObligationInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("title", &self.title)?;
        if self.estimated_amount.is_some_and(|a| a.is_sign_negative() && !a.is_zero()) {
            return Err(ValidationError::NegativeAmount);
        }
        if !self.frequency.is_selectable() {
            return Err(ValidationError::ReservedFrequency(self.frequency.as_str().to_string()));
        }
        Ok(())
    }
}

/// Partial update of an obligation. Only the fields that are set are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateObligationInput {
    #[serde(rename = "titulo", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(
        rename = "fecha_vencimiento",
        skip_serializing_if = "Option::is_none",
        with = "crate::format::due_date_option",
        default
    )]
    pub due_date: Option<NaiveDate>,
    #[serde(
        rename = "monto_estimado",
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option",
        default
    )]
    pub estimated_amount: Option<Decimal>,
    #[serde(rename = "frecuencia", skip_serializing_if = "Option::is_none")]
    pub frequency: Option<Frequency>,
    #[serde(rename = "completada", skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl UpdateObligationInput {
    /// The patch sent when a checkbox flips the completed flag.
    pub fn completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(title) = &self.title {
            require("title", title)?;
        }
        if self.estimated_amount.is_some_and(|a| a.is_sign_negative() && !a.is_zero()) {
            return Err(ValidationError::NegativeAmount);
        }
        if let Some(frequency) = self.frequency.as_ref().filter(|f| !f.is_selectable()) {
            return Err(ValidationError::ReservedFrequency(frequency.as_str().to_string()));
        }
        Ok(())
    }
}
