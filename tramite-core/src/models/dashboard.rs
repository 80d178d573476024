use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ObligationId;

/// Overview returned by `GET /dashboard/summary`.
///
/// The server decides the windows: `upcoming` holds pending obligations due in
/// the next 30 days, `overdue` pending ones already past due, and
/// `month_total` sums the estimated amounts due in the current month.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    #[serde(
        rename = "total_estimado_mes",
        default,
        with = "rust_decimal::serde::float"
    )]
    pub month_total: Decimal,
    #[serde(rename = "proximas_obligaciones", default)]
    pub upcoming: Vec<ObligationSummary>,
    #[serde(rename = "obligaciones_vencidas", default)]
    pub overdue: Vec<ObligationSummary>,
}

/// An obligation as listed on the dashboard, joined with its company name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObligationSummary {
    pub id: ObligationId,
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
    #[serde(rename = "completada", default)]
    pub completed: bool,
    #[serde(rename = "Empresa")]
    pub company: CompanyRef,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyRef {
    #[serde(rename = "nombre_comercial")]
    pub display_name: String,
}
