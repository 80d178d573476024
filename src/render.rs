//! Plain-text views of the stores.

use chrono::NaiveDate;

use crate::agenda::{self, DueStatus, UPCOMING_WINDOW_DAYS};
use crate::format::{colones, long_date, short_date};
use crate::models::{Company, DashboardSummary, Obligation, ObligationSummary};
use crate::store::{CollectionState, LoadStatus, ReminderDigest};

const DONE: char = '●';
const PENDING: char = '○';

/// Status line shared by every list, or `None` once the list is ready.
fn status_line<T>(state: &CollectionState<T>, what: &str) -> Option<String> {
    match state.status {
        LoadStatus::Idle => Some(format!("No {} loaded.", what)),
        LoadStatus::Loading => Some(format!("Loading {}...", what)),
        LoadStatus::Failed => Some(format!(
            "Error: {}",
            state.error.as_deref().unwrap_or("unknown error")
        )),
        LoadStatus::Ready => None,
    }
}

/// ```text
/// [3] Soda La Esquina (La Esquina S.A., 3-101-123456)
/// ```
pub fn companies(state: &CollectionState<Company>) -> String {
    if let Some(line) = status_line(state, "companies") {
        return line;
    }
    if state.items.is_empty() {
        return "No companies yet.".to_string();
    }
    let mut output = String::new();
    for company in &state.items {
        output.push_str(&format!(
            "[{}] {} ({}, {})\n",
            company.id, company.display_name, company.legal_name, company.external_identifier
        ));
    }
    output
}

/// ```text
/// ○ [12] Pago de Alquiler
///       Vence: 1 de marzo de 2025 · ₡50 000,00 · Mensual · vence en 3 días
/// ```
pub fn obligations(state: &CollectionState<Obligation>, today: NaiveDate) -> String {
    if let Some(line) = status_line(state, "obligations") {
        return line;
    }
    if state.items.is_empty() {
        return "This company has no obligations.".to_string();
    }
    let mut output = String::new();
    for obligation in &state.items {
        let mark = if obligation.completed { DONE } else { PENDING };
        output.push_str(&format!("{} [{}] {}\n", mark, obligation.id, obligation.title));

        let mut details = vec![format!("Vence: {}", long_date(obligation.due_date))];
        if let Some(amount) = obligation.estimated_amount {
            details.push(colones(amount));
        }
        details.push(obligation.frequency.as_str().to_string());
        let status = agenda::classify(obligation, today, UPCOMING_WINDOW_DAYS);
        if !matches!(status, DueStatus::Later) {
            details.push(status.label());
        }
        output.push_str(&format!("      {}\n", details.join(" · ")));
    }
    output
}

fn summary_item(output: &mut String, item: &ObligationSummary) {
    output.push_str(&format!(
        "  - {} ({}) · Vence {}\n",
        item.title,
        item.company.display_name,
        short_date(item.due_date)
    ));
}

pub fn dashboard(summary: &DashboardSummary) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "Total estimado del mes: {}\n",
        colones(summary.month_total)
    ));
    output.push_str(&format!("Próximas a vencer: {}\n", summary.upcoming.len()));
    output.push_str(&format!("Vencidas: {}\n\n", summary.overdue.len()));

    output.push_str(&format!("Próximas obligaciones ({} días)\n", UPCOMING_WINDOW_DAYS));
    if summary.upcoming.is_empty() {
        output.push_str("  No upcoming obligations.\n");
    }
    for item in &summary.upcoming {
        summary_item(&mut output, item);
    }

    output.push_str("\nObligaciones vencidas\n");
    if summary.overdue.is_empty() {
        output.push_str("  Nothing overdue.\n");
    }
    for item in &summary.overdue {
        summary_item(&mut output, item);
    }
    output
}

/// Digest of obligations due soon, grouped under their company, followed by
/// the companies that could not be checked.
pub fn reminders(digest: &ReminderDigest) -> String {
    let mut output = String::new();
    for (company, obligations) in digest.due.iter().filter(|(_, o)| !o.is_empty()) {
        output.push_str(&company.display_name);
        output.push('\n');
        for obligation in obligations {
            output.push_str(&format!(
                "  - {} · Vence el {}\n",
                obligation.title,
                short_date(obligation.due_date)
            ));
        }
    }
    if output.is_empty() && digest.is_complete() {
        output.push_str("No obligations due soon.\n");
    }
    for (company, error) in &digest.failed {
        output.push_str(&format!("Not checked: {} ({})\n", company.display_name, error));
    }
    output
}
