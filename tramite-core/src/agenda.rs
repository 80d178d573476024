//! Where an obligation stands relative to a given day.

use chrono::NaiveDate;

use crate::models::Obligation;

/// Window used by the dashboard for "upcoming" obligations.
pub const UPCOMING_WINDOW_DAYS: i64 = 30;

/// Window used for reminder digests.
pub const REMINDER_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueStatus {
    Completed,
    /// Past due by this many days.
    Overdue(i64),
    /// Due within the window, in this many days (0 is today).
    DueSoon(i64),
    Later,
}

impl DueStatus {
    pub fn label(&self) -> String {
        match self {
            Self::Completed => "completada".to_string(),
            Self::Overdue(1) => "vencida hace 1 día".to_string(),
            Self::Overdue(days) => format!("vencida hace {} días", days),
            Self::DueSoon(0) => "vence hoy".to_string(),
            Self::DueSoon(1) => "vence mañana".to_string(),
            Self::DueSoon(days) => format!("vence en {} días", days),
            Self::Later => String::new(),
        }
    }
}

pub fn classify(obligation: &Obligation, today: NaiveDate, window_days: i64) -> DueStatus {
    if obligation.completed {
        return DueStatus::Completed;
    }
    let days = (obligation.due_date - today).num_days();
    if days < 0 {
        DueStatus::Overdue(-days)
    } else if days <= window_days {
        DueStatus::DueSoon(days)
    } else {
        DueStatus::Later
    }
}

/// Pending obligations due between `today` and `today + window_days`,
/// earliest first.
pub fn due_within<'a>(
    obligations: impl IntoIterator<Item = &'a Obligation>,
    today: NaiveDate,
    window_days: i64,
) -> Vec<&'a Obligation> {
    let mut due: Vec<&Obligation> = obligations
        .into_iter()
        .filter(|o| matches!(classify(o, today, window_days), DueStatus::DueSoon(_)))
        .collect();
    due.sort_by_key(|o| o.due_date);
    due
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CompanyId, Frequency, ObligationId};

    fn obligation(id: i64, due: NaiveDate, completed: bool) -> Obligation {
        Obligation {
            id: ObligationId(id),
            company_id: CompanyId(1),
            title: format!("O{}", id),
            due_date: due,
            estimated_amount: None,
            frequency: Frequency::Once,
            completed,
            user_id: None,
            created_at: None,
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    #[test]
    fn classifies_relative_to_today() {
        let today = day(10);
        assert_eq!(classify(&obligation(1, day(8), false), today, 7), DueStatus::Overdue(2));
        assert_eq!(classify(&obligation(1, day(10), false), today, 7), DueStatus::DueSoon(0));
        assert_eq!(classify(&obligation(1, day(17), false), today, 7), DueStatus::DueSoon(7));
        assert_eq!(classify(&obligation(1, day(18), false), today, 7), DueStatus::Later);
        assert_eq!(classify(&obligation(1, day(8), true), today, 7), DueStatus::Completed);
    }

    #[test]
    fn due_within_sorts_and_skips_completed() {
        let list = vec![
            obligation(1, day(15), false),
            obligation(2, day(11), false),
            obligation(3, day(12), true),
            obligation(4, day(1), false),
        ];
        let ids: Vec<i64> = due_within(&list, day(10), 7).iter().map(|o| o.id.0).collect();
        assert_eq!(ids, vec![2, 1]);
    }
}
