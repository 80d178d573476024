//! Locale formatting (Spanish, Costa Rica) and due date parsing.
//!
//! Due dates are calendar dates. They are parsed into [`NaiveDate`] and never
//! pass through a timezone, so "2025-03-01" is the first of March no matter
//! where the process runs.

use chrono::{Datelike, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

const MONTHS: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

const GROUP_SEPARATOR: char = ' ';

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid due date '{0}', expected YYYY-MM-DD")]
pub struct DateParseError(pub String);

/// Parse a due date as sent by the API.
///
/// Date-only values are the norm. A timestamped value keeps the calendar day
/// written before the `T`; the time part is ignored rather than converted.
pub fn parse_due_date(s: &str) -> Result<NaiveDate, DateParseError> {
    let trimmed = s.trim();
    let date_part = trimmed
        .split(['T', ' '])
        .next()
        .unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|_| DateParseError(s.to_string()))
}

/// "1 de marzo"
pub fn short_date(date: NaiveDate) -> String {
    format!("{} de {}", date.day(), month_name(date))
}

/// "1 de marzo de 2025"
pub fn long_date(date: NaiveDate) -> String {
    format!("{} de {} de {}", date.day(), month_name(date), date.year())
}

fn month_name(date: NaiveDate) -> &'static str {
    MONTHS[date.month0() as usize]
}

/// Amount in colones with grouped thousands and two decimals: "₡50 000,00".
pub fn colones(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let plain = rounded.abs().to_string();
    let (whole, fraction) = plain.split_once('.').unwrap_or((plain.as_str(), ""));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(GROUP_SEPARATOR);
        }
        grouped.push(digit);
    }

    let cents = format!("{:0<2}", fraction);
    format!("{}₡{},{}", if negative { "-" } else { "" }, grouped, cents)
}

/// Serde adapter for required due dates.
pub mod due_date {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&date.format("%Y-%m-%d"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_due_date(&raw).map_err(de::Error::custom)
    }
}

/// Serde adapter for optional due dates in partial updates.
pub mod due_date_option {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        date: &Option<NaiveDate>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match date {
            Some(date) => serializer.collect_str(&date.format("%Y-%m-%d")),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDate>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) => super::parse_due_date(&raw).map(Some).map_err(de::Error::custom),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_thousands() {
        assert_eq!(colones(Decimal::from(50000)), "₡50 000,00");
        assert_eq!(colones(Decimal::from(1234567)), "₡1 234 567,00");
        assert_eq!(colones(Decimal::from(999)), "₡999,00");
        assert_eq!(colones(Decimal::ZERO), "₡0,00");
    }

    #[test]
    fn rounds_to_cents() {
        assert_eq!(colones(Decimal::new(1250005, 1)), "₡125 000,50");
        assert_eq!(colones(Decimal::new(10005, 3)), "₡10,01");
        assert_eq!(colones(Decimal::new(-15, 0)), "-₡15,00");
    }
}
