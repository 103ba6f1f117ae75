use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

/// `YYYY-MM-DD` text form of a calendar day.
pub mod iso_date {
    use serde::{de, Deserialize, Deserializer, Serializer};
    use time::{macros::format_description, Date};

    pub fn format(date: &Date) -> Result<String, time::error::Format> {
        date.format(format_description!("[year]-[month]-[day]"))
    }

    pub fn parse(raw: &str) -> Result<Date, time::error::Parse> {
        Date::parse(raw.trim(), format_description!("[year]-[month]-[day]"))
    }

    pub fn serialize<S: Serializer>(date: &Date, serializer: S) -> Result<S::Ok, S::Error> {
        let text = format(date).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&text)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Date, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(de::Error::custom)
    }
}

#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub user_id: Uuid,
    pub category_id: Uuid, // weak reference, may outlive its category
    pub amount: Decimal,
    pub description: Option<String>,
    #[serde(with = "iso_date")]
    pub date: Date,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewExpense {
    pub category_id: Uuid,
    pub amount: Decimal,
    pub description: Option<String>,
    pub date: Date,
}

/// Replacement values for an edit; the date is never changed.
#[derive(Debug, Clone)]
pub struct ExpenseUpdate {
    pub category_id: Uuid,
    pub amount: Decimal,
    pub description: Option<String>,
}
