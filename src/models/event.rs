use chrono::{DateTime, Utc};
use ring::rand::{SecureRandom, SystemRandom};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

const ID_LEN: usize = 9;
const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub name: String,
    /// Calendar date as entered, may be empty
    pub date: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub budget: Decimal,
    pub created_at: Option<DateTime<Utc>>,
    pub items: Vec<LineItem>,
    /// Fields written by other clients, kept as-is
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub type_: ItemType,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(with = "rust_decimal::serde::float", default)]
    pub amount: Decimal,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Income,
    Expense,
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemType::Income => f.pad("income"),
            ItemType::Expense => f.pad("expense"),
        }
    }
}

impl FromStr for ItemType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "income" => Ok(ItemType::Income),
            "expense" => Ok(ItemType::Expense),
            other => Err(format!("unknown item type '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Totals {
    pub income: Decimal,
    pub expense: Decimal,
    pub margin: Decimal,
}

impl Totals {
    /// Margin as a percentage of income, zero when there is no income.
    pub fn margin_pct(&self) -> Decimal {
        if self.income > Decimal::ZERO {
            self.margin / self.income * Decimal::ONE_HUNDRED
        } else {
            Decimal::ZERO
        }
    }
}

impl std::ops::Add for Totals {
    type Output = Totals;

    fn add(self, other: Totals) -> Totals {
        Totals {
            income: self.income + other.income,
            expense: self.expense + other.expense,
            margin: self.margin + other.margin,
        }
    }
}

impl Event {
    pub fn totals(&self) -> Totals {
        let sum = |type_: ItemType| -> Decimal {
            self.items
                .iter()
                .filter(|item| item.type_ == type_)
                .map(|item| item.amount)
                .sum()
        };

        let income = sum(ItemType::Income);
        let expense = sum(ItemType::Expense);

        Totals {
            income,
            expense,
            margin: income - expense,
        }
    }

    /// Expense totals per category, categories with no spend left out.
    pub fn expense_by_category(&self) -> BTreeMap<String, Decimal> {
        let mut totals = BTreeMap::new();
        for item in self.items.iter().filter(|i| i.type_ == ItemType::Expense) {
            *totals.entry(item.category.clone()).or_insert(Decimal::ZERO) += item.amount;
        }
        totals.retain(|_, total| *total > Decimal::ZERO);
        totals
    }

    /// Income as a percentage of the budget, capped at 100. Zero without a budget.
    pub fn budget_fill_pct(&self) -> Decimal {
        if self.budget <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        (self.totals().income / self.budget * Decimal::ONE_HUNDRED).min(Decimal::ONE_HUNDRED)
    }
}

/// Random short id, same shape as ids written by the web client.
pub fn generate_id() -> String {
    let rng = SystemRandom::new();
    let mut bytes = [0u8; ID_LEN];
    // SystemRandom only fails if the OS entropy source is unavailable
    if rng.fill(&mut bytes).is_err() {
        let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        bytes.copy_from_slice(&nanos.to_le_bytes().repeat(2)[..ID_LEN]);
    }

    bytes
        .iter()
        .map(|b| ID_ALPHABET[*b as usize % ID_ALPHABET.len()] as char)
        .collect()
}

#[cfg(test)]
pub(crate) mod test_helpers {
    use super::*;

    pub(crate) fn mock_item(type_: ItemType, amount: Decimal) -> LineItem {
        LineItem {
            id: generate_id(),
            type_,
            category: "other".to_string(),
            description: String::new(),
            amount,
            date: None,
            extra: Map::new(),
        }
    }

    pub(crate) fn mock_event(id: &str, items: Vec<LineItem>) -> Event {
        Event {
            id: id.to_string(),
            name: format!("mock event: {id}"),
            items,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_helpers::*;
    use super::*;
    use rust_decimal::prelude::dec;

    #[test]
    fn test_totals() {
        let event = mock_event(
            "e1",
            vec![
                mock_item(ItemType::Income, dec!(1000)),
                mock_item(ItemType::Income, dec!(500)),
                mock_item(ItemType::Expense, dec!(300)),
            ],
        );

        let totals = event.totals();
        assert_eq!(totals.income, dec!(1500));
        assert_eq!(totals.expense, dec!(300));
        assert_eq!(totals.margin, dec!(1200));
        assert_eq!(totals.margin_pct(), dec!(80));
    }

    #[test]
    fn test_margin_pct_without_income() {
        let event = mock_event("e1", vec![mock_item(ItemType::Expense, dec!(300))]);

        let totals = event.totals();
        assert_eq!(totals.margin, dec!(-300));
        assert_eq!(totals.margin_pct(), Decimal::ZERO);
    }

    #[test]
    fn test_deserialize_web_client_document() {
        let json = r#"{
            "id": "k3j2h1g0f",
            "name": "Summer Fest",
            "date": "2025-01-18",
            "budget": 250000,
            "createdAt": "2025-01-02T13:45:10.123Z",
            "items": [
                {"id": "a1", "type": "income", "category": "tickets", "description": "Presale", "amount": 120000.5, "date": "2025-01-03T10:00:00.000Z"},
                {"id": "a2", "type": "expense", "category": "venue", "description": "", "amount": 80000, "date": "2025-01-04T10:00:00.000Z"}
            ]
        }"#;

        let event: Event = serde_json::from_str(json).unwrap();
        assert_eq!(event.name, "Summer Fest");
        assert_eq!(event.budget, dec!(250000));
        assert!(event.created_at.is_some());
        assert_eq!(event.items.len(), 2);
        assert_eq!(event.items[0].type_, ItemType::Income);
        assert_eq!(event.items[0].amount, dec!(120000.5));
        assert_eq!(event.totals().margin, dec!(40000.5));
    }

    #[test]
    fn test_deserialize_sparse_event() {
        let event: Event =
            serde_json::from_str(r#"{"id":"e1","items":[{"type":"income","amount":100}]}"#)
                .unwrap();

        assert_eq!(event.id, "e1");
        assert_eq!(event.name, "");
        assert_eq!(event.budget, Decimal::ZERO);
        assert_eq!(event.items[0].amount, dec!(100));
    }

    #[test]
    fn test_amounts_serialize_as_numbers() {
        let item = mock_item(ItemType::Expense, dec!(12.5));
        let value = serde_json::to_value(&item).unwrap();

        assert_eq!(value["type"], "expense");
        assert_eq!(value["amount"], serde_json::json!(12.5));
    }

    #[test]
    fn test_expense_by_category() {
        let mut venue = mock_item(ItemType::Expense, dec!(300));
        venue.category = "venue".to_string();
        let mut deposit = mock_item(ItemType::Expense, dec!(200));
        deposit.category = "venue".to_string();
        let mut refund = mock_item(ItemType::Expense, Decimal::ZERO);
        refund.category = "catering".to_string();
        let event = mock_event(
            "e1",
            vec![
                venue,
                deposit,
                refund,
                mock_item(ItemType::Expense, dec!(50)),
                mock_item(ItemType::Income, dec!(1000)),
            ],
        );

        let by_category: Vec<_> = event.expense_by_category().into_iter().collect();
        assert_eq!(
            by_category,
            vec![
                ("other".to_string(), dec!(50)),
                ("venue".to_string(), dec!(500)),
            ]
        );
    }

    #[test]
    fn test_budget_fill_pct() {
        let mut event = mock_event("e1", vec![mock_item(ItemType::Income, dec!(250))]);
        assert_eq!(event.budget_fill_pct(), Decimal::ZERO, "no budget");

        event.budget = dec!(1000);
        assert_eq!(event.budget_fill_pct(), dec!(25));

        event.budget = dec!(100);
        assert_eq!(event.budget_fill_pct(), dec!(100), "capped");

        event.budget = dec!(-5);
        assert_eq!(event.budget_fill_pct(), Decimal::ZERO);
    }

    #[test]
    fn test_unknown_fields_survive_round_trip() {
        let json = r#"{"id":"e1","name":"Gala","venue":"Teatro","items":[{"id":"a1","type":"income","amount":10,"paidBy":"card"}]}"#;

        let event: Event = serde_json::from_str(json).unwrap();
        assert_eq!(event.extra["venue"], "Teatro");
        assert_eq!(event.items[0].extra["paidBy"], "card");

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["venue"], "Teatro");
        assert_eq!(value["items"][0]["paidBy"], "card");
        assert!(value.get("extra").is_none());
    }

    #[test]
    fn test_item_type_from_str() {
        assert_eq!("Income".parse::<ItemType>(), Ok(ItemType::Income));
        assert_eq!("expense".parse::<ItemType>(), Ok(ItemType::Expense));
        assert!("refund".parse::<ItemType>().is_err());
    }

    #[test]
    fn test_generate_id() {
        let id = generate_id();
        assert_eq!(id.len(), ID_LEN);
        assert!(id.bytes().all(|b| ID_ALPHABET.contains(&b)));
        assert_ne!(id, generate_id());
    }
}
