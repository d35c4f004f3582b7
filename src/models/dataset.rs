use super::event::{Event, ItemType, LineItem, Totals, generate_id};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The whole application state, stored remotely as one JSON value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Dataset {
    #[serde(default)]
    pub events: Vec<Event>,
    /// Top-level fields written by other clients, kept as-is
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Dataset {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn event(&self, id: &str) -> Option<&Event> {
        self.events.iter().find(|e| e.id == id)
    }

    /// Totals across every event
    pub fn totals(&self) -> Totals {
        self.events
            .iter()
            .map(Event::totals)
            .fold(Totals::default(), |acc, t| acc + t)
    }

    /// Returns a copy with a new event appended, plus the new event's id.
    pub fn with_event(&self, name: &str, date: &str, budget: Decimal) -> (Self, String) {
        let event = Event {
            id: generate_id(),
            name: name.trim().to_string(),
            date: date.to_string(),
            budget,
            created_at: Some(Utc::now()),
            items: Vec::new(),
            extra: Map::new(),
        };
        let id = event.id.clone();

        let mut next = self.clone();
        next.events.push(event);
        (next, id)
    }

    /// Returns a copy without the given event, or `None` if it doesn't exist.
    pub fn without_event(&self, id: &str) -> Option<Self> {
        self.event(id)?;

        let mut next = self.clone();
        next.events.retain(|e| e.id != id);
        Some(next)
    }

    pub fn with_item(
        &self,
        event_id: &str,
        type_: ItemType,
        category: &str,
        description: &str,
        amount: Decimal,
    ) -> Option<(Self, String)> {
        let item = LineItem {
            id: generate_id(),
            type_,
            category: category.to_string(),
            description: description.to_string(),
            amount,
            date: Some(Utc::now()),
            extra: Map::new(),
        };
        let item_id = item.id.clone();

        let mut next = self.clone();
        next.events
            .iter_mut()
            .find(|e| e.id == event_id)?
            .items
            .push(item);
        Some((next, item_id))
    }

    pub fn without_item(&self, event_id: &str, item_id: &str) -> Option<Self> {
        let mut next = self.clone();
        let event = next.events.iter_mut().find(|e| e.id == event_id)?;

        let before = event.items.len();
        event.items.retain(|i| i.id != item_id);
        if event.items.len() == before {
            return None;
        }

        Some(next)
    }
}
