pub mod dataset;
pub mod event;

pub use dataset::Dataset;
pub use event::{Event, ItemType, LineItem, Totals};
