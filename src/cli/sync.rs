use crate::config::Config;
use crate::error::Result;
use tracing::{info, warn};

pub async fn execute() -> Result<()> {
    let config = Config::load()?;
    let controller = super::controller(&config)?;

    let Some(dataset) = controller.init().await? else {
        warn!("Not connected, run `event-budget connect` first");
        return Ok(());
    };

    let totals = dataset.totals();
    info!(
        events = dataset.events.len(),
        income = %totals.income,
        expense = %totals.expense,
        margin = %totals.margin,
        "{}",
        controller.status()
    );

    Ok(())
}
