use log::{error, info, warn};
use tokio::task::JoinHandle;
use tokio::time::{Duration, interval};

use crate::app_state::AppState;
use crate::error::Result;

/// Pulls the latest rate and history from the backend into the shared book.
/// Returns whether the book changed.
pub async fn refresh_rates(state: &AppState) -> Result<bool> {
    let latest = match state.rates_api.fetch_latest().await {
        Ok(latest) => latest,
        Err(e) => {
            warn!("Latest rate unavailable: {}", e);
            None
        }
    };
    let history = match state.rates_api.fetch_history().await {
        Ok(history) => history,
        Err(e) => {
            warn!("Rate history unavailable, keeping local history: {}", e);
            Vec::new()
        }
    };

    let mut book = state.book.write().await;
    let merged = book.merge_remote(latest, history);
    if merged == *book {
        return Ok(false);
    }

    state.store.save_book(&merged).await?;
    *book = merged;
    Ok(true)
}

/// Refreshes immediately and then on every tick of `every`.
pub fn spawn_rate_refresher(state: AppState, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = interval(every);

        loop {
            interval.tick().await;

            match refresh_rates(&state).await {
                Ok(true) => info!("Rate book updated from backend"),
                Ok(false) => {}
                Err(e) => error!("Failed to refresh rates: {}", e),
            }
        }
    })
}
