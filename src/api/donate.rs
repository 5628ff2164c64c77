//! Donation redirect endpoint.

use std::sync::Mutex;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::Redirect,
};
use tokio_util::sync::CancellationToken;

use crate::models::AttributionParams;
use crate::redirect::{NavigationGuard, Navigator};
use crate::AppState;

/// Captures the destination so the handler can answer with it.
#[derive(Default)]
struct RedirectSlot(Mutex<Option<String>>);

impl Navigator for RedirectSlot {
    fn replace(&self, url: &str) {
        if let Ok(mut slot) = self.0.lock() {
            *slot = Some(url.to_string());
        }
    }
}

/// GET /donate - Send the donor to the campaign page chosen by the decision service.
///
/// Unparseable attribution never blocks the donor; it is forwarded as all-null.
pub async fn donate(
    State(state): State<AppState>,
    query: Result<Query<AttributionParams>, QueryRejection>,
) -> Redirect {
    let params = match query {
        Ok(Query(params)) => params,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Ignoring malformed attribution parameters");
            AttributionParams::default()
        }
    };

    // Dropping the handler (client went away) cancels the pending resolution.
    let cancel = CancellationToken::new();
    let _cancel_on_drop = cancel.clone().drop_guard();

    let guard = NavigationGuard::new(RedirectSlot::default());
    state.redirect.navigate(&params, &guard, &cancel).await;

    let destination = guard
        .navigator()
        .0
        .lock()
        .ok()
        .and_then(|mut slot| slot.take())
        .unwrap_or_else(|| state.redirect.fallback_url().to_string());

    Redirect::to(&destination)
}
