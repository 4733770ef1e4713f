//! Live event stream per room.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use broadcaster::Subscription;
use database::room;
use futures::stream::{self, Stream};
use tracing::debug;

use crate::error::{Result, ServerError};
use crate::state::AppState;

/// Stream room events as data-only SSE frames.
///
/// The stream ends when the client goes away or the broadcaster shuts down.
pub async fn stream(
    State(state): State<AppState>,
    Path(room_id): Path<i64>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>> {
    room::get_room(state.db.pool(), room_id).await?;
    let subscription = state
        .broadcaster
        .subscribe(room_id)
        .map_err(|e| ServerError::BadRequest(e.to_string()))?;
    debug!(room_id, subscriber_id = subscription.id(), "Event stream opened");

    let events = stream::unfold(subscription, |mut subscription: Subscription| async move {
        let event = subscription.recv().await?;
        Some((Ok(Event::default().data(event.to_json())), subscription))
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::new().interval(Duration::from_secs(15))))
}
