//! Realtime conversation events over Server-Sent Events.
//!
//! Endpoint:
//! - GET /api/v1/conversations/{id}/events - Live `TurnEvent`s for one conversation
//!
//! Events are only published after both messages of a turn are stored, so a
//! client that reconnects can always catch up with `GET .../messages`.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use tokio::sync::broadcast::error::RecvError;
use tokio_stream::Stream;
use tracing::warn;

use parley_types::conversation::ConversationId;
use parley_types::event::TurnEvent;

use crate::http::dto::parse_id;
use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::state::ApiState;

/// SSE event name for a turn event.
pub fn event_name(event: &TurnEvent) -> &'static str {
    match event {
        TurnEvent::TurnCompleted { .. } => "turn_completed",
        TurnEvent::MessagePosted { .. } => "message_posted",
    }
}

/// GET /api/v1/conversations/{id}/events - Subscribe to a conversation.
pub async fn stream_events(
    State(state): State<ApiState>,
    Authenticated(account): Authenticated,
    Path(id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let conversation_id: ConversationId = parse_id(&id, "conversation id")?;
    state
        .orchestrator
        .conversations()
        .get(&conversation_id, &account.id)
        .await?;

    let mut receiver = state.event_bus.subscribe();

    let sse_stream = async_stream::stream! {
        loop {
            match receiver.recv().await {
                Ok(event) if event.conversation_id() == conversation_id => {
                    let data = serde_json::to_string(&event).unwrap_or_default();
                    yield Ok::<_, Infallible>(
                        Event::default()
                            .event(event_name(&event))
                            .id(event.channel())
                            .data(data),
                    );
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    warn!(%conversation_id, skipped, "Event subscriber lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    Ok(Sse::new(sse_stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15))))
}
