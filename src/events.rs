use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info};
use uuid::Uuid;

use crate::state::AppState;
use crate::tasks::dto::TaskView;

pub const TASK_CREATED: &str = "task-created";
pub const TASK_UPDATED: &str = "task-updated";
pub const TASK_DELETED: &str = "task-deleted";

/// One task-lifecycle event as delivered to listeners.
#[derive(Debug, Clone, Serialize)]
pub struct TaskEvent {
    pub event: &'static str,
    pub task: TaskView,
}

/// Fire-and-forget fan-out to whoever is listening right now. No delivery
/// guarantee: a listener that connects after a publish never sees it.
pub trait EventSink: Send + Sync {
    fn publish(&self, event: &'static str, task: &TaskView);
}

#[derive(Clone)]
pub struct Broadcaster {
    tx: broadcast::Sender<TaskEvent>,
}

impl Broadcaster {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.tx.subscribe()
    }

    /// Diagnostic only; has no effect on correctness.
    pub fn listener_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl EventSink for Broadcaster {
    fn publish(&self, event: &'static str, task: &TaskView) {
        // send errors only when nobody is subscribed, which is fine
        let _ = self.tx.send(TaskEvent {
            event,
            task: task.clone(),
        });
        debug!(event, listeners = self.listener_count(), "event published");
    }
}

/// Sink that drops everything, for tests.
pub struct NullSink;

impl EventSink for NullSink {
    fn publish(&self, _event: &'static str, _task: &TaskView) {}
}

pub async fn events_ws(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    let events = state.events.clone();
    ws.on_upgrade(move |socket| handle_listener(socket, events))
}

async fn handle_listener(socket: WebSocket, events: Broadcaster) {
    let client_id = Uuid::new_v4();
    let mut rx = events.subscribe();
    info!(client = %client_id, "listener connected");
    debug!(listeners = events.listener_count(), "connected listeners");

    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Ok(ev) => {
                    let Ok(text) = serde_json::to_string(&ev) else {
                        continue;
                    };
                    if sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                // a slow listener missed events; keep going with the live feed
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            },
            msg = receiver.next() => match msg {
                // inbound frames carry nothing we act on
                Some(Ok(_)) => continue,
                _ => break,
            },
        }
    }

    info!(client = %client_id, "listener disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::dto::PublicUser;
    use crate::tasks::status::TaskStatus;
    use time::OffsetDateTime;

    fn sample_task() -> TaskView {
        let now = OffsetDateTime::now_utc();
        TaskView {
            id: Uuid::new_v4(),
            title: "Write report".into(),
            description: "Quarterly numbers".into(),
            priority: 3,
            due_date: now,
            status: TaskStatus::Open,
            owner: PublicUser {
                id: Uuid::new_v4(),
                email: "owner@example.com".into(),
                full_name: "Owner".into(),
                created_at: now,
                updated_at: now,
            },
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn subscriber_receives_published_event() {
        let events = Broadcaster::new(16);
        let mut rx = events.subscribe();
        let task = sample_task();

        events.publish(TASK_CREATED, &task);

        let ev = rx.recv().await.expect("event delivered");
        assert_eq!(ev.event, TASK_CREATED);
        assert_eq!(ev.task.id, task.id);
    }

    #[tokio::test]
    async fn publish_without_listeners_is_a_noop() {
        let events = Broadcaster::new(16);
        assert_eq!(events.listener_count(), 0);
        // must not panic or error
        events.publish(TASK_DELETED, &sample_task());
    }

    #[tokio::test]
    async fn late_subscriber_misses_earlier_events() {
        let events = Broadcaster::new(16);
        events.publish(TASK_UPDATED, &sample_task());

        let mut rx = events.subscribe();
        events.publish(TASK_DELETED, &sample_task());

        let ev = rx.recv().await.expect("only the later event arrives");
        assert_eq!(ev.event, TASK_DELETED);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn event_serializes_with_name_and_task() {
        let ev = TaskEvent {
            event: TASK_CREATED,
            task: sample_task(),
        };
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["event"], "task-created");
        assert_eq!(json["task"]["title"], "Write report");
        assert!(json["task"]["owner"].get("password_hash").is_none());
    }
}
