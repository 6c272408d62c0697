use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::info;

/// Domain events emitted by the services after a successful commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    ProductionCreated {
        production_id: i64,
        product_template_id: i64,
        quantity: i32,
    },
    ProductionStageChanged {
        production_id: i64,
        previous_stage: String,
        current_stage: String,
    },
    ProductionCancelled {
        production_id: i64,
    },
    RecipeCreated {
        product_id: i64,
        product_template_id: i64,
    },
    RecipeUpdated {
        product_template_id: i64,
    },
    RecipeDeleted {
        product_id: i64,
    },
    ProductCreated {
        product_id: i64,
    },
    ProductDeleted {
        product_id: i64,
    },
    BatchCreated {
        batch_id: i64,
        type_id: i64,
    },
    BatchDeleted {
        batch_id: i64,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Creates a connected sender/receiver pair with a bounded buffer.
pub fn channel(buffer: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(buffer);
    (EventSender::new(tx), rx)
}

/// Drains the event channel, logging each event. Runs until every sender is
/// dropped.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        info!(?event, "domain event");
    }
    info!("Event channel closed; event processor exiting");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sender_delivers_events() {
        let (sender, mut rx) = channel(4);
        sender
            .send(Event::ProductionCancelled { production_id: 7 })
            .await
            .unwrap();

        match rx.recv().await {
            Some(Event::ProductionCancelled { production_id }) => assert_eq!(production_id, 7),
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
