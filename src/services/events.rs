//! Publishes product events to NATS when a server is configured.

use crate::domain::events::ProductEvent;

#[derive(Clone, Default)]
pub struct EventPublisher {
    nats: Option<async_nats::Client>,
}

impl EventPublisher {
    /// Events are only logged.
    pub fn disabled() -> Self { Self::default() }

    /// Falls back to [`EventPublisher::disabled`] when the server can't be reached.
    pub async fn connect(url: &str) -> Self {
        match async_nats::connect(url).await {
            Ok(client) => {
                tracing::info!(%url, "publishing product events to NATS");
                Self { nats: Some(client) }
            }
            Err(e) => {
                tracing::warn!(%url, error = %e, "NATS unavailable, product events will only be logged");
                Self::disabled()
            }
        }
    }

    pub fn is_enabled(&self) -> bool { self.nats.is_some() }

    /// Never fails the caller; delivery problems are logged.
    pub async fn publish(&self, event: &ProductEvent) {
        tracing::debug!(?event, "product event");
        let Some(client) = &self.nats else { return };
        let payload = match serde_json::to_vec(event) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode product event");
                return;
            }
        };
        if let Err(e) = client.publish(event.subject(), payload.into()).await {
            tracing::warn!(product_id = event.product_id(), error = %e, "failed to publish product event");
        }
    }
}
