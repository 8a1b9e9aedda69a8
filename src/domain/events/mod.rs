//! Domain events
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProductEvent {
    Created { product_id: i64, merchant_id: i64 },
    Updated { product_id: i64 },
    ActivityToggled { product_id: i64, active: bool },
}

impl ProductEvent {
    pub fn product_id(&self) -> i64 {
        match self {
            Self::Created { product_id, .. }
            | Self::Updated { product_id }
            | Self::ActivityToggled { product_id, .. } => *product_id,
        }
    }

    /// NATS subject the event is published on.
    pub fn subject(&self) -> String {
        let kind = match self {
            Self::Created { .. } => "created",
            Self::Updated { .. } => "updated",
            Self::ActivityToggled { .. } => "activity_toggled",
        };
        format!("catalog.products.{kind}")
    }
}
