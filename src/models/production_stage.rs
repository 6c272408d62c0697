use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::errors::ServiceError;

/// Lifecycle stage of a production run.
///
/// The table is strictly forward: `preparation → producing → produced →
/// sent`, with `preparation → cancelled` as the only branch. `sent` and
/// `cancelled` are terminal. Consulted by one pure function so the guard is
/// testable without a datastore.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProductionStage {
    Preparation,
    Producing,
    Produced,
    Sent,
    Cancelled,
}

/// Canonical string forms, used in validation error messages.
pub const VALID_STAGES: [&str; 5] = [
    "preparation",
    "producing",
    "produced",
    "sent",
    "cancelled",
];

impl ProductionStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Preparation => "preparation",
            Self::Producing => "producing",
            Self::Produced => "produced",
            Self::Sent => "sent",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parses a caller-supplied stage name, rejecting anything outside the
    /// closed set.
    pub fn parse(value: &str) -> Result<Self, ServiceError> {
        Self::from_str(value).map_err(|_| {
            ServiceError::ValidationError(format!(
                "Invalid stage: '{}'. Valid stages are: {:?}",
                value, VALID_STAGES
            ))
        })
    }

    /// Stages reachable from this one via a stage update.
    pub fn allowed_targets(self) -> &'static [ProductionStage] {
        match self {
            Self::Preparation => &[Self::Producing, Self::Cancelled],
            Self::Producing => &[Self::Produced],
            Self::Produced => &[Self::Sent],
            Self::Sent | Self::Cancelled => &[],
        }
    }

    pub fn can_transition(self, target: ProductionStage) -> bool {
        self.allowed_targets().contains(&target)
    }

    pub fn is_terminal(self) -> bool {
        self.allowed_targets().is_empty()
    }
}
