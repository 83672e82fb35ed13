//! Aggregate root of one decoded message

use super::{Header, ObservationResult, Order, Patient, Visit};
use serde::{Deserialize, Serialize};

/// Structured document produced from one raw message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub header: Header,
    pub patient: Patient,
    pub visit: Visit,
    pub order: Order,
    observations: Vec<ObservationResult>,
}

impl Message {
    pub fn new(header: Header, patient: Patient, visit: Visit, order: Order) -> Self {
        Self {
            header,
            patient,
            visit,
            order,
            observations: Vec::new(),
        }
    }

    /// Append an observation result; results keep their order of appearance
    pub fn push_observation(&mut self, observation: ObservationResult) {
        self.observations.push(observation);
    }

    /// Observation results in order of appearance
    pub fn observations(&self) -> &[ObservationResult] {
        &self.observations
    }
}
