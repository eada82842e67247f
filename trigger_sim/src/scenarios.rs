//! Scenarios exercising the trigger pipeline end to end.

use serde::{Deserialize, Serialize};

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioId {
    /// TRG-001: roll-a-ball pickup collection
    PickupRun,

    /// TRG-002: two bodies at rest in contact
    RestingContact,

    /// TRG-003: contact ends, later frames stay empty
    EmptyFrames,

    /// TRG-004: physics reverses pair order every step
    FlippedPairs,

    /// TRG-005: opted-out buffers and fully skipped frames
    ExcludedEntities,

    /// TRG-006: many moving bodies with buffers and churn
    Crowd,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::PickupRun,
            ScenarioId::RestingContact,
            ScenarioId::EmptyFrames,
            ScenarioId::FlippedPairs,
            ScenarioId::ExcludedEntities,
            ScenarioId::Crowd,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::PickupRun => "pickup_run",
            ScenarioId::RestingContact => "resting_contact",
            ScenarioId::EmptyFrames => "empty_frames",
            ScenarioId::FlippedPairs => "flipped_pairs",
            ScenarioId::ExcludedEntities => "excluded_entities",
            ScenarioId::Crowd => "crowd",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::PickupRun => "Player seeks a ring of pickups, each scored once on Enter",
            ScenarioId::RestingContact => "Resting contact yields one Enter followed only by Stay",
            ScenarioId::EmptyFrames => "A contact exits exactly once, then frames are empty",
            ScenarioId::FlippedPairs => "Pair order flips every step, canonical ordering keeps Stay",
            ScenarioId::ExcludedEntities => "Excluded buffers stay untouched, all-excluded frames skip",
            ScenarioId::Crowd => "200 bodies with buffers, parallel fan-out and entity recycling",
        }
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pickup_run" | "pickuprun" | "trg-001" => Ok(ScenarioId::PickupRun),
            "resting_contact" | "restingcontact" | "trg-002" => Ok(ScenarioId::RestingContact),
            "empty_frames" | "emptyframes" | "trg-003" => Ok(ScenarioId::EmptyFrames),
            "flipped_pairs" | "flippedpairs" | "trg-004" => Ok(ScenarioId::FlippedPairs),
            "excluded_entities" | "excludedentities" | "trg-005" => Ok(ScenarioId::ExcludedEntities),
            "crowd" | "trg-006" => Ok(ScenarioId::Crowd),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for scenario in ScenarioId::all() {
            assert_eq!(scenario.name().parse::<ScenarioId>(), Ok(scenario));
            assert!(!scenario.description().is_empty());
        }
    }

    #[test]
    fn test_aliases() {
        assert_eq!("TRG-004".parse::<ScenarioId>(), Ok(ScenarioId::FlippedPairs));
        assert_eq!("RestingContact".parse::<ScenarioId>(), Ok(ScenarioId::RestingContact));
        assert!("split_brain".parse::<ScenarioId>().is_err());
    }
}
