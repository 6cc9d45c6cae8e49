//! Capability catalog
//!
//! Static mapping from agent type to its default capability set and to the
//! memory-cost range used by the default cost estimator. This is the only
//! place agent types are enumerated; everything else goes through it.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Agent type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentType {
    /// General-purpose task execution
    Worker,

    /// Cross-agent coordination and monitoring
    Coordinator,

    /// Domain-specific analysis work
    Specialist,
}

impl AgentType {
    /// All known agent types, in catalog order
    pub fn all() -> [AgentType; 3] {
        [Self::Worker, Self::Coordinator, Self::Specialist]
    }

    /// Default capability tags granted when a spawn request omits them
    pub fn default_capabilities(&self) -> HashSet<String> {
        let tags: &[&str] = match self {
            Self::Worker => &["general", "processing"],
            Self::Coordinator => &["coordination", "monitoring", "general"],
            Self::Specialist => &["specialized", "analysis", "general"],
        };
        tags.iter().map(|t| t.to_string()).collect()
    }

    /// Inclusive memory-cost range in MB for one agent of this type
    pub fn memory_cost_range(&self) -> (f64, f64) {
        match self {
            Self::Worker => (128.0, 256.0),
            Self::Coordinator => (256.0, 512.0),
            Self::Specialist => (200.0, 400.0),
        }
    }
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Worker => write!(f, "worker"),
            Self::Coordinator => write!(f, "coordinator"),
            Self::Specialist => write!(f, "specialist"),
        }
    }
}

impl FromStr for AgentType {
    type Err = crate::ApiaryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "worker" => Ok(Self::Worker),
            "coordinator" => Ok(Self::Coordinator),
            "specialist" => Ok(Self::Specialist),
            other => Err(crate::ApiaryError::Validation(format!(
                "Unknown agent type '{}' (expected worker, coordinator, or specialist)",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_capabilities() {
        let worker = AgentType::Worker.default_capabilities();
        assert!(worker.contains("general"));
        assert!(worker.contains("processing"));
        assert_eq!(worker.len(), 2);

        let coordinator = AgentType::Coordinator.default_capabilities();
        assert!(coordinator.contains("coordination"));
        assert!(coordinator.contains("monitoring"));
        assert!(coordinator.contains("general"));

        let specialist = AgentType::Specialist.default_capabilities();
        assert!(specialist.contains("specialized"));
        assert!(specialist.contains("analysis"));
    }

    #[test]
    fn test_cost_ranges() {
        assert_eq!(AgentType::Worker.memory_cost_range(), (128.0, 256.0));
        assert_eq!(AgentType::Coordinator.memory_cost_range(), (256.0, 512.0));
        assert_eq!(AgentType::Specialist.memory_cost_range(), (200.0, 400.0));
    }

    #[test]
    fn test_parse() {
        assert_eq!("worker".parse::<AgentType>().unwrap(), AgentType::Worker);
        assert_eq!(
            "coordinator".parse::<AgentType>().unwrap(),
            AgentType::Coordinator
        );
        assert!("gpu".parse::<AgentType>().is_err());
    }

    #[test]
    fn test_display_round_trip() {
        for agent_type in AgentType::all() {
            let parsed: AgentType = agent_type.to_string().parse().unwrap();
            assert_eq!(parsed, agent_type);
        }
    }
}
