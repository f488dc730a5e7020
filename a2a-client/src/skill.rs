//! Remote skill families reachable from the conversation layer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The two remote agent services of the travel system. Each skill has its own
/// JSON-RPC endpoint and its own task lifecycle inside a shared conversation
/// context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Skill {
    FlightSearch,
    Booking,
}

impl Skill {
    pub const ALL: [Skill; 2] = [Skill::FlightSearch, Skill::Booking];

    /// Stable wire name, used in persisted sessions and logs.
    pub fn wire_name(&self) -> &'static str {
        match self {
            Skill::FlightSearch => "flight-search",
            Skill::Booking => "booking",
        }
    }
}

impl fmt::Display for Skill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_name_matches_serde_form() {
        for skill in Skill::ALL {
            let serialized = serde_json::to_value(skill).unwrap();
            assert_eq!(serialized, serde_json::Value::from(skill.wire_name()));
        }
    }
}
