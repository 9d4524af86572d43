//! Engagement Action Value Object

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PromoError;

/// Kind of interaction a user had with a campaign
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngagementAction {
    Clicked,
    Used,
}

impl EngagementAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clicked => "clicked",
            Self::Used => "used",
        }
    }
}

impl FromStr for EngagementAction {
    type Err = PromoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "clicked" => Ok(Self::Clicked),
            "used" => Ok(Self::Used),
            other => Err(PromoError::InvalidAction(other.to_string())),
        }
    }
}

impl fmt::Display for EngagementAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
