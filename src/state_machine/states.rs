use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle states of the updates subsystem
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateValue {
    /// No check or download in flight
    #[default]
    Idle,
    /// A check for a new update is in flight
    Checking,
    /// An update download is in flight
    Downloading,
    /// The app is relaunching into a new update
    Restarting,
}

impl StateValue {
    /// Every state, in declaration order
    pub const ALL: [StateValue; 4] = [
        Self::Idle,
        Self::Checking,
        Self::Downloading,
        Self::Restarting,
    ];

    /// Check if a check or download is conceptually in flight
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Checking | Self::Downloading)
    }

    /// Check if the machine is waiting for a relaunch
    pub fn is_restarting(&self) -> bool {
        matches!(self, Self::Restarting)
    }
}

impl fmt::Display for StateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Checking => write!(f, "checking"),
            Self::Downloading => write!(f, "downloading"),
            Self::Restarting => write!(f, "restarting"),
        }
    }
}

impl std::str::FromStr for StateValue {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "idle" => Ok(Self::Idle),
            "checking" => Ok(Self::Checking),
            "downloading" => Ok(Self::Downloading),
            "restarting" => Ok(Self::Restarting),
            _ => Err(format!("Invalid updates state: {s}")),
        }
    }
}
