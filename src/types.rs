use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Build environment, read once at startup.
///
/// Anything other than `development` or `production` is kept verbatim as
/// `Other` so it can be reported, but it selects no default tasks.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum Environment {
    Development,
    Production,
    Other(String),
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Environment::Development
    }
}

impl From<String> for Environment {
    fn from(s: String) -> Self {
        match s.trim().to_lowercase().as_str() {
            "development" => Environment::Development,
            "production" => Environment::Production,
            _ => Environment::Other(s),
        }
    }
}

impl FromStr for Environment {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Environment::from(s.to_string()))
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Production => write!(f, "production"),
            Environment::Other(s) => write!(f, "{s}"),
        }
    }
}

/// Behaviour when a watch trigger arrives while a run is already in progress.
///
/// - `Queue`: remember the trigger and start a new run when the current one
///   finishes (default behaviour).
/// - `Cancel`: drop any previously queued run and only keep the latest
///   trigger. The running tasks themselves are never interrupted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerWhileRunningBehaviour {
    Queue,
    Cancel,
}

impl Default for TriggerWhileRunningBehaviour {
    fn default() -> Self {
        TriggerWhileRunningBehaviour::Queue
    }
}

impl FromStr for TriggerWhileRunningBehaviour {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "queue" => Ok(TriggerWhileRunningBehaviour::Queue),
            "cancel" => Ok(TriggerWhileRunningBehaviour::Cancel),
            other => Err(format!(
                "invalid triggered_while_running_behaviour: {other} (expected \"queue\" or \"cancel\")"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_parsing_is_case_insensitive() {
        assert_eq!("Production".parse::<Environment>().unwrap(), Environment::Production);
        assert_eq!(" development ".parse::<Environment>().unwrap(), Environment::Development);
        assert_eq!(
            "staging".parse::<Environment>().unwrap(),
            Environment::Other("staging".into())
        );
    }

    #[test]
    fn behaviour_rejects_unknown_values() {
        assert!("drop".parse::<TriggerWhileRunningBehaviour>().is_err());
        assert_eq!(
            "CANCEL".parse::<TriggerWhileRunningBehaviour>().unwrap(),
            TriggerWhileRunningBehaviour::Cancel
        );
    }
}
