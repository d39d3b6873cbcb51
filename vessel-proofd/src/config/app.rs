use rst_common::standard::serde::{self, Deserialize};

use crate::common::types::{CommonError, ToValidate};

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

#[derive(Deserialize, Debug, Clone)]
#[serde(crate = "self::serde")]
pub struct App {
    pub(super) name: String,
    pub(super) log_level: String,
}

impl App {
    pub fn get_name(&self) -> String {
        self.name.to_owned()
    }

    pub fn get_log_level(&self) -> String {
        self.log_level.to_owned()
    }

    /// `log_filter` builds the default tracing directive covering the daemon and the proof crates
    pub fn log_filter(&self, crate_name: &str) -> String {
        format!(
            "{crate_name}={level},prople_vessel_proof={level},prople_vessel_proof_engine={level}",
            level = self.log_level
        )
    }
}

impl Default for App {
    fn default() -> Self {
        Self {
            name: "".to_string(),
            log_level: "debug".to_string(),
        }
    }
}

impl ToValidate for App {
    fn validate(&self) -> Result<(), CommonError> {
        if self.name.is_empty() {
            return Err(CommonError::ValidationError(
                "config: app:name is missing".to_string(),
            ));
        }

        if !LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(CommonError::ValidationError(format!(
                "config: app:log_level is unknown: {}",
                self.log_level
            )));
        }

        Ok(())
    }
}
