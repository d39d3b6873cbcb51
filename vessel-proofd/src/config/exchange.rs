use std::time::Duration;

use rst_common::standard::serde::{self, Deserialize};
use rst_common::standard::serde_json::{self, Value};

use crate::common::types::{CommonError, ToValidate};

/// `Exchange` describes the proof request a verifier sends and the answer the
/// simulated holder gives back
#[derive(Deserialize, Debug, Clone)]
#[serde(crate = "self::serde")]
pub struct Exchange {
    pub(super) source_id: String,
    pub(super) name: String,
    pub(super) requested_attrs: String,
    pub(super) requested_predicates: String,
    pub(crate) presentation: String,
    pub(crate) timeout_ms: u64,
}

impl Exchange {
    pub fn get_source_id(&self) -> String {
        self.source_id.to_owned()
    }

    pub fn get_name(&self) -> String {
        self.name.to_owned()
    }

    pub fn get_requested(&self) -> (String, String) {
        (
            self.requested_attrs.to_owned(),
            self.requested_predicates.to_owned(),
        )
    }

    pub fn get_presentation(&self) -> String {
        self.presentation.to_owned()
    }

    pub fn get_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for Exchange {
    fn default() -> Self {
        Self {
            source_id: "".to_string(),
            name: "".to_string(),
            requested_attrs: "{}".to_string(),
            requested_predicates: "{}".to_string(),
            presentation: "".to_string(),
            timeout_ms: 5000,
        }
    }
}

fn validate_json(field: &str, value: &str) -> Result<(), CommonError> {
    serde_json::from_str::<Value>(value)
        .map(|_| ())
        .map_err(|err| CommonError::ValidationError(format!("config: exchange:{field} {err}")))
}

impl ToValidate for Exchange {
    fn validate(&self) -> Result<(), CommonError> {
        if self.source_id.is_empty() {
            return Err(CommonError::ValidationError(
                "config: exchange:source_id is missing".to_string(),
            ));
        }

        if self.name.is_empty() {
            return Err(CommonError::ValidationError(
                "config: exchange:name is missing".to_string(),
            ));
        }

        if self.presentation.is_empty() {
            return Err(CommonError::ValidationError(
                "config: exchange:presentation is missing".to_string(),
            ));
        }

        if self.timeout_ms == 0 {
            return Err(CommonError::ValidationError(
                "config: exchange:timeout_ms must be greater than zero".to_string(),
            ));
        }

        validate_json("requested_attrs", &self.requested_attrs)?;
        validate_json("requested_predicates", &self.requested_predicates)?;

        Ok(())
    }
}
