use rst_common::standard::serde::{self, Deserialize};

use crate::common::types::{CommonError, ToValidate};

use super::{App, Exchange};

#[derive(Deserialize, Debug, Clone)]
#[serde(crate = "self::serde")]
pub struct Config {
    pub(super) app: App,
    pub(super) exchange: Exchange,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    pub fn exchange(&self) -> &Exchange {
        &self.exchange
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app: App::default(),
            exchange: Exchange::default(),
        }
    }
}

impl ToValidate for Config {
    fn validate(&self) -> Result<(), CommonError> {
        _ = self.app.validate()?;
        _ = self.exchange.validate()?;

        Ok(())
    }
}
