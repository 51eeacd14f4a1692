use serde::Deserialize;
use serguard_core::error::{GuardError, Result};
use serguard_core::protocol::{ReaderOptions, DEFAULT_MAX_DEPTH};

use crate::stream::GateOptions;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GateConfig {
    pub version: u32,

    #[serde(default)]
    pub reader: ReaderSection,

    #[serde(default)]
    pub logging: LoggingSection,
}

impl GateConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(GuardError::Config(format!(
                "unsupported config version: {}",
                self.version
            )));
        }

        self.reader.validate()?;

        Ok(())
    }

    pub fn gate_options(&self) -> GateOptions {
        GateOptions {
            reader: ReaderOptions {
                max_depth: self.reader.max_depth,
            },
            log_blocked_names: self.logging.log_blocked_names,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReaderSection {
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for ReaderSection {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
        }
    }
}

impl ReaderSection {
    pub fn validate(&self) -> Result<()> {
        if !(1..=4096).contains(&self.max_depth) {
            return Err(GuardError::Config(
                "reader.max_depth must be between 1 and 4096".into(),
            ));
        }
        Ok(())
    }
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// Put the rejected type name in the server-side log event.
    #[serde(default)]
    pub log_blocked_names: bool,
}
