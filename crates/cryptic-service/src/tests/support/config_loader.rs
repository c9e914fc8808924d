//! Test configuration loaders for scenarios covering success and failure paths.

use std::ffi::OsString;
use std::sync::Arc;

use mockall::mock;
use ortho_config::{OrthoConfig, OrthoError};

use cryptic_config::{Config, LogFormat};

use crate::bootstrap::ConfigLoader;

/// Loader that resolves a fixed service name and compact logging.
#[derive(Debug, Clone)]
pub struct TestConfigLoader {
    service_name: String,
}

impl TestConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::named("bdd")
    }

    #[must_use]
    pub fn named(service_name: &str) -> Self {
        Self {
            service_name: service_name.to_owned(),
        }
    }
}

impl ConfigLoader for TestConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(Config {
            service_name: self.service_name.clone(),
            log_format: LogFormat::Compact,
            ..Config::default()
        })
    }
}

/// Loader that intentionally fails by passing invalid CLI arguments.
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        let args = vec![
            OsString::from("cryptic-service"),
            OsString::from("--hub-port"),
            OsString::from("not-a-port"),
        ];
        Config::load_from_iter(args)
    }
}

mock! {
    pub Loader {}
    impl ConfigLoader for Loader {
        fn load(&self) -> Result<Config, Arc<OrthoError>>;
    }
}
