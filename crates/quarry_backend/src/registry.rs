//! Construction of backends by kind.

use crate::{ClickHouseBackend, LivyBackend, TrinoBackend, WebHcatBackend};
use quarry_core::{BackendKind, BackendSettings};
use quarry_error::{ConfigError, QuarryResult};
use quarry_interface::ExecutionBackend;
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::{debug, instrument};

/// Builds one backend from its settings.
pub type BackendFactory = fn(BackendSettings) -> QuarryResult<Box<dyn ExecutionBackend>>;

/// Maps backend kinds to their factories.
///
/// Built explicitly and passed by reference; there is no global registry.
///
/// # Examples
///
/// ```
/// use quarry_backend::BackendRegistry;
/// use quarry_core::{BackendKind, BackendSettings};
///
/// let registry = BackendRegistry::standard();
/// assert_eq!(registry.supported().len(), 4);
///
/// let backend = registry
///     .create("clickhouse", BackendSettings::default_for(BackendKind::ClickHouse))
///     .unwrap();
/// assert_eq!(backend.kind(), BackendKind::ClickHouse);
///
/// assert!(registry.create("oracle", BackendSettings::default()).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct BackendRegistry {
    factories: BTreeMap<BackendKind, BackendFactory>,
}

impl BackendRegistry {
    /// Registry with no backends.
    pub fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Registry with the HTTP backend for every kind.
    pub fn standard() -> Self {
        Self::empty()
            .with_factory(BackendKind::Spark, livy)
            .with_factory(BackendKind::Hive, webhcat)
            .with_factory(BackendKind::ClickHouse, clickhouse)
            .with_factory(BackendKind::Presto, trino)
    }

    /// Register (or replace) the factory for `kind`.
    pub fn with_factory(mut self, kind: BackendKind, factory: BackendFactory) -> Self {
        self.factories.insert(kind, factory);
        self
    }

    /// Kinds this registry can build, in a stable order.
    pub fn supported(&self) -> Vec<BackendKind> {
        self.factories.keys().copied().collect()
    }

    /// Build the backend named `key` ("spark", "hive", "clickhouse", "presto").
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an unknown or unregistered key, or
    /// when the backend cannot be constructed.
    #[instrument(skip(self, settings), fields(url = %settings.url()))]
    pub fn create(
        &self,
        key: &str,
        settings: BackendSettings,
    ) -> QuarryResult<Box<dyn ExecutionBackend>> {
        let kind = BackendKind::from_str(key.trim()).map_err(|_| {
            ConfigError::new(format!(
                "Unsupported backend '{}'; expected one of: {}",
                key,
                self.supported_names()
            ))
        })?;
        self.create_kind(kind, settings)
    }

    /// Build the backend for `kind`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when `kind` is not registered or the
    /// backend cannot be constructed.
    pub fn create_kind(
        &self,
        kind: BackendKind,
        settings: BackendSettings,
    ) -> QuarryResult<Box<dyn ExecutionBackend>> {
        let factory = self.factories.get(&kind).ok_or_else(|| {
            ConfigError::new(format!(
                "Backend '{}' is not registered; expected one of: {}",
                kind,
                self.supported_names()
            ))
        })?;
        debug!(backend = %kind, "Creating backend");
        factory(settings)
    }

    fn supported_names(&self) -> String {
        self.supported()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn livy(settings: BackendSettings) -> QuarryResult<Box<dyn ExecutionBackend>> {
    Ok(Box::new(LivyBackend::new(settings)?))
}

fn webhcat(settings: BackendSettings) -> QuarryResult<Box<dyn ExecutionBackend>> {
    Ok(Box::new(WebHcatBackend::new(settings)?))
}

fn clickhouse(settings: BackendSettings) -> QuarryResult<Box<dyn ExecutionBackend>> {
    Ok(Box::new(ClickHouseBackend::new(settings)?))
}

fn trino(settings: BackendSettings) -> QuarryResult<Box<dyn ExecutionBackend>> {
    Ok(Box::new(TrinoBackend::new(settings)?))
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
