//! Catalog of launchable background services.
//!
//! A service is a named command line plus an optional working directory.
//! The catalog is either the built-in pair of test services or a JSON file:
//!
//! ```json
//! {
//!   "test1": { "program": "python", "args": ["hello.py"] },
//!   "stream": { "program": "./stream", "working_directory": "/opt/rig" }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::registry::ProcessRegistry;
use crate::scripting::command::CommandLine;
use crate::types::Pid;

/// How to start one named service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSpec {
    #[serde(flatten)]
    pub command: CommandLine,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<PathBuf>,
}

impl ServiceSpec {
    pub fn new(command: CommandLine) -> Self {
        Self {
            command,
            working_directory: None,
        }
    }

    /// Spawn the service detached from our stdio.
    ///
    /// The child keeps running until the registry terminates it; output is
    /// discarded since nothing reads it.
    pub fn spawn(&self) -> std::io::Result<tokio::process::Child> {
        let mut cmd = self.command.to_command(std::iter::empty::<&str>());
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        if let Some(dir) = &self.working_directory {
            cmd.current_dir(dir);
        }
        cmd.spawn()
    }
}

/// Name → [`ServiceSpec`] table, ordered by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceCatalog {
    services: BTreeMap<String, ServiceSpec>,
}

impl Default for ServiceCatalog {
    /// `test1` and `test2`, both running `python hello.py`.
    fn default() -> Self {
        let hello = ServiceSpec::new(CommandLine::new("python").arg("hello.py"));
        Self::from_iter([("test1", hello.clone()), ("test2", hello)])
    }
}

impl<S: Into<String>> FromIterator<(S, ServiceSpec)> for ServiceCatalog {
    fn from_iter<I: IntoIterator<Item = (S, ServiceSpec)>>(iter: I) -> Self {
        Self {
            services: iter
                .into_iter()
                .map(|(name, spec)| (name.into(), spec))
                .collect(),
        }
    }
}

impl ServiceCatalog {
    /// Read a catalog from a JSON file. An empty catalog is rejected.
    pub fn from_file(path: &Path) -> CoreResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            CoreError::Validation(format!(
                "unable to read service catalog {}: {e}",
                path.display()
            ))
        })?;
        let catalog: Self = serde_json::from_str(&raw).map_err(|e| {
            CoreError::Validation(format!(
                "malformed service catalog {}: {e}",
                path.display()
            ))
        })?;
        if catalog.services.is_empty() {
            return Err(CoreError::Validation(format!(
                "service catalog {} defines no services",
                path.display()
            )));
        }
        Ok(catalog)
    }

    pub fn get(&self, name: &str) -> CoreResult<&ServiceSpec> {
        self.services.get(name).ok_or_else(|| CoreError::NotFound {
            entity: "service",
            key: name.to_string(),
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.services.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ServiceSpec)> {
        self.services.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Kill any running instance of `name` and start a fresh one.
    pub async fn launch(&self, registry: &ProcessRegistry, name: &str) -> CoreResult<Pid> {
        let spec = self.get(name)?;
        tracing::info!(service = name, command = %spec.command, "Launching service");
        registry.launch(name, || spec.spawn()).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
