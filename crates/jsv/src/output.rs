//! Output formats and custom postprocessors.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use crate::result::ValidationResult;
use crate::SchemaError;

/// Shape of the result returned by [`crate::Schema::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Verdict only. Validation stops at the first failure.
    Flag,
    /// Flat list of failing leaves.
    #[default]
    Basic,
    /// Tree condensed to what explains the verdict.
    Detailed,
    /// Every keyword outcome.
    Verbose,
    /// A postprocessor registered under this name, applied to the full tree.
    Custom(String),
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Flag => f.write_str("flag"),
            OutputFormat::Basic => f.write_str("basic"),
            OutputFormat::Detailed => f.write_str("detailed"),
            OutputFormat::Verbose => f.write_str("verbose"),
            OutputFormat::Custom(name) => f.write_str(name),
        }
    }
}

pub type Postprocessor = Arc<dyn Fn(ValidationResult) -> ValidationResult + Send + Sync>;

/// Named output postprocessors.
#[derive(Default)]
pub struct OutputPostprocessors {
    inner: RwLock<HashMap<String, Postprocessor>>,
}

impl fmt::Debug for OutputPostprocessors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<String> = self.inner.read().keys().cloned().collect();
        names.sort();
        f.debug_struct("OutputPostprocessors")
            .field("names", &names)
            .finish()
    }
}

impl OutputPostprocessors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn global() -> Arc<OutputPostprocessors> {
        static GLOBAL: OnceLock<Arc<OutputPostprocessors>> = OnceLock::new();
        GLOBAL.get_or_init(|| Arc::new(OutputPostprocessors::new())).clone()
    }

    /// Registers `f` under `name`, replacing any earlier postprocessor.
    pub fn register<F>(&self, name: &str, f: F)
    where
        F: Fn(ValidationResult) -> ValidationResult + Send + Sync + 'static,
    {
        self.inner.write().insert(name.to_string(), Arc::new(f));
        tracing::debug!(name, "registered output postprocessor");
    }

    pub fn get(&self, name: &str) -> Option<Postprocessor> {
        self.inner.read().get(name).cloned()
    }

    pub fn reset(&self) {
        self.inner.write().clear();
    }
}

impl ValidationResult {
    /// Projects a full result tree onto `format`.
    ///
    /// # Errors
    ///
    /// [`SchemaError::ExtensionMismatch`] for a custom format nobody registered.
    pub fn to_output(
        self,
        format: &OutputFormat,
        postprocessors: &OutputPostprocessors,
    ) -> Result<ValidationResult, SchemaError> {
        Ok(match format {
            OutputFormat::Flag => self.to_flag(),
            OutputFormat::Basic => self.flatten(),
            OutputFormat::Detailed => self.condense(),
            OutputFormat::Verbose => self,
            OutputFormat::Custom(name) => {
                let f = postprocessors.get(name).ok_or_else(|| {
                    SchemaError::ExtensionMismatch(format!("unknown output format '{name}'"))
                })?;
                f(self)
            }
        })
    }
}
