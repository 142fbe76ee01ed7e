//! Shared test environment: one subject driver plus one sandbox.
//!
//! The environment is built once before the first case and torn down once
//! after the last (or on abort). Cases share it and stay isolated by working
//! in disjoint sandbox subtrees.

use crate::config::HarnessConfig;
use crate::error::HarnessResult;
use crate::sandbox::Sandbox;
use crate::subject::{create_driver, SubjectDriver};

pub struct Environment {
    driver: Box<dyn SubjectDriver>,
    sandbox: Sandbox,
    config: HarnessConfig,
    torn_down: bool,
}

impl Environment {
    /// Build the driver selected by `config` and a fresh sandbox.
    ///
    /// # Errors
    /// `E_LAUNCH`/`E_CAPABILITY_VERSION` from the backend probe,
    /// `E_SANDBOX_INIT` if the sandbox root cannot be created.
    pub fn from_config(config: &HarnessConfig) -> HarnessResult<Self> {
        let driver = create_driver(config)?;
        let sandbox = Sandbox::create()?;
        Ok(Self::new(driver, sandbox, config.clone()))
    }

    /// Assemble an environment from parts. Used with custom drivers.
    pub fn new(driver: Box<dyn SubjectDriver>, sandbox: Sandbox, config: HarnessConfig) -> Self {
        tracing::debug!(
            backend = driver.backend_name(),
            sandbox = %sandbox.root().display(),
            "environment ready"
        );
        Self {
            driver,
            sandbox,
            config,
            torn_down: false,
        }
    }

    pub fn driver(&mut self) -> &mut dyn SubjectDriver {
        self.driver.as_mut()
    }

    pub fn driver_ref(&self) -> &dyn SubjectDriver {
        self.driver.as_ref()
    }

    pub fn sandbox(&self) -> &Sandbox {
        &self.sandbox
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Subject runtime info and the sandbox tree, for failure logs.
    pub fn diagnostics(&self) -> String {
        format!(
            "subject ({}): {}\nsandbox:\n{}",
            self.driver.backend_name(),
            self.driver.runtime_info(),
            self.sandbox.tree(None)
        )
    }

    /// Close the subject and remove the sandbox. Runs once; later calls are
    /// no-ops. Never fails.
    pub fn cleanup(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.driver.close();
        self.sandbox.dispose();
        tracing::debug!("environment torn down");
    }
}

impl Drop for Environment {
    fn drop(&mut self) {
        self.cleanup();
    }
}
