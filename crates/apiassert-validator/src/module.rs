//! Bootstrap of the validation façade from configuration and collaborators

use apiassert_core::{Config, HeaderSource, MessageAdapter, RestClient};

use crate::error::ValidatorError;
use crate::facade::ValidationFacade;

/// Names of the collaborators the façade depends on.
pub const DEPENDS: [&str; 2] = ["REST", "Browser"];

/// Assembles a [`ValidationFacade`], checking that both collaborators were supplied.
#[derive(Debug)]
pub struct ModuleBuilder<R, H> {
    config: Config,
    rest: Option<R>,
    browser: Option<H>,
}

impl<R: RestClient, H: HeaderSource> ModuleBuilder<R, H> {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            rest: None,
            browser: None,
        }
    }

    #[must_use]
    pub fn with_rest(mut self, rest: R) -> Self {
        self.rest = Some(rest);
        self
    }

    #[must_use]
    pub fn with_browser(mut self, browser: H) -> Self {
        self.browser = Some(browser);
        self
    }

    #[must_use]
    pub const fn depends(&self) -> &'static [&'static str] {
        &DEPENDS
    }

    /// # Errors
    ///
    /// Returns [`ValidatorError::MissingDependency`] naming each missing
    /// collaborator, or [`ValidatorError::SchemaNotFound`] if the configured
    /// document does not exist under the project root.
    pub fn build(self) -> Result<ValidationFacade<R, H>, ValidatorError> {
        let (rest, browser) = match (self.rest, self.browser) {
            (Some(rest), Some(browser)) => (rest, browser),
            (rest, browser) => {
                let mut missing = Vec::new();
                if rest.is_none() {
                    missing.push(DEPENDS[0]);
                }
                if browser.is_none() {
                    missing.push(DEPENDS[1]);
                }
                return Err(ValidatorError::MissingDependency(missing));
            }
        };
        let schema = self.config.schema_path();
        tracing::debug!(schema = %schema.display(), "initialising api validator");
        ValidationFacade::new(MessageAdapter::new(rest, browser), schema)
    }
}
