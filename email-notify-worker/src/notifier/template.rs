//! Email body template
//!
//! The template is tera syntax and sees three variables: `recipient`,
//! `failed_count` and `details`.

use tera::{Context, Tera};

const TEMPLATE_NAME: &str = "email";

/// Values the body template is rendered against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyAttributes<'a> {
    pub recipient: &'a str,
    pub failed_count: usize,
    pub details: &'a str,
}

/// A parsed body template
#[derive(Debug)]
pub struct BodyTemplate {
    engine: Tera,
}

impl BodyTemplate {
    /// Parses the template text
    ///
    /// # Errors
    ///
    /// Returns `tera::Error` if the template does not parse
    pub fn parse(text: &str) -> Result<Self, tera::Error> {
        let mut engine = Tera::default();
        engine.add_raw_template(TEMPLATE_NAME, text)?;

        Ok(Self { engine })
    }

    /// Renders the body
    ///
    /// # Errors
    ///
    /// Returns `tera::Error` if rendering fails, for example on an unknown
    /// variable
    pub fn render(&self, attributes: &BodyAttributes<'_>) -> Result<String, tera::Error> {
        let mut context = Context::new();
        context.insert("recipient", attributes.recipient);
        context.insert("failed_count", &attributes.failed_count);
        context.insert("details", attributes.details);

        self.engine.render(TEMPLATE_NAME, &context)
    }
}
