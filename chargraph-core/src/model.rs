//! The model backend seam.
//!
//! The refinement loop drives anything that implements [`TextModel`]: the
//! real two-provider client in production, a scripted mock in tests.

use crate::prompt::Prompt;
use crate::schema::{self, SchemaOptions};
use async_trait::async_trait;
use llmclient::{Client, Error as ClientError, SchemaRequest};

/// A backend that can answer one schema-constrained extraction request.
#[async_trait]
pub trait TextModel {
    /// Request one JSON document for the prompt. One call is one attempt;
    /// the loop decides what a failure means.
    async fn generate(
        &self,
        prompt: &Prompt,
        options: SchemaOptions,
        temperature: f32,
    ) -> Result<String, ClientError>;
}

#[async_trait]
impl TextModel for Client {
    async fn generate(
        &self,
        prompt: &Prompt,
        options: SchemaOptions,
        temperature: f32,
    ) -> Result<String, ClientError> {
        let request = SchemaRequest::new(
            schema::SCHEMA_NAME,
            schema::json_schema(options),
            schema::gemini_schema(options),
        )
        .with_system(prompt.system.clone())
        .with_user(prompt.user.clone())
        .with_temperature(temperature);
        self.complete(&request).await
    }
}
