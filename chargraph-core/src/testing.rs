//! Test support: a scripted model backend and snapshot builders.
//!
//! Lives in the crate proper (not behind `cfg(test)`) so integration
//! tests and downstream consumers can drive the loop without a network.

use crate::graph::{Character, CharacterId, GraphSnapshot, Relation};
use crate::model::TextModel;
use crate::prompt::Prompt;
use crate::schema::SchemaOptions;
use async_trait::async_trait;
use llmclient::Error as ClientError;
use std::collections::VecDeque;
use std::sync::Mutex;

/// One scripted reply.
#[derive(Debug)]
pub enum MockReply {
    /// Raw text handed back as the model output.
    Raw(String),
    /// A simulated client failure.
    Fail(ClientError),
}

/// A request the mock saw, kept for assertions.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub system: String,
    pub user: String,
    pub options: SchemaOptions,
    pub temperature: f32,
}

/// A scripted model: replies are played back in order, and every request
/// is recorded. An exhausted script fails the call, which surfaces as a
/// failed iteration.
#[derive(Debug, Default)]
pub struct MockModel {
    replies: Mutex<VecDeque<MockReply>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue(&self, reply: MockReply) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn queue_raw(&self, raw: impl Into<String>) {
        self.queue(MockReply::Raw(raw.into()));
    }

    /// Queue a JSON value, serialized compactly.
    pub fn queue_json(&self, value: &serde_json::Value) {
        self.queue_raw(value.to_string());
    }

    pub fn queue_failure(&self, error: ClientError) {
        self.queue(MockReply::Fail(error));
    }

    /// Everything the mock has been asked so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextModel for MockModel {
    async fn generate(
        &self,
        prompt: &Prompt,
        options: SchemaOptions,
        temperature: f32,
    ) -> Result<String, ClientError> {
        self.requests.lock().unwrap().push(RecordedRequest {
            system: prompt.system.clone(),
            user: prompt.user.clone(),
            options,
            temperature,
        });

        match self.replies.lock().unwrap().pop_front() {
            Some(MockReply::Raw(raw)) => Ok(raw),
            Some(MockReply::Fail(error)) => Err(error),
            None => Err(ClientError::Network("mock script exhausted".to_string())),
        }
    }
}

/// Shorthand for a non-main character with a single name.
pub fn character(id: u64, name: &str) -> Character {
    Character::new(CharacterId::new(id), name)
}

/// Shorthand for a single-label relation.
pub fn relation(id1: u64, id2: u64, label: &str, weight: f64, positivity: f64) -> Relation {
    Relation::new(
        CharacterId::new(id1),
        CharacterId::new(id2),
        label,
        weight,
        positivity,
    )
}

/// A minimal valid graph: two characters and one friendly relation.
pub fn sample_snapshot() -> GraphSnapshot {
    GraphSnapshot::new(
        vec![character(1, "Alice").main(), character(2, "Bob")],
        vec![relation(1, 2, "friend", 5.0, 0.8)],
    )
}
