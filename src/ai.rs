//! The seam between the bot and the language-model backend.

use async_trait::async_trait;
use chatgpt::client::ChatGPT;
use chatgpt::types::CompletionResponse;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ModelError {
    /// The backend call failed: API error, timeout, network.
    #[error("{0}")]
    Backend(String),
}

/// One prompt in, one completion out. Everything above this trait treats the
/// model as a plain text function, which also keeps the router testable.
#[async_trait]
pub trait TextModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, ModelError>;
}

/// Production backend over the `chatgpt` client. The client is configured
/// with a request timeout in `main`, so a hung backend surfaces here as an
/// ordinary [`ModelError`].
pub struct GptModel {
    client: ChatGPT,
}

impl GptModel {
    pub fn new(client: ChatGPT) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TextModel for GptModel {
    async fn complete(&self, prompt: &str) -> Result<String, ModelError> {
        log::debug!("Sending prompt: {:?}", prompt);

        let response: CompletionResponse = self
            .client
            .send_message(prompt)
            .await
            .map_err(|e| ModelError::Backend(e.to_string()))?;
        let content = response.message().clone().content;

        log::debug!("Completion: {:?}", content);

        Ok(content)
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Scripted backend for tests: pops one canned result per call and
    /// records every prompt it was given.
    pub struct MockModel {
        replies: Mutex<VecDeque<Result<String, ModelError>>>,
        pub prompts: Mutex<Vec<String>>,
    }

    impl MockModel {
        pub fn new(replies: Vec<Result<String, ModelError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn failing(message: &str) -> Self {
            Self::new(vec![Err(ModelError::Backend(message.to_string()))])
        }
    }

    #[async_trait]
    impl TextModel for MockModel {
        async fn complete(&self, prompt: &str) -> Result<String, ModelError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ModelError::Backend("script exhausted".to_string())))
        }
    }
}
