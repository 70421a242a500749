//! Chat-completion answering agent.

use super::AnsweringAgent;
use crate::config::{Prompts, NO_RELEVANT_DATA};
use crate::error::{Result, TubeqError};
use crate::openai::{create_client, EndpointConfig};
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::{debug, info, instrument};

/// Answering agent backed by an OpenAI-compatible chat endpoint.
pub struct OpenAIAnswerer {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    temperature: f32,
    prompts: Prompts,
}

impl OpenAIAnswerer {
    /// Create a new answerer for `model`.
    pub fn new(endpoint: &EndpointConfig, model: &str) -> Result<Self> {
        Ok(Self {
            client: create_client(endpoint)?,
            model: model.to_string(),
            temperature: 0.0,
            prompts: Prompts::default(),
        })
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    fn build_messages(&self, query: &str, context: &str) -> Result<Vec<ChatCompletionRequestMessage>> {
        let mut vars = HashMap::new();
        vars.insert("query".to_string(), query.to_string());
        vars.insert("context".to_string(), context.to_string());

        let system = self
            .prompts
            .render_with_custom(&self.prompts.answer.system, &HashMap::new());
        let user = self.prompts.render_with_custom(&self.prompts.answer.user, &vars);

        Ok(vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system)
                .build()
                .map_err(|e| TubeqError::AnswerUnavailable(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user)
                .build()
                .map_err(|e| TubeqError::AnswerUnavailable(e.to_string()))?
                .into(),
        ])
    }
}

#[async_trait]
impl AnsweringAgent for OpenAIAnswerer {
    #[instrument(skip(self, context), fields(context_chars = context.len()))]
    async fn answer(&self, query: &str, context: &str) -> Result<String> {
        if context.trim().is_empty() {
            info!("Empty context, answering with sentinel");
            return Ok(NO_RELEVANT_DATA.to_string());
        }

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(self.build_messages(query, context)?)
            .temperature(self.temperature)
            .build()
            .map_err(|e| TubeqError::AnswerUnavailable(e.to_string()))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            TubeqError::AnswerUnavailable(format!("Failed to generate response: {}", e))
        })?;

        let answer = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| TubeqError::AnswerUnavailable("Empty response from model".to_string()))?
            .trim()
            .to_string();

        debug!("Generated answer of {} chars", answer.len());
        Ok(answer)
    }
}
