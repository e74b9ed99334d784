//! Scripted language model used by the service tests.

use anyhow::{Result, anyhow};
use async_openai::error::OpenAIError;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestMessage, ChatCompletionTool,
    ChatCompletionToolType, FunctionCall,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use story_editor_core::SessionHost;
use story_editor_core::llm_client::{LLMAction, LLMClient, LLMStream, LLMStreamEvent};

/// Plays back queued decisions and streams a fixed list of chunks per reply.
pub struct ScriptedLLM {
    actions: Mutex<VecDeque<LLMAction>>,
    chunks: Vec<String>,
    interrupt_target: Mutex<Option<Arc<dyn SessionHost>>>,
    pub seen_tools: Mutex<Vec<Vec<String>>>,
}

impl ScriptedLLM {
    pub fn new(actions: Vec<LLMAction>, chunks: Vec<&str>) -> Self {
        Self {
            actions: Mutex::new(actions.into()),
            chunks: chunks.into_iter().map(str::to_string).collect(),
            interrupt_target: Mutex::new(None),
            seen_tools: Mutex::new(Vec::new()),
        }
    }

    /// Makes every streamed reply interrupt `host` before its first chunk.
    pub fn interrupt_with(&self, host: Arc<dyn SessionHost>) {
        *self.interrupt_target.lock().unwrap() = Some(host);
    }
}

pub fn tool_call(id: &str, name: &str, arguments: &str) -> ChatCompletionMessageToolCall {
    ChatCompletionMessageToolCall {
        id: id.to_string(),
        r#type: ChatCompletionToolType::Function,
        function: FunctionCall {
            name: name.to_string(),
            arguments: arguments.to_string(),
        },
    }
}

#[async_trait]
impl LLMClient for ScriptedLLM {
    async fn decide_action(
        &self,
        _model: &str,
        _messages: Vec<ChatCompletionRequestMessage>,
        tools: Vec<ChatCompletionTool>,
    ) -> Result<LLMAction> {
        self.seen_tools
            .lock()
            .unwrap()
            .push(tools.into_iter().map(|t| t.function.name).collect());
        self.actions
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow!("no scripted action left"))
    }

    async fn stream_reply(
        &self,
        _model: &str,
        _messages: Vec<ChatCompletionRequestMessage>,
    ) -> Result<LLMStream> {
        let target = self.interrupt_target.lock().unwrap().clone();
        if let Some(host) = target {
            host.interrupt().await?;
        }
        let events: Vec<Result<LLMStreamEvent, OpenAIError>> = self
            .chunks
            .iter()
            .map(|chunk| Ok(LLMStreamEvent::TextChunk(chunk.clone())))
            .collect();
        Ok(Box::pin(futures_util::stream::iter(events)))
    }
}
