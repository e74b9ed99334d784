//! Contains the logic for the agent's "ReAct" (Reason and Act) cycle.

use anyhow::Result;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestToolMessageArgs,
};
use futures_util::StreamExt;
use serde_json::Value;
use story_editor_core::llm_client::{
    LLMAction, LLMClient, LLMStreamEvent, build_messages, completion_tools,
};
use story_editor_core::{AgentSession, ToolReply};
use tracing::{info, warn};

/// How a user turn ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnResult {
    /// The active agent replied with this text.
    Replied(String),
    /// A new agent took over. The announcement and its greeting were already delivered.
    HandedOff { announcement: String },
    /// The session has ended and takes no further turns.
    Finished,
    /// Tools ran but the model had nothing further to say.
    Silent,
}

/// Handles a single user utterance, driving the active agent through a ReAct cycle.
///
/// This involves:
/// 1.  Recording the utterance in the active agent's history.
/// 2.  Calling the LLM with the agent's instructions, history and tools.
/// 3.  If tools are chosen, dispatching them through the session. A handoff or
///     the end of the session stops the cycle, since the remaining calls were
///     meant for an agent that is no longer active.
/// 4.  Otherwise feeding the tool results back to the LLM for the final reply.
///
/// An ended session never takes another turn, even if tearing it down failed.
pub async fn handle_user_turn(
    session: &mut AgentSession,
    llm: &dyn LLMClient,
    user_text: &str,
) -> Result<TurnResult> {
    if session.is_ended() {
        return Ok(TurnResult::Finished);
    }
    session.record_user_turn(user_text);

    let request = session.reply_request(None, true);
    let model = request.backends.llm_model.clone();
    let messages = build_messages(&request.system_prompt, &request.history, None)?;
    let tools = completion_tools(&session.active().tools().specs())?;

    let action = llm.decide_action(&model, messages.clone(), tools).await?;

    let tool_calls = match action {
        LLMAction::TextResponse(text) => {
            session.record_assistant_turn(text.clone());
            return Ok(TurnResult::Replied(text));
        }
        LLMAction::ToolCall(tool_calls) => tool_calls,
    };

    let mut tool_results = Vec::with_capacity(tool_calls.len());
    for call in &tool_calls {
        let arguments = match serde_json::from_str::<Value>(&call.function.arguments) {
            Ok(arguments) => arguments,
            Err(e) => {
                warn!(tool = %call.function.name, error = %e, "Tool arguments were not valid JSON");
                tool_results.push(format!("Error: arguments were not valid JSON: {}", e));
                continue;
            }
        };

        match session.call_tool(&call.function.name, arguments).await {
            Ok(ToolReply::Output(text)) => tool_results.push(text.unwrap_or_else(|| "OK.".to_string())),
            Ok(ToolReply::Handoff { announcement, .. }) => {
                return Ok(TurnResult::HandedOff { announcement });
            }
            Ok(ToolReply::Finished) => return Ok(TurnResult::Finished),
            Err(e) if session.is_ended() => {
                warn!(tool = %call.function.name, error = %e, "Session ended with a failed teardown");
                return Ok(TurnResult::Finished);
            }
            Err(e) => {
                // Reported back to the model so it can apologise and carry on.
                warn!(tool = %call.function.name, error = %e, "Tool call failed");
                tool_results.push(format!("Error: {}", e));
            }
        }
    }

    // Append the tool calls and their results, then ask for the final response.
    let mut history_with_tools = messages;
    history_with_tools.push(
        ChatCompletionRequestAssistantMessageArgs::default()
            .tool_calls(tool_calls.clone())
            .build()?
            .into(),
    );
    for (call, result) in tool_calls.iter().zip(&tool_results) {
        history_with_tools.push(
            ChatCompletionRequestToolMessageArgs::default()
                .tool_call_id(call.id.clone())
                .content(result.clone())
                .build()?
                .into(),
        );
    }

    let mut final_stream = llm.stream_reply(&model, history_with_tools).await?;
    let mut full_response = String::new();
    while let Some(event_result) = final_stream.next().await {
        let LLMStreamEvent::TextChunk(chunk) = event_result?;
        full_response.push_str(&chunk);
    }

    if full_response.trim().is_empty() {
        info!("Model produced no text after tool calls.");
        return Ok(TurnResult::Silent);
    }
    session.record_assistant_turn(full_response.clone());
    Ok(TurnResult::Replied(full_response))
}

/// Runs one user turn unless `shutdown` resolves first, in which case the turn
/// is dropped mid-flight and `None` is returned.
pub async fn handle_user_turn_until<F>(
    session: &mut AgentSession,
    llm: &dyn LLMClient,
    user_text: &str,
    shutdown: F,
) -> Option<Result<TurnResult>>
where
    F: Future<Output = ()>,
{
    tokio::select! {
        biased;
        _ = shutdown => None,
        turn = handle_user_turn(session, llm, user_text) => Some(turn),
    }
}
