//! Tool-call dispatch for the agent's tool loop.

use std::sync::Arc;

use futures::future::join_all;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::AgentxError;
use crate::tools::validation::validate_value;
use crate::tools::{Tool, ToolArguments};
use crate::types::{File, Message, ToolCall, ToolCallKind};

/// Run every resolvable call concurrently and return the tool messages in
/// call order, each followed by its multimodal follow-up (if any).
pub(super) async fn execute_tool_calls(
    agent_name: &str,
    tools: &[Arc<dyn Tool>],
    calls: &[ToolCall],
) -> Result<Vec<Message>, AgentxError> {
    let resolved: Vec<(&ToolCall, &Arc<dyn Tool>)> = calls
        .iter()
        .filter_map(|call| match call.kind {
            ToolCallKind::Function => match find_tool(tools, call.name()) {
                Some(tool) => Some((call, tool)),
                None => {
                    warn!(agent = agent_name, tool = call.name(), call_id = %call.id, "unresolved tool call skipped");
                    None
                }
            },
        })
        .collect();

    let outputs = join_all(
        resolved
            .iter()
            .map(|&(call, tool)| invoke_tool(Arc::as_ref(tool), call)),
    )
    .await;

    let mut messages = Vec::with_capacity(resolved.len());
    for ((call, _), output) in resolved.iter().zip(outputs) {
        let output = output?;
        let value: Value =
            serde_json::from_str(&output).map_err(|source| AgentxError::MalformedToolOutput {
                tool_name: call.name().to_string(),
                source,
            })?;
        let follow_up = multimodal_follow_up(call.name(), &value)?;
        messages.push(Message::tool_response(call.id.clone(), call.name(), output));
        if let Some(follow_up) = follow_up {
            messages.push(follow_up.with_name(agent_name));
        }
    }
    Ok(messages)
}

pub(super) fn find_tool<'a>(tools: &'a [Arc<dyn Tool>], name: &str) -> Option<&'a Arc<dyn Tool>> {
    tools.iter().find(|t| t.name().eq_ignore_ascii_case(name))
}

async fn invoke_tool(tool: &dyn Tool, call: &ToolCall) -> Result<String, AgentxError> {
    let args = ToolArguments::parse(&call.function_call.arguments)
        .map_err(|e| AgentxError::tool(call.name(), format!("invalid arguments: {e}")))?;
    validate_value(args.raw(), &tool.parameters().schema)
        .map_err(|e| AgentxError::tool(call.name(), format!("Argument validation failed: {e}")))?;

    debug!(tool = call.name(), call_id = %call.id, "dispatching tool call");
    tool.call(args).await
}

/// A `files` or `url` key in a tool's JSON output becomes a user message
/// showing that media to the conversation.
fn multimodal_follow_up(tool_name: &str, value: &Value) -> Result<Option<Message>, AgentxError> {
    let Some(object) = value.as_object() else {
        return Ok(None);
    };

    let files = match object.get("files").filter(|v| !v.is_null()) {
        Some(raw) => Some(
            serde_json::from_value::<Vec<File>>(raw.clone()).map_err(|source| {
                AgentxError::MalformedToolOutput {
                    tool_name: tool_name.to_string(),
                    source,
                }
            })?,
        ),
        None => None,
    };
    let urls = match object.get("url") {
        Some(Value::String(url)) => Some(vec![url.clone()]),
        Some(Value::Array(items)) => Some(
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
        ),
        _ => None,
    };

    if files.is_none() && urls.is_none() {
        return Ok(None);
    }
    Ok(Some(Message::user_multimodal(files, urls)))
}
