use serde_json::Value;

use crate::application::registry::text_content;
use crate::domain::types::{ToolDescriptor, ToolExchange, ToolInvocationResult};

/// `name: p1: t1, p2: t2 - description`
pub fn tool_line(tool: &ToolDescriptor) -> String {
    let params = if tool.parameters.is_empty() {
        "no inputs".to_string()
    } else {
        tool.parameters
            .iter()
            .map(|param| format!("{}: {}", param.name, param.type_label))
            .collect::<Vec<_>>()
            .join(", ")
    };
    format!("{}: {} - {}", tool.name, params, tool.short_description)
}

/// One line per tool, in listing order.
pub fn tool_block(tools: &[ToolDescriptor]) -> String {
    tools.iter().map(tool_line).collect::<Vec<_>>().join("\n")
}

/// The call line followed by its `RESULT:` or `ERROR (<kind>):` line.
pub fn exchange_lines(exchange: &ToolExchange) -> String {
    let outcome = match &exchange.result {
        ToolInvocationResult::Success(payload) => format!("RESULT: {}", result_text(payload)),
        ToolInvocationResult::Failure { kind, message } => {
            format!("ERROR ({kind}): {}", single_line(message))
        }
    };
    format!("{}\n{outcome}", exchange.request)
}

/// Text shown to the model for a successful call payload.
///
/// Prefers `structuredContent`, then the text content blocks, then the whole
/// payload as compact JSON.
pub fn result_text(payload: &Value) -> String {
    if let Some(structured) = payload.get("structuredContent").filter(|v| !v.is_null()) {
        return structured.to_string();
    }
    if let Some(text) = text_content(payload) {
        return single_line(&text);
    }
    match payload {
        Value::String(text) => single_line(text),
        other => other.to_string(),
    }
}

fn single_line(text: &str) -> String {
    text.trim()
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
