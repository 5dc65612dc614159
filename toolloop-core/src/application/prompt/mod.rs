//! Prompt Compiler
//!
//! Pure functions from (tools, history, question) to the full prompt text.
//! The output depends only on the inputs, so two compilations of the same
//! state are byte-identical.

pub mod render;

pub use render::{result_text, tool_block, tool_line};

use crate::config::PromptSettings;
use crate::domain::types::{
    FINAL_ANSWER_PREFIX, FUNCTION_CALL_PREFIX, ToolDescriptor, ToolExchange,
};

/// Opening line of the instruction block.
pub const DEFAULT_ROLE: &str =
    "You are a deterministic tool-using agent. You never guess facts or compute results yourself; you call tools.";

/// Worked example appended after the rules.
pub const DEFAULT_FEW_SHOT: &str = "\
### Example of correct tool use

User asks:
\"Compute (10 + 5) * (4 - 1)\"

Correct behavior:
FUNCTION_CALL: add|a=10|b=5
RESULT: 15
FUNCTION_CALL: subtract|a=4|b=1
RESULT: 3
FUNCTION_CALL: multiply|a=15|b=3
RESULT: 45
FINAL_ANSWER: 45";

#[derive(Debug, Clone, Default)]
pub struct PromptCompiler {
    settings: PromptSettings,
}

impl PromptCompiler {
    pub fn new(settings: PromptSettings) -> Self {
        Self { settings }
    }

    /// Full prompt: rules, tool block, example, history, question.
    pub fn compile(
        &self,
        tools: &[ToolDescriptor],
        history: &[ToolExchange],
        question: &str,
    ) -> String {
        let mut sections = vec![self.instructions(tools), self.settings.few_shot.clone()];

        if !history.is_empty() {
            let lines: Vec<String> = history.iter().map(render::exchange_lines).collect();
            sections.push(format!(
                "Calls made so far for this question:\n{}",
                lines.join("\n")
            ));
        }

        sections.push(format!(
            "Now answer the new question below using the same pattern.\nUser Question: {}",
            question.trim()
        ));
        sections.join("\n\n")
    }

    /// Role line, the tool block, and the output rules.
    pub fn instructions(&self, tools: &[ToolDescriptor]) -> String {
        let tool_block = if tools.is_empty() {
            "(no tools are currently available)".to_string()
        } else {
            render::tool_block(tools)
        };

        format!(
            "{role}

TOOLS AVAILABLE:
{tool_block}

Your output must ALWAYS be exactly one of these two lines:

1) When calling a tool:
{FUNCTION_CALL_PREFIX} tool_name|param=value|param=value

2) When you are done:
{FINAL_ANSWER_PREFIX} your answer

STRICT RULES:
- Use only the tools listed above, with their parameter names.
- Write null for a parameter you want to leave empty.
- NO natural language before or after the line.
- NO code blocks.
- NO backticks.
- NO alternative formats.
- ONLY the single exact line you are asked for.",
            role = self.settings.role,
        )
    }
}

/// Compiles with the default role and example.
pub fn compile(tools: &[ToolDescriptor], history: &[ToolExchange], question: &str) -> String {
    PromptCompiler::default().compile(tools, history, question)
}
