//! Output Parser for the two-line textual protocol.
//!
//! Classification is strictly by case-sensitive prefix of the trimmed text:
//! `FUNCTION_CALL:` then `FINAL_ANSWER:`, anything else is unrecognized.

use serde_json::{Number, Value};
use thiserror::Error;

use super::directive::AgentDirective;
use crate::domain::types::{
    Arguments, FINAL_ANSWER_PREFIX, FUNCTION_CALL_PREFIX, ModelOutput, NULL_TOKEN,
    ToolInvocationRequest,
};

const EXCERPT_CHARS: usize = 80;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("malformed FUNCTION_CALL: {reason}")]
    MalformedCall { reason: String },
    #[error("output matches neither FUNCTION_CALL nor FINAL_ANSWER: {excerpt:?}")]
    Unrecognized { excerpt: String },
}

impl ParseError {
    fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedCall {
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ParseError::MalformedCall { .. } => "MalformedCallError",
            ParseError::Unrecognized { .. } => "UnrecognizedOutputError",
        }
    }
}

pub fn parse_output(output: &ModelOutput) -> Result<AgentDirective, ParseError> {
    parse_text(&output.raw_text)
}

pub fn parse_text(raw: &str) -> Result<AgentDirective, ParseError> {
    let text = raw.trim();

    if let Some(call) = text.strip_prefix(FUNCTION_CALL_PREFIX) {
        return parse_call(call).map(AgentDirective::CallTool);
    }

    if let Some(answer) = text.strip_prefix(FINAL_ANSWER_PREFIX) {
        return Ok(AgentDirective::Final {
            answer: answer.trim().to_string(),
        });
    }

    Err(ParseError::Unrecognized {
        excerpt: text.chars().take(EXCERPT_CHARS).collect(),
    })
}

fn parse_call(call: &str) -> Result<ToolInvocationRequest, ParseError> {
    if call.contains('\n') {
        return Err(ParseError::malformed("call spans more than one line"));
    }

    let mut segments = call.split('|');
    let tool_name = segments.next().unwrap_or_default().trim();
    if tool_name.is_empty() {
        return Err(ParseError::malformed("tool name is empty"));
    }

    let mut arguments = Arguments::new();
    for segment in segments {
        let Some((key, value)) = segment.split_once('=') else {
            return Err(ParseError::malformed(format!(
                "argument '{}' is not of the form name=value",
                segment.trim()
            )));
        };
        let key = key.trim();
        if key.is_empty() {
            return Err(ParseError::malformed("argument name is empty"));
        }
        let token = value.trim();
        if !arguments.insert_token(key, scalar(token), token) {
            return Err(ParseError::malformed(format!(
                "argument '{key}' is given more than once"
            )));
        }
    }

    Ok(ToolInvocationRequest::new(tool_name, arguments))
}

/// `null` is absent, numeric text is a number, everything else a string.
fn scalar(text: &str) -> Value {
    if text == NULL_TOKEN {
        return Value::Null;
    }
    if let Ok(integer) = text.parse::<i64>() {
        return Value::Number(integer.into());
    }
    if let Some(number) = text
        .parse::<f64>()
        .ok()
        .filter(|float| float.is_finite())
        .and_then(Number::from_f64)
    {
        return Value::Number(number);
    }
    Value::String(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call(text: &str) -> ToolInvocationRequest {
        match parse_text(text) {
            Ok(AgentDirective::CallTool(request)) => request,
            other => panic!("expected tool call, got {other:?}"),
        }
    }

    #[test]
    fn parses_function_call_with_numbers() {
        let request = call("FUNCTION_CALL: t|a=1|b=2");
        assert_eq!(request.tool_name, "t");
        assert_eq!(request.arguments.get("a"), Some(&json!(1)));
        assert_eq!(request.arguments.get("b"), Some(&json!(2)));
        assert_eq!(request.arguments.len(), 2);
    }

    #[test]
    fn parses_strings_nulls_and_floats() {
        let request = call(
            "  FUNCTION_CALL: create_product|name= Hucco ice-cream |price=100.5|category=Diary|description=null\n",
        );
        assert_eq!(request.tool_name, "create_product");
        assert_eq!(request.arguments.get("name"), Some(&json!("Hucco ice-cream")));
        assert_eq!(request.arguments.get("price"), Some(&json!(100.5)));
        assert_eq!(request.arguments.get("category"), Some(&json!("Diary")));
        assert_eq!(request.arguments.get("description"), Some(&Value::Null));
    }

    #[test]
    fn non_finite_and_empty_values_stay_strings() {
        let request = call("FUNCTION_CALL: t|a=inf|b=NaN|c=");
        assert_eq!(request.arguments.get("a"), Some(&json!("inf")));
        assert_eq!(request.arguments.get("b"), Some(&json!("NaN")));
        assert_eq!(request.arguments.get("c"), Some(&json!("")));
    }

    #[test]
    fn call_without_arguments_is_valid() {
        let request = call("FUNCTION_CALL: health");
        assert_eq!(request.tool_name, "health");
        assert!(request.arguments.is_empty());
    }

    #[test]
    fn final_answer_is_trimmed_and_may_be_empty() {
        assert_eq!(
            parse_text("FINAL_ANSWER:   210  "),
            Ok(AgentDirective::Final {
                answer: "210".into()
            })
        );
        assert_eq!(
            parse_text("FINAL_ANSWER:"),
            Ok(AgentDirective::Final {
                answer: String::new()
            })
        );
    }

    #[test]
    fn malformed_calls_are_rejected() {
        for text in [
            "FUNCTION_CALL: |a=1",
            "FUNCTION_CALL: t|a",
            "FUNCTION_CALL: t|=1",
            "FUNCTION_CALL: t|a=1|a=2",
            "FUNCTION_CALL: t|a=1\nFUNCTION_CALL: t|a=2",
            "FUNCTION_CALL: t|a=1|",
        ] {
            let err = parse_text(text).expect_err(text);
            assert_eq!(err.kind(), "MalformedCallError", "{text}");
        }
    }

    #[test]
    fn anything_else_is_unrecognized() {
        for text in [
            "The answer is 42",
            "function_call: t|a=1",
            "```\nFINAL_ANSWER: 42\n```",
            "Sure! FINAL_ANSWER: 42",
            "",
        ] {
            assert!(
                matches!(parse_text(text), Err(ParseError::Unrecognized { .. })),
                "{text}"
            );
        }
    }

    #[test]
    fn numeric_tokens_keep_their_source_text() {
        let request = call("FUNCTION_CALL: lookup|code=00042|big=12345678901234567890|exp=1e3|sign=+7");
        assert_eq!(request.arguments.get("code"), Some(&json!(42)));
        assert_eq!(request.arguments.text("code"), Some("00042"));
        assert_eq!(request.arguments.text("big"), Some("12345678901234567890"));
        assert_eq!(request.arguments.text("exp"), Some("1e3"));
        assert_eq!(request.arguments.text("sign"), Some("+7"));
        assert_eq!(
            request.to_string(),
            "FUNCTION_CALL: lookup|code=00042|big=12345678901234567890|exp=1e3|sign=+7"
        );
    }

    #[test]
    fn rendered_request_parses_back() {
        let request = call("FUNCTION_CALL: obtain_product_from_db|product_id=2");
        assert_eq!(call(&request.to_string()), request);
    }
}
