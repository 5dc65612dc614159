use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Literal prefix of a tool invocation line.
pub const FUNCTION_CALL_PREFIX: &str = "FUNCTION_CALL:";

/// Literal prefix of a terminating answer line.
pub const FINAL_ANSWER_PREFIX: &str = "FINAL_ANSWER:";

/// Token that stands for an absent argument value.
pub const NULL_TOKEN: &str = "null";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolParameter {
    pub name: String,
    pub type_label: String,
    pub required: bool,
}

/// Metadata advertised by the registry for one tool, reduced for prompting.
///
/// Rebuilt on every listing and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDescriptor {
    pub name: String,
    /// First line of the provider description.
    pub short_description: String,
    /// Parameters in the order the provider declared them.
    pub parameters: Vec<ToolParameter>,
    #[serde(skip)]
    pub input_schema: Value,
}

/// One argument as the model wrote it: the scalar it was read as and the
/// literal token it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub value: Value,
    pub text: String,
}

/// Ordered keyword arguments of a tool invocation.
///
/// Values are always scalars (string, number, or null for "absent"). Each
/// keeps its source token so a call renders back exactly as written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments(Vec<(String, Argument)>);

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an argument whose token is the canonical text of `value`.
    /// Returns `false` and leaves the set untouched when the key is already
    /// present.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> bool {
        let text = scalar_text(&value);
        self.insert_token(key, value, text)
    }

    /// Appends an argument parsed from `text`.
    pub fn insert_token(
        &mut self,
        key: impl Into<String>,
        value: Value,
        text: impl Into<String>,
    ) -> bool {
        let key = key.into();
        if self.contains_key(&key) {
            return false;
        }
        self.0.push((
            key,
            Argument {
                value,
                text: text.into(),
            },
        ));
        true
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entry(key).map(|argument| &argument.value)
    }

    /// Source token of an argument.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.entry(key).map(|argument| argument.text.as_str())
    }

    fn entry(&self, key: &str) -> Option<&Argument> {
        self.0
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, argument)| argument)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.iter().any(|(name, _)| name == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Argument)> {
        self.0.iter().map(|(name, argument)| (name.as_str(), argument))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Arguments {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut arguments = Arguments::new();
        for (key, value) in iter {
            arguments.insert(key, value);
        }
        arguments
    }
}

/// A single tool call requested by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocationRequest {
    pub tool_name: String,
    pub arguments: Arguments,
}

impl ToolInvocationRequest {
    pub fn new(tool_name: impl Into<String>, arguments: Arguments) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments,
        }
    }
}

/// Renders the request back into its protocol line.
impl fmt::Display for ToolInvocationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{FUNCTION_CALL_PREFIX} {}", self.tool_name)?;
        for (key, argument) in self.arguments.iter() {
            write!(f, "|{key}={}", argument.text)?;
        }
        Ok(())
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => NULL_TOKEN.to_string(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Outcome of one dispatched tool call as seen by the model.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolInvocationResult {
    Success(Value),
    Failure { kind: &'static str, message: String },
}

impl ToolInvocationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ToolInvocationResult::Success(_))
    }
}

/// One (request, result) pair in the conversation history.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolExchange {
    pub request: ToolInvocationRequest,
    pub result: ToolInvocationResult,
}

/// Raw text returned by the model. Only the output parser interprets it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelOutput {
    pub raw_text: String,
}

impl ModelOutput {
    pub fn new(raw_text: impl Into<String>) -> Self {
        Self {
            raw_text: raw_text.into(),
        }
    }
}
