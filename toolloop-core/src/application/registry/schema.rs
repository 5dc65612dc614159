//! Reducing JSON Schema input definitions to prompt-sized labels, and
//! aligning parsed scalars with the declared parameter types.

use serde_json::{Map, Value};

use crate::domain::types::{Argument, Arguments, ToolParameter};

const ANY: &str = "any";

/// Parameters of an `inputSchema`, in declaration order.
pub fn describe_parameters(schema: &Value) -> Vec<ToolParameter> {
    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return Vec::new();
    };
    let required: Vec<&str> = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    properties
        .iter()
        .map(|(name, property)| ToolParameter {
            name: name.clone(),
            type_label: type_label(property),
            required: required.contains(&name.as_str()),
        })
        .collect()
}

/// Human label for one property schema. Never fails.
pub fn type_label(schema: &Value) -> String {
    let Some(object) = schema.as_object() else {
        return ANY.to_string();
    };

    match object.get("type") {
        Some(Value::String(kind)) => return kind.clone(),
        Some(Value::Array(kinds)) => {
            let names: Vec<&str> = kinds
                .iter()
                .filter_map(Value::as_str)
                .filter(|kind| *kind != "null")
                .collect();
            if !names.is_empty() {
                return names.join(" | ");
            }
        }
        _ => {}
    }

    for combinator in ["anyOf", "oneOf"] {
        if let Some(members) = object.get(combinator).and_then(Value::as_array) {
            let mut labels: Vec<String> = Vec::new();
            for member in members {
                if member.get("type").and_then(Value::as_str) == Some("null") {
                    continue;
                }
                let label = type_label(member);
                if !labels.contains(&label) {
                    labels.push(label);
                }
            }
            if !labels.is_empty() {
                return labels.join(" | ");
            }
        }
    }

    if object.contains_key("$ref") || object.contains_key("properties") {
        "object".to_string()
    } else if object.contains_key("items") {
        "array".to_string()
    } else if object.contains_key("enum") {
        "string".to_string()
    } else {
        ANY.to_string()
    }
}

/// Converts parsed arguments into the JSON object sent to the provider.
///
/// Absent (`null`) arguments are dropped. A number given for a `string`
/// parameter is sent as the token the model wrote, and `true`/`false` text
/// for a `boolean` parameter is sent as a JSON bool. Everything else passes
/// through as parsed.
pub fn align_arguments(arguments: &Arguments, schema: &Value) -> Map<String, Value> {
    let properties = schema.get("properties").and_then(Value::as_object);
    arguments
        .iter()
        .filter(|(_, argument)| !argument.value.is_null())
        .map(|(name, argument)| {
            let declared = properties
                .and_then(|props| props.get(name))
                .map(type_label)
                .unwrap_or_else(|| ANY.to_string());
            (name.to_string(), align_value(argument, &declared))
        })
        .collect()
}

fn align_value(argument: &Argument, declared: &str) -> Value {
    let value = &argument.value;
    match (declared, value) {
        ("string", Value::Number(_)) => Value::String(argument.text.clone()),
        ("boolean", Value::String(text)) => match text.as_str() {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => value.clone(),
        },
        _ => value.clone(),
    }
}
