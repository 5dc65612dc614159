// End-to-end runs of the orchestration loop over the public API
//
// A scripted model drives the loop against in-process tool providers.

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use toolloop_core::application::registry::builtin_provider;
use toolloop_core::config::AppConfig;
use toolloop_core::infrastructure::model::clients::BlockingModelClient;
use toolloop_core::{
    AgentError, AgentOptions, LocalProvider, ModelClient, ModelError, ModelGateway,
    Orchestrator, PromptCompiler, ToolInvocationResult, ToolRegistryClient,
};

struct Script {
    replies: Mutex<Vec<String>>,
    prompts: Mutex<Vec<String>>,
}

impl Script {
    fn new(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().map(|reply| reply.to_string()).collect()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("lock").clone()
    }
}

#[async_trait]
impl ModelClient for Script {
    fn id(&self) -> &str {
        "script"
    }

    async fn generate_content(&self, prompt: String) -> Result<String, ModelError> {
        self.prompts.lock().expect("lock").push(prompt);
        let mut replies = self.replies.lock().expect("lock");
        if replies.is_empty() {
            return Err(ModelError::generator("script", "no reply left"));
        }
        Ok(replies.remove(0))
    }
}

fn build(
    provider: LocalProvider,
    model: Arc<dyn ModelClient>,
    timeout: Duration,
    max_steps: usize,
) -> Orchestrator {
    let registry = ToolRegistryClient::new(Arc::new(provider), Duration::from_secs(1));
    Orchestrator::new(
        Arc::new(registry),
        ModelGateway::new(model, timeout),
        PromptCompiler::default(),
        AgentOptions { max_steps },
    )
}

#[tokio::test]
async fn product_details_question_is_answered_after_one_lookup() {
    let script = Script::new(&[
        "FUNCTION_CALL: obtain_product_from_db|product_id=2",
        "FINAL_ANSWER: Coffee Mug, Kitchen, 12.5",
    ]);
    let agent = build(builtin_provider(), script.clone(), Duration::from_secs(1), 8);
    agent.connect().await.expect("builtin registry connects");

    let outcome = agent
        .run("Show me the details of the product with ID 2")
        .await
        .expect("loop finishes");

    assert_eq!(outcome.answer, "Coffee Mug, Kitchen, 12.5");
    assert_eq!(outcome.steps.len(), 1);
    assert_eq!(
        outcome.steps[0].request.to_string(),
        "FUNCTION_CALL: obtain_product_from_db|product_id=2"
    );
    let prompts = script.prompts();
    assert!(prompts[1].contains("\"name\":\"Coffee Mug\""));
}

#[tokio::test]
async fn arithmetic_chain_uses_previous_results() {
    let script = Script::new(&[
        "FUNCTION_CALL: add|a=23|b=7",
        "FUNCTION_CALL: subtract|a=15|b=8",
        "FUNCTION_CALL: multiply|a=30|b=7",
        "FINAL_ANSWER: 210",
    ]);
    let agent = build(builtin_provider(), script.clone(), Duration::from_secs(1), 8);

    let outcome = agent.run("(23 + 7) * (15 - 8)").await.expect("loop finishes");

    assert_eq!(outcome.answer, "210");
    let results: Vec<Value> = outcome
        .steps
        .iter()
        .map(|step| match &step.result {
            ToolInvocationResult::Success(payload) => payload["structuredContent"]["result"].clone(),
            other => panic!("unexpected failure {other:?}"),
        })
        .collect();
    assert_eq!(results, [json!(30), json!(7), json!(210)]);

    let last_prompt = script.prompts().pop().expect("prompt");
    let add = last_prompt.find("FUNCTION_CALL: add|a=23|b=7").expect("add");
    let multiply = last_prompt
        .find("FUNCTION_CALL: multiply|a=30|b=7")
        .expect("multiply");
    assert!(add < multiply);
}

#[tokio::test]
async fn custom_capability_table_receives_aligned_arguments() {
    let seen: Arc<Mutex<Option<Map<String, Value>>>> = Arc::new(Mutex::new(None));
    let recorder = Arc::clone(&seen);
    let provider = LocalProvider::new("custom").register(
        "lookup_sku",
        "Find a SKU by code",
        json!({
            "type": "object",
            "properties": {
                "code": {"type": "string"},
                "exact": {"type": "boolean"},
                "note": {"type": "string"}
            }
        }),
        move |args: Map<String, Value>| {
            let recorder = Arc::clone(&recorder);
            async move {
                *recorder.lock().expect("lock") = Some(args);
                Ok::<_, String>(json!({"sku": "00042", "stock": 3}))
            }
        },
    );
    let script = Script::new(&[
        "FUNCTION_CALL: lookup_sku|code=00042|exact=true|note=null",
        "FINAL_ANSWER: 3 in stock",
    ]);
    let agent = build(provider, script, Duration::from_secs(1), 8);

    let outcome = agent.run("How many of SKU 42?").await.expect("loop finishes");
    assert_eq!(outcome.answer, "3 in stock");
    assert_eq!(
        outcome.steps[0].request.to_string(),
        "FUNCTION_CALL: lookup_sku|code=00042|exact=true|note=null"
    );

    let args = seen.lock().expect("lock").clone().expect("tool was called");
    assert_eq!(args.get("code"), Some(&json!("00042")));
    assert_eq!(args.get("exact"), Some(&json!(true)));
    assert!(!args.contains_key("note"));
}

#[tokio::test]
async fn slow_blocking_model_fails_with_timeout() {
    let model = BlockingModelClient::new("slow", |_: &str| {
        std::thread::sleep(Duration::from_millis(500));
        Ok("FINAL_ANSWER: too late".to_string())
    });
    let agent = build(
        builtin_provider(),
        Arc::new(model),
        Duration::from_millis(20),
        8,
    );

    let err = agent.run("anything").await.expect_err("timeout");
    assert_eq!(err.kind(), "Timeout");
    assert!(matches!(err, AgentError::Gateway(_)));
}

#[tokio::test]
async fn builtin_transport_wires_from_config() {
    let config = AppConfig::from_toml_str(
        r#"
[model]
provider = "ollama"
model = "llama3.2"

[registry]
transport = "builtin"
"#,
    )
    .expect("config");
    let agent = Orchestrator::from_config(&config).expect("orchestrator");
    agent.connect().await.expect("builtin registry connects");

    let prompt = agent
        .initial_prompt("Show me the details of the product with ID 2")
        .await
        .expect("prompt");
    assert!(prompt.contains("divide: a: integer, b: integer - Divides a by b"));
    assert!(prompt.ends_with("User Question: Show me the details of the product with ID 2"));
}
