//! Tool System
//!
//! Tools are registered once at start-up and shared read-only by every
//! conversation. The agent loop invokes them by name through
//! [`ToolRegistry::execute`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use crate::error::{AgentError, Result};

/// Tool call request from the LLM, in canonical form
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Tool identifier
    pub name: String,

    /// Arguments as key-value pairs
    #[serde(default)]
    pub arguments: Map<String, Value>,

    /// Optional call ID for tracking
    #[serde(default)]
    pub id: Option<String>,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            arguments,
            id: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Argument lookup that treats JSON `null` as absent
    pub fn arg(&self, name: &str) -> Option<&Value> {
        self.arguments.get(name).filter(|v| !v.is_null())
    }

    pub fn str_arg(&self, name: &str) -> Option<&str> {
        self.arg(name).and_then(Value::as_str)
    }
}

/// Result from tool execution.
///
/// `name` is always the tool that was actually invoked, so the result can be
/// paired back to its call when it is delivered to the model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Tool that was called
    pub name: String,

    /// Call ID (if provided in request)
    pub id: Option<String>,

    /// Whether execution succeeded
    pub success: bool,

    /// Raw JSON result, or `{"error": ...}` on failure
    pub data: Value,
}

impl ToolResult {
    pub fn success(name: impl Into<String>, data: Value) -> Self {
        Self {
            name: name.into(),
            id: None,
            success: true,
            data,
        }
    }

    pub fn failure(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            success: false,
            data: json!({ "error": error.into() }),
        }
    }

    pub fn with_id(mut self, id: Option<String>) -> Self {
        self.id = id;
        self
    }

    pub fn error_message(&self) -> Option<&str> {
        if self.success {
            None
        } else {
            self.data.get("error").and_then(Value::as_str)
        }
    }
}

/// Parameter definition for tool schema
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParameterSchema {
    /// Parameter name
    pub name: String,

    /// JSON Schema type (string, number, boolean, object, array)
    #[serde(rename = "type")]
    pub param_type: String,

    /// Human-readable description
    pub description: String,

    /// Whether this parameter is required
    #[serde(default)]
    pub required: bool,

    /// Default value if not provided
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Enum of allowed values
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,

    /// Element schema for array parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Value>,
}

impl ParameterSchema {
    pub fn required(
        name: impl Into<String>,
        param_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            param_type: param_type.into(),
            description: description.into(),
            required: true,
            default: None,
            enum_values: None,
            items: None,
        }
    }

    pub fn optional(
        name: impl Into<String>,
        param_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            required: false,
            ..Self::required(name, param_type, description)
        }
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_enum(mut self, values: Vec<Value>) -> Self {
        self.enum_values = Some(values);
        self
    }

    pub fn with_items(mut self, items: Value) -> Self {
        self.items = Some(items);
        self
    }

    fn to_json_schema(&self) -> Value {
        let mut prop = Map::new();
        prop.insert("type".into(), json!(self.param_type));
        prop.insert("description".into(), json!(self.description));
        if let Some(values) = &self.enum_values {
            prop.insert("enum".into(), Value::Array(values.clone()));
        }
        if self.param_type == "array" {
            let items = self.items.clone().unwrap_or_else(|| json!({ "type": "string" }));
            prop.insert("items".into(), items);
        }
        Value::Object(prop)
    }
}

/// Tool definition schema (for LLM function calling)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Unique tool identifier
    pub name: String,

    /// Human-readable description (shown to LLM)
    pub description: String,

    /// Parameter definitions, in declaration order
    pub parameters: Vec<ParameterSchema>,

    /// Category for grouping
    #[serde(default)]
    pub category: Option<String>,

    /// Whether tool has side effects
    #[serde(default)]
    pub has_side_effects: bool,
}

impl ToolSchema {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
            category: None,
            has_side_effects: false,
        }
    }

    pub fn param(mut self, param: ParameterSchema) -> Self {
        self.parameters.push(param);
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn side_effects(mut self) -> Self {
        self.has_side_effects = true;
        self
    }

    /// JSON Schema object describing the parameters
    pub fn parameters_json_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .parameters
            .iter()
            .map(|p| (p.name.clone(), p.to_json_schema()))
            .collect();
        let required: Vec<&str> = self
            .parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

/// Tool trait - implement to add new capabilities
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool's schema for LLM function calling
    fn schema(&self) -> ToolSchema;

    /// Execute the tool with given arguments, returning its raw JSON result
    async fn execute(&self, call: &ToolCall) -> Result<Value>;

    /// Validate arguments before execution.
    ///
    /// Required parameters are checked in declaration order and the first
    /// missing one is reported.
    fn validate(&self, call: &ToolCall) -> Result<()> {
        let schema = self.schema();

        for param in &schema.parameters {
            if param.required && call.arg(&param.name).is_none() {
                return Err(AgentError::MissingParameter {
                    tool: schema.name.clone(),
                    parameter: param.name.clone(),
                });
            }
        }

        Ok(())
    }
}

/// Tool backed by an async closure
pub struct FnTool<F> {
    schema: ToolSchema,
    executor: F,
}

impl<F> FnTool<F> {
    pub fn new(schema: ToolSchema, executor: F) -> Self {
        Self { schema, executor }
    }
}

#[async_trait]
impl<F, Fut> Tool for FnTool<F>
where
    F: Fn(Map<String, Value>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value>> + Send,
{
    fn schema(&self) -> ToolSchema {
        self.schema.clone()
    }

    async fn execute(&self, call: &ToolCall) -> Result<Value> {
        (self.executor)(call.arguments.clone()).await
    }
}

/// Registry for available tools
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    order: Vec<String>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Register a new tool
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        self.register_boxed(Arc::new(tool));
    }

    /// Register a boxed tool
    pub fn register_boxed(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.schema().name;
        if self.tools.insert(name.clone(), tool).is_some() {
            tracing::warn!(tool = %name, "Tool registered twice, keeping the latest");
        } else {
            self.order.push(name);
        }
    }

    /// Register an async closure as a tool
    pub fn register_fn<F, Fut>(&mut self, schema: ToolSchema, executor: F)
    where
        F: Fn(Map<String, Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        self.register(FnTool::new(schema, executor));
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Resolve a tool by name, failing if it is not registered
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn Tool>> {
        self.get(name)
            .ok_or_else(|| AgentError::ToolNotFound(name.to_string()))
    }

    /// Execute a tool call. Validation runs before the executor; no retries.
    pub async fn execute(&self, call: &ToolCall) -> Result<Value> {
        let tool = self.resolve(&call.name)?;

        tool.validate(call)?;

        tool.execute(call).await
    }

    /// Get all tool schemas, in registration order
    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|t| t.schema())
            .collect()
    }

    /// Get tool names, in registration order
    pub fn names(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Generate system prompt section describing available tools
    pub fn generate_prompt_section(&self) -> String {
        let mut prompt = String::from("## Available Tools\n\n");
        prompt.push_str("To use a tool, respond with a single JSON block in this exact format:\n\n");
        prompt.push_str(
            "```json\n{\"thoughts\": \"why\", \"payload\": {\"function_call\": {\"name\": \"tool_name\", \"arguments\": {\"arg\": \"value\"}}}}\n```\n\n",
        );
        prompt.push_str("When you are ready to answer, respond with:\n\n");
        prompt.push_str("```json\n{\"thoughts\": \"why\", \"payload\": {\"text\": \"your answer\"}}\n```\n\n");

        for schema in self.schemas() {
            prompt.push_str(&format!("### {}\n", schema.name));
            if let Some(category) = &schema.category {
                prompt.push_str(&format!("Category: {}\n", category));
            }
            prompt.push_str(&format!("{}\n", schema.description));

            if !schema.parameters.is_empty() {
                prompt.push_str("**Parameters:**\n");
                for param in &schema.parameters {
                    let required = if param.required { " (required)" } else { "" };
                    prompt.push_str(&format!(
                        "- `{}` ({}){}: {}\n",
                        param.name, param.param_type, required, param.description
                    ));
                }
            }
            prompt.push('\n');
        }

        prompt
    }
}
