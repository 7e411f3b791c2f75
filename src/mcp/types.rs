use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use serde_with::skip_serializing_none;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Deserialize)]
pub struct ToolRequest {
    #[serde(alias = "action")]
    pub tool_name: String,
    #[serde(default, alias = "params")]
    pub parameters: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// Uniform reply for every invocation: errors carry only `message`.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResponse {
    pub status: Status,
    pub message: Option<String>,
    pub data: Option<Value>,
}

impl ToolResponse {
    pub fn success(message: Option<String>, data: Option<Value>) -> Self {
        Self { status: Status::Success, message, data }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self::success(Some(message.into()), None)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { status: Status::Error, message: Some(message.into()), data: None }
    }

    #[cfg(test)]
    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Integer,
    Boolean,
    Array,
    Object,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamSpec {
    #[serde(rename = "type")]
    pub ty: ParamType,
    pub description: String,
    #[serde(default = "default_required")]
    pub required: bool,
}
fn default_required() -> bool { true }

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// Declaration order is kept so validation reports the first missing parameter.
    pub parameters: Vec<(String, ParamSpec)>,
}

impl ToolDefinition {
    pub fn required(&self) -> impl Iterator<Item = &str> {
        self.parameters.iter().filter(|(_, p)| p.required).map(|(n, _)| n.as_str())
    }
}

/// Catalog entry as published on `/api`.
#[derive(Debug, Serialize)]
pub struct ToolInfo<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub parameters: BTreeMap<&'a str, &'a ParamSpec>,
}

impl<'a> From<&'a ToolDefinition> for ToolInfo<'a> {
    fn from(def: &'a ToolDefinition) -> Self {
        Self {
            name: &def.name,
            description: &def.description,
            parameters: def.parameters.iter().map(|(n, p)| (n.as_str(), p)).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiDocs<'a> {
    pub server: &'static str,
    pub version: &'static str,
    pub endpoints: BTreeMap<&'static str, &'static str>,
    pub supported_services: Vec<&'static str>,
    pub tools: Vec<ToolInfo<'a>>,
}
