use super::types::{ToolDefinition, ToolRequest, ToolResponse};
use crate::{
    config::Config,
    errors::{AppError, AppResult},
    profiles::ProfileStore,
    provider::DynCloudApi,
    tools::{CallContext, Params, ToolId, ToolOutput},
};
use futures::FutureExt;
use std::{panic::AssertUnwindSafe, sync::Arc, time::Instant};
use tracing::{field, Instrument, Span};

/// Parameter that pins a single call to a profile without changing the active one.
pub const PROFILE_OVERRIDE: &str = "profile_name";

pub struct ToolRegistry {
    definitions: Vec<(ToolId, ToolDefinition)>,
    api: DynCloudApi,
    profiles: Arc<ProfileStore>,
    region: String,
    max_inline_bytes: u64,
}

impl ToolRegistry {
    pub fn new(cfg: &Config, api: DynCloudApi, profiles: Arc<ProfileStore>) -> Self {
        let mut definitions: Vec<_> = ToolId::ALL.iter().map(|id| (*id, id.definition())).collect();
        definitions.sort_by(|a, b| a.1.name.cmp(&b.1.name));
        Self {
            definitions,
            api,
            profiles,
            region: cfg.aws.region.clone(),
            max_inline_bytes: cfg.limits.max_inline_object_kb.saturating_mul(1024),
        }
    }

    pub fn get(&self, name: &str) -> Option<(ToolId, &ToolDefinition)> {
        let id = ToolId::from_name(name)?;
        self.definitions.iter().find(|(i, _)| *i == id).map(|(i, d)| (*i, d))
    }

    pub fn definitions(&self) -> impl Iterator<Item = &ToolDefinition> {
        self.definitions.iter().map(|(_, d)| d)
    }

    pub fn list_names(&self) -> Vec<&str> {
        self.definitions().map(|d| d.name.as_str()).collect()
    }

    /// Routes one request and folds every failure into the error envelope.
    pub async fn dispatch(&self, req: ToolRequest) -> ToolResponse {
        let started = Instant::now();
        let request_id = uuid::Uuid::new_v4().to_string();
        let span = tracing::info_span!("dispatch", request_id = %request_id, tool = %req.tool_name, profile = field::Empty);
        let result = self.run(&req).instrument(span.clone()).await;
        let duration_ms = started.elapsed().as_millis() as u64;
        span.in_scope(|| match result {
            Ok(out) => {
                audit_end(&request_id, &req.tool_name, "success", "OK", duration_ms);
                ToolResponse::success(out.message, Some(out.data))
            }
            Err(e) => {
                if matches!(e, AppError::Internal(_)) {
                    tracing::error!(error = %e, "tool failed");
                }
                audit_end(&request_id, &req.tool_name, "error", e.code(), duration_ms);
                ToolResponse::error(e.to_string())
            }
        })
    }

    async fn run(&self, req: &ToolRequest) -> AppResult<ToolOutput> {
        let (id, def) = self
            .get(&req.tool_name)
            .ok_or_else(|| AppError::UnknownTool(req.tool_name.clone()))?;
        validate_required(def, &req.parameters)?;
        let params = Params(&req.parameters);

        let requested = match id {
            ToolId::SetProfile => None,
            _ => params.opt_str(PROFILE_OVERRIDE)?,
        };
        let ctx = CallContext {
            profile: self.profiles.resolve(requested)?,
            region: self.region.clone(),
            api: self.api.clone(),
            profiles: self.profiles.clone(),
            max_inline_bytes: self.max_inline_bytes,
        };
        if let Some(p) = &ctx.profile {
            Span::current().record("profile", p.as_str());
        }

        match AssertUnwindSafe(id.execute(&ctx, params)).catch_unwind().await {
            Ok(result) => result,
            Err(_) => Err(AppError::Internal(format!("{} aborted unexpectedly", id.name()))),
        }
    }
}

/// First required parameter (in declaration order) that is absent or blank.
pub fn validate_required(def: &ToolDefinition, params: &serde_json::Map<String, serde_json::Value>) -> AppResult<()> {
    match def.required().find(|name| Params::is_blank(params.get(*name))) {
        Some(name) => Err(AppError::MissingParameter(name.to_string())),
        None => Ok(()),
    }
}

fn audit_end(request_id: &str, tool: &str, decision: &str, code: &str, duration_ms: u64) {
    tracing::info!(
        request_id = request_id,
        tool = tool,
        decision = decision,
        code = code,
        duration_ms = duration_ms,
        "audit"
    );
}
