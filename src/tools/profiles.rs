use super::{CallContext, Params, ToolOutput};
use crate::errors::AppResult;
use serde_json::json;

pub async fn list_aws_profiles(ctx: &CallContext, _params: Params<'_>) -> AppResult<ToolOutput> {
    let profiles = ctx.profiles.discover()?;
    Ok(ToolOutput::data(json!({ "profiles": profiles, "active": ctx.profiles.active() })))
}

pub async fn set_profile(ctx: &CallContext, params: Params<'_>) -> AppResult<ToolOutput> {
    let name = params.str("profile_name")?;
    ctx.profiles.set(name)?;
    tracing::info!(profile = name, "active profile changed");
    Ok(ToolOutput::done(format!("AWS profile set to {name}"), json!({ "profile_name": name })))
}
