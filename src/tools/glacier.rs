//! Archival vault tools.

use super::{format::Timestamp, CallContext, Params, ToolOutput};
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

const GLACIER: &str = "glacier";
/// The provider's shorthand for "the account owning the credentials".
const OWN_ACCOUNT: &str = "-";
const JOB_TYPES: [&str; 2] = ["inventory-retrieval", "archive-retrieval"];

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct ListVaultsOutput {
    vault_list: Vec<Vault>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "snake_case", deserialize = "PascalCase"), default)]
struct Vault {
    #[serde(rename(deserialize = "VaultName", serialize = "name"))]
    name: String,
    #[serde(rename(deserialize = "VaultARN", serialize = "arn"))]
    arn: String,
    #[serde(rename(deserialize = "SizeInBytes", serialize = "size_bytes"))]
    size_bytes: i64,
    number_of_archives: i64,
    creation_date: Timestamp,
    last_inventory_date: Timestamp,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct ListJobsOutput {
    job_list: Vec<Job>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "snake_case", deserialize = "PascalCase"), default)]
struct Job {
    #[serde(rename(deserialize = "JobId", serialize = "id"))]
    id: String,
    #[serde(rename(deserialize = "Action", serialize = "type"))]
    kind: String,
    #[serde(rename(deserialize = "StatusCode", serialize = "status"))]
    status: String,
    creation_date: Timestamp,
    completion_date: Timestamp,
    completed: bool,
    #[serde(rename(deserialize = "JobDescription", serialize = "description"))]
    description: String,
}

fn vault_input(vault: &str) -> Value {
    json!({ "accountId": OWN_ACCOUNT, "vaultName": vault })
}

async fn vaults(ctx: &CallContext) -> AppResult<Vec<Vault>> {
    let out: ListVaultsOutput = ctx.invoke(GLACIER, "list-vaults", json!({ "accountId": OWN_ACCOUNT })).await?;
    Ok(out.vault_list)
}

pub async fn list_vaults(ctx: &CallContext, _params: Params<'_>) -> AppResult<ToolOutput> {
    Ok(ToolOutput::data(json!({ "vaults": vaults(ctx).await? })))
}

/// Deep Archive retrievals go through the same vault API.
pub async fn list_deep_archive_vaults(ctx: &CallContext, _params: Params<'_>) -> AppResult<ToolOutput> {
    Ok(ToolOutput::data(json!({ "vaults": vaults(ctx).await?, "storage_class": "DEEP_ARCHIVE" })))
}

pub async fn create_vault(ctx: &CallContext, params: Params<'_>) -> AppResult<ToolOutput> {
    let vault = params.str("vault_name")?;
    params.confirm("create", "Glacier vault", vault)?;
    let out: Value = ctx.invoke(GLACIER, "create-vault", vault_input(vault)).await?;
    let location = out.get("location").and_then(Value::as_str).unwrap_or_default();
    Ok(ToolOutput::done(
        format!("Glacier vault {vault} created successfully"),
        json!({ "vault_name": vault, "location": location }),
    ))
}

pub async fn delete_vault(ctx: &CallContext, params: Params<'_>) -> AppResult<ToolOutput> {
    let vault = params.str("vault_name")?;
    params.confirm("delete", "Glacier vault", vault)?;
    ctx.send(ctx.request(GLACIER, "delete-vault", vault_input(vault))).await?;
    Ok(ToolOutput::done(format!("Glacier vault {vault} deleted successfully"), json!({ "vault_name": vault })))
}

pub async fn describe_vault(ctx: &CallContext, params: Params<'_>) -> AppResult<ToolOutput> {
    let vault = params.str("vault_name")?;
    let info: Vault = ctx.invoke(GLACIER, "describe-vault", vault_input(vault)).await?;
    Ok(ToolOutput::data(json!({ "vault": info })))
}

pub async fn initiate_job(ctx: &CallContext, params: Params<'_>) -> AppResult<ToolOutput> {
    let vault = params.str("vault_name")?;
    let job_type = params.str("job_type")?;
    if !JOB_TYPES.contains(&job_type) {
        return Err(AppError::invalid("job_type", format!("expected one of {}", JOB_TYPES.join(", "))));
    }
    let archive_id = params.opt_str("archive_id")?;
    if job_type == "archive-retrieval" && archive_id.is_none() {
        return Err(AppError::MissingParameter("archive_id".into()));
    }
    let description = params.opt_str("description")?.unwrap_or_default();
    params.confirm("start", "Glacier job", format!("{job_type} on {vault}"))?;

    let mut job = json!({ "Type": job_type, "Description": description });
    if let Some(archive_id) = archive_id {
        job["ArchiveId"] = Value::from(archive_id);
    }
    let mut input = vault_input(vault);
    input["jobParameters"] = job;
    let out: Value = ctx.invoke(GLACIER, "initiate-job", input).await?;
    let job_id = out.get("jobId").and_then(Value::as_str).unwrap_or_default();
    Ok(ToolOutput::done(
        format!("Glacier job {job_id} initiated successfully"),
        json!({ "job_id": job_id, "vault_name": vault, "job_type": job_type }),
    ))
}

pub async fn list_jobs(ctx: &CallContext, params: Params<'_>) -> AppResult<ToolOutput> {
    let vault = params.str("vault_name")?;
    let out: ListJobsOutput = ctx.invoke(GLACIER, "list-jobs", vault_input(vault)).await?;
    Ok(ToolOutput::data(json!({ "jobs": out.job_list })))
}
