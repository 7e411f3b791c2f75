//! Centralized backup inventory tools.

use super::{format::Timestamp, CallContext, Params, ToolOutput};
use crate::errors::AppResult;
use serde::{Deserialize, Serialize};
use serde_json::json;

const BACKUP: &str = "backup";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct ListVaultsOutput {
    backup_vault_list: Vec<BackupVault>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "snake_case", deserialize = "PascalCase"), default)]
struct BackupVault {
    #[serde(rename(deserialize = "BackupVaultName", serialize = "name"))]
    name: String,
    #[serde(rename(deserialize = "BackupVaultArn", serialize = "arn"))]
    arn: String,
    creation_date: Timestamp,
    number_of_recovery_points: i64,
    locked: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct ListPlansOutput {
    backup_plans_list: Vec<BackupPlan>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "snake_case", deserialize = "PascalCase"), default)]
struct BackupPlan {
    #[serde(rename(deserialize = "BackupPlanId", serialize = "id"))]
    id: String,
    #[serde(rename(deserialize = "BackupPlanName", serialize = "name"))]
    name: String,
    #[serde(rename(deserialize = "BackupPlanArn", serialize = "arn"))]
    arn: String,
    creation_date: Timestamp,
    last_execution_date: Timestamp,
    version_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct ListRecoveryPointsOutput {
    recovery_points: Vec<RecoveryPoint>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "snake_case", deserialize = "PascalCase"), default)]
struct RecoveryPoint {
    #[serde(rename(deserialize = "RecoveryPointArn", serialize = "arn"))]
    arn: String,
    resource_type: String,
    status: String,
    creation_date: Timestamp,
    backup_size_in_bytes: i64,
    resource_arn: String,
}

pub async fn list_backup_vaults(ctx: &CallContext, _params: Params<'_>) -> AppResult<ToolOutput> {
    let out: ListVaultsOutput = ctx.invoke(BACKUP, "list-backup-vaults", json!({})).await?;
    Ok(ToolOutput::data(json!({ "backup_vaults": out.backup_vault_list })))
}

pub async fn list_backup_plans(ctx: &CallContext, _params: Params<'_>) -> AppResult<ToolOutput> {
    let out: ListPlansOutput = ctx.invoke(BACKUP, "list-backup-plans", json!({})).await?;
    Ok(ToolOutput::data(json!({ "backup_plans": out.backup_plans_list })))
}

pub async fn list_recovery_points(ctx: &CallContext, params: Params<'_>) -> AppResult<ToolOutput> {
    let vault = params.str("backup_vault_name")?;
    let out: ListRecoveryPointsOutput = ctx
        .invoke(BACKUP, "list-recovery-points-by-backup-vault", json!({ "BackupVaultName": vault }))
        .await?;
    Ok(ToolOutput::data(json!({ "recovery_points": out.recovery_points })))
}
