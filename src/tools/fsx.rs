use super::{format::{tag_value, Tag, Timestamp}, CallContext, Params, ToolOutput};
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

const FSX: &str = "fsx";
const REPLICA_TAG: &str = "ReplicaOf";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct DescribeFileSystemsOutput {
    file_systems: Vec<FileSystem>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "snake_case", deserialize = "PascalCase"), default)]
struct FileSystem {
    #[serde(rename(deserialize = "FileSystemId", serialize = "id"))]
    id: String,
    #[serde(rename(deserialize = "FileSystemType", serialize = "type"))]
    kind: String,
    storage_capacity: i64,
    lifecycle: String,
    #[serde(rename(deserialize = "DNSName", serialize = "dns_name"))]
    dns_name: String,
    network_interface_ids: Vec<String>,
    storage_type: String,
    vpc_id: String,
    subnet_ids: Vec<String>,
    kms_key_id: String,
    creation_time: Timestamp,
    #[serde(skip_serializing)]
    windows_configuration: Option<WindowsConfiguration>,
    #[serde(skip_serializing)]
    lustre_configuration: Option<LustreConfiguration>,
    #[serde(skip_serializing)]
    tags: Vec<Tag>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "snake_case", deserialize = "PascalCase"), default)]
struct WindowsConfiguration {
    throughput_capacity: i64,
    active_directory_id: String,
    automatic_backup_retention_days: i64,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "snake_case", deserialize = "PascalCase"), default)]
struct LustreConfiguration {
    deployment_type: String,
    per_unit_storage_throughput: i64,
    mount_name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct DescribeBackupsOutput {
    backups: Vec<Backup>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct Backup {
    backup_id: String,
    backup_type: String,
    lifecycle: String,
    creation_time: Timestamp,
    file_system: BackupFileSystem,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct BackupFileSystem {
    file_system_id: String,
    file_system_type: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct CreateBackupOutput {
    backup: Backup,
}

pub async fn list_filesystems(ctx: &CallContext, _params: Params<'_>) -> AppResult<ToolOutput> {
    let out: DescribeFileSystemsOutput = ctx.invoke(FSX, "describe-file-systems", json!({})).await?;
    Ok(ToolOutput::data(json!({ "filesystems": out.file_systems })))
}

pub async fn describe_filesystem(ctx: &CallContext, params: Params<'_>) -> AppResult<ToolOutput> {
    let id = params.str("filesystem_id")?;
    let out: DescribeFileSystemsOutput =
        ctx.invoke(FSX, "describe-file-systems", json!({ "FileSystemIds": [id] })).await?;
    let fs = out
        .file_systems
        .into_iter()
        .next()
        .ok_or_else(|| AppError::Downstream {
            operation: format!("{FSX} describe-file-systems"),
            code: Some("FileSystemNotFound".into()),
            message: format!("FSx file system {id} not found"),
        })?;

    let mut details = serde_json::to_value(&fs).map_err(|e| AppError::Internal(e.to_string()))?;
    match fs.kind.as_str() {
        "WINDOWS" => details["windows"] = json!(fs.windows_configuration.unwrap_or_default()),
        "LUSTRE" => details["lustre"] = json!(fs.lustre_configuration.unwrap_or_default()),
        _ => {}
    }
    Ok(ToolOutput::data(json!({ "filesystem": details })))
}

pub async fn create_backup(ctx: &CallContext, params: Params<'_>) -> AppResult<ToolOutput> {
    let id = params.str("filesystem_id")?;
    let name = params.str("backup_name")?;
    params.confirm("create", "FSx backup", format!("{name} of {id}"))?;
    let out: CreateBackupOutput = ctx
        .invoke(FSX, "create-backup", json!({ "FileSystemId": id, "Tags": [{ "Key": "Name", "Value": name }] }))
        .await?;
    let backup_id = out.backup.backup_id;
    Ok(ToolOutput::done(
        format!("Backup {backup_id} created successfully"),
        json!({ "backup_id": backup_id, "filesystem_id": id, "lifecycle": out.backup.lifecycle }),
    ))
}

pub async fn list_backups(ctx: &CallContext, _params: Params<'_>) -> AppResult<ToolOutput> {
    let out: DescribeBackupsOutput = ctx.invoke(FSX, "describe-backups", json!({})).await?;
    let backups: Vec<Value> = out
        .backups
        .into_iter()
        .map(|b| {
            json!({
                "id": b.backup_id,
                "filesystem_id": b.file_system.file_system_id,
                "type": b.backup_type,
                "lifecycle": b.lifecycle,
                "creation_time": b.creation_time,
                "filesystem_type": b.file_system.file_system_type,
            })
        })
        .collect();
    Ok(ToolOutput::data(json!({ "backups": backups })))
}

/// Replicas are file systems tagged `ReplicaOf=<source id>`.
pub async fn list_replicas(ctx: &CallContext, params: Params<'_>) -> AppResult<ToolOutput> {
    let source = params.opt_str("source_filesystem_id")?;
    let out: DescribeFileSystemsOutput = ctx.invoke(FSX, "describe-file-systems", json!({})).await?;
    let replicas: Vec<Value> = out
        .file_systems
        .into_iter()
        .filter_map(|fs| {
            let replica_of = tag_value(&fs.tags, REPLICA_TAG);
            if replica_of.is_empty() || source.is_some_and(|s| s != replica_of) {
                return None;
            }
            Some(json!({
                "id": fs.id,
                "source_filesystem_id": replica_of,
                "type": fs.kind,
                "storage_capacity": fs.storage_capacity,
                "lifecycle": fs.lifecycle,
                "region": ctx.region,
            }))
        })
        .collect();
    Ok(ToolOutput::data(json!({ "replicas": replicas })))
}
