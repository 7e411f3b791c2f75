//! Managed file system tools.

use super::{format::{tag_value, Tag, Timestamp}, CallContext, Params, ToolOutput};
use crate::errors::AppResult;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

const EFS: &str = "efs";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct DescribeFileSystemsOutput {
    file_systems: Vec<FileSystem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct FileSystem {
    file_system_id: String,
    size_in_bytes: Size,
    life_cycle_state: String,
    name: String,
    performance_mode: String,
    encrypted: bool,
    throughput_mode: String,
    creation_time: Timestamp,
    number_of_mount_targets: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct Size {
    value: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct DescribeMountTargetsOutput {
    mount_targets: Vec<MountTarget>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "snake_case", deserialize = "PascalCase"), default)]
struct MountTarget {
    #[serde(rename(deserialize = "MountTargetId", serialize = "id"))]
    id: String,
    subnet_id: String,
    ip_address: String,
    #[serde(rename(deserialize = "LifeCycleState", serialize = "state"))]
    state: String,
    network_interface_id: String,
    availability_zone_name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct DescribeReplicationsOutput {
    replications: Vec<Replication>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "snake_case", deserialize = "PascalCase"), default)]
struct Replication {
    #[serde(rename(deserialize = "SourceFileSystemId", serialize = "source_filesystem_id"))]
    source_filesystem_id: String,
    source_file_system_region: String,
    creation_time: Timestamp,
    destinations: Vec<Destination>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "snake_case", deserialize = "PascalCase"), default)]
struct Destination {
    status: String,
    region: String,
    #[serde(rename(deserialize = "FileSystemId", serialize = "filesystem_id"))]
    filesystem_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct CreatedFileSystem {
    file_system_id: String,
    tags: Vec<Tag>,
}

pub async fn list_filesystems(ctx: &CallContext, _params: Params<'_>) -> AppResult<ToolOutput> {
    let out: DescribeFileSystemsOutput = ctx.invoke(EFS, "describe-file-systems", json!({})).await?;
    let filesystems: Vec<Value> = out
        .file_systems
        .into_iter()
        .map(|fs| {
            json!({
                "id": fs.file_system_id,
                "size": fs.size_in_bytes.value,
                "state": fs.life_cycle_state,
                "name": fs.name,
                "performance_mode": fs.performance_mode,
                "encrypted": fs.encrypted,
                "throughput_mode": fs.throughput_mode,
                "creation_time": fs.creation_time,
                "mount_targets": fs.number_of_mount_targets,
            })
        })
        .collect();
    Ok(ToolOutput::data(json!({ "filesystems": filesystems })))
}

pub async fn create_filesystem(ctx: &CallContext, params: Params<'_>) -> AppResult<ToolOutput> {
    let name = params.str("name")?;
    params.confirm("create", "EFS file system", name)?;
    let out: CreatedFileSystem = ctx
        .invoke(
            EFS,
            "create-file-system",
            json!({
                "PerformanceMode": "generalPurpose",
                "Encrypted": true,
                "Tags": [{ "Key": "Name", "Value": name }],
            }),
        )
        .await?;
    let id = out.file_system_id;
    Ok(ToolOutput::done(
        format!("EFS file system {id} created successfully"),
        json!({ "filesystem_id": id, "name": tag_value(&out.tags, "Name") }),
    ))
}

pub async fn delete_filesystem(ctx: &CallContext, params: Params<'_>) -> AppResult<ToolOutput> {
    let id = params.str("filesystem_id")?;
    params.confirm("delete", "EFS file system", id)?;
    ctx.send(ctx.request(EFS, "delete-file-system", json!({ "FileSystemId": id }))).await?;
    Ok(ToolOutput::done(format!("EFS file system {id} deleted successfully"), json!({ "filesystem_id": id })))
}

pub async fn create_mount_target(ctx: &CallContext, params: Params<'_>) -> AppResult<ToolOutput> {
    let id = params.str("filesystem_id")?;
    let subnet = params.str("subnet_id")?;
    let groups = params.opt_str_list("security_groups")?;
    params.confirm("create", "EFS mount target", format!("for {id} in {subnet}"))?;

    let mut input = json!({ "FileSystemId": id, "SubnetId": subnet });
    if let Some(groups) = groups {
        input["SecurityGroups"] = json!(groups);
    }
    let out: Value = ctx.invoke(EFS, "create-mount-target", input).await?;
    let mount_target_id = out.get("MountTargetId").and_then(Value::as_str).unwrap_or_default();
    Ok(ToolOutput::done(
        format!("Mount target {mount_target_id} created successfully"),
        json!({ "mount_target_id": mount_target_id, "filesystem_id": id }),
    ))
}

pub async fn list_mount_targets(ctx: &CallContext, params: Params<'_>) -> AppResult<ToolOutput> {
    let id = params.str("filesystem_id")?;
    let out: DescribeMountTargetsOutput =
        ctx.invoke(EFS, "describe-mount-targets", json!({ "FileSystemId": id })).await?;
    Ok(ToolOutput::data(json!({ "mount_targets": out.mount_targets })))
}

pub async fn describe_replication(ctx: &CallContext, params: Params<'_>) -> AppResult<ToolOutput> {
    let id = params.str("filesystem_id")?;
    let none = || ToolOutput::done(format!("No replication configuration found for {id}"), json!({ "replication": null }));
    let out: DescribeReplicationsOutput =
        match ctx.invoke(EFS, "describe-replication-configurations", json!({ "FileSystemId": id })).await {
            Ok(out) => out,
            Err(e) if e.downstream_code() == Some("ReplicationNotFound") => return Ok(none()),
            Err(e) => return Err(e),
        };
    match out.replications.into_iter().next() {
        Some(replication) => Ok(ToolOutput::data(json!({ "replication": replication }))),
        None => Ok(none()),
    }
}
