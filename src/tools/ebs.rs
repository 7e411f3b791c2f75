//! Block storage tools, served by the ec2 API.

use super::{format::Timestamp, CallContext, Params, ToolOutput};
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

const EC2: &str = "ec2";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct DescribeVolumesOutput {
    volumes: Vec<Volume>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "snake_case", deserialize = "PascalCase"), default)]
struct Volume {
    #[serde(rename(deserialize = "VolumeId", serialize = "id"))]
    id: String,
    size: i64,
    state: String,
    #[serde(rename(deserialize = "VolumeType", serialize = "type"))]
    kind: String,
    #[serde(rename(deserialize = "AvailabilityZone", serialize = "az"))]
    az: String,
    encrypted: bool,
    iops: i64,
    create_time: Timestamp,
    attachments: Vec<Attachment>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "snake_case", deserialize = "PascalCase"), default)]
struct Attachment {
    instance_id: String,
    state: String,
    device: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct DescribeSnapshotsOutput {
    snapshots: Vec<Snapshot>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "snake_case", deserialize = "PascalCase"), default)]
struct Snapshot {
    #[serde(rename(deserialize = "SnapshotId", serialize = "id"))]
    id: String,
    volume_id: String,
    state: String,
    progress: String,
    start_time: Timestamp,
    description: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct AvailabilityZones {
    availability_zones: Vec<Zone>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct Zone {
    zone_name: String,
}

pub async fn list_volumes(ctx: &CallContext, _params: Params<'_>) -> AppResult<ToolOutput> {
    let out: DescribeVolumesOutput = ctx.invoke(EC2, "describe-volumes", json!({})).await?;
    Ok(ToolOutput::data(json!({ "volumes": out.volumes })))
}

pub async fn create_volume(ctx: &CallContext, params: Params<'_>) -> AppResult<ToolOutput> {
    let size = params.int("size")?;
    if size <= 0 {
        return Err(AppError::invalid("size", "must be a positive number of GiB"));
    }
    let volume_type = params.opt_str("volume_type")?.unwrap_or("gp3");
    let requested_az = params.opt_str("availability_zone")?;
    params.confirm(
        "create",
        "EBS volume",
        format!("of {size} GiB ({volume_type}) in {}", requested_az.unwrap_or("the first zone of the region")),
    )?;

    let az = match requested_az {
        Some(az) => az.to_string(),
        None => {
            let zones: AvailabilityZones = ctx.invoke(EC2, "describe-availability-zones", json!({})).await?;
            zones
                .availability_zones
                .into_iter()
                .map(|z| z.zone_name)
                .find(|z| !z.is_empty())
                .ok_or_else(|| AppError::Internal(format!("no availability zones found in {}", ctx.region)))?
        }
    };
    let out: Value = ctx
        .invoke(EC2, "create-volume", json!({ "Size": size, "VolumeType": volume_type, "AvailabilityZone": az }))
        .await?;
    let volume_id = out.get("VolumeId").and_then(Value::as_str).unwrap_or_default();
    Ok(ToolOutput::done(
        format!("Volume {volume_id} created successfully"),
        json!({ "volume_id": volume_id, "availability_zone": az, "size": size, "volume_type": volume_type }),
    ))
}

pub async fn delete_volume(ctx: &CallContext, params: Params<'_>) -> AppResult<ToolOutput> {
    let volume_id = params.str("volume_id")?;
    params.confirm("delete", "EBS volume", volume_id)?;
    ctx.send(ctx.request(EC2, "delete-volume", json!({ "VolumeId": volume_id }))).await?;
    Ok(ToolOutput::done(format!("Volume {volume_id} deleted successfully"), json!({ "volume_id": volume_id })))
}

pub async fn create_snapshot(ctx: &CallContext, params: Params<'_>) -> AppResult<ToolOutput> {
    let volume_id = params.str("volume_id")?;
    let description = params.opt_str("description")?.unwrap_or_default();
    params.confirm("create", "EBS snapshot", format!("of {volume_id}"))?;
    let out: Value = ctx
        .invoke(EC2, "create-snapshot", json!({ "VolumeId": volume_id, "Description": description }))
        .await?;
    let snapshot_id = out.get("SnapshotId").and_then(Value::as_str).unwrap_or_default();
    Ok(ToolOutput::done(
        format!("Snapshot {snapshot_id} created successfully"),
        json!({ "snapshot_id": snapshot_id, "volume_id": volume_id }),
    ))
}

pub async fn list_snapshots(ctx: &CallContext, params: Params<'_>) -> AppResult<ToolOutput> {
    let owner = params.opt_str("owner_id")?.unwrap_or("self");
    let out: DescribeSnapshotsOutput =
        ctx.invoke(EC2, "describe-snapshots", json!({ "OwnerIds": [owner] })).await?;
    Ok(ToolOutput::data(json!({ "snapshots": out.snapshots })))
}
