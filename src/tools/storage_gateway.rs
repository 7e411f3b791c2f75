use super::{CallContext, Params, ToolOutput};
use crate::errors::AppResult;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

const SGW: &str = "storagegateway";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct ListGatewaysOutput {
    gateways: Vec<Gateway>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct Gateway {
    #[serde(rename = "GatewayARN")]
    gateway_arn: String,
    gateway_id: String,
    gateway_name: String,
    gateway_type: String,
    gateway_operational_state: String,
    ec2_instance_id: String,
    host_environment: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct ListVolumesOutput {
    volume_infos: Vec<VolumeInfo>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "snake_case", deserialize = "PascalCase"), default)]
struct VolumeInfo {
    #[serde(rename(deserialize = "VolumeARN", serialize = "id"))]
    id: String,
    #[serde(rename(deserialize = "VolumeType", serialize = "type"))]
    kind: String,
    #[serde(rename(deserialize = "VolumeSizeInBytes", serialize = "size_in_bytes"))]
    size_in_bytes: i64,
    #[serde(rename(deserialize = "GatewayARN", serialize = "gateway_id"))]
    gateway_id: String,
    volume_attachment_status: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct ListFileSharesOutput {
    file_share_info_list: Vec<FileShareInfo>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "snake_case", deserialize = "PascalCase"), default)]
struct FileShareInfo {
    #[serde(rename(deserialize = "FileShareARN", serialize = "id"))]
    id: String,
    #[serde(rename(deserialize = "FileShareType", serialize = "type"))]
    kind: String,
    #[serde(rename(deserialize = "GatewayARN", serialize = "gateway_id"))]
    gateway_id: String,
    file_share_status: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct GatewayInformation {
    #[serde(rename = "GatewayARN")]
    gateway_arn: String,
    gateway_name: String,
    gateway_type: String,
    gateway_operational_state: String,
    gateway_network_interfaces: Vec<Value>,
    gateway_timezone: String,
    ec2_instance_id: String,
    endpoint_type: String,
    host_environment: String,
    software_version: String,
    gateway_state: String,
}

/// Optional filter input shared by the list operations.
fn gateway_filter(params: Params<'_>) -> AppResult<Value> {
    Ok(match params.opt_str("gateway_id")? {
        Some(arn) => json!({ "GatewayARN": arn }),
        None => json!({}),
    })
}

pub async fn list_gateways(ctx: &CallContext, _params: Params<'_>) -> AppResult<ToolOutput> {
    let out: ListGatewaysOutput = ctx.invoke(SGW, "list-gateways", json!({})).await?;
    let gateways: Vec<Value> = out
        .gateways
        .into_iter()
        .map(|gw| {
            json!({
                "id": gw.gateway_arn,
                "gateway_id": gw.gateway_id,
                "name": gw.gateway_name,
                "type": gw.gateway_type,
                "status": gw.gateway_operational_state,
                "ec2_instance_id": gw.ec2_instance_id,
                "host_environment": gw.host_environment,
            })
        })
        .collect();
    Ok(ToolOutput::data(json!({ "gateways": gateways })))
}

pub async fn list_volumes(ctx: &CallContext, params: Params<'_>) -> AppResult<ToolOutput> {
    let out: ListVolumesOutput = ctx.invoke(SGW, "list-volumes", gateway_filter(params)?).await?;
    Ok(ToolOutput::data(json!({ "volumes": out.volume_infos })))
}

pub async fn describe_gateway(ctx: &CallContext, params: Params<'_>) -> AppResult<ToolOutput> {
    let arn = params.str("gateway_id")?;
    let info: GatewayInformation =
        ctx.invoke(SGW, "describe-gateway-information", json!({ "GatewayARN": arn })).await?;
    Ok(ToolOutput::data(json!({
        "gateway": {
            "id": info.gateway_arn,
            "name": info.gateway_name,
            "type": info.gateway_type,
            "status": info.gateway_operational_state,
            "state": info.gateway_state,
            "network_interfaces": info.gateway_network_interfaces,
            "timezone": info.gateway_timezone,
            "ec2_instance_id": info.ec2_instance_id,
            "endpoint_type": info.endpoint_type,
            "host_environment": info.host_environment,
            "software_version": info.software_version,
        }
    })))
}

pub async fn list_file_shares(ctx: &CallContext, params: Params<'_>) -> AppResult<ToolOutput> {
    let out: ListFileSharesOutput = ctx.invoke(SGW, "list-file-shares", gateway_filter(params)?).await?;
    Ok(ToolOutput::data(json!({ "file_shares": out.file_share_info_list })))
}
