//! Migration appliance (Snow Family) tools.

use super::{format::Timestamp, CallContext, Params, ToolOutput};
use crate::errors::AppResult;
use serde::{Deserialize, Serialize};
use serde_json::json;

const SNOWBALL: &str = "snowball";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct ListJobsOutput {
    job_list_entries: Vec<JobEntry>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "snake_case", deserialize = "PascalCase"), default)]
struct JobEntry {
    #[serde(rename(deserialize = "JobId", serialize = "id"))]
    id: String,
    #[serde(rename(deserialize = "JobState", serialize = "state"))]
    state: String,
    #[serde(rename(deserialize = "JobType", serialize = "type"))]
    kind: String,
    creation_date: Timestamp,
    description: String,
    snowball_type: String,
    is_master: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct DescribeJobOutput {
    job_metadata: JobMetadata,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "snake_case", deserialize = "PascalCase"), default)]
struct JobMetadata {
    #[serde(rename(deserialize = "JobId", serialize = "id"))]
    id: String,
    #[serde(rename(deserialize = "JobState", serialize = "state"))]
    state: String,
    #[serde(rename(deserialize = "JobType", serialize = "type"))]
    kind: String,
    creation_date: Timestamp,
    description: String,
    snowball_type: String,
    shipping_option: String,
    #[serde(rename(deserialize = "SnowballCapacityPreference", serialize = "snowball_capacity"))]
    snowball_capacity: String,
    address_id: String,
    #[serde(rename(deserialize = "KmsKeyARN", serialize = "kms_key_arn"))]
    kms_key_arn: String,
    #[serde(rename(deserialize = "RoleARN", serialize = "role_arn"))]
    role_arn: String,
    cluster_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct ListClustersOutput {
    cluster_list_entries: Vec<ClusterEntry>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "snake_case", deserialize = "PascalCase"), default)]
struct ClusterEntry {
    #[serde(rename(deserialize = "ClusterId", serialize = "id"))]
    id: String,
    #[serde(rename(deserialize = "ClusterState", serialize = "state"))]
    state: String,
    creation_date: Timestamp,
    description: String,
}

pub async fn list_jobs(ctx: &CallContext, _params: Params<'_>) -> AppResult<ToolOutput> {
    let out: ListJobsOutput = ctx.invoke(SNOWBALL, "list-jobs", json!({})).await?;
    Ok(ToolOutput::data(json!({ "jobs": out.job_list_entries })))
}

pub async fn describe_job(ctx: &CallContext, params: Params<'_>) -> AppResult<ToolOutput> {
    let job_id = params.str("job_id")?;
    let out: DescribeJobOutput = ctx.invoke(SNOWBALL, "describe-job", json!({ "JobId": job_id })).await?;
    Ok(ToolOutput::data(json!({ "job": out.job_metadata })))
}

pub async fn list_clusters(ctx: &CallContext, _params: Params<'_>) -> AppResult<ToolOutput> {
    let out: ListClustersOutput = ctx.invoke(SNOWBALL, "list-clusters", json!({})).await?;
    Ok(ToolOutput::data(json!({ "clusters": out.cluster_list_entries })))
}
