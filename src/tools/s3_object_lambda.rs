use super::{CallContext, Params, ToolOutput};
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct CallerIdentity {
    account: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct ListAccessPointsOutput {
    object_lambda_access_point_list: Vec<AccessPoint>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "snake_case", deserialize = "PascalCase"), default)]
struct AccessPoint {
    name: String,
    #[serde(rename(deserialize = "ObjectLambdaAccessPointArn", serialize = "arn"))]
    arn: String,
    alias: AccessPointAlias,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "snake_case", deserialize = "PascalCase"), default)]
struct AccessPointAlias {
    value: String,
    status: String,
}

/// Access points are listed per account, so the caller's account is looked up first.
pub async fn list_access_points(ctx: &CallContext, _params: Params<'_>) -> AppResult<ToolOutput> {
    let identity: CallerIdentity = ctx.invoke("sts", "get-caller-identity", json!({})).await?;
    if identity.account.is_empty() {
        return Err(AppError::Internal("caller identity has no account id".into()));
    }
    let out: ListAccessPointsOutput = ctx
        .invoke("s3control", "list-access-points-for-object-lambda", json!({ "AccountId": identity.account }))
        .await?;
    Ok(ToolOutput::data(json!({
        "account_id": identity.account,
        "object_lambda_access_points": out.object_lambda_access_point_list,
    })))
}
