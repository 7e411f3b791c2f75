//! Object storage tools.

use super::{format::Timestamp, CallContext, Params, ToolOutput};
use crate::errors::{AppError, AppResult};
use base64::Engine;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

const S3: &str = "s3api";
const DEFAULT_REGION: &str = "us-east-1";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct ListBucketsOutput {
    buckets: Vec<Bucket>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "snake_case", deserialize = "PascalCase"), default)]
struct Bucket {
    name: String,
    creation_date: Timestamp,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct ListObjectsOutput {
    contents: Vec<Object>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "snake_case", deserialize = "PascalCase"), default)]
struct Object {
    key: String,
    size: i64,
    last_modified: Timestamp,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct HeadObjectOutput {
    content_length: u64,
    content_type: String,
    last_modified: Timestamp,
    #[serde(rename = "ETag")]
    etag: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct AclOutput {
    grants: Vec<Grant>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct Grant {
    grantee: Grantee,
    permission: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct Grantee {
    #[serde(rename = "Type")]
    kind: String,
    #[serde(rename = "ID")]
    id: String,
    display_name: String,
    #[serde(rename = "URI")]
    uri: String,
}

fn bucket_input(bucket: &str) -> Value {
    json!({ "Bucket": bucket })
}

fn object_input(bucket: &str, key: &str) -> Value {
    json!({ "Bucket": bucket, "Key": key })
}

pub async fn list_buckets(ctx: &CallContext, _params: Params<'_>) -> AppResult<ToolOutput> {
    let out: ListBucketsOutput = ctx.invoke(S3, "list-buckets", json!({})).await?;
    Ok(ToolOutput::data(json!({ "buckets": out.buckets })))
}

pub async fn list_objects(ctx: &CallContext, params: Params<'_>) -> AppResult<ToolOutput> {
    let bucket = params.str("bucket_name")?;
    let mut input = bucket_input(bucket);
    if let Some(prefix) = params.opt_str("prefix")? {
        input["Prefix"] = Value::from(prefix);
    }
    let out: ListObjectsOutput = ctx.invoke(S3, "list-objects-v2", input).await?;
    Ok(ToolOutput::data(json!({ "objects": out.contents })))
}

pub async fn get_object(ctx: &CallContext, params: Params<'_>) -> AppResult<ToolOutput> {
    let bucket = params.str("bucket_name")?;
    let key = params.str("object_key")?;
    let head: HeadObjectOutput = ctx.invoke(S3, "head-object", object_input(bucket, key)).await?;

    let mut data = Map::new();
    data.insert("key".into(), Value::from(key));
    data.insert("size".into(), Value::from(head.content_length));
    data.insert("content_type".into(), Value::from(head.content_type));
    data.insert("last_modified".into(), Value::from(head.last_modified.0));
    data.insert("etag".into(), Value::from(head.etag));

    if head.content_length > ctx.max_inline_bytes {
        data.insert("inlined".into(), Value::Bool(false));
        let message = format!(
            "Object is {} bytes, above the {} byte inline limit; content omitted",
            head.content_length, ctx.max_inline_bytes
        );
        return Ok(ToolOutput::done(message, Value::Object(data)));
    }

    let mut call = ctx.request(S3, "get-object", object_input(bucket, key));
    call.download = true;
    let body = ctx.send(call).await?.body.unwrap_or_default();
    let (encoding, content) = match std::str::from_utf8(&body) {
        Ok(text) => ("utf-8", text.to_string()),
        Err(_) => ("base64", base64::engine::general_purpose::STANDARD.encode(&body)),
    };
    data.insert("inlined".into(), Value::Bool(true));
    data.insert("encoding".into(), Value::from(encoding));
    data.insert("content".into(), Value::from(content));
    Ok(ToolOutput::data(Value::Object(data)))
}

fn put_body(params: Params<'_>) -> AppResult<Bytes> {
    match (params.opt_str("content")?, params.opt_str("content_b64")?) {
        (Some(text), None) => Ok(Bytes::copy_from_slice(text.as_bytes())),
        (None, Some(b64)) => base64::engine::general_purpose::STANDARD
            .decode(b64)
            .map(Bytes::from)
            .map_err(|_| AppError::invalid("content_b64", "invalid base64")),
        (Some(_), Some(_)) => Err(AppError::invalid("content", "give either content or content_b64, not both")),
        (None, None) => Err(AppError::MissingParameter("content".into())),
    }
}

pub async fn put_object(ctx: &CallContext, params: Params<'_>) -> AppResult<ToolOutput> {
    let bucket = params.str("bucket_name")?;
    let key = params.str("object_key")?;
    let body = put_body(params)?;
    params.confirm("put", "S3 object", format!("s3://{bucket}/{key}"))?;

    let mut input = object_input(bucket, key);
    if let Some(content_type) = params.opt_str("content_type")? {
        input["ContentType"] = Value::from(content_type);
    }
    let size = body.len();
    let mut call = ctx.request(S3, "put-object", input);
    call.upload = Some(body);
    let out = ctx.send(call).await?;
    let etag = out.output.get("ETag").and_then(Value::as_str).unwrap_or_default();
    Ok(ToolOutput::done(
        format!("Object {key} written to bucket {bucket}"),
        json!({ "key": key, "size": size, "etag": etag }),
    ))
}

pub async fn delete_object(ctx: &CallContext, params: Params<'_>) -> AppResult<ToolOutput> {
    let bucket = params.str("bucket_name")?;
    let key = params.str("object_key")?;
    params.confirm("delete", "S3 object", format!("s3://{bucket}/{key}"))?;
    ctx.send(ctx.request(S3, "delete-object", object_input(bucket, key))).await?;
    Ok(ToolOutput::done(format!("Object {key} deleted from bucket {bucket}"), json!({ "key": key })))
}

pub async fn get_bucket_location(ctx: &CallContext, params: Params<'_>) -> AppResult<ToolOutput> {
    let bucket = params.str("bucket_name")?;
    let out: Value = ctx.invoke(S3, "get-bucket-location", bucket_input(bucket)).await?;
    // An empty constraint is the provider's way of saying us-east-1.
    let location = match out.get("LocationConstraint").and_then(Value::as_str) {
        Some(loc) if !loc.is_empty() => loc,
        _ => DEFAULT_REGION,
    };
    Ok(ToolOutput::data(json!({ "location": location })))
}

pub async fn get_bucket_policy(ctx: &CallContext, params: Params<'_>) -> AppResult<ToolOutput> {
    let bucket = params.str("bucket_name")?;
    let out: Value = match ctx.invoke(S3, "get-bucket-policy", bucket_input(bucket)).await {
        Ok(out) => out,
        Err(e) if e.downstream_code() == Some("NoSuchBucketPolicy") => {
            return Ok(ToolOutput::done("No policy exists for this bucket", json!({ "policy": null })));
        }
        Err(e) => return Err(e),
    };
    let raw = out.get("Policy").and_then(Value::as_str).unwrap_or("null");
    let policy = serde_json::from_str::<Value>(raw).unwrap_or_else(|_| Value::from(raw));
    Ok(ToolOutput::data(json!({ "policy": policy })))
}

pub async fn get_bucket_versioning(ctx: &CallContext, params: Params<'_>) -> AppResult<ToolOutput> {
    let bucket = params.str("bucket_name")?;
    let out: Value = ctx.invoke(S3, "get-bucket-versioning", bucket_input(bucket)).await?;
    let status = out.get("Status").and_then(Value::as_str).unwrap_or("NotEnabled");
    let mfa_delete = out.get("MFADelete").and_then(Value::as_str).unwrap_or("Disabled");
    Ok(ToolOutput::data(json!({ "versioning": status, "mfa_delete": mfa_delete })))
}

pub async fn get_object_acl(ctx: &CallContext, params: Params<'_>) -> AppResult<ToolOutput> {
    let bucket = params.str("bucket_name")?;
    let key = params.str("object_key")?;
    let out: AclOutput = ctx.invoke(S3, "get-object-acl", object_input(bucket, key)).await?;
    let grants: Vec<Value> = out
        .grants
        .into_iter()
        .map(|g| {
            json!({
                "permission": g.permission,
                "grantee_type": g.grantee.kind,
                "grantee_id": g.grantee.id,
                "display_name": g.grantee.display_name,
                "uri": g.grantee.uri,
            })
        })
        .collect();
    Ok(ToolOutput::data(json!({ "grants": grants })))
}

pub async fn create_bucket(ctx: &CallContext, params: Params<'_>) -> AppResult<ToolOutput> {
    let bucket = params.str("bucket_name")?;
    params.confirm("create", "S3 bucket", format!("{bucket} in {}", ctx.region))?;
    let mut input = bucket_input(bucket);
    if ctx.region != DEFAULT_REGION {
        input["CreateBucketConfiguration"] = json!({ "LocationConstraint": ctx.region });
    }
    let out: Value = ctx.invoke(S3, "create-bucket", input).await?;
    let location = out.get("Location").and_then(Value::as_str).unwrap_or_default();
    Ok(ToolOutput::done(
        format!("Bucket {bucket} created successfully"),
        json!({ "bucket_name": bucket, "location": location, "region": ctx.region }),
    ))
}

pub async fn delete_bucket(ctx: &CallContext, params: Params<'_>) -> AppResult<ToolOutput> {
    let bucket = params.str("bucket_name")?;
    params.confirm("delete", "S3 bucket", bucket)?;
    ctx.send(ctx.request(S3, "delete-bucket", bucket_input(bucket))).await?;
    Ok(ToolOutput::done(format!("Bucket {bucket} deleted successfully"), json!({ "bucket_name": bucket })))
}
