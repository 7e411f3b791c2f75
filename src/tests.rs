#[cfg(test)]
pub(crate) mod support {
    use crate::{
        config::Config,
        mcp::{registry::ToolRegistry, types::{ParamType, ToolDefinition, ToolRequest}},
        profiles::ProfileStore,
        provider::{testing::RecordingApi, DynCloudApi},
    };
    use assert_fs::prelude::*;
    use serde_json::{json, Map, Value};
    use std::sync::Arc;

    pub struct Harness {
        pub api: Arc<RecordingApi>,
        pub profiles: Arc<ProfileStore>,
        pub registry: ToolRegistry,
        _dir: assert_fs::TempDir,
    }

    pub fn harness() -> Harness {
        harness_with(Config::default())
    }

    pub fn harness_with(cfg: Config) -> Harness {
        let api = RecordingApi::new();
        harness_on(cfg, api.clone(), api)
    }

    pub fn harness_on(cfg: Config, api: Arc<RecordingApi>, backend: DynCloudApi) -> Harness {
        let dir = assert_fs::TempDir::new().unwrap();
        let creds = dir.child("credentials");
        creds.write_str("[default]\naws_access_key_id = a\n[dev]\naws_access_key_id = b\n").unwrap();
        let conf = dir.child("config");
        conf.write_str("[profile prod]\nregion = eu-west-1\n").unwrap();
        let profiles = Arc::new(ProfileStore::with_files(
            Some(creds.path().to_path_buf()),
            Some(conf.path().to_path_buf()),
            None,
        ));
        let registry = ToolRegistry::new(&cfg, backend, profiles.clone());
        Harness { api, profiles, registry, _dir: dir }
    }

    pub fn req(tool: &str, params: Value) -> ToolRequest {
        serde_json::from_value(json!({ "tool_name": tool, "parameters": params })).unwrap()
    }

    /// Required parameters filled with plausible values, plus the confirmation sentinel.
    pub fn sample_params(def: &ToolDefinition) -> Map<String, Value> {
        let mut m = Map::new();
        for (name, spec) in def.parameters.iter().filter(|(_, s)| s.required) {
            let v = match (name.as_str(), spec.ty) {
                ("profile_name", _) => json!("dev"),
                ("job_type", _) => json!("inventory-retrieval"),
                (_, ParamType::Integer) => json!(10),
                (_, ParamType::Array) => json!(["sg-1"]),
                (_, ParamType::Boolean) => json!(true),
                (_, ParamType::Object) => json!({ "k": "v" }),
                (_, ParamType::String) => json!(format!("{name}-value")),
            };
            m.insert(name.clone(), v);
        }
        m.insert("confirmation".into(), json!("CONFIRM"));
        if def.name == "s3_put_object" {
            m.insert("content".into(), json!("hello"));
        }
        m
    }

    /// Replies that handlers need to find something in.
    pub fn seed(api: &RecordingApi) {
        api.reply("ec2", "describe-availability-zones", json!({ "AvailabilityZones": [{ "ZoneName": "us-east-1a" }] }))
            .reply("fsx", "describe-file-systems", json!({ "FileSystems": [{ "FileSystemId": "fs-1", "FileSystemType": "LUSTRE" }] }))
            .reply("sts", "get-caller-identity", json!({ "Account": "123456789012" }));
    }
}

#[cfg(test)]
mod dispatch {
    use super::support::*;
    use crate::mcp::types::Status;
    use crate::tools::ToolId;
    use serde_json::{json, Value};

    #[tokio::test]
    async fn unknown_tool_names_the_action() {
        let h = harness();
        let resp = h.registry.dispatch(req("frobnicate", json!({}))).await;
        assert_eq!(
            serde_json::to_value(&resp).unwrap(),
            json!({ "status": "error", "message": "Unknown action: frobnicate" })
        );
    }

    #[tokio::test]
    async fn every_tool_succeeds_with_required_params() {
        let h = harness();
        seed(&h.api);
        let defs: Vec<_> = h.registry.definitions().cloned().collect();
        assert_eq!(defs.len(), ToolId::ALL.len());
        for def in defs {
            let params = Value::Object(sample_params(&def));
            let resp = h.registry.dispatch(req(&def.name, params)).await;
            assert!(resp.is_success(), "{} failed: {:?}", def.name, resp.message);
            assert!(resp.data.is_some(), "{} returned no data", def.name);
        }
    }

    #[tokio::test]
    async fn missing_required_param_never_reaches_provider() {
        let h = harness();
        let defs: Vec<_> = h.registry.definitions().cloned().collect();
        for def in defs {
            for missing in def.required() {
                let mut params = sample_params(&def);
                params.remove(missing);
                let resp = h.registry.dispatch(req(&def.name, Value::Object(params))).await;
                assert_eq!(resp.status, Status::Error);
                assert_eq!(resp.message.as_deref(), Some(format!("Missing required parameter: {missing}").as_str()));
                assert!(resp.data.is_none());
            }
        }
        assert!(h.api.calls().is_empty(), "provider called: {:?}", h.api.operations());
    }

    #[tokio::test]
    async fn blank_values_count_as_missing() {
        let h = harness();
        for blank in [json!(""), Value::Null, json!([])] {
            let resp = h.registry.dispatch(req("s3_list_objects", json!({ "bucket_name": blank }))).await;
            assert_eq!(resp.message.as_deref(), Some("Missing required parameter: bucket_name"));
        }
        assert!(h.api.calls().is_empty());
    }

    #[tokio::test]
    async fn legacy_action_and_params_keys() {
        let h = harness();
        let request = serde_json::from_value(json!({ "action": "s3_list_objects", "params": { "bucket_name": "b", "prefix": "logs/" } })).unwrap();
        let resp = h.registry.dispatch(request).await;
        assert!(resp.is_success());
        let call = &h.api.calls()[0];
        assert_eq!(call.input, json!({ "Bucket": "b", "Prefix": "logs/" }));
    }

    #[tokio::test]
    async fn downstream_failure_becomes_error_envelope() {
        let h = harness();
        h.api.fail("s3api", "list-buckets", "AccessDenied", "An error occurred (AccessDenied) when calling the ListBuckets operation: Access Denied");
        let resp = h.registry.dispatch(req("s3_list_buckets", json!({}))).await;
        assert_eq!(resp.status, Status::Error);
        assert!(resp.message.unwrap().contains("Access Denied"));
        assert!(resp.data.is_none());
    }

    #[tokio::test]
    async fn wrong_parameter_type_is_reported() {
        let h = harness();
        let resp = h
            .registry
            .dispatch(req("ebs_create_volume", json!({ "size": "ten", "confirmation": "CONFIRM" })))
            .await;
        assert_eq!(resp.message.as_deref(), Some("Invalid parameter size: expected an integer"));
        assert!(h.api.calls().is_empty());
    }
}

#[cfg(test)]
mod profiles {
    use super::support::*;
    use serde_json::json;

    #[tokio::test]
    async fn lists_profiles_from_both_files() {
        let h = harness();
        let resp = h.registry.dispatch(req("list_aws_profiles", json!({}))).await;
        assert_eq!(resp.data.unwrap()["profiles"], json!(["default", "dev", "prod"]));
        assert!(h.api.calls().is_empty());
    }

    #[tokio::test]
    async fn unknown_profile_leaves_selection() {
        let h = harness();
        h.profiles.set("dev").unwrap();
        let resp = h.registry.dispatch(req("set_profile", json!({ "profile_name": "ghost" }))).await;
        assert_eq!(resp.message.as_deref(), Some("AWS profile not found: ghost"));
        assert_eq!(h.profiles.active().as_deref(), Some("dev"));
    }

    #[tokio::test]
    async fn set_profile_reaches_later_calls() {
        let h = harness();
        h.registry.dispatch(req("s3_list_buckets", json!({}))).await;
        let resp = h.registry.dispatch(req("set_profile", json!({ "profile_name": "prod" }))).await;
        assert!(resp.is_success());
        assert_eq!(resp.message.as_deref(), Some("AWS profile set to prod"));
        h.registry.dispatch(req("s3_list_buckets", json!({}))).await;

        let calls = h.api.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].profile, None);
        assert_eq!(calls[1].profile.as_deref(), Some("prod"));
    }

    #[tokio::test]
    async fn per_request_profile_does_not_stick() {
        let h = harness();
        let resp = h.registry.dispatch(req("s3_list_buckets", json!({ "profile_name": "dev" }))).await;
        assert!(resp.is_success());
        assert_eq!(h.api.calls()[0].profile.as_deref(), Some("dev"));
        assert_eq!(h.profiles.active(), None);

        let resp = h.registry.dispatch(req("s3_list_buckets", json!({ "profile_name": "ghost" }))).await;
        assert_eq!(resp.message.as_deref(), Some("AWS profile not found: ghost"));
        assert_eq!(h.api.calls().len(), 1);
    }
}

#[cfg(test)]
mod confirmation {
    use super::support::*;
    use crate::mcp::types::Status;
    use serde_json::json;

    #[tokio::test]
    async fn delete_bucket_requires_sentinel() {
        let h = harness();
        let resp = h.registry.dispatch(req("s3_delete_bucket", json!({ "bucket_name": "logs" }))).await;
        assert_eq!(resp.status, Status::Error);
        assert!(resp.message.unwrap().contains("confirmation=\"CONFIRM\""));

        let resp = h
            .registry
            .dispatch(req("s3_delete_bucket", json!({ "bucket_name": "logs", "confirmation": "yes" })))
            .await;
        assert_eq!(resp.status, Status::Error);
        assert!(h.api.calls().is_empty());

        let resp = h
            .registry
            .dispatch(req("s3_delete_bucket", json!({ "bucket_name": "logs", "confirmation": "CONFIRM" })))
            .await;
        assert!(resp.is_success());
        assert_eq!(resp.message.as_deref(), Some("Bucket logs deleted successfully"));
        assert_eq!(h.api.operations(), vec!["s3api delete-bucket"]);
        assert_eq!(h.api.calls()[0].input, json!({ "Bucket": "logs" }));
    }

    #[tokio::test]
    async fn unconfirmed_create_skips_zone_lookup() {
        let h = harness();
        seed(&h.api);
        let resp = h.registry.dispatch(req("ebs_create_volume", json!({ "size": 8 }))).await;
        assert_eq!(resp.status, Status::Error);
        assert!(h.api.calls().is_empty());

        let resp = h
            .registry
            .dispatch(req("ebs_create_volume", json!({ "size": "8", "confirmation": "CONFIRM" })))
            .await;
        assert!(resp.is_success());
        assert_eq!(h.api.operations(), vec!["ec2 describe-availability-zones", "ec2 create-volume"]);
        assert_eq!(
            h.api.calls()[1].input,
            json!({ "Size": 8, "VolumeType": "gp3", "AvailabilityZone": "us-east-1a" })
        );
    }
}

#[cfg(test)]
mod shaping {
    use super::support::*;
    use crate::config::Config;
    use serde_json::json;

    #[tokio::test]
    async fn bucket_timestamps_are_iso8601() {
        let h = harness();
        h.api.reply(
            "s3api",
            "list-buckets",
            json!({ "Buckets": [{ "Name": "a", "CreationDate": "2024-01-02T03:04:05.000Z" }] }),
        );
        let resp = h.registry.dispatch(req("s3_list_buckets", json!({}))).await;
        assert_eq!(
            resp.data.unwrap(),
            json!({ "buckets": [{ "name": "a", "creation_date": "2024-01-02T03:04:05+00:00" }] })
        );
    }

    #[tokio::test]
    async fn missing_policy_is_not_an_error() {
        let h = harness();
        h.api.fail("s3api", "get-bucket-policy", "NoSuchBucketPolicy", "The bucket policy does not exist");
        let resp = h.registry.dispatch(req("s3_get_bucket_policy", json!({ "bucket_name": "b" }))).await;
        assert!(resp.is_success());
        assert_eq!(resp.message.as_deref(), Some("No policy exists for this bucket"));
        assert_eq!(resp.data.unwrap(), json!({ "policy": null }));
    }

    #[tokio::test]
    async fn policy_document_is_parsed() {
        let h = harness();
        h.api.reply("s3api", "get-bucket-policy", json!({ "Policy": "{\"Version\":\"2012-10-17\"}" }));
        let resp = h.registry.dispatch(req("s3_get_bucket_policy", json!({ "bucket_name": "b" }))).await;
        assert_eq!(resp.data.unwrap()["policy"]["Version"], "2012-10-17");
    }

    #[tokio::test]
    async fn oversized_object_is_not_downloaded() {
        let mut cfg = Config::default();
        cfg.limits.max_inline_object_kb = 1;
        let h = harness_with(cfg);
        h.api.reply("s3api", "head-object", json!({ "ContentLength": 4096, "ContentType": "application/zip" }));
        let resp = h
            .registry
            .dispatch(req("s3_get_object", json!({ "bucket_name": "b", "object_key": "big.zip" })))
            .await;
        assert!(resp.is_success());
        let data = resp.data.unwrap();
        assert_eq!(data["inlined"], false);
        assert!(data.get("content").is_none());
        assert_eq!(h.api.operations(), vec!["s3api head-object"]);
    }

    #[tokio::test]
    async fn binary_object_is_base64() {
        let h = harness();
        h.api
            .reply("s3api", "head-object", json!({ "ContentLength": 3 }))
            .reply_body("s3api", "get-object", json!({}), &[0xff, 0x00, 0x01]);
        let resp = h
            .registry
            .dispatch(req("s3_get_object", json!({ "bucket_name": "b", "object_key": "blob" })))
            .await;
        let data = resp.data.unwrap();
        assert_eq!(data["encoding"], "base64");
        assert_eq!(data["content"], "/wAB");
        assert!(h.api.calls()[1].download);
    }

    #[tokio::test]
    async fn put_object_uploads_decoded_body() {
        let h = harness();
        h.api.reply("s3api", "put-object", json!({ "ETag": "\"abc\"" }));
        let resp = h
            .registry
            .dispatch(req(
                "s3_put_object",
                json!({ "bucket_name": "b", "object_key": "k", "content_b64": "aGk=", "confirmation": "CONFIRM" }),
            ))
            .await;
        assert!(resp.is_success());
        assert_eq!(resp.data.unwrap()["etag"], "\"abc\"");
        assert_eq!(h.api.calls()[0].upload.as_deref(), Some(&b"hi"[..]));
    }

    #[tokio::test]
    async fn create_bucket_outside_us_east_1_sets_constraint() {
        let mut cfg = Config::default();
        cfg.aws.region = "eu-west-1".into();
        let h = harness_with(cfg);
        let resp = h
            .registry
            .dispatch(req("s3_create_bucket", json!({ "bucket_name": "b", "confirmation": "CONFIRM" })))
            .await;
        assert!(resp.is_success());
        let call = &h.api.calls()[0];
        assert_eq!(call.region, "eu-west-1");
        assert_eq!(
            call.input,
            json!({ "Bucket": "b", "CreateBucketConfiguration": { "LocationConstraint": "eu-west-1" } })
        );
    }

    #[tokio::test]
    async fn empty_location_means_us_east_1() {
        let h = harness();
        h.api.reply("s3api", "get-bucket-location", json!({ "LocationConstraint": null }));
        let resp = h.registry.dispatch(req("s3_get_bucket_location", json!({ "bucket_name": "b" }))).await;
        assert_eq!(resp.data.unwrap(), json!({ "location": "us-east-1" }));
    }

    #[tokio::test]
    async fn fsx_describe_adds_type_section() {
        let h = harness();
        h.api.reply(
            "fsx",
            "describe-file-systems",
            json!({ "FileSystems": [{
                "FileSystemId": "fs-9",
                "FileSystemType": "WINDOWS",
                "DNSName": "fs-9.corp",
                "WindowsConfiguration": { "ThroughputCapacity": 32, "ActiveDirectoryId": "d-1" }
            }] }),
        );
        let resp = h.registry.dispatch(req("fsx_describe_filesystem", json!({ "filesystem_id": "fs-9" }))).await;
        let fs = &resp.data.unwrap()["filesystem"];
        assert_eq!(fs["dns_name"], "fs-9.corp");
        assert_eq!(fs["windows"]["throughput_capacity"], 32);
        assert!(fs.get("windows_configuration").is_none());
    }

    #[tokio::test]
    async fn fsx_describe_unknown_id_fails() {
        let h = harness();
        let resp = h.registry.dispatch(req("fsx_describe_filesystem", json!({ "filesystem_id": "fs-0" }))).await;
        assert!(resp.message.unwrap().contains("FSx file system fs-0 not found"));
    }

    #[tokio::test]
    async fn fsx_replicas_follow_replica_tag() {
        let h = harness();
        h.api.reply(
            "fsx",
            "describe-file-systems",
            json!({ "FileSystems": [
                { "FileSystemId": "fs-src", "FileSystemType": "LUSTRE" },
                { "FileSystemId": "fs-r1", "FileSystemType": "LUSTRE", "StorageCapacity": 1200, "Lifecycle": "AVAILABLE",
                  "Tags": [{ "Key": "Name", "Value": "copy" }, { "Key": "ReplicaOf", "Value": "fs-src" }] },
                { "FileSystemId": "fs-r2", "FileSystemType": "WINDOWS", "Tags": [{ "Key": "ReplicaOf", "Value": "fs-other" }] }
            ] }),
        );
        let resp = h.registry.dispatch(req("fsx_list_replicas", json!({}))).await;
        let replicas = resp.data.unwrap()["replicas"].as_array().unwrap().clone();
        assert_eq!(replicas.len(), 2);

        let resp = h
            .registry
            .dispatch(req("fsx_list_replicas", json!({ "source_filesystem_id": "fs-src" })))
            .await;
        assert_eq!(
            resp.data.unwrap(),
            json!({ "replicas": [{
                "id": "fs-r1",
                "source_filesystem_id": "fs-src",
                "type": "LUSTRE",
                "storage_capacity": 1200,
                "lifecycle": "AVAILABLE",
                "region": "us-east-1"
            }] })
        );
    }

    #[tokio::test]
    async fn efs_replication_is_described() {
        let h = harness();
        h.api.reply(
            "efs",
            "describe-replication-configurations",
            json!({ "Replications": [{
                "SourceFileSystemId": "fs-1",
                "SourceFileSystemRegion": "us-east-1",
                "CreationTime": 1_700_000_000,
                "Destinations": [{ "Status": "ENABLED", "Region": "us-west-2", "FileSystemId": "fs-2" }]
            }] }),
        );
        let resp = h.registry.dispatch(req("efs_describe_replication", json!({ "filesystem_id": "fs-1" }))).await;
        assert_eq!(h.api.calls()[0].input, json!({ "FileSystemId": "fs-1" }));
        let replication = &resp.data.unwrap()["replication"];
        assert_eq!(replication["source_filesystem_id"], "fs-1");
        assert_eq!(replication["creation_time"], "2023-11-14T22:13:20+00:00");
        assert_eq!(
            replication["destinations"],
            json!([{ "status": "ENABLED", "region": "us-west-2", "filesystem_id": "fs-2" }])
        );
    }

    #[tokio::test]
    async fn efs_without_replication_is_not_an_error() {
        let h = harness();
        h.api.fail("efs", "describe-replication-configurations", "ReplicationNotFound", "No replications found");
        let resp = h.registry.dispatch(req("efs_describe_replication", json!({ "filesystem_id": "fs-9" }))).await;
        assert!(resp.is_success());
        assert_eq!(resp.message.as_deref(), Some("No replication configuration found for fs-9"));
        assert_eq!(resp.data.unwrap(), json!({ "replication": null }));
    }

    #[tokio::test]
    async fn put_object_needs_a_body() {
        let h = harness();
        let resp = h
            .registry
            .dispatch(req("s3_put_object", json!({ "bucket_name": "b", "object_key": "k", "confirmation": "CONFIRM" })))
            .await;
        assert_eq!(resp.message.as_deref(), Some("Missing required parameter: content"));

        let resp = h
            .registry
            .dispatch(req(
                "s3_put_object",
                json!({ "bucket_name": "b", "object_key": "k", "content": "a", "content_b64": "YQ==", "confirmation": "CONFIRM" }),
            ))
            .await;
        assert_eq!(resp.status, crate::mcp::types::Status::Error);
        assert!(h.api.calls().is_empty());
    }

    #[tokio::test]
    async fn huge_inline_limit_does_not_overflow() {
        let mut cfg = Config::default();
        cfg.limits.max_inline_object_kb = u64::MAX;
        let h = harness_with(cfg);
        h.api
            .reply("s3api", "head-object", json!({ "ContentLength": 2 }))
            .reply_body("s3api", "get-object", json!({}), b"hi");
        let resp = h
            .registry
            .dispatch(req("s3_get_object", json!({ "bucket_name": "b", "object_key": "k" })))
            .await;
        let data = resp.data.unwrap();
        assert_eq!(data["inlined"], true);
        assert_eq!(data["content"], "hi");
    }

    #[tokio::test]
    async fn glacier_calls_use_own_account() {
        let h = harness();
        h.registry
            .dispatch(req("glacier_list_jobs", json!({ "vault_name": "archive" })))
            .await;
        assert_eq!(h.api.calls()[0].input, json!({ "accountId": "-", "vaultName": "archive" }));

        let resp = h
            .registry
            .dispatch(req(
                "glacier_initiate_job",
                json!({ "vault_name": "archive", "job_type": "archive-retrieval", "confirmation": "CONFIRM" }),
            ))
            .await;
        assert_eq!(resp.message.as_deref(), Some("Missing required parameter: archive_id"));
    }
}

#[cfg(test)]
mod resilience {
    use super::support::*;
    use crate::{
        config::Config,
        errors::AppResult,
        mcp::types::Status,
        provider::{testing::RecordingApi, ApiCall, ApiOutput, CloudApi},
    };
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Arc;

    struct ExplodingApi;

    #[async_trait]
    impl CloudApi for ExplodingApi {
        async fn call(&self, _call: ApiCall) -> AppResult<ApiOutput> {
            panic!("provider exploded")
        }
    }

    #[tokio::test]
    async fn handler_panic_is_contained() {
        let h = harness_on(Config::default(), RecordingApi::new(), Arc::new(ExplodingApi));
        let resp = h.registry.dispatch(req("s3_list_buckets", json!({}))).await;
        assert_eq!(resp.status, Status::Error);
        assert_eq!(resp.message.as_deref(), Some("internal error: s3_list_buckets aborted unexpectedly"));

        let resp = h.registry.dispatch(req("list_aws_profiles", json!({}))).await;
        assert!(resp.is_success());
    }
}

#[cfg(test)]
mod integration {
    use super::support::*;
    use crate::{
        config::Config,
        server::{build_router, AppState},
    };
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        Router,
    };
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app(h: Harness) -> Router {
        build_router(AppState { cfg: Arc::new(Config::default()), registry: Arc::new(h.registry) })
    }

    async fn body_json(resp: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .method("POST")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_never_touches_provider() {
        let h = harness();
        let api = h.api.clone();
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let resp = app(h).oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await, json!({ "status": "success", "message": "Server is running" }));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn api_publishes_catalog() {
        let h = harness();
        let count = h.registry.list_names().len();
        let req = Request::builder().uri("/api").body(Body::empty()).unwrap();
        let resp = app(h).oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        let tools = body["data"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), count);
        let put = tools.iter().find(|t| t["name"] == "s3_put_object").unwrap();
        assert_eq!(put["parameters"]["bucket_name"]["required"], true);
        assert_eq!(put["parameters"]["confirmation"]["required"], false);
        assert_eq!(put["parameters"]["bucket_name"]["type"], "string");
        for body in ["content", "content_b64"] {
            let text = put["parameters"][body]["description"].as_str().unwrap();
            assert!(text.contains("exactly one of content or content_b64"), "{body}: {text}");
        }

        let list = tools.iter().find(|t| t["name"] == "s3_list_buckets").unwrap();
        assert_eq!(list["parameters"]["profile_name"]["required"], false);
        let set = tools.iter().find(|t| t["name"] == "set_profile").unwrap();
        assert_eq!(set["parameters"]["profile_name"]["required"], true);
        assert!(tools.iter().all(|t| t["parameters"].get("profile_name").is_some()));
    }

    #[tokio::test]
    async fn unknown_tool_is_http_200() {
        let resp = app(harness())
            .oneshot(post("/invoke", r#"{"tool_name":"frobnicate","parameters":{}}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await, json!({ "status": "error", "message": "Unknown action: frobnicate" }));
    }

    #[tokio::test]
    async fn malformed_body_is_rejected() {
        let resp = app(harness()).oneshot(post("/invoke", "{not json")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = body_json(resp).await;
        assert_eq!(body["status"], "error");
        assert!(body["message"].as_str().unwrap().starts_with("Invalid JSON"));
    }

    #[tokio::test]
    async fn unknown_path_is_404() {
        let req = Request::builder().uri("/nope").body(Body::empty()).unwrap();
        let resp = app(harness()).oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(resp).await["message"], "Endpoint not found: /nope");
    }

    #[tokio::test]
    async fn serves_over_tcp() {
        let h = harness();
        let api = h.api.clone();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = app(h);
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });

        let resp: Value = reqwest::Client::new()
            .post(format!("http://{addr}/"))
            .json(&json!({ "action": "s3_list_objects", "params": { "bucket_name": "b" } }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(resp, json!({ "status": "success", "data": { "objects": [] } }));
        assert_eq!(api.operations(), vec!["s3api list-objects-v2"]);
    }
}

#[cfg(test)]
mod properties {
    use crate::mcp::registry::validate_required;
    use crate::tools::ToolId;
    use proptest::prelude::*;
    use serde_json::{Map, Value};

    proptest! {
        #[test]
        fn first_missing_required_param_is_reported(
            idx in 0..ToolId::ALL.len(),
            keep in proptest::collection::vec(any::<bool>(), 8),
            filler in "[a-z0-9-]{1,12}",
        ) {
            let def = ToolId::ALL[idx].definition();
            let required: Vec<&str> = def.required().collect();
            let mut params = Map::new();
            for (i, name) in required.iter().enumerate() {
                if keep.get(i).copied().unwrap_or(true) {
                    params.insert(name.to_string(), Value::from(filler.clone()));
                }
            }
            let expected = required.iter().find(|n| !params.contains_key(**n));
            match (validate_required(&def, &params), expected) {
                (Ok(()), None) => {}
                (Err(e), Some(name)) => prop_assert_eq!(e.to_string(), format!("Missing required parameter: {name}")),
                (got, want) => prop_assert!(false, "got {:?}, expected missing {:?}", got, want),
            }
        }
    }

    #[cfg(feature = "proptests")]
    proptest! {
        #![proptest_config(ProptestConfig::with_cases(2000))]
        #[test]
        fn epoch_timestamps_round_to_utc(secs in 0i64..4_102_444_800) {
            let ts = crate::tools::format::Timestamp::from_epoch(secs as f64).unwrap();
            prop_assert!(ts.0.ends_with("+00:00"));
            let parsed = chrono::DateTime::parse_from_rfc3339(&ts.0).unwrap();
            prop_assert_eq!(parsed.timestamp(), secs);
        }
    }
}
