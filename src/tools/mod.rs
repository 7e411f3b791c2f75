pub mod backup;
pub mod ebs;
pub mod efs;
pub mod format;
pub mod fsx;
pub mod glacier;
pub mod profiles;
pub mod s3;
pub mod s3_object_lambda;
pub mod snow;
pub mod storage_gateway;

use crate::{
    errors::{AppError, AppResult},
    mcp::{
        registry::PROFILE_OVERRIDE,
        types::{ParamSpec, ParamType, ToolDefinition},
    },
    profiles::ProfileStore,
    provider::{ApiCall, ApiOutput, DynCloudApi},
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Literal that creating and destructive tools require in `confirmation`.
pub const CONFIRMATION_SENTINEL: &str = "CONFIRM";

/// Everything a handler may use, fixed for the lifetime of one request.
pub struct CallContext {
    pub profile: Option<String>,
    pub region: String,
    pub api: DynCloudApi,
    pub profiles: Arc<ProfileStore>,
    pub max_inline_bytes: u64,
}

impl CallContext {
    pub fn request(&self, service: &'static str, operation: &'static str, input: Value) -> ApiCall {
        ApiCall {
            service,
            operation,
            input,
            upload: None,
            download: false,
            profile: self.profile.clone(),
            region: self.region.clone(),
        }
    }

    pub async fn send(&self, call: ApiCall) -> AppResult<ApiOutput> {
        self.api.call(call).await
    }

    /// Runs one operation and decodes its JSON output.
    pub async fn invoke<T: DeserializeOwned>(
        &self,
        service: &'static str,
        operation: &'static str,
        input: Value,
    ) -> AppResult<T> {
        let out = self.send(self.request(service, operation, input)).await?;
        decode(service, operation, out.output)
    }
}

pub fn decode<T: DeserializeOwned>(service: &str, operation: &str, output: Value) -> AppResult<T> {
    let output = if output.is_null() { Value::Object(Map::new()) } else { output };
    serde_json::from_value(output)
        .map_err(|e| AppError::Internal(format!("unexpected output from {service} {operation}: {e}")))
}

/// What a handler hands back to the dispatcher.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub message: Option<String>,
    pub data: Value,
}

impl ToolOutput {
    pub fn data(data: Value) -> Self {
        Self { message: None, data }
    }

    pub fn done(message: impl Into<String>, data: Value) -> Self {
        Self { message: Some(message.into()), data }
    }
}

/// Borrowed view over request parameters with typed accessors.
#[derive(Clone, Copy)]
pub struct Params<'a>(pub &'a Map<String, Value>);

impl<'a> Params<'a> {
    /// Absent, `null`, `""` and `[]` all count as not supplied.
    pub fn is_blank(value: Option<&Value>) -> bool {
        match value {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.is_empty(),
            Some(Value::Array(a)) => a.is_empty(),
            Some(_) => false,
        }
    }

    fn present(&self, name: &str) -> Option<&'a Value> {
        let v = self.0.get(name);
        if Self::is_blank(v) { None } else { v }
    }

    pub fn str(&self, name: &str) -> AppResult<&'a str> {
        self.opt_str(name)?.ok_or_else(|| AppError::MissingParameter(name.to_string()))
    }

    pub fn opt_str(&self, name: &str) -> AppResult<Option<&'a str>> {
        match self.present(name) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(_) => Err(AppError::invalid(name, "expected a string")),
        }
    }

    /// Integers may arrive as JSON numbers or numeric strings.
    pub fn opt_int(&self, name: &str) -> AppResult<Option<i64>> {
        match self.present(name) {
            None => Ok(None),
            Some(Value::Number(n)) => n.as_i64().map(Some).ok_or_else(|| AppError::invalid(name, "expected an integer")),
            Some(Value::String(s)) => s
                .trim()
                .parse::<i64>()
                .map(Some)
                .map_err(|_| AppError::invalid(name, "expected an integer")),
            Some(_) => Err(AppError::invalid(name, "expected an integer")),
        }
    }

    pub fn int(&self, name: &str) -> AppResult<i64> {
        self.opt_int(name)?.ok_or_else(|| AppError::MissingParameter(name.to_string()))
    }

    /// A list of strings, given as a JSON array or a comma separated string.
    pub fn opt_str_list(&self, name: &str) -> AppResult<Option<Vec<String>>> {
        match self.present(name) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(
                s.split(',').map(str::trim).filter(|p| !p.is_empty()).map(str::to_string).collect(),
            )),
            Some(Value::Array(items)) => items
                .iter()
                .map(|v| v.as_str().map(str::to_string).ok_or_else(|| AppError::invalid(name, "expected strings")))
                .collect::<AppResult<Vec<_>>>()
                .map(Some),
            Some(_) => Err(AppError::invalid(name, "expected a list of strings")),
        }
    }

    /// Gate for creating and destructive tools.
    pub fn confirm(&self, operation: &'static str, resource: &'static str, target: impl Into<String>) -> AppResult<()> {
        match self.opt_str("confirmation") {
            Ok(Some(CONFIRMATION_SENTINEL)) => Ok(()),
            _ => Err(AppError::ConfirmationRequired {
                operation,
                resource,
                target: target.into(),
                sentinel: CONFIRMATION_SENTINEL,
            }),
        }
    }
}

macro_rules! catalog {
    (@required required) => { true };
    (@required optional) => { false };
    ($(
        $id:ident => $name:literal, $handler:path, $desc:literal,
        [ $( $param:literal : $ty:ident $req:ident $pdesc:literal ),* $(,)? ]
    );* $(;)?) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum ToolId { $($id),* }

        impl ToolId {
            pub const ALL: &'static [ToolId] = &[$(ToolId::$id),*];

            pub fn name(self) -> &'static str {
                match self { $(ToolId::$id => $name),* }
            }

            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($name => Some(ToolId::$id),)*
                    _ => None,
                }
            }

            /// Every tool also advertises the per-request profile override.
            pub fn definition(self) -> ToolDefinition {
                let mut def = match self {
                    $(ToolId::$id => ToolDefinition {
                        name: $name.to_string(),
                        description: $desc.to_string(),
                        parameters: vec![$((
                            $param.to_string(),
                            ParamSpec {
                                ty: ParamType::$ty,
                                description: $pdesc.to_string(),
                                required: catalog!(@required $req),
                            },
                        )),*],
                    },)*
                };
                if !def.parameters.iter().any(|(n, _)| n == PROFILE_OVERRIDE) {
                    def.parameters.push((
                        PROFILE_OVERRIDE.to_string(),
                        ParamSpec {
                            ty: ParamType::String,
                            description: "Profile for this call only; the active profile is unchanged".to_string(),
                            required: false,
                        },
                    ));
                }
                def
            }

            pub async fn execute(self, ctx: &CallContext, params: Params<'_>) -> AppResult<ToolOutput> {
                match self { $(ToolId::$id => $handler(ctx, params).await,)* }
            }
        }
    };
}

catalog! {
    ListAwsProfiles => "list_aws_profiles", profiles::list_aws_profiles,
        "List credential profiles found in the local AWS credential and config files", [];
    SetProfile => "set_profile", profiles::set_profile,
        "Select the credential profile used by subsequent calls", [
        "profile_name": String required "Profile name as returned by list_aws_profiles",
    ];

    S3ListBuckets => "s3_list_buckets", s3::list_buckets, "List all S3 buckets", [];
    S3ListObjects => "s3_list_objects", s3::list_objects, "List objects in an S3 bucket", [
        "bucket_name": String required "Bucket to list",
        "prefix": String optional "Only keys starting with this prefix",
    ];
    S3GetObject => "s3_get_object", s3::get_object,
        "Read an S3 object; bodies over the inline limit are reported without content", [
        "bucket_name": String required "Bucket holding the object",
        "object_key": String required "Object key",
    ];
    S3PutObject => "s3_put_object", s3::put_object, "Write an S3 object", [
        "bucket_name": String required "Destination bucket",
        "object_key": String required "Object key",
        "content": String optional "UTF-8 body; exactly one of content or content_b64 is required",
        "content_b64": String optional "Base64 encoded body; exactly one of content or content_b64 is required",
        "content_type": String optional "MIME type stored with the object",
        "confirmation": String optional "Must be CONFIRM to write the object",
    ];
    S3DeleteObject => "s3_delete_object", s3::delete_object, "Delete an S3 object", [
        "bucket_name": String required "Bucket holding the object",
        "object_key": String required "Object key",
        "confirmation": String optional "Must be CONFIRM to delete the object",
    ];
    S3GetBucketLocation => "s3_get_bucket_location", s3::get_bucket_location,
        "Get the region an S3 bucket lives in", [
        "bucket_name": String required "Bucket name",
    ];
    S3GetBucketPolicy => "s3_get_bucket_policy", s3::get_bucket_policy, "Get the policy attached to an S3 bucket", [
        "bucket_name": String required "Bucket name",
    ];
    S3GetBucketVersioning => "s3_get_bucket_versioning", s3::get_bucket_versioning,
        "Get the versioning status of an S3 bucket", [
        "bucket_name": String required "Bucket name",
    ];
    S3GetObjectAcl => "s3_get_object_acl", s3::get_object_acl, "Get the access control list of an S3 object", [
        "bucket_name": String required "Bucket holding the object",
        "object_key": String required "Object key",
    ];
    S3CreateBucket => "s3_create_bucket", s3::create_bucket, "Create an S3 bucket in the current region", [
        "bucket_name": String required "Name of the new bucket",
        "confirmation": String optional "Must be CONFIRM to create the bucket",
    ];
    S3DeleteBucket => "s3_delete_bucket", s3::delete_bucket, "Delete an empty S3 bucket", [
        "bucket_name": String required "Bucket to delete",
        "confirmation": String optional "Must be CONFIRM to delete the bucket",
    ];

    EbsListVolumes => "ebs_list_volumes", ebs::list_volumes, "List EBS volumes", [];
    EbsCreateVolume => "ebs_create_volume", ebs::create_volume, "Create an EBS volume", [
        "size": Integer required "Size in GiB",
        "volume_type": String optional "Volume type (default gp3)",
        "availability_zone": String optional "Availability zone (default: first zone of the region)",
        "confirmation": String optional "Must be CONFIRM to create the volume",
    ];
    EbsDeleteVolume => "ebs_delete_volume", ebs::delete_volume, "Delete an EBS volume", [
        "volume_id": String required "Volume to delete",
        "confirmation": String optional "Must be CONFIRM to delete the volume",
    ];
    EbsCreateSnapshot => "ebs_create_snapshot", ebs::create_snapshot, "Snapshot an EBS volume", [
        "volume_id": String required "Volume to snapshot",
        "description": String optional "Snapshot description",
        "confirmation": String optional "Must be CONFIRM to create the snapshot",
    ];
    EbsListSnapshots => "ebs_list_snapshots", ebs::list_snapshots, "List EBS snapshots", [
        "owner_id": String optional "Owner account id or alias (default self)",
    ];

    EfsListFilesystems => "efs_list_filesystems", efs::list_filesystems, "List EFS file systems", [];
    EfsCreateFilesystem => "efs_create_filesystem", efs::create_filesystem,
        "Create an encrypted general purpose EFS file system", [
        "name": String required "Value of the Name tag",
        "confirmation": String optional "Must be CONFIRM to create the file system",
    ];
    EfsDeleteFilesystem => "efs_delete_filesystem", efs::delete_filesystem, "Delete an EFS file system", [
        "filesystem_id": String required "File system to delete",
        "confirmation": String optional "Must be CONFIRM to delete the file system",
    ];
    EfsCreateMountTarget => "efs_create_mount_target", efs::create_mount_target,
        "Create a mount target for an EFS file system", [
        "filesystem_id": String required "File system id",
        "subnet_id": String required "Subnet for the mount target",
        "security_groups": Array optional "Security group ids",
        "confirmation": String optional "Must be CONFIRM to create the mount target",
    ];
    EfsListMountTargets => "efs_list_mount_targets", efs::list_mount_targets,
        "List mount targets of an EFS file system", [
        "filesystem_id": String required "File system id",
    ];
    EfsDescribeReplication => "efs_describe_replication", efs::describe_replication,
        "Describe the replication configuration of an EFS file system", [
        "filesystem_id": String required "Source file system id",
    ];

    FsxListFilesystems => "fsx_list_filesystems", fsx::list_filesystems, "List FSx file systems", [];
    FsxDescribeFilesystem => "fsx_describe_filesystem", fsx::describe_filesystem,
        "Describe one FSx file system", [
        "filesystem_id": String required "File system id",
    ];
    FsxCreateBackup => "fsx_create_backup", fsx::create_backup, "Back up an FSx file system", [
        "filesystem_id": String required "File system id",
        "backup_name": String required "Value of the Name tag",
        "confirmation": String optional "Must be CONFIRM to create the backup",
    ];
    FsxListBackups => "fsx_list_backups", fsx::list_backups, "List FSx backups", [];
    FsxListReplicas => "fsx_list_replicas", fsx::list_replicas,
        "List FSx file systems tagged as replicas (ReplicaOf)", [
        "source_filesystem_id": String optional "Only replicas of this file system",
    ];

    StorageGatewayListGateways => "storage_gateway_list_gateways", storage_gateway::list_gateways,
        "List Storage Gateway appliances", [];
    StorageGatewayListVolumes => "storage_gateway_list_volumes", storage_gateway::list_volumes,
        "List Storage Gateway volumes", [
        "gateway_id": String optional "Gateway ARN to filter by",
    ];
    StorageGatewayDescribeGateway => "storage_gateway_describe_gateway", storage_gateway::describe_gateway,
        "Describe one Storage Gateway", [
        "gateway_id": String required "Gateway ARN",
    ];
    StorageGatewayListFileShares => "storage_gateway_list_file_shares", storage_gateway::list_file_shares,
        "List Storage Gateway file shares", [
        "gateway_id": String optional "Gateway ARN to filter by",
    ];

    GlacierListVaults => "glacier_list_vaults", glacier::list_vaults, "List Glacier vaults", [];
    GlacierCreateVault => "glacier_create_vault", glacier::create_vault, "Create a Glacier vault", [
        "vault_name": String required "Name of the new vault",
        "confirmation": String optional "Must be CONFIRM to create the vault",
    ];
    GlacierDeleteVault => "glacier_delete_vault", glacier::delete_vault, "Delete an empty Glacier vault", [
        "vault_name": String required "Vault to delete",
        "confirmation": String optional "Must be CONFIRM to delete the vault",
    ];
    GlacierDescribeVault => "glacier_describe_vault", glacier::describe_vault, "Describe one Glacier vault", [
        "vault_name": String required "Vault name",
    ];
    GlacierInitiateJob => "glacier_initiate_job", glacier::initiate_job,
        "Start an inventory or archive retrieval job", [
        "vault_name": String required "Vault name",
        "job_type": String required "inventory-retrieval or archive-retrieval",
        "archive_id": String optional "Archive to retrieve (archive-retrieval only)",
        "description": String optional "Job description",
        "confirmation": String optional "Must be CONFIRM to start the job",
    ];
    GlacierListJobs => "glacier_list_jobs", glacier::list_jobs, "List retrieval jobs of a Glacier vault", [
        "vault_name": String required "Vault name",
    ];
    GlacierDeepArchiveListVaults => "glacier_deep_archive_list_vaults", glacier::list_deep_archive_vaults,
        "List vaults usable for Deep Archive retrievals", [];

    SnowListJobs => "snow_list_jobs", snow::list_jobs, "List Snow Family jobs", [];
    SnowDescribeJob => "snow_describe_job", snow::describe_job, "Describe one Snow Family job", [
        "job_id": String required "Job id",
    ];
    SnowListClusters => "snow_list_clusters", snow::list_clusters, "List Snow Family clusters", [];

    BackupListBackupVaults => "backup_list_backup_vaults", backup::list_backup_vaults, "List AWS Backup vaults", [];
    BackupListBackupPlans => "backup_list_backup_plans", backup::list_backup_plans, "List AWS Backup plans", [];
    BackupListRecoveryPoints => "backup_list_recovery_points", backup::list_recovery_points,
        "List recovery points stored in an AWS Backup vault", [
        "backup_vault_name": String required "Backup vault name",
    ];

    S3ObjectLambdaListAccessPoints => "s3_object_lambda_list_access_points",
        s3_object_lambda::list_access_points, "List S3 Object Lambda access points of the caller's account", [];
}
