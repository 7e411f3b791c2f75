//! The seam between tool handlers and the cloud provider.

pub mod cli;

use crate::errors::AppResult;
use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use std::sync::Arc;

pub type DynCloudApi = Arc<dyn CloudApi + Send + Sync + 'static>;

/// One provider API operation, addressed the way the provider names it
/// (`s3api` / `list-objects-v2`) with input members under their wire names.
#[derive(Debug, Clone)]
pub struct ApiCall {
    pub service: &'static str,
    pub operation: &'static str,
    pub input: Value,
    /// Streaming request body (object uploads).
    pub upload: Option<Bytes>,
    /// Whether the operation returns a streaming body that must be captured.
    pub download: bool,
    pub profile: Option<String>,
    pub region: String,
}

#[derive(Debug, Clone, Default)]
pub struct ApiOutput {
    pub output: Value,
    pub body: Option<Bytes>,
}

#[async_trait]
pub trait CloudApi {
    async fn call(&self, call: ApiCall) -> AppResult<ApiOutput>;
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use crate::errors::AppError;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    #[derive(Clone)]
    enum Reply {
        Output(Value, Option<Bytes>),
        Fail { code: String, message: String },
    }

    /// Records every call and answers from canned replies (an empty object by default).
    #[derive(Default)]
    pub struct RecordingApi {
        calls: Mutex<Vec<ApiCall>>,
        replies: Mutex<HashMap<(&'static str, &'static str), Reply>>,
    }

    impl RecordingApi {
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        pub fn reply(&self, service: &'static str, operation: &'static str, output: Value) -> &Self {
            self.replies.lock().insert((service, operation), Reply::Output(output, None));
            self
        }

        pub fn reply_body(&self, service: &'static str, operation: &'static str, output: Value, body: &'static [u8]) -> &Self {
            self.replies
                .lock()
                .insert((service, operation), Reply::Output(output, Some(Bytes::from_static(body))));
            self
        }

        pub fn fail(&self, service: &'static str, operation: &'static str, code: &str, message: &str) -> &Self {
            self.replies.lock().insert(
                (service, operation),
                Reply::Fail { code: code.to_string(), message: message.to_string() },
            );
            self
        }

        pub fn calls(&self) -> Vec<ApiCall> {
            self.calls.lock().clone()
        }

        pub fn operations(&self) -> Vec<String> {
            self.calls.lock().iter().map(|c| format!("{} {}", c.service, c.operation)).collect()
        }
    }

    #[async_trait]
    impl CloudApi for RecordingApi {
        async fn call(&self, call: ApiCall) -> AppResult<ApiOutput> {
            let key = (call.service, call.operation);
            self.calls.lock().push(call);
            let reply = self.replies.lock().get(&key).cloned();
            match reply {
                Some(Reply::Output(output, body)) => Ok(ApiOutput { output, body }),
                Some(Reply::Fail { code, message }) => Err(AppError::Downstream {
                    operation: format!("{} {}", key.0, key.1),
                    code: Some(code),
                    message,
                }),
                None => Ok(ApiOutput { output: Value::Object(Default::default()), body: None }),
            }
        }
    }
}
