//! Remote invocation of the scheduled backup function.

use async_trait::async_trait;
use aws_sdk_lambda::error::DisplayErrorContext;
use aws_sdk_lambda::primitives::Blob;
use aws_sdk_lambda::types::InvocationType;
use aws_sdk_lambda::Client;
use bytes::Bytes;
use serde::Serialize;
use tracing::{error, info};

use crate::dynamo::load_sdk_config;
use crate::error::ProviderError;
use crate::{Error, Result};

/// Default name of the deployed backup function
pub const DEFAULT_FUNCTION_NAME: &str = "DynamoDBBackupFunction";

/// Raw response of a synchronous invocation
#[derive(Debug, Clone, Serialize)]
pub struct InvocationResult {
    pub status_code: i32,
    /// Set when the function itself raised an error
    pub function_error: Option<String>,
    #[serde(serialize_with = "serialize_payload")]
    pub payload: Bytes,
}

impl InvocationResult {
    /// Payload parsed as JSON, if it is JSON
    pub fn payload_json(&self) -> Option<serde_json::Value> {
        serde_json::from_slice(&self.payload).ok()
    }

    pub fn payload_text(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }

    pub fn succeeded(&self) -> bool {
        self.function_error.is_none() && (200..300).contains(&self.status_code)
    }
}

fn serialize_payload<S: serde::Serializer>(payload: &Bytes, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    match serde_json::from_slice::<serde_json::Value>(payload) {
        Ok(value) => value.serialize(serializer),
        Err(_) => serializer.serialize_str(&String::from_utf8_lossy(payload)),
    }
}

/// Synchronous function invocation
#[async_trait]
pub trait FunctionInvoker: Send + Sync {
    async fn invoke(&self, function_name: &str, payload: Bytes) -> Result<InvocationResult>;
}

/// Lambda implementation of [`FunctionInvoker`]
#[derive(Clone)]
pub struct LambdaInvoker {
    client: Client,
}

impl LambdaInvoker {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub async fn connect(region: &str) -> Self {
        let sdk_config = load_sdk_config(region, None).await;
        info!("Created Lambda client for region: {}", region);
        Self::new(Client::new(&sdk_config))
    }
}

#[async_trait]
impl FunctionInvoker for LambdaInvoker {
    async fn invoke(&self, function_name: &str, payload: Bytes) -> Result<InvocationResult> {
        let output = self
            .client
            .invoke()
            .function_name(function_name)
            .invocation_type(InvocationType::RequestResponse)
            .payload(Blob::new(payload.to_vec()))
            .send()
            .await
            .map_err(|e| {
                Error::Provider(ProviderError::api(
                    "Invoke",
                    DisplayErrorContext(&e).to_string(),
                ))
            })?;

        Ok(InvocationResult {
            status_code: output.status_code(),
            function_error: output.function_error().map(str::to_string),
            payload: output
                .payload()
                .map(|blob| Bytes::copy_from_slice(blob.as_ref()))
                .unwrap_or_default(),
        })
    }
}

/// Invoke the backup function with an empty JSON payload and wait for it.
pub async fn trigger_backup(invoker: &dyn FunctionInvoker, function_name: &str) -> Result<InvocationResult> {
    info!("Triggering backup function {}", function_name);
    let result = invoker
        .invoke(function_name, Bytes::from_static(b"{}"))
        .await?;

    match &result.function_error {
        Some(kind) => error!(
            "Backup function {} reported {}: {}",
            function_name,
            kind,
            result.payload_text()
        ),
        None => info!("Backup function {} returned status {}", function_name, result.status_code),
    }

    Ok(result)
}
