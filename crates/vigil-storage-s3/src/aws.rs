//! AWS SDK implementation of the object-store client contract.

use aws_sdk_s3::Client;
use chrono::{DateTime, Utc};
use vigil_storage::{StorageError, StorageErrorKind};

use crate::client::{ObjectClient, ObjectRecord};

/// Backend identifier for error messages.
const BACKEND: &str = "S3";

/// [`ObjectClient`] backed by the AWS SDK.
///
/// Credentials come from the default provider chain (environment,
/// profile, instance role). The SDK is async; the client owns a
/// current-thread tokio runtime and bridges each call with `block_on`,
/// keeping the poll loop synchronous.
pub struct AwsObjectClient {
    client: Client,
    runtime: tokio::runtime::Runtime,
    endpoint: Option<String>,
    region: String,
}

impl AwsObjectClient {
    /// Connect to a region of AWS S3, or to a custom S3-compatible
    /// endpoint when `endpoint` is given.
    pub fn connect(region: &str, endpoint: Option<&str>) -> Result<Self, StorageError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| {
                StorageError::new(StorageErrorKind::Other)
                    .with_backend(BACKEND)
                    .with_source(e)
            })?;

        let client = runtime.block_on(Self::build_client(region, endpoint));

        Ok(Self {
            client,
            runtime,
            endpoint: endpoint.map(ToOwned::to_owned),
            region: region.to_owned(),
        })
    }

    async fn build_client(region: &str, endpoint: Option<&str>) -> Client {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region.to_owned()));

        if let Some(endpoint) = endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        let sdk_config = loader.load().await;

        // Custom endpoints (LocalStack, MinIO) require path-style
        // addressing (endpoint/bucket/key) instead of the default
        // virtual-hosted-style (bucket.endpoint/key).
        if endpoint.is_some() {
            let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
                .force_path_style(true)
                .build();
            return Client::from_conf(s3_config);
        }

        Client::new(&sdk_config)
    }
}

impl ObjectClient for AwsObjectClient {
    fn list(&self, bucket: &str, prefix: &str) -> Result<Option<Vec<ObjectRecord>>, StorageError> {
        self.runtime.block_on(async {
            let mut records = Vec::new();
            let mut continuation: Option<String> = None;

            loop {
                let mut request = self.client.list_objects_v2().bucket(bucket).prefix(prefix);
                if let Some(token) = continuation.take() {
                    request = request.continuation_token(token);
                }

                let output = match request.send().await {
                    Ok(output) => output,
                    Err(err) => {
                        let service_err = err.into_service_error();
                        if service_err.is_no_such_bucket() {
                            return Ok(None);
                        }
                        return Err(StorageError::new(StorageErrorKind::Unavailable)
                            .with_backend(BACKEND)
                            .with_target(format!("bucket '{bucket}'"))
                            .with_source(service_err));
                    }
                };

                for object in output.contents() {
                    let Some(key) = object.key() else {
                        continue;
                    };
                    records.push(ObjectRecord {
                        key: key.to_owned(),
                        size: object.size().unwrap_or(0),
                        last_modified: object
                            .last_modified()
                            .map_or(DateTime::UNIX_EPOCH, to_chrono),
                        etag: object
                            .e_tag()
                            .map(|etag| etag.trim_matches('"').to_owned())
                            .unwrap_or_default(),
                    });
                }

                if output.is_truncated() == Some(true) {
                    continuation = output.next_continuation_token().map(ToOwned::to_owned);
                } else {
                    return Ok(Some(records));
                }
            }
        })
    }

    fn description(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => format!("object store at '{endpoint}'"),
            None => format!("S3 region '{}'", self.region),
        }
    }
}

/// Convert an SDK timestamp to chrono.
fn to_chrono(stamp: &aws_sdk_s3::primitives::DateTime) -> DateTime<Utc> {
    DateTime::from_timestamp(stamp.secs(), stamp.subsec_nanos()).unwrap_or(DateTime::UNIX_EPOCH)
}
