//! services/api/src/adapters/s3.rs
//!
//! Stores the whole habit collection as a JSON array under a single object key.
//! Reads and writes are whole-object GET/PUT calls.

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use habit_tracker_core::domain::Habit;
use habit_tracker_core::ports::{HabitStore, PortError, PortResult};
use tracing::{debug, warn};

use crate::adapters::json::{decode_collection, encode_collection};

/// A `HabitStore` backed by one S3 object.
#[derive(Clone)]
pub struct S3HabitStore {
    client: Client,
    bucket: String,
    key: String,
}

impl S3HabitStore {
    pub fn new(client: Client, bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Builds a client from the default AWS credential chain.
    ///
    /// A custom `endpoint` switches to path-style addressing so S3-compatible
    /// stores (MinIO, LocalStack) work as well.
    pub async fn connect(bucket: &str, key: &str, region: &str, endpoint: Option<&str>) -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        if let Some(endpoint) = endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self::new(Client::from_conf(builder.build()), bucket, key)
    }

    fn location(&self) -> String {
        format!("s3://{}/{}", self.bucket, self.key)
    }
}

#[async_trait]
impl HabitStore for S3HabitStore {
    async fn load(&self) -> PortResult<Vec<Habit>> {
        let output = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&self.key)
            .send()
            .await
        {
            Ok(output) => output,
            Err(e) if e.as_service_error().is_some_and(|se| se.is_no_such_key()) => {
                debug!("{} does not exist yet, starting empty.", self.location());
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(PortError::Persistence(format!(
                    "Failed to read {}: {}",
                    self.location(),
                    e
                )))
            }
        };

        let bytes = output
            .body
            .collect()
            .await
            .map_err(|e| PortError::Persistence(format!("Failed to read {}: {}", self.location(), e)))?
            .into_bytes();

        let raw = String::from_utf8_lossy(&bytes);
        match decode_collection(&raw) {
            Ok(habits) => Ok(habits),
            Err(e) => {
                warn!(
                    "Error reading habits from {}, starting with an empty collection: {}",
                    self.location(),
                    e
                );
                Ok(Vec::new())
            }
        }
    }

    async fn save(&self, habits: &[Habit]) -> PortResult<()> {
        let body = encode_collection(habits)?;
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&self.key)
            .content_type("application/json")
            .body(ByteStream::from(body.into_bytes()))
            .send()
            .await
            .map_err(|e| {
                PortError::Persistence(format!("Failed to write {}: {}", self.location(), e))
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_s3::operation::get_object::{GetObjectError, GetObjectOutput};
    use aws_sdk_s3::operation::put_object::PutObjectOutput;
    use aws_sdk_s3::types::error::{InvalidObjectState, NoSuchKey};
    use aws_smithy_mocks::{mock, mock_client};
    use chrono::{TimeZone, Utc};
    use habit_tracker_core::domain::NewHabit;

    const BUCKET: &str = "habits-tracker-storage-test-default";
    const KEY: &str = "habits.json";

    fn body(raw: &'static str) -> GetObjectOutput {
        GetObjectOutput::builder()
            .body(ByteStream::from_static(raw.as_bytes()))
            .build()
    }

    #[tokio::test]
    async fn missing_object_is_an_empty_collection() {
        let get = mock!(Client::get_object)
            .match_requests(|req| req.bucket() == Some(BUCKET) && req.key() == Some(KEY))
            .then_error(|| GetObjectError::NoSuchKey(NoSuchKey::builder().build()));
        let store = S3HabitStore::new(mock_client!(aws_sdk_s3, [&get]), BUCKET, KEY);

        assert!(store.load().await.unwrap().is_empty());
        assert_eq!(get.num_calls(), 1);
    }

    #[tokio::test]
    async fn stored_array_is_decoded() {
        let get = mock!(Client::get_object).then_output(|| {
            body(
                r#"[{"id": 2, "name": "Walk", "description": null, "totalCompletions": 4,
                    "createdDate": "2025-06-01T00:00:00.000Z", "updatedDate": "2025-06-01T00:00:00.000Z"}]"#,
            )
        });
        let store = S3HabitStore::new(mock_client!(aws_sdk_s3, [&get]), BUCKET, KEY);

        let habits = store.load().await.unwrap();
        assert_eq!(habits.len(), 1);
        assert_eq!(habits[0].id, 2);
        assert_eq!(habits[0].total_completions, 4);
    }

    #[tokio::test]
    async fn unreadable_or_blank_bodies_are_empty_without_a_rewrite() {
        for raw in ["{ not json", "", r#"{"id": 1}"#] {
            // No put_object rule is registered, so any write-back would fail the load.
            let get = mock!(Client::get_object).then_output(move || body(raw));
            let store = S3HabitStore::new(mock_client!(aws_sdk_s3, [&get]), BUCKET, KEY);

            assert!(store.load().await.unwrap().is_empty());
            assert_eq!(get.num_calls(), 1);
        }
    }

    #[tokio::test]
    async fn other_service_errors_are_persistence_failures() {
        let get = mock!(Client::get_object)
            .then_error(|| GetObjectError::InvalidObjectState(InvalidObjectState::builder().build()));
        let store = S3HabitStore::new(mock_client!(aws_sdk_s3, [&get]), BUCKET, KEY);

        let err = store.load().await.unwrap_err();
        assert!(matches!(err, PortError::Persistence(msg) if msg.contains(KEY)));
    }

    #[tokio::test]
    async fn save_puts_the_collection_as_json() {
        let put = mock!(Client::put_object)
            .match_requests(|req| {
                let written = req
                    .body()
                    .bytes()
                    .map(|b| decode_collection(&String::from_utf8_lossy(b)));
                req.bucket() == Some(BUCKET)
                    && req.key() == Some(KEY)
                    && req.content_type() == Some("application/json")
                    && matches!(written, Some(Ok(habits)) if habits.len() == 1 && habits[0].name == "Read")
            })
            .then_output(|| PutObjectOutput::builder().build());
        let store = S3HabitStore::new(mock_client!(aws_sdk_s3, [&put]), BUCKET, KEY);

        let habit = Habit::new(
            1,
            NewHabit {
                name: "Read".to_string(),
                description: None,
            },
            Utc.with_ymd_and_hms(2025, 6, 21, 10, 0, 0).unwrap(),
        );
        store.save(&[habit]).await.unwrap();
        assert_eq!(put.num_calls(), 1);
    }
}
