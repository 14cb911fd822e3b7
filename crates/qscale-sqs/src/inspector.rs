//! SQS-backed queue inspector.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_sqs::error::DisplayErrorContext;
use aws_sdk_sqs::types::QueueAttributeName;
use aws_sdk_sqs::Client;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use qscale_autoscale::{InspectorError, QueueInspector};

/// Attributes summed into the backlog depth.
const BACKLOG_ATTRIBUTES: [QueueAttributeName; 3] = [
    QueueAttributeName::ApproximateNumberOfMessages,
    QueueAttributeName::ApproximateNumberOfMessagesDelayed,
    QueueAttributeName::ApproximateNumberOfMessagesNotVisible,
];

/// Build an SQS client from the default AWS credential chain.
///
/// `endpoint` overrides the service endpoint, e.g. for a local ElasticMQ.
pub async fn connect(region: Option<&str>, endpoint: Option<&str>) -> Client {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = region {
        loader = loader.region(Region::new(region.to_string()));
    }
    if let Some(endpoint) = endpoint {
        loader = loader.endpoint_url(endpoint);
    }

    let shared = loader.load().await;
    info!(region = ?shared.region(), ?endpoint, "sqs client configured");
    Client::new(&shared)
}

/// Measures the backlog of a single SQS queue.
pub struct SqsInspector {
    client: Client,
    queue: String,
    queue_url: OnceCell<String>,
}

impl SqsInspector {
    /// `queue` is either a queue name or a full queue URL.
    pub fn new(client: Client, queue: impl Into<String>) -> Self {
        let queue = queue.into();
        let queue_url = if is_queue_url(&queue) {
            OnceCell::new_with(Some(queue.clone()))
        } else {
            OnceCell::new()
        };

        Self {
            client,
            queue,
            queue_url,
        }
    }

    async fn queue_url(&self) -> Result<&str, InspectorError> {
        let url = self
            .queue_url
            .get_or_try_init(|| async {
                let out = self
                    .client
                    .get_queue_url()
                    .queue_name(&self.queue)
                    .send()
                    .await
                    .map_err(|e| {
                        InspectorError::Request(format!(
                            "could not fetch url of queue {}: {}",
                            self.queue,
                            DisplayErrorContext(&e)
                        ))
                    })?;

                let url = out.queue_url().ok_or_else(|| {
                    InspectorError::Request(format!("no url returned for queue {}", self.queue))
                })?;
                debug!(queue = %self.queue, %url, "resolved queue url");
                Ok::<_, InspectorError>(url.to_string())
            })
            .await?;

        Ok(url.as_str())
    }
}

#[async_trait]
impl QueueInspector for SqsInspector {
    async fn measure_backlog(&self) -> Result<u64, InspectorError> {
        let url = self.queue_url().await?;

        let mut request = self.client.get_queue_attributes().queue_url(url);
        for name in BACKLOG_ATTRIBUTES {
            request = request.attribute_names(name);
        }

        let out = request.send().await.map_err(|e| {
            InspectorError::Request(format!(
                "failed to get attributes of queue {}: {}",
                self.queue,
                DisplayErrorContext(&e)
            ))
        })?;

        let empty = HashMap::new();
        let backlog = backlog_from_attributes(out.attributes().unwrap_or(&empty))?;
        debug!(queue = %self.queue, backlog, "measured queue backlog");
        Ok(backlog)
    }
}

/// Sum the visible, delayed and in-flight message counts.
pub fn backlog_from_attributes(
    attributes: &HashMap<QueueAttributeName, String>,
) -> Result<u64, InspectorError> {
    BACKLOG_ATTRIBUTES.iter().try_fold(0u64, |total, name| {
        let raw = attributes
            .get(name)
            .ok_or_else(|| InspectorError::MissingAttribute(name.as_str().to_string()))?;
        let count: u64 = raw
            .trim()
            .parse()
            .map_err(|_| InspectorError::InvalidAttribute {
                name: name.as_str().to_string(),
                value: raw.clone(),
            })?;
        Ok(total.saturating_add(count))
    })
}

fn is_queue_url(queue: &str) -> bool {
    queue.starts_with("https://") || queue.starts_with("http://")
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_sqs::config::Credentials;
    use serde_json::{json, Value};
    use wiremock::matchers::{body_partial_json, header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(endpoint: &str) -> Client {
        let conf = aws_sdk_sqs::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .endpoint_url(endpoint)
            .credentials_provider(Credentials::new("test", "test", None, None, "static"))
            .build();
        Client::from_conf(conf)
    }

    fn sqs_response(status: u16, body: Value) -> ResponseTemplate {
        ResponseTemplate::new(status).set_body_raw(body.to_string(), "application/x-amz-json-1.0")
    }

    fn action(name: &str) -> wiremock::matchers::HeaderExactMatcher {
        header("x-amz-target", format!("AmazonSQS.{name}").as_str())
    }

    fn counts(visible: &str, delayed: &str, in_flight: &str) -> Value {
        json!({
            "Attributes": {
                "ApproximateNumberOfMessages": visible,
                "ApproximateNumberOfMessagesDelayed": delayed,
                "ApproximateNumberOfMessagesNotVisible": in_flight,
            }
        })
    }

    fn attributes(visible: &str, delayed: &str, in_flight: &str) -> HashMap<QueueAttributeName, String> {
        HashMap::from([
            (QueueAttributeName::ApproximateNumberOfMessages, visible.to_string()),
            (QueueAttributeName::ApproximateNumberOfMessagesDelayed, delayed.to_string()),
            (QueueAttributeName::ApproximateNumberOfMessagesNotVisible, in_flight.to_string()),
        ])
    }

    #[test]
    fn backlog_sums_all_three_counts() {
        assert_eq!(backlog_from_attributes(&attributes("80", "0", "20")), Ok(100));
        assert_eq!(backlog_from_attributes(&attributes("1", "1", "1")), Ok(3));
        assert_eq!(backlog_from_attributes(&attributes("0", "0", "0")), Ok(0));
    }

    #[test]
    fn backlog_missing_attribute() {
        let mut attrs = attributes("1", "2", "3");
        attrs.remove(&QueueAttributeName::ApproximateNumberOfMessagesDelayed);

        assert_eq!(
            backlog_from_attributes(&attrs),
            Err(InspectorError::MissingAttribute(
                "ApproximateNumberOfMessagesDelayed".to_string()
            ))
        );
    }

    #[test]
    fn backlog_non_integer_attribute() {
        let err = backlog_from_attributes(&attributes("1", "lots", "3")).unwrap_err();
        assert_eq!(
            err,
            InspectorError::InvalidAttribute {
                name: "ApproximateNumberOfMessagesDelayed".to_string(),
                value: "lots".to_string(),
            }
        );

        assert!(backlog_from_attributes(&attributes("-1", "0", "0")).is_err());
    }

    #[test]
    fn queue_url_detection() {
        assert!(is_queue_url("https://sqs.us-east-1.amazonaws.com/123456789012/jobs"));
        assert!(is_queue_url("http://localhost:9324/queue/jobs"));
        assert!(!is_queue_url("jobs"));
    }

    #[tokio::test]
    async fn queue_url_is_used_without_lookup() {
        let conf = aws_sdk_sqs::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .build();
        let inspector = SqsInspector::new(
            Client::from_conf(conf),
            "http://localhost:9324/queue/jobs",
        );

        assert_eq!(
            inspector.queue_url().await.unwrap(),
            "http://localhost:9324/queue/jobs"
        );
    }

    #[tokio::test]
    async fn queue_url_is_resolved_once() {
        let server = MockServer::start().await;
        let url = format!("{}/000000000000/jobs", server.uri());

        Mock::given(method("POST"))
            .and(action("GetQueueUrl"))
            .and(body_partial_json(json!({ "QueueName": "jobs" })))
            .respond_with(sqs_response(200, json!({ "QueueUrl": url })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(action("GetQueueAttributes"))
            .and(body_partial_json(json!({ "QueueUrl": url })))
            .respond_with(sqs_response(200, counts("80", "5", "15")))
            .expect(2)
            .mount(&server)
            .await;

        let inspector = SqsInspector::new(client(&server.uri()), "jobs");
        assert_eq!(inspector.measure_backlog().await, Ok(100));
        assert_eq!(inspector.measure_backlog().await, Ok(100));
    }

    #[tokio::test]
    async fn failed_lookup_is_retried_on_next_measurement() {
        let server = MockServer::start().await;
        let url = format!("{}/000000000000/jobs", server.uri());

        Mock::given(method("POST"))
            .and(action("GetQueueUrl"))
            .respond_with(sqs_response(
                400,
                json!({
                    "__type": "com.amazonaws.sqs#QueueDoesNotExist",
                    "message": "The specified queue does not exist.",
                }),
            ))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(action("GetQueueUrl"))
            .respond_with(sqs_response(200, json!({ "QueueUrl": url })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(action("GetQueueAttributes"))
            .respond_with(sqs_response(200, counts("3", "0", "0")))
            .expect(1)
            .mount(&server)
            .await;

        let inspector = SqsInspector::new(client(&server.uri()), "jobs");
        assert!(matches!(
            inspector.measure_backlog().await,
            Err(InspectorError::Request(_))
        ));
        assert_eq!(inspector.measure_backlog().await, Ok(3));
    }

    #[tokio::test]
    async fn missing_attributes_are_a_measurement_error() {
        let server = MockServer::start().await;
        let url = format!("{}/000000000000/jobs", server.uri());

        Mock::given(method("POST"))
            .and(action("GetQueueUrl"))
            .respond_with(sqs_response(500, json!({})))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(action("GetQueueAttributes"))
            .respond_with(sqs_response(200, json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let inspector = SqsInspector::new(client(&server.uri()), url);
        assert_eq!(
            inspector.measure_backlog().await,
            Err(InspectorError::MissingAttribute(
                "ApproximateNumberOfMessages".to_string()
            ))
        );
    }
}
