//! Activity feed sinks.

use crate::domain::ActivityEvent;
use crate::ports::{ActivityFeed, FeedError};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};

/// POSTs each event as JSON to the feed service.
pub struct HttpActivityFeed {
    http_client: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

impl HttpActivityFeed {
    pub fn new(url: String, api_key: Option<String>, timeout: Duration) -> Result<Self, FeedError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FeedError::Transport(e.to_string()))?;

        Ok(Self {
            http_client,
            url,
            api_key,
        })
    }
}

#[async_trait]
impl ActivityFeed for HttpActivityFeed {
    async fn add_activity(&self, event: &ActivityEvent) -> Result<(), FeedError> {
        let mut request = self.http_client.post(&self.url).json(event);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FeedError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Rejected(status.as_u16()));
        }

        debug!(verb = %event.verb, target = %event.target, "activity delivered");
        Ok(())
    }
}

/// Sink used when no feed is configured: events only reach the log.
#[derive(Debug, Default)]
pub struct LogOnlyFeed;

#[async_trait]
impl ActivityFeed for LogOnlyFeed {
    async fn add_activity(&self, event: &ActivityEvent) -> Result<(), FeedError> {
        info!(
            verb = %event.verb,
            actor = %event.actor,
            object = %event.object,
            target = %event.target,
            "activity (no feed configured)"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{TransactionId, Verb};
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn event() -> ActivityEvent {
        ActivityEvent::new(Verb::Confirm, "alice", "ipfs://a", TransactionId::new("aa")).with_name("Alice")
    }

    #[tokio::test]
    async fn test_posts_event_with_bearer_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/activities"))
            .and(header("authorization", "Bearer feed-key"))
            .and(body_json(json!({
                "actor": "alice",
                "object": "ipfs://a",
                "target": "aa",
                "verb": "confirm",
                "name": "Alice"
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let feed = HttpActivityFeed::new(
            format!("{}/activities", server.uri()),
            Some("feed-key".into()),
            Duration::from_secs(5),
        )
        .unwrap();
        feed.add_activity(&event()).await.unwrap();
    }

    #[tokio::test]
    async fn test_rejected_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let feed = HttpActivityFeed::new(server.uri(), None, Duration::from_secs(5)).unwrap();
        let err = feed.add_activity(&event()).await.unwrap_err();
        assert!(matches!(err, FeedError::Rejected(503)));
    }

    #[tokio::test]
    async fn test_log_only_feed_accepts() {
        assert!(LogOnlyFeed.add_activity(&event()).await.is_ok());
    }
}
