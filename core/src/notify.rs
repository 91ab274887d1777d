//! Fire-and-forget push notification dispatcher.

use serde_json::json;

use crate::gateway::Gateway;
use crate::gateway::OutboundRequest;

#[derive(Debug, Clone)]
pub struct Notifier {
    gateway: Gateway,
    push_url: String,
}

impl Notifier {
    pub fn new(gateway: Gateway, push_url: impl Into<String>) -> Self {
        Self {
            gateway,
            push_url: push_url.into(),
        }
    }

    /// Sends a push message to one device token. Best effort: failures
    /// are logged and never reach the caller.
    pub async fn send(&self, device_token: &str, title: &str, body: &str) {
        let payload = json!({
            "to": device_token,
            "title": title,
            "body": body,
        });

        match self
            .gateway
            .send(OutboundRequest::post_json(self.push_url.clone(), payload))
            .await
        {
            Ok(response) if !response.is_success() => {
                tracing::warn!("push endpoint returned status {}", response.status);
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("push notification failed: {e}");
            }
        }
    }
}
