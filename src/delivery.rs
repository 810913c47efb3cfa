//! Delivery collaborators
//!
//! The pipeline ends here: resolve a handle to a deliverable entity and send
//! the message body. The Telegram Bot API implementation is thin glue over
//! reqwest; the dry-run implementation backs tests and `--dry-run`.

use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;
use tracing::info;

pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// A network entity messages can be delivered to
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRef {
    pub chat_id: String,
}

/// Connect/authenticate/send lifecycle of a messaging backend
#[async_trait]
pub trait Delivery: Send + Sync {
    async fn connect(&mut self) -> Result<()>;
    async fn disconnect(&mut self) -> Result<()>;
    fn is_connected(&self) -> bool;
    async fn resolve_handle(&self, handle: &str) -> Result<EntityRef>;
    /// Deliver text to the entity, returning the network's message id
    async fn send(&self, entity: &EntityRef, text: &str) -> Result<i64>;
}

/// Telegram Bot API delivery
pub struct BotApiDelivery {
    token: String,
    base_url: String,
    client: reqwest::Client,
    connected: bool,
}

impl BotApiDelivery {
    pub fn new(token: &str, timeout: Duration) -> Self {
        Self::with_base_url(token, TELEGRAM_API_BASE, timeout)
    }

    pub fn with_base_url(token: &str, base_url: &str, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to build HTTP client");
        Self {
            token: token.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            connected: false,
        }
    }

    fn url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }
}

#[async_trait]
impl Delivery for BotApiDelivery {
    /// Validate the token against getMe
    async fn connect(&mut self) -> Result<()> {
        #[derive(Deserialize)]
        struct GetMeResponse {
            ok: bool,
        }

        let response = self.client.get(self.url("getMe")).send().await?;
        let parsed: GetMeResponse = response.json().await?;
        if !parsed.ok {
            return Err(Error::Delivery("bot token rejected".to_string()));
        }

        self.connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.connected = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    /// The Bot API addresses chats by @username or numeric id directly, so
    /// resolution is a validation step rather than a lookup.
    async fn resolve_handle(&self, handle: &str) -> Result<EntityRef> {
        let handle = handle.trim();
        if handle.is_empty() {
            return Err(Error::Delivery("empty handle".to_string()));
        }
        Ok(EntityRef {
            chat_id: handle.to_string(),
        })
    }

    async fn send(&self, entity: &EntityRef, text: &str) -> Result<i64> {
        #[derive(Deserialize)]
        struct SendResponse {
            ok: bool,
            result: Option<SentMessage>,
            description: Option<String>,
        }
        #[derive(Deserialize)]
        struct SentMessage {
            message_id: i64,
        }

        let response = self
            .client
            .post(self.url("sendMessage"))
            .json(&serde_json::json!({
                "chat_id": entity.chat_id,
                "text": text
            }))
            .send()
            .await?;

        let parsed: SendResponse = response.json().await?;
        if !parsed.ok {
            return Err(Error::Delivery(
                parsed
                    .description
                    .unwrap_or_else(|| "sendMessage failed".to_string()),
            ));
        }

        parsed
            .result
            .map(|m| m.message_id)
            .ok_or_else(|| Error::Delivery("sendMessage returned no result".to_string()))
    }
}

/// Delivery that logs instead of hitting the network
pub struct DryRunDelivery {
    connected: bool,
    next_id: AtomicI64,
}

impl DryRunDelivery {
    pub fn new() -> Self {
        Self {
            connected: false,
            next_id: AtomicI64::new(1),
        }
    }
}

impl Default for DryRunDelivery {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Delivery for DryRunDelivery {
    async fn connect(&mut self) -> Result<()> {
        self.connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.connected = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn resolve_handle(&self, handle: &str) -> Result<EntityRef> {
        Ok(EntityRef {
            chat_id: handle.trim().to_string(),
        })
    }

    async fn send(&self, entity: &EntityRef, text: &str) -> Result<i64> {
        let message_id = self.next_id.fetch_add(1, Ordering::SeqCst);
        info!(chat_id = %entity.chat_id, message_id, "dry-run delivery: {}", text);
        Ok(message_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dry_run_lifecycle() {
        let mut delivery = DryRunDelivery::new();
        assert!(!delivery.is_connected());

        delivery.connect().await.unwrap();
        assert!(delivery.is_connected());

        let entity = delivery.resolve_handle("@rahul").await.unwrap();
        assert_eq!(entity.chat_id, "@rahul");

        let first = delivery.send(&entity, "hello").await.unwrap();
        let second = delivery.send(&entity, "again").await.unwrap();
        assert_eq!(second, first + 1);

        delivery.disconnect().await.unwrap();
        assert!(!delivery.is_connected());
    }

    #[tokio::test]
    async fn test_bot_api_resolve_handle_passthrough() {
        let delivery = BotApiDelivery::new("token", Duration::from_secs(1));
        let entity = delivery.resolve_handle(" @rahul ").await.unwrap();
        assert_eq!(entity.chat_id, "@rahul");

        let err = delivery.resolve_handle("   ").await.unwrap_err();
        assert!(matches!(err, Error::Delivery(_)));
    }

    #[tokio::test]
    async fn test_bot_api_unreachable_host_errors() {
        // Nothing listens on port 9; connect must fail, not hang
        let mut delivery =
            BotApiDelivery::with_base_url("token", "http://127.0.0.1:9", Duration::from_secs(2));
        assert!(delivery.connect().await.is_err());
        assert!(!delivery.is_connected());
    }

    #[test]
    fn test_url_building() {
        let delivery =
            BotApiDelivery::with_base_url("123:abc", "http://example.test/", Duration::from_secs(1));
        assert_eq!(
            delivery.url("sendMessage"),
            "http://example.test/bot123:abc/sendMessage"
        );
    }
}
