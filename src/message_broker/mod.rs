//! 커밋 이후 경매 이벤트 발행
//!
//! 발행은 알림일 뿐이며 실패해도 이미 커밋된 결과는 바뀌지 않는다.

// region:    --- Imports
use crate::auction::events::AuctionEvent;
use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

#[cfg(feature = "kafka")]
pub mod kafka;

#[cfg(feature = "kafka")]
pub use kafka::KafkaPublisher;

// endregion: --- Imports

// region:    --- Publisher
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("event serialization failed")]
    Serialize(#[from] serde_json::Error),

    #[error("broker rejected message: {0}")]
    Broker(String),
}

#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: &AuctionEvent) -> Result<(), PublishError>;
}

/// 브로커 없이 로그로만 남기는 발행자
#[derive(Debug, Clone, Copy, Default)]
pub struct LogPublisher;

#[async_trait]
impl EventPublisher for LogPublisher {
    async fn publish(&self, event: &AuctionEvent) -> Result<(), PublishError> {
        let payload = serde_json::to_string(event)?;
        info!(
            "{:<12} --> {} listing: {} payload: {}",
            "Publisher",
            event.event_type(),
            event.listing_id(),
            payload
        );
        Ok(())
    }
}

// endregion: --- Publisher
