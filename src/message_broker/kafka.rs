// region:    --- Imports
use super::{EventPublisher, PublishError};
use crate::auction::events::AuctionEvent;
use async_trait::async_trait;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::ClientConfig;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

// endregion: --- Imports

// region:    --- Kafka Publisher
/// 경매 이벤트를 JSON으로 직렬화해 상품 id를 키로 발행
#[derive(Clone)]
pub struct KafkaPublisher {
    producer: Arc<FutureProducer>,
    topic: String,
}

impl KafkaPublisher {
    pub fn new(brokers: &str, topic: &str) -> Result<Self, PublishError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create()
            .map_err(|e| PublishError::Broker(e.to_string()))?;

        info!(
            "{:<12} --> Kafka 발행자 생성: brokers={}, topic={}",
            "Publisher", brokers, topic
        );
        Ok(Self {
            producer: Arc::new(producer),
            topic: topic.to_string(),
        })
    }
}

#[async_trait]
impl EventPublisher for KafkaPublisher {
    async fn publish(&self, event: &AuctionEvent) -> Result<(), PublishError> {
        let key = event.listing_id().to_string();
        let payload = serde_json::to_string(event)?;
        debug!(
            "{:<12} --> Kafka 메시지 전송: topic={}, key={}",
            "Publisher", self.topic, key
        );
        let record = FutureRecord::to(&self.topic).key(&key).payload(&payload);

        self.producer
            .send(record, Duration::from_secs(0))
            .await
            .map_err(|(e, _)| PublishError::Broker(format!("{e:?}")))?;
        Ok(())
    }
}

// endregion: --- Kafka Publisher
