// region:    --- Imports
use auction_engine::config::AppConfig;
use auction_engine::database::DatabaseManager;
use auction_engine::handlers;
use auction_engine::message_broker::{EventPublisher, LogPublisher};
use auction_engine::store::{AuctionStore, InMemoryStore, PgStore};
use auction_engine::AuctionController;
use axum::extract::DefaultBodyLimit;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};
// endregion: --- Imports

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // logging 초기화
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    let config = AppConfig::from_env()?;

    // 저장소 생성
    let store: Arc<dyn AuctionStore> = match DatabaseManager::from_config(&config).await {
        Ok(Some(db_manager)) => {
            info!("{:<12} --> 데이터베이스 초기화 성공", "Main");
            Arc::new(PgStore::new(db_manager))
        }
        Ok(None) => {
            warn!(
                "{:<12} --> DATABASE_URL 미설정: 메모리 저장소 사용",
                "Main"
            );
            InMemoryStore::new_shared()
        }
        Err(e) => {
            error!("{:<12} --> 데이터베이스 초기화 실패: {:?}", "Main", e);
            return Err(e.into());
        }
    };

    let controller = AuctionController::new(store)
        .with_publisher(publisher(&config)?)
        .with_max_attempts(config.bid_max_attempts);

    // 테스트 페이지를 위한 cors 설정
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // 라우터 설정
    let routes_all = handlers::router(Arc::new(controller))
        .layer(cors)
        .layer(DefaultBodyLimit::max(1024 * 1024));

    let listener = TcpListener::bind(config.bind_addr).await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    // 서버 실행
    if let Err(err) = axum::serve(listener, routes_all.into_make_service()).await {
        error!("{:<12} --> Server error: {}", "Main", err);
    }
    Ok(())
}

/// 이벤트 발행자 선택. KAFKA_BROKERS가 있으면 Kafka 사용
#[cfg(feature = "kafka")]
fn publisher(config: &AppConfig) -> Result<Arc<dyn EventPublisher>, Box<dyn std::error::Error>> {
    use auction_engine::message_broker::KafkaPublisher;

    match config.kafka_brokers.as_deref() {
        Some(brokers) => Ok(Arc::new(KafkaPublisher::new(brokers, &config.kafka_topic)?)),
        None => Ok(Arc::new(LogPublisher)),
    }
}

/// 이벤트 발행자 선택. kafka 기능 없이 빌드되면 항상 로그 발행자
#[cfg(not(feature = "kafka"))]
fn publisher(config: &AppConfig) -> Result<Arc<dyn EventPublisher>, Box<dyn std::error::Error>> {
    if config.kafka_brokers.is_some() {
        warn!(
            "{:<12} --> KAFKA_BROKERS 무시됨: kafka 기능 없이 빌드됨",
            "Main"
        );
    }
    Ok(Arc::new(LogPublisher))
}
// endregion: --- Main
