use crate::config::AppConfig;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::future::Future;
use std::pin::Pin;
use tracing::{debug, info};

/// 스키마 생성 SQL
const CREATE_SCHEMA_SQL: &str = include_str!("../../sql/01-create-schema.sql");
/// 스키마 초기화 SQL (DATABASE_RESET=true 일 때만)
const DROP_SCHEMA_SQL: &str = include_str!("../../sql/00-drop-schema.sql");

#[derive(Debug, Clone)]
pub struct DatabaseManager {
    pool: PgPool,
}

impl DatabaseManager {
    /// 설정의 DATABASE_URL로 커넥션 풀 생성
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    /// 설정으로부터 연결 후 스키마 준비. DATABASE_URL이 없으면 None
    pub async fn from_config(config: &AppConfig) -> Result<Option<Self>, sqlx::Error> {
        let Some(url) = config.database_url.as_deref() else {
            return Ok(None);
        };
        let manager = Self::connect(url, config.database_max_connections).await?;
        manager.initialize_database(config.database_reset).await?;
        Ok(Some(manager))
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 데이터베이스 풀 가져오기
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// 하나의 트랜잭션 안에서 `work` 실행
    ///
    /// 입찰 시 가격/버전 갱신과 입찰 원장 추가, 관심 목록 토글의 advisory lock과
    /// 삭제/추가가 여기서 함께 커밋된다. `work`가 Err(버전 충돌 포함)를 반환하면
    /// 모두 롤백되어 입찰 행만 남거나 가격만 바뀌는 일은 없다.
    pub async fn transaction<F, T, E>(&self, work: F) -> Result<T, E>
    where
        F: for<'c> FnOnce(
            &'c mut sqlx::Transaction<'_, sqlx::Postgres>,
        ) -> Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'c>>,
        E: From<sqlx::Error>,
    {
        let mut tx = self.pool.begin().await?;
        match work(&mut tx).await {
            Ok(value) => {
                tx.commit().await?;
                Ok(value)
            }
            Err(e) => {
                debug!("{:<12} --> 트랜잭션 롤백", "Database");
                tx.rollback().await?;
                Err(e)
            }
        }
    }

    /// 데이터베이스 초기화
    pub async fn initialize_database(&self, reset: bool) -> Result<(), sqlx::Error> {
        if reset {
            info!("{:<12} --> 기존 스키마 삭제", "Database");
            self.execute_multi_query(DROP_SCHEMA_SQL).await?;
        }
        self.execute_multi_query(CREATE_SCHEMA_SQL).await?;
        info!("{:<12} --> 스키마 준비 완료", "Database");
        Ok(())
    }

    /// 여러 쿼리 실행
    async fn execute_multi_query(&self, sql: &str) -> Result<(), sqlx::Error> {
        for query in sql.split(';') {
            let query = query.trim();
            if !query.is_empty() {
                sqlx::query(query).execute(&self.pool).await?;
            }
        }
        Ok(())
    }
}
