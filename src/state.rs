//! 애플리케이션 상태 관리

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::session::Coordinator;
use crate::site_config::{ConfigCache, ConfigSource, JsonFileSource, StaticSource};
use std::sync::Arc;
use tokio::sync::Mutex;

/// 전역 애플리케이션 상태
pub struct AppState {
    /// 세션 상태 (방송, 시청자, 개인 통화). 모든 변경은 이 락 하나로 직렬화
    pub hub: Mutex<Coordinator>,
    /// 외부 사이트 설정 캐시. 세션 락 밖에서 조회한다
    pub site_config: ConfigCache,
    /// 설정
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let source: Arc<dyn ConfigSource> = match &config.site.source_path {
            Some(path) => {
                tracing::info!(path = %path.display(), "Site config loaded from JSON document");
                Arc::new(JsonFileSource::new(path.clone()))
            }
            None => {
                tracing::info!("Site config loaded from environment defaults");
                Arc::new(StaticSource::new(config.site.defaults.clone()))
            }
        };

        Self {
            hub: Mutex::new(Coordinator::new(clock.clone(), config.site.reclaim_grace)),
            site_config: ConfigCache::new(source, clock, config.site.ttl),
            config: Arc::new(config),
        }
    }
}
