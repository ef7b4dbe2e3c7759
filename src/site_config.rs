//! 외부 사이트 설정 캐시 (read-through, TTL)
//!
//! 백오피스가 관리하는 설정(권한 있는 개인 통화 사용자, 로그인 전용 스트림 여부,
//! 기본 제목)을 읽기 전용으로 가져온다. 코디네이터는 이 값을 절대 쓰지 않는다.

use crate::clock::Clock;
use crate::error::SignalError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// 설정 스냅샷 (불변)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfigSnapshot {
    pub site_title: String,
    pub default_stream_title: String,
    pub default_stream_subtitle: String,
    pub authorized_user_id: Option<String>,
    pub stream_logged_in_only: bool,
}

impl ConfigSnapshot {
    /// 개인 통화 권한이 있는 사용자 ID (빈 문자열은 미설정으로 취급)
    pub fn authorized_user_id(&self) -> Option<&str> {
        self.authorized_user_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

/// 외부 설정 저장소
#[async_trait]
pub trait ConfigSource: Send + Sync {
    async fn fetch(&self) -> anyhow::Result<ConfigSnapshot>;
}

/// 고정 스냅샷 소스
pub struct StaticSource {
    snapshot: ConfigSnapshot,
}

impl StaticSource {
    pub fn new(snapshot: ConfigSnapshot) -> Self {
        Self { snapshot }
    }
}

#[async_trait]
impl ConfigSource for StaticSource {
    async fn fetch(&self) -> anyhow::Result<ConfigSnapshot> {
        Ok(self.snapshot.clone())
    }
}

/// JSON 문서 소스, 갱신할 때마다 파일을 다시 읽는다
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ConfigSource for JsonFileSource {
    async fn fetch(&self) -> anyhow::Result<ConfigSnapshot> {
        let raw = tokio::fs::read_to_string(&self.path).await?;
        Ok(serde_json::from_str(&raw)?)
    }
}

struct CachedSnapshot {
    snapshot: Arc<ConfigSnapshot>,
    fetched_at: Instant,
}

/// TTL 기반 설정 캐시
///
/// 만료 시 호출자 쪽에서 동기적으로 갱신한다. 갱신이 실패하면 이전 스냅샷을
/// 그대로 돌려주고, 한 번도 가져온 적이 없으면 `ConfigUnavailable`.
/// 세션 락을 잡은 상태에서 호출하면 안 된다.
pub struct ConfigCache {
    source: Arc<dyn ConfigSource>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    cached: RwLock<Option<CachedSnapshot>>,
}

impl ConfigCache {
    pub fn new(source: Arc<dyn ConfigSource>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            source,
            clock,
            ttl,
            cached: RwLock::new(None),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn get(&self) -> Result<Arc<ConfigSnapshot>, SignalError> {
        let now = self.clock.now();
        let stale = {
            let cached = self.cached.read().await;
            match cached.as_ref() {
                Some(entry) if now.duration_since(entry.fetched_at) < self.ttl => {
                    return Ok(entry.snapshot.clone());
                }
                Some(entry) => Some(entry.snapshot.clone()),
                None => None,
            }
        };

        match self.source.fetch().await {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                *self.cached.write().await = Some(CachedSnapshot {
                    snapshot: snapshot.clone(),
                    fetched_at: self.clock.now(),
                });
                tracing::debug!("Site config refreshed");
                Ok(snapshot)
            }
            Err(e) => match stale {
                Some(snapshot) => {
                    tracing::warn!(error = %e, "Site config refresh failed, serving stale snapshot");
                    Ok(snapshot)
                }
                None => {
                    tracing::error!(error = %e, "Site config unavailable");
                    Err(SignalError::ConfigUnavailable)
                }
            },
        }
    }
}
