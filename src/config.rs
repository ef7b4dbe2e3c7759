//! 환경 변수 기반 설정 관리

use crate::site_config::ConfigSnapshot;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// 서버 설정
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub host: String,
    pub cors_origins: Vec<String>,
    pub site: SiteConfigSettings,
    pub sweep_interval: Duration,
    pub turn: TurnConfig,
    pub log_level: String,
}

/// 외부 사이트 설정 캐시 설정
#[derive(Debug, Clone)]
pub struct SiteConfigSettings {
    /// 없으면 `defaults`를 고정으로 사용
    pub source_path: Option<PathBuf>,
    pub ttl: Duration,
    pub reclaim_grace: Duration,
    pub defaults: ConfigSnapshot,
}

/// TURN 서버 설정
#[derive(Debug, Clone)]
pub struct TurnConfig {
    pub url: String,
    pub secret: String,
    pub enable_tls: bool,
    pub enable_udp: bool,
    pub enable_tcp: bool,
    pub ports: TurnPorts,
    pub credential_ttl: u64,
    pub fallback_servers: Vec<String>,
    pub stun_urls: Vec<String>,
}

impl TurnConfig {
    pub fn is_configured(&self) -> bool {
        !self.url.is_empty() && !self.secret.is_empty()
    }
}

/// TURN 포트 설정
#[derive(Debug, Clone)]
pub struct TurnPorts {
    pub udp: u16,
    pub tcp: u16,
    pub tls: u16,
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// `tokio::time::interval`은 0 주기를 허용하지 않는다
fn sweep_interval(millis: u64) -> Duration {
    Duration::from_millis(millis.max(1))
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl Config {
    /// 환경 변수에서 설정 로드
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let ttl = Duration::from_secs(parse_or("SITE_CONFIG_TTL_SECS", 5));
        let reclaim_grace = env::var("BROADCAST_RECLAIM_GRACE_SECS")
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(ttl);

        Self {
            port: parse_or("PORT", 5502),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            cors_origins: parse_list(&env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string())),
            site: SiteConfigSettings {
                source_path: env::var("SITE_CONFIG_PATH")
                    .ok()
                    .filter(|p| !p.trim().is_empty())
                    .map(PathBuf::from),
                ttl,
                reclaim_grace,
                defaults: ConfigSnapshot {
                    site_title: env::var("SITE_TITLE").unwrap_or_default(),
                    default_stream_title: env::var("DEFAULT_STREAM_TITLE")
                        .unwrap_or_else(|_| "Live class".to_string()),
                    default_stream_subtitle: env::var("DEFAULT_STREAM_SUBTITLE").unwrap_or_default(),
                    authorized_user_id: env::var("AUTHORIZED_USER_ID").ok(),
                    stream_logged_in_only: env::var("STREAM_LOGGED_IN_ONLY")
                        .map(|v| v == "true")
                        .unwrap_or(false),
                },
            },
            sweep_interval: sweep_interval(parse_or("SWEEP_INTERVAL_MS", 1000)),
            turn: TurnConfig {
                url: env::var("TURN_SERVER_URL").unwrap_or_default(),
                secret: env::var("TURN_SECRET").unwrap_or_default(),
                enable_tls: env::var("TURN_ENABLE_TLS")
                    .map(|v| v == "true")
                    .unwrap_or(false),
                enable_udp: env::var("TURN_ENABLE_UDP")
                    .map(|v| v != "false")
                    .unwrap_or(true),
                enable_tcp: env::var("TURN_ENABLE_TCP")
                    .map(|v| v != "false")
                    .unwrap_or(true),
                ports: TurnPorts {
                    udp: parse_or("TURN_PORT_UDP", 3478),
                    tcp: parse_or("TURN_PORT_TCP", 3478),
                    tls: parse_or("TURN_PORT_TLS", 443),
                },
                credential_ttl: parse_or("TURN_CREDENTIAL_TTL", 3600),
                fallback_servers: parse_list(&env::var("TURN_FALLBACK_SERVERS").unwrap_or_default()),
                stun_urls: parse_list(
                    &env::var("STUN_URLS")
                        .unwrap_or_else(|_| "stun:stun.l.google.com:19302".to_string()),
                ),
            },
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        }
    }

    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.is_empty() || self.cors_origins.iter().any(|o| o == "*")
    }
}
