//! ICE 서버 목록 발급 (STUN + 시간 제한 TURN 자격증명)

use crate::config::TurnConfig;
use crate::protocol::{IceServer, ServerMessage};
use crate::state::AppState;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use hmac::{Hmac, Mac};
use sha1::Sha1;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc::UnboundedSender;

type HmacSha1 = Hmac<Sha1>;

/// ICE 서버 요청 처리
pub async fn handle_ice_servers_request(
    state: Arc<AppState>,
    conn_id: &str,
    sender: &UnboundedSender<ServerMessage>,
) {
    let turn = &state.config.turn;
    let ice_servers = build_ice_servers(turn, unix_now(), rand::random());

    tracing::debug!(
        conn_id = %conn_id,
        servers = ice_servers.len(),
        turn = turn.is_configured(),
        "ICE servers issued"
    );
    let _ = sender.send(ServerMessage::IceServers {
        ice_servers,
        ttl: turn.credential_ttl,
    });
}

/// TURN REST 자격증명 (username = "<만료시각>:<식별자>")
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnCredentials {
    pub username: String,
    pub password: String,
}

impl TurnCredentials {
    pub fn issue(secret: &str, expires_at: u64, nonce: u64) -> Option<Self> {
        let username = format!("{}:livecast-{:x}", expires_at, nonce);
        let password = sign(secret, &username)?;
        Some(Self { username, password })
    }
}

/// base64(HMAC-SHA1(secret, username))
fn sign(secret: &str, username: &str) -> Option<String> {
    let mut mac = HmacSha1::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(username.as_bytes());
    Some(BASE64.encode(mac.finalize().into_bytes()))
}

pub fn build_ice_servers(config: &TurnConfig, now: u64, nonce: u64) -> Vec<IceServer> {
    let mut servers: Vec<IceServer> = config
        .stun_urls
        .iter()
        .map(|url| IceServer {
            urls: vec![url.clone()],
            username: None,
            credential: None,
            credential_type: None,
        })
        .collect();

    if !config.is_configured() {
        return servers;
    }

    let Some(credentials) = TurnCredentials::issue(&config.secret, now + config.credential_ttl, nonce)
    else {
        tracing::warn!("TURN credential signing failed, serving STUN only");
        return servers;
    };

    for url in turn_urls(config) {
        servers.push(IceServer {
            urls: vec![url],
            username: Some(credentials.username.clone()),
            credential: Some(credentials.password.clone()),
            credential_type: Some("password".to_string()),
        });
    }

    // TURN 서버도 STUN 응답을 준다
    if config.enable_udp {
        servers.push(IceServer {
            urls: vec![format!("stun:{}:{}", config.url, config.ports.udp)],
            username: None,
            credential: None,
            credential_type: None,
        });
    }

    servers
}

fn turn_urls(config: &TurnConfig) -> Vec<String> {
    let mut urls = Vec::new();

    if config.enable_udp {
        urls.push(format!("turn:{}:{}?transport=udp", config.url, config.ports.udp));
    }
    if config.enable_tcp {
        urls.push(format!("turn:{}:{}?transport=tcp", config.url, config.ports.tcp));
    }
    if config.enable_tls {
        urls.push(format!("turns:{}:{}?transport=tcp", config.url, config.ports.tls));
    }

    for fallback in &config.fallback_servers {
        if config.enable_tls {
            urls.push(format!("turns:{}:{}?transport=tcp", fallback, config.ports.tls));
        } else {
            urls.push(format!("turn:{}:{}", fallback, config.ports.udp));
        }
    }

    urls
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
