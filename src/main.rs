//! Livecast 시그널링 서버
//!
//! 관리자 방송(1:N)과 관리자-권한 사용자 개인 통화(1:1)의 WebRTC 협상 메시지를
//! 중계한다. 미디어는 이 서버를 거치지 않는다.

mod clock;
mod config;
mod error;
mod handlers;
mod protocol;
mod session;
mod site_config;
mod state;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    http::HeaderValue,
    response::{Html, IntoResponse, Json},
    routing::get,
    Router,
};
use config::Config;
use futures::{SinkExt, StreamExt};
use protocol::{ClientMessage, ServerMessage};
use serde::Deserialize;
use session::{BroadcastRequest, PrivateSignal};
use state::AppState;
use std::sync::Arc;
use tokio::sync::mpsc;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();

    // 로깅 초기화
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.log_level))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let state = Arc::new(AppState::new(config.clone()));

    // 재연결 유예가 끝난 방송 정리 스케줄러
    let sweep_state = state.clone();
    let sweep_interval = config.sweep_interval;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_interval);
        loop {
            interval.tick().await;
            handlers::sweep_orphaned_broadcast(sweep_state.clone()).await;
        }
    });

    // 라우터 설정
    let app = Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/ws", get(ws_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&config)),
        )
        .with_state(state.clone());

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Livecast Signaling Server started");
    tracing::info!("Address: {}", addr);
    tracing::info!("WebSocket: ws://{}/ws", addr);
    tracing::info!(
        config_ttl_secs = state.site_config.ttl().as_secs(),
        reclaim_grace_secs = config.site.reclaim_grace.as_secs(),
        "Session policy"
    );

    axum::serve(listener, app).await?;
    Ok(())
}

fn cors_layer(config: &Config) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if config.allows_any_origin() {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    cors.allow_origin(AllowOrigin::list(origins))
}

async fn index_handler() -> Html<&'static str> {
    Html("<h1>Livecast Signaling Server</h1><p>WebSocket endpoint: /ws</p>")
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let stats = state.hub.lock().await.stats();
    Json(serde_json::json!({
        "status": "ok",
        "server": "livecast-signaling-rs",
        "timestamp": std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default(),
        "hub": stats,
    }))
}

/// 접속 쿼리 (`/ws?appUserId=...`). 비어 있으면 익명
#[derive(Debug, Deserialize)]
struct ConnectParams {
    #[serde(rename = "appUserId")]
    app_user_id: Option<String>,
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<ConnectParams>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let app_user_id = params
        .app_user_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty());
    ws.on_upgrade(move |socket| handle_socket(socket, state, app_user_id))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, app_user_id: Option<String>) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    // 연결 처리
    let conn_id = handlers::handle_connection(state.clone(), app_user_id, tx.clone()).await;

    // 송신 태스크
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            match serde_json::to_string(&msg) {
                Ok(json) => {
                    if ws_sender.send(Message::Text(json)).await.is_err() {
                        break;
                    }
                }
                Err(e) => tracing::error!(error = %e, "Failed to serialize message"),
            }
        }
    });

    // 수신 처리
    while let Some(result) = ws_receiver.next().await {
        match result {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(msg) => handle_client_message(&state, &conn_id, &tx, msg).await,
                Err(e) => {
                    tracing::debug!(conn_id = %conn_id, error = %e, "Malformed message");
                    let _ = tx.send(ServerMessage::Error {
                        code: "MALFORMED_MESSAGE".to_string(),
                        message: e.to_string(),
                    });
                }
            },
            Ok(Message::Close(_)) => break,
            Err(_) => break,
            _ => {}
        }
    }

    // 연결 해제
    handlers::handle_disconnect(state, &conn_id).await;
    send_task.abort();
}

async fn handle_client_message(
    state: &Arc<AppState>,
    conn_id: &str,
    sender: &mpsc::UnboundedSender<ServerMessage>,
    msg: ClientMessage,
) {
    match msg {
        ClientMessage::Heartbeat => {
            handlers::handle_heartbeat(sender);
        }
        ClientMessage::RegisterGeneralViewer => {
            handlers::handle_register_viewer(state.clone(), conn_id, sender).await;
        }
        ClientMessage::UnregisterGeneralViewer => {
            handlers::handle_unregister_viewer(state.clone(), conn_id).await;
        }
        ClientMessage::RegisterGeneralBroadcaster(options) => {
            let options = options.unwrap_or_default();
            let request = BroadcastRequest {
                title: options.title,
                subtitle: options.subtitle,
                logged_in_only: options.logged_in_only,
            };
            handlers::handle_register_broadcaster(state.clone(), conn_id, sender, request).await;
        }
        ClientMessage::StopGeneralStream => {
            handlers::handle_stop_stream(state.clone(), conn_id, sender).await;
        }
        ClientMessage::GeneralStreamOfferToViewer { viewer_id, offer } => {
            handlers::handle_offer_to_viewer(state.clone(), conn_id, sender, &viewer_id, offer)
                .await;
        }
        ClientMessage::GeneralStreamAnswerToBroadcaster { answer } => {
            handlers::handle_answer_to_broadcaster(state.clone(), conn_id, sender, answer).await;
        }
        ClientMessage::GeneralStreamCandidateToViewer {
            viewer_id,
            candidate,
        } => {
            handlers::handle_candidate_to_viewer(state.clone(), conn_id, sender, &viewer_id, candidate)
                .await;
        }
        ClientMessage::GeneralStreamCandidateToBroadcaster { candidate } => {
            handlers::handle_candidate_to_broadcaster(state.clone(), conn_id, sender, candidate)
                .await;
        }
        ClientMessage::AdminInitiatePrivateCallRequest { target_user_app_id } => {
            handlers::handle_call_invite(state.clone(), conn_id, sender, &target_user_app_id)
                .await;
        }
        ClientMessage::UserAcceptsPrivateCall { admin_socket_id } => {
            handlers::handle_call_accept(state.clone(), conn_id, sender, &admin_socket_id).await;
        }
        ClientMessage::PrivateSdpOffer {
            target_socket_id,
            payload,
        } => {
            handlers::handle_private_signal(
                state.clone(),
                conn_id,
                sender,
                &target_socket_id,
                PrivateSignal::Offer(payload),
            )
            .await;
        }
        ClientMessage::PrivateSdpAnswer {
            target_socket_id,
            payload,
        } => {
            handlers::handle_private_signal(
                state.clone(),
                conn_id,
                sender,
                &target_socket_id,
                PrivateSignal::Answer(payload),
            )
            .await;
        }
        ClientMessage::PrivateIceCandidate {
            target_socket_id,
            candidate,
        } => {
            handlers::handle_private_signal(
                state.clone(),
                conn_id,
                sender,
                &target_socket_id,
                PrivateSignal::Candidate(candidate),
            )
            .await;
        }
        ClientMessage::AdminEndPrivateCall => {
            handlers::handle_admin_end_call(state.clone(), conn_id).await;
        }
        ClientMessage::UserEndPrivateCall => {
            handlers::handle_user_end_call(state.clone(), conn_id).await;
        }
        ClientMessage::RequestAuthorizedUserStatus { target_user_app_id } => {
            handlers::handle_authorized_user_status(
                state.clone(),
                conn_id,
                sender,
                &target_user_app_id,
            )
            .await;
        }
        ClientMessage::RequestIceServers => {
            handlers::handle_ice_servers_request(state.clone(), conn_id, sender).await;
        }
    }
}
