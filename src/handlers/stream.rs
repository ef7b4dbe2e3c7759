//! 일반 방송 핸들러 (방송자 1 : 시청자 N)

use crate::error::SignalError;
use crate::protocol::ServerMessage;
use crate::session::BroadcastRequest;
use crate::state::AppState;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

/// 방송자 등록
pub async fn handle_register_broadcaster(
    state: Arc<AppState>,
    conn_id: &str,
    sender: &UnboundedSender<ServerMessage>,
    request: BroadcastRequest,
) {
    // 설정 갱신은 세션 락 밖에서
    let config = match state.site_config.get().await {
        Ok(config) => config,
        Err(e) => {
            report_stream_error(sender, conn_id, &e);
            return;
        }
    };

    let result = state
        .hub
        .lock()
        .await
        .start_broadcast(conn_id, request, &config);
    if let Err(e) = result {
        report_stream_error(sender, conn_id, &e);
    }
}

/// 방송 종료
pub async fn handle_stop_stream(
    state: Arc<AppState>,
    conn_id: &str,
    sender: &UnboundedSender<ServerMessage>,
) {
    let result = state.hub.lock().await.stop_broadcast(conn_id);
    if let Err(e) = result {
        report_stream_error(sender, conn_id, &e);
    }
}

/// 시청자 등록
pub async fn handle_register_viewer(
    state: Arc<AppState>,
    conn_id: &str,
    sender: &UnboundedSender<ServerMessage>,
) {
    let result = state.hub.lock().await.register_viewer(conn_id);
    if let Err(e) = result {
        report_stream_error(sender, conn_id, &e);
    }
}

/// 시청자 해제 (연결은 유지)
pub async fn handle_unregister_viewer(state: Arc<AppState>, conn_id: &str) {
    state.hub.lock().await.unregister_viewer(conn_id);
}

/// 방송자 → 시청자 offer
pub async fn handle_offer_to_viewer(
    state: Arc<AppState>,
    conn_id: &str,
    sender: &UnboundedSender<ServerMessage>,
    viewer_id: &str,
    offer: Value,
) {
    let result = state
        .hub
        .lock()
        .await
        .relay_offer_to_viewer(conn_id, viewer_id, offer);
    if let Err(e) = result {
        report_stream_error(sender, conn_id, &e);
    }
}

/// 시청자 → 방송자 answer
pub async fn handle_answer_to_broadcaster(
    state: Arc<AppState>,
    conn_id: &str,
    sender: &UnboundedSender<ServerMessage>,
    answer: Value,
) {
    let result = state
        .hub
        .lock()
        .await
        .relay_answer_to_broadcaster(conn_id, answer);
    if let Err(e) = result {
        report_stream_error(sender, conn_id, &e);
    }
}

/// 방송자 → 시청자 ICE candidate
pub async fn handle_candidate_to_viewer(
    state: Arc<AppState>,
    conn_id: &str,
    sender: &UnboundedSender<ServerMessage>,
    viewer_id: &str,
    candidate: Value,
) {
    let result = state
        .hub
        .lock()
        .await
        .relay_candidate_to_viewer(conn_id, viewer_id, candidate);
    if let Err(e) = result {
        report_stream_error(sender, conn_id, &e);
    }
}

/// 시청자 → 방송자 ICE candidate
pub async fn handle_candidate_to_broadcaster(
    state: Arc<AppState>,
    conn_id: &str,
    sender: &UnboundedSender<ServerMessage>,
    candidate: Value,
) {
    let result = state
        .hub
        .lock()
        .await
        .relay_candidate_to_broadcaster(conn_id, candidate);
    if let Err(e) = result {
        report_stream_error(sender, conn_id, &e);
    }
}

/// 에러를 요청한 연결에 알림. 대상 소실은 로그만 남긴다
///
/// 정책상 거부(`AccessDenied`)만 access-denied 이벤트로 보내고, 역할 불일치 같은
/// 나머지는 stream-error로 보낸다.
fn report_stream_error(
    sender: &UnboundedSender<ServerMessage>,
    conn_id: &str,
    error: &SignalError,
) {
    let message = match error {
        SignalError::PeerVanished(target) => {
            tracing::debug!(conn_id = %conn_id, target = %target, "Dropped relay, peer vanished");
            return;
        }
        SignalError::AccessDenied { reason } => ServerMessage::GeneralStreamAccessDenied {
            reason: reason.to_string(),
        },
        other => ServerMessage::GeneralStreamError {
            code: other.code().to_string(),
            message: other.to_string(),
        },
    };
    let _ = sender.send(message);
}
