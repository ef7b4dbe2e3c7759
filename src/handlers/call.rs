//! 개인 통화 핸들러 (관리자 1 : 권한 사용자 1)

use crate::error::SignalError;
use crate::protocol::ServerMessage;
use crate::session::PrivateSignal;
use crate::state::AppState;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

/// 관리자 통화 요청
pub async fn handle_call_invite(
    state: Arc<AppState>,
    conn_id: &str,
    sender: &UnboundedSender<ServerMessage>,
    target_user_app_id: &str,
) {
    let config = match state.site_config.get().await {
        Ok(config) => config,
        Err(e) => {
            report_call_error(sender, conn_id, &e);
            return;
        }
    };

    let result = state
        .hub
        .lock()
        .await
        .invite_private_call(conn_id, target_user_app_id, &config);
    if let Err(e) = result {
        report_call_error(sender, conn_id, &e);
    }
}

/// 사용자 통화 수락
pub async fn handle_call_accept(
    state: Arc<AppState>,
    conn_id: &str,
    sender: &UnboundedSender<ServerMessage>,
    admin_socket_id: &str,
) {
    let result = state
        .hub
        .lock()
        .await
        .accept_private_call(conn_id, admin_socket_id);
    if let Err(e) = result {
        report_call_error(sender, conn_id, &e);
    }
}

/// 개인 통화 SDP/ICE 중계
pub async fn handle_private_signal(
    state: Arc<AppState>,
    conn_id: &str,
    sender: &UnboundedSender<ServerMessage>,
    target_socket_id: &str,
    signal: PrivateSignal,
) {
    let result = state
        .hub
        .lock()
        .await
        .relay_private_signal(conn_id, target_socket_id, signal);
    if let Err(e) = result {
        report_call_error(sender, conn_id, &e);
    }
}

pub async fn handle_admin_end_call(state: Arc<AppState>, conn_id: &str) {
    state.hub.lock().await.end_call_by_admin(conn_id);
}

pub async fn handle_user_end_call(state: Arc<AppState>, conn_id: &str) {
    state.hub.lock().await.end_call_by_user(conn_id);
}

/// 권한 사용자 상태 조회
pub async fn handle_authorized_user_status(
    state: Arc<AppState>,
    conn_id: &str,
    sender: &UnboundedSender<ServerMessage>,
    target_user_app_id: &str,
) {
    let config = match state.site_config.get().await {
        Ok(config) => config,
        Err(e) => {
            report_call_error(sender, conn_id, &e);
            return;
        }
    };

    let status = state
        .hub
        .lock()
        .await
        .authorized_user_status(target_user_app_id, &config);
    let _ = sender.send(status);
}

fn report_call_error(
    sender: &UnboundedSender<ServerMessage>,
    conn_id: &str,
    error: &SignalError,
) {
    if let SignalError::PeerVanished(target) = error {
        tracing::debug!(conn_id = %conn_id, target = %target, "Dropped private relay, peer vanished");
        return;
    }
    tracing::debug!(conn_id = %conn_id, code = error.code(), "Private call request failed");
    let _ = sender.send(ServerMessage::PrivateCallError {
        code: error.code().to_string(),
        message: error.to_string(),
    });
}
