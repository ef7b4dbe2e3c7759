//! 연결 핸들러

use crate::protocol::ServerMessage;
use crate::state::AppState;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

/// 새 연결 처리
pub async fn handle_connection(
    state: Arc<AppState>,
    app_user_id: Option<String>,
    sender: UnboundedSender<ServerMessage>,
) -> String {
    let conn_id = Uuid::new_v4().to_string();
    state
        .hub
        .lock()
        .await
        .open_connection(&conn_id, app_user_id, sender);
    conn_id
}

/// 연결 해제 처리 (끊긴 이유와 무관하게 항상 호출)
pub async fn handle_disconnect(state: Arc<AppState>, conn_id: &str) {
    state.hub.lock().await.close_connection(conn_id);
    tracing::info!(conn_id = %conn_id, "Connection closed");
}

/// Heartbeat 처리
pub fn handle_heartbeat(sender: &UnboundedSender<ServerMessage>) {
    let _ = sender.send(ServerMessage::HeartbeatAck);
}

/// 재연결 유예 시간이 지난 방송 정리
pub async fn sweep_orphaned_broadcast(state: Arc<AppState>) {
    if state.hub.lock().await.sweep_orphaned_broadcast() {
        tracing::info!("Orphaned broadcast swept");
    }
}
