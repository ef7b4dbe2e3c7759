//! 세션 코디네이터
//!
//! 방송, 시청자, 개인 통화, 대기 초대 상태를 한 곳에서 소유한다.
//! 모든 연산은 `&mut self` 이므로 호출자는 하나의 락 안에서 직렬로 실행한다.
//! 메시지 전송은 unbounded 채널이라 락을 잡은 채 블로킹되지 않는다.

pub mod access;
pub mod broadcast;
pub mod call;
pub mod registry;
pub mod viewers;

pub use broadcast::{BroadcastRequest, BroadcastSession};
pub use call::{CallState, PrivateCall, PrivateSignal};
pub use registry::Role;

use crate::clock::Clock;
use crate::protocol::ServerMessage;
use call::PendingInvite;
use registry::ConnectionRegistry;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use viewers::ViewerSet;

pub struct Coordinator {
    registry: ConnectionRegistry,
    broadcast: Option<BroadcastSession>,
    viewers: ViewerSet,
    call: Option<PrivateCall>,
    pending_invites: HashMap<String, PendingInvite>,
    clock: Arc<dyn Clock>,
    reclaim_grace: Duration,
}

/// 헬스 체크용 상태 요약
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HubStats {
    pub connections: usize,
    pub broadcast: &'static str,
    pub viewers: usize,
    pub private_call: CallState,
    pub pending_invites: usize,
}

impl Coordinator {
    pub fn new(clock: Arc<dyn Clock>, reclaim_grace: Duration) -> Self {
        Self {
            registry: ConnectionRegistry::new(),
            broadcast: None,
            viewers: ViewerSet::default(),
            call: None,
            pending_invites: HashMap::new(),
            clock,
            reclaim_grace,
        }
    }

    /// 새 연결 등록
    ///
    /// 이 사용자 앞으로 대기 중인 초대가 있으면 여기서 바로 전달한다.
    pub fn open_connection(
        &mut self,
        conn_id: &str,
        app_user_id: Option<String>,
        sender: UnboundedSender<ServerMessage>,
    ) {
        self.registry
            .register(conn_id.to_string(), app_user_id.clone(), sender);
        self.registry.send_to(
            conn_id,
            ServerMessage::Connected {
                socket_id: conn_id.to_string(),
            },
        );

        tracing::info!(
            conn_id = %conn_id,
            app_user_id = ?app_user_id,
            connections = self.registry.len(),
            "Connection registered"
        );

        if let Some(app_user_id) = app_user_id {
            self.deliver_pending_invite(conn_id, &app_user_id);
        }
    }

    /// 연결 종료 처리
    ///
    /// 역할별 정리는 레지스트리에서 연결을 지우기 전에 끝나야 한다.
    pub fn close_connection(&mut self, conn_id: &str) {
        let roles: Vec<Role> = match self.registry.get(conn_id) {
            Some(connection) => connection.roles().collect(),
            None => return,
        };

        let mut call_unwound = false;
        for role in roles {
            match role {
                Role::Broadcaster => self.broadcaster_disconnected(conn_id),
                Role::Viewer => self.unregister_viewer(conn_id),
                Role::CallAdmin | Role::CallUser => {
                    if !call_unwound {
                        self.call_party_disconnected(conn_id);
                        call_unwound = true;
                    }
                }
            }
        }

        self.registry.remove(conn_id);
        tracing::info!(
            conn_id = %conn_id,
            connections = self.registry.len(),
            "Connection removed"
        );
    }

    #[cfg(test)]
    pub fn connection(&self, conn_id: &str) -> Option<&registry::Connection> {
        self.registry.get(conn_id)
    }

    #[cfg(test)]
    pub fn broadcast_session(&self) -> Option<&BroadcastSession> {
        self.broadcast.as_ref()
    }

    #[cfg(test)]
    pub fn private_call(&self) -> Option<&PrivateCall> {
        self.call.as_ref()
    }

    #[cfg(test)]
    pub fn is_viewer(&self, conn_id: &str) -> bool {
        self.viewers.contains(conn_id)
    }

    pub fn stats(&self) -> HubStats {
        let broadcast = match &self.broadcast {
            None => "offline",
            Some(session) if session.is_reclaiming() => "reclaiming",
            Some(_) => "live",
        };
        HubStats {
            connections: self.registry.len(),
            broadcast,
            viewers: self.viewers.len(),
            private_call: self.call_state(),
            pending_invites: self.pending_invites.len(),
        }
    }
}
