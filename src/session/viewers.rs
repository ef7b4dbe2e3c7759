//! 시청자 중계
//!
//! 현재 방송에 붙은 시청자 목록과, 방송자와 각 시청자 사이의 SDP/ICE 전달.
//! 전달은 내용을 보지 않고 그대로 넘긴다. 대상이 이미 사라졌으면 `PeerVanished`로
//! 조용히 버린다.

use super::access;
use super::registry::{ConnectionId, Role};
use super::Coordinator;
use crate::error::SignalError;
use crate::protocol::ServerMessage;
use serde_json::Value;
use std::collections::HashSet;

/// 현재 방송의 시청자 목록
#[derive(Debug, Default)]
pub struct ViewerSet {
    viewers: HashSet<ConnectionId>,
}

impl ViewerSet {
    pub fn insert(&mut self, id: &str) -> bool {
        self.viewers.insert(id.to_string())
    }

    pub fn remove(&mut self, id: &str) -> bool {
        self.viewers.remove(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.viewers.contains(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConnectionId> {
        self.viewers.iter()
    }

    pub fn drain(&mut self) -> Vec<ConnectionId> {
        self.viewers.drain().collect()
    }

    pub fn len(&self) -> usize {
        self.viewers.len()
    }
}

impl Coordinator {
    /// 시청자 등록
    ///
    /// 이미 등록된 시청자가 다시 요청해도 목록은 그대로이고, 방송자에게는 다시
    /// 알린다(방송자 재연결 후 협상을 새로 시작하기 위함).
    pub fn register_viewer(&mut self, conn_id: &str) -> Result<(), SignalError> {
        let Some(session) = &self.broadcast else {
            return Err(SignalError::NoActiveBroadcast);
        };
        let connection = self
            .registry
            .get(conn_id)
            .ok_or_else(|| SignalError::PeerVanished(conn_id.to_string()))?;

        if !access::can_view_broadcast(connection, session) {
            tracing::info!(conn_id = %conn_id, "Anonymous viewer denied, stream is logged-in only");
            return Err(SignalError::AccessDenied {
                reason: "stream is restricted to logged-in users",
            });
        }

        let info = session.info_message();
        let broadcaster = session.broadcaster().map(str::to_string);

        let newly_joined = self.viewers.insert(conn_id);
        self.registry.tag_role(conn_id, Role::Viewer);
        self.registry.send_to(conn_id, info);

        match broadcaster {
            Some(broadcaster) => {
                self.registry.send_to(
                    &broadcaster,
                    ServerMessage::NewGeneralViewer {
                        viewer_id: conn_id.to_string(),
                    },
                );
            }
            None => {
                tracing::debug!(conn_id = %conn_id, "Viewer joined while broadcaster reconnects");
            }
        }

        tracing::info!(
            conn_id = %conn_id,
            newly_joined = newly_joined,
            viewers = self.viewers.len(),
            "Viewer registered"
        );
        Ok(())
    }

    /// 시청자 해제. 등록되지 않은 연결이면 아무것도 하지 않는다
    pub fn unregister_viewer(&mut self, conn_id: &str) {
        self.registry.untag_role(conn_id, Role::Viewer);
        if !self.viewers.remove(conn_id) {
            return;
        }

        if let Some(broadcaster) = self.broadcast.as_ref().and_then(|s| s.broadcaster()) {
            self.registry.send_to(
                broadcaster,
                ServerMessage::GeneralViewerDisconnected {
                    viewer_id: conn_id.to_string(),
                },
            );
        }

        tracing::info!(
            conn_id = %conn_id,
            viewers = self.viewers.len(),
            "Viewer left"
        );
    }

    /// 방송자 → 시청자 offer 전달
    pub fn relay_offer_to_viewer(
        &self,
        from: &str,
        viewer_id: &str,
        offer: Value,
    ) -> Result<(), SignalError> {
        self.ensure_broadcaster(from)?;
        self.deliver_to_viewer(
            viewer_id,
            ServerMessage::OfferFromGeneralBroadcaster {
                broadcaster_id: from.to_string(),
                offer,
            },
        )?;
        tracing::debug!(from = %from, to = %viewer_id, "Relayed offer to viewer");
        Ok(())
    }

    /// 시청자 → 방송자 answer 전달
    pub fn relay_answer_to_broadcaster(&self, from: &str, answer: Value) -> Result<(), SignalError> {
        self.ensure_viewer(from)?;
        let broadcaster = self.deliver_to_broadcaster(ServerMessage::AnswerFromGeneralViewer {
            viewer_id: from.to_string(),
            answer,
        })?;
        tracing::debug!(from = %from, to = %broadcaster, "Relayed answer to broadcaster");
        Ok(())
    }

    /// 방송자 → 시청자 ICE candidate 전달
    pub fn relay_candidate_to_viewer(
        &self,
        from: &str,
        viewer_id: &str,
        candidate: Value,
    ) -> Result<(), SignalError> {
        self.ensure_broadcaster(from)?;
        self.deliver_to_viewer(
            viewer_id,
            ServerMessage::CandidateFromGeneralBroadcaster {
                broadcaster_id: from.to_string(),
                candidate,
            },
        )?;
        tracing::debug!(from = %from, to = %viewer_id, "Relayed candidate to viewer");
        Ok(())
    }

    /// 시청자 → 방송자 ICE candidate 전달
    pub fn relay_candidate_to_broadcaster(
        &self,
        from: &str,
        candidate: Value,
    ) -> Result<(), SignalError> {
        self.ensure_viewer(from)?;
        let broadcaster = self.deliver_to_broadcaster(ServerMessage::CandidateFromGeneralViewer {
            viewer_id: from.to_string(),
            candidate,
        })?;
        tracing::debug!(from = %from, to = %broadcaster, "Relayed candidate to broadcaster");
        Ok(())
    }

    fn ensure_broadcaster(&self, conn_id: &str) -> Result<(), SignalError> {
        match &self.broadcast {
            None => Err(SignalError::NoActiveBroadcast),
            Some(session) if session.is_owned_by(conn_id) => Ok(()),
            Some(_) => {
                tracing::warn!(conn_id = %conn_id, "Relay rejected, sender is not the broadcaster");
                Err(SignalError::WrongRole {
                    reason: "sender is not the broadcaster",
                })
            }
        }
    }

    fn ensure_viewer(&self, conn_id: &str) -> Result<(), SignalError> {
        if self.broadcast.is_none() {
            return Err(SignalError::NoActiveBroadcast);
        }
        if !self.viewers.contains(conn_id) {
            tracing::warn!(conn_id = %conn_id, "Relay rejected, sender is not a registered viewer");
            return Err(SignalError::WrongRole {
                reason: "sender is not a registered viewer",
            });
        }
        Ok(())
    }

    fn deliver_to_viewer(&self, viewer_id: &str, message: ServerMessage) -> Result<(), SignalError> {
        if !self.viewers.contains(viewer_id) || !self.registry.send_to(viewer_id, message) {
            return Err(SignalError::PeerVanished(viewer_id.to_string()));
        }
        Ok(())
    }

    fn deliver_to_broadcaster(&self, message: ServerMessage) -> Result<String, SignalError> {
        let broadcaster = self
            .broadcast
            .as_ref()
            .and_then(|s| s.broadcaster())
            .ok_or_else(|| SignalError::PeerVanished("broadcaster".to_string()))?;
        if !self.registry.send_to(broadcaster, message) {
            return Err(SignalError::PeerVanished(broadcaster.to_string()));
        }
        Ok(broadcaster.to_string())
    }
}
