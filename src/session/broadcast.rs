//! 일반 방송 세션 관리 (Offline → Live → Offline)
//!
//! 방송은 시스템 전체에 하나만 존재한다. 같은 애플리케이션 사용자가 다른 연결로
//! 다시 시작하면 기존 세션을 이어받는다(reclaim). 모바일 망에서 연결이 자주
//! 끊기기 때문에, 사용자 ID가 있는 방송자가 끊기면 유예 시간 동안 세션을 유지한다.

use super::access;
use super::registry::{ConnectionId, Role};
use super::Coordinator;
use crate::error::SignalError;
use crate::protocol::ServerMessage;
use crate::site_config::ConfigSnapshot;
use std::time::Instant;

/// 방송 시작 요청
#[derive(Debug, Clone, Default)]
pub struct BroadcastRequest {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub logged_in_only: Option<bool>,
}

/// 현재 방송 세션
#[derive(Debug, Clone)]
pub struct BroadcastSession {
    broadcaster: Option<ConnectionId>,
    broadcaster_app_user_id: Option<String>,
    title: String,
    subtitle: String,
    logged_in_only: bool,
    started_at: Instant,
    orphaned_at: Option<Instant>,
}

impl BroadcastSession {
    /// 방송자 연결. 재연결 대기 중이면 None
    pub fn broadcaster(&self) -> Option<&str> {
        self.broadcaster.as_deref()
    }

    pub fn broadcaster_app_user_id(&self) -> Option<&str> {
        self.broadcaster_app_user_id.as_deref()
    }

    #[cfg(test)]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[cfg(test)]
    pub fn subtitle(&self) -> &str {
        &self.subtitle
    }

    pub fn logged_in_only(&self) -> bool {
        self.logged_in_only
    }

    pub fn is_reclaiming(&self) -> bool {
        self.broadcaster.is_none()
    }

    pub(super) fn is_owned_by(&self, conn_id: &str) -> bool {
        self.broadcaster.as_deref() == Some(conn_id)
    }

    pub(super) fn info_message(&self) -> ServerMessage {
        ServerMessage::GeneralStreamInfo {
            broadcaster_id: self.broadcaster.clone(),
            title: self.title.clone(),
            subtitle: self.subtitle.clone(),
            logged_in_only: self.logged_in_only,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Coordinator {
    /// 방송 시작 또는 기존 방송 이어받기
    pub fn start_broadcast(
        &mut self,
        conn_id: &str,
        request: BroadcastRequest,
        config: &ConfigSnapshot,
    ) -> Result<(), SignalError> {
        let connection = self
            .registry
            .get(conn_id)
            .ok_or_else(|| SignalError::PeerVanished(conn_id.to_string()))?;
        let app_user_id = connection.app_user_id.clone();

        if let Some(session) = &self.broadcast {
            let same_connection = session.is_owned_by(conn_id);
            let same_user = matches!(
                (session.broadcaster_app_user_id(), app_user_id.as_deref()),
                (Some(current), Some(requester)) if current == requester
            );
            if !same_connection && !same_user {
                tracing::warn!(
                    conn_id = %conn_id,
                    broadcaster = ?session.broadcaster(),
                    "Broadcast start rejected, another broadcaster is live"
                );
                return Err(SignalError::AlreadyBroadcasting);
            }
        }

        if !access::can_start_broadcast(connection, self.call.as_ref()) {
            tracing::warn!(conn_id = %conn_id, "Broadcast start rejected, private call in progress");
            return Err(SignalError::CallInProgress);
        }

        let title = non_empty(request.title);
        let subtitle = non_empty(request.subtitle);
        let now = self.clock.now();

        let session = match self.broadcast.take() {
            Some(mut session) => {
                if let Some(previous) = session.broadcaster.take() {
                    if previous != conn_id {
                        self.registry.untag_role(&previous, Role::Broadcaster);
                        tracing::info!(
                            previous = %previous,
                            conn_id = %conn_id,
                            "Broadcast reclaimed from live connection"
                        );
                    }
                } else {
                    tracing::info!(conn_id = %conn_id, "Broadcast reclaimed after disconnect");
                }
                session.broadcaster = Some(conn_id.to_string());
                session.orphaned_at = None;
                if let Some(title) = title {
                    session.title = title;
                }
                if let Some(subtitle) = subtitle {
                    session.subtitle = subtitle;
                }
                if let Some(logged_in_only) = request.logged_in_only {
                    session.logged_in_only = logged_in_only;
                }
                session
            }
            None => {
                tracing::info!(conn_id = %conn_id, app_user_id = ?app_user_id, "Broadcast started");
                BroadcastSession {
                    broadcaster: Some(conn_id.to_string()),
                    broadcaster_app_user_id: app_user_id,
                    title: title.unwrap_or_else(|| config.default_stream_title.clone()),
                    subtitle: subtitle.unwrap_or_else(|| config.default_stream_subtitle.clone()),
                    logged_in_only: request
                        .logged_in_only
                        .unwrap_or(config.stream_logged_in_only),
                    started_at: now,
                    orphaned_at: None,
                }
            }
        };

        self.registry.tag_role(conn_id, Role::Broadcaster);
        let ready = ServerMessage::GeneralBroadcasterReady {
            broadcaster_id: conn_id.to_string(),
            title: session.title.clone(),
            subtitle: session.subtitle.clone(),
            logged_in_only: session.logged_in_only,
        };
        self.broadcast = Some(session);
        self.evict_ineligible_viewers();
        self.registry.broadcast(&ready);

        tracing::info!(
            conn_id = %conn_id,
            viewers = self.viewers.len(),
            "Broadcaster ready announced"
        );
        Ok(())
    }

    /// 방송 종료. 방송자 본인이 아니면 아무것도 하지 않는다
    pub fn stop_broadcast(&mut self, conn_id: &str) -> Result<(), SignalError> {
        match &self.broadcast {
            Some(session) if session.is_owned_by(conn_id) => {
                self.teardown_broadcast();
                Ok(())
            }
            _ => {
                tracing::debug!(conn_id = %conn_id, "Stop ignored, not the broadcaster");
                Ok(())
            }
        }
    }

    /// 유예 시간이 지난 고아 방송 정리. 정리했으면 true
    pub fn sweep_orphaned_broadcast(&mut self) -> bool {
        let now = self.clock.now();
        let expired = self
            .broadcast
            .as_ref()
            .and_then(|session| session.orphaned_at)
            .is_some_and(|orphaned_at| now.duration_since(orphaned_at) >= self.reclaim_grace);

        if expired {
            tracing::info!("Broadcaster did not reconnect within grace period");
            self.teardown_broadcast();
        }
        expired
    }

    pub(super) fn broadcaster_disconnected(&mut self, conn_id: &str) {
        self.registry.untag_role(conn_id, Role::Broadcaster);

        let reclaimable = match &self.broadcast {
            Some(session) if session.is_owned_by(conn_id) => {
                session.broadcaster_app_user_id.is_some() && !self.reclaim_grace.is_zero()
            }
            _ => return,
        };

        if reclaimable {
            let now = self.clock.now();
            if let Some(session) = self.broadcast.as_mut() {
                session.broadcaster = None;
                session.orphaned_at = Some(now);
            }
            tracing::info!(
                conn_id = %conn_id,
                grace_secs = self.reclaim_grace.as_secs(),
                "Broadcaster disconnected, holding session for reclaim"
            );
        } else {
            self.teardown_broadcast();
        }
    }

    /// 세션과 시청자 목록을 비우고 모든 연결에 오프라인 알림
    fn teardown_broadcast(&mut self) {
        let Some(session) = self.broadcast.take() else {
            return;
        };
        if let Some(broadcaster) = session.broadcaster() {
            self.registry.untag_role(broadcaster, Role::Broadcaster);
        }
        for viewer_id in self.viewers.drain() {
            self.registry.untag_role(&viewer_id, Role::Viewer);
        }
        self.registry
            .broadcast(&ServerMessage::GeneralBroadcasterDisconnected);

        tracing::info!(
            app_user_id = ?session.broadcaster_app_user_id,
            duration_secs = self.clock.now().duration_since(session.started_at).as_secs(),
            "Broadcast ended"
        );
    }

    /// 정책이 로그인 전용으로 바뀌면 익명 시청자를 내보낸다
    fn evict_ineligible_viewers(&mut self) {
        let Some(session) = &self.broadcast else {
            return;
        };
        let evicted: Vec<ConnectionId> = self
            .viewers
            .iter()
            .filter(|id| {
                self.registry
                    .get(id)
                    .is_some_and(|c| !access::can_view_broadcast(c, session))
            })
            .cloned()
            .collect();
        let broadcaster = session.broadcaster.clone();

        for viewer_id in evicted {
            self.viewers.remove(&viewer_id);
            self.registry.untag_role(&viewer_id, Role::Viewer);
            self.registry.send_to(
                &viewer_id,
                ServerMessage::GeneralStreamAccessDenied {
                    reason: "stream is restricted to logged-in users".into(),
                },
            );
            if let Some(broadcaster) = &broadcaster {
                self.registry.send_to(
                    broadcaster,
                    ServerMessage::GeneralViewerDisconnected {
                        viewer_id: viewer_id.clone(),
                    },
                );
            }
            tracing::info!(viewer_id = %viewer_id, "Viewer evicted after policy change");
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::clock::ManualClock;
    use crate::error::SignalError;
    use crate::protocol::ServerMessage;
    use crate::session::test_support::*;
    use crate::session::Role;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn start_announces_ready_to_every_connection() {
        let mut hub = hub();
        let (admin, mut admin_rx) = connect(&mut hub, Some("admin"));
        let (early, mut early_rx) = connect(&mut hub, None);

        hub.start_broadcast(&admin, request(Some("Gala"), Some(false)), &config())
            .unwrap();

        let expected = ServerMessage::GeneralBroadcasterReady {
            broadcaster_id: admin.clone(),
            title: "Gala".into(),
            subtitle: "Welcome".into(),
            logged_in_only: false,
        };
        assert_eq!(drain(&mut early_rx), vec![expected.clone()]);
        assert_eq!(drain(&mut admin_rx), vec![expected]);
        assert!(hub.connection(&admin).unwrap().has_role(Role::Broadcaster));
        assert!(!hub.connection(&early).unwrap().has_role(Role::Broadcaster));
    }

    #[test]
    fn defaults_come_from_site_config() {
        let mut hub = hub();
        let (admin, _rx) = connect(&mut hub, None);
        let mut cfg = config();
        cfg.stream_logged_in_only = true;

        hub.start_broadcast(&admin, request(Some("   "), None), &cfg)
            .unwrap();
        let session = hub.broadcast_session().unwrap();
        assert_eq!(session.title(), "Live class");
        assert_eq!(session.subtitle(), "Welcome");
        assert!(session.logged_in_only());
    }

    #[test]
    fn second_broadcaster_is_rejected() {
        let mut hub = hub();
        let (first, _rx1) = connect(&mut hub, Some("admin"));
        let (second, _rx2) = connect(&mut hub, Some("other-admin"));
        let (anon, _rx3) = connect(&mut hub, None);

        hub.start_broadcast(&first, request(None, None), &config())
            .unwrap();
        assert_eq!(
            hub.start_broadcast(&second, request(None, None), &config()),
            Err(SignalError::AlreadyBroadcasting)
        );
        assert_eq!(
            hub.start_broadcast(&anon, request(None, None), &config()),
            Err(SignalError::AlreadyBroadcasting)
        );
        assert_eq!(hub.broadcast_session().unwrap().broadcaster(), Some(first.as_str()));
    }

    #[test]
    fn same_user_reclaims_from_live_connection() {
        let mut hub = hub();
        let (old, _old_rx) = connect(&mut hub, Some("admin"));
        let (viewer, mut viewer_rx) = connect(&mut hub, None);
        hub.start_broadcast(&old, request(Some("Gala"), None), &config())
            .unwrap();
        hub.register_viewer(&viewer).unwrap();
        drain(&mut viewer_rx);

        let (new, _new_rx) = connect(&mut hub, Some("admin"));
        hub.start_broadcast(&new, request(None, None), &config())
            .unwrap();

        let session = hub.broadcast_session().unwrap();
        assert_eq!(session.broadcaster(), Some(new.as_str()));
        assert_eq!(session.title(), "Gala");
        assert!(hub.is_viewer(&viewer));
        assert!(!hub.connection(&old).unwrap().has_role(Role::Broadcaster));

        // 이전 연결이 늦게 끊겨도 방송은 유지된다
        hub.close_connection(&old);
        assert!(hub.broadcast_session().is_some());
        assert!(!drain(&mut viewer_rx)
            .iter()
            .any(|m| matches!(m, ServerMessage::GeneralBroadcasterDisconnected)));
    }

    #[test]
    fn reconnect_within_grace_keeps_broadcast_alive() {
        let clock = Arc::new(ManualClock::new());
        let mut hub = hub_with_clock(clock.clone());
        let (admin, _admin_rx) = connect(&mut hub, Some("admin"));
        let (viewer, mut viewer_rx) = connect(&mut hub, None);
        hub.start_broadcast(&admin, request(Some("Gala"), None), &config())
            .unwrap();
        hub.register_viewer(&viewer).unwrap();
        drain(&mut viewer_rx);

        hub.close_connection(&admin);
        assert!(hub.broadcast_session().unwrap().is_reclaiming());

        clock.advance(GRACE - Duration::from_secs(1));
        assert!(!hub.sweep_orphaned_broadcast());

        let (again, _again_rx) = connect(&mut hub, Some("admin"));
        hub.start_broadcast(&again, request(None, None), &config())
            .unwrap();

        clock.advance(GRACE * 2);
        assert!(!hub.sweep_orphaned_broadcast());
        assert_eq!(hub.broadcast_session().unwrap().broadcaster(), Some(again.as_str()));
        assert!(hub.is_viewer(&viewer));

        let seen = drain(&mut viewer_rx);
        assert!(!seen
            .iter()
            .any(|m| matches!(m, ServerMessage::GeneralBroadcasterDisconnected)));
        assert!(seen
            .iter()
            .any(|m| matches!(m, ServerMessage::GeneralBroadcasterReady { .. })));
    }

    #[test]
    fn orphaned_broadcast_expires_after_grace() {
        let clock = Arc::new(ManualClock::new());
        let mut hub = hub_with_clock(clock.clone());
        let (admin, _admin_rx) = connect(&mut hub, Some("admin"));
        let (viewer, mut viewer_rx) = connect(&mut hub, None);
        hub.start_broadcast(&admin, request(None, None), &config())
            .unwrap();
        hub.register_viewer(&viewer).unwrap();
        drain(&mut viewer_rx);

        hub.close_connection(&admin);
        clock.advance(GRACE);
        assert!(hub.sweep_orphaned_broadcast());

        assert!(hub.broadcast_session().is_none());
        assert!(!hub.is_viewer(&viewer));
        assert_eq!(
            drain(&mut viewer_rx),
            vec![ServerMessage::GeneralBroadcasterDisconnected]
        );
    }

    #[test]
    fn anonymous_broadcaster_disconnect_ends_immediately() {
        let mut hub = hub();
        let (admin, _admin_rx) = connect(&mut hub, None);
        let (_viewer, mut viewer_rx) = connect(&mut hub, None);
        hub.start_broadcast(&admin, request(None, None), &config())
            .unwrap();
        drain(&mut viewer_rx);

        hub.close_connection(&admin);
        assert!(hub.broadcast_session().is_none());
        assert_eq!(
            drain(&mut viewer_rx),
            vec![ServerMessage::GeneralBroadcasterDisconnected]
        );
    }

    #[test]
    fn stop_from_non_broadcaster_is_ignored() {
        let mut hub = hub();
        let (admin, _admin_rx) = connect(&mut hub, Some("admin"));
        let (other, _other_rx) = connect(&mut hub, Some("admin"));
        hub.start_broadcast(&admin, request(None, None), &config())
            .unwrap();

        hub.stop_broadcast(&other).unwrap();
        assert!(hub.broadcast_session().is_some());

        hub.stop_broadcast(&admin).unwrap();
        assert!(hub.broadcast_session().is_none());
        assert!(!hub.connection(&admin).unwrap().has_role(Role::Broadcaster));
    }

    #[test]
    fn stop_clears_viewers_and_notifies_everyone() {
        let mut hub = hub();
        let (admin, mut admin_rx) = connect(&mut hub, Some("admin"));
        let (viewer, mut viewer_rx) = connect(&mut hub, None);
        let (_idle, mut idle_rx) = connect(&mut hub, None);
        hub.start_broadcast(&admin, request(None, None), &config())
            .unwrap();
        hub.register_viewer(&viewer).unwrap();
        drain(&mut admin_rx);
        drain(&mut viewer_rx);
        drain(&mut idle_rx);

        hub.stop_broadcast(&admin).unwrap();
        assert!(!hub.is_viewer(&viewer));
        assert!(!hub.connection(&viewer).unwrap().has_role(Role::Viewer));
        for rx in [&mut admin_rx, &mut viewer_rx, &mut idle_rx] {
            assert_eq!(drain(rx), vec![ServerMessage::GeneralBroadcasterDisconnected]);
        }
    }

    #[test]
    fn tightening_policy_evicts_anonymous_viewers() {
        let mut hub = hub();
        let (admin, mut admin_rx) = connect(&mut hub, Some("admin"));
        let (anon, mut anon_rx) = connect(&mut hub, None);
        let (member, _member_rx) = connect(&mut hub, Some("member"));
        hub.start_broadcast(&admin, request(None, Some(false)), &config())
            .unwrap();
        hub.register_viewer(&anon).unwrap();
        hub.register_viewer(&member).unwrap();
        drain(&mut anon_rx);
        drain(&mut admin_rx);

        hub.start_broadcast(&admin, request(None, Some(true)), &config())
            .unwrap();
        assert!(!hub.is_viewer(&anon));
        assert!(hub.is_viewer(&member));
        assert!(drain(&mut anon_rx)
            .iter()
            .any(|m| matches!(m, ServerMessage::GeneralStreamAccessDenied { .. })));
        assert!(drain(&mut admin_rx).contains(&ServerMessage::GeneralViewerDisconnected {
            viewer_id: anon.clone()
        }));
    }

    #[test]
    fn at_most_one_session_across_start_stop_disconnect() {
        let mut hub = hub();
        let mut conns = Vec::new();
        for user in [Some("a"), Some("b"), None, Some("a")] {
            conns.push(connect(&mut hub, user));
        }

        for (i, (id, _)) in conns.iter().enumerate() {
            let _ = hub.start_broadcast(id, request(None, None), &config());
            let owners = conns
                .iter()
                .filter(|(c, _)| {
                    hub.connection(c)
                        .is_some_and(|c| c.has_role(Role::Broadcaster))
                })
                .count();
            assert!(owners <= 1, "step {i}: {owners} broadcasters");
        }

        let owner = hub
            .broadcast_session()
            .unwrap()
            .broadcaster()
            .unwrap()
            .to_string();
        assert_eq!(owner, conns[3].0);
        hub.stop_broadcast(&owner).unwrap();
        assert!(hub.broadcast_session().is_none());
    }
}
