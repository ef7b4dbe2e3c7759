//! 관리자 ↔ 권한 사용자 1:1 개인 통화
//!
//! 상태: Idle → Inviting → (PendingDelivery | Ringing) → Accepted → Terminated.
//! Idle과 Terminated는 슬롯이 비어 있는 상태로 표현한다. 대상이 오프라인이면
//! 초대를 보관했다가 그 사용자가 접속하는 순간 정확히 한 번 전달한다.

use super::access;
use super::registry::{ConnectionId, Role};
use super::Coordinator;
use crate::error::SignalError;
use crate::protocol::{CallEndReason, ServerMessage};
use crate::site_config::ConfigSnapshot;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CallState {
    Idle,
    Inviting,
    PendingDelivery,
    Ringing,
    Accepted,
    Terminated,
}

/// 통화 참여자
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallParty {
    pub connection_id: ConnectionId,
    pub app_user_id: Option<String>,
}

/// 오프라인 대상에게 보관된 초대
#[derive(Debug, Clone)]
pub struct PendingInvite {
    pub admin: CallParty,
}

#[derive(Debug, Clone)]
pub struct PrivateCall {
    state: CallState,
    admin: CallParty,
    target_app_user_id: String,
    user: Option<CallParty>,
}

impl PrivateCall {
    pub fn admin(&self) -> &CallParty {
        &self.admin
    }

    /// 슬롯에 남아 있는 통화는 대기 중인 초대까지 모두 진행 중으로 본다
    pub fn is_engaged(&self) -> bool {
        matches!(
            self.state,
            CallState::Inviting | CallState::PendingDelivery | CallState::Ringing | CallState::Accepted
        )
    }

    fn is_user(&self, conn_id: &str) -> bool {
        self.user.as_ref().is_some_and(|u| u.connection_id == conn_id)
    }

    /// 보낸 쪽의 상대방 연결
    fn peer_of(&self, conn_id: &str) -> Option<&str> {
        let user = self.user.as_ref()?;
        if self.admin.connection_id == conn_id {
            Some(&user.connection_id)
        } else if user.connection_id == conn_id {
            Some(&self.admin.connection_id)
        } else {
            None
        }
    }
}

/// 두 참여자 사이에 그대로 전달되는 협상 메시지
#[derive(Debug, Clone)]
pub enum PrivateSignal {
    Offer(Value),
    Answer(Value),
    Candidate(Value),
}

impl PrivateSignal {
    fn into_message(self, from: &str) -> ServerMessage {
        let from_socket_id = from.to_string();
        match self {
            PrivateSignal::Offer(payload) => ServerMessage::PrivateSdpOfferReceived {
                from_socket_id,
                payload,
            },
            PrivateSignal::Answer(payload) => ServerMessage::PrivateSdpAnswerReceived {
                from_socket_id,
                payload,
            },
            PrivateSignal::Candidate(candidate) => ServerMessage::PrivateIceCandidateReceived {
                from_socket_id,
                candidate,
            },
        }
    }
}

impl Coordinator {
    pub fn call_state(&self) -> CallState {
        self.call.as_ref().map_or(CallState::Idle, |c| c.state)
    }

    /// 관리자가 권한 사용자에게 통화 요청
    pub fn invite_private_call(
        &mut self,
        admin_id: &str,
        target_app_user_id: &str,
        config: &ConfigSnapshot,
    ) -> Result<(), SignalError> {
        let admin = self
            .registry
            .get(admin_id)
            .ok_or_else(|| SignalError::PeerVanished(admin_id.to_string()))?;
        let admin = CallParty {
            connection_id: admin.id.clone(),
            app_user_id: admin.app_user_id.clone(),
        };

        if self.broadcast.is_some() {
            tracing::warn!(conn_id = %admin_id, "Private call rejected, broadcast is live");
            return Err(SignalError::AdminBusy);
        }

        let target_app_user_id = target_app_user_id.trim();
        match config.authorized_user_id() {
            Some(authorized) if authorized == target_app_user_id => {}
            Some(_) => {
                return Err(SignalError::AccessDenied {
                    reason: "target is not authorized for private calls",
                })
            }
            None => {
                return Err(SignalError::AccessDenied {
                    reason: "no user is authorized for private calls",
                })
            }
        }

        if let Some(call) = &self.call {
            if call.admin.connection_id != admin_id || call.state == CallState::Accepted {
                return Err(SignalError::TargetBusy);
            }
        }

        let target = self
            .registry
            .find_by_app_user_id(target_app_user_id)
            .map(|c| (c.id.clone(), access::can_receive_private_call(c, config)));
        if matches!(&target, Some((id, _)) if id == admin_id) {
            return Err(SignalError::AccessDenied {
                reason: "cannot call yourself",
            });
        }

        // 같은 관리자의 이전 초대는 새 초대로 대체된다
        if self.call.is_some() {
            self.terminate_call(CallEndReason::Superseded, admin_id);
        }

        let mut call = PrivateCall {
            state: CallState::Inviting,
            admin: admin.clone(),
            target_app_user_id: target_app_user_id.to_string(),
            user: None,
        };
        self.registry.tag_role(admin_id, Role::CallAdmin);
        tracing::info!(
            admin = %admin_id,
            target = %target_app_user_id,
            "Private call inviting"
        );

        match target {
            Some((user_id, true)) => {
                call.state = CallState::Ringing;
                call.user = Some(CallParty {
                    connection_id: user_id.clone(),
                    app_user_id: Some(target_app_user_id.to_string()),
                });
                self.call = Some(call);
                self.ring(&admin, &user_id, target_app_user_id);
            }
            _ => {
                call.state = CallState::PendingDelivery;
                self.call = Some(call);
                self.pending_invites.insert(
                    target_app_user_id.to_string(),
                    PendingInvite { admin },
                );
                self.registry.send_to(
                    admin_id,
                    ServerMessage::PrivateCallPending {
                        target_user_app_id: target_app_user_id.to_string(),
                    },
                );
                tracing::info!(
                    admin = %admin_id,
                    target = %target_app_user_id,
                    "Target offline, invite held for delivery"
                );
            }
        }
        Ok(())
    }

    /// 대상 사용자 접속 시 보관된 초대를 소비해 Ringing으로 전환
    pub(super) fn deliver_pending_invite(&mut self, conn_id: &str, app_user_id: &str) {
        let Some(invite) = self.pending_invites.remove(app_user_id) else {
            return;
        };

        let admin = invite.admin;
        let Some(call) = self.call.as_mut().filter(|c| {
            c.state == CallState::PendingDelivery
                && c.admin == admin
                && c.target_app_user_id == app_user_id
        }) else {
            tracing::debug!(conn_id = %conn_id, "Discarded stale pending invite");
            return;
        };

        call.state = CallState::Ringing;
        call.user = Some(CallParty {
            connection_id: conn_id.to_string(),
            app_user_id: Some(app_user_id.to_string()),
        });
        self.ring(&admin, conn_id, app_user_id);
    }

    fn ring(&mut self, admin: &CallParty, user_id: &str, app_user_id: &str) {
        self.registry.tag_role(user_id, Role::CallUser);
        self.registry.send_to(
            user_id,
            ServerMessage::PrivateCallInviteFromAdmin {
                admin_socket_id: admin.connection_id.clone(),
                admin_app_user_id: admin.app_user_id.clone(),
            },
        );
        self.registry.send_to(
            &admin.connection_id,
            ServerMessage::PrivateCallRinging {
                target_user_app_id: app_user_id.to_string(),
                target_socket_id: user_id.to_string(),
            },
        );
        tracing::info!(admin = %admin.connection_id, user = %user_id, "Private call ringing");
    }

    /// 사용자가 통화 수락
    pub fn accept_private_call(
        &mut self,
        user_id: &str,
        admin_socket_id: &str,
    ) -> Result<(), SignalError> {
        let admin_alive = self.registry.contains(admin_socket_id);
        let Some(call) = self.call.as_mut() else {
            return Err(SignalError::StaleInvite);
        };

        if call.admin.connection_id != admin_socket_id {
            return Err(if admin_alive {
                SignalError::TargetBusy
            } else {
                SignalError::StaleInvite
            });
        }
        if !call.is_user(user_id) {
            return Err(if call.state == CallState::Accepted {
                SignalError::TargetBusy
            } else {
                SignalError::StaleInvite
            });
        }
        if call.state == CallState::Accepted {
            tracing::debug!(user = %user_id, "Call already accepted");
            return Ok(());
        }

        call.state = CallState::Accepted;
        let user_app_user_id = call.user.as_ref().and_then(|u| u.app_user_id.clone());
        self.registry.send_to(
            admin_socket_id,
            ServerMessage::PrivateCallUserReadyForOffer {
                user_socket_id: user_id.to_string(),
                user_app_user_id,
            },
        );
        tracing::info!(admin = %admin_socket_id, user = %user_id, "Private call accepted");
        Ok(())
    }

    /// 두 참여자 사이 SDP/ICE 전달
    pub fn relay_private_signal(
        &self,
        from: &str,
        target_socket_id: &str,
        signal: PrivateSignal,
    ) -> Result<(), SignalError> {
        let peer = self
            .call
            .as_ref()
            .filter(|c| c.state == CallState::Accepted)
            .and_then(|c| c.peer_of(from));

        match peer {
            Some(peer) if peer == target_socket_id => {
                if !self
                    .registry
                    .send_to(target_socket_id, signal.into_message(from))
                {
                    return Err(SignalError::PeerVanished(target_socket_id.to_string()));
                }
                tracing::debug!(from = %from, to = %target_socket_id, "Relayed private signal");
                Ok(())
            }
            _ => {
                tracing::warn!(
                    from = %from,
                    to = %target_socket_id,
                    "Private signal rejected, not a participant of the active call"
                );
                Err(SignalError::AccessDenied {
                    reason: "not a participant of the active private call",
                })
            }
        }
    }

    /// 관리자가 통화 종료. 관리자가 아니면 아무것도 하지 않는다
    pub fn end_call_by_admin(&mut self, conn_id: &str) {
        if self
            .call
            .as_ref()
            .is_some_and(|c| c.admin.connection_id == conn_id)
        {
            self.terminate_call(CallEndReason::EndedByAdmin, conn_id);
        }
    }

    /// 사용자가 통화 종료. 사용자가 아니면 아무것도 하지 않는다
    pub fn end_call_by_user(&mut self, conn_id: &str) {
        if self.call.as_ref().is_some_and(|c| c.is_user(conn_id)) {
            self.terminate_call(CallEndReason::EndedByUser, conn_id);
        }
    }

    pub(super) fn call_party_disconnected(&mut self, conn_id: &str) {
        self.registry.untag_role(conn_id, Role::CallAdmin);
        self.registry.untag_role(conn_id, Role::CallUser);

        let involved = self
            .call
            .as_ref()
            .is_some_and(|c| c.admin.connection_id == conn_id || c.is_user(conn_id));
        if involved {
            self.terminate_call(CallEndReason::PeerDisconnected, conn_id);
        }
    }

    /// 통화를 끝내고 남은 쪽에 정확히 한 번 알린다
    fn terminate_call(&mut self, reason: CallEndReason, initiator: &str) {
        let Some(mut call) = self.call.take() else {
            return;
        };
        let previous = call.state;
        call.state = CallState::Terminated;
        if previous == CallState::PendingDelivery {
            self.pending_invites.remove(&call.target_app_user_id);
        }

        self.registry
            .untag_role(&call.admin.connection_id, Role::CallAdmin);
        if let Some(user) = &call.user {
            self.registry.untag_role(&user.connection_id, Role::CallUser);
        }

        if call.admin.connection_id == initiator {
            if let Some(user) = &call.user {
                self.registry.send_to(
                    &user.connection_id,
                    ServerMessage::PrivateCallTerminatedByAdmin { reason },
                );
            }
        } else if let Some(user) = call.user.as_ref().filter(|u| u.connection_id == initiator) {
            self.registry.send_to(
                &call.admin.connection_id,
                ServerMessage::PrivateCallUserDisconnected {
                    user_socket_id: user.connection_id.clone(),
                    reason,
                },
            );
        }

        tracing::info!(
            admin = %call.admin.connection_id,
            user = ?call.user.as_ref().map(|u| &u.connection_id),
            from = ?previous,
            to = ?call.state,
            reason = ?reason,
            "Private call terminated"
        );
    }

    /// 권한 사용자 접속 여부 조회
    pub fn authorized_user_status(
        &self,
        target_app_user_id: &str,
        config: &ConfigSnapshot,
    ) -> ServerMessage {
        ServerMessage::AuthorizedUserStatus {
            target_user_app_id: target_app_user_id.to_string(),
            authorized: config.authorized_user_id() == Some(target_app_user_id),
            online: self
                .registry
                .find_by_app_user_id(target_app_user_id)
                .is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::test_support::*;
    use serde_json::json;

    fn terminations(messages: &[ServerMessage]) -> usize {
        messages
            .iter()
            .filter(|m| {
                matches!(
                    m,
                    ServerMessage::PrivateCallTerminatedByAdmin { .. }
                        | ServerMessage::PrivateCallUserDisconnected { .. }
                )
            })
            .count()
    }

    /// 관리자와 사용자가 Accepted 상태까지 간 통화
    fn accepted_call(
        hub: &mut Coordinator,
    ) -> (
        (ConnectionId, tokio::sync::mpsc::UnboundedReceiver<ServerMessage>),
        (ConnectionId, tokio::sync::mpsc::UnboundedReceiver<ServerMessage>),
    ) {
        let (admin, mut admin_rx) = connect(hub, Some("admin"));
        let (user, mut user_rx) = connect(hub, Some(AUTHORIZED));
        hub.invite_private_call(&admin, AUTHORIZED, &config()).unwrap();
        hub.accept_private_call(&user, &admin).unwrap();
        drain(&mut admin_rx);
        drain(&mut user_rx);
        ((admin, admin_rx), (user, user_rx))
    }

    #[test]
    fn online_target_rings_immediately() {
        let mut hub = hub();
        let (admin, mut admin_rx) = connect(&mut hub, Some("admin"));
        let (user, mut user_rx) = connect(&mut hub, Some(AUTHORIZED));

        hub.invite_private_call(&admin, AUTHORIZED, &config()).unwrap();
        assert_eq!(hub.call_state(), CallState::Ringing);
        assert_eq!(
            drain(&mut user_rx),
            vec![ServerMessage::PrivateCallInviteFromAdmin {
                admin_socket_id: admin.clone(),
                admin_app_user_id: Some("admin".into()),
            }]
        );
        assert_eq!(
            drain(&mut admin_rx),
            vec![ServerMessage::PrivateCallRinging {
                target_user_app_id: AUTHORIZED.into(),
                target_socket_id: user.clone(),
            }]
        );

        hub.accept_private_call(&user, &admin).unwrap();
        assert_eq!(hub.call_state(), CallState::Accepted);
        assert_eq!(
            drain(&mut admin_rx),
            vec![ServerMessage::PrivateCallUserReadyForOffer {
                user_socket_id: user.clone(),
                user_app_user_id: Some(AUTHORIZED.into()),
            }]
        );
    }

    #[test]
    fn offline_target_receives_invite_exactly_once_on_connect() {
        let mut hub = hub();
        let (admin, mut admin_rx) = connect(&mut hub, Some("admin"));

        hub.invite_private_call(&admin, AUTHORIZED, &config()).unwrap();
        assert_eq!(hub.call_state(), CallState::PendingDelivery);
        assert_eq!(
            drain(&mut admin_rx),
            vec![ServerMessage::PrivateCallPending {
                target_user_app_id: AUTHORIZED.into()
            }]
        );

        let (user, mut user_rx) = connect(&mut hub, Some(AUTHORIZED));
        assert_eq!(hub.call_state(), CallState::Ringing);
        let invites: Vec<_> = drain(&mut user_rx)
            .into_iter()
            .filter(|m| matches!(m, ServerMessage::PrivateCallInviteFromAdmin { .. }))
            .collect();
        assert_eq!(
            invites,
            vec![ServerMessage::PrivateCallInviteFromAdmin {
                admin_socket_id: admin.clone(),
                admin_app_user_id: Some("admin".into()),
            }]
        );
        assert!(hub.connection(&user).unwrap().has_role(Role::CallUser));

        // 같은 사용자가 다른 탭으로 접속해도 초대는 다시 오지 않는다
        let (_second_tab, mut second_rx) = connect(&mut hub, Some(AUTHORIZED));
        assert!(drain(&mut second_rx).is_empty());
        assert_eq!(hub.stats().pending_invites, 0);
    }

    #[test]
    fn admin_disconnect_discards_pending_invite() {
        let mut hub = hub();
        let (admin, _admin_rx) = connect(&mut hub, Some("admin"));
        hub.invite_private_call(&admin, AUTHORIZED, &config()).unwrap();

        hub.close_connection(&admin);
        assert_eq!(hub.call_state(), CallState::Idle);

        let (_user, mut user_rx) = connect(&mut hub, Some(AUTHORIZED));
        assert!(drain(&mut user_rx).is_empty());
    }

    #[test]
    fn invite_fails_while_broadcasting() {
        let mut hub = hub();
        let (admin, _admin_rx) = connect(&mut hub, Some("admin"));
        hub.start_broadcast(&admin, request(None, None), &config())
            .unwrap();

        assert_eq!(
            hub.invite_private_call(&admin, AUTHORIZED, &config()),
            Err(SignalError::AdminBusy)
        );
        assert!(hub.private_call().is_none());
    }

    #[test]
    fn start_broadcast_during_accepted_call_is_rejected() {
        let mut hub = hub();
        let ((admin, _), _) = accepted_call(&mut hub);

        assert_eq!(
            hub.start_broadcast(&admin, request(Some("Gala"), None), &config()),
            Err(SignalError::CallInProgress)
        );
        assert!(hub.broadcast_session().is_none());
    }

    #[test]
    fn invite_requires_authorized_target() {
        let mut hub = hub();
        let (admin, _admin_rx) = connect(&mut hub, Some("admin"));

        assert!(matches!(
            hub.invite_private_call(&admin, "stranger", &config()),
            Err(SignalError::AccessDenied { .. })
        ));
        assert!(matches!(
            hub.invite_private_call(&admin, AUTHORIZED, &ConfigSnapshot::default()),
            Err(SignalError::AccessDenied { .. })
        ));
        assert_eq!(hub.call_state(), CallState::Idle);
    }

    #[test]
    fn second_admin_gets_target_busy() {
        let mut hub = hub();
        let _call = accepted_call(&mut hub);
        let (other, _other_rx) = connect(&mut hub, Some("admin-2"));

        assert_eq!(
            hub.invite_private_call(&other, AUTHORIZED, &config()),
            Err(SignalError::TargetBusy)
        );
    }

    #[test]
    fn accept_after_admin_left_is_stale() {
        let mut hub = hub();
        let (admin, _admin_rx) = connect(&mut hub, Some("admin"));
        let (user, mut user_rx) = connect(&mut hub, Some(AUTHORIZED));
        hub.invite_private_call(&admin, AUTHORIZED, &config()).unwrap();
        drain(&mut user_rx);

        hub.close_connection(&admin);
        assert_eq!(
            drain(&mut user_rx),
            vec![ServerMessage::PrivateCallTerminatedByAdmin {
                reason: CallEndReason::PeerDisconnected
            }]
        );
        assert_eq!(
            hub.accept_private_call(&user, &admin),
            Err(SignalError::StaleInvite)
        );
    }

    #[test]
    fn reinvite_supersedes_ringing_call() {
        let mut hub = hub();
        let (admin, _admin_rx) = connect(&mut hub, Some("admin"));
        let (user, mut user_rx) = connect(&mut hub, Some(AUTHORIZED));
        hub.invite_private_call(&admin, AUTHORIZED, &config()).unwrap();
        drain(&mut user_rx);

        hub.invite_private_call(&admin, AUTHORIZED, &config()).unwrap();
        let seen = drain(&mut user_rx);
        assert_eq!(
            seen[0],
            ServerMessage::PrivateCallTerminatedByAdmin {
                reason: CallEndReason::Superseded
            }
        );
        assert!(matches!(seen[1], ServerMessage::PrivateCallInviteFromAdmin { .. }));
        assert_eq!(hub.call_state(), CallState::Ringing);
        hub.accept_private_call(&user, &admin).unwrap();
    }

    #[test]
    fn signals_relay_between_the_two_parties() {
        let mut hub = hub();
        let ((admin, mut admin_rx), (user, mut user_rx)) = accepted_call(&mut hub);

        let offer = json!({ "type": "offer", "sdp": "v=0" });
        hub.relay_private_signal(&admin, &user, PrivateSignal::Offer(offer.clone()))
            .unwrap();
        assert_eq!(
            drain(&mut user_rx),
            vec![ServerMessage::PrivateSdpOfferReceived {
                from_socket_id: admin.clone(),
                payload: offer,
            }]
        );

        let candidate = json!({ "candidate": "candidate:2" });
        hub.relay_private_signal(&user, &admin, PrivateSignal::Candidate(candidate.clone()))
            .unwrap();
        assert_eq!(
            drain(&mut admin_rx),
            vec![ServerMessage::PrivateIceCandidateReceived {
                from_socket_id: user.clone(),
                candidate,
            }]
        );

        let (outsider, _outsider_rx) = connect(&mut hub, None);
        assert!(matches!(
            hub.relay_private_signal(&outsider, &user, PrivateSignal::Answer(json!({}))),
            Err(SignalError::AccessDenied { .. })
        ));
        assert!(matches!(
            hub.relay_private_signal(&admin, &outsider, PrivateSignal::Answer(json!({}))),
            Err(SignalError::AccessDenied { .. })
        ));
    }

    #[test]
    fn admin_end_notifies_user_once() {
        let mut hub = hub();
        let ((admin, mut admin_rx), (user, mut user_rx)) = accepted_call(&mut hub);

        hub.end_call_by_admin(&admin);
        hub.end_call_by_admin(&admin);
        assert_eq!(terminations(&drain(&mut user_rx)), 1);
        assert_eq!(terminations(&drain(&mut admin_rx)), 0);
        assert_eq!(hub.call_state(), CallState::Idle);
        assert!(!hub.connection(&admin).unwrap().has_role(Role::CallAdmin));
        assert!(!hub.connection(&user).unwrap().has_role(Role::CallUser));
    }

    #[test]
    fn user_end_notifies_admin_once() {
        let mut hub = hub();
        let ((admin, mut admin_rx), (user, mut user_rx)) = accepted_call(&mut hub);

        hub.end_call_by_user(&user);
        hub.close_connection(&user);
        assert_eq!(
            drain(&mut admin_rx),
            vec![ServerMessage::PrivateCallUserDisconnected {
                user_socket_id: user.clone(),
                reason: CallEndReason::EndedByUser,
            }]
        );
        assert_eq!(terminations(&drain(&mut user_rx)), 0);
        assert!(hub.connection(&admin).is_some());
    }

    #[test]
    fn end_from_non_party_is_ignored() {
        let mut hub = hub();
        let ((_admin, _), (user, _)) = accepted_call(&mut hub);
        let (outsider, _outsider_rx) = connect(&mut hub, None);

        hub.end_call_by_admin(&outsider);
        hub.end_call_by_admin(&user);
        hub.end_call_by_user(&outsider);
        assert_eq!(hub.call_state(), CallState::Accepted);
    }

    #[test]
    fn user_disconnect_notifies_admin() {
        let mut hub = hub();
        let ((_admin, mut admin_rx), (user, _)) = accepted_call(&mut hub);

        hub.close_connection(&user);
        assert_eq!(
            drain(&mut admin_rx),
            vec![ServerMessage::PrivateCallUserDisconnected {
                user_socket_id: user.clone(),
                reason: CallEndReason::PeerDisconnected,
            }]
        );
        assert_eq!(hub.call_state(), CallState::Idle);
    }

    #[test]
    fn call_and_broadcast_never_coexist() {
        let mut hub = hub();
        let (admin, _admin_rx) = connect(&mut hub, Some("admin"));

        hub.invite_private_call(&admin, AUTHORIZED, &config()).unwrap();
        assert_eq!(
            hub.start_broadcast(&admin, request(None, None), &config()),
            Err(SignalError::CallInProgress)
        );

        hub.end_call_by_admin(&admin);
        hub.start_broadcast(&admin, request(None, None), &config())
            .unwrap();
        assert_eq!(
            hub.invite_private_call(&admin, AUTHORIZED, &config()),
            Err(SignalError::AdminBusy)
        );
        assert!(hub.private_call().is_none());
    }

    #[test]
    fn reports_authorized_user_presence() {
        let mut hub = hub();
        let cfg = config();
        assert_eq!(
            hub.authorized_user_status(AUTHORIZED, &cfg),
            ServerMessage::AuthorizedUserStatus {
                target_user_app_id: AUTHORIZED.into(),
                authorized: true,
                online: false,
            }
        );

        let (_user, _user_rx) = connect(&mut hub, Some(AUTHORIZED));
        assert!(matches!(
            hub.authorized_user_status(AUTHORIZED, &cfg),
            ServerMessage::AuthorizedUserStatus { online: true, .. }
        ));
        assert!(matches!(
            hub.authorized_user_status("stranger", &cfg),
            ServerMessage::AuthorizedUserStatus { authorized: false, .. }
        ));
    }
}
