//! 클라이언트-서버 메시지 프로토콜 정의
//!
//! `{"type": "<event-name>", "payload": {...}}` 형태. 이벤트 이름은 kebab-case,
//! 필드 이름은 camelCase. SDP/ICE 내용은 해석하지 않고 그대로 전달한다.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 클라이언트 → 서버 메시지
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ClientMessage {
    // Connection
    Heartbeat,

    // General stream (one-to-many)
    RegisterGeneralViewer,
    UnregisterGeneralViewer,
    /// payload가 없거나 null이면 None
    RegisterGeneralBroadcaster(Option<BroadcastOptions>),
    StopGeneralStream,
    GeneralStreamOfferToViewer {
        viewer_id: String,
        offer: Value,
    },
    GeneralStreamAnswerToBroadcaster {
        answer: Value,
    },
    GeneralStreamCandidateToViewer {
        viewer_id: String,
        candidate: Value,
    },
    GeneralStreamCandidateToBroadcaster {
        candidate: Value,
    },

    // Private call (one-to-one)
    AdminInitiatePrivateCallRequest {
        target_user_app_id: String,
    },
    UserAcceptsPrivateCall {
        admin_socket_id: String,
    },
    PrivateSdpOffer {
        target_socket_id: String,
        payload: Value,
    },
    PrivateSdpAnswer {
        target_socket_id: String,
        payload: Value,
    },
    PrivateIceCandidate {
        target_socket_id: String,
        candidate: Value,
    },
    AdminEndPrivateCall,
    UserEndPrivateCall,
    RequestAuthorizedUserStatus {
        target_user_app_id: String,
    },

    // ICE
    RequestIceServers,
}

/// 방송 시작 옵션. 비어 있는 항목은 사이트 설정 기본값을 따른다
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BroadcastOptions {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub logged_in_only: Option<bool>,
}

/// 서버 → 클라이언트 메시지
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ServerMessage {
    // Connection
    Connected { socket_id: String },
    HeartbeatAck,
    Error { code: String, message: String },

    // General stream
    GeneralBroadcasterReady {
        broadcaster_id: String,
        title: String,
        subtitle: String,
        logged_in_only: bool,
    },
    GeneralBroadcasterDisconnected,
    GeneralStreamInfo {
        broadcaster_id: Option<String>,
        title: String,
        subtitle: String,
        logged_in_only: bool,
    },
    NewGeneralViewer {
        viewer_id: String,
    },
    GeneralViewerDisconnected {
        viewer_id: String,
    },
    OfferFromGeneralBroadcaster {
        broadcaster_id: String,
        offer: Value,
    },
    AnswerFromGeneralViewer {
        viewer_id: String,
        answer: Value,
    },
    CandidateFromGeneralBroadcaster {
        broadcaster_id: String,
        candidate: Value,
    },
    CandidateFromGeneralViewer {
        viewer_id: String,
        candidate: Value,
    },
    GeneralStreamError {
        code: String,
        message: String,
    },
    GeneralStreamAccessDenied {
        reason: String,
    },

    // Private call
    PrivateCallInviteFromAdmin {
        admin_socket_id: String,
        admin_app_user_id: Option<String>,
    },
    PrivateCallPending {
        target_user_app_id: String,
    },
    PrivateCallRinging {
        target_user_app_id: String,
        target_socket_id: String,
    },
    PrivateCallUserReadyForOffer {
        user_socket_id: String,
        user_app_user_id: Option<String>,
    },
    PrivateSdpOfferReceived {
        from_socket_id: String,
        payload: Value,
    },
    PrivateSdpAnswerReceived {
        from_socket_id: String,
        payload: Value,
    },
    PrivateIceCandidateReceived {
        from_socket_id: String,
        candidate: Value,
    },
    PrivateCallTerminatedByAdmin {
        reason: CallEndReason,
    },
    PrivateCallUserDisconnected {
        user_socket_id: String,
        reason: CallEndReason,
    },
    PrivateCallError {
        code: String,
        message: String,
    },
    AuthorizedUserStatus {
        target_user_app_id: String,
        authorized: bool,
        online: bool,
    },

    // ICE
    IceServers {
        ice_servers: Vec<IceServer>,
        ttl: u64,
    },
}

/// 개인 통화 종료 사유
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CallEndReason {
    EndedByAdmin,
    EndedByUser,
    PeerDisconnected,
    Superseded,
}

/// ICE 서버 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceServer {
    pub urls: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_type: Option<String>,
}
