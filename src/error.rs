//! 시그널링 에러 정의

use thiserror::Error;

/// 코디네이터 연산 에러
///
/// 모두 복구 가능한 에러이며, 요청한 연결에 에러 이벤트로 전달된다.
/// `PeerVanished`만 예외로 로그만 남기고 전달하지 않는다.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignalError {
    #[error("another broadcaster is already live")]
    AlreadyBroadcasting,

    #[error("a private call is in progress")]
    CallInProgress,

    #[error("no active broadcast")]
    NoActiveBroadcast,

    #[error("access denied: {reason}")]
    AccessDenied { reason: &'static str },

    /// 중계 요청자가 해당 방향의 역할이 아님
    #[error("relay rejected: {reason}")]
    WrongRole { reason: &'static str },

    #[error("admin is busy with a broadcast")]
    AdminBusy,

    #[error("another private call is active")]
    TargetBusy,

    #[error("invite is no longer valid")]
    StaleInvite,

    #[error("site configuration unavailable")]
    ConfigUnavailable,

    #[error("relay target {0} disconnected")]
    PeerVanished(String),
}

impl SignalError {
    /// 클라이언트에 노출되는 에러 코드
    pub fn code(&self) -> &'static str {
        match self {
            SignalError::AlreadyBroadcasting => "ALREADY_BROADCASTING",
            SignalError::CallInProgress => "CALL_IN_PROGRESS",
            SignalError::NoActiveBroadcast => "NO_ACTIVE_BROADCAST",
            SignalError::AccessDenied { .. } => "ACCESS_DENIED",
            SignalError::WrongRole { .. } => "WRONG_ROLE",
            SignalError::AdminBusy => "ADMIN_BUSY",
            SignalError::TargetBusy => "TARGET_BUSY",
            SignalError::StaleInvite => "STALE_INVITE",
            SignalError::ConfigUnavailable => "CONFIG_UNAVAILABLE",
            SignalError::PeerVanished(_) => "PEER_VANISHED",
        }
    }
}
