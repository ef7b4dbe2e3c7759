//! 접근 제어 (부수효과 없는 판정 함수)

use super::broadcast::BroadcastSession;
use super::call::PrivateCall;
use super::registry::Connection;
use crate::site_config::ConfigSnapshot;

/// 로그인 전용 방송이면 익명 연결은 시청 불가
pub fn can_view_broadcast(connection: &Connection, session: &BroadcastSession) -> bool {
    !(session.logged_in_only() && connection.is_anonymous())
}

/// 설정된 권한 사용자와 ID가 일치해야 개인 통화 수신 가능
pub fn can_receive_private_call(connection: &Connection, config: &ConfigSnapshot) -> bool {
    match (connection.app_user_id.as_deref(), config.authorized_user_id()) {
        (Some(user), Some(authorized)) => user == authorized,
        _ => false,
    }
}

/// 진행 중인 개인 통화가 있으면 방송 시작 불가
///
/// 대기(PendingDelivery) 상태의 초대도 통화로 본다. 그렇지 않으면 방송 중에
/// 대상 사용자가 접속해 통화가 울리게 된다.
pub fn can_start_broadcast(connection: &Connection, active_call: Option<&PrivateCall>) -> bool {
    match active_call {
        None => true,
        Some(call) if call.admin().connection_id != connection.id => false,
        Some(call) => !call.is_engaged(),
    }
}
