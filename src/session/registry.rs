//! 연결 레지스트리
//!
//! 살아 있는 연결, 애플리케이션 사용자 ID, 역할 태그를 기록한다.
//! 외부 이벤트는 직접 만들지 않고, 다른 매니저가 송신 경로로 사용한다.

use crate::protocol::ServerMessage;
use std::collections::{BTreeSet, HashMap};
use tokio::sync::mpsc::UnboundedSender;

pub type ConnectionId = String;

/// 연결에 붙는 역할 태그
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    Broadcaster,
    Viewer,
    CallAdmin,
    CallUser,
}

/// 연결 정보
#[derive(Debug)]
pub struct Connection {
    pub id: ConnectionId,
    pub app_user_id: Option<String>,
    roles: BTreeSet<Role>,
    sender: UnboundedSender<ServerMessage>,
    seq: u64,
}

impl Connection {
    #[cfg(test)]
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn roles(&self) -> impl Iterator<Item = Role> + '_ {
        self.roles.iter().copied()
    }

    pub fn is_anonymous(&self) -> bool {
        self.app_user_id.is_none()
    }

    /// 보내기만 하고 결과는 기다리지 않는다
    pub fn send(&self, message: ServerMessage) -> bool {
        self.sender.send(message).is_ok()
    }
}

#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: HashMap<ConnectionId, Connection>,
    next_seq: u64,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        id: ConnectionId,
        app_user_id: Option<String>,
        sender: UnboundedSender<ServerMessage>,
    ) {
        self.next_seq += 1;
        let connection = Connection {
            id: id.clone(),
            app_user_id,
            roles: BTreeSet::new(),
            sender,
            seq: self.next_seq,
        };
        self.connections.insert(id, connection);
    }

    pub fn get(&self, id: &str) -> Option<&Connection> {
        self.connections.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.connections.contains_key(id)
    }

    pub fn tag_role(&mut self, id: &str, role: Role) -> bool {
        match self.connections.get_mut(id) {
            Some(connection) => connection.roles.insert(role),
            None => false,
        }
    }

    pub fn untag_role(&mut self, id: &str, role: Role) -> bool {
        match self.connections.get_mut(id) {
            Some(connection) => connection.roles.remove(&role),
            None => false,
        }
    }

    /// 같은 사용자의 연결이 여러 개면 가장 최근 연결을 돌려준다
    pub fn find_by_app_user_id(&self, app_user_id: &str) -> Option<&Connection> {
        self.connections
            .values()
            .filter(|c| c.app_user_id.as_deref() == Some(app_user_id))
            .max_by_key(|c| c.seq)
    }

    pub fn remove(&mut self, id: &str) -> Option<Connection> {
        self.connections.remove(id)
    }

    /// 특정 연결에 전송. 대상이 없거나 닫혔으면 false
    pub fn send_to(&self, id: &str, message: ServerMessage) -> bool {
        match self.connections.get(id) {
            Some(connection) => connection.send(message),
            None => false,
        }
    }

    /// 등록된 모든 연결에 전송
    pub fn broadcast(&self, message: &ServerMessage) {
        for connection in self.connections.values() {
            connection.send(message.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }
}
