//! エンティティ定義
//!
//! `Session` はブローカーの中心となるエンティティで、1 人の送信者と
//! 0 人以上の受信者をセッションコードのもとに束ねます。
//!
//! ## 状態
//!
//! セッションの状態は `OPEN`（Repository に登録されている）と
//! `CLOSED`（Repository から取り除かれた）の 2 つのみ。
//! 受信者の参加・離脱は状態を変えません。

use super::{
    error::SessionError,
    policy::ReceiverCapacity,
    value_object::{ConnectionId, FileDescriptor, Role, SessionCode, SignalKind, Timestamp},
};

/// 受信者参加の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// 新しく受信者として追加された
    Joined,
    /// すでに受信者として参加済み（重複参加）
    AlreadyJoined,
}

/// シグナリングセッション
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub code: SessionCode,
    /// 送信者（作成後は不変）
    pub sender: ConnectionId,
    /// 受信者（参加順、重複なし、送信者を含まない）
    pub receivers: Vec<ConnectionId>,
    pub file_descriptor: FileDescriptor,
    pub created_at: Timestamp,
    pub receiver_capacity: ReceiverCapacity,
}

impl Session {
    pub fn new(
        code: SessionCode,
        sender: ConnectionId,
        file_descriptor: FileDescriptor,
        created_at: Timestamp,
        receiver_capacity: ReceiverCapacity,
    ) -> Self {
        Self {
            code,
            sender,
            receivers: Vec::new(),
            file_descriptor,
            created_at,
            receiver_capacity,
        }
    }

    /// 接続がこのセッションで持つ役割
    pub fn role_of(&self, connection_id: &ConnectionId) -> Option<Role> {
        if &self.sender == connection_id {
            Some(Role::Sender)
        } else if self.receivers.contains(connection_id) {
            Some(Role::Receiver)
        } else {
            None
        }
    }

    /// 受信者を追加
    ///
    /// 上限に達している場合は、参加済みの受信者であっても拒否する。
    /// 上限内であれば、参加済みの受信者は重複して追加せず `AlreadyJoined` を返す。
    pub fn add_receiver(&mut self, receiver: ConnectionId) -> Result<JoinOutcome, SessionError> {
        if receiver == self.sender {
            return Err(SessionError::SenderCannotJoin);
        }
        if !self.receiver_capacity.allows(self.receivers.len()) {
            return Err(SessionError::CapacityExceeded(self.receivers.len()));
        }
        if self.receivers.contains(&receiver) {
            return Ok(JoinOutcome::AlreadyJoined);
        }
        self.receivers.push(receiver);
        Ok(JoinOutcome::Joined)
    }

    /// 受信者を削除（削除した場合は true）
    pub fn remove_receiver(&mut self, receiver: &ConnectionId) -> bool {
        let before = self.receivers.len();
        self.receivers.retain(|id| id != receiver);
        self.receivers.len() != before
    }

    /// 受信者がおらず、`cutoff` より前に作成されたセッションか
    pub fn is_idle_since(&self, cutoff: Timestamp) -> bool {
        self.receivers.is_empty() && self.created_at < cutoff
    }

    /// シグナリングメッセージの中継先を解決する
    ///
    /// - offer: 送信者のみ送信可能。受信者全員（`to` 指定時はその受信者のみ）へ
    /// - answer: 受信者のみ送信可能。送信者へ
    /// - ICE candidate: 送信者からは受信者へ、受信者からは送信者へ
    pub fn relay_targets(
        &self,
        from: &ConnectionId,
        kind: SignalKind,
        to: Option<&ConnectionId>,
    ) -> Result<Vec<ConnectionId>, SessionError> {
        let role = self
            .role_of(from)
            .ok_or(SessionError::NotPermitted(kind))?;

        match (kind, role) {
            (SignalKind::Offer, Role::Sender) | (SignalKind::IceCandidate, Role::Sender) => {
                let targets: Vec<ConnectionId> = match to {
                    Some(target) => self
                        .receivers
                        .iter()
                        .filter(|id| *id == target)
                        .copied()
                        .collect(),
                    None => self.receivers.clone(),
                };
                if targets.is_empty() {
                    return Err(SessionError::NoRecipients(kind));
                }
                Ok(targets)
            }
            (SignalKind::Answer, Role::Receiver) | (SignalKind::IceCandidate, Role::Receiver) => {
                Ok(vec![self.sender])
            }
            (SignalKind::Offer, Role::Receiver) | (SignalKind::Answer, Role::Sender) => {
                Err(SessionError::NotPermitted(kind))
            }
        }
    }
}

/// ブローカー全体の統計情報（読み取り専用モデル）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BrokerStats {
    pub sessions: usize,
    pub receivers: usize,
    pub connections: usize,
    pub oldest_session_created_at: Option<Timestamp>,
}
