//! InMemory Session Repository 実装
//!
//! ドメイン層が定義する SessionRepository trait の具体的な実装。
//! HashMap をインメモリ DB として使用します。
//!
//! ## 構成
//!
//! - `sessions`: コード → セッション
//! - `memberships`: 接続 ID → その接続が属するセッション（送信者 / 受信者）
//!
//! `memberships` は切断時に全セッションを走査しないための索引で、
//! `sessions` と常に同じロックの中で更新されます。

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    CodeGenerator, CollisionPolicy, ConnectionId, ConnectionRemoval, CreatedSession,
    FileDescriptor, JoinOutcome, ReceiverCapacity, RepositoryError, Session, SessionCode,
    SessionRepository, Timestamp,
};

/// `CollisionPolicy::Reroll` での再生成の上限回数
pub const MAX_REROLL_ATTEMPTS: usize = 32;

/// 接続が属するセッション
#[derive(Debug, Default)]
struct Memberships {
    sending: Option<SessionCode>,
    receiving: HashSet<SessionCode>,
}

impl Memberships {
    fn is_empty(&self) -> bool {
        self.sending.is_none() && self.receiving.is_empty()
    }
}

/// セッション表
#[derive(Debug, Default)]
struct SessionTable {
    sessions: HashMap<SessionCode, Session>,
    memberships: HashMap<ConnectionId, Memberships>,
}

impl SessionTable {
    /// セッションを表から外し、索引も合わせて更新する
    fn detach_session(&mut self, code: &SessionCode) -> Option<Session> {
        let session = self.sessions.remove(code)?;

        if let Some(memberships) = self.memberships.get_mut(&session.sender) {
            if memberships.sending.as_ref() == Some(code) {
                memberships.sending = None;
            }
        }
        for receiver in &session.receivers {
            if let Some(memberships) = self.memberships.get_mut(receiver) {
                memberships.receiving.remove(code);
            }
        }

        let mut touched = Vec::with_capacity(session.receivers.len() + 1);
        touched.push(session.sender);
        touched.extend(session.receivers.iter().copied());
        for connection_id in touched {
            self.prune_memberships(&connection_id);
        }

        Some(session)
    }

    fn prune_memberships(&mut self, connection_id: &ConnectionId) {
        if self
            .memberships
            .get(connection_id)
            .is_some_and(Memberships::is_empty)
        {
            self.memberships.remove(connection_id);
        }
    }
}

/// インメモリ Session Repository 実装
pub struct InMemorySessionRepository {
    table: Arc<Mutex<SessionTable>>,
    code_generator: Arc<dyn CodeGenerator>,
    collision_policy: CollisionPolicy,
}

impl InMemorySessionRepository {
    /// 新しい InMemorySessionRepository を作成
    pub fn new(code_generator: Arc<dyn CodeGenerator>, collision_policy: CollisionPolicy) -> Self {
        Self {
            table: Arc::new(Mutex::new(SessionTable::default())),
            code_generator,
            collision_policy,
        }
    }

    /// 衝突ポリシーに従ってコードを払い出す
    ///
    /// 戻り値の bool はコードが稼働中のセッションと衝突したかどうか（Replace のみ true になり得る）。
    fn allocate_code(&self, table: &SessionTable) -> Result<(SessionCode, bool), RepositoryError> {
        match self.collision_policy {
            CollisionPolicy::Replace => {
                let code = self.code_generator.next_code()?;
                let collided = table.sessions.contains_key(&code);
                Ok((code, collided))
            }
            CollisionPolicy::Reroll => {
                for _ in 0..MAX_REROLL_ATTEMPTS {
                    let code = self.code_generator.next_code()?;
                    if !table.sessions.contains_key(&code) {
                        return Ok((code, false));
                    }
                    tracing::debug!("Session code {} is in use, rerolling", code);
                }
                Err(RepositoryError::CodeSpaceExhausted(MAX_REROLL_ATTEMPTS))
            }
        }
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn create_session(
        &self,
        sender: ConnectionId,
        file_descriptor: FileDescriptor,
        receiver_capacity: ReceiverCapacity,
        created_at: Timestamp,
    ) -> Result<CreatedSession, RepositoryError> {
        let mut table = self.table.lock().await;
        let (code, collided) = self.allocate_code(&table)?;

        let mut displaced = Vec::new();
        if collided {
            tracing::warn!("Session code {} collided with a live session, replacing it", code);
            displaced.extend(table.detach_session(&code));
        }
        let previous = table
            .memberships
            .get(&sender)
            .and_then(|memberships| memberships.sending.clone());
        if let Some(previous) = previous {
            displaced.extend(table.detach_session(&previous));
        }
        // 新しい送信者自身は強制切断の対象にしない
        for session in &mut displaced {
            session.receivers.retain(|receiver| *receiver != sender);
        }

        let session = Session::new(
            code.clone(),
            sender,
            file_descriptor,
            created_at,
            receiver_capacity,
        );
        table.sessions.insert(code.clone(), session);
        table.memberships.entry(sender).or_default().sending = Some(code.clone());

        Ok(CreatedSession { code, displaced })
    }

    async fn find_session(&self, code: &SessionCode) -> Option<Session> {
        let table = self.table.lock().await;
        table.sessions.get(code).cloned()
    }

    async fn add_receiver(
        &self,
        code: &SessionCode,
        receiver: ConnectionId,
    ) -> Result<(Session, JoinOutcome), RepositoryError> {
        let mut table = self.table.lock().await;

        let session = table
            .sessions
            .get_mut(code)
            .ok_or_else(|| RepositoryError::SessionNotFound(code.as_str().to_string()))?;
        let outcome = session.add_receiver(receiver)?;
        let snapshot = session.clone();

        if outcome == JoinOutcome::Joined {
            table
                .memberships
                .entry(receiver)
                .or_default()
                .receiving
                .insert(code.clone());
        }

        Ok((snapshot, outcome))
    }

    async fn remove_connection(&self, connection_id: &ConnectionId) -> ConnectionRemoval {
        let mut table = self.table.lock().await;

        let Some(memberships) = table.memberships.remove(connection_id) else {
            return ConnectionRemoval::default();
        };

        let closed_session = match memberships.sending {
            Some(code) => table.detach_session(&code),
            None => None,
        };

        let mut left_sessions: Vec<SessionCode> = memberships
            .receiving
            .into_iter()
            .filter(|code| {
                table
                    .sessions
                    .get_mut(code)
                    .is_some_and(|session| session.remove_receiver(connection_id))
            })
            .collect();
        left_sessions.sort();

        ConnectionRemoval {
            closed_session,
            left_sessions,
        }
    }

    async fn remove_idle_sessions(&self, created_before: Timestamp) -> Vec<Session> {
        let mut table = self.table.lock().await;

        let idle_codes: Vec<SessionCode> = table
            .sessions
            .values()
            .filter(|session| session.is_idle_since(created_before))
            .map(|session| session.code.clone())
            .collect();

        idle_codes
            .iter()
            .filter_map(|code| table.detach_session(code))
            .collect()
    }

    async fn get_sessions(&self) -> Vec<Session> {
        let table = self.table.lock().await;
        let mut sessions: Vec<Session> = table.sessions.values().cloned().collect();
        sessions.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.code.cmp(&b.code))
        });
        sessions
    }
}
