//! ドメイン層
//!
//! セッション・コード・接続といったブローカーの中核概念と、
//! それらを扱うためのインターフェース（Repository, MessagePusher）を定義します。

pub mod entity;
pub mod error;
pub mod factory;
pub mod message_pusher;
pub mod policy;
pub mod repository;
pub mod value_object;

pub use entity::{BrokerStats, JoinOutcome, Session};
pub use error::{MessagePushError, RepositoryError, SessionError, ValueObjectError};
pub use factory::{CodeGenerator, RandomCodeGenerator, SessionCodeFactory};
pub use message_pusher::{MessagePusher, PusherChannel};
pub use policy::{CollisionPolicy, ReceiverCapacity};
pub use repository::{ConnectionRemoval, CreatedSession, SessionRepository};
pub use value_object::{
    ConnectionId, FileDescriptor, Role, SessionCode, SignalKind, Timestamp,
};

#[cfg(test)]
pub use message_pusher::MockMessagePusher;
