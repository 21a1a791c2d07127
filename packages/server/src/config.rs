//! Broker configuration.

use std::{path::PathBuf, time::Duration};

use crate::domain::{CollisionPolicy, ReceiverCapacity};

/// Runtime policy of the broker, resolved from command line flags
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrokerConfig {
    /// Receivers allowed per session
    pub receiver_capacity: ReceiverCapacity,
    /// What happens when a generated code is already live
    pub collision_policy: CollisionPolicy,
    /// Sessions nobody joined are closed after this long (`None` = never)
    pub idle_session_ttl: Option<Duration>,
    /// Directory served for paths outside `/ws` and `/api`
    pub static_dir: Option<PathBuf>,
}
