//! Conversion logic between DTOs and domain entities.

use peersend_shared::time::timestamp_to_rfc3339;

use crate::domain::{BrokerStats, FileDescriptor};
use crate::infrastructure::dto::{http::StatsDto, websocket::FileDescriptorDto};

// ========================================
// DTO → Domain
// ========================================

impl From<FileDescriptorDto> for FileDescriptor {
    fn from(dto: FileDescriptorDto) -> Self {
        FileDescriptor::new(dto.name, dto.size)
    }
}

// ========================================
// Domain → DTO
// ========================================

impl From<FileDescriptor> for FileDescriptorDto {
    fn from(model: FileDescriptor) -> Self {
        Self {
            name: model.name,
            size: model.size,
        }
    }
}

impl From<BrokerStats> for StatsDto {
    fn from(model: BrokerStats) -> Self {
        Self {
            sessions: model.sessions,
            receivers: model.receivers,
            connections: model.connections,
            oldest_session_created_at: model
                .oldest_session_created_at
                .and_then(|ts| timestamp_to_rfc3339(ts.value())),
        }
    }
}
