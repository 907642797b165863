use std::fmt;

use crate::ObjectId;

/// Which side of a name-level request could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Missing {
    Object(String),
    Source(String),
    Target(String),
    Both { source: String, target: String },
    Handle(ObjectId),
}

impl fmt::Display for Missing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Object(name) => write!(f, "object '{name}' does not exist"),
            Self::Source(name) => write!(f, "source object '{name}' does not exist"),
            Self::Target(name) => write!(f, "target object '{name}' does not exist"),
            Self::Both { source, target } => write!(
                f,
                "both source '{source}' and target '{target}' do not exist"
            ),
            Self::Handle(id) => write!(f, "stale object handle {id:?}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GcError {
    #[error("object '{name}' already exists")]
    DuplicateName { name: String },
    #[error("cannot create self-reference for object '{name}'")]
    SelfReference { name: String },
    #[error("reference from '{from}' to '{to}' already exists")]
    DuplicateEdge { from: String, to: String },
    #[error("{missing}")]
    NotFound { missing: Missing },
    #[error("root set is full ({capacity} entries)")]
    CapacityExceeded { capacity: usize },
    #[error("allocation of {requested} bytes failed ({live} of {limit} bytes in use)")]
    AllocationFailure {
        requested: usize,
        live: usize,
        limit: usize,
    },
    #[error("object arena exhausted after {slots} slots")]
    ArenaExhausted { slots: usize },
    #[error("invalid scenario id {id}, expected 1, 2 or 3")]
    UnknownScenario { id: u8 },
}

impl GcError {
    pub(crate) fn not_found(missing: Missing) -> Self {
        Self::NotFound { missing }
    }

    /// Running out of memory is the only condition the simulator cannot recover from.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::AllocationFailure { .. } | Self::ArenaExhausted { .. }
        )
    }

    /// Rejections that leave the graph exactly as the caller wanted it.
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::DuplicateEdge { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_messages_name_the_unresolved_side() {
        let err = GcError::not_found(Missing::Source("A".into()));
        assert_eq!(err.to_string(), "source object 'A' does not exist");

        let err = GcError::not_found(Missing::Both {
            source: "A".into(),
            target: "B".into(),
        });
        assert_eq!(
            err.to_string(),
            "both source 'A' and target 'B' do not exist"
        );
    }

    #[test]
    fn only_memory_exhaustion_is_fatal() {
        let oom = GcError::AllocationFailure {
            requested: 42,
            live: 100,
            limit: 128,
        };
        assert!(oom.is_fatal());
        assert!(GcError::ArenaExhausted { slots: usize::MAX }.is_fatal());
        assert!(!GcError::CapacityExceeded { capacity: 50 }.is_fatal());
        assert!(!GcError::DuplicateName { name: "A".into() }.is_fatal());
    }

    #[test]
    fn duplicate_edge_is_a_warning() {
        let dup = GcError::DuplicateEdge {
            from: "A".into(),
            to: "B".into(),
        };
        assert!(dup.is_warning());
        assert!(!GcError::SelfReference { name: "A".into() }.is_warning());
    }
}
