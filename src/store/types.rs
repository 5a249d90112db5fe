use serde::{Deserialize, Serialize};

/// Kind of record in the store. Used both for not-found reporting and for
/// cache-invalidation signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Job,
    Manifest,
    Driver,
    Vehicle,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Job => write!(f, "job"),
            EntityKind::Manifest => write!(f, "manifest"),
            EntityKind::Driver => write!(f, "driver"),
            EntityKind::Vehicle => write!(f, "vehicle"),
        }
    }
}

/// One entity changed by an engine operation. The list of these is handed
/// to the cache-invalidation collaborator after every mutating call; the
/// engine does not interpret it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedEntity {
    pub kind: EntityKind,
    pub id: String,
}

impl ChangedEntity {
    pub fn job(id: &str) -> Self {
        Self {
            kind: EntityKind::Job,
            id: id.to_string(),
        }
    }

    pub fn manifest(id: &str) -> Self {
        Self {
            kind: EntityKind::Manifest,
            id: id.to_string(),
        }
    }
}

impl std::fmt::Display for ChangedEntity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}
