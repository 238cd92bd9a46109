use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side of the partnership an organism is on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrgKind {
    Host,
    Symbiont,
}

impl OrgKind {
    pub fn is_host(self) -> bool {
        self == OrgKind::Host
    }
}

impl fmt::Display for OrgKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrgKind::Host => f.write_str("host"),
            OrgKind::Symbiont => f.write_str("symbiont"),
        }
    }
}

/// Where an organism lives: a population slot, plus its index in the host's
/// symbiont list when it is a symbiont.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorldPosition {
    pub slot: usize,
    pub symbiont: Option<usize>,
}

impl WorldPosition {
    pub fn host(slot: usize) -> Self {
        Self {
            slot,
            symbiont: None,
        }
    }

    pub fn symbiont(slot: usize, index: usize) -> Self {
        Self {
            slot,
            symbiont: Some(index),
        }
    }
}
