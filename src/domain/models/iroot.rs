//! Interleaving catalog: iRoot events and iRoots.
//!
//! An iRoot is an ordered tuple of typed events that, if scheduled in that
//! order, is hypothesized to trigger a concurrency bug. Its shape (idiom)
//! fixes the number of events.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::static_info::{InstId, StaticInfo};
use crate::domain::errors::{DomainError, DomainResult};

/// Identifier of an iRoot event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub u32);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of an iRoot. This is the key for every memo set and map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IRootId(pub u32);

impl fmt::Display for IRootId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Structural pattern class of an iRoot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Idiom {
    /// Two conflicting accesses in a specific order.
    Idiom1,
    /// Three accesses to one location with a remote access in between.
    Idiom2,
    /// Two conflicting pairs on two locations, interleaved.
    Idiom3,
    /// Two pairs on two locations, one nested in the other.
    Idiom4,
    /// Two pairs on two locations, crossing between threads.
    Idiom5,
}

impl Idiom {
    /// Every idiom, in order.
    pub const ALL: [Idiom; 5] = [
        Idiom::Idiom1,
        Idiom::Idiom2,
        Idiom::Idiom3,
        Idiom::Idiom4,
        Idiom::Idiom5,
    ];

    /// Number of events an iRoot of this shape carries.
    pub const fn num_events(self) -> usize {
        match self {
            Idiom::Idiom1 => 2,
            Idiom::Idiom2 => 3,
            Idiom::Idiom3 | Idiom::Idiom4 | Idiom::Idiom5 => 4,
        }
    }

    /// Zero-based position in [`Idiom::ALL`].
    pub const fn index(self) -> usize {
        match self {
            Idiom::Idiom1 => 0,
            Idiom::Idiom2 => 1,
            Idiom::Idiom3 => 2,
            Idiom::Idiom4 => 3,
            Idiom::Idiom5 => 4,
        }
    }
}

impl fmt::Display for Idiom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&format!("IDIOM_{}", self.index() + 1))
    }
}

impl FromStr for Idiom {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .trim()
            .to_lowercase()
            .trim_start_matches("idiom")
            .trim_start_matches('_')
            .to_string();
        match digits.as_str() {
            "1" => Ok(Idiom::Idiom1),
            "2" => Ok(Idiom::Idiom2),
            "3" => Ok(Idiom::Idiom3),
            "4" => Ok(Idiom::Idiom4),
            "5" => Ok(Idiom::Idiom5),
            _ => Err(format!("Invalid idiom: {s}. Must be one of 1-5")),
        }
    }
}

/// Kind of access an iRoot event represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Memory load.
    MemRead,
    /// Memory store.
    MemWrite,
    /// Mutex acquire.
    MutexLock,
    /// Mutex release.
    MutexUnlock,
}

impl EventKind {
    /// A memory access.
    pub const fn is_mem(self) -> bool {
        matches!(self, EventKind::MemRead | EventKind::MemWrite)
    }

    /// A synchronization operation.
    pub const fn is_sync(self) -> bool {
        matches!(self, EventKind::MutexLock | EventKind::MutexUnlock)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::MemRead => "READ",
            EventKind::MemWrite => "WRITE",
            EventKind::MutexLock => "LOCK",
            EventKind::MutexUnlock => "UNLOCK",
        };
        f.pad(name)
    }
}

/// A typed access at a code location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IRootEvent {
    /// Event id.
    pub id: EventId,
    /// Instruction performing the access.
    pub inst_id: InstId,
    /// What kind of access it is.
    pub kind: EventKind,
}

/// An interleaving candidate.
///
/// Equality and hashing use the id only: two iRoots may reference the same
/// event sequence and still be distinct candidates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IRoot {
    /// iRoot id.
    pub id: IRootId,
    /// Structural class.
    pub idiom: Idiom,
    /// Events in interleaving order; the count is fixed by the idiom.
    pub event_ids: Vec<EventId>,
}

impl PartialEq for IRoot {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for IRoot {}

impl Hash for IRoot {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Persisted shape of the iRoot catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IRootDbSnapshot {
    /// Every event referenced by an iRoot.
    #[serde(default)]
    pub events: Vec<IRootEvent>,
    /// The catalogued iRoots.
    #[serde(default)]
    pub iroots: Vec<IRoot>,
}

/// Id-indexed catalog of iRoot events and iRoots.
#[derive(Debug, Clone, Default)]
pub struct IRootDb {
    events: BTreeMap<EventId, IRootEvent>,
    iroots: BTreeMap<IRootId, IRoot>,
}

impl IRootDb {
    /// Empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the catalog from a snapshot.
    ///
    /// Every event must point at an instruction in `sinfo`, and every iRoot
    /// must reference known events in the number its idiom requires.
    pub fn from_snapshot(snapshot: IRootDbSnapshot, sinfo: &StaticInfo) -> DomainResult<Self> {
        let mut events = BTreeMap::new();
        for event in snapshot.events {
            if !sinfo.contains_inst(event.inst_id) {
                return Err(DomainError::UnknownInst(event.inst_id));
            }
            events.insert(event.id, event);
        }

        let mut iroots = BTreeMap::new();
        for iroot in snapshot.iroots {
            let expected = iroot.idiom.num_events();
            if iroot.event_ids.len() != expected {
                return Err(DomainError::ArityMismatch {
                    id: iroot.id,
                    idiom: iroot.idiom,
                    expected,
                    actual: iroot.event_ids.len(),
                });
            }
            if let Some(missing) = iroot.event_ids.iter().find(|e| !events.contains_key(*e)) {
                return Err(DomainError::UnknownEvent(*missing));
            }
            iroots.insert(iroot.id, iroot);
        }

        Ok(Self { events, iroots })
    }

    /// Persisted form, in id order.
    pub fn to_snapshot(&self) -> IRootDbSnapshot {
        IRootDbSnapshot {
            events: self.events.values().cloned().collect(),
            iroots: self.iroots.values().cloned().collect(),
        }
    }

    /// Look up an event by id.
    pub fn find_event(&self, id: EventId) -> DomainResult<&IRootEvent> {
        self.events.get(&id).ok_or(DomainError::UnknownEvent(id))
    }

    /// Look up an iRoot by id.
    pub fn find_iroot(&self, id: IRootId) -> DomainResult<&IRoot> {
        self.iroots.get(&id).ok_or(DomainError::UnknownIRoot(id))
    }

    /// Whether the catalog knows `id`.
    pub fn contains(&self, id: IRootId) -> bool {
        self.iroots.contains_key(&id)
    }

    /// Shape of a catalogued iRoot, if known.
    pub fn idiom_of(&self, id: IRootId) -> Option<Idiom> {
        self.iroots.get(&id).map(|iroot| iroot.idiom)
    }

    /// iRoots in id order.
    pub fn iroots(&self) -> impl Iterator<Item = &IRoot> {
        self.iroots.values()
    }

    /// Number of iRoots.
    pub fn len(&self) -> usize {
        self.iroots.len()
    }

    /// No iRoot catalogued.
    pub fn is_empty(&self) -> bool {
        self.iroots.is_empty()
    }

    /// Multi-line rendering of an iRoot and its events.
    pub fn describe_iroot(&self, id: IRootId, sinfo: &StaticInfo) -> DomainResult<String> {
        let iroot = self.find_iroot(id)?;
        let mut out = format!("{:<5} {:<7}\n", iroot.id.0, iroot.idiom);
        for (idx, event_id) in iroot.event_ids.iter().enumerate() {
            let event = self.find_event(*event_id)?;
            let inst = sinfo.describe_inst(event.inst_id)?;
            out.push_str(&format!("\te{idx}: {:<7} [{inst:<40}]\n", event.kind));
        }
        Ok(out)
    }
}
