//! Race-detector snapshot, as consumed by the race-discovery campaign.
//!
//! Only the parts the campaign engine reads are modeled: the static races
//! found so far and the set of racy instructions. Their counts are the
//! coverage signal used to detect a plateau.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::iroot::EventKind;
use super::static_info::{InstId, StaticInfo};
use crate::domain::errors::{DomainError, DomainResult};

/// One side of a static race.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticRaceEvent {
    /// Event id, local to the race database.
    pub id: u32,
    /// Racing instruction.
    pub inst_id: InstId,
    /// Access kind.
    pub kind: EventKind,
}

/// A pair (or more) of static accesses found racing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticRace {
    /// Race id.
    pub id: u32,
    /// Racing events.
    pub event_ids: Vec<u32>,
}

/// Persisted shape of the race database.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceDbSnapshot {
    /// Events referenced by the races.
    #[serde(default)]
    pub static_events: Vec<StaticRaceEvent>,
    /// Races found so far.
    #[serde(default)]
    pub static_races: Vec<StaticRace>,
    /// Instructions involved in any race.
    #[serde(default)]
    pub racy_insts: Vec<InstId>,
}

/// Static races and racy instructions found by the race detector.
#[derive(Debug, Clone, Default)]
pub struct RaceDb {
    static_events: BTreeMap<u32, StaticRaceEvent>,
    static_races: BTreeMap<u32, StaticRace>,
    racy_insts: BTreeSet<InstId>,
}

impl RaceDb {
    /// Build from a snapshot; every racy instruction must be registered.
    pub fn from_snapshot(snapshot: RaceDbSnapshot, sinfo: &StaticInfo) -> DomainResult<Self> {
        for inst_id in &snapshot.racy_insts {
            if !sinfo.contains_inst(*inst_id) {
                return Err(DomainError::UnknownInst(*inst_id));
            }
        }

        Ok(Self {
            static_events: snapshot
                .static_events
                .into_iter()
                .map(|e| (e.id, e))
                .collect(),
            static_races: snapshot
                .static_races
                .into_iter()
                .map(|r| (r.id, r))
                .collect(),
            racy_insts: snapshot.racy_insts.into_iter().collect(),
        })
    }

    /// Races found so far.
    pub fn num_static_races(&self) -> usize {
        self.static_races.len()
    }

    /// Distinct racy instructions.
    pub fn num_racy_insts(&self) -> usize {
        self.racy_insts.len()
    }

    /// Look up a race event by id.
    pub fn static_event(&self, id: u32) -> Option<&StaticRaceEvent> {
        self.static_events.get(&id)
    }

    /// Racy instructions in id order.
    pub fn racy_insts(&self) -> impl Iterator<Item = &InstId> {
        self.racy_insts.iter()
    }
}
