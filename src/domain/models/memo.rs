//! Memo: the evidence database accumulated across campaign runs.
//!
//! For every iRoot the engine has observed or tested the memo keeps an
//! [`IRootInfo`] with its run counter, and classifies it into any of
//! four sets (exposed, failed, predicted, shadow-exposed). The candidate
//! map is the work queue of iRoots still being targeted, each with a local
//! retry counter.
//!
//! Invariants maintained by every operation:
//! - every id in a set or in the candidate map has an `IRootInfo` entry;
//! - `exposed` and `failed` are disjoint.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::iroot::{IRootDb, IRootId, Idiom};
use crate::domain::errors::{DomainError, DomainResult};

/// Targeted attempts after which a candidate leaves the work queue.
pub const CANDIDATE_RETRY_LIMIT: u32 = 2;

/// Total attempts (across campaigns) after which a candidate is given up.
pub const TOTAL_FAILURE_LIMIT: u32 = 6;

/// Runtime information about one iRoot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IRootInfo {
    /// The iRoot this entry describes.
    pub iroot_id: IRootId,
    /// Targeted attempts across every campaign so far.
    pub total_test_runs: u32,
    /// Whether the iRoot was seen with asynchronous events; `None` until
    /// the engine reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_async: Option<bool>,
}

impl IRootInfo {
    /// Fresh entry with no runs and an unknown async flag.
    pub fn new(iroot_id: IRootId) -> Self {
        Self {
            iroot_id,
            total_test_runs: 0,
            is_async: None,
        }
    }

    /// Fold another observation of the same iRoot into this one.
    fn absorb(&mut self, other: &IRootInfo) {
        self.total_test_runs = self.total_test_runs.max(other.total_test_runs);
        self.is_async = match (self.is_async, other.is_async) {
            (None, None) => None,
            (a, b) => Some(a.unwrap_or(false) || b.unwrap_or(false)),
        };
    }
}

/// Work-queue entry in a persisted memo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRecord {
    /// Queued iRoot.
    pub iroot_id: IRootId,
    /// Targeted attempts while queued.
    pub test_runs: u32,
}

/// Persisted shape of a memo. Ids are written in ascending order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoSnapshot {
    /// Runtime info of every known iRoot.
    #[serde(default)]
    pub iroot_info: Vec<IRootInfo>,
    /// Confirmed iRoots.
    #[serde(default)]
    pub exposed: Vec<IRootId>,
    /// Given-up iRoots.
    #[serde(default)]
    pub failed: Vec<IRootId>,
    /// Predicted iRoots.
    #[serde(default)]
    pub predicted: Vec<IRootId>,
    /// iRoots confirmed outside targeted runs.
    #[serde(default)]
    pub shadow_exposed: Vec<IRootId>,
    /// The work queue.
    #[serde(default)]
    pub candidates: Vec<CandidateRecord>,
}

/// The evidence database.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Memo {
    iroot_info: BTreeMap<IRootId, IRootInfo>,
    exposed: BTreeSet<IRootId>,
    failed: BTreeSet<IRootId>,
    predicted: BTreeSet<IRootId>,
    shadow_exposed: BTreeSet<IRootId>,
    candidates: BTreeMap<IRootId, u32>,
}

impl Memo {
    /// Create an empty memo.
    pub fn new() -> Self {
        Self::default()
    }

    /// Hydrate a memo from its snapshot.
    ///
    /// Every runtime-info entry must name an iRoot in `catalog`, and every
    /// set or candidate entry must name an iRoot with runtime info. The
    /// first dangling reference aborts the load.
    pub fn from_snapshot(snapshot: MemoSnapshot, catalog: &IRootDb) -> DomainResult<Self> {
        let mut memo = Self::new();

        for info in snapshot.iroot_info {
            if !catalog.contains(info.iroot_id) {
                return Err(DomainError::UnknownIRoot(info.iroot_id));
            }
            memo.iroot_info.insert(info.iroot_id, info);
        }

        memo.exposed = memo.resolve_set("exposed", snapshot.exposed)?;
        memo.failed = memo.resolve_set("failed", snapshot.failed)?;
        memo.predicted = memo.resolve_set("predicted", snapshot.predicted)?;
        memo.shadow_exposed = memo.resolve_set("shadow_exposed", snapshot.shadow_exposed)?;

        for record in snapshot.candidates {
            memo.require_info("candidates", record.iroot_id)?;
            memo.candidates.insert(record.iroot_id, record.test_runs);
        }

        // Older snapshots may list an iRoot as both exposed and failed.
        let exposed = memo.exposed.clone();
        memo.failed.retain(|id| !exposed.contains(id));

        Ok(memo)
    }

    /// Inverse of [`Memo::from_snapshot`].
    pub fn to_snapshot(&self) -> MemoSnapshot {
        MemoSnapshot {
            iroot_info: self.iroot_info.values().cloned().collect(),
            exposed: self.exposed.iter().copied().collect(),
            failed: self.failed.iter().copied().collect(),
            predicted: self.predicted.iter().copied().collect(),
            shadow_exposed: self.shadow_exposed.iter().copied().collect(),
            candidates: self
                .candidates
                .iter()
                .map(|(&iroot_id, &test_runs)| CandidateRecord {
                    iroot_id,
                    test_runs,
                })
                .collect(),
        }
    }

    fn require_info(&self, set: &'static str, id: IRootId) -> DomainResult<()> {
        if self.iroot_info.contains_key(&id) {
            Ok(())
        } else {
            Err(DomainError::IntegrityViolation { set, id })
        }
    }

    fn resolve_set(&self, set: &'static str, ids: Vec<IRootId>) -> DomainResult<BTreeSet<IRootId>> {
        ids.into_iter()
            .map(|id| self.require_info(set, id).map(|()| id))
            .collect()
    }

    // -----------------------------------------------------------------------
    // Engine-side mutators
    // -----------------------------------------------------------------------

    /// Register an iRoot as observed, creating its runtime info if needed.
    pub fn observe(&mut self, id: IRootId) -> &mut IRootInfo {
        self.iroot_info
            .entry(id)
            .or_insert_with(|| IRootInfo::new(id))
    }

    /// Record whether the iRoot involves asynchronous events.
    pub fn set_async(&mut self, id: IRootId, is_async: bool) {
        self.observe(id).is_async = Some(is_async);
    }

    /// The profiler predicted the iRoot could happen.
    pub fn predict(&mut self, id: IRootId) {
        self.observe(id);
        self.predicted.insert(id);
    }

    /// The iRoot was seen to happen outside a targeted run.
    pub fn mark_shadow_exposed(&mut self, id: IRootId) {
        self.observe(id);
        self.shadow_exposed.insert(id);
    }

    /// Queue an iRoot for targeting. An existing retry counter is kept.
    pub fn add_candidate(&mut self, id: IRootId) {
        self.observe(id);
        self.candidates.entry(id).or_insert(0);
    }

    /// A targeted run exposed the iRoot.
    pub fn record_success(&mut self, id: IRootId) {
        self.observe(id).total_test_runs += 1;
        *self.candidates.entry(id).or_insert(0) += 1;
        self.failed.remove(&id);
        self.exposed.insert(id);
    }

    /// A targeted run failed to expose the iRoot.
    ///
    /// Once the iRoot's total run count reaches [`TOTAL_FAILURE_LIMIT`] it is
    /// given up, unless it has already been exposed.
    pub fn record_failure(&mut self, id: IRootId) {
        let info = self.observe(id);
        info.total_test_runs += 1;
        let total = info.total_test_runs;
        *self.candidates.entry(id).or_insert(0) += 1;
        if total >= TOTAL_FAILURE_LIMIT && !self.exposed.contains(&id) {
            self.failed.insert(id);
        }
    }

    // -----------------------------------------------------------------------
    // Refinement, closing and merge
    // -----------------------------------------------------------------------

    /// Shrink the work queue: drop candidates that hit the retry limit,
    /// candidates already exposed, and (if `respect_failed`) candidates
    /// already given up. Returns the number of removed candidates.
    pub fn refine(&mut self, respect_failed: bool) -> usize {
        let before = self.candidates.len();
        let exposed = &self.exposed;
        let failed = &self.failed;
        self.candidates.retain(|id, test_runs| {
            *test_runs < CANDIDATE_RETRY_LIMIT
                && !exposed.contains(id)
                && !(respect_failed && failed.contains(id))
        });
        before - self.candidates.len()
    }

    /// Give up on every iRoot that was never exposed.
    pub fn close_unexposed(&mut self) {
        for id in self.iroot_info.keys() {
            if !self.exposed.contains(id) {
                self.failed.insert(*id);
            }
        }
    }

    /// Fold another memo over the same catalog into this one.
    ///
    /// Run counters take the maximum, the async flag is sticky, sets are
    /// unioned and the candidate map keeps the maximum retry count per
    /// iRoot. Exposure wins over giving up. The operation is commutative,
    /// associative and idempotent.
    pub fn merge(&mut self, other: &Memo) {
        for (id, other_info) in &other.iroot_info {
            self.iroot_info
                .entry(*id)
                .and_modify(|info| info.absorb(other_info))
                .or_insert_with(|| other_info.clone());
        }

        self.exposed.extend(other.exposed.iter().copied());
        self.failed.extend(other.failed.iter().copied());
        self.predicted.extend(other.predicted.iter().copied());
        self.shadow_exposed.extend(other.shadow_exposed.iter().copied());

        let exposed = &self.exposed;
        self.failed.retain(|id| !exposed.contains(id));

        for (id, &test_runs) in &other.candidates {
            self.candidates
                .entry(*id)
                .and_modify(|runs| *runs = (*runs).max(test_runs))
                .or_insert(test_runs);
        }
    }

    /// Forget predictions and the work queue, e.g. after the program input
    /// changed and earlier predictions no longer apply.
    pub fn clear_predicted(&mut self) {
        self.predicted.clear();
    }

    /// Empty the work queue.
    pub fn clear_candidates(&mut self) {
        self.candidates.clear();
    }

    /// Randomly trim the queued candidates of `idiom` down to `num`.
    ///
    /// Candidates of other idioms are untouched, and nothing is removed
    /// when `num` is at least the number queued for `idiom`. Returns the
    /// number of removed candidates.
    pub fn sample_candidates<R: Rng + ?Sized>(
        &mut self,
        catalog: &IRootDb,
        idiom: Idiom,
        num: usize,
        rng: &mut R,
    ) -> usize {
        let mut queued: Vec<IRootId> = self.candidates_for(catalog, idiom).into_keys().collect();
        if num >= queued.len() {
            return 0;
        }
        queued.shuffle(rng);
        let removed = queued.len() - num;
        for id in &queued[..removed] {
            self.candidates.remove(id);
        }
        removed
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Runtime info of `id`, if it was ever observed.
    pub fn info(&self, id: IRootId) -> Option<&IRootInfo> {
        self.iroot_info.get(&id)
    }

    /// Retry counter of a queued candidate.
    pub fn candidate_runs(&self, id: IRootId) -> Option<u32> {
        self.candidates.get(&id).copied()
    }

    /// Confirmed by a targeted run.
    pub fn is_exposed(&self, id: IRootId) -> bool {
        self.exposed.contains(&id)
    }

    /// Given up on.
    pub fn is_failed(&self, id: IRootId) -> bool {
        self.failed.contains(&id)
    }

    /// Predicted by the profiler.
    pub fn is_predicted(&self, id: IRootId) -> bool {
        self.predicted.contains(&id)
    }

    /// All confirmed iRoots.
    pub fn exposed(&self) -> &BTreeSet<IRootId> {
        &self.exposed
    }

    /// All iRoots given up on.
    pub fn failed(&self) -> &BTreeSet<IRootId> {
        &self.failed
    }

    /// All predicted iRoots.
    pub fn predicted(&self) -> &BTreeSet<IRootId> {
        &self.predicted
    }

    /// iRoots confirmed outside targeted runs.
    pub fn shadow_exposed(&self) -> &BTreeSet<IRootId> {
        &self.shadow_exposed
    }

    /// The work queue with each candidate's retry counter.
    pub fn candidates(&self) -> &BTreeMap<IRootId, u32> {
        &self.candidates
    }

    /// Number of iRoots with runtime info.
    pub fn size(&self) -> usize {
        self.iroot_info.len()
    }

    /// Number of predicted iRoots; the profile campaign's stability signal.
    pub fn predicted_size(&self) -> usize {
        self.predicted.len()
    }

    /// Number of queued candidates.
    pub fn candidate_size(&self) -> usize {
        self.candidates.len()
    }

    /// Whether anything is left to target, for one shape or for all.
    pub fn has_candidate(&self, catalog: &IRootDb, idiom: Option<Idiom>) -> bool {
        match idiom {
            None => !self.candidates.is_empty(),
            Some(idiom) => self
                .candidates
                .keys()
                .any(|id| catalog.idiom_of(*id) == Some(idiom)),
        }
    }

    /// Confirmed iRoots of one idiom.
    pub fn exposed_for(&self, catalog: &IRootDb, idiom: Idiom) -> BTreeSet<IRootId> {
        filter_by_idiom(&self.exposed, catalog, idiom)
    }

    /// Given-up iRoots of one idiom.
    pub fn failed_for(&self, catalog: &IRootDb, idiom: Idiom) -> BTreeSet<IRootId> {
        filter_by_idiom(&self.failed, catalog, idiom)
    }

    /// Predicted iRoots of one idiom.
    pub fn predicted_for(&self, catalog: &IRootDb, idiom: Idiom) -> BTreeSet<IRootId> {
        filter_by_idiom(&self.predicted, catalog, idiom)
    }

    /// Shadow-exposed iRoots of one idiom.
    pub fn shadow_exposed_for(&self, catalog: &IRootDb, idiom: Idiom) -> BTreeSet<IRootId> {
        filter_by_idiom(&self.shadow_exposed, catalog, idiom)
    }

    /// Queued candidates of one idiom with their retry counters.
    pub fn candidates_for(&self, catalog: &IRootDb, idiom: Idiom) -> BTreeMap<IRootId, u32> {
        self.candidates
            .iter()
            .filter(|(id, _)| catalog.idiom_of(**id) == Some(idiom))
            .map(|(id, runs)| (*id, *runs))
            .collect()
    }

    /// iRoots seen to happen, directly or through the shadow detector.
    pub fn observed_for(&self, catalog: &IRootDb, idiom: Idiom) -> BTreeSet<IRootId> {
        self.exposed
            .union(&self.shadow_exposed)
            .filter(|id| catalog.idiom_of(**id) == Some(idiom))
            .copied()
            .collect()
    }

    /// Observed-iRoot counts indexed by [`Idiom::index`].
    pub fn observed_counts(&self, catalog: &IRootDb) -> [usize; 5] {
        Idiom::ALL.map(|idiom| self.observed_for(catalog, idiom).len())
    }

    /// Class counts for reporting.
    pub fn summary(&self, catalog: &IRootDb) -> MemoSummary {
        let count = |set: &BTreeSet<IRootId>| ClassCounts::from_ids(set.iter(), catalog);
        MemoSummary {
            exposed: count(&self.exposed),
            failed: count(&self.failed),
            predicted: count(&self.predicted),
            shadow_exposed: count(&self.shadow_exposed),
            candidates: ClassCounts::from_ids(self.candidates.keys(), catalog),
            total_iroot_info: self.iroot_info.len(),
        }
    }
}

fn filter_by_idiom(set: &BTreeSet<IRootId>, catalog: &IRootDb, idiom: Idiom) -> BTreeSet<IRootId> {
    set.iter()
        .filter(|id| catalog.idiom_of(**id) == Some(idiom))
        .copied()
        .collect()
}

/// Total and per-shape size of one memo class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassCounts {
    /// Members across all idioms.
    pub total: usize,
    /// Members per idiom, indexed by [`Idiom::index`].
    pub per_idiom: [usize; 5],
}

impl ClassCounts {
    fn from_ids<'a>(ids: impl Iterator<Item = &'a IRootId>, catalog: &IRootDb) -> Self {
        let mut counts = Self::default();
        for id in ids {
            counts.total += 1;
            if let Some(idiom) = catalog.idiom_of(*id) {
                counts.per_idiom[idiom.index()] += 1;
            }
        }
        counts
    }
}

/// Aggregate counts for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoSummary {
    /// Confirmed iRoots.
    pub exposed: ClassCounts,
    /// Given-up iRoots.
    pub failed: ClassCounts,
    /// Predicted iRoots.
    pub predicted: ClassCounts,
    /// iRoots confirmed outside targeted runs.
    pub shadow_exposed: ClassCounts,
    /// Queued candidates.
    pub candidates: ClassCounts,
    /// iRoots with runtime info.
    pub total_iroot_info: usize,
}

impl MemoSummary {
    /// Label and counts for each class, in report order.
    pub fn classes(&self) -> [(&'static str, ClassCounts); 5] {
        [
            ("exposed", self.exposed),
            ("failed", self.failed),
            ("predicted", self.predicted),
            ("shadow exposed", self.shadow_exposed),
            ("candidates", self.candidates),
        ]
    }
}

impl fmt::Display for MemoSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Memoization Summary")?;
        writeln!(f, "---------------------------")?;
        for (label, counts) in self.classes() {
            writeln!(f, "# total {label:<15} = {}", counts.total)?;
            for idiom in Idiom::ALL {
                writeln!(f, "  # {idiom:<18} = {}", counts.per_idiom[idiom.index()])?;
            }
        }
        writeln!(f, "# total iroot_info      = {}", self.total_iroot_info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::iroot::{EventId, EventKind, IRoot, IRootDbSnapshot, IRootEvent};
    use crate::domain::models::static_info::{
        Image, ImageId, Inst, InstId, StaticInfo, StaticInfoSnapshot,
    };

    fn catalog() -> IRootDb {
        let sinfo = StaticInfo::from_snapshot(StaticInfoSnapshot {
            images: vec![Image {
                id: ImageId(1),
                name: "app".to_string(),
            }],
            insts: (1..=4)
                .map(|i| Inst {
                    id: InstId(i),
                    image_id: ImageId(1),
                    offset: u64::from(i),
                    debug_info: None,
                })
                .collect(),
        })
        .unwrap();
        let events = (1..=4)
            .map(|i| IRootEvent {
                id: EventId(i),
                inst_id: InstId(i),
                kind: EventKind::MemWrite,
            })
            .collect();
        let iroots = vec![
            IRoot {
                id: IRootId(1),
                idiom: Idiom::Idiom1,
                event_ids: vec![EventId(1), EventId(2)],
            },
            IRoot {
                id: IRootId(2),
                idiom: Idiom::Idiom1,
                event_ids: vec![EventId(2), EventId(1)],
            },
            IRoot {
                id: IRootId(3),
                idiom: Idiom::Idiom4,
                event_ids: vec![EventId(1), EventId(2), EventId(3), EventId(4)],
            },
        ];
        IRootDb::from_snapshot(IRootDbSnapshot { events, iroots }, &sinfo).unwrap()
    }

    const C1: IRootId = IRootId(1);
    const C2: IRootId = IRootId(2);
    const C3: IRootId = IRootId(3);

    #[test]
    fn test_record_failure_gives_up_at_total_limit() {
        let mut memo = Memo::new();
        memo.add_candidate(C1);

        for _ in 0..5 {
            memo.record_failure(C1);
        }
        assert_eq!(memo.info(C1).unwrap().total_test_runs, 5);
        assert!(!memo.is_failed(C1));

        memo.record_failure(C1);
        assert_eq!(memo.info(C1).unwrap().total_test_runs, 6);
        assert!(memo.is_failed(C1));
    }

    #[test]
    fn test_record_success_exposes_and_counts() {
        let mut memo = Memo::new();
        memo.add_candidate(C1);
        memo.record_success(C1);

        assert!(memo.is_exposed(C1));
        assert_eq!(memo.candidate_runs(C1), Some(1));
        assert_eq!(memo.info(C1).unwrap().total_test_runs, 1);
    }

    #[test]
    fn test_exposure_clears_failed() {
        let mut memo = Memo::new();
        for _ in 0..6 {
            memo.record_failure(C1);
        }
        assert!(memo.is_failed(C1));

        memo.record_success(C1);
        assert!(memo.is_exposed(C1));
        assert!(!memo.is_failed(C1));

        memo.record_failure(C1);
        assert!(!memo.is_failed(C1));
    }

    #[test]
    fn test_refine_drops_exhausted_exposed_and_failed() {
        let mut memo = Memo::new();
        memo.add_candidate(C1);
        memo.add_candidate(C2);
        memo.add_candidate(C3);

        memo.record_failure(C1);
        memo.record_failure(C1);
        memo.record_success(C2);
        memo.observe(C3).total_test_runs = 5;
        memo.record_failure(C3);
        assert!(memo.is_failed(C3));
        assert_eq!(memo.candidate_runs(C3), Some(1));

        let mut keep_failed = memo.clone();
        assert_eq!(keep_failed.refine(false), 2);
        assert_eq!(keep_failed.candidates().keys().copied().collect::<Vec<_>>(), vec![C3]);

        assert_eq!(memo.refine(true), 3);
        assert!(memo.candidates().is_empty());
    }

    #[test]
    fn test_close_unexposed() {
        let mut memo = Memo::new();
        memo.observe(C1);
        memo.observe(C2);
        memo.predict(C3);
        memo.record_success(C2);

        memo.close_unexposed();
        assert!(memo.is_failed(C1));
        assert!(memo.is_failed(C3));
        assert!(!memo.is_failed(C2));
        assert!(memo.is_exposed(C2));
    }

    #[test]
    fn test_merge_takes_max_candidate_runs() {
        let mut a = Memo::new();
        a.add_candidate(C1);
        a.record_failure(C1);

        let mut b = Memo::new();
        b.add_candidate(C1);
        b.record_failure(C1);
        b.record_failure(C1);
        b.add_candidate(C2);

        a.merge(&b);
        assert_eq!(a.candidate_runs(C1), Some(2));
        assert_eq!(a.candidate_runs(C2), Some(0));
        assert_eq!(a.candidate_size(), 2);
    }

    #[test]
    fn test_merge_async_is_sticky() {
        let mut a = Memo::new();
        a.set_async(C1, false);
        a.observe(C2);

        let mut b = Memo::new();
        b.set_async(C1, true);
        b.observe(C2);

        let mut ab = a.clone();
        ab.merge(&b);
        assert_eq!(ab.info(C1).unwrap().is_async, Some(true));
        assert_eq!(ab.info(C2).unwrap().is_async, None);

        let mut ba = b.clone();
        ba.merge(&a);
        assert_eq!(ab, ba);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let mut a = Memo::new();
        a.add_candidate(C1);
        a.record_failure(C1);
        a.predict(C2);
        a.mark_shadow_exposed(C3);

        let mut merged = a.clone();
        merged.merge(&a);
        assert_eq!(merged, a);
    }

    #[test]
    fn test_snapshot_roundtrip_and_integrity() {
        let catalog = catalog();
        let mut memo = Memo::new();
        memo.add_candidate(C1);
        memo.record_success(C1);
        memo.predict(C3);

        let restored = Memo::from_snapshot(memo.to_snapshot(), &catalog).unwrap();
        assert_eq!(restored, memo);

        let mut broken = memo.to_snapshot();
        broken.predicted.push(C2);
        let err = Memo::from_snapshot(broken, &catalog).unwrap_err();
        assert!(matches!(
            err,
            DomainError::IntegrityViolation { set: "predicted", id } if id == C2
        ));

        let mut unknown = MemoSnapshot::default();
        unknown.iroot_info.push(IRootInfo::new(IRootId(99)));
        assert!(matches!(
            Memo::from_snapshot(unknown, &catalog),
            Err(DomainError::UnknownIRoot(IRootId(99)))
        ));
    }

    #[test]
    fn test_sample_candidates_trims_one_idiom() {
        use rand::SeedableRng;
        use rand_chacha::ChaCha8Rng;

        let catalog = catalog();
        let mut memo = Memo::new();
        memo.add_candidate(C1);
        memo.add_candidate(C2);
        memo.add_candidate(C3);
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        // At or above the queue size nothing changes.
        let mut untouched = memo.clone();
        assert_eq!(untouched.sample_candidates(&catalog, Idiom::Idiom1, 2, &mut rng), 0);
        assert_eq!(untouched.sample_candidates(&catalog, Idiom::Idiom1, 9, &mut rng), 0);
        assert_eq!(untouched, memo);

        let removed = memo.sample_candidates(&catalog, Idiom::Idiom1, 1, &mut rng);
        assert_eq!(removed, 1);
        assert_eq!(memo.candidates_for(&catalog, Idiom::Idiom1).len(), 1);
        assert_eq!(memo.candidate_runs(C3), Some(0));
        // Runtime info survives; only the queue shrinks.
        assert_eq!(memo.size(), 3);

        assert_eq!(memo.sample_candidates(&catalog, Idiom::Idiom1, 0, &mut rng), 1);
        assert!(!memo.has_candidate(&catalog, Some(Idiom::Idiom1)));
        assert_eq!(memo.candidate_size(), 1);
    }

    #[test]
    fn test_sample_candidates_is_reproducible_per_seed() {
        use rand::SeedableRng;
        use rand_chacha::ChaCha8Rng;

        let catalog = catalog();
        let mut memo = Memo::new();
        memo.add_candidate(C1);
        memo.add_candidate(C2);

        let sampled = |seed| {
            let mut m = memo.clone();
            m.sample_candidates(&catalog, Idiom::Idiom1, 1, &mut ChaCha8Rng::seed_from_u64(seed));
            m
        };
        assert_eq!(sampled(42), sampled(42));
    }

    #[test]
    fn test_per_idiom_views() {
        let catalog = catalog();
        let mut memo = Memo::new();
        memo.record_success(C1);
        memo.mark_shadow_exposed(C3);
        memo.add_candidate(C2);

        assert_eq!(memo.exposed_for(&catalog, Idiom::Idiom1).len(), 1);
        assert_eq!(memo.observed_for(&catalog, Idiom::Idiom4).len(), 1);
        assert_eq!(memo.observed_counts(&catalog), [1, 0, 0, 1, 0]);
        assert!(memo.has_candidate(&catalog, Some(Idiom::Idiom1)));
        assert!(!memo.has_candidate(&catalog, Some(Idiom::Idiom4)));
        assert!(memo.has_candidate(&catalog, None));

        let summary = memo.summary(&catalog);
        assert_eq!(summary.exposed.total, 1);
        assert_eq!(summary.shadow_exposed.per_idiom[Idiom::Idiom4.index()], 1);
        assert_eq!(summary.total_iroot_info, 3);
        assert!(summary.to_string().contains("Memoization Summary"));
    }
}
