//! Quadrant hash for the broad phase.
//!
//! Two maps are kept in lockstep: quadrant -> occupants and entity -> occupied
//! quadrants. An entity's recorded quadrant set always equals the quadrants its
//! last indexed bounds overlap. Lifecycle is explicit (`init_model`,
//! `reindex`, `remove`); nothing is inferred.

use std::collections::{BTreeSet, HashMap};
use std::fmt::Debug;
use std::hash::Hash;

use tracing::warn;

use crate::error::{GeomError, Result};
use crate::types::{Aabb, Quadrant, WorldStats};

/// Smallest quadrant edge the index will use.
pub const MIN_QUADRANT_SIZE: f64 = 1e-5;

#[derive(Clone, Debug)]
pub struct SpaceIndex<K> {
    quadrant_size: f64,
    cells: HashMap<Quadrant, BTreeSet<K>>,
    occupancy: HashMap<K, BTreeSet<Quadrant>>,
}

impl<K> SpaceIndex<K>
where
    K: Copy + Ord + Hash + Debug,
{
    /// Sizes below `MIN_QUADRANT_SIZE` (including non-finite ones) are clamped with a warning;
    /// `WorldConfig::validate` rejects them up front.
    pub fn new(quadrant_size: f64) -> Self {
        let clamped = if quadrant_size.is_finite() { quadrant_size.max(MIN_QUADRANT_SIZE) } else { MIN_QUADRANT_SIZE };
        if clamped != quadrant_size {
            warn!(requested = quadrant_size, used = clamped, "quadrant size clamped");
        }
        Self { quadrant_size: clamped, cells: HashMap::new(), occupancy: HashMap::new() }
    }

    pub fn quadrant_size(&self) -> f64 {
        self.quadrant_size
    }

    pub fn world_to_quadrant(&self, x: f64, z: f64) -> Quadrant {
        ((x / self.quadrant_size).floor() as i32, (z / self.quadrant_size).floor() as i32)
    }

    /// Every quadrant the bounds overlap (floor indexing, inclusive of the max edge).
    pub fn quadrants_for(&self, bounds: &Aabb) -> BTreeSet<Quadrant> {
        if bounds.is_empty() {
            return BTreeSet::new();
        }
        let (ix0, iz0) = self.world_to_quadrant(bounds.min.x, bounds.min.y);
        let (ix1, iz1) = self.world_to_quadrant(bounds.max.x, bounds.max.y);
        let mut out = BTreeSet::new();
        for iz in iz0..=iz1 {
            for ix in ix0..=ix1 {
                out.insert((ix, iz));
            }
        }
        out
    }

    /// Register an entity under every quadrant its bounds overlap.
    pub fn init_model(&mut self, key: K, bounds: &Aabb) -> Result<()> {
        if self.occupancy.contains_key(&key) {
            return Err(GeomError::AlreadyIndexed { entity: format!("{key:?}") });
        }
        let quadrants = self.quadrants_for(bounds);
        for q in &quadrants {
            self.cells.entry(*q).or_default().insert(key);
        }
        self.occupancy.insert(key, quadrants);
        Ok(())
    }

    /// Move an entity to the quadrants of its new bounds, touching only the difference.
    pub fn reindex(&mut self, key: K, bounds: &Aabb) -> Result<()> {
        let next = self.quadrants_for(bounds);
        let prev = self
            .occupancy
            .get(&key)
            .ok_or_else(|| GeomError::NotIndexed { entity: format!("{key:?}") })?;
        if *prev == next {
            return Ok(());
        }
        let stale: Vec<Quadrant> = prev.difference(&next).copied().collect();
        let entered: Vec<Quadrant> = next.difference(prev).copied().collect();
        for q in stale {
            self.detach(key, q)?;
        }
        for q in entered {
            self.cells.entry(q).or_default().insert(key);
        }
        self.occupancy.insert(key, next);
        Ok(())
    }

    pub fn remove(&mut self, key: K) -> Result<()> {
        let quadrants = self
            .occupancy
            .remove(&key)
            .ok_or_else(|| GeomError::NotIndexed { entity: format!("{key:?}") })?;
        for q in quadrants {
            self.detach(key, q)?;
        }
        Ok(())
    }

    fn detach(&mut self, key: K, q: Quadrant) -> Result<()> {
        let removed = match self.cells.get_mut(&q) {
            Some(bucket) => {
                let removed = bucket.remove(&key);
                if bucket.is_empty() {
                    self.cells.remove(&q);
                }
                removed
            }
            None => false,
        };
        if !removed {
            warn!(entity = ?key, quadrant = ?q, "spatial index lost track of entity");
            return Err(GeomError::IndexInconsistent { entity: format!("{key:?}"), quadrant: q });
        }
        Ok(())
    }

    pub fn contains(&self, key: K) -> bool {
        self.occupancy.contains_key(&key)
    }

    pub fn quadrants_of(&self, key: K) -> Option<&BTreeSet<Quadrant>> {
        self.occupancy.get(&key)
    }

    /// Occupants of one quadrant; empty when nobody is there.
    pub fn models_in(&self, q: Quadrant) -> BTreeSet<K> {
        self.cells.get(&q).cloned().unwrap_or_default()
    }

    /// Union of everyone sharing a quadrant with `key`, minus `key` itself.
    pub fn other_models(&self, key: K) -> BTreeSet<K> {
        let mut out = BTreeSet::new();
        if let Some(quadrants) = self.occupancy.get(&key) {
            for q in quadrants {
                if let Some(bucket) = self.cells.get(q) {
                    out.extend(bucket.iter().copied().filter(|k| *k != key));
                }
            }
        }
        out
    }

    /// Candidate pairs for `entities`: each unordered pair once, as `(min, max)`,
    /// sorted ascending, no matter how many quadrants the two share.
    pub fn all_pairs_deduplicated<I>(&self, entities: I) -> Vec<(K, K)>
    where
        I: IntoIterator<Item = K>,
    {
        let mut seen: BTreeSet<(K, K)> = BTreeSet::new();
        for a in entities {
            for b in self.other_models(a) {
                seen.insert(if a < b { (a, b) } else { (b, a) });
            }
        }
        seen.into_iter().collect()
    }

    /// Return debug/perf stats for the current index state.
    pub fn debug_stats(&self) -> WorldStats {
        let mut candidate_pairs: usize = 0;
        let mut seen: BTreeSet<(K, K)> = BTreeSet::new();
        for bucket in self.cells.values() {
            let n = bucket.len();
            if n >= 2 {
                candidate_pairs += n * (n - 1) / 2;
            }
            let keys: Vec<K> = bucket.iter().copied().collect();
            for i in 0..n {
                for j in (i + 1)..n {
                    seen.insert((keys[i], keys[j]));
                }
            }
        }
        WorldStats {
            bodies: self.occupancy.len(),
            quadrants: self.cells.len(),
            candidate_pairs,
            unique_pairs: seen.len(),
        }
    }

    /// Cross-check the two maps against each other.
    pub fn is_consistent(&self) -> bool {
        let forward = self
            .occupancy
            .iter()
            .all(|(k, qs)| qs.iter().all(|q| self.cells.get(q).is_some_and(|b| b.contains(k))));
        let backward = self
            .cells
            .iter()
            .all(|(q, ks)| !ks.is_empty() && ks.iter().all(|k| self.occupancy.get(k).is_some_and(|qs| qs.contains(q))));
        forward && backward
    }
}
