//! Bounded discrete-log recovery with Pollard's kangaroo algorithm.
//!
//! Decrypting a twisted-Elgamal chunk yields the curve point
//! `value * h` for an unknown `value` below `2^bits_per_chunk`. The
//! solver inverts that point back to the integer with a tame/wild
//! kangaroo search: a one-off table generation walks a herd of tame
//! kangaroos from known distances until each reaches a *distinguished*
//! point, recording `point -> distance` traps; a solve walks a wild
//! kangaroo from the target point along the same pseudorandom jump
//! sequence until it steps into a trap, at which moment the unknown
//! distance is the trap distance minus the wild distance.
//!
//! Expected cost is `O(sqrt(range))` group operations per solve, which
//! is the whole reason balances are chunked: eight 32-bit searches are
//! cheap where one 128-bit search is infeasible.
//!
//! Table generation is expensive and should be amortized: build the
//! tables once per process via [`KangarooTableCache`] before a batch of
//! decryptions. Tables are read-only after construction, so any number
//! of solves may run concurrently against the same table.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Instant;

use curve25519_dalek::{ristretto::RistrettoPoint, scalar::Scalar, traits::Identity};
use log::{debug, info};
use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_core::RngCore;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::elgamal::ElgamalGens;
use crate::errors::{Error, Result};

/// Number of pivot entries in the jump table of one kangaroo table.
pub const JUMP_TABLE_SIZE: usize = 64;

/// Seed base for deterministic table generation; rebuilding a table for
/// the same bit width reproduces it exactly.
const TABLE_SEED: u64 = 0x6b61_6e67_6172_6f6f; // "kangaroo"

/// Tuning knobs of one search-range regime.
///
/// The presets keep roughly sixteen overlapping tame walks above every
/// position of the search interval, which makes a wild walk merge with
/// a tame one after about `mean_jump / 16` steps and reach the next
/// trap within `2^dp_bits` more.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KangarooParams {
    /// The search interval is `[0, 2^range_bits)`.
    pub range_bits: u32,
    /// A point is distinguished when the low `dp_bits` of its compressed
    /// encoding are zero.
    dp_bits: u32,
    /// Number of tame kangaroos walked during table generation.
    tame_count: usize,
    /// Jump budget of one wild walk before it is restarted.
    wild_step_budget: u64,
    /// Number of deterministic wild restarts before giving up.
    wild_restarts: u32,
}

impl KangarooParams {
    /// Presets for the supported search ranges. The repository's own
    /// decryption paths use the 32-bit regime; 48 and 64 bits are
    /// provided for oversized chunks but their tables are costly to
    /// generate and are best built offline and [`preloaded`].
    ///
    /// [`preloaded`]: KangarooTableCache::preload
    pub fn for_range_bits(range_bits: u32) -> Result<Self> {
        let params = match range_bits {
            16 => Self {
                range_bits,
                dp_bits: 4,
                tame_count: 512,
                wild_step_budget: 1 << 12,
                wild_restarts: 4,
            },
            32 => Self {
                range_bits,
                dp_bits: 8,
                tame_count: 6144,
                wild_step_budget: 1 << 17,
                wild_restarts: 4,
            },
            48 => Self {
                range_bits,
                dp_bits: 12,
                tame_count: 98304,
                wild_step_budget: 1 << 25,
                wild_restarts: 4,
            },
            64 => Self {
                range_bits,
                dp_bits: 16,
                tame_count: 3 << 19,
                wild_step_budget: 1 << 33,
                wild_restarts: 4,
            },
            _ => {
                return Err(Error::InvalidDecompositionParameters {
                    reason: "unsupported kangaroo search range; expected 16, 32, 48 or 64 bits",
                })
            }
        };
        Ok(params)
    }

    /// `2^range_bits`.
    pub fn range(&self) -> u128 {
        1u128 << self.range_bits
    }

    /// Largest single jump; distances are uniform in `[1, max_jump]`,
    /// so the mean jump is `2^(range_bits / 2)`.
    fn max_jump(&self) -> u64 {
        1u64 << (self.range_bits / 2 + 1)
    }

    /// Tame starts are spread past the range end so that a wild walk
    /// beginning near the top still travels under trap cover.
    fn tame_start_span(&self) -> u128 {
        let range = self.range();
        range + range / 2
    }

    /// Steps a tame kangaroo may take before it is discarded for never
    /// reaching a distinguished point.
    fn tame_step_guard(&self) -> u64 {
        16u64 << self.dp_bits
    }

    fn dp_mask(&self) -> u64 {
        (1u64 << self.dp_bits) - 1
    }
}

/// Low 64 bits of a compressed point, used to derive the jump index and
/// the distinguished-point predicate from disjoint bit regions.
fn point_head(bytes: &[u8; 32]) -> u64 {
    let mut head = [0u8; 8];
    head.copy_from_slice(&bytes[..8]);
    u64::from_le_bytes(head)
}

/// A precomputed kangaroo table for one search-range regime.
///
/// Holds the pivot jump table (shared by tame and wild walks) and the
/// trap map from distinguished points to their absolute distances.
/// Read-only after generation.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KangarooTable {
    params: KangarooParams,
    generator: RistrettoPoint,
    jump_distances: Vec<u64>,
    jump_points: Vec<RistrettoPoint>,
    traps: HashMap<[u8; 32], u128>,
    max_trap_distance: u128,
}

impl KangarooTable {
    /// Walks the tame herd and records the traps.
    ///
    /// Deterministic given `rng`; two tables generated from equal seeds
    /// are identical, and tables from different seeds are functionally
    /// equivalent (same search behavior, different trap sets).
    pub fn generate<R: RngCore>(
        params: KangarooParams,
        generator: RistrettoPoint,
        rng: &mut R,
    ) -> Self {
        let started = Instant::now();

        let jump_distances: Vec<u64> = (0..JUMP_TABLE_SIZE)
            .map(|_| rng.gen_range(1..=params.max_jump()))
            .collect();
        let jump_points: Vec<RistrettoPoint> = jump_distances
            .iter()
            .map(|d| Scalar::from(*d) * generator)
            .collect();

        let mut table = Self {
            params,
            generator,
            jump_distances,
            jump_points,
            traps: HashMap::with_capacity(params.tame_count),
            max_trap_distance: 0,
        };

        let dp_mask = params.dp_mask();
        for _ in 0..params.tame_count {
            let start = rng.gen_range(0..params.tame_start_span());
            let mut point = Scalar::from(start) * generator;
            let mut distance = start;
            for _ in 0..params.tame_step_guard() {
                let bytes = point.compress().to_bytes();
                let head = point_head(&bytes);
                if head & dp_mask == 0 {
                    // Two tames landing on the same trap carry the same
                    // absolute distance, so overwriting is harmless.
                    table.traps.insert(bytes, distance);
                    table.max_trap_distance = table.max_trap_distance.max(distance);
                    break;
                }
                let jump = table.jump_index(head);
                point += table.jump_points[jump];
                distance += table.jump_distances[jump] as u128;
            }
        }

        info!(
            "generated {}-bit kangaroo table: {} traps in {:?}",
            params.range_bits,
            table.traps.len(),
            started.elapsed(),
        );
        table
    }

    pub fn params(&self) -> &KangarooParams {
        &self.params
    }

    pub fn generator(&self) -> &RistrettoPoint {
        &self.generator
    }

    fn jump_index(&self, head: u64) -> usize {
        ((head >> 32) % JUMP_TABLE_SIZE as u64) as usize
    }

    /// Finds `x` in `[0, upper_bound)` with `x * generator == target`.
    ///
    /// Deterministic given the table and inputs: restarts perturb the
    /// wild start by a fixed offset, never by fresh randomness. Fails
    /// with `DiscreteLogNotFound` once the jump budget of every restart
    /// is spent, or as soon as a trap proves the target lies outside
    /// the requested bound.
    pub fn solve(&self, target: &RistrettoPoint, upper_bound: u128) -> Result<u128> {
        if upper_bound == 0 || upper_bound > self.params.range() {
            return Err(Error::InvalidDecompositionParameters {
                reason: "search bound must be positive and within the table's range",
            });
        }
        let not_found = Error::DiscreteLogNotFound {
            range_bits: self.params.range_bits,
        };
        if *target == RistrettoPoint::identity() {
            return Ok(0);
        }

        let dp_mask = self.params.dp_mask();
        for restart in 0..self.params.wild_restarts {
            let offset = restart as u128;
            let mut point = if offset == 0 {
                *target
            } else {
                target + Scalar::from(offset) * self.generator
            };
            let mut distance = 0u128;

            for step in 0..self.params.wild_step_budget {
                let bytes = point.compress().to_bytes();
                let head = point_head(&bytes);
                if head & dp_mask == 0 {
                    if let Some(trap_distance) = self.traps.get(&bytes) {
                        // Equal points pin the discrete log exactly:
                        // x + offset + distance == trap_distance.
                        if let Some(x) = trap_distance.checked_sub(offset + distance) {
                            debug!(
                                "kangaroo hit after {step} jumps ({} restarts)",
                                restart
                            );
                            if x < upper_bound {
                                return Ok(x);
                            }
                            return Err(not_found);
                        }
                    }
                }
                if offset + distance > self.max_trap_distance {
                    // Past every trap; this walk can no longer succeed.
                    break;
                }
                let jump = self.jump_index(head);
                point += self.jump_points[jump];
                distance += self.jump_distances[jump] as u128;
            }
        }

        Err(not_found)
    }

    /// Solves within `[lower_bound, upper_bound)` by shifting the target
    /// down by `lower_bound` generators first.
    pub fn solve_in_range(
        &self,
        target: &RistrettoPoint,
        lower_bound: u128,
        upper_bound: u128,
    ) -> Result<u128> {
        if lower_bound >= upper_bound {
            return Err(Error::InvalidDecompositionParameters {
                reason: "search range is empty",
            });
        }
        if lower_bound == 0 {
            return self.solve(target, upper_bound);
        }
        let shifted = target - Scalar::from(lower_bound) * self.generator;
        Ok(self.solve(&shifted, upper_bound - lower_bound)? + lower_bound)
    }
}

/// Process-wide cache of kangaroo tables keyed by bit width.
///
/// Passed by reference to whichever component drives decryption; there
/// is deliberately no ambient global table state. Concurrent builds for
/// the same bit width coalesce: the second caller blocks until the
/// first finishes and both receive the same table.
#[derive(Default)]
pub struct KangarooTableCache {
    tables: Mutex<HashMap<u32, Arc<OnceLock<Arc<KangarooTable>>>>>,
}

impl KangarooTableCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached table for `range_bits`, generating it on first
    /// use. Unsupported widths are rejected before any build starts.
    pub fn get_or_build(&self, range_bits: u32) -> Result<Arc<KangarooTable>> {
        let params = KangarooParams::for_range_bits(range_bits)?;
        let cell = {
            let mut tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
            tables.entry(range_bits).or_default().clone()
        };
        let table = cell.get_or_init(|| {
            let mut rng = StdRng::seed_from_u64(TABLE_SEED ^ u64::from(range_bits));
            let gens = ElgamalGens::default();
            Arc::new(KangarooTable::generate(params, gens.value_gen, &mut rng))
        });
        Ok(table.clone())
    }

    /// Builds (or loads from cache) the tables for each requested width.
    /// Call once before a batch of decryptions.
    pub fn initialize_tables(&self, bit_widths: &[u32]) -> Result<()> {
        for bits in bit_widths {
            self.get_or_build(*bits)?;
        }
        Ok(())
    }

    /// Installs an externally generated table (e.g. deserialized from
    /// disk for the heavy 48/64-bit regimes). A table already cached for
    /// the same width wins and the argument is dropped.
    pub fn preload(&self, table: KangarooTable) {
        let cell = {
            let mut tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
            tables
                .entry(table.params.range_bits)
                .or_default()
                .clone()
        };
        let _ = cell.set(Arc::new(table));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elgamal::ElgamalGens;

    fn table_16() -> KangarooTable {
        let params = KangarooParams::for_range_bits(16).unwrap();
        let mut rng = StdRng::seed_from_u64(TABLE_SEED ^ 16);
        KangarooTable::generate(params, ElgamalGens::default().value_gen, &mut rng)
    }

    #[test]
    fn solves_16_bit_range() {
        let table = table_16();
        let gen = *table.generator();
        for value in [0u128, 1, 2, 255, 256, 4096, 65534, 65535] {
            let target = Scalar::from(value) * gen;
            assert_eq!(table.solve(&target, 1 << 16).unwrap(), value);
        }
    }

    #[test]
    fn solve_is_deterministic() {
        let table = table_16();
        let target = Scalar::from(31337u64) * table.generator();
        let a = table.solve(&target, 1 << 16).unwrap();
        let b = table.solve(&target, 1 << 16).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, 31337);
    }

    #[test]
    fn rebuild_is_equivalent() {
        let a = table_16();
        let b = table_16();
        assert_eq!(a.traps.len(), b.traps.len());
        assert_eq!(a.jump_distances, b.jump_distances);
        let target = Scalar::from(777u64) * a.generator();
        assert_eq!(
            a.solve(&target, 1 << 16).unwrap(),
            b.solve(&target, 1 << 16).unwrap()
        );
    }

    #[test]
    fn fails_outside_the_bound() {
        let table = table_16();
        let target = Scalar::from(70_000u64) * table.generator();
        assert_eq!(
            table.solve(&target, 1 << 16),
            Err(Error::DiscreteLogNotFound { range_bits: 16 })
        );
    }

    #[test]
    fn narrowed_range_does_not_change_the_result() {
        let table = table_16();
        let target = Scalar::from(20_000u64) * table.generator();
        assert_eq!(table.solve(&target, 1 << 16).unwrap(), 20_000);
        assert_eq!(table.solve_in_range(&target, 15_000, 25_000).unwrap(), 20_000);
        // A hint that excludes the true value fails instead of lying.
        assert!(table.solve_in_range(&target, 30_000, 40_000).is_err());
    }

    #[test]
    fn rejects_invalid_bounds() {
        let table = table_16();
        let target = Scalar::from(5u64) * table.generator();
        assert!(table.solve(&target, 0).is_err());
        assert!(table.solve(&target, 1 << 17).is_err());
        assert!(table.solve_in_range(&target, 10, 10).is_err());
    }

    #[test]
    fn unsupported_width_is_rejected() {
        assert!(KangarooParams::for_range_bits(20).is_err());
        let cache = KangarooTableCache::new();
        assert!(cache.get_or_build(20).is_err());
    }

    #[test]
    fn cache_returns_one_shared_table() {
        let cache = Arc::new(KangarooTableCache::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cache = cache.clone();
                std::thread::spawn(move || cache.get_or_build(16).unwrap())
            })
            .collect();
        let tables: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for table in &tables[1..] {
            assert!(Arc::ptr_eq(&tables[0], table));
        }
    }

    #[test]
    fn preload_is_first_write_wins() {
        let cache = KangarooTableCache::new();
        cache.preload(table_16());
        let a = cache.get_or_build(16).unwrap();
        cache.preload(table_16());
        let b = cache.get_or_build(16).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
