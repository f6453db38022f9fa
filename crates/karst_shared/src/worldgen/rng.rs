use rand::{Rng, RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

/// Mixes two values into a well-distributed seed (splitmix64 finalizer).
pub fn mix(a: u64, b: u64) -> u64 {
    let mut h = a ^ b.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    h ^= h >> 30;
    h = h.wrapping_mul(0xBF58_476D_1CE4_E5B9);
    h ^= h >> 27;
    h = h.wrapping_mul(0x94D0_49BB_1331_11EB);
    h ^ (h >> 31)
}

/// Deterministic random stream for cave generation. Streams are always
/// explicit values, never process-global state: the driving loop reseeds
/// one per source column, and every recursive walker forks a child stream
/// from its parent so results do not depend on call order.
#[derive(Clone, Debug)]
pub struct CaveRand {
    rng: Pcg64Mcg,
}

impl CaveRand {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg64Mcg::seed_from_u64(seed),
        }
    }

    /// Stream for one source column, derived from the world seed and the
    /// column's chunk coordinates.
    pub fn for_column(world_seed: u64, col_x: i32, col_z: i32) -> Self {
        let coords = ((col_x as u32 as u64) << 32) | col_z as u32 as u64;
        Self::new(mix(world_seed, coords))
    }

    /// Derived sub-stream for a recursive walker call. Advances this stream
    /// by one draw; the child is independent from that point on.
    pub fn fork(&mut self) -> Self {
        Self::new(self.rng.next_u64())
    }

    /// Uniform integer in `0..bound`. `bound` must be positive.
    pub fn next_i32(&mut self, bound: i32) -> i32 {
        debug_assert!(bound > 0);
        self.rng.gen_range(0..bound)
    }

    pub fn next_f32(&mut self) -> f32 {
        self.rng.gen::<f32>()
    }

    pub fn next_f64(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

#[cfg(test)]
mod tests {
    use super::{mix, CaveRand};

    #[test]
    fn identical_seeds_produce_identical_sequences() {
        let mut a = CaveRand::new(0xDEAD_BEEF);
        let mut b = CaveRand::new(0xDEAD_BEEF);

        for _ in 0..256 {
            assert_eq!(a.next_i32(1000), b.next_i32(1000));
            assert_eq!(a.next_f64().to_bits(), b.next_f64().to_bits());
        }
    }

    #[test]
    fn column_streams_are_deterministic_and_position_dependent() {
        let mut a = CaveRand::for_column(7, 10, -4);
        let mut b = CaveRand::for_column(7, 10, -4);
        let mut c = CaveRand::for_column(7, -4, 10);

        let seq_a: Vec<i32> = (0..32).map(|_| a.next_i32(1 << 20)).collect();
        let seq_b: Vec<i32> = (0..32).map(|_| b.next_i32(1 << 20)).collect();
        let seq_c: Vec<i32> = (0..32).map(|_| c.next_i32(1 << 20)).collect();

        assert_eq!(seq_a, seq_b);
        assert_ne!(seq_a, seq_c);
    }

    #[test]
    fn forked_streams_diverge_from_parent_but_stay_reproducible() {
        let mut parent1 = CaveRand::new(99);
        let mut parent2 = CaveRand::new(99);

        let mut child1 = parent1.fork();
        let mut child2 = parent2.fork();

        for _ in 0..64 {
            assert_eq!(child1.next_i32(4096), child2.next_i32(4096));
        }
        // The parents stay in lockstep after the fork too.
        assert_eq!(parent1.next_i32(4096), parent2.next_i32(4096));
    }

    #[test]
    fn next_i32_stays_in_bounds() {
        let mut rand = CaveRand::new(3);
        for bound in [1, 2, 7, 100, 10_000] {
            for _ in 0..200 {
                let v = rand.next_i32(bound);
                assert!((0..bound).contains(&v));
            }
        }
    }

    #[test]
    fn mix_spreads_nearby_inputs() {
        assert_ne!(mix(1, 0), mix(1, 1));
        assert_ne!(mix(0, 1), mix(1, 0));
        assert_ne!(mix(u64::MAX, 0), mix(u64::MAX - 1, 0));
    }
}
