use rand::{Rng, rng};

/// A trait for random sources that draw integers below an exclusive bound.
///
/// This abstraction allows plugging in the thread-local RNG in production
/// and a scripted sequence in tests.
///
/// Implementations must be cheap to clone: every worker task owns a clone.
pub trait RandSource: Clone + Send + Sync + 'static {
    /// Returns a value in `0..limit`. `limit` is never zero.
    fn rand_below(&self, limit: u32) -> u32;
}

/// A `RandSource` backed by the thread-local RNG (`rand::rng()`).
///
/// The RNG itself is never stored, so the type is zero-sized and may be moved
/// freely between tasks; each call uses the generator of whichever thread the
/// task is running on.
#[derive(Default, Clone, Copy, Debug)]
pub struct ThreadRandom;

impl RandSource for ThreadRandom {
    fn rand_below(&self, limit: u32) -> u32 {
        rng().random_range(0..limit)
    }
}

#[cfg(test)]
pub use scripted::ScriptedRandom;

#[cfg(test)]
mod scripted {
    use super::RandSource;
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    /// Replays a fixed sequence of values, cycling when exhausted. Clones share
    /// the cursor, so concurrent workers observe one interleaved sequence.
    #[derive(Clone, Debug)]
    pub struct ScriptedRandom {
        values: Arc<[u32]>,
        cursor: Arc<AtomicUsize>,
    }

    impl ScriptedRandom {
        pub fn new(values: &[u32]) -> Self {
            assert!(!values.is_empty());
            Self {
                values: values.into(),
                cursor: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl RandSource for ScriptedRandom {
        fn rand_below(&self, limit: u32) -> u32 {
            let i = self.cursor.fetch_add(1, Ordering::Relaxed) % self.values.len();
            self.values[i] % limit
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_random_stays_below_limit() {
        let rand = ThreadRandom;
        for _ in 0..1_000 {
            assert!(rand.rand_below(7) < 7);
        }
        assert_eq!(rand.rand_below(1), 0);
    }

    #[test]
    fn scripted_random_cycles() {
        let rand = ScriptedRandom::new(&[3, 1, 4]);
        let drawn: Vec<_> = (0..5).map(|_| rand.rand_below(10)).collect();
        assert_eq!(drawn, vec![3, 1, 4, 3, 1]);
    }
}
