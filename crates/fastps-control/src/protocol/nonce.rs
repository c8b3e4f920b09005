//! Per-packet nonce generation

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Last nonce handed out by any [`ClockNonce`] in this process
static LAST_CLOCK_NONCE: AtomicU64 = AtomicU64::new(0);

/// Source of the 64-bit nonce stamped into every packet
pub trait NonceSource: Send + Sync {
    /// Produce the nonce for the next packet
    fn next_nonce(&self) -> u64;
}

impl<T: NonceSource + ?Sized> NonceSource for Arc<T> {
    fn next_nonce(&self) -> u64 {
        (**self).next_nonce()
    }
}

impl<T: NonceSource + ?Sized> NonceSource for &T {
    fn next_nonce(&self) -> u64 {
        (**self).next_nonce()
    }
}

/// Wall-clock nanoseconds since the UNIX epoch, truncated to 64 bits.
///
/// Calls landing in the same clock tick (or after the clock stepped
/// backwards) get the previous value plus one, so nonces never repeat within
/// a process run.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClockNonce;

impl ClockNonce {
    pub fn new() -> Self {
        Self
    }

    fn now_nanos() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0)
    }
}

impl NonceSource for ClockNonce {
    fn next_nonce(&self) -> u64 {
        let now = Self::now_nanos();
        let mut prev = LAST_CLOCK_NONCE.load(Ordering::Relaxed);
        loop {
            let next = if now > prev { now } else { prev.wrapping_add(1) };
            match LAST_CLOCK_NONCE.compare_exchange_weak(
                prev,
                next,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return next,
                Err(actual) => prev = actual,
            }
        }
    }
}

/// Deterministic counter, for tests and replayable captures
#[derive(Debug, Default)]
pub struct SequenceNonce {
    next: AtomicU64,
}

impl SequenceNonce {
    /// Start counting at `seed`
    pub fn new(seed: u64) -> Self {
        Self {
            next: AtomicU64::new(seed),
        }
    }

    /// Value the next call will return
    pub fn peek(&self) -> u64 {
        self.next.load(Ordering::SeqCst)
    }
}

impl NonceSource for SequenceNonce {
    fn next_nonce(&self) -> u64 {
        self.next.fetch_add(1, Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_clock_nonce_consecutive_calls_differ() {
        let source = ClockNonce::new();
        let a = source.next_nonce();
        let b = source.next_nonce();
        assert_ne!(a, b);
        assert!(b > a);
    }

    #[test]
    fn test_clock_nonce_unique_in_tight_loop() {
        let source = ClockNonce::new();
        let nonces: HashSet<u64> = (0..10_000).map(|_| source.next_nonce()).collect();
        assert_eq!(nonces.len(), 10_000);
    }

    #[test]
    fn test_clock_nonce_unique_across_threads() {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                std::thread::spawn(|| {
                    let source = ClockNonce::new();
                    (0..1_000).map(|_| source.next_nonce()).collect::<Vec<_>>()
                })
            })
            .collect();

        let mut all = HashSet::new();
        for handle in handles {
            for nonce in handle.join().unwrap() {
                assert!(all.insert(nonce), "duplicate nonce {}", nonce);
            }
        }
        assert_eq!(all.len(), 4_000);
    }

    #[test]
    fn test_clock_nonce_tracks_wall_clock() {
        let before = ClockNonce::now_nanos();
        let nonce = ClockNonce::new().next_nonce();
        assert!(nonce >= before);
    }

    #[test]
    fn test_sequence_nonce_counts_from_seed() {
        let source = SequenceNonce::new(41);
        assert_eq!(source.peek(), 41);
        assert_eq!(source.next_nonce(), 41);
        assert_eq!(source.next_nonce(), 42);
        assert_eq!(source.peek(), 43);
    }

    #[test]
    fn test_shared_sequence_nonce() {
        let source = Arc::new(SequenceNonce::new(0));
        let handle = Arc::clone(&source);
        assert_eq!(handle.next_nonce(), 0);
        assert_eq!(source.next_nonce(), 1);
    }
}
