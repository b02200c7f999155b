use alloc::{vec, vec::Vec};
use core::{fmt, mem};

use spin::Mutex;
use tracing::trace;
use zeroize::{Zeroize, Zeroizing};

use super::WindowError;
use crate::csprng::RandomGenerator;

/// Reverses the order of bytes produced by a root generator
/// within each fixed-size window.
///
/// The root fills the whole window in one call and the window
/// is then handed out last byte first. Seeding discards
/// whatever is left in the window, so the next byte is always
/// produced after the seed was applied.
///
/// A single instance can be shared between threads: seeding
/// and filling are serialized by an internal lock.
pub struct ReversedWindowGenerator<G> {
    inner: Mutex<Window<G>>,
}

struct Window<G> {
    root: G,
    buf: Zeroizing<Vec<u8>>,
    /// Number of unread bytes at the front of `buf`.
    remaining: usize,
}

impl<G: RandomGenerator> Window<G> {
    /// Wipes the unread bytes.
    fn discard(&mut self) {
        let remaining = self.remaining;
        self.buf[..remaining].zeroize();
        self.remaining = 0;
    }

    fn refill(&mut self) {
        self.root.fill_bytes(&mut self.buf);
        self.remaining = self.buf.len();
        trace!(size = self.remaining, "refilled window");
    }
}

impl<G: RandomGenerator> ReversedWindowGenerator<G> {
    /// Wraps `root` with a window of `window_size` bytes.
    ///
    /// The window must hold at least two bytes.
    pub fn new(root: G, window_size: usize) -> Result<Self, WindowError> {
        if window_size < 2 {
            return Err(WindowError::TooSmall(window_size));
        }
        Ok(Self {
            inner: Mutex::new(Window {
                root,
                buf: Zeroizing::new(vec![0u8; window_size]),
                remaining: 0,
            }),
        })
    }

    /// Returns the size of the window in bytes.
    pub fn window_size(&self) -> usize {
        self.inner.lock().buf.len()
    }

    /// Returns the root generator, discarding any buffered
    /// bytes.
    pub fn into_inner(self) -> G {
        self.inner.into_inner().root
    }
}

impl<G: RandomGenerator> RandomGenerator for ReversedWindowGenerator<G> {
    fn add_seed_material(&self, seed: &[u8]) {
        let mut w = self.inner.lock();
        w.discard();
        w.root.add_seed_material(seed);
    }

    fn add_seed_u64(&self, seed: u64) {
        let mut w = self.inner.lock();
        w.discard();
        w.root.add_seed_u64(seed);
    }

    fn fill_bytes(&self, mut dst: &mut [u8]) {
        let mut guard = self.inner.lock();
        let w = &mut *guard;
        while !dst.is_empty() {
            if w.remaining == 0 {
                w.refill();
            }
            let n = dst.len().min(w.remaining);
            let start = w.remaining - n;
            let (head, tail) = mem::take(&mut dst).split_at_mut(n);
            for (d, s) in head.iter_mut().zip(w.buf[start..w.remaining].iter().rev()) {
                *d = *s;
            }
            w.remaining = start;
            dst = tail;
        }
    }
}

impl<G> fmt::Debug for ReversedWindowGenerator<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReversedWindowGenerator")
            .finish_non_exhaustive()
    }
}
