//! Fixed-capacity capture buffer
//!
//! Filled by one capture session, then drained by one playback session.
//! Capacity is fixed at compile time; nothing here allocates.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicUsize, Ordering};

use super::Sample;

/// Capture buffer of `N` samples.
///
/// # Safety
///
/// Storage sits in an `UnsafeCell` and is shared between the capture
/// trigger context and the main loop:
/// - Single writer: [`push`](Self::push) and [`clear`](Self::clear) are
///   `unsafe`; their caller is the holder of the `Recording` session
/// - `push` only writes above the published length, so slices handed out
///   by [`captured`](Self::captured) never see a write
/// - `clear` lets the next `push` overwrite slot 0, so no slice may outlive
///   a `clear`
/// - Length is published with `Release` after the slot is written
pub struct AudioBuffer<const N: usize> {
    samples: UnsafeCell<[Sample; N]>,
    len: AtomicUsize,
}

// SAFETY: single writer, readers limited to the published prefix.
unsafe impl<const N: usize> Sync for AudioBuffer<N> {}
unsafe impl<const N: usize> Send for AudioBuffer<N> {}

impl<const N: usize> AudioBuffer<N> {
    /// Create new empty buffer
    pub const fn new() -> Self {
        const { assert!(N > 0, "Buffer capacity must be non-zero") };

        Self {
            samples: UnsafeCell::new([0; N]),
            len: AtomicUsize::new(0),
        }
    }

    /// Maximum number of samples
    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Samples captured so far (the write cursor)
    #[inline]
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len() >= N
    }

    /// Reset the write cursor.
    ///
    /// Old sample values stay in memory but are no longer readable.
    ///
    /// # Safety
    ///
    /// The caller is the only producer, and no slice obtained from
    /// [`captured`](Self::captured) or [`snapshot`](Self::snapshot) before
    /// this call is used after it.
    #[inline]
    pub unsafe fn clear(&self) {
        self.len.store(0, Ordering::Release);
    }

    /// Append a sample at the write cursor.
    ///
    /// Returns `false` when full; the cursor never passes capacity.
    ///
    /// # Safety
    ///
    /// The caller is the only producer: no other `push` or `clear` runs
    /// concurrently.
    #[inline]
    pub unsafe fn push(&self, sample: Sample) -> bool {
        let n = self.len.load(Ordering::Relaxed);
        if n >= N {
            return false;
        }

        // SAFETY: slot `n` is above the published length, so no reader
        // looks at it, and only one producer exists.
        unsafe {
            (self.samples.get() as *mut Sample).add(n).write(sample);
        }
        self.len.store(n + 1, Ordering::Release);
        true
    }

    /// Read a captured sample
    #[inline]
    pub fn get(&self, index: usize) -> Option<Sample> {
        if index >= self.len() {
            return None;
        }
        // SAFETY: index is inside the published prefix
        Some(unsafe { (self.samples.get() as *const Sample).add(index).read() })
    }

    /// Captured prefix as a slice
    #[inline]
    pub fn captured(&self) -> &[Sample] {
        let len = self.len();
        // SAFETY: `push` writes only at or above the published length and
        // `clear` requires that no earlier slice is still in use.
        unsafe { core::slice::from_raw_parts(self.samples.get() as *const Sample, len) }
    }

    /// View for the presenter with the given cursor position
    #[inline]
    pub fn snapshot(&self, cursor: usize) -> RenderSnapshot<'_> {
        RenderSnapshot {
            samples: self.captured(),
            cursor,
        }
    }
}

impl<const N: usize> Default for AudioBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only view of the captured samples plus a cursor.
///
/// Borrowed from the buffer for the duration of one presenter call.
#[derive(Debug, Clone, Copy)]
pub struct RenderSnapshot<'a> {
    /// Captured prefix of the buffer
    pub samples: &'a [Sample],
    /// Write cursor (capture) or read cursor (playback)
    pub cursor: usize,
}

impl<'a> RenderSnapshot<'a> {
    /// Number of samples in view
    #[inline]
    pub fn total(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
