//! Real-time audio buffer pipeline.
//!
//! A fixed pool of [`SampleBuffer`]s moves between three owners:
//!
//! ```text
//!   free list ──take──▶ producer ──submit──▶ play queue ──start──▶ playing
//!       ▲                                                          │
//!       └────────────────────────── playback_complete ─────────────┘
//! ```
//!
//! Buffers are plain values moved between those containers, never shared, so at
//! any instant each one has exactly one owner. [`BufferPool::census`] reports
//! the split and always sums to the pool size.
//!
//! The producer side talks to an [`AudioSink`]. [`BufferPool`] implements it
//! directly for single-context use; [`SharedPool`](isr::SharedPool) wraps a
//! `critical_section` protected global for use alongside a DMA interrupt.
//!
//! Contains:
//! - [`stream`]: drive a sample source through the sink until it is exhausted
//! - [`wait::acquire`]: bounded wait for a free buffer (`nb` + `DelayNs`)
//! - [`isr`]: global pool, setup and interrupt-side helpers
//! - `init_audio_pool!` / `setup_audio_pool!` / `audio_dma_irq!`: macro forms of the above

use core::fmt;
use core::iter::Peekable;
use core::sync::atomic::{AtomicBool, Ordering};

use embedded_hal::delay::DelayNs;
use heapless::Deque;

use crate::config::Config;
use crate::consts::PWM_IDLE_LEVEL;
use crate::error::{Error, ResourceError};

pub mod isr;
mod macros;
pub mod wait;

/// A fixed-capacity block of PWM samples plus its fill length.
///
/// Not `Clone`: a buffer is moved, never copied.
pub struct SampleBuffer<const N: usize> {
    samples: [u16; N],
    len: usize,
}

impl<const N: usize> SampleBuffer<N> {
    const fn new() -> Self {
        Self {
            samples: [PWM_IDLE_LEVEL; N],
            len: 0,
        }
    }

    /// Buffer capacity in samples.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Number of samples produced by the source in the last fill.
    pub fn len(&self) -> usize {
        self.len
    }

    /// `true` if the last fill produced no samples.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// All `N` samples, including idle padding after [`len`](Self::len).
    pub fn samples(&self) -> &[u16] {
        &self.samples
    }

    /// Fills from `source`, padding the remainder with the idle level.
    ///
    /// Returns the number of samples taken from `source`.
    pub fn fill_from<I: Iterator<Item = u16>>(&mut self, source: &mut I) -> usize {
        let mut len = 0;
        for slot in self.samples.iter_mut() {
            match source.next() {
                Some(sample) => {
                    *slot = sample;
                    len += 1;
                }
                None => break,
            }
        }
        self.samples[len..].fill(PWM_IDLE_LEVEL);
        self.len = len;
        len
    }
}

impl<const N: usize> fmt::Debug for SampleBuffer<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SampleBuffer")
            .field("capacity", &N)
            .field("len", &self.len)
            .finish()
    }
}

/// Buffer counts per owner. `free + filling + queued + playing` is constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct Census {
    /// On the free list.
    pub free: usize,
    /// Taken by a producer and not yet submitted.
    pub filling: usize,
    /// Submitted and waiting for the hardware.
    pub queued: usize,
    /// Being played by the hardware (0 or 1).
    pub playing: usize,
}

impl Census {
    /// Total number of buffers accounted for.
    pub fn total(&self) -> usize {
        self.free + self.filling + self.queued + self.playing
    }
}

/// `P` buffers of `N` samples, partitioned into free, queued and playing.
pub struct BufferPool<const N: usize, const P: usize> {
    free: Deque<SampleBuffer<N>, P>,
    queued: Deque<SampleBuffer<N>, P>,
    playing: Option<SampleBuffer<N>>,
    lent: usize,
}

impl<const N: usize, const P: usize> BufferPool<N, P> {
    /// Creates a pool with all `P` buffers free.
    pub fn new() -> Self {
        let mut free = Deque::new();
        for _ in 0..P {
            // Capacity is exactly P
            let _ = free.push_back(SampleBuffer::new());
        }
        Self {
            free,
            queued: Deque::new(),
            playing: None,
            lent: 0,
        }
    }

    /// Number of buffers owned by the pool and its producers.
    pub const fn size(&self) -> usize {
        P
    }

    /// Current ownership split.
    pub fn census(&self) -> Census {
        Census {
            free: self.free.len(),
            filling: self.lent,
            queued: self.queued.len(),
            playing: usize::from(self.playing.is_some()),
        }
    }

    /// Takes a free buffer without waiting.
    pub fn take_free(&mut self) -> Option<SampleBuffer<N>> {
        let buffer = self.free.pop_front()?;
        self.lent += 1;
        Some(buffer)
    }

    /// Appends a filled buffer to the play queue.
    pub fn submit(&mut self, buffer: SampleBuffer<N>) -> Result<(), ResourceError> {
        self.queued
            .push_back(buffer)
            .map_err(|_| ResourceError::PlayQueueFull)?;
        self.lent = self.lent.saturating_sub(1);
        Ok(())
    }

    /// Hands a buffer back to the free list without playing it.
    pub fn release(&mut self, buffer: SampleBuffer<N>) -> Result<(), ResourceError> {
        self.free
            .push_back(buffer)
            .map_err(|_| ResourceError::PlayQueueFull)?;
        self.lent = self.lent.saturating_sub(1);
        Ok(())
    }

    /// `true` while buffers are queued or playing.
    pub fn is_busy(&self) -> bool {
        self.playing.is_some() || !self.queued.is_empty()
    }

    /// Hardware side: moves the next queued buffer to the playing slot.
    ///
    /// Returns its samples, or `None` if the queue is empty or a buffer is
    /// still playing. The slice stays valid until [`playback_complete`](Self::playback_complete).
    pub fn start_next(&mut self) -> Option<&[u16]> {
        if self.playing.is_some() {
            return None;
        }
        self.playing = Some(self.queued.pop_front()?);
        self.playing.as_ref().map(SampleBuffer::samples)
    }

    /// Hardware side: the playing buffer finished and returns to the free list.
    ///
    /// Returns `false` if nothing was playing.
    pub fn playback_complete(&mut self) -> bool {
        match self.playing.take() {
            Some(buffer) => {
                // Free list has room for every buffer not on it
                let _ = self.free.push_back(buffer);
                true
            }
            None => false,
        }
    }
}

impl<const N: usize, const P: usize> Default for BufferPool<N, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize, const P: usize> fmt::Debug for BufferPool<N, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferPool")
            .field("census", &self.census())
            .finish()
    }
}

/// Producer-side view of the audio hardware.
///
/// Implementations must play buffers in submission order at a fixed sample rate.
pub trait AudioSink<const N: usize> {
    /// Takes a free buffer, or `WouldBlock` if all are queued or playing.
    fn try_take(&mut self) -> nb::Result<SampleBuffer<N>, Error>;

    /// Queues a filled buffer for playback.
    fn submit(&mut self, buffer: SampleBuffer<N>) -> Result<(), Error>;

    /// Returns an unused buffer to the free list.
    fn release(&mut self, buffer: SampleBuffer<N>) -> Result<(), Error>;
}

impl<const N: usize, const P: usize> AudioSink<N> for BufferPool<N, P> {
    fn try_take(&mut self) -> nb::Result<SampleBuffer<N>, Error> {
        self.take_free().ok_or(nb::Error::WouldBlock)
    }

    fn submit(&mut self, buffer: SampleBuffer<N>) -> Result<(), Error> {
        Ok(BufferPool::submit(self, buffer)?)
    }

    fn release(&mut self, buffer: SampleBuffer<N>) -> Result<(), Error> {
        Ok(BufferPool::release(self, buffer)?)
    }
}

/// Outcome of a [`stream`] run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct Streamed {
    /// Buffers submitted to the sink.
    pub buffers: usize,
    /// Samples taken from the source (padding excluded).
    pub samples: u64,
    /// `true` if the run stopped on cancellation rather than exhaustion.
    pub cancelled: bool,
}

/// Streams `source` through `sink` until it is exhausted or `cancel` is set.
///
/// Each iteration waits for a free buffer (bounded by
/// [`Config::starvation_timeout_us`]), fills it, and submits it. The last buffer
/// is padded with the idle level. `cancel` is checked between buffers only, so
/// the sink is never left with a half-written buffer.
///
/// On error, buffers already submitted are left to play out.
pub fn stream<const N: usize, S, K, D>(
    source: S,
    sink: &mut K,
    delay: &mut D,
    config: &Config,
    cancel: Option<&AtomicBool>,
) -> Result<Streamed, Error>
where
    S: Iterator<Item = u16>,
    K: AudioSink<N>,
    D: DelayNs,
{
    let mut source: Peekable<S> = source.peekable();
    let mut done = Streamed::default();

    while source.peek().is_some() {
        if cancel.is_some_and(|c| c.load(Ordering::Relaxed)) {
            debug!("stream cancelled after {} buffers", done.buffers);
            done.cancelled = true;
            break;
        }

        let mut buffer = wait::acquire::<N, K, D>(sink, delay, config)?;
        let filled = buffer.fill_from(&mut source);
        sink.submit(buffer)?;

        done.buffers += 1;
        done.samples += filled as u64;
        trace!("submitted buffer {} ({} samples)", done.buffers, filled);
    }
    Ok(done)
}
