use core::cell::RefCell;

use critical_section::Mutex;

use super::{AudioSink, BufferPool, Census, SampleBuffer};
use crate::error::{Error, ResourceError};

/// Hands a buffer's samples to the DMA engine and starts playback.
///
/// Called inside a critical section, either from the producer when the
/// hardware is idle or from the DMA completion interrupt.
pub type DmaStart = fn(&[u16]);

/// A buffer pool together with the routine that starts its hardware.
pub struct DmaPool<const N: usize, const P: usize> {
    pool: BufferPool<N, P>,
    start: DmaStart,
}

impl<const N: usize, const P: usize> DmaPool<N, P> {
    /// Starts the next queued buffer if nothing is playing.
    ///
    /// Returns `true` if a buffer was started.
    fn kick(&mut self) -> bool {
        match self.pool.start_next() {
            Some(samples) => {
                (self.start)(samples);
                true
            }
            None => false,
        }
    }
}

impl<const N: usize, const P: usize> core::fmt::Debug for DmaPool<N, P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DmaPool").field("pool", &self.pool).finish()
    }
}

/// A buffer pool shared between the producer and the DMA interrupt.
pub type GlobalPool<const N: usize, const P: usize> = Mutex<RefCell<Option<DmaPool<N, P>>>>;

/// Used to initialize the global static pool for use with `critical_section`.
///
/// # Returns
/// * An empty mutex, filled in by [`global_audio_pool_setup`]
///
/// # Example
/// ```rust,ignore
/// use aprs_afsk::pipeline::isr::{GlobalPool, global_audio_pool_init};
///
/// static AUDIO_POOL: GlobalPool<256, 3> = global_audio_pool_init::<256, 3>();
/// ```
pub const fn global_audio_pool_init<const N: usize, const P: usize>() -> GlobalPool<N, P> {
    Mutex::new(RefCell::new(None))
}

/// Fills the global pool with `P` free buffers and returns the producer handle.
///
/// `start` is called whenever a buffer should begin playing: on submit while
/// the hardware is idle, and from [`global_audio_dma_irq`] while buffers
/// remain queued. Must be called once, before the DMA interrupt is enabled.
///
/// # Errors
/// * [`ResourceError::AlreadyInitialized`] on a second call
pub fn global_audio_pool_setup<const N: usize, const P: usize>(
    global_pool: &'static GlobalPool<N, P>,
    start: DmaStart,
) -> Result<SharedPool<N, P>, Error> {
    critical_section::with(|cs| {
        let mut slot = global_pool.borrow(cs).borrow_mut();
        if slot.is_some() {
            return Err(Error::from(ResourceError::AlreadyInitialized));
        }
        *slot = Some(DmaPool {
            pool: BufferPool::new(),
            start,
        });
        info!("audio pool ready: {} buffers of {} samples", P, N);
        Ok(SharedPool { pool: global_pool })
    })
}

/// Services the audio DMA completion interrupt.
///
/// Retires the buffer that just finished and starts the next queued one.
/// Returns `false` when the queue ran dry and the output should idle; the
/// next submit restarts it.
///
/// # Example
/// ```rust,ignore
/// #[interrupt]
/// fn DMA_IRQ_0() {
///     global_audio_dma_irq(&AUDIO_POOL);
/// }
/// ```
pub fn global_audio_dma_irq<const N: usize, const P: usize>(
    global_pool: &'static GlobalPool<N, P>,
) -> bool {
    critical_section::with(|cs| {
        let mut slot = global_pool.borrow(cs).borrow_mut();
        let Some(dma) = slot.as_mut() else {
            return false;
        };
        let _ = dma.pool.playback_complete();
        dma.kick()
    })
}

/// Producer handle to a global pool. Every access runs in a critical section.
#[derive(Clone, Copy)]
pub struct SharedPool<const N: usize, const P: usize> {
    pool: &'static GlobalPool<N, P>,
}

impl<const N: usize, const P: usize> core::fmt::Debug for SharedPool<N, P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SharedPool")
            .field("capacity", &N)
            .field("buffers", &P)
            .finish()
    }
}

impl<const N: usize, const P: usize> SharedPool<N, P> {
    fn with<R>(&self, f: impl FnOnce(&mut DmaPool<N, P>) -> R) -> Result<R, Error> {
        critical_section::with(|cs| match self.pool.borrow(cs).borrow_mut().as_mut() {
            Some(dma) => Ok(f(dma)),
            None => Err(Error::from(ResourceError::NotInitialized)),
        })
    }

    /// Current ownership split.
    pub fn census(&self) -> Result<Census, Error> {
        self.with(|dma| dma.pool.census())
    }

    /// `true` while buffers are queued or playing.
    pub fn is_busy(&self) -> Result<bool, Error> {
        self.with(|dma| dma.pool.is_busy())
    }
}

impl<const N: usize, const P: usize> AudioSink<N> for SharedPool<N, P> {
    fn try_take(&mut self) -> nb::Result<SampleBuffer<N>, Error> {
        self.with(|dma| dma.pool.take_free())?
            .ok_or(nb::Error::WouldBlock)
    }

    /// Queues `buffer` and starts the hardware if it is idle.
    fn submit(&mut self, buffer: SampleBuffer<N>) -> Result<(), Error> {
        self.with(|dma| -> Result<(), Error> {
            dma.pool.submit(buffer)?;
            if dma.kick() {
                trace!("audio output started");
            }
            Ok(())
        })?
    }

    fn release(&mut self, buffer: SampleBuffer<N>) -> Result<(), Error> {
        Ok(self.with(|dma| dma.pool.release(buffer))??)
    }
}
