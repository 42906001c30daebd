//! # aprs-afsk
//!
//! A portable, no_std Rust encoder that turns APRS position reports into
//! Bell 202 AFSK audio, played as PWM duty-cycle samples through a DMA-fed
//! buffer pool. Feed the PWM output (low-pass filtered) into a radio's
//! microphone input and other stations receive a standard AX.25 packet.
//!
//! The transmit chain:
//! - [`aprs`] renders the position report into an information field
//! - [`frame`] wraps it in an AX.25 UI frame with its CRC-16/X.25 FCS
//! - [`encoding`] adds flags, bit stuffing and NRZI, lazily
//! - [`afsk`] synthesises phase-continuous mark/space tones
//! - [`pipeline`] moves fixed buffers between the producer and the DMA interrupt
//!
//! ## Crate features
//! | Feature      | Description |
//! |--------------|-------------|
//! | `std`        | Disables `#![no_std]` and enables a host `critical-section` implementation |
//! | `log`        | Uses `log` logging |
//! | `defmt-0-3`  | Uses `defmt` logging and derives `defmt::Format` on public types |
//!
//! ## Usage
//!
//! ```rust,ignore
//! use aprs_afsk::{Beacon, Config, Transmitter};
//!
//! fn start_dma(samples: &[u16]) {
//!     // point the PWM DMA channel at `samples` and enable it
//! }
//!
//! let pool = aprs_afsk::init(start_dma)?;
//! let mut tx: Transmitter<_, _, { aprs_afsk::consts::SAMPLES_PER_BUFFER }> =
//!     Transmitter::new(pool, delay, Config::default());
//!
//! tx.send_aprs(&beacon, 128);
//! ```
//!
//! And from the DMA completion interrupt:
//!
//! ```rust,ignore
//! #[interrupt]
//! fn DMA_IRQ_0() {
//!     aprs_afsk::on_dma_complete();
//! }
//! ```
//!
//! Firmware that wants a different pool geometry can declare its own with
//! [`init_audio_pool!`], [`setup_audio_pool!`] and [`audio_dma_irq!`].
//!
//! ## Integration Notes
//!
//! - Submitting to an idle output starts it; the completion interrupt keeps it
//!   running while buffers remain queued
//! - The producer's only blocking point is waiting for a free buffer; the wait
//!   is bounded by [`Config::starvation_timeout_us`]
//! - Buffers must be played in submission order at a fixed sample rate
//! - Only one producer should use the global pool at a time
//!
//! --
//! Designed for `#![no_std]` use in resource-constrained embedded environments.

#![deny(
    bad_style,
    improper_ctypes,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    unconditional_recursion,
    while_true,
    missing_debug_implementations,
    unused_extern_crates,
    unused_import_braces
)]
#![warn(
    unused,
    dead_code,
    missing_docs,
    trivial_casts,
    unused_qualifications,
    unused_results
)]
#![cfg_attr(not(any(test, feature = "std")), no_std)]

pub use critical_section;
pub use heapless;

#[macro_use]
mod fmt;

pub mod address;
pub mod afsk;
pub mod aprs;
pub mod config;
pub mod consts;
pub mod crc;
pub mod dds;
pub mod driver;
pub mod encoding;
pub mod error;
pub mod frame;
pub mod pipeline;
pub mod tone;

pub use address::{CallSign, PathAddress};
pub use config::Config;
pub use driver::{Beacon, Transmitter, TxMode};
pub use error::{Error, ResourceError, ValidationError};
pub use frame::Frame;
pub use pipeline::isr::{DmaStart, SharedPool};
pub use pipeline::{AudioSink, BufferPool, Census, SampleBuffer, Streamed};

use consts::{BUFFER_COUNT, SAMPLES_PER_BUFFER};
use pipeline::isr::{
    GlobalPool, global_audio_dma_irq, global_audio_pool_init, global_audio_pool_setup,
};

/// The default pool geometry.
pub type AudioPool = SharedPool<SAMPLES_PER_BUFFER, BUFFER_COUNT>;

static AUDIO_POOL: GlobalPool<SAMPLES_PER_BUFFER, BUFFER_COUNT> =
    global_audio_pool_init::<SAMPLES_PER_BUFFER, BUFFER_COUNT>();

/// Allocates the process-wide audio buffer pool and returns its producer handle.
///
/// `start` points the DMA engine at a buffer and starts playback. Call once,
/// before enabling the DMA interrupt. The pool lives for the rest of the
/// program.
///
/// # Errors
/// * [`ResourceError::AlreadyInitialized`] on a second call
pub fn init(start: DmaStart) -> Result<AudioPool, Error> {
    global_audio_pool_setup(&AUDIO_POOL, start)
}

/// Services the DMA completion interrupt for the pool created by [`init`].
///
/// Retires the buffer that finished and starts the next one. Returns `false`
/// when nothing is queued and the output should idle.
pub fn on_dma_complete() -> bool {
    global_audio_dma_irq(&AUDIO_POOL)
}
