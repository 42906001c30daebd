//! APRS transmitter driver.
//!
//! This module provides the [`Transmitter`] struct, which turns a [`Beacon`] into
//! a Bell 202 AFSK waveform and streams it through an [`AudioSink`]. It also
//! plays plain calibration tones through the same pipeline.
//!
//! A transmission runs in three stages:
//!
//! 1. **Validate and assemble**: call signs, path, position and symbol are
//!    checked and the AX.25 UI frame is built with its FCS. Nothing touches
//!    the sink until this succeeds.
//! 2. **Line encode**: the frame is wrapped in flags, bit-stuffed and NRZI
//!    encoded lazily (see [`crate::encoding`]).
//! 3. **Modulate and stream**: [`AfskModulator`] produces PWM samples which
//!    [`stream`] moves into buffers, waiting on the sink as needed.
//!
//! ## Example
//!
//! ```rust,ignore
//! use aprs_afsk::driver::{Beacon, Transmitter};
//!
//! let pool = aprs_afsk::init(start_dma)?;
//! let mut tx: Transmitter<_, _, 256> = Transmitter::new(pool, delay, Config::default());
//! let beacon = Beacon {
//!     source: "N0CALL",
//!     destination: "APRS",
//!     path: ["WIDE1-1", "WIDE2-1"],
//!     message: None,
//!     latitude: 51.5074,
//!     longitude: -0.1278,
//!     altitude_m: Some(35.0),
//!     symbol_table: '/',
//!     symbol_code: '-',
//! };
//! if !tx.send_aprs(&beacon, 128) {
//!     // retry later
//! }
//! ```
//!
//! Retry policy is the caller's concern; the driver never retries.

use core::sync::atomic::AtomicBool;

use embedded_hal::delay::DelayNs;
use heapless::Vec;

use crate::address::{CallSign, PathAddress};
use crate::afsk::AfskModulator;
use crate::aprs::PositionReport;
use crate::config::Config;
use crate::consts::MAX_PATH_LEN;
use crate::dds::Volume;
use crate::encoding::line_levels;
use crate::error::{Error, ValidationError};
use crate::frame::Frame;
use crate::pipeline::{AudioSink, Streamed, stream};
use crate::tone::{Duration, ToneGenerator};

/// Operational mode of a [`Transmitter`].
///
/// Updated at the start and end of every transmission, so it reads
/// [`Idle`](TxMode::Idle) whenever control is back with the caller.
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum TxMode {
    /// Nothing is being produced.
    #[default]
    Idle,
    /// An AFSK frame is being streamed.
    Tx,
    /// A calibration tone is being streamed.
    Calibrate,
}

/// Everything needed to send one position report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Beacon<'a> {
    /// Sending station, `BASE` or `BASE-SSID`.
    pub source: &'a str,
    /// Destination (tocall), e.g. `APRS`.
    pub destination: &'a str,
    /// Digipeater path. An empty string means "no entry".
    pub path: [&'a str; MAX_PATH_LEN],
    /// Optional free-text comment.
    pub message: Option<&'a str>,
    /// Latitude in decimal degrees, north positive.
    pub latitude: f64,
    /// Longitude in decimal degrees, east positive.
    pub longitude: f64,
    /// Altitude in meters.
    pub altitude_m: Option<f64>,
    /// Symbol table identifier.
    pub symbol_table: char,
    /// Symbol code.
    pub symbol_code: char,
}

/// Validates `beacon` and assembles its UI frame, FCS included.
///
/// Performs every check a transmission needs, so a frame returned here can
/// always be streamed.
pub fn prepare_frame(beacon: &Beacon<'_>) -> Result<Frame, Error> {
    let source = CallSign::parse(beacon.source)?;
    let destination = CallSign::parse(beacon.destination)?;

    let mut path: Vec<PathAddress, MAX_PATH_LEN> = Vec::new();
    for entry in beacon.path {
        if let Some(address) = PathAddress::parse(entry)? {
            path.push(address)
                .map_err(|_| ValidationError::TooManyPathEntries)?;
        }
    }

    let info = PositionReport {
        latitude: beacon.latitude,
        longitude: beacon.longitude,
        altitude_m: beacon.altitude_m,
        symbol_table: beacon.symbol_table,
        symbol_code: beacon.symbol_code,
        comment: beacon.message,
    }
    .encode()?;

    let frame = Frame::ui(&destination, &source, &path, &info)?;
    debug!(
        "frame {} > {} assembled: {} bytes",
        beacon.source,
        beacon.destination,
        frame.len()
    );
    Ok(frame)
}

/// An APRS transmitter streaming AFSK audio into an [`AudioSink`].
///
/// ## Type Parameters
///
/// - `K`: The producer side of the audio hardware, usually
///   [`SharedPool`](crate::pipeline::isr::SharedPool)
/// - `D`: A delay provider implementing [`DelayNs`], used while waiting for buffers
/// - `N`: Samples per buffer
///
/// ## Notes
///
/// - Calls are synchronous: they return once the last buffer is submitted, not
///   once it has finished playing.
/// - On a resource failure, buffers already submitted are left to play out.
#[derive(Debug)]
pub struct Transmitter<K, D, const N: usize>
where
    K: AudioSink<N>,
    D: DelayNs,
{
    /// The current mode of the transmitter
    pub mode: TxMode,
    sink: K,
    delay: D,
    config: Config,

    /// Counter of transmissions fully handed to the sink.
    pub tx_good: u16,

    /// Counter of transmissions rejected or aborted, for any reason.
    pub tx_bad: u16,
}

impl<K, D, const N: usize> Transmitter<K, D, N>
where
    K: AudioSink<N>,
    D: DelayNs,
{
    /// Creates a new `Transmitter`.
    ///
    /// # Arguments
    /// - `sink`: Producer-side handle to the buffer pool.
    /// - `delay`: Delay provider for the bounded buffer wait.
    /// - `config`: Sample rate, flag padding and wait bounds.
    pub fn new(sink: K, delay: D, config: Config) -> Self {
        Self {
            mode: TxMode::Idle,
            sink,
            delay,
            config,
            tx_good: 0,
            tx_bad: 0,
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Borrows the sink.
    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Mutably borrows the sink.
    pub fn sink_mut(&mut self) -> &mut K {
        &mut self.sink
    }

    /// Releases the sink and the delay provider.
    pub fn release(self) -> (K, D) {
        (self.sink, self.delay)
    }

    /// Sends one position report.
    ///
    /// # Arguments
    /// - `beacon`: The report and its addressing.
    /// - `volume`: Output amplitude, `0..=256`.
    ///
    /// # Returns
    /// Buffer and sample counts of the transmission.
    ///
    /// # Errors
    /// - [`Error::Validation`] before anything reaches the sink
    /// - [`Error::Resource`] if the pipeline starves mid-transmission
    pub fn try_send_aprs(&mut self, beacon: &Beacon<'_>, volume: u16) -> Result<Streamed, Error> {
        let volume = Volume::new(volume)?;
        self.config.validate()?;
        let frame = prepare_frame(beacon)?;

        let levels = line_levels(
            frame.as_bytes(),
            self.config.head_flags,
            self.config.tail_flags,
        );
        let modulator = AfskModulator::new(levels, self.config.sample_rate, volume)?;

        self.mode = TxMode::Tx;
        info!("transmitting {} byte frame", frame.len());
        let result = stream::<N, _, _, _>(
            modulator,
            &mut self.sink,
            &mut self.delay,
            &self.config,
            None,
        );
        self.mode = TxMode::Idle;

        let done = result?;
        info!(
            "transmission done: {} buffers, {} samples",
            done.buffers, done.samples
        );
        Ok(done)
    }

    /// Sends one position report, reporting only success.
    ///
    /// Updates [`tx_good`](Self::tx_good) or [`tx_bad`](Self::tx_bad) and logs
    /// the reason for a failure.
    pub fn send_aprs(&mut self, beacon: &Beacon<'_>, volume: u16) -> bool {
        match self.try_send_aprs(beacon, volume) {
            Ok(_) => {
                self.tx_good = self.tx_good.wrapping_add(1);
                true
            }
            Err(e) => {
                self.tx_bad = self.tx_bad.wrapping_add(1);
                if e.is_validation() {
                    warn!("report rejected: {}", e);
                } else {
                    error!("transmission failed: {}", e);
                }
                false
            }
        }
    }

    /// Plays a pure sine tone for transmitter deviation adjustment.
    ///
    /// A negative `duration_ms` plays until `cancel` is set. `cancel` is
    /// checked between buffers.
    ///
    /// # Errors
    /// - [`ValidationError::InvalidVolume`], [`ValidationError::InvalidFrequency`]
    ///   or [`ValidationError::InvalidSampleRate`] for bad arguments
    /// - [`Error::Resource`] if the pipeline starves
    pub fn try_play_sine_wave(
        &mut self,
        freq_hz: u32,
        sample_rate_hz: u32,
        volume: u16,
        duration_ms: i32,
        cancel: Option<&AtomicBool>,
    ) -> Result<Streamed, Error> {
        let volume = Volume::new(volume)?;
        let duration = Duration::from_millis(duration_ms, sample_rate_hz);
        let tone = ToneGenerator::new(freq_hz, sample_rate_hz, volume, duration)?;

        self.mode = TxMode::Calibrate;
        info!("calibration tone {} Hz at {} Hz", freq_hz, sample_rate_hz);
        let result = stream::<N, _, _, _>(tone, &mut self.sink, &mut self.delay, &self.config, cancel);
        self.mode = TxMode::Idle;

        let done = result?;
        if done.cancelled {
            info!("calibration tone cancelled after {} samples", done.samples);
        }
        Ok(done)
    }

    /// Plays a calibration tone, logging any failure.
    pub fn play_sine_wave(
        &mut self,
        freq_hz: u32,
        sample_rate_hz: u32,
        volume: u16,
        duration_ms: i32,
        cancel: Option<&AtomicBool>,
    ) {
        if let Err(e) = self.try_play_sine_wave(freq_hz, sample_rate_hz, volume, duration_ms, cancel)
        {
            error!("calibration tone failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{PWM_IDLE_LEVEL, PWM_MAX_LEVEL};
    use crate::crc;
    use crate::encoding::{destuff, nrzi_decode};
    use crate::error::ResourceError;
    use crate::pipeline::isr::{
        GlobalPool, SharedPool, global_audio_dma_irq, global_audio_pool_init,
        global_audio_pool_setup,
    };
    use crate::pipeline::tests::{CancelAfter, SimulatedDac};
    use core::sync::atomic::{AtomicUsize, Ordering};
    use embedded_hal_mock::eh1::delay::NoopDelay;

    static HW_POOL: GlobalPool<256, 3> = global_audio_pool_init::<256, 3>();
    static HW_STARTS: AtomicUsize = AtomicUsize::new(0);
    static HW_PLAYED: AtomicUsize = AtomicUsize::new(0);

    fn hw_start(samples: &[u16]) {
        let _ = HW_STARTS.fetch_add(1, Ordering::SeqCst);
        let _ = HW_PLAYED.fetch_add(samples.len(), Ordering::SeqCst);
    }

    /// Simulated time in which the hardware only advances through the DMA
    /// completion interrupt, fired once a started buffer has played for a
    /// full buffer interval.
    struct DmaClock {
        now_ns: u64,
        buffer_ns: u64,
        playing_since: Option<u64>,
        completed: usize,
        irqs: usize,
    }

    impl DmaClock {
        fn new(buffer_us: u32) -> Self {
            Self {
                now_ns: 0,
                buffer_ns: buffer_us as u64 * 1_000,
                playing_since: None,
                completed: 0,
                irqs: 0,
            }
        }

        fn run_hardware(&mut self) {
            loop {
                if HW_STARTS.load(Ordering::SeqCst) == self.completed {
                    self.playing_since = None;
                    return;
                }
                let since = *self.playing_since.get_or_insert(self.now_ns);
                if self.now_ns - since < self.buffer_ns {
                    return;
                }
                self.completed += 1;
                self.irqs += 1;
                let _ = global_audio_dma_irq(&HW_POOL);
                self.playing_since = Some(since + self.buffer_ns);
            }
        }
    }

    impl DelayNs for DmaClock {
        fn delay_ns(&mut self, ns: u32) {
            self.run_hardware();
            self.now_ns += ns as u64;
            self.run_hardware();
        }
    }

    type TestTransmitter = Transmitter<SimulatedDac<256, 3>, NoopDelay, 256>;

    fn transmitter() -> TestTransmitter {
        Transmitter::new(SimulatedDac::new(), NoopDelay::new(), Config::default())
    }

    fn london() -> Beacon<'static> {
        Beacon {
            source: "N0CALL",
            destination: "APRS",
            path: ["WIDE1-1", "WIDE2-1"],
            message: None,
            latitude: 51.5074,
            longitude: -0.1278,
            altitude_m: Some(35.0),
            symbol_table: '/',
            symbol_code: '-',
        }
    }

    #[test]
    fn test_transmitter_initialization() {
        let tx = transmitter();
        assert_eq!(tx.mode, TxMode::Idle);
        assert_eq!(tx.tx_good, 0);
        assert_eq!(tx.tx_bad, 0);
        assert_eq!(tx.sink().pool.census().free, 3);
    }

    #[test]
    fn test_prepare_frame_position_report() {
        let frame = prepare_frame(&london()).unwrap();
        let info = core::str::from_utf8(frame.info()).unwrap();

        assert!(info.starts_with('!'));
        assert!(info.contains("5130.44N"));
        assert!(info.contains("00007.67W"));
        assert!(info.contains("/A=000114"));
        assert_eq!(info, "!5130.44N/00007.67W-/A=000114");
        assert_eq!(frame.fcs(), crc::fcs(frame.body()));
        assert!(crc::check(frame.as_bytes()));
    }

    #[test]
    fn test_prepare_frame_without_message_has_no_comment() {
        let frame = prepare_frame(&london()).unwrap();
        let info = core::str::from_utf8(frame.info()).unwrap();
        assert!(info.ends_with("/A=000114"));

        let beacon = Beacon {
            altitude_m: None,
            ..london()
        };
        let frame = prepare_frame(&beacon).unwrap();
        assert_eq!(frame.info(), b"!5130.44N/00007.67W-");
    }

    #[test]
    fn test_prepare_frame_skips_empty_path_entries() {
        let full = prepare_frame(&london()).unwrap();
        let beacon = Beacon {
            path: ["WIDE1-1", ""],
            ..london()
        };
        let short = prepare_frame(&beacon).unwrap();
        assert_eq!(full.len() - short.len(), 7);
    }

    #[test]
    fn test_send_aprs_streams_frame() {
        let mut tx = transmitter();
        assert!(tx.send_aprs(&london(), 128));
        assert_eq!(tx.mode, TxMode::Idle);
        assert_eq!(tx.tx_good, 1);
        assert_eq!(tx.tx_bad, 0);

        tx.sink_mut().drain();
        let dac = tx.sink();
        assert!(!dac.played.is_empty());
        assert!(dac.played.iter().all(|&s| s <= PWM_MAX_LEVEL));
        assert!(dac.census_log.iter().all(|c| c.total() == 3));
        assert_eq!(dac.pool.census().free, 3);
    }

    #[test]
    fn test_played_samples_match_modulated_frame() {
        let mut tx = transmitter();
        let done = tx.try_send_aprs(&london(), 128).unwrap();
        tx.sink_mut().drain();

        let frame = prepare_frame(&london()).unwrap();
        let config = Config::default();
        let expected: std::vec::Vec<u16> = AfskModulator::new(
            line_levels(frame.as_bytes(), config.head_flags, config.tail_flags),
            config.sample_rate,
            Volume::new(128).unwrap(),
        )
        .unwrap()
        .collect();

        assert_eq!(done.samples, expected.len() as u64);
        let played = &tx.sink().played;
        assert_eq!(&played[..expected.len()], &expected[..]);
        assert!(played[expected.len()..].iter().all(|&s| s == PWM_IDLE_LEVEL));
    }

    #[test]
    fn test_line_levels_recover_frame() {
        let frame = prepare_frame(&london()).unwrap();
        let line: std::vec::Vec<bool> =
            nrzi_decode(line_levels(frame.as_bytes(), 1, 1), true).collect();
        let pack = |bits: &[bool]| -> std::vec::Vec<u8> {
            bits.chunks(8)
                .map(|byte| {
                    byte.iter()
                        .enumerate()
                        .fold(0u8, |acc, (i, &b)| acc | (u8::from(b) << i))
                })
                .collect()
        };

        let (head, rest) = line.split_at(8);
        let (data, tail) = rest.split_at(rest.len() - 8);
        assert_eq!(pack(head), [0x7e]);
        assert_eq!(pack(tail), [0x7e]);

        let data: std::vec::Vec<bool> = destuff(data.iter().copied()).collect();
        assert_eq!(pack(&data), frame.as_bytes());
    }

    #[test]
    fn test_long_call_sign_fails_without_touching_pool() {
        let mut tx = transmitter();
        let beacon = Beacon {
            source: "N0CALLX",
            ..london()
        };
        assert!(!tx.send_aprs(&beacon, 128));
        assert_eq!(tx.tx_bad, 1);
        assert_eq!(tx.tx_good, 0);
        assert!(tx.sink().census_log.is_empty());
        assert_eq!(
            tx.try_send_aprs(&beacon, 128).unwrap_err(),
            Error::Validation(ValidationError::CallSignLength)
        );
    }

    #[test]
    fn test_invalid_volume_rejected() {
        let mut tx = transmitter();
        assert_eq!(
            tx.try_send_aprs(&london(), 257).unwrap_err(),
            Error::Validation(ValidationError::InvalidVolume)
        );
        assert!(tx.sink().census_log.is_empty());
    }

    #[test]
    fn test_starved_sink_reports_failure() {
        let mut tx = transmitter();
        tx.sink_mut().stalled = true;
        assert_eq!(
            tx.try_send_aprs(&london(), 128).unwrap_err(),
            Error::Resource(ResourceError::Starved)
        );
        assert_eq!(tx.mode, TxMode::Idle);
        assert!(!tx.send_aprs(&london(), 128));
        assert_eq!(tx.tx_bad, 1);
    }

    #[test]
    fn test_calibration_tone_sample_count() {
        let mut tx = transmitter();
        let done = tx.try_play_sine_wave(2200, 22050, 256, 1000, None).unwrap();
        assert_eq!(done.samples, 22050);
        assert!(!done.cancelled);
        assert_eq!(tx.mode, TxMode::Idle);

        tx.sink_mut().drain();
        let played = &tx.sink().played;
        assert!(played.len() >= 22050);
        assert!(played.len() <= 22050 + 256);
        assert!(played.iter().all(|&s| s <= PWM_MAX_LEVEL));
        assert!(played.iter().any(|&s| s == PWM_MAX_LEVEL));
    }

    #[test]
    fn test_unbounded_tone_stops_on_cancel() {
        let mut tx = transmitter();
        let cancel = AtomicBool::new(true);
        let done = tx
            .try_play_sine_wave(1200, 22050, 100, -1, Some(&cancel))
            .unwrap();
        assert!(done.cancelled);
        assert_eq!(done.buffers, 0);
    }

    #[test]
    fn test_play_sine_wave_swallows_errors() {
        let mut tx = transmitter();
        tx.play_sine_wave(0, 22050, 100, 10, None);
        assert!(tx.sink().census_log.is_empty());
        assert_eq!(tx.mode, TxMode::Idle);
    }

    #[test]
    fn test_send_from_idle_hardware_with_interrupt_only_playback() {
        let pool = global_audio_pool_setup(&HW_POOL, hw_start).unwrap();
        let config = Config::default();
        let clock = DmaClock::new(config.buffer_interval_us(256));
        let mut tx: Transmitter<SharedPool<256, 3>, DmaClock, 256> =
            Transmitter::new(pool, clock, config);

        let done = tx.try_send_aprs(&london(), 128).unwrap();
        assert!(done.buffers > 3);
        assert_eq!(tx.mode, TxMode::Idle);

        let (pool, mut clock) = tx.release();
        while pool.is_busy().unwrap() {
            clock.delay_us(1_000);
        }
        assert_eq!(HW_STARTS.load(Ordering::SeqCst), done.buffers);
        assert_eq!(HW_PLAYED.load(Ordering::SeqCst), done.buffers * 256);
        assert_eq!(clock.irqs, done.buffers);
        assert_eq!(pool.census().unwrap().free, 3);
    }

    #[test]
    fn test_unbounded_tone_cancelled_mid_stream() {
        let cancel = AtomicBool::new(false);
        let mut tx: Transmitter<CancelAfter<'_, 256, 3>, NoopDelay, 256> = Transmitter::new(
            CancelAfter::new(&cancel, 3),
            NoopDelay::new(),
            Config::default(),
        );
        let done = tx
            .try_play_sine_wave(1200, 22050, 100, -1, Some(&cancel))
            .unwrap();
        assert!(done.cancelled);
        assert_eq!(done.buffers, 3);
        assert_eq!(done.samples, 3 * 256);
        assert_eq!(tx.mode, TxMode::Idle);

        tx.sink_mut().dac.drain();
        assert_eq!(tx.sink().dac.played.len(), 3 * 256);
        assert_eq!(tx.sink().dac.pool.census().free, 3);
    }
}
