use embedded_hal::delay::DelayNs;

use super::{AudioSink, SampleBuffer};
use crate::config::Config;
use crate::error::{Error, ResourceError};

/// Waits for a free buffer, polling the sink every `config.poll_interval_us`.
///
/// This is the producer's only suspension point. In steady state the hardware
/// returns a buffer once per playback interval, so the wait is short; if
/// nothing comes back within `config.starvation_timeout_us` the hardware is
/// considered starved.
///
/// # Arguments
/// - `sink`: The producer-side view of the audio hardware.
/// - `delay`: A delay provider implementing `DelayNs`, typically from the HAL.
/// - `config`: Poll interval and starvation timeout.
///
/// # Errors
/// - [`ResourceError::Starved`] when the timeout elapses
/// - any error the sink reports other than `WouldBlock`
pub fn acquire<const N: usize, K, D>(
    sink: &mut K,
    delay: &mut D,
    config: &Config,
) -> Result<SampleBuffer<N>, Error>
where
    K: AudioSink<N>,
    D: DelayNs,
{
    let poll_us = config.poll_interval_us.max(1);
    let mut waited_us: u32 = 0;
    loop {
        match sink.try_take() {
            Ok(buffer) => return Ok(buffer),
            Err(nb::Error::Other(e)) => return Err(e),
            Err(nb::Error::WouldBlock) => {
                if waited_us >= config.starvation_timeout_us {
                    warn!("no free audio buffer after {} us", waited_us);
                    return Err(ResourceError::Starved.into());
                }
                delay.delay_us(poll_us);
                waited_us = waited_us.saturating_add(poll_us);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::BufferPool;
    use embedded_hal_mock::eh1::delay::NoopDelay;

    #[test]
    fn test_acquire_returns_free_buffer_immediately() {
        let mut pool: BufferPool<4, 1> = BufferPool::new();
        let buffer = acquire::<4, _, _>(&mut pool, &mut NoopDelay::new(), &Config::default());
        assert!(buffer.is_ok());
        assert_eq!(pool.census().filling, 1);
    }

    #[test]
    fn test_acquire_times_out() {
        let mut pool: BufferPool<4, 1> = BufferPool::new();
        let _held = pool.take_free().unwrap();
        let config = Config {
            poll_interval_us: 10,
            starvation_timeout_us: 100,
            ..Config::default()
        };
        let err = acquire::<4, _, _>(&mut pool, &mut NoopDelay::new(), &config).unwrap_err();
        assert_eq!(err, Error::Resource(ResourceError::Starved));
    }
}
