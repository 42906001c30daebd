/// Declares a static global `AUDIO_POOL` protected by a `critical_section` mutex.
///
/// Both the producer (via [`setup_audio_pool!`]) and the DMA interrupt (via
/// [`audio_dma_irq!`]) refer to it by name.
///
/// # Arguments
/// - `$n`: Samples per buffer
/// - `$p`: Number of buffers
///
/// # Example
/// ```rust,ignore
/// init_audio_pool!(256, 3);
/// ```
#[macro_export]
macro_rules! init_audio_pool {
    ( $n:expr, $p:expr ) => {
        pub static AUDIO_POOL: $crate::pipeline::isr::GlobalPool<{ $n }, { $p }> =
            $crate::pipeline::isr::global_audio_pool_init::<{ $n }, { $p }>();
    };
}

/// Fills the global `AUDIO_POOL` and evaluates to the producer handle.
///
/// # Arguments
/// - `$start`: A `fn(&[u16])` that points the DMA engine at a buffer and starts it
///
/// # Example
/// ```rust,ignore
/// fn start_dma(samples: &[u16]) {
///     // program and enable the PWM DMA channel
/// }
///
/// let pool = setup_audio_pool!(start_dma)?;
/// ```
///
/// # Notes
/// - Requires `init_audio_pool!` to have been used earlier.
#[macro_export]
macro_rules! setup_audio_pool {
    ( $start:expr ) => {
        $crate::pipeline::isr::global_audio_pool_setup(&AUDIO_POOL, $start)
    };
}

/// Retires the finished buffer of `AUDIO_POOL` and starts the next one.
///
/// # Example
/// ```rust,ignore
/// #[interrupt]
/// fn DMA_IRQ_0() {
///     audio_dma_irq!();
/// }
/// ```
///
/// # Notes
/// - Safe to call before setup; it does nothing until the pool exists.
#[macro_export]
macro_rules! audio_dma_irq {
    () => {
        $crate::pipeline::isr::global_audio_dma_irq(&AUDIO_POOL)
    };
}
