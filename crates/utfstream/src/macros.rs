/// Emit a `tracing` event at debug level when the `tracing` feature is on.
/// Expands to nothing otherwise, so the arguments are not evaluated.
macro_rules! debug_event {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::debug!(target: "utfstream", $($arg)*);
    };
}
