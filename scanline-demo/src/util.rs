use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    // RUST_LOG=scanline_core=debug,scanline_demo=trace
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .compact()
        .try_init();
}

/// Report panics through tracing before unwinding starts.
///
/// Unwinding still drops the surface, so the console comes back to text
/// mode after this has logged.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let message = match info.payload().downcast_ref::<&str>() {
            Some(s) => (*s).to_string(),
            None => info
                .payload()
                .downcast_ref::<String>()
                .cloned()
                .unwrap_or_else(|| "opaque panic payload".to_string()),
        };
        let thread = std::thread::current();
        let thread = thread.name().unwrap_or("unnamed");

        match info.location() {
            Some(at) => tracing::error!(thread, file = at.file(), line = at.line(), "demo panicked: {message}"),
            None => tracing::error!(thread, "demo panicked: {message}"),
        }
    }));
}
