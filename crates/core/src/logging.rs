use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Installs a stderr subscriber for embedding processes that have none.
///
/// The core itself only emits `tracing` events; calling this is optional
/// and must happen at most once per process.
pub fn init_logging(verbosity: u8) {
	// 0 = warnings only
	// 1 (-v) = info for authflow
	// 2+ (-vv) = debug/trace for everything
	let filter = match verbosity {
		0 => "warn",
		1 => "warn,authflow=info",
		_ => "debug",
	};

	let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

	let stderr = std::io::stderr.with_max_level(tracing::Level::TRACE);

	tracing_subscriber::fmt()
		.with_env_filter(env_filter)
		.with_writer(stderr)
		.with_target(true)
		.with_level(true)
		.compact()
		.init();
}
