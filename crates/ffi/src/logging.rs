use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Installs the global subscriber. `RUST_LOG` takes precedence over
/// `verbosity`. Later calls are ignored.
pub fn init_logging(verbosity: u8) {
	// 0 = errors only
	// 1 = info for the embedding layer, warn elsewhere
	// 2+ = debug for everything, trace for the embedding layer
	let filter = match verbosity {
		0 => "error",
		1 => "warn,cef_host=info",
		_ => "debug,cef_host=trace",
	};

	let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

	let stderr = std::io::stderr.with_max_level(tracing::Level::TRACE);

	let _ = tracing_subscriber::fmt()
		.with_env_filter(env_filter)
		.with_writer(stderr)
		.with_target(true)
		.with_level(true)
		.compact()
		.try_init();
}
