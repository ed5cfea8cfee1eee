use {
    crate::Config,
    std::{io::IsTerminal, sync::Once},
    time::macros::format_description,
    tracing_subscriber::{
        EnvFilter,
        Layer,
        fmt::time::UtcTime,
        prelude::*,
        util::SubscriberInitExt,
    },
};

/// Initializes tracing setup that is shared between the binaries. All events
/// get written to stderr so stdout stays free for the program's output.
/// `env_filter` has similar syntax to env_logger. It is documented at
/// https://docs.rs/tracing-subscriber/latest/tracing_subscriber/filter/struct.EnvFilter.html
pub fn initialize(config: &Config) {
    set_tracing_subscriber(config);
}

/// Like [`initialize`], but can be called multiple times in a row. Later calls
/// are ignored.
///
/// Useful for tests.
pub fn initialize_reentrant(env_filter: &str) {
    // The tracing subscriber below is global object so initializing it again in the
    // same process by a different thread would fail.
    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        set_tracing_subscriber(&Config::default().with_env_filter(env_filter));
    });
}

fn set_tracing_subscriber(config: &Config) {
    let timer = || {
        UtcTime::new(format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z"
        ))
    };

    let fmt_layer = if config.use_json_format {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_timer(timer())
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_timer(timer())
            .with_ansi(std::io::stderr().is_terminal())
            .boxed()
    };

    let result = tracing_subscriber::registry()
        .with(EnvFilter::new(&config.env_filter))
        .with(fmt_layer)
        .try_init();
    if let Err(err) = result {
        // Only happens if a global subscriber was installed before, in which case
        // that one keeps receiving the events.
        tracing::warn!(?err, "tracing subscriber already initialized");
    }
}
