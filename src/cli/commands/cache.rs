use clap::{Arg, Command};

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new("cache-url")
            .long("cache-url")
            .help("Session cache backend: redis://host:port for Redis, memory:// for in-process. Omit to disable caching")
            .env("PORDISTO_CACHE_URL"),
    )
}
