use log::LevelFilter;

/// Maps a `-v` count to a log level: warnings by default, then info, debug
/// and trace.
pub fn level_for_verbosity(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

pub fn init_cli_logging(verbose: u8) {
    env_logger::Builder::from_default_env()
        .filter_level(level_for_verbosity(verbose))
        .format_timestamp(None)
        .format_target(false)
        .init();
}
