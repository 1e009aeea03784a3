/// Initializes `env_logger` for the binary and for [`crate::app::Application`].
///
/// Verbose runs log per-entry scanning decisions; otherwise only warnings such as
/// skipped files are shown.
pub fn init_logger(verbose: bool) {
    let _ = env_logger::Builder::new()
        .filter_level(if verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        })
        .try_init();
}
