//! Utilities.
use std::io::Write;

use log::LevelFilter;

/// Log to stderr, one `timestamp level target message` line per record.
///
/// `RUST_LOG` overrides `level` when set.
pub fn configure_logger(level: LevelFilter) {
    env_logger::builder()
        .filter_level(level)
        .parse_default_env()
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {:<5} {}] {}",
                buf.timestamp_millis(),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
