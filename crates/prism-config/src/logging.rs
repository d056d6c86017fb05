//! Process-wide logging for PRISM binaries.

use crate::Paths;
use tracing::Level;

/// Send structured logs to `paths.log_file()` and a compact copy to stderr.
///
/// `level` applies unless `RUST_LOG` is set. Unknown names mean `info`.
pub fn init_logging(service: &str, level: &str, paths: &Paths) {
    observability::install(
        observability::LogConfig::new(service)
            .with_level(parse_level(level).as_str().to_ascii_lowercase())
            .with_file(paths.log_file())
            .mirror_to_stderr(true),
    );
}

/// Lenient level parsing: case-insensitive, `warning` accepted.
pub fn parse_level(level: &str) -> Level {
    let level = level.trim();
    if level.eq_ignore_ascii_case("warning") {
        return Level::WARN;
    }
    level.parse().unwrap_or(Level::INFO)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        let cases = [
            ("trace", Level::TRACE),
            ("DEBUG", Level::DEBUG),
            (" info ", Level::INFO),
            ("Warning", Level::WARN),
            ("warn", Level::WARN),
            ("error", Level::ERROR),
            ("", Level::INFO),
            ("chatty", Level::INFO),
        ];
        for (raw, expected) in cases {
            assert_eq!(parse_level(raw), expected, "{raw:?}");
        }
    }
}
