use std::io::Write;

use crate::error::{CommonError, CommonResult};

/// Installs the process-wide logger.
/// The filter is taken from `RUST_LOG` and defaults to `info`.
pub fn init_logger() -> CommonResult<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(move |buf, record| {
            let level = record.level();
            let target = record.target();
            let style = buf.default_level_style(level);
            let timestamp = buf.timestamp();
            let args = record.args();
            writeln!(buf, "[{timestamp} {style}{level}{style:#} {target}] {args}")
        })
        .try_init()
        .map_err(|e| CommonError::internal(format!("failed to initialize logger: {e}")))
}
