use anyhow::{anyhow, Context, Result};
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use tracing::Level;

/// Where diagnostic output goes. The interactive menu owns the terminal, so
/// it only logs when a file is given.
pub enum LogTarget<'a> {
    File(&'a Path),
    Stderr,
    Off,
}

pub fn init(target: LogTarget<'_>, level: Level) -> Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false);

    let installed = match target {
        LogTarget::File(path) => {
            let file = File::create(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).try_init()
        }
        LogTarget::Stderr => builder.with_writer(std::io::stderr).try_init(),
        LogTarget::Off => return Ok(()),
    };

    installed.map_err(|err| anyhow!("failed to install log subscriber: {}", err))
}
