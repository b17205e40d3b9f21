//! Browser launching.
//!
//! Fire-and-forget: the opener process is spawned and not waited on; only a
//! failure to spawn is reported.

use crate::error::{Result, SyncError};
use std::process::{Command, Stdio};

pub fn open(url: &str) -> Result<()> {
    let (program, args): (&str, Vec<&str>) = if cfg!(target_os = "macos") {
        ("open", vec![url])
    } else if cfg!(target_os = "windows") {
        ("cmd", vec!["/C", "start", "", url])
    } else {
        ("xdg-open", vec![url])
    };

    Command::new(program)
        .args(&args)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map(|_| ())
        .map_err(|e| SyncError::ExternalCommandFailed {
            command: format!("{program} {url}"),
            status: -1,
            stderr: e.to_string(),
        })
}
