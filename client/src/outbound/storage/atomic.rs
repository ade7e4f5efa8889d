//! Temp-file-and-rename writes inside a capability directory.

use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};

use cap_std::fs::{Dir, OpenOptions};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Replace `file_name` in `dir` with `contents` without exposing a partial
/// file to readers.
pub(super) fn write_atomic(dir: &Dir, file_name: &str, contents: &str) -> io::Result<()> {
    let counter = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let tmp_name = format!(".{file_name}.tmp.{}.{counter}", std::process::id());

    if let Err(err) = write_temp(dir, &tmp_name, contents) {
        drop(dir.remove_file(&tmp_name));
        return Err(err);
    }
    if let Err(err) = replace(dir, &tmp_name, file_name) {
        drop(dir.remove_file(&tmp_name));
        return Err(err);
    }
    sync_directory(dir);
    Ok(())
}

fn write_temp(dir: &Dir, tmp_name: &str, contents: &str) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    let mut file = dir.open_with(tmp_name, &options)?;
    file.write_all(contents.as_bytes())?;
    file.sync_all()
}

#[cfg(windows)]
fn replace(dir: &Dir, tmp_name: &str, target_name: &str) -> io::Result<()> {
    // Windows rename fails if the target exists.
    match dir.remove_file(target_name) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(err),
    }
    dir.rename(tmp_name, dir, target_name)
}

#[cfg(not(windows))]
fn replace(dir: &Dir, tmp_name: &str, target_name: &str) -> io::Result<()> {
    dir.rename(tmp_name, dir, target_name)
}

fn sync_directory(dir: &Dir) {
    if dir.open(".").and_then(|handle| handle.sync_all()).is_err() {
        // Directory sync is best effort.
    }
}
