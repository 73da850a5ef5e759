//! Atomic output files

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Write `path` through a temporary sibling that is renamed into place only
/// when `write` succeeds. On failure nothing is left behind.
pub fn write_atomically<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<()>,
{
    let temp = temp_path(path);
    let result = File::create(&temp)
        .with_context(|| format!("cannot create {}", temp.display()))
        .and_then(|file| {
            let mut out = BufWriter::new(file);
            write(&mut out)?;
            out.flush()
                .with_context(|| format!("cannot write {}", temp.display()))
        })
        .and_then(|()| {
            fs::rename(&temp, path)
                .with_context(|| format!("cannot move output into {}", path.display()))
        });

    if result.is_err() {
        let _ = fs::remove_file(&temp);
    }
    result
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("output"));
    name.push(".tmp");
    path.with_file_name(name)
}

/// Object file written for output name `out`: always `<out>.obj`
pub fn object_output(out: &Path) -> PathBuf {
    let mut name = out.as_os_str().to_owned();
    name.push(".obj");
    PathBuf::from(name)
}
