use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Packs `files` from `out_dir/<data_dir>` into `out_dir/<zip_name>`.
///
/// Only the listed files are archived, so leftovers from earlier runs in
/// the data directory stay out. The archive is built under a temporary
/// name and renamed once complete.
pub fn write_zip(out_dir: &Path, data_dir: &str, zip_name: &str, files: &[PathBuf]) -> Result<()> {
    let zip_path = out_dir.join(zip_name);
    let tmp_path = out_dir.join(format!("{}.tmp", zip_name));

    let file = File::create(&tmp_path)
        .with_context(|| format!("failed to create {}", tmp_path.display()))?;
    let mut zip = ZipWriter::new(file);
    let result = write_zip_entries(&mut zip, out_dir, data_dir, files);

    match result.and_then(|_| zip.finish().with_context(|| "failed to finalize zip")) {
        Ok(_) => {
            fs::rename(&tmp_path, &zip_path)
                .with_context(|| format!("failed to move zip to {}", zip_path.display()))?;
            Ok(())
        }
        Err(e) => {
            let _ = fs::remove_file(&tmp_path);
            Err(e)
        }
    }
}

fn write_zip_entries(
    zip: &mut ZipWriter<File>,
    out_dir: &Path,
    root: &str,
    files: &[PathBuf],
) -> Result<()> {
    // Fixed 1980-01-01 timestamp keeps archives reproducible.
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default());

    zip.add_directory(format!("{}/", root), options)
        .with_context(|| "failed to add directory entry to zip")?;

    let mut names: Vec<&str> = files
        .iter()
        .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
        .collect();
    names.sort_unstable();
    names.dedup();

    for name in names {
        let src_path = out_dir.join(root).join(name);
        let zip_path = format!("{}/{}", root, name);
        add_file(zip, &src_path, &zip_path, options)
            .with_context(|| format!("failed to add {} to zip", name))?;
    }
    Ok(())
}

fn add_file(
    zip: &mut ZipWriter<File>,
    src_path: &Path,
    zip_path: &str,
    options: SimpleFileOptions,
) -> Result<()> {
    let mut file =
        File::open(src_path).with_context(|| format!("failed to open {}", src_path.display()))?;
    zip.start_file(zip_path, options)?;
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        zip.write_all(&buf[..n])?;
    }
    Ok(())
}
