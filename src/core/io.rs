use anyhow::{Context, Result, bail};
use flate2::read::MultiGzDecoder;
use memmap2::Mmap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

pub struct MmapSource {
    mmap: Mmap,
}

impl MmapSource {
    pub fn open(path: &Path) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        // SAFETY: read-only file mapping.
        let mmap = unsafe { Mmap::map(&file) }.with_context(|| "mmap failed")?;
        Ok(Self { mmap })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.mmap
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InputKind {
    Plain,
    Gzip,
}

pub fn detect_input_kind(path: &Path) -> Result<InputKind> {
    if let Some(ext) = path.extension().and_then(|s| s.to_str()) {
        if ext.eq_ignore_ascii_case("gz") {
            return Ok(InputKind::Gzip);
        }
    }
    let mut file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut magic = [0u8; 2];
    let n = file
        .read(&mut magic)
        .with_context(|| "failed to read magic bytes")?;
    if n == 2 && magic == [0x1f, 0x8b] {
        Ok(InputKind::Gzip)
    } else {
        Ok(InputKind::Plain)
    }
}

/// Reads a whole input file as UTF-8 text, decompressing gzip transparently.
pub fn read_text(path: &Path) -> Result<String> {
    let len = std::fs::metadata(path)
        .with_context(|| format!("failed to stat {}", path.display()))?
        .len();
    if len == 0 {
        return Ok(String::new());
    }
    match detect_input_kind(path)? {
        InputKind::Plain => {
            let src = MmapSource::open(path)?;
            match std::str::from_utf8(src.bytes()) {
                Ok(s) => Ok(s.to_owned()),
                Err(e) => bail!("{} is not valid UTF-8: {}", path.display(), e),
            }
        }
        InputKind::Gzip => {
            let file = File::open(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            let mut decoder = MultiGzDecoder::new(BufReader::new(file));
            let mut text = String::new();
            decoder
                .read_to_string(&mut text)
                .with_context(|| format!("failed to decompress {}", path.display()))?;
            Ok(text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    #[test]
    fn reads_plain_and_gzip_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let plain = dir.path().join("TIN_score.tsv");
        std::fs::write(&plain, "a\tb\n").unwrap();
        assert_eq!(read_text(&plain).unwrap(), "a\tb\n");

        let gz = dir.path().join("TIN_score.tsv.gz");
        let mut enc = GzEncoder::new(File::create(&gz).unwrap(), Compression::default());
        enc.write_all(b"x\t1\n").unwrap();
        enc.finish().unwrap();
        assert_eq!(detect_input_kind(&gz).unwrap(), InputKind::Gzip);
        assert_eq!(read_text(&gz).unwrap(), "x\t1\n");
    }

    #[test]
    fn empty_file_reads_as_empty_text() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("scree.tsv");
        File::create(&p).unwrap();
        assert_eq!(read_text(&p).unwrap(), "");
    }

    #[test]
    fn binary_content_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("PCA.tsv");
        std::fs::write(&p, [0xffu8, 0xfe, 0x00]).unwrap();
        assert!(read_text(&p).is_err());
    }
}
