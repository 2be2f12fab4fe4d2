use crate::core::io;
use crate::core::model::LogFile;
use anyhow::{Context, Result};
use indexmap::IndexMap;
use log::{debug, warn};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

pub const KEY_ALFA: &str = "alfa";
pub const KEY_TIN_SCORE: &str = "tin_score";
pub const KEY_PCA: &str = "zpca/pca";
pub const KEY_SCREE: &str = "zpca/scree";

/// Default size limit for a single input file.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 50_000_000;

/// Search key -> file-name globs.
#[derive(Clone, Debug)]
pub struct SearchPatterns {
    patterns: IndexMap<String, Vec<String>>,
}

impl Default for SearchPatterns {
    fn default() -> Self {
        let mut patterns = IndexMap::new();
        patterns.insert(KEY_ALFA.to_string(), vec!["*ALFA_feature_counts.tsv".to_string()]);
        patterns.insert(KEY_TIN_SCORE.to_string(), vec!["TIN_score.tsv".to_string()]);
        patterns.insert(KEY_PCA.to_string(), vec!["PCA.tsv".to_string()]);
        patterns.insert(KEY_SCREE.to_string(), vec!["scree.tsv".to_string()]);
        Self { patterns }
    }
}

impl SearchPatterns {
    pub fn empty() -> Self {
        Self {
            patterns: IndexMap::new(),
        }
    }

    pub fn set(&mut self, key: &str, globs: Vec<String>) {
        self.patterns.insert(key.to_string(), globs);
    }

    pub fn get(&self, key: &str) -> &[String] {
        self.patterns.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    fn compile(&self) -> Result<Vec<(String, Regex)>> {
        let mut out = Vec::new();
        for (key, globs) in &self.patterns {
            for glob in globs {
                let re = glob_to_regex(glob)
                    .with_context(|| format!("invalid search pattern '{}' for {}", glob, key))?;
                out.push((key.clone(), re));
            }
        }
        Ok(out)
    }
}

/// Compiles a file-name glob (`*`, `?`) into an anchored regex.
///
/// A trailing `.gz` on the file name is always accepted.
pub fn glob_to_regex(glob: &str) -> Result<Regex> {
    let mut re = String::with_capacity(glob.len() + 16);
    re.push('^');
    for ch in glob.chars() {
        match ch {
            '*' => re.push_str(".*"),
            '?' => re.push('.'),
            c => re.push_str(&regex::escape(c.encode_utf8(&mut [0u8; 4]))),
        }
    }
    re.push_str(r"(\.gz)?$");
    Ok(Regex::new(&re)?)
}

/// Where modules obtain their input files.
pub trait LogSource {
    fn find_log_files(&self, key: &str) -> &[LogFile];
}

/// Files found by walking input directories once, grouped by search key.
#[derive(Debug, Default)]
pub struct DirectorySource {
    files: IndexMap<String, Vec<LogFile>>,
}

impl LogSource for DirectorySource {
    fn find_log_files(&self, key: &str) -> &[LogFile] {
        self.files.get(key).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl DirectorySource {
    pub fn scan(roots: &[PathBuf], patterns: &SearchPatterns, max_file_size: u64) -> Result<Self> {
        let compiled = patterns.compile()?;
        let mut paths = Vec::new();
        for root in roots {
            if root.is_file() {
                paths.push(root.clone());
            } else {
                walk(root, &mut paths)
                    .with_context(|| format!("failed to scan {}", root.display()))?;
            }
        }
        paths.sort();
        paths.dedup();

        let mut source = DirectorySource::default();
        for path in paths {
            let Some(name) = path.file_name().and_then(|s| s.to_str()) else {
                continue;
            };
            let keys: Vec<&str> = compiled
                .iter()
                .filter(|(_, re)| re.is_match(name))
                .map(|(k, _)| k.as_str())
                .collect();
            if keys.is_empty() {
                continue;
            }
            let size = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
            if size > max_file_size {
                debug!(
                    "skipping {} ({} bytes exceeds limit of {})",
                    path.display(),
                    size,
                    max_file_size
                );
                continue;
            }
            let contents = match io::read_text(&path) {
                Ok(text) => text,
                Err(e) => {
                    warn!("skipping unreadable file {}: {:#}", path.display(), e);
                    continue;
                }
            };
            let root = path.parent().map(Path::to_path_buf).unwrap_or_default();
            let file = LogFile::new(root, name, contents);
            for key in keys {
                debug!("{}: found {}", key, path.display());
                source.files.entry(key.to_string()).or_default().push(file.clone());
            }
        }
        Ok(source)
    }

    pub fn total_files(&self) -> usize {
        self.files.values().map(Vec::len).sum()
    }
}

fn walk(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("failed to read directory {}", dir.display()))?;
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            walk(&path, out)?;
        } else if file_type.is_file() {
            out.push(path);
        } else if file_type.is_symlink() && path.is_file() {
            out.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("*ALFA_feature_counts.tsv", "s1.ALFA_feature_counts.tsv" => true)]
    #[test_case("*ALFA_feature_counts.tsv", "s1.ALFA_feature_counts.tsv.gz" => true)]
    #[test_case("*ALFA_feature_counts.tsv", "s1.ALFA_feature_counts.tsv.bak" => false)]
    #[test_case("TIN_score.tsv", "xTIN_score.tsv" => false)]
    #[test_case("TIN_score.tsv", "TIN_score_tsv" => false; "dot is literal")]
    #[test_case("PCA.ts?", "PCA.tsv" => true)]
    fn glob_matching(glob: &str, name: &str) -> bool {
        glob_to_regex(glob).unwrap().is_match(name)
    }

    #[test]
    fn scan_groups_files_by_key() {
        let dir = tempfile::tempdir().unwrap();
        let unique = dir.path().join("alfa").join("Unique");
        let tin = dir.path().join("sample_1").join("tin");
        fs::create_dir_all(&unique).unwrap();
        fs::create_dir_all(&tin).unwrap();
        fs::write(unique.join("s1.ALFA_feature_counts.tsv"), "h\th\th\n").unwrap();
        fs::write(tin.join("TIN_score.tsv"), "t\ts\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        fs::write(dir.path().join(".hidden.ALFA_feature_counts.tsv"), "x").unwrap();

        let src = DirectorySource::scan(
            &[dir.path().to_path_buf()],
            &SearchPatterns::default(),
            DEFAULT_MAX_FILE_SIZE,
        )
        .unwrap();

        assert_eq!(src.total_files(), 2);
        let alfa = src.find_log_files(KEY_ALFA);
        assert_eq!(alfa.len(), 1);
        assert_eq!(alfa[0].dir_name(), Some("Unique"));
        assert_eq!(src.find_log_files(KEY_TIN_SCORE)[0].grandparent_name(), Some("sample_1"));
        assert!(src.find_log_files(KEY_PCA).is_empty());
    }

    #[test]
    fn overlapping_roots_yield_each_file_once() {
        let dir = tempfile::tempdir().unwrap();
        let zpca = dir.path().join("zpca");
        fs::create_dir_all(&zpca).unwrap();
        fs::write(zpca.join("PCA.tsv"), "id\tPC1\tPC2\n").unwrap();
        let roots = [dir.path().to_path_buf(), zpca.clone(), zpca.join("PCA.tsv")];
        let src =
            DirectorySource::scan(&roots, &SearchPatterns::default(), DEFAULT_MAX_FILE_SIZE).unwrap();
        assert_eq!(src.find_log_files(KEY_PCA).len(), 1);
        assert_eq!(src.total_files(), 1);
    }

    #[test]
    fn files_over_the_limit_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("PCA.tsv"), "id\tPC1\tPC2\ns\t1\t2\n").unwrap();
        let src =
            DirectorySource::scan(&[dir.path().to_path_buf()], &SearchPatterns::default(), 4)
                .unwrap();
        assert!(src.find_log_files(KEY_PCA).is_empty());
    }

    #[test]
    fn custom_patterns_replace_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("my_tin.tsv"), "t\ts\n").unwrap();
        fs::write(dir.path().join("TIN_score.tsv"), "t\ts\n").unwrap();
        let mut patterns = SearchPatterns::default();
        patterns.set(KEY_TIN_SCORE, vec!["*_tin.tsv".to_string()]);
        let src = DirectorySource::scan(&[dir.path().to_path_buf()], &patterns, DEFAULT_MAX_FILE_SIZE)
            .unwrap();
        let files = src.find_log_files(KEY_TIN_SCORE);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file_name, "my_tin.tsv");
    }
}
