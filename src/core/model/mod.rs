use crate::core::plot::Chart;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// A discovered input file with its decoded text.
#[derive(Clone, Debug)]
pub struct LogFile {
    /// Directory containing the file.
    pub root: PathBuf,
    pub file_name: String,
    pub contents: String,
}

impl LogFile {
    pub fn new(root: impl Into<PathBuf>, file_name: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            file_name: file_name.into(),
            contents: contents.into(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.root.join(&self.file_name)
    }

    /// Basename of the containing directory, if any.
    pub fn dir_name(&self) -> Option<&str> {
        self.root.file_name().and_then(|s| s.to_str())
    }

    /// Basename of the directory above the containing one.
    pub fn grandparent_name(&self) -> Option<&str> {
        self.root
            .parent()
            .and_then(Path::file_name)
            .and_then(|s| s.to_str())
    }

    pub fn file_stem(&self) -> &str {
        Path::new(&self.file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.file_name)
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ModuleInfo {
    pub name: &'static str,
    pub anchor: &'static str,
    pub href: &'static str,
    pub info: &'static str,
}

#[derive(Clone, Debug, Serialize)]
pub struct Section {
    pub name: String,
    pub anchor: String,
    pub chart: Chart,
}

impl Section {
    pub fn new(name: impl Into<String>, anchor: impl Into<String>, chart: Chart) -> Self {
        Self {
            name: name.into(),
            anchor: anchor.into(),
            chart,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ModuleReport {
    pub info: ModuleInfo,
    pub sections: Vec<Section>,
}

/// Everything the modules handed over during one run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Report {
    pub title: String,
    pub modules: Vec<ModuleReport>,
}

impl Report {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            modules: Vec::new(),
        }
    }

    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.modules.iter().flat_map(|m| m.sections.iter())
    }

    pub fn section_count(&self) -> usize {
        self.modules.iter().map(|m| m.sections.len()).sum()
    }

    /// Modules that produced at least one section.
    pub fn populated(&self) -> impl Iterator<Item = &ModuleReport> {
        self.modules.iter().filter(|m| !m.sections.is_empty())
    }
}

/// Receiver of finished report sections.
pub trait ReportHost {
    fn begin_module(&mut self, _info: &ModuleInfo) {}
    fn add_section(&mut self, section: Section);
}

impl ReportHost for Report {
    fn begin_module(&mut self, info: &ModuleInfo) {
        self.modules.push(ModuleReport {
            info: info.clone(),
            sections: Vec::new(),
        });
    }

    fn add_section(&mut self, section: Section) {
        match self.modules.last_mut() {
            Some(m) => m.sections.push(section),
            None => self.modules.push(ModuleReport {
                info: ModuleInfo {
                    name: "Other",
                    anchor: "other",
                    href: "",
                    info: "",
                },
                sections: vec![section],
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_names_are_derived_from_root() {
        let f = LogFile::new("/data/sampleA/tin", "TIN_score.tsv", "");
        assert_eq!(f.dir_name(), Some("tin"));
        assert_eq!(f.grandparent_name(), Some("sampleA"));
        assert_eq!(f.file_stem(), "TIN_score");
        assert_eq!(f.path(), PathBuf::from("/data/sampleA/tin/TIN_score.tsv"));
    }
}
