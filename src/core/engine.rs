use crate::core::discovery::{DirectorySource, SearchPatterns};
use crate::core::model::Report;
use crate::modules::{Alfa, ModuleRegistry, RunSummary, TinScore, Zpca};
use anyhow::{Result, bail};
use log::{debug, info};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ModuleKind {
    Alfa,
    TinScore,
    Zpca,
}

impl ModuleKind {
    pub const ALL: [ModuleKind; 3] = [ModuleKind::Alfa, ModuleKind::TinScore, ModuleKind::Zpca];
}

pub struct RunConfig {
    pub roots: Vec<PathBuf>,
    pub title: String,
    pub modules: Vec<ModuleKind>,
    pub alfa_groups: Vec<String>,
    pub patterns: SearchPatterns,
    pub max_file_size: u64,
}

pub struct RunOutput {
    pub report: Report,
    pub summary: RunSummary,
    pub files_scanned: usize,
}

/// Registry with the requested modules in their canonical order.
pub fn registry(kinds: &[ModuleKind], alfa_groups: &[String]) -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    for kind in ModuleKind::ALL {
        if !kinds.is_empty() && !kinds.contains(&kind) {
            continue;
        }
        match kind {
            ModuleKind::Alfa if alfa_groups.is_empty() => registry.register(Alfa::default()),
            ModuleKind::Alfa => registry.register(Alfa::new(alfa_groups.to_vec())),
            ModuleKind::TinScore => registry.register(TinScore),
            ModuleKind::Zpca => registry.register(Zpca),
        };
    }
    registry
}

pub fn run(cfg: RunConfig) -> Result<RunOutput> {
    if cfg.roots.is_empty() {
        bail!("no input directories given");
    }
    let registry = registry(&cfg.modules, &cfg.alfa_groups);

    // Only search for what the enabled modules will ask for.
    let mut patterns = SearchPatterns::empty();
    for module in registry.iter() {
        for key in module.search_keys() {
            patterns.set(key, cfg.patterns.get(key).to_vec());
        }
    }

    let t_scan = Instant::now();
    let source = DirectorySource::scan(&cfg.roots, &patterns, cfg.max_file_size)?;
    debug!("engine.scan time={}ms", t_scan.elapsed().as_millis());
    info!("found {} matching file(s)", source.total_files());

    let t_modules = Instant::now();
    let mut report = Report::new(cfg.title);
    let summary = registry.run_all(&source, &mut report);
    debug!("engine.modules time={}ms", t_modules.elapsed().as_millis());

    Ok(RunOutput {
        report,
        summary,
        files_scanned: source.total_files(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn registry_follows_canonical_order() {
        let r = registry(&[ModuleKind::Zpca, ModuleKind::Alfa], &[]);
        let anchors: Vec<_> = r.iter().map(|m| m.info().anchor).collect();
        assert_eq!(anchors, vec!["alfa", "zpca"]);
        assert_eq!(registry(&[], &[]).iter().count(), 3);
    }

    #[test]
    fn run_over_a_results_tree() {
        let dir = tempfile::tempdir().unwrap();
        let tin = dir.path().join("s1").join("tin");
        fs::create_dir_all(&tin).unwrap();
        fs::write(tin.join("TIN_score.tsv"), "t\ts\na\t70\nb\t70.2\n").unwrap();
        let zpca = dir.path().join("zpca");
        fs::create_dir_all(&zpca).unwrap();
        fs::write(zpca.join("PCA.tsv"), "s\tPC1\tPC2\nA\t1\t2\n").unwrap();

        let out = run(RunConfig {
            roots: vec![dir.path().to_path_buf()],
            title: "t".into(),
            modules: vec![],
            alfa_groups: vec![],
            patterns: SearchPatterns::default(),
            max_file_size: 1_000_000,
        })
        .unwrap();

        assert_eq!(out.files_scanned, 2);
        assert_eq!(out.summary.no_data, vec!["ALFA"]);
        assert_eq!(out.summary.completed, vec!["TIN scores", "ZPCA"]);
        let anchors: Vec<_> = out.report.sections().map(|s| s.anchor.as_str()).collect();
        assert_eq!(anchors, vec!["tin-score", "zpca-pc1-pc2"]);
    }
}
