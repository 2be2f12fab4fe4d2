//! Report modules. Each one pulls its files from a [`LogSource`], parses and
//! aggregates them, and hands finished sections to a [`ReportHost`].

use crate::core::discovery::LogSource;
use crate::core::error::ModuleError;
use crate::core::model::{ModuleInfo, ReportHost};
use log::{error, info, warn};
use std::time::Instant;

pub mod alfa;
pub mod tin_score;
pub mod zpca;

pub use alfa::Alfa;
pub use tin_score::TinScore;
pub use zpca::Zpca;

pub trait ReportModule {
    fn info(&self) -> ModuleInfo;

    /// Search keys this module reads from the log source.
    fn search_keys(&self) -> &'static [&'static str];

    /// Runs the whole scan/parse/merge/derive/render pipeline once.
    fn run(&self, source: &dyn LogSource, host: &mut dyn ReportHost) -> Result<(), ModuleError>;
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub completed: Vec<&'static str>,
    pub no_data: Vec<&'static str>,
    /// Module name and the error that stopped it.
    pub failed: Vec<(&'static str, String)>,
}

impl RunSummary {
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// Ordered set of enabled modules.
#[derive(Default)]
pub struct ModuleRegistry {
    modules: Vec<Box<dyn ReportModule>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self {
            modules: Vec::new(),
        }
    }

    pub fn register<M>(&mut self, module: M) -> &mut Self
    where
        M: ReportModule + 'static,
    {
        self.modules.push(Box::new(module));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn ReportModule> {
        self.modules.iter().map(|m| m.as_ref())
    }

    /// Runs every module in order. A module without input files is skipped
    /// with a warning; any other failure is logged and the next module runs.
    pub fn run_all(&self, source: &dyn LogSource, host: &mut dyn ReportHost) -> RunSummary {
        let mut summary = RunSummary::default();
        for module in &self.modules {
            let info = module.info();
            let t = Instant::now();
            host.begin_module(&info);
            match module.run(source, host) {
                Ok(()) => {
                    info!("{}: done in {}ms", info.name, t.elapsed().as_millis());
                    summary.completed.push(info.name);
                }
                Err(e) if e.is_no_data() => {
                    warn!("{}", e);
                    summary.no_data.push(info.name);
                }
                Err(e) => {
                    error!("{}", e);
                    summary.failed.push((info.name, e.to_string()));
                }
            }
        }
        summary
    }
}

pub fn slug(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut dash = false;
    for ch in s.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
            dash = false;
        } else if !dash && !out.is_empty() {
            out.push('-');
            dash = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}
