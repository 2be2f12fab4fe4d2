use crate::cli::args::{Cli, Commands, ModuleArg, RunArgs};
use crate::core::discovery::{KEY_ALFA, KEY_PCA, KEY_SCREE, KEY_TIN_SCORE, SearchPatterns};
use crate::core::engine::{self, ModuleKind, RunConfig};
use crate::report;
use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{debug, info, warn};
use std::fs;
use std::time::{Duration, Instant};

pub const REPORT_FILE: &str = "zqc_report.html";
pub const DATA_DIR: &str = "zqc_data";
pub const ZIP_FILE: &str = "zqc_data.zip";

pub fn entry() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match cli.command {
        Commands::Run(args) => run(args),
        Commands::List => list(),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn list() -> Result<()> {
    let patterns = SearchPatterns::default();
    for module in engine::registry(&[], &[]).iter() {
        let info = module.info();
        println!("{}\t{}\t{}", info.anchor, info.name, info.href);
        for key in module.search_keys() {
            println!("  {}\t{}", key, patterns.get(key).join(", "));
        }
    }
    Ok(())
}

fn run(args: RunArgs) -> Result<()> {
    let t0 = Instant::now();

    stage("preflight", || {
        for dir in &args.dirs {
            if !dir.exists() {
                bail!("input path not found: {}", dir.display());
            }
        }
        if args.max_file_size == 0 {
            bail!("--max-file-size must be >= 1");
        }
        Ok(())
    })?;

    let t_out = Instant::now();
    fs::create_dir_all(&args.out)
        .with_context(|| format!("failed to create output dir {}", args.out.display()))?;
    stage_done("mkdir", t_out);

    let config = RunConfig {
        roots: args.dirs.clone(),
        title: args.title.clone(),
        modules: args.modules.iter().map(|m| module_kind(*m)).collect(),
        alfa_groups: args.alfa_groups.clone(),
        patterns: search_patterns(&args),
        max_file_size: args.max_file_size,
    };

    let t_engine = Instant::now();
    let output = engine::run(config)?;
    stage_done("engine", t_engine);

    if output.report.section_count() == 0 {
        warn!("no module produced a section; the report will be empty");
    }

    let html_path = args.out.join(REPORT_FILE);
    let data_dir = args.out.join(DATA_DIR);

    let t_html = Instant::now();
    report::html::write(&html_path, &output.report)
        .with_context(|| format!("failed to write {}", html_path.display()))?;
    stage_done("html", t_html);

    let t_data = Instant::now();
    fs::create_dir_all(&data_dir)
        .with_context(|| format!("failed to create {}", data_dir.display()))?;
    let mut written = report::data_txt::write(&data_dir, &output.report)
        .with_context(|| format!("failed to write tables to {}", data_dir.display()))?;
    let json_path = data_dir.join(report::json::FILE_NAME);
    report::json::write(&json_path, &output.report)
        .with_context(|| format!("failed to write {}", json_path.display()))?;
    stage_done("data", t_data);
    debug!("wrote {} table(s)", written.len());
    written.push(json_path);

    if !args.no_zip {
        let t_zip = Instant::now();
        report::zip::write_zip(&args.out, DATA_DIR, ZIP_FILE, &written)
            .with_context(|| "failed to create zip output")?;
        stage_done("zip", t_zip);
    }

    let summary = &output.summary;
    info!(
        "{} file(s), {} section(s); completed: [{}], no data: [{}], failed: [{}]",
        output.files_scanned,
        output.report.section_count(),
        summary.completed.join(", "),
        summary.no_data.join(", "),
        summary
            .failed
            .iter()
            .map(|(name, _)| *name)
            .collect::<Vec<_>>()
            .join(", ")
    );
    info!("report written to {} in {}", html_path.display(), fmt_dur(t0.elapsed()));
    if summary.has_failures() {
        warn!("{} module(s) failed; see errors above", summary.failed.len());
    }
    Ok(())
}

fn module_kind(arg: ModuleArg) -> ModuleKind {
    match arg {
        ModuleArg::Alfa => ModuleKind::Alfa,
        ModuleArg::TinScore => ModuleKind::TinScore,
        ModuleArg::Zpca => ModuleKind::Zpca,
    }
}

fn search_patterns(args: &RunArgs) -> SearchPatterns {
    let mut patterns = SearchPatterns::default();
    let overrides = [
        (KEY_ALFA, &args.alfa_pattern),
        (KEY_TIN_SCORE, &args.tin_pattern),
        (KEY_PCA, &args.pca_pattern),
        (KEY_SCREE, &args.scree_pattern),
    ];
    for (key, glob) in overrides {
        if let Some(glob) = glob {
            patterns.set(key, vec![glob.clone()]);
        }
    }
    patterns
}

fn stage<F>(name: &str, f: F) -> Result<()>
where
    F: FnOnce() -> Result<()>,
{
    let t = Instant::now();
    let res = f();
    debug!("stage={} time={}", name, fmt_dur(t.elapsed()));
    res
}

fn stage_done(name: &str, t: Instant) {
    debug!("stage={} time={}", name, fmt_dur(t.elapsed()));
}

fn fmt_dur(d: Duration) -> String {
    if d.as_secs_f64() < 1.0 {
        format!("{}ms", d.as_millis())
    } else {
        format!("{:.3}s", d.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use zip::ZipArchive;

    fn run_args(argv: &[&str]) -> RunArgs {
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Run(args) => args,
            Commands::List => panic!("expected run"),
        }
    }

    #[test]
    fn rerun_leaves_stale_tables_out_of_the_zip() {
        let input = tempfile::tempdir().unwrap();
        let tin = input.path().join("s1").join("tin");
        fs::create_dir_all(&tin).unwrap();
        fs::write(tin.join("TIN_score.tsv"), "t\ts\na\t70\n").unwrap();

        let out = tempfile::tempdir().unwrap();
        let data = out.path().join(DATA_DIR);
        fs::create_dir_all(&data).unwrap();
        fs::write(data.join("alfa-unique-categories.tsv"), "old\n").unwrap();

        let input_dir = input.path().to_string_lossy().into_owned();
        let out_dir = out.path().to_string_lossy().into_owned();
        run(run_args(&["zqc", "run", &input_dir, "--out", &out_dir])).unwrap();

        assert!(out.path().join(REPORT_FILE).exists());
        let archive = ZipArchive::new(File::open(out.path().join(ZIP_FILE)).unwrap()).unwrap();
        let mut names: Vec<&str> = archive.file_names().collect();
        names.sort_unstable();
        assert_eq!(
            names,
            vec!["zqc_data/", "zqc_data/tin-score.tsv", "zqc_data/zqc_data.json"]
        );
    }
}
