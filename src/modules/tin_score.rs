//! Transcript Integrity Number histograms.

use crate::core::discovery::{KEY_TIN_SCORE, LogSource};
use crate::core::error::{ModuleError, ParseError};
use crate::core::model::{LogFile, ModuleInfo, ReportHost, Section};
use crate::core::plot::{Chart, LineData, PlotConfig};
use crate::core::tsv::{self, Layout};
use crate::modules::ReportModule;
use indexmap::IndexMap;
use log::{debug, info};
use std::collections::BTreeMap;

const NAME: &str = "TIN scores";
const LAYOUT: Layout = Layout::new(2, 2);

/// Rounded TIN -> number of transcripts.
pub type TinHistogram = BTreeMap<i64, u64>;

/// Bins the score column of a `transcript<TAB>score` file.
///
/// Scores are rounded to the nearest integer, ties to even, so that every
/// integer acts as a histogram bin.
pub fn parse_tin_scores(text: &str) -> Result<TinHistogram, ParseError> {
    let fields = tsv::tokenize(text);
    let mut hist = TinHistogram::new();
    for row in LAYOUT.rows(&fields) {
        let score = row?.number_at(1)?;
        *hist.entry(score.round_ties_even() as i64).or_insert(0) += 1;
    }
    Ok(hist)
}

/// The sample directory sits two levels above the score file.
pub fn sample_name(file: &LogFile) -> String {
    file.grandparent_name()
        .or_else(|| file.dir_name())
        .unwrap_or_else(|| file.file_stem())
        .to_string()
}

pub fn line_data(histograms: &IndexMap<String, TinHistogram>) -> LineData {
    histograms
        .iter()
        .map(|(sample, hist)| {
            let points = hist.iter().map(|(&bin, &n)| (bin as f64, n as f64)).collect();
            (sample.clone(), points)
        })
        .collect()
}

#[derive(Debug, Default)]
pub struct TinScore;

impl ReportModule for TinScore {
    fn info(&self) -> ModuleInfo {
        ModuleInfo {
            name: NAME,
            anchor: "tin-score",
            href: "https://bmcbioinformatics.biomedcentral.com/articles/10.1186/s12859-016-0922-z",
            info: "given a set of BAM files and a gene annotation BED file, calculates the \
                   Transcript Integrity Number (TIN) for each transcript.",
        }
    }

    fn search_keys(&self) -> &'static [&'static str] {
        &[KEY_TIN_SCORE]
    }

    fn run(&self, source: &dyn LogSource, host: &mut dyn ReportHost) -> Result<(), ModuleError> {
        let files = source.find_log_files(KEY_TIN_SCORE);
        let mut data: IndexMap<String, TinHistogram> = IndexMap::new();
        for file in files {
            let sample = sample_name(file);
            if data.contains_key(&sample) {
                debug!("{}: {} already parsed, skipping {}", NAME, sample, file.path().display());
                continue;
            }
            let hist = parse_tin_scores(&file.contents).map_err(|source| ModuleError::Parse {
                module: NAME,
                file: file.path(),
                source,
            })?;
            data.insert(sample, hist);
        }

        if data.is_empty() {
            return Err(ModuleError::NoData { module: NAME });
        }
        info!("{}: {} sample(s)", NAME, data.len());

        let config = PlotConfig::new("tin_score_plot")
            .title("TIN scores")
            .xlab("TIN score (rounded)")
            .ylab("Number of transcripts")
            .counts_only()
            .tooltip(0, "");
        host.add_section(Section::new(
            "TIN score distribution",
            "tin-score",
            Chart::line(line_data(&data), config),
        ));
        Ok(())
    }
}
