//! ALFA feature counts: reads per genomic category and biotype.

use crate::core::discovery::{KEY_ALFA, LogSource};
use crate::core::error::{DeriveError, ModuleError, ParseError};
use crate::core::model::{LogFile, ModuleInfo, ReportHost, Section};
use crate::core::plot::{Chart, PlotConfig};
use crate::core::table::{self, SampleTable};
use crate::core::tsv::{self, Layout};
use crate::modules::{ReportModule, slug};
use log::{debug, info};
use std::collections::HashSet;

const NAME: &str = "ALFA";
const FILE_SUFFIX: &str = ".ALFA_feature_counts.tsv";

pub const DEFAULT_GROUPS: [&str; 2] = ["Unique", "UniqueMultiple"];

/// Per-file tables, keyed by the sample the file belongs to.
#[derive(Debug, Default, PartialEq)]
pub struct AlfaTables {
    pub categories: SampleTable,
    pub biotypes: SampleTable,
    pub category_sizes: SampleTable,
    pub biotype_sizes: SampleTable,
}

/// Parses one feature-counts file.
///
/// The first line fixes the column count. Column 1 is `category,biotype`,
/// column 2 the read count and column 3, when present, the nucleotide size of
/// the feature. Repeated labels add up.
pub fn parse_alfa(text: &str, sample: &str) -> Result<AlfaTables, ParseError> {
    let layout = Layout::from_header(text);
    if layout.stride < 2 {
        return Err(ParseError::MissingValues {
            expected: 2,
            found: layout.stride,
        });
    }
    let fields = tsv::tokenize(text);
    let mut out = AlfaTables::default();
    for row in layout.rows(&fields) {
        let row = row?;
        let label = row.cells[0];
        let (category, biotype) = split_label(label).ok_or_else(|| ParseError::MalformedLabel {
            row: row.number,
            value: label.to_string(),
        })?;
        let reads = row.number_at(1)?;
        table::accumulate(&mut out.categories, sample, category, reads);
        table::accumulate(&mut out.biotypes, sample, biotype, reads);
        if layout.stride >= 3 {
            let size = row.number_at(2)?;
            table::accumulate(&mut out.category_sizes, sample, category, size);
            table::accumulate(&mut out.biotype_sizes, sample, biotype, size);
        }
    }
    Ok(out)
}

fn split_label(label: &str) -> Option<(&str, &str)> {
    let (category, biotype) = label.split_once(',')?;
    if biotype.contains(',') {
        return None;
    }
    Some((category, biotype))
}

pub fn sample_name(file: &LogFile) -> String {
    let name = file.file_name.strip_suffix(".gz").unwrap_or(&file.file_name);
    match name.strip_suffix(FILE_SUFFIX) {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => file.file_stem().to_string(),
    }
}

/// State of one group run; built fresh for every group.
#[derive(Debug, Default)]
struct AlfaRun {
    tables: AlfaTables,
    samples: HashSet<String>,
}

impl AlfaRun {
    fn add_file(&mut self, file: &LogFile) -> Result<(), ModuleError> {
        let sample = sample_name(file);
        if !self.samples.insert(sample.clone()) {
            debug!("{}: {} already parsed, skipping {}", NAME, sample, file.path().display());
            return Ok(());
        }
        let parsed = parse_alfa(&file.contents, &sample).map_err(|source| ModuleError::Parse {
            module: NAME,
            file: file.path(),
            source,
        })?;
        table::merge_overlay(&mut self.tables.categories, parsed.categories);
        table::merge_overlay(&mut self.tables.biotypes, parsed.biotypes);
        table::merge_overlay(&mut self.tables.category_sizes, parsed.category_sizes);
        table::merge_overlay(&mut self.tables.biotype_sizes, parsed.biotype_sizes);
        Ok(())
    }

    fn sections(self, group: &str) -> Result<Vec<Section>, ModuleError> {
        let key = slug(group);
        let mut sections = Vec::new();
        let kinds = [
            ("Categories", &self.tables.categories, &self.tables.category_sizes),
            ("BioTypes", &self.tables.biotypes, &self.tables.biotype_sizes),
        ];
        for (kind, counts, sizes) in kinds {
            let kind_key = kind.to_ascii_lowercase();
            let config = PlotConfig::new(format!("alfa_{}_{}", key, kind_key))
                .title(format!("ALFA: {} {}", group, kind.to_lowercase()))
                .ylab("Reads")
                .cpswitch_labels("Read counts", "Percentages");
            sections.push(Section::new(
                format!("{}-{}", group, kind),
                format!("alfa-{}-{}", key, kind_key),
                Chart::bar(counts.clone(), config),
            ));

            if sizes.is_empty() {
                continue;
            }
            let scores = enrichment_scores(counts, sizes)?;
            let config = PlotConfig::new(format!("alfa_{}_{}_enrichment", key, kind_key))
                .title(format!("ALFA: {} {} enrichment", group, kind.to_lowercase()))
                .ylab("log2(reads % / genomic size %)")
                .counts_only()
                .unstacked()
                .show_zero_cats()
                .tooltip(3, "");
            sections.push(Section::new(
                format!("{}-{} enrichment", group, kind),
                format!("alfa-{}-{}-enrichment", key, kind_key),
                Chart::bar(scores, config),
            ));
        }
        Ok(sections)
    }
}

/// Enrichment of read share over genomic-size share for samples with sizes.
pub fn enrichment_scores(counts: &SampleTable, sizes: &SampleTable) -> Result<SampleTable, ModuleError> {
    let derive = |source: DeriveError| ModuleError::Derive {
        module: NAME,
        source,
    };
    let observed: SampleTable = counts
        .iter()
        .filter(|(sample, _)| sizes.contains_key(*sample))
        .map(|(s, labels)| (s.clone(), labels.clone()))
        .collect();
    let observed_pct = table::percentages(&observed).map_err(derive)?;
    let size_pct = table::percentages(sizes).map_err(derive)?;
    table::enrichment(&observed_pct, &size_pct).map_err(derive)
}

pub struct Alfa {
    groups: Vec<String>,
}

impl Default for Alfa {
    fn default() -> Self {
        Self::new(DEFAULT_GROUPS.iter().map(|g| g.to_string()).collect())
    }
}

impl Alfa {
    /// An empty group list treats all files as one group.
    pub fn new(groups: Vec<String>) -> Self {
        Self { groups }
    }
}

impl ReportModule for Alfa {
    fn info(&self) -> ModuleInfo {
        ModuleInfo {
            name: NAME,
            anchor: "alfa",
            href: "https://github.com/biocompibens/ALFA",
            info: "provides a global overview of features distribution composing NGS dataset(s).",
        }
    }

    fn search_keys(&self) -> &'static [&'static str] {
        &[KEY_ALFA]
    }

    fn run(&self, source: &dyn LogSource, host: &mut dyn ReportHost) -> Result<(), ModuleError> {
        let files = source.find_log_files(KEY_ALFA);
        let groups: Vec<Option<&str>> = if self.groups.is_empty() {
            vec![None]
        } else {
            self.groups.iter().map(|g| Some(g.as_str())).collect()
        };

        // Sections are held back until every group has derived cleanly.
        let mut sections = Vec::new();
        for group in groups {
            let mut run = AlfaRun::default();
            for file in files {
                if group.is_some_and(|g| file.dir_name() != Some(g)) {
                    continue;
                }
                run.add_file(file)?;
            }
            let label = group.unwrap_or(NAME);
            if run.samples.is_empty() {
                debug!("{}: no files in group {}", NAME, label);
                continue;
            }
            info!("{}: {} sample(s) in group {}", NAME, run.samples.len(), label);
            sections.extend(run.sections(label)?);
        }

        if sections.is_empty() {
            return Err(ModuleError::NoData { module: NAME });
        }
        for section in sections {
            host.add_section(section);
        }
        Ok(())
    }
}
