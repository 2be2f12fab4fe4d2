//! zPCA coordinates and scree (explained variance) tables.

use crate::core::discovery::{KEY_PCA, KEY_SCREE, LogSource};
use crate::core::error::{ModuleError, ParseError};
use crate::core::model::{LogFile, ModuleInfo, ReportHost, Section};
use crate::core::plot::{Chart, DEFAULT_POINT_COLOR, PlotConfig, ScatterPoint};
use crate::core::table::{self, SampleTable};
use crate::core::tsv::{self, Layout};
use crate::modules::ReportModule;
use indexmap::IndexMap;
use log::{debug, info};

const NAME: &str = "ZPCA";
const MAX_COMPONENTS: usize = 3;

/// Parses `sample<TAB>PC1<TAB>PC2[<TAB>PC3]` rows into sample -> component -> value.
///
/// Component names come from the header; blank header cells become `PCn`.
pub fn parse_pca(text: &str) -> Result<SampleTable, ParseError> {
    let layout = Layout::from_header(text);
    if layout.stride < 3 {
        return Err(ParseError::MissingValues {
            expected: 2,
            found: layout.stride.saturating_sub(1),
        });
    }
    let fields = tsv::tokenize(text);
    let n = (layout.stride - 1).min(MAX_COMPONENTS);
    let names: Vec<String> = (1..=n)
        .map(|i| match fields.get(i).map(|s| s.trim()) {
            Some(h) if !h.is_empty() => h.to_string(),
            _ => format!("PC{}", i),
        })
        .collect();

    let mut out = SampleTable::new();
    for row in layout.rows(&fields) {
        let row = row?;
        let mut coords = IndexMap::with_capacity(n);
        for (i, name) in names.iter().enumerate() {
            coords.insert(name.clone(), row.number_at(i + 1)?);
        }
        out.insert(row.cells[0].to_string(), coords);
    }
    Ok(out)
}

/// Trailing 2-3 numeric fields of a scree file, labelled PC1..PCn.
pub fn parse_scree(text: &str) -> Result<IndexMap<String, f64>, ParseError> {
    let fields = tsv::tokenize(text);
    let mut values = Vec::with_capacity(MAX_COMPONENTS);
    for field in fields.iter().rev().skip_while(|f| f.trim().is_empty()) {
        if values.len() == MAX_COMPONENTS {
            break;
        }
        match tsv::parse_number(field) {
            Some(v) => values.push(v),
            None => break,
        }
    }
    if values.len() < 2 {
        return Err(ParseError::MissingValues {
            expected: 2,
            found: values.len(),
        });
    }
    values.reverse();
    Ok(values
        .into_iter()
        .enumerate()
        .map(|(i, v)| (format!("PC{}", i + 1), v))
        .collect())
}

/// Component pairs to plot: (PC1, PC2), then (PC1, PC3) and (PC2, PC3).
pub fn component_pairs(components: &[String]) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    for i in 0..components.len() {
        for j in (i + 1)..components.len() {
            pairs.push((i, j));
        }
    }
    pairs
}

pub fn project(coords: &SampleTable, x: &str, y: &str) -> IndexMap<String, ScatterPoint> {
    coords
        .iter()
        .filter_map(|(sample, pcs)| {
            let point = ScatterPoint {
                x: *pcs.get(x)?,
                y: *pcs.get(y)?,
                color: DEFAULT_POINT_COLOR,
            };
            Some((sample.clone(), point))
        })
        .collect()
}

fn scree_sample(file: &LogFile) -> String {
    file.dir_name().unwrap_or_else(|| file.file_stem()).to_string()
}

#[derive(Debug, Default)]
pub struct Zpca;

impl Zpca {
    fn pca_sections(&self, files: &[LogFile]) -> Result<Vec<Section>, ModuleError> {
        let mut coords = SampleTable::new();
        for file in files {
            let parsed = parse_pca(&file.contents).map_err(|source| ModuleError::Parse {
                module: NAME,
                file: file.path(),
                source,
            })?;
            debug!("{}: {} point(s) in {}", NAME, parsed.len(), file.path().display());
            table::merge_overlay(&mut coords, parsed);
        }
        let components: Vec<String> = crate::core::plot::all_categories(&coords);
        let mut sections = Vec::new();
        for (i, j) in component_pairs(&components) {
            let (x, y) = (&components[i], &components[j]);
            let config = PlotConfig::new(format!("zpca_{}_{}", i + 1, j + 1))
                .title(format!("zPCA: {} vs {}", x, y))
                .xlab(x.as_str())
                .ylab(y.as_str())
                .counts_only();
            sections.push(Section::new(
                format!("PCA components {} & {}", i + 1, j + 1),
                format!("zpca-pc{}-pc{}", i + 1, j + 1),
                Chart::scatter(project(&coords, x, y), config),
            ));
        }
        Ok(sections)
    }

    fn scree_section(&self, files: &[LogFile]) -> Result<Section, ModuleError> {
        let mut data = SampleTable::new();
        for file in files {
            let variance = parse_scree(&file.contents).map_err(|source| ModuleError::Parse {
                module: NAME,
                file: file.path(),
                source,
            })?;
            let mut incoming = SampleTable::new();
            incoming.insert(scree_sample(file), variance);
            table::merge_overlay(&mut data, incoming);
        }
        let config = PlotConfig::new("zpca_scree")
            .title("zPCA: explained variance")
            .ylab("% variance explained")
            .counts_only()
            .unstacked()
            .y_range(Some(0.0), Some(100.0))
            .tooltip(2, "%");
        Ok(Section::new("Scree plot", "zpca-scree", Chart::bar(data, config)))
    }
}

impl ReportModule for Zpca {
    fn info(&self) -> ModuleInfo {
        ModuleInfo {
            name: NAME,
            anchor: "zpca",
            href: "https://github.com/zavolanlab/zpca",
            info: "principal component analysis of sample expression profiles.",
        }
    }

    fn search_keys(&self) -> &'static [&'static str] {
        &[KEY_PCA, KEY_SCREE]
    }

    fn run(&self, source: &dyn LogSource, host: &mut dyn ReportHost) -> Result<(), ModuleError> {
        let pca_files = source.find_log_files(KEY_PCA);
        let scree_files = source.find_log_files(KEY_SCREE);
        if pca_files.is_empty() && scree_files.is_empty() {
            return Err(ModuleError::NoData { module: NAME });
        }
        info!(
            "{}: {} PCA file(s), {} scree file(s)",
            NAME,
            pca_files.len(),
            scree_files.len()
        );

        let mut sections = Vec::new();
        if !pca_files.is_empty() {
            sections.extend(self.pca_sections(pca_files)?);
        }
        if !scree_files.is_empty() {
            sections.push(self.scree_section(scree_files)?);
        }
        for section in sections {
            host.add_section(section);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::Report;
    use crate::modules::tests::MemorySource;

    const PCA3: &str = "sample\tPC1\tPC2\tPC3\nA\t1.5\t-2\t0.25\nB\t-1\t3\t4\n";

    #[test]
    fn pca_rows_keep_all_components() {
        let t = parse_pca(PCA3).unwrap();
        assert_eq!(t.len(), 2);
        assert_eq!(t["A"]["PC1"], 1.5);
        assert_eq!(t["A"]["PC2"], -2.0);
        assert_eq!(t["B"]["PC3"], 4.0);
    }

    #[test]
    fn blank_header_cells_are_named_by_position() {
        let t = parse_pca("\t\t\nA\t1\t2\n").unwrap();
        assert_eq!(t["A"].keys().collect::<Vec<_>>(), vec!["PC1", "PC2"]);
    }

    #[test]
    fn pca_needs_two_components() {
        let err = parse_pca("sample\tPC1\nA\t1\n").unwrap_err();
        assert_eq!(err, ParseError::MissingValues { expected: 2, found: 1 });
    }

    #[test]
    fn scree_takes_trailing_values() {
        let v = parse_scree("PC1\tPC2\tPC3\n41.2\t22.5\t9.75\n").unwrap();
        assert_eq!(v.keys().collect::<Vec<_>>(), vec!["PC1", "PC2", "PC3"]);
        assert_eq!(v["PC1"], 41.2);
        assert_eq!(v["PC3"], 9.75);

        let two = parse_scree("variance\n60\n30\n\n").unwrap();
        assert_eq!(two.len(), 2);
        assert_eq!(two["PC2"], 30.0);
    }

    #[test]
    fn scree_without_values_is_an_error() {
        let err = parse_scree("PC1\tPC2\n12\n").unwrap_err();
        assert_eq!(err, ParseError::MissingValues { expected: 2, found: 1 });
    }

    #[test]
    fn pairs_depend_on_component_count() {
        let two = vec!["PC1".to_string(), "PC2".to_string()];
        assert_eq!(component_pairs(&two), vec![(0, 1)]);
        let three: Vec<String> = vec!["PC1".into(), "PC2".into(), "PC3".into()];
        assert_eq!(component_pairs(&three), vec![(0, 1), (0, 2), (1, 2)]);
    }

    #[test]
    fn run_emits_projections_and_scree() {
        let source = MemorySource::new(KEY_PCA, vec![LogFile::new("/r/zpca", "PCA.tsv", PCA3)])
            .with(KEY_SCREE, vec![LogFile::new("/r/zpca", "scree.tsv", "PC1\tPC2\tPC3\n50\t30\t20\n")]);
        let mut report = Report::new("t");
        Zpca.run(&source, &mut report).unwrap();

        let anchors: Vec<_> = report.sections().map(|s| s.anchor.as_str()).collect();
        assert_eq!(
            anchors,
            vec!["zpca-pc1-pc2", "zpca-pc1-pc3", "zpca-pc2-pc3", "zpca-scree"]
        );
        match &report.sections().nth(1).unwrap().chart {
            Chart::Scatter { data, config } => {
                assert_eq!(data["A"], ScatterPoint { x: 1.5, y: 0.25, color: "#58a0c3" });
                assert_eq!(config.xlab.as_deref(), Some("PC1"));
                assert_eq!(config.ylab.as_deref(), Some("PC3"));
            }
            other => panic!("unexpected chart {:?}", other.kind()),
        }
        match &report.sections().last().unwrap().chart {
            Chart::Bar { data, .. } => assert_eq!(data["zpca"]["PC2"], 30.0),
            other => panic!("unexpected chart {:?}", other.kind()),
        }
    }

    #[test]
    fn later_pca_files_overlay_earlier_ones() {
        let source = MemorySource::new(
            KEY_PCA,
            vec![
                LogFile::new("/r/a", "PCA.tsv", "s\tPC1\tPC2\nA\t1\t1\nB\t2\t2\n"),
                LogFile::new("/r/b", "PCA.tsv", "s\tPC1\tPC2\nA\t9\t9\n"),
            ],
        );
        let mut report = Report::new("t");
        Zpca.run(&source, &mut report).unwrap();
        assert_eq!(report.section_count(), 1);
        match &report.sections().next().unwrap().chart {
            Chart::Scatter { data, .. } => {
                assert_eq!(data["A"].x, 9.0);
                assert_eq!(data["B"].x, 2.0);
            }
            other => panic!("unexpected chart {:?}", other.kind()),
        }
    }

    #[test]
    fn no_files_is_no_data() {
        let source = MemorySource::new(KEY_PCA, vec![]);
        let mut report = Report::new("t");
        assert!(Zpca.run(&source, &mut report).unwrap_err().is_no_data());
    }
}
