use crate::core::model::{Report, Section};
use crate::core::plot::{self, Chart};
use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Writes one `<anchor>.tsv` per section into `dir`.
pub fn write(dir: &Path, report: &Report) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(report.section_count());
    for section in report.sections() {
        let path = dir.join(format!("{}.tsv", section.anchor));
        let file =
            File::create(&path).with_context(|| format!("create {} failed", path.display()))?;
        let mut w = BufWriter::new(file);
        write_section(&mut w, section)?;
        w.flush()?;
        written.push(path);
    }
    Ok(written)
}

pub fn write_section(w: &mut dyn Write, section: &Section) -> Result<()> {
    match &section.chart {
        Chart::Bar { data, .. } => {
            let cats = plot::all_categories(data);
            write!(w, "Sample")?;
            for cat in &cats {
                write!(w, "\t{}", cat)?;
            }
            writeln!(w)?;
            for (sample, labels) in data {
                write!(w, "{}", sample)?;
                for cat in &cats {
                    match labels.get(cat) {
                        Some(v) => write!(w, "\t{}", fmt_value(*v))?,
                        None => write!(w, "\t")?,
                    }
                }
                writeln!(w)?;
            }
        }
        Chart::Line { data, .. } => {
            // Bins are integral for every line chart we emit.
            let xs: BTreeSet<i64> = data
                .values()
                .flat_map(|points| points.iter().map(|(x, _)| *x as i64))
                .collect();
            write!(w, "Sample")?;
            for x in &xs {
                write!(w, "\t{}", x)?;
            }
            writeln!(w)?;
            for (sample, points) in data {
                write!(w, "{}", sample)?;
                for x in &xs {
                    match points.iter().find(|(px, _)| *px as i64 == *x) {
                        Some((_, y)) => write!(w, "\t{}", fmt_value(*y))?,
                        None => write!(w, "\t0")?,
                    }
                }
                writeln!(w)?;
            }
        }
        Chart::Scatter { data, config } => {
            writeln!(
                w,
                "Sample\t{}\t{}",
                config.xlab.as_deref().unwrap_or("x"),
                config.ylab.as_deref().unwrap_or("y")
            )?;
            for (sample, point) in data {
                writeln!(w, "{}\t{}\t{}", sample, fmt_value(point.x), fmt_value(point.y))?;
            }
        }
    }
    Ok(())
}

fn fmt_value(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{ModuleInfo, ReportHost};
    use crate::core::plot::{PlotConfig, ScatterPoint};
    use crate::core::table::SampleTable;
    use indexmap::IndexMap;
    use std::fs;

    fn bar_section() -> Section {
        let mut data = SampleTable::new();
        data.insert(
            "s1".into(),
            IndexMap::from([("exon".to_string(), 3.0), ("intron".to_string(), 1.5)]),
        );
        data.insert("s2".into(), IndexMap::from([("intron".to_string(), 2.0)]));
        Section::new("Categories", "alfa-unique-categories", Chart::bar(data, PlotConfig::new("c")))
    }

    fn render(section: &Section) -> String {
        let mut buf = Vec::new();
        write_section(&mut buf, section).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn bar_table_has_one_column_per_category() {
        assert_eq!(
            render(&bar_section()),
            "Sample\texon\tintron\ns1\t3\t1.5\ns2\t\t2\n"
        );
    }

    #[test]
    fn line_table_fills_missing_bins() {
        let data = IndexMap::from([
            ("s1".to_string(), vec![(10.0, 2.0), (50.0, 1.0)]),
            ("s2".to_string(), vec![(50.0, 4.0)]),
        ]);
        let section = Section::new("TIN", "tin-score", Chart::line(data, PlotConfig::new("t")));
        assert_eq!(render(&section), "Sample\t10\t50\ns1\t2\t1\ns2\t0\t4\n");
    }

    #[test]
    fn scatter_table_uses_axis_labels() {
        let data = IndexMap::from([(
            "A".to_string(),
            ScatterPoint {
                x: 1.5,
                y: -2.0,
                color: "#58a0c3",
            },
        )]);
        let config = PlotConfig::new("p").xlab("PC1").ylab("PC2");
        let section = Section::new("PCA", "zpca-pc1-pc2", Chart::scatter(data, config));
        assert_eq!(render(&section), "Sample\tPC1\tPC2\nA\t1.5\t-2\n");
    }

    #[test]
    fn one_file_per_section() {
        let dir = tempfile::tempdir().unwrap();
        let mut report = Report::new("t");
        report.begin_module(&ModuleInfo {
            name: "ALFA",
            anchor: "alfa",
            href: "",
            info: "",
        });
        report.add_section(bar_section());
        let written = write(dir.path(), &report).unwrap();
        assert_eq!(written, vec![dir.path().join("alfa-unique-categories.tsv")]);
        assert!(fs::read_to_string(&written[0]).unwrap().starts_with("Sample\texon"));
    }
}
