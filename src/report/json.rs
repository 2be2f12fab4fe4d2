use crate::core::model::Report;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub const FILE_NAME: &str = "zqc_data.json";

pub fn write(path: &Path, report: &Report) -> Result<()> {
    let file = File::create(path).with_context(|| format!("create {} failed", path.display()))?;
    let mut w = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut w, report).context("failed to serialize report")?;
    writeln!(w)?;
    w.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{ModuleInfo, ReportHost, Section};
    use crate::core::plot::{Chart, PlotConfig};
    use indexmap::IndexMap;

    #[test]
    fn report_round_trips_to_json_values() {
        let dir = tempfile::tempdir().unwrap();
        let mut report = Report::new("Run 1");
        report.begin_module(&ModuleInfo {
            name: "TIN scores",
            anchor: "tin-score",
            href: "",
            info: "",
        });
        let data = IndexMap::from([("s1".to_string(), vec![(70.0, 2.0)])]);
        report.add_section(Section::new(
            "TIN score distribution",
            "tin-score",
            Chart::line(data, PlotConfig::new("tin_score_plot")),
        ));

        let path = dir.path().join(FILE_NAME);
        write(&path, &report).unwrap();
        let v: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();

        assert_eq!(v["title"], "Run 1");
        let section = &v["modules"][0]["sections"][0];
        assert_eq!(section["anchor"], "tin-score");
        assert_eq!(section["chart"]["type"], "line");
        assert_eq!(section["chart"]["config"]["id"], "tin_score_plot");
        assert_eq!(section["chart"]["data"]["s1"][0][0], 70.0);
    }
}
