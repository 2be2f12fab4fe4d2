use crate::core::table::SampleTable;
use indexmap::IndexMap;
use serde::Serialize;

pub const DEFAULT_POINT_COLOR: &str = "#58a0c3";

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stacking {
    #[default]
    Normal,
    None,
}

/// Display options understood by the chart renderers.
///
/// Field names follow the option names the report host recognises, so a
/// config can be exported next to its data unchanged.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlotConfig {
    pub id: String,
    pub title: Option<String>,
    pub xlab: Option<String>,
    pub ylab: Option<String>,
    pub cpswitch: bool,
    pub cpswitch_counts_label: String,
    pub cpswitch_percent_label: String,
    pub hide_zero_cats: bool,
    pub xmin: Option<f64>,
    pub xmax: Option<f64>,
    pub ymin: Option<f64>,
    pub ymax: Option<f64>,
    pub yfloor: Option<f64>,
    pub yceiling: Option<f64>,
    pub decimal_places: usize,
    pub tt_suffix: String,
    pub stacking: Stacking,
}

impl PlotConfig {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            xlab: None,
            ylab: None,
            cpswitch: true,
            cpswitch_counts_label: "Counts".to_string(),
            cpswitch_percent_label: "Percentages".to_string(),
            hide_zero_cats: true,
            xmin: None,
            xmax: None,
            ymin: None,
            ymax: None,
            yfloor: None,
            yceiling: None,
            decimal_places: 2,
            tt_suffix: String::new(),
            stacking: Stacking::Normal,
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn xlab(mut self, label: impl Into<String>) -> Self {
        self.xlab = Some(label.into());
        self
    }

    pub fn ylab(mut self, label: impl Into<String>) -> Self {
        self.ylab = Some(label.into());
        self
    }

    pub fn counts_only(mut self) -> Self {
        self.cpswitch = false;
        self
    }

    pub fn cpswitch_labels(mut self, counts: &str, percent: &str) -> Self {
        self.cpswitch_counts_label = counts.to_string();
        self.cpswitch_percent_label = percent.to_string();
        self
    }

    /// Keeps categories that are zero for every sample.
    pub fn show_zero_cats(mut self) -> Self {
        self.hide_zero_cats = false;
        self
    }

    pub fn unstacked(mut self) -> Self {
        self.stacking = Stacking::None;
        self
    }

    pub fn y_range(mut self, ymin: Option<f64>, ymax: Option<f64>) -> Self {
        self.ymin = ymin;
        self.ymax = ymax;
        self
    }

    pub fn tooltip(mut self, decimals: usize, suffix: &str) -> Self {
        self.decimal_places = decimals;
        self.tt_suffix = suffix.to_string();
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
    pub color: &'static str,
}

/// Series name -> (x, y) points sorted by x.
pub type LineData = IndexMap<String, Vec<(f64, f64)>>;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Chart {
    Bar {
        data: SampleTable,
        config: PlotConfig,
    },
    Line {
        data: LineData,
        config: PlotConfig,
    },
    Scatter {
        data: IndexMap<String, ScatterPoint>,
        config: PlotConfig,
    },
}

impl Chart {
    pub fn bar(data: SampleTable, config: PlotConfig) -> Self {
        Chart::Bar { data, config }
    }

    pub fn line(data: LineData, config: PlotConfig) -> Self {
        Chart::Line { data, config }
    }

    pub fn scatter(data: IndexMap<String, ScatterPoint>, config: PlotConfig) -> Self {
        Chart::Scatter { data, config }
    }

    pub fn config(&self) -> &PlotConfig {
        match self {
            Chart::Bar { config, .. } | Chart::Line { config, .. } | Chart::Scatter { config, .. } => {
                config
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Chart::Bar { .. } => "bar",
            Chart::Line { .. } => "line",
            Chart::Scatter { .. } => "scatter",
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Chart::Bar { data, .. } => data.is_empty(),
            Chart::Line { data, .. } => data.is_empty(),
            Chart::Scatter { data, .. } => data.is_empty(),
        }
    }
}

/// Drops categories that are zero (or absent) in every sample.
pub fn nonzero_categories(data: &SampleTable) -> Vec<String> {
    let mut cats: IndexMap<&str, bool> = IndexMap::new();
    for labels in data.values() {
        for (label, v) in labels {
            let seen = cats.entry(label.as_str()).or_insert(false);
            *seen |= *v != 0.0;
        }
    }
    cats.into_iter()
        .filter(|(_, nonzero)| *nonzero)
        .map(|(c, _)| c.to_string())
        .collect()
}

pub fn all_categories(data: &SampleTable) -> Vec<String> {
    let mut cats: IndexMap<&str, ()> = IndexMap::new();
    for labels in data.values() {
        for label in labels.keys() {
            cats.insert(label.as_str(), ());
        }
    }
    cats.into_keys().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_categories_are_hidden_only_when_zero_everywhere() {
        let mut data = SampleTable::new();
        data.entry("a".into()).or_default().insert("exon".into(), 0.0);
        data.entry("a".into()).or_default().insert("intron".into(), 0.0);
        data.entry("b".into()).or_default().insert("exon".into(), 3.0);
        assert_eq!(nonzero_categories(&data), vec!["exon"]);
        assert_eq!(all_categories(&data), vec!["exon", "intron"]);
    }

    #[test]
    fn config_builders_apply() {
        let cfg = PlotConfig::new("x").counts_only().unstacked().tooltip(0, "%");
        assert!(!cfg.cpswitch);
        assert!(cfg.hide_zero_cats);
        assert!(!cfg.clone().show_zero_cats().hide_zero_cats);
        assert_eq!(cfg.stacking, Stacking::None);
        assert_eq!(cfg.tt_suffix, "%");
    }
}
