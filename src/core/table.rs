use crate::core::error::DeriveError;
use indexmap::IndexMap;
use std::hash::Hash;

/// Sample name -> label -> value, in first-seen order.
pub type SampleTable<K = String, V = f64> = IndexMap<String, IndexMap<K, V>>;

/// Adds `value` to `label` within `sample`, creating both on first sight.
pub fn accumulate(table: &mut SampleTable, sample: &str, label: &str, value: f64) {
    let labels = table.entry(sample.to_string()).or_default();
    *labels.entry(label.to_string()).or_insert(0.0) += value;
}

/// Merges a per-file table into the running one.
///
/// Samples seen for the first time are inserted as-is. For a known sample the
/// inner map is overlaid: labels missing from `incoming` survive, labels
/// present in both take the incoming value. Values are replaced, not summed.
pub fn merge_overlay<K, V>(running: &mut SampleTable<K, V>, incoming: SampleTable<K, V>)
where
    K: Hash + Eq,
{
    for (sample, labels) in incoming {
        match running.get_mut(&sample) {
            Some(existing) => existing.extend(labels),
            None => {
                running.insert(sample, labels);
            }
        }
    }
}

pub fn percentages(table: &SampleTable) -> Result<SampleTable, DeriveError> {
    let mut out = SampleTable::with_capacity(table.len());
    for (sample, labels) in table {
        let total: f64 = labels.values().sum();
        if total == 0.0 {
            return Err(DeriveError::ZeroTotal {
                sample: sample.clone(),
            });
        }
        let pct = labels
            .iter()
            .map(|(label, v)| (label.clone(), v / total * 100.0))
            .collect();
        out.insert(sample.clone(), pct);
    }
    Ok(out)
}

/// log2(observed% / size%) for every label of the observed table.
pub fn enrichment(observed: &SampleTable, sizes: &SampleTable) -> Result<SampleTable, DeriveError> {
    let mut out = SampleTable::with_capacity(observed.len());
    for (sample, labels) in observed {
        let size_labels = sizes.get(sample);
        let mut row = IndexMap::with_capacity(labels.len());
        for (label, obs) in labels {
            let share = size_labels.and_then(|s| s.get(label)).copied().unwrap_or(0.0);
            if share == 0.0 {
                return Err(DeriveError::ZeroGenomicShare {
                    sample: sample.clone(),
                    label: label.clone(),
                });
            }
            let ratio = obs / share;
            if ratio <= 0.0 || !ratio.is_finite() {
                return Err(DeriveError::NonPositiveRatio {
                    sample: sample.clone(),
                    label: label.clone(),
                });
            }
            row.insert(label.clone(), ratio.log2());
        }
        out.insert(sample.clone(), row);
    }
    Ok(out)
}
