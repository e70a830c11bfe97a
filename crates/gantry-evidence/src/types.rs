//! Predictor evidence types

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Deserializer, Serialize};

/// What the predictor knows about one push (or a window of pushes)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvidenceResult {
    /// Task label to confidence
    #[serde(deserialize_with = "null_as_default")]
    pub tasks: BTreeMap<String, f64>,

    /// Test group to confidence
    #[serde(deserialize_with = "deserialize_groups")]
    pub groups: BTreeMap<String, f64>,

    /// Smaller recommended task set, label to confidence
    #[serde(deserialize_with = "null_as_default")]
    pub reduced_tasks: BTreeMap<String, f64>,

    /// Labels the predictor has history for
    #[serde(deserialize_with = "null_as_default")]
    pub known_tasks: BTreeSet<String>,
}

impl EvidenceResult {
    /// Whether the reply carried no evidence at all
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
            && self.groups.is_empty()
            && self.reduced_tasks.is_empty()
            && self.known_tasks.is_empty()
    }

    /// Whether the predictor has history for a task
    pub fn knows(&self, label: &str) -> bool {
        self.known_tasks.contains(label)
    }

    /// Merge another result into this one.
    ///
    /// Confidences keep the maximum seen for each key and known tasks are
    /// unioned, so merging is order independent.
    pub fn merge(&mut self, other: &EvidenceResult) {
        merge_max(&mut self.tasks, &other.tasks);
        merge_max(&mut self.groups, &other.groups);
        merge_max(&mut self.reduced_tasks, &other.reduced_tasks);
        self.known_tasks.extend(other.known_tasks.iter().cloned());
    }

    /// Merge a sequence of results
    pub fn merged<'a, I>(results: I) -> Self
    where
        I: IntoIterator<Item = &'a EvidenceResult>,
    {
        let mut merged = Self::default();
        for result in results {
            merged.merge(result);
        }
        merged
    }
}

fn merge_max(into: &mut BTreeMap<String, f64>, from: &BTreeMap<String, f64>) {
    for (name, &confidence) in from {
        into.entry(name.clone())
            .and_modify(|current| {
                if *current < confidence {
                    *current = confidence;
                }
            })
            .or_insert(confidence);
    }
}

/// A `null` field carries no evidence
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Older predictor replies list groups without confidences
fn deserialize_groups<'de, D>(deserializer: D) -> Result<BTreeMap<String, f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Groups {
        Scored(BTreeMap<String, f64>),
        Listed(Vec<String>),
    }

    Ok(match Option::<Groups>::deserialize(deserializer)? {
        Some(Groups::Scored(map)) => map,
        Some(Groups::Listed(list)) => list.into_iter().map(|g| (g, 1.0)).collect(),
        None => BTreeMap::new(),
    })
}
