//! Ballot statistics
//!
//! Pure computation over the ballots of one story. Numeric estimates feed
//! the average, median and standard deviation; every estimate (numeric or
//! sentinel) feeds the distribution, the mode and the consensus flag.

use super::ballot::{Ballot, parse_numeric};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::Deserialize;

/// Estimate → count, in first-seen order
///
/// Order matters: the mode tie-break picks the estimate seen first.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "std::collections::BTreeMap<String, usize>")]
pub struct Distribution {
    entries: Vec<(String, usize)>,
}

impl Distribution {
    fn record(&mut self, estimate: &str) {
        match self.entries.iter_mut().find(|(k, _)| k == estimate) {
            Some((_, count)) => *count += 1,
            None => self.entries.push((estimate.to_string(), 1)),
        }
    }

    pub fn get(&self, estimate: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|(k, _)| k == estimate)
            .map(|(_, c)| *c)
    }

    /// Number of distinct estimates
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries.iter().map(|(k, c)| (k.as_str(), *c))
    }

    /// Highest count; ties go to the earliest entry
    pub fn mode(&self) -> Option<&str> {
        let mut best: Option<&(String, usize)> = None;
        for entry in &self.entries {
            if best.is_none_or(|b| entry.1 > b.1) {
                best = Some(entry);
            }
        }
        best.map(|(k, _)| k.as_str())
    }
}

impl From<std::collections::BTreeMap<String, usize>> for Distribution {
    fn from(map: std::collections::BTreeMap<String, usize>) -> Self {
        Self {
            entries: map.into_iter().collect(),
        }
    }
}

impl Serialize for Distribution {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Statistics for one story's ballots
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, Deserialize)]
pub struct VoteStatistics {
    /// All estimates, numeric and sentinel
    pub distribution: Distribution,
    /// Mean of numeric estimates
    pub average: Option<f64>,
    /// Median of numeric estimates in decimal form (e.g. `"5.0"`)
    pub median: Option<String>,
    /// Most frequent estimate; the recommended estimate
    pub mode: Option<String>,
    /// Population standard deviation; needs two or more numeric estimates
    pub std_deviation: Option<f64>,
    /// Numeric estimates, ascending
    pub numeric_values: Vec<f64>,
    /// Every ballot carries the identical estimate string
    pub consensus: bool,
}

impl VoteStatistics {
    /// Statistics for zero ballots
    pub fn empty() -> Self {
        Self::default()
    }

    /// Compute statistics over `ballots`.
    ///
    /// ```
    /// use poker_domain::voting::{Ballot, Estimate, VoteStatistics};
    /// use poker_domain::{StoryId, UserId};
    ///
    /// let ballots: Vec<Ballot> = ["5", "5", "5"]
    ///     .iter()
    ///     .enumerate()
    ///     .map(|(i, e)| Ballot::new(StoryId::new(1), UserId::new(i as u64), Estimate::new(*e).unwrap()))
    ///     .collect();
    ///
    /// let stats = VoteStatistics::calculate(&ballots);
    /// assert!(stats.consensus);
    /// assert_eq!(stats.median.as_deref(), Some("5.0"));
    /// ```
    pub fn calculate(ballots: &[Ballot]) -> Self {
        Self::from_estimates(ballots.iter().map(|b| b.estimate.as_str()))
    }

    /// Compute statistics over raw estimate strings, in cast order.
    pub fn from_estimates<'a>(estimates: impl IntoIterator<Item = &'a str>) -> Self {
        let mut distribution = Distribution::default();
        let mut numeric_values = Vec::new();

        for estimate in estimates {
            distribution.record(estimate);
            if let Some(value) = parse_numeric(estimate) {
                numeric_values.push(value);
            }
        }

        if distribution.is_empty() {
            return Self::empty();
        }

        numeric_values.sort_by(f64::total_cmp);

        let average = mean(&numeric_values);
        let median = median(&numeric_values).map(format_decimal);
        let std_deviation = match average {
            Some(mean) if numeric_values.len() > 1 => {
                let variance = numeric_values
                    .iter()
                    .map(|v| (v - mean).powi(2))
                    .sum::<f64>()
                    / numeric_values.len() as f64;
                Some(variance.sqrt())
            }
            _ => None,
        };

        let mode = distribution.mode().map(str::to_string);
        let consensus = distribution.len() == 1;

        Self {
            distribution,
            average,
            median,
            mode,
            std_deviation,
            numeric_values,
            consensus,
        }
    }

    /// Recommended final estimate (the mode)
    pub fn recommended_estimate(&self) -> Option<&str> {
        self.mode.as_deref()
    }
}

fn mean(sorted: &[f64]) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    Some(sorted.iter().sum::<f64>() / sorted.len() as f64)
}

fn median(sorted: &[f64]) -> Option<f64> {
    let n = sorted.len();
    match n {
        0 => None,
        _ if n % 2 == 0 => Some((sorted[n / 2 - 1] + sorted[n / 2]) / 2.0),
        _ => Some(sorted[n / 2]),
    }
}

/// Decimal string form of a float: whole numbers keep one fractional digit
/// (`5.0`), other values use the shortest round-trip form (`5.5`,
/// `5.333333333333333`), and very large or very small magnitudes switch to
/// scientific notation (`1.0E7`).
pub fn format_decimal(value: f64) -> String {
    let magnitude = value.abs();
    if magnitude >= 1e7 || (magnitude < 1e-3 && value != 0.0) {
        let sci = format!("{:E}", value);
        return match sci.split_once('E') {
            Some((mantissa, exp)) if !mantissa.contains('.') => format!("{}.0E{}", mantissa, exp),
            _ => sci,
        };
    }
    if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}
