//! Vote counting.

use indexmap::IndexMap;

/// Frequency count of vote values, in order of first appearance
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tally {
    counts: IndexMap<String, usize>,
}

/// Count every value in `votes`.
///
/// Values are not checked against any roster; each distinct string gets its
/// own bucket.
pub fn tally<'a, I>(votes: I) -> Tally
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: IndexMap<String, usize> = IndexMap::new();
    for vote in votes {
        *counts.entry(vote.to_string()).or_insert(0) += 1;
    }
    Tally { counts }
}

impl Tally {
    /// The value with the highest count.
    ///
    /// Ties go to the value that appeared first in the counted sequence.
    /// `None` only when nothing was counted.
    pub fn most_voted(&self) -> Option<&str> {
        let mut best: Option<(&str, usize)> = None;
        for (value, &count) in &self.counts {
            match best {
                Some((_, top)) if count <= top => {}
                _ => best = Some((value.as_str(), count)),
            }
        }
        best.map(|(value, _)| value)
    }

    pub fn count(&self, value: &str) -> usize {
        self.counts.get(value).copied().unwrap_or(0)
    }

    /// Total number of votes counted
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts.iter().map(|(value, &count)| (value.as_str(), count))
    }
}
