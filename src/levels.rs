//! Font-size tiers: repetition pre-filter, clustering and promotion.

use std::collections::{BTreeMap, HashMap};

use crate::config::{ClusterMethod, LevelStrategy, OutlineConfig};
use crate::model::{HeadingLevel, Line, SizeKey};

const MAX_KMEANS_ITERATIONS: usize = 100;

/// Drop lines whose (page, size) pair occurs more than `max_per_size` times.
///
/// Many lines sharing one size on one page are table rows or list items.
pub fn filter_repeated_sizes(lines: Vec<Line>, max_per_size: usize) -> Vec<Line> {
    let mut counts: HashMap<(u32, SizeKey), usize> = HashMap::new();
    for line in &lines {
        *counts.entry((line.page, line.size_key())).or_insert(0) += 1;
    }

    let before = lines.len();
    let candidates: Vec<Line> = lines
        .into_iter()
        .filter(|l| counts[&(l.page, l.size_key())] <= max_per_size)
        .collect();
    log::debug!(
        "repetition filter kept {} of {} lines",
        candidates.len(),
        before
    );
    candidates
}

/// Mapping from a distinct font size to its heading level.
///
/// Larger sizes never map to a less important level than smaller ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SizeLevelMap {
    levels: BTreeMap<SizeKey, HeadingLevel>,
}

impl SizeLevelMap {
    /// Build the map from the distinct sizes of the candidate lines.
    pub fn build(candidates: &[Line], config: &OutlineConfig) -> Self {
        let mut sizes: Vec<SizeKey> = candidates.iter().map(Line::size_key).collect();
        sizes.sort_unstable_by(|a, b| b.cmp(a));
        sizes.dedup();

        let num_levels = config.num_levels.clamp(1, 3);
        let tiers = match config.level_strategy {
            LevelStrategy::AllTiers => num_levels,
            LevelStrategy::BodyExcluded => num_levels + 1,
        };

        let ranks = if sizes.len() <= tiers {
            (0..sizes.len()).collect()
        } else {
            match config.cluster_method {
                ClusterMethod::KMeans => kmeans_ranks(&sizes, tiers),
                ClusterMethod::LargestGap => largest_gap_ranks(&sizes, tiers),
            }
        };

        let levels = sizes
            .into_iter()
            .zip(ranks)
            .filter(|&(_, rank)| rank < num_levels)
            .map(|(size, rank)| (size, HeadingLevel::from_rank(rank)))
            .collect();

        let map = Self { levels };
        log::debug!("size levels: {}", map);
        map
    }

    /// Build a map from explicit entries.
    pub fn from_entries<I: IntoIterator<Item = (f32, HeadingLevel)>>(entries: I) -> Self {
        Self {
            levels: entries
                .into_iter()
                .map(|(size, level)| (SizeKey::from_points(size), level))
                .collect(),
        }
    }

    /// Level assigned to a size, if any.
    pub fn level(&self, size: SizeKey) -> Option<HeadingLevel> {
        self.levels.get(&size).copied()
    }

    /// Level assigned to a size in points, if any.
    pub fn level_of(&self, size: f32) -> Option<HeadingLevel> {
        self.level(SizeKey::from_points(size))
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Entries from the largest size down.
    pub fn iter(&self) -> impl Iterator<Item = (SizeKey, HeadingLevel)> + '_ {
        self.levels.iter().rev().map(|(k, v)| (*k, *v))
    }

    /// Whether every larger size has a level at least as important as every smaller one.
    pub fn is_monotonic(&self) -> bool {
        let levels: Vec<HeadingLevel> = self.iter().map(|(_, level)| level).collect();
        levels.windows(2).all(|w| w[0] <= w[1])
    }

    /// Correct for a title set alone in the largest size.
    ///
    /// When exactly one candidate uses the largest size, the second-largest
    /// size moves from H2 to H1 and every H3 size moves to H2. Applying the
    /// correction to its own output changes nothing.
    pub fn promote(&self, candidates: &[Line]) -> SizeLevelMap {
        let mut ordered = self.levels.keys().rev();
        let (Some(&largest), Some(&second)) = (ordered.next(), ordered.next()) else {
            return self.clone();
        };

        let at_largest = candidates
            .iter()
            .filter(|l| l.size_key() == largest)
            .count();
        if at_largest != 1 {
            return self.clone();
        }

        let levels = self
            .levels
            .iter()
            .map(|(&size, &level)| {
                let level = match level {
                    HeadingLevel::H2 if size == second => HeadingLevel::H1,
                    HeadingLevel::H3 => HeadingLevel::H2,
                    other => other,
                };
                (size, level)
            })
            .collect();

        let promoted = Self { levels };
        if promoted != *self {
            log::debug!("promoted size levels: {}", promoted);
        }
        promoted
    }
}

impl std::fmt::Display for SizeLevelMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .iter()
            .map(|(size, level)| format!("{}={}", size, level))
            .collect();
        write!(f, "{{{}}}", parts.join(", "))
    }
}

/// Tier rank (0 = largest) of each size in `sizes`, sorted descending.
///
/// One-dimensional Lloyd iteration. Centroids are seeded at evenly spaced
/// positions of the sorted sizes, so the result depends only on the input.
/// Ties go to the larger tier. Ranks are dense over non-empty clusters.
fn kmeans_ranks(sizes: &[SizeKey], k: usize) -> Vec<usize> {
    let points: Vec<f64> = sizes.iter().map(|s| s.points() as f64).collect();
    let n = points.len();
    if k <= 1 || n == 0 {
        return vec![0; n];
    }

    let mut centroids: Vec<f64> = (0..k).map(|i| points[i * (n - 1) / (k - 1)]).collect();
    let mut assignment: Vec<usize> = Vec::new();

    for _ in 0..MAX_KMEANS_ITERATIONS {
        let next: Vec<usize> = points.iter().map(|&p| nearest(&centroids, p)).collect();
        if next == assignment {
            break;
        }
        assignment = next;

        for (cluster, centroid) in centroids.iter_mut().enumerate() {
            let members: Vec<f64> = points
                .iter()
                .zip(&assignment)
                .filter(|(_, a)| **a == cluster)
                .map(|(&p, _)| p)
                .collect();
            if !members.is_empty() {
                *centroid = members.iter().sum::<f64>() / members.len() as f64;
            }
        }
    }

    let mut used: Vec<usize> = assignment.clone();
    used.sort_unstable();
    used.dedup();
    used.sort_by(|&a, &b| {
        centroids[b]
            .partial_cmp(&centroids[a])
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.cmp(&b))
    });
    let rank_of: HashMap<usize, usize> = used.iter().enumerate().map(|(r, &c)| (c, r)).collect();

    assignment.iter().map(|c| rank_of[c]).collect()
}

fn nearest(centroids: &[f64], point: f64) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (idx, &c) in centroids.iter().enumerate() {
        let dist = (point - c).abs();
        if dist < best_dist {
            best = idx;
            best_dist = dist;
        }
    }
    best
}

/// Tier rank of each size in `sizes` (sorted descending), cutting at the
/// `k - 1` widest gaps. Equal gaps are cut nearest the large end first.
fn largest_gap_ranks(sizes: &[SizeKey], k: usize) -> Vec<usize> {
    let n = sizes.len();
    if k <= 1 || n == 0 {
        return vec![0; n];
    }

    let mut gaps: Vec<(i64, usize)> = sizes
        .windows(2)
        .enumerate()
        .map(|(i, w)| (((w[0].points() - w[1].points()) * 10.0).round() as i64, i))
        .collect();
    gaps.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

    let mut cuts: Vec<usize> = gaps.into_iter().take(k - 1).map(|(_, i)| i).collect();
    cuts.sort_unstable();

    let mut ranks = Vec::with_capacity(n);
    let mut rank = 0;
    for i in 0..n {
        ranks.push(rank);
        if cuts.binary_search(&i).is_ok() {
            rank += 1;
        }
    }
    ranks
}
