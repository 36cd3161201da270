use crate::error::{AnalyticsError, Result};
use crate::schema::{Centroid, CentroidProfile, ClusterPoint, Transaction};
use crate::utils::day_of_month;
use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClusterResult {
    #[schemars(description = "Input points in input order, each with its final cluster id")]
    pub assignments: Vec<ClusterPoint>,

    pub centroids: Vec<Centroid>,

    #[schemars(description = "Number of centroid update steps performed")]
    pub iterations: usize,

    #[schemars(
        description = "True when a full pass reassigned no point; false when the iteration budget ran out first"
    )]
    pub converged: bool,
}

/// Per-cluster figures shown next to the scatter plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClusterSummary {
    pub cluster_id: usize,
    pub count: usize,
    pub avg_day: f64,
    pub avg_amount: f64,
}

impl ClusterResult {
    fn empty() -> Self {
        Self {
            assignments: Vec::new(),
            centroids: Vec::new(),
            iterations: 0,
            converged: true,
        }
    }

    /// One entry per centroid, in centroid order. Empty clusters report zero averages.
    pub fn summaries(&self) -> Vec<ClusterSummary> {
        let mut summaries: Vec<ClusterSummary> = (0..self.centroids.len())
            .map(|cluster_id| ClusterSummary {
                cluster_id,
                count: 0,
                avg_day: 0.0,
                avg_amount: 0.0,
            })
            .collect();

        for point in &self.assignments {
            if let Some(summary) = point.cluster_id.and_then(|id| summaries.get_mut(id)) {
                summary.count += 1;
                summary.avg_day += point.x;
                summary.avg_amount += point.y;
            }
        }

        for summary in &mut summaries {
            if summary.count > 0 {
                summary.avg_day /= summary.count as f64;
                summary.avg_amount /= summary.count as f64;
            }
        }

        summaries
    }

    pub fn profiles(&self) -> Vec<CentroidProfile> {
        self.centroids.iter().map(CentroidProfile::from).collect()
    }
}

/// Projects transactions onto (day of month, amount), unassigned.
pub fn cluster_points(transactions: &[Transaction]) -> Vec<ClusterPoint> {
    transactions
        .iter()
        .map(|txn| ClusterPoint::new(day_of_month(txn.date), txn.amount))
        .collect()
}

/// K-Means (Lloyd's algorithm) over unscaled `(day, amount)` points.
///
/// Seeding takes the first `k` distinct points in input order, so the same
/// input always produces the same clustering.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClusterEngine;

impl ClusterEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn fit(
        &self,
        points: &[ClusterPoint],
        k: usize,
        max_iterations: usize,
    ) -> Result<ClusterResult> {
        if k == 0 {
            return Err(AnalyticsError::invalid_parameter(
                "k",
                "at least one cluster is required",
            ));
        }

        if points.is_empty() {
            return Ok(ClusterResult::empty());
        }

        let seeds = seed_centroids(points, k);
        if seeds.len() < k {
            debug!(
                "Only {} distinct points for k={}; fitting {} clusters",
                seeds.len(),
                k,
                seeds.len()
            );
        }

        // ids from an earlier run must not make the first pass look settled
        let unassigned: Vec<ClusterPoint> = points
            .iter()
            .map(|p| ClusterPoint::new(p.x, p.y))
            .collect();

        Ok(run_lloyd(&unassigned, seeds, max_iterations))
    }

    /// Same loop as [`fit`](Self::fit), starting from caller-provided centroids.
    ///
    /// Points may carry the cluster ids of a previous run; a point only counts
    /// as reassigned when its nearest centroid differs from that id.
    pub fn fit_with_seeds(
        &self,
        points: &[ClusterPoint],
        seeds: &[Centroid],
        max_iterations: usize,
    ) -> Result<ClusterResult> {
        if seeds.is_empty() {
            return Err(AnalyticsError::invalid_parameter(
                "seeds",
                "at least one seed centroid is required",
            ));
        }
        if let Some(bad) = seeds.iter().find(|c| !c.x.is_finite() || !c.y.is_finite()) {
            return Err(AnalyticsError::invalid_parameter(
                "seeds",
                format!("seed centroid ({}, {}) is not finite", bad.x, bad.y),
            ));
        }

        Ok(run_lloyd(points, seeds.to_vec(), max_iterations))
    }
}

fn seed_centroids(points: &[ClusterPoint], k: usize) -> Vec<Centroid> {
    let mut seeds: Vec<Centroid> = Vec::with_capacity(k.min(points.len()));
    for point in points {
        if seeds.len() == k {
            break;
        }
        let candidate = Centroid::from(point);
        if !seeds.contains(&candidate) {
            seeds.push(candidate);
        }
    }
    seeds
}

fn run_lloyd(
    points: &[ClusterPoint],
    mut centroids: Vec<Centroid>,
    max_iterations: usize,
) -> ClusterResult {
    let mut assignments = points.to_vec();
    let mut iterations = 0;

    let converged = loop {
        let changed = assign_points(&mut assignments, &centroids);
        if !changed {
            break true;
        }
        if iterations == max_iterations {
            break false;
        }
        update_centroids(&assignments, &mut centroids);
        iterations += 1;
    };

    debug!(
        "K-Means over {} points with {} centroids: {} iterations, converged={}",
        assignments.len(),
        centroids.len(),
        iterations,
        converged
    );

    ClusterResult {
        assignments,
        centroids,
        iterations,
        converged,
    }
}

/// Returns true if any point moved to a different cluster.
fn assign_points(points: &mut [ClusterPoint], centroids: &[Centroid]) -> bool {
    let mut changed = false;

    for point in points.iter_mut() {
        let mut nearest = 0;
        let mut best = f64::INFINITY;
        for (idx, centroid) in centroids.iter().enumerate() {
            let distance = centroid.distance_to(point);
            // strict: equal distances keep the lower index
            if distance < best {
                best = distance;
                nearest = idx;
            }
        }

        if point.cluster_id != Some(nearest) {
            point.cluster_id = Some(nearest);
            changed = true;
        }
    }

    changed
}

fn update_centroids(points: &[ClusterPoint], centroids: &mut [Centroid]) {
    let mut sums = vec![(0.0_f64, 0.0_f64, 0_usize); centroids.len()];

    for point in points {
        if let Some(slot) = point.cluster_id.and_then(|id| sums.get_mut(id)) {
            slot.0 += point.x;
            slot.1 += point.y;
            slot.2 += 1;
        }
    }

    for (centroid, (sum_x, sum_y, count)) in centroids.iter_mut().zip(sums) {
        // an empty cluster keeps its previous position
        if count > 0 {
            centroid.x = sum_x / count as f64;
            centroid.y = sum_y / count as f64;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points(coords: &[(f64, f64)]) -> Vec<ClusterPoint> {
        coords
            .iter()
            .map(|&(x, y)| ClusterPoint::new(x, y))
            .collect()
    }

    fn three_habits() -> Vec<ClusterPoint> {
        // rent-like, daily meals, mid-size shopping; interleaved so seeds land in each group
        points(&[
            (1.0, 3000.0),
            (12.0, 45.0),
            (22.0, 520.0),
            (2.0, 3100.0),
            (10.0, 50.0),
            (20.0, 500.0),
            (1.0, 2900.0),
            (15.0, 60.0),
            (25.0, 480.0),
        ])
    }

    #[test]
    fn test_separates_spending_habits() {
        let engine = ClusterEngine::new();
        let result = engine.fit(&three_habits(), 3, 100).unwrap();

        assert!(result.converged);
        assert_eq!(result.iterations, 1);
        assert_eq!(result.centroids.len(), 3);

        let ids: Vec<usize> = result
            .assignments
            .iter()
            .map(|p| p.cluster_id.unwrap())
            .collect();
        assert_eq!(ids, vec![0, 1, 2, 0, 1, 2, 0, 1, 2]);

        assert!((result.centroids[0].y - 3000.0).abs() < 1e-9);
        assert!((result.centroids[1].y - 155.0 / 3.0).abs() < 1e-9);
        assert!((result.centroids[2].y - 500.0).abs() < 1e-9);
        assert!((result.centroids[2].x - 67.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_assignments_keep_input_order() {
        let input = three_habits();
        let result = ClusterEngine::new().fit(&input, 3, 100).unwrap();
        for (before, after) in input.iter().zip(&result.assignments) {
            assert_eq!((before.x, before.y), (after.x, after.y));
        }
    }

    #[test]
    fn test_refit_from_converged_centroids_is_fixed_point() {
        let engine = ClusterEngine::new();
        let first = engine.fit(&three_habits(), 3, 100).unwrap();

        let again = engine
            .fit_with_seeds(&first.assignments, &first.centroids, 100)
            .unwrap();
        assert!(again.converged);
        assert_eq!(again.iterations, 0);
        assert_eq!(again.assignments, first.assignments);
        assert_eq!(again.centroids, first.centroids);

        let fresh = engine
            .fit_with_seeds(&three_habits(), &first.centroids, 100)
            .unwrap();
        assert!(fresh.converged);
        assert_eq!(fresh.assignments, first.assignments);
        assert_eq!(fresh.centroids, first.centroids);
    }

    #[test]
    fn test_iteration_budget_stops_early() {
        // all three seeds come from the rent group, so it takes two updates to settle
        let input = points(&[
            (1.0, 3000.0),
            (2.0, 3100.0),
            (1.0, 2900.0),
            (10.0, 50.0),
            (12.0, 45.0),
            (15.0, 60.0),
            (20.0, 500.0),
            (22.0, 520.0),
            (25.0, 480.0),
        ]);
        let engine = ClusterEngine::new();

        let capped = engine.fit(&input, 3, 1).unwrap();
        assert!(!capped.converged);
        assert_eq!(capped.iterations, 1);

        let full = engine.fit(&input, 3, 100).unwrap();
        assert!(full.converged);
        assert_eq!(full.iterations, 2);
    }

    #[test]
    fn test_zero_iterations_assigns_to_seeds() {
        let engine = ClusterEngine::new();
        let result = engine.fit(&three_habits(), 3, 0).unwrap();
        assert_eq!(result.iterations, 0);
        assert!(!result.converged);
        assert_eq!(result.centroids[0], Centroid::new(1.0, 3000.0));
        assert!(result.assignments.iter().all(|p| p.cluster_id.is_some()));
    }

    #[test]
    fn test_ties_go_to_lowest_index() {
        let engine = ClusterEngine::new();
        let seeds = [Centroid::new(4.0, 0.0), Centroid::new(6.0, 0.0)];
        let result = engine
            .fit_with_seeds(&points(&[(5.0, 0.0)]), &seeds, 0)
            .unwrap();
        assert_eq!(result.assignments[0].cluster_id, Some(0));
    }

    #[test]
    fn test_empty_cluster_keeps_position() {
        let engine = ClusterEngine::new();
        let seeds = [Centroid::new(1.0, 11.0), Centroid::new(30.0, 10_000.0)];
        let result = engine
            .fit_with_seeds(&points(&[(1.0, 10.0), (2.0, 12.0)]), &seeds, 10)
            .unwrap();

        assert!(result.converged);
        assert_eq!(result.centroids[1], Centroid::new(30.0, 10_000.0));
        assert!(!result.centroids[1].x.is_nan());
        assert_eq!(result.centroids[0], Centroid::new(1.5, 11.0));
    }

    #[test]
    fn test_amount_axis_is_not_rescaled() {
        // same day as the second seed, but closer in amount to the first
        let engine = ClusterEngine::new();
        let seeds = [Centroid::new(1.0, 100.0), Centroid::new(30.0, 140.0)];
        let result = engine
            .fit_with_seeds(&points(&[(30.0, 104.0)]), &seeds, 0)
            .unwrap();
        assert_eq!(result.assignments[0].cluster_id, Some(0));
    }

    #[test]
    fn test_fewer_distinct_points_than_k() {
        let engine = ClusterEngine::new();
        let result = engine
            .fit(&points(&[(1.0, 5.0), (1.0, 5.0), (2.0, 6.0)]), 3, 100)
            .unwrap();
        assert_eq!(result.centroids.len(), 2);
        assert!(result.converged);
        assert_eq!(result.assignments[1].cluster_id, Some(0));
    }

    #[test]
    fn test_empty_input() {
        let result = ClusterEngine::new().fit(&[], 3, 100).unwrap();
        assert!(result.assignments.is_empty());
        assert!(result.centroids.is_empty());
        assert!(result.converged);
    }

    #[test]
    fn test_fit_ignores_previous_assignments() {
        let engine = ClusterEngine::new();
        let first = engine.fit(&three_habits(), 3, 100).unwrap();

        let refit = engine.fit(&first.assignments, 3, 100).unwrap();
        assert!(refit.converged);
        assert_eq!(refit.iterations, first.iterations);
        assert_eq!(refit.centroids, first.centroids);
        assert_eq!(refit.assignments, first.assignments);
    }

    #[test]
    fn test_huge_k_is_capped_by_distinct_points() {
        let result = ClusterEngine::new()
            .fit(&three_habits(), usize::MAX, 10)
            .unwrap();
        assert_eq!(result.centroids.len(), 9);
        assert!(result.converged);
        assert!(result.assignments.iter().all(|p| p.cluster_id.is_some()));
    }

    #[test]
    fn test_invalid_parameters() {
        let engine = ClusterEngine::new();
        assert!(matches!(
            engine.fit(&three_habits(), 0, 100),
            Err(AnalyticsError::InvalidParameter { .. })
        ));
        assert!(matches!(
            engine.fit_with_seeds(&three_habits(), &[], 100),
            Err(AnalyticsError::InvalidParameter { .. })
        ));
        assert!(engine
            .fit_with_seeds(&three_habits(), &[Centroid::new(f64::NAN, 1.0)], 100)
            .is_err());
    }

    #[test]
    fn test_cluster_points_from_transactions() {
        let txns = vec![
            Transaction::new(
                1,
                chrono::NaiveDate::from_ymd_opt(2025, 12, 9).unwrap(),
                "Dining",
                "Cafe",
                38.0,
            ),
            Transaction::new(
                1,
                chrono::NaiveDate::from_ymd_opt(2025, 11, 30).unwrap(),
                "Housing",
                "Landlord",
                2800.0,
            ),
        ];
        assert_eq!(
            cluster_points(&txns),
            points(&[(9.0, 38.0), (30.0, 2800.0)])
        );
    }

    #[test]
    fn test_summaries_and_profiles() {
        let result = ClusterEngine::new().fit(&three_habits(), 3, 100).unwrap();

        let summaries = result.summaries();
        assert_eq!(summaries.len(), 3);
        assert!(summaries.iter().all(|s| s.count == 3));
        assert!((summaries[2].avg_amount - 500.0).abs() < 1e-9);

        let profiles = result.profiles();
        assert_eq!(profiles[0].day, 1);
        assert!((profiles[0].amount - 3000.0).abs() < 1e-9);
        assert_eq!(profiles[2].day, 22);
    }
}
