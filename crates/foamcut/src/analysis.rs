//! Ranking, aggregate statistics and convergence analysis of strategy runs.

use foamcut_core::report::{ComparisonStats, ConvergenceSummary, RankedResult, StrategyRun};

/// Time at which the speed term of the score reaches zero.
pub const SCORE_TIME_HORIZON_MS: f64 = 10_000.0;

/// Rolling window of the stability check.
pub const STABILITY_WINDOW: usize = 5;

/// Variance under which a window counts as stable.
pub const STABILITY_VARIANCE: f64 = 0.1;

/// Weighted score: `0.7 × efficiency/100 + 0.3 × max(0, 1 − time/10 s)`.
pub fn score(efficiency: f64, execution_time_ms: u64) -> f64 {
    let speed = (1.0 - execution_time_ms as f64 / SCORE_TIME_HORIZON_MS).max(0.0);
    0.7 * efficiency / 100.0 + 0.3 * speed
}

/// Index order of `runs` by descending efficiency; ties keep execution order.
fn order_by_efficiency(runs: &[StrategyRun]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..runs.len()).collect();
    order.sort_by(|&a, &b| runs[b].efficiency.total_cmp(&runs[a].efficiency));
    order
}

/// Assigns 1-based ranks in place.
pub fn assign_ranks(runs: &mut [StrategyRun]) {
    for (rank, i) in order_by_efficiency(runs).into_iter().enumerate() {
        runs[i].rank = rank + 1;
    }
}

/// Ranking table ordered by efficiency.
pub fn ranking(runs: &[StrategyRun]) -> Vec<RankedResult> {
    order_by_efficiency(runs)
        .into_iter()
        .enumerate()
        .map(|(rank, i)| {
            let run = &runs[i];
            RankedResult {
                rank: rank + 1,
                algorithm: run.name.clone(),
                efficiency: run.efficiency,
                waste: run.waste,
                execution_time_ms: run.execution_time_ms,
                score: score(run.efficiency, run.execution_time_ms),
            }
        })
        .collect()
}

/// Best/worst/average efficiency and timing.
pub fn comparison_stats(runs: &[StrategyRun]) -> ComparisonStats {
    if runs.is_empty() {
        return ComparisonStats::default();
    }
    let n = runs.len() as f64;
    ComparisonStats {
        best_efficiency: runs.iter().map(|r| r.efficiency).fold(f64::MIN, f64::max),
        worst_efficiency: runs.iter().map(|r| r.efficiency).fold(f64::MAX, f64::min),
        average_efficiency: runs.iter().map(|r| r.efficiency).sum::<f64>() / n,
        fastest_time_ms: runs.iter().map(|r| r.execution_time_ms).min().unwrap_or(0),
        slowest_time_ms: runs.iter().map(|r| r.execution_time_ms).max().unwrap_or(0),
        average_time_ms: runs.iter().map(|r| r.execution_time_ms as f64).sum::<f64>() / n,
    }
}

fn variance(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}

/// Fraction of samples that improved on their predecessor.
pub fn convergence_speed(samples: &[f64]) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }
    let improvements = samples.windows(2).filter(|w| w[1] > w[0]).count();
    improvements as f64 / (samples.len() - 1) as f64
}

/// First index from which every rolling window has variance below the
/// threshold. Traces shorter than two windows, and traces that never
/// settle, report their length.
pub fn stability_point(samples: &[f64]) -> usize {
    let n = samples.len();
    if n < 2 * STABILITY_WINDOW {
        return n;
    }
    let stable: Vec<bool> = samples
        .windows(STABILITY_WINDOW)
        .map(|w| variance(w) < STABILITY_VARIANCE)
        .collect();

    // Earliest start of the stable suffix of windows.
    match stable.iter().rposition(|s| !s) {
        None => 0,
        Some(last_unstable) if last_unstable + 1 < stable.len() => last_unstable + 1,
        Some(_) => n,
    }
}

/// Convergence summary of one efficiency trace.
pub fn convergence_summary(strategy: &str, samples: &[f64]) -> ConvergenceSummary {
    let total_improvement = match (samples.first(), samples.last()) {
        (Some(first), Some(last)) => last - first,
        _ => 0.0,
    };
    ConvergenceSummary {
        strategy: strategy.to_string(),
        total_improvement,
        convergence_speed: convergence_speed(samples),
        stability_point: stability_point(samples),
        samples: samples.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn run(name: &str, efficiency: f64, time: u64) -> StrategyRun {
        StrategyRun {
            name: name.into(),
            efficiency,
            waste: 100.0 - efficiency,
            execution_time_ms: time,
            rank: 0,
        }
    }

    #[test]
    fn test_score() {
        assert_relative_eq!(score(100.0, 0), 1.0);
        assert_relative_eq!(score(50.0, 5_000), 0.35 + 0.15);
        assert_relative_eq!(score(80.0, 20_000), 0.56);
    }

    #[test]
    fn test_ranking_and_ranks() {
        let mut runs = vec![
            run("greedy", 70.0, 5),
            run("genetic", 85.0, 900),
            run("annealing", 85.0, 400),
        ];
        assign_ranks(&mut runs);
        assert_eq!(
            runs.iter().map(|r| r.rank).collect::<Vec<_>>(),
            vec![3, 1, 2]
        );

        let table = ranking(&runs);
        assert_eq!(table[0].algorithm, "genetic");
        assert_eq!(table[1].algorithm, "annealing");
        assert_eq!(table[2].rank, 3);
        assert_relative_eq!(table[2].score, 0.7 * 0.7 + 0.3 * (1.0 - 0.0005));
    }

    #[test]
    fn test_stats() {
        let runs = vec![run("a", 60.0, 10), run("b", 90.0, 30)];
        let stats = comparison_stats(&runs);
        assert_relative_eq!(stats.best_efficiency, 90.0);
        assert_relative_eq!(stats.worst_efficiency, 60.0);
        assert_relative_eq!(stats.average_efficiency, 75.0);
        assert_eq!(stats.fastest_time_ms, 10);
        assert_eq!(stats.slowest_time_ms, 30);
        assert_relative_eq!(stats.average_time_ms, 20.0);
        assert_eq!(comparison_stats(&[]), ComparisonStats::default());
    }

    #[test]
    fn test_convergence_speed() {
        assert_eq!(convergence_speed(&[]), 0.0);
        assert_eq!(convergence_speed(&[1.0]), 0.0);
        assert_relative_eq!(convergence_speed(&[1.0, 2.0, 2.0, 3.0, 1.0]), 0.5);
    }

    #[test]
    fn test_stability_point() {
        assert_eq!(stability_point(&[1.0; 9]), 9);
        assert_eq!(stability_point(&[5.0; 12]), 0);

        let mut rising: Vec<f64> = (0..6).map(|i| i as f64 * 10.0).collect();
        rising.extend([60.0; 8]);
        // Windows starting at 0..=5 contain the ramp.
        assert_eq!(stability_point(&rising), 6);

        let oscillating: Vec<f64> = (0..20).map(|i| (i % 2) as f64 * 10.0).collect();
        assert_eq!(stability_point(&oscillating), 20);
    }

    #[test]
    fn test_summary() {
        let s = convergence_summary("genetic", &[10.0, 20.0, 20.0, 40.0]);
        assert_relative_eq!(s.total_improvement, 30.0);
        assert_relative_eq!(s.convergence_speed, 2.0 / 3.0);
        assert_eq!(s.stability_point, 4);
        assert_eq!(s.samples, 4);
    }
}
