use futures::future::join_all;
use log::{info, warn};

use crate::config::NamedTarget;
use crate::insights::{CoverageLinks, CoverageSummary, PipelineCoverage};
use crate::providers::types::CoverageModule;
use crate::providers::Tracker;

const LINES_LABEL: &str = "Lines";

/// Sum line coverage across modules into a whole-number percentage.
pub fn summarize_coverage(modules: &[CoverageModule]) -> CoverageSummary {
    let (lines_covered, lines_total) = modules
        .iter()
        .filter(|m| m.label == LINES_LABEL)
        .fold((0, 0), |(covered, total), m| {
            (covered + m.covered, total + m.total)
        });

    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    let percentage = if lines_total > 0 {
        (lines_covered as f64 / lines_total as f64 * 100.0).round() as u32
    } else {
        0
    };

    CoverageSummary {
        lines_total,
        lines_covered,
        percentage,
    }
}

/// Look up coverage for every pipeline concurrently.
///
/// One entry per pipeline, in input order. A failed lookup is reported in that
/// entry's `error` and never affects the others.
pub async fn collect_pipeline_coverage<T>(
    tracker: &T,
    pipelines: &[NamedTarget],
) -> Vec<PipelineCoverage>
where
    T: Tracker + ?Sized,
{
    info!("Fetching coverage for {} pipelines in parallel...", pipelines.len());

    let futures: Vec<_> = pipelines
        .iter()
        .map(|pipeline| coverage_for_pipeline(tracker, pipeline))
        .collect();

    join_all(futures).await
}

async fn coverage_for_pipeline<T>(tracker: &T, pipeline: &NamedTarget) -> PipelineCoverage
where
    T: Tracker + ?Sized,
{
    let mut entry = PipelineCoverage {
        pipeline_id: pipeline.id.clone(),
        pipeline_name: pipeline.name.clone(),
        ..PipelineCoverage::default()
    };

    if let Err(error) = fill_coverage(tracker, &mut entry).await {
        warn!(
            "Coverage unavailable for pipeline {} ({}): {error}",
            entry.pipeline_id, entry.pipeline_name
        );
        entry.error = Some(error);
    }

    entry
}

async fn fill_coverage<T>(tracker: &T, entry: &mut PipelineCoverage) -> Result<(), String>
where
    T: Tracker + ?Sized,
{
    let runs = tracker
        .list_runs(&entry.pipeline_id, 1)
        .await
        .map_err(|e| e.to_string())?;

    let latest_run = runs.first().ok_or("No builds found")?;
    entry.build_result = Some(latest_run.result.label().to_string());
    entry.build_number = Some(latest_run.name.clone());
    entry.build_date = Some(latest_run.created_date);

    let build = tracker
        .latest_build(&entry.pipeline_id)
        .await
        .map_err(|e| e.to_string())?
        .ok_or("No builds found")?;
    entry.build_number = Some(build.build_number.clone());

    let modules = tracker
        .list_coverage(build.id)
        .await
        .map_err(|_| "Coverage data not available")?;

    if modules.is_empty() {
        return Err("No coverage data available".to_string());
    }

    let build_url = tracker
        .build_results_url(build.id)
        .map_err(|e| e.to_string())?;
    entry.build_id = Some(build.id);
    entry.coverage = Some(summarize_coverage(&modules));
    entry.links = Some(CoverageLinks {
        coverage: format!("{build_url}&view=codecoverage-tab"),
        tests: format!("{build_url}&view=ms.vss-test-web.build-test-results-tab"),
        build: build_url,
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::testing::FakeTracker;

    fn module(label: &str, covered: u64, total: u64) -> CoverageModule {
        CoverageModule {
            label: label.to_string(),
            covered,
            total,
        }
    }

    #[test]
    fn test_summarize_counts_only_line_stats() {
        let summary = summarize_coverage(&[
            module("Lines", 50, 100),
            module("Blocks", 999, 1000),
            module("Lines", 25, 100),
        ]);

        assert_eq!(summary.lines_covered, 75);
        assert_eq!(summary.lines_total, 200);
        assert_eq!(summary.percentage, 38);
    }

    #[test]
    fn test_summarize_without_lines_is_zero() {
        let summary = summarize_coverage(&[module("Branches", 3, 4)]);

        assert_eq!(summary.lines_total, 0);
        assert_eq!(summary.percentage, 0);
    }

    #[tokio::test]
    async fn test_failed_pipeline_is_isolated() {
        let mut tracker = FakeTracker::default()
            .with_pipeline("1", 101, vec![module("Lines", 80, 100)])
            .with_pipeline("3", 303, vec![module("Lines", 1, 3)]);
        tracker.failing_pipelines.push("2".to_string());

        let pipelines = vec![
            NamedTarget::new("1", "Web"),
            NamedTarget::new("2", "Worker"),
            NamedTarget::new("3", "Jobs"),
        ];

        let results = collect_pipeline_coverage(&tracker, &pipelines).await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].pipeline_id, "1");
        assert_eq!(results[0].coverage.unwrap().percentage, 80);
        assert!(results[0].error.is_none());

        assert_eq!(results[1].pipeline_name, "Worker");
        assert!(results[1].coverage.is_none());
        assert!(results[1]
            .error
            .as_deref()
            .unwrap()
            .contains("Failed to fetch runs for pipeline 2"));

        assert_eq!(results[2].pipeline_id, "3");
        assert_eq!(results[2].coverage.unwrap().percentage, 33);
        assert_eq!(results[2].build_id, Some(303));
    }

    #[tokio::test]
    async fn test_pipeline_without_runs_reports_no_builds() {
        let tracker = FakeTracker::default();

        let results = collect_pipeline_coverage(&tracker, &[NamedTarget::new("9", "Ghost")]).await;

        assert_eq!(results[0].error.as_deref(), Some("No builds found"));
        assert!(results[0].build_number.is_none());
    }

    #[tokio::test]
    async fn test_missing_coverage_keeps_run_metadata() {
        let mut tracker = FakeTracker::default().with_pipeline("1", 101, vec![]);
        tracker.coverage.clear();

        let results = collect_pipeline_coverage(&tracker, &[NamedTarget::new("1", "Web")]).await;

        assert_eq!(results[0].error.as_deref(), Some("Coverage data not available"));
        assert_eq!(results[0].build_result.as_deref(), Some("Succeeded"));
        assert_eq!(results[0].build_number.as_deref(), Some("2024.101"));
    }

    #[tokio::test]
    async fn test_empty_coverage_is_reported() {
        let tracker = FakeTracker::default().with_pipeline("1", 101, vec![]);

        let results = collect_pipeline_coverage(&tracker, &[NamedTarget::new("1", "Web")]).await;

        assert_eq!(results[0].error.as_deref(), Some("No coverage data available"));
    }

    #[tokio::test]
    async fn test_links_point_at_build_results() {
        let tracker = FakeTracker::default().with_pipeline("1", 101, vec![module("Lines", 1, 1)]);

        let results = collect_pipeline_coverage(&tracker, &[NamedTarget::new("1", "Web")]).await;
        let links = results[0].links.as_ref().unwrap();

        assert_eq!(links.build, "https://tracker.test/_build/results?buildId=101");
        assert!(links.coverage.ends_with("&view=codecoverage-tab"));
        assert!(links.tests.ends_with("&view=ms.vss-test-web.build-test-results-tab"));
    }

    #[tokio::test]
    async fn test_no_pipelines_yields_empty_list() {
        let tracker = FakeTracker::default();

        assert!(collect_pipeline_coverage(&tracker, &[]).await.is_empty());
    }
}
