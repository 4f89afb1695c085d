use std::collections::BTreeMap;

use chrono::Timelike;

use super::{date_key, percentage, round2};
use crate::insights::{DailyRunStats, RunStatistics};
use crate::providers::types::{Run, RunResult};

pub fn calculate_run_statistics(runs: &[Run], window_days: u32) -> RunStatistics {
    let total_runs = runs.len();
    let success_count = count_result(runs, RunResult::Succeeded);
    let failure_count = count_result(runs, RunResult::Failed);

    let daily_stats = bucket_by_day(runs);
    let hourly_stats = bucket_by_hour(runs);

    RunStatistics {
        total_runs,
        success_count,
        failure_count,
        success_rate: percentage(success_count, total_runs),
        deploy_frequency: deploy_frequency(total_runs, daily_stats.len()),
        window_days,
        daily_stats,
        hourly_stats,
    }
}

fn count_result(runs: &[Run], result: RunResult) -> usize {
    runs.iter().filter(|r| r.result == result).count()
}

fn bucket_by_day(runs: &[Run]) -> BTreeMap<String, DailyRunStats> {
    runs.iter().fold(BTreeMap::new(), |mut days, run| {
        let day: &mut DailyRunStats = days.entry(date_key(&run.created_date)).or_default();
        day.total += 1;
        match run.result {
            RunResult::Succeeded => day.success += 1,
            RunResult::Failed => day.failed += 1,
            RunResult::Canceled | RunResult::None => {}
        }
        days
    })
}

fn bucket_by_hour(runs: &[Run]) -> [usize; 24] {
    runs.iter().fold([0; 24], |mut hours, run| {
        hours[run.created_date.hour() as usize] += 1;
        hours
    })
}

// Runs per day that saw at least one run, not per window day.
#[allow(clippy::cast_precision_loss)]
fn deploy_frequency(total_runs: usize, distinct_days: usize) -> f64 {
    round2(total_runs as f64 / distinct_days.max(1) as f64)
}
