//! Lead time for changes, measured as deployment cycles.
//!
//! A merge by the designated user closes a cycle. The cycle opens with the
//! first merge by anybody else after the previous designated merge. For the
//! first designated merge it opens with the earliest merge in the window.

use std::collections::BTreeMap;

use super::{date_key, round2};
use crate::insights::{Cycle, DailyLeadTime, LeadTimeAnalysis, LeadTimeStatistics};
use crate::providers::types::PullRequest;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;
const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Identity whose merges close a deployment cycle.
///
/// Matches an author by id, or by unique name or display name ignoring case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesignatedUser(String);

impl DesignatedUser {
    pub fn new(identity: &str) -> Self {
        Self(identity.trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn authored(&self, pr: &PullRequest) -> bool {
        pr.author_id == self.0
            || pr.author_unique_name.eq_ignore_ascii_case(&self.0)
            || pr.author_display_name.eq_ignore_ascii_case(&self.0)
    }
}

pub fn analyze_lead_time(pull_requests: &[PullRequest], user: &DesignatedUser) -> LeadTimeAnalysis {
    let sorted = sort_by_closed_date(pull_requests);
    let cycles = segment_cycles(&sorted, user);

    LeadTimeAnalysis {
        statistics: summarize_cycles(&cycles, &sorted),
        daily_stats: bucket_by_day(&cycles),
        cycles,
    }
}

// Stable, so PRs closed at the same instant keep fetch order.
fn sort_by_closed_date(pull_requests: &[PullRequest]) -> Vec<&PullRequest> {
    let mut sorted: Vec<_> = pull_requests.iter().collect();
    sorted.sort_by_key(|pr| pr.closed_date);
    sorted
}

// `sorted` must be ordered by close date. Terminators with no opening merge
// before them are skipped and do not use up a cycle number.
fn segment_cycles(sorted: &[&PullRequest], user: &DesignatedUser) -> Vec<Cycle> {
    let terminators = sorted
        .iter()
        .enumerate()
        .filter(|(_, pr)| user.authored(pr))
        .map(|(idx, _)| idx);

    let mut cycles = Vec::new();
    let mut prev_end_idx: Option<usize> = None;

    for end_idx in terminators {
        let start = match prev_end_idx {
            None => sorted.first(),
            Some(prev) => sorted[prev + 1..end_idx]
                .iter()
                .find(|pr| !user.authored(pr)),
        };
        prev_end_idx = Some(end_idx);

        let end = sorted[end_idx];
        let Some(&start) = start else {
            continue;
        };
        // The window opened with a designated merge; nothing precedes it.
        if start.id == end.id {
            continue;
        }

        cycles.push(build_cycle(cycles.len() + 1, start, end, sorted));
    }

    cycles
}

#[allow(clippy::cast_precision_loss)]
fn build_cycle(
    cycle_number: usize,
    start: &PullRequest,
    end: &PullRequest,
    sorted: &[&PullRequest],
) -> Cycle {
    let elapsed_ms = (end.closed_date - start.closed_date).num_milliseconds();
    let hours = elapsed_ms as f64 / MILLIS_PER_HOUR;

    let member_prs: Vec<PullRequest> = sorted
        .iter()
        .filter(|pr| pr.closed_date >= start.closed_date && pr.closed_date <= end.closed_date)
        .map(|&pr| pr.clone())
        .collect();

    Cycle {
        cycle_number,
        start_pr: start.clone(),
        end_pr: end.clone(),
        lead_time_hours: round2(hours),
        lead_time_days: round2(hours / 24.0),
        total_prs_in_cycle: member_prs.len(),
        member_prs,
    }
}

#[allow(clippy::cast_precision_loss)]
fn summarize_cycles(cycles: &[Cycle], sorted: &[&PullRequest]) -> LeadTimeStatistics {
    let total_prs = sorted.len();
    if cycles.is_empty() {
        return LeadTimeStatistics {
            total_prs,
            ..LeadTimeStatistics::default()
        };
    }

    let mut hours: Vec<f64> = cycles.iter().map(|c| c.lead_time_hours).collect();
    hours.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let count = hours.len();
    let mean = hours.iter().sum::<f64>() / count as f64;

    LeadTimeStatistics {
        total_cycles: count,
        total_prs,
        avg_lead_time_hours: round2(mean),
        avg_lead_time_days: round2(mean / 24.0),
        // Upper-middle element for even counts
        median_lead_time_hours: hours[count / 2],
        min_lead_time_hours: hours[0],
        max_lead_time_hours: hours[count - 1],
        deployment_frequency: round2(count as f64 / span_days(sorted).max(1.0)),
    }
}

#[allow(clippy::cast_precision_loss)]
fn span_days(sorted: &[&PullRequest]) -> f64 {
    match (sorted.first(), sorted.last()) {
        (Some(first), Some(last)) => {
            (last.closed_date - first.closed_date).num_milliseconds() as f64 / MILLIS_PER_DAY
        }
        _ => 0.0,
    }
}

#[allow(clippy::cast_precision_loss)]
fn bucket_by_day(cycles: &[Cycle]) -> BTreeMap<String, DailyLeadTime> {
    let totals = cycles
        .iter()
        .fold(BTreeMap::new(), |mut days: BTreeMap<String, (usize, f64)>, cycle| {
            let day = days.entry(date_key(&cycle.end_pr.closed_date)).or_default();
            day.0 += 1;
            day.1 += cycle.lead_time_hours;
            days
        });

    totals
        .into_iter()
        .map(|(date, (count, total))| {
            (
                date,
                DailyLeadTime {
                    count,
                    total_lead_time: round2(total),
                    avg_lead_time: round2(total / count as f64),
                },
            )
        })
        .collect()
}
