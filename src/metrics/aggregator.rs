//! Folds export blocks into a single record per target URL
//!
//! Every metric is read through an ordered list of candidate field names
//! because the upstream has renamed fields across schema revisions.
//! Unknown blocks and malformed values never fail the fold; they only
//! contribute zero.

use super::classify::text_field;
use super::coerce::pick_first_non_zero;
use super::normalize::normalize_url;
use crate::models::{AggregatedRecord, GroupMetrics, MetricBlock, Row};

const URL_FIELDS: &[&str] = &["URL", "Url", "url"];

const SESSION_COUNT_FIELDS: &[&str] = &["totalSessionCount", "TotalSessionCount"];
const BOT_SESSION_COUNT_FIELDS: &[&str] = &["totalBotSessionCount", "TotalBotSessionCount"];
const DISTINCT_USER_FIELDS: &[&str] = &["distinctUserCount", "DistinctUserCount"];
const PAGES_PER_SESSION_FIELDS: &[&str] = &[
    "pagesPerSessionPercentage",
    "PagesPerSessionPercentage",
    "pagesPerSession",
];

const TOTAL_TIME_FIELDS: &[&str] = &["totalTime", "TotalTime"];
const ACTIVE_TIME_FIELDS: &[&str] = &["activeTime", "ActiveTime"];

const SCROLL_DEPTH_FIELDS: &[&str] =
    &["averageScrollDepth", "AverageScrollDepth", "avgScrollDepth"];

const GROUP_SESSIONS_FIELDS: &[&str] = &["sessionsCount", "SessionsCount"];
const GROUP_WITH_METRIC_FIELDS: &[&str] = &[
    "sessionsWithMetricPercentage",
    "SessionsWithMetricPercentage",
];
const GROUP_WITHOUT_METRIC_FIELDS: &[&str] = &[
    "sessionsWithoutMetricPercentage",
    "SessionsWithoutMetricPercentage",
];
const GROUP_PAGE_VIEWS_FIELDS: &[&str] = &["pagesViews", "PagesViews", "pageViews"];
const GROUP_SUB_TOTAL_FIELDS: &[&str] = &["subTotal", "SubTotal"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GroupKind {
    RageClick,
    DeadClick,
    ExcessiveScroll,
    QuickbackClick,
    ScriptError,
    ErrorClick,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    Traffic,
    EngagementTime,
    ScrollDepth,
    Group(GroupKind),
    Other,
}

impl BlockKind {
    fn from_name(name: &str) -> Self {
        let compact: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();

        match compact.as_str() {
            "traffic" => BlockKind::Traffic,
            "engagementtime" => BlockKind::EngagementTime,
            "scrolldepth" => BlockKind::ScrollDepth,
            "rageclickcount" | "rageclick" => BlockKind::Group(GroupKind::RageClick),
            "deadclickcount" | "deadclick" => BlockKind::Group(GroupKind::DeadClick),
            "excessivescroll" => BlockKind::Group(GroupKind::ExcessiveScroll),
            "quickbackclick" => BlockKind::Group(GroupKind::QuickbackClick),
            "scripterrorcount" | "scripterror" => BlockKind::Group(GroupKind::ScriptError),
            "errorclickcount" | "errorclick" => BlockKind::Group(GroupKind::ErrorClick),
            _ => BlockKind::Other,
        }
    }
}

/// Sum/count pair; only strictly positive readings count toward the mean
#[derive(Debug, Default, Clone, Copy)]
struct RunningMean {
    sum: f64,
    count: u64,
}

impl RunningMean {
    fn push(&mut self, value: f64) {
        if value > 0.0 {
            self.sum += value;
            self.count += 1;
        }
    }

    fn rounded(&self) -> Option<f64> {
        (self.count > 0).then(|| (self.sum / self.count as f64).round())
    }
}

#[derive(Debug, Default)]
struct Accumulator {
    record: AggregatedRecord,
    pages_per_session: RunningMean,
    scroll_depth: RunningMean,
}

impl Accumulator {
    fn fold(&mut self, kind: BlockKind, row: &Row) {
        self.record.matched_rows += 1;

        let record = &mut self.record;
        match kind {
            BlockKind::Traffic => {
                record.total_session_count += pick_first_non_zero(row, SESSION_COUNT_FIELDS);
                record.total_bot_session_count +=
                    pick_first_non_zero(row, BOT_SESSION_COUNT_FIELDS);
                record.distinct_user_count += pick_first_non_zero(row, DISTINCT_USER_FIELDS);
                self.pages_per_session
                    .push(pick_first_non_zero(row, PAGES_PER_SESSION_FIELDS));
            }
            BlockKind::EngagementTime => {
                record.total_time += pick_first_non_zero(row, TOTAL_TIME_FIELDS);
                record.active_time += pick_first_non_zero(row, ACTIVE_TIME_FIELDS);
            }
            BlockKind::ScrollDepth => {
                self.scroll_depth
                    .push(pick_first_non_zero(row, SCROLL_DEPTH_FIELDS));
            }
            BlockKind::Group(group) => add_group_row(group_mut(record, group), row),
            BlockKind::Other => {}
        }
    }

    fn finish(mut self) -> AggregatedRecord {
        let record = &mut self.record;

        if let Some(mean) = self.pages_per_session.rounded() {
            record.pages_per_session_percentage = mean;
        }
        if let Some(mean) = self.scroll_depth.rounded() {
            record.average_scroll_depth = mean;
        }

        if record.total_session_count > 0.0 {
            if record.total_time > 0.0 {
                record.avg_session_duration_sec =
                    (record.total_time / record.total_session_count).round();
            }
            if record.active_time > 0.0 {
                record.active_time_per_session_sec =
                    (record.active_time / record.total_session_count).round();
            }
        }

        self.record
    }
}

fn group_mut(record: &mut AggregatedRecord, group: GroupKind) -> &mut GroupMetrics {
    match group {
        GroupKind::RageClick => &mut record.rage_click,
        GroupKind::DeadClick => &mut record.dead_click,
        GroupKind::ExcessiveScroll => &mut record.excessive_scroll,
        GroupKind::QuickbackClick => &mut record.quickback_click,
        GroupKind::ScriptError => &mut record.script_error,
        GroupKind::ErrorClick => &mut record.error_click,
    }
}

fn add_group_row(group: &mut GroupMetrics, row: &Row) {
    group.sessions_count += pick_first_non_zero(row, GROUP_SESSIONS_FIELDS);
    group.sessions_with_metric_percentage += pick_first_non_zero(row, GROUP_WITH_METRIC_FIELDS);
    group.sessions_without_metric_percentage +=
        pick_first_non_zero(row, GROUP_WITHOUT_METRIC_FIELDS);
    group.pages_views += pick_first_non_zero(row, GROUP_PAGE_VIEWS_FIELDS);
    group.sub_total += pick_first_non_zero(row, GROUP_SUB_TOTAL_FIELDS);
}

/// Normalized URL of a row, or "" when it carries none
fn row_url_key(row: &Row) -> String {
    normalize_url(text_field(row, URL_FIELDS))
}

/// Aggregate every row matching `target_url` (and `predicate`, if given).
///
/// Means are rounded half away from zero.
pub fn aggregate(
    blocks: &[MetricBlock],
    target_url: &str,
    predicate: Option<&dyn Fn(&Row) -> bool>,
) -> AggregatedRecord {
    let target = normalize_url(target_url);
    let mut acc = Accumulator::default();
    acc.record.url = target.clone();

    if target.is_empty() {
        return acc.finish();
    }

    for block in blocks {
        let kind = BlockKind::from_name(&block.name);

        for row in &block.rows {
            if let Some(predicate) = predicate {
                if !predicate(row) {
                    continue;
                }
            }

            let key = row_url_key(row);
            if key.is_empty() || key != target {
                continue;
            }

            acc.fold(kind, row);
        }
    }

    acc.finish()
}
