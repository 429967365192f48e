use crate::commands::{CmdMessage, CmdResult};
use crate::error::{Result, StudioError};
use crate::model::{MetricData, MetricsSummary};
use crate::store::DocumentStore;

pub fn add<S: DocumentStore>(store: &mut S, metric: MetricData) -> Result<CmdResult> {
    if !metric.ai_generate_time_minutes.is_finite() || metric.ai_generate_time_minutes < 0.0 {
        return Err(StudioError::Validation(format!(
            "AI generation time must be a non-negative number, got {}",
            metric.ai_generate_time_minutes
        )));
    }
    if metric.resolved_comments_count > metric.review_comments_count {
        return Err(StudioError::Validation(format!(
            "Resolved comments ({}) exceed review comments ({})",
            metric.resolved_comments_count, metric.review_comments_count
        )));
    }

    let mut metrics = store.load_metrics()?;
    metrics.push(metric.clone());
    store.save_metrics(&metrics)?;

    let mut result = CmdResult::default().with_metrics(vec![metric.clone()]);
    result.add_message(CmdMessage::success(format!(
        "Recorded session for {}",
        metric.date
    )));
    Ok(result)
}

pub fn list<S: DocumentStore>(store: &S) -> Result<CmdResult> {
    let metrics = store.load_metrics()?;
    let mut result = CmdResult::default();
    if metrics.is_empty() {
        result.add_message(CmdMessage::info("No sessions recorded."));
    }
    Ok(result.with_metrics(metrics))
}

pub fn clear<S: DocumentStore>(store: &mut S) -> Result<CmdResult> {
    let count = store.load_metrics()?.len();
    store.save_metrics(&[])?;
    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!("Cleared {} sessions", count)));
    Ok(result)
}

pub fn summary<S: DocumentStore>(store: &S) -> Result<CmdResult> {
    let metrics = store.load_metrics()?;
    Ok(CmdResult::default().with_summary(summarize(&metrics)))
}

/// Totals and ratios over all sessions. All zeros for no sessions.
pub fn summarize(metrics: &[MetricData]) -> MetricsSummary {
    if metrics.is_empty() {
        return MetricsSummary::default();
    }

    let total_sessions = metrics.len();
    let total_time: f64 = metrics.iter().map(|m| m.ai_generate_time_minutes).sum();
    let total_ai_lines: f64 = metrics.iter().map(|m| m.ai_lines_of_code as f64).sum();
    let total_manual_lines: f64 = metrics.iter().map(|m| m.manual_lines_of_code as f64).sum();
    let total_reviews: f64 = metrics.iter().map(|m| m.review_comments_count as f64).sum();
    let total_resolved: f64 = metrics
        .iter()
        .map(|m| m.resolved_comments_count as f64)
        .sum();

    let ai_efficiency = if total_manual_lines > 0.0 {
        total_ai_lines / (total_ai_lines + total_manual_lines) * 100.0
    } else {
        100.0
    };
    let resolved_rate = if total_reviews > 0.0 {
        total_resolved / total_reviews * 100.0
    } else {
        0.0
    };

    MetricsSummary {
        total_sessions,
        avg_ai_time: total_time / total_sessions as f64,
        total_ai_lines,
        total_manual_lines,
        ai_efficiency,
        total_reviews,
        resolved_rate,
    }
}
