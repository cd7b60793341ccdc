//! The single streaming pass over `tool.calls.jsonl` that produces
//! [`Metrics`](zcl_schema::report::Metrics).

use std::collections::BTreeMap;

use zcl_schema::report::Metrics;
use zcl_schema::trace::TraceEvent;

const TIMEOUT_CODE: &str = "ZCL_E_TIMEOUT";

pub(crate) fn compute(events: &[TraceEvent]) -> Metrics {
    let mut m = Metrics {
        tool_calls_total: events.len() as u64,
        ..Metrics::default()
    };

    let mut durations: Vec<u64> = Vec::with_capacity(events.len());
    let mut retry_groups: BTreeMap<(String, String, String), (u64, bool)> = BTreeMap::new();

    for event in events {
        *m.tool_calls_by_tool.entry(event.tool.clone()).or_insert(0) += 1;
        *m.tool_calls_by_op.entry(event.op.clone()).or_insert(0) += 1;

        if !event.result.ok {
            m.failures_total += 1;
            let code = event.result.code.clone().unwrap_or_else(|| "UNKNOWN".to_string());
            *m.failures_by_code.entry(code.clone()).or_insert(0) += 1;
            if code == TIMEOUT_CODE {
                m.timeouts_total += 1;
            }
        }

        m.out_bytes_total += event.io.out_bytes;
        m.err_bytes_total += event.io.err_bytes;

        let truncated = event.integrity.as_ref().is_some_and(|i| i.truncated);
        if truncated && event.io.out_preview.is_some() {
            m.out_preview_truncated_total += 1;
        }
        if truncated && event.io.err_preview.is_some() {
            m.err_preview_truncated_total += 1;
        }

        durations.push(event.result.duration_ms);

        let canonical_input = serde_json_canonicalizer::to_string(&event.input)
            .unwrap_or_else(|_| event.input.to_string());
        let key = (event.tool.clone(), event.op.clone(), canonical_input);
        let slot = retry_groups.entry(key).or_insert((0, false));
        slot.0 += 1;
        slot.1 |= !event.result.ok;
    }

    m.retries_total = retry_groups
        .values()
        .filter(|(count, had_failure)| *count > 1 && *had_failure)
        .map(|(count, _)| count - 1)
        .sum();

    m.duration_ms_total = durations.iter().sum();
    if !durations.is_empty() {
        durations.sort_unstable();
        m.duration_ms_min = durations[0];
        m.duration_ms_max = durations[durations.len() - 1];
        m.duration_ms_avg = m.duration_ms_total as f64 / durations.len() as f64;
        m.duration_ms_p50 = percentile(&durations, 0.50);
        m.duration_ms_p95 = percentile(&durations, 0.95);
    }

    m.wall_time_ms = wall_time_ms(events);

    m
}

/// Linear interpolation between the two closest ranks, on an already
/// sorted slice.
fn percentile(sorted: &[u64], p: f64) -> f64 {
    if sorted.len() == 1 {
        return sorted[0] as f64;
    }
    let rank = p * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        return sorted[lower] as f64;
    }
    let frac = rank - lower as f64;
    let lo = sorted[lower] as f64;
    let hi = sorted[upper] as f64;
    lo + frac * (hi - lo)
}

fn wall_time_ms(events: &[TraceEvent]) -> u64 {
    let instants: Vec<chrono::DateTime<chrono::Utc>> = events
        .iter()
        .filter_map(|e| chrono::DateTime::parse_from_rfc3339(&e.ts).ok())
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .collect();
    if instants.is_empty() {
        return 0;
    }
    let min = instants.iter().min().unwrap();
    let max = instants.iter().max().unwrap();
    (*max - *min).num_milliseconds().max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use zcl_schema::trace::{TraceIo, TraceResult};

    fn event(tool: &str, op: &str, ok: bool, duration_ms: u64, ts: &str) -> TraceEvent {
        TraceEvent {
            v: 1,
            ts: ts.to_string(),
            run_id: "r".into(),
            suite_id: "s".into(),
            mission_id: "m".into(),
            attempt_id: "a".into(),
            agent_id: None,
            tool: tool.to_string(),
            op: op.to_string(),
            input: json!({"k": "v"}),
            enrichment: None,
            result: TraceResult {
                ok,
                duration_ms,
                code: if ok { None } else { Some("ZCL_E_TIMEOUT".to_string()) },
                exit_code: None,
            },
            io: TraceIo {
                out_bytes: 10,
                err_bytes: 0,
                out_preview: None,
                err_preview: None,
            },
            integrity: None,
            redactions_applied: Vec::new(),
        }
    }

    #[test]
    fn empty_trace_has_zeroed_metrics() {
        let m = compute(&[]);
        assert_eq!(m.tool_calls_total, 0);
        assert_eq!(m.duration_ms_p50, 0.0);
        assert_eq!(m.wall_time_ms, 0);
    }

    #[test]
    fn counts_totals_and_failures() {
        let events = vec![
            event("cli", "run", true, 100, "2026-01-01T00:00:00Z"),
            event("cli", "run", false, 200, "2026-01-01T00:00:01Z"),
        ];
        let m = compute(&events);
        assert_eq!(m.tool_calls_total, 2);
        assert_eq!(m.failures_total, 1);
        assert_eq!(m.timeouts_total, 1);
        assert_eq!(m.duration_ms_total, 300);
        assert_eq!(m.duration_ms_min, 100);
        assert_eq!(m.duration_ms_max, 200);
        assert_eq!(m.wall_time_ms, 1000);
    }

    #[test]
    fn retries_counted_when_group_has_a_failure() {
        let events = vec![
            event("cli", "run", false, 10, "2026-01-01T00:00:00Z"),
            event("cli", "run", true, 10, "2026-01-01T00:00:01Z"),
        ];
        let m = compute(&events);
        assert_eq!(m.retries_total, 1);
    }

    #[test]
    fn repeated_success_without_failure_is_not_a_retry() {
        let events = vec![
            event("cli", "run", true, 10, "2026-01-01T00:00:00Z"),
            event("cli", "run", true, 10, "2026-01-01T00:00:01Z"),
        ];
        let m = compute(&events);
        assert_eq!(m.retries_total, 0);
    }
}
