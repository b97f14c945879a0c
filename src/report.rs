use std::io::{self, Write};
use std::time::Duration;

use owo_colors::OwoColorize;

use crate::config::{OutputConfig, OutputMode};
use crate::types::{MetricSet, Outcome};

const LABEL_COL_WIDTH: usize = 20;

/// Per-workload session report.
#[derive(Clone, Debug)]
pub struct Report {
    pub workload: String,
    pub pod: Option<String>,
    pub metrics: MetricSet,
}

pub fn emit(report: &Report, out: &OutputConfig) -> io::Result<()> {
    let line = match out.mode {
        OutputMode::Human => format_human(report, out.color),
        OutputMode::Json => format_json(report),
    };

    let stdout = io::stdout();
    let mut w = stdout.lock();
    match w
        .write_all(line.as_bytes())
        .and_then(|()| w.write_all(b"\n"))
    {
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    }
}

fn format_json(report: &Report) -> String {
    let m = &report.metrics;

    let obj = serde_json::json!({
        "workload": report.workload,
        "pod": report.pod,
        "outcome": m.outcome,
        "scheduling_delay_ms": ms(m.scheduling_delay),
        "image_pull": m.image_pull,
        "container_start_delay_ms": ms(m.container_start_delay),
        "total_run_ms": ms(m.total_run),
    });

    obj.to_string()
}

fn format_human(report: &Report, color: bool) -> String {
    let m = &report.metrics;

    let label = pad_label(&report.workload, LABEL_COL_WIDTH);
    let outcome = outcome_label(m.outcome, color);

    format!(
        "{label} outcome={outcome} scheduling_delay={} image_pull={} container_start={} total_run={}",
        fmt_duration(m.scheduling_delay),
        m.image_pull.as_deref().unwrap_or("unavailable"),
        fmt_duration(m.container_start_delay),
        fmt_duration(m.total_run),
    )
}

fn outcome_label(outcome: Outcome, color: bool) -> String {
    let plain = match outcome {
        Outcome::Succeeded => "Succeeded",
        Outcome::Failed => "Failed",
        Outcome::Aborted => "Aborted",
    };

    if !color {
        return plain.to_string();
    }

    match outcome {
        Outcome::Succeeded => plain.bright_green().to_string(),
        Outcome::Failed => plain.bright_red().to_string(),
        Outcome::Aborted => plain.bright_yellow().to_string(),
    }
}

fn fmt_duration(d: Option<Duration>) -> String {
    match d {
        Some(d) => format!("{}ms", d.as_millis()),
        None => "unavailable".to_string(),
    }
}

fn ms(d: Option<Duration>) -> Option<u64> {
    d.map(|d| d.as_millis() as u64)
}

fn pad_label(s: &str, width: usize) -> String {
    if s.len() >= width {
        s.to_string()
    } else {
        format!("{s:<width$}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(outcome: Outcome) -> Report {
        Report {
            workload: "bin-bash".into(),
            pod: Some("bin-bash".into()),
            metrics: MetricSet {
                scheduling_delay: Some(Duration::from_millis(120)),
                image_pull: Some("850ms".into()),
                container_start_delay: None,
                total_run: Some(Duration::from_millis(4500)),
                outcome,
            },
        }
    }

    #[test]
    fn json_report_keeps_absent_metrics_null() {
        let line = format_json(&report(Outcome::Succeeded));
        let v: serde_json::Value = serde_json::from_str(&line).unwrap();

        assert_eq!(v["workload"], "bin-bash");
        assert_eq!(v["outcome"], "Succeeded");
        assert_eq!(v["scheduling_delay_ms"], 120);
        assert_eq!(v["image_pull"], "850ms");
        assert!(v["container_start_delay_ms"].is_null());
        assert_eq!(v["total_run_ms"], 4500);
    }

    #[test]
    fn human_report_spells_out_unavailable() {
        let line = format_human(&report(Outcome::Failed), false);
        assert!(line.contains("outcome=Failed"));
        assert!(line.contains("scheduling_delay=120ms"));
        assert!(line.contains("container_start=unavailable"));
        assert!(line.contains("image_pull=850ms"));
    }
}
