// ABOUTME: Output formatting for CLI feedback.
// ABOUTME: Supports normal, quiet (CI), and JSON output modes.

use serde::Serialize;
use std::time::Instant;

use crate::provision::{NotificationOutcome, ProvisioningReport};
use crate::steps::{StepStatus, StepUpdate};

/// Output mode for CLI feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-friendly output with progress messages
    Normal,
    /// Minimal output for CI (only final result)
    Quiet,
    /// JSON lines for scripting
    Json,
}

impl OutputMode {
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if json {
            OutputMode::Json
        } else if quiet {
            OutputMode::Quiet
        } else {
            OutputMode::Normal
        }
    }
}

/// Handles CLI output based on the configured mode.
pub struct Output {
    mode: OutputMode,
    start_time: Option<Instant>,
}

impl Output {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            start_time: None,
        }
    }

    /// Start timing an operation.
    pub fn start_timer(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Get elapsed time since timer started.
    pub fn elapsed_secs(&self) -> f64 {
        self.start_time
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    fn duration(&self) -> Option<f64> {
        self.start_time.map(|_| self.elapsed_secs())
    }

    /// Print a progress message (suppressed in quiet/json mode).
    pub fn progress(&self, message: &str) {
        if self.mode == OutputMode::Normal {
            println!("{message}");
        }
    }

    /// Print one step update as it happens.
    pub fn step(&self, update: &StepUpdate) {
        match self.mode {
            OutputMode::Normal => {
                let marker = match update.status {
                    StepStatus::Pending => " ",
                    StepStatus::InProgress => "→",
                    StepStatus::Completed => "✓",
                    StepStatus::Failed => "✗",
                };
                println!(
                    "  {marker} [{:>3}%] {}: {}",
                    update.progress, update.step_name, update.message
                );
            }
            OutputMode::Quiet => {}
            OutputMode::Json => emit(&StepEvent {
                event: "step",
                update,
            }),
        }
    }

    /// Print a success message with optional timing.
    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Normal => {
                let elapsed = self.elapsed_secs();
                if elapsed > 0.0 {
                    println!("{message} ({:.1}s)", elapsed);
                } else {
                    println!("{message}");
                }
            }
            OutputMode::Quiet => {
                // Print only the essential result
                println!("{message}");
            }
            OutputMode::Json => emit(&JsonEvent {
                event: "success",
                message,
                duration_secs: self.duration(),
            }),
        }
    }

    /// Print a non-fatal warning.
    pub fn warning(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => eprintln!("Warning: {message}"),
            OutputMode::Json => emit(&JsonEvent {
                event: "warning",
                message,
                duration_secs: None,
            }),
        }
    }

    /// Print an error message.
    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => {
                eprintln!("Error: {message}");
            }
            OutputMode::Json => {
                let event = JsonEvent {
                    event: "error",
                    message,
                    duration_secs: self.duration(),
                };
                if let Ok(json) = serde_json::to_string(&event) {
                    eprintln!("{json}");
                }
            }
        }
    }

    /// Print the summary of a finished run.
    pub fn report(&self, report: &ProvisioningReport) {
        match self.mode {
            OutputMode::Normal => {
                println!();
                println!("Site:        {}", report.url);
                println!("Repository:  {}", report.repository.html_url);
                println!("Database:    {}", report.database.api_url);
                println!(
                    "DNS:         {} {} {} ({} records pushed)",
                    report.binding.record.host_name,
                    report.binding.record.record_type.as_str(),
                    report.binding.record.address,
                    report.binding.records_pushed
                );
                if let NotificationOutcome::Failed { reason } = &report.notification {
                    println!("Notice:      not delivered ({reason})");
                }
                for warning in &report.warnings {
                    self.warning(&warning.message);
                }
                let headline = if report.still_building() {
                    format!("Provisioned {} (deployment still building)", report.fqdn)
                } else {
                    format!("Provisioned {}", report.fqdn)
                };
                self.success(&headline);
            }
            OutputMode::Quiet => println!("{}", report.url),
            OutputMode::Json => emit(&ReportEvent {
                event: "report",
                report,
                duration_secs: self.duration(),
            }),
        }
    }

    /// Print structured data: pretty JSON in json mode, otherwise the given lines.
    pub fn data<T: Serialize>(&self, value: &T, lines: &[String]) {
        match self.mode {
            OutputMode::Json => {
                if let Ok(json) = serde_json::to_string_pretty(value) {
                    println!("{json}");
                }
            }
            OutputMode::Normal | OutputMode::Quiet => {
                for line in lines {
                    println!("{line}");
                }
            }
        }
    }
}

fn emit<T: Serialize>(event: &T) {
    if let Ok(json) = serde_json::to_string(event) {
        println!("{json}");
    }
}

#[derive(Serialize)]
struct JsonEvent<'a> {
    event: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_secs: Option<f64>,
}

#[derive(Serialize)]
struct StepEvent<'a> {
    event: &'a str,
    #[serde(flatten)]
    update: &'a StepUpdate,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReportEvent<'a> {
    event: &'a str,
    #[serde(flatten)]
    report: &'a ProvisioningReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_secs: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::JobId;

    #[test]
    fn json_flag_wins_over_quiet() {
        assert_eq!(OutputMode::from_flags(true, true), OutputMode::Json);
        assert_eq!(OutputMode::from_flags(false, true), OutputMode::Quiet);
        assert_eq!(OutputMode::from_flags(false, false), OutputMode::Normal);
    }

    #[test]
    fn step_event_flattens_update() {
        let update = StepUpdate {
            job_id: JobId::new("job-1"),
            step_name: "deploy".to_string(),
            status: StepStatus::InProgress,
            message: "building".to_string(),
            progress: 65,
        };
        let json = serde_json::to_value(StepEvent {
            event: "step",
            update: &update,
        })
        .unwrap();

        assert_eq!(json["event"], "step");
        assert_eq!(json["jobId"], "job-1");
        assert_eq!(json["stepName"], "deploy");
        assert_eq!(json["status"], "in-progress");
        assert_eq!(json["progress"], 65);
    }
}
