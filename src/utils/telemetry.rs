// file: src/utils/telemetry.rs
// description: stage timing and pre-flight health reporting
// reference: tracing-based observability

use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    fn icon(self) -> &'static str {
        match self {
            Self::Healthy => "✓",
            Self::Degraded => "⚠",
            Self::Unhealthy => "✗",
        }
    }
}

/// Outcome of one pre-flight check (persona file, document folder, embedder…).
#[derive(Debug, Clone)]
pub struct HealthCheck {
    pub component: String,
    pub status: HealthStatus,
    pub message: Option<String>,
    pub response_time_ms: u64,
}

impl HealthCheck {
    fn new(
        component: &str,
        status: HealthStatus,
        message: Option<String>,
        response_time: Duration,
    ) -> Self {
        Self {
            component: component.to_string(),
            status,
            message,
            response_time_ms: response_time.as_millis() as u64,
        }
    }

    pub fn healthy(component: &str, message: Option<String>, response_time: Duration) -> Self {
        Self::new(component, HealthStatus::Healthy, message, response_time)
    }

    pub fn degraded(component: &str, message: String, response_time: Duration) -> Self {
        Self::new(component, HealthStatus::Degraded, Some(message), response_time)
    }

    pub fn unhealthy(component: &str, message: String, response_time: Duration) -> Self {
        Self::new(component, HealthStatus::Unhealthy, Some(message), response_time)
    }
}

#[derive(Debug, Clone)]
pub struct HealthReport {
    pub overall_status: HealthStatus,
    pub checks: Vec<HealthCheck>,
    pub generated_at: DateTime<Utc>,
    pub version: String,
}

impl HealthReport {
    pub fn new(checks: Vec<HealthCheck>, version: &str) -> Self {
        let overall_status = if checks.iter().any(|c| c.status == HealthStatus::Unhealthy) {
            HealthStatus::Unhealthy
        } else if checks.iter().any(|c| c.status == HealthStatus::Degraded) {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };

        Self {
            overall_status,
            checks,
            generated_at: Utc::now(),
            version: version.to_string(),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.overall_status != HealthStatus::Unhealthy
    }

    pub fn format(&self) -> String {
        let mut output = format!(
            "{} Pre-flight: {:?}\nVersion: {}\nGenerated: {}\n\n",
            self.overall_status.icon(),
            self.overall_status,
            self.version,
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        );

        for check in &self.checks {
            output.push_str(&format!(
                "{} {} ({:?}) - {}ms",
                check.status.icon(),
                check.component,
                check.status,
                check.response_time_ms
            ));
            if let Some(message) = &check.message {
                output.push_str(&format!("\n  {}", message));
            }
            output.push('\n');
        }

        output
    }
}

/// Logs start and completion of a named pipeline stage.
pub struct OperationTimer {
    operation: String,
    start: Instant,
}

impl OperationTimer {
    pub fn new(operation: &str) -> Self {
        info!("Starting: {}", operation);
        Self {
            operation: operation.to_string(),
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn finish(self) -> Duration {
        let elapsed = self.elapsed();
        info!(
            "Completed: {} in {:.2}s",
            self.operation,
            elapsed.as_secs_f64()
        );
        elapsed
    }

    pub fn finish_with_count(self, count: usize, unit: &str) -> Duration {
        let elapsed = self.elapsed();
        let secs = elapsed.as_secs_f64();
        info!(
            "Completed: {} - {} {} in {:.2}s ({:.2} {}/sec)",
            self.operation,
            count,
            unit,
            secs,
            if secs > 0.0 { count as f64 / secs } else { 0.0 },
            unit
        );
        elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_check_creation() {
        let check = HealthCheck::healthy("embedder", None, Duration::from_millis(50));
        assert_eq!(check.component, "embedder");
        assert_eq!(check.status, HealthStatus::Healthy);
        assert_eq!(check.response_time_ms, 50);
    }

    #[test]
    fn test_health_report_overall_status() {
        let checks = vec![
            HealthCheck::healthy("persona", None, Duration::from_millis(1)),
            HealthCheck::degraded("documents", "1 of 3 unreadable".to_string(), Duration::ZERO),
        ];
        let report = HealthReport::new(checks, "0.1.0");
        assert_eq!(report.overall_status, HealthStatus::Degraded);
        assert!(report.is_healthy());

        let report = HealthReport::new(
            vec![HealthCheck::unhealthy("persona", "missing".to_string(), Duration::ZERO)],
            "0.1.0",
        );
        assert!(!report.is_healthy());
        assert!(report.format().contains("missing"));
    }

    #[test]
    fn test_health_report_format_includes_timestamp_and_checks() {
        let report = HealthReport::new(
            vec![HealthCheck::healthy(
                "documents",
                Some("2 pdf files, 9 bytes".to_string()),
                Duration::from_millis(3),
            )],
            "0.1.0",
        );

        let rendered = report.format();
        let generated = report.generated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string();
        assert!(rendered.starts_with("✓ Pre-flight: Healthy\nVersion: 0.1.0\n"));
        assert!(rendered.contains(&format!("Generated: {}", generated)));
        assert!(rendered.contains("✓ documents (Healthy) - 3ms\n  2 pdf files, 9 bytes"));
    }

    #[test]
    fn test_operation_timer() {
        let timer = OperationTimer::new("test");
        std::thread::sleep(Duration::from_millis(10));
        assert!(timer.finish() >= Duration::from_millis(10));
    }
}
