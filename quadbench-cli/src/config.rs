//! Configuration loading from quad.toml
//!
//! Settings live in a `quad.toml` discovered by walking up from the
//! current directory; CLI flags override file values.

use quadbench_core::RemainderPolicy;
use quadbench_ipc::LogOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which execution strategy dispatches the quadrature tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Shared-memory worker threads in one address space.
    #[default]
    Threads,
    /// One isolated worker process per task, IPC over pipes.
    Processes,
}

impl std::str::FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "threads" | "thread" => Ok(Strategy::Threads),
            "processes" | "process" => Ok(Strategy::Processes),
            other => Err(format!("unknown strategy: {other}")),
        }
    }
}

/// Quadbench configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct QuadConfig {
    /// Integration run settings.
    #[serde(default)]
    pub runner: RunnerConfig,
    /// Timed-invocation log settings.
    #[serde(default)]
    pub log: LogOptions,
    /// Pipeline settings.
    #[serde(default)]
    pub pipeline: PipelineConfig,
    /// Report output settings.
    #[serde(default)]
    pub output: OutputConfig,
}

/// Integration run settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Lower integration bound.
    #[serde(default)]
    pub lower: f64,
    /// Upper integration bound.
    #[serde(default = "default_upper")]
    pub upper: f64,
    /// Registry name of the integrand.
    #[serde(default = "default_integrand")]
    pub integrand: String,
    /// Total left-rule iteration budget.
    #[serde(default = "default_iterations")]
    pub iterations: u64,
    /// Number of concurrent jobs; 0 means one per logical CPU.
    #[serde(default)]
    pub jobs: usize,
    /// Execution strategy: "threads" or "processes".
    #[serde(default)]
    pub strategy: Strategy,
    /// Remainder distribution: "first-job" (exact) or "inflate".
    #[serde(default)]
    pub remainder: RemainderPolicy,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            lower: 0.0,
            upper: default_upper(),
            integrand: default_integrand(),
            iterations: default_iterations(),
            jobs: 0,
            strategy: Strategy::default(),
            remainder: RemainderPolicy::default(),
        }
    }
}

fn default_upper() -> f64 {
    std::f64::consts::FRAC_PI_2
}
fn default_integrand() -> String {
    "cos".to_string()
}
fn default_iterations() -> u64 {
    10_000_000
}

/// Pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Stage A's fixed artificial delay per message (e.g. "5s").
    #[serde(default = "default_stage_delay")]
    pub stage_delay: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stage_delay: default_stage_delay(),
        }
    }
}

fn default_stage_delay() -> String {
    "5s".to_string()
}

/// Report output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Path of the plain-text benchmark report.
    #[serde(default = "default_report_path")]
    pub report_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            report_path: default_report_path(),
        }
    }
}

fn default_report_path() -> String {
    "target/quadbench/report.txt".to_string()
}

impl QuadConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Discover and load `quad.toml` by walking up from the current
    /// directory.
    pub fn discover() -> Option<Self> {
        let mut dir = std::env::current_dir().ok()?;
        loop {
            let config_path = dir.join("quad.toml");
            if config_path.exists() {
                return Self::load(&config_path).ok();
            }
            if !dir.pop() {
                break;
            }
        }
        None
    }

    /// Resolve the effective job count: explicit values win, 0 falls
    /// back to the number of logical CPUs.
    pub fn effective_jobs(&self) -> usize {
        if self.runner.jobs > 0 {
            self.runner.jobs
        } else {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(1)
        }
    }

    /// Parse a duration string (e.g. "3s", "500ms", "2m") to a
    /// [`std::time::Duration`].
    pub fn parse_duration(s: &str) -> anyhow::Result<std::time::Duration> {
        let s = s.trim();
        if s.is_empty() {
            return Err(anyhow::anyhow!("empty duration string"));
        }

        let (num_part, unit_part) = s
            .char_indices()
            .find(|(_, c)| c.is_alphabetic())
            .map(|(i, _)| s.split_at(i))
            .unwrap_or((s, "s"));

        let value: f64 = num_part
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid duration number: {num_part}"))?;

        let nanos_per_unit: u64 = match unit_part.to_lowercase().as_str() {
            "ns" => 1,
            "us" => 1_000,
            "ms" => 1_000_000,
            "s" | "" => 1_000_000_000,
            "m" | "min" => 60_000_000_000,
            _ => return Err(anyhow::anyhow!("unknown duration unit: {unit_part}")),
        };

        Ok(std::time::Duration::from_nanos(
            (value * nanos_per_unit as f64) as u64,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn defaults_cover_the_cosine_scenario() {
        let config = QuadConfig::default();
        assert_eq!(config.runner.lower, 0.0);
        assert!((config.runner.upper - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
        assert_eq!(config.runner.integrand, "cos");
        assert_eq!(config.runner.iterations, 10_000_000);
        assert_eq!(config.runner.strategy, Strategy::Threads);
        assert_eq!(config.runner.remainder, RemainderPolicy::FirstJob);
        assert!(config.log.duration);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let toml_str = r#"
            [runner]
            integrand = "sin"
            jobs = 4
            strategy = "processes"
            remainder = "inflate"

            [log]
            params = false
        "#;

        let config: QuadConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.runner.integrand, "sin");
        assert_eq!(config.runner.jobs, 4);
        assert_eq!(config.runner.strategy, Strategy::Processes);
        assert_eq!(config.runner.remainder, RemainderPolicy::Inflate);
        assert!(!config.log.params);
        assert!(config.log.duration);
        assert_eq!(config.output.report_path, "target/quadbench/report.txt");
    }

    #[test]
    fn effective_jobs_prefers_explicit_value() {
        let mut config = QuadConfig::default();
        config.runner.jobs = 3;
        assert_eq!(config.effective_jobs(), 3);

        config.runner.jobs = 0;
        assert!(config.effective_jobs() >= 1);
    }

    #[test]
    fn strategy_parses_from_cli_strings() {
        assert_eq!("threads".parse::<Strategy>().unwrap(), Strategy::Threads);
        assert_eq!("process".parse::<Strategy>().unwrap(), Strategy::Processes);
        assert!("gpu".parse::<Strategy>().is_err());
    }

    #[test]
    fn duration_strings_parse() {
        assert_eq!(
            QuadConfig::parse_duration("3s").unwrap(),
            Duration::from_secs(3)
        );
        assert_eq!(
            QuadConfig::parse_duration("500ms").unwrap(),
            Duration::from_millis(500)
        );
        assert_eq!(
            QuadConfig::parse_duration("2m").unwrap(),
            Duration::from_secs(120)
        );
        assert_eq!(
            QuadConfig::parse_duration("1.5s").unwrap(),
            Duration::from_millis(1500)
        );
        assert!(QuadConfig::parse_duration("").is_err());
        assert!(QuadConfig::parse_duration("3h").is_err());
    }
}
