use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::scenario::{Scenario, ScenarioCtx};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
    /// RFC 3339 time the first iteration started.
    pub started_at: String,
}

pub struct ScenarioRunner {
    verbose: bool,
}

impl ScenarioRunner {
    pub const fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    pub fn run(&self, scenario: &Scenario, ctx: &ScenarioCtx, iterations: usize) -> ScenarioResult {
        if self.verbose {
            println!(
                "🧪 Testing scenario: {} ({} iterations)",
                scenario.name.bright_white(),
                iterations
            );
        }

        let started_at = chrono::Utc::now().to_rfc3339();
        let mut failures = Vec::new();
        let mut successes = 0;
        let mut durations = Vec::with_capacity(iterations);

        for iteration in 0..iterations {
            let start = Instant::now();
            let outcome = (scenario.run)(ctx);
            durations.push(start.elapsed());

            match outcome {
                Ok(()) => {
                    successes += 1;
                    if self.verbose {
                        println!("  ✅ Iteration {} passed", iteration + 1);
                    }
                }
                Err(err) => {
                    log::debug!("{} iteration {} failed: {err:#}", scenario.key, iteration + 1);
                    if self.verbose {
                        println!("  ❌ Iteration {} failed: {err:#}", iteration + 1);
                    }
                    failures.push(format!("Iteration {}: {err:#}", iteration + 1));
                }
            }
        }

        let average_duration = if durations.is_empty() {
            Duration::ZERO
        } else {
            durations.iter().sum::<Duration>() / u32::try_from(durations.len()).unwrap_or(1)
        };

        ScenarioResult {
            scenario_name: scenario.name.to_string(),
            passed: failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: successes,
            failures,
            average_duration,
            started_at,
        }
    }
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_micros().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let micros = u128::deserialize(deserializer)?;
        Ok(Duration::from_micros(u64::try_from(micros).unwrap_or(0)))
    }
}
