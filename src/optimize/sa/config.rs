//! SA configuration.

/// Parameters of the annealing schedule.
///
/// # Builder
///
/// ```
/// use qroute::optimize::sa::SaConfig;
///
/// let config = SaConfig::default()
///     .with_temperatures(500.0, 0.1)
///     .with_cooling_rate(0.99);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct SaConfig {
    /// Initial temperature T₀.
    pub initial_temperature: f64,

    /// The loop stops when the temperature drops below this.
    pub final_temperature: f64,

    /// Geometric cooling factor α in (0, 1).
    pub cooling_rate: f64,

    /// Inner iterations at each temperature level.
    pub iterations_per_temperature: usize,

    /// Attempts at producing a valid neighbor before giving up on a move.
    pub neighbor_attempts: usize,

    /// Random walks tried for the initial solution pool.
    pub initial_walks: usize,
}

impl Default for SaConfig {
    fn default() -> Self {
        Self {
            initial_temperature: 1000.0,
            final_temperature: 0.01,
            cooling_rate: 0.995,
            iterations_per_temperature: 10,
            neighbor_attempts: 20,
            initial_walks: 5,
        }
    }
}

impl SaConfig {
    pub fn with_temperatures(mut self, initial: f64, fin: f64) -> Self {
        self.initial_temperature = initial;
        self.final_temperature = fin;
        self
    }

    pub fn with_cooling_rate(mut self, alpha: f64) -> Self {
        self.cooling_rate = alpha;
        self
    }

    pub fn with_iterations_per_temperature(mut self, n: usize) -> Self {
        self.iterations_per_temperature = n;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.initial_temperature <= 0.0 {
            return Err("initial_temperature must be positive".into());
        }
        if self.final_temperature <= 0.0 {
            return Err("final_temperature must be positive".into());
        }
        if self.final_temperature >= self.initial_temperature {
            return Err("final_temperature must be below initial_temperature".into());
        }
        if !(0.0 < self.cooling_rate && self.cooling_rate < 1.0) {
            return Err(format!(
                "cooling_rate must be in (0, 1), got {}",
                self.cooling_rate
            ));
        }
        if self.iterations_per_temperature == 0 {
            return Err("iterations_per_temperature must be at least 1".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SaConfig::default();
        assert!((config.initial_temperature - 1000.0).abs() < 1e-12);
        assert!((config.final_temperature - 0.01).abs() < 1e-12);
        assert!((config.cooling_rate - 0.995).abs() < 1e-12);
        assert_eq!(config.iterations_per_temperature, 10);
        assert_eq!(config.neighbor_attempts, 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_schedules() {
        assert!(SaConfig::default().with_temperatures(-1.0, 0.01).validate().is_err());
        assert!(SaConfig::default().with_temperatures(1.0, 2.0).validate().is_err());
        assert!(SaConfig::default().with_cooling_rate(1.0).validate().is_err());
    }
}
