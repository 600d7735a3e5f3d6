//! PSO configuration.

/// Parameters of the swarm.
#[derive(Debug, Clone)]
pub struct PsoConfig {
    pub n_particles: usize,
    pub n_iterations: usize,

    /// Inertia weight w: pull toward the particle's own current path.
    pub inertia: f64,

    /// Cognitive coefficient c₁: pull toward the personal best.
    pub cognitive: f64,

    /// Social coefficient c₂: pull toward the global best.
    pub social: f64,

    /// Stagnant iterations before early termination.
    pub stagnation_limit: usize,
}

impl Default for PsoConfig {
    fn default() -> Self {
        Self {
            n_particles: 30,
            n_iterations: 100,
            inertia: 0.7,
            cognitive: 1.5,
            social: 1.5,
            stagnation_limit: 15,
        }
    }
}

impl PsoConfig {
    pub fn with_particles(mut self, n: usize) -> Self {
        self.n_particles = n;
        self
    }

    pub fn with_iterations(mut self, n: usize) -> Self {
        self.n_iterations = n;
        self
    }

    pub fn with_coefficients(mut self, inertia: f64, cognitive: f64, social: f64) -> Self {
        self.inertia = inertia;
        self.cognitive = cognitive;
        self.social = social;
        self
    }

    pub fn with_stagnation_limit(mut self, n: usize) -> Self {
        self.stagnation_limit = n;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.n_particles == 0 {
            return Err("n_particles must be at least 1".into());
        }
        if self.n_iterations == 0 {
            return Err("n_iterations must be at least 1".into());
        }
        for (name, c) in [
            ("inertia", self.inertia),
            ("cognitive", self.cognitive),
            ("social", self.social),
        ] {
            if !c.is_finite() || c < 0.0 {
                return Err(format!("{name} coefficient must be non-negative, got {c}"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PsoConfig::default();
        assert_eq!(config.n_particles, 30);
        assert_eq!(config.n_iterations, 100);
        assert!((config.inertia - 0.7).abs() < 1e-12);
        assert!((config.cognitive - 1.5).abs() < 1e-12);
        assert!((config.social - 1.5).abs() < 1e-12);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(PsoConfig::default().with_particles(0).validate().is_err());
        assert!(PsoConfig::default()
            .with_coefficients(-0.1, 1.5, 1.5)
            .validate()
            .is_err());
    }
}
