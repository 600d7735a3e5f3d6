//! ACO configuration.

/// Parameters of the colony.
///
/// # Builder
///
/// ```
/// use qroute::optimize::aco::AcoConfig;
///
/// let config = AcoConfig::default().with_ants(20).with_iterations(50);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct AcoConfig {
    pub n_ants: usize,
    pub n_iterations: usize,

    /// Pheromone exponent at the first iteration.
    pub alpha: f64,
    /// Pheromone exponent at the last iteration (linear schedule; set equal
    /// to `alpha` to disable adaptation).
    pub alpha_final: f64,

    /// Heuristic exponent at the first iteration.
    pub beta: f64,
    /// Heuristic exponent at the last iteration.
    pub beta_final: f64,

    /// Evaporation rate ρ in (0, 1).
    pub evaporation: f64,

    /// Deposit constant Q: a successful ant adds `Q / cost` to its edges.
    pub deposit: f64,

    /// Clamp pheromone into the MMAS band `[τ_max / (2|V|), τ_max]` with
    /// `τ_max = 1 / (ρ · best_cost)`.
    pub mmas: bool,

    /// Stagnant iterations before early termination.
    pub stagnation_limit: usize,
}

impl Default for AcoConfig {
    fn default() -> Self {
        Self {
            n_ants: 50,
            n_iterations: 100,
            alpha: 1.0,
            alpha_final: 2.0,
            beta: 2.0,
            beta_final: 1.0,
            evaporation: 0.5,
            deposit: 100.0,
            mmas: false,
            stagnation_limit: 15,
        }
    }
}

impl AcoConfig {
    pub fn with_ants(mut self, n: usize) -> Self {
        self.n_ants = n;
        self
    }

    pub fn with_iterations(mut self, n: usize) -> Self {
        self.n_iterations = n;
        self
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self.alpha_final = alpha;
        self
    }

    pub fn with_beta(mut self, beta: f64) -> Self {
        self.beta = beta;
        self.beta_final = beta;
        self
    }

    pub fn with_evaporation(mut self, rho: f64) -> Self {
        self.evaporation = rho;
        self
    }

    pub fn with_mmas(mut self, enabled: bool) -> Self {
        self.mmas = enabled;
        self
    }

    pub fn with_stagnation_limit(mut self, n: usize) -> Self {
        self.stagnation_limit = n;
        self
    }

    /// α and β at a given iteration of the linear schedule.
    pub fn exponents_at(&self, iteration: usize) -> (f64, f64) {
        if self.n_iterations <= 1 {
            return (self.alpha, self.beta);
        }
        let progress = iteration as f64 / (self.n_iterations - 1) as f64;
        (
            self.alpha + (self.alpha_final - self.alpha) * progress,
            self.beta + (self.beta_final - self.beta) * progress,
        )
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.n_ants == 0 {
            return Err("n_ants must be at least 1".into());
        }
        if self.n_iterations == 0 {
            return Err("n_iterations must be at least 1".into());
        }
        if !(0.0 < self.evaporation && self.evaporation < 1.0) {
            return Err(format!(
                "evaporation must be in (0, 1), got {}",
                self.evaporation
            ));
        }
        if self.deposit <= 0.0 {
            return Err("deposit constant must be positive".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AcoConfig::default();
        assert_eq!(config.n_ants, 50);
        assert_eq!(config.n_iterations, 100);
        assert!((config.alpha - 1.0).abs() < 1e-12);
        assert!((config.beta - 2.0).abs() < 1e-12);
        assert!((config.evaporation - 0.5).abs() < 1e-12);
        assert!((config.deposit - 100.0).abs() < 1e-12);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_schedule_endpoints() {
        let config = AcoConfig::default().with_iterations(11);
        let (a0, b0) = config.exponents_at(0);
        let (a1, b1) = config.exponents_at(10);
        assert!((a0 - 1.0).abs() < 1e-12 && (b0 - 2.0).abs() < 1e-12);
        assert!((a1 - 2.0).abs() < 1e-12 && (b1 - 1.0).abs() < 1e-12);
        let (mid_a, mid_b) = config.exponents_at(5);
        assert!(mid_a > a0 && mid_a < a1);
        assert!(mid_b < b0 && mid_b > b1);
    }

    #[test]
    fn test_fixed_exponents_when_disabled() {
        let config = AcoConfig::default().with_alpha(1.5).with_beta(3.0);
        assert_eq!(config.exponents_at(0), config.exponents_at(99));
    }

    #[test]
    fn test_validate_rejects_bad_evaporation() {
        assert!(AcoConfig::default().with_evaporation(0.0).validate().is_err());
        assert!(AcoConfig::default().with_evaporation(1.0).validate().is_err());
        assert!(AcoConfig::default().with_ants(0).validate().is_err());
    }
}
