//! GA configuration.

/// Parameters of the evolutionary loop.
///
/// # Builder
///
/// ```
/// use qroute::optimize::ga::GaConfig;
///
/// let config = GaConfig::default()
///     .with_max_generations(200)
///     .with_mutation_rate(0.2)
///     .with_tournament_size(3);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct GaConfig {
    /// Population size. `None` scales with the graph: 200 below 100 nodes,
    /// 260 below 500, 500 above.
    pub population_size: Option<usize>,

    /// Maximum number of generations.
    pub max_generations: usize,

    /// Tournament size for parent selection.
    pub tournament_size: usize,

    /// Probability of recombining a parent pair.
    pub crossover_rate: f64,

    /// Base mutation rate μ₀. The effective rate adapts to diversity.
    pub mutation_rate: f64,

    /// Ceiling on the adaptive mutation rate.
    pub mutation_rate_max: f64,

    /// Multiplier applied to μ₀ when diversity collapses.
    pub mutation_boost: f64,

    /// Diversity level below which the mutation rate is boosted.
    pub diversity_threshold: f64,

    /// Fraction of the population copied unchanged each generation.
    pub elitism_ratio: f64,

    /// Improvements below this do not reset the stagnation counter.
    pub convergence_threshold: f64,

    /// Stagnant generations before early termination.
    pub convergence_generations: usize,

    /// Fraction of the seeded population built from guided walks.
    pub guided_ratio: f64,

    /// Parallel fitness evaluation. `None` enables it only for graphs of
    /// 500+ nodes with populations of 200+.
    pub parallel: Option<bool>,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            population_size: None,
            max_generations: 500,
            tournament_size: 5,
            crossover_rate: 0.8,
            mutation_rate: 0.12,
            mutation_rate_max: 0.30,
            mutation_boost: 2.5,
            diversity_threshold: 0.10,
            elitism_ratio: 0.08,
            convergence_threshold: 1e-4,
            convergence_generations: 20,
            guided_ratio: 0.5,
            parallel: None,
        }
    }
}

impl GaConfig {
    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = Some(n);
        self
    }

    pub fn with_max_generations(mut self, n: usize) -> Self {
        self.max_generations = n;
        self
    }

    pub fn with_tournament_size(mut self, k: usize) -> Self {
        self.tournament_size = k;
        self
    }

    pub fn with_crossover_rate(mut self, rate: f64) -> Self {
        self.crossover_rate = rate.clamp(0.0, 1.0);
        self
    }

    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate.clamp(0.0, 1.0);
        self
    }

    pub fn with_elitism_ratio(mut self, ratio: f64) -> Self {
        self.elitism_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    pub fn with_convergence(mut self, threshold: f64, generations: usize) -> Self {
        self.convergence_threshold = threshold;
        self.convergence_generations = generations;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = Some(parallel);
        self
    }

    /// Population size for a graph of `n` nodes.
    pub fn scaled_population(&self, n: usize) -> usize {
        self.population_size.unwrap_or(match n {
            0..=99 => 200,
            100..=499 => 260,
            _ => 500,
        })
    }

    /// Whether fitness evaluation runs on the rayon pool.
    pub fn parallel_for(&self, nodes: usize, population: usize) -> bool {
        self.parallel
            .unwrap_or(nodes >= 500 && population >= 200)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.scaled_population(0) < 2 {
            return Err("population_size must be at least 2".into());
        }
        if self.max_generations == 0 {
            return Err("max_generations must be at least 1".into());
        }
        if self.tournament_size == 0 {
            return Err("tournament_size must be at least 1".into());
        }
        let pop = self.scaled_population(0);
        if (pop as f64 * self.elitism_ratio) as usize >= pop {
            return Err("elitism_ratio too high: elites fill the population".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GaConfig::default();
        assert_eq!(config.max_generations, 500);
        assert_eq!(config.tournament_size, 5);
        assert!((config.crossover_rate - 0.8).abs() < 1e-12);
        assert!((config.mutation_rate - 0.12).abs() < 1e-12);
        assert!((config.elitism_ratio - 0.08).abs() < 1e-12);
        assert_eq!(config.convergence_generations, 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_population_scaling() {
        let config = GaConfig::default();
        assert_eq!(config.scaled_population(50), 200);
        assert_eq!(config.scaled_population(250), 260);
        assert_eq!(config.scaled_population(1000), 500);
        assert_eq!(config.with_population_size(64).scaled_population(1000), 64);
    }

    #[test]
    fn test_parallel_threshold() {
        let config = GaConfig::default();
        assert!(!config.parallel_for(100, 500));
        assert!(!config.parallel_for(800, 100));
        assert!(config.parallel_for(800, 500));
        assert!(GaConfig::default().with_parallel(true).parallel_for(4, 4));
    }

    #[test]
    fn test_validate_rejects_degenerate() {
        assert!(GaConfig::default().with_population_size(1).validate().is_err());
        assert!(GaConfig::default().with_max_generations(0).validate().is_err());
        assert!(GaConfig::default()
            .with_population_size(10)
            .with_elitism_ratio(1.0)
            .validate()
            .is_err());
    }
}
