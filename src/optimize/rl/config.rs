//! Shared configuration for the tabular RL optimizers.

/// Training parameters for Q-Learning and SARSA.
#[derive(Debug, Clone)]
pub struct RlConfig {
    /// Training episodes.
    pub episodes: usize,

    /// Learning rate η.
    pub learning_rate: f64,

    /// Discount factor γ.
    pub discount: f64,

    /// Exploration rate at the first episode.
    pub epsilon_start: f64,

    /// Exploration floor.
    pub epsilon_end: f64,

    /// Geometric ε decay per episode.
    pub epsilon_decay: f64,

    /// Bonus for reaching the destination.
    pub goal_reward: f64,

    /// Penalty when an episode dead-ends.
    pub dead_end_penalty: f64,
}

impl Default for RlConfig {
    fn default() -> Self {
        Self {
            episodes: 5000,
            learning_rate: 0.1,
            discount: 0.95,
            epsilon_start: 1.0,
            epsilon_end: 0.01,
            epsilon_decay: 0.995,
            goal_reward: 100.0,
            dead_end_penalty: 50.0,
        }
    }
}

impl RlConfig {
    pub fn with_episodes(mut self, n: usize) -> Self {
        self.episodes = n;
        self
    }

    pub fn with_learning_rate(mut self, eta: f64) -> Self {
        self.learning_rate = eta;
        self
    }

    pub fn with_discount(mut self, gamma: f64) -> Self {
        self.discount = gamma;
        self
    }

    pub fn with_epsilon(mut self, start: f64, end: f64, decay: f64) -> Self {
        self.epsilon_start = start;
        self.epsilon_end = end;
        self.epsilon_decay = decay;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.episodes == 0 {
            return Err("episodes must be at least 1".into());
        }
        if !(0.0 < self.learning_rate && self.learning_rate <= 1.0) {
            return Err(format!(
                "learning_rate must be in (0, 1], got {}",
                self.learning_rate
            ));
        }
        if !(0.0..=1.0).contains(&self.discount) {
            return Err(format!("discount must be in [0, 1], got {}", self.discount));
        }
        if !(0.0..=1.0).contains(&self.epsilon_start)
            || !(0.0..=1.0).contains(&self.epsilon_end)
            || self.epsilon_end > self.epsilon_start
        {
            return Err("epsilon range must satisfy 0 <= end <= start <= 1".into());
        }
        if !(0.0 < self.epsilon_decay && self.epsilon_decay <= 1.0) {
            return Err(format!(
                "epsilon_decay must be in (0, 1], got {}",
                self.epsilon_decay
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RlConfig::default();
        assert_eq!(config.episodes, 5000);
        assert!((config.learning_rate - 0.1).abs() < 1e-12);
        assert!((config.discount - 0.95).abs() < 1e-12);
        assert!((config.epsilon_start - 1.0).abs() < 1e-12);
        assert!((config.epsilon_end - 0.01).abs() < 1e-12);
        assert!((config.epsilon_decay - 0.995).abs() < 1e-12);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(RlConfig::default().with_episodes(0).validate().is_err());
        assert!(RlConfig::default().with_learning_rate(0.0).validate().is_err());
        assert!(RlConfig::default().with_discount(1.5).validate().is_err());
        assert!(RlConfig::default().with_epsilon(0.1, 0.5, 0.99).validate().is_err());
    }
}
