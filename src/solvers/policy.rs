//! Action-selection policies shared by the tree and flat searches.
//!
//! A policy keeps per-action running statistics and answers two questions:
//! which action to sample next, and which action to commit to once the
//! simulation budget is spent. Two implementations: a naive
//! round-robin/total-reward policy, and the SP-UCT multi-term score
//! combining exploitation, exploration, a variance bonus, and an optional
//! externally supplied value estimate.

use crate::core::Value;

/// Per-decision action scoring.
pub trait SelectionPolicy {
    /// Discard statistics and resize to `n_actions`.
    fn reset(&mut self, n_actions: u32);

    /// Record one sampled reward for an action.
    fn record(&mut self, action: u32, reward: Value);

    /// The action to sample next. `best_so_far` normalizes rewards for
    /// policies that need it.
    fn next_action(&mut self, best_so_far: Value) -> u32;

    /// The action to commit after sampling.
    fn best_action(&self) -> u32;

    /// Samples recorded for an action.
    fn visits(&self, action: u32) -> u32;
}

/// Naive policy: samples actions round-robin, commits the action with the
/// highest total reward.
#[derive(Clone, Debug)]
pub struct FlatPolicy {
    next: u32,
    total_reward: Vec<Value>,
    n_samples: Vec<u32>,
}

impl FlatPolicy {
    #[must_use]
    pub fn new(n_actions: u32) -> Self {
        Self {
            next: 0,
            total_reward: vec![0.0; n_actions as usize],
            n_samples: vec![0; n_actions as usize],
        }
    }
}

impl SelectionPolicy for FlatPolicy {
    fn reset(&mut self, n_actions: u32) {
        self.next = 0;
        self.total_reward.clear();
        self.total_reward.resize(n_actions as usize, 0.0);
        self.n_samples.clear();
        self.n_samples.resize(n_actions as usize, 0);
    }

    fn record(&mut self, action: u32, reward: Value) {
        self.total_reward[action as usize] += reward;
        self.n_samples[action as usize] += 1;
    }

    fn next_action(&mut self, _best_so_far: Value) -> u32 {
        if self.next as usize == self.total_reward.len() {
            self.next = 0;
        }
        let action = self.next;
        self.next += 1;
        action
    }

    fn best_action(&self) -> u32 {
        let mut best = 0u32;
        let mut best_total = self.total_reward[0];
        for (action, &total) in self.total_reward.iter().enumerate().skip(1) {
            if total > best_total {
                best = action as u32;
                best_total = total;
            }
        }
        best
    }

    fn visits(&self, action: u32) -> u32 {
        self.n_samples[action as usize]
    }
}

/// SP-UCT policy.
///
/// Rewards are normalized by the best solution value found so far, so the
/// score of an action adapts as the search improves its incumbent. An
/// unvisited action scores a sentinel "try me" value unless a confident
/// external estimate exists, in which case its squared estimate is used.
#[derive(Clone, Debug)]
pub struct SpUctPolicy {
    exploration_weight: f32,
    variance_weight: f32,
    estimation_weight: f32,

    mean_reward: Vec<Value>,
    mean_squared_reward: Vec<Value>,
    n_samples: Vec<u32>,
    total_samples: u32,

    estimate: Vec<Value>,
    estimate_confidence: Vec<Value>,
}

impl SpUctPolicy {
    /// Estimates below this confidence are ignored.
    pub const CONFIDENCE_CUTOFF: Value = 1e-5;
    /// Score of an unvisited action without a usable estimate.
    pub const UNTRIED_SCORE: Value = 9_999_999.0;

    #[must_use]
    pub fn new(
        n_actions: u32,
        exploration_weight: f32,
        variance_weight: f32,
        estimation_weight: f32,
    ) -> Self {
        let n = n_actions as usize;
        Self {
            exploration_weight,
            variance_weight,
            estimation_weight,
            mean_reward: vec![0.0; n],
            mean_squared_reward: vec![0.0; n],
            n_samples: vec![0; n],
            total_samples: 0,
            estimate: vec![Self::UNTRIED_SCORE; n],
            estimate_confidence: vec![0.0; n],
        }
    }

    /// Supply an external value estimate for an action.
    pub fn set_estimate(&mut self, action: u32, estimate: Value, confidence: Value) {
        self.estimate[action as usize] = estimate;
        self.estimate_confidence[action as usize] = confidence;
    }

    /// The multi-term action score.
    #[must_use]
    pub fn action_score(&self, action: u32, best_so_far: Value) -> Value {
        let a = action as usize;
        let n = self.n_samples[a];

        if n == 0 {
            return if self.estimate_confidence[a] < Self::CONFIDENCE_CUTOFF {
                Self::UNTRIED_SCORE
            } else {
                self.estimate[a] * self.estimate[a]
            };
        }

        let normalized_mean = self.mean_reward[a] / best_so_far;

        let exploration = self.exploration_weight
            * ((self.total_samples as f32).ln() / n as f32).sqrt();

        let normalized_variance = self.mean_squared_reward[a] / (best_so_far * best_so_far)
            - normalized_mean * normalized_mean;
        let variance = (normalized_variance + self.variance_weight / n as f32).sqrt();

        let estimation = self.estimation_weight * self.estimate_confidence[a] * self.estimate[a]
            / best_so_far;

        estimation + normalized_mean + exploration + variance
    }
}

impl SelectionPolicy for SpUctPolicy {
    fn reset(&mut self, n_actions: u32) {
        let n = n_actions as usize;
        self.mean_reward.clear();
        self.mean_reward.resize(n, 0.0);
        self.mean_squared_reward.clear();
        self.mean_squared_reward.resize(n, 0.0);
        self.n_samples.clear();
        self.n_samples.resize(n, 0);
        self.total_samples = 0;
        self.estimate.clear();
        self.estimate.resize(n, Self::UNTRIED_SCORE);
        self.estimate_confidence.clear();
        self.estimate_confidence.resize(n, 0.0);
    }

    fn record(&mut self, action: u32, reward: Value) {
        let a = action as usize;
        let n = self.n_samples[a] as f32;

        let contribution = reward / (n + 1.0);
        self.mean_reward[a] = self.mean_reward[a] * (n / (n + 1.0)) + contribution;
        self.mean_squared_reward[a] =
            self.mean_squared_reward[a] * (n / (n + 1.0)) + reward * contribution;

        self.n_samples[a] += 1;
        self.total_samples += 1;
    }

    fn next_action(&mut self, best_so_far: Value) -> u32 {
        let mut best = 0u32;
        let mut best_score = self.action_score(0, best_so_far);
        for action in 1..self.n_samples.len() as u32 {
            let score = self.action_score(action, best_so_far);
            if score > best_score {
                best_score = score;
                best = action;
            }
        }
        best
    }

    /// Commits by visit count.
    fn best_action(&self) -> u32 {
        let mut best = 0u32;
        let mut best_visits = self.n_samples[0];
        for (action, &visits) in self.n_samples.iter().enumerate().skip(1) {
            if visits > best_visits {
                best = action as u32;
                best_visits = visits;
            }
        }
        best
    }

    fn visits(&self, action: u32) -> u32 {
        self.n_samples[action as usize]
    }
}
