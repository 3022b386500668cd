//! Adaptive learning scheduler.
//!
//! An epsilon-greedy tabular learner chooses a bandwidth tier for every packet. The value
//! table and exploration rate are shared by every stream: what the learner discovers on
//! one stream is reused on all others.
//!
//! Algorithm per packet:
//! 1. Discretize (queue length, priority, latency) into a state index
//! 2. Explore with probability epsilon, otherwise exploit the first maximal action
//! 3. Scale the packet by the tier multiplier
//! 4. Score the shaped packet and apply the temporal-difference update
//! 5. Decay epsilon toward its floor

use crate::packet::PacketRecord;
use crate::priority::MAX_PRIORITY;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Latency (ms) above which a packet lands in the "delayed" state bucket.
const DELAY_THRESHOLD_MS: f64 = 50.0;

/// Bandwidth tier the learner can grant a packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BandwidthTier {
    High,
    Medium,
    Low,
}

impl BandwidthTier {
    /// Tiers in action-index order.
    pub const ALL: [BandwidthTier; 3] = [BandwidthTier::High, BandwidthTier::Medium, BandwidthTier::Low];

    /// Tier for an action index; out-of-range indices clamp to the last tier.
    pub fn from_index(action: usize) -> BandwidthTier {
        Self::ALL[action.min(Self::ALL.len() - 1)]
    }

    pub const fn index(self) -> usize {
        match self {
            BandwidthTier::High => 0,
            BandwidthTier::Medium => 1,
            BandwidthTier::Low => 2,
        }
    }

    pub const fn multiplier(self) -> f64 {
        match self {
            BandwidthTier::High => 1.5,
            BandwidthTier::Medium => 1.0,
            BandwidthTier::Low => 0.5,
        }
    }

    /// Shape a packet: rate scales with the multiplier, latency and loss inversely.
    pub fn apply(self, packet: &PacketRecord) -> PacketRecord {
        let m = self.multiplier();
        packet.with_shaping(
            packet.data_rate * m,
            packet.latency * (2.0 - m),
            packet.packet_loss * (2.0 - m),
        )
    }
}

impl fmt::Display for BandwidthTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BandwidthTier::High => "high",
            BandwidthTier::Medium => "medium",
            BandwidthTier::Low => "low",
        };
        write!(f, "{label}")
    }
}

/// Learner hyper-parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningConfig {
    pub n_states: usize,
    pub learning_rate: f64,
    pub gamma: f64,
    /// Initial exploration rate.
    pub epsilon: f64,
    pub epsilon_decay: f64,
    pub epsilon_min: f64,
    /// Fixed RNG seed for reproducible runs; entropy-seeded when absent.
    pub seed: Option<u64>,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            n_states: 16,
            learning_rate: 0.1,
            gamma: 0.95,
            epsilon: 1.0,
            epsilon_decay: 0.995,
            epsilon_min: 0.01,
            seed: None,
        }
    }
}

/// Dense `n_states x n_actions` table of expected-return estimates.
///
/// Every accessor clamps its indices, so an out-of-range state or action never reaches
/// storage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueTable {
    n_states: usize,
    n_actions: usize,
    values: Vec<f64>,
}

impl ValueTable {
    pub fn new(n_states: usize, n_actions: usize) -> Self {
        let n_states = n_states.max(1);
        let n_actions = n_actions.max(1);
        Self {
            n_states,
            n_actions,
            values: vec![0.0; n_states * n_actions],
        }
    }

    pub fn n_states(&self) -> usize {
        self.n_states
    }

    pub fn n_actions(&self) -> usize {
        self.n_actions
    }

    pub fn clamp_state(&self, state: usize) -> usize {
        state.min(self.n_states - 1)
    }

    pub fn clamp_action(&self, action: usize) -> usize {
        action.min(self.n_actions - 1)
    }

    fn offset(&self, state: usize, action: usize) -> usize {
        self.clamp_state(state) * self.n_actions + self.clamp_action(action)
    }

    pub fn get(&self, state: usize, action: usize) -> f64 {
        self.values[self.offset(state, action)]
    }

    pub fn set(&mut self, state: usize, action: usize, value: f64) {
        let offset = self.offset(state, action);
        self.values[offset] = value;
    }

    /// Row of action values for a state.
    pub fn row(&self, state: usize) -> &[f64] {
        let start = self.clamp_state(state) * self.n_actions;
        &self.values[start..start + self.n_actions]
    }

    pub fn max_value(&self, state: usize) -> f64 {
        self.row(state)
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// First action index holding the row maximum.
    pub fn best_action(&self, state: usize) -> usize {
        let mut best = 0;
        let row = self.row(state);
        for (action, value) in row.iter().enumerate().skip(1) {
            if *value > row[best] {
                best = action;
            }
        }
        best
    }
}

/// Outcome of one learning step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LearningDecision {
    pub state: usize,
    pub tier: BandwidthTier,
    /// Whether the action came from the exploration branch.
    pub explored: bool,
    pub reward: f64,
    pub next_state: usize,
}

/// Epsilon-greedy tabular scheduler with a single shared value table.
#[derive(Debug)]
pub struct AdaptiveLearningScheduler {
    table: ValueTable,
    learning_rate: f64,
    gamma: f64,
    epsilon: f64,
    epsilon_decay: f64,
    epsilon_min: f64,
    updates: u64,
    rng: StdRng,
}

impl AdaptiveLearningScheduler {
    pub fn new(config: &LearningConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            table: ValueTable::new(config.n_states, BandwidthTier::ALL.len()),
            learning_rate: config.learning_rate,
            gamma: config.gamma,
            epsilon: config.epsilon,
            epsilon_decay: config.epsilon_decay,
            epsilon_min: config.epsilon_min,
            updates: 0,
            rng,
        }
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn updates(&self) -> u64 {
        self.updates
    }

    pub fn value_table(&self) -> &ValueTable {
        &self.table
    }

    /// Discretize the observable packet context into a state index.
    pub fn get_state(&self, queue_length: usize, priority: u8, latency: f64) -> usize {
        let queue_bucket = (queue_length / 5).min(3);
        let priority_bucket = usize::from(priority.min(MAX_PRIORITY));
        let delay_bucket = usize::from(latency > DELAY_THRESHOLD_MS);
        self.table
            .clamp_state(queue_bucket * 6 + priority_bucket * 2 + delay_bucket)
    }

    /// Pick an action index for `state`, returning whether it was an exploration.
    pub fn select_action(&mut self, state: usize) -> (usize, bool) {
        if self.rng.random::<f64>() < self.epsilon {
            (self.rng.random_range(0..self.table.n_actions()), true)
        } else {
            (self.table.best_action(state), false)
        }
    }

    /// Reward for a shaped packet.
    ///
    /// Higher-priority streams weigh the same QoS score more heavily; `fairness_penalty`
    /// is the relative spread of service across user-density buckets.
    pub fn reward(packet: &PacketRecord, priority: u8, fairness_penalty: f64) -> f64 {
        let latency_score = (1.0 - packet.latency / 100.0).max(0.0);
        let throughput_score = (packet.data_rate / 50.0).min(1.0);
        let loss_score = (1.0 - packet.packet_loss / 5.0).max(0.0);
        let priority_multiplier = 1.0 + f64::from(priority.min(MAX_PRIORITY)) * 0.5;
        priority_multiplier * (0.4 * latency_score + 0.4 * throughput_score + 0.2 * loss_score)
            - 0.1 * fairness_penalty
    }

    /// Temporal-difference update of one cell, followed by epsilon decay.
    pub fn update(&mut self, state: usize, action: usize, reward: f64, next_state: usize) {
        let old_value = self.table.get(state, action);
        let next_max = self.table.max_value(next_state);
        let new_value = old_value + self.learning_rate * (reward + self.gamma * next_max - old_value);
        self.table.set(state, action, new_value);
        self.epsilon = (self.epsilon * self.epsilon_decay).max(self.epsilon_min);
        self.updates += 1;
    }

    /// Run one full learning step on a packet and return the shaped copy.
    pub fn schedule(
        &mut self,
        packet: &PacketRecord,
        queue_length: usize,
        priority: u8,
        fairness_penalty: f64,
    ) -> (PacketRecord, LearningDecision) {
        let state = self.get_state(queue_length, priority, packet.latency);
        let (action, explored) = self.select_action(state);
        let tier = BandwidthTier::from_index(action);
        let shaped = tier.apply(packet);
        let reward = Self::reward(&shaped, priority, fairness_penalty);
        let next_state = self.get_state(queue_length, priority, shaped.latency);
        self.update(state, action, reward, next_state);

        let decision = LearningDecision {
            state,
            tier,
            explored,
            reward,
            next_state,
        };
        (shaped, decision)
    }
}
