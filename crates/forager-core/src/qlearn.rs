//! Tabular Q-learning: value storage, epsilon-greedy selection, TD update,
//! and the persisted model file.

use crate::perception::DetectionState;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use thiserror::Error;

/// The fixed action set: a forward step, two shallow turns with a full
/// stride, and two wide swings with a short stride.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Forward,
    VeerLeft,
    VeerRight,
    SwingLeft,
    SwingRight,
}

impl Action {
    /// Every action, in canonical order.
    pub const ALL: [Self; 5] = [
        Self::Forward,
        Self::VeerLeft,
        Self::VeerRight,
        Self::SwingLeft,
        Self::SwingRight,
    ];

    /// Turn applied before the forward step, in degrees (positive is
    /// counter-clockwise).
    #[must_use]
    pub const fn turn_degrees(self) -> f32 {
        match self {
            Self::Forward => 0.0,
            Self::VeerLeft => 15.0,
            Self::VeerRight => -15.0,
            Self::SwingLeft => 30.0,
            Self::SwingRight => -30.0,
        }
    }

    /// Whether the action moves with the short stride.
    #[must_use]
    pub const fn short_stride(self) -> bool {
        matches!(self, Self::SwingLeft | Self::SwingRight)
    }
}

/// Errors raised while persisting or restoring the model file.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model io: {0}")]
    Io(#[from] std::io::Error),
    #[error("model codec: {0}")]
    Codec(#[from] bincode::Error),
}

/// Tabular state-action values with epsilon-greedy selection.
///
/// Keys are created lazily on first write; absent keys read as 0.0. The
/// parameters are fixed per run, never annealed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QLearner {
    /// Exploration rate: probability of a uniformly random action.
    pub epsilon: f64,
    /// Step size of the blend toward the TD target.
    pub alpha: f64,
    /// Discount factor on the successor state's best value.
    pub gamma: f64,
    table: HashMap<(DetectionState, Action), f64>,
}

impl QLearner {
    /// Create an empty learner with the given parameters.
    #[must_use]
    pub fn new(epsilon: f64, alpha: f64, gamma: f64) -> Self {
        Self {
            epsilon,
            alpha,
            gamma,
            table: HashMap::new(),
        }
    }

    /// Stored value for a state/action pair, 0.0 when unseen.
    #[must_use]
    pub fn value(&self, state: &DetectionState, action: Action) -> f64 {
        self.table.get(&(*state, action)).copied().unwrap_or(0.0)
    }

    fn best_value(&self, state: &DetectionState) -> f64 {
        Action::ALL
            .iter()
            .map(|&action| self.value(state, action))
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Epsilon-greedy action selection.
    ///
    /// With probability `epsilon` a uniformly random action is returned;
    /// otherwise the maximizing action, with ties broken uniformly at
    /// random among all maximizers rather than by index order.
    pub fn choose_action(&self, state: &DetectionState, rng: &mut impl Rng) -> Action {
        if rng.random::<f64>() < self.epsilon {
            return Action::ALL[rng.random_range(0..Action::ALL.len())];
        }
        let values: [f64; 5] = Action::ALL.map(|action| self.value(state, action));
        let max = values.iter().fold(f64::NEG_INFINITY, |acc, &v| acc.max(v));
        let maximizers: Vec<Action> = Action::ALL
            .iter()
            .zip(values.iter())
            .filter(|&(_, &value)| value == max)
            .map(|(&action, _)| action)
            .collect();
        maximizers[rng.random_range(0..maximizers.len())]
    }

    /// One-step Q-learning update.
    ///
    /// Target is `reward + gamma * max_a value(next, a)`. An existing entry
    /// blends toward the target by `alpha`; a vacant entry stores the raw
    /// reward directly as a fast bootstrap. The asymmetry is deliberate.
    pub fn learn(
        &mut self,
        state: &DetectionState,
        action: Action,
        reward: f64,
        next: &DetectionState,
    ) {
        let target = reward + self.gamma * self.best_value(next);
        match self.table.entry((*state, action)) {
            Entry::Occupied(mut entry) => {
                let old = *entry.get();
                entry.insert(old + self.alpha * (target - old));
            }
            Entry::Vacant(entry) => {
                entry.insert(reward);
            }
        }
    }

    /// Number of stored state/action entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Whether the table holds no entries yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Immutable access to the underlying table.
    #[must_use]
    pub fn table(&self) -> &HashMap<(DetectionState, Action), f64> {
        &self.table
    }

    /// Serialize the table to `path`, writing a sibling temp file first and
    /// renaming it into place so a crash never leaves a torn model.
    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        let tmp = path.with_extension("tmp");
        let mut writer = BufWriter::new(File::create(&tmp)?);
        bincode::serialize_into(&mut writer, &self.table)?;
        writer.flush()?;
        writer
            .into_inner()
            .map_err(|err| ModelError::Io(err.into_error()))?
            .sync_all()?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Replace the table with the mapping stored at `path`.
    ///
    /// A missing or corrupt file is reported as a recoverable error; the
    /// in-memory table is untouched on failure.
    pub fn load(&mut self, path: &Path) -> Result<(), ModelError> {
        let reader = BufReader::new(File::open(path)?);
        self.table = bincode::deserialize_from(reader)?;
        Ok(())
    }
}
