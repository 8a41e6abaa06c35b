//! Q-Learning Agent
//!
//! One-step temporal-difference control over a [`QTable`].

use tracing::trace;

use super::{Policy, QTable};
use crate::rl::config::AgentConfig;
use crate::rl::core::{Action, ActionSpace, State, Transition};

/// Acts on states and learns from transitions
pub trait Agent {
    fn act(&mut self, state: &State) -> Action;

    fn learn(&mut self, transition: &Transition);

    /// Current exploration rate
    fn exploration(&self) -> f64 {
        0.0
    }

    fn set_exploration(&mut self, _epsilon: f64) {}
}

impl<A: Agent + ?Sized> Agent for &mut A {
    fn act(&mut self, state: &State) -> Action {
        (**self).act(state)
    }

    fn learn(&mut self, transition: &Transition) {
        (**self).learn(transition)
    }

    fn exploration(&self) -> f64 {
        (**self).exploration()
    }

    fn set_exploration(&mut self, epsilon: f64) {
        (**self).set_exploration(epsilon)
    }
}

/// Tabular Q-learning agent with a pluggable action-selection policy
#[derive(Debug, Clone)]
pub struct QLearningAgent<P> {
    q_table: QTable,
    action_space: ActionSpace,
    policy: P,
    alpha: f64,
    gamma: f64,
}

impl<P: Policy> QLearningAgent<P> {
    /// Agent with a zeroed table sized for `num_states` and `action_space`
    pub fn new(num_states: usize, action_space: ActionSpace, policy: P, config: &AgentConfig) -> Self {
        let q_table = QTable::new(num_states, action_space.len());
        Self::with_table(q_table, action_space, policy, config)
    }

    /// Agent that continues from an existing table
    pub fn with_table(
        q_table: QTable,
        action_space: ActionSpace,
        policy: P,
        config: &AgentConfig,
    ) -> Self {
        Self {
            q_table,
            action_space,
            policy,
            alpha: config.alpha,
            gamma: config.gamma,
        }
    }

    pub fn q_table(&self) -> &QTable {
        &self.q_table
    }

    pub fn into_q_table(self) -> QTable {
        self.q_table
    }

    pub fn action_space(&self) -> &ActionSpace {
        &self.action_space
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }
}

impl<P: Policy> Agent for QLearningAgent<P> {
    fn act(&mut self, state: &State) -> Action {
        let idx = self.policy.select(&self.q_table, state.index);
        self.action_space.action(idx).unwrap_or_default()
    }

    fn learn(&mut self, transition: &Transition) {
        let Some(action) = self.action_space.index_of(transition.action) else {
            return;
        };
        let state = transition.state.index;

        let future = if transition.done {
            0.0
        } else {
            self.q_table.max(transition.next_state.index)
        };
        let target = transition.reward + self.gamma * future;
        let current = self.q_table.get(state, action);
        let updated = current + self.alpha * (target - current);
        self.q_table.set(state, action, updated);

        trace!(state, action, current, updated, "td update");
    }

    fn exploration(&self) -> f64 {
        self.policy.exploration()
    }

    fn set_exploration(&mut self, epsilon: f64) {
        self.policy.set_exploration(epsilon);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rl::agent::{EpsilonGreedyPolicy, GreedyPolicy};

    fn config() -> AgentConfig {
        AgentConfig {
            alpha: 0.5,
            gamma: 0.9,
            ..Default::default()
        }
    }

    fn transition(state: usize, action: Action, reward: f64, next: usize, done: bool) -> Transition {
        Transition {
            state: State::from_index(state),
            action,
            reward,
            next_state: State::from_index(next),
            done,
        }
    }

    #[test]
    fn test_td_update_bootstraps_from_next_state() {
        let mut agent = QLearningAgent::new(2, ActionSpace::basic(), GreedyPolicy, &config());
        agent.q_table.set(1, 3, 2.0);

        agent.learn(&transition(0, Action::BuySmall, 1.0, 1, false));
        // 0 + 0.5 * (1 + 0.9 * 2 - 0)
        assert!((agent.q_table().get(0, 1) - 1.4).abs() < 1e-12);
    }

    #[test]
    fn test_terminal_update_ignores_next_state() {
        let mut agent = QLearningAgent::new(2, ActionSpace::basic(), GreedyPolicy, &config());
        agent.q_table.set(1, 0, 10.0);

        agent.learn(&transition(0, Action::SellLarge, 1.0, 1, true));
        assert!((agent.q_table().get(0, 4) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_action_is_ignored() {
        let mut agent = QLearningAgent::new(2, ActionSpace::basic(), GreedyPolicy, &config());
        agent.learn(&transition(0, Action::BuyMedium, 1.0, 1, true));
        assert_eq!(agent.q_table().nonzero_entries(), 0);
    }

    #[test]
    fn test_act_follows_table() {
        let mut agent = QLearningAgent::new(3, ActionSpace::basic(), GreedyPolicy, &config());
        assert_eq!(agent.act(&State::from_index(2)), Action::Nothing);
        agent.q_table.set(2, 2, 0.1);
        assert_eq!(agent.act(&State::from_index(2)), Action::BuyLarge);
    }

    #[test]
    fn test_exploration_delegates_to_policy() {
        let mut agent = QLearningAgent::new(
            1,
            ActionSpace::basic(),
            EpsilonGreedyPolicy::new(0.3, 1),
            &config(),
        );
        assert!((agent.exploration() - 0.3).abs() < 1e-12);
        agent.set_exploration(0.05);
        assert!((agent.policy().exploration() - 0.05).abs() < 1e-12);
    }
}
