use anyhow::{Context, Result, bail};
use augdrill_core::{Phase, Playthrough, Resolution, Tier, TierMode, TrainingMode};

use crate::logic::policy::{GameplayStrategy, PlayerPolicy, PolicyAction};

/// A spot is resolved within three rerolls and one pick.
const MAX_ACTIONS_PER_SPOT: usize = 4;

/// Configuration for a simulation session.
#[derive(Debug, Clone, Copy)]
pub struct SimulationConfig {
    pub seed: u64,
    pub tier_mode: TierMode,
    pub mode: TrainingMode,
    pub strategy: GameplayStrategy,
}

impl SimulationConfig {
    #[must_use]
    pub const fn new(tier_mode: TierMode, mode: TrainingMode, strategy: GameplayStrategy, seed: u64) -> Self {
        Self {
            seed,
            tier_mode,
            mode,
            strategy,
        }
    }
}

/// Snapshot of one resolved spot.
#[derive(Debug, Clone)]
pub struct DecisionRecord {
    pub spot_index: usize,
    pub tier: Tier,
    pub actions: Vec<PolicyAction>,
    pub resolution: Resolution,
    pub correct: bool,
    pub policy_name: String,
}

impl DecisionRecord {
    #[must_use]
    pub fn rerolls(&self) -> usize {
        self.actions
            .iter()
            .filter(|action| matches!(action, PolicyAction::Reroll(_)))
            .count()
    }
}

/// Result of advancing the session by one spot.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub decision: DecisionRecord,
    pub finished: bool,
}

/// Drives a [`Playthrough`] with a [`PlayerPolicy`], one spot per turn.
pub struct SimulationSession {
    config: SimulationConfig,
    run: Playthrough,
}

impl SimulationSession {
    #[must_use]
    pub const fn new(config: SimulationConfig, run: Playthrough) -> Self {
        Self { config, run }
    }

    #[must_use]
    pub const fn playthrough(&self) -> &Playthrough {
        &self.run
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        self.run.is_done()
    }

    /// Let `policy` act on the current spot until it resolves, then move on.
    ///
    /// # Errors
    ///
    /// Fails when the run is already finished, the policy makes an illegal
    /// move, or the spot does not resolve within the action limit.
    pub fn advance(&mut self, policy: &mut dyn PlayerPolicy) -> Result<TurnOutcome> {
        let spot = self
            .run
            .current()
            .cloned()
            .context("playthrough already finished")?;
        let mut actions = Vec::with_capacity(MAX_ACTIONS_PER_SPOT);

        while self.run.phase() != Phase::Resolved {
            if actions.len() == MAX_ACTIONS_PER_SPOT {
                bail!(
                    "{} did not resolve spot {} after {MAX_ACTIONS_PER_SPOT} actions",
                    policy.name(),
                    spot.index
                );
            }
            let action = policy.decide(&spot, self.run.machine());
            let applied = match action {
                PolicyAction::Reroll(slot) => self.run.reroll(slot).map(|_| ()),
                PolicyAction::Pick(slot) => self.run.pick(slot).map(|_| ()),
            };
            applied.with_context(|| {
                format!("{} tried to {action} on spot {}", policy.name(), spot.index)
            })?;
            actions.push(action);
        }

        let outcome = self.run.next()?;
        log::debug!(
            "seed {} {} ({} {}): spot {} {:?} correct={}",
            self.config.seed,
            self.config.strategy,
            self.config.tier_mode,
            self.config.mode,
            outcome.index,
            outcome.resolution,
            outcome.correct
        );
        Ok(TurnOutcome {
            decision: DecisionRecord {
                spot_index: outcome.index,
                tier: outcome.tier,
                actions,
                resolution: outcome.resolution,
                correct: outcome.correct,
                policy_name: policy.name().to_string(),
            },
            finished: self.run.is_done(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use augdrill_core::{Augment, Spot, StageAvailability, tag_options};

    fn spots(picks: &[&str]) -> Vec<Spot> {
        picks
            .iter()
            .enumerate()
            .map(|(i, pick)| {
                let augments = (0..6)
                    .map(|n| Augment::new(format!("{i}-{n}"), Tier::Gold, "", StageAvailability::all()))
                    .collect();
                Spot::new(i + 1, Tier::Gold, "2-1", tag_options(augments))
                    .with_correct_pick(pick.parse().unwrap())
            })
            .collect()
    }

    fn session(picks: &[&str]) -> SimulationSession {
        let config = SimulationConfig::new(
            TierMode::Fixed(Tier::Gold),
            TrainingMode::Augment21,
            GameplayStrategy::Oracle,
            1,
        );
        SimulationSession::new(config, Playthrough::new(spots(picks)))
    }

    #[test]
    fn oracle_clears_every_spot() {
        let mut session = session(&["a", "b1", "c"]);
        let mut policy = GameplayStrategy::Oracle.create_policy(1);
        let mut rerolls = 0;
        while !session.is_done() {
            let turn = session.advance(policy.as_mut()).unwrap();
            assert!(turn.decision.correct);
            rerolls += turn.decision.rerolls();
        }
        assert_eq!(rerolls, 1);
        assert_eq!(session.playthrough().score().correct, 3);
        assert!(session.advance(policy.as_mut()).is_err());
    }

    #[test]
    fn reroll_all_loses_primary_answers() {
        let mut session = session(&["b"]);
        let mut policy = GameplayStrategy::RerollAll.create_policy(1);
        let turn = session.advance(policy.as_mut()).unwrap();
        assert!(turn.finished);
        assert!(turn.decision.resolution.is_auto_loss());
        assert_eq!(turn.decision.actions.len(), 2);
    }
}
