use anyhow::{Context, Result};
use augdrill_core::rng::stream_rng;
use augdrill_core::{
    AugmentCatalog, CatalogSource, DrillEngine, JsonFileCatalog, MemorySetStore, NewSet,
    RevealMachine, RevealRule, Score, SlotId, StaticCatalog, TierMode, TrainingMode, TrainingSet,
};
use rand::Rng;
use std::path::Path;
use std::sync::Arc;

use crate::logic::policy::GameplayStrategy;
use crate::logic::simulation::{DecisionRecord, SimulationConfig, SimulationSession};

const SIM_AUTHOR: &str = "sim-pro";
const SIM_DISPLAY_NAME: &str = "Sim Pro";
const SIM_PATCH: &str = "14.1";
const AUTHOR_STREAM: &[u8] = b"augdrill.tester.author";

/// Catalog shared by every simulation in a tester run.
#[derive(Debug, Clone)]
pub struct TesterAssets {
    pub catalog: AugmentCatalog,
    pub origin: String,
}

impl TesterAssets {
    /// # Errors
    ///
    /// Fails only if the bundled catalog does not parse.
    pub fn load_default() -> Result<Self> {
        let catalog = StaticCatalog::bundled()
            .context("bundled augment catalog is invalid")?
            .load_catalog()?;
        Ok(Self {
            catalog,
            origin: String::from("bundled"),
        })
    }

    /// # Errors
    ///
    /// Fails when the file is missing or is not a catalog.
    pub fn load_from(path: &Path) -> Result<Self> {
        let source = JsonFileCatalog::new(path);
        let catalog = source
            .load_catalog()
            .with_context(|| format!("failed to load catalog {}", path.display()))?;
        Ok(Self {
            catalog,
            origin: path.display().to_string(),
        })
    }
}

/// Declarative plan for a simulated create, author, publish and play cycle.
#[derive(Debug, Clone)]
pub struct SimulationPlan {
    pub tier_mode: TierMode,
    pub mode: TrainingMode,
    pub strategy: GameplayStrategy,
    /// Leave every n-th spot without an answer.
    pub unanswered_every: Option<usize>,
    pub expectations: Vec<SimulationExpectation>,
}

impl SimulationPlan {
    #[must_use]
    pub const fn new(tier_mode: TierMode, mode: TrainingMode, strategy: GameplayStrategy) -> Self {
        Self {
            tier_mode,
            mode,
            strategy,
            unanswered_every: None,
            expectations: Vec::new(),
        }
    }

    #[must_use]
    pub const fn with_unanswered_every(mut self, every: usize) -> Self {
        self.unanswered_every = Some(every);
        self
    }

    #[must_use]
    pub fn with_expectation(mut self, expectation: impl Into<SimulationExpectation>) -> Self {
        self.expectations.push(expectation.into());
        self
    }

    fn leaves_unanswered(&self, index: usize) -> bool {
        self.unanswered_every
            .is_some_and(|every| every > 0 && index % every == 0)
    }
}

/// Assertion hook run after a simulation completes.
type SimulationExpectationFn = Arc<dyn Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static>;

#[derive(Clone)]
pub struct SimulationExpectation(SimulationExpectationFn);

impl std::fmt::Debug for SimulationExpectation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationExpectation").finish()
    }
}

impl SimulationExpectation {
    /// # Errors
    ///
    /// Returns the expectation's failure.
    pub fn evaluate(&self, summary: &SimulationSummary) -> Result<()> {
        (self.0)(summary)
    }
}

impl<F> From<F> for SimulationExpectation
where
    F: Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static,
{
    fn from(f: F) -> Self {
        Self(Arc::new(f))
    }
}

/// Complete record of a simulation run.
#[derive(Debug, Clone)]
pub struct SimulationSummary {
    pub seed: u64,
    pub tier_mode: TierMode,
    pub mode: TrainingMode,
    pub strategy: GameplayStrategy,
    pub catalog: Arc<AugmentCatalog>,
    /// The set as stored after authoring and publishing.
    pub set: TrainingSet,
    pub decisions: Vec<DecisionRecord>,
    pub score: Score,
    pub completed: bool,
}

impl SimulationSummary {
    #[must_use]
    pub fn auto_losses(&self) -> usize {
        self.decisions
            .iter()
            .filter(|d| d.resolution.is_auto_loss())
            .count()
    }

    #[must_use]
    pub fn rerolls(&self) -> usize {
        self.decisions.iter().map(DecisionRecord::rerolls).sum()
    }
}

/// Headless deterministic runner for drill sets.
#[derive(Clone)]
pub struct DrillTester {
    verbose: bool,
    catalog: Arc<AugmentCatalog>,
}

impl DrillTester {
    #[must_use]
    pub fn new(assets: TesterAssets, verbose: bool) -> Self {
        Self {
            verbose,
            catalog: Arc::new(assets.catalog),
        }
    }

    #[must_use]
    pub const fn verbose(&self) -> bool {
        self.verbose
    }

    /// Create a set from `seed`, author every spot with a seeded answer,
    /// publish it and play it with the plan's strategy.
    ///
    /// # Errors
    ///
    /// Propagates engine failures and illegal policy moves.
    pub fn run_plan(&self, plan: &SimulationPlan, seed: u64) -> Result<SimulationSummary> {
        let engine = DrillEngine::new(
            StaticCatalog::new(AugmentCatalog::clone(&self.catalog)),
            MemorySetStore::new(),
        );
        let created = engine.create_set(NewSet {
            author: SIM_AUTHOR.to_string(),
            display_name: SIM_DISPLAY_NAME.to_string(),
            patch: SIM_PATCH.to_string(),
            tier_mode: Some(plan.tier_mode),
            mode: Some(plan.mode),
            seed,
            screenshots: vec![format!("sim://{seed}/board.png")],
        })?;

        if self.verbose {
            log_initial_set(seed, plan, &created);
        }

        self.author_answers(&engine, plan, &created, seed)?;
        engine.publish(SIM_AUTHOR, &created.id)?;

        let run = engine.start_playthrough(&created.id)?;
        let config = SimulationConfig::new(plan.tier_mode, plan.mode, plan.strategy, seed);
        let mut session = SimulationSession::new(config, run);
        let mut policy = plan.strategy.create_policy(seed);
        let mut decisions = Vec::new();
        let mut finished = session.is_done();

        while !finished {
            let turn = session.advance(policy.as_mut())?;
            if self.verbose {
                log_decision(&turn.decision);
            }
            finished = turn.finished;
            decisions.push(turn.decision);
        }

        let run = session.playthrough();
        Ok(SimulationSummary {
            seed,
            tier_mode: plan.tier_mode,
            mode: plan.mode,
            strategy: plan.strategy,
            catalog: Arc::clone(&self.catalog),
            set: engine.load_set(&created.id)?,
            decisions,
            score: run.score(),
            completed: run.is_done(),
        })
    }

    /// Author answers through the authoring reveal rules, the way a pro
    /// would: reroll first when the answer is a replacement, then pick.
    fn author_answers(
        &self,
        engine: &DrillEngine<StaticCatalog, MemorySetStore>,
        plan: &SimulationPlan,
        set: &TrainingSet,
        seed: u64,
    ) -> Result<()> {
        let mut rng = stream_rng(seed, AUTHOR_STREAM);
        for spot in &set.spots {
            let answer = SlotId::ALL[rng.gen_range(0..SlotId::ALL.len())];
            if plan.leaves_unanswered(spot.index) {
                continue;
            }
            let mut machine = RevealMachine::new(RevealRule::Authoring);
            if answer.revealed {
                machine.reroll(spot, answer.slot)?;
            }
            machine.pick(spot, answer.slot)?;
            engine.submit_authoring_pick(
                SIM_AUTHOR,
                &set.id,
                spot.index,
                &machine,
                Some(answer.action().key()),
            )?;
            if self.verbose {
                println!("✍️  Spot {} answer {answer}", spot.index);
            }
        }
        Ok(())
    }
}

fn log_initial_set(seed: u64, plan: &SimulationPlan, set: &TrainingSet) {
    println!(
        "🎲 Starting simulation | seed:{seed} set:{} tiers:{} mode:{} policy:{}",
        set.id,
        plan.tier_mode,
        plan.mode,
        plan.strategy.label()
    );
}

fn log_decision(decision: &DecisionRecord) {
    let actions: Vec<String> = decision.actions.iter().map(ToString::to_string).collect();
    let mark = if decision.correct { "✅" } else { "❌" };
    println!(
        "🎯 Spot {} ({}): {} [{}] {mark}",
        decision.spot_index,
        decision.tier,
        actions.join(" -> "),
        decision.policy_name
    );
}
