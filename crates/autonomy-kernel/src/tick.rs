//! The tick orchestrator.
//!
//! [`Kernel::run_tick`] drives one tick through the stage ports in a fixed
//! order:
//!
//! 1. `Sensor::read(tick)` -> [`SensorFrame`]
//! 2. `Perception::run(frame, prev_world)` -> [`WorldState`]
//! 3. `Risk::assess(world)` -> [`RiskReport`] (clamped to the 0-100 scale)
//! 4. `Policy::decide(world, risk)` -> intents, stably ordered by priority
//! 5. `ProposalGenerator::generate(tick, intents)` -> proposals
//! 6. `Governance::evaluate(proposal, risk, config)` once per proposal
//! 7. `Actuation::build(decision)` once per approved decision
//! 8. audit append
//!
//! Stages write only to locals. The audit entry is sealed without touching
//! the chain, and the kernel's own state (tick counter, previous world,
//! audit chain) changes in a single commit step after every stage has
//! succeeded, so a failing stage leaves no trace: the counter
//! stays put, no entry is appended, and the next `run_tick` re-attempts the
//! same tick index.
//!
//! # Example
//!
//! ```
//! use autonomy_kernel::prelude::*;
//!
//! struct Quiet;
//! impl Sensor for Quiet {
//!     fn read(&mut self, tick: Tick) -> StageResult<SensorFrame> {
//!         Ok(SensorFrame::new(tick, 1_000 * tick))
//!     }
//! }
//! impl Perception for Quiet {
//!     fn run(&self, frame: &SensorFrame, _: Option<&WorldState>) -> StageResult<WorldState> {
//!         Ok(WorldState::from_frame(frame))
//!     }
//! }
//! impl Risk for Quiet {
//!     fn assess(&self, world: &WorldState) -> StageResult<RiskReport> {
//!         Ok(RiskReport::new(world.tick, world.timestamp_ms, 10.0, 95.0))
//!     }
//! }
//! impl Policy for Quiet {
//!     fn decide(&self, world: &WorldState, _: &RiskReport) -> StageResult<Vec<Intent>> {
//!         Ok(vec![Intent::new(world.tick, IntentKind::Continue, 10)])
//!     }
//! }
//! impl ProposalGenerator for Quiet {
//!     fn generate(&self, tick: Tick, intents: &[Intent]) -> StageResult<Vec<Proposal>> {
//!         Ok(intents
//!             .iter()
//!             .enumerate()
//!             .map(|(i, intent)| {
//!                 Proposal::new(tick, ProposalId(i as u32), IntentRef::new(i, intent),
//!                     ActionDescriptor::new("maintain_profile"))
//!             })
//!             .collect())
//!     }
//! }
//! impl Actuation for Quiet {
//!     fn build(&self, d: &Decision) -> StageResult<ActuationCommand> {
//!         Ok(ActuationCommand { tick: d.tick, proposal: d.proposal,
//!             channel: "core".into(), payload: serde_json::json!({}) })
//!     }
//! }
//!
//! let ports = KernelPorts::new(Quiet, Quiet, Quiet, Quiet, Quiet, GovernanceEngine, Quiet);
//! let config = GovernanceConfig::new(40.0, 90.0, [IntentKind::Emergency], true).unwrap();
//! let mut kernel = Kernel::new(ports, config).unwrap();
//!
//! let result = kernel.run_tick().unwrap();
//! assert_eq!(result.tick, 0);
//! assert_eq!(result.commands.len(), 1);
//! assert_eq!(kernel.tick_count(), 1);
//! assert!(kernel.verify_audit_chain().is_valid());
//! ```

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use autonomy_audit::{AuditChain, AuditEntry, ChainVerification};
use autonomy_contracts::prelude::*;

use crate::result::{OutcomeCounts, TickResult};
use crate::KernelError;

// ---------------------------------------------------------------------------
// KernelPorts
// ---------------------------------------------------------------------------

/// One implementation per stage port. All seven are required.
pub struct KernelPorts {
    pub sensor: Box<dyn Sensor>,
    pub perception: Box<dyn Perception>,
    pub risk: Box<dyn Risk>,
    pub policy: Box<dyn Policy>,
    pub proposals: Box<dyn ProposalGenerator>,
    pub governance: Box<dyn Governance>,
    pub actuation: Box<dyn Actuation>,
}

impl KernelPorts {
    pub fn new(
        sensor: impl Sensor + 'static,
        perception: impl Perception + 'static,
        risk: impl Risk + 'static,
        policy: impl Policy + 'static,
        proposals: impl ProposalGenerator + 'static,
        governance: impl Governance + 'static,
        actuation: impl Actuation + 'static,
    ) -> Self {
        Self {
            sensor: Box::new(sensor),
            perception: Box::new(perception),
            risk: Box::new(risk),
            policy: Box::new(policy),
            proposals: Box::new(proposals),
            governance: Box::new(governance),
            actuation: Box::new(actuation),
        }
    }
}

impl std::fmt::Debug for KernelPorts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KernelPorts").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// TickDiagnostics
// ---------------------------------------------------------------------------

/// Timing diagnostics for the last tick, committed or not.
#[derive(Debug, Clone, Default)]
pub struct TickDiagnostics {
    /// The tick index these timings belong to.
    pub tick: Tick,
    /// Wall-clock time per stage, in execution order. Governance and
    /// actuation times cover all their invocations for the tick. Stops at
    /// the failing stage when the tick aborted.
    pub stage_times: Vec<(Stage, Duration)>,
    /// Total time for the tick, audit append included.
    pub total_time: Duration,
    /// Whether the tick was committed.
    pub committed: bool,
}

impl TickDiagnostics {
    pub fn time_for(&self, stage: Stage) -> Option<Duration> {
        self.stage_times
            .iter()
            .find(|(s, _)| *s == stage)
            .map(|(_, d)| *d)
    }
}

// ---------------------------------------------------------------------------
// Kernel
// ---------------------------------------------------------------------------

/// The autonomy kernel: stage ports, governance config, and the state that
/// persists across ticks.
///
/// The kernel is single-owner. To drive it from several threads wrap it in
/// a [`SharedKernel`](crate::shared::SharedKernel).
#[derive(Debug)]
pub struct Kernel {
    ports: KernelPorts,
    config: GovernanceConfig,
    /// Index of the next tick to run.
    tick_counter: Tick,
    /// World state of the last committed tick.
    prev_world: Option<WorldState>,
    chain: AuditChain,
    last_diagnostics: TickDiagnostics,
}

/// Records produced by the stages before the audit append.
struct StageOutput {
    frame: SensorFrame,
    world: WorldState,
    risk: RiskReport,
    intents: Vec<Intent>,
    proposals: Vec<Proposal>,
    decisions: Vec<Decision>,
    commands: Vec<ActuationCommand>,
}

impl Kernel {
    /// Create a kernel. The tick counter starts at 0 and the audit chain
    /// empty.
    ///
    /// # Errors
    ///
    /// [`KernelError::Config`] if `config` fails validation.
    pub fn new(ports: KernelPorts, config: GovernanceConfig) -> Result<Self, KernelError> {
        config.validate()?;
        Ok(Self {
            ports,
            config,
            tick_counter: 0,
            prev_world: None,
            chain: AuditChain::new(),
            last_diagnostics: TickDiagnostics::default(),
        })
    }

    /// Execute one tick.
    ///
    /// On success the tick counter advances by one, the previous world is
    /// replaced, and exactly one audit entry is appended. On failure none of
    /// that happens and the error names the failing stage.
    pub fn run_tick(&mut self) -> Result<TickResult, KernelError> {
        let tick = self.tick_counter;
        let span = tracing::debug_span!("tick", tick);
        let _enter = span.enter();

        let tick_start = Instant::now();
        let mut stage_times = Vec::with_capacity(Stage::PIPELINE.len() + 1);

        let sealed = run_stages(
            tick,
            &mut self.ports,
            &self.config,
            self.prev_world.as_ref(),
            &mut stage_times,
        )
        .and_then(|output| {
            let entry = timed(&mut stage_times, Stage::Audit, || {
                let contents = crate::result::TickContents {
                    tick,
                    frame: &output.frame,
                    world: &output.world,
                    risk: &output.risk,
                    intents: &output.intents,
                    proposals: &output.proposals,
                    decisions: &output.decisions,
                    commands: &output.commands,
                };
                self.chain
                    .seal(tick, output.frame.timestamp_ms, &contents)
                    .map_err(anyhow::Error::from)
            })?;
            Ok((output, entry))
        });
        let outcome = sealed.and_then(|(output, entry)| {
            self.commit(&output, &entry)?;
            Ok((output, entry))
        });

        let committed = outcome.is_ok();
        self.last_diagnostics = TickDiagnostics {
            tick,
            stage_times,
            total_time: tick_start.elapsed(),
            committed,
        };

        let (output, audit) = match outcome {
            Ok(done) => done,
            Err(err) => {
                tracing::warn!(error = %err, "tick aborted");
                return Err(err);
            }
        };

        let counts = OutcomeCounts::tally(&output.decisions);
        tracing::info!(
            risk = output.risk.score,
            intents = output.intents.len(),
            proposals = output.proposals.len(),
            approved = counts.approved,
            requires_human = counts.requires_human,
            blocked = counts.blocked,
            commands = output.commands.len(),
            hash = %audit.hash,
            "tick committed"
        );

        Ok(TickResult {
            tick,
            frame: output.frame,
            world: output.world,
            risk: output.risk,
            intents: output.intents,
            proposals: output.proposals,
            decisions: output.decisions,
            commands: output.commands,
            audit,
        })
    }

    /// Push the sealed entry and advance the kernel state.
    ///
    /// The world is cloned before the push; after it only moves and the
    /// counter increment remain, so the chain and counter change together.
    fn commit(&mut self, output: &StageOutput, entry: &AuditEntry) -> Result<(), KernelError> {
        let world = output.world.clone();
        let sealed = entry.clone();
        self.chain
            .commit(sealed)
            .map_err(|err| KernelError::stage(Stage::Audit, err.into()))?;
        self.prev_world = Some(world);
        self.tick_counter += 1;
        Ok(())
    }

    /// Run up to `count` ticks, stopping at the first failure.
    ///
    /// Ticks committed before a failure stay committed.
    pub fn run_ticks(&mut self, count: u64) -> Result<Vec<TickResult>, KernelError> {
        let mut results = Vec::new();
        for _ in 0..count {
            results.push(self.run_tick()?);
        }
        Ok(results)
    }

    /// Replace the governance config. Takes effect from the next tick.
    ///
    /// # Errors
    ///
    /// [`KernelError::Config`] if `config` fails validation; the current
    /// config stays active.
    pub fn set_governance_config(&mut self, config: GovernanceConfig) -> Result<(), KernelError> {
        if let Err(err) = config.validate() {
            tracing::warn!(error = %err, "governance config rejected");
            return Err(err.into());
        }
        tracing::info!(
            max_auto_risk = config.max_auto_risk,
            hard_block_risk = config.hard_block_risk,
            gate_open = config.gate_open,
            "governance config replaced"
        );
        self.config = config;
        Ok(())
    }

    // -- accessors ----------------------------------------------------------

    /// Number of committed ticks, which is also the index of the next tick.
    pub fn tick_count(&self) -> Tick {
        self.tick_counter
    }

    pub fn governance_config(&self) -> &GovernanceConfig {
        &self.config
    }

    /// World state of the last committed tick.
    pub fn previous_world(&self) -> Option<&WorldState> {
        self.prev_world.as_ref()
    }

    /// Read-only view of the audit chain.
    pub fn audit_chain(&self) -> &AuditChain {
        &self.chain
    }

    pub fn audit_entries(&self) -> &[AuditEntry] {
        self.chain.entries()
    }

    pub fn verify_audit_chain(&self) -> ChainVerification {
        self.chain.verify()
    }

    pub fn last_diagnostics(&self) -> &TickDiagnostics {
        &self.last_diagnostics
    }
}

// ---------------------------------------------------------------------------
// Stage execution
// ---------------------------------------------------------------------------

fn run_stages(
    tick: Tick,
    ports: &mut KernelPorts,
    config: &GovernanceConfig,
    prev_world: Option<&WorldState>,
    times: &mut Vec<(Stage, Duration)>,
) -> Result<StageOutput, KernelError> {
    let frame = timed(times, Stage::Sensor, || ports.sensor.read(tick))?;
    expect_tick(Stage::Sensor, tick, frame.tick)?;

    let world = timed(times, Stage::Perception, || {
        ports.perception.run(&frame, prev_world)
    })?;
    expect_tick(Stage::Perception, tick, world.tick)?;

    let risk = timed(times, Stage::Risk, || ports.risk.assess(&world))?;
    expect_tick(Stage::Risk, tick, risk.tick)?;
    if !risk.is_finite() {
        return Err(violation(
            Stage::Risk,
            format!("non-numeric risk (score {}, clarity {})", risk.score, risk.clarity),
        ));
    }
    let risk = risk.clamped();

    let intents = timed(times, Stage::Policy, || ports.policy.decide(&world, &risk))?;
    for intent in &intents {
        expect_tick(Stage::Policy, tick, intent.tick)?;
    }
    let intents = order_intents(intents);

    let proposals = timed(times, Stage::Proposal, || {
        ports.proposals.generate(tick, &intents)
    })?;
    check_proposals(tick, &intents, &proposals)?;

    let decisions = timed(times, Stage::Governance, || {
        proposals
            .iter()
            .map(|p| ports.governance.evaluate(p, &risk, config))
            .collect::<StageResult<Vec<_>>>()
    })?;
    for (proposal, decision) in proposals.iter().zip(&decisions) {
        check_decision(tick, proposal, decision)?;
    }

    let commands = timed(times, Stage::Actuation, || {
        decisions
            .iter()
            .filter(|d| d.is_approved())
            .map(|d| ports.actuation.build(d))
            .collect::<StageResult<Vec<_>>>()
    })?;
    for (decision, command) in decisions.iter().filter(|d| d.is_approved()).zip(&commands) {
        expect_tick(Stage::Actuation, tick, command.tick)?;
        if command.proposal != decision.proposal {
            return Err(violation(
                Stage::Actuation,
                format!(
                    "command for {} built from decision on {}",
                    command.proposal, decision.proposal
                ),
            ));
        }
    }

    Ok(StageOutput {
        frame,
        world,
        risk,
        intents,
        proposals,
        decisions,
        commands,
    })
}

/// Run one stage, record its wall-clock time, and attribute any failure.
fn timed<T>(
    times: &mut Vec<(Stage, Duration)>,
    stage: Stage,
    f: impl FnOnce() -> StageResult<T>,
) -> Result<T, KernelError> {
    let start = Instant::now();
    let out = f();
    times.push((stage, start.elapsed()));
    tracing::trace!(%stage, ok = out.is_ok(), "stage finished");
    out.map_err(|source| KernelError::stage(stage, source))
}

fn violation(stage: Stage, detail: String) -> KernelError {
    KernelError::stage(stage, anyhow::anyhow!(detail))
}

fn expect_tick(stage: Stage, expected: Tick, got: Tick) -> Result<(), KernelError> {
    if expected == got {
        Ok(())
    } else {
        Err(violation(
            stage,
            format!("record stamped with tick {got}, expected {expected}"),
        ))
    }
}

fn check_proposals(tick: Tick, intents: &[Intent], proposals: &[Proposal]) -> Result<(), KernelError> {
    let mut seen = BTreeSet::new();
    for proposal in proposals {
        expect_tick(Stage::Proposal, tick, proposal.tick)?;
        if !seen.insert(proposal.id) {
            return Err(violation(
                Stage::Proposal,
                format!("duplicate proposal id {}", proposal.id),
            ));
        }
        let traced = intents
            .get(proposal.source.index)
            .is_some_and(|intent| proposal.source.matches(intent));
        if !traced {
            return Err(violation(
                Stage::Proposal,
                format!(
                    "proposal {} references intent #{} ({}, priority {}) not in this tick's intents",
                    proposal.id,
                    proposal.source.index,
                    proposal.source.kind,
                    proposal.source.priority
                ),
            ));
        }
    }
    Ok(())
}

fn check_decision(tick: Tick, proposal: &Proposal, decision: &Decision) -> Result<(), KernelError> {
    expect_tick(Stage::Governance, tick, decision.tick)?;
    if decision.proposal != proposal.id {
        return Err(violation(
            Stage::Governance,
            format!(
                "decision references {} while judging {}",
                decision.proposal, proposal.id
            ),
        ));
    }
    if decision.action != proposal.action {
        return Err(violation(
            Stage::Governance,
            format!(
                "decision on {} carries action {:?}, but {:?} was proposed",
                proposal.id, decision.action.action_type, proposal.action.action_type
            ),
        ));
    }
    if decision.outcome != decision.rule.outcome() {
        return Err(violation(
            Stage::Governance,
            format!(
                "decision outcome {} contradicts rule {:?}",
                decision.outcome, decision.rule
            ),
        ));
    }
    Ok(())
}
