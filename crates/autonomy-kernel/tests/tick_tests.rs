//! Integration tests for the tick orchestrator.
//!
//! Covers stage ordering, tick numbering, the proposal/decision/command
//! correspondence, atomic abort on stage failure, record validation, config
//! swaps, and the audit chain the kernel builds.

mod common;

use autonomy_kernel::prelude::*;
use common::*;

// ---------------------------------------------------------------------------
// 1. Stage order and tick numbering
// ---------------------------------------------------------------------------

#[test]
fn stages_run_in_fixed_order() {
    let s = script(30.0, &[(IntentKind::Continue, 10), (IntentKind::SlowRoll, 50)]);
    let mut kernel = kernel(&s);
    kernel.run_tick().unwrap();

    let calls = s.lock().unwrap().calls.clone();
    assert_eq!(
        calls,
        vec![
            Stage::Sensor,
            Stage::Perception,
            Stage::Risk,
            Stage::Policy,
            Stage::Proposal,
            Stage::Governance,
            Stage::Governance,
            Stage::Actuation,
            Stage::Actuation,
        ]
    );
}

#[test]
fn ticks_start_at_zero_and_advance_by_one() {
    let s = script(10.0, &[(IntentKind::Continue, 10)]);
    let mut kernel = kernel(&s);
    assert_eq!(kernel.tick_count(), 0);

    for expected in 0..5 {
        let result = kernel.run_tick().unwrap();
        assert_eq!(result.tick, expected);
        assert_eq!(result.frame.tick, expected);
        assert_eq!(result.world.tick, expected);
        assert_eq!(result.risk.tick, expected);
        assert_eq!(result.audit.tick, expected);
        assert_eq!(result.audit.sequence, expected);
    }
    assert_eq!(kernel.tick_count(), 5);
    assert_eq!(s.lock().unwrap().sensor_reads, vec![0, 1, 2, 3, 4]);
}

#[test]
fn perception_sees_previous_world() {
    let s = script(10.0, &[]);
    let mut kernel = kernel(&s);
    assert!(kernel.previous_world().is_none());

    kernel.run_ticks(3).unwrap();
    assert_eq!(
        s.lock().unwrap().prev_world_ticks,
        vec![None, Some(0), Some(1)]
    );
    assert_eq!(kernel.previous_world().unwrap().tick, 2);
}

// ---------------------------------------------------------------------------
// 2. Intent ordering
// ---------------------------------------------------------------------------

#[test]
fn intents_are_stably_ordered_by_priority() {
    let s = script(
        10.0,
        &[
            (IntentKind::from("FIRST_FIVE"), 5),
            (IntentKind::from("SECOND_FIVE"), 5),
            (IntentKind::from("NINE"), 9),
        ],
    );
    let mut kernel = kernel(&s);
    let result = kernel.run_tick().unwrap();

    let kinds: Vec<_> = result.intents.iter().map(|i| i.kind.as_str()).collect();
    assert_eq!(kinds, vec!["NINE", "FIRST_FIVE", "SECOND_FIVE"]);

    // Proposals follow the ordered intents.
    let sources: Vec<_> = result.proposals.iter().map(|p| p.source.index).collect();
    assert_eq!(sources, vec![0, 1, 2]);
    assert_eq!(result.proposals[0].source.kind.as_str(), "NINE");
}

// ---------------------------------------------------------------------------
// 3. Proposal / decision / command correspondence
// ---------------------------------------------------------------------------

#[test]
fn one_decision_per_proposal_and_commands_only_for_approvals() {
    // risk 30: CONTINUE approves, EMERGENCY needs a human.
    let s = script(
        30.0,
        &[
            (IntentKind::Continue, 10),
            (IntentKind::Emergency, 90),
            (IntentKind::SlowRoll, 50),
        ],
    );
    let mut kernel = kernel(&s);
    let result = kernel.run_tick().unwrap();

    assert_eq!(result.decisions.len(), result.proposals.len());
    for (p, d) in result.proposals.iter().zip(&result.decisions) {
        assert_eq!(d.proposal, p.id);
        assert_eq!(d.action, p.action);
    }

    let counts = result.outcome_counts();
    assert_eq!(counts.approved, 2);
    assert_eq!(counts.requires_human, 1);
    assert_eq!(counts.blocked, 0);

    let approved: Vec<_> = result.approved().map(|d| d.proposal).collect();
    let commanded: Vec<_> = result.commands.iter().map(|c| c.proposal).collect();
    assert_eq!(approved, commanded);
    assert_eq!(result.commands.len(), 2);
}

#[test]
fn hard_block_yields_no_commands() {
    let s = script(95.0, &[(IntentKind::Continue, 10), (IntentKind::Emergency, 90)]);
    let mut kernel = kernel(&s);
    let result = kernel.run_tick().unwrap();

    assert!(result.decisions.iter().all(|d| d.outcome == Outcome::Blocked));
    assert!(result.commands.is_empty());
    assert!(!s.lock().unwrap().calls.contains(&Stage::Actuation));
}

#[test]
fn closed_gate_yields_no_commands() {
    let s = script(10.0, &[(IntentKind::Continue, 10)]);
    let mut kernel = Kernel::new(ports(&s), config(false)).unwrap();
    let result = kernel.run_tick().unwrap();

    assert_eq!(result.decisions[0].outcome, Outcome::RequiresHuman);
    assert_eq!(result.decisions[0].rule, GovernanceRule::GateClosed);
    assert!(result.commands.is_empty());
}

#[test]
fn empty_policy_still_commits_a_tick() {
    let s = script(10.0, &[]);
    let mut kernel = kernel(&s);
    let result = kernel.run_tick().unwrap();
    assert!(result.intents.is_empty());
    assert!(result.proposals.is_empty());
    assert!(result.decisions.is_empty());
    assert_eq!(kernel.audit_entries().len(), 1);
}

#[test]
fn risk_is_clamped_before_governance() {
    let s = script(250.0, &[(IntentKind::Continue, 10)]);
    let mut kernel = kernel(&s);
    let result = kernel.run_tick().unwrap();
    assert_eq!(result.risk.score, 100.0);
    assert_eq!(result.decisions[0].risk_score, 100.0);
    assert_eq!(result.decisions[0].outcome, Outcome::Blocked);
}

// ---------------------------------------------------------------------------
// 4. Atomic abort on stage failure
// ---------------------------------------------------------------------------

#[test]
fn failure_at_any_stage_leaves_no_trace() {
    for stage in Stage::PIPELINE {
        let s = script(10.0, &[(IntentKind::Continue, 10)]);
        let mut kernel = kernel(&s);
        kernel.run_ticks(2).unwrap();
        let tail = kernel.audit_chain().tail_hash().to_owned();

        s.lock().unwrap().fail_at = Some(stage);
        let err = kernel.run_tick().unwrap_err();

        assert_eq!(err.failed_stage(), Some(stage), "stage {stage}");
        assert!(err.to_string().contains(stage.as_str()));
        assert_eq!(kernel.tick_count(), 2, "stage {stage}");
        assert_eq!(kernel.audit_entries().len(), 2, "stage {stage}");
        assert_eq!(kernel.audit_chain().tail_hash(), tail, "stage {stage}");
        assert_eq!(kernel.previous_world().unwrap().tick, 1, "stage {stage}");
        assert!(!kernel.last_diagnostics().committed);
    }
}

#[test]
fn retry_after_failure_reuses_tick_index() {
    let s = script(10.0, &[(IntentKind::Continue, 10)]);
    let mut kernel = kernel(&s);
    kernel.run_tick().unwrap();

    {
        let mut script = s.lock().unwrap();
        script.fail_at = Some(Stage::Risk);
        script.fail_once = true;
    }
    assert!(kernel.run_tick().is_err());

    let retried = kernel.run_tick().unwrap();
    assert_eq!(retried.tick, 1);
    assert_eq!(retried.audit.sequence, 1);
    // The retry read a fresh frame for the same index.
    assert_eq!(s.lock().unwrap().sensor_reads, vec![0, 1, 1]);
    assert!(kernel.verify_audit_chain().is_valid());
}

#[test]
fn stage_error_exposes_source() {
    let s = script(10.0, &[(IntentKind::Continue, 10)]);
    s.lock().unwrap().fail_at = Some(Stage::Policy);
    let mut kernel = kernel(&s);
    let err = kernel.run_tick().unwrap_err();
    let source = std::error::Error::source(&err).expect("stage failure carries a source");
    assert!(source.to_string().contains("injected policy failure"));
}

// ---------------------------------------------------------------------------
// 5. Record validation
// ---------------------------------------------------------------------------

struct WrongTickSensor;

impl Sensor for WrongTickSensor {
    fn read(&mut self, tick: Tick) -> StageResult<SensorFrame> {
        Ok(SensorFrame::new(tick + 7, 0))
    }
}

#[test]
fn frame_with_wrong_tick_is_a_sensor_failure() {
    let s = script(10.0, &[]);
    let mut ports = ports(&s);
    ports.sensor = Box::new(WrongTickSensor);
    let mut kernel = Kernel::new(ports, config(true)).unwrap();

    let err = kernel.run_tick().unwrap_err();
    assert_eq!(err.failed_stage(), Some(Stage::Sensor));
    assert_eq!(kernel.tick_count(), 0);
    assert!(kernel.audit_entries().is_empty());
}

struct NanRisk;

impl Risk for NanRisk {
    fn assess(&self, world: &WorldState) -> StageResult<RiskReport> {
        Ok(RiskReport::new(world.tick, world.timestamp_ms, f64::NAN, 50.0))
    }
}

#[test]
fn nan_risk_is_a_risk_failure() {
    let s = script(10.0, &[(IntentKind::Continue, 10)]);
    let mut ports = ports(&s);
    ports.risk = Box::new(NanRisk);
    let mut kernel = Kernel::new(ports, config(true)).unwrap();
    assert_eq!(kernel.run_tick().unwrap_err().failed_stage(), Some(Stage::Risk));
}

/// Points every proposal at an intent index that does not exist.
struct DanglingProposals;

impl ProposalGenerator for DanglingProposals {
    fn generate(&self, tick: Tick, intents: &[Intent]) -> StageResult<Vec<Proposal>> {
        Ok(intents
            .iter()
            .map(|intent| {
                Proposal::new(
                    tick,
                    ProposalId(0),
                    IntentRef::new(intents.len(), intent),
                    ActionDescriptor::new("dangling"),
                )
            })
            .collect())
    }
}

#[test]
fn untraceable_proposal_is_a_proposal_failure() {
    let s = script(10.0, &[(IntentKind::Continue, 10)]);
    let mut ports = ports(&s);
    ports.proposals = Box::new(DanglingProposals);
    let mut kernel = Kernel::new(ports, config(true)).unwrap();
    assert_eq!(
        kernel.run_tick().unwrap_err().failed_stage(),
        Some(Stage::Proposal)
    );
}

/// Emits two proposals with the same id for every intent.
struct DuplicateIds;

impl ProposalGenerator for DuplicateIds {
    fn generate(&self, tick: Tick, intents: &[Intent]) -> StageResult<Vec<Proposal>> {
        Ok(intents
            .iter()
            .enumerate()
            .flat_map(|(i, intent)| {
                let p = Proposal::new(
                    tick,
                    ProposalId(1),
                    IntentRef::new(i, intent),
                    ActionDescriptor::new("twin"),
                );
                [p.clone(), p]
            })
            .collect())
    }
}

#[test]
fn duplicate_proposal_ids_are_rejected() {
    let s = script(10.0, &[(IntentKind::Continue, 10)]);
    let mut ports = ports(&s);
    ports.proposals = Box::new(DuplicateIds);
    let mut kernel = Kernel::new(ports, config(true)).unwrap();
    let err = kernel.run_tick().unwrap_err();
    assert_eq!(err.failed_stage(), Some(Stage::Proposal));
    assert!(err.to_string().contains("duplicate"));
}

/// Approves everything, ignoring the rules, and mislabels the rule.
struct RubberStamp;

impl Governance for RubberStamp {
    fn evaluate(
        &self,
        proposal: &Proposal,
        risk: &RiskReport,
        _config: &GovernanceConfig,
    ) -> StageResult<Decision> {
        Ok(Decision {
            tick: proposal.tick,
            proposal: proposal.id,
            action: proposal.action.clone(),
            outcome: Outcome::Approved,
            rule: GovernanceRule::HardBlock,
            reason: "always yes".to_owned(),
            risk_score: risk.score,
            risk_clarity: risk.clarity,
        })
    }
}

#[test]
fn inconsistent_decision_is_a_governance_failure() {
    let s = script(95.0, &[(IntentKind::Continue, 10)]);
    let mut ports = ports(&s);
    ports.governance = Box::new(RubberStamp);
    let mut kernel = Kernel::new(ports, config(true)).unwrap();
    assert_eq!(
        kernel.run_tick().unwrap_err().failed_stage(),
        Some(Stage::Governance)
    );
    assert!(kernel.audit_entries().is_empty());
}

/// Judges by the rules, then swaps in an action nobody proposed.
struct ActionSwap;

impl Governance for ActionSwap {
    fn evaluate(
        &self,
        proposal: &Proposal,
        risk: &RiskReport,
        config: &GovernanceConfig,
    ) -> StageResult<Decision> {
        let mut decision = judge(proposal, risk, config);
        decision.action = ActionDescriptor::new("self_destruct");
        Ok(decision)
    }
}

#[test]
fn substituted_action_is_a_governance_failure() {
    let s = script(20.0, &[(IntentKind::Continue, 10)]);
    let mut ports = ports(&s);
    ports.governance = Box::new(ActionSwap);
    let mut kernel = Kernel::new(ports, config(true)).unwrap();

    let err = kernel.run_tick().unwrap_err();
    assert_eq!(err.failed_stage(), Some(Stage::Governance));
    assert!(err.to_string().contains("self_destruct"), "{err}");
    assert!(!s.lock().unwrap().calls.contains(&Stage::Actuation));
    assert_eq!(kernel.tick_count(), 0);
    assert!(kernel.audit_entries().is_empty());
}

#[test]
fn committed_commands_carry_the_proposed_action() {
    let s = script(20.0, &[(IntentKind::Continue, 10), (IntentKind::SlowRoll, 5)]);
    let result = kernel(&s).run_tick().unwrap();
    for command in &result.commands {
        let proposal = result
            .proposals
            .iter()
            .find(|p| p.id == command.proposal)
            .unwrap();
        assert_eq!(command.payload["action"], proposal.action.action_type.as_str());
    }
    for (proposal, decision) in result.proposals.iter().zip(&result.decisions) {
        assert_eq!(decision.action, proposal.action);
    }
}

// ---------------------------------------------------------------------------
// 6. Governance config swaps
// ---------------------------------------------------------------------------

#[test]
fn invalid_config_rejected_at_construction() {
    let s = script(10.0, &[]);
    let bad = GovernanceConfig {
        max_auto_risk: 60.0,
        hard_block_risk: 50.0,
        require_human_for: Default::default(),
        gate_open: true,
    };
    let err = Kernel::new(ports(&s), bad).unwrap_err();
    assert!(matches!(
        err,
        KernelError::Config(ConfigError::InvertedThresholds { .. })
    ));
}

#[test]
fn rejected_swap_keeps_previous_config() {
    let s = script(30.0, &[(IntentKind::Continue, 10)]);
    let mut kernel = kernel(&s);

    let mut bad = config(false);
    bad.hard_block_risk = 10.0;
    assert!(kernel.set_governance_config(bad).is_err());
    assert!(kernel.governance_config().gate_open);
    assert_eq!(kernel.run_tick().unwrap().decisions[0].outcome, Outcome::Approved);
}

#[test]
fn accepted_swap_applies_from_next_tick() {
    let s = script(30.0, &[(IntentKind::Continue, 10)]);
    let mut kernel = kernel(&s);
    assert_eq!(kernel.run_tick().unwrap().decisions[0].outcome, Outcome::Approved);

    kernel.set_governance_config(config(false)).unwrap();
    let result = kernel.run_tick().unwrap();
    assert_eq!(result.decisions[0].outcome, Outcome::RequiresHuman);
    assert!(result.commands.is_empty());
}

// ---------------------------------------------------------------------------
// 7. Audit chain
// ---------------------------------------------------------------------------

#[test]
fn kernel_chain_links_every_tick() {
    let s = script(30.0, &[(IntentKind::Continue, 10)]);
    let mut kernel = kernel(&s);
    let results = kernel.run_ticks(6).unwrap();

    let entries = kernel.audit_entries();
    assert_eq!(entries.len(), 6);
    assert_eq!(entries[0].prev_hash, GENESIS_HASH);
    for n in 1..entries.len() {
        assert_eq!(entries[n].prev_hash, entries[n - 1].hash);
    }
    for (result, entry) in results.iter().zip(entries) {
        assert_eq!(&result.audit, entry);
        assert_eq!(entry.timestamp_ms, result.frame.timestamp_ms);
        assert!(verify_contents(entry, &result.contents()).unwrap());
    }
    assert!(kernel.verify_audit_chain().is_valid());
}

#[test]
fn tampering_with_a_result_is_detectable() {
    let s = script(30.0, &[(IntentKind::Continue, 10)]);
    let mut kernel = kernel(&s);
    let mut result = kernel.run_tick().unwrap();

    result.decisions[0].outcome = Outcome::Blocked;
    assert!(!verify_contents(&result.audit, &result.contents()).unwrap());
}

#[test]
fn tampering_with_the_chain_is_located() {
    let s = script(30.0, &[(IntentKind::Continue, 10)]);
    let mut kernel = kernel(&s);
    kernel.run_ticks(5).unwrap();

    let mut entries = kernel.audit_entries().to_vec();
    entries[3].prev_hash = entries[1].hash.clone();
    let b = verify(&entries).first_break.unwrap();
    assert_eq!(b.index, 3);
    assert_eq!(b.tick, 3);
}

#[test]
fn diagnostics_cover_every_stage_of_a_committed_tick() {
    let s = script(30.0, &[(IntentKind::Continue, 10)]);
    let mut kernel = kernel(&s);
    kernel.run_tick().unwrap();

    let diag = kernel.last_diagnostics();
    assert!(diag.committed);
    assert_eq!(diag.tick, 0);
    let stages: Vec<_> = diag.stage_times.iter().map(|(s, _)| *s).collect();
    let mut expected = Stage::PIPELINE.to_vec();
    expected.push(Stage::Audit);
    assert_eq!(stages, expected);
    assert!(diag.time_for(Stage::Audit).is_some());
}
