//! Scripted stage ports shared by the kernel integration tests.
//!
//! Every port reads from one [`Script`] behind an `Arc<Mutex<_>>`, so a test
//! can change the risk score, the intents, or inject a failure between ticks
//! while the kernel owns the ports.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use autonomy_kernel::prelude::*;

#[derive(Debug, Default)]
pub struct Script {
    /// Risk score the risk stage reports.
    pub risk_score: f64,
    /// Intents the policy returns, as (kind, priority), in this order.
    pub intents: Vec<(IntentKind, i32)>,
    /// Stage that fails on its next call.
    pub fail_at: Option<Stage>,
    /// Whether `fail_at` clears itself after one failure.
    pub fail_once: bool,
    /// Every stage invocation, in call order.
    pub calls: Vec<Stage>,
    /// Tick values the sensor was asked to read.
    pub sensor_reads: Vec<Tick>,
    /// `prev_world.tick` seen by perception on each call.
    pub prev_world_ticks: Vec<Option<Tick>>,
}

pub type Shared = Arc<Mutex<Script>>;

fn enter(script: &Shared, stage: Stage) -> StageResult<()> {
    let mut s = script.lock().unwrap();
    s.calls.push(stage);
    if s.fail_at == Some(stage) {
        if s.fail_once {
            s.fail_at = None;
        }
        anyhow::bail!("injected {stage} failure");
    }
    Ok(())
}

pub struct ScriptedSensor(pub Shared);
pub struct ScriptedPerception(pub Shared);
pub struct ScriptedRisk(pub Shared);
pub struct ScriptedPolicy(pub Shared);
pub struct OnePerIntent(pub Shared);
pub struct ScriptedActuation(pub Shared);

/// Wraps the default engine to record its calls.
pub struct RecordingGovernance(pub Shared);

impl Sensor for ScriptedSensor {
    fn read(&mut self, tick: Tick) -> StageResult<SensorFrame> {
        enter(&self.0, Stage::Sensor)?;
        self.0.lock().unwrap().sensor_reads.push(tick);
        Ok(SensorFrame::new(tick, 10_000 + tick * 500)
            .with_channel("probe", serde_json::json!({ "tick": tick })))
    }
}

impl Perception for ScriptedPerception {
    fn run(&self, frame: &SensorFrame, prev_world: Option<&WorldState>) -> StageResult<WorldState> {
        enter(&self.0, Stage::Perception)?;
        self.0
            .lock()
            .unwrap()
            .prev_world_ticks
            .push(prev_world.map(|w| w.tick));
        Ok(WorldState::from_frame(frame).with_health("core", 1.0))
    }
}

impl Risk for ScriptedRisk {
    fn assess(&self, world: &WorldState) -> StageResult<RiskReport> {
        enter(&self.0, Stage::Risk)?;
        let score = self.0.lock().unwrap().risk_score;
        Ok(RiskReport::new(world.tick, world.timestamp_ms, score, 80.0)
            .with_driver(RiskDriver::weighted("scripted", score)))
    }
}

impl Policy for ScriptedPolicy {
    fn decide(&self, world: &WorldState, _risk: &RiskReport) -> StageResult<Vec<Intent>> {
        enter(&self.0, Stage::Policy)?;
        let intents = self.0.lock().unwrap().intents.clone();
        Ok(intents
            .into_iter()
            .map(|(kind, priority)| Intent::new(world.tick, kind, priority))
            .collect())
    }
}

impl ProposalGenerator for OnePerIntent {
    fn generate(&self, tick: Tick, intents: &[Intent]) -> StageResult<Vec<Proposal>> {
        enter(&self.0, Stage::Proposal)?;
        Ok(intents
            .iter()
            .enumerate()
            .map(|(i, intent)| {
                Proposal::new(
                    tick,
                    ProposalId(i as u32),
                    IntentRef::new(i, intent),
                    ActionDescriptor::new(format!("do_{}", intent.kind.as_str().to_lowercase())),
                )
            })
            .collect())
    }
}

impl Governance for RecordingGovernance {
    fn evaluate(
        &self,
        proposal: &Proposal,
        risk: &RiskReport,
        config: &GovernanceConfig,
    ) -> StageResult<Decision> {
        enter(&self.0, Stage::Governance)?;
        GovernanceEngine.evaluate(proposal, risk, config)
    }
}

impl Actuation for ScriptedActuation {
    fn build(&self, decision: &Decision) -> StageResult<ActuationCommand> {
        enter(&self.0, Stage::Actuation)?;
        Ok(ActuationCommand {
            tick: decision.tick,
            proposal: decision.proposal,
            channel: "test".to_owned(),
            payload: serde_json::json!({ "action": decision.action.action_type }),
        })
    }
}

pub fn script(risk_score: f64, intents: &[(IntentKind, i32)]) -> Shared {
    Arc::new(Mutex::new(Script {
        risk_score,
        intents: intents.to_vec(),
        ..Script::default()
    }))
}

pub fn ports(s: &Shared) -> KernelPorts {
    KernelPorts::new(
        ScriptedSensor(s.clone()),
        ScriptedPerception(s.clone()),
        ScriptedRisk(s.clone()),
        ScriptedPolicy(s.clone()),
        OnePerIntent(s.clone()),
        RecordingGovernance(s.clone()),
        ScriptedActuation(s.clone()),
    )
}

/// hard_block 90, max_auto 40, human for EMERGENCY.
pub fn config(gate_open: bool) -> GovernanceConfig {
    GovernanceConfig::new(40.0, 90.0, [IntentKind::Emergency], gate_open).unwrap()
}

pub fn kernel(s: &Shared) -> Kernel {
    Kernel::new(ports(s), config(true)).unwrap()
}
