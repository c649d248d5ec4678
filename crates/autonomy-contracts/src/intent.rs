//! Prioritised behavioural directives produced by the policy stage.
//!
//! Intents for a tick are totally ordered by `priority` (descending). Ties
//! keep the order the policy produced them in; [`order_intents`] is the
//! single implementation of that ordering and the kernel applies it to every
//! policy output.

use std::cmp::{Ordering, Reverse};
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::{Params, Tick};

// ---------------------------------------------------------------------------
// IntentKind
// ---------------------------------------------------------------------------

/// The kind of an [`Intent`].
///
/// The set is open: domains add their own kinds through
/// [`Custom`](IntentKind::Custom). Kinds are identified by their upper-case
/// name, so equality, ordering and hashing all go through
/// [`as_str`](IntentKind::as_str). `IntentKind::from("EMERGENCY")` and
/// `IntentKind::Custom("EMERGENCY".into())` are the same kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum IntentKind {
    /// Keep doing what the system is doing.
    Continue,
    /// Reduce operating rate.
    SlowRoll,
    /// Enter an emergency posture.
    Emergency,
    /// Stop and hold position.
    Hold,
    /// Withdraw from the current operating envelope.
    Retreat,
    /// Domain-specific kind, by name.
    Custom(String),
}

impl IntentKind {
    pub fn as_str(&self) -> &str {
        match self {
            IntentKind::Continue => "CONTINUE",
            IntentKind::SlowRoll => "SLOW_ROLL",
            IntentKind::Emergency => "EMERGENCY",
            IntentKind::Hold => "HOLD",
            IntentKind::Retreat => "RETREAT",
            IntentKind::Custom(name) => name,
        }
    }
}

impl From<&str> for IntentKind {
    fn from(name: &str) -> Self {
        match name {
            "CONTINUE" => IntentKind::Continue,
            "SLOW_ROLL" => IntentKind::SlowRoll,
            "EMERGENCY" => IntentKind::Emergency,
            "HOLD" => IntentKind::Hold,
            "RETREAT" => IntentKind::Retreat,
            other => IntentKind::Custom(other.to_owned()),
        }
    }
}

impl From<String> for IntentKind {
    fn from(name: String) -> Self {
        match IntentKind::from(name.as_str()) {
            IntentKind::Custom(_) => IntentKind::Custom(name),
            known => known,
        }
    }
}

impl From<IntentKind> for String {
    fn from(kind: IntentKind) -> Self {
        match kind {
            IntentKind::Custom(name) => name,
            known => known.as_str().to_owned(),
        }
    }
}

impl PartialEq for IntentKind {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for IntentKind {}

impl PartialOrd for IntentKind {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for IntentKind {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl Hash for IntentKind {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl std::fmt::Display for IntentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Intent
// ---------------------------------------------------------------------------

/// A high-level, domain-agnostic behaviour directive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub tick: Tick,
    pub kind: IntentKind,
    /// Higher is more urgent.
    pub priority: i32,
    pub params: Params,
    /// Why the policy raised this intent.
    pub rationale: String,
}

impl Intent {
    pub fn new(tick: Tick, kind: IntentKind, priority: i32) -> Self {
        Self {
            tick,
            kind,
            priority,
            params: Params::new(),
            rationale: String::new(),
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.params.insert(name.into(), value);
        self
    }

    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = rationale.into();
        self
    }
}

/// Sort intents by descending priority, keeping input order among equals.
pub fn order_intents(mut intents: Vec<Intent>) -> Vec<Intent> {
    // `sort_by_key` is a stable sort.
    intents.sort_by_key(|intent| Reverse(intent.priority));
    intents
}

// ---------------------------------------------------------------------------
// IntentRef
// ---------------------------------------------------------------------------

/// A proposal's back-reference to the intent it was derived from.
///
/// `index` is the intent's position in the tick's ordered intent list; kind
/// and priority are copied so governance can match `require_human_for`
/// without looking the intent up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentRef {
    pub index: usize,
    pub kind: IntentKind,
    pub priority: i32,
}

impl IntentRef {
    pub fn new(index: usize, intent: &Intent) -> Self {
        Self {
            index,
            kind: intent.kind.clone(),
            priority: intent.priority,
        }
    }

    /// Whether this reference points at `intent` (kind and priority agree).
    pub fn matches(&self, intent: &Intent) -> bool {
        self.kind == intent.kind && self.priority == intent.priority
    }
}
