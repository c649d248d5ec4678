//! Demo loop -- runs the reference modules through the kernel and prints one
//! summary line per tick.
//!
//! Run with:
//!   cargo run --example demo_loop -p autonomy-modules -- [TICKS] [SEED] [--closed]
//!
//! `--closed` starts with the human gate closed, so nothing is actuated.
//! Set `RUST_LOG=autonomy_kernel=debug` to see the kernel's own events.

use std::time::Duration;

use anyhow::Context;
use autonomy_kernel::prelude::*;
use autonomy_modules::prelude::*;

fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let mut ticks: u64 = 20;
    let mut seed: u64 = 42;
    let mut gate_open = true;
    let mut positional = 0;
    for arg in std::env::args().skip(1) {
        if arg == "--closed" {
            gate_open = false;
            continue;
        }
        match positional {
            0 => ticks = arg.parse().context("TICKS must be a non-negative integer")?,
            1 => seed = arg.parse().context("SEED must be a non-negative integer")?,
            _ => anyhow::bail!("unexpected argument {arg:?}"),
        }
        positional += 1;
    }

    let config = GovernanceConfig::new(
        45.0,
        85.0,
        [IntentKind::Retreat, IntentKind::Emergency],
        gate_open,
    )?;
    let mut kernel = reference_kernel(seed, config)?;

    let gate = if gate_open { "open" } else { "closed" };
    println!("autonomy kernel demo: {ticks} ticks, seed {seed}, gate {gate}");
    for _ in 0..ticks {
        let result = kernel.run_tick()?;
        println!("{}", result.summary());
        std::thread::sleep(Duration::from_millis(100));
    }

    let verification = kernel.verify_audit_chain();
    println!();
    println!("ticks committed: {}", kernel.tick_count());
    println!("audit entries:   {}", kernel.audit_entries().len());
    println!("chain tail:      {}", kernel.audit_chain().tail_hash());
    verification.into_result()?;
    println!("chain verified");
    Ok(())
}
