//! Concurrent attackers against one defender, through the full runtime.
//!
//! Every attacker task resolves its own seeded attacks and commits the damage
//! to the shared defender while crediting itself. The summary lets an operator
//! check that committed damage and awarded experience line up under
//! contention, with whichever lock backend `LOCK_BACKEND` selects.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use combat_runtime::{
    CharacterId, CharacterSnapshot, CombatHandle, CombatRuntime, InMemoryStatsRepository,
    RuntimeConfig, RuntimeError, StatsRecord,
};
use game_core::{AttackOutcome, CharacterClass, CombatStats, Combatant};
use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{info, warn};

use super::print_json;

const DEFENDER_ID: CharacterId = CharacterId(1);
const FIRST_ATTACKER_ID: u64 = 100;

/// Run concurrent attackers against one character
#[derive(Parser)]
pub struct Skirmish {
    /// Class of every attacker
    #[arg(long, value_name = "CLASS", default_value = "warrior")]
    attacker: CharacterClass,

    /// Class of the shared defender
    #[arg(long, value_name = "CLASS", default_value = "knight")]
    defender: CharacterClass,

    /// Level of all combatants
    #[arg(long, default_value_t = 10)]
    level: i32,

    /// Number of concurrent attacker tasks
    #[arg(short = 'n', long, default_value_t = 8)]
    attackers: u32,

    /// Attacks per attacker
    #[arg(short, long, default_value_t = 5)]
    rounds: u32,

    /// Base seed; each exchange derives its own
    #[arg(short, long, default_value_t = 0)]
    seed: u64,

    /// Pretty-print the JSON output
    #[arg(short, long)]
    pretty: bool,
}

#[derive(Default, Serialize)]
struct Tally {
    exchanges: u32,
    committed: u32,
    damage_dealt: u64,
    outcomes: BTreeMap<String, u32>,
    failures: BTreeMap<String, u32>,
}

impl Tally {
    fn record_outcome(&mut self, outcome: AttackOutcome) {
        self.exchanges += 1;
        *self.outcomes.entry(outcome.to_string()).or_default() += 1;
    }

    fn record_failure(&mut self, err: &RuntimeError) {
        warn!(error = %err, phase = %err.terminal_phase(), "mutation failed");
        *self
            .failures
            .entry(err.terminal_phase().to_string())
            .or_default() += 1;
    }

    fn merge(&mut self, other: Tally) {
        self.exchanges += other.exchanges;
        self.committed += other.committed;
        self.damage_dealt += other.damage_dealt;
        for (outcome, count) in other.outcomes {
            *self.outcomes.entry(outcome).or_default() += count;
        }
        for (phase, count) in other.failures {
            *self.failures.entry(phase).or_default() += count;
        }
    }
}

#[derive(Serialize)]
struct Summary {
    lock_backend: String,
    attackers: u32,
    rounds: u32,
    elapsed_ms: u128,
    #[serde(flatten)]
    tally: Tally,
    defender: CharacterSnapshot,
    attacker_snapshots: Vec<CharacterSnapshot>,
}

impl Skirmish {
    pub async fn execute(self) -> Result<()> {
        let config = RuntimeConfig::from_env();
        let lock_backend = config.lock.backend.to_string();

        let attacker = Combatant::preset(self.attacker, self.level);
        let defender = Combatant::preset(self.defender, self.level);
        let attacker_stats = attacker
            .combat_stats()
            .context("invalid attacker preset")?;
        let defender_stats = defender
            .combat_stats()
            .context("invalid defender preset")?;

        let repository = Arc::new(InMemoryStatsRepository::new());
        repository.insert(DEFENDER_ID, StatsRecord::seeded(defender.resource_pools()?))?;
        let attacker_ids: Vec<CharacterId> = (0..self.attackers)
            .map(|i| CharacterId(FIRST_ATTACKER_ID + u64::from(i)))
            .collect();
        let attacker_pools = attacker.resource_pools()?;
        for id in &attacker_ids {
            repository.insert(*id, StatsRecord::seeded(attacker_pools))?;
        }

        let runtime = CombatRuntime::builder()
            .config(config)
            .repository(repository)
            .build()
            .await
            .context("failed to build combat runtime")?;
        let handle = runtime.handle();

        info!(
            attacker = %self.attacker,
            defender = %self.defender,
            attackers = self.attackers,
            rounds = self.rounds,
            lock_backend = %lock_backend,
            "starting skirmish"
        );

        let started = Instant::now();
        let mut tasks = JoinSet::new();
        for (index, id) in attacker_ids.iter().copied().enumerate() {
            let first_seed = self
                .seed
                .wrapping_add(index as u64 * u64::from(self.rounds));
            tasks.spawn(run_attacker(
                handle.clone(),
                id,
                attacker_stats,
                defender_stats,
                first_seed,
                self.rounds,
            ));
        }

        let mut tally = Tally::default();
        while let Some(joined) = tasks.join_next().await {
            tally.merge(joined.context("attacker task panicked")?);
        }
        let elapsed_ms = started.elapsed().as_millis();

        let defender = handle.character(DEFENDER_ID).await?;
        let mut attacker_snapshots = Vec::with_capacity(attacker_ids.len());
        for id in attacker_ids {
            attacker_snapshots.push(handle.character(id).await?);
        }

        info!(
            exchanges = tally.exchanges,
            committed = tally.committed,
            defender_health = defender.health,
            elapsed_ms,
            "skirmish finished"
        );

        print_json(
            &Summary {
                lock_backend,
                attackers: self.attackers,
                rounds: self.rounds,
                elapsed_ms,
                tally,
                defender,
                attacker_snapshots,
            },
            self.pretty,
        )
    }
}

async fn run_attacker(
    handle: CombatHandle,
    id: CharacterId,
    attacker: CombatStats,
    defender: CombatStats,
    first_seed: u64,
    rounds: u32,
) -> Tally {
    let options = handle.default_options();
    let mut tally = Tally::default();

    for round in 0..rounds {
        let seed = first_seed.wrapping_add(u64::from(round));
        let result = handle.resolve_attack(&attacker, &defender, 0, seed);
        tally.record_outcome(result.outcome);

        let snapshot = match handle.apply_combat_result(DEFENDER_ID, &result, options).await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                tally.record_failure(&err);
                continue;
            }
        };
        tally.committed += 1;
        tally.damage_dealt += u64::from(result.final_damage);

        if let Err(err) = handle.award_attacker(id, &attacker, &result, options).await {
            tally.record_failure(&err);
        }
        if snapshot.is_defeated() {
            break;
        }
    }

    tally
}
