//! Resolve one attack between two combatants.

use anyhow::{Context, Result};
use clap::Parser;
use game_core::{Attributes, CharacterClass, Combatant};
use serde_json::json;
use tracing::debug;

use super::print_json;

/// Resolve a single seeded attack and print the result
#[derive(Parser)]
pub struct Resolve {
    /// Attacking class (warrior, knight, paladin, rogue, ranger, mage, cleric, warlock)
    #[arg(long, value_name = "CLASS")]
    attacker: CharacterClass,

    /// Defending class
    #[arg(long, value_name = "CLASS")]
    defender: CharacterClass,

    /// Attacker level
    #[arg(long, default_value_t = 10)]
    attacker_level: i32,

    /// Defender level
    #[arg(long, default_value_t = 10)]
    defender_level: i32,

    /// Attacker attributes as STR,DEX,CON,INT,WIS,SPI,LCK (defaults to the class preset)
    #[arg(long, value_name = "LIST", value_parser = parse_attributes)]
    attacker_attributes: Option<[i32; 7]>,

    /// Defender attributes as STR,DEX,CON,INT,WIS,SPI,LCK (defaults to the class preset)
    #[arg(long, value_name = "LIST", value_parser = parse_attributes)]
    defender_attributes: Option<[i32; 7]>,

    /// Seed of the PCG roll stream
    #[arg(short, long, default_value_t = 0)]
    seed: u64,

    /// Pretty-print the JSON output
    #[arg(short, long)]
    pretty: bool,
}

impl Resolve {
    pub fn execute(self) -> Result<()> {
        let attacker = combatant(self.attacker, self.attacker_level, self.attacker_attributes);
        let defender = combatant(self.defender, self.defender_level, self.defender_attributes);

        let attacker_stats = attacker
            .combat_stats()
            .context("invalid attacker attributes")?;
        let defender_stats = defender
            .combat_stats()
            .context("invalid defender attributes")?;
        let result = game_core::resolve_between(&attacker, &defender, self.seed)?;

        debug!(
            outcome = %result.outcome,
            damage = result.final_damage,
            seed = self.seed,
            "attack resolved"
        );

        print_json(
            &json!({
                "seed": self.seed,
                "attacker": { "combatant": attacker, "stats": attacker_stats },
                "defender": { "combatant": defender, "stats": defender_stats },
                "result": result,
            }),
            self.pretty,
        )
    }
}

fn combatant(class: CharacterClass, level: i32, attributes: Option<[i32; 7]>) -> Combatant {
    match attributes {
        Some([strength, dexterity, constitution, intelligence, wisdom, spirit, luck]) => {
            Combatant::new(
                class,
                Attributes::new(
                    strength,
                    dexterity,
                    constitution,
                    intelligence,
                    wisdom,
                    spirit,
                    luck,
                    level,
                ),
            )
        }
        None => Combatant::preset(class, level),
    }
}

fn parse_attributes(raw: &str) -> std::result::Result<[i32; 7], String> {
    let values = raw
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<i32>()
                .map_err(|e| format!("`{}`: {e}", part.trim()))
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;

    values
        .try_into()
        .map_err(|values: Vec<i32>| format!("expected 7 attributes, got {}", values.len()))
}
