//! Warcouncil demo binary
//!
//! Runs a small scripted skirmish: one coordinated player, a handful of
//! units, a mid-run player command, and a discovery wave. Strategic calls go
//! to the LLM service when LLM_API_KEY is set and degrade to the built-in
//! defaults otherwise; unit-level thinking always uses the local rules.

use clap::Parser;
use warcouncil::coordinator::StrategicCoordinator;
use warcouncil::core::config::{CoordinatorConfig, UnitLoopConfig};
use warcouncil::core::error::{CouncilError, Result};
use warcouncil::core::types::{GridPos, MapBounds, PlayerId, UnitId, UnitRole};
use warcouncil::decision::llm::LlmDecisionSource;
use warcouncil::decision::rules::RuleBasedSource;
use warcouncil::decision::{DecisionError, DecisionSource, NullSource, StrategicResponse};
use warcouncil::directive::Directive;
use warcouncil::events::{EventBus, GameEvent};
use warcouncil::unit::UnitBrain;
use warcouncil::world::{EnemySighting, GridWorld, ResourceSighting, UnitSnapshot, WorldView};

#[derive(Parser, Debug)]
#[command(name = "warcouncil", about = "Scripted strategic-coordination demo")]
struct Args {
    /// Number of simulation ticks to run
    #[arg(long, default_value_t = 600)]
    ticks: u64,

    /// Tick at which the scripted player command is issued
    #[arg(long, default_value_t = 50)]
    command_tick: u64,
}

/// Either a live LLM client or the null stand-in, chosen at startup
enum DemoSource {
    Llm(LlmDecisionSource),
    Null(NullSource),
}

impl DecisionSource for DemoSource {
    async fn decide(&self, perception: &str) -> std::result::Result<StrategicResponse, DecisionError> {
        match self {
            Self::Llm(source) => source.decide(perception).await,
            Self::Null(source) => source.decide(perception).await,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warcouncil=info".into()),
        )
        .init();

    let args = Args::parse();
    let player = PlayerId(0);

    let config = CoordinatorConfig::default();
    config.validate().map_err(CouncilError::InvalidConfig)?;

    let source = match LlmDecisionSource::from_env() {
        Ok(client) => {
            tracing::info!("strategic decisions via LLM service");
            DemoSource::Llm(client)
        }
        Err(_) => {
            tracing::warn!("LLM_API_KEY not set, strategic layer runs on defaults only");
            DemoSource::Null(NullSource)
        }
    };

    let mut world = GridWorld::new(MapBounds::new(20, 20));
    world.set_stockpile(player, "minerals 50, gas 0");
    spawn_starting_units(&mut world, player);

    let mut bus = EventBus::new();
    let coordinator_rx = bus.subscribe();
    let mut coordinator = StrategicCoordinator::new(player, config, source, coordinator_rx);

    let unit_config = UnitLoopConfig::default();
    let tactical = RuleBasedSource::new();
    let mut brains: Vec<UnitBrain> = world
        .units()
        .iter()
        .filter(|u| u.owner == player)
        .map(|u| UnitBrain::new(u.id.clone(), u.role, &unit_config))
        .collect();

    println!("=== WARCOUNCIL DEMO ===");
    println!(
        "Running {} ticks; player command at tick {}.\n",
        args.ticks, args.command_tick
    );

    for tick in 0..args.ticks {
        if tick == args.command_tick {
            println!("[tick {tick}] PLAYER: \"U1 and U2, gather the minerals to the southeast\"");
            bus.publish(GameEvent::UnitCommand {
                player,
                transcript: "gather the minerals to the southeast".into(),
                targets: vec![UnitId::from("U1"), UnitId::from("U2")],
            });
        }
        if tick == args.command_tick + 150 {
            println!("[tick {tick}] SCOUTS REPORT: enemy raiders and a mineral field sighted");
            world.set_enemy_sightings(
                player,
                vec![
                    EnemySighting {
                        id: UnitId::from("E1"),
                        pos: GridPos::new(16, 14),
                        kind: "raider".into(),
                    },
                    EnemySighting {
                        id: UnitId::from("E2"),
                        pos: GridPos::new(17, 15),
                        kind: "raider".into(),
                    },
                ],
            );
            world.set_resource_sightings(
                player,
                vec![
                    ResourceSighting {
                        pos: GridPos::new(14, 16),
                        resource: "minerals".into(),
                    },
                    ResourceSighting {
                        pos: GridPos::new(15, 16),
                        resource: "minerals".into(),
                    },
                    ResourceSighting {
                        pos: GridPos::new(15, 17),
                        resource: "minerals".into(),
                    },
                ],
            );
        }

        coordinator.pump_events();
        coordinator.scan_for_discoveries(&world, tick);
        if coordinator.should_evaluate(tick) {
            coordinator.evaluate(&world, tick).await;
            print_directives(coordinator.directives().iter().map(|(_, d)| d), tick);
        }

        for brain in &mut brains {
            if brain.should_think(tick) {
                brain
                    .think(&world, coordinator.standing_orders(), tick, &tactical)
                    .await;
            }
            if let Some(action) = brain.take_pending() {
                println!(
                    "[tick {tick}] {} -> {:?} ({})",
                    brain.unit_id(),
                    action.kind,
                    action.reasoning
                );
            }
        }
    }

    println!("\n=== FINAL DIRECTIVES ===");
    print_directives(coordinator.directives().iter().map(|(_, d)| d), args.ticks);
    Ok(())
}

fn spawn_starting_units(world: &mut GridWorld, player: PlayerId) {
    let roster = [
        ("U1", UnitRole::Worker, GridPos::new(4, 4)),
        ("U2", UnitRole::Worker, GridPos::new(5, 4)),
        ("U3", UnitRole::Soldier, GridPos::new(6, 6)),
        ("U4", UnitRole::Scout, GridPos::new(8, 3)),
    ];
    for (id, role, pos) in roster {
        world.add_unit(UnitSnapshot {
            id: UnitId::from(id),
            owner: player,
            role,
            pos,
            health_frac: 1.0,
            alive: true,
            cargo: None,
        });
    }
    tracing::info!(count = roster.len(), "starting units spawned");
}

fn print_directives<'a>(directives: impl Iterator<Item = &'a Directive>, tick: u64) {
    let mut rows: Vec<&Directive> = directives.collect();
    rows.sort_by(|a, b| a.unit_id.0.cmp(&b.unit_id.0));
    for d in rows {
        println!(
            "[tick {tick}]   {} directive={} priority={}{}",
            d.unit_id,
            d.tag(),
            d.priority,
            if d.reasoning.is_empty() {
                String::new()
            } else {
                format!(" ({})", d.reasoning)
            }
        );
    }
}
