mod simulation;

use anyhow::Result;
use clap::Parser;

use simulation::{SimConfig, SimWorld};

#[derive(Parser)]
#[command(name = "transit_sim")]
#[command(about = "Urban transit simulation on a city grid")]
struct Cli {
    /// Number of simulation ticks to run
    #[arg(long, default_value = "200")]
    ticks: u64,

    /// Seed for a reproducible run; omit for a random one
    #[arg(long)]
    seed: Option<u64>,

    /// Chance per tick of spawning a random passenger
    #[arg(long, default_value = "0.1")]
    spawn_rate: f64,

    /// Ticks between progress reports; 0 reports only at the end
    #[arg(long, default_value = "25")]
    report_every: u64,

    /// Draw the city map with each report
    #[arg(long)]
    map: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = SimConfig::demo();
    config.spawn_probability = cli.spawn_rate;

    let mut world = match cli.seed {
        Some(seed) => SimWorld::new_with_seed(config, seed)?,
        None => SimWorld::new(config)?,
    };

    println!("Running transit simulation for {} ticks...", cli.ticks);
    if let Some(seed) = cli.seed {
        println!("Seed: {}", seed);
    }
    println!();

    for _ in 0..cli.ticks {
        world.spawn_random_passenger();
        world.step();

        if cli.report_every > 0 && world.tick() % cli.report_every == 0 {
            println!("--- After tick {} ---", world.tick());
            world.print_summary();
            if cli.map {
                world.draw_map();
            }
            println!();
        }
    }

    println!("=== Final State ===");
    world.print_summary();
    if cli.map {
        world.draw_map();
    }

    let travel_times: Vec<u64> = world
        .passengers
        .iter()
        .filter_map(|passenger| passenger.travel_time())
        .collect();
    if !travel_times.is_empty() {
        println!();
        println!("--- Travel Times ---");
        for passenger in &world.passengers {
            if let Some(travel_time) = passenger.travel_time() {
                println!("  Passenger {} took {} ticks", passenger.id.0, travel_time);
            }
        }
        let total: u64 = travel_times.iter().sum();
        println!(
            "  Average: {:.1} ticks over {} journeys",
            total as f64 / travel_times.len() as f64,
            travel_times.len()
        );
    }

    Ok(())
}
