//! `registry-cli`: a handful of operator subcommands for local inspection,
//! mirroring `shipcat list-*` — see `SPEC_FULL.md` §6. Each invocation seeds
//! a fresh demo team (there is no persistence layer in this crate) and runs
//! one read-only projection against it.

mod seed;

use clap::{Parser, Subcommand};
use registry_core::{graph, ports, topology, Store};

#[derive(Parser)]
#[command(name = "registry-cli", about = "Inspect a seeded CodeOps registry store")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Seed the default twelve port ranges for the demo team and print them.
    SeedRanges {
        #[arg(long, default_value = "local")]
        environment: String,
    },
    /// Print the Kahn startup order for the demo team.
    StartupOrder,
    /// Print the service ids stuck in a dependency cycle, if any.
    DetectCycles,
    /// Print the full team topology (nodes, edges, layers).
    Topology,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_default_env().filter_level(log::LevelFilter::Info).init();
    let cli = Cli::parse();
    let store = Store::new();
    let team = seed::seed(&store).await;

    match cli.command {
        Command::SeedRanges { environment } => {
            let ranges = ports::seed_default_ranges(&store, team, &environment).await.expect("seed ranges");
            println!("{}", serde_json::to_string_pretty(&ranges).unwrap());
        }
        Command::StartupOrder => {
            let order = graph::startup_order(&store, team).await;
            println!("{}", serde_json::to_string_pretty(&order).unwrap());
        }
        Command::DetectCycles => {
            let cycles = graph::detect_cycles(&store, team).await;
            println!("{}", serde_json::to_string_pretty(&cycles).unwrap());
        }
        Command::Topology => {
            let topo = topology::team_topology(&store, team).await;
            println!("{}", serde_json::to_string_pretty(&topo).unwrap());
        }
    }
}
