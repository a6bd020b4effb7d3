//! Basic demonstration of the Ironvein simulation.
//!
//! Run with: cargo run --example basic_demo

use ironvein_sim::{Difficulty, SimWorld};

fn main() {
    println!("=== Ironvein - Simulation Demo ===\n");

    // Two-player skirmish; player 1 is a hard AI, player 0 idles.
    let mut sim = SimWorld::new_skirmish(42, Difficulty::Hard);

    println!("Initial state:");
    print_summary(&mut sim);

    println!("\nRunning 2000 ticks...\n");
    for tick in 0..2000u32 {
        sim.tick();

        if (tick + 1) % 250 == 0 {
            println!("--- Tick {} ---", sim.current_tick());
            print_summary(&mut sim);
        }
        let snapshot = sim.snapshot();
        if let Some(winner) = snapshot.winner {
            println!("\nMatch over at tick {}: {:?}", sim.current_tick(), winner);
            break;
        }
    }

    println!("\n=== Final State (JSON, truncated) ===\n");
    let json = sim.snapshot().to_json_pretty().unwrap_or_default();
    for line in json.lines().take(40) {
        println!("{line}");
    }
}

fn print_summary(sim: &mut SimWorld) {
    let snapshot = sim.snapshot();
    for player in &snapshot.players {
        let units = snapshot
            .entities
            .iter()
            .filter(|e| e.owner == player.id && e.kind == "unit")
            .count();
        let buildings = snapshot
            .entities
            .iter()
            .filter(|e| e.owner == player.id && e.kind == "building")
            .count();
        println!(
            "  Player {}: credits={:.0} power={}/{} units={} buildings={}",
            player.id,
            player.credits,
            player.power_drain,
            player.power_generated,
            units,
            buildings
        );
    }
    let ore = snapshot.entities.iter().filter(|e| e.kind == "resource").count();
    println!(
        "  Neutral: {} ore deposits, {} projectiles in flight",
        ore,
        snapshot.projectiles.len()
    );
    if let Some(note) = &snapshot.notification {
        println!("  Notice: {}", note.text);
    }
}
