use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use glam::vec3;
use log::info;

use skywright::grid::GridDims;
use skywright::objects::{SideEffect, layout};
use skywright::scene_build::{SampleSpec, build_sample_airship, marker_model};

#[derive(Parser, Debug)]
#[command(name = "hull_probe")]
#[command(about = "Builds the sample airship, places a few objects and prints grid/mesh stats")]
struct Cli {
    /// Number of decks
    #[arg(long, default_value_t = 3)]
    decks: usize,

    /// Hull subdivision cell width in meters
    #[arg(long, default_value_t = 4.0)]
    section_width: f32,

    /// Write the resulting layout JSON to this path
    #[arg(long)]
    layout_out: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let spec = SampleSpec {
        decks: cli.decks,
        section_width_m: cli.section_width,
        ..SampleSpec::default()
    };
    let mut ship = build_sample_airship(&spec)?;
    info!(
        "sample airship: {} decks, grid {}x{}",
        ship.env.num_decks(),
        ship.env.space().cols(),
        ship.env.space().rows()
    );

    let marker = marker_model();
    ship.env
        .add_object(&marker, vec3(6.0, 0.0, 0.0), GridDims::new(2, 2), 0, SideEffect::None)?;
    if spec.decks > 1 {
        let receipt = ship.env.add_object(
            &marker,
            vec3(5.0, -spec.deck_height_m, -1.0),
            GridDims::new(1, 1),
            1,
            SideEffect::CutsIntoCeiling,
        )?;
        info!("ceiling cut applied: {:?}", receipt.effects);
    }

    // Open a porthole region on the starboard bow of the weather deck strip.
    let cut = ship.starboard.disable_region(
        vec3(4.0, -spec.deck_height_m, spec.half_beam_m),
        vec3(8.0, 0.0, spec.half_beam_m),
    );
    info!("porthole region: {cut} hull sections disabled");

    for deck in 0..ship.env.num_decks() {
        println!(
            "deck {deck}: occupied={} plates={}/{}",
            ship.env.occupied_count(deck),
            ship.env.plate_sink(deck).active_objects(),
            ship.env.plate_sink(deck).len(),
        );
    }
    for (name, mesh) in [("port", &ship.port), ("starboard", &ship.starboard)] {
        println!(
            "{name}: {} tris ({} active), {} layers",
            mesh.buffer().len(),
            mesh.buffer().active_objects(),
            mesh.layer_count(),
        );
    }

    if let Some(path) = cli.layout_out {
        let json = layout::layout_to_json(&layout::export_layout(&ship.env))?;
        std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
        println!("layout written to {}", path.display());
    }
    Ok(())
}
