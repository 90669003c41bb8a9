/// Example: Load an OFF file and print what the viewer would work with
///
/// Usage: cargo run --example mesh_stats -- path/to/file.off [uniform|area|angle]
use std::env;
use std::process::ExitCode;

use offscope_core::{Mesh, WeightMode};

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let mut mesh = match args.get(1) {
        Some(path) => match Mesh::from_off_file(path) {
            Ok(mesh) => mesh,
            Err(err) => {
                eprintln!("{}", err);
                return ExitCode::FAILURE;
            }
        },
        None => {
            eprintln!("Usage: {} <off-file> [uniform|area|angle]", args[0]);
            eprintln!("\nNo OFF file provided, using default cube...");
            Mesh::cube(2.0)
        }
    };

    if let Some(mode) = args.get(2) {
        match mode.parse::<WeightMode>() {
            Ok(mode) => mesh.recompute_normals(mode),
            Err(err) => {
                eprintln!("{}", err);
                return ExitCode::FAILURE;
            }
        }
    }

    let bounds = mesh.bounding_box();
    println!("vertices:  {}", mesh.vertex_count());
    println!("triangles: {}", mesh.triangle_count());
    println!("bounds:    {:?} .. {:?}", bounds.min(), bounds.max());
    println!("center:    {:?}", bounds.center());

    let zero_normals = mesh.normals().iter().filter(|n| n.norm() < 1e-6).count();
    println!("normals:   {} weighting, {} without a direction", mesh.weight_mode(), zero_normals);

    let rings = mesh.one_ring();
    let degrees = rings.iter().map(|ring| ring.len());
    let min = degrees.clone().min().unwrap_or(0);
    let max = degrees.clone().max().unwrap_or(0);
    let total: usize = degrees.sum();
    let mean = if rings.is_empty() { 0.0 } else { total as f32 / rings.len() as f32 };
    println!("one-ring:  min {} / max {} / mean {:.2} neighbours", min, max, mean);

    ExitCode::SUCCESS
}
