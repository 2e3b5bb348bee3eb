use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use piecework::prelude::*;

/// Import models and print their piece trees.
#[derive(Parser, Debug)]
#[command(name = "modelinfo", version)]
struct Args {
    /// Model files (.obj, .gltf, .glb)
    #[arg(required = true)]
    models: Vec<PathBuf>,

    /// TOML file with import options
    #[arg(long)]
    options: Option<PathBuf>,

    /// Also load the model textures from this directory
    #[arg(long)]
    textures: Option<PathBuf>,

    /// Draw one instance with the software backend at this LOD level
    #[arg(long)]
    lod: Option<usize>,
}

fn print_tree(model: &Model, id: PieceId, depth: usize) {
    let piece = &model.pieces()[id];
    println!(
        "{:indent$}{} [{} vertices] offset {:?}",
        "",
        piece.name(),
        piece.vertex_count(),
        piece.offset().to_array(),
        indent = depth * 2
    );
    for &child in piece.children() {
        print_tree(model, child, depth + 1);
    }
}

fn describe(model: &Model) {
    println!("{} ({})", model.name(), model.format());
    println!("  pieces: {}", model.piece_count());
    println!("  mins: {:?}", model.mins().to_array());
    println!("  maxs: {:?}", model.maxs().to_array());
    println!("  radius: {}  height: {}", model.radius(), model.height());
    println!("  midpos: {:?}", model.relative_mid_pos().to_array());
    println!("  tex1: '{}'  tex2: '{}'", model.textures().tex1, model.textures().tex2);
    print_tree(model, model.root_id(), 1);

    for piece in model.detached_pieces() {
        println!("  detached: {} (parent '{}')", piece.name(), piece.parent_name());
    }
    for warning in model.report().warnings() {
        println!("  warning: {warning}");
    }
}

/// Build LOD lists for every piece of one instance and draw it.
fn draw_instance(mut model: Model, lod: usize) -> usize {
    let mut backend = SoftwareBackend::new();
    model.compile(&mut backend);
    let model = Arc::new(model);

    let mut local = LocalModel::new(Arc::clone(&model));
    local.set_lod_count(lod);
    for id in 0..local.piece_count() {
        for level in 1..=lod {
            if let Some(list) = backend.compile_lod(local.original(id), level as u32) {
                // Slots 1..=lod exist after set_lod_count(lod).
                let _ = local.set_lod_list(id, level, list);
            }
        }
    }

    local.draw_lod(&mut backend, &Mat4::identity(), lod);
    backend.take_frame().len()
}

fn main() -> Result<(), String> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let options = match &args.options {
        Some(path) => {
            let source = fs::read_to_string(path).map_err(|e| e.to_string())?;
            ImportOptions::from_toml_str(&source).map_err(|e| e.to_string())?
        }
        None => ImportOptions::default(),
    };
    let loader = ModelLoader::new(options);

    for path in &args.models {
        let model = loader.load(path).map_err(|e| e.to_string())?;
        describe(&model);

        if let Some(dir) = &args.textures {
            let textures = ModelTextures::load(model.textures(), dir).map_err(|e| e.to_string())?;
            println!(
                "  textures: {}x{}{}",
                textures.tex1.width(),
                textures.tex1.height(),
                if textures.tex2.is_some() { " + tex2" } else { "" }
            );
        }

        if let Some(lod) = args.lod {
            println!("  lod {lod}: {} triangles", draw_instance(model, lod));
        }
    }

    Ok(())
}
