mod output;
mod progress;
mod utils;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use output::{FileOutput, FinalOutput};
use progress::PercentBar;
use sciray::{
    color::Rgb,
    engine::Engine,
    loader::loaders_from_parameters,
    parameters::{GeometryParameters, RenderingParameters},
    render_io::RenderOutput,
    utils::{counter, timer::timed_scope_log},
};
use utils::{
    parse_color, AvailableCamera, AvailableColorScheme, AvailableEnvironment, AvailableFormat,
    AvailableMaterials, AvailableQuality, AvailableRenderer, AvailableScene, AvailableShading,
    AvailableStereo, Dimensions,
};

#[derive(Parser, Debug)]
pub struct Args {
    #[arg(short, long, default_value = "800x600")]
    /// Screen dimension in format `width`x`height`
    dimensions: Dimensions,

    #[arg(short, long, value_enum, default_value_t)]
    renderer: AvailableRenderer,

    #[arg(long, value_enum, default_value_t)]
    shading: AvailableShading,

    #[arg(long = "spp", default_value_t = 1)]
    /// Samples per pixel and per frame
    samples_per_pixel: u32,

    #[arg(short, long, default_value_t = 16)]
    /// Number of frames accumulated into the output
    frames: u32,

    #[arg(long, default_value_t = 0.0)]
    ambient_occlusion: f32,

    #[arg(long, default_value_t = 0.0)]
    shadows: f32,

    #[arg(long, default_value_t = 0.0)]
    soft_shadows: f32,

    #[arg(long, default_value_t = 1.0)]
    /// Reach of the probe rays of the proximity renderer
    detection_distance: f32,

    #[arg(long, value_parser = parse_color, default_value = "000000")]
    /// Background color as `RRGGBB`
    background: Rgb,

    #[arg(long, value_enum, default_value_t)]
    format: AvailableFormat,

    #[arg(long, value_enum, default_value_t)]
    camera: AvailableCamera,

    #[arg(long, value_enum, default_value_t)]
    stereo: AvailableStereo,

    #[arg(long, default_value_t)]
    /// Seed to use for all the random stuff.
    /// Given a seed, the rendering is deterministic (the output only depends on x, y, sample and seed).
    seed: u64,

    #[arg(long)]
    pdb_file: Option<PathBuf>,

    #[arg(long, requires_all = ["pdb_cells", "pdb_positions"])]
    /// Folder holding the PDB files named in `--pdb-cells`
    pdb_folder: Option<PathBuf>,

    #[arg(long, requires = "pdb_folder")]
    pdb_cells: Option<PathBuf>,

    #[arg(long, requires = "pdb_folder")]
    pdb_positions: Option<PathBuf>,

    #[arg(long)]
    /// One sphere per protein instead of one per atom
    pdb_positions_only: bool,

    #[arg(long)]
    obj_file: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t)]
    color_scheme: AvailableColorScheme,

    #[arg(long, value_enum, default_value_t)]
    materials: AvailableMaterials,

    #[arg(long, default_value_t = 118)]
    material_count: usize,

    #[arg(long, default_value_t = 1.0)]
    radius_multiplier: f32,

    #[arg(long, value_enum, default_value_t)]
    geometry_quality: AvailableQuality,

    #[arg(long, value_enum, default_value_t)]
    environment: AvailableEnvironment,

    #[arg(long, value_enum, default_value_t)]
    /// Scene rendered when nothing is imported
    scene: AvailableScene,

    #[arg(short, long, default_value = "output/render.png")]
    output: PathBuf,

    #[arg(long)]
    /// Also write the depth buffer to this OpenEXR file
    depth_output: Option<PathBuf>,
}

impl Args {
    fn rendering_parameters(&self) -> RenderingParameters {
        let mut params = RenderingParameters::default()
            .renderer(self.renderer.into())
            .shading(self.shading.into())
            .samples_per_pixel(self.samples_per_pixel)
            .ambient_occlusion(self.ambient_occlusion)
            .shadows(self.shadows)
            .soft_shadows(self.soft_shadows)
            .detection_distance(self.detection_distance)
            .background_color(self.background)
            .frame_buffer_format(self.format.into())
            .camera_type(self.camera.into())
            .stereo_mode(self.stereo.into())
            .max_accumulation_frames(Some(self.frames.max(1)))
            .seed(self.seed);
        params.accumulation = true;
        params
    }

    fn geometry_parameters(&self) -> GeometryParameters {
        GeometryParameters {
            pdb_file: self.pdb_file.clone(),
            pdb_folder: self.pdb_folder.clone(),
            pdb_cells: self.pdb_cells.clone(),
            pdb_positions: self.pdb_positions.clone(),
            pdb_positions_only: self.pdb_positions_only,
            obj_file: self.obj_file.clone(),
            ..Default::default()
        }
        .color_scheme(self.color_scheme.into())
        .material_type(self.materials.into())
        .material_count(self.material_count)
        .radius_multiplier(self.radius_multiplier)
        .geometry_quality(self.geometry_quality.into())
        .scene_environment(self.environment.into())
    }
}

fn load_scene(engine: &mut Engine, args: &Args) -> Result<()> {
    let loaders = loaders_from_parameters(engine.geometry_parameters());
    if loaders.is_empty() {
        log::info!("nothing to import, using the {:?} scene", args.scene);
        let scene: sciray::scene::demos::DemoScene = args.scene.into();
        scene.insert_into(engine.scene_mut(), args.seed);
        let bounds = engine.scene().bounds();
        engine.camera_mut().set_initial_state(&bounds);
    }
    for loader in loaders {
        engine
            .import(loader.as_ref())
            .with_context(|| format!("importing {}", loader.name()))?;
    }
    engine.build_environment();
    log::info!("{} primitives in the scene", engine.scene().primitive_count());
    Ok(())
}

fn render(engine: &mut Engine, frames: u32) -> Result<RenderOutput> {
    let frames = frames.max(1);
    for frame in 0..frames {
        if !engine.render()? {
            break;
        }
        print!(
            "\r{}",
            PercentBar {
                percent: (frame + 1) as f32 / frames as f32,
                width: 50
            }
        );
    }
    println!();

    let frame = engine.map()?;
    Ok(RenderOutput {
        color_buffer: frame.color().to_vec(),
        depth_buffer: frame.depth().to_vec(),
        color_buffer_format: frame.format(),
    })
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let size: glam::UVec2 = args.dimensions.into();
    let mut engine = Engine::new(args.rendering_parameters(), args.geometry_parameters(), size)
        .context("creating the engine")?;

    timed_scope_log("load scene", || load_scene(&mut engine, &args)).res?;

    let output = timed_scope_log("render", || render(&mut engine, args.frames)).res?;
    FileOutput::new(&args.output, args.depth_output.clone()).commit(&output, size)?;

    log::info!("Done");
    counter::report_counters();
    Ok(())
}
