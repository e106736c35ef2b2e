pub mod aggregate;
pub mod camera;
pub mod color;
pub mod engine;
pub mod framebuffer;
pub mod geometry;
pub mod integrators;
pub mod loader;
pub mod material;
pub mod math;
pub mod parameters;
pub mod ray;
pub mod render_io;
pub mod renderer;
pub mod scene;
pub mod shape;
pub mod utils;

pub use rand_xoshiro::Xoshiro256StarStar as Rng;

/// Per-sample state handed to integrators
pub struct Ctx<'a> {
    pub rng: Rng,
    pub world: &'a renderer::World,
    pub seed: Seed,
}

/// Identifies one sample of one pixel. Given a seed, rendering is deterministic:
/// the output only depends on x, y, the sample index and the seed.
#[derive(Debug, Copy, Clone, Hash)]
#[repr(C)]
pub struct Seed {
    pub seed: u64,
    pub x: u32,
    pub y: u32,
    pub sample_idx: u32,
}

impl Seed {
    pub fn into_rng(self, local_seed: u32) -> Rng {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        std::hash::Hash::hash(&self, &mut hasher);
        std::hash::Hash::hash(&local_seed, &mut hasher);
        <Rng as rand::SeedableRng>::seed_from_u64(std::hash::Hasher::finish(&hasher))
    }
}
