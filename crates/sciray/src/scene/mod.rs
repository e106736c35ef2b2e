//! Everything that is rendered: materials, primitives grouped by material, lights,
//! textures and the optional simulation data.
//!
//! The renderable state lives behind an [Arc] so a renderer can hold a read-only
//! [SceneSnapshot] while the host keeps editing the scene. Edits clone the state
//! only when a snapshot is still alive.

pub mod demos;
pub mod light;
pub mod simulation;
pub mod transfer_function;

use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use glam::{UVec3, Vec3};

use crate::{
    color::linear,
    geometry::{primitives_bounds, Cylinder, Primitive, PrimitivesMap, TrianglesMesh},
    material::{
        palette::{build_palette, MaterialType},
        texture::Texture,
        Material, MaterialId, MaterialRegistry, Result, SystemMaterial, MATERIAL_SYSTEM,
        TEXTURE_NAME_SIMULATION, TEXTURE_NAME_SKYBOX,
    },
    math::bounds::Bounds,
};

use self::{
    light::Light,
    simulation::{Histogram, SimulationHandler},
    transfer_function::TransferFunction,
};

/// Geometry added around the content of the scene
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SceneEnvironment {
    #[default]
    None,
    Ground,
    Wall,
    BoundingBox,
}

#[derive(Debug, Clone, Default)]
pub struct SceneState {
    pub materials: MaterialRegistry,
    pub primitives: PrimitivesMap,
    pub lights: Vec<Light>,
    pub textures: BTreeMap<String, Arc<dyn Texture>>,
    pub transfer_function: Option<TransferFunction>,
    /// Values of the current simulation frame, in primitive commit order
    pub simulation_values: Option<Arc<[f32]>>,
    pub bounds: Bounds,
    /// Bumped on every edit
    pub generation: u64,
}

pub type SceneSnapshot = Arc<SceneState>;

/// Live view on the generation of a [Scene], following its edits
#[derive(Debug, Clone, Default)]
pub struct SceneGeneration(Arc<AtomicU64>);

impl SceneGeneration {
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }

    /// Whether the scene was edited since `snapshot` was taken
    pub fn is_ahead_of(&self, snapshot: &SceneState) -> bool {
        self.get() != snapshot.generation
    }
}

#[derive(Default)]
pub struct Scene {
    state: Arc<SceneState>,
    live_generation: SceneGeneration,
    simulation: Option<Box<dyn SimulationHandler>>,
    timestamp: f32,
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("state", &self.state)
            .field("simulation", &self.simulation.is_some())
            .field("timestamp", &self.timestamp)
            .finish()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    fn state_mut(&mut self) -> &mut SceneState {
        let state = Arc::make_mut(&mut self.state);
        state.generation += 1;
        self.live_generation.0.store(state.generation, Ordering::Release);
        state
    }

    /// Shared handle on the current state, unaffected by later edits
    pub fn snapshot(&self) -> SceneSnapshot {
        self.state.clone()
    }

    pub fn state(&self) -> &SceneState {
        &self.state
    }

    pub fn generation(&self) -> u64 {
        self.state.generation
    }

    /// Handle on the generation that keeps following later edits
    pub fn live_generation(&self) -> SceneGeneration {
        self.live_generation.clone()
    }

    pub fn bounds(&self) -> Bounds {
        self.state.bounds
    }

    // Primitives

    pub fn primitives(&self) -> &PrimitivesMap {
        &self.state.primitives
    }

    pub fn primitive_count(&self) -> usize {
        self.state.primitives.values().map(Vec::len).sum()
    }

    pub fn add_primitive(&mut self, material: MaterialId, primitive: impl Into<Primitive>) {
        let primitive = primitive.into();
        let state = self.state_mut();
        primitive.extend_bounds(&mut state.bounds);
        state.primitives.entry(material).or_default().push(primitive);
    }

    /// Appends each bucket of `primitives` to the bucket of the same material
    pub fn add_primitives(&mut self, primitives: PrimitivesMap) {
        if primitives.values().all(Vec::is_empty) {
            return;
        }
        let state = self.state_mut();
        for (material, bucket) in primitives {
            if bucket.is_empty() {
                continue;
            }
            for primitive in &bucket {
                primitive.extend_bounds(&mut state.bounds);
            }
            state.primitives.entry(material).or_default().extend(bucket);
        }
    }

    /// Removes every primitive of `material`
    pub fn remove_primitives(&mut self, material: MaterialId) -> Option<Vec<Primitive>> {
        if !self.state.primitives.contains_key(&material) {
            return None;
        }
        let state = self.state_mut();
        let removed = state.primitives.shift_remove(&material);
        state.bounds = primitives_bounds(&state.primitives);
        removed
    }

    /// Removes one primitive, the bucket is dropped once empty
    pub fn remove_primitive(&mut self, material: MaterialId, index: usize) -> Option<Primitive> {
        let in_range = self
            .state
            .primitives
            .get(&material)
            .is_some_and(|bucket| index < bucket.len());
        if !in_range {
            return None;
        }
        let state = self.state_mut();
        let bucket = state.primitives.get_mut(&material)?;
        let removed = bucket.remove(index);
        if bucket.is_empty() {
            state.primitives.shift_remove(&material);
        }
        state.bounds = primitives_bounds(&state.primitives);
        Some(removed)
    }

    pub fn clear_primitives(&mut self) {
        let state = self.state_mut();
        state.primitives.clear();
        state.bounds = Bounds::EMPTY;
    }

    // Materials

    pub fn materials(&self) -> &MaterialRegistry {
        &self.state.materials
    }

    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.state.materials.get(id)
    }

    pub fn set_material(&mut self, id: MaterialId, material: Material) -> Result<()> {
        // Validated before touching the state so a rejected id is not an edit
        MaterialId::try_user(id.index())?;
        self.state_mut().materials.set(id, material)
    }

    pub fn set_system_material(&mut self, role: SystemMaterial, material: Material) {
        self.state_mut().materials.set_system(role, material);
    }

    /// Replaces every material by a generated palette of `count` user materials and
    /// the default system materials
    pub fn build_materials(&mut self, kind: MaterialType, count: usize, seed: u64) {
        let count = count.min(MATERIAL_SYSTEM);
        let palette = build_palette(kind, count, seed);
        let state = self.state_mut();
        state.materials.clear();
        for (index, material) in palette.into_iter().enumerate() {
            if let Err(e) = state.materials.set(MaterialId::user(index as u64, count), material) {
                log::warn!("palette material {index} rejected: {e}");
            }
        }
        for role in SystemMaterial::ALL {
            state.materials.set_system(role, default_system_material(role));
        }
        log::debug!("built {count} {kind:?} materials");
    }

    // Lights and textures

    pub fn lights(&self) -> &[Light] {
        &self.state.lights
    }

    pub fn add_light(&mut self, light: Light) {
        self.state_mut().lights.push(light);
    }

    pub fn clear_lights(&mut self) {
        if !self.state.lights.is_empty() {
            self.state_mut().lights.clear();
        }
    }

    pub fn add_texture(&mut self, name: impl Into<String>, texture: Arc<dyn Texture>) {
        self.state_mut().textures.insert(name.into(), texture);
    }

    pub fn texture(&self, name: &str) -> Option<&Arc<dyn Texture>> {
        self.state.textures.get(name)
    }

    // Simulation

    pub fn transfer_function(&self) -> Option<&TransferFunction> {
        self.state.transfer_function.as_ref()
    }

    pub fn set_transfer_function(&mut self, transfer_function: Option<TransferFunction>) {
        self.state_mut().transfer_function = transfer_function;
    }

    pub fn set_simulation_handler(&mut self, handler: Box<dyn SimulationHandler>) {
        let primitives = self.primitive_count();
        if handler.frame_size() != primitives {
            log::warn!(
                "simulation frames hold {} values for {primitives} primitives",
                handler.frame_size()
            );
        }
        self.simulation = Some(handler);
        self.set_timestamp(self.timestamp);
    }

    pub fn simulation_handler(&self) -> Option<&dyn SimulationHandler> {
        self.simulation.as_deref()
    }

    pub fn timestamp(&self) -> f32 {
        self.timestamp
    }

    /// Loads the simulation frame matching `timestamp`. Returns whether data was
    /// found, the previous values are dropped otherwise.
    pub fn set_timestamp(&mut self, timestamp: f32) -> bool {
        self.timestamp = timestamp;
        let values: Option<Arc<[f32]>> = self
            .simulation
            .as_deref()
            .and_then(|sim| sim.frame_at(timestamp))
            .map(Arc::from);
        let found = values.is_some();
        if found || self.state.simulation_values.is_some() {
            self.state_mut().simulation_values = values;
        }
        found
    }

    pub fn simulation_values(&self) -> Option<&[f32]> {
        self.state.simulation_values.as_deref()
    }

    pub fn histogram(&self, bins: usize) -> Option<Histogram> {
        self.simulation_values()
            .map(|values| Histogram::compute(values, bins, self.timestamp))
    }

    // Environment

    /// Adds geometry around the current content using the bounding box system
    /// material. Does nothing on an empty scene.
    pub fn build_environment(&mut self, environment: SceneEnvironment) {
        let bounds = self.bounds();
        if bounds.is_empty() || environment == SceneEnvironment::None {
            return;
        }
        let size = bounds.size().max_element().max(f32::EPSILON);
        let material = SystemMaterial::BoundingBox.id();
        match environment {
            SceneEnvironment::None => {}
            SceneEnvironment::Ground => {
                let y = bounds.min.y - 0.01 * size;
                let center = bounds.center();
                let half = size;
                self.add_primitive(
                    material,
                    quad([
                        Vec3::new(center.x - half, y, center.z - half),
                        Vec3::new(center.x + half, y, center.z - half),
                        Vec3::new(center.x + half, y, center.z + half),
                        Vec3::new(center.x - half, y, center.z + half),
                    ]),
                );
            }
            SceneEnvironment::Wall => {
                let z = bounds.min.z - 0.01 * size;
                let center = bounds.center();
                let half = size;
                self.add_primitive(
                    material,
                    quad([
                        Vec3::new(center.x - half, center.y - half, z),
                        Vec3::new(center.x - half, center.y + half, z),
                        Vec3::new(center.x + half, center.y + half, z),
                        Vec3::new(center.x + half, center.y - half, z),
                    ]),
                );
            }
            SceneEnvironment::BoundingBox => {
                let radius = 0.005 * size;
                let (lo, hi) = (bounds.min, bounds.max);
                let corner = |i: u32| {
                    Vec3::new(
                        if i & 1 == 0 { lo.x } else { hi.x },
                        if i & 2 == 0 { lo.y } else { hi.y },
                        if i & 4 == 0 { lo.z } else { hi.z },
                    )
                };
                let mut edges = PrimitivesMap::new();
                let bucket = edges.entry(material).or_default();
                for a in 0..8u32 {
                    for axis in [1, 2, 4] {
                        if a & axis == 0 {
                            bucket.push(Cylinder::new(corner(a), corner(a | axis), radius).into());
                        }
                    }
                }
                self.add_primitives(edges);
            }
        }
        log::debug!("built {environment:?} environment");
    }
}

fn quad(corners: [Vec3; 4]) -> TrianglesMesh {
    TrianglesMesh {
        vertices: corners.to_vec(),
        normals: Vec::new(),
        indices: vec![UVec3::new(0, 1, 2), UVec3::new(0, 2, 3)],
    }
}

fn default_system_material(role: SystemMaterial) -> Material {
    match role {
        SystemMaterial::Skybox => Material::diffuse(linear::WHITE).with_texture(TEXTURE_NAME_SKYBOX),
        SystemMaterial::BoundingBox => Material::diffuse(linear::WHITE).with_emission(1.0),
        SystemMaterial::Simulation | SystemMaterial::DetailedSimulation => {
            Material::diffuse(linear::WHITE).with_texture(TEXTURE_NAME_SIMULATION)
        }
        SystemMaterial::Invisible => Material::diffuse(linear::WHITE).with_opacity(0.0),
    }
}
