//! Materials and the material id space.
//!
//! The id space holds [NB_MAX_MATERIALS] ids. The top [NB_SYSTEM_MATERIALS] of them,
//! starting at [MATERIAL_SYSTEM], are bound to [SystemMaterial] roles. Everything
//! below is available to user content: importers derive their ids with
//! [MaterialId::user] so they can never land in the reserved block.

pub mod color_scheme;
pub mod palette;
pub mod texture;

use std::collections::BTreeMap;

use crate::color::Rgb;

pub const NB_MAX_MATERIALS: usize = 200;
pub const NB_SYSTEM_MATERIALS: usize = 5;
/// First reserved id
pub const MATERIAL_SYSTEM: usize = NB_MAX_MATERIALS - NB_SYSTEM_MATERIALS;
/// No material assigned
pub const NO_MATERIAL: usize = usize::MAX;

const _: () = assert!(NB_SYSTEM_MATERIALS < NB_MAX_MATERIALS);
const _: () = assert!(SystemMaterial::ALL.len() == NB_SYSTEM_MATERIALS);

pub const TEXTURE_NAME_SKYBOX: &str = "SKYBOX";
pub const TEXTURE_NAME_SIMULATION: &str = "SIMULATION";

pub type Result<T, E = MaterialError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MaterialError {
    #[error("material id {0} is reserved for system materials")]
    Reserved(usize),
    #[error("material id {0} is out of the material id space")]
    OutOfRange(usize),
}

/// Overlay roles bound to the reserved ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SystemMaterial {
    Skybox,
    BoundingBox,
    Simulation,
    Invisible,
    DetailedSimulation,
}

impl SystemMaterial {
    pub const ALL: [SystemMaterial; 5] = [
        SystemMaterial::Skybox,
        SystemMaterial::BoundingBox,
        SystemMaterial::Simulation,
        SystemMaterial::Invisible,
        SystemMaterial::DetailedSimulation,
    ];

    pub const fn id(self) -> MaterialId {
        MaterialId(MATERIAL_SYSTEM + self as usize)
    }

    pub fn from_id(id: MaterialId) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.id() == id)
    }
}

/// A material id. User ids are `< MATERIAL_SYSTEM`, reserved ids are only reachable
/// through [SystemMaterial].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(usize);

impl MaterialId {
    pub const NONE: MaterialId = MaterialId(NO_MATERIAL);

    /// Maps any raw attribute to a user id: `raw % user_count`.
    ///
    /// `user_count` is clamped into `[1, MATERIAL_SYSTEM]`.
    pub fn user(raw: u64, user_count: usize) -> Self {
        let count = user_count.clamp(1, MATERIAL_SYSTEM) as u64;
        MaterialId((raw % count) as usize)
    }

    /// Checked construction of a user id
    pub fn try_user(id: usize) -> Result<Self> {
        if id >= NB_MAX_MATERIALS {
            Err(MaterialError::OutOfRange(id))
        } else if id >= MATERIAL_SYSTEM {
            Err(MaterialError::Reserved(id))
        } else {
            Ok(MaterialId(id))
        }
    }

    pub const fn index(self) -> usize {
        self.0
    }

    pub fn is_system(self) -> bool {
        (MATERIAL_SYSTEM..NB_MAX_MATERIALS).contains(&self.0)
    }

    pub fn is_none(self) -> bool {
        self.0 == NO_MATERIAL
    }
}

impl From<SystemMaterial> for MaterialId {
    fn from(role: SystemMaterial) -> Self {
        role.id()
    }
}

impl std::fmt::Display for MaterialId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match SystemMaterial::from_id(*self) {
            Some(role) => write!(f, "{}({role:?})", self.0),
            None if self.is_none() => write!(f, "none"),
            None => write!(f, "{}", self.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub diffuse: Rgb,
    pub specular: Rgb,
    pub specular_exponent: f32,
    /// 1 is opaque
    pub opacity: f32,
    /// 0 is no reflection, 1 is a perfect mirror
    pub reflection_index: f32,
    pub refraction_index: f32,
    pub emission: f32,
    pub glossiness: f32,
    /// Name of a texture registered in the scene
    pub texture: Option<String>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            diffuse: Rgb::from_array([1.0, 1.0, 1.0]),
            specular: Rgb::from_array([1.0, 1.0, 1.0]),
            specular_exponent: 10.0,
            opacity: 1.0,
            reflection_index: 0.0,
            refraction_index: 1.0,
            emission: 0.0,
            glossiness: 1.0,
            texture: None,
        }
    }
}

impl Material {
    pub fn diffuse(diffuse: Rgb) -> Self {
        Self {
            diffuse,
            ..Default::default()
        }
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_emission(mut self, emission: f32) -> Self {
        self.emission = emission;
        self
    }

    pub fn with_reflection(mut self, reflection_index: f32) -> Self {
        self.reflection_index = reflection_index;
        self
    }

    pub fn with_refraction(mut self, refraction_index: f32) -> Self {
        self.refraction_index = refraction_index;
        self
    }

    pub fn with_texture(mut self, name: impl Into<String>) -> Self {
        self.texture = Some(name.into());
        self
    }
}

/// Materials of one scene, keyed by id
#[derive(Debug, Clone, Default)]
pub struct MaterialRegistry {
    materials: BTreeMap<MaterialId, Material>,
}

impl MaterialRegistry {
    pub fn get(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(&id)
    }

    /// Sets a user material. Reserved ids are rejected.
    pub fn set(&mut self, id: MaterialId, material: Material) -> Result<()> {
        let id = MaterialId::try_user(id.index())?;
        self.materials.insert(id, material);
        Ok(())
    }

    pub fn set_system(&mut self, role: SystemMaterial, material: Material) {
        self.materials.insert(role.id(), material);
    }

    pub fn system(&self, role: SystemMaterial) -> Option<&Material> {
        self.materials.get(&role.id())
    }

    pub fn iter(&self) -> impl Iterator<Item = (MaterialId, &Material)> {
        self.materials.iter().map(|(id, m)| (*id, m))
    }

    /// Number of user materials currently defined
    pub fn user_count(&self) -> usize {
        self.materials.keys().filter(|id| !id.is_system()).count()
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    pub fn clear(&mut self) {
        self.materials.clear();
    }

    /// Dense table indexed by id, undefined ids get the default material
    pub fn to_table(&self) -> Vec<Material> {
        let mut table = vec![Material::default(); NB_MAX_MATERIALS];
        for (id, material) in self.iter() {
            table[id.index()] = material.clone();
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_block_is_the_top_of_the_id_space() {
        assert_eq!(MATERIAL_SYSTEM, 195);
        let ids: Vec<usize> = SystemMaterial::ALL.iter().map(|r| r.id().index()).collect();
        assert_eq!(ids, vec![195, 196, 197, 198, 199]);
        for role in SystemMaterial::ALL {
            assert!(role.id().is_system());
            assert_eq!(SystemMaterial::from_id(role.id()), Some(role));
        }
        assert!(MaterialId::NONE.is_none());
        assert!(!MaterialId::NONE.is_system());
    }

    #[test]
    fn user_ids_never_reach_the_system_block() {
        for count in [1, 2, 7, 118, MATERIAL_SYSTEM] {
            for raw in [0u64, 1, 5, 194, 195, 199, 1_000_003, u64::MAX] {
                let id = MaterialId::user(raw, count);
                assert!(id.index() < MATERIAL_SYSTEM);
                assert_eq!(id.index() as u64, raw % count as u64);
            }
        }
        // Out of range counts are clamped
        assert!(MaterialId::user(199, 10_000).index() < MATERIAL_SYSTEM);
        assert_eq!(MaterialId::user(42, 0).index(), 0);
    }

    #[test]
    fn registry_rejects_reserved_ids() {
        let mut registry = MaterialRegistry::default();
        assert!(registry
            .set(MaterialId::try_user(3).unwrap(), Material::default())
            .is_ok());
        assert_eq!(
            registry.set(SystemMaterial::Skybox.id(), Material::default()),
            Err(MaterialError::Reserved(195))
        );
        assert_eq!(MaterialId::try_user(200), Err(MaterialError::OutOfRange(200)));

        registry.set_system(SystemMaterial::Skybox, Material::default());
        assert_eq!(registry.user_count(), 1);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.to_table().len(), NB_MAX_MATERIALS);
    }
}
