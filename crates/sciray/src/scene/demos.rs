//! Built-in scenes, used when nothing is imported.

use glam::Vec3;
use rand::{distributions::Uniform, prelude::Distribution, SeedableRng};

use super::{light::Light, Scene};
use crate::{
    color::Rgb,
    geometry::{Cone, Cylinder, Sphere},
    material::{palette::MaterialType, Material, MaterialId},
    math::distributions::UniformUnitSphere3,
    Rng,
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum DemoScene {
    /// A few spheres with glass, mirror and emissive materials
    #[default]
    Spheres,
    /// Random atoms with bonds, one material per element
    Molecule,
}

impl DemoScene {
    pub fn insert_into(self, scene: &mut Scene, seed: u64) {
        match self {
            DemoScene::Spheres => spheres(scene),
            DemoScene::Molecule => molecule(scene, seed),
        }
        log::info!(
            "demo scene {self:?}: {} primitives in {} materials",
            scene.primitive_count(),
            scene.primitives().len()
        );
    }
}

fn set(scene: &mut Scene, id: usize, material: Material) -> MaterialId {
    let id = MaterialId::user(id as u64, usize::MAX);
    if let Err(e) = scene.set_material(id, material) {
        log::warn!("demo material {id}: {e}");
    }
    id
}

fn spheres(scene: &mut Scene) {
    scene.build_materials(MaterialType::Default, 4, 0);
    let diffuse = set(scene, 0, Material::diffuse(Rgb::from_array([0.2, 0.9, 0.7])));
    let diffuse_blue = set(scene, 1, Material::diffuse(Rgb::from_array([0.2, 0.4, 0.8])));
    let glass = set(
        scene,
        2,
        Material::diffuse(Rgb::from_array([1.0, 1.0, 1.0]))
            .with_opacity(0.2)
            .with_refraction(1.5),
    );
    let light = set(
        scene,
        3,
        Material::diffuse(Rgb::from_array([1.0, 0.9, 0.7])).with_emission(4.0),
    );
    let mirror = set(
        scene,
        4,
        Material::diffuse(Rgb::from_array([0.9, 0.9, 0.9])).with_reflection(0.8),
    );

    scene.add_primitive(diffuse, Sphere::new(Vec3::new(-0.6, 0.05, -1.0), 0.3));
    scene.add_primitive(diffuse_blue, Sphere::new(Vec3::new(-0.3, -0.05, 1.0), 0.2));
    scene.add_primitive(glass, Sphere::new(Vec3::new(0.0, 0.0, -0.3), 0.15));
    scene.add_primitive(mirror, Sphere::new(Vec3::new(0.5, 0.1, 0.2), 0.25));
    scene.add_primitive(light, Sphere::new(Vec3::new(0.4, 0.0, -0.6), 0.12));
    scene.add_primitive(
        diffuse_blue,
        Cone::new(Vec3::new(-0.8, -0.3, 0.3), Vec3::new(-0.8, 0.2, 0.3), 0.15, 0.0),
    );

    scene.add_light(Light::point(Vec3::new(0.0, 1.0, 0.5)));
}

fn molecule(scene: &mut Scene, seed: u64) {
    const ATOMS: usize = 200;
    const ELEMENTS: usize = 6;

    scene.build_materials(MaterialType::PastelColors, ELEMENTS, seed);
    let mut rng = Rng::seed_from_u64(seed);
    let element = Uniform::new(0, ELEMENTS as u64);

    let mut previous: Option<Vec3> = None;
    let mut position = Vec3::ZERO;
    for _ in 0..ATOMS {
        let step: Vec3 = UniformUnitSphere3.sample(&mut rng);
        position += 0.15 * step;
        let material = MaterialId::user(element.sample(&mut rng), ELEMENTS);
        scene.add_primitive(material, Sphere::new(position, 0.06));
        if let Some(previous) = previous {
            scene.add_primitive(material, Cylinder::new(previous, position, 0.015));
        }
        previous = Some(position);
    }

    scene.add_light(Light::directional(Vec3::new(-1.0, -1.0, -1.0)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn molecule_is_deterministic() {
        let mut a = Scene::new();
        let mut b = Scene::new();
        DemoScene::Molecule.insert_into(&mut a, 5);
        DemoScene::Molecule.insert_into(&mut b, 5);
        assert_eq!(a.primitives(), b.primitives());
        assert_eq!(a.primitive_count(), 2 * 200 - 1);
        assert!(a.primitives().keys().all(|id| id.index() < 6));
    }

    #[test]
    fn spheres_has_a_light() {
        let mut scene = Scene::new();
        DemoScene::Spheres.insert_into(&mut scene, 0);
        assert_eq!(scene.lights().len(), 1);
        assert!(!scene.bounds().is_empty());
    }
}
