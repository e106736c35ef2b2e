use std::path::PathBuf;

use glam::{UVec3, Vec3};

use crate::{
    color::Rgb,
    geometry::TrianglesMesh,
    material::{color_scheme::PrimitiveAttributes, MaterialId},
    utils::timer::timed_scope_log,
};

use super::{GeometryLoader, ImportContext, ImportError, ImportedGeometry, Result};

/// Wavefront OBJ importer, one mesh per OBJ model
#[derive(Debug, Clone, PartialEq)]
pub struct ObjLoader {
    path: PathBuf,
}

impl ObjLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// Keeps every n-th triangle so that at most `budget` remain
fn decimate(indices: Vec<UVec3>, budget: Option<usize>) -> Vec<UVec3> {
    match budget {
        Some(budget) if budget > 0 && indices.len() > budget => {
            let stride = indices.len().div_ceil(budget);
            indices.into_iter().step_by(stride).collect()
        }
        _ => indices,
    }
}

impl GeometryLoader for ObjLoader {
    fn name(&self) -> String {
        format!("OBJ file {}", self.path.display())
    }

    fn import(&self, ctx: &ImportContext) -> Result<ImportedGeometry> {
        let mut options = tobj::GPU_LOAD_OPTIONS;
        options.single_index = true;
        let (models, materials) = timed_scope_log("obj load", || {
            tobj::load_obj(&self.path, &options)
        })
        .res
        .map_err(|err| match err {
            tobj::LoadError::OpenFileFailed => ImportError::Open {
                path: self.path.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, err),
            },
            err => ImportError::Load {
                path: self.path.clone(),
                reason: err.to_string(),
            },
        })?;

        let materials = materials.unwrap_or_else(|err| {
            log::warn!("{}: no materials, {err}", self.path.display());
            Vec::new()
        });

        let mut geometry = ImportedGeometry::default();
        for (model_index, model) in models.into_iter().enumerate() {
            let mesh = model.mesh;
            log::debug!("loading model {}", model.name);

            let material = match mesh.material_id.and_then(|i| Some((i, materials.get(i)?))) {
                Some((index, obj_material)) => {
                    let id = MaterialId::user(index as u64, ctx.material_count);
                    geometry.suggest_color(id, Rgb::from_array(obj_material.diffuse));
                    id
                }
                None => ctx.material_id(&PrimitiveAttributes {
                    id: model_index as u64,
                    ..Default::default()
                }),
            };

            if mesh.positions.len() % 3 != 0 || mesh.indices.len() % 3 != 0 {
                log::warn!("{}: skipping malformed model {}", self.path.display(), model.name);
                crate::counter!("skipped obj models");
                continue;
            }
            let positions: &[Vec3] = bytemuck::cast_slice(&mesh.positions);
            let vertices = positions
                .iter()
                .map(|p| ctx.transform.apply_point(*p))
                .collect::<Vec<_>>();
            let normals = if mesh.normals.len() == mesh.positions.len() {
                let normals: &[Vec3] = bytemuck::cast_slice(&mesh.normals);
                normals
                    .iter()
                    .map(|n| ctx.transform.apply_normal(*n))
                    .collect()
            } else {
                Vec::new()
            };
            let indices: &[UVec3] = bytemuck::cast_slice(&mesh.indices);
            let triangles = indices.len();
            let indices = decimate(indices.to_vec(), ctx.geometry_quality.triangle_budget());
            if indices.len() < triangles {
                log::info!(
                    "{}: model {} decimated from {} to {} triangles",
                    self.path.display(),
                    model.name,
                    triangles,
                    indices.len()
                );
            }

            geometry.push(
                material,
                TrianglesMesh {
                    vertices,
                    normals,
                    indices,
                },
            );
        }
        log::info!("{}: {} meshes", self.name(), geometry.primitive_count());
        Ok(geometry)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::{geometry::Primitive, math::transform::Transform, parameters::GeometryQuality};

    const QUAD: &str = "\
o quad
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
f 1 2 3
f 1 3 4
";

    fn write_temp(name: &str, content: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("sciray-obj-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn meshes(geometry: &ImportedGeometry) -> Vec<&TrianglesMesh> {
        geometry
            .primitives
            .values()
            .flatten()
            .filter_map(|p| match p {
                Primitive::TrianglesMesh(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn loads_and_transforms() {
        let path = write_temp("quad.obj", QUAD);
        let ctx = ImportContext {
            transform: Transform::from_translation(Vec3::new(0.0, 0.0, -2.0)),
            ..Default::default()
        };
        let geometry = ObjLoader::new(&path).import(&ctx).unwrap();
        let meshes = meshes(&geometry);
        assert_eq!(meshes.len(), 1);
        assert_eq!(meshes[0].triangle_count(), 2);
        assert!(meshes[0].vertices.iter().all(|v| v.z == -2.0));
        assert_eq!(geometry.bounds.max, Vec3::new(1.0, 1.0, -2.0));
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = ObjLoader::new(Path::new("/nonexistent/sciray.obj"))
            .import(&ImportContext::default())
            .unwrap_err();
        assert!(matches!(err, ImportError::Open { .. }));
    }

    #[test]
    fn decimation_respects_the_budget() {
        let indices = vec![UVec3::ZERO; 25];
        assert_eq!(decimate(indices.clone(), None).len(), 25);
        assert!(decimate(indices.clone(), Some(10)).len() <= 10);
        assert_eq!(decimate(indices, Some(100)).len(), 25);
        assert!(GeometryQuality::Low.triangle_budget().is_some());
    }
}
