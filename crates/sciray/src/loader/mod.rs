//! Geometry importers.
//!
//! A [GeometryLoader] turns a file into primitives grouped by material. Failing
//! to open the top level input is an error; malformed records inside it are
//! logged and skipped.

pub mod atoms;
pub mod obj;
pub mod pdb;

use std::{collections::BTreeMap, path::PathBuf};

pub use obj::ObjLoader;
pub use pdb::PdbLoader;

use crate::{
    color::Rgb,
    geometry::{Primitive, PrimitivesMap},
    material::{
        color_scheme::{ColorScheme, PrimitiveAttributes},
        MaterialId,
    },
    math::{bounds::Bounds, transform::Transform},
    parameters::{GeometryParameters, GeometryQuality},
};

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("could not open {path}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not load {path}: {reason}")]
    Load { path: PathBuf, reason: String },
}

pub type Result<T, E = ImportError> = std::result::Result<T, E>;

/// What importers need to know about the scene they import into
#[derive(Debug, Clone, PartialEq)]
pub struct ImportContext {
    pub material_count: usize,
    pub color_scheme: ColorScheme,
    pub radius_multiplier: f32,
    pub geometry_quality: GeometryQuality,
    /// Applied to every imported point
    pub transform: Transform,
}

impl Default for ImportContext {
    fn default() -> Self {
        Self::from(&GeometryParameters::default())
    }
}

impl From<&GeometryParameters> for ImportContext {
    fn from(params: &GeometryParameters) -> Self {
        Self {
            material_count: params.material_count,
            color_scheme: params.color_scheme,
            radius_multiplier: params.radius_multiplier,
            geometry_quality: params.geometry_quality,
            transform: Transform::IDENTITY,
        }
    }
}

impl ImportContext {
    pub fn material_id(&self, attributes: &PrimitiveAttributes) -> MaterialId {
        self.color_scheme
            .material_id(attributes, self.material_count)
    }
}

#[derive(Debug, Default, Clone)]
pub struct ImportedGeometry {
    pub primitives: PrimitivesMap,
    pub bounds: Bounds,
    /// Diffuse colors the importer suggests for the materials it used
    pub material_colors: BTreeMap<MaterialId, Rgb>,
}

impl ImportedGeometry {
    pub fn push(&mut self, id: MaterialId, primitive: impl Into<Primitive>) {
        let primitive = primitive.into();
        primitive.extend_bounds(&mut self.bounds);
        self.primitives.entry(id).or_default().push(primitive);
    }

    /// Keeps the first color suggested for `id`
    pub fn suggest_color(&mut self, id: MaterialId, color: Rgb) {
        self.material_colors.entry(id).or_insert(color);
    }

    pub fn primitive_count(&self) -> usize {
        self.primitives.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }
}

pub trait GeometryLoader {
    /// Shown in logs
    fn name(&self) -> String;

    fn import(&self, ctx: &ImportContext) -> Result<ImportedGeometry>;
}

/// Loaders for every input named in `params`, PDB first
pub fn loaders_from_parameters(params: &GeometryParameters) -> Vec<Box<dyn GeometryLoader>> {
    let mut loaders: Vec<Box<dyn GeometryLoader>> = Vec::new();
    if let Some(path) = &params.pdb_file {
        loaders.push(Box::new(PdbLoader::file(path)));
    }
    match (&params.pdb_folder, &params.pdb_cells, &params.pdb_positions) {
        (Some(folder), Some(cells), Some(positions)) => loaders.push(Box::new(
            PdbLoader::folder(folder, cells, positions).positions_only(params.pdb_positions_only),
        )),
        (None, None, None) => (),
        _ => log::warn!("a PDB folder needs a folder, a cells file and a positions file"),
    }
    if let Some(path) = &params.obj_file {
        loaders.push(Box::new(ObjLoader::new(path)));
    }
    loaders
}
