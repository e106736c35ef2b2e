//! Protein Data Bank importer.
//!
//! Reads the fixed column `ATOM`/`HETATM` records of a PDB file and emits one
//! sphere per atom. A folder of PDB files can also be instanced through two index
//! files:
//!
//! - cells: `code id instances` per line, `code.pdb` lives in the folder
//! - positions: `id x y z ...` per line, one protein instance per line

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use glam::Vec3;

use crate::{
    geometry::Sphere,
    material::{color_scheme::PrimitiveAttributes, MaterialId},
    utils::timer::timed_scope_log,
};

use super::{
    atoms::{covalent_radius, element_color, element_index},
    GeometryLoader, ImportContext, ImportError, ImportedGeometry, Result,
};

/// Scale from PDB coordinates (angstroms) to scene units
const POSITION_SCALE: f32 = 0.01;
/// Scale from covalent radii (picometers) to scene units
const RADIUS_SCALE: f32 = 0.0001;
/// Radius of the sphere standing for a whole protein in positions only mode
const PROTEIN_RADIUS: f32 = 0.05;

#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    pub id: u64,
    pub name: String,
    pub residue_name: String,
    /// `A` is 1
    pub chain_id: i32,
    pub residue: i32,
    pub position: Vec3,
    pub element: String,
}

impl Atom {
    /// Parses an `ATOM` or `HETATM` record. Returns `None` for any other record and
    /// an error for records missing their coordinates.
    pub fn parse(line: &str) -> Option<std::result::Result<Atom, String>> {
        if !(line.starts_with("ATOM") || line.starts_with("HETATM")) {
            return None;
        }
        Some(Self::parse_record(line))
    }

    fn parse_record(line: &str) -> std::result::Result<Atom, String> {
        let coord = |range: std::ops::Range<usize>, axis: &str| {
            column(line, range)
                .parse::<f32>()
                .map_err(|e| format!("bad {axis} coordinate: {e}"))
        };
        let position = Vec3::new(coord(30..38, "x")?, coord(38..46, "y")?, coord(46..54, "z")?);
        if !position.is_finite() {
            return Err("non finite coordinates".to_owned());
        }

        let name = column(line, 12..16).to_owned();
        let element = match column(line, 76..78) {
            "" => name
                .chars()
                .skip_while(|c| c.is_ascii_digit())
                .take(1)
                .collect(),
            element => element.to_owned(),
        };

        Ok(Atom {
            id: column(line, 6..11).parse().unwrap_or(0),
            residue_name: column(line, 17..20).to_owned(),
            chain_id: line.as_bytes().get(21).map_or(0, |c| *c as i32 - 64),
            residue: column(line, 22..26).parse().unwrap_or(0),
            name,
            position,
            element,
        })
    }

    pub fn attributes(&self) -> PrimitiveAttributes {
        PrimitiveAttributes {
            id: self.id,
            element: element_index(&self.element),
            chain_id: self.chain_id,
            residue: self.residue,
            ..Default::default()
        }
    }
}

/// Trimmed text of the 0 based column `range`, empty past the end of the line
fn column(line: &str, range: std::ops::Range<usize>) -> &str {
    let end = range.end.min(line.len());
    line.get(range.start..end).unwrap_or("").trim()
}

/// `code id instances`
fn parse_cell(line: &str) -> Option<(String, u64, usize)> {
    let mut fields = line.split_whitespace();
    let code = fields.next()?.to_owned();
    let id = fields.next()?.parse().ok()?;
    let instances = fields.next()?.parse().ok()?;
    Some((code, id, instances))
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| ImportError::Open {
        path: path.to_owned(),
        source,
    })
}

/// Every atom of a PDB file. Malformed records are skipped.
pub fn parse_atoms(path: &Path) -> Result<Vec<Atom>> {
    let content = read(path)?;
    let mut atoms = Vec::new();
    for (line_number, line) in content.lines().enumerate() {
        match Atom::parse(line) {
            Some(Ok(atom)) => atoms.push(atom),
            Some(Err(reason)) => {
                log::warn!("{}:{}: skipping atom, {reason}", path.display(), line_number + 1);
                crate::counter!("skipped pdb records");
            }
            None => (),
        }
    }
    Ok(atoms)
}

#[derive(Debug, Clone, PartialEq)]
enum PdbSource {
    File(PathBuf),
    Folder {
        folder: PathBuf,
        cells: PathBuf,
        positions: PathBuf,
        positions_only: bool,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PdbLoader {
    source: PdbSource,
}

impl PdbLoader {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            source: PdbSource::File(path.into()),
        }
    }

    pub fn folder(
        folder: impl Into<PathBuf>,
        cells: impl Into<PathBuf>,
        positions: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source: PdbSource::Folder {
                folder: folder.into(),
                cells: cells.into(),
                positions: positions.into(),
                positions_only: false,
            },
        }
    }

    /// In folder mode, one sphere per protein instead of one per atom
    pub fn positions_only(mut self, enabled: bool) -> Self {
        if let PdbSource::Folder { positions_only, .. } = &mut self.source {
            *positions_only = enabled;
        }
        self
    }

    fn add_atoms(
        atoms: &[Atom],
        offset: Vec3,
        ctx: &ImportContext,
        geometry: &mut ImportedGeometry,
    ) {
        let scale = ctx.transform.scale.max_element();
        for atom in atoms {
            let attributes = atom.attributes();
            let material = ctx.material_id(&attributes);
            if let Some(color) = attributes.element.and_then(element_color) {
                geometry.suggest_color(material, color);
            }
            let center = ctx
                .transform
                .apply_point(offset + POSITION_SCALE * atom.position);
            let radius =
                RADIUS_SCALE * covalent_radius(&atom.element) * ctx.radius_multiplier * scale;
            geometry.push(material, Sphere::new(center, radius));
        }
    }

    fn import_file(path: &Path, ctx: &ImportContext) -> Result<ImportedGeometry> {
        let atoms = parse_atoms(path)?;
        log::info!("{}: {} atoms", path.display(), atoms.len());
        let mut geometry = ImportedGeometry::default();
        Self::add_atoms(&atoms, Vec3::ZERO, ctx, &mut geometry);
        Ok(geometry)
    }

    fn import_folder(
        folder: &Path,
        cells: &Path,
        positions: &Path,
        positions_only: bool,
        ctx: &ImportContext,
    ) -> Result<ImportedGeometry> {
        let mut proteins = HashMap::new();
        let mut total_instances = 0usize;
        for (line_number, line) in read(cells)?.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let Some((code, id, instances)) = parse_cell(line) else {
                log::warn!("{}:{}: skipping cell {line:?}", cells.display(), line_number + 1);
                crate::counter!("skipped pdb records");
                continue;
            };
            let Some(total) = total_instances.checked_add(instances) else {
                log::warn!(
                    "{}:{}: skipping cell with {instances} instances",
                    cells.display(),
                    line_number + 1
                );
                crate::counter!("skipped pdb records");
                continue;
            };
            total_instances = total;
            proteins.insert(id, code);
        }
        log::info!(
            "{} proteins, {} instances expected",
            proteins.len(),
            total_instances
        );

        let step = (total_instances / 10).max(1);
        let mut cache: HashMap<u64, Option<Vec<Atom>>> = HashMap::new();
        let mut geometry = ImportedGeometry::default();
        let mut loaded = 0usize;
        for (line_number, line) in read(positions)?.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let values: Option<Vec<f32>> = line
                .split_whitespace()
                .take(4)
                .map(|v| v.parse().ok())
                .collect();
            let (id, position) = match values.as_deref() {
                Some(&[id, x, y, z]) if id >= 0.0 => (id as u64, Vec3::new(x, y, z)),
                _ => {
                    log::warn!(
                        "{}:{}: skipping position {line:?}",
                        positions.display(),
                        line_number + 1
                    );
                    crate::counter!("skipped pdb records");
                    continue;
                }
            };
            let Some(code) = proteins.get(&id) else {
                continue;
            };

            if positions_only {
                let material = MaterialId::user(id, ctx.material_count);
                let center = ctx.transform.apply_point(position);
                let radius = PROTEIN_RADIUS * ctx.transform.scale.max_element();
                geometry.push(material, Sphere::new(center, radius));
            } else {
                let atoms = cache.entry(id).or_insert_with(|| {
                    let path = folder.join(format!("{code}.pdb"));
                    match parse_atoms(&path) {
                        Ok(atoms) => Some(atoms),
                        Err(err) => {
                            log::warn!("failed to import {}: {err}", path.display());
                            None
                        }
                    }
                });
                if let Some(atoms) = atoms {
                    Self::add_atoms(atoms, position, ctx, &mut geometry);
                }
            }
            loaded += 1;
            if loaded % step == 0 {
                log::info!("loaded {loaded} proteins ({}%)", 100 * loaded / total_instances.max(1));
            }
        }
        log::info!("loaded {loaded} protein instances");
        Ok(geometry)
    }
}

impl GeometryLoader for PdbLoader {
    fn name(&self) -> String {
        match &self.source {
            PdbSource::File(path) => format!("PDB file {}", path.display()),
            PdbSource::Folder { folder, .. } => format!("PDB folder {}", folder.display()),
        }
    }

    fn import(&self, ctx: &ImportContext) -> Result<ImportedGeometry> {
        let name = self.name();
        timed_scope_log("pdb import", || match &self.source {
            PdbSource::File(path) => Self::import_file(path, ctx),
            PdbSource::Folder {
                folder,
                cells,
                positions,
                positions_only,
            } => Self::import_folder(folder, cells, positions, *positions_only, ctx),
        })
        .res
        .map(|geometry| {
            log::info!("{name}: {} primitives", geometry.primitive_count());
            geometry
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::{color::Rgb, geometry::Primitive, material::color_scheme::ColorScheme};

    const CARBON: &str =
        "ATOM      1  CA  MET A   1      11.104   6.134  -6.504  1.00  0.00           C";
    const OXYGEN: &str =
        "ATOM      2  O   MET B  12      10.000   0.000   0.000  1.00  0.00           O";

    /// Fresh directory under the system temp dir
    fn temp_dir(name: &str) -> PathBuf {
        static COUNT: AtomicUsize = AtomicUsize::new(0);
        let dir = std::env::temp_dir().join(format!(
            "sciray-pdb-{name}-{}-{}",
            std::process::id(),
            COUNT.fetch_add(1, Ordering::Relaxed)
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn spheres(geometry: &ImportedGeometry) -> Vec<(MaterialId, Sphere)> {
        geometry
            .primitives
            .iter()
            .flat_map(|(id, prims)| {
                prims.iter().filter_map(move |p| match p {
                    Primitive::Sphere(s) => Some((*id, *s)),
                    _ => None,
                })
            })
            .collect()
    }

    #[test]
    fn parses_fixed_columns() {
        let atom = Atom::parse(CARBON).unwrap().unwrap();
        assert_eq!(atom.id, 1);
        assert_eq!(atom.name, "CA");
        assert_eq!(atom.residue_name, "MET");
        assert_eq!(atom.chain_id, 1);
        assert_eq!(atom.residue, 1);
        assert_eq!(atom.position, Vec3::new(11.104, 6.134, -6.504));
        assert_eq!(atom.element, "C");

        assert!(Atom::parse("HEADER    PROTEIN").is_none());
        assert!(Atom::parse("ATOM      1  CA  MET A   1      11.104").unwrap().is_err());
    }

    #[test]
    fn element_falls_back_to_the_atom_name() {
        let atom = Atom::parse(&CARBON[..54]).unwrap().unwrap();
        assert_eq!(atom.element, "C");
    }

    #[test]
    fn partial_import_skips_bad_records() {
        let dir = temp_dir("partial");
        let content = format!("HEADER\n{CARBON}\nATOM      3  N   MET A   1   garbage\n{OXYGEN}\nEND\n");
        let path = write(&dir, "protein.pdb", &content);

        let ctx = ImportContext {
            color_scheme: ColorScheme::ProteinChains,
            material_count: 10,
            ..Default::default()
        };
        let geometry = PdbLoader::file(&path).import(&ctx).unwrap();
        let spheres = spheres(&geometry);
        assert_eq!(spheres.len(), 2);
        assert_eq!(spheres[0].0, MaterialId::user(1, 10));
        assert_eq!(spheres[1].0, MaterialId::user(2, 10));

        let carbon = spheres[0].1;
        assert!((carbon.center - 0.01 * Vec3::new(11.104, 6.134, -6.504)).length() < 1e-6);
        assert!((carbon.radius - 0.0067).abs() < 1e-6);
        assert_eq!(geometry.bounds.max.x, spheres[0].1.center.x);
    }

    #[test]
    fn atoms_scheme_suggests_element_colors() {
        let dir = temp_dir("colors");
        let path = write(&dir, "protein.pdb", &format!("{CARBON}\n{OXYGEN}\n"));
        let ctx = ImportContext {
            color_scheme: ColorScheme::ProteinAtoms,
            ..Default::default()
        };
        let geometry = PdbLoader::file(&path).import(&ctx).unwrap();
        let carbon = ctx.material_id(&Atom::parse(CARBON).unwrap().unwrap().attributes());
        assert_eq!(carbon, MaterialId::user(5, ctx.material_count));
        assert_eq!(geometry.material_colors[&carbon], Rgb::from_hex(0x909090));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = temp_dir("missing");
        let err = PdbLoader::file(dir.join("nope.pdb"))
            .import(&ImportContext::default())
            .unwrap_err();
        assert!(matches!(err, ImportError::Open { .. }));
    }

    #[test]
    fn folder_instances_proteins() {
        let dir = temp_dir("folder");
        write(&dir, "1ABC.pdb", &format!("{CARBON}\n{OXYGEN}\n"));
        let cells = write(&dir, "cells.txt", "1ABC 7 2\n2XYZ 8 1\nbroken\n");
        let positions = write(
            &dir,
            "positions.txt",
            "7 1 0 0 0 0 0\n7 0 1 0 0 0 0\n8 0 0 1 0 0 0\n9 5 5 5 0 0 0\n",
        );
        let ctx = ImportContext::default();

        // 2XYZ.pdb is missing: warned about and skipped
        let geometry = PdbLoader::folder(&dir, &cells, &positions)
            .import(&ctx)
            .unwrap();
        let atoms = spheres(&geometry);
        assert_eq!(atoms.len(), 4);
        assert!(atoms
            .iter()
            .any(|(_, s)| (s.center.x - (1.0 + 0.11104)).abs() < 1e-5));

        let geometry = PdbLoader::folder(&dir, &cells, &positions)
            .positions_only(true)
            .import(&ctx)
            .unwrap();
        let proteins = spheres(&geometry);
        assert_eq!(proteins.len(), 3);
        assert!(proteins.iter().all(|(_, s)| s.radius == PROTEIN_RADIUS));
        assert_eq!(proteins[0].0, MaterialId::user(7, ctx.material_count));
    }

    #[test]
    fn overflowing_instance_count_is_skipped() {
        let dir = temp_dir("overflow");
        let cells = write(&dir, "cells.txt", "1ABC 7 18446744073709551615\n2XYZ 8 1\n");
        let positions = write(&dir, "positions.txt", "7 0 0 0 0 0 0\n8 1 1 1 0 0 0\n");

        let geometry = PdbLoader::folder(&dir, &cells, &positions)
            .positions_only(true)
            .import(&ImportContext::default())
            .unwrap();
        let proteins = spheres(&geometry);
        assert_eq!(proteins.len(), 1);
        assert_eq!(proteins[0].1.center, Vec3::ZERO);
    }

    #[test]
    fn missing_index_file_is_an_error() {
        let dir = temp_dir("index");
        let cells = write(&dir, "cells.txt", "1ABC 7 1\n");
        let err = PdbLoader::folder(&dir, &cells, dir.join("positions.txt"))
            .import(&ImportContext::default())
            .unwrap_err();
        assert!(matches!(err, ImportError::Open { .. }));
    }
}
