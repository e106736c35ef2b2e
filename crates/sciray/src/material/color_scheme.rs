use super::{MaterialId, MATERIAL_SYSTEM};

/// Policy mapping a primitive's domain attributes to a material
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ColorScheme {
    #[default]
    None,
    NeuronById,
    NeuronByType,
    NeuronBySegmentType,
    ProteinById,
    ProteinAtoms,
    ProteinChains,
    ProteinResidues,
}

/// What an importer knows about one primitive
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PrimitiveAttributes {
    pub id: u64,
    pub element: Option<usize>,
    pub chain_id: i32,
    pub residue: i32,
    pub neuron_type: u32,
    pub segment_type: u32,
}

impl ColorScheme {
    /// Pure function of `attributes`, always a user id (`< user_count`, clamped to
    /// [MATERIAL_SYSTEM]).
    pub fn material_id(self, attributes: &PrimitiveAttributes, user_count: usize) -> MaterialId {
        let raw = match self {
            ColorScheme::None => 0,
            ColorScheme::NeuronById | ColorScheme::ProteinById => attributes.id,
            ColorScheme::NeuronByType => attributes.neuron_type as u64,
            ColorScheme::NeuronBySegmentType => attributes.segment_type as u64,
            ColorScheme::ProteinAtoms => attributes.element.unwrap_or(0) as u64,
            ColorScheme::ProteinChains => attributes.chain_id.unsigned_abs() as u64,
            ColorScheme::ProteinResidues => attributes.residue.unsigned_abs() as u64,
        };
        let id = MaterialId::user(raw, user_count);
        debug_assert!(id.index() < MATERIAL_SYSTEM);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [ColorScheme; 8] = [
        ColorScheme::None,
        ColorScheme::NeuronById,
        ColorScheme::NeuronByType,
        ColorScheme::NeuronBySegmentType,
        ColorScheme::ProteinById,
        ColorScheme::ProteinAtoms,
        ColorScheme::ProteinChains,
        ColorScheme::ProteinResidues,
    ];

    #[test]
    fn schemes_only_emit_user_ids() {
        let attributes = PrimitiveAttributes {
            id: 1_234_567,
            element: Some(118),
            chain_id: -199,
            residue: 4_000,
            neuron_type: 197,
            segment_type: u32::MAX,
        };
        for scheme in ALL {
            for count in [1, 3, 118, MATERIAL_SYSTEM, 500] {
                assert!(scheme.material_id(&attributes, count).index() < MATERIAL_SYSTEM);
            }
        }
    }

    #[test]
    fn chains_and_residues_wrap() {
        let attributes = PrimitiveAttributes {
            chain_id: -7,
            residue: 12,
            ..Default::default()
        };
        assert_eq!(
            ColorScheme::ProteinChains.material_id(&attributes, 5).index(),
            2
        );
        assert_eq!(
            ColorScheme::ProteinResidues.material_id(&attributes, 5).index(),
            2
        );
    }
}
