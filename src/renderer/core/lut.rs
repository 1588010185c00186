//! Utility Lookup Texture
//!
//! Three 64×64 RGBA16F layers shared by every lit shader:
//!
//! | Layer | R              | G              | B            | A            |
//! |-------|----------------|----------------|--------------|--------------|
//! | 0     | LTC matrix     | LTC matrix     | LTC matrix   | LTC matrix   |
//! | 1     | split-sum scale| split-sum bias | LTC magnitude| 0            |
//! | 2     | noise.x        | noise.y·½+½    | cos 2π·noise.y | sin 2π·noise.y |
//!
//! The tables themselves are precomputed data supplied by the host.

use std::borrow::Cow;
use std::f32::consts::TAU;

use half::f16;

use crate::errors::{Result, ShadingError};
use crate::renderer::backend::TextureArrayDescriptor;

/// Texels per side of each layer.
pub const LUT_SIZE: u32 = 64;

/// Number of layers in the utility texture.
pub const LUT_LAYERS: u32 = 3;

const TEXELS_PER_LAYER: usize = (LUT_SIZE * LUT_SIZE) as usize;

/// Precomputed BSDF and noise tables, one entry per texel.
#[derive(Debug, Clone, Default)]
pub struct LutTables {
    /// GGX linearly transformed cosine inverse matrices.
    pub ltc_mat_ggx: Cow<'static, [[f32; 4]]>,
    /// GGX split-sum scale and bias.
    pub bsdf_split_sum_ggx: Cow<'static, [[f32; 2]]>,
    /// GGX LTC magnitude.
    pub ltc_mag_ggx: Cow<'static, [f32]>,
    /// Two blue noise channels in `[0, 1)`.
    pub blue_noise: Cow<'static, [[f32; 2]]>,
}

fn check_len(table: &'static str, actual: usize) -> Result<()> {
    if actual == TEXELS_PER_LAYER {
        Ok(())
    } else {
        Err(ShadingError::LutSize {
            table,
            expected: TEXELS_PER_LAYER,
            actual,
        })
    }
}

impl LutTables {
    /// Verify every table has exactly one entry per texel.
    pub fn validate(&self) -> Result<()> {
        check_len("ltc_mat_ggx", self.ltc_mat_ggx.len())?;
        check_len("bsdf_split_sum_ggx", self.bsdf_split_sum_ggx.len())?;
        check_len("ltc_mag_ggx", self.ltc_mag_ggx.len())?;
        check_len("blue_noise", self.blue_noise.len())
    }

    /// Interleave the tables into RGBA half floats, layer after layer.
    pub fn pack(&self) -> Result<Vec<[f16; 4]>> {
        self.validate()?;

        let mut texels = Vec::with_capacity(TEXELS_PER_LAYER * LUT_LAYERS as usize);

        texels.extend(self.ltc_mat_ggx.iter().map(|m| m.map(f16::from_f32)));

        texels.extend(
            self.bsdf_split_sum_ggx
                .iter()
                .zip(self.ltc_mag_ggx.iter())
                .map(|(split, &mag)| [split[0], split[1], mag, 0.0].map(f16::from_f32)),
        );

        texels.extend(self.blue_noise.iter().map(|&[x, y]| {
            let angle = y * TAU;
            [x, y * 0.5 + 0.5, angle.cos(), angle.sin()].map(f16::from_f32)
        }));

        Ok(texels)
    }

    /// Texture description matching [`pack`](Self::pack).
    #[must_use]
    pub fn descriptor() -> TextureArrayDescriptor {
        TextureArrayDescriptor {
            label: "Utility LUT",
            size: wgpu::Extent3d {
                width: LUT_SIZE,
                height: LUT_SIZE,
                depth_or_array_layers: LUT_LAYERS,
            },
            format: wgpu::TextureFormat::Rgba16Float,
            filter: wgpu::FilterMode::Linear,
            address_mode: wgpu::AddressMode::Repeat,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant_tables() -> LutTables {
        LutTables {
            ltc_mat_ggx: vec![[1.0, 0.0, 0.0, 1.0]; TEXELS_PER_LAYER].into(),
            bsdf_split_sum_ggx: vec![[0.25, 0.75]; TEXELS_PER_LAYER].into(),
            ltc_mag_ggx: vec![0.5; TEXELS_PER_LAYER].into(),
            blue_noise: vec![[0.125, 0.25]; TEXELS_PER_LAYER].into(),
        }
    }

    #[test]
    fn packs_three_layers() {
        let texels = constant_tables().pack().unwrap();
        assert_eq!(texels.len(), TEXELS_PER_LAYER * 3);

        let layer1 = texels[TEXELS_PER_LAYER].map(f16::to_f32);
        assert_eq!(layer1, [0.25, 0.75, 0.5, 0.0]);

        // y = 0.25 is a quarter turn.
        let layer2 = texels[2 * TEXELS_PER_LAYER].map(f16::to_f32);
        assert_eq!(layer2[0], 0.125);
        assert_eq!(layer2[1], 0.625);
        assert!(layer2[2].abs() < 1e-3);
        assert!((layer2[3] - 1.0).abs() < 1e-3);
    }

    #[test]
    fn rejects_short_table() {
        let mut tables = constant_tables();
        tables.ltc_mag_ggx = vec![0.0; 10].into();

        let err = tables.pack().unwrap_err();
        assert!(matches!(
            err,
            ShadingError::LutSize {
                table: "ltc_mag_ggx",
                actual: 10,
                ..
            }
        ));
    }
}
