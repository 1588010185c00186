//! Pipeline State Flags
//!
//! Passes carry a [`DrawState`]; individual batches may disable and re-enable
//! bits on top of it. The flags translate to the `wgpu` pipeline vocabulary
//! when a backend builds its pipelines.

use bitflags::bitflags;

bitflags! {
    /// Fixed-function state of a pass or batch.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct DrawState: u32 {
        const WRITE_DEPTH = 1 << 0;
        const WRITE_COLOR = 1 << 1;
        const DEPTH_LESS  = 1 << 2;
        const DEPTH_EQUAL = 1 << 3;
        const CULL_BACK   = 1 << 4;
        /// User clip planes are active.
        const CLIP_PLANES = 1 << 5;
        /// Wireframe overlays may be drawn with this state.
        const WIRE        = 1 << 6;
        const BLEND       = 1 << 7;
        const ADDITIVE    = 1 << 8;
        const MULTIPLY    = 1 << 9;
    }
}

impl DrawState {
    /// Every depth, cull and blend bit a transparent batch may override.
    pub const TRANSPARENT_OVERRIDABLE: Self = Self::WRITE_DEPTH
        .union(Self::WRITE_COLOR)
        .union(Self::CULL_BACK)
        .union(Self::DEPTH_LESS)
        .union(Self::DEPTH_EQUAL)
        .union(Self::BLEND)
        .union(Self::ADDITIVE)
        .union(Self::MULTIPLY);

    /// Blend bits; at most one is expected to be set.
    pub const BLEND_MODES: Self = Self::BLEND.union(Self::ADDITIVE).union(Self::MULTIPLY);

    /// Depth comparison, `None` when depth testing is off.
    #[must_use]
    pub fn depth_compare(self) -> Option<wgpu::CompareFunction> {
        if self.contains(Self::DEPTH_EQUAL) {
            Some(wgpu::CompareFunction::Equal)
        } else if self.contains(Self::DEPTH_LESS) {
            Some(wgpu::CompareFunction::Less)
        } else {
            None
        }
    }

    #[inline]
    #[must_use]
    pub fn cull_mode(self) -> Option<wgpu::Face> {
        self.contains(Self::CULL_BACK).then_some(wgpu::Face::Back)
    }

    /// Blend equation of the color target.
    #[must_use]
    pub fn blend_state(self) -> Option<wgpu::BlendState> {
        if self.contains(Self::ADDITIVE) {
            let add = wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            };
            Some(wgpu::BlendState {
                color: add,
                alpha: add,
            })
        } else if self.contains(Self::MULTIPLY) {
            let multiply = wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::Dst,
                dst_factor: wgpu::BlendFactor::Zero,
                operation: wgpu::BlendOperation::Add,
            };
            Some(wgpu::BlendState {
                color: multiply,
                alpha: multiply,
            })
        } else if self.contains(Self::BLEND) {
            Some(wgpu::BlendState::ALPHA_BLENDING)
        } else {
            None
        }
    }

    #[inline]
    #[must_use]
    pub fn color_writes(self) -> wgpu::ColorWrites {
        if self.contains(Self::WRITE_COLOR) {
            wgpu::ColorWrites::ALL
        } else {
            wgpu::ColorWrites::empty()
        }
    }

    /// State seen by a batch: the pass state with `disable` cleared, then
    /// `enable` set.
    #[inline]
    #[must_use]
    pub fn overridden(self, disable: Self, enable: Self) -> Self {
        (self - disable) | enable
    }
}
