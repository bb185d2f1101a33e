//! Frame buffers and the intermediate target set of the pipeline
//!
//! Every buffer of one frame graph shares a single [`Extent`]. Buffers are
//! reallocated as a set on resize and get fresh [`BufferId`]s, so identity
//! comparisons tell whether a reallocation happened.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{RenderError, RenderResult};

/// Normalized depth written for pixels without geometry (the far plane)
pub const FAR_DEPTH: f32 = 1.0;

/// Texel value the SSGI chain treats as "no contribution": no GI, no occlusion
pub const NEUTRAL_GI_AO: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// Width and height of a render target in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Extent {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Extent {
    /// Create a new extent
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Whether both dimensions are non-zero
    pub const fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Number of texels
    pub const fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Width over height
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

impl std::fmt::Display for Extent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Identity of one buffer allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub u64);

/// The named slots of the pipeline's target set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetSlot {
    /// Lit scene colour (HDR)
    Color,
    /// Normalized linear depth in the red channel
    Depth,
    /// View-space normal in rgb, coverage in alpha
    Normal,
    /// Raw SSGI estimate: GI in rgb, AO in alpha
    GiAo,
    /// Filtered SSGI estimate
    Denoised,
    /// Base colour merged with GI/AO
    Composite,
    /// Tone-mapped image handed to the surface
    Output,
}

impl TargetSlot {
    /// All slots in allocation order
    pub const ALL: [Self; 7] = [
        Self::Color,
        Self::Depth,
        Self::Normal,
        Self::GiAo,
        Self::Denoised,
        Self::Composite,
        Self::Output,
    ];

    /// Debug label of the slot
    pub const fn label(self) -> &'static str {
        match self {
            Self::Color => "scene-color",
            Self::Depth => "scene-depth",
            Self::Normal => "scene-normal",
            Self::GiAo => "ssgi-gi-ao",
            Self::Denoised => "ssgi-denoised",
            Self::Composite => "composite",
            Self::Output => "output",
        }
    }

    const fn clear_value(self) -> [f32; 4] {
        match self {
            Self::Depth => [FAR_DEPTH, 0.0, 0.0, 0.0],
            Self::GiAo | Self::Denoised => NEUTRAL_GI_AO,
            _ => [0.0, 0.0, 0.0, 1.0],
        }
    }
}

/// A float RGBA texture living on the reference backend
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    id: BufferId,
    label: &'static str,
    extent: Extent,
    texels: Vec<[f32; 4]>,
}

impl FrameBuffer {
    /// Allocate a buffer filled with `clear`
    pub fn new(id: BufferId, label: &'static str, extent: Extent, clear: [f32; 4]) -> Self {
        Self {
            id,
            label,
            extent,
            texels: vec![clear; extent.pixel_count()],
        }
    }

    /// Allocation identity
    pub fn id(&self) -> BufferId {
        self.id
    }

    /// Debug label
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Size of the buffer
    pub fn extent(&self) -> Extent {
        self.extent
    }

    /// Linear index of a texel
    #[inline]
    pub fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.extent.width as usize + x as usize
    }

    /// Read one texel
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> [f32; 4] {
        self.texels[self.index(x, y)]
    }

    /// Read a texel addressed with signed coordinates, `None` outside the buffer
    #[inline]
    pub fn try_get(&self, x: i32, y: i32) -> Option<[f32; 4]> {
        if x < 0 || y < 0 || x >= self.extent.width as i32 || y >= self.extent.height as i32 {
            None
        } else {
            Some(self.get(x as u32, y as u32))
        }
    }

    /// Write one texel
    #[inline]
    pub fn set(&mut self, x: u32, y: u32, value: [f32; 4]) {
        let index = self.index(x, y);
        self.texels[index] = value;
    }

    /// All texels, row-major from the top-left corner
    pub fn texels(&self) -> &[[f32; 4]] {
        &self.texels
    }

    /// Mutable access to all texels
    pub fn texels_mut(&mut self) -> &mut [[f32; 4]] {
        &mut self.texels
    }

    /// Overwrite every texel
    pub fn fill(&mut self, value: [f32; 4]) {
        self.texels.fill(value);
    }

    /// Raw IEEE-754 bit patterns of all channels, for exact comparisons
    pub fn bits(&self) -> &[u32] {
        bytemuck::cast_slice(&self.texels)
    }

    /// Raw bytes of the buffer as it would be read back from the device
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.texels)
    }

    /// Quantize to 8-bit RGBA, clamping every channel to `[0, 1]`
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.texels
            .iter()
            .flat_map(|texel| texel.map(|c| (c.clamp(0.0, 1.0) * 255.0 + 0.5) as u8))
            .collect()
    }

    /// Save the buffer as a PNG file
    pub fn save_png(&self, path: impl AsRef<Path>) -> RenderResult<()> {
        let path = path.as_ref();
        let image = image::RgbaImage::from_raw(self.extent.width, self.extent.height, self.to_rgba8())
            .ok_or_else(|| RenderError::Export(format!("buffer '{}' has an inconsistent size", self.label)))?;

        image
            .save(path)
            .map_err(|e| RenderError::Export(format!("{}: {e}", path.display())))?;

        log::info!("Saved '{}' ({}) to {}", self.label, self.extent, path.display());
        Ok(())
    }
}

/// The intermediate buffers owned by the pipeline
///
/// Fields are crate-visible so passes can borrow several slots at once.
#[derive(Debug)]
pub struct RenderTargets {
    extent: Extent,
    next_id: u64,
    allocations: u64,
    pub(crate) color: FrameBuffer,
    pub(crate) depth: FrameBuffer,
    pub(crate) normal: FrameBuffer,
    pub(crate) gi_ao: FrameBuffer,
    pub(crate) denoised: FrameBuffer,
    pub(crate) composite: FrameBuffer,
    pub(crate) output: FrameBuffer,
}

impl RenderTargets {
    /// Allocate the full target set
    pub fn new(extent: Extent) -> Self {
        let mut next_id = 0;
        let mut alloc = |slot: TargetSlot| {
            next_id += 1;
            FrameBuffer::new(BufferId(next_id), slot.label(), extent, slot.clear_value())
        };

        let color = alloc(TargetSlot::Color);
        let depth = alloc(TargetSlot::Depth);
        let normal = alloc(TargetSlot::Normal);
        let gi_ao = alloc(TargetSlot::GiAo);
        let denoised = alloc(TargetSlot::Denoised);
        let composite = alloc(TargetSlot::Composite);
        let output = alloc(TargetSlot::Output);

        Self {
            extent,
            next_id,
            allocations: 1,
            color,
            depth,
            normal,
            gi_ao,
            denoised,
            composite,
            output,
        }
    }

    /// Shared size of every buffer
    pub fn extent(&self) -> Extent {
        self.extent
    }

    /// How many times the set has been (re)allocated, including the first time
    pub fn allocation_count(&self) -> u64 {
        self.allocations
    }

    /// Reallocate every buffer at `extent`
    ///
    /// Returns `false` and keeps the current buffers when the size is unchanged.
    pub fn reallocate(&mut self, extent: Extent) -> bool {
        if extent == self.extent {
            return false;
        }

        for slot in TargetSlot::ALL {
            self.next_id += 1;
            *self.slot_mut(slot) = FrameBuffer::new(BufferId(self.next_id), slot.label(), extent, slot.clear_value());
        }
        self.extent = extent;
        self.allocations += 1;
        true
    }

    /// Borrow the buffer in `slot`
    pub fn get(&self, slot: TargetSlot) -> &FrameBuffer {
        match slot {
            TargetSlot::Color => &self.color,
            TargetSlot::Depth => &self.depth,
            TargetSlot::Normal => &self.normal,
            TargetSlot::GiAo => &self.gi_ao,
            TargetSlot::Denoised => &self.denoised,
            TargetSlot::Composite => &self.composite,
            TargetSlot::Output => &self.output,
        }
    }

    fn slot_mut(&mut self, slot: TargetSlot) -> &mut FrameBuffer {
        match slot {
            TargetSlot::Color => &mut self.color,
            TargetSlot::Depth => &mut self.depth,
            TargetSlot::Normal => &mut self.normal,
            TargetSlot::GiAo => &mut self.gi_ao,
            TargetSlot::Denoised => &mut self.denoised,
            TargetSlot::Composite => &mut self.composite,
            TargetSlot::Output => &mut self.output,
        }
    }

    /// Identities of all buffers in [`TargetSlot::ALL`] order
    pub fn ids(&self) -> Vec<BufferId> {
        TargetSlot::ALL.iter().map(|slot| self.get(*slot).id()).collect()
    }

    /// Check that every buffer matches the set's extent
    pub fn ensure_consistent(&self) -> RenderResult<()> {
        for slot in TargetSlot::ALL {
            let buffer = self.get(slot);
            if buffer.extent() != self.extent || buffer.texels().len() != self.extent.pixel_count() {
                return Err(RenderError::ExtentMismatch(format!(
                    "'{}' is {} but the frame graph is {}",
                    buffer.label(),
                    buffer.extent(),
                    self.extent
                )));
            }
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn replace_for_test(&mut self, slot: TargetSlot, buffer: FrameBuffer) {
        *self.slot_mut(slot) = buffer;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reallocate_same_extent_is_noop() {
        let mut targets = RenderTargets::new(Extent::new(8, 4));
        let before = targets.ids();

        assert!(!targets.reallocate(Extent::new(8, 4)));
        assert_eq!(targets.ids(), before);
        assert_eq!(targets.allocation_count(), 1);
    }

    #[test]
    fn test_reallocate_new_extent_replaces_every_buffer() {
        let mut targets = RenderTargets::new(Extent::new(8, 4));
        let before = targets.ids();

        assert!(targets.reallocate(Extent::new(16, 9)));
        let after = targets.ids();

        assert_eq!(targets.allocation_count(), 2);
        assert!(before.iter().all(|id| !after.contains(id)));
        for slot in TargetSlot::ALL {
            assert_eq!(targets.get(slot).extent(), Extent::new(16, 9));
        }
        targets.ensure_consistent().unwrap();
    }

    #[test]
    fn test_mismatched_buffer_is_reported() {
        let mut targets = RenderTargets::new(Extent::new(4, 4));
        targets.replace_for_test(
            TargetSlot::Normal,
            FrameBuffer::new(BufferId(99), "stray", Extent::new(2, 2), [0.0; 4]),
        );

        let err = targets.ensure_consistent().unwrap_err();
        assert!(matches!(err, RenderError::ExtentMismatch(_)));
    }

    #[test]
    fn test_depth_clears_to_far_plane() {
        let targets = RenderTargets::new(Extent::new(3, 3));
        assert!(targets.get(TargetSlot::Depth).texels().iter().all(|t| t[0] == FAR_DEPTH));
        assert!(targets.get(TargetSlot::GiAo).texels().iter().all(|t| *t == NEUTRAL_GI_AO));
    }

    #[test]
    fn test_rgba8_quantization() {
        let mut buffer = FrameBuffer::new(BufferId(1), "t", Extent::new(1, 1), [0.0; 4]);
        buffer.set(0, 0, [1.5, 0.5, -1.0, 1.0]);
        assert_eq!(buffer.to_rgba8(), vec![255, 128, 0, 255]);
    }
}
