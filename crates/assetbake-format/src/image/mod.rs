//! Image buffer model
//!
//! An [`ImageBuffer`] owns the pixel memory of one image across a grid of
//! array slices (cubemap faces, texture-array layers) by mip levels.
//!
//! # Grid Layout
//! ```text
//!              mip 0        mip 1        mip 2
//!  slice 0  [ W x H    ] [ W/2 x H/2 ] [ W/4 x H/4 ]
//!  slice 1  [ W x H    ] [ W/2 x H/2 ] [ W/4 x H/4 ]
//!  ...
//! ```
//! Cells are stored slice-major in one `Vec`, sized exactly
//! `array_slices * mip_slices` when the buffer is allocated.

mod convert;

pub use convert::Channel;

use assetbake_core::{Error, Result};

/// Largest number of array slices or mip levels an image may address
pub const MAX_GRID_SLICES: usize = 16;

/// Numeric encoding of one channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelType {
    /// 8-bit unsigned normalized
    Unorm8,
    /// 16-bit half-float bit pattern (never decoded by this crate)
    Half16,
    /// 32-bit float
    Float32,
}

impl PixelType {
    /// Bytes used by a single channel
    pub fn bytes_per_channel(self) -> usize {
        match self {
            PixelType::Unorm8 => 1,
            PixelType::Half16 => 2,
            PixelType::Float32 => 4,
        }
    }

    /// Channel byte width as stored in the image header
    pub fn channel_bytes(self) -> u8 {
        match self {
            PixelType::Unorm8 => 1,
            PixelType::Half16 => 2,
            PixelType::Float32 => 4,
        }
    }

    /// Inverse of [`PixelType::channel_bytes`]
    pub fn from_channel_bytes(bytes: u8) -> Option<Self> {
        match bytes {
            1 => Some(PixelType::Unorm8),
            2 => Some(PixelType::Half16),
            4 => Some(PixelType::Float32),
            _ => None,
        }
    }
}

impl std::fmt::Display for PixelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PixelType::Unorm8 => "unorm8",
            PixelType::Half16 => "half16",
            PixelType::Float32 => "float32",
        };
        f.write_str(name)
    }
}

/// Block compression applied to every cell of an image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Compression {
    /// Raw pixels
    #[default]
    None = 0,
    /// Block Compressed 1 (DXT1)
    Bc1 = 1,
    /// Block Compressed 2 (DXT3)
    Bc2 = 2,
    /// Block Compressed 3 (DXT5)
    Bc3 = 3,
    /// Block Compressed 4 (single channel)
    Bc4 = 4,
    /// Block Compressed 5 (two channels)
    Bc5 = 5,
    /// Block Compressed 6 (HDR)
    Bc6h = 6,
    /// Block Compressed 7
    Bc7 = 7,
}

impl Compression {
    /// Tag value stored in the image header
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Parse a header tag
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Compression::None),
            1 => Some(Compression::Bc1),
            2 => Some(Compression::Bc2),
            3 => Some(Compression::Bc3),
            4 => Some(Compression::Bc4),
            5 => Some(Compression::Bc5),
            6 => Some(Compression::Bc6h),
            7 => Some(Compression::Bc7),
            _ => None,
        }
    }

    /// Bytes per 4x4 block, `None` for raw pixels
    pub fn block_bytes(self) -> Option<usize> {
        match self {
            Compression::None => None,
            Compression::Bc1 | Compression::Bc4 => Some(8),
            Compression::Bc2 | Compression::Bc3 | Compression::Bc5
            | Compression::Bc6h | Compression::Bc7 => Some(16),
        }
    }

    /// Check if cells hold block-compressed data
    pub fn is_compressed(self) -> bool {
        self != Compression::None
    }

    /// Parse a lowercase name such as `"bc1"` or `"none"`
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "none" | "raw" => Some(Compression::None),
            "bc1" | "dxt1" => Some(Compression::Bc1),
            "bc2" | "dxt3" => Some(Compression::Bc2),
            "bc3" | "dxt5" => Some(Compression::Bc3),
            "bc4" => Some(Compression::Bc4),
            "bc5" => Some(Compression::Bc5),
            "bc6h" => Some(Compression::Bc6h),
            "bc7" => Some(Compression::Bc7),
            _ => None,
        }
    }
}

impl std::fmt::Display for Compression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Compression::None => "none",
            Compression::Bc1 => "bc1",
            Compression::Bc2 => "bc2",
            Compression::Bc3 => "bc3",
            Compression::Bc4 => "bc4",
            Compression::Bc5 => "bc5",
            Compression::Bc6h => "bc6h",
            Compression::Bc7 => "bc7",
        };
        f.write_str(name)
    }
}

/// One (slice, mip) cell: dimensions plus the bytes it owns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MipCell {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl MipCell {
    /// Create a cell from already-sized data
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self { width, height, data }
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Recorded byte size
    pub fn byte_size(&self) -> usize {
        self.data.len()
    }

    /// Cell bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable cell bytes (length is fixed)
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Consume the cell and return its bytes
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

/// Pixel storage for one image across array slices and mip levels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBuffer {
    name: String,
    pixel_type: PixelType,
    components: u8,
    compression: Compression,
    array_slices: usize,
    mip_slices: usize,
    cells: Vec<MipCell>,
}

impl Default for ImageBuffer {
    fn default() -> Self {
        Self::new("")
    }
}

impl ImageBuffer {
    /// Create an empty, unallocated image
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pixel_type: PixelType::Unorm8,
            components: 4,
            compression: Compression::None,
            array_slices: 0,
            mip_slices: 0,
            cells: Vec::new(),
        }
    }

    /// Create and allocate in one step
    pub fn allocated(
        name: impl Into<String>,
        pixel_type: PixelType,
        base_width: u32,
        base_height: u32,
        components: u8,
        array_slices: usize,
        mip_slices: usize,
    ) -> Result<Self> {
        let mut image = Self::new(name);
        image.allocate(pixel_type, base_width, base_height, components, array_slices, mip_slices)?;
        Ok(image)
    }

    /// Assemble an image from cells produced elsewhere (codec, compressor).
    ///
    /// `cells` is slice-major. Every cell must carry exactly the byte size
    /// implied by its dimensions and the image format, and the dimensions
    /// must follow the halving chain of slice 0's base level.
    pub fn from_cells(
        name: impl Into<String>,
        pixel_type: PixelType,
        components: u8,
        compression: Compression,
        array_slices: usize,
        mip_slices: usize,
        cells: Vec<MipCell>,
    ) -> Result<Self> {
        check_components(components)?;
        check_grid(array_slices, mip_slices)?;
        let expected_cells = array_slices * mip_slices;
        if cells.len() != expected_cells {
            return Err(Error::invalid_data(format!(
                "expected {} cells for a {}x{} grid, got {}",
                expected_cells, array_slices, mip_slices, cells.len()
            )));
        }

        let image = Self {
            name: name.into(),
            pixel_type,
            components,
            compression,
            array_slices,
            mip_slices,
            cells,
        };
        image.validate()?;
        Ok(image)
    }

    /// Allocate a zeroed mip chain for every array slice.
    ///
    /// Each level halves the previous level's width and height (integer
    /// division). Asking for more levels than the base resolution supports
    /// is rejected before any memory is touched; the existing contents stay
    /// as they were in that case.
    pub fn allocate(
        &mut self,
        pixel_type: PixelType,
        base_width: u32,
        base_height: u32,
        components: u8,
        array_slices: usize,
        mip_slices: usize,
    ) -> Result<()> {
        check_components(components)?;
        check_grid(array_slices, mip_slices)?;
        if base_width == 0 || base_height == 0 {
            return Err(Error::invalid_data(format!(
                "base dimensions must be non-zero, got {}x{}",
                base_width, base_height
            )));
        }
        let max_levels = max_mip_levels(base_width, base_height);
        if mip_slices > max_levels {
            return Err(Error::invalid_data(format!(
                "{}x{} supports at most {} mip levels, {} requested",
                base_width, base_height, max_levels, mip_slices
            )));
        }

        let mut cells = Vec::with_capacity(array_slices * mip_slices);
        for _ in 0..array_slices {
            for level in 0..mip_slices {
                let (width, height) = mip_dimensions(base_width, base_height, level);
                let size = expected_cell_size(Compression::None, pixel_type, components, width, height)?;
                cells.push(MipCell::new(width, height, vec![0u8; size]));
            }
        }

        self.pixel_type = pixel_type;
        self.components = components;
        self.compression = Compression::None;
        self.array_slices = array_slices;
        self.mip_slices = mip_slices;
        self.cells = cells;
        Ok(())
    }

    /// Release every cell. Safe to call repeatedly.
    pub fn deallocate(&mut self) {
        self.cells = Vec::new();
        self.array_slices = 0;
        self.mip_slices = 0;
    }

    /// Check if the grid holds any cells
    pub fn is_allocated(&self) -> bool {
        !self.cells.is_empty()
    }

    /// Image name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the image
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Channel encoding
    pub fn pixel_type(&self) -> PixelType {
        self.pixel_type
    }

    /// Channels per pixel (1-4)
    pub fn components(&self) -> u8 {
        self.components
    }

    /// Block compression tag
    pub fn compression(&self) -> Compression {
        self.compression
    }

    /// Number of array slices
    pub fn array_slices(&self) -> usize {
        self.array_slices
    }

    /// Number of mip levels per slice
    pub fn mip_slices(&self) -> usize {
        self.mip_slices
    }

    /// Dimensions of one cell
    pub fn dimensions(&self, slice: usize, mip: usize) -> Result<(u32, u32)> {
        let cell = self.cell(slice, mip)?;
        Ok((cell.width, cell.height))
    }

    /// Base (slice 0, mip 0) dimensions, `(0, 0)` when unallocated
    pub fn base_dimensions(&self) -> (u32, u32) {
        self.cells
            .first()
            .map(|cell| (cell.width, cell.height))
            .unwrap_or((0, 0))
    }

    /// Byte size of a cell computed from the current fields.
    ///
    /// This is recomputed on every call; [`ImageBuffer::validate`] reports
    /// any cell whose stored length disagrees with it.
    pub fn size(&self, slice: usize, mip: usize) -> Result<usize> {
        let cell = self.cell(slice, mip)?;
        expected_cell_size(self.compression, self.pixel_type, self.components, cell.width, cell.height)
    }

    /// Access a cell
    pub fn cell(&self, slice: usize, mip: usize) -> Result<&MipCell> {
        let index = self.cell_index(slice, mip)?;
        Ok(&self.cells[index])
    }

    /// Mutable access to a cell
    pub fn cell_mut(&mut self, slice: usize, mip: usize) -> Result<&mut MipCell> {
        let index = self.cell_index(slice, mip)?;
        Ok(&mut self.cells[index])
    }

    /// Iterate `(slice, mip, cell)` in storage order
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, &MipCell)> {
        let mips = self.mip_slices.max(1);
        self.cells
            .iter()
            .enumerate()
            .map(move |(index, cell)| (index / mips, index % mips, cell))
    }

    /// Swap in a new cell wholesale. The new cell must keep the dimensions
    /// and byte size the grid expects at that position.
    pub fn replace_cell(&mut self, slice: usize, mip: usize, cell: MipCell) -> Result<()> {
        let index = self.cell_index(slice, mip)?;
        let current = &self.cells[index];
        if (cell.width, cell.height) != (current.width, current.height) {
            return Err(Error::invalid_data(format!(
                "replacement cell is {}x{}, slot ({}, {}) is {}x{}",
                cell.width, cell.height, slice, mip, current.width, current.height
            )));
        }
        let expected = self.size(slice, mip)?;
        if cell.data.len() != expected {
            return Err(Error::size_mismatch(
                format!("cell ({}, {})", slice, mip),
                cell.data.len() as u64,
                expected as u64,
            ));
        }
        self.cells[index] = cell;
        Ok(())
    }

    /// Sum of all cell sizes
    pub fn total_bytes(&self) -> usize {
        self.cells.iter().map(MipCell::byte_size).sum()
    }

    /// Check every cell's dimensions and byte size against the image format
    pub fn validate(&self) -> Result<()> {
        if self.cells.len() != self.array_slices * self.mip_slices {
            return Err(Error::invalid_data(format!(
                "grid declares {}x{} cells but holds {}",
                self.array_slices, self.mip_slices, self.cells.len()
            )));
        }
        let (base_width, base_height) = self.base_dimensions();
        for (slice, mip, cell) in self.cells() {
            let (width, height) = mip_dimensions(base_width, base_height, mip);
            if (cell.width, cell.height) != (width, height) || width == 0 || height == 0 {
                return Err(Error::invalid_data(format!(
                    "cell ({}, {}) is {}x{}, mip chain expects {}x{}",
                    slice, mip, cell.width, cell.height, width, height
                )));
            }
            let expected = expected_cell_size(self.compression, self.pixel_type, self.components, width, height)?;
            if cell.data.len() != expected {
                return Err(Error::size_mismatch(
                    format!("cell ({}, {})", slice, mip),
                    cell.data.len() as u64,
                    expected as u64,
                ));
            }
        }
        Ok(())
    }

    fn cell_index(&self, slice: usize, mip: usize) -> Result<usize> {
        if slice >= self.array_slices || mip >= self.mip_slices {
            return Err(Error::CellOutOfRange {
                slice,
                mip,
                array_slices: self.array_slices,
                mip_slices: self.mip_slices,
            });
        }
        Ok(slice * self.mip_slices + mip)
    }
}

/// Dimensions of a mip level, halving per level without flooring at 1
pub fn mip_dimensions(base_width: u32, base_height: u32, level: usize) -> (u32, u32) {
    let shift = u32::try_from(level).unwrap_or(u32::MAX);
    (
        base_width.checked_shr(shift).unwrap_or(0),
        base_height.checked_shr(shift).unwrap_or(0),
    )
}

/// Number of levels before either dimension would reach zero
pub fn max_mip_levels(base_width: u32, base_height: u32) -> usize {
    let smallest = base_width.min(base_height);
    if smallest == 0 {
        0
    } else {
        (u32::BITS - smallest.leading_zeros()) as usize
    }
}

/// Byte size a cell of the given format and dimensions must have
pub fn expected_cell_size(
    compression: Compression,
    pixel_type: PixelType,
    components: u8,
    width: u32,
    height: u32,
) -> Result<usize> {
    let size = match compression.block_bytes() {
        None => (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(components as usize))
            .and_then(|channels| channels.checked_mul(pixel_type.bytes_per_channel())),
        Some(block) => (width as usize)
            .div_ceil(4)
            .checked_mul((height as usize).div_ceil(4))
            .and_then(|blocks| blocks.checked_mul(block)),
    };
    size.ok_or_else(|| Error::invalid_data(format!("{}x{} cell size overflows", width, height)))
}

/// Reject grids that are empty or exceed [`MAX_GRID_SLICES`] on either axis
pub fn check_grid(array_slices: usize, mip_slices: usize) -> Result<()> {
    if array_slices == 0 || mip_slices == 0 {
        return Err(Error::invalid_data(format!(
            "image grid must be at least 1x1, got {}x{}",
            array_slices, mip_slices
        )));
    }
    if array_slices > MAX_GRID_SLICES || mip_slices > MAX_GRID_SLICES {
        return Err(Error::invalid_data(format!(
            "image grid is limited to {max}x{max}, got {}x{}",
            array_slices,
            mip_slices,
            max = MAX_GRID_SLICES
        )));
    }
    Ok(())
}

fn check_components(components: u8) -> Result<()> {
    if (1..=4).contains(&components) {
        Ok(())
    } else {
        Err(Error::invalid_data(format!(
            "component count must be 1-4, got {}",
            components
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mip_chain_sizes() {
        let image = ImageBuffer::allocated("chain", PixelType::Unorm8, 256, 256, 4, 1, 4).unwrap();

        let dims: Vec<_> = (0..4)
            .map(|mip| {
                let cell = image.cell(0, mip).unwrap();
                (cell.width(), cell.height())
            })
            .collect();
        assert_eq!(dims, vec![(256, 256), (128, 128), (64, 64), (32, 32)]);
        assert_eq!(image.size(0, 3).unwrap(), 32 * 32 * 4);
    }

    #[test]
    fn test_size_matches_allocation() {
        let image = ImageBuffer::allocated("f", PixelType::Float32, 64, 32, 3, 6, 3).unwrap();
        for (slice, mip, cell) in image.cells() {
            assert_eq!(image.size(slice, mip).unwrap(), cell.byte_size());
        }
        assert_eq!(image.size(0, 0).unwrap(), 64 * 32 * 3 * 4);
        assert!(image.validate().is_ok());
    }

    #[test]
    fn test_too_many_mips_rejected() {
        let mut image = ImageBuffer::allocated("small", PixelType::Unorm8, 4, 4, 1, 1, 1).unwrap();
        // 4x4 supports 3 levels: 4, 2, 1
        let err = image.allocate(PixelType::Unorm8, 4, 4, 1, 1, 4).unwrap_err();
        assert!(matches!(err, Error::InvalidData { .. }));
        // Previous allocation untouched
        assert_eq!(image.mip_slices(), 1);
        assert!(image.allocate(PixelType::Unorm8, 4, 4, 1, 1, 3).is_ok());
    }

    #[test]
    fn test_non_square_chain_limited_by_short_side() {
        assert_eq!(max_mip_levels(256, 4), 3);
        assert_eq!(max_mip_levels(1, 1), 1);
        assert_eq!(mip_dimensions(256, 4, 2), (64, 1));
    }

    #[test]
    fn test_grid_bound() {
        let image = ImageBuffer::allocated("wide", PixelType::Unorm8, 1, 1, 1, 16, 1).unwrap();
        assert_eq!(image.array_slices(), 16);
        assert!(check_grid(16, 16).is_ok());

        let err = ImageBuffer::allocated("p", PixelType::Unorm8, 1, 1, 1, 17, 1).unwrap_err();
        assert!(matches!(err, Error::InvalidData { .. }));
        let err = ImageBuffer::allocated("p", PixelType::Unorm8, 1 << 16, 1 << 16, 1, 1, 17).unwrap_err();
        assert!(matches!(err, Error::InvalidData { .. }));
        // Huge slice counts fail cleanly instead of overflowing the cell count
        let err = ImageBuffer::allocated("p", PixelType::Unorm8, 4, 4, 1, usize::MAX / 2, 3).unwrap_err();
        assert!(matches!(err, Error::InvalidData { .. }));
    }

    #[test]
    fn test_from_cells_grid_bound() {
        let cells = vec![MipCell::new(1, 1, vec![0]); 16];
        assert!(ImageBuffer::from_cells("ok", PixelType::Unorm8, 1, Compression::None, 16, 1, cells).is_ok());

        let cells = vec![MipCell::new(1, 1, vec![0]); 17];
        let err = ImageBuffer::from_cells("big", PixelType::Unorm8, 1, Compression::None, 17, 1, cells).unwrap_err();
        assert!(matches!(err, Error::InvalidData { .. }));
    }

    #[test]
    fn test_deallocate_idempotent() {
        let mut image = ImageBuffer::allocated("d", PixelType::Half16, 8, 8, 2, 2, 2).unwrap();
        image.deallocate();
        image.deallocate();

        assert!(!image.is_allocated());
        assert_eq!(image.total_bytes(), 0);
        assert!(matches!(image.cell(0, 0), Err(Error::CellOutOfRange { .. })));
    }

    #[test]
    fn test_cell_out_of_range() {
        let image = ImageBuffer::allocated("r", PixelType::Unorm8, 8, 8, 4, 2, 2).unwrap();
        assert!(image.cell(1, 1).is_ok());
        assert!(image.cell(2, 0).is_err());
        assert!(image.cell(0, 2).is_err());
    }

    #[test]
    fn test_compressed_cell_size() {
        assert_eq!(expected_cell_size(Compression::Bc1, PixelType::Unorm8, 4, 64, 64).unwrap(), 16 * 16 * 8);
        assert_eq!(expected_cell_size(Compression::Bc3, PixelType::Unorm8, 4, 30, 30).unwrap(), 8 * 8 * 16);
        // Sub-block mips still occupy a whole block
        assert_eq!(expected_cell_size(Compression::Bc4, PixelType::Unorm8, 1, 1, 1).unwrap(), 8);
    }

    #[test]
    fn test_from_cells_rejects_wrong_size() {
        let cells = vec![MipCell::new(2, 2, vec![0; 15])];
        let err = ImageBuffer::from_cells("bad", PixelType::Unorm8, 4, Compression::None, 1, 1, cells).unwrap_err();
        assert!(err.is_size_mismatch());
    }

    #[test]
    fn test_from_cells_rejects_broken_chain() {
        let cells = vec![
            MipCell::new(4, 4, vec![0; 16]),
            MipCell::new(3, 2, vec![0; 6]),
        ];
        let result = ImageBuffer::from_cells("chain", PixelType::Unorm8, 1, Compression::None, 1, 2, cells);
        assert!(result.is_err());
    }

    #[test]
    fn test_replace_cell() {
        let mut image = ImageBuffer::allocated("x", PixelType::Unorm8, 2, 2, 1, 1, 1).unwrap();
        image.replace_cell(0, 0, MipCell::new(2, 2, vec![9; 4])).unwrap();
        assert_eq!(image.cell(0, 0).unwrap().data(), &[9, 9, 9, 9]);
        assert!(image.replace_cell(0, 0, MipCell::new(2, 2, vec![9; 3])).is_err());
    }

    #[test]
    fn test_compression_tags() {
        for tag in 0..=7 {
            let compression = Compression::from_tag(tag).unwrap();
            assert_eq!(compression.tag(), tag);
        }
        assert!(Compression::from_tag(8).is_none());
        assert_eq!(Compression::from_name("DXT5"), Some(Compression::Bc3));
    }
}
