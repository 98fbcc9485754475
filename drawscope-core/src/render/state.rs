//! Mirror of the hooked renderer's surfaces, vertex buffers and programs.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::error::DecodeError;
use crate::message::{TextureData, VertexAttribPointer};
use crate::pixels::RawImage;
use crate::render::transform::Transform;
use crate::render::vertex::VertexView;

/// Dimensions of the surface sprites and GUI elements are packed into.
pub const TILE_SURFACE_SIZE: u16 = 4096;

/// Heights that mark a surface as holding rendered glyphs.
pub const GLYPH_SURFACE_HEIGHTS: [u16; 2] = [16, 68];

/// Glyph surface height whose uploads are rendered at a larger scale.
pub const LARGE_GLYPH_SURFACE_HEIGHT: u16 = 68;

pub const MINIMAP_WIDTH: u16 = 480;
pub const MINIMAP_HEIGHT: u16 = 352;

// ── Surfaces ─────────────────────────────────────────────────────

/// What a surface is used for, derived from its exact dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceRole {
    Tile,
    Glyph,
    MiniMap,
    Other,
}

impl SurfaceRole {
    pub fn of(width: u16, height: u16) -> Self {
        if width == TILE_SURFACE_SIZE && height == TILE_SURFACE_SIZE {
            SurfaceRole::Tile
        } else if width == MINIMAP_WIDTH && height == MINIMAP_HEIGHT {
            SurfaceRole::MiniMap
        } else if GLYPH_SURFACE_HEIGHTS.contains(&height) {
            SurfaceRole::Glyph
        } else {
            SurfaceRole::Other
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Texture {
    pub width: u16,
    pub height: u16,
    pub role: SurfaceRole,
}

// ── Vertex buffers ───────────────────────────────────────────────

/// Vertex record layout, selected by the stride of attribute 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexLayout {
    /// Separate tightly packed position and tex-coord arrays, no z-order.
    TexturedUnordered,
    /// `{x, y: f32, rgba: [u8; 4]}`
    Colored,
    /// `{x, y, tex_x, tex_y: f32}`
    Textured,
    /// Text shader vertices; stored but never classified.
    Text,
}

impl VertexLayout {
    pub fn from_stride(stride: u16) -> Option<Self> {
        match stride {
            0 => Some(VertexLayout::TexturedUnordered),
            12 => Some(VertexLayout::Colored),
            16 => Some(VertexLayout::Textured),
            20 => Some(VertexLayout::Text),
            _ => None,
        }
    }

    /// Byte size of one record.
    pub fn stride(self) -> usize {
        match self {
            VertexLayout::TexturedUnordered => 8,
            VertexLayout::Colored => 12,
            VertexLayout::Textured => 16,
            VertexLayout::Text => 20,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttribBinding {
    pub stride: u16,
    pub offset: u32,
}

#[derive(Debug, Default)]
pub struct VertexBuffer {
    pub(crate) data: Vec<u8>,
    pub(crate) layout: Option<VertexLayout>,
    pub(crate) attribs: BTreeMap<u8, AttribBinding>,
}

impl VertexBuffer {
    /// Overwrite the payload, reallocating only when the length changes.
    pub fn write(&mut self, bytes: &[u8]) {
        if self.data.len() == bytes.len() {
            self.data.copy_from_slice(bytes);
        } else {
            self.data = bytes.to_vec();
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn layout(&self) -> Option<VertexLayout> {
        self.layout
    }

    pub fn attrib(&self, index: u8) -> Option<AttribBinding> {
        self.attribs.get(&index).copied()
    }
}

// ── Programs ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct ShaderProgram {
    /// Snapshot shared by every draw issued under this transform.
    pub transform: Arc<Transform>,
    pub uniforms: HashMap<u32, [f32; 4]>,
}

// ── RenderState ──────────────────────────────────────────────────

/// Everything the decoder knows about the renderer, indexed by id.
#[derive(Debug, Default)]
pub struct RenderState {
    textures: HashMap<u32, Texture>,
    buffers: HashMap<u32, VertexBuffer>,
    programs: HashMap<u32, ShaderProgram>,
    tile_surface: Option<u32>,
    /// Registered minimap surfaces and their latest upload.
    minimaps: HashMap<u32, Option<Arc<RawImage>>>,
    unshaded_view: Option<u32>,
}

impl RenderState {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Surfaces ─────────────────────────────────────────────────

    /// (Re)define a surface and derive its role.
    pub fn allocate(&mut self, data: &TextureData) -> SurfaceRole {
        let role = SurfaceRole::of(data.width, data.height);
        self.textures.insert(
            data.surface,
            Texture {
                width: data.width,
                height: data.height,
                role,
            },
        );

        if role == SurfaceRole::MiniMap {
            self.minimaps.insert(data.surface, None);
        } else {
            self.minimaps.remove(&data.surface);
        }

        if role == SurfaceRole::Tile {
            self.tile_surface = Some(data.surface);
        } else if self.tile_surface == Some(data.surface) {
            self.tile_surface = None;
        }
        role
    }

    pub fn texture(&self, surface: u32) -> Option<&Texture> {
        self.textures.get(&surface)
    }

    pub fn tile_surface(&self) -> Option<u32> {
        self.tile_surface
    }

    pub fn is_tile_surface(&self, surface: u32) -> bool {
        self.tile_surface == Some(surface)
    }

    pub fn is_glyph_surface(&self, surface: u32) -> bool {
        self.textures
            .get(&surface)
            .is_some_and(|t| t.role == SurfaceRole::Glyph)
    }

    pub fn is_minimap_surface(&self, surface: u32) -> bool {
        self.minimaps.contains_key(&surface)
    }

    /// Replace the stored pixels of a registered minimap surface.
    pub fn store_minimap(&mut self, surface: u32, image: RawImage) -> bool {
        match self.minimaps.get_mut(&surface) {
            Some(slot) => {
                *slot = Some(Arc::new(image));
                true
            }
            None => false,
        }
    }

    pub fn minimap_pixels(&self, surface: u32) -> Option<Arc<RawImage>> {
        self.minimaps.get(&surface).cloned().flatten()
    }

    pub fn unshaded_view(&self) -> Option<u32> {
        self.unshaded_view
    }

    pub fn set_unshaded_view(&mut self, surface: u32) {
        self.unshaded_view = Some(surface);
    }

    // ── Vertex buffers ───────────────────────────────────────────

    pub fn write_buffer(&mut self, buffer: u32, bytes: &[u8]) {
        self.buffers.entry(buffer).or_default().write(bytes);
    }

    /// Record an attribute binding; attribute 0 selects the layout.
    pub fn bind_attrib(&mut self, attrib: &VertexAttribPointer) -> Result<(), DecodeError> {
        let buffer = self.buffers.entry(attrib.buffer).or_default();
        buffer.attribs.insert(
            attrib.index,
            AttribBinding {
                stride: attrib.stride,
                offset: attrib.offset,
            },
        );
        if attrib.index == 0 {
            let layout =
                VertexLayout::from_stride(attrib.stride).ok_or(DecodeError::UnknownStride {
                    buffer: attrib.buffer,
                    stride: attrib.stride,
                })?;
            buffer.layout = Some(layout);
        }
        Ok(())
    }

    pub fn buffer(&self, buffer: u32) -> Option<&VertexBuffer> {
        self.buffers.get(&buffer)
    }

    /// Bounds-checked reader over a buffer.
    pub fn vertices(&self, buffer: u32) -> Option<VertexView<'_>> {
        self.buffers.get(&buffer).map(|b| VertexView::new(buffer, b))
    }

    // ── Programs ─────────────────────────────────────────────────

    pub fn set_transform(&mut self, program: u32, matrix: [f32; 16]) {
        self.programs.entry(program).or_default().transform = Arc::new(Transform(matrix));
    }

    pub fn set_uniform(&mut self, program: u32, slot: u32, values: [f32; 4]) {
        self.programs
            .entry(program)
            .or_default()
            .uniforms
            .insert(slot, values);
    }

    /// The program's state; unknown programs read as identity/no uniforms.
    pub fn program(&self, program: u32) -> ShaderProgram {
        self.programs.get(&program).cloned().unwrap_or_default()
    }
}
