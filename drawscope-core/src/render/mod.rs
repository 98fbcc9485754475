//! Virtual render state mirrored from the message stream.

pub mod state;
pub mod transform;
pub mod vertex;

pub use state::{
    AttribBinding, GLYPH_SURFACE_HEIGHTS, LARGE_GLYPH_SURFACE_HEIGHT, MINIMAP_HEIGHT,
    MINIMAP_WIDTH, RenderState, ShaderProgram, SurfaceRole, TILE_SURFACE_SIZE, Texture,
    VertexBuffer, VertexLayout,
};
pub use transform::Transform;
pub use vertex::{ColoredVertex, TexturedVertex, VertexView};
