//! End-to-end decoding of synthetic capture cycles: surface allocation,
//! pixel recognition, draw classification and framing errors.

use std::sync::Arc;

use drawscope_core::cache::{
    CombatSquareKind, NumberKind, SpriteObjectPairing, TileContent, TileNumber,
};
use drawscope_core::frame::{Color, Point};
use drawscope_core::message::{
    DrawCall, FileIoKind, PixelData, Primitive, TextureData, VertexAttribPointer,
};
use drawscope_core::recognition::{GlyphSample, ObjectInfo, ObjectKind};
use drawscope_core::{
    AttribFlags, CycleBuilder, DecodeError, DecoderConfig, DepthFlags, FrameDecoder, Message,
    PixelFormat, RecognitionDb,
};

const TILES: u32 = 1;
const GLYPHS: u32 = 2;
const MINIMAP: u32 = 3;
const VIEW: u32 = 5;
const BUFFER: u32 = 10;

// ── Helpers ──────────────────────────────────────────────────────

fn decoder(db: RecognitionDb) -> FrameDecoder {
    FrameDecoder::new(Arc::new(db), DecoderConfig::default())
}

fn allocate(b: &mut CycleBuilder, surface: u32, width: u16, height: u16) {
    b.push(&Message::TextureData(TextureData {
        surface,
        width,
        height,
    }));
}

#[allow(clippy::too_many_arguments)]
fn upload(b: &mut CycleBuilder, target: u32, x: u16, y: u16, w: u16, h: u16, format: PixelFormat, pixels: &[u8]) {
    b.push(&Message::PixelData {
        header: PixelData {
            target,
            x,
            y,
            width: w,
            height: h,
            format,
        },
        pixels,
    });
}

/// Vertices `{x, y, tex_x, tex_y}`, then u16 indices, then one order per vertex.
struct Mesh {
    data: Vec<u8>,
    index_offset: u32,
    order_offset: u32,
}

fn textured_mesh(vertices: &[[f32; 4]], indices: &[u16], orders: &[f32]) -> Mesh {
    let mut data: Vec<u8> = vertices.iter().flatten().flat_map(|v| v.to_le_bytes()).collect();
    let index_offset = data.len() as u32;
    data.extend(indices.iter().flat_map(|i| i.to_le_bytes()));
    let order_offset = data.len() as u32;
    data.extend(orders.iter().flat_map(|o| o.to_le_bytes()));
    Mesh {
        data,
        index_offset,
        order_offset,
    }
}

fn colored_mesh(vertices: &[(f32, f32, [u8; 4])], indices: &[u16]) -> Mesh {
    let mut data = Vec::new();
    for (x, y, rgba) in vertices {
        data.extend(x.to_le_bytes());
        data.extend(y.to_le_bytes());
        data.extend(rgba);
    }
    let index_offset = data.len() as u32;
    data.extend(indices.iter().flat_map(|i| i.to_le_bytes()));
    Mesh {
        order_offset: data.len() as u32,
        data,
        index_offset,
    }
}

fn bind_mesh(b: &mut CycleBuilder, mesh: &Mesh, stride: u16) {
    b.push(&Message::VertexBufferWrite {
        buffer: BUFFER,
        data: &mesh.data,
    });
    b.push(&Message::VertexAttribPointer(VertexAttribPointer {
        buffer: BUFFER,
        index: 0,
        stride,
        offset: 0,
    }));
    b.push(&Message::VertexAttribPointer(VertexAttribPointer {
        buffer: BUFFER,
        index: 2,
        stride: 4,
        offset: mesh.order_offset,
    }));
}

fn draw(b: &mut CycleBuilder, mesh: &Mesh, source: u32, target: u32, primitive: Primitive, index_count: u32) {
    b.push(&Message::DrawCall(DrawCall {
        buffer: BUFFER,
        source,
        target,
        program: 0,
        primitive,
        index_count,
        index_offset: mesh.index_offset,
        attribs: AttribFlags::POSITION | AttribFlags::TEX_COORD | AttribFlags::ORDER,
        depth: DepthFlags::TEST | DepthFlags::WRITE,
        blend_color: [200, 100, 50, 255],
    }));
}

/// Quad `(x0, y0)-(x1, y1)` sampling texels `(u0, v0)-(u1, v1)`, as two triangles.
fn quad(x0: f32, y0: f32, x1: f32, y1: f32, uv: [f32; 4]) -> Mesh {
    let [u0, v0, u1, v1] = uv;
    textured_mesh(
        &[
            [x0, y0, u0, v0],
            [x1, y0, u1, v0],
            [x1, y1, u1, v1],
            [x0, y1, u0, v1],
        ],
        &[0, 1, 2, 0, 2, 3],
        &[0.25, 0.25, 0.25, 0.25],
    )
}

/// Texel rectangle of the tile surface in normalized coordinates.
fn tile_uv(x: u16, y: u16, w: u16, h: u16) -> [f32; 4] {
    let n = |v: u16| v as f32 / 4096.0;
    [n(x), n(y), n(x + w), n(y + h)]
}

/// 9×10 digit bitmaps with a blank first and last column.
fn digit_rows(c: char) -> [&'static str; 10] {
    match c {
        '4' => [
            ".........", ".#....#..", ".#....#..", ".#....#..", ".######..",
            "......#..", "......#..", "......#..", "......#..", ".........",
        ],
        '2' => [
            ".........", ".######..", "......#..", "......#..", ".######..",
            ".#.......", ".#.......", ".#.......", ".######..", ".........",
        ],
        _ => [
            ".........", ".######..", ".#....#..", ".#....#..", ".#....#..",
            ".#....#..", ".#....#..", ".#....#..", ".######..", ".........",
        ],
    }
}

fn digit_sample(c: char) -> GlyphSample {
    let pixels = digit_rows(c)
        .iter()
        .flat_map(|row| row.bytes().map(|b| if b == b'#' { 175 } else { 0 }))
        .collect();
    GlyphSample::new(c, 9, 10, pixels)
}

/// RGBA rendering of `digits`, neighbouring cells sharing a column.
fn render_number(digits: &str, color: [u8; 3]) -> (Vec<u8>, u16) {
    let width = digits.len() * 8 + 1;
    let mut pixels = vec![0u8; width * 10 * 4];
    for (i, c) in digits.chars().enumerate() {
        for (y, row) in digit_rows(c).iter().enumerate() {
            for (dx, b) in row.bytes().enumerate() {
                if b == b'#' {
                    let at = (y * width + i * 8 + dx) * 4;
                    pixels[at..at + 4].copy_from_slice(&[color[0], color[1], color[2], 255]);
                }
            }
        }
    }
    (pixels, width as u16)
}

const RED: [u8; 4] = [255, 0, 0, 255];
const BLUE: [u8; 4] = [0, 0, 255, 255];
const CLEAR: [u8; 4] = [0, 0, 0, 0];

// ── Recognition scenarios ────────────────────────────────────────

#[test]
fn blank_tile_produces_no_draws() {
    let mut b = CycleBuilder::new(800, 600);
    allocate(&mut b, TILES, 4096, 4096);
    upload(&mut b, TILES, 0, 0, 2, 2, PixelFormat::Rgba, &[CLEAR; 4].concat());
    let mesh = quad(10.0, 10.0, 12.0, 12.0, tile_uv(0, 0, 2, 2));
    bind_mesh(&mut b, &mesh, 16);
    draw(&mut b, &mesh, TILES, 0, Primitive::Triangles, 6);

    let mut decoder = decoder(RecognitionDb::new());
    let frame = decoder.decode_cycle(&b.finish()).unwrap();

    assert_eq!(frame.draw_count(), 0);
    assert!(frame.recognition_failures.is_empty());
    assert_eq!(
        decoder.cache().get(TILES, 0, 0).map(|t| &t.content),
        Some(&TileContent::Blank)
    );
}

#[test]
fn uploaded_glyph_is_drawn_as_text() {
    let shape = vec![255, 0, 255, 0, 255, 0, 255, 0, 255];
    let mut db = RecognitionDb::new();
    db.glyphs.add(10, GlyphSample::new('X', 3, 3, shape.clone()));
    db.glyphs.add(10, GlyphSample::new('O', 3, 3, vec![255, 255, 255, 255, 0, 255, 255, 255, 255]));

    let mut b = CycleBuilder::new(800, 600);
    allocate(&mut b, GLYPHS, 512, 16);
    upload(&mut b, GLYPHS, 5, 0, 3, 3, PixelFormat::Alpha, &shape);
    let mesh = quad(100.0, 50.0, 103.0, 53.0, [5.0, 0.0, 8.0, 3.0]);
    bind_mesh(&mut b, &mesh, 16);
    draw(&mut b, &mesh, GLYPHS, 0, Primitive::Triangles, 6);

    let mut decoder = decoder(db);
    let frame = decoder.decode_cycle(&b.finish()).unwrap();

    assert_eq!(frame.text(), "X");
    let text = &frame.text_draws[0];
    assert_eq!(text.color, Color::new(200, 100, 50, 255));
    assert!(!text.is_outlined);
    assert_eq!(text.info.order, Some(0.25));
    assert_eq!(text.info.draw_call_id, 0);
    assert_eq!(text.rect.top_left, Point { x: 100.0, y: 50.0 });
}

#[test]
fn outline_uniforms_color_the_text() {
    let shape = vec![255, 0, 255, 0, 255, 0, 255, 0, 255];
    let mut db = RecognitionDb::new();
    db.glyphs.add(10, GlyphSample::new('X', 3, 3, shape.clone()));

    let mut b = CycleBuilder::new(800, 600);
    allocate(&mut b, GLYPHS, 512, 16);
    upload(&mut b, GLYPHS, 0, 0, 3, 3, PixelFormat::Alpha, &shape);
    b.push(&Message::Uniform4f(drawscope_core::message::Uniform4f {
        program: 0,
        slot: 1,
        values: [0.0, 1.0, 0.0, 1.0],
    }));
    b.push(&Message::Uniform4f(drawscope_core::message::Uniform4f {
        program: 0,
        slot: 3,
        values: [1.0, 0.0, 0.0, 0.0],
    }));
    let mesh = quad(0.0, 0.0, 3.0, 3.0, [0.0, 0.0, 3.0, 3.0]);
    bind_mesh(&mut b, &mesh, 16);
    draw(&mut b, &mesh, GLYPHS, 0, Primitive::Triangles, 6);

    let frame = decoder(db).decode_cycle(&b.finish()).unwrap();
    let text = &frame.text_draws[0];
    assert!(text.is_outlined);
    assert_eq!(text.color, Color::new(0, 255, 0, 255));
}

#[test]
fn red_number_is_physical_damage() {
    let mut db = RecognitionDb::new();
    for c in ['0', '2', '4'] {
        db.glyphs.add(10, digit_sample(c));
    }
    let (pixels, width) = render_number("42", [255, 0, 0]);

    let mut b = CycleBuilder::new(800, 600);
    allocate(&mut b, TILES, 4096, 4096);
    upload(&mut b, TILES, 100, 0, width, 10, PixelFormat::Rgba, &pixels);
    let mesh = quad(300.0, 200.0, 317.0, 210.0, tile_uv(100, 0, width, 10));
    bind_mesh(&mut b, &mesh, 16);
    draw(&mut b, &mesh, TILES, 0, Primitive::Triangles, 6);

    let mut decoder = decoder(db);
    let frame = decoder.decode_cycle(&b.finish()).unwrap();

    let expected = TileNumber {
        value: 42,
        kind: NumberKind::PhysicalDamage,
    };
    assert_eq!(
        decoder.cache().get(TILES, 100, 0).map(|t| &t.content),
        Some(&TileContent::Number(expected))
    );
    assert_eq!(frame.number_draws.len(), 1);
    assert_eq!(frame.number_draws[0].number, expected);
}

#[test]
fn unrecognized_region_is_reported_and_evicted() {
    let dir = tempfile::tempdir().unwrap();
    let config = DecoderConfig {
        failure_dump_dir: Some(dir.path().to_path_buf()),
    };
    let mut decoder = FrameDecoder::new(Arc::new(RecognitionDb::new()), config);

    let mut b = CycleBuilder::new(800, 600);
    allocate(&mut b, TILES, 4096, 4096);
    upload(&mut b, TILES, 0, 0, 2, 2, PixelFormat::Rgba, &[CLEAR; 4].concat());
    upload(&mut b, TILES, 0, 0, 2, 2, PixelFormat::Rgba, &[RED; 4].concat());
    upload(&mut b, TILES, 50, 0, 1, 3, PixelFormat::Rgba, &[RED; 3].concat());
    let frame = decoder.decode_cycle(&b.finish()).unwrap();

    assert_eq!(frame.recognition_failures.len(), 1);
    let failure = &frame.recognition_failures[0];
    assert_eq!((failure.x, failure.y, failure.width, failure.height), (0, 0, 2, 2));
    assert!(failure.dump.as_ref().unwrap().exists());
    assert!(decoder.cache().get(TILES, 0, 0).is_none());
}

#[test]
fn sprites_and_view_are_classified() {
    let sprite = [RED, CLEAR, BLUE, RED].concat();
    let mut db = RecognitionDb::new();
    db.insert_image(5, &sprite, PixelFormat::Rgba);
    db.bind(5, 900, ObjectInfo::new(ObjectKind::Item));

    let mut b = CycleBuilder::new(800, 600);
    allocate(&mut b, TILES, 4096, 4096);
    upload(&mut b, TILES, 0, 0, 2, 2, PixelFormat::Rgba, &sprite);
    let uv = tile_uv(0, 0, 2, 2);
    let mesh = textured_mesh(
        &[
            [-1.0, -1.0, uv[0], uv[1]],
            [1.0, -1.0, uv[2], uv[1]],
            [1.0, 1.0, uv[2], uv[3]],
            [-1.0, 1.0, uv[0], uv[3]],
        ],
        &[0, 1, 3, 2, 2, 0],
        &[0.5; 4],
    );
    bind_mesh(&mut b, &mesh, 16);
    draw(&mut b, &mesh, TILES, VIEW, Primitive::TriangleStrip, 6);
    draw(&mut b, &mesh, VIEW, 0, Primitive::TriangleStrip, 4);

    let mut decoder = decoder(db);
    let frame = decoder.decode_cycle(&b.finish()).unwrap();

    assert_eq!(decoder.state().unshaded_view(), Some(VIEW));
    assert_eq!(frame.sprite_draws.len(), 1);
    assert_eq!(
        frame.sprite_draws[0].pairings,
        vec![SpriteObjectPairing {
            sprite_id: 5,
            objects: vec![900]
        }]
    );
    let view = frame.view.unwrap();
    assert_eq!(view.top_left, Point { x: 0.0, y: 0.0 });
    assert_eq!(view.bottom_right, Point { x: 800.0, y: 600.0 });
}

#[test]
fn unresolved_gui_tile_is_fatal() {
    let mut b = CycleBuilder::new(800, 600);
    allocate(&mut b, TILES, 4096, 4096);
    let mesh = quad(0.0, 0.0, 4.0, 4.0, tile_uv(64, 64, 4, 4));
    bind_mesh(&mut b, &mesh, 16);
    draw(&mut b, &mesh, TILES, 0, Primitive::Triangles, 6);

    let err = decoder(RecognitionDb::new())
        .decode_cycle(&b.finish())
        .unwrap_err();
    assert!(matches!(
        err,
        DecodeError::UnresolvedGuiTile {
            surface: TILES,
            x: 64,
            y: 64,
            ..
        }
    ));
}

/// A 2×2 tile-surface sprite at the origin and a screen quad sampling it.
const SPRITE: [[u8; 4]; 4] = [RED, CLEAR, BLUE, RED];

fn sprite_cycle(target: u32) -> CycleBuilder {
    let mut b = CycleBuilder::new(800, 600);
    allocate(&mut b, TILES, 4096, 4096);
    upload(&mut b, TILES, 0, 0, 2, 2, PixelFormat::Rgba, &SPRITE.concat());
    let mesh = quad(20.0, 30.0, 52.0, 62.0, tile_uv(0, 0, 2, 2));
    bind_mesh(&mut b, &mesh, 16);
    draw(&mut b, &mesh, TILES, target, Primitive::Triangles, 6);
    b
}

#[test]
fn resource_name_tile_becomes_gui_draw() {
    let mut db = RecognitionDb::new();
    let id = db.add_graphics_resource("inventory-slot");
    db.insert_image(id, &SPRITE.concat(), PixelFormat::Rgba);

    let frame = decoder(db).decode_cycle(&sprite_cycle(0).finish()).unwrap();
    assert_eq!(frame.gui_draws.len(), 1);
    let gui = &frame.gui_draws[0];
    assert_eq!(gui.name, "inventory-slot");
    assert_eq!(gui.rect.top_left, Point { x: 20.0, y: 30.0 });
    assert_eq!(gui.info.order, Some(0.25));
}

#[test]
fn combat_square_tile_is_drawn_in_the_world() {
    let mut db = RecognitionDb::new();
    let id = db.add_combat_square(CombatSquareKind::Red);
    db.insert_image(id, &SPRITE.concat(), PixelFormat::Rgba);

    let frame = decoder(db).decode_cycle(&sprite_cycle(VIEW).finish()).unwrap();
    assert_eq!(frame.combat_square_draws.len(), 1);
    assert_eq!(frame.combat_square_draws[0].kind, CombatSquareKind::Red);
    assert!(frame.sprite_draws.is_empty());
}

#[test]
fn combat_square_drawn_as_gui_is_unexpected() {
    let mut db = RecognitionDb::new();
    let id = db.add_combat_square(CombatSquareKind::Green);
    db.insert_image(id, &SPRITE.concat(), PixelFormat::Rgba);

    let err = decoder(db).decode_cycle(&sprite_cycle(0).finish()).unwrap_err();
    assert!(matches!(
        err,
        DecodeError::UnexpectedTile {
            found: "combat square",
            ..
        }
    ));
}

#[test]
fn ambiguous_sprite_upload_is_inconsistent() {
    let mut db = RecognitionDb::new();
    db.insert_image(5, &SPRITE.concat(), PixelFormat::Rgba);
    db.bind(5, 900, ObjectInfo::new(ObjectKind::Item));
    let id = db.add_graphics_resource("button");
    db.insert_image(id, &SPRITE.concat(), PixelFormat::Rgba);

    let mut b = CycleBuilder::new(800, 600);
    allocate(&mut b, TILES, 4096, 4096);
    upload(&mut b, TILES, 0, 0, 2, 2, PixelFormat::Rgba, &SPRITE.concat());

    let err = decoder(db).decode_cycle(&b.finish()).unwrap_err();
    assert!(matches!(err, DecodeError::Consistency(_)));
}

#[test]
fn reallocating_the_tile_surface_forgets_its_tiles() {
    let mut db = RecognitionDb::new();
    db.insert_image(5, &SPRITE.concat(), PixelFormat::Rgba);
    db.bind(5, 900, ObjectInfo::new(ObjectKind::Item));
    let mut decoder = decoder(db);

    let frame = decoder.decode_cycle(&sprite_cycle(0).finish()).unwrap();
    assert_eq!(frame.gui_sprite_draws.len(), 1);
    assert_eq!(decoder.cache().surface_len(TILES), 1);

    let mut b = CycleBuilder::new(800, 600);
    allocate(&mut b, TILES, 4096, 4096);
    let mesh = quad(20.0, 30.0, 52.0, 62.0, tile_uv(0, 0, 2, 2));
    bind_mesh(&mut b, &mesh, 16);
    draw(&mut b, &mesh, TILES, 0, Primitive::Triangles, 6);

    let err = decoder.decode_cycle(&b.finish()).unwrap_err();
    assert!(matches!(err, DecodeError::UnresolvedGuiTile { x: 0, y: 0, .. }));
    assert_eq!(decoder.cache().surface_len(TILES), 0);
}

#[test]
fn oversized_gui_texcoords_still_report_the_tile() {
    let mut b = CycleBuilder::new(800, 600);
    allocate(&mut b, TILES, 4096, 4096);
    upload(&mut b, TILES, 100, 100, 2, 2, PixelFormat::Rgba, &[CLEAR; 4].concat());
    let mesh = quad(0.0, 0.0, 4.0, 4.0, [0.0, 0.0, 1e6, 1e6]);
    bind_mesh(&mut b, &mesh, 16);
    draw(&mut b, &mesh, TILES, 0, Primitive::Triangles, 6);

    let err = decoder(RecognitionDb::new())
        .decode_cycle(&b.finish())
        .unwrap_err();
    match err {
        DecodeError::UnresolvedGuiTile { x, y, nearby, .. } => {
            assert_eq!((x, y), (0, 0));
            assert!(nearby.contains("100x100 2x2 (blank)"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn index_count_past_the_buffer_is_out_of_bounds() {
    let mut b = CycleBuilder::new(800, 600);
    allocate(&mut b, TILES, 4096, 4096);
    upload(&mut b, TILES, 0, 0, 2, 2, PixelFormat::Rgba, &[CLEAR; 4].concat());
    let mesh = quad(0.0, 0.0, 2.0, 2.0, tile_uv(0, 0, 2, 2));
    bind_mesh(&mut b, &mesh, 16);
    draw(&mut b, &mesh, TILES, 0, Primitive::Triangles, u32::MAX);

    let err = decoder(RecognitionDb::new())
        .decode_cycle(&b.finish())
        .unwrap_err();
    assert!(matches!(err, DecodeError::OutOfBounds { .. }));
}

#[test]
fn colored_strip_becomes_rectangles() {
    let mesh = colored_mesh(
        &[
            (0.0, 0.0, RED),
            (4.0, 0.0, RED),
            (0.0, 2.0, RED),
            (4.0, 2.0, RED),
            (10.0, 10.0, BLUE),
            (12.0, 10.0, BLUE),
            (10.0, 11.0, BLUE),
            (12.0, 11.0, BLUE),
        ],
        &[0, 1, 2, 3, 3, 4, 4, 5, 6, 7],
    );
    let mut b = CycleBuilder::new(800, 600);
    b.push(&Message::VertexBufferWrite {
        buffer: BUFFER,
        data: &mesh.data,
    });
    b.push(&Message::VertexAttribPointer(VertexAttribPointer {
        buffer: BUFFER,
        index: 0,
        stride: 12,
        offset: 0,
    }));
    b.push(&Message::DrawCall(DrawCall {
        buffer: BUFFER,
        source: 0,
        target: 0,
        program: 0,
        primitive: Primitive::TriangleStrip,
        index_count: 10,
        index_offset: mesh.index_offset,
        attribs: AttribFlags::POSITION,
        depth: DepthFlags::empty(),
        blend_color: [0; 4],
    }));

    let frame = decoder(RecognitionDb::new()).decode_cycle(&b.finish()).unwrap();
    assert_eq!(frame.rect_draws.len(), 2);
    let (first, second) = (&frame.rect_draws[0], &frame.rect_draws[1]);
    assert_eq!(first.color, Color::from(RED));
    assert_eq!(first.rect.bottom_right, Point { x: 4.0, y: 2.0 });
    assert_eq!(second.color, Color::from(BLUE));
    assert_eq!(second.rect.top_left, Point { x: 10.0, y: 10.0 });
    assert_eq!(second.info.order, None);
}

#[test]
fn minimap_draw_shares_latest_pixels() {
    let mut b = CycleBuilder::new(800, 600);
    allocate(&mut b, MINIMAP, 480, 352);
    upload(&mut b, MINIMAP, 0, 0, 1, 1, PixelFormat::Bgra, &[1, 2, 3, 255]);
    let mesh = textured_mesh(
        &[
            [-1.0, -1.0, 0.0, 0.0],
            [1.0, -1.0, 1.0, 0.0],
            [-1.0, 1.0, 0.0, 1.0],
            [1.0, 1.0, 1.0, 1.0],
        ],
        &[0, 1, 2, 3],
        &[0.0; 4],
    );
    bind_mesh(&mut b, &mesh, 16);
    draw(&mut b, &mesh, MINIMAP, 0, Primitive::TriangleStrip, 4);

    let frame = decoder(RecognitionDb::new()).decode_cycle(&b.finish()).unwrap();
    assert!(frame.has_minimap_moved);
    assert_eq!(frame.minimap_position, Some(Point { x: -1.0, y: -1.0 }));
    assert_eq!(
        frame.minimap_screen.unwrap().bottom_right,
        Point { x: 800.0, y: 600.0 }
    );
    let pixels = frame.minimap_draws[0].pixels.as_ref().unwrap();
    assert_eq!(pixels.pixels, vec![1, 2, 3, 255]);
}

#[test]
fn file_io_is_recorded() {
    let mut b = CycleBuilder::new(800, 600);
    b.push(&Message::FileIo {
        kind: FileIoKind::Read,
        path: b"maps/minimap.png",
    });
    let frame = decoder(RecognitionDb::new()).decode_cycle(&b.finish()).unwrap();
    assert_eq!(frame.file_io.len(), 1);
    assert_eq!(frame.file_io[0].kind, FileIoKind::Read);
    assert_eq!(frame.file_io[0].path, "maps/minimap.png");
}

#[test]
fn file_io_path_must_be_utf8() {
    let mut b = CycleBuilder::new(800, 600);
    b.push(&Message::FileIo {
        kind: FileIoKind::Write,
        path: &[b'd', b'a', 0xff, 0xfe],
    });
    let err = decoder(RecognitionDb::new()).decode_cycle(&b.finish()).unwrap_err();
    assert!(matches!(err, DecodeError::Encoding(_)));
}

// ── Framing and limits ───────────────────────────────────────────

#[test]
fn overflowing_counters_fail_before_decoding() {
    let mut b = CycleBuilder::new(800, 600);
    allocate(&mut b, TILES, 4096, 4096);
    b.with_counters(4097, 0);

    let mut decoder = decoder(RecognitionDb::new());
    let err = decoder.decode_cycle(&b.finish()).unwrap_err();
    assert!(matches!(
        err,
        DecodeError::CapacityExceeded {
            count: 4097,
            capacity: 4096,
            ..
        }
    ));
    assert!(decoder.state().texture(TILES).is_none());
}

#[test]
fn running_draw_count_is_checked_mid_cycle() {
    let mut b = CycleBuilder::new(800, 600);
    for _ in 0..=16384 {
        b.push(&Message::DrawCall(DrawCall {
            buffer: 99,
            source: 0,
            target: 0,
            program: 0,
            primitive: Primitive::Triangles,
            index_count: 6,
            index_offset: 0,
            attribs: AttribFlags::POSITION,
            depth: DepthFlags::empty(),
            blend_color: [0; 4],
        }));
    }
    b.with_counters(0, 0);

    let err = decoder(RecognitionDb::new()).decode_cycle(&b.finish()).unwrap_err();
    assert!(matches!(
        err,
        DecodeError::CapacityExceeded {
            what: "draw call",
            count: 16385,
            capacity: 16384,
        }
    ));
}

#[test]
fn extended_cycle_is_a_framing_error() {
    let mut b = CycleBuilder::new(800, 600);
    allocate(&mut b, TILES, 4096, 4096);
    let mut bytes = b.finish().to_vec();
    bytes.push(0);

    let err = decoder(RecognitionDb::new()).decode_cycle(&bytes).unwrap_err();
    assert!(matches!(err, DecodeError::Framing { context: "cycle", .. }));
}

#[test]
fn message_past_cycle_end_is_a_framing_error() {
    let mut b = CycleBuilder::new(800, 600);
    allocate(&mut b, TILES, 4096, 4096);
    let mut bytes = b.finish().to_vec();
    bytes.truncate(bytes.len() - 2);
    let len = bytes.len() as u32;
    bytes[..4].copy_from_slice(&len.to_le_bytes());

    let err = decoder(RecognitionDb::new()).decode_cycle(&bytes).unwrap_err();
    assert!(matches!(err, DecodeError::Framing { context: "cycle", .. }));
}

#[test]
fn segment_decodes_consecutive_cycles() {
    let mut first = CycleBuilder::new(800, 600);
    allocate(&mut first, TILES, 4096, 4096);
    let mut second = CycleBuilder::new(1024, 768);
    second.push(&Message::FileIo {
        kind: FileIoKind::Write,
        path: b"log.txt",
    });
    let mut segment = first.finish().to_vec();
    segment.extend_from_slice(&second.finish());

    let mut decoder = decoder(RecognitionDb::new());
    let frames = decoder.decode_segment(&segment).unwrap();
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[1].width, 1024);
    assert!(decoder.state().is_tile_surface(TILES));

    segment.truncate(segment.len() - 1);
    let err = decoder.decode_segment(&segment).unwrap_err();
    assert!(matches!(err, DecodeError::Framing { context: "segment", .. }));
}

#[test]
fn glyph_copy_into_non_glyph_surface_is_fatal() {
    let mut b = CycleBuilder::new(800, 600);
    allocate(&mut b, GLYPHS, 512, 16);
    allocate(&mut b, 7, 128, 128);
    b.push(&Message::CopyTexture(drawscope_core::message::CopyTexture {
        source: GLYPHS,
        target: 7,
        src_x: 0,
        src_y: 0,
        dst_x: 0,
        dst_y: 0,
        width: 8,
        height: 8,
    }));
    let err = decoder(RecognitionDb::new()).decode_cycle(&b.finish()).unwrap_err();
    assert!(matches!(err, DecodeError::ProtocolViolation(_)));
}

#[test]
fn glyph_copy_moves_cached_glyphs() {
    let shape = vec![255, 0, 255, 0, 255, 0, 255, 0, 255];
    let mut db = RecognitionDb::new();
    db.glyphs.add(10, GlyphSample::new('X', 3, 3, shape.clone()));

    let mut b = CycleBuilder::new(800, 600);
    allocate(&mut b, GLYPHS, 512, 16);
    allocate(&mut b, 8, 256, 16);
    upload(&mut b, GLYPHS, 4, 0, 3, 3, PixelFormat::Alpha, &shape);
    b.push(&Message::CopyTexture(drawscope_core::message::CopyTexture {
        source: GLYPHS,
        target: 8,
        src_x: 0,
        src_y: 0,
        dst_x: 20,
        dst_y: 2,
        width: 16,
        height: 8,
    }));

    let mut decoder = decoder(db);
    decoder.decode_cycle(&b.finish()).unwrap();
    assert_eq!(
        decoder.cache().get(8, 24, 2).map(|t| &t.content),
        Some(&TileContent::Glyph('X'))
    );
}

#[test]
fn glyph_fan_copies_between_glyph_surfaces() {
    let shape = vec![255, 0, 255, 0, 255, 0, 255, 0, 255];
    let mut db = RecognitionDb::new();
    db.glyphs.add(10, GlyphSample::new('X', 3, 3, shape.clone()));

    let mut b = CycleBuilder::new(800, 600);
    allocate(&mut b, GLYPHS, 512, 16);
    allocate(&mut b, 8, 256, 16);
    upload(&mut b, GLYPHS, 4, 0, 3, 3, PixelFormat::Alpha, &shape);
    // Texels 0..16 × 0..8 of the source land at (20, 2) of the target.
    let mesh = textured_mesh(
        &[
            [-0.84375, -0.75, 0.0, 0.0],
            [0.0, -0.75, 0.03125, 0.0],
            [0.0, 1.0, 0.03125, 0.5],
            [-0.84375, 1.0, 0.0, 0.5],
        ],
        &[0, 1, 2, 3],
        &[0.0; 4],
    );
    bind_mesh(&mut b, &mesh, 16);
    draw(&mut b, &mesh, GLYPHS, 8, Primitive::TriangleFan, 4);

    let mut decoder = decoder(db);
    let frame = decoder.decode_cycle(&b.finish()).unwrap();
    assert_eq!(frame.draw_count(), 0);
    assert_eq!(
        decoder.cache().get(8, 24, 2).map(|t| &t.content),
        Some(&TileContent::Glyph('X'))
    );
}
