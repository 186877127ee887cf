//! Render submission
//!
//! The world core never draws directly. It builds triangle lists of
//! `Vertex2D` and submits them through a `RenderContext`, which the binary
//! backs with macroquad (see `macroquad_backend`) and tests back with a
//! recorder.
//!
//! Vertex arrays are plain triangle lists: every three vertices form one
//! triangle. Meshes are indexed.

pub mod macroquad_backend;

pub use macroquad::color::Color;

use crate::math::{direction_from_degrees, Core, Pillbox2, Vec2};

/// Segments used for full discs and rings.
pub const DISC_SIDES: usize = 24;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex2D {
    pub position: Vec2,
    pub color: Color,
}

impl Vertex2D {
    pub fn new(position: Vec2, color: Color) -> Self {
        Self { position, color }
    }
}

/// Indexed triangle mesh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh2D {
    pub vertices: Vec<Vertex2D>,
    pub indices: Vec<u32>,
}

impl Mesh2D {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// What the world needs from a renderer.
pub trait RenderContext {
    /// Select the material for subsequent draws.
    fn bind_material(&mut self, material: &str);
    /// Draw a triangle list.
    fn draw_vertex_array(&mut self, vertices: &[Vertex2D]);
    /// Draw an indexed mesh.
    fn draw_mesh(&mut self, mesh: &Mesh2D);
}

// =============================================================================
// Vertex builders
// =============================================================================

fn push_quad(verts: &mut Vec<Vertex2D>, corners: [Vec2; 4], color: Color) {
    let [bl, br, tr, tl] = corners;
    for p in [bl, br, tr, bl, tr, tl] {
        verts.push(Vertex2D::new(p, color));
    }
}

/// Filled disc as a triangle fan.
pub fn add_verts_for_disc(verts: &mut Vec<Vertex2D>, center: Vec2, radius: f32, color: Color, sides: usize) {
    let sides = sides.max(3);
    let step = 360.0 / sides as f32;
    for i in 0..sides {
        let a = center + direction_from_degrees(step * i as f32) * radius;
        let b = center + direction_from_degrees(step * (i + 1) as f32) * radius;
        verts.push(Vertex2D::new(center, color));
        verts.push(Vertex2D::new(a, color));
        verts.push(Vertex2D::new(b, color));
    }
}

/// Ring of the given thickness centered on `radius`.
pub fn add_verts_for_ring(
    verts: &mut Vec<Vertex2D>,
    center: Vec2,
    radius: f32,
    thickness: f32,
    color: Color,
    sides: usize,
) {
    let sides = sides.max(3);
    let step = 360.0 / sides as f32;
    let inner = (radius - thickness * 0.5).max(0.0);
    let outer = radius + thickness * 0.5;
    for i in 0..sides {
        let d0 = direction_from_degrees(step * i as f32);
        let d1 = direction_from_degrees(step * (i + 1) as f32);
        push_quad(
            verts,
            [center + d0 * inner, center + d0 * outer, center + d1 * outer, center + d1 * inner],
            color,
        );
    }
}

/// Line quad ending exactly at `start` and `end`.
pub fn add_verts_for_trimmed_line(verts: &mut Vec<Vertex2D>, start: Vec2, end: Vec2, thickness: f32, color: Color) {
    let Some(dir) = (end - start).try_normalize() else {
        return;
    };
    let side = dir.perp() * (thickness * 0.5);
    push_quad(verts, [start - side, end - side, end + side, start + side], color);
}

/// Line quad extended by half the thickness past both ends, so joined
/// lines leave no notch at the corners.
pub fn add_verts_for_line(verts: &mut Vec<Vertex2D>, start: Vec2, end: Vec2, thickness: f32, color: Color) {
    let Some(dir) = (end - start).try_normalize() else {
        return;
    };
    let ext = dir * (thickness * 0.5);
    add_verts_for_trimmed_line(verts, start - ext, end + ext, thickness, color);
}

/// Filled pillbox with a thin border along its straight sides.
pub fn add_verts_for_pillbox(verts: &mut Vec<Vertex2D>, pill: &Pillbox2, fill: Color, border: Color) {
    const BORDER: f32 = 0.05;
    let r = pill.radius;
    match pill.core() {
        Core::Point(c) => {
            add_verts_for_disc(verts, c, r, fill, DISC_SIDES);
            add_verts_for_ring(verts, c, r, BORDER, border, DISC_SIDES);
        }
        Core::Segment(a, b) => {
            add_verts_for_trimmed_line(verts, a, b, r * 2.0, fill);
            add_verts_for_disc(verts, a, r, fill, DISC_SIDES);
            add_verts_for_disc(verts, b, r, fill, DISC_SIDES);
            if let Some(dir) = (b - a).try_normalize() {
                let n = dir.perp() * r;
                add_verts_for_line(verts, a + n, b + n, BORDER, border);
                add_verts_for_line(verts, a - n, b - n, BORDER, border);
            }
        }
        Core::Box(c) => {
            push_quad(verts, c, fill);
            let center = (c[0] + c[2]) * 0.5;
            for i in 0..4 {
                let (a, b) = (c[i], c[(i + 1) % 4]);
                let Some(dir) = (b - a).try_normalize() else {
                    continue;
                };
                // Outward side of this edge
                let mut n = dir.perp();
                if n.dot((a + b) * 0.5 - center) < 0.0 {
                    n = -n;
                }
                if r > 0.0 {
                    push_quad(verts, [a, b, b + n * r, a + n * r], fill);
                    add_verts_for_disc(verts, a, r, fill, DISC_SIDES);
                }
                add_verts_for_line(verts, a + n * r, b + n * r, BORDER, border);
            }
        }
    }
}

/// Most cells a terrain grid may hold; larger maps get coarser cells.
pub const MAX_GRID_CELLS: u32 = 128 * 128;

fn grid_size(dims: Vec2, cell: f32) -> (u32, u32) {
    let cols = (dims.x / cell).ceil().max(1.0) as u32;
    let rows = (dims.y / cell).ceil().max(1.0) as u32;
    (cols, rows)
}

/// Flat grid covering `[0, dims]`, two triangles per cell, with a
/// checkerboard tint. `cell` grows as needed to stay within
/// `MAX_GRID_CELLS`.
pub fn build_grid_mesh(dims: Vec2, cell: f32, light: Color, dark: Color) -> Mesh2D {
    let dims = dims.max(Vec2::ZERO);
    let mut cell = if cell > 0.0 && cell.is_finite() { cell } else { 1.0 };
    let area = dims.x * dims.y;
    if area.is_finite() && area / (cell * cell) > MAX_GRID_CELLS as f32 {
        cell = (area / MAX_GRID_CELLS as f32).sqrt();
    }
    let (mut cols, mut rows) = grid_size(dims, cell);
    while (cols as u64) * (rows as u64) > MAX_GRID_CELLS as u64 {
        cell *= 1.1;
        (cols, rows) = grid_size(dims, cell);
    }
    let mut mesh = Mesh2D::default();
    mesh.vertices.reserve((cols * rows * 4) as usize);
    mesh.indices.reserve((cols * rows * 6) as usize);

    for y in 0..rows {
        for x in 0..cols {
            let color = if (x + y) % 2 == 0 { light } else { dark };
            let min = Vec2::new(x as f32 * cell, y as f32 * cell);
            let max = (min + Vec2::splat(cell)).min(dims);
            let base = mesh.vertices.len() as u32;
            for p in [min, Vec2::new(max.x, min.y), max, Vec2::new(min.x, max.y)] {
                mesh.vertices.push(Vertex2D::new(p, color));
            }
            mesh.indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
    }
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use macroquad::color::{BLACK, WHITE};

    #[test]
    fn test_disc_triangle_count() {
        let mut verts = Vec::new();
        add_verts_for_disc(&mut verts, Vec2::ZERO, 1.0, WHITE, 24);
        assert_eq!(verts.len(), 24 * 3);
        assert!(verts.iter().all(|v| v.position.length() <= 1.0 + 1e-5));
    }

    #[test]
    fn test_degenerate_line_adds_nothing() {
        let mut verts = Vec::new();
        add_verts_for_line(&mut verts, Vec2::ONE, Vec2::ONE, 0.1, WHITE);
        assert!(verts.is_empty());
        add_verts_for_trimmed_line(&mut verts, Vec2::ZERO, Vec2::X, 0.2, WHITE);
        assert_eq!(verts.len(), 6);
    }

    #[test]
    fn test_pillbox_verts_are_triangles() {
        for half in [Vec2::ZERO, Vec2::new(1.0, 0.0), Vec2::new(1.0, 2.0)] {
            let mut verts = Vec::new();
            let pill = Pillbox2::new(Vec2::ZERO, 0.5, half, Vec2::X);
            add_verts_for_pillbox(&mut verts, &pill, WHITE, BLACK);
            assert!(!verts.is_empty());
            assert_eq!(verts.len() % 3, 0);
            let bounds = pill.bounds();
            // Border lines may poke out by half their thickness
            assert!(verts.iter().all(|v| v.position.x <= bounds.max.x + 0.1));
        }
    }

    #[test]
    fn test_grid_mesh() {
        let mesh = build_grid_mesh(Vec2::new(4.0, 2.0), 1.0, WHITE, BLACK);
        assert_eq!(mesh.triangle_count(), 16);
        assert_eq!(mesh.vertices.len(), 32);
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertices.len()));
    }

    #[test]
    fn test_grid_mesh_on_largest_map_stays_bounded() {
        let dims = Vec2::splat(crate::world::level::limits::MAX_MAP_DIM);
        let mesh = build_grid_mesh(dims, 1.0, WHITE, BLACK);
        assert!(mesh.vertices.len() <= (MAX_GRID_CELLS * 4) as usize);
        assert!(mesh.indices.len() <= (MAX_GRID_CELLS * 6) as usize);
        // Still covers the whole map
        let max_x = mesh.vertices.iter().map(|v| v.position.x).fold(0.0, f32::max);
        let max_y = mesh.vertices.iter().map(|v| v.position.y).fold(0.0, f32::max);
        assert_eq!((max_x, max_y), (dims.x, dims.y));
    }
}
