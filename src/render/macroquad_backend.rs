//! macroquad renderer
//!
//! Draws submitted triangles with macroquad's immediate-mode shapes under
//! whatever camera is currently set. Only two materials exist: `"default"`
//! (filled) and `"wireframe"` (triangle outlines).

use macroquad::shapes::{draw_triangle, draw_triangle_lines};

use super::{Mesh2D, RenderContext, Vertex2D};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Material {
    Filled,
    Wireframe,
}

pub struct MacroquadRenderer {
    material: Material,
    /// Triangles submitted since the last `begin_frame`
    triangles: usize,
}

impl MacroquadRenderer {
    pub fn new() -> Self {
        Self { material: Material::Filled, triangles: 0 }
    }

    pub fn begin_frame(&mut self) {
        self.triangles = 0;
        self.material = Material::Filled;
    }

    pub fn triangles_this_frame(&self) -> usize {
        self.triangles
    }

    fn triangle(&mut self, a: &Vertex2D, b: &Vertex2D, c: &Vertex2D) {
        match self.material {
            Material::Filled => draw_triangle(a.position, b.position, c.position, a.color),
            Material::Wireframe => draw_triangle_lines(a.position, b.position, c.position, 0.02, a.color),
        }
        self.triangles += 1;
    }
}

impl Default for MacroquadRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderContext for MacroquadRenderer {
    fn bind_material(&mut self, material: &str) {
        self.material = match material {
            "wireframe" => Material::Wireframe,
            "default" | "terrain" => Material::Filled,
            other => {
                log::debug!("unknown material '{}', drawing filled", other);
                Material::Filled
            }
        };
    }

    fn draw_vertex_array(&mut self, vertices: &[Vertex2D]) {
        for tri in vertices.chunks_exact(3) {
            self.triangle(&tri[0], &tri[1], &tri[2]);
        }
    }

    fn draw_mesh(&mut self, mesh: &Mesh2D) {
        for tri in mesh.indices.chunks_exact(3) {
            let fetch = |i: u32| mesh.vertices.get(i as usize);
            if let (Some(a), Some(b), Some(c)) = (fetch(tri[0]), fetch(tri[1]), fetch(tri[2])) {
                self.triangle(a, b, c);
            }
        }
    }
}
