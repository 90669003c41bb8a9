/// ASCII rasterizer for terminal rendering
use crossterm::{
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use nalgebra::{Matrix4, Point3, Vector3};
use offscope_core::{Camera, Mesh};
use std::io::Write;

/// Character luminosity ramp for depth/shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// A point light with a constant ambient term.
#[derive(Debug, Clone, Copy)]
pub struct Light {
    pub position: Point3<f32>,
    /// Brightness of surfaces facing away from the light, in [0, 1].
    pub ambient: f32,
}

impl Light {
    pub fn new(position: Point3<f32>) -> Self {
        Self {
            position,
            ambient: 0.15,
        }
    }

    /// Lambert term plus ambient for a surface point.
    pub fn brightness(&self, position: &Point3<f32>, normal: &Vector3<f32>) -> f32 {
        let to_light = (self.position - position).try_normalize(1e-6).unwrap_or_else(Vector3::zeros);
        let diffuse = normal.dot(&to_light).max(0.0);
        (self.ambient + (1.0 - self.ambient) * diffuse).clamp(0.0, 1.0)
    }
}

/// A projected triangle corner: screen position, depth and brightness.
#[derive(Debug, Clone, Copy)]
struct ScreenVertex {
    x: f32,
    y: f32,
    depth: f32,
    brightness: f32,
}

/// ASCII renderer that converts 3D meshes to terminal characters
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    depth_buffer: Vec<f32>,
    char_buffer: Vec<char>,
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            depth_buffer: vec![f32::INFINITY; size],
            char_buffer: vec![' '; size],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn clear(&mut self) {
        self.depth_buffer.fill(f32::INFINITY);
        self.char_buffer.fill(' ');
    }

    /// Character at column `x`, row `y`.
    pub fn char_at(&self, x: usize, y: usize) -> char {
        self.char_buffer[y * self.width + x]
    }

    /// Draw every triangle of `mesh` with Gouraud-shaded vertex normals.
    pub fn render_mesh(
        &mut self,
        mesh: &Mesh,
        model_matrix: &Matrix4<f32>,
        camera: &Camera,
        light: &Light,
    ) {
        for t in 0..mesh.triangle_count() {
            self.render_triangle(mesh, t, model_matrix, camera, light);
        }
    }

    fn render_triangle(
        &mut self,
        mesh: &Mesh,
        index: usize,
        model_matrix: &Matrix4<f32>,
        camera: &Camera,
        light: &Light,
    ) {
        let corners = mesh.triangles()[index];
        let face_normal = model_matrix
            .transform_vector(&mesh.face_normal(index))
            .try_normalize(1e-6);

        let mut screen = [ScreenVertex {
            x: 0.0,
            y: 0.0,
            depth: 0.0,
            brightness: 0.0,
        }; 3];

        for (slot, &vertex) in screen.iter_mut().zip(&corners) {
            let position = &mesh.vertices()[vertex as usize];
            let Some((x, y, depth)) =
                camera.project_to_screen(position, model_matrix, self.width as u32, self.height as u32)
            else {
                return; // Triangle is clipped
            };

            let world = model_matrix.transform_point(position);
            // Vertices without a usable smooth normal fall back to the face normal
            let normal = model_matrix
                .transform_vector(&mesh.normals()[vertex as usize])
                .try_normalize(1e-6)
                .or(face_normal)
                .unwrap_or_else(Vector3::zeros);

            *slot = ScreenVertex {
                x,
                y,
                depth,
                brightness: light.brightness(&world, &normal),
            };
        }

        self.rasterize_triangle(&screen);
    }

    fn rasterize_triangle(&mut self, corners: &[ScreenVertex; 3]) {
        let [v0, v1, v2] = *corners;

        // Bounding box
        let min_x = v0.x.min(v1.x).min(v2.x).floor() as i32;
        let max_x = v0.x.max(v1.x).max(v2.x).ceil() as i32;
        let min_y = v0.y.min(v1.y).min(v2.y).floor() as i32;
        let max_y = v0.y.max(v1.y).max(v2.y).ceil() as i32;

        // Clip to screen bounds
        let min_x = min_x.max(0);
        let max_x = max_x.min(self.width as i32 - 1);
        let min_y = min_y.max(0);
        let max_y = max_y.min(self.height as i32 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;

                let Some((w0, w1, w2)) =
                    barycentric((v0.x, v0.y), (v1.x, v1.y), (v2.x, v2.y), (px, py))
                else {
                    continue;
                };
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                let depth = w0 * v0.depth + w1 * v1.depth + w2 * v2.depth;
                let idx = y as usize * self.width + x as usize;
                if depth < self.depth_buffer[idx] {
                    let brightness = w0 * v0.brightness + w1 * v1.brightness + w2 * v2.brightness;
                    self.depth_buffer[idx] = depth;
                    self.char_buffer[idx] = shade(brightness);
                }
            }
        }
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for y in 0..self.height {
            for x in 0..self.width {
                let c = self.char_at(x, y);

                // Color based on character intensity
                let color = match c {
                    ' ' | '.' | ':' => Color::DarkGrey,
                    '-' | '=' => Color::Grey,
                    '+' | '*' => Color::White,
                    '#' | '%' | '@' => Color::Cyan,
                    _ => Color::White,
                };

                writer.queue(SetForegroundColor(color))?;
                writer.queue(Print(c))?;
            }
            if y + 1 < self.height {
                writer.queue(Print("\r\n"))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

/// Map a brightness in [0, 1] onto the luminosity ramp. Lit surfaces never
/// use the blank character so they stay visible against the background.
fn shade(brightness: f32) -> char {
    let steps = (LUMINOSITY_RAMP.len() - 1) as f32;
    let index = (brightness.clamp(0.0, 1.0) * steps).round() as usize;
    LUMINOSITY_RAMP[index.clamp(1, LUMINOSITY_RAMP.len() - 1)]
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use offscope_core::{camera::DEFAULT_YAW, Projection};

    fn camera_looking_at_origin(distance: f32) -> Camera {
        let mut camera = Camera::new(Point3::new(0.0, 0.0, distance), Vector3::y(), DEFAULT_YAW, 0.0);
        camera.set_projection(Projection::perspective(45.0, 1.0, 0.1, 100.0));
        camera
    }

    fn lit_cells(renderer: &AsciiRenderer) -> usize {
        (0..renderer.height())
            .flat_map(|y| (0..renderer.width()).map(move |x| (x, y)))
            .filter(|&(x, y)| renderer.char_at(x, y) != ' ')
            .count()
    }

    #[test]
    fn test_barycentric_corners_and_centroid() {
        let (a, b, c) = ((0.0, 0.0), (4.0, 0.0), (0.0, 4.0));
        let (w0, w1, w2) = barycentric(a, b, c, a).unwrap();
        assert!((w0 - 1.0).abs() < 1e-6 && w1.abs() < 1e-6 && w2.abs() < 1e-6);

        let centroid = (4.0 / 3.0, 4.0 / 3.0);
        let (w0, w1, w2) = barycentric(a, b, c, centroid).unwrap();
        for w in [w0, w1, w2] {
            assert!((w - 1.0 / 3.0).abs() < 1e-5);
        }

        assert!(barycentric(a, a, c, centroid).is_none());
    }

    #[test]
    fn test_shade_ramp() {
        assert_eq!(shade(0.0), '.');
        assert_eq!(shade(1.0), '@');
        assert_eq!(shade(7.0), '@');
        assert!(LUMINOSITY_RAMP.iter().position(|&c| c == shade(0.3)) < LUMINOSITY_RAMP.iter().position(|&c| c == shade(0.8)));
    }

    #[test]
    fn test_light_brightness() {
        let light = Light::new(Point3::new(0.0, 0.0, 10.0));
        let facing = light.brightness(&Point3::origin(), &Vector3::z());
        let away = light.brightness(&Point3::origin(), &-Vector3::z());
        assert!((facing - 1.0).abs() < 1e-6);
        assert!((away - light.ambient).abs() < 1e-6);
    }

    #[test]
    fn test_cube_is_drawn_in_the_middle() {
        let mut renderer = AsciiRenderer::new(40, 20);
        let camera = camera_looking_at_origin(4.0);
        let light = Light::new(Point3::new(0.0, 0.0, 10.0));

        renderer.render_mesh(&Mesh::cube(1.0), &Matrix4::identity(), &camera, &light);
        assert_ne!(renderer.char_at(20, 10), ' ');
        assert_eq!(renderer.char_at(0, 0), ' ');
        assert!(lit_cells(&renderer) > 0);

        renderer.clear();
        assert_eq!(lit_cells(&renderer), 0);
    }

    #[test]
    fn test_lit_side_is_brighter() {
        let camera = camera_looking_at_origin(4.0);
        let cube = Mesh::cube(1.0);
        let ramp_index = |c: char| LUMINOSITY_RAMP.iter().position(|&r| r == c).unwrap();

        let mut front_lit = AsciiRenderer::new(40, 20);
        front_lit.render_mesh(&cube, &Matrix4::identity(), &camera, &Light::new(Point3::new(0.0, 0.0, 10.0)));

        let mut back_lit = AsciiRenderer::new(40, 20);
        back_lit.render_mesh(&cube, &Matrix4::identity(), &camera, &Light::new(Point3::new(0.0, 0.0, -10.0)));

        assert!(ramp_index(front_lit.char_at(20, 10)) > ramp_index(back_lit.char_at(20, 10)));
    }

    #[test]
    fn test_mesh_behind_camera_is_skipped() {
        let mut renderer = AsciiRenderer::new(40, 20);
        let camera = camera_looking_at_origin(4.0);
        let model = Matrix4::new_translation(&Vector3::new(0.0, 0.0, 10.0));

        renderer.render_mesh(&Mesh::cube(1.0), &model, &camera, &Light::new(Point3::origin()));
        assert_eq!(lit_cells(&renderer), 0);
    }

    #[test]
    fn test_draw_writes_every_cell() {
        let mut renderer = AsciiRenderer::new(8, 4);
        renderer.render_mesh(
            &Mesh::cube(1.0),
            &Matrix4::identity(),
            &camera_looking_at_origin(2.0),
            &Light::new(Point3::new(0.0, 0.0, 5.0)),
        );

        let mut out = Vec::new();
        renderer.draw(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("\r\n").count(), 3);
    }
}
