/// Terminal-based mesh viewer built on the ASCII rasterizer
use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        MouseButton, MouseEvent, MouseEventKind,
    },
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self},
};
use nalgebra::{Matrix4, Point3, Vector3};
use offscope_core::{
    camera::{DEFAULT_PITCH, DEFAULT_YAW},
    Camera, Mesh, ModelTransform, Movement, Projection, WeightMode,
};
use std::io::{self, stdout, Write};
use std::time::{Duration, Instant};

pub mod config;
pub mod logging;
pub mod renderer;

pub use config::{ConfigError, ViewerConfig};
pub use logging::{init_logging, LoggingConfig};
pub use renderer::{AsciiRenderer, Light};

/// Seconds of movement applied per key press.
const MOVE_STEP: f32 = 0.05;
/// Pointer units per arrow key press.
const ROTATE_STEP: f32 = 50.0;
/// Terminal cells are coarse; a one-cell drag counts as this many pointer units.
const CELL_TO_POINTER: f32 = 8.0;
/// Spacing between mesh instances along X, in normalized model units.
const INSTANCE_SPACING: f32 = 2.5;
/// Spin speed in radians per second.
const SPIN_SPEED: f32 = 0.8;
const NEAR_PLANE: f32 = 0.1;
const FAR_PLANE: f32 = 100.0;
/// Smallest aspect ratio and orthographic half-height handed to the
/// projection builders, which reject zero.
const MIN_EXTENT: f32 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionMode {
    Perspective,
    Orthographic,
}

impl ProjectionMode {
    fn toggled(self) -> Self {
        match self {
            Self::Perspective => Self::Orthographic,
            Self::Orthographic => Self::Perspective,
        }
    }
}

/// Main application struct for terminal mesh viewing.
///
/// One mesh is loaded; every instance draws it with its own model transform.
pub struct TerminalApp {
    mesh: Mesh,
    /// Centres the mesh and scales it into the unit cube.
    base_model: Matrix4<f32>,
    instances: Vec<ModelTransform>,
    camera: Camera,
    light: Light,
    renderer: AsciiRenderer,
    projection_mode: ProjectionMode,
    spin: bool,
    frame_time: Duration,
    running: bool,
    last_frame: Instant,
    frame_count: u32,
    fps: f32,
    drag_origin: Option<(u16, u16)>,
}

impl TerminalApp {
    pub fn new(mesh: Mesh, config: &ViewerConfig) -> io::Result<Self> {
        let (width, height) = terminal::size()?;
        Ok(Self::with_size(mesh, config, width as usize, height as usize))
    }

    pub fn with_size(mesh: Mesh, config: &ViewerConfig, width: usize, height: usize) -> Self {
        let base_model = mesh.bounding_box().normalizing_transform();

        let count = config.instances.max(1);
        let first = -(count as f32 - 1.0) * INSTANCE_SPACING / 2.0;
        let instances = (0..count)
            .map(|i| ModelTransform::at(Vector3::new(first + i as f32 * INSTANCE_SPACING, 0.0, 0.0)))
            .collect();

        let mut camera = Camera::new(Point3::new(0.0, 1.0, 6.0), Vector3::y(), DEFAULT_YAW, DEFAULT_PITCH)
            .with_settings(config.camera);
        camera.point_at(Point3::origin());

        log::info!(
            "viewing {} vertices / {} triangles as {} instance(s)",
            mesh.vertex_count(),
            mesh.triangle_count(),
            count
        );

        Self {
            mesh,
            base_model,
            instances,
            camera,
            light: Light::new(Point3::from(config.light)),
            renderer: AsciiRenderer::new(width, height),
            projection_mode: ProjectionMode::Perspective,
            spin: config.spin,
            frame_time: Duration::from_secs_f32(1.0 / config.target_fps.max(1) as f32),
            running: true,
            last_frame: Instant::now(),
            frame_count: 0,
            fps: 0.0,
            drag_origin: None,
        }
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, EnableMouseCapture, cursor::Hide)?;

        let result = self.main_loop();

        // Cleanup
        terminal::disable_raw_mode()?;
        execute!(stdout(), DisableMouseCapture, terminal::LeaveAlternateScreen, cursor::Show)?;

        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        let mut previous = Instant::now();

        while self.running {
            let frame_start = Instant::now();

            // Drain pending input
            while event::poll(Duration::ZERO)? {
                let event = event::read()?;
                self.handle_event(event);
            }

            self.update(frame_start.duration_since(previous).as_secs_f32());
            previous = frame_start;

            self.render()?;

            // Frame timing
            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < self.frame_time {
                std::thread::sleep(self.frame_time - elapsed);
            }

            // Update FPS counter
            let now = Instant::now();
            if (now - self.last_frame).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_frame).as_secs_f32();
                self.frame_count = 0;
                self.last_frame = now;
            }
        }

        Ok(())
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) => self.handle_key(key),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            Event::Resize(width, height) => {
                log::debug!("terminal resized to {}x{}", width, height);
                self.renderer = AsciiRenderer::new(width as usize, height as usize);
            }
            _ => {}
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.running = false;
            }
            KeyCode::Char('w') => self.camera.process_movement(Movement::Forward, MOVE_STEP),
            KeyCode::Char('s') => self.camera.process_movement(Movement::Backward, MOVE_STEP),
            KeyCode::Char('a') => self.camera.process_movement(Movement::Left, MOVE_STEP),
            KeyCode::Char('d') => self.camera.process_movement(Movement::Right, MOVE_STEP),
            KeyCode::Char('r') => self.camera.process_movement(Movement::Up, MOVE_STEP),
            KeyCode::Char('f') => self.camera.process_movement(Movement::Down, MOVE_STEP),
            KeyCode::Up => self.camera.process_rotation(0.0, ROTATE_STEP, true),
            KeyCode::Down => self.camera.process_rotation(0.0, -ROTATE_STEP, true),
            KeyCode::Left => self.camera.process_rotation(-ROTATE_STEP, 0.0, true),
            KeyCode::Right => self.camera.process_rotation(ROTATE_STEP, 0.0, true),
            KeyCode::Char('+') | KeyCode::Char('=') => self.camera.process_zoom(1.0),
            KeyCode::Char('-') => self.camera.process_zoom(-1.0),
            KeyCode::Char('o') => self.toggle_orbit(),
            KeyCode::Char(' ') => {
                if self.camera.is_frozen() {
                    let restored = self.camera.restore();
                    log::debug!("camera live again (orientation restored: {})", restored);
                } else {
                    self.camera.freeze();
                    log::debug!("camera frozen");
                }
            }
            KeyCode::Char(c @ '1'..='3') => {
                if let Ok(mode) = WeightMode::try_from(c as u32 - '1' as u32) {
                    self.set_normals(mode);
                }
            }
            KeyCode::Char('i') => self.camera.invert_pitch(),
            KeyCode::Char('p') => self.projection_mode = self.projection_mode.toggled(),
            KeyCode::Char('t') => self.spin = !self.spin,
            _ => {}
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.drag_origin = Some((mouse.column, mouse.row));
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                if let Some((column, row)) = self.drag_origin {
                    let dx = (mouse.column as f32 - column as f32) * CELL_TO_POINTER;
                    // Screen rows grow downwards
                    let dy = (row as f32 - mouse.row as f32) * CELL_TO_POINTER;
                    self.camera.process_rotation(dx, dy, true);
                }
                self.drag_origin = Some((mouse.column, mouse.row));
            }
            MouseEventKind::Up(MouseButton::Left) => {
                self.drag_origin = None;
            }
            MouseEventKind::ScrollUp => self.camera.process_zoom(1.0),
            MouseEventKind::ScrollDown => self.camera.process_zoom(-1.0),
            _ => {}
        }
    }

    fn toggle_orbit(&mut self) {
        if self.camera.is_orbiting() {
            self.camera.leave_orbit();
            log::info!("free-look camera");
        } else {
            // The orbit is centred `orbit_height` above its target; keep the
            // centre on the origin where the instances are.
            let target = Point3::new(0.0, -self.camera.settings.orbit_height, 0.0);
            self.camera.enter_orbit(target);
            log::info!("orbiting {:?}", self.camera.position);
        }
    }

    fn set_normals(&mut self, mode: WeightMode) {
        if self.mesh.weight_mode() != mode {
            self.mesh.recompute_normals(mode);
            log::info!("normals recomputed with {} weighting", mode);
        }
    }

    fn update(&mut self, delta_time: f32) {
        if self.spin {
            for instance in &mut self.instances {
                instance.rotation.rotate(0.0, SPIN_SPEED * delta_time, 0.0);
            }
        }
        if let Some(target) = self.camera.target() {
            self.camera.look_at(target);
        }
    }

    fn projection_matrix(&self) -> Matrix4<f32> {
        // Terminal cells are about twice as tall as they are wide
        let aspect = (self.renderer.width() as f32 / (self.renderer.height().max(1) as f32 * 2.0))
            .max(MIN_EXTENT);
        match self.projection_mode {
            ProjectionMode::Perspective => {
                Projection::perspective(self.camera.zoom(), aspect, NEAR_PLANE, FAR_PLANE)
            }
            ProjectionMode::Orthographic => {
                // Match the perspective framing at the origin
                let distance = self.camera.position.coords.norm();
                let half_height =
                    (distance * (self.camera.zoom().to_radians() / 2.0).tan()).max(MIN_EXTENT);
                Projection::orthographic(half_height * aspect, half_height, NEAR_PLANE, FAR_PLANE)
            }
        }
    }

    /// Rasterize all instances into the renderer's buffers.
    fn draw_scene(&mut self) {
        let projection = self.projection_matrix();
        self.camera.set_projection(projection);

        self.renderer.clear();
        for instance in &self.instances {
            let model = instance.matrix() * self.base_model;
            self.renderer.render_mesh(&self.mesh, &model, &self.camera, &self.light);
        }
    }

    fn status_line(&self) -> String {
        let mode = if self.camera.is_orbiting() { "orbit" } else { "free" };
        let projection = match self.projection_mode {
            ProjectionMode::Perspective => "persp",
            ProjectionMode::Orthographic => "ortho",
        };
        let frozen = if self.camera.is_frozen() { " | FROZEN" } else { "" };
        format!(
            "Offscope | FPS: {:.1} | {} {} | fov {:.0} | normals: {}{} | Q=Quit",
            self.fps,
            mode,
            projection,
            self.camera.zoom(),
            self.mesh.weight_mode(),
            frozen
        )
    }

    fn render(&mut self) -> io::Result<()> {
        self.draw_scene();

        // Output to terminal
        let mut stdout = stdout();
        queue!(stdout, cursor::MoveTo(0, 0))?;

        self.renderer.draw(&mut stdout)?;

        // Draw UI overlay
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            SetForegroundColor(Color::Yellow),
            Print(self.status_line()),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }
}
