/// Euler-angle camera with free-look and orbit modes
use nalgebra::{Matrix4, Point3, Vector3};
use serde::Deserialize;

use crate::transform::mvp_matrix;

/// Starting yaw in degrees; looks down -Z.
pub const DEFAULT_YAW: f32 = -90.0;
pub const DEFAULT_PITCH: f32 = 0.0;
pub const DEFAULT_ZOOM: f32 = 45.0;

/// Free-look pitch is kept inside (-PITCH_LIMIT, PITCH_LIMIT) when constrained.
pub const PITCH_LIMIT: f32 = 89.9;
/// Polar angle range of the orbit, away from the poles.
pub const ORBIT_PITCH_MIN: f32 = 1.0;
pub const ORBIT_PITCH_MAX: f32 = 179.0;
pub const ZOOM_MIN: f32 = 1.0;
pub const ZOOM_MAX: f32 = 45.0;

const BASIS_EPSILON: f32 = 1e-6;

/// Keyboard-style translation directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Movement {
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
}

/// Tunable camera behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Units per second before acceleration.
    pub movement_speed: f32,
    /// Degrees per unit of pointer motion.
    pub sensitivity: f32,
    /// Multiplier applied on top of the movement speed.
    pub acceleration: f32,
    /// Distance kept from the orbit target.
    pub orbit_radius: f32,
    /// How far above the target point the orbit is centred.
    pub orbit_height: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            movement_speed: 1.0,
            sensitivity: 0.1,
            acceleration: 5.0,
            orbit_radius: 10.0,
            orbit_height: 1.0,
        }
    }
}

/// What drives the camera orientation. Angles are in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Orientation {
    /// Yaw/pitch around the camera's own position.
    FreeLook { yaw: f32, pitch: f32 },
    /// Azimuth (`yaw`) and polar angle (`pitch`) on a sphere around `target`.
    Orbit {
        target: Point3<f32>,
        yaw: f32,
        pitch: f32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum FreezeState {
    Live,
    /// Frozen, orientation not latched yet.
    Frozen,
    /// Frozen with the orientation from the first frozen rotation event.
    Saved(Orientation),
}

/// Projection matrix builders. The camera itself treats its projection as
/// opaque; callers pick one of these (or anything else) and assign it.
pub struct Projection;

impl Projection {
    /// Right-handed perspective projection, `fov_degrees` vertical.
    pub fn perspective(fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Matrix4<f32> {
        Matrix4::new_perspective(aspect, fov_degrees.to_radians(), near, far)
    }

    /// Orthographic box of `2 * half_width` by `2 * half_height`.
    pub fn orthographic(half_width: f32, half_height: f32, near: f32, far: f32) -> Matrix4<f32> {
        Matrix4::new_orthographic(-half_width, half_width, -half_height, half_height, near, far)
    }
}

/// A camera driven by movement, rotation and zoom input.
///
/// `front`, `right` and `up` are always an orthonormal basis. They are only
/// ever derived from the orientation angles or from an explicit front
/// direction, never assigned individually.
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Point3<f32>,
    pub settings: CameraSettings,
    front: Vector3<f32>,
    right: Vector3<f32>,
    up: Vector3<f32>,
    world_up: Vector3<f32>,
    orientation: Orientation,
    zoom: f32,
    projection: Matrix4<f32>,
    freeze: FreezeState,
}

impl Camera {
    pub fn new(position: Point3<f32>, world_up: Vector3<f32>, yaw: f32, pitch: f32) -> Self {
        let world_up = world_up.try_normalize(BASIS_EPSILON).unwrap_or_else(Vector3::y);
        let mut camera = Self {
            position,
            settings: CameraSettings::default(),
            front: -Vector3::z(),
            right: Vector3::x(),
            up: Vector3::y(),
            world_up,
            orientation: Orientation::FreeLook { yaw, pitch },
            zoom: DEFAULT_ZOOM,
            projection: Matrix4::identity(),
            freeze: FreezeState::Live,
        };
        camera.update_basis_from_angles(yaw, pitch);
        camera
    }

    pub fn with_settings(mut self, settings: CameraSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn front(&self) -> Vector3<f32> {
        self.front
    }

    pub fn right(&self) -> Vector3<f32> {
        self.right
    }

    pub fn up(&self) -> Vector3<f32> {
        self.up
    }

    pub fn world_up(&self) -> Vector3<f32> {
        self.world_up
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Orbit target, if orbiting.
    pub fn target(&self) -> Option<Point3<f32>> {
        match self.orientation {
            Orientation::Orbit { target, .. } => Some(target),
            Orientation::FreeLook { .. } => None,
        }
    }

    pub fn is_orbiting(&self) -> bool {
        matches!(self.orientation, Orientation::Orbit { .. })
    }

    /// Field of view in degrees.
    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn projection(&self) -> Matrix4<f32> {
        self.projection
    }

    pub fn set_projection(&mut self, projection: Matrix4<f32>) {
        self.projection = projection;
    }

    pub fn is_frozen(&self) -> bool {
        !matches!(self.freeze, FreezeState::Live)
    }

    /// Translate along the camera basis (or world up for `Up`/`Down`).
    pub fn process_movement(&mut self, direction: Movement, delta_time: f32) {
        if self.is_frozen() {
            return;
        }
        let velocity = self.settings.movement_speed * delta_time * self.settings.acceleration;
        let offset = match direction {
            Movement::Forward => self.front,
            Movement::Backward => -self.front,
            Movement::Left => -self.right,
            Movement::Right => self.right,
            Movement::Up => self.world_up,
            Movement::Down => -self.world_up,
        };
        self.position += offset * velocity;
    }

    /// Apply a pointer delta.
    ///
    /// In free-look the deltas turn yaw and pitch, with pitch clamped to
    /// ±[`PITCH_LIMIT`] when `constrain_pitch` is set. In orbit mode they
    /// move the orbit angles instead; the polar angle is always clamped.
    ///
    /// While frozen nothing moves, but the first call latches the current
    /// orientation so [`Camera::restore`] can bring it back.
    pub fn process_rotation(&mut self, dx: f32, dy: f32, constrain_pitch: bool) {
        match self.freeze {
            FreezeState::Live => {}
            FreezeState::Frozen => {
                self.freeze = FreezeState::Saved(self.orientation);
                return;
            }
            FreezeState::Saved(_) => return,
        }

        let dx = dx * self.settings.sensitivity;
        let dy = dy * self.settings.sensitivity;

        match &mut self.orientation {
            Orientation::FreeLook { yaw, pitch } => {
                *yaw += dx;
                *pitch += dy;
                if constrain_pitch {
                    *pitch = pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
                }
                let (yaw, pitch) = (*yaw, *pitch);
                self.update_basis_from_angles(yaw, pitch);
            }
            Orientation::Orbit { yaw, pitch, .. } => {
                *yaw += dx;
                *pitch = (*pitch + dy).clamp(ORBIT_PITCH_MIN, ORBIT_PITCH_MAX);
            }
        }
    }

    /// Narrow (positive delta) or widen the field of view.
    pub fn process_zoom(&mut self, delta: f32) {
        self.zoom = (self.zoom - delta).clamp(ZOOM_MIN, ZOOM_MAX);
    }

    /// Stop reacting to movement and rotation input.
    pub fn freeze(&mut self) {
        if let FreezeState::Live = self.freeze {
            self.freeze = FreezeState::Frozen;
        }
    }

    /// Leave the frozen state. If an orientation was latched while frozen it
    /// becomes live again; returns whether that happened.
    pub fn restore(&mut self) -> bool {
        let saved = match self.freeze {
            FreezeState::Live => return false,
            FreezeState::Frozen => None,
            FreezeState::Saved(orientation) => Some(orientation),
        };
        self.freeze = FreezeState::Live;

        let Some(orientation) = saved else {
            return false;
        };
        self.orientation = orientation;
        if let Orientation::FreeLook { yaw, pitch } = orientation {
            self.update_basis_from_angles(yaw, pitch);
        }
        true
    }

    /// Switch to orbiting `target`, starting from the camera's current
    /// direction as seen from the target.
    pub fn enter_orbit(&mut self, target: Point3<f32>) {
        let center = self.orbit_center(&target);
        let (yaw, pitch) = match (self.position - center).try_normalize(BASIS_EPSILON) {
            Some(offset) => (
                offset.z.atan2(offset.x).to_degrees(),
                offset.y.clamp(-1.0, 1.0).acos().to_degrees(),
            ),
            None => (0.0, 90.0),
        };
        self.orientation = Orientation::Orbit {
            target,
            yaw,
            pitch: pitch.clamp(ORBIT_PITCH_MIN, ORBIT_PITCH_MAX),
        };
        self.look_at(target);
    }

    /// Return to free-look, keeping the current viewing direction.
    pub fn leave_orbit(&mut self) {
        if self.is_orbiting() {
            let (yaw, pitch) = angles_from_front(&self.front);
            self.orientation = Orientation::FreeLook {
                yaw,
                pitch: pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT),
            };
        }
    }

    /// Orbit mode only: follow `target`, place the camera on the orbit sphere
    /// around the raised target and face it. No-op in free-look.
    pub fn look_at(&mut self, target: Point3<f32>) {
        let Orientation::Orbit {
            target: current,
            yaw,
            pitch,
        } = &mut self.orientation
        else {
            return;
        };
        *current = target;
        let (yaw, pitch) = (yaw.to_radians(), pitch.to_radians());

        let center = self.orbit_center(&target);
        let offset = Vector3::new(pitch.sin() * yaw.cos(), pitch.cos(), pitch.sin() * yaw.sin());
        self.position = center + offset * self.settings.orbit_radius;
        self.set_front(center - self.position);
    }

    /// Aim at `point` from the current position. In free-look the yaw and
    /// pitch are updated to match so later rotation continues from there.
    pub fn point_at(&mut self, point: Point3<f32>) {
        self.set_front(point - self.position);
        if let Orientation::FreeLook { yaw, pitch } = &mut self.orientation {
            let (new_yaw, new_pitch) = angles_from_front(&self.front);
            *yaw = new_yaw;
            *pitch = new_pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
        }
    }

    /// Mirror the pitch, e.g. for rendering a reflection.
    pub fn invert_pitch(&mut self) {
        match &mut self.orientation {
            Orientation::FreeLook { yaw, pitch } => {
                *pitch = -*pitch;
                let (yaw, pitch) = (*yaw, *pitch);
                self.update_basis_from_angles(yaw, pitch);
            }
            Orientation::Orbit { target, pitch, .. } => {
                *pitch = 180.0 - *pitch;
                let target = *target;
                self.look_at(target);
            }
        }
    }

    /// Move the camera along world Y.
    pub fn raise(&mut self, distance: f32) {
        self.position.y += distance;
    }

    /// Set the viewing direction directly and rebuild right/up from it.
    /// A zero direction is ignored.
    pub fn set_front(&mut self, front: Vector3<f32>) {
        let Some(front) = front.try_normalize(BASIS_EPSILON) else {
            return;
        };
        let right = front
            .cross(&self.world_up)
            .try_normalize(BASIS_EPSILON)
            // Looking straight along world up: keep the previous right
            // vector, made perpendicular to the new front.
            .or_else(|| (self.right - front * self.right.dot(&front)).try_normalize(BASIS_EPSILON))
            .unwrap_or_else(|| any_perpendicular(&front));

        self.front = front;
        self.right = right;
        self.up = right.cross(&front).normalize();
    }

    fn update_basis_from_angles(&mut self, yaw: f32, pitch: f32) {
        let (yaw, pitch) = (yaw.to_radians(), pitch.to_radians());
        let front = Vector3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos());
        self.set_front(front);
    }

    fn orbit_center(&self, target: &Point3<f32>) -> Point3<f32> {
        target + Vector3::y() * self.settings.orbit_height
    }

    /// Look from the position along `front`.
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.position, &(self.position + self.front), &self.up)
    }

    /// Project a model-space point to screen pixels.
    ///
    /// Returns `(x, y, depth)` with depth in normalized device coordinates,
    /// or `None` for points behind the camera or outside the view.
    pub fn project_to_screen(
        &self,
        point: &Point3<f32>,
        model_matrix: &Matrix4<f32>,
        width: u32,
        height: u32,
    ) -> Option<(f32, f32, f32)> {
        let mvp = mvp_matrix(model_matrix, &self.view_matrix(), &self.projection);
        let clip = mvp * point.to_homogeneous();

        // Behind the eye or on the eye plane
        if clip.w <= 1e-6 {
            return None;
        }
        let ndc = clip.xyz() / clip.w;

        if ndc.x < -1.0 || ndc.x > 1.0 || ndc.y < -1.0 || ndc.y > 1.0 {
            return None;
        }

        let screen_x = (ndc.x + 1.0) * 0.5 * width as f32;
        let screen_y = (1.0 - ndc.y) * 0.5 * height as f32;

        Some((screen_x, screen_y, ndc.z))
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Point3::origin(), Vector3::y(), DEFAULT_YAW, DEFAULT_PITCH)
    }
}

/// Yaw and pitch (degrees) that produce the unit vector `front`.
fn angles_from_front(front: &Vector3<f32>) -> (f32, f32) {
    let pitch = front.y.clamp(-1.0, 1.0).asin().to_degrees();
    let yaw = front.z.atan2(front.x).to_degrees();
    (yaw, pitch)
}

fn any_perpendicular(v: &Vector3<f32>) -> Vector3<f32> {
    let axis = if v.x.abs() < 0.9 { Vector3::x() } else { Vector3::y() };
    v.cross(&axis).normalize()
}
