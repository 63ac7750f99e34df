use std::f32::consts::{PI, TAU};

use nalgebra::{Point3, Unit, UnitQuaternion, Vector3};

use crate::host::ViewportSize;
use crate::input::{InputEvent, MouseButton, MouseButtonState, PointerButtonEvent, PointerMoveEvent};
use crate::scene::PerspectiveCamera;

const EPS: f32 = 1e-6;

/// Tuning for [`OrbitControls`].
#[derive(Debug, Clone)]
pub struct OrbitParams {
    /// Master switch for input handling.
    pub enabled: bool,

    /// Inertial motion: deltas decay by `1 - damping_factor` per update
    /// instead of being applied in full at once.
    pub enable_damping: bool,
    pub damping_factor: f32,

    pub enable_rotate: bool,
    pub rotate_speed: f32,

    pub enable_zoom: bool,
    pub zoom_speed: f32,

    pub enable_pan: bool,
    pub pan_speed: f32,
    /// Pan in the camera's screen plane rather than the world's horizontal plane.
    pub screen_space_panning: bool,

    pub min_distance: f32,
    pub max_distance: f32,

    /// Polar angle limits in radians, measured from +Y.
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,

    /// Orbit around the target while idle. Speed 2 is one orbit per 30s.
    pub auto_rotate: bool,
    pub auto_rotate_speed: f32,
}

impl Default for OrbitParams {
    fn default() -> Self {
        Self {
            enabled: true,
            enable_damping: false,
            damping_factor: 0.05,
            enable_rotate: true,
            rotate_speed: 1.0,
            enable_zoom: true,
            zoom_speed: 1.0,
            enable_pan: true,
            pan_speed: 1.0,
            screen_space_panning: true,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            min_polar_angle: 0.0,
            max_polar_angle: PI,
            auto_rotate: false,
            auto_rotate_speed: 2.0,
        }
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq)]
struct Spherical {
    radius: f32,
    /// Polar angle from +Y.
    phi: f32,
    /// Azimuth around +Y, from +Z towards +X.
    theta: f32,
}

impl Spherical {
    fn from_offset(v: Vector3<f32>) -> Self {
        let radius = v.norm();
        if radius == 0.0 {
            return Self::default();
        }
        Self {
            radius,
            theta: v.x.atan2(v.z),
            phi: (v.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    fn to_offset(self) -> Vector3<f32> {
        let s = self.phi.sin() * self.radius;
        Vector3::new(s * self.theta.sin(), self.phi.cos() * self.radius, s * self.theta.cos())
    }

    /// Keeps the pole out of reach so the look-at basis never degenerates.
    fn make_safe(&mut self) {
        self.phi = self.phi.clamp(EPS, PI - EPS);
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Drag {
    None,
    Rotate,
    Dolly,
    Pan,
}

/// Orbit-style camera manipulation around a target point.
///
/// - left drag rotates (with ctrl/meta/shift it pans)
/// - middle drag dollies
/// - right drag pans
/// - wheel dollies
///
/// Input accumulates deltas; [`update`](Self::update) applies them to the
/// camera. Call `update` once per frame, which damping relies on.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub params: OrbitParams,

    /// Point the camera orbits around.
    pub target: Point3<f32>,

    element: String,
    viewport: ViewportSize,

    drag: Drag,
    last_pointer: Option<(f32, f32)>,

    spherical_delta: Spherical,
    scale: f32,
    pan_offset: Vector3<f32>,

    last_position: Point3<f32>,
    last_target: Point3<f32>,
}

impl OrbitControls {
    /// Binds controls to `camera` and the surface named `element`.
    ///
    /// Performs one update, so the camera looks at the target afterwards.
    pub fn new(camera: &mut PerspectiveCamera, element: impl Into<String>, viewport: ViewportSize) -> Self {
        Self::with_params(camera, element, viewport, OrbitParams::default())
    }

    pub fn with_params(
        camera: &mut PerspectiveCamera,
        element: impl Into<String>,
        viewport: ViewportSize,
        params: OrbitParams,
    ) -> Self {
        let mut controls = Self {
            params,
            target: Point3::origin(),
            element: element.into(),
            viewport,
            drag: Drag::None,
            last_pointer: None,
            spherical_delta: Spherical::default(),
            scale: 1.0,
            pan_offset: Vector3::zeros(),
            last_position: camera.position,
            last_target: Point3::origin(),
        };
        controls.update(camera, 0.0);
        controls
    }

    /// Identifier of the surface this instance listens on.
    pub fn element(&self) -> &str {
        &self.element
    }

    /// Viewport used to convert pointer travel into angles and distances.
    pub fn set_viewport(&mut self, viewport: ViewportSize) {
        self.viewport = viewport;
    }

    /// Current distance between camera and target.
    pub fn distance(&self, camera: &PerspectiveCamera) -> f32 {
        (camera.position - self.target).norm()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag != Drag::None
    }

    /// Feeds one pointer event.
    pub fn handle_event(&mut self, event: &InputEvent, camera: &PerspectiveCamera) {
        if !self.params.enabled {
            return;
        }

        match event {
            InputEvent::PointerButton(PointerButtonEvent { button, state, x, y, modifiers }) => {
                match state {
                    MouseButtonState::Pressed => {
                        let p = &self.params;
                        // A modifier swaps the rotate and pan buttons.
                        let swapped = modifiers.ctrl || modifiers.meta || modifiers.shift;
                        self.drag = match button {
                            MouseButton::Left if swapped => {
                                if p.enable_pan { Drag::Pan } else { Drag::None }
                            }
                            MouseButton::Left if p.enable_rotate => Drag::Rotate,
                            MouseButton::Middle if p.enable_zoom => Drag::Dolly,
                            MouseButton::Right if swapped => {
                                if p.enable_rotate { Drag::Rotate } else { Drag::None }
                            }
                            MouseButton::Right if p.enable_pan => Drag::Pan,
                            _ => Drag::None,
                        };
                        self.last_pointer = Some((*x, *y));
                    }
                    MouseButtonState::Released => {
                        self.drag = Drag::None;
                        self.last_pointer = None;
                    }
                }
            }

            InputEvent::PointerMoved(PointerMoveEvent { x, y }) => {
                let Some((lx, ly)) = self.last_pointer else {
                    return;
                };
                if self.drag == Drag::None {
                    return;
                }
                self.last_pointer = Some((*x, *y));
                self.drag_by(x - lx, y - ly, camera);
            }

            InputEvent::MouseWheel { delta, .. } => {
                if !self.params.enable_zoom || self.drag != Drag::None {
                    return;
                }
                let dy = delta.vertical();
                if dy > 0.0 {
                    self.dolly_in(self.zoom_scale());
                } else if dy < 0.0 {
                    self.dolly_out(self.zoom_scale());
                }
            }

            InputEvent::Focused(false) => {
                self.drag = Drag::None;
                self.last_pointer = None;
            }

            _ => {}
        }
    }

    fn drag_by(&mut self, dx: f32, dy: f32, camera: &PerspectiveCamera) {
        let height = self.viewport.height.max(1) as f32;
        match self.drag {
            Drag::Rotate => {
                let speed = self.params.rotate_speed;
                self.rotate_left(TAU * dx * speed / height);
                self.rotate_up(TAU * dy * speed / height);
            }
            Drag::Dolly => {
                if dy > 0.0 {
                    self.dolly_out(self.zoom_scale());
                } else if dy < 0.0 {
                    self.dolly_in(self.zoom_scale());
                }
            }
            Drag::Pan => {
                let speed = self.params.pan_speed;
                self.pan(dx * speed, dy * speed, camera);
            }
            Drag::None => {}
        }
    }

    pub fn rotate_left(&mut self, angle: f32) {
        self.spherical_delta.theta -= angle;
    }

    pub fn rotate_up(&mut self, angle: f32) {
        self.spherical_delta.phi -= angle;
    }

    /// Moves closer to the target by `scale` (< 1).
    pub fn dolly_in(&mut self, scale: f32) {
        self.scale *= scale;
    }

    /// Moves away from the target by `1 / scale`.
    pub fn dolly_out(&mut self, scale: f32) {
        self.scale /= scale;
    }

    fn zoom_scale(&self) -> f32 {
        0.95f32.powf(self.params.zoom_speed)
    }

    /// Pans by a pointer travel of `(dx, dy)` pixels.
    ///
    /// Travel is scaled so the point under the cursor at target depth follows it.
    pub fn pan(&mut self, dx: f32, dy: f32, camera: &PerspectiveCamera) {
        let height = self.viewport.height.max(1) as f32;
        let target_distance =
            (camera.position - self.target).norm() * (camera.fov.to_radians() / 2.0).tan();

        let right = camera.right();
        self.pan_offset -= right * (2.0 * dx * target_distance / height);

        let up = if self.params.screen_space_panning {
            camera.camera_up()
        } else {
            camera.up.cross(&right)
        };
        self.pan_offset += up * (2.0 * dy * target_distance / height);
    }

    /// Applies accumulated input to `camera`.
    ///
    /// `dt` is the frame delta in seconds (used by auto-rotation).
    /// Returns whether the camera moved.
    pub fn update(&mut self, camera: &mut PerspectiveCamera, dt: f32) -> bool {
        let p = &self.params;

        // Work in a frame where the camera's up is +Y.
        let to_y_up = y_up_rotation(&camera.up);

        let offset = to_y_up * (camera.position - self.target);
        let mut spherical = Spherical::from_offset(offset);

        if p.auto_rotate && self.drag == Drag::None {
            let angle = TAU / 60.0 * p.auto_rotate_speed * dt;
            self.spherical_delta.theta -= angle;
        }

        if p.enable_damping {
            spherical.theta += self.spherical_delta.theta * p.damping_factor;
            spherical.phi += self.spherical_delta.phi * p.damping_factor;
        } else {
            spherical.theta += self.spherical_delta.theta;
            spherical.phi += self.spherical_delta.phi;
        }

        spherical.phi = spherical.phi.clamp(p.min_polar_angle, p.max_polar_angle);
        spherical.make_safe();

        spherical.radius = (spherical.radius * self.scale).clamp(p.min_distance, p.max_distance);

        if p.enable_damping {
            self.target += self.pan_offset * p.damping_factor;
        } else {
            self.target += self.pan_offset;
        }

        camera.position = self.target + to_y_up.inverse() * spherical.to_offset();
        camera.look_at(self.target);

        if p.enable_damping {
            let keep = 1.0 - p.damping_factor;
            self.spherical_delta.theta *= keep;
            self.spherical_delta.phi *= keep;
            self.pan_offset *= keep;
        } else {
            self.spherical_delta = Spherical::default();
            self.pan_offset = Vector3::zeros();
        }
        self.scale = 1.0;

        let moved = (camera.position - self.last_position).norm_squared() > EPS
            || (self.target - self.last_target).norm_squared() > EPS;

        if moved {
            self.last_position = camera.position;
            self.last_target = self.target;
        }
        moved
    }
}

/// Rotation taking `up` onto +Y.
///
/// An `up` pointing along -Y gets a half turn about an axis orthogonal to it.
fn y_up_rotation(up: &Vector3<f32>) -> UnitQuaternion<f32> {
    let Some(from) = Unit::try_new(*up, EPS) else {
        return UnitQuaternion::identity();
    };

    UnitQuaternion::rotation_between_axis(&from, &Vector3::y_axis()).unwrap_or_else(|| {
        let axis = if from.x.abs() > from.z.abs() {
            Vector3::new(-from.y, from.x, 0.0)
        } else {
            Vector3::new(0.0, -from.z, from.y)
        };
        UnitQuaternion::from_axis_angle(&Unit::new_normalize(axis), PI)
    })
}
