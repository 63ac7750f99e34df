use nalgebra::{Isometry3, Matrix4, Perspective3, Point3, Vector3};

/// Smallest aspect ratio handed to the projection.
///
/// `Perspective3` rejects a zero aspect; a collapsed viewport still needs a
/// well-formed matrix.
const MIN_ASPECT: f32 = 1e-6;

/// Perspective projection camera.
///
/// Convention: right-handed, +Y up, looking down -Z until pointed elsewhere.
/// `fov` is the vertical field of view in degrees.
///
/// The projection matrix is cached. After changing `fov`, `aspect`, `near` or
/// `far`, call [`update_projection_matrix`](Self::update_projection_matrix).
#[derive(Debug, Clone)]
pub struct PerspectiveCamera {
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,

    pub position: Point3<f32>,
    pub up: Vector3<f32>,

    target: Point3<f32>,
    projection: Matrix4<f32>,
}

impl PerspectiveCamera {
    pub fn new(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        debug_assert!(near > 0.0 && far > near, "invalid clip range {near}..{far}");

        let mut camera = Self {
            fov,
            aspect,
            near,
            far,
            position: Point3::origin(),
            up: Vector3::y(),
            target: Point3::new(0.0, 0.0, -1.0),
            projection: Matrix4::identity(),
        };
        camera.update_projection_matrix();
        camera
    }

    /// Recomputes the cached projection from `fov`, `aspect`, `near` and `far`.
    pub fn update_projection_matrix(&mut self) {
        let aspect = if self.aspect.is_finite() { self.aspect.max(MIN_ASPECT) } else { 1.0 };
        self.projection =
            Perspective3::new(aspect, self.fov.to_radians(), self.near, self.far).to_homogeneous();
    }

    #[inline]
    pub fn projection_matrix(&self) -> &Matrix4<f32> {
        &self.projection
    }

    /// Points the camera at `target` from its current position.
    pub fn look_at(&mut self, target: Point3<f32>) {
        self.target = target;
    }

    #[inline]
    pub fn target(&self) -> Point3<f32> {
        self.target
    }

    /// Unit vector from the camera towards its target.
    ///
    /// Falls back to -Z when position and target coincide.
    pub fn forward(&self) -> Vector3<f32> {
        (self.target - self.position)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(|| -Vector3::z())
    }

    /// Camera-space +X expressed in world space.
    pub fn right(&self) -> Vector3<f32> {
        self.forward()
            .cross(&self.up)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vector3::x)
    }

    /// Camera-space +Y expressed in world space.
    pub fn camera_up(&self) -> Vector3<f32> {
        self.right().cross(&self.forward())
    }

    /// World-to-camera transform.
    pub fn view_matrix(&self) -> Matrix4<f32> {
        let target = self.position + self.forward();
        Isometry3::look_at_rh(&self.position, &target, &self.up).to_homogeneous()
    }

    /// `projection * view`.
    pub fn view_projection(&self) -> Matrix4<f32> {
        self.projection * self.view_matrix()
    }
}
