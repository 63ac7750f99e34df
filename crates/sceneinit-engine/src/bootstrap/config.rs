use crate::controls::OrbitParams;

/// Construction-time scene configuration.
#[derive(Debug, Clone)]
pub struct SceneConfig {
    /// Identifier of the pre-existing drawing surface.
    pub surface_id: String,

    /// Vertical field of view in degrees.
    pub fov: f32,

    /// Stored clip distances. Camera creation uses its own literals.
    pub near_plane: f32,
    pub far_plane: f32,

    pub orbit: OrbitParams,
}

impl SceneConfig {
    pub fn new(surface_id: impl Into<String>) -> Self {
        Self {
            surface_id: surface_id.into(),
            fov: 45.0,
            near_plane: 1.0,
            far_plane: 1000.0,
            orbit: OrbitParams::default(),
        }
    }
}
