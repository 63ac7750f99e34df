/// Failures surfaced by `SceneBootstrap`.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// The configured surface identifier does not resolve in the host.
    #[error("drawing surface `{id}` not found")]
    SurfaceNotFound { id: String },

    #[error("scene is already initialized")]
    AlreadyInitialized,

    #[error("scene is not initialized")]
    NotInitialized,

    /// Any failure from the host, the renderer or its surface, unmodified.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
