use snake_render::ScalarType;
use std::path::PathBuf;

/// Errors raised while creating GPU resources.
#[derive(Debug, thiserror::Error)]
pub enum GpuError {
    #[error("shader program `{label}` failed to compile: {message}")]
    ShaderCompile { label: String, message: String },
    #[error("failed to read shader source {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("texture `{label}` is {width}x{height}, the device allows at most {max} per side")]
    TextureTooLarge {
        label: String,
        width: u32,
        height: u32,
        max: u32,
    },
    #[error("board side {0} needs more instances than a GPU buffer can index")]
    BoardTooLarge(i32),
    #[error("no vertex format for {count} x {scalar:?} (normalized: {normalized})")]
    UnsupportedAttribute {
        scalar: ScalarType,
        count: u32,
        normalized: bool,
    },
}
