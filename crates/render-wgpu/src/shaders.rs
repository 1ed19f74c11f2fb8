//! Built-in WGSL programs.
//!
//! Bind group 0 holds the camera uniform in every program; the sprite
//! program reads its texture and sampler from group 1. Mesh attributes start
//! at location 0, per-instance attributes at [`INSTANCE_LOCATION`].

/// First shader location used by [`crate::InstanceData`].
pub const INSTANCE_LOCATION: u32 = 4;

/// Board cell lines: position and colour per vertex.
pub const BOARD_SHADER: &str = r#"
struct Camera {
    view_proj: mat4x4<f32>,
};

@group(0) @binding(0)
var<uniform> camera: Camera;

struct LineVertex {
    @location(0) position: vec2<f32>,
    @location(1) color: vec4<f32>,
};

struct LineOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec4<f32>,
};

@vertex
fn vs_main(vertex: LineVertex) -> LineOutput {
    var out: LineOutput;
    out.clip_position = camera.view_proj * vec4<f32>(vertex.position, 0.0, 1.0);
    out.color = vertex.color;
    return out;
}

@fragment
fn fs_main(in: LineOutput) -> @location(0) vec4<f32> {
    return in.color;
}
"#;

/// Body segments: flat tinted quad, darkened towards its rim.
pub const BODY_SHADER: &str = r#"
struct Camera {
    view_proj: mat4x4<f32>,
};

@group(0) @binding(0)
var<uniform> camera: Camera;

struct QuadVertex {
    @location(0) position: vec2<f32>,
};

struct InstanceInput {
    @location(4) model_0: vec4<f32>,
    @location(5) model_1: vec4<f32>,
    @location(6) model_2: vec4<f32>,
    @location(7) model_3: vec4<f32>,
    @location(8) tint: vec4<f32>,
};

struct BodyOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) local: vec2<f32>,
    @location(1) tint: vec4<f32>,
};

@vertex
fn vs_main(vertex: QuadVertex, instance: InstanceInput) -> BodyOutput {
    let model = mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );
    var out: BodyOutput;
    out.clip_position = camera.view_proj * model * vec4<f32>(vertex.position, 0.0, 1.0);
    out.local = vertex.position;
    out.tint = instance.tint;
    return out;
}

@fragment
fn fs_main(in: BodyOutput) -> @location(0) vec4<f32> {
    let rim = max(abs(in.local.x), abs(in.local.y));
    let shade = mix(1.0, 0.7, smoothstep(0.75, 1.0, rim));
    return vec4<f32>(in.tint.rgb * shade, in.tint.a);
}
"#;

/// Head and fruit: textured quad multiplied by the instance tint.
pub const SPRITE_SHADER: &str = r#"
struct Camera {
    view_proj: mat4x4<f32>,
};

@group(0) @binding(0)
var<uniform> camera: Camera;

@group(1) @binding(0)
var sprite_texture: texture_2d<f32>;
@group(1) @binding(1)
var sprite_sampler: sampler;

struct SpriteVertex {
    @location(0) position: vec2<f32>,
    @location(1) uv: vec2<f32>,
};

struct InstanceInput {
    @location(4) model_0: vec4<f32>,
    @location(5) model_1: vec4<f32>,
    @location(6) model_2: vec4<f32>,
    @location(7) model_3: vec4<f32>,
    @location(8) tint: vec4<f32>,
};

struct SpriteOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) tint: vec4<f32>,
};

@vertex
fn vs_main(vertex: SpriteVertex, instance: InstanceInput) -> SpriteOutput {
    let model = mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );
    var out: SpriteOutput;
    out.clip_position = camera.view_proj * model * vec4<f32>(vertex.position, 0.0, 1.0);
    out.uv = vertex.uv;
    out.tint = instance.tint;
    return out;
}

@fragment
fn fs_main(in: SpriteOutput) -> @location(0) vec4<f32> {
    return textureSample(sprite_texture, sprite_sampler, in.uv) * in.tint;
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_program_has_both_entry_points() {
        for src in [BOARD_SHADER, BODY_SHADER, SPRITE_SHADER] {
            assert!(src.contains("fn vs_main"));
            assert!(src.contains("fn fs_main"));
            assert!(src.contains("@group(0) @binding(0)"));
        }
    }

    #[test]
    fn instanced_programs_read_from_instance_location() {
        let first = format!("@location({INSTANCE_LOCATION}) model_0");
        assert!(BODY_SHADER.contains(&first));
        assert!(SPRITE_SHADER.contains(&first));
        assert!(!BOARD_SHADER.contains(&first));
    }
}
