/// Scalar component type of a vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    F32,
    U32,
    I32,
    U8,
}

impl ScalarType {
    pub fn size(self) -> usize {
        match self {
            ScalarType::F32 | ScalarType::U32 | ScalarType::I32 => 4,
            ScalarType::U8 => 1,
        }
    }
}

/// One attribute in an interleaved vertex: `count` scalars of one type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub scalar: ScalarType,
    pub count: u32,
    pub normalized: bool,
}

impl VertexAttribute {
    pub fn size(&self) -> usize {
        self.scalar.size() * self.count as usize
    }
}

/// Ordered attribute list of an interleaved vertex buffer.
///
/// Attribute `i` is bound to shader location `i`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BufferLayout {
    attributes: Vec<VertexAttribute>,
    stride: usize,
}

impl BufferLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, scalar: ScalarType, count: u32, normalized: bool) {
        let attr = VertexAttribute {
            scalar,
            count,
            normalized,
        };
        self.stride += attr.size();
        self.attributes.push(attr);
    }

    /// Builder form of [`push`](Self::push) for non-normalized attributes.
    pub fn with(mut self, scalar: ScalarType, count: u32) -> Self {
        self.push(scalar, count, false);
        self
    }

    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes
    }

    /// Size of one vertex in bytes.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// `(byte offset, attribute)` pairs in declaration order.
    pub fn offsets(&self) -> impl Iterator<Item = (usize, &VertexAttribute)> + '_ {
        self.attributes.iter().scan(0usize, |offset, attr| {
            let at = *offset;
            *offset += attr.size();
            Some((at, attr))
        })
    }

    /// Number of `f32` values per vertex, when every attribute is `F32`.
    pub fn floats_per_vertex(&self) -> Option<usize> {
        self.attributes
            .iter()
            .all(|a| a.scalar == ScalarType::F32)
            .then(|| self.stride / 4)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    Triangles,
    Lines,
}

/// Geometry a GPU backend can upload and draw.
///
/// Each drawable kind implements this on its own; the backend builds one
/// vertex/index buffer pair from it and selects it per draw call.
pub trait Renderable {
    fn label(&self) -> &'static str;

    /// Interleaved vertex data following [`attribute_layout`](Self::attribute_layout).
    fn vertex_data(&self) -> Vec<f32>;

    fn index_data(&self) -> Vec<u32>;

    fn attribute_layout(&self) -> BufferLayout;

    fn topology(&self) -> Topology {
        Topology::Triangles
    }

    fn vertex_count(&self) -> usize {
        let data = self.vertex_data();
        match self.attribute_layout().floats_per_vertex() {
            Some(n) if n > 0 => data.len() / n,
            _ => 0,
        }
    }
}

const QUAD_INDICES: [u32; 6] = [0, 1, 2, 0, 2, 3];

/// Unit quad spanning `[-1, 1]^2`, with texture coordinates when `uv` is set.
fn quad_vertices(uv: bool) -> Vec<f32> {
    const MIN: f32 = -1.0;
    const MAX: f32 = 1.0;
    if uv {
        #[rustfmt::skip]
        let v = vec![
            MIN, MIN, 0.0, 1.0,
            MAX, MIN, 1.0, 1.0,
            MAX, MAX, 1.0, 0.0,
            MIN, MAX, 0.0, 0.0,
        ];
        v
    } else {
        vec![MIN, MIN, MAX, MIN, MAX, MAX, MIN, MAX]
    }
}

/// Body segment: untextured quad, position only.
#[derive(Debug, Clone, Copy, Default)]
pub struct SegmentShape;

impl Renderable for SegmentShape {
    fn label(&self) -> &'static str {
        "segment"
    }

    fn vertex_data(&self) -> Vec<f32> {
        quad_vertices(false)
    }

    fn index_data(&self) -> Vec<u32> {
        QUAD_INDICES.to_vec()
    }

    fn attribute_layout(&self) -> BufferLayout {
        BufferLayout::new().with(ScalarType::F32, 2)
    }
}

/// Snake head: textured quad.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadShape;

impl Renderable for HeadShape {
    fn label(&self) -> &'static str {
        "head"
    }

    fn vertex_data(&self) -> Vec<f32> {
        quad_vertices(true)
    }

    fn index_data(&self) -> Vec<u32> {
        QUAD_INDICES.to_vec()
    }

    fn attribute_layout(&self) -> BufferLayout {
        BufferLayout::new()
            .with(ScalarType::F32, 2)
            .with(ScalarType::F32, 2)
    }
}

/// Fruit: textured quad.
#[derive(Debug, Clone, Copy, Default)]
pub struct FruitShape;

impl Renderable for FruitShape {
    fn label(&self) -> &'static str {
        "fruit"
    }

    fn vertex_data(&self) -> Vec<f32> {
        quad_vertices(true)
    }

    fn index_data(&self) -> Vec<u32> {
        QUAD_INDICES.to_vec()
    }

    fn attribute_layout(&self) -> BufferLayout {
        BufferLayout::new()
            .with(ScalarType::F32, 2)
            .with(ScalarType::F32, 2)
    }
}

/// Cell boundary lines over a `board_size` x `board_size` board in world units.
#[derive(Debug, Clone, Copy)]
pub struct BoardLines {
    pub board_size: i32,
    pub color: [f32; 4],
}

impl BoardLines {
    pub fn new(board_size: i32) -> Self {
        Self {
            board_size,
            color: [0.25, 0.25, 0.6, 1.0],
        }
    }
}

impl Renderable for BoardLines {
    fn label(&self) -> &'static str {
        "board_lines"
    }

    fn vertex_data(&self) -> Vec<f32> {
        let mut verts = Vec::new();
        let extent = self.board_size as f32;
        let mut push = |x: f32, y: f32| {
            verts.extend_from_slice(&[x, y]);
            verts.extend_from_slice(&self.color);
        };
        for i in 0..=self.board_size {
            let offset = i as f32;
            // Lines along X
            push(0.0, offset);
            push(extent, offset);
            // Lines along Y
            push(offset, 0.0);
            push(offset, extent);
        }
        verts
    }

    fn index_data(&self) -> Vec<u32> {
        let count = 4 * (self.board_size.max(0) as u32 + 1);
        (0..count).collect()
    }

    fn attribute_layout(&self) -> BufferLayout {
        BufferLayout::new()
            .with(ScalarType::F32, 2)
            .with(ScalarType::F32, 4)
    }

    fn topology(&self) -> Topology {
        Topology::Lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_stride_and_offsets() {
        let mut layout = BufferLayout::new().with(ScalarType::F32, 3);
        layout.push(ScalarType::U8, 4, true);
        layout.push(ScalarType::F32, 2, false);
        assert_eq!(layout.stride(), 12 + 4 + 8);
        let offsets: Vec<usize> = layout.offsets().map(|(o, _)| o).collect();
        assert_eq!(offsets, vec![0, 12, 16]);
        assert_eq!(layout.floats_per_vertex(), None);
    }

    #[test]
    fn segment_quad_is_position_only() {
        let s = SegmentShape;
        assert_eq!(s.attribute_layout().stride(), 8);
        assert_eq!(s.vertex_count(), 4);
        assert_eq!(s.index_data(), vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn textured_quads_carry_uvs() {
        for shape in [&HeadShape as &dyn Renderable, &FruitShape] {
            assert_eq!(shape.attribute_layout().stride(), 16);
            assert_eq!(shape.vertex_count(), 4);
            let v = shape.vertex_data();
            // bottom-left corner samples the bottom of the image
            assert_eq!(&v[0..4], &[-1.0, -1.0, 0.0, 1.0]);
        }
    }

    #[test]
    fn indices_stay_in_range() {
        let shapes: [&dyn Renderable; 4] =
            [&SegmentShape, &HeadShape, &FruitShape, &BoardLines::new(10)];
        for shape in shapes {
            let n = shape.vertex_count() as u32;
            assert!(shape.index_data().iter().all(|&i| i < n), "{}", shape.label());
        }
    }

    #[test]
    fn board_lines_cover_every_boundary() {
        let lines = BoardLines::new(10);
        assert_eq!(lines.topology(), Topology::Lines);
        // 11 boundaries per axis, two endpoints each
        assert_eq!(lines.vertex_count(), 44);
        assert_eq!(lines.index_data().len(), 44);
    }
}
