/// Name of the buffer whose length drives the draw call.
pub const POSITION_BUFFER: &str = "position";

/// Components per vertex assumed when deriving the draw count from `position`.
const POSITION_COMPONENTS: usize = 3;

/// Named per-vertex attribute buffer.
///
/// `data` is flattened; its length is always a multiple of `components`.
#[derive(Debug, Clone)]
pub struct BufferBinding<B> {
    components: usize,
    data: Vec<f32>,
    pub(crate) handle: Option<B>,
    pub(crate) attrib: Option<u32>,
}

impl<B> BufferBinding<B> {
    /// Creates an unallocated binding. `None` if `data` does not divide into
    /// whole vertices or `components` is zero.
    pub fn new(components: usize, data: Vec<f32>) -> Option<Self> {
        if !fits(components, data.len()) {
            return None;
        }
        Some(Self {
            components,
            data,
            handle: None,
            attrib: None,
        })
    }

    pub fn components(&self) -> usize {
        self.components
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Replaces the data. Hands it back unchanged if the length does not fit.
    pub(crate) fn store(&mut self, data: Vec<f32>) -> Result<(), Vec<f32>> {
        if !fits(self.components, data.len()) {
            return Err(data);
        }
        self.data = data;
        Ok(())
    }
}

fn fits(components: usize, len: usize) -> bool {
    components > 0 && len % components == 0
}

/// Vertex count drawn for a `position` buffer of `len` floats.
pub fn position_vertex_count(len: usize) -> usize {
    len / POSITION_COMPONENTS
}
