//! Sizing knobs for the context's fixed-capacity storage.

use crate::draw::Vertex;
use crate::widget::Widget;

const MIB: usize = 1024 * 1024;

/// Byte budgets for the widget pool and the per-frame geometry arena.
///
/// Every budget is fixed at construction; nothing grows at render time.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    pub widget_buffer_size: usize,
    pub vertex_buffer_size: usize,
    pub index_buffer_size: usize,
    /// Number of equal partitions the vertex and index arenas are split into.
    /// One draw batch occupies one partition.
    pub buffer_count: usize,
    pub max_fonts: usize,
    pub atlas: AtlasConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            widget_buffer_size: MIB,
            vertex_buffer_size: MIB,
            index_buffer_size: MIB,
            buffer_count: 50,
            max_fonts: 32,
            atlas: AtlasConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn widget_capacity(&self) -> usize {
        self.widget_buffer_size / core::mem::size_of::<Widget>()
    }

    /// Vertices one batch can hold. Capped so every vertex stays addressable
    /// by a 16-bit index.
    pub fn vertices_per_batch(&self) -> usize {
        let per = self.vertex_buffer_size / core::mem::size_of::<Vertex>() / self.buffer_count.max(1);
        per.min(u16::MAX as usize + 1)
    }

    pub fn indices_per_batch(&self) -> usize {
        self.index_buffer_size / core::mem::size_of::<u16>() / self.buffer_count.max(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AtlasConfig {
    pub width: u32,
    pub height: u32,
    /// Merge adjacent free slices every time a font releases its band.
    pub coalesce_free_slices: bool,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 1024,
            coalesce_free_slices: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_capacity_is_index_addressable() {
        let config = EngineConfig {
            vertex_buffer_size: 64 * MIB,
            buffer_count: 1,
            ..Default::default()
        };
        assert_eq!(config.vertices_per_batch(), 65536);
    }

    #[test]
    fn budgets_split_evenly() {
        let config = EngineConfig {
            index_buffer_size: 1000,
            buffer_count: 5,
            ..Default::default()
        };
        assert_eq!(config.indices_per_batch(), 100);
        assert!(config.widget_capacity() > 0);
    }
}
