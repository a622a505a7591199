use thiserror::Error;

pub const DEFAULT_SEARCH_EDGE: usize = 2;
pub const DEFAULT_PAIR_CAPACITY: usize = 1000;
pub const DEFAULT_CHUNK_SIZE: usize = 10;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

/// Parameters of a neighbor-list builder. Fixed for the lifetime of a
/// [`NeighborList`](super::neighbor_list::NeighborList).
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborListConfig {
    /// Distance beyond which the pairwise energy is zero.
    pub cutoff: f64,
    /// Margin added to the cutoff so lists stay valid while atoms drift less than half of it.
    pub buffer: f64,
    /// Half-width, in sub-cells, of the neighbor search block along a, b and c.
    pub search_edge: [usize; 3],
    /// Initial capacity of each worker's pair buffer.
    pub pair_capacity: usize,
    /// Minimum number of atoms handed to a worker at a time.
    pub chunk_size: usize,
    /// Also keep the per-atom, per-searched-sub-cell partition of every list.
    pub cell_lists: bool,
}

impl NeighborListConfig {
    pub fn new(cutoff: f64, buffer: f64) -> Self {
        Self {
            cutoff,
            buffer,
            search_edge: [DEFAULT_SEARCH_EDGE; 3],
            pair_capacity: DEFAULT_PAIR_CAPACITY,
            chunk_size: DEFAULT_CHUNK_SIZE,
            cell_lists: false,
        }
    }

    /// Cutoff plus buffer: the radius of the list.
    #[inline]
    pub fn total(&self) -> f64 {
        self.cutoff + self.buffer
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.cutoff.is_finite() || self.cutoff <= 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "cutoff",
                reason: format!("must be positive and finite, got {}", self.cutoff),
            });
        }
        if !self.buffer.is_finite() || self.buffer < 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "buffer",
                reason: format!("must be non-negative and finite, got {}", self.buffer),
            });
        }
        if self.search_edge.contains(&0) {
            return Err(ConfigError::InvalidParameter {
                name: "search_edge",
                reason: format!("every axis must be at least 1, got {:?}", self.search_edge),
            });
        }
        if self.pair_capacity == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "pair_capacity",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.chunk_size == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "chunk_size",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct NeighborListConfigBuilder {
    cutoff: Option<f64>,
    buffer: Option<f64>,
    search_edge: Option<[usize; 3]>,
    pair_capacity: Option<usize>,
    chunk_size: Option<usize>,
    cell_lists: Option<bool>,
}

impl NeighborListConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cutoff(mut self, cutoff: f64) -> Self {
        self.cutoff = Some(cutoff);
        self
    }
    pub fn buffer(mut self, buffer: f64) -> Self {
        self.buffer = Some(buffer);
        self
    }
    pub fn search_edge(mut self, edge: usize) -> Self {
        self.search_edge = Some([edge; 3]);
        self
    }
    pub fn search_edges(mut self, edges: [usize; 3]) -> Self {
        self.search_edge = Some(edges);
        self
    }
    pub fn pair_capacity(mut self, capacity: usize) -> Self {
        self.pair_capacity = Some(capacity);
        self
    }
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = Some(size);
        self
    }
    pub fn cell_lists(mut self, enabled: bool) -> Self {
        self.cell_lists = Some(enabled);
        self
    }

    pub fn build(self) -> Result<NeighborListConfig, ConfigError> {
        let config = NeighborListConfig {
            cutoff: self.cutoff.ok_or(ConfigError::MissingParameter("cutoff"))?,
            buffer: self.buffer.ok_or(ConfigError::MissingParameter("buffer"))?,
            search_edge: self.search_edge.unwrap_or([DEFAULT_SEARCH_EDGE; 3]),
            pair_capacity: self.pair_capacity.unwrap_or(DEFAULT_PAIR_CAPACITY),
            chunk_size: self.chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE),
            cell_lists: self.cell_lists.unwrap_or(false),
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_succeeds_with_required_parameters() {
        let config = NeighborListConfigBuilder::new()
            .cutoff(9.0)
            .buffer(2.0)
            .build()
            .unwrap();

        assert_eq!(config.total(), 11.0);
        assert_eq!(config.search_edge, [2, 2, 2]);
        assert_eq!(config.pair_capacity, 1000);
        assert_eq!(config.chunk_size, 10);
        assert!(!config.cell_lists);
    }

    #[test]
    fn builder_fails_if_cutoff_is_missing() {
        let result = NeighborListConfigBuilder::new().buffer(2.0).build();
        assert_eq!(result, Err(ConfigError::MissingParameter("cutoff")));
    }

    #[test]
    fn builder_fails_if_buffer_is_missing() {
        let result = NeighborListConfigBuilder::new().cutoff(9.0).build();
        assert_eq!(result, Err(ConfigError::MissingParameter("buffer")));
    }

    #[test]
    fn builder_applies_overrides() {
        let config = NeighborListConfigBuilder::new()
            .cutoff(7.0)
            .buffer(1.0)
            .search_edges([1, 2, 3])
            .pair_capacity(16)
            .chunk_size(4)
            .cell_lists(true)
            .build()
            .unwrap();

        assert_eq!(config.search_edge, [1, 2, 3]);
        assert_eq!(config.pair_capacity, 16);
        assert_eq!(config.chunk_size, 4);
        assert!(config.cell_lists);
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut config = NeighborListConfig::new(-1.0, 2.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidParameter { name: "cutoff", .. })
        ));

        config.cutoff = 9.0;
        config.buffer = f64::NAN;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidParameter { name: "buffer", .. })
        ));

        config.buffer = 0.0;
        config.search_edge = [2, 0, 2];
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidParameter {
                name: "search_edge",
                ..
            })
        ));

        config.search_edge = [2, 2, 2];
        config.chunk_size = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidParameter {
                name: "chunk_size",
                ..
            })
        ));
    }
}
