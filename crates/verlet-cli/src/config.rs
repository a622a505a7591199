use crate::cli::SystemArgs;
use crate::error::{CliError, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;
use verletpp::core::crystal::{SpaceGroup, UnitCell};
use verletpp::engine::config::{NeighborListConfig, NeighborListConfigBuilder};

/// Built-in values used when neither the command line nor the configuration file sets one.
pub struct DefaultsConfig {
    pub atoms: usize,
    pub edge: f64,
    pub angle: f64,
    pub space_group: String,
    pub seed: u64,
    pub cutoff: f64,
    pub buffer: f64,
    pub steps: usize,
    pub drift: f64,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            atoms: 1000,
            edge: 40.0,
            angle: 90.0,
            space_group: "P1".to_string(),
            seed: 42,
            cutoff: 9.0,
            buffer: 2.0,
            steps: 20,
            drift: 0.05,
        }
    }
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
struct PartialCellConfig {
    a: Option<f64>,
    b: Option<f64>,
    c: Option<f64>,
    alpha: Option<f64>,
    beta: Option<f64>,
    gamma: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialSystemConfig {
    atoms: Option<usize>,
    seed: Option<u64>,
    space_group: Option<String>,
    chain: Option<bool>,
    cell: Option<PartialCellConfig>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialNeighborListConfig {
    cutoff: Option<f64>,
    buffer: Option<f64>,
    search_edge: Option<[usize; 3]>,
    pair_capacity: Option<usize>,
    chunk_size: Option<usize>,
    cell_lists: Option<bool>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialBenchConfig {
    steps: Option<usize>,
    drift: Option<f64>,
}

/// Contents of a configuration file; every table and key is optional.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PartialRunConfig {
    system: Option<PartialSystemConfig>,
    neighbor_list: Option<PartialNeighborListConfig>,
    bench: Option<PartialBenchConfig>,
}

/// Fully resolved settings of one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub cell: UnitCell,
    pub atoms: usize,
    pub seed: u64,
    pub chain: bool,
    pub neighbor_list: NeighborListConfig,
    pub steps: usize,
    pub drift: f64,
}

impl PartialRunConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Reading configuration from {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Loads the file named by `--config`, or starts from an empty configuration.
    pub fn load(args: &SystemArgs) -> Result<Self> {
        match &args.config {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Resolves every setting as command-line flag, then file, then built-in default.
    pub fn merge_with_cli(
        self,
        args: &SystemArgs,
        steps: Option<usize>,
        drift: Option<f64>,
    ) -> Result<RunConfig> {
        let defaults = DefaultsConfig::default();
        let system = self.system.unwrap_or_default();
        let nl = self.neighbor_list.unwrap_or_default();
        let bench = self.bench.unwrap_or_default();

        let space_group_name = args
            .space_group
            .clone()
            .or(system.space_group)
            .unwrap_or(defaults.space_group);
        let space_group = SpaceGroup::from_name(&space_group_name)?;

        let cell = system.cell.unwrap_or_default();
        let cell = match args.edge {
            Some(edge) => UnitCell::orthorhombic(edge, edge, edge, space_group)?,
            None => UnitCell::new(
                cell.a.unwrap_or(defaults.edge),
                cell.b.unwrap_or(defaults.edge),
                cell.c.unwrap_or(defaults.edge),
                cell.alpha.unwrap_or(defaults.angle),
                cell.beta.unwrap_or(defaults.angle),
                cell.gamma.unwrap_or(defaults.angle),
                space_group,
            )?,
        };

        let mut builder = NeighborListConfigBuilder::new()
            .cutoff(args.cutoff.or(nl.cutoff).unwrap_or(defaults.cutoff))
            .buffer(args.buffer.or(nl.buffer).unwrap_or(defaults.buffer))
            .cell_lists(nl.cell_lists.unwrap_or(false));
        if let Some(edges) = nl.search_edge {
            builder = builder.search_edges(edges);
        }
        if let Some(capacity) = nl.pair_capacity {
            builder = builder.pair_capacity(capacity);
        }
        if let Some(chunk) = nl.chunk_size {
            builder = builder.chunk_size(chunk);
        }
        let neighbor_list = builder.build()?;

        let drift = drift.or(bench.drift).unwrap_or(defaults.drift);
        if !drift.is_finite() || drift < 0.0 {
            return Err(CliError::Config(format!(
                "drift must be non-negative and finite, got {drift}"
            )));
        }

        Ok(RunConfig {
            cell,
            atoms: args.atoms.or(system.atoms).unwrap_or(defaults.atoms),
            seed: args.seed.or(system.seed).unwrap_or(defaults.seed),
            chain: args.chain || system.chain.unwrap_or(false),
            neighbor_list,
            steps: steps.or(bench.steps).unwrap_or(defaults.steps),
            drift,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use verletpp::core::crystal::Crystal;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_apply_without_a_file() {
        let config = PartialRunConfig::default()
            .merge_with_cli(&SystemArgs::default(), None, None)
            .unwrap();

        assert_eq!(config.atoms, 1000);
        assert_eq!(config.seed, 42);
        assert_eq!(config.cell.dimensions(), [40.0, 40.0, 40.0]);
        assert_eq!(config.cell.symmetry_count(), 1);
        assert_eq!(config.neighbor_list.cutoff, 9.0);
        assert_eq!(config.neighbor_list.buffer, 2.0);
        assert_eq!(config.steps, 20);
        assert!(!config.chain);
    }

    #[test]
    fn file_values_override_defaults() {
        let file = write_config(
            r#"
            [system]
            atoms = 250
            space-group = "P212121"
            chain = true

            [system.cell]
            a = 30.0
            b = 32.0
            c = 34.0

            [neighbor-list]
            cutoff = 7.0
            buffer = 1.0
            chunk-size = 4
            cell-lists = true

            [bench]
            steps = 5
            "#,
        );
        let config = PartialRunConfig::from_file(file.path())
            .unwrap()
            .merge_with_cli(&SystemArgs::default(), None, None)
            .unwrap();

        assert_eq!(config.atoms, 250);
        assert_eq!(config.cell.dimensions(), [30.0, 32.0, 34.0]);
        assert_eq!(config.cell.symmetry_count(), 4);
        assert_eq!(config.neighbor_list.total(), 8.0);
        assert_eq!(config.neighbor_list.chunk_size, 4);
        assert!(config.neighbor_list.cell_lists);
        assert_eq!(config.steps, 5);
        assert!(config.chain);
    }

    #[test]
    fn cli_values_override_file_values() {
        let file = write_config(
            r#"
            [system]
            atoms = 250
            [neighbor-list]
            cutoff = 7.0
            buffer = 1.0
            "#,
        );
        let args = SystemArgs {
            atoms: Some(10),
            edge: Some(25.0),
            cutoff: Some(8.0),
            space_group: Some("P-1".to_string()),
            ..SystemArgs::default()
        };
        let config = PartialRunConfig::from_file(file.path())
            .unwrap()
            .merge_with_cli(&args, Some(3), Some(0.1))
            .unwrap();

        assert_eq!(config.atoms, 10);
        assert_eq!(config.cell.dimensions(), [25.0, 25.0, 25.0]);
        assert_eq!(config.cell.symmetry_count(), 2);
        assert_eq!(config.neighbor_list.cutoff, 8.0);
        assert_eq!(config.neighbor_list.buffer, 1.0);
        assert_eq!(config.steps, 3);
        assert_eq!(config.drift, 0.1);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let file = write_config(
            r#"
            [neighbor-list]
            cutof = 7.0
            "#,
        );
        assert!(matches!(
            PartialRunConfig::from_file(file.path()),
            Err(CliError::FileParsing { .. })
        ));
    }

    #[test]
    fn invalid_values_surface_as_errors() {
        let args = SystemArgs {
            space_group: Some("P6322".to_string()),
            ..SystemArgs::default()
        };
        assert!(matches!(
            PartialRunConfig::default().merge_with_cli(&args, None, None),
            Err(CliError::Crystal(_))
        ));

        let args = SystemArgs {
            buffer: Some(-1.0),
            ..SystemArgs::default()
        };
        assert!(matches!(
            PartialRunConfig::default().merge_with_cli(&args, None, None),
            Err(CliError::Config(_))
        ));
    }
}
