pub mod bench;
pub mod verify;

use crate::config::RunConfig;
use crate::error::Result;
use std::sync::Arc;
use verletpp::core::crystal::Crystal;
use verletpp::core::masking::{ExclusionMask, MaskingRules};
use verletpp::engine::neighbor_list::NeighborList;
use verletpp::utils::synthetic::{SyntheticSystem, chain_bonds};

/// Exclusions for the configured system: 1-2 and 1-3 partners of a linear chain, or none.
fn masking_rules(config: &RunConfig) -> Result<Option<Arc<ExclusionMask>>> {
    if !config.chain {
        return Ok(None);
    }
    let mask = ExclusionMask::from_bonds(config.atoms, &chain_bonds(config.atoms))?;
    Ok(Some(Arc::new(mask)))
}

/// Seeded system plus a builder for it.
pub(crate) fn prepare(
    config: &RunConfig,
) -> Result<(SyntheticSystem, NeighborList, Option<Arc<ExclusionMask>>)> {
    let system = SyntheticSystem::new(config.cell.clone(), config.atoms, config.seed);
    let mask = masking_rules(config)?;
    let crystal: Arc<dyn Crystal> = Arc::new(config.cell.clone());
    let builder = NeighborList::new(
        mask.clone().map(|m| m as Arc<dyn MaskingRules>),
        crystal,
        config.atoms,
        config.neighbor_list.clone(),
    )?;
    Ok((system, builder, mask))
}
