use crate::cli::VerifyArgs;
use crate::config::PartialRunConfig;
use crate::error::{CliError, Result};
use std::collections::HashSet;
use tracing::info;
use verletpp::core::masking::{MaskingRules, NoMasking};
use verletpp::engine::lists::VerletLists;
use verletpp::utils::brute_force::{brute_force_mate_pairs, brute_force_pairs};

pub fn run(args: VerifyArgs) -> Result<()> {
    let config = PartialRunConfig::load(&args.system)?.merge_with_cli(&args.system, None, None)?;
    let (system, mut builder, mask) = super::prepare(&config)?;
    let copies = system.copies();

    let mut lists = VerletLists::new();
    builder.build_list(&copies, &mut lists, true, true)?;

    let radius = config.neighbor_list.total();
    let masking: &dyn MaskingRules = match &mask {
        Some(mask) => mask.as_ref(),
        None => &NoMasking,
    };

    info!("Running exhaustive search over {} atoms.", config.atoms);
    let mut problems = Vec::new();

    let mut listed: Vec<(usize, usize)> = lists
        .iter_pairs(0)
        .map(|(i, j)| (i.min(j), i.max(j)))
        .collect();
    listed.sort_unstable();
    let unique: HashSet<_> = listed.iter().copied().collect();
    if unique.len() != listed.len() {
        problems.push(format!(
            "asymmetric unit: {} pairs stored twice",
            listed.len() - unique.len()
        ));
    }
    let expected = brute_force_pairs(&system.cell, &copies[0], radius, masking);
    compare("asymmetric unit", &expected, &listed, &mut problems);

    for (symmetry, mate) in copies.iter().enumerate().skip(1) {
        let mut found: Vec<_> = lists.iter_pairs(symmetry).collect();
        found.sort_unstable();
        let expected = brute_force_mate_pairs(&system.cell, &copies[0], mate, radius);
        compare(&format!("symmetry copy {symmetry}"), &expected, &found, &mut problems);
    }

    if problems.is_empty() {
        println!(
            "Neighbor lists match the exhaustive search: {} pairs over {} symmetry copies.",
            lists.total_pairs(),
            lists.symmetry_count()
        );
        Ok(())
    } else {
        Err(CliError::Verification(problems.join("; ")))
    }
}

fn compare(
    label: &str,
    expected: &[(usize, usize)],
    found: &[(usize, usize)],
    problems: &mut Vec<String>,
) {
    let expected: HashSet<_> = expected.iter().collect();
    let found: HashSet<_> = found.iter().collect();
    let missing = expected.difference(&found).count();
    let extra = found.difference(&expected).count();
    if missing > 0 || extra > 0 {
        problems.push(format!("{label}: {missing} missing, {extra} unexpected"));
    }
}
