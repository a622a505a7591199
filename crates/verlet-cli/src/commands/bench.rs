use crate::cli::BenchArgs;
use crate::config::PartialRunConfig;
use crate::error::Result;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use verletpp::engine::lists::VerletLists;

pub fn run(args: BenchArgs) -> Result<()> {
    let config =
        PartialRunConfig::load(&args.system)?.merge_with_cli(&args.system, args.steps, args.drift)?;
    info!(
        atoms = config.atoms,
        steps = config.steps,
        space_group = config.cell.space_group().name(),
        "Starting neighbor list benchmark."
    );

    let (mut system, mut builder, _) = super::prepare(&config)?;
    let mut lists = VerletLists::new();
    let mut rebuilds = 0;
    let mut build_time = Duration::ZERO;
    let mut buffer_growths = 0;

    for step in 0..config.steps {
        let coordinates = system.copies();
        let start = Instant::now();
        let first = step == 0;
        let outcome = builder.build_list(&coordinates, &mut lists, first, first)?;
        build_time += start.elapsed();

        if let Some(report) = outcome.report() {
            rebuilds += 1;
            buffer_growths += report.buffer_growths;
            debug!(step, pairs = report.total_pairs(), "Lists rebuilt.");
        }
        system.drift(config.drift);
    }

    println!(
        "{} steps, {} rebuilds, {:.3} s in build_list ({:.3} ms/step)",
        config.steps,
        rebuilds,
        build_time.as_secs_f64(),
        1e3 * build_time.as_secs_f64() / config.steps.max(1) as f64,
    );
    println!(
        "{} pairs in the final lists ({} in the asymmetric unit), {} pair-buffer growths",
        lists.total_pairs(),
        lists.pair_count(0),
        buffer_growths,
    );
    Ok(())
}
