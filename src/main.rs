use anyhow::{anyhow, Context};
use probe_buckets::{
    Entry, GrowthManager, HashLab, ItemKind, LabConfig, ProbeMode, ProcessSummary,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::env;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    const SAMPLE_SIZE: usize = 40;
    const SEED: u64 = 2024;

    let args: Vec<String> = env::args().skip(1).collect();
    let print_events: bool = args.iter().any(|a| a == "--events");
    let print_table: bool = args.iter().any(|a| a == "--table");
    let modes: Vec<ProbeMode> = match args.iter().skip_while(|a| *a != "--mode").nth(1) {
        Some(name) => vec![name
            .parse::<ProbeMode>()
            .with_context(|| format!("bad --mode argument {:?}", name))?],
        None => ProbeMode::ALL.to_vec(),
    };
    let config: LabConfig = LabConfig::from_env().context("reading lab configuration")?;

    for &mode in modes.iter() {
        let mut rng: StdRng = StdRng::seed_from_u64(SEED);
        let mut lab: HashLab<ItemKind> = HashLab::with_mode(config, mode)?;
        lab.add_random_batch(&mut rng, SAMPLE_SIZE)
            .with_context(|| format!("queueing the {} batch", mode))?;

        let now: Instant = Instant::now();
        let summary: ProcessSummary = lab.process_all()?;
        let elapsed: usize = now.elapsed().as_nanos() as usize;

        let forced: u64 = lab.force_collision(&mut rng)?;
        if let Err(e) = lab.process_next() {
            if !e.is_soft() {
                return Err(e.into());
            }
            println!("Forced collision {} was not placed: {}", forced, e);
        }

        if print_events {
            for event in lab.drain_events() {
                println!("{}", event.to_json_line().context("encoding event")?);
            }
        }

        println!("{}", lab.report());
        println!(
            "Placed {} exhausted {} still waiting {}",
            summary.placed,
            summary.exhausted,
            lab.waiting().len()
        );
        println!("Avg time to place {}", elapsed as f64 / SAMPLE_SIZE as f64);
        if print_table {
            lab.table().print();
        }
        println!();
    }

    benchmarking::warm_up();
    for &mode in modes.iter() {
        let mut rng: StdRng = StdRng::seed_from_u64(SEED);
        let ids: Vec<u64> = (0..SAMPLE_SIZE).map(|_| ItemKind::random_id(&mut rng)).collect();
        let bench_result = benchmarking::measure_function(move |measurer| {
            measurer.measure(|| {
                let mut growth: GrowthManager<ItemKind> = GrowthManager::new(&config);
                for &id in ids.iter() {
                    growth.store(mode, Entry::new(id, ItemKind::Sword));
                }
                growth.table().count_stored()
            });
        })
        .map_err(|e| anyhow!("benchmark failed: {:?}", e))?;
        println!(
            "Avg time to fill a {} table with {} items {:?}",
            mode,
            SAMPLE_SIZE,
            bench_result.elapsed()
        );
    }

    Ok(())
}
