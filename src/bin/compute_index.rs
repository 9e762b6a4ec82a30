use std::path::PathBuf;

use power_index::config::RunSpec;
use power_index::error::EngineError;
use power_index::index::compute;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn exit_code(e: &EngineError) -> i32 {
    match e {
        EngineError::InvalidConfiguration { .. } | EngineError::UnsupportedRepresentation { .. } => 2,
        _ => 1,
    }
}

fn main() {
    init_logging();

    let args: Vec<String> = std::env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: compute_index <run.json>");
        std::process::exit(2);
    }

    let path = PathBuf::from(&args[1]);
    let spec = match RunSpec::load(&path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to load {}: {e}", path.display());
            std::process::exit(exit_code(&e));
        }
    };

    let prepared = spec
        .index_kind()
        .and_then(|kind| Ok((kind, spec.build_game()?)));
    let (kind, game) = match prepared {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Invalid run spec: {e}");
            std::process::exit(2);
        }
    };

    let result = match compute(&game, kind, &spec.options()) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Computation failed: {e}");
            std::process::exit(exit_code(&e));
        }
    };

    let d = &result.diagnostics;
    let strings = |v: &[String]| spec.reported_values(&game, v);
    let values: Vec<String> = result.values.iter().map(|v| v.to_string()).collect();
    let raw_counts = d
        .raw_counts
        .as_ref()
        .map(|r| strings(&r.iter().map(|c| c.to_string()).collect::<Vec<_>>()));
    let multiplier = spec.integer_weights().map(|w| w.multiplier).unwrap_or(1);
    let out = serde_json::json!({
        "run": spec,
        "index": kind.abbreviation(),
        "name": kind.full_name(),
        "players": spec.reported_players(&game),
        "values": strings(&values),
        "weight_multiplier": multiplier,
        "diagnostics": {
            "backend": d.backend,
            "primes": d.primes,
            "element_size": d.element_size,
            "bound_bits": d.bound_bits,
            "memory_requirement": d.memory_requirement,
            "peak_bytes": d.peak_bytes,
            "total_winning": d.total_winning.as_ref().map(|t| t.to_string()),
            "raw_counts": raw_counts,
        },
    });
    match serde_json::to_string_pretty(&out) {
        Ok(s) => println!("{s}"),
        Err(e) => {
            eprintln!("Failed to serialize result: {e}");
            std::process::exit(1);
        }
    }
}
