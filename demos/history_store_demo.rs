use chrono::Utc;
use env_logger::Env;
use log::{info, warn};
use reframe_compare::dimension::{resolve_pair, Dimension};
use reframe_compare::dispatch::{ComparisonResult, Outcome};
use reframe_compare::storage::file_storage::FileHistoryStorage;
use reframe_compare::storage::memory_storage::MemoryHistoryStorage;
use reframe_compare::storage::storage_trait::HistoryStorage;
use std::env;
use std::path::PathBuf;

fn main() {
    // Initialize logger (RUST_LOG can override; default to info)
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or("info")).try_init();

    let out_dir: PathBuf = env::var("HISTORY_DEMO_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            env::current_dir()
                .expect("cwd")
                .join("target")
                .join("history_demo")
        });

    let storage_fs = FileHistoryStorage::new(&out_dir, "history.json");
    let storage_mem = MemoryHistoryStorage::new();

    // Two fabricated comparisons, one with a failed provider
    let sizes = [Dimension::new(1920, 1080), Dimension::new(1000, 1600)];
    for (i, size) in sizes.iter().enumerate() {
        let (a, b) = resolve_pair(size).expect("resolve");
        info!("{} resolves to {} / {}", size, a, b);

        let outcome_b = if i == 0 {
            Outcome::success(format!("https://cdn.example/b/{}.png", i))
        } else {
            Outcome::failure("timeout")
        };
        let record = ComparisonResult::new(
            i as u64 + 1,
            Utc::now(),
            "https://cdn.example/source.png",
            *size,
            (a.clone(), Outcome::success(format!("https://cdn.example/a/{}.png", i))),
            (b, outcome_b),
        );

        storage_fs.append(record.clone()).expect("append fs");
        storage_mem.append(record).expect("append mem");
    }

    let from_disk = storage_fs.read_all().expect("read fs");
    let from_mem = storage_mem.read_all().expect("read mem");
    if from_disk != from_mem {
        warn!("Backends disagree");
    }
    for record in from_disk.iter() {
        info!(
            "#{} {} -> A: {:?}, B: {:?}",
            record.id(),
            record.requested_dimensions(),
            record.provider_a_outcome(),
            record.provider_b_outcome()
        );
    }
    info!("History written to {}", storage_fs.history_path().display());
}
