use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::sync::Arc;
use varacc_core::{Config, EntityKind, StoreOrigin, VarAccResult};
use varacc_storage::{BlockReservingCounter, RocksDBBackend};

use crate::cli::output::{format_number, section_header, tree_section};
use crate::cli::stores::Stores;

#[derive(Args)]
pub struct StatsArgs {
    /// Print the counts as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct KindStats {
    kind: EntityKind,
    documents: usize,
    history_operations: usize,
}

#[derive(Debug, Serialize)]
struct StoreStats {
    origin: StoreOrigin,
    path: String,
    kinds: Vec<KindStats>,
}

#[derive(Debug, Serialize)]
struct CounterStats {
    kind: EntityKind,
    high_water_mark: Option<u64>,
}

fn store_stats(origin: StoreOrigin, backend: &RocksDBBackend) -> VarAccResult<StoreStats> {
    let mut kinds = Vec::new();
    for kind in [EntityKind::ClusteredVariant, EntityKind::SubmittedVariant] {
        kinds.push(KindStats {
            kind,
            documents: backend.document_count(kind)?,
            history_operations: backend.history_count(kind)?,
        });
    }
    Ok(StoreStats {
        origin,
        path: backend.db_path().display().to_string(),
        kinds,
    })
}

fn counter_stats(live: &Arc<RocksDBBackend>, block_size: u64) -> VarAccResult<Vec<CounterStats>> {
    [EntityKind::ClusteredVariant, EntityKind::SubmittedVariant]
        .into_iter()
        .map(|kind| {
            let counter = BlockReservingCounter::new(live.clone(), kind, block_size)?;
            Ok(CounterStats {
                kind,
                high_water_mark: counter.high_water_mark()?,
            })
        })
        .collect()
}

pub fn run(args: StatsArgs, config: &Config) -> Result<()> {
    let stores = Stores::open(config)?;
    let per_store = vec![
        store_stats(StoreOrigin::Legacy, &stores.legacy)?,
        store_stats(StoreOrigin::Live, &stores.live)?,
    ];
    let counters = counter_stats(&stores.live, config.accessioning.block_size)?;

    if args.json {
        let report = serde_json::json!({ "stores": per_store, "counters": counters });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    section_header("Accession stores");
    for (index, store) in per_store.iter().enumerate() {
        let mut items = vec![("path", store.path.clone())];
        for kind in &store.kinds {
            items.push((kind.kind.prefix(), format!(
                "{} documents, {} history operations",
                format_number(kind.documents),
                format_number(kind.history_operations)
            )));
        }
        tree_section(&store.origin.to_string(), &items, index == per_store.len() - 1);
    }

    section_header("Live counters");
    let items: Vec<(&str, String)> = counters
        .iter()
        .map(|counter| {
            let value = match counter.high_water_mark {
                Some(mark) => format!("reserved up to {}", mark),
                None => "unused".to_string(),
            };
            (counter.kind.prefix(), value)
        })
        .collect();
    tree_section("high-water marks", &items, true);
    Ok(())
}
