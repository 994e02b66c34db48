use anyhow::{Context, Result};
use spelltab::{enrich, source, table::Table, workbook::SheetWriter};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();
    info!("startup");

    // ─── 2) configure paths ──────────────────────────────────────────
    let mut args = std::env::args().skip(1);
    let spells_dir = PathBuf::from(args.next().unwrap_or_else(|| "data/spells".into()));
    let out_path = PathBuf::from(args.next().unwrap_or_else(|| "spells.xlsx".into()));

    // ─── 3) discover allow-listed spell documents ────────────────────
    let files = source::discover(&spells_dir)?;
    if files.is_empty() {
        info!("no allow-listed spell files under {}; exit", spells_dir.display());
        return Ok(());
    }
    info!("{} spell documents to flatten", files.len());

    // ─── 4) flatten each document into one sheet ─────────────────────
    let mut writer = SheetWriter::new();
    for path in files {
        let sheet_name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("sheet")
            .to_string();

        let mut spells = source::load_spells(&path)?;
        if spells.is_empty() {
            warn!("{} has no spell entries; skipped", path.display());
            continue;
        }

        for spell in &mut spells {
            let name = spell
                .get("name")
                .and_then(|n| n.as_str())
                .unwrap_or("<unnamed>")
                .to_string();
            enrich(spell)
                .with_context(|| format!("flattening `{}` in {}", name, path.display()))?;
        }

        let table = Table::from_records(spells);
        writer.add_sheet(&sheet_name, &table)?;
        info!("processed {} into sheet '{}'", path.display(), sheet_name);
    }

    // ─── 5) write the workbook ───────────────────────────────────────
    writer.save(&out_path)?;
    info!("wrote {}", out_path.display());
    Ok(())
}
