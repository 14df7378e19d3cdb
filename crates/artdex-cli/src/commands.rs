//! Subcommand handlers.

use crate::{Command, SourcesAction};
use anyhow::{Context, Result};
use artdex_core::{Artwork, Catalog, FfmpegTranscoder, RescanReport, SortMode};
use tracing::{info, warn};

pub fn run(catalog: &mut Catalog, command: Command) -> Result<()> {
    match command {
        Command::Scan { fresh } => {
            let report = if fresh {
                catalog.rescan_fresh()
            } else {
                catalog.rescan()
            };
            catalog.save()?;
            print_rescan(&report);
        }
        Command::List {
            query,
            featured_only,
            json,
        } => {
            let indices = catalog
                .list()
                .filter(query.as_deref().unwrap_or(""), featured_only);
            let rows: Vec<&Artwork> = indices
                .iter()
                .filter_map(|&i| catalog.list().get(i))
                .collect();
            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                for art in rows {
                    println!("{}", format_row(art));
                }
            }
        }
        Command::Title { item, title } => {
            let index = catalog.find(&item)?;
            catalog.list_mut().set_title(index, title)?;
            catalog.save()?;
        }
        Command::Feature { item, off } => {
            let index = catalog.find(&item)?;
            catalog.list_mut().set_featured(index, !off)?;
            catalog.save()?;
            if let Some(art) = catalog.list().get(index) {
                println!("{}", format_row(art));
            }
        }
        Command::Move { item, offset } => {
            let index = catalog.find(&item)?;
            let new_index = catalog.list_mut().move_by(index, offset)?;
            catalog.save()?;
            println!("{} is now at position {}", item, new_index + 1);
        }
        Command::MoveFeatured { item, direction } => {
            let index = catalog.find(&item)?;
            match catalog.list_mut().move_featured(index, direction.offset())? {
                Some(new_index) => {
                    catalog.save()?;
                    if let Some(art) = catalog.list().get(new_index) {
                        println!("{}", format_row(art));
                    }
                }
                None => warn!("{} is not featured", item),
            }
        }
        Command::Sort { mode } => {
            let mode: SortMode = mode.parse()?;
            catalog.list_mut().sort(mode);
            catalog.save()?;
            info!("Sorted by {}", mode);
        }
        Command::Sources { action } => run_sources(catalog, action)?,
        Command::Export => {
            let transcoder = FfmpegTranscoder::new();
            let report = catalog.export(&transcoder)?;
            println!(
                "exported {} (renamed {}, transcoded {}), failed {}",
                report.exported, report.renamed, report.transcoded, report.failed
            );
            for error in &report.errors {
                println!("  {}", error);
            }
        }
    }
    Ok(())
}

fn run_sources(catalog: &mut Catalog, action: SourcesAction) -> Result<()> {
    let report = match action {
        SourcesAction::List => {
            let registry = catalog.registry();
            println!(
                "folder: {} ({})",
                catalog.directory().display(),
                if registry.include_folder() {
                    "included"
                } else {
                    "excluded"
                }
            );
            for (i, path) in registry.archives().iter().enumerate() {
                println!("{:>3}  {}", i, path.display());
            }
            return Ok(());
        }
        SourcesAction::Add { path } => catalog
            .add_archive(&path)
            .with_context(|| format!("adding {}", path.display()))?,
        SourcesAction::Remove { index } => {
            let (removed, report) = catalog.remove_archive(index)?;
            println!("removed {}", removed.display());
            report
        }
        SourcesAction::Clear => catalog.clear_archives()?,
        SourcesAction::IncludeFolder { include } => catalog.set_include_folder(include)?,
    };
    catalog.save()?;
    print_rescan(&report);
    Ok(())
}

fn print_rescan(report: &RescanReport) {
    println!(
        "{} items ({} kept, {} new, {} gone, {} duplicates skipped)",
        report.total, report.matched, report.added, report.dropped, report.duplicates
    );
    for source in &report.unavailable {
        println!("  unavailable: {}: {}", source.path.display(), source.reason);
    }
}

fn format_row(art: &Artwork) -> String {
    let star = art
        .featured_rank
        .map(|rank| format!("*{}", rank))
        .unwrap_or_default();
    format!(
        "{:>4} {:<4} {}  ({}, {})",
        art.id,
        star,
        art.title,
        art.fname,
        art.source_type
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use artdex_core::{ScanEntry, SourceType};

    #[test]
    fn test_format_row_marks_featured() {
        let mut art = Artwork::new("sunset.png", 3, 0.0);
        art.featured = true;
        art.featured_rank = Some(2);
        assert_eq!(format_row(&art), "   3 *2   sunset  (sunset.png, fs)");
    }

    #[test]
    fn test_format_row_archive_item() {
        let entry = ScanEntry::archived(SourceType::Zip, "/p.zip", "a/x.gif", 0.0);
        let art = Artwork::from_scan(&entry, 1);
        assert_eq!(format_row(&art), "   1      x  (x.gif, zip)");
    }

    #[test]
    fn test_mutating_command_saves() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("a.png"), b"a").unwrap();
        let mut catalog = Catalog::open(temp_dir.path()).unwrap();

        run(
            &mut catalog,
            Command::Title {
                item: "a.png".into(),
                title: "Alpha".into(),
            },
        )
        .unwrap();

        let reopened = Catalog::open(temp_dir.path()).unwrap();
        assert_eq!(reopened.list().get(0).unwrap().title, "Alpha");
    }

    #[test]
    fn test_unknown_item_is_error() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let mut catalog = Catalog::open(temp_dir.path()).unwrap();
        let result = run(
            &mut catalog,
            Command::Feature {
                item: "missing.png".into(),
                off: false,
            },
        );
        assert!(result.is_err());
    }
}
