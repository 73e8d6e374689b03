//! One-shot subcommands that print to stdout instead of opening the browser.

use std::io::{BufRead, Write};

use color_eyre::eyre::eyre;

use crate::api::{GalleryApi, HttpGalleryClient, LogDetail, LogRecord, TagStats};
use crate::app::cli::Command;
use crate::app::config::Config;
use crate::app::build_orchestrator;
use crate::gallery::{ListOrchestrator, SelectionCoordinator};
use crate::session::RecentTags;

pub async fn run_command(command: Command, config: &Config) -> color_eyre::Result<()> {
    let orchestrator = build_orchestrator(config)?;

    match command {
        Command::Browse(_) => Err(eyre!("browse runs the interactive UI")),
        Command::List { list, json } => {
            let query = list.to_query(&config.gallery);
            let page = orchestrator.load(&query, false).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&page.items)?);
            } else {
                for record in &page.items {
                    println!("{}", format_record_row(record));
                }
                println!(
                    "Page {}/{} · {} records",
                    query.page,
                    query.page_count(page.total),
                    page.total
                );
            }
            Ok(())
        }
        Command::Show { id, json } => {
            let detail = orchestrator.api().get_log(id).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&detail)?);
            } else {
                print!("{}", format_detail(&detail));
            }
            Ok(())
        }
        Command::Stats => {
            let stats = orchestrator
                .load_tag_stats(true)
                .await
                .ok_or_else(|| eyre!("Could not load tag statistics"))?;
            println!("Tools:");
            for (name, count) in TagStats::ranked(&stats.tools) {
                println!("  {:>6}  {}", count, name);
            }
            println!("Models:");
            for (name, count) in TagStats::ranked(&stats.models) {
                println!("  {:>6}  {}", count, name);
            }
            Ok(())
        }
        Command::Tags => {
            let api = orchestrator.api();
            let tools = api.tag_tools().await?;
            let models = api.tag_models().await?;
            let recent = RecentTags::default_path()
                .map(|path| RecentTags::load(&path))
                .unwrap_or_default();
            println!("Tools:  {}", tools.join(", "));
            println!("Models: {}", models.join(", "));
            println!("Recent tools:  {}", recent.tools.join(", "));
            println!("Recent models: {}", recent.models.join(", "));
            Ok(())
        }
        Command::Favorites { page, page_size } => {
            let favorites = orchestrator.api().favorites(page.max(1), page_size.max(1)).await?;
            for entry in &favorites.data {
                println!("{}", format_record_row(&entry.log));
            }
            println!("{} favorites", favorites.total);
            Ok(())
        }
        Command::Delete { ids, yes } => {
            if !yes && !confirm(&format!("Delete {} record(s)? [y/N] ", ids.len()))? {
                println!("Aborted");
                return Ok(());
            }
            let mut selection = select_ids(&orchestrator, &ids)?;
            let report = selection.bulk_delete(&orchestrator).await?;
            println!("{}", report.user_message());
            if report.is_success() {
                Ok(())
            } else {
                Err(eyre!("Could not delete records {:?}", report.failed_ids()))
            }
        }
        Command::Download { ids, output } => {
            let dest = output.unwrap_or_else(|| config.downloads.target_dir());
            let mut selection = select_ids(&orchestrator, &ids)?;
            let report = selection
                .bulk_download(&orchestrator, &dest, &config.downloads.archive_prefix)
                .await?;
            println!("{}", report.user_message());
            Ok(())
        }
    }
}

fn select_ids(
    orchestrator: &ListOrchestrator<HttpGalleryClient>,
    ids: &[i64],
) -> color_eyre::Result<SelectionCoordinator> {
    let mut selection = SelectionCoordinator::new();
    selection.sync_with_view(orchestrator.view().version);
    selection.toggle_mode();
    for &id in ids {
        if !selection.is_selected(id) {
            selection.toggle(id)?;
        }
    }
    Ok(selection)
}

fn confirm(prompt: &str) -> color_eyre::Result<bool> {
    print!("{}", prompt);
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

/// One line per record: id, type, date, title and tags
pub fn format_record_row(record: &LogRecord) -> String {
    let mut row = format!(
        "{:>6}  {}  {}  {}",
        record.id,
        record.record_type.as_query_value(),
        record.created_at.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M"),
        record.title
    );
    let tags: Vec<&str> = record
        .tool_names
        .iter()
        .chain(&record.model_names)
        .map(String::as_str)
        .collect();
    if !tags.is_empty() {
        row.push_str(&format!("  [{}]", tags.join(", ")));
    }
    if record.is_sensitive {
        row.push_str("  (sensitive)");
    }
    row
}

pub fn format_detail(detail: &LogDetail) -> String {
    let mut out = String::new();
    out.push_str(&format!("#{} {}\n", detail.id, detail.title));
    out.push_str(&format!("Type:    {}\n", detail.record_type.as_query_value()));
    out.push_str(&format!(
        "Created: {}\n",
        detail.created_at.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S")
    ));
    if let Some(prompt) = detail.prompt.as_deref().filter(|p| !p.is_empty()) {
        out.push_str(&format!("Prompt:  {}\n", prompt));
    }
    if let Some(note) = detail.params_note.as_deref().filter(|n| !n.is_empty()) {
        out.push_str(&format!("Params:  {}\n", note));
    }
    for (index, group) in detail.resolved_groups().iter().enumerate() {
        let tags: Vec<&str> = group
            .tool_names
            .iter()
            .chain(&group.model_names)
            .map(String::as_str)
            .collect();
        out.push_str(&format!(
            "Group {} [{}]: {} image(s)\n",
            index + 1,
            tags.join(", "),
            group.assets.len()
        ));
        let mut assets = group.assets.clone();
        assets.sort_by_key(|a| a.sort_order);
        for asset in assets {
            out.push_str(&format!("  {}\n", asset.storage_key));
        }
    }
    out
}
