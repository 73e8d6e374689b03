use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::api::RecordType;
use crate::app::config::gallery::GalleryConfig;
use crate::gallery::{ListQuery, SortKey};

#[derive(Parser, Debug, Clone)]
#[command(name = "vault-gallery")]
#[command(author = "Immelancholy")]
#[command(version)]
#[command(about = "Browse, bulk-delete and download generated-image records", long_about = None)]
pub struct Args {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Gallery API base URL (overrides config)
    #[arg(short, long, global = true)]
    pub base_url: Option<String>,

    /// Write a default config file to the given path (or directory) and exit
    #[arg(long, value_name = "PATH")]
    pub generate_config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Filters shared by commands that read a page of records
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// Page number, starting at 1
    #[arg(long, default_value_t = 1)]
    pub page: u32,

    /// Records per page (defaults to the configured page size)
    #[arg(long)]
    pub page_size: Option<u32>,

    /// Free-text search over titles and prompts
    #[arg(short, long)]
    pub search: Option<String>,

    /// Only records of this type ("txt2img" or "img2img")
    #[arg(short = 't', long = "type", value_parser = parse_record_type)]
    pub record_type: Option<RecordType>,

    /// Only records made with this tool
    #[arg(long)]
    pub tool: Option<String>,

    /// Only records made with this model
    #[arg(long)]
    pub model: Option<String>,

    /// Client-side ordering of the page
    #[arg(long, value_enum)]
    pub sort: Option<SortKey>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Open the interactive browser (default)
    Browse(ListArgs),

    /// Print one page of records
    List {
        #[command(flatten)]
        list: ListArgs,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Print one record with its output groups
    Show {
        id: i64,

        #[arg(long)]
        json: bool,
    },

    /// Print tool and model usage counts
    Stats,

    /// Print known tools and models, plus the recently used ones
    Tags,

    /// Print one page of favorites
    Favorites {
        #[arg(long, default_value_t = 1)]
        page: u32,

        #[arg(long, default_value_t = 20)]
        page_size: u32,
    },

    /// Delete records by id
    Delete {
        #[arg(required = true)]
        ids: Vec<i64>,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Download the output images of records into one zip archive
    Download {
        #[arg(required = true)]
        ids: Vec<i64>,

        /// Target directory (overrides config)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl ListArgs {
    /// Build the list query, falling back to configured defaults
    pub fn to_query(&self, gallery: &GalleryConfig) -> ListQuery {
        ListQuery {
            page: self.page.max(1),
            page_size: self.page_size.unwrap_or(gallery.page_size).max(1),
            search: self.search.clone().unwrap_or_default(),
            record_type: self.record_type,
            tool: self.tool.clone(),
            model: self.model.clone(),
            sort: self.sort.unwrap_or(gallery.default_sort),
        }
    }
}

fn parse_record_type(s: &str) -> Result<RecordType, String> {
    RecordType::parse(s).ok_or_else(|| {
        format!(
            "Invalid value '{}': expected 'txt2img' or 'img2img'",
            s
        )
    })
}
