use catalog_lens_core::catalog::SearchField;
use catalog_lens_core::classify::MatchMode;
use catalog_lens_core::diff::StatusFilter;
use catalog_lens_core::listing::{SortDirection, SortKey};
use catalog_lens_core::taxonomy::RuleGroup;
use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "catalog-lens")]
#[command(about = "Explore an asset catalog and compare its versions", long_about = None)]
pub struct Cli {
    /// Data directory, overriding the configured one
    #[arg(long, global = true)]
    pub data_dir: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Search catalog entries, filter by category and print one page
    Search(SearchArgs),
    /// Show which categories each label belongs to
    Classify {
        #[arg(required = true)]
        labels: Vec<String>,
    },
    /// List category shortcuts with entry counts
    Categories {
        /// Only this group: media, character or tag
        #[arg(long)]
        group: Option<RuleGroup>,
    },
    /// List known catalog versions
    Versions,
    /// Compare two catalog versions
    Diff(DiffArgs),
    /// Print configuration values
    PrintConfig,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Keywords; every term must match
    pub query: Vec<String>,

    #[arg(long, default_value = "all")]
    pub field: SearchField,

    /// Exact entry type, applied before category filters
    #[arg(long = "type")]
    pub entry_type: Option<String>,

    #[arg(long = "media", value_delimiter = ',')]
    pub media: Vec<String>,

    #[arg(long = "character", value_delimiter = ',')]
    pub characters: Vec<String>,

    #[arg(long = "tag", value_delimiter = ',')]
    pub tags: Vec<String>,

    /// How several categories of one group combine: any or all
    #[arg(long)]
    pub mode: Option<MatchMode>,

    #[arg(long, default_value = "label")]
    pub sort: SortKey,

    #[arg(long, default_value = "asc")]
    pub direction: SortDirection,

    #[arg(long, default_value_t = 1)]
    pub page: usize,

    #[arg(long)]
    pub page_size: Option<usize>,
}

#[derive(Debug, Args)]
pub struct DiffArgs {
    #[arg(long)]
    pub from: Option<String>,

    #[arg(long)]
    pub to: Option<String>,

    /// all, added, removed, modified or unchanged
    #[arg(long, default_value = "all")]
    pub status: StatusFilter,

    #[arg(long, default_value = "")]
    pub keyword: String,

    /// Maximum number of items to fetch
    #[arg(long)]
    pub limit: Option<u32>,
}
