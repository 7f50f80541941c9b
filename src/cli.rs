use crate::io::OutputFormat as WriterFormat;
use crate::risk::{Category, Level, RawRisk, RawTags, RiskStatus};
use crate::view::{build_predicate, FilterValue, RiskFilter, SortDirection, SortField};
use clap::builder::RangedU64ValueParser;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "riskmap")]
#[command(about = "Risk register scoring, prioritization and reporting", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to the nearest .riskmap.toml)
    #[arg(long, global = true, env = "RISKMAP_CONFIG")]
    pub config: Option<PathBuf>,

    /// JSON file holding the risk records
    #[arg(long, global = true, env = "RISKMAP_STORE")]
    pub store: Option<PathBuf>,

    /// Organization whose risks are read and written
    #[arg(long = "org", global = true)]
    pub organization: Option<String>,

    /// Increase verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", global = true, action = clap::ArgAction::Count)]
    pub verbosity: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List risks, filtered and sorted
    List {
        #[command(flatten)]
        filter: FilterArgs,

        #[command(flatten)]
        order: SortArgs,

        /// Output format
        #[arg(short, long, value_enum, default_value = "terminal")]
        format: OutputFormat,
    },

    /// Show the 5×5 probability/impact matrix
    Matrix {
        #[command(flatten)]
        filter: FilterArgs,

        #[arg(short, long, value_enum, default_value = "terminal")]
        format: OutputFormat,
    },

    /// Per-category severity heatmap with the top risks of each category
    Summary {
        #[command(flatten)]
        filter: FilterArgs,

        /// Risks listed per category (at least 1)
        #[arg(long = "top", value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
        top: Option<usize>,

        #[arg(short, long, value_enum, default_value = "terminal")]
        format: OutputFormat,
    },

    /// Severity distribution and overdue count
    Stats {
        #[command(flatten)]
        filter: FilterArgs,

        #[arg(short, long, value_enum, default_value = "terminal")]
        format: OutputFormat,
    },

    /// Export the filtered, sorted list as CSV
    Export {
        #[command(flatten)]
        filter: FilterArgs,

        #[command(flatten)]
        order: SortArgs,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Record a new risk
    Add {
        /// Risk title
        title: String,

        /// Explicit id (generated when omitted)
        #[arg(long)]
        id: Option<String>,

        #[command(flatten)]
        fields: RiskFields,
    },

    /// Change fields of an existing risk
    Update {
        /// Id of the risk to change
        id: String,

        /// New title
        #[arg(long)]
        title: Option<String>,

        #[command(flatten)]
        fields: RiskFields,
    },

    /// Remove a risk
    Delete {
        /// Id of the risk to remove
        id: String,
    },

    /// Initialize a .riskmap.toml configuration file
    Init {
        /// Force overwrite existing config
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Terminal,
    Json,
    Csv,
}

impl From<OutputFormat> for WriterFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Terminal => WriterFormat::Terminal,
            OutputFormat::Json => WriterFormat::Json,
            OutputFormat::Csv => WriterFormat::Csv,
        }
    }
}

/// Search text and categorical filters; `all` disables a filter.
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Case-insensitive text matched against title, description, mitigation plan and project
    #[arg(short, long)]
    pub search: Option<String>,

    #[arg(long, default_value = "all")]
    pub category: FilterValue<Category>,

    #[arg(long, default_value = "all")]
    pub status: FilterValue<RiskStatus>,

    #[arg(long, default_value = "all")]
    pub probability: FilterValue<Level>,

    #[arg(long, default_value = "all")]
    pub impact: FilterValue<Level>,

    /// Project id
    #[arg(long, default_value = "all")]
    pub project: FilterValue<String>,
}

impl FilterArgs {
    pub fn to_filter(&self) -> RiskFilter {
        build_predicate(
            self.search.as_deref().unwrap_or(""),
            self.category.clone(),
            self.status.clone(),
            self.probability.clone(),
            self.impact.clone(),
            self.project.clone(),
        )
    }
}

/// Ordering; unset values come from the configuration.
#[derive(Args, Debug, Clone, Default)]
pub struct SortArgs {
    /// title, riskScore, identifiedDate, reviewDate, closedDate, createdAt, owner,
    /// project, category or status
    #[arg(long)]
    pub sort: Option<SortField>,

    /// asc or desc
    #[arg(long)]
    pub direction: Option<SortDirection>,
}

/// Editable risk fields shared by `add` and `update`.
#[derive(Args, Debug, Clone, Default)]
pub struct RiskFields {
    #[arg(long)]
    pub description: Option<String>,

    /// technical, financial, operational, legal, environmental or safety
    #[arg(long)]
    pub category: Option<String>,

    /// very_low, low, medium, high or very_high
    #[arg(short, long)]
    pub probability: Option<String>,

    /// very_low, low, medium, high or very_high
    #[arg(short, long)]
    pub impact: Option<String>,

    /// identified, assessed, mitigated or closed
    #[arg(long)]
    pub status: Option<String>,

    /// Project id
    #[arg(long)]
    pub project: Option<String>,

    #[arg(long)]
    pub project_name: Option<String>,

    /// Owner id
    #[arg(long)]
    pub owner: Option<String>,

    #[arg(long)]
    pub owner_name: Option<String>,

    #[arg(long)]
    pub owner_email: Option<String>,

    #[arg(long = "mitigation")]
    pub mitigation_plan: Option<String>,

    #[arg(long = "contingency")]
    pub contingency_plan: Option<String>,

    /// YYYY-MM-DD or RFC 3339
    #[arg(long)]
    pub identified_date: Option<String>,

    /// YYYY-MM-DD or RFC 3339; an empty value clears it
    #[arg(long)]
    pub review_date: Option<String>,

    /// YYYY-MM-DD or RFC 3339; an empty value clears it
    #[arg(long)]
    pub closed_date: Option<String>,

    /// Comma-separated tags
    #[arg(long)]
    pub tags: Option<String>,
}

impl RiskFields {
    pub fn into_raw(self, id: Option<String>, title: Option<String>) -> RawRisk {
        RawRisk {
            id,
            title,
            description: self.description,
            category: self.category,
            probability: self.probability,
            impact: self.impact,
            status: self.status,
            project_id: self.project,
            project_name: self.project_name,
            owner_id: self.owner,
            owner_name: self.owner_name,
            owner_email: self.owner_email,
            mitigation_plan: self.mitigation_plan,
            contingency_plan: self.contingency_plan,
            identified_date: self.identified_date,
            review_date: self.review_date,
            closed_date: self.closed_date,
            tags: self.tags.map(RawTags::Text),
            ..RawRisk::default()
        }
    }
}
