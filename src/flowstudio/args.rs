use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use flowstudio::encoder::DiagramFormat;
use flowstudio::model::Severity;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "flowstudio", version)]
#[command(about = "Markdown documents, diagrams and templates from the command line", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Save a document (content from the argument, --file, or stdin)
    Save {
        name: String,

        /// Markdown content
        content: Option<String>,

        /// Read content from a file
        #[arg(short, long, conflicts_with = "content")]
        file: Option<PathBuf>,
    },

    /// List documents
    #[command(alias = "ls")]
    List,

    /// Print a document
    #[command(alias = "cat")]
    Show { name: String },

    /// Delete a document
    #[command(alias = "rm")]
    Delete { name: String },

    /// Copy a document to another directory as Markdown
    Export {
        name: String,

        /// Target directory (defaults to the current directory)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },

    /// Bundle all documents into a .tar.gz
    Archive {
        /// Target directory (defaults to the current directory)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },

    /// Diagram render tokens and URLs
    #[command(subcommand)]
    Diagram(DiagramCommands),

    /// Generate a PlantUML diagram from a description
    #[command(alias = "gen")]
    Generate {
        /// What the diagram should show
        #[arg(required = true, num_args = 1..)]
        description: Vec<String>,

        /// Use the bundled sample diagrams instead of the AI provider
        #[arg(long)]
        offline: bool,

        /// Save the diagram as a document with this name
        #[arg(long)]
        save: Option<String>,
    },

    /// Browse, apply and publish templates
    #[command(subcommand, alias = "tpl")]
    Templates(TemplateCommands),

    /// Code review comments
    #[command(subcommand)]
    Review(ReviewCommands),

    /// Error/fix pairs derived from review comments
    #[command(subcommand)]
    Rag(RagCommands),

    /// Productivity metrics
    #[command(subcommand)]
    Metrics(MetricsCommands),

    /// Get or set configuration
    Config {
        /// Configuration key (e.g., provider, features.ai-generation)
        key: Option<String>,

        /// Value to set (if omitted, prints current value)
        value: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum DiagramCommands {
    /// Print the render token for diagram text
    Encode {
        /// Diagram text (defaults to stdin)
        text: Option<String>,

        #[arg(short, long, conflicts_with = "text")]
        file: Option<PathBuf>,
    },

    /// Print the render URL for diagram text
    Url {
        /// Diagram text (defaults to stdin)
        text: Option<String>,

        #[arg(short, long, conflicts_with = "text")]
        file: Option<PathBuf>,

        /// svg, png or txt
        #[arg(long, default_value = "svg")]
        format: DiagramFormat,
    },

    /// Recover diagram text from a token or render URL
    Decode { token: String },

    /// Render URLs for every diagram block in a document
    Doc {
        name: String,

        /// svg, png or txt
        #[arg(long, default_value = "svg")]
        format: DiagramFormat,
    },
}

#[derive(Subcommand, Debug)]
pub enum TemplateCommands {
    /// List templates
    #[command(alias = "ls")]
    List {
        #[arg(short, long)]
        category: Option<String>,

        #[arg(long, default_value_t = 0)]
        skip: usize,

        #[arg(long)]
        limit: Option<usize>,
    },

    /// Search templates by name, description or category
    Search {
        query: String,

        #[arg(long, default_value_t = 0)]
        skip: usize,

        #[arg(long)]
        limit: Option<usize>,
    },

    /// Print a template
    Show { id: String },

    /// Create a document from a template
    Apply {
        id: String,

        /// Document name (defaults to the template id)
        #[arg(short, long)]
        name: Option<String>,

        /// Replace an existing document
        #[arg(long)]
        force: bool,
    },

    /// Publish a template to the template service
    Upload {
        id: String,

        #[arg(long)]
        name: String,

        #[arg(short, long, default_value = "")]
        description: String,

        /// Read content from a file
        #[arg(short, long, conflicts_with = "document")]
        file: Option<PathBuf>,

        /// Use a saved document as the content
        #[arg(long)]
        document: Option<String>,
    },

    /// Remove a template from the template service
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
pub enum ReviewCommands {
    /// Record a review comment
    Add {
        content: String,

        #[arg(short, long, default_value = "")]
        author: String,

        /// critical, warning or suggestion
        #[arg(short, long, default_value = "suggestion")]
        severity: Severity,

        /// File the comment refers to
        #[arg(long)]
        file: Option<String>,

        #[arg(long)]
        line: Option<u32>,
    },

    /// List review comments
    #[command(alias = "ls")]
    List,

    /// Remove all review comments
    Clear,

    /// Import a JSON array of comments (path, or - for stdin)
    Import { source: String },
}

#[derive(Subcommand, Debug)]
pub enum RagCommands {
    /// Rebuild pairs from the current review comments
    Process,

    /// List pairs
    #[command(alias = "ls")]
    List,

    /// Write pairs to rag_review_data.json
    Export {
        /// Target directory (defaults to the documents directory)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub enum MetricsCommands {
    /// Record a working session
    Add {
        /// Session date, YYYY-MM-DD (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Minutes spent on AI generation
        #[arg(long, default_value_t = 0.0)]
        ai_minutes: f64,

        #[arg(long, default_value_t = 0)]
        ai_lines: u32,

        #[arg(long, default_value_t = 0)]
        manual_lines: u32,

        #[arg(long, default_value_t = 0)]
        reviews: u32,

        #[arg(long, default_value_t = 0)]
        resolved: u32,
    },

    /// List sessions
    #[command(alias = "ls")]
    List,

    /// Totals and ratios across sessions
    Summary,

    /// Remove all sessions
    Clear,
}
