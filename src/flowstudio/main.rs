use chrono::{Local, Utc};
use clap::Parser;
use colored::*;
use directories::{ProjectDirs, UserDirs};
use flowstudio::ai::canned::CannedGenerator;
use flowstudio::api::StudioApi;
use flowstudio::commands::config::ConfigAction;
use flowstudio::commands::reviews::NewComment;
use flowstudio::commands::{CmdMessage, MessageLevel, RenderedDiagram, StudioPaths};
use flowstudio::config::StudioConfig;
use flowstudio::encoder::DiagramFormat;
use flowstudio::error::{Result, StudioError};
use flowstudio::model::{DocumentSummary, MetricData, MetricsSummary, ReviewComment, Severity};
use flowstudio::store::fs::FileStore;
use flowstudio::templates::{Template, TemplateQuery, TemplateUpload};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;
use tracing_subscriber::EnvFilter;
use unicode_width::UnicodeWidthStr;

mod args;
use args::{
    Cli, Commands, DiagramCommands, MetricsCommands, RagCommands, ReviewCommands, TemplateCommands,
};

/// Overrides the data directory; documents default to `<home>/documents`.
const HOME_ENV: &str = "FLOWSTUDIO_HOME";
const DOCUMENTS_FOLDER: &str = "AI_Flow_Studio";

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

struct AppContext {
    api: StudioApi<FileStore>,
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let mut ctx = init_context()?;

    match cli.command {
        Some(Commands::Save {
            name,
            content,
            file,
        }) => handle_save(&mut ctx, name, content, file),
        Some(Commands::List) | None => handle_list(&ctx),
        Some(Commands::Show { name }) => handle_show(&ctx, name),
        Some(Commands::Delete { name }) => {
            let result = ctx.api.delete_document(&name)?;
            print_messages(&result.messages);
            Ok(())
        }
        Some(Commands::Export { name, dir }) => {
            let dir = dir_or_cwd(dir);
            let result = ctx.api.export_document(&name, &dir)?;
            print_messages(&result.messages);
            Ok(())
        }
        Some(Commands::Archive { dir }) => {
            let dir = dir_or_cwd(dir);
            let result = ctx.api.archive_documents(&dir)?;
            print_messages(&result.messages);
            Ok(())
        }
        Some(Commands::Diagram(cmd)) => handle_diagram(&ctx, cmd),
        Some(Commands::Generate {
            description,
            offline,
            save,
        }) => handle_generate(&mut ctx, description.join(" "), offline, save),
        Some(Commands::Templates(cmd)) => handle_templates(&mut ctx, cmd),
        Some(Commands::Review(cmd)) => handle_review(&mut ctx, cmd),
        Some(Commands::Rag(cmd)) => handle_rag(&mut ctx, cmd),
        Some(Commands::Metrics(cmd)) => handle_metrics(&mut ctx, cmd),
        Some(Commands::Config { key, value }) => handle_config(&mut ctx, key, value),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn init_context() -> Result<AppContext> {
    let home = std::env::var_os(HOME_ENV).map(PathBuf::from);
    let data_dir = match &home {
        Some(dir) => dir.clone(),
        None => ProjectDirs::from("com", "flowstudio", "flowstudio")
            .ok_or_else(|| StudioError::Config("Could not determine data directory".into()))?
            .data_dir()
            .to_path_buf(),
    };

    let config = StudioConfig::load(&data_dir).unwrap_or_else(|e| {
        warn!(error = %e, "config unreadable, using defaults");
        StudioConfig::default()
    });
    let documents_dir = documents_dir(&config, home.as_deref(), &data_dir);

    let store = FileStore::new(documents_dir.clone(), data_dir.clone());
    let paths = StudioPaths {
        data: data_dir,
        documents: documents_dir,
    };
    Ok(AppContext {
        api: StudioApi::new(store, paths, config),
    })
}

fn documents_dir(config: &StudioConfig, home: Option<&Path>, data_dir: &Path) -> PathBuf {
    if let Some(dir) = &config.documents_dir {
        return dir.clone();
    }
    if let Some(home) = home {
        return home.join("documents");
    }
    UserDirs::new()
        .and_then(|dirs| dirs.document_dir().map(|d| d.join(DOCUMENTS_FOLDER)))
        .unwrap_or_else(|| data_dir.join("documents"))
}

fn dir_or_cwd(dir: Option<PathBuf>) -> PathBuf {
    dir.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

/// Argument text, else the file's contents, else stdin.
fn read_input(text: Option<String>, file: Option<PathBuf>) -> Result<String> {
    match (text, file) {
        (Some(text), _) => Ok(text),
        (None, Some(path)) => Ok(fs::read_to_string(path)?),
        (None, None) => Ok(io::read_to_string(io::stdin())?),
    }
}

fn handle_save(
    ctx: &mut AppContext,
    name: String,
    content: Option<String>,
    file: Option<PathBuf>,
) -> Result<()> {
    let content = read_input(content, file)?;
    let result = ctx.api.save_document(&name, &content)?;
    print_messages(&result.messages);
    Ok(())
}

fn handle_list(ctx: &AppContext) -> Result<()> {
    let result = ctx.api.list_documents()?;
    print_documents(&result.documents);
    print_messages(&result.messages);
    Ok(())
}

fn handle_show(ctx: &AppContext, name: String) -> Result<()> {
    let result = ctx.api.load_document(&name)?;
    if let Some(doc) = &result.document {
        print!("{}", doc.content);
        if !doc.content.ends_with('\n') {
            println!();
        }
    }
    print_messages(&result.messages);
    Ok(())
}

fn handle_diagram(ctx: &AppContext, cmd: DiagramCommands) -> Result<()> {
    match cmd {
        DiagramCommands::Encode { text, file } => {
            let text = read_input(text, file)?;
            let result = ctx.api.encode_diagram(&text, DiagramFormat::default())?;
            for diagram in &result.diagrams {
                println!("{}", diagram.token);
            }
            print_messages(&result.messages);
        }
        DiagramCommands::Url { text, file, format } => {
            let text = read_input(text, file)?;
            let result = ctx.api.encode_diagram(&text, format)?;
            for diagram in &result.diagrams {
                match &diagram.url {
                    Some(url) => println!("{}", url),
                    None => print_messages(&[CmdMessage::warning(
                        "Previews are disabled (features.diagram-preview)",
                    )]),
                }
            }
            print_messages(&result.messages);
        }
        DiagramCommands::Decode { token } => {
            let result = ctx.api.decode_diagram(&token)?;
            if let Some(text) = &result.text {
                println!("{}", text);
            }
            print_messages(&result.messages);
        }
        DiagramCommands::Doc { name, format } => {
            let result = ctx.api.document_diagrams(&name, format)?;
            print_diagrams(&result.diagrams);
            print_messages(&result.messages);
        }
    }
    Ok(())
}

fn handle_generate(
    ctx: &mut AppContext,
    description: String,
    offline: bool,
    save: Option<String>,
) -> Result<()> {
    let result = if offline {
        ctx.api.generate_diagram(&CannedGenerator, &description)?
    } else {
        let client = ctx.api.provider_client();
        ctx.api.generate_diagram(&client, &description)?
    };

    if let Some(generated) = &result.generated {
        println!("{}", generated.plantuml);
    }
    for diagram in &result.diagrams {
        if let Some(url) = &diagram.url {
            println!("{}", url.dimmed());
        }
    }
    print_messages(&result.messages);

    if let (Some(name), Some(generated)) = (save, &result.generated) {
        let content = format!(
            "# {}\n\n```plantuml\n{}\n```\n",
            description, generated.plantuml
        );
        let saved = ctx.api.save_document(&name, &content)?;
        print_messages(&saved.messages);
    }
    Ok(())
}

fn handle_templates(ctx: &mut AppContext, cmd: TemplateCommands) -> Result<()> {
    let source = ctx.api.template_source();
    let result = match cmd {
        TemplateCommands::List {
            category,
            skip,
            limit,
        } => {
            let query = TemplateQuery {
                category,
                search: None,
                skip,
                limit,
            };
            let result = ctx.api.fetch_templates(source.as_ref(), &query)?;
            print_templates(&result.templates);
            result
        }
        TemplateCommands::Search { query, skip, limit } => {
            let query = TemplateQuery {
                skip,
                limit,
                ..TemplateQuery::search(query)
            };
            let result = ctx.api.fetch_templates(source.as_ref(), &query)?;
            print_templates(&result.templates);
            result
        }
        TemplateCommands::Show { id } => {
            let result = ctx.api.show_template(source.as_ref(), &id)?;
            for template in &result.templates {
                print_template(template);
            }
            result
        }
        TemplateCommands::Apply { id, name, force } => {
            ctx.api
                .apply_template(source.as_ref(), &id, name.as_deref(), force)?
        }
        TemplateCommands::Upload {
            id,
            name,
            description,
            file,
            document,
        } => {
            let content = match document {
                Some(doc) => ctx
                    .api
                    .load_document(&doc)?
                    .document
                    .map(|d| d.content)
                    .unwrap_or_default(),
                None => read_input(None, file)?,
            };
            let upload = TemplateUpload {
                id,
                name,
                description,
                content,
            };
            ctx.api.upload_template(source.as_ref(), &upload)?
        }
        TemplateCommands::Delete { id } => ctx.api.delete_template(source.as_ref(), &id)?,
    };
    print_messages(&result.messages);
    if result.has_errors() {
        return Err(StudioError::Validation("template request failed".to_string()));
    }
    Ok(())
}

fn handle_review(ctx: &mut AppContext, cmd: ReviewCommands) -> Result<()> {
    let result = match cmd {
        ReviewCommands::Add {
            content,
            author,
            severity,
            file,
            line,
        } => ctx.api.add_comment(NewComment {
            author,
            content,
            severity,
            file_path: file,
            line_number: line,
        })?,
        ReviewCommands::List => {
            let result = ctx.api.list_comments()?;
            print_comments(&result.comments);
            result
        }
        ReviewCommands::Clear => ctx.api.clear_comments()?,
        ReviewCommands::Import { source } => {
            let payload = if source == "-" {
                io::read_to_string(io::stdin())?
            } else {
                fs::read_to_string(&source)?
            };
            ctx.api.import_comments(&payload)?
        }
    };
    print_messages(&result.messages);
    Ok(())
}

fn handle_rag(ctx: &mut AppContext, cmd: RagCommands) -> Result<()> {
    let result = match cmd {
        RagCommands::Process => ctx.api.process_rag_pairs()?,
        RagCommands::List => {
            let result = ctx.api.list_rag_pairs()?;
            for (i, pair) in result.rag_pairs.iter().enumerate() {
                println!("{}. {}", i + 1, pair.error_logic.bold());
                if !pair.fix_suggestion.is_empty() {
                    println!("   {} {}", "fix:".green(), pair.fix_suggestion);
                }
            }
            result
        }
        RagCommands::Export { dir } => ctx.api.export_rag_pairs(dir.as_deref())?,
    };
    print_messages(&result.messages);
    Ok(())
}

fn handle_metrics(ctx: &mut AppContext, cmd: MetricsCommands) -> Result<()> {
    let result = match cmd {
        MetricsCommands::Add {
            date,
            ai_minutes,
            ai_lines,
            manual_lines,
            reviews,
            resolved,
        } => ctx.api.add_metric(MetricData {
            date: date.unwrap_or_else(|| Local::now().date_naive()),
            ai_generate_time_minutes: ai_minutes,
            ai_lines_of_code: ai_lines,
            manual_lines_of_code: manual_lines,
            review_comments_count: reviews,
            resolved_comments_count: resolved,
        })?,
        MetricsCommands::List => {
            let result = ctx.api.list_metrics()?;
            print_metrics(&result.metrics);
            result
        }
        MetricsCommands::Summary => {
            let result = ctx.api.metrics_summary()?;
            if let Some(summary) = &result.summary {
                print_summary(summary);
            }
            result
        }
        MetricsCommands::Clear => ctx.api.clear_metrics()?,
    };
    print_messages(&result.messages);
    Ok(())
}

fn handle_config(ctx: &mut AppContext, key: Option<String>, value: Option<String>) -> Result<()> {
    let action = match (key, value) {
        (None, _) => ConfigAction::ShowAll,
        (Some(key), None) => ConfigAction::ShowKey(key),
        (Some(key), Some(value)) => ConfigAction::Set(key, value),
    };
    let show_all = matches!(action, ConfigAction::ShowAll);

    let result = ctx.api.config_command(action)?;
    if let Some(config) = result.config.as_ref().filter(|_| show_all) {
        for (key, value) in config.entries() {
            println!("{} = {}", key, value);
        }
    }
    print_messages(&result.messages);
    Ok(())
}

fn print_messages(messages: &[CmdMessage]) {
    for message in messages {
        match message.level {
            MessageLevel::Info => println!("{}", message.content.dimmed()),
            MessageLevel::Success => println!("{}", message.content.green()),
            MessageLevel::Warning => println!("{}", message.content.yellow()),
            MessageLevel::Error => println!("{}", message.content.red()),
        }
    }
}

const LINE_WIDTH: usize = 100;
const TIME_WIDTH: usize = 14;
const SIZE_WIDTH: usize = 10;

fn print_documents(documents: &[DocumentSummary]) {
    for (i, doc) in documents.iter().enumerate() {
        let idx_str = format!("{}. ", i + 1);
        let size = format!("{:>width$}", format_size(doc.size), width = SIZE_WIDTH);
        let time_ago = match doc.modified_at {
            Some(ts) => format_time_ago(ts),
            None => " ".repeat(TIME_WIDTH),
        };

        let fixed_width = idx_str.width() + SIZE_WIDTH + TIME_WIDTH + 2;
        let available = LINE_WIDTH.saturating_sub(fixed_width);
        let name = truncate_to_width(&doc.name, available);
        let padding = available.saturating_sub(name.width());

        println!(
            "{}{}{}{}  {}",
            idx_str.dimmed(),
            name,
            " ".repeat(padding),
            size,
            time_ago.dimmed()
        );
    }
}

fn print_diagrams(diagrams: &[RenderedDiagram]) {
    for diagram in diagrams {
        let target = diagram.url.as_deref().unwrap_or(&diagram.token);
        println!("{} {}", format!("[{}]", diagram.index).yellow(), target);
    }
}

fn print_templates(templates: &[Template]) {
    for template in templates {
        let category = template.category.as_deref().unwrap_or("-");
        let head = format!("{}  {} ", template.id, template.name);
        let available = LINE_WIDTH.saturating_sub(head.width() + category.width() + 3);
        println!(
            "{}  {} {} {}",
            template.id.yellow(),
            template.name.bold(),
            format!("[{}]", category).dimmed(),
            truncate_to_width(&template.description, available)
        );
    }
}

fn print_template(template: &Template) {
    println!("{} {}", template.name.bold(), format!("({})", template.id).dimmed());
    if !template.description.is_empty() {
        println!("{}", template.description);
    }
    println!("--------------------------------");
    println!("{}", template.content);
}

fn print_comments(comments: &[ReviewComment]) {
    for (i, comment) in comments.iter().enumerate() {
        let severity = match comment.severity {
            Severity::Critical => comment.severity.as_str().red(),
            Severity::Warning => comment.severity.as_str().yellow(),
            Severity::Suggestion => comment.severity.as_str().normal(),
        };
        let location = match (&comment.file_path, comment.line_number) {
            (Some(file), Some(line)) => format!(" ({}:{})", file, line),
            (Some(file), None) => format!(" ({})", file),
            (None, Some(line)) => format!(" (line {})", line),
            (None, None) => String::new(),
        };
        let first_line = comment.content.lines().next().unwrap_or_default();
        println!(
            "{}. [{}] {}: {}{}",
            i + 1,
            severity,
            comment.author.bold(),
            truncate_to_width(first_line, LINE_WIDTH / 2),
            location.dimmed()
        );
    }
}

fn print_metrics(metrics: &[MetricData]) {
    for m in metrics {
        println!(
            "{}  ai {:>6.1} min  ai lines {:>6}  manual lines {:>6}  reviews {:>4}/{:<4}",
            m.date.to_string().yellow(),
            m.ai_generate_time_minutes,
            m.ai_lines_of_code,
            m.manual_lines_of_code,
            m.resolved_comments_count,
            m.review_comments_count
        );
    }
}

fn print_summary(summary: &MetricsSummary) {
    let rows = [
        ("Sessions", summary.total_sessions.to_string()),
        ("Avg AI time (min)", format!("{:.1}", summary.avg_ai_time)),
        ("AI lines", format!("{:.0}", summary.total_ai_lines)),
        ("Manual lines", format!("{:.0}", summary.total_manual_lines)),
        ("AI share", format!("{:.1}%", summary.ai_efficiency)),
        ("Review comments", format!("{:.0}", summary.total_reviews)),
        ("Resolved", format!("{:.1}%", summary.resolved_rate)),
    ];
    for (label, value) in rows {
        println!("{:<20}{}", label.dimmed(), value);
    }
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    }
}

fn truncate_to_width(s: &str, max_width: usize) -> String {
    use unicode_width::UnicodeWidthChar;

    if s.width() <= max_width {
        return s.to_string();
    }

    let mut result = String::new();
    let mut current_width = 0;

    for c in s.chars() {
        let char_width = c.width().unwrap_or(0);
        if current_width + char_width > max_width.saturating_sub(1) {
            result.push('…');
            return result;
        }
        result.push(c);
        current_width += char_width;
    }

    result
}

fn format_time_ago(timestamp: chrono::DateTime<Utc>) -> String {
    let duration = Utc::now().signed_duration_since(timestamp);

    let formatter = timeago::Formatter::new();
    let time_str = formatter.convert(duration.to_std().unwrap_or_default());

    format!("{:>width$}", time_str, width = TIME_WIDTH)
}
