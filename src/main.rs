// src/main.rs
// =============================================================================
// Entry point of the markview binary.
//
// What happens here:
// 1. Install the tracing subscriber (RUST_LOG, default markview=info)
// 2. Parse command-line arguments using clap
// 3. Build the service (client + cache) from the resulting Config
// 4. Dispatch to the subcommand handler
// 5. Exit with a proper code (0 = success, 1 = reported failure, 2 = error)
//
// Every one-shot command goes through a `Session`, the same state machine a
// viewer would drive, so the CLI exercises the exact load/classify path.
// =============================================================================

mod cli;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use futures::stream::{self, StreamExt};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use markview::filters::{file_name, group_by_directory, ROOT_GROUP};
use markview::github::{validate_file_path, validate_ref_input, GitHubError, MarkdownFile};
use markview::markdown::{generate_toc, render_html, TocItem};
use markview::server::{self, Api};
use markview::service::DocsService;
use markview::session::{
    parse_repository_input, Document, ErrorDetails, Session, Severity, INPUT_HINT,
};

#[tokio::main]
async fn main() {
    init_tracing();

    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            // Anything that wasn't classified and reported already
            eprintln!("Error: {e:#}");
            2
        }
    };

    std::process::exit(exit_code);
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("markview=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// Returns:
//   Ok(0) = success
//   Ok(1) = failure that was explained to the user
//   Err   = unexpected error (exit code 2)
async fn run() -> Result<i32> {
    let cli = Cli::parse();

    if let Commands::Serve(args) = &cli.command {
        let config = args.config(&cli.github);
        let service = config.build_service()?;
        let api = Arc::new(Api::new(Arc::new(service)));
        server::serve(&config.bind, api).await?;
        return Ok(0);
    }

    let service = cli.github.config().build_service()?;

    match cli.command {
        Commands::Files {
            repo,
            git_ref,
            include,
            exclude,
            preset,
            case_sensitive,
            json,
        } => {
            let filters = FileFilters {
                include,
                exclude,
                preset,
                case_sensitive,
            };
            handle_files(&service, &repo, git_ref, filters, json).await
        }
        Commands::Toc {
            repo,
            path,
            git_ref,
            json,
        } => handle_toc(&service, &repo, &path, git_ref, json).await,
        Commands::Render {
            repo,
            path,
            git_ref,
        } => handle_render(&service, &repo, &path, git_ref).await,
        Commands::Outline {
            repo,
            git_ref,
            concurrency,
        } => handle_outline(&service, &repo, git_ref, usize::from(concurrency)).await,
        Commands::RateLimit { json } => handle_rate_limit(&service, json).await,
        Commands::Serve(_) => Ok(0),
    }
}

// -----------------------------------------------------------------------------
// Loading
// -----------------------------------------------------------------------------

/// Parses the input, loads metadata and (optionally) the file list into a
/// fresh session. Failures come back classified, ready to print.
async fn open_repository(
    service: &DocsService,
    input: &str,
    git_ref: Option<String>,
    with_files: bool,
) -> Result<Session, ErrorDetails> {
    let mut target =
        parse_repository_input(input).ok_or_else(|| ErrorDetails::from_message(INPUT_HINT))?;
    if let Some(r) = git_ref.filter(|r| !r.trim().is_empty()) {
        validate_ref_input(&r).map_err(|msg| ErrorDetails::from_message(&msg))?;
        target.git_ref = Some(r.trim().to_string());
    }

    let mut session = Session::new();
    let (owner, repo, explicit_ref) = (
        target.owner.clone(),
        target.repo.clone(),
        target.git_ref.clone(),
    );

    let ticket = session.load_repository(target);
    let metadata = service.repository(&owner, &repo).await;
    if let Ok(m) = &metadata {
        debug!(repo = %m.data.full_name, cached = m.cached, "repository metadata");
    }
    session.finish_repository(ticket, metadata.map(|m| m.data).map_err(ErrorDetails::from));
    fail_on_error(&session)?;

    if with_files {
        let ticket = session.begin_files();
        let files = service.files(&owner, &repo, explicit_ref.as_deref()).await;
        session.finish_files(ticket, files.map(|f| f.data).map_err(ErrorDetails::from));
        fail_on_error(&session)?;
    }

    Ok(session)
}

fn fail_on_error(session: &Session) -> Result<(), ErrorDetails> {
    match session.error() {
        Some(details) => Err(details.clone()),
        None => Ok(()),
    }
}

// A 404 on the contents endpoint means the file is missing, not the repo
fn content_error(path: &str, err: GitHubError) -> ErrorDetails {
    match err {
        GitHubError::Api {
            status: Some(404), ..
        } => ErrorDetails {
            message: format!("File {path} not found"),
            suggestion: Some("Run `markview files` to see the available paths.".to_string()),
            severity: Severity::Error,
        },
        other => ErrorDetails::from(other),
    }
}

async fn open_document(
    service: &DocsService,
    input: &str,
    path: &str,
    git_ref: Option<String>,
) -> Result<Session, ErrorDetails> {
    validate_file_path(path).map_err(|msg| ErrorDetails::from_message(&msg))?;
    let mut session = open_repository(service, input, git_ref, false).await?;
    let (owner, repo, git_ref) = match session.target() {
        Some(t) => (t.owner.clone(), t.repo.clone(), session.effective_ref().map(String::from)),
        None => return Err(ErrorDetails::unexpected()),
    };

    let ticket = session.select_file(path);
    let content = service.content(&owner, &repo, path, git_ref.as_deref()).await;
    session.finish_content(
        ticket,
        content.map(|c| c.data).map_err(|e| content_error(path, e)),
    );
    fail_on_error(&session)?;
    Ok(session)
}

fn report(details: &ErrorDetails) -> i32 {
    let icon = match details.severity {
        Severity::Error => "❌",
        Severity::Warning => "⚠️ ",
        Severity::Info => "ℹ️ ",
    };
    eprintln!("{icon} {}", details.message);
    if let Some(suggestion) = &details.suggestion {
        eprintln!("   💡 {suggestion}");
    }
    1
}

// -----------------------------------------------------------------------------
// Handlers
// -----------------------------------------------------------------------------

struct FileFilters {
    include: Option<String>,
    exclude: Option<String>,
    preset: Option<String>,
    case_sensitive: bool,
}

// Handles the `files` command
//
// Parameters:
//   input: owner/repo or a GitHub URL
//   git_ref: optional branch/tag/commit (overrides one found in the URL)
//   filters: include/exclude patterns or a named preset
//   json: print the filtered list as JSON instead of grouped text
//
// Returns: exit code (0 = listed, 1 = reported failure)
async fn handle_files(
    service: &DocsService,
    input: &str,
    git_ref: Option<String>,
    filters: FileFilters,
    json: bool,
) -> Result<i32> {
    let mut session = match open_repository(service, input, git_ref, true).await {
        Ok(session) => session,
        Err(details) => return Ok(report(&details)),
    };

    if let Some(key) = &filters.preset {
        if !session.apply_preset(key) {
            return Ok(report(&ErrorDetails::from_message(&format!(
                "Invalid preset {key}: expected documentation, noTests, readmes or rootOnly"
            ))));
        }
    }
    if let Some(include) = &filters.include {
        session.set_include(include);
    }
    if let Some(exclude) = &filters.exclude {
        session.set_exclude(exclude);
    }
    session.set_case_sensitive(filters.case_sensitive);

    let visible = session.visible_files();
    if let Some(error) = &visible.error {
        return Ok(report(&ErrorDetails::from_message(&format!(
            "Invalid pattern: {error}"
        ))));
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&visible.files)?);
        return Ok(0);
    }

    if let Some(notice) = session.notice() {
        report(notice);
        return Ok(0);
    }

    let total = session.files().len();
    if let Some(meta) = session.metadata() {
        println!("📚 {} @ {}", meta.full_name, session.effective_ref().unwrap_or("?"));
    }
    print_grouped(&visible.files);
    if session.has_filters() {
        println!("\n📋 Showing {} of {} file(s)", visible.files.len(), total);
    } else {
        println!("\n📋 {} file(s)", total);
    }
    Ok(0)
}

async fn handle_toc(
    service: &DocsService,
    input: &str,
    path: &str,
    git_ref: Option<String>,
    json: bool,
) -> Result<i32> {
    let session = match open_document(service, input, path, git_ref).await {
        Ok(session) => session,
        Err(details) => return Ok(report(&details)),
    };
    let Some(document) = session.document() else {
        return Ok(report(&ErrorDetails::unexpected()));
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&document.toc)?);
    } else {
        print_document_toc(document);
    }
    Ok(0)
}

async fn handle_render(
    service: &DocsService,
    input: &str,
    path: &str,
    git_ref: Option<String>,
) -> Result<i32> {
    let session = match open_document(service, input, path, git_ref).await {
        Ok(session) => session,
        Err(details) => return Ok(report(&details)),
    };
    let (Some(document), Some(ctx)) = (session.document(), session.render_context()) else {
        return Ok(report(&ErrorDetails::unexpected()));
    };

    let rendered = render_html(&document.file.content, &ctx);
    debug!(headings = rendered.heading_ids.len(), "rendered document");
    println!("{}", rendered.html);
    Ok(0)
}

// Handles the `outline` command: every Markdown file's TOC, one after
// another
//
// Files are fetched `concurrency` at a time but printed in list order, so
// the output doesn't depend on which download finishes first.
async fn handle_outline(
    service: &DocsService,
    input: &str,
    git_ref: Option<String>,
    concurrency: usize,
) -> Result<i32> {
    let session = match open_repository(service, input, git_ref, true).await {
        Ok(session) => session,
        Err(details) => return Ok(report(&details)),
    };
    let (Some(target), Some(git_ref)) = (session.target(), session.effective_ref()) else {
        return Ok(report(&ErrorDetails::unexpected()));
    };
    if let Some(notice) = session.notice() {
        report(notice);
        return Ok(0);
    }

    info!(files = session.files().len(), concurrency, "fetching documents");

    // buffer_unordered finishes in any order; the index puts it back
    let mut results: Vec<_> = stream::iter(session.files().iter().enumerate())
        .map(|(index, file)| async move {
            let content = service
                .content(&target.owner, &target.repo, &file.path, Some(git_ref))
                .await;
            (index, file, content)
        })
        .buffer_unordered(concurrency)
        .collect()
        .await;
    results.sort_by_key(|(index, _, _)| *index);

    let mut failed = 0;
    for (_, file, content) in results {
        match content {
            Ok(content) => print_outline_entry(file, &content.data.content),
            Err(e) => {
                failed += 1;
                println!("\n📄 {}", file.path);
                println!("   ❌ {}", content_error(&file.path, e).message);
            }
        }
    }

    println!("\n📊 Summary:");
    println!("   ✅ Outlined: {}", session.files().len() - failed);
    println!("   ❌ Failed: {}", failed);
    Ok(if failed > 0 { 1 } else { 0 })
}

async fn handle_rate_limit(service: &DocsService, json: bool) -> Result<i32> {
    let rate = match service.rate_limit().await {
        Ok(rate) => rate.data,
        Err(e) => return Ok(report(&ErrorDetails::from(e))),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&rate)?);
        return Ok(0);
    }

    println!("📊 GitHub API rate limit:");
    println!("   Remaining: {}/{}", rate.remaining, rate.limit);
    println!("   Used: {}", rate.used);
    println!("   Resets at: {}", rate.reset_at.format("%Y-%m-%d %H:%M:%S UTC"));
    Ok(0)
}

// -----------------------------------------------------------------------------
// Printing
// -----------------------------------------------------------------------------

fn print_grouped(files: &[MarkdownFile]) {
    for (dir, group) in group_by_directory(files) {
        let label = if dir == ROOT_GROUP { "/" } else { dir.as_str() };
        println!("📁 {label}");
        for file in group {
            println!("   {:<50} {:>10}", file_name(&file.path), format_size(file.size));
        }
    }
}

fn print_document_toc(document: &Document) {
    println!("📄 {}", document.file.path);
    if document.toc.is_empty() {
        println!("   No headings found in this document");
        return;
    }
    print_toc(&document.toc, 1);
}

fn print_outline_entry(file: &MarkdownFile, content: &str) {
    println!("\n📄 {}", file.path);
    let toc = generate_toc(content);
    if toc.is_empty() {
        println!("   (no headings)");
    }
    print_toc(&toc, 1);
}

fn print_toc(items: &[TocItem], depth: usize) {
    for item in items {
        println!("{}- {} (#{})", "  ".repeat(depth), item.text, item.id);
        print_toc(&item.children, depth + 1);
    }
}

fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    let bytes_f = bytes as f64;
    if bytes_f < KB {
        format!("{bytes} B")
    } else if bytes_f < KB * KB {
        format!("{:.1} KB", bytes_f / KB)
    } else {
        format!("{:.1} MB", bytes_f / (KB * KB))
    }
}
