use std::{future::Future, io::BufRead, path::Path};

use clap::Parser;
use icgeo::{
    api::{self, AppState},
    cli::{self, Cli, Command, UserAction},
    config::{FileConfig, Settings},
    db,
    error::{self, Error},
    ingestion,
    meta,
    normalizer,
    password,
    source_doc::SourceDocument,
    walker,
};
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if let Ok(env) = std::env::var("ICGEO_LOG") {
        EnvFilter::new(env)
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn main() -> error::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match &cli.command {
        Command::Completions(args) => {
            args.generate();
            return Ok(());
        }
        Command::Normalize(args) => return cmd_normalize(args),
        Command::Meta(args) => return cmd_meta(&args.file),
        _ => {}
    }

    let file = FileConfig::locate(cli.config.as_deref())?;
    let settings = Settings::resolve(cli.overrides(), file)?;
    tracing::debug!(?settings, "resolved settings");

    match cli.command {
        Command::Serve(_) => block_on(cmd_serve(settings)),
        Command::Migrate => block_on(cmd_migrate(settings)),
        Command::Insert(args) => block_on(cmd_insert(settings, args)),
        Command::Load(args) => block_on(cmd_load(settings, args)),
        Command::Compare(args) => block_on(cmd_compare(settings, args.json)),
        Command::User {
            action: UserAction::Add { username },
        } => block_on(cmd_user_add(settings, username)),
        Command::Completions(_) | Command::Normalize(_) | Command::Meta(_) => {
            Ok(())
        }
    }
}

fn block_on<F>(future: F) -> error::Result<()>
where
    F: Future<Output = error::Result<()>>,
{
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| {
            Error::Config(format!("failed to start tokio runtime: {e}"))
        })?;
    runtime.block_on(future)
}

fn cmd_normalize(args: &cli::NormalizeArgs) -> error::Result<()> {
    let doc = SourceDocument::load(&args.file)?;
    let interview = normalizer::normalize(doc)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&interview)?);
        return Ok(());
    }

    println!("dialect: {}", interview.dialect);
    println!("paragraphs: {}", interview.text.len());
    println!("questions: {}", interview.questions.len());
    println!("answers: {}", interview.answers.len());
    println!("\n--- questions ---");
    for q in &interview.questions {
        println!("{q}");
    }
    println!("\n--- answers ---");
    for a in &interview.answers {
        println!("{a}");
    }
    Ok(())
}

fn cmd_meta(file: &Path) -> error::Result<()> {
    let doc = SourceDocument::load(file)?;
    let interview = normalizer::normalize(doc)?;
    let meta = meta::generate(&interview);
    println!("{}", serde_json::to_string_pretty(&meta)?);
    Ok(())
}

async fn cmd_serve(settings: Settings) -> error::Result<()> {
    let pool = db::connect_pool(&settings.database, &settings.server).await?;
    let state = AppState::new(
        pool,
        settings.database,
        settings.server.pbkdf2_rounds,
    );
    api::serve(state, settings.server.bind).await
}

async fn cmd_migrate(settings: Settings) -> error::Result<()> {
    let pool = db::connect_pool(&settings.database, &settings.server).await?;
    db::migrate(&pool).await?;
    println!("Migrations applied to '{}'", settings.database.dbname);
    Ok(())
}

async fn cmd_insert(
    settings: Settings,
    args: cli::InsertArgs,
) -> error::Result<()> {
    let prepared = ingestion::prepare(args.id, &args.file)?;
    let pool = db::connect_pool(&settings.database, &settings.server).await?;

    if db::insert_interview(&pool, &prepared.record, args.replace).await? {
        println!(
            "Inserted interview {} ({} layout)",
            args.id, prepared.dialect
        );
    } else {
        println!(
            "Interview {} already exists; use --replace to overwrite it",
            args.id
        );
    }
    Ok(())
}

async fn cmd_load(
    settings: Settings,
    args: cli::LoadArgs,
) -> error::Result<()> {
    let pattern = args
        .pattern
        .as_deref()
        .map(|p| {
            globset::Glob::new(p)
                .map(|g| g.compile_matcher())
                .map_err(|e| {
                    Error::Config(format!("invalid glob pattern: {e}"))
                })
        })
        .transpose()?;

    let files = walker::discover_sources(&args.dir, pattern.as_ref())?;
    if files.is_empty() {
        eprintln!("No transcripts found in {}", args.dir.display());
        return Ok(());
    }
    eprintln!("Found {} transcripts", files.len());

    let pool = db::connect_pool(&settings.database, &settings.server).await?;
    let report = ingestion::load(&pool, &files, args.replace).await;

    for failure in &report.failed {
        eprintln!("  failed: {}: {}", failure.path.display(), failure.reason);
    }
    eprintln!(
        "Inserted {}, unchanged {}, failed {}",
        report.inserted,
        report.unchanged,
        report.failed.len()
    );
    Ok(())
}

async fn cmd_compare(settings: Settings, json: bool) -> error::Result<()> {
    let pool = db::connect_pool(&settings.database, &settings.server).await?;
    let rows = db::fetch_lexeme_comparisons(&pool).await?;

    let mut entries = Vec::with_capacity(rows.len());
    for row in rows {
        let stored: meta::InterviewMeta = match row.meta {
            Some(value) => serde_json::from_value(value)?,
            None => meta::InterviewMeta::default(),
        };
        let diff = meta::compare_stems(&stored.text, &row.lexemes);
        entries.push((row.id, diff));
    }

    if json {
        let out: Vec<_> = entries
            .iter()
            .map(|(id, diff)| {
                serde_json::json!({
                    "id": id,
                    "only_in_database": diff.only_in_database,
                    "only_in_meta": diff.only_in_meta,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    for (id, diff) in &entries {
        println!("ID: {id}");
        println!("In PostgreSQL, not in meta:");
        for lexeme in &diff.only_in_database {
            println!("  {lexeme}");
        }
        println!("In meta, not in PostgreSQL:");
        for stem in &diff.only_in_meta {
            println!("  {stem}");
        }
        println!();
    }
    Ok(())
}

async fn cmd_user_add(
    settings: Settings,
    username: String,
) -> error::Result<()> {
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let secret = line.trim_end_matches(['\r', '\n']);
    if secret.is_empty() {
        return Err(Error::Config("no password given on stdin".into()));
    }

    let hash = password::hash(secret, settings.server.pbkdf2_rounds);
    let pool = db::connect_pool(&settings.database, &settings.server).await?;
    db::create_user(&pool, &username, &hash).await?;
    println!("Created API user '{username}'");
    Ok(())
}
