use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commitmark::config::LoggingConfig;
use commitmark::{AppContext, Commit, CommitStore, Config, GitHubClient, SortOrder};

#[derive(Parser)]
#[command(name = "commitmark")]
#[command(about = "Browse GitHub repositories and commits, and keep favorite commits")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (defaults to XDG config location)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List a user's repositories
    Repos {
        /// GitHub username (defaults to github.username from config)
        username: Option<String>,

        /// Print raw JSON
        #[arg(long)]
        json: bool,
    },

    /// List one page of a repository's commits
    Commits {
        /// Repository owner
        #[arg(short, long)]
        user: Option<String>,

        /// Repository name
        #[arg(short, long)]
        repo: String,

        /// Page number (1-based)
        #[arg(long)]
        page: Option<u32>,

        /// Commits per page
        #[arg(long)]
        per_page: Option<u32>,

        /// Sort order: newest or oldest
        #[arg(long)]
        order: Option<SortOrder>,
    },

    /// Show a commit's stats and changed files
    Show {
        /// Repository owner
        #[arg(short, long)]
        user: Option<String>,

        /// Repository name
        #[arg(short, long)]
        repo: String,

        /// Commit sha
        sha: String,

        /// Include file patches
        #[arg(long)]
        patch: bool,
    },

    /// Manage favorite commits
    Fav {
        #[command(subcommand)]
        fav_command: FavCommands,
    },

    /// Manage persisted UI selections
    Select {
        #[command(subcommand)]
        select_command: SelectCommands,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        config_command: ConfigCommands,
    },

    /// Manage authentication
    Auth {
        #[command(subcommand)]
        auth_command: AuthCommands,
    },
}

#[derive(Subcommand)]
enum FavCommands {
    /// List favorite commits
    List {
        /// Print raw JSON
        #[arg(long)]
        json: bool,
    },

    /// Add a commit to favorites
    Add {
        #[arg(short, long)]
        user: Option<String>,

        #[arg(short, long)]
        repo: String,

        sha: String,
    },

    /// Remove a commit from favorites
    Remove { sha: String },

    /// Add the commit if it is not a favorite, remove it otherwise
    Toggle {
        #[arg(short, long)]
        user: Option<String>,

        #[arg(short, long)]
        repo: String,

        sha: String,
    },
}

#[derive(Subcommand)]
enum SelectCommands {
    /// Store a value (parsed as JSON, or kept as a string)
    Set { key: String, value: String },

    /// Print a stored value
    Get { key: String },

    /// Clear one key, or everything
    Clear { key: Option<String> },

    /// Print all stored values
    List,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective configuration
    Show,

    /// Print the default configuration file path
    Path,
}

#[derive(Subcommand)]
enum AuthCommands {
    /// Show which credentials would be used
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default()?,
    };

    init_logging(cli.verbose, &config.logging)?;
    info!("Starting commitmark v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Config { config_command } => cmd_config(config_command, &config),
        Commands::Auth { auth_command } => cmd_auth(auth_command, &config),
        command => {
            let ctx = AppContext::new(config)?;
            run(command, &ctx).await
        }
    }
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: bool, logging: &LoggingConfig) -> Result<()> {
    let default_level = if verbose { "debug" } else { logging.level.as_str() };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(logging.color);

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "full" {
        registry.with(layer).try_init()?;
    } else {
        registry.with(layer.compact()).try_init()?;
    }

    Ok(())
}

async fn run(command: Commands, ctx: &AppContext) -> Result<()> {
    match command {
        Commands::Repos { username, json } => cmd_repos(ctx, username, json).await,
        Commands::Commits {
            user,
            repo,
            page,
            per_page,
            order,
        } => cmd_commits(ctx, user, repo, page, per_page, order).await,
        Commands::Show {
            user,
            repo,
            sha,
            patch,
        } => cmd_show(ctx, user, repo, sha, patch).await,
        Commands::Fav { fav_command } => cmd_fav(ctx, fav_command).await,
        Commands::Select { select_command } => cmd_select(ctx, select_command),
        Commands::Config { .. } | Commands::Auth { .. } => Ok(()),
    }
}

/// Turn the store's error message into a command failure
fn check(store: &CommitStore) -> Result<()> {
    match store.error() {
        Some(message) => Err(anyhow!(message)),
        None => Ok(()),
    }
}

fn format_date(commit: &Commit) -> String {
    commit
        .commit
        .author
        .timestamp()
        .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| commit.commit.author.date.clone())
}

async fn cmd_repos(ctx: &AppContext, username: Option<String>, json: bool) -> Result<()> {
    let store = &ctx.store;
    store.fetch_repos(username.as_deref()).await;
    check(store)?;

    let repos = store.repos();
    if json {
        println!("{}", serde_json::to_string_pretty(&repos)?);
        return Ok(());
    }

    let owner = store.session().username.unwrap_or_default();
    println!("Repositories of {} ({}):", owner, repos.len());
    for repo in repos {
        println!("  📁 {}", repo.full_name);
        if let Some(description) = repo.description.as_deref().filter(|d| !d.is_empty()) {
            println!("     📝 {}", description);
        }
    }

    Ok(())
}

async fn cmd_commits(
    ctx: &AppContext,
    user: Option<String>,
    repo: String,
    page: Option<u32>,
    per_page: Option<u32>,
    order: Option<SortOrder>,
) -> Result<()> {
    let store = &ctx.store;
    if let Some(order) = order {
        store.set_sort_order(order);
    }

    store
        .fetch_commits(user.as_deref(), Some(&repo), page, per_page)
        .await;
    check(store)?;

    let session = store.session();
    let commits = store.sorted_commits(None);

    println!(
        "Commits of {} (page {}, {} order):",
        repo,
        session.page(),
        session.sort_order
    );
    for commit in &commits {
        let star = if commit.favorited { "★" } else { " " };
        let login = commit
            .author
            .as_ref()
            .map(|a| a.login.as_str())
            .unwrap_or(commit.commit.author.name.as_str());
        println!(
            "  {} {}  {}  {:<16} {}",
            star,
            commit.short_sha(),
            format_date(commit),
            login,
            commit.summary()
        );
    }

    if commits.is_empty() {
        println!("  (no commits on this page)");
    } else if store.has_next_page() {
        println!(
            "\n💡 More commits: --page {}",
            session.page().saturating_add(1)
        );
    }

    Ok(())
}

async fn cmd_show(
    ctx: &AppContext,
    user: Option<String>,
    repo: String,
    sha: String,
    patch: bool,
) -> Result<()> {
    let store = &ctx.store;
    store
        .fetch_commit_detail(user.as_deref(), Some(&repo), Some(&sha))
        .await;
    check(store)?;

    let detail = store
        .commit_detail(&sha)
        .ok_or_else(|| anyhow!("Commit {} was not loaded", sha))?;
    let commit = &detail.commit;

    let star = if store.is_favorite(commit.sha.as_str()) { " ★" } else { "" };
    println!("commit {}{}", commit.sha, star);
    println!(
        "Author: {}{}",
        commit.commit.author.name,
        commit
            .commit
            .author
            .email
            .as_ref()
            .map(|e| format!(" <{}>", e))
            .unwrap_or_default()
    );
    println!("Date:   {}", format_date(commit));
    println!();
    for line in commit.commit.message.lines() {
        println!("    {}", line);
    }
    println!();
    println!(
        "📊 {} changes: +{} -{}",
        detail.stats.total, detail.stats.additions, detail.stats.deletions
    );

    for file in &detail.files {
        println!(
            "  {:<9} {} (+{} -{})",
            file.status, file.filename, file.additions, file.deletions
        );
        if patch {
            if let Some(text) = &file.patch {
                for line in text.lines() {
                    println!("      {}", line);
                }
            }
        }
    }

    Ok(())
}

/// Fetch a commit so it can be favorited
async fn load_commit(
    store: &CommitStore,
    user: Option<&str>,
    repo: &str,
    sha: &str,
) -> Result<Commit> {
    store.set_selected_repo(repo);
    store.fetch_commit_detail(user, Some(repo), Some(sha)).await;
    check(store)?;

    store
        .commit_detail(sha)
        .map(|detail| detail.commit)
        .ok_or_else(|| anyhow!("Commit {} was not loaded", sha))
}

async fn cmd_fav(ctx: &AppContext, fav_command: FavCommands) -> Result<()> {
    let store = &ctx.store;

    match fav_command {
        FavCommands::List { json } => {
            let favorites = store.favorites();
            if json {
                println!("{}", serde_json::to_string_pretty(&favorites)?);
                return Ok(());
            }

            println!("Favorite commits ({}):", favorites.len());
            for favorite in &favorites {
                println!(
                    "  ★ {:<24} {}  {}  {}",
                    favorite.repository.name,
                    favorite.commit.short_sha(),
                    format_date(&favorite.commit),
                    favorite.commit.summary()
                );
            }
        }

        FavCommands::Add { user, repo, sha } => {
            let commit = load_commit(store, user.as_deref(), &repo, &sha).await?;
            if store.add_favorite(&commit, Some(&repo)) {
                println!("✅ Added {} to favorites", commit.short_sha());
            } else {
                println!("⚠️  {} is already a favorite", commit.short_sha());
            }
        }

        FavCommands::Remove { sha } => {
            if store.remove_favorite(&sha) {
                println!("✅ Removed {} from favorites", sha);
            } else {
                println!("⚠️  {} is not a favorite", sha);
            }
        }

        FavCommands::Toggle { user, repo, sha } => {
            let mut commit = load_commit(store, user.as_deref(), &repo, &sha).await?;
            if store.toggle_favorite(&mut commit) {
                println!("★ {} is now a favorite", commit.short_sha());
            } else {
                println!("☆ {} is no longer a favorite", commit.short_sha());
            }
        }
    }

    Ok(())
}

fn cmd_select(ctx: &AppContext, select_command: SelectCommands) -> Result<()> {
    let selections = &ctx.selections;

    match select_command {
        SelectCommands::Set { key, value } => {
            let value = serde_json::from_str(&value).unwrap_or(serde_json::Value::String(value));
            selections.set_selection(key, value);
        }
        SelectCommands::Get { key } => match selections.get_selection(&key) {
            Some(value) => println!("{}", value),
            None => return Err(anyhow!("No selection stored under '{}'", key)),
        },
        SelectCommands::Clear { key } => selections.clear_selection(key.as_deref()),
        SelectCommands::List => {
            for (key, value) in selections.all() {
                println!("{} = {}", key, value);
            }
        }
    }

    Ok(())
}

fn cmd_config(config_command: ConfigCommands, config: &Config) -> Result<()> {
    match config_command {
        ConfigCommands::Show => {
            let mut shown = config.clone();
            if shown.github.token.is_some() {
                shown.github.token = Some("********".to_string());
            }
            print!("{}", serde_yaml::to_string(&shown)?);
        }
        ConfigCommands::Path => {
            println!("{}", Config::default_config_path()?.display());
        }
    }
    Ok(())
}

fn cmd_auth(auth_command: AuthCommands, config: &Config) -> Result<()> {
    match auth_command {
        AuthCommands::Status => match GitHubClient::detect_authentication(config) {
            Ok((strategy, _)) => {
                println!("✅ Authentication: {:?}", strategy);
                println!("   API base: {}", config.github.api_base);
            }
            Err(e) => {
                println!("❌ Authentication failed: {}", e);
                return Err(e.context("Authentication check failed"));
            }
        },
    }
    Ok(())
}
