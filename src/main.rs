//! Coreblog - A plain-text blog engine with media embedding.
//!
//! # Usage
//!
//! ```bash
//! coreblog build --out public
//! coreblog --source https://blog.example.com/ show --query "article=2"
//! coreblog build --watch
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use coreblog::cache::{CacheStore, ContentCache, FileStore, MemoryStore};
use coreblog::config::{
    ConfigFlags, clear_config_flags, global_config_path, load_config_flags, local_override_path,
    save_config_flags,
};
use coreblog::markup::Renderer;
use coreblog::page::{LinkStyle, Navigation, render_page};
use coreblog::post::Post;
use coreblog::repository::Repository;
use coreblog::search;
use coreblog::slug::slugify;
use coreblog::source::{AnyFetcher, Fetcher};
use coreblog::watcher::ContentWatcher;

/// A plain-text blog engine with media embedding and a post cache
#[derive(Parser, Debug)]
#[command(name = "coreblog", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Content root: a directory or an http(s) base URL [default: .]
    #[arg(long, global = true, value_name = "DIR|URL")]
    source: Option<String>,

    /// Manifest path relative to the content root [default: posts/list.txt]
    #[arg(long, global = true, value_name = "PATH")]
    manifest: Option<String>,

    /// Cache file [default: .coreblog-cache.json]
    #[arg(long, global = true, value_name = "PATH")]
    cache_file: Option<PathBuf>,

    /// Cache time-to-live in milliseconds [default: three days]
    #[arg(long, global = true, value_name = "MS")]
    ttl_ms: Option<u64>,

    /// HTTP timeout in seconds [default: 30]
    #[arg(long, global = true, value_name = "SECS")]
    timeout_secs: Option<u64>,

    /// Article link style for printed pages
    #[arg(long, global = true, value_enum)]
    links: Option<LinkStyle>,

    /// Keep the cache in memory for this run only
    #[arg(long, global = true)]
    no_cache: bool,

    /// Log debug events to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Save current command-line flags as defaults
    #[arg(long, global = true)]
    save: bool,

    /// Clear saved defaults
    #[arg(long, global = true)]
    clear: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve every post and write a static site
    Build {
        /// Output directory
        #[arg(long, default_value = "public")]
        out: PathBuf,

        /// Rebuild whenever the content root changes
        #[arg(short, long)]
        watch: bool,

        /// Site title
        #[arg(long, default_value = "Blog")]
        title: String,
    },
    /// Print the page for a navigation query
    Show {
        /// Query string, e.g. "article=2&title=my-post"
        #[arg(long, default_value = "")]
        query: String,

        /// Site title
        #[arg(long, default_value = "Blog")]
        title: String,
    },
    /// Print the rendered body of a single post file
    Render {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// List posts whose title or date matches
    Search {
        #[arg(value_name = "QUERY")]
        query: String,
    },
    /// Print the slug for some text
    Slug {
        #[arg(value_name = "TEXT", required = true)]
        text: Vec<String>,
    },
    /// Evict expired cache entries
    Sweep,
    /// Remove every cached post
    ClearCache,
}

impl Cli {
    fn flags(&self) -> ConfigFlags {
        ConfigFlags {
            source: self.source.clone(),
            manifest: self.manifest.clone(),
            cache_file: self.cache_file.clone(),
            ttl_ms: self.ttl_ms,
            timeout_secs: self.timeout_secs,
            links: self.links,
            no_cache: self.no_cache,
            verbose: self.verbose,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = cli.flags();

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);

    // Initialize logging
    let level = if effective.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    // These never touch the content root or the cache.
    match &cli.command {
        Command::Render { file } => return render_file(file),
        Command::Slug { text } => {
            println!("{}", slugify(&text.join(" ")));
            return Ok(());
        }
        _ => {}
    }

    let fetcher = AnyFetcher::from_source(effective.source(), effective.timeout())
        .with_context(|| format!("Invalid content source {}", effective.source()))?;

    if effective.no_cache {
        run(&cli.command, &effective, fetcher, MemoryStore::new())
    } else {
        let cache_path = effective.cache_file();
        let store = FileStore::open(cache_path.clone())
            .with_context(|| format!("Failed to open cache {}", cache_path.display()))?;
        run(&cli.command, &effective, fetcher, store)
    }
}

fn run<S: CacheStore>(
    command: &Command,
    flags: &ConfigFlags,
    fetcher: AnyFetcher,
    store: S,
) -> Result<()> {
    let watch_root = match &fetcher {
        AnyFetcher::Fs(local) => Some(local.root().to_path_buf()),
        AnyFetcher::Http(_) => None,
    };
    let mut repo = Repository::new(fetcher, ContentCache::new(store)).with_ttl(flags.ttl());

    match command {
        Command::Build { out, watch, title } => {
            let written = build(&mut repo, flags.manifest(), out, title)?;
            println!("Wrote {written} pages to {}", out.display());
            if *watch {
                let root = watch_root.context("--watch needs a local --source directory")?;
                watch_and_rebuild(&mut repo, flags, &root, out, title)?;
            }
        }
        Command::Show { query, title } => {
            load(&mut repo, flags.manifest())?;
            let nav = Navigation::from_query(query);
            let mut renderer = Renderer::new();
            print!(
                "{}",
                render_page(repo.posts(), &nav, &mut renderer, flags.links(), title)
            );
        }
        Command::Search { query } => {
            load(&mut repo, flags.manifest())?;
            for index in search::filter(repo.posts(), query) {
                let post = &repo.posts()[index];
                println!("{index}\t{}\t{}", post.published_label, post.title);
            }
        }
        Command::Sweep => {
            let report = repo.sweep_expired().context("Failed to sweep cache")?;
            for (key, err) in &report.skipped {
                eprintln!("[warn] Skipped {key}: {err}");
            }
            println!(
                "Removed {} expired entries, kept {}",
                report.removed.len(),
                report.kept
            );
        }
        Command::ClearCache => {
            repo.clear_cache().context("Failed to clear cache")?;
            println!("Cache cleared");
        }
        Command::Render { .. } | Command::Slug { .. } => {}
    }
    Ok(())
}

fn load<F: Fetcher, S: CacheStore>(repo: &mut Repository<F, S>, manifest: &str) -> Result<()> {
    repo.load(manifest)
        .with_context(|| format!("Failed to load posts from {manifest}"))?;
    Ok(())
}

/// Write `index.html` plus one `article-<n>.html` per post.
fn build<F: Fetcher, S: CacheStore>(
    repo: &mut Repository<F, S>,
    manifest: &str,
    out: &Path,
    title: &str,
) -> Result<usize> {
    load(repo, manifest)?;
    let posts = repo.posts();
    fs::create_dir_all(out).with_context(|| format!("Failed to create {}", out.display()))?;

    let mut renderer = Renderer::new();
    let mut pages = vec![(
        out.join("index.html"),
        render_page(posts, &Navigation::default(), &mut renderer, LinkStyle::Files, title),
    )];
    for (index, post) in posts.iter().enumerate() {
        let nav = Navigation {
            article: index,
            title: Some(slugify(&post.title)),
        };
        pages.push((
            out.join(format!("article-{index}.html")),
            render_page(posts, &nav, &mut renderer, LinkStyle::Files, title),
        ));
    }

    for (path, html) in &pages {
        fs::write(path, html).with_context(|| format!("Failed to write {}", path.display()))?;
    }
    tracing::info!(pages = pages.len(), out = %out.display(), "site written");
    Ok(pages.len())
}

fn watch_and_rebuild<F: Fetcher, S: CacheStore>(
    repo: &mut Repository<F, S>,
    flags: &ConfigFlags,
    root: &Path,
    out: &Path,
    title: &str,
) -> Result<()> {
    let out_abs = std::path::absolute(out).context("Failed to resolve output directory")?;
    let cache_abs =
        std::path::absolute(flags.cache_file()).context("Failed to resolve cache file")?;
    let mut watcher = ContentWatcher::new(root, Duration::from_millis(200))
        .with_context(|| format!("Failed to watch {}", root.display()))?
        .ignoring(&out_abs)
        .ignoring_cache_file(&cache_abs);

    println!("Watching {} (Ctrl-C to stop)", watcher.root().display());
    loop {
        if watcher.take_change_ready() {
            // Edited posts must not be served from the cache.
            repo.clear_cache().context("Failed to clear cache")?;
            match build(repo, flags.manifest(), out, title) {
                Ok(written) => println!("Rebuilt {written} pages"),
                Err(err) => eprintln!("[warn] Rebuild failed: {err:#}"),
            }
        }
        std::thread::sleep(Duration::from_millis(50));
    }
}

fn render_file(file: &Path) -> Result<()> {
    let raw =
        fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let post = Post::parse(&file.display().to_string(), &raw)
        .with_context(|| format!("Failed to parse {}", file.display()))?;
    println!("{}", Renderer::new().render(&post.body));
    Ok(())
}
