//! refdoc-nav CLI tool
//!
//! Renders the navigation sidebar a page would show, from JSON fragments on disk.
//!
//! ## Commands
//!
//! - `render <fragments-dir>`: load the given fragments for a page and print its sidebar
//!
//! Fragment links passed to `--load` are root-relative, just like the links inside the
//! fragments themselves, and are read from below `<fragments-dir>`.

use clap::{Parser, Subcommand};
use refdoc_nav::{
    config::NavConfig,
    context::{NavContext, NavOutcome},
    event::CompletionTag,
    loader::FsFragmentSource,
    paths::absolute_href,
};
use std::{path::PathBuf, sync::Arc};

#[derive(Parser)]
#[command(name = "refdoc-nav")]
#[command(author, version, about = "Render reference documentation sidebars from navigation fragments", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate fragments for one page and print the resulting sidebar
    Render {
        /// Directory fragment links are resolved against
        fragments: PathBuf,

        /// Root-relative link of the page being viewed (overrides the config file)
        #[arg(long)]
        page: Option<String>,

        /// Root-relative fragment link to load, may be repeated
        #[arg(long = "load", required = true)]
        loads: Vec<String>,

        /// Page configuration file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Documentation publish time, seconds since the unix epoch
        #[arg(long)]
        publish_time: Option<i64>,

        /// Print absolute links below this URL instead of the sidebar markup
        #[arg(long)]
        base_url: Option<String>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            fragments,
            page,
            loads,
            config,
            publish_time,
            base_url,
        } => {
            let mut nav_config = match config {
                Some(path) => NavConfig::load(path)?,
                None => NavConfig::default(),
            };
            if page.is_some() {
                nav_config.current_link = page;
            }
            if let Some(publish_time) = publish_time {
                nav_config.publish_time = publish_time;
            }

            let page_link = nav_config.page_link().to_string();

            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;

            let outcome = runtime.block_on(async {
                let mut ctx = NavContext::new(nav_config)
                    .with_source(Arc::new(FsFragmentSource::new(fragments)));
                for link in loads.iter() {
                    ctx.load(link, Some(CompletionTag::TopLevel), &[]);
                }
                ctx.notify_dom_ready();
                let outcome = ctx.run_until_idle().await;
                (outcome, ctx)
            });

            match outcome {
                (NavOutcome::Rendered(sidebar), ctx) | (NavOutcome::Cached(sidebar), ctx) => {
                    match base_url {
                        Some(base_url) => {
                            for (kind, children) in ctx.type_buckets().iter() {
                                for child in children.iter() {
                                    let href = absolute_href(&base_url, &page_link, &child.link)?;
                                    println!("{kind}\t{}\t{href}", child.name);
                                }
                            }
                        }
                        None => println!("{}", sidebar.markup()),
                    }
                }
                (
                    NavOutcome::Pending {
                        outstanding,
                        pending_inheritance,
                        ..
                    },
                    _,
                ) => {
                    eprintln!(
                        "Error: navigation did not render ({outstanding} fragment(s) outstanding, waiting on {pending_inheritance:?})"
                    );
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
