use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::pin::pin;

use anyhow::{Result, bail};
use clap::Parser;
use futures::StreamExt;
use log::{error, info, warn};
use tracing_subscriber::EnvFilter;
use twback::{ApiClient, ApiClientImpl, Client, Target, config};

#[derive(Parser)]
#[command(author, version, about = "Show what the public web front-end knows about an account")]
struct Args {
    /// account to look up, asked for when omitted; `#tag` streams a hashtag search
    username: Option<String>,
    /// number of timeline pages to fetch, defaults to the config value
    #[arg(short, long)]
    pages: Option<u32>,
    /// location of config file
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// print the profile and skip the posts
    #[arg(long)]
    no_posts: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = init_logger() {
        eprintln!("failed to init logger: {e}");
    }
    if let Err(e) = start(Args::parse()).await {
        error!("{e:#}");
        std::process::exit(1);
    }
}

async fn start(args: Args) -> Result<()> {
    config::init(args.config)?;
    let config = config::snapshot()?;

    let input = match args.username {
        Some(username) => username,
        None => prompt("Twitter username: ")?,
    };
    if input.trim().is_empty() {
        bail!("no username given");
    }
    let api = ApiClientImpl::new(Client::new()?, config);
    let pages = args.pages.unwrap_or(api.config().pages);
    show(&api, Target::parse(&input), pages, args.no_posts).await
}

async fn show(api: &impl ApiClient, target: Target, pages: u32, no_posts: bool) -> Result<()> {
    match &target {
        Target::User(username) => {
            let profile = api.profile(username).await?;
            info!("got {profile}");
            println!("{}", serde_json::to_string_pretty(&profile)?);
        }
        Target::Hashtag(_) => warn!("{target} is a hashtag, skipping the profile"),
    }
    if no_posts {
        return Ok(());
    }

    let mut posts = pin!(api.timeline(target, pages));
    let mut count = 0usize;
    while let Some(post) = posts.next().await {
        println!("{}", serde_json::to_string_pretty(&post?)?);
        count += 1;
    }
    info!("done, {count} posts");
    Ok(())
}

fn prompt(message: &str) -> Result<String> {
    print!("{message}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn init_logger() -> Result<()> {
    tracing_log::LogTracer::init()?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,html5ever=warn,selectors=warn"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
