use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use console::style;
use tracing::error;

use pagekit::{
    descriptor,
    schema::PageSchema,
    session::PageSession,
    transport::HttpTransport,
};

#[derive(Parser)]
struct Opts {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse and validate a page descriptor.
    Lint { descriptor: PathBuf },
    /// Fetch the first page from the live endpoint and print it.
    Preview {
        descriptor: PathBuf,
        #[clap(short, long, env = "PAGEKIT_BASE_URL")]
        base_url: Option<url::Url>,
        #[clap(short, long, env = "PAGEKIT_API_TOKEN")]
        token: Option<String>,
    },
}

async fn run(opts: Opts) -> anyhow::Result<()> {
    match opts.command {
        Command::Lint { descriptor: path } => {
            let descriptor = descriptor::load(&path).await?;
            let schema = PageSchema::compile(&descriptor)
                .with_context(|| format!("compile {}", path.display()))?;
            let actions = schema
                .actions_column()
                .map(|column| column.actions.len())
                .unwrap_or(0);
            println!(
                "{} {}: {} columns, {} row actions, {} buttons",
                style("ok").green(),
                schema.title,
                schema.columns.len(),
                actions,
                schema.buttons.len(),
            );
        }
        Command::Preview {
            descriptor: path,
            base_url,
            token,
        } => {
            let descriptor = descriptor::load(&path).await?;
            let transport = HttpTransport::new(base_url, token);
            let session = PageSession::new(transport, &descriptor)?;
            let spinner = indicatif::ProgressBar::new_spinner();
            spinner.set_message("loading page");
            spinner.enable_steady_tick(std::time::Duration::from_millis(80));
            let mounted = session.mount().await;
            spinner.finish_and_clear();
            mounted.with_context(|| format!("load {}", session.schema().data_url))?;
            let rows = session.render_rows();
            print!(
                "{}",
                pagekit::preview::render_table(
                    session.schema(),
                    &rows,
                    &session.pager().pagination().get(),
                )
            );
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let opts = Opts::parse();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    if let Err(e) = run(opts).await {
        error!(?e, "critical error");
        std::process::exit(1);
    }
}
