use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tedx_site::build;
use tedx_site::config::{self, SiteConfig};
use tedx_site::content::ContentClient;
use tedx_site::output;
use tedx_site::pages::{self, BuildContext, RenderError};

#[derive(Parser)]
#[command(name = "tedx-site")]
#[command(about = "Prerender the TEDx site from its CMS content")]
#[command(long_about = "\
Prerender the TEDx site from its CMS content

Page templates live in the project root. Each render fills a template with
content fetched from the Contentful GraphQL API and writes the result to the
same relative path under the output directory.

Project structure:

  ./
  ├── site.toml                    # Optional config (see 'tedx-site gen-config')
  ├── index.html                   # Landing page template
  ├── styles.css, app.js           # Copied verbatim
  ├── assets/                      # Copied verbatim
  └── sites/
      ├── events/events.html       # Event program
      ├── about/about.html
      ├── team/team.html           # Roster for one year
      ├── watch/watch.html         # Talk archive
      ├── contact/contact.html     # Static images only
      └── sponsors/sponsors.html   # Static images only

Credentials come from site.toml or CONTENTFUL_SPACE_ID and
CONTENTFUL_ACCESS_TOKEN. Set RUST_LOG=debug for query-level detail.")]
#[command(version)]
struct Cli {
    /// Project root holding the page templates
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Output directory
    #[arg(long, default_value = "dist", global = true)]
    output: PathBuf,

    /// Config file (default: <root>/site.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full pipeline: clean → copy → render every page
    Build,
    /// Remove the output directory
    Clean,
    /// Render the landing page
    Landing,
    /// Render the events page
    Events,
    /// Render the about page
    About,
    /// Render the team page
    Team,
    /// Render the watch page
    Watch,
    /// Render the template-only pages (contact, sponsors)
    StaticPages,
    /// Print a stock site.toml with all options documented
    GenConfig,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    type Render = fn(&mut BuildContext) -> Result<PathBuf, RenderError>;
    let (label, render): (&'static str, Render) = match cli.command {
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
            return Ok(());
        }
        Command::Clean => {
            build::run_step(build::STEP_CLEAN, || build::clean(&cli.output))?;
            return Ok(());
        }
        Command::Build => {
            let config = load_config(cli)?;
            let client = ContentClient::new(&config.contentful)?;
            build::build(config, &cli.root, &cli.output, &client)?;
            return Ok(());
        }
        Command::StaticPages => {
            let config = load_config(cli)?;
            let client = ContentClient::new(&config.contentful)?;
            let mut ctx = BuildContext::new(config, cli.root.clone(), cli.output.clone(), &client);
            let (written, _) = build::run_step(build::STEP_STATIC_PAGES, || {
                pages::static_pages::render(&mut ctx)
            })?;
            output::print_written(&written, &cli.output);
            return Ok(());
        }
        Command::Landing => (build::STEP_LANDING, pages::landing::render),
        Command::Events => (build::STEP_EVENTS, pages::events::render),
        Command::About => (build::STEP_ABOUT, pages::about::render),
        Command::Team => (build::STEP_TEAM, pages::team::render),
        Command::Watch => (build::STEP_WATCH, pages::watch::render),
    };

    let config = load_config(cli)?;
    let client = ContentClient::new(&config.contentful)?;
    let mut ctx = BuildContext::new(config, cli.root.clone(), cli.output.clone(), &client);
    let (path, _) = build::run_step(label, || render(&mut ctx))?;
    output::print_written(&[path], &cli.output);
    Ok(())
}

fn load_config(cli: &Cli) -> Result<SiteConfig, config::ConfigError> {
    let path = cli
        .config
        .clone()
        .unwrap_or_else(|| cli.root.join(config::CONFIG_FILENAME));
    log::debug!("loading config from {}", config_display(&path));
    config::load_config(&path)
}

fn config_display(path: &Path) -> String {
    if path.exists() {
        path.display().to_string()
    } else {
        format!("{} (not present, using defaults)", path.display())
    }
}
