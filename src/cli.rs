use crate::chart::{ChartSink, ChartStyle, TerminalSink, TextSink};
use crate::config::{Config, FileFormat, DEFAULT_API_BASE, DEFAULT_BRANCH, DEFAULT_RAW_BASE};
use crate::config::{DEFAULT_BASE_COLOR, DEFAULT_REPOSITORY, DEFAULT_THEME_STATS_URL};
use crate::pipeline::{RunPlan, Runner, Views};
use crate::source::{GithubSource, UreqTransport};
use anyhow::{Context, Result};
use clap::{Args, Parser};
use console::style;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "obsidian-stats")]
#[command(about = "Charts and saved history for Obsidian community plugins, themes and releases")]
#[command(version)]
pub struct Cli {
    #[arg(short = 'p', long, help = "Plugin statistics")]
    pub plugins: bool,

    #[arg(short = 't', long, help = "Theme statistics")]
    pub themes: bool,

    #[arg(short = 'r', long, help = "Release download statistics")]
    pub releases: bool,

    #[arg(short = 'a', long, help = "Plugins, themes and releases")]
    pub all: bool,

    #[arg(short = 's', long, help = "Save fetched data under the data directory")]
    pub save: bool,

    #[arg(short = 'H', long, help = "Charts built from the monthly history")]
    pub history: bool,

    #[arg(short = 'l', long, help = "Charts built from the latest stats")]
    pub latest: bool,

    #[clap(flatten)]
    pub common: CommonArgs,
}

#[derive(Args, Clone)]
pub struct CommonArgs {
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true, help = "GitHub token for API requests")]
    pub token: Option<String>,

    #[arg(long, default_value = DEFAULT_API_BASE, help = "GitHub API base URL")]
    pub api_base: String,

    #[arg(long, default_value = DEFAULT_RAW_BASE, help = "Raw file base URL")]
    pub raw_base: String,

    #[arg(long, default_value = DEFAULT_REPOSITORY, help = "Repository holding the community manifests (owner/name)")]
    pub repository: String,

    #[arg(long, default_value = DEFAULT_BRANCH, help = "Branch read for the latest plugin stats")]
    pub branch: String,

    #[arg(long, default_value = DEFAULT_THEME_STATS_URL, help = "Endpoint serving the latest theme stats")]
    pub theme_stats_url: String,

    #[arg(long, default_value = ".", help = "Directory holding the saved_* folders")]
    pub data_dir: PathBuf,

    #[arg(long, value_enum, default_value_t = FileFormat::Json, help = "Format of the monthly series files")]
    pub format: FileFormat,

    #[arg(long, default_value = DEFAULT_BASE_COLOR, help = "Base chart color (#RRGGBB)")]
    pub base_color: String,

    #[arg(
        long,
        value_delimiter = ',',
        default_value = "0,20,50,100,200,500,700,1000,1200",
        help = "Top-N thresholds for the download concentration chart"
    )]
    pub top_n: Vec<usize>,

    #[arg(long, value_parser = humantime::parse_duration, default_value = "30s", help = "Per-request timeout (e.g. 30s, 2m)")]
    pub timeout: Duration,

    #[arg(long, help = "Print charts as text instead of the interactive viewer")]
    pub headless: bool,

    #[arg(short = 'v', long, action = clap::ArgAction::Count, help = "More log output (-v debug, -vv trace)")]
    pub verbose: u8,

    #[arg(short = 'q', long, help = "Only log errors")]
    pub quiet: bool,
}

impl CommonArgs {
    pub fn to_config(&self) -> Config {
        Config {
            api_base: self.api_base.clone(),
            raw_base: self.raw_base.clone(),
            repository: self.repository.clone(),
            branch: self.branch.clone(),
            theme_stats_url: self.theme_stats_url.clone(),
            token: self.token.clone(),
            timeout: Some(self.timeout),
            data_dir: self.data_dir.clone(),
            format: self.format,
            base_color: self.base_color.clone(),
            top_n: self.top_n.clone(),
            headless: self.headless,
        }
    }
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn plan(&self) -> RunPlan {
        let views = Views {
            save: self.save,
            latest: self.latest,
            history: self.history,
        };
        RunPlan::new(self.plugins, self.themes, self.releases, self.all, views)
    }

    pub fn execute(self) -> Result<()> {
        let plan = self.plan();
        if plan.is_empty() {
            eprintln!(
                "{} nothing selected; pass -p, -t, -r or -a (see --help)",
                style("note:").cyan().bold()
            );
            return Ok(());
        }

        let config = self.common.to_config();
        config.validate().context("Invalid arguments")?;
        let chart_style = ChartStyle::from_hex(&config.base_color)?;

        let interactive = !config.headless && std::io::stdout().is_terminal();
        let mut sink: Box<dyn ChartSink> = if interactive {
            Box::new(TerminalSink::new(chart_style))
        } else {
            Box::new(TextSink::new(std::io::stdout(), chart_style))
        };

        let transport = UreqTransport::new(config.token.clone(), config.timeout);
        let source = GithubSource::new(transport, &config);
        let show_progress = !self.common.quiet && std::io::stderr().is_terminal();

        Runner::new(&config, source, sink.as_mut())
            .with_progress(show_progress)
            .run(&plan)
    }
}
