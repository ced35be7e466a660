use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gherkin_jira::api;
use gherkin_jira::config::AppConfig;
use gherkin_jira::gherkin::{parse_file, write_feature_files};
use gherkin_jira::models::{DescriptionFormat, HierarchyConfig, PlanNode, Shape};
use gherkin_jira::plan::{self, render_tree};
use gherkin_jira::service::{self, CreateOptions};
use gherkin_jira::tracker::{epic_field_candidates, JiraClient, TrackerClient};

#[derive(Parser)]
#[command(name = "gherkin-jira")]
#[command(about = "Turn Gherkin feature files into a hierarchy of Jira issues")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the issues a document would create, without contacting Jira
    Preview {
        /// A .feature file or a directory of them
        path: PathBuf,

        /// Mark only these node ids selected (comma separated)
        #[arg(long, value_delimiter = ',')]
        select: Vec<String>,

        #[command(flatten)]
        hierarchy: HierarchyArgs,

        /// Print the plan as JSON (usable with `create --plan`)
        #[arg(long)]
        json: bool,
    },
    /// Create the issues for a document or a saved plan
    Create {
        /// A .feature file or a directory of them
        #[arg(required_unless_present = "plan")]
        path: Option<PathBuf>,

        /// A plan saved from `preview --json`, created as-is
        #[arg(long, conflicts_with = "path")]
        plan: Option<PathBuf>,

        /// Only create these node ids (comma separated, e.g. item-1,item-2)
        #[arg(long, value_delimiter = ',')]
        select: Vec<String>,

        #[command(flatten)]
        hierarchy: HierarchyArgs,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write each Feature block of a document to its own .feature file
    Split {
        path: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },
    /// Check the Jira connection and credentials
    Check,
    /// List projects visible to the configured user
    Projects,
    /// List issue types, for one project or the whole site
    IssueTypes {
        #[arg(short, long)]
        project: Option<String>,
    },
    /// List fields, suggesting Epic Name / Epic Link candidates
    Fields {
        /// Only show custom fields
        #[arg(long)]
        custom: bool,
    },
    /// Find existing issues a tree could be created under
    Parents {
        #[arg(short, long)]
        project: Option<String>,

        #[arg(long)]
        shape: Option<Shape>,
    },
    /// Save connection settings and hierarchy defaults
    Configure {
        #[arg(long)]
        url: Option<String>,

        #[arg(long)]
        username: Option<String>,

        #[arg(long)]
        api_token: Option<String>,

        /// Per-request timeout in seconds
        #[arg(long)]
        timeout_secs: Option<u64>,

        #[command(flatten)]
        hierarchy: HierarchyArgs,
    },
    /// Start the HTTP API
    Serve {
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
}

/// Overrides for the saved hierarchy defaults.
#[derive(Args)]
struct HierarchyArgs {
    /// Jira project key
    #[arg(short, long)]
    project: Option<String>,

    /// deep (Epic > Feature > Story) or flat (Story > Sub-task)
    #[arg(long)]
    shape: Option<Shape>,

    /// Existing Initiative (deep) or Epic (flat) to create under
    #[arg(long)]
    parent: Option<String>,

    /// Name of the root epic (deep shape). Defaults to the folder name.
    #[arg(long)]
    root_label: Option<String>,

    /// Wrap content in a gherkin code block instead of bolding keywords
    #[arg(long)]
    code_block: bool,
}

impl HierarchyArgs {
    fn apply(&self, config: &mut HierarchyConfig) {
        if let Some(project) = &self.project {
            config.project_key = project.clone();
        }
        if let Some(shape) = self.shape {
            config.shape = shape;
        }
        if let Some(parent) = &self.parent {
            config.parent_key = Some(parent.clone());
        }
        if self.code_block {
            config.description_format = DescriptionFormat::CodeBlock;
        }
    }
}

/// Initialize tracing. Logs go to stderr so stdout carries only results.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "gherkin_jira=info,tower_http=info".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn jira_client(config: &AppConfig) -> anyhow::Result<JiraClient> {
    if !config.jira.is_complete() {
        bail!("Jira is not configured; run `gherkin-jira configure` or set JIRA_URL, JIRA_USERNAME and JIRA_API_TOKEN");
    }
    config
        .jira
        .client()
        .context("Failed to build Jira client")
}

/// Parse a file or feature folder and plan it with the effective settings.
fn plan_document(
    path: &Path,
    hierarchy: &HierarchyArgs,
    config: &HierarchyConfig,
) -> anyhow::Result<Vec<PlanNode>> {
    let (document, features) =
        parse_file(path).with_context(|| format!("Failed to load {}", path.display()))?;
    let root_label = hierarchy
        .root_label
        .clone()
        .unwrap_or_else(|| document.default_root_label());
    Ok(plan::plan(&features, config, &root_label))
}

fn load_plan(path: &Path) -> anyhow::Result<Vec<PlanNode>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read plan {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid plan {}", path.display()))
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let mut config = AppConfig::load();

    match cli.command {
        Commands::Preview {
            path,
            select,
            hierarchy,
            json,
        } => {
            hierarchy.apply(&mut config.hierarchy);
            let mut nodes = plan_document(&path, &hierarchy, &config.hierarchy)?;
            let selected: HashSet<String> = select.into_iter().collect();
            service::apply_preview_selection(&mut nodes, &selected);

            if json {
                print_json(&nodes)?;
            } else {
                println!("{}", render_tree(&nodes));
                println!("{} issues", nodes.len());
            }
        }
        Commands::Create {
            path,
            plan: plan_path,
            select,
            hierarchy,
            json,
        } => {
            hierarchy.apply(&mut config.hierarchy);
            let client = jira_client(&config)?;

            let nodes = match (plan_path, path) {
                (Some(plan_path), _) => load_plan(&plan_path)?,
                (None, Some(path)) => plan_document(&path, &hierarchy, &config.hierarchy)?,
                (None, None) => bail!("Either a document path or --plan is required"),
            };

            let cancel = CancellationToken::new();
            let on_signal = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("Interrupted, finishing the current request");
                    on_signal.cancel();
                }
            });

            let selected: HashSet<String> = select.into_iter().collect();
            let options = CreateOptions {
                call_timeout: config.jira.timeout(),
                cancel,
            };
            let report =
                service::create_from_plan(&client, &nodes, &selected, &config.hierarchy, options)
                    .await?;

            if json {
                print_json(&report)?;
            } else {
                for issue in &report.created {
                    println!("{:<10} {:<9} {}", issue.key, issue.role.label(), issue.url);
                }
                for error in &report.errors {
                    println!("! {}", error);
                }
                println!("{}", report);
            }
        }
        Commands::Split { path, out } => {
            let (_, features) =
                parse_file(&path).with_context(|| format!("Failed to load {}", path.display()))?;
            let written = write_feature_files(&features, &out)
                .with_context(|| format!("Failed to write to {}", out.display()))?;
            for file in &written {
                println!("{}", file.display());
            }
        }
        Commands::Check => {
            let client = jira_client(&config)?;
            let user = client.current_user().await?;
            println!(
                "Connected to {} as {}",
                client.base_url(),
                user.display_name
            );
        }
        Commands::Projects => {
            let client = jira_client(&config)?;
            for project in client.list_projects().await? {
                println!("{:<12} {}", project.key, project.name);
            }
        }
        Commands::IssueTypes { project } => {
            let client = jira_client(&config)?;
            let project = project.unwrap_or_else(|| config.hierarchy.project_key.clone());
            let types = if project.is_empty() {
                client.list_issue_types().await?
            } else {
                client.get_project_issue_types(&project).await?
            };
            for issue_type in types {
                let marker = if issue_type.subtask { " (sub-task)" } else { "" };
                println!("{:<8} {}{}", issue_type.id, issue_type.name, marker);
            }
        }
        Commands::Fields { custom } => {
            let client = jira_client(&config)?;
            let fields = client.list_fields().await?;
            let candidates = epic_field_candidates(&fields);

            for field in fields.iter().filter(|f| !custom || f.custom) {
                println!("{:<20} {}", field.id, field.name);
            }
            for field in &candidates.epic_name {
                println!("Epic Name candidate: {} ({})", field.id, field.name);
            }
            for field in &candidates.epic_link {
                println!("Epic Link candidate: {} ({})", field.id, field.name);
            }
        }
        Commands::Parents { project, shape } => {
            let client = jira_client(&config)?;
            let project_key = project.unwrap_or_else(|| config.hierarchy.project_key.clone());
            if project_key.is_empty() {
                bail!("No project given; pass --project or configure a default");
            }
            let shape = shape.unwrap_or(config.hierarchy.shape);

            let issues = service::find_parent_candidates(&client, &project_key, shape).await?;
            if issues.is_empty() {
                println!("No {} issues found in {}", shape.parent_role(), project_key);
            }
            for issue in issues {
                println!("{:<10} [{}] {}", issue.key, issue.issue_type, issue.summary);
            }
        }
        Commands::Configure {
            url,
            username,
            api_token,
            timeout_secs,
            hierarchy,
        } => {
            if let Some(url) = url {
                config.jira.url = url;
            }
            if let Some(username) = username {
                config.jira.username = username;
            }
            if let Some(api_token) = api_token {
                config.jira.api_token = api_token;
            }
            if let Some(secs) = timeout_secs {
                config.jira.timeout_secs = secs;
            }
            hierarchy.apply(&mut config.hierarchy);

            let path = config.save()?;
            println!("Saved configuration to {}", path.display());
        }
        Commands::Serve { port } => {
            let tracker: Option<Arc<dyn TrackerClient>> = if config.jira.is_complete() {
                Some(Arc::new(jira_client(&config)?))
            } else {
                tracing::warn!("Jira is not configured; only preview will be available");
                None
            };

            let state = api::AppState::new(tracker, config.hierarchy.clone())
                .with_call_timeout(config.jira.timeout());
            let app = api::create_router(state);

            let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
            tracing::info!("gherkin-jira API listening on http://127.0.0.1:{}", port);

            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
