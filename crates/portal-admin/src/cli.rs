//! Command line definition and dispatch

use crate::app::Portal;
use crate::commands::{self, SearchScope};
use crate::config::PortalConfig;
use crate::logging;
use anyhow::{bail, Context};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use portal_model::{
    DiscoveryStatus, DiscoveryUpdate, InvoiceStatus, InvoiceUpdate, MilestoneKind, MilestoneUpdate,
    ProjectId, ProposalStatus, ProposalUpdate, TaskId, TaskStatus, UserRole,
};
use portal_notify::SendRequest;
use std::path::PathBuf;
use std::str::FromStr;

fn project_arg(name: &'static str) -> Arg {
    Arg::new(name).required(true).help("Project id")
}

/// Build the `portal-admin` command
#[must_use]
pub fn command() -> Command {
    Command::new("portal-admin")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Studio client portal administration")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("store")
                .long("store")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Store document, overrides store.path"),
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Log emails instead of sending them"),
        )
        .arg(
            Arg::new("json-logs")
                .long("json-logs")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .subcommand(
            Command::new("preview")
                .about("Parse an outline and print the project tree")
                .arg(Arg::new("file").required(true).value_parser(value_parser!(PathBuf))),
        )
        .subcommand(
            Command::new("import")
                .about("Import an outline as a new project or into an existing one")
                .arg(Arg::new("file").required(true).value_parser(value_parser!(PathBuf)))
                .arg(Arg::new("into").long("into").help("Existing project id"))
                .arg(
                    Arg::new("plan")
                        .long("plan")
                        .action(ArgAction::SetTrue)
                        .help("Only print what would be created"),
                ),
        )
        .subcommand(Command::new("projects").about("List projects"))
        .subcommand(
            Command::new("changes")
                .about("Show what the next status update would report")
                .arg(project_arg("project")),
        )
        .subcommand(
            Command::new("send")
                .about("Send a status update")
                .arg(project_arg("project"))
                .arg(Arg::new("to").long("to").required(true).help("Recipient address"))
                .arg(Arg::new("name").long("name").help("Recipient name for the greeting"))
                .arg(Arg::new("subject").long("subject").help("Subject line"))
                .arg(
                    Arg::new("message")
                        .long("message")
                        .short('m')
                        .help("Personal message (markdown)"),
                ),
        )
        .subcommand(
            Command::new("history")
                .about("List sent status updates")
                .arg(project_arg("project")),
        )
        .subcommand(
            Command::new("set-status")
                .about("Move a task to another status")
                .arg(Arg::new("task").required(true).help("Task id"))
                .arg(
                    Arg::new("status")
                        .required(true)
                        .help("not_started, in_progress, waiting, review or done"),
                ),
        )
        .subcommand(
            Command::new("milestone")
                .about("Update a discovery, proposal or invoice milestone")
                .arg(project_arg("project"))
                .arg(Arg::new("kind").required(true).help("discovery, proposal or invoice"))
                .arg(Arg::new("status").long("status"))
                .arg(Arg::new("call-at").long("call-at").help("Discovery call time (RFC 3339)"))
                .arg(Arg::new("notes").long("notes"))
                .arg(Arg::new("document-url").long("document-url"))
                .arg(
                    Arg::new("amount-cents")
                        .long("amount-cents")
                        .value_parser(value_parser!(u64)),
                )
                .arg(Arg::new("due-on").long("due-on").help("Invoice due date (YYYY-MM-DD)"))
                .arg(Arg::new("invoice-url").long("invoice-url")),
        )
        .subcommand(
            Command::new("user-add")
                .about("Create a portal user and send the welcome email")
                .arg(Arg::new("email").required(true))
                .arg(Arg::new("name").required(true))
                .arg(
                    Arg::new("admin")
                        .long("admin")
                        .action(ArgAction::SetTrue)
                        .help("Create a studio admin instead of a client"),
                )
                .arg(
                    Arg::new("project")
                        .long("project")
                        .help("Make the user this project's client"),
                ),
        )
        .subcommand(
            Command::new("search")
                .about("Search projects, tasks or users")
                .arg(Arg::new("query").required(true))
                .arg(
                    Arg::new("in")
                        .long("in")
                        .default_value("projects")
                        .help("projects, tasks or users"),
                ),
        )
}

fn parse_arg<T>(args: &ArgMatches, name: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    args.get_one::<String>(name)
        .map(|raw| raw.parse::<T>().with_context(|| format!("invalid --{name} '{raw}'")))
        .transpose()
}

fn required<T>(args: &ArgMatches, name: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    parse_arg(args, name)?.with_context(|| format!("missing <{name}>"))
}

fn string_arg(args: &ArgMatches, name: &str) -> Option<String> {
    args.get_one::<String>(name).cloned()
}

const MILESTONE_FIELDS: &[&str] = &[
    "call-at",
    "notes",
    "document-url",
    "amount-cents",
    "due-on",
    "invoice-url",
];

/// Build a milestone update from `milestone` arguments
///
/// # Errors
/// Unknown kind or status, a field that the kind does not have, or a badly
/// formatted date.
pub fn milestone_update(args: &ArgMatches) -> anyhow::Result<MilestoneUpdate> {
    let kind: MilestoneKind = required(args, "kind")?;
    let allowed: &[&str] = match kind {
        MilestoneKind::Discovery => &["call-at", "notes"],
        MilestoneKind::Proposal => &["document-url"],
        MilestoneKind::Invoice => &["amount-cents", "due-on", "invoice-url"],
    };
    for field in MILESTONE_FIELDS {
        if args.contains_id(field) && !allowed.contains(field) {
            bail!("--{field} does not apply to {} milestones", kind.as_str());
        }
    }

    Ok(match kind {
        MilestoneKind::Discovery => MilestoneUpdate::Discovery(DiscoveryUpdate {
            status: parse_arg::<DiscoveryStatus>(args, "status")?,
            call_at: args
                .get_one::<String>("call-at")
                .map(|raw| {
                    DateTime::parse_from_rfc3339(raw)
                        .map(|at| at.with_timezone(&Utc))
                        .with_context(|| format!("invalid --call-at '{raw}'"))
                })
                .transpose()?,
            notes: string_arg(args, "notes"),
        }),
        MilestoneKind::Proposal => MilestoneUpdate::Proposal(ProposalUpdate {
            status: parse_arg::<ProposalStatus>(args, "status")?,
            document_url: string_arg(args, "document-url"),
        }),
        MilestoneKind::Invoice => MilestoneUpdate::Invoice(InvoiceUpdate {
            status: parse_arg::<InvoiceStatus>(args, "status")?,
            amount_cents: args.get_one::<u64>("amount-cents").copied(),
            due_on: args
                .get_one::<String>("due-on")
                .map(|raw| {
                    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                        .with_context(|| format!("invalid --due-on '{raw}'"))
                })
                .transpose()?,
            invoice_url: string_arg(args, "invoice-url"),
        }),
    })
}

/// Configuration from the global flags
///
/// # Errors
/// See [`PortalConfig::load`].
pub fn config_from(matches: &ArgMatches) -> anyhow::Result<PortalConfig> {
    let path = matches.get_one::<PathBuf>("config").map(PathBuf::as_path);
    let mut config = PortalConfig::load(path)?;
    if let Some(path) = matches.get_one::<PathBuf>("store") {
        config = config.with_store_path(path);
    }
    if matches.get_flag("dry-run") {
        config = config.with_dry_run(true);
    }
    if matches.get_flag("json-logs") {
        config = config.with_json_logs(true);
    }
    Ok(config)
}

async fn read_outline(args: &ArgMatches) -> anyhow::Result<String> {
    let path = args.get_one::<PathBuf>("file").context("missing <file>")?;
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))
}

/// Run one parsed subcommand against `portal`, returning its output
///
/// # Errors
/// Whatever the command reports.
pub async fn dispatch(portal: &Portal, matches: &ArgMatches) -> anyhow::Result<String> {
    let now = Utc::now();
    match matches.subcommand() {
        Some(("preview", args)) => {
            let content = read_outline(args).await?;
            let parsed = portal.parser().parse(&content)?;
            Ok(commands::preview(&parsed))
        }
        Some(("import", args)) => {
            let content = read_outline(args).await?;
            let into = parse_arg::<ProjectId>(args, "into")?;
            commands::import(portal, &content, into, args.get_flag("plan"), now).await
        }
        Some(("projects", _)) => commands::projects(portal).await,
        Some(("changes", args)) => commands::changes(portal, required(args, "project")?).await,
        Some(("send", args)) => {
            let mut request = SendRequest::new(string_arg(args, "to").unwrap_or_default());
            request.recipient_name = string_arg(args, "name");
            request.subject = string_arg(args, "subject");
            request.personal_message = string_arg(args, "message");
            commands::send(portal, required(args, "project")?, &request, now).await
        }
        Some(("history", args)) => commands::history(portal, required(args, "project")?).await,
        Some(("set-status", args)) => {
            let task: TaskId = required(args, "task")?;
            let status: TaskStatus = required(args, "status")?;
            commands::set_status(portal, task, status, now).await
        }
        Some(("milestone", args)) => {
            let update = milestone_update(args)?;
            commands::milestone(portal, required(args, "project")?, update, now).await
        }
        Some(("user-add", args)) => {
            let role = if args.get_flag("admin") {
                UserRole::Admin
            } else {
                UserRole::Client
            };
            let email = string_arg(args, "email").unwrap_or_default();
            let name = string_arg(args, "name").unwrap_or_default();
            let project = parse_arg::<ProjectId>(args, "project")?;
            commands::add_user(portal, &email, &name, role, project, now).await
        }
        Some(("search", args)) => {
            let query = string_arg(args, "query").unwrap_or_default();
            let scope: SearchScope = args
                .get_one::<String>("in")
                .map_or(Ok(SearchScope::Projects), |raw| raw.parse())?;
            commands::search(portal, &query, scope).await
        }
        Some((other, _)) => bail!("unknown command '{other}'"),
        None => bail!("no command given"),
    }
}

/// Entry point used by the binary
///
/// # Errors
/// Configuration, logging setup or command failures.
pub async fn run(matches: ArgMatches) -> anyhow::Result<()> {
    let config = config_from(&matches)?;
    logging::init(&config.log)?;
    tracing::debug!(
        store = %config.store.path.display(),
        dry_run = config.mail.dry_run,
        "starting"
    );

    let portal = Portal::open(&config).await?;
    let output = dispatch(&portal, &matches).await?;
    print!("{output}");
    Ok(())
}
