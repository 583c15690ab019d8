//! services/client/src/bin/astrometric.rs

use astrometric_core::domain::Role;
use client_lib::{
    adapters::{ConsoleNavigator, FileSessionStorage, ReqwestTransport},
    api::{
        self,
        analyses::{self, AnalysisMode, AnalysisQuery, NewAnalysis},
        auth::{self, SignupRequest},
        datasets::{self, DatasetQuery, UploadValidation, ValidationIssue},
        graphs, labels,
        leaderboard::{self, LeaderboardQuery},
        models::{self, TrainRequest},
    },
    authorize, command_access,
    config::Config,
    error::{ClientError, ClientResult},
    ApiClient, ClientOptions, GuardDecision, NotificationCenter, NotificationEvent, SessionStore,
};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast::Receiver;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const USAGE: &str = "\
usage: astrometric <command> [args]

  login <email> <password>          sign in and remember the session
  signup <email> <password> [name] [user|researcher]
  logout                            forget the stored session
  whoami                            show the signed-in account
  health                            check the API is reachable
  datasets [page]                   list your datasets and public ones
  upload <file> [--public]          upload a CSV, JSON or JSONL file
  delete-dataset <id>
  error-report <url|name> [out]     fetch the report of a rejected CSV upload
  analyses [page]                   list analysis jobs
  analyze <dataset-id> <eda|predict|train>
  analysis <id>                     show one analysis and its charts
  models [page]
  train <name> <dataset-id>         researchers only
  labels [dataset-id]
  leaderboard [metric]
  template                          print the graph template";

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    debug!(api = %config.api_base_url, "Configuration loaded");

    // --- 2. Restore the Session ---
    let storage = Arc::new(FileSessionStorage::new(&config.session_dir));
    let session = SessionStore::new(storage);
    session.load();

    // --- 3. Wire the Client ---
    let notifications = NotificationCenter::new();
    let events = notifications.subscribe();
    let navigator = Arc::new(ConsoleNavigator::new());
    let transport = Arc::new(ReqwestTransport::new(config.api_base_url.clone())?);
    let client = ApiClient::new(
        transport,
        session,
        notifications,
        navigator.clone(),
        ClientOptions {
            coalesce_refresh: config.coalesce_refresh,
        },
    );

    // --- 4. Run the Command ---
    let args: Vec<String> = std::env::args().skip(1).collect();
    let result = run(&client, &args).await;

    print_notifications(events);
    if navigator.take_redirect() {
        eprintln!("Your session has ended. Run `astrometric login` to continue.");
    }
    result
}

fn print_notifications(mut events: Receiver<NotificationEvent>) {
    while let Ok(event) = events.try_recv() {
        if let NotificationEvent::Added(notification) = event {
            eprintln!("[{}] {}", notification.kind, notification.message);
        }
    }
}

fn print_issue(label: &str, issue: &ValidationIssue) {
    if issue.line > 0 {
        println!("  {label} line {}: {}", issue.line, issue.error);
    } else {
        println!("  {label}: {}", issue.error);
    }
}

fn print_validation(validation: &UploadValidation) {
    if let (Some(rows), Some(cols)) = (validation.summary.total_rows, validation.summary.total_columns) {
        println!("validated {rows} rows x {cols} columns");
    }
    for issue in &validation.errors {
        print_issue("error", issue);
    }
    for issue in &validation.warnings {
        print_issue("warning", issue);
    }
}

fn arg<'a>(args: &'a [String], index: usize, name: &str) -> ClientResult<&'a str> {
    args.get(index)
        .map(String::as_str)
        .ok_or_else(|| ClientError::InvalidInput(format!("missing <{name}>\n\n{USAGE}")))
}

fn id_arg(args: &[String], index: usize, name: &str) -> ClientResult<i64> {
    let raw = arg(args, index, name)?;
    raw.parse()
        .map_err(|_| ClientError::InvalidInput(format!("<{name}> must be a number, got '{raw}'")))
}

fn page_arg(args: &[String], index: usize) -> ClientResult<u32> {
    match args.get(index) {
        None => Ok(1),
        Some(raw) => raw
            .parse()
            .map_err(|_| ClientError::InvalidInput(format!("page must be a number, got '{raw}'"))),
    }
}

async fn run(client: &ApiClient, args: &[String]) -> ClientResult<()> {
    let Some(command) = args.first().map(String::as_str) else {
        println!("{USAGE}");
        return Ok(());
    };

    match authorize(client.session(), command_access(command)) {
        GuardDecision::Allow => {}
        GuardDecision::RedirectToLogin => {
            return Err(ClientError::InvalidInput(format!(
                "'{command}' requires a session; run `astrometric login` first"
            )))
        }
        GuardDecision::RedirectToHome => {
            let reason = if client.session().is_authenticated() && command != "login" && command != "signup" {
                format!("'{command}' is not available to the '{}' role", client.session().role())
            } else {
                format!("already signed in; run `astrometric logout` before '{command}'")
            };
            return Err(ClientError::InvalidInput(reason));
        }
    }

    match command {
        "help" => println!("{USAGE}"),

        "login" => {
            let user = auth::login(client, arg(args, 1, "email")?, arg(args, 2, "password")?).await?;
            println!("Signed in as {} ({})", user.email, user.role);
        }

        "signup" => {
            let mut request = SignupRequest::new(arg(args, 1, "email")?, arg(args, 2, "password")?);
            if let Some(name) = args.get(3) {
                request = request.with_name(name.as_str());
            }
            if let Some(role) = args.get(4) {
                request = request.with_role(Role::parse(role));
            }
            let user = auth::signup(client, &request).await?;
            if client.session().is_authenticated() {
                println!("Account created; signed in as {}", user.email);
            } else {
                println!("Account created for {}; run `astrometric login`", user.email);
            }
        }

        "logout" => {
            auth::logout(client);
            println!("Signed out");
        }

        "whoami" => {
            let user = auth::me(client).await?;
            let name = user.name.as_deref().unwrap_or("-");
            println!("{} <{}> id={} role={}", name, user.email, user.id, user.role);
        }

        "health" => {
            let health = api::health(client).await?;
            println!(
                "{} (version {})",
                health.status,
                health.version.as_deref().unwrap_or("unknown")
            );
        }

        "datasets" => {
            let query = DatasetQuery {
                page: page_arg(args, 1)?,
                ..DatasetQuery::default()
            };
            let page = datasets::list(client, query).await?;
            for d in &page.items {
                println!(
                    "{:>5}  {:<32} rows={:<8} public={}",
                    d.id,
                    d.filename,
                    d.rows.map(|r| r.to_string()).unwrap_or_else(|| "?".to_string()),
                    d.is_public
                );
            }
            println!(
                "page {}/{} ({} total)",
                page.pagination.page, page.pagination.pages, page.pagination.total
            );
        }

        "upload" => {
            let path = Path::new(arg(args, 1, "file")?);
            let file_name = path
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| ClientError::InvalidInput(format!("'{}' is not a file", path.display())))?;
            let is_public = args.iter().skip(2).any(|a| a == "--public");
            let content = tokio::fs::read(path).await?;
            let outcome = match datasets::upload(client, file_name, content.into(), is_public).await {
                Ok(outcome) => outcome,
                Err(ClientError::ValidationFailed {
                    message,
                    validation,
                    report_url,
                }) => {
                    print_validation(&validation);
                    if let Some(url) = &report_url {
                        println!("full report: {url}");
                        println!("download it with `astrometric error-report {url}`");
                    }
                    return Err(ClientError::ValidationFailed {
                        message,
                        validation,
                        report_url,
                    });
                }
                Err(e) => return Err(e),
            };
            let dataset = outcome.dataset;
            client.notifications().success(format!("Uploaded {}", dataset.filename));
            info!(dataset_id = dataset.id, "Dataset uploaded");
            if let Some(validation) = &outcome.validation {
                print_validation(validation);
            }
            println!("{}", dataset.id);
        }

        "error-report" => {
            let report = datasets::error_report(client, arg(args, 1, "report")?).await?;
            match args.get(2) {
                Some(out) => {
                    tokio::fs::write(out, &report).await?;
                    println!("saved {} bytes to {out}", report.len());
                }
                None => print!("{}", String::from_utf8_lossy(&report)),
            }
        }

        "delete-dataset" => {
            let ack = datasets::delete(client, id_arg(args, 1, "id")?).await?;
            println!("{}", ack.message);
        }

        "analyses" => {
            let query = AnalysisQuery {
                page: page_arg(args, 1)?,
                ..AnalysisQuery::default()
            };
            let page = analyses::list(client, query).await?;
            for a in &page.items {
                println!("{:>5}  dataset={:<5} {:<8} {}", a.id, a.dataset_id, a.mode, a.status);
            }
        }

        "analyze" => {
            let dataset_id = id_arg(args, 1, "dataset-id")?;
            let raw_mode = arg(args, 2, "mode")?;
            let mode = AnalysisMode::parse(raw_mode).ok_or_else(|| {
                ClientError::InvalidInput(format!("unknown mode '{raw_mode}'; use eda, predict or train"))
            })?;
            let analysis = analyses::create(
                client,
                &NewAnalysis {
                    dataset_id,
                    mode,
                    params: serde_json::json!({}),
                },
            )
            .await?;
            println!("analysis {} is {}", analysis.id, analysis.status);
        }

        "analysis" => {
            let id = id_arg(args, 1, "id")?;
            let analysis = analyses::get(client, id).await?;
            println!("analysis {} ({}) is {}", analysis.id, analysis.mode, analysis.status);
            if let Some(message) = &analysis.error_message {
                println!("error: {message}");
            }
            if let Some(metrics) = &analysis.metrics {
                println!("metrics: {metrics}");
            }
            if analysis.status.is_finished() {
                let viz = analyses::visualization(client, id).await?;
                for chart in viz.charts {
                    println!("chart [{}] {}", chart.kind, chart.title);
                }
            }
        }

        "models" => {
            let page = models::list(client, page_arg(args, 1)?, 10).await?;
            for m in &page.items {
                println!(
                    "{:>5}  {:<24} {}",
                    m.id,
                    m.name,
                    m.version.as_deref().unwrap_or("")
                );
            }
        }

        "train" => {
            let request = TrainRequest {
                name: arg(args, 1, "name")?.to_string(),
                dataset_id: id_arg(args, 2, "dataset-id")?,
                version: None,
                description: None,
            };
            let model = models::train(client, &request).await?;
            println!("model {} ({}) queued", model.id, model.name);
        }

        "labels" => {
            let dataset_id = match args.get(1) {
                Some(_) => Some(id_arg(args, 1, "dataset-id")?),
                None => None,
            };
            for label in labels::list(client, dataset_id).await? {
                println!("dataset={} row={} {}", label.dataset_id, label.row_id, label.label);
            }
        }

        "leaderboard" => {
            let mut query = LeaderboardQuery::default();
            if let Some(metric) = args.get(1) {
                query.metric = metric.clone();
            }
            for entry in leaderboard::entries(client, &query).await? {
                let who = entry
                    .user
                    .as_ref()
                    .and_then(|u| u.name.clone())
                    .unwrap_or_else(|| "anonymous".to_string());
                println!("#{:<3} {:<24} {}={:.4}", entry.rank, who, entry.metric, entry.value);
            }
        }

        "template" => {
            let template = graphs::template(client).await?;
            println!("{}", serde_json::to_string_pretty(&template)?);
        }

        other => {
            return Err(ClientError::InvalidInput(format!(
                "unknown command '{other}'\n\n{USAGE}"
            )))
        }
    }
    Ok(())
}
