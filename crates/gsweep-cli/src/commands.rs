use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Context;
use futures_util::FutureExt;
use gsweep::auth::AccessToken;
use gsweep::bootstrap::Bootstrap;
use gsweep::google::{DriveApi, DriveFile, GmailApi, MailMessage};
use gsweep::ops::{DriveOps, GmailOps};
use gsweep::sanitize::{
    is_trusted_google_url, sanitize_drive_query_text, sanitize_file_name,
    sanitize_gmail_query_text, validate_email_address,
};
use gsweep::{BulkResult, Config, Limiters, Translator, UserFacingError};
use serde::Serialize;
use serde_json::json;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::cli::{AuthCommand, CheckCommand, FilesCommand, MailCommand};
use crate::login;

pub const ENV_ACCESS_TOKEN: &str = "GSWEEP_ACCESS_TOKEN";

pub struct Output {
    pub json: bool,
}

impl Output {
    fn print<T: Serialize>(&self, value: &T, human: impl FnOnce() -> String) -> anyhow::Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            println!("{}", human());
        }
        Ok(())
    }

    fn bulk(&self, result: &BulkResult) -> anyhow::Result<()> {
        self.print(result, || {
            let mut line = format!(
                "{} succeeded, {} failed (of {})",
                result.succeeded, result.failed, result.total
            );
            if result.skipped > 0 {
                line.push_str(&format!(", {} skipped", result.skipped));
            }
            if result.cancelled {
                line.push_str(", cancelled");
            }
            line
        })
    }
}

/// Only the translated sentence reaches the terminal
fn user(err: UserFacingError) -> anyhow::Error {
    anyhow::anyhow!(err.message)
}

fn translator() -> Translator {
    match Config::load() {
        Ok(config) => Translator::new(config.dev_mode),
        Err(e) => {
            debug!(error = %e, "No usable config; development mode off");
            Translator::default()
        }
    }
}

struct Services {
    drive: DriveOps,
    gmail: GmailOps,
}

/// Resolve the token and build both API clients under the startup deadline.
async fn connect(token: Option<String>) -> anyhow::Result<Services> {
    let translator = translator();
    let limiters = Arc::new(Limiters::new());
    let token = token
        .or_else(|| std::env::var(ENV_ACCESS_TOKEN).ok())
        .map(AccessToken::new);

    let services: Arc<OnceCell<Services>> = Arc::new(OnceCell::new());
    let slot = Arc::clone(&services);

    Bootstrap::new()
        .step("credentials", {
            let present = token.as_ref().is_some_and(|t| !t.is_empty());
            move || {
                async move {
                    if present {
                        Ok(())
                    } else {
                        Err(format!("no access token; pass --token or set {}", ENV_ACCESS_TOKEN))
                    }
                }
                .boxed()
            }
        })
        .step("clients", move || {
            async move { build_clients(&slot, token, limiters, translator) }.boxed()
        })
        .run()
        .await?;

    Arc::try_unwrap(services)
        .ok()
        .and_then(OnceCell::into_inner)
        .context("startup finished without API clients")
}

/// Fill `slot` with both governed clients. Failures come back as translated
/// sentences since the startup error is printed as-is.
fn build_clients(
    slot: &OnceCell<Services>,
    token: Option<AccessToken>,
    limiters: Arc<Limiters>,
    translator: Translator,
) -> Result<(), String> {
    let token = token.ok_or("no access token")?;
    let drive =
        DriveApi::new(token.clone()).map_err(|e| translator.to_user_message(&e, "Connect"))?;
    let gmail = GmailApi::new(token).map_err(|e| translator.to_user_message(&e, "Connect"))?;
    slot.set(Services {
        drive: DriveOps::new(Arc::new(drive), Arc::clone(&limiters), translator),
        gmail: GmailOps::new(Arc::new(gmail), limiters, translator),
    })
    .map_err(|_| "clients already initialised".to_string())
}

/// Cancel flag raised by Ctrl-C, checked between bulk items
fn cancel_on_ctrl_c() -> Arc<AtomicBool> {
    let flag = Arc::new(AtomicBool::new(false));
    let raised = Arc::clone(&flag);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted; stopping after the current item");
            raised.store(true, Ordering::SeqCst);
        }
    });
    flag
}

fn file_line(file: &DriveFile) -> String {
    format!("{}  {}  ({})", file.id, file.name, file.mime_type)
}

fn message_line(message: &MailMessage) -> String {
    match &message.thread_id {
        Some(thread) => format!("{}  thread {}", message.id, thread),
        None => message.id.clone(),
    }
}

pub async fn files(cmd: FilesCommand, token: Option<String>, out: &Output) -> anyhow::Result<()> {
    let services = connect(token).await?;
    let drive = &services.drive;

    match cmd {
        FilesCommand::Search { query } => {
            let files = drive.search_files(&query).await.map_err(user)?;
            out.print(&files, || {
                files.iter().map(file_line).collect::<Vec<_>>().join("\n")
            })
        }
        FilesCommand::Share {
            file_id,
            email,
            role,
        } => {
            drive.share_file(&file_id, &email, role).await.map_err(user)?;
            out.print(&json!({ "shared": file_id, "with": email, "role": role }), || {
                format!("Shared {} with {} as {}", file_id, email, role)
            })
        }
        FilesCommand::Delete { ids, permanent } => {
            let result = drive.delete_files(&ids, permanent).await.map_err(user)?;
            out.bulk(&result)
        }
        FilesCommand::Mkdir { name } => {
            let folder = drive.create_folder(&name).await.map_err(user)?;
            out.print(&folder, || format!("Created {}", file_line(&folder)))
        }
        FilesCommand::Organize => {
            let cancel = cancel_on_ctrl_c();
            let result = drive.organize_by_type(Some(&*cancel)).await.map_err(user)?;
            out.bulk(&result)
        }
        FilesCommand::Clean(args) => {
            let cancel = cancel_on_ctrl_c();
            let result = drive
                .delete_older_than(&args.days, Some(&*cancel))
                .await
                .map_err(user)?;
            out.bulk(&result)
        }
    }
}

pub async fn mail(cmd: MailCommand, token: Option<String>, out: &Output) -> anyhow::Result<()> {
    let services = connect(token).await?;
    let gmail = &services.gmail;

    match cmd {
        MailCommand::Search { query } => {
            let messages = gmail.search_messages(&query).await.map_err(user)?;
            out.print(&messages, || {
                messages.iter().map(message_line).collect::<Vec<_>>().join("\n")
            })
        }
        MailCommand::Label { label, ids } => {
            let result = gmail.label_messages(&ids, &label).await.map_err(user)?;
            out.bulk(&result)
        }
        MailCommand::Trash { ids } => {
            let result = gmail.trash_messages(&ids).await.map_err(user)?;
            out.bulk(&result)
        }
        MailCommand::PurgeSpam => {
            let cancel = cancel_on_ctrl_c();
            let result = gmail.purge_spam(Some(&*cancel)).await.map_err(user)?;
            out.bulk(&result)
        }
    }
}

pub async fn auth(cmd: AuthCommand, out: &Output) -> anyhow::Result<()> {
    let config = Config::load()?;
    match cmd {
        AuthCommand::Url => {
            login::print_url(&config);
            Ok(())
        }
        AuthCommand::Login => {
            let tokens = login::login(&config, Translator::new(config.dev_mode)).await?;
            out.print(&tokens, || {
                format!("export {}={}", ENV_ACCESS_TOKEN, tokens.access_token.expose())
            })
        }
    }
}

pub fn check(cmd: CheckCommand, out: &Output) -> anyhow::Result<()> {
    match cmd {
        CheckCommand::Email { address } => {
            let result = validate_email_address(&address);
            out.print(&result, || match result.suggestion() {
                Some(domain) => format!("invalid (did you mean {}?)", domain),
                None if result.is_valid() => "valid".to_string(),
                None => "invalid".to_string(),
            })
        }
        CheckCommand::Url { url } => {
            let trusted = is_trusted_google_url(&url);
            out.print(&json!({ "url": url, "trusted": trusted }), || {
                (if trusted { "trusted" } else { "untrusted" }).to_string()
            })
        }
        CheckCommand::Filename { name } => {
            let sanitized = sanitize_file_name(&name);
            out.print(&json!({ "input": name, "sanitized": sanitized }), || sanitized.clone())
        }
        CheckCommand::Query { text, gmail } => {
            let sanitized = if gmail {
                sanitize_gmail_query_text(&text)
            } else {
                sanitize_drive_query_text(&text)
            };
            out.print(&json!({ "input": text, "sanitized": sanitized }), || sanitized.clone())
        }
    }
}
