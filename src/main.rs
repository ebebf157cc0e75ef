use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use equipment_loans::api::RestApi;
use equipment_loans::config::Config;
use equipment_loans::intake::{
    IntakeServices, LoanIntakeSession, RequestorEvent, ScanEvent, TracingNotifier,
};
use equipment_loans::models::LoanDuration;
use equipment_loans::AppError;

const HELP: &str = "commands: scan <code> | id <national-id> | qty <code> <n> | cond <code> <id|none> \
| obs <code> <text> | rm <code> | reason <text> | event <text> | location <text> | notes <text> \
| offsite on|off | extended on|off | return <RFC3339> | list | submit | reset | quit";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "equipment_loans=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Using inventory API at {}", config.api_base_url);

    let api = RestApi::from_config(&config)?;
    let services = IntakeServices::rest(api, Arc::new(TracingNotifier));
    let mut session = LoanIntakeSession::new(services, &config.intake_settings());

    if let Ok(conditions) = session.load_conditions().await {
        for condition in conditions {
            println!("condition {}: {}", condition.id, condition.name);
        }
    }
    println!("{}", HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();

        match command {
            "quit" | "exit" => break,
            "help" => println!("{}", HELP),
            "scan" => {
                for event in session.set_scan_buffer(rest) {
                    print_scan_event(event);
                }
                match session.next_scan_event().await {
                    Some(event) => print_scan_event(event),
                    None => println!("code too short"),
                }
            }
            "id" => match session.enter_national_id(rest) {
                Ok(true) => match session.next_requestor_event().await {
                    Some(RequestorEvent::Validated(info)) => {
                        println!("requestor: {} <{}>", info.full_name(), info.email.unwrap_or_default())
                    }
                    Some(RequestorEvent::NotFound(id)) => println!("no person with ID {}", id),
                    Some(RequestorEvent::Failed(reason)) => println!("validation failed: {}", reason),
                    None => {}
                },
                Ok(false) => println!("ID incomplete: {}", session.national_id()),
                Err(e) => println!("{}", e),
            },
            "qty" => match parse_code_arg(rest) {
                Some((code, value)) => match value.parse::<i64>() {
                    Ok(n) => match session.set_quantity(code, n) {
                        Some(stored) => println!("{} quantity {}", code, stored),
                        None => println!("{} not in the list", code),
                    },
                    Err(_) => println!("quantity must be a number"),
                },
                None => println!("usage: qty <code> <n>"),
            },
            "cond" => match parse_code_arg(rest) {
                Some((code, value)) => {
                    let id = if value == "none" { Ok(None) } else { value.parse::<i64>().map(Some) };
                    match id {
                        Ok(id) => match session.set_condition(code, id) {
                            Ok(true) => println!("{} condition set", code),
                            Ok(false) => println!("{} not in the list", code),
                            Err(e) => println!("{}", e),
                        },
                        Err(_) => println!("condition must be an id or 'none'"),
                    }
                }
                None => println!("usage: cond <code> <id|none>"),
            },
            "obs" => match parse_code_arg(rest) {
                Some((code, text)) => match session.set_observations(code, text) {
                    Some(stored) => println!("{} observations: {}", code, stored),
                    None => println!("{} not in the list", code),
                },
                None => println!("usage: obs <code> <text>"),
            },
            "rm" => match session.remove_item(rest) {
                Some(item) => println!("removed {}", item.code),
                None => println!("{} not in the list", rest),
            },
            "reason" => session.form_mut().reason = rest.to_string(),
            "event" => session.form_mut().associated_event = rest.to_string(),
            "location" => session.form_mut().external_location = rest.to_string(),
            "notes" => session.form_mut().notes = rest.to_string(),
            "offsite" => session.form_mut().off_site = rest == "on",
            "extended" => {
                session.form_mut().duration = if rest == "on" {
                    LoanDuration::Extended
                } else {
                    LoanDuration::Standard
                }
            }
            "return" => match DateTime::parse_from_rfc3339(rest) {
                Ok(date) => session.form_mut().scheduled_return = Some(date.with_timezone(&Utc)),
                Err(e) => println!("invalid date: {}", e),
            },
            "list" => print_draft(&session),
            "submit" => match session.submit().await {
                Ok(created) => println!("loan {} created", created.id),
                Err(AppError::Validation(errors)) => {
                    for error in errors.iter() {
                        println!("  {}: {}", error.field, error.message);
                    }
                }
                Err(e) if e.is_local() => println!("{}", e),
                Err(e) => println!("submission failed, draft kept: {}", e),
            },
            "reset" => {
                session.reset();
                println!("form cleared");
            }
            _ => println!("unknown command, try 'help'"),
        }
    }

    session.close();
    tracing::info!("Session closed");
    Ok(())
}

fn print_scan_event(event: ScanEvent) {
    match event {
        ScanEvent::Added(item) => {
            println!("added {} ({}), stock {}", item.code, item.name, item.stock)
        }
        ScanEvent::Duplicate(code) => println!("{} already in the list", code),
        ScanEvent::NotFound(code) => println!("{} not found", code),
        ScanEvent::Failed { code, reason } => println!("lookup of {} failed: {}", code, reason),
    }
}

fn parse_code_arg(rest: &str) -> Option<(&str, &str)> {
    let (code, value) = rest.split_once(' ')?;
    Some((code.trim(), value.trim()))
}

fn print_draft(session: &LoanIntakeSession) {
    match session.requestor() {
        Some(info) => println!("requestor: {} ({})", info.full_name(), info.national_id),
        None => println!("requestor: not validated"),
    }
    let form = session.form();
    println!(
        "reason: {} | duration: {:?} | off-site: {}",
        form.reason, form.duration, form.off_site
    );
    for item in session.items().iter() {
        println!(
            "  {} {} x{} (stock {}) condition={:?} {}",
            item.code,
            item.name,
            item.quantity,
            item.stock,
            item.exit_condition_id,
            item.exit_observations
        );
    }
}
