//! Session commands and token resolution.

use std::time::Duration;

use purrcafe::{Session, Store, User, hash::password_hash};

use crate::cli::SessionCommand;
use crate::commands::{format_time, parse_id};
use crate::output::{OutputFormat, print_json, print_table};

/// Resolve a session token to its session, rejecting expired ones.
pub fn resolve(store: &Store, token: &str) -> Result<Session, Box<dyn std::error::Error>> {
    let mut session = Session::get(store, parse_id(token)?)?;
    if session.is_expired()? {
        return Err(format!("session {} has expired", session.id()).into());
    }
    Ok(session)
}

/// Resolve a session token to the user it belongs to.
pub fn authenticate(store: &Store, token: &str) -> Result<User, Box<dyn std::error::Error>> {
    Ok(resolve(store, token)?.owner()?)
}

pub fn run(
    store: &Store,
    command: &SessionCommand,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        SessionCommand::Login {
            name,
            password,
            lifetime_secs,
        } => {
            let mut user = User::find(store, name)?;
            let mut session =
                user.authorize(&password_hash(password), lifetime_secs.map(Duration::from_secs))?;
            match format {
                OutputFormat::Human => println!("{}", session.id()),
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::json!({
                        "token": session.id(),
                        "expiration_time": session.expiration_time()?,
                    })
                ),
            }
        }
        SessionCommand::List { token } => {
            let owner = authenticate(store, token)?;
            print_sessions(&mut owner.sessions()?, format)?;
        }
        SessionCommand::Logout { token } => {
            let session = resolve(store, token)?;
            session.delete()?;
            if format == OutputFormat::Json {
                println!("{}", serde_json::json!({ "logged_out": true }));
            }
        }
    }
    Ok(())
}

fn print_sessions(
    sessions: &mut [Session],
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Human => {
            let mut rows = Vec::with_capacity(sessions.len());
            for session in sessions.iter_mut() {
                rows.push(vec![
                    session.id().to_string(),
                    session.creation_time()?.to_rfc3339(),
                    format_time(session.expiration_time()?),
                ]);
            }
            print_table(&["TOKEN", "CREATED", "EXPIRES"], &rows);
        }
        OutputFormat::Json => {
            let mut entries = Vec::with_capacity(sessions.len());
            for session in sessions.iter_mut() {
                entries.push(serde_json::json!({
                    "token": session.id(),
                    "creation_time": session.creation_time()?,
                    "expiration_time": session.expiration_time()?,
                }));
            }
            print_json(&entries)?;
        }
    }
    Ok(())
}
