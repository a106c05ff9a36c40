//! User management commands.

use purrcafe::{Identity, MeowId, Store, User, hash::password_hash};

use crate::cli::UserCommand;
use crate::output::{OutputFormat, print_json, print_table};

pub fn run(
    store: &Store,
    command: &UserCommand,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        UserCommand::Create {
            name,
            email,
            password,
        } => {
            let user = User::create(store, name, email, &password_hash(password))?;
            print_id(user.id(), format)
        }
        UserCommand::List => {
            let mut users = User::get_all(store)?;
            print_users(&mut users, format)
        }
        UserCommand::Show { name } => {
            let mut users = vec![User::find(store, name)?];
            print_users(&mut users, format)
        }
        UserCommand::Passwd { name, password } => {
            let mut user = User::find(store, name)?;
            user.set_password_hash(&password_hash(password))?;
            print_id(user.id(), format)
        }
        UserCommand::Delete { name } => {
            let user = User::find(store, name)?;
            let id = user.id();
            user.delete()?;
            print_id(id, format)
        }
    }
}

fn print_id(id: MeowId, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Human => println!("{id}"),
        OutputFormat::Json => println!("{}", serde_json::json!({ "id": id })),
    }
    Ok(())
}

fn print_users(users: &mut [User], format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Human => {
            if users.is_empty() {
                println!("No users found.");
                return Ok(());
            }

            let mut rows = Vec::with_capacity(users.len());
            for user in users.iter_mut() {
                rows.push(vec![
                    user.id().to_string(),
                    user.name()?.to_string(),
                    user.email()?.to_string(),
                    user.creation_time()?.to_rfc3339(),
                    role(user.identity()).to_string(),
                ]);
            }
            print_table(&["ID", "NAME", "EMAIL", "CREATED", "ROLE"], &rows);
        }
        OutputFormat::Json => {
            let mut entries = Vec::with_capacity(users.len());
            for user in users.iter_mut() {
                entries.push(serde_json::json!({
                    "id": user.id(),
                    "name": user.name()?,
                    "email": user.email()?,
                    "creation_time": user.creation_time()?,
                }));
            }
            print_json(&entries)?;
        }
    }
    Ok(())
}

fn role(identity: Identity) -> &'static str {
    match identity {
        Identity::Guest => "guest",
        Identity::Admin => "admin",
        Identity::Regular(_) => "user",
    }
}
