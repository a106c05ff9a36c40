//! Identifier commands.

use purrcafe::{MeowId, MeowIdGenerator};

use crate::cli::IdCommand;
use crate::commands::parse_id;
use crate::output::{OutputFormat, print_json, print_table};

pub fn run(command: &IdCommand, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        IdCommand::Generate { count } => generate(*count, format),
        IdCommand::Decode { id } => decode(id, format),
    }
}

/// Run the `id generate` command
fn generate(count: usize, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let generator = MeowIdGenerator::default();
    let ids = generator
        .ids()
        .take(count)
        .collect::<Result<Vec<MeowId>, _>>()?;

    match format {
        OutputFormat::Human => {
            for id in &ids {
                println!("{id}");
            }
        }
        OutputFormat::Json => print_json(&ids)?,
    }
    Ok(())
}

/// Run the `id decode` command
fn decode(input: &str, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let id = parse_id(input)?;

    match format {
        OutputFormat::Human => print_table(
            &["ID", "INTEGER", "TIMESTAMP", "SEQUENCE", "SALT"],
            &[vec![
                id.to_string(),
                id.to_int().to_string(),
                id.datetime().to_rfc3339(),
                id.sequence_count().to_string(),
                id.salt().to_string(),
            ]],
        ),
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({
                "id": id,
                "integer": id.to_int(),
                "timestamp": id.datetime(),
                "sequence_count": id.sequence_count(),
                "salt": id.salt(),
            })
        ),
    }
    Ok(())
}
