//! File commands.

use std::time::Duration;

use purrcafe::{File, FileMetadata, FileUpload, Lifetime, Store};

use crate::cli::{FileCommand, UploadArgs};
use crate::commands::session::authenticate;
use crate::commands::{format_time, parse_id};
use crate::output::{OutputFormat, print_json, print_table};

pub fn run(
    store: &Store,
    command: &FileCommand,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        FileCommand::Upload(args) => upload(store, args, format),
        FileCommand::Download { id, out } => {
            let mut file = File::get(store, parse_id(id)?)?;
            let content = file.read()?;
            std::fs::write(out, &content.data)?;
            match format {
                OutputFormat::Human => {
                    println!("Wrote {} bytes to {}", content.data.len(), out.display());
                    if let Some(remaining) = content.remaining_downloads {
                        println!("{remaining} download(s) left");
                    }
                }
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::json!({
                        "bytes": content.data.len(),
                        "data_hash": content.data_hash,
                        "mime_type": content.mime_type,
                        "filename": content.filename,
                        "remaining_downloads": content.remaining_downloads,
                    })
                ),
            }
            Ok(())
        }
        FileCommand::Meta { id } => {
            let meta = File::get(store, parse_id(id)?)?.meta()?;
            print_metadata(&[meta], format)
        }
        FileCommand::Delete { token, id } => {
            let actor = authenticate(store, token)?;
            File::get(store, parse_id(id)?)?.delete_by(&actor)?;
            Ok(())
        }
        FileCommand::List => list(store, format),
    }
}

/// Run the `file list` command
///
/// Reports the stored counters without counting as a metadata request.
fn list(store: &Store, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let mut files = File::get_all(store)?;
    match format {
        OutputFormat::Human => {
            if files.is_empty() {
                println!("No files found.");
                return Ok(());
            }

            let mut rows = Vec::with_capacity(files.len());
            for file in files.iter_mut() {
                rows.push(vec![
                    file.id().to_string(),
                    file.uploader_id()?.to_string(),
                    file.filename()?.unwrap_or_default().to_string(),
                    file.mime_type()?.to_string(),
                    format_time(file.expiration_time()?),
                    downloads(file.access_count()?, file.max_access_count()?),
                ]);
            }
            print_table(
                &["ID", "UPLOADER", "FILENAME", "MIME", "EXPIRES", "DOWNLOADS"],
                &rows,
            );
        }
        OutputFormat::Json => {
            let mut entries = Vec::with_capacity(files.len());
            for file in files.iter_mut() {
                entries.push(serde_json::json!({
                    "id": file.id(),
                    "uploader_id": file.uploader_id()?,
                    "uploader_hidden": file.uploader_hidden()?,
                    "filename": file.filename()?,
                    "mime_type": file.mime_type()?,
                    "expiration_time": file.expiration_time()?,
                    "max_access_count": file.max_access_count()?,
                    "access_count": file.access_count()?,
                    "meta_access_count": file.meta_access_count()?,
                }));
            }
            print_json(&entries)?;
        }
    }
    Ok(())
}

fn downloads(count: u64, max: Option<u64>) -> String {
    match max {
        Some(max) => format!("{count}/{max}"),
        None => count.to_string(),
    }
}

/// Run the `file upload` command
fn upload(
    store: &Store,
    args: &UploadArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let uploader = authenticate(store, &args.token)?;
    let data = std::fs::read(&args.path)?;

    let mut upload = FileUpload::hashed(data)
        .with_mime_type(&args.mime)
        .hidden(args.hidden);
    let filename = args.name.clone().or_else(|| {
        args.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
    });
    if let Some(filename) = filename {
        upload = upload.with_filename(filename);
    }
    if let Some(max) = args.max_downloads {
        upload = upload.with_max_access_count(max);
    }
    upload = upload.with_lifetime(match args.lifetime_secs {
        None => Lifetime::Default,
        Some(0) => Lifetime::Never,
        Some(secs) => Lifetime::After(Duration::from_secs(secs)),
    });

    let file = File::create(store, &uploader, upload)?;
    match format {
        OutputFormat::Human => println!("{}", file.id()),
        OutputFormat::Json => println!("{}", serde_json::json!({ "id": file.id() })),
    }
    Ok(())
}

fn print_metadata(
    files: &[FileMetadata],
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Human => {
            let rows: Vec<Vec<String>> = files
                .iter()
                .map(|meta| {
                    vec![
                        meta.id.to_string(),
                        meta.uploader_id
                            .map(|id| id.to_string())
                            .unwrap_or_else(|| "hidden".to_string()),
                        meta.filename.clone().unwrap_or_default(),
                        meta.mime_type.clone(),
                        meta.size.to_string(),
                        format_time(meta.expiration_time),
                        downloads(meta.access_count, meta.max_access_count),
                    ]
                })
                .collect();
            print_table(
                &["ID", "UPLOADER", "FILENAME", "MIME", "SIZE", "EXPIRES", "DOWNLOADS"],
                &rows,
            );
        }
        OutputFormat::Json => print_json(files)?,
    }
    Ok(())
}
