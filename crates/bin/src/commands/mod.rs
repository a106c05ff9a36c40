pub mod file;
pub mod id;
pub mod session;
pub mod user;

use purrcafe::MeowId;

/// Parse an identifier given in text form or as a decimal integer.
pub fn parse_id(input: &str) -> Result<MeowId, Box<dyn std::error::Error>> {
    if let Ok(value) = input.parse::<u64>() {
        return Ok(MeowId::from_int(value));
    }
    Ok(input.parse::<MeowId>()?)
}

/// Format an optional timestamp for human output.
pub fn format_time(time: Option<chrono::DateTime<chrono::Utc>>) -> String {
    time.map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "never".to_string())
}
