mod save_load;
#[cfg(feature = "sqlite")]
mod sql;
