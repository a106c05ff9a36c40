mod concurrency;
mod reserved;
