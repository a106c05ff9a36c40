mod access;
mod upload;
