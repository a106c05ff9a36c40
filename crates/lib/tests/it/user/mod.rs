mod lifecycle;
mod login;
