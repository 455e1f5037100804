use diesel::result::ConnectionError;
use diesel::result::Error as DieselError;
use diesel_migrations::RunMigrationsError;
use serde_json::Error as JSONError;
use std::io::Error as IOError;
use url::ParseError as URLError;

use err_derive::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(display = "std::io failure")]
    IO(#[error(source)] IOError),
    #[error(display = "Diesel failure")]
    Diesel(#[error(source)] DieselError),
    #[error(display = "Cannot connect database")]
    Connection(#[error(source)] ConnectionError),
    #[error(display = "Database migration failure")]
    Migration(#[error(source)] RunMigrationsError),
    #[error(display = "HTTP transport failure")]
    Transport(#[error(source)] ureq::Transport),
    #[error(display = "Server returned status {} for {}", _0, _1)]
    Status(u16, String),
    #[error(display = "Navigation timed out: {}", _0)]
    Timeout(String),
    #[error(display = "Cannot start browsing session: {}", _0)]
    SessionStart(String),
    #[error(display = "Browser failure: {}", _0)]
    Browser(String),
    #[error(display = "Invalid source configuration: {}", _0)]
    Config(String),
    #[error(display = "Cannot start HTTP server: {}", _0)]
    Server(String),
    #[error(display = "JSON Serialization/Deserialization failure")]
    Serde(#[error(source)] JSONError),
    #[error(display = "URL parse error")]
    URL(#[error(source)] URLError),
    #[error(display = "{}", _0)]
    StaticStr(&'static str),
}

impl Error {
    /// Navigation timeouts are expected on slow sources and only cost the current item.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout(_) => true,
            Self::Transport(t) => t.kind() == ureq::ErrorKind::Io && t.to_string().contains("timed out"),
            _ => false,
        }
    }
}

impl From<&'static str> for Error {
    fn from(s: &'static str) -> Self {
        Self::StaticStr(s)
    }
}

impl From<ureq::Error> for Error {
    fn from(e: ureq::Error) -> Self {
        match e {
            ureq::Error::Status(code, resp) => Self::Status(code, resp.get_url().to_owned()),
            ureq::Error::Transport(t) => Self::Transport(t),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
