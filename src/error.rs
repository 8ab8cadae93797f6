use std::{fmt, io};

use serde::{Deserialize, Serialize};
use serde_json::Error as JsonError;
use thiserror::Error;
use tokio::sync::mpsc::error::SendError as TokioSendError;
use url::ParseError as UrlParseError;

#[cfg(feature = "wasm")]
use serde_wasm_bindgen::Error as WasmError;

use crate::event::NavEvent;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
pub enum NavError {
    #[error("Session cache error: {0}")]
    Cache(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Fragment error: {0}")]
    Fragment(String),
    #[error("File System error: {0}")]
    Io(String),
    #[error("Item Not Found: {0}")]
    NotFound(String),
    #[error("(De)Serialization error: {0}")]
    Serialization(String),
    #[error("Unknown symbol handle: {0}")]
    UnknownSymbol(usize),
}

impl From<toml::de::Error> for NavError {
    fn from(src: toml::de::Error) -> NavError {
        NavError::Config(format!("Toml deserialization error: {src}"))
    }
}

impl From<toml::ser::Error> for NavError {
    fn from(src: toml::ser::Error) -> NavError {
        NavError::Serialization(format!("Toml serialization error: {src}"))
    }
}

impl From<JsonError> for NavError {
    fn from(src: JsonError) -> NavError {
        NavError::Serialization(format!("JSON (de)serialization error: {src}"))
    }
}

impl From<UrlParseError> for NavError {
    fn from(src: UrlParseError) -> NavError {
        NavError::Serialization(format!("Invalid URL: {src}"))
    }
}

impl From<io::Error> for NavError {
    fn from(x: io::Error) -> Self {
        match x.kind() {
            io::ErrorKind::NotFound => NavError::NotFound(format!("{x}")),
            _ => NavError::Io(format!("IOError: {}", x.kind())),
        }
    }
}

impl From<fmt::Error> for NavError {
    fn from(x: fmt::Error) -> Self {
        NavError::Serialization(format!("{x}"))
    }
}

impl From<TokioSendError<NavEvent>> for NavError {
    fn from(x: TokioSendError<NavEvent>) -> Self {
        NavError::Io(format!(
            "Channel update send Error, could not transmit navigation event {:?}",
            x.0
        ))
    }
}

#[cfg(feature = "wasm")]
impl From<WasmError> for NavError {
    fn from(wasm_error: WasmError) -> Self {
        NavError::Serialization(format!("Serde-wasm-bindgen error: {wasm_error}"))
    }
}
