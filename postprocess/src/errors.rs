use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HeaderError {
    #[error("{kind} length {len} exceeds its {available}-byte buffer")]
    LengthOutOfBounds {
        kind: &'static str,
        len: usize,
        available: usize,
    },
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("encoder session failed to open: {0}")]
    Open(String),

    #[error("failed to reconfigure encoder session: {0}")]
    Reconfigure(String),

    #[error("the shared encoder device lock was poisoned")]
    DevicePoisoned,

    #[error("unable to load parameter sets from the encoder session")]
    Headers(#[from] HeaderError),
}

#[derive(Error, Debug)]
pub enum StreamError {
    #[error("File path not recognized: {0}")]
    UnrecognizedFilePath(String),

    #[error("An error occurred when opening the file")]
    FileError(#[from] io::Error),
}

#[derive(Error, Debug)]
pub enum PostProcessError {
    #[error("An error occurred reading the Annex-B stream")]
    Stream(#[from] StreamError),

    #[error("An error occurred in the encoder session")]
    Session(#[from] SessionError),
}
