//! Route modules for Lexis Server

pub mod documents;
pub mod export;
pub mod home;
pub mod images;
pub mod translate;
pub mod upload;
