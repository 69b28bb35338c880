//! Core types for document extraction

pub mod document;
pub mod setting;

pub use document::Document;
pub use setting::{EtlType, ExtractSetting};
