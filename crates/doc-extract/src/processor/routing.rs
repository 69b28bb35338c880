//! Extension-based extractor selection

use std::path::Path;

use crate::extractor::RemoteFormat;
use crate::types::EtlType;

/// Which extractor variant handles a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtractorKind {
    Spreadsheet,
    Pdf,
    Markdown,
    Html,
    Word,
    Csv,
    Text,
    Remote(RemoteFormat),
}

struct Route {
    extensions: &'static [&'static str],
    local: ExtractorKind,
    automatic: ExtractorKind,
}

/// Routing table. `local` applies in default mode and in Unstructured mode
/// without automatic processing; `automatic` applies to Unstructured mode
/// with automatic processing.
static ROUTES: &[Route] = &[
    Route {
        extensions: &[".xlsx"],
        local: ExtractorKind::Spreadsheet,
        automatic: ExtractorKind::Spreadsheet,
    },
    Route {
        extensions: &[".pdf"],
        local: ExtractorKind::Pdf,
        automatic: ExtractorKind::Pdf,
    },
    Route {
        extensions: &[".md", ".markdown"],
        local: ExtractorKind::Markdown,
        automatic: ExtractorKind::Remote(RemoteFormat::Markdown),
    },
    Route {
        extensions: &[".htm", ".html"],
        local: ExtractorKind::Html,
        automatic: ExtractorKind::Html,
    },
    Route {
        extensions: &[".docx"],
        local: ExtractorKind::Word,
        automatic: ExtractorKind::Remote(RemoteFormat::Word),
    },
    Route {
        extensions: &[".csv"],
        local: ExtractorKind::Csv,
        automatic: ExtractorKind::Csv,
    },
    Route {
        extensions: &[".msg"],
        local: ExtractorKind::Text,
        automatic: ExtractorKind::Remote(RemoteFormat::Msg),
    },
    Route {
        extensions: &[".eml"],
        local: ExtractorKind::Text,
        automatic: ExtractorKind::Remote(RemoteFormat::Eml),
    },
    Route {
        extensions: &[".ppt"],
        local: ExtractorKind::Text,
        automatic: ExtractorKind::Remote(RemoteFormat::Ppt),
    },
    Route {
        extensions: &[".pptx"],
        local: ExtractorKind::Text,
        automatic: ExtractorKind::Remote(RemoteFormat::Pptx),
    },
    Route {
        extensions: &[".xml"],
        local: ExtractorKind::Text,
        automatic: ExtractorKind::Remote(RemoteFormat::Xml),
    },
];

static FALLBACK: Route = Route {
    extensions: &[],
    local: ExtractorKind::Text,
    automatic: ExtractorKind::Remote(RemoteFormat::Text),
};

/// Lowercased extension of a path including the dot, or "" if none.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

/// Select a variant for an extension (with leading dot, any case).
///
/// Total: unknown extensions fall back to plain text.
pub fn select(extension: &str, etl_type: EtlType, automatic: bool) -> ExtractorKind {
    let extension = extension.to_lowercase();
    let route = ROUTES
        .iter()
        .find(|route| route.extensions.contains(&extension.as_str()))
        .unwrap_or(&FALLBACK);

    match (etl_type, automatic) {
        (EtlType::Unstructured, true) => route.automatic,
        _ => route.local,
    }
}

/// Select a variant for a file path.
pub fn select_for_path(path: &Path, etl_type: EtlType, automatic: bool) -> ExtractorKind {
    select(&extension_of(path), etl_type, automatic)
}
