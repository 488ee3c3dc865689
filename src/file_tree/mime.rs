//! Process-wide registry of content types the browser can display.

use std::collections::HashSet;

use once_cell::sync::OnceCell;

/// Image formats the decoder side is expected to handle.
const BUILTIN_IMAGE_TYPES: &[&str] = &[
    "image/avif",
    "image/bmp",
    "image/gif",
    "image/jpeg",
    "image/png",
    "image/qtif",
    "image/svg+xml",
    "image/tiff",
    "image/webp",
    "image/x-bmp",
    "image/x-icon",
    "image/x-portable-anymap",
    "image/x-portable-bitmap",
    "image/x-portable-graymap",
    "image/x-portable-pixmap",
    "image/x-tga",
    "image/x-win-bitmap",
    "image/x-xbitmap",
    "image/x-xpixmap",
];

/// Always accepted, whatever the registry was built from.
const ICON_TYPE: &str = "image/vnd.microsoft.icon";

static REGISTRY: OnceCell<MimeRegistry> = OnceCell::new();

/// Set of supported content types.
#[derive(Debug, Clone)]
pub struct MimeRegistry {
    types: HashSet<String>,
}

impl MimeRegistry {
    /// Build a registry from `types`. Matching is case-insensitive.
    pub fn new<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut types: HashSet<String> = types
            .into_iter()
            .map(|t| t.as_ref().to_ascii_lowercase())
            .collect();
        types.insert(ICON_TYPE.to_owned());
        Self { types }
    }

    /// The built-in image type list.
    pub fn builtin() -> Self {
        Self::new(BUILTIN_IMAGE_TYPES.iter().copied())
    }

    /// The process-wide registry, built from the built-in list on first use
    /// unless one was installed earlier.
    pub fn global() -> &'static MimeRegistry {
        REGISTRY.get_or_init(|| {
            tracing::debug!("Initializing built-in content type registry");
            Self::builtin()
        })
    }

    /// Install the process-wide registry.
    ///
    /// Fails, handing the registry back, when one is already in place.
    pub fn install(registry: MimeRegistry) -> Result<(), MimeRegistry> {
        REGISTRY.set(registry)
    }

    pub fn is_supported(&self, content_type: &str) -> bool {
        self.types.contains(&content_type.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl Default for MimeRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
