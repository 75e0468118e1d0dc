//! Pages - identity, resolution and rendering
//!
//! A page is addressed by (command name, platform, language). The index
//! resolves a request to the best stored variant; the renderer turns the
//! page markdown into terminal output.

pub mod index;
mod platform;
pub mod render;

pub use index::{FsPageIndex, PageIndex, PageLocation, PageTarget, ShortIndex};
pub use platform::Platform;
pub use render::{Page, RenderMode};

/// Normalize the words of a lookup into a page name: `Git Checkout` -> `git-checkout`
pub fn page_name<S: AsRef<str>>(words: &[S]) -> String {
    words
        .iter()
        .map(|w| w.as_ref().trim().to_lowercase())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
