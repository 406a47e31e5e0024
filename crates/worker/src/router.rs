//! Request classification.
//!
//! Pure and side-effect free: every request maps to exactly one [`Route`].

use regex::Regex;
use uno_core::{Destination, Request};

/// Which policy answers a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Network first, cached app shell on failure.
    Navigation,
    /// Cache-first against the image generation.
    Image,
    /// Cached copy now, network refresh in the background.
    StaleWhileRevalidate,
}

impl Route {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Navigation => "navigation",
            Self::Image => "image",
            Self::StaleWhileRevalidate => "stale-while-revalidate",
        }
    }
}

/// Secondary image classifier on the URL path, for requests that carry no
/// destination metadata.
///
/// The match is a case-sensitive suffix match: `PHOTO.PNG` is not an image.
#[derive(Debug, Clone)]
pub struct ImageMatcher {
    pattern: Regex,
}

impl ImageMatcher {
    pub fn new<S: AsRef<str>>(extensions: &[S]) -> Result<Self, regex::Error> {
        let alternatives = extensions
            .iter()
            .map(|ext| regex::escape(ext.as_ref()))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = Regex::new(&format!(r"\.(?:{alternatives})$"))?;
        Ok(Self { pattern })
    }

    pub fn matches(&self, path: &str) -> bool {
        self.pattern.is_match(path)
    }
}

/// Classify a request, first match wins: navigation, then image (by
/// destination or path suffix), then stale-while-revalidate.
pub fn classify(request: &Request, images: &ImageMatcher) -> Route {
    if request.is_navigation() {
        Route::Navigation
    } else if request.destination == Destination::Image || images.matches(request.url.path()) {
        Route::Image
    } else {
        Route::StaleWhileRevalidate
    }
}
