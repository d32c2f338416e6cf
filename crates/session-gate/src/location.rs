//! Page location and the navigation seam.

use url::Url;

/// URL of the page a gate component is running on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLocation {
    url: Url,
}

impl PageLocation {
    /// Parse an absolute page URL.
    pub fn parse(href: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            url: Url::parse(href)?,
        })
    }

    pub fn from_url(url: Url) -> Self {
        Self { url }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Serialized origin, e.g. `https://app.example.com`.
    pub fn origin(&self) -> String {
        self.url.origin().ascii_serialization()
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }

    /// Path, query, and fragment as they would appear after the origin.
    pub fn relative(&self) -> String {
        let mut out = self.url.path().to_string();
        if let Some(query) = self.url.query() {
            out.push('?');
            out.push_str(query);
        }
        if let Some(fragment) = self.url.fragment() {
            out.push('#');
            out.push_str(fragment);
        }
        out
    }

    /// First value of a query parameter.
    pub fn query_param(&self, name: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    /// First value of a parameter encoded in the fragment (`#a=b&c=d`).
    pub fn fragment_param(&self, name: &str) -> Option<String> {
        let fragment = self.url.fragment()?;
        url::form_urlencoded::parse(fragment.as_bytes())
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    /// Resolve a (possibly relative) reference against this page.
    pub fn join(&self, reference: &str) -> Result<Url, url::ParseError> {
        self.url.join(reference)
    }
}

/// Page navigation primitive.
///
/// `replace` must behave like a replace-navigation: the current page is not
/// kept in history and all further work on it is abandoned.
pub trait Navigator: Send + Sync {
    /// Where the page currently is.
    fn location(&self) -> PageLocation;

    /// Navigate away, replacing the current history entry.
    fn replace(&self, destination: &str);
}
