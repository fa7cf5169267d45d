use std::fmt;
use std::str::FromStr;

/// Output language requested for the summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    Auto,
    English,
    Korean,
    Japanese,
    Chinese,
    Spanish,
    French,
}

impl Language {
    pub const ALL: [Language; 7] = [
        Language::Auto,
        Language::English,
        Language::Korean,
        Language::Japanese,
        Language::Chinese,
        Language::Spanish,
        Language::French,
    ];

    /// The exact word the backend expects on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Language::Auto => "Auto",
            Language::English => "English",
            Language::Korean => "Korean",
            Language::Japanese => "Japanese",
            Language::Chinese => "Chinese",
            Language::Spanish => "Spanish",
            Language::French => "French",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Language::ALL
            .into_iter()
            .find(|lang| lang.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| RequestError::UnknownLanguage(trimmed.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    #[error("url must not be empty")]
    EmptyUrl,
    #[error("unknown language '{0}'")]
    UnknownLanguage(String),
}

/// A validated extraction request. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRequest {
    url: String,
    language: Language,
    user_id: String,
}

impl JobRequest {
    /// Builds a request, rejecting blank URLs. Well-formedness is not checked
    /// here; see [`JobRequest::is_well_formed`].
    pub fn new(
        url: impl AsRef<str>,
        language: Language,
        user_id: impl Into<String>,
    ) -> Result<Self, RequestError> {
        let url = url.as_ref().trim();
        if url.is_empty() {
            return Err(RequestError::EmptyUrl);
        }
        Ok(Self {
            url: url.to_string(),
            language,
            user_id: user_id.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Best-effort syntax check. The backend stays the authority on rejection.
    pub fn is_well_formed(&self) -> bool {
        matches!(url::Url::parse(&self.url), Ok(parsed) if parsed.has_host())
    }

    /// Host of the URL without a leading `www.`, for display.
    pub fn display_domain(&self) -> Option<String> {
        let parsed = url::Url::parse(&self.url).ok()?;
        let host = parsed.host_str()?;
        Some(host.strip_prefix("www.").unwrap_or(host).to_string())
    }
}
