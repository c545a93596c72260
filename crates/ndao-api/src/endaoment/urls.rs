/// Named Endaoment deployment this server talks to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndaomentEnvironment {
    Production,
    Local,
    Dev,
}

impl EndaomentEnvironment {
    /// Unknown names fall back to [`EndaomentEnvironment::Dev`].
    pub fn from_name(name: &str) -> Self {
        match name.trim() {
            "production" => Self::Production,
            "local" => Self::Local,
            _ => Self::Dev,
        }
    }

    pub fn urls(self) -> EndaomentUrls {
        let (auth, api) = match self {
            Self::Production => ("https://auth.endaoment.org", "https://api.endaoment.org"),
            Self::Local => ("http://localhost:3000", "http://localhost:3333"),
            Self::Dev => (
                "https://auth.dev.endaoment.org",
                "https://api.dev.endaoment.org",
            ),
        };

        EndaomentUrls {
            auth: auth.to_string(),
            api: api.to_string(),
        }
    }
}

/// Base URLs of the Endaoment authorization server and REST API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EndaomentUrls {
    pub auth: String,
    pub api: String,
}

impl EndaomentUrls {
    pub fn new(auth: impl Into<String>, api: impl Into<String>) -> Self {
        Self {
            auth: trim_slash(auth.into()),
            api: trim_slash(api.into()),
        }
    }

    pub fn with_overrides(self, auth: Option<String>, api: Option<String>) -> Self {
        Self::new(auth.unwrap_or(self.auth), api.unwrap_or(self.api))
    }

    pub fn authorize_endpoint(&self) -> String {
        format!("{}/auth", self.auth)
    }

    pub fn token_endpoint(&self) -> String {
        format!("{}/token", self.auth)
    }

    /// Absolute API URL for `path` (which must start with `/`).
    pub fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.api, path)
    }
}

fn trim_slash(mut url: String) -> String {
    while url.ends_with('/') {
        url.pop();
    }
    url
}
