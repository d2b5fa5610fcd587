use crate::RemoteError;
use slipway_config::ComposedConfig;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const ACCESS_KEY_ENV: &str = "AWS_ACCESS_KEY_ID";
pub const SECRET_KEY_ENV: &str = "AWS_SECRET_ACCESS_KEY";
pub const SESSION_TOKEN_ENV: &str = "AWS_SESSION_TOKEN";
pub const PROFILE_ENV: &str = "AWS_PROFILE";
pub const SHARED_CREDENTIALS_ENV: &str = "AWS_SHARED_CREDENTIALS_FILE";
pub const DEFAULT_PROFILE: &str = "default";

#[derive(Clone, PartialEq, Eq)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Where request-signing credentials come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// Key pair taken from the composed configuration.
    Static(AwsCredentials),
    /// Resolved at request time from the environment or the shared
    /// credentials file.
    Ambient,
}

impl CredentialSource {
    pub fn resolve(&self) -> Result<AwsCredentials, RemoteError> {
        match self {
            Self::Static(creds) => Ok(creds.clone()),
            Self::Ambient => resolve_ambient(|name| std::env::var(name).ok()),
        }
    }
}

/// Ambient lookup order: the key pair in the environment, then the selected
/// profile of the shared credentials file.
fn resolve_ambient(env: impl Fn(&str) -> Option<String>) -> Result<AwsCredentials, RemoteError> {
    if let Some(access_key_id) = env(ACCESS_KEY_ENV) {
        let secret_access_key = env(SECRET_KEY_ENV).ok_or_else(|| {
            RemoteError::Credentials(format!("{ACCESS_KEY_ENV} is set but {SECRET_KEY_ENV} is not"))
        })?;
        return Ok(AwsCredentials {
            access_key_id,
            secret_access_key,
            session_token: env(SESSION_TOKEN_ENV),
        });
    }

    let path = match env(SHARED_CREDENTIALS_ENV) {
        Some(path) => PathBuf::from(path),
        None => env("HOME")
            .map(|home| PathBuf::from(home).join(".aws").join("credentials"))
            .ok_or_else(|| {
                RemoteError::Credentials(format!(
                    "{ACCESS_KEY_ENV} is not set and HOME is unknown, cannot locate shared credentials"
                ))
            })?,
    };
    let profile = env(PROFILE_ENV).unwrap_or_else(|| DEFAULT_PROFILE.to_owned());
    debug!(
        "{ACCESS_KEY_ENV} not set, reading profile '{profile}' from {}",
        path.display()
    );
    load_profile(&path, &profile)
}

/// Read one profile from a shared credentials file.
pub fn load_profile(path: &Path, profile: &str) -> Result<AwsCredentials, RemoteError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(RemoteError::Credentials(format!(
                "{ACCESS_KEY_ENV} is not set and {} does not exist",
                path.display()
            )));
        }
        Err(e) => {
            return Err(RemoteError::Credentials(format!(
                "cannot read {}: {e}",
                path.display()
            )));
        }
    };

    let mut section = profile_section(&content, profile).ok_or_else(|| {
        RemoteError::Credentials(format!(
            "profile '{profile}' not found in {}",
            path.display()
        ))
    })?;
    let mut required = |key: &str| {
        section.remove(key).ok_or_else(|| {
            RemoteError::Credentials(format!(
                "profile '{profile}' in {} has no {key}",
                path.display()
            ))
        })
    };
    let access_key_id = required("aws_access_key_id")?;
    let secret_access_key = required("aws_secret_access_key")?;
    Ok(AwsCredentials {
        access_key_id,
        secret_access_key,
        session_token: section.remove("aws_session_token"),
    })
}

/// Key/value pairs of the `[profile]` section of an INI-style document.
fn profile_section(content: &str, profile: &str) -> Option<BTreeMap<String, String>> {
    let mut section: Option<BTreeMap<String, String>> = None;
    let mut inside = false;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            inside = name.trim() == profile;
            if inside {
                section.get_or_insert_with(BTreeMap::new);
            }
            continue;
        }
        if !inside {
            continue;
        }
        if let (Some(map), Some((key, value))) = (section.as_mut(), line.split_once('=')) {
            map.insert(key.trim().to_owned(), value.trim().to_owned());
        }
    }
    section
}

/// Everything needed to reach the remote API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub region: String,
    pub endpoint: String,
    pub credentials: CredentialSource,
}

impl ClientSettings {
    pub fn new(region: &str) -> Self {
        Self {
            region: region.to_owned(),
            endpoint: default_endpoint(region),
            credentials: CredentialSource::Ambient,
        }
    }

    #[must_use]
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.trim_end_matches('/').to_owned();
        self
    }

    #[must_use]
    pub fn with_credentials(mut self, credentials: AwsCredentials) -> Self {
        self.credentials = CredentialSource::Static(credentials);
        self
    }

    /// Read region, optional key pair and optional endpoint override.
    ///
    /// The key pair is used whenever `aws_access_key_id` is set; the secret is
    /// not checked here. Without a key id the ambient credentials apply.
    pub fn from_composed(config: &ComposedConfig) -> Result<Self, RemoteError> {
        let region = config
            .region
            .as_deref()
            .ok_or_else(|| RemoteError::Config("'region' is required".to_owned()))?;

        let mut settings = Self::new(region);
        if let Some(endpoint) = config.endpoint_url.as_deref() {
            settings = settings.with_endpoint(endpoint);
        }
        if let Some(access_key_id) = &config.aws_access_key_id {
            settings = settings.with_credentials(AwsCredentials {
                access_key_id: access_key_id.clone(),
                secret_access_key: config.aws_secret_access_key.clone().unwrap_or_default(),
                session_token: None,
            });
        }
        Ok(settings)
    }

    /// Host (and port, if any) of the endpoint, as sent in the `Host` header.
    pub fn host(&self) -> &str {
        let rest = self
            .endpoint
            .split_once("://")
            .map_or(self.endpoint.as_str(), |(_, rest)| rest);
        rest.split('/').next().unwrap_or(rest)
    }
}

fn default_endpoint(region: &str) -> String {
    format!("https://lambda.{region}.amazonaws.com")
}
