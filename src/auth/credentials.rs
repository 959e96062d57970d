// Credential resolution: call-site arguments override configured defaults

use crate::config::Config;
use crate::error::{Result, TaigaError};

use super::types::Credentials;

/// Resolve the effective credentials for an authentication attempt.
///
/// A non-empty explicit argument wins over the configured default. Fails
/// before any network activity when either half is still empty.
pub fn resolve(
    username: Option<&str>,
    password: Option<&str>,
    config: &Config,
) -> Result<Credentials> {
    let username = pick(username, &config.username);
    let password = pick(password, &config.password);

    if username.is_empty() || password.is_empty() {
        return Err(TaigaError::Authentication(
            "Username and password are required. \
             Please provide them or set TAIGA_USERNAME and TAIGA_PASSWORD environment variables."
                .to_string(),
        ));
    }

    Ok(Credentials {
        username: username.to_string(),
        password: password.to_string(),
    })
}

fn pick<'a>(explicit: Option<&'a str>, fallback: &'a str) -> &'a str {
    match explicit {
        Some(value) if !value.is_empty() => value,
        _ => fallback,
    }
}
