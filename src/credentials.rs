// Import necessary crates and modules
use crate::connection::CanvasClient;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Password};
use keyring::Entry;
use log::{info, warn};
use serde::{Deserialize, Serialize};

/// Structure to hold Canvas API credentials.
///
/// Fields:
/// - `url_canvas`: Base URL of the Canvas instance, e.g. `https://canvas.example.edu`.
/// - `token_canvas`: API token for authentication.
///
/// Example usage:
/// ```
/// use canvas_rubric_report::CanvasCredentials;
///
/// let canvas_credentials = CanvasCredentials {
///     url_canvas: "https://canvas.example.edu/".to_string(),
///     token_canvas: "your_api_token".to_string(),
/// };
/// assert_eq!(canvas_credentials.graphql_url(), "https://canvas.example.edu/api/graphql");
/// ```
#[derive(Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct CanvasCredentials {
    pub url_canvas: String,
    pub token_canvas: String,
}

// The token never ends up in logs.
impl std::fmt::Debug for CanvasCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CanvasCredentials")
            .field("url_canvas", &self.url_canvas)
            .field("token_canvas", &"<redacted>")
            .finish()
    }
}

// Enum to represent the source of Canvas credentials.
enum CanvasCredentialType {
    None,                             // No credentials available
    EnvVariables(CanvasCredentials),  // Credentials loaded from environment variables
    SystemKeyring(CanvasCredentials), // Credentials loaded from system's keyring
}

const KEYRING_URL: &str = "URL_CANVAS";
const KEYRING_TOKEN: &str = "TOKEN_CANVAS";

impl CanvasCredentials {
    fn base_url(&self) -> &str {
        self.url_canvas.trim_end_matches('/')
    }

    /// GraphQL endpoint of the instance.
    pub fn graphql_url(&self) -> String {
        format!("{}/api/graphql", self.base_url())
    }

    /// REST endpoint `path` under `/api/v1`.
    pub fn rest_url(&self, path: &str) -> String {
        format!("{}/api/v1/{}", self.base_url(), path.trim_start_matches('/'))
    }

    /// Reads credentials through `lookup`, which maps a variable name to its value.
    ///
    /// `API_INSTANCE`/`API_TOKEN` are read first, then `CANVAS_URL`/`CANVAS_TOKEN`.
    /// Empty values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<CanvasCredentials, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |keys: &[&str]| {
            keys.iter()
                .filter_map(|key| lookup(*key))
                .map(|value| value.trim().to_string())
                .find(|value| !value.is_empty())
        };

        let url = first(&["API_INSTANCE", "CANVAS_URL"])
            .ok_or_else(|| "Error retrieving URL from environment".to_string())?;
        let token = first(&["API_TOKEN", "CANVAS_TOKEN"])
            .ok_or_else(|| "Error retrieving token from environment".to_string())?;

        Ok(CanvasCredentials {
            url_canvas: url,
            token_canvas: token,
        })
    }

    /// Loads the Canvas credentials from the process environment (after `.env` was applied).
    pub fn load_credentials_from_env() -> Result<CanvasCredentials, String> {
        let credentials = Self::from_lookup(|key| std::env::var(key).ok())?;
        info!("Credentials loaded from environment -> {}", credentials.url_canvas);
        Ok(credentials)
    }

    /// Loads Canvas credentials from the system's keyring.
    ///
    /// Returns:
    /// - `Ok(CanvasCredentials)`: Credentials if successfully retrieved.
    /// - `Err(String)`: Error message if the keyring is unavailable or holds no credentials.
    pub fn load_credentials_from_system() -> Result<CanvasCredentials, String> {
        let app_name = env!("CARGO_PKG_NAME");
        let url = Entry::new(app_name, KEYRING_URL)
            .and_then(|entry| entry.get_password())
            .map_err(|_| "Error retrieving URL from system".to_string())?;
        let token = Entry::new(app_name, KEYRING_TOKEN)
            .and_then(|entry| entry.get_password())
            .map_err(|_| "Error retrieving token from system".to_string())?;

        Ok(CanvasCredentials {
            url_canvas: url,
            token_canvas: token,
        })
    }

    /// Tries environment variables first, then the system keyring.
    fn load_credentials() -> CanvasCredentialType {
        match Self::load_credentials_from_env() {
            Ok(credentials) => CanvasCredentialType::EnvVariables(credentials),
            Err(_) => match Self::load_credentials_from_system() {
                Ok(credentials) => CanvasCredentialType::SystemKeyring(credentials),
                Err(_) => CanvasCredentialType::None,
            },
        }
    }

    fn store_in_system(&self) -> Result<(), String> {
        let app_name = env!("CARGO_PKG_NAME");
        Entry::new(app_name, KEYRING_URL)
            .and_then(|entry| entry.set_password(&self.url_canvas))
            .map_err(|e| format!("Error saving URL: {}", e))?;
        Entry::new(app_name, KEYRING_TOKEN)
            .and_then(|entry| entry.set_password(&self.token_canvas))
            .map_err(|e| format!("Error saving token: {}", e))?;
        Ok(())
    }

    /// Interactively asks for credentials, validates them and stores them in the keyring.
    ///
    /// Loops until the user enters working credentials or declines.
    fn set_system_credentials() -> Result<CanvasCredentialType, String> {
        let theme = ColorfulTheme::default();
        loop {
            let register = Confirm::with_theme(&theme)
                .with_prompt("No Canvas credentials found. Do you wish to register them?")
                .default(true)
                .interact()
                .map_err(|e| e.to_string())?;
            if !register {
                return Ok(CanvasCredentialType::None);
            }

            let url: String = Input::with_theme(&theme)
                .with_prompt("Canvas URL")
                .interact_text()
                .map_err(|e| e.to_string())?;
            let token = Password::with_theme(&theme)
                .with_prompt("Canvas token")
                .interact()
                .map_err(|e| e.to_string())?;

            let credentials = CanvasCredentials {
                url_canvas: url.trim().to_string(),
                token_canvas: token.trim().to_string(),
            };

            match CanvasClient::new(credentials.clone()).test_credentials() {
                Ok(_) => {
                    if let Err(e) = credentials.store_in_system() {
                        warn!("{}", e);
                    }
                    return Ok(CanvasCredentialType::SystemKeyring(credentials));
                }
                Err(status_code) if status_code == 401 || status_code == 403 => {
                    eprintln!("Incorrect credentials");
                    continue;
                }
                Err(status_code) => {
                    return Err(format!(
                        "Error accessing Canvas API - Status Code {}",
                        status_code
                    ));
                }
            }
        }
    }

    /// Retrieves Canvas credentials, using stored credentials or prompting the user for them.
    ///
    /// Stored credentials (environment or keyring) are probed against Canvas before being
    /// returned. Prompted credentials are probed while being entered.
    ///
    /// Returns:
    /// - `Ok(CanvasCredentials)`: Working credentials.
    /// - `Err(String)`: No credentials could be obtained, or Canvas rejected them.
    pub fn credentials() -> Result<CanvasCredentials, String> {
        match Self::load_credentials() {
            CanvasCredentialType::None => match Self::set_system_credentials()? {
                CanvasCredentialType::SystemKeyring(credentials) => Ok(credentials),
                _ => Err("Error obtaining credentials".to_string()),
            },
            CanvasCredentialType::EnvVariables(credentials)
            | CanvasCredentialType::SystemKeyring(credentials) => {
                match CanvasClient::new(credentials.clone()).test_credentials() {
                    Ok(_) => Ok(credentials),
                    Err(e) => Err(format!("Error accessing Canvas API - Status Code {}", e)),
                }
            }
        }
    }
}
