//! # Client Directory
//!
//! Resolves a client id (RUT) to a client name by downloading a
//! `;`-delimited text resource.
//!
//! ```text
//! RUT_Cliente;Nombre_Cliente
//! 12.345.678-9;Comercial Andes SpA
//! 76.543.210-K;Servicios del Pacífico Ltda
//! ```
//!
//! Every failure path yields an empty name. The lookup only pre-fills a
//! form and never blocks a submission.

use std::time::Duration;

use tracing::{debug, warn};

use alta_core::{normalize_client_id, CLIENT_ID_MIN_LEN};

use crate::config::LookupSettings;

/// First column title of the resource's header line.
const HEADER_PREFIX: &str = "RUT_Cliente";

/// HTTP-backed client name lookup.
#[derive(Debug, Clone)]
pub struct ClientDirectory {
    url: Option<String>,
    http: reqwest::Client,
}

impl ClientDirectory {
    /// Builds the directory. A missing URL disables lookups.
    pub fn new(settings: &LookupSettings) -> Self {
        let timeout = Duration::from_secs(settings.timeout_secs);
        let http = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Falling back to default HTTP client");
                reqwest::Client::new()
            });

        ClientDirectory {
            url: settings.url.clone(),
            http,
        }
    }

    /// A directory that always answers empty.
    pub fn disabled() -> Self {
        ClientDirectory {
            url: None,
            http: reqwest::Client::new(),
        }
    }

    /// Returns the client name for `rut`, or an empty string.
    pub async fn lookup(&self, rut: &str) -> String {
        let normalized = normalize_client_id(rut);
        if normalized.chars().count() < CLIENT_ID_MIN_LEN {
            return String::new();
        }

        let Some(url) = self.url.as_deref() else {
            return String::new();
        };

        match self.fetch(url).await {
            Ok(body) => {
                let name = find_client_name(&body, &normalized);
                debug!(rut = %normalized, found = !name.is_empty(), "Client lookup");
                name
            }
            Err(e) => {
                warn!(rut = %normalized, error = %e, "Client directory unavailable");
                String::new()
            }
        }
    }

    async fn fetch(&self, url: &str) -> Result<String, reqwest::Error> {
        self.http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }
}

/// Scans a directory body for `rut` (already normalized).
pub fn find_client_name(body: &str, rut: &str) -> String {
    body.lines()
        .filter(|line| !line.trim_start().starts_with(HEADER_PREFIX))
        .filter_map(|line| line.split_once(';'))
        .find(|(id, _)| normalize_client_id(id) == rut)
        .map(|(_, rest)| rest.trim().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = "RUT_Cliente;Nombre_Cliente\n\
                        12.345.678-9; Comercial Andes SpA \n\
                        76.543.210-K;Servicios del Pacífico Ltda\n\
                        99.888.777-6;Transportes Sur; Norte y Centro Ltda\n\
                        sin separador\n";

    #[test]
    fn test_find_client_name() {
        assert_eq!(find_client_name(BODY, "123456789"), "Comercial Andes SpA");
        assert_eq!(
            find_client_name(BODY, &normalize_client_id("76543210-k")),
            "Servicios del Pacífico Ltda"
        );
        assert_eq!(find_client_name(BODY, "111111111"), "");
        assert_eq!(find_client_name(BODY, "rut_cliente"), "");
    }

    #[test]
    fn test_name_keeps_everything_after_first_separator() {
        assert_eq!(
            find_client_name(BODY, "998887776"),
            "Transportes Sur; Norte y Centro Ltda"
        );
    }

    #[tokio::test]
    async fn test_short_rut_skips_lookup() {
        let directory = ClientDirectory::new(&LookupSettings {
            url: Some("http://127.0.0.1:1/clientes.txt".into()),
            timeout_secs: 1,
        });

        assert_eq!(directory.lookup("1.234-5").await, "");
    }

    #[tokio::test]
    async fn test_disabled_and_unreachable_are_empty() {
        assert_eq!(ClientDirectory::disabled().lookup("12.345.678-9").await, "");

        let directory = ClientDirectory::new(&LookupSettings {
            url: Some("http://127.0.0.1:1/clientes.txt".into()),
            timeout_secs: 1,
        });
        assert_eq!(directory.lookup("12.345.678-9").await, "");
    }
}
