//! `initialize` / `notifications/initialized` handshake.

use mcp_protocol::{
    supported_protocol_versions, ClientCapabilities, Implementation, InitializeRequestParams,
    InitializeResult, NegotiationResult, PROTOCOL_VERSION,
};

#[derive(Debug, Clone, thiserror::Error)]
#[error("server protocol version {server_version:?} is not compatible with any of {supported:?}")]
pub struct IncompatibleProtocolError {
    pub server_version: String,
    pub supported: Vec<&'static str>,
}

/// Validates and folds an `InitializeResult` into a [`NegotiationResult`].
///
/// The handshake's two round trips (`initialize` request, then the
/// `notifications/initialized` notification) are driven by the client core;
/// this type owns only the pure decision of whether the server's advertised
/// version is acceptable.
pub struct CapabilityNegotiator {
    client_info: Implementation,
    client_capabilities: ClientCapabilities,
}

impl CapabilityNegotiator {
    #[must_use]
    pub fn new(client_info: Implementation, client_capabilities: ClientCapabilities) -> Self {
        Self {
            client_info,
            client_capabilities,
        }
    }

    #[must_use]
    pub fn build_request(&self) -> InitializeRequestParams {
        InitializeRequestParams {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: self.client_capabilities.clone(),
            client_info: self.client_info.clone(),
        }
    }

    /// # Errors
    /// Returns [`IncompatibleProtocolError`] if the server's negotiated
    /// `protocol_version` is not one this client understands.
    pub fn finalize(
        &self,
        result: InitializeResult,
    ) -> Result<NegotiationResult, IncompatibleProtocolError> {
        if !supported_protocol_versions().contains(result.protocol_version.as_str()) {
            return Err(IncompatibleProtocolError {
                server_version: result.protocol_version,
                supported: supported_protocol_versions().into_iter().collect(),
            });
        }
        Ok(NegotiationResult {
            protocol_version: result.protocol_version,
            server_info: result.server_info,
            server_capabilities: result.capabilities,
            client_capabilities: self.client_capabilities.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcp_protocol::ServerCapabilities;

    fn sample_negotiator() -> CapabilityNegotiator {
        CapabilityNegotiator::new(
            Implementation {
                name: "test-client".into(),
                version: "0.1.0".into(),
                title: None,
            },
            ClientCapabilities::default(),
        )
    }

    #[test]
    fn accepts_current_protocol_version() {
        let negotiator = sample_negotiator();
        let result = negotiator.finalize(InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities::default(),
            server_info: Implementation {
                name: "test-server".into(),
                version: "1.0.0".into(),
                title: None,
            },
        });
        assert!(result.is_ok());
    }

    #[test]
    fn rejects_unknown_protocol_version() {
        let negotiator = sample_negotiator();
        let err = negotiator
            .finalize(InitializeResult {
                protocol_version: "1999-01-01".into(),
                capabilities: ServerCapabilities::default(),
                server_info: Implementation {
                    name: "test-server".into(),
                    version: "1.0.0".into(),
                    title: None,
                },
            })
            .unwrap_err();
        assert_eq!(err.server_version, "1999-01-01");
    }

    #[test]
    fn accepts_the_legacy_fallback_version() {
        let negotiator = sample_negotiator();
        let result = negotiator.finalize(InitializeResult {
            protocol_version: "2024-11-05".to_string(),
            capabilities: ServerCapabilities::default(),
            server_info: Implementation {
                name: "test-server".into(),
                version: "1.0.0".into(),
                title: None,
            },
        });
        assert!(result.is_ok());
    }
}
