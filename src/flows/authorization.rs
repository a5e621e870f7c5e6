//! Authorization URL construction for the authorization-code grant.

use rand::distributions::Alphanumeric;
use rand::Rng;
use url::Url;

use crate::core::PkceGenerator;
use crate::error::{ConfigurationError, HttpClientResult};
use crate::types::{OAuth2Config, PkceMethod, PkceParams};

/// Authorization redirect target plus the state needed to finish the grant.
#[derive(Clone, Debug)]
pub struct AuthorizationRequest {
    /// URL the user agent is sent to.
    pub url: String,
    /// Opaque value to compare against the callback's `state`.
    pub state: String,
    /// PKCE parameters; pass the verifier to the code exchange.
    pub pkce: Option<PkceParams>,
}

fn random_state() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

/// Build the authorization URL for `config`.
///
/// A random state is generated when none is given. PKCE parameters are added
/// when the configuration enables PKCE.
pub fn authorization_url(
    config: &OAuth2Config,
    redirect_uri: &str,
    state: Option<&str>,
    pkce: &dyn PkceGenerator,
) -> HttpClientResult<AuthorizationRequest> {
    let endpoint = config
        .authorization_endpoint
        .as_deref()
        .ok_or_else(|| ConfigurationError::MissingField {
            field: "authorization_endpoint".to_string(),
        })?;

    let mut url = Url::parse(endpoint).map_err(|_| ConfigurationError::InvalidEndpoint {
        url: endpoint.to_string(),
    })?;

    let state = state.map(str::to_string).unwrap_or_else(random_state);
    let pkce = config.enable_pkce.then(|| pkce.generate(PkceMethod::S256));

    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("response_type", "code")
            .append_pair("client_id", &config.credentials.client_id)
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("state", &state);

        if let Some(scope) = config.scope.as_deref().filter(|s| !s.is_empty()) {
            query.append_pair("scope", scope);
        }
        if let Some(params) = &pkce {
            query
                .append_pair("code_challenge", &params.code_challenge)
                .append_pair("code_challenge_method", params.code_challenge_method.as_str());
        }
    }

    Ok(AuthorizationRequest {
        url: url.into(),
        state,
        pkce,
    })
}
