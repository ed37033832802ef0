//! HTTP client for the FinTrack backend.
//!
//! Provides both async and blocking client variants behind feature flags.

use secrecy::{ExposeSecret as _, SecretString};
use serde::Deserialize;

use crate::error::{FinTrackError, Result};
use crate::models::{TransactionId, UserId};

/// Base URL of a locally running backend.
const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Registration endpoint path.
const USERS_PATH: &str = "/usuarios/";

/// Login endpoint path.
const LOGIN_PATH: &str = "/login";

/// Content type of the login body.
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Content type of uploaded statements.
const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Collection path for a user's transactions.
fn transactions_path(user: UserId) -> String {
    format!("/usuarios/{user}/transacciones/")
}

/// Path of a single transaction.
fn transaction_path(user: UserId, id: TransactionId) -> String {
    format!("/usuarios/{user}/transacciones/{id}")
}

/// Statement upload path.
fn upload_path(user: UserId) -> String {
    format!("/usuarios/{user}/upload-pdf/")
}

/// `Authorization` header value, or [`FinTrackError::MissingToken`].
fn bearer(token: Option<&SecretString>) -> Result<String> {
    token
        .map(|secret| format!("Bearer {}", secret.expose_secret()))
        .ok_or(FinTrackError::MissingToken)
}

/// URL-encoded login body.
fn login_form(email: &str, password: &SecretString) -> Result<String> {
    Ok(serde_urlencoded::to_string([
        ("username", email),
        ("password", password.expose_secret()),
    ])?)
}

/// Rejects statement file names that are not PDFs.
fn check_pdf_name(file_name: &str) -> Result<()> {
    let is_pdf = file_name
        .rsplit_once('.')
        .is_some_and(|(stem, ext)| !stem.is_empty() && ext.eq_ignore_ascii_case("pdf"));
    if is_pdf {
        Ok(())
    } else {
        Err(FinTrackError::InvalidInput(format!(
            "only PDF statements can be uploaded, got {file_name:?}"
        )))
    }
}

/// Builds an API error, preferring the backend's `detail` message.
fn api_error(status: u16, body: String) -> FinTrackError {
    /// Error body shape used by the backend.
    #[derive(Deserialize)]
    struct ErrorBody {
        /// Human-readable reason.
        detail: String,
    }

    let message = serde_json::from_str::<ErrorBody>(&body).map_or(body, |parsed| parsed.detail);
    FinTrackError::Api { status, message }
}

/// Generates a FinTrack client (async or blocking) with builder, methods, and tests.
macro_rules! define_client {
    (
        client_name: $client:ident,
        builder_name: $builder:ident,
        http_type: $http_type:ty,
        request_type: $req_type:ty,
        response_type: $resp_type:ty,
        client_doc: $client_doc:expr,
        builder_doc: $builder_doc:expr,
        $(async_kw: $async_kw:tt,)?
        $(await_kw: $await_ext:tt,)?
    ) => {
        #[doc = $builder_doc]
        #[derive(Debug)]
        pub struct $builder {
            /// Access token for authenticated endpoints.
            token: Option<SecretString>,
            /// Base URL override.
            base_url: Option<String>,
        }

        impl $builder {
            /// Sets the access token for authenticated endpoints.
            #[inline]
            #[must_use]
            pub fn token<T: Into<String>>(mut self, token: T) -> Self {
                self.token = Some(SecretString::from(token.into()));
                self
            }

            /// Sets the access token from an existing secret.
            #[inline]
            #[must_use]
            pub fn secret_token(mut self, token: SecretString) -> Self {
                self.token = Some(token);
                self
            }

            /// Overrides the base URL (a deployed backend or a mock server).
            #[inline]
            #[must_use]
            pub fn base_url<T: Into<String>>(mut self, url: T) -> Self {
                self.base_url = Some(url.into());
                self
            }

            /// Builds the client.
            ///
            /// A client without a token can still register and log in.
            ///
            /// # Errors
            ///
            /// Returns [`FinTrackError::Http`] if the HTTP client fails to build.
            #[inline]
            #[tracing::instrument(skip_all)]
            pub fn build(self) -> Result<$client> {
                let base_url = self
                    .base_url
                    .map(|url| url.trim_end_matches('/').to_owned())
                    .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());
                tracing::debug!(
                    base_url = %base_url,
                    has_token = self.token.is_some(),
                    "building client"
                );
                let http = <$http_type>::builder().build()?;

                Ok($client {
                    http,
                    token: self.token,
                    base_url,
                })
            }
        }

        #[doc = $client_doc]
        #[derive(Debug)]
        pub struct $client {
            /// Underlying HTTP client.
            http: $http_type,
            /// Bearer access token, if logged in.
            token: Option<SecretString>,
            /// API base URL without a trailing slash.
            base_url: String,
        }

        impl $client {
            /// Creates a new builder for configuring the client.
            #[inline]
            #[must_use]
            pub const fn builder() -> $builder {
                $builder {
                    token: None,
                    base_url: None,
                }
            }

            /// Returns `true` if the client carries an access token.
            #[inline]
            #[must_use]
            pub const fn has_token(&self) -> bool {
                self.token.is_some()
            }

            /// Replaces the access token, e.g. right after [`Self::login`].
            #[inline]
            pub fn set_token(&mut self, token: SecretString) {
                self.token = Some(token);
            }

            /// Creates an account via `POST /usuarios/`.
            ///
            /// # Errors
            ///
            /// Returns an error if the HTTP request fails, the server returns a
            /// non-success status (e.g. the e-mail is taken), or the response
            /// cannot be deserialized.
            #[inline]
            #[tracing::instrument(skip_all)]
            pub $($async_kw)? fn register(&self, user: &UserCreate) -> Result<User> {
                tracing::debug!(email = %user.email, "registering user");
                let request = self.http.post(self.url(USERS_PATH)).json(user);
                Self::send_json(request) $( .$await_ext )?
            }

            /// Exchanges credentials for an access token via `POST /login`.
            ///
            /// The token is returned, not stored; pass it to
            /// [`Self::set_token`] or persist it as a session.
            ///
            /// # Errors
            ///
            /// Returns [`FinTrackError::Api`] with status 401 on wrong
            /// credentials, or another error if the request fails.
            #[inline]
            #[tracing::instrument(skip_all)]
            pub $($async_kw)? fn login(
                &self,
                email: &str,
                password: &SecretString,
            ) -> Result<LoginResponse> {
                tracing::debug!(email = %email, "logging in");
                let request = self
                    .http
                    .post(self.url(LOGIN_PATH))
                    .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
                    .body(login_form(email, password)?);
                Self::send_json(request) $( .$await_ext )?
            }

            /// Lists a user's transactions via
            /// `GET /usuarios/{user}/transacciones/`.
            ///
            /// Records come back as sent; normalize them with
            /// [`crate::ingest::normalize_all`] or a [`crate::ledger::Ledger`].
            ///
            /// # Errors
            ///
            /// Returns [`FinTrackError::MissingToken`] without a token, or an
            /// error if the request fails or the response cannot be
            /// deserialized.
            #[inline]
            #[tracing::instrument(skip_all, fields(user = %user))]
            pub $($async_kw)? fn list_transactions(&self, user: UserId) -> Result<Vec<RawTransaction>> {
                tracing::debug!("listing transactions");
                let request = self.authorized(Method::GET, &transactions_path(user))?;
                Self::send_json(request) $( .$await_ext )?
            }

            /// Creates a transaction via `POST /usuarios/{user}/transacciones/`.
            ///
            /// # Errors
            ///
            /// Returns [`FinTrackError::MissingToken`] without a token, or an
            /// error if the request fails or the response cannot be
            /// deserialized.
            #[inline]
            #[tracing::instrument(skip_all, fields(user = %user))]
            pub $($async_kw)? fn create_transaction(
                &self,
                user: UserId,
                input: &TransactionInput,
            ) -> Result<RawTransaction> {
                tracing::debug!(date = %input.date, amount = input.amount, "creating transaction");
                let request = self
                    .authorized(Method::POST, &transactions_path(user))?
                    .json(input);
                Self::send_json(request) $( .$await_ext )?
            }

            /// Replaces a transaction via
            /// `PUT /usuarios/{user}/transacciones/{id}`.
            ///
            /// # Errors
            ///
            /// Returns [`FinTrackError::MissingToken`] without a token,
            /// [`FinTrackError::Api`] with status 404 for an unknown ID, or
            /// another error if the request fails.
            #[inline]
            #[tracing::instrument(skip_all, fields(user = %user, id = %id))]
            pub $($async_kw)? fn update_transaction(
                &self,
                user: UserId,
                id: TransactionId,
                input: &TransactionInput,
            ) -> Result<RawTransaction> {
                tracing::debug!("updating transaction");
                let request = self
                    .authorized(Method::PUT, &transaction_path(user, id))?
                    .json(input);
                Self::send_json(request) $( .$await_ext )?
            }

            /// Deletes a transaction via
            /// `DELETE /usuarios/{user}/transacciones/{id}`.
            ///
            /// # Errors
            ///
            /// Returns [`FinTrackError::MissingToken`] without a token,
            /// [`FinTrackError::Api`] with status 404 for an unknown ID, or
            /// another error if the request fails.
            #[inline]
            #[tracing::instrument(skip_all, fields(user = %user, id = %id))]
            pub $($async_kw)? fn delete_transaction(
                &self,
                user: UserId,
                id: TransactionId,
            ) -> Result<()> {
                tracing::debug!("deleting transaction");
                let request = self.authorized(Method::DELETE, &transaction_path(user, id))?;
                let response: $resp_type = request.send() $( .$await_ext )? ?;
                drop(Self::check_status(response) $( .$await_ext )? ?);
                Ok(())
            }

            /// Uploads a bank statement via `POST /usuarios/{user}/upload-pdf/`
            /// and returns the movements the backend extracted from it.
            ///
            /// Nothing is saved; create the movements you want to keep with
            /// [`Self::create_transaction`].
            ///
            /// # Errors
            ///
            /// Returns [`FinTrackError::InvalidInput`] if `file_name` does not
            /// end in `.pdf`, [`FinTrackError::MissingToken`] without a token,
            /// or an error if the request fails.
            #[inline]
            #[tracing::instrument(skip_all, fields(user = %user, file_name = %file_name))]
            pub $($async_kw)? fn upload_pdf(
                &self,
                user: UserId,
                file_name: &str,
                bytes: Vec<u8>,
            ) -> Result<PdfUploadResponse> {
                check_pdf_name(file_name)?;
                tracing::debug!(size = bytes.len(), "uploading statement");
                let part = Part::bytes(bytes)
                    .file_name(file_name.to_owned())
                    .mime_str(PDF_CONTENT_TYPE)?;
                let request = self
                    .authorized(Method::POST, &upload_path(user))?
                    .multipart(Form::new().part("file", part));
                Self::send_json(request) $( .$await_ext )?
            }

            /// Joins a path onto the base URL.
            fn url(&self, path: &str) -> String {
                format!("{}{path}", self.base_url)
            }

            /// Starts a request carrying the bearer token.
            fn authorized(&self, method: Method, path: &str) -> Result<$req_type> {
                let auth = bearer(self.token.as_ref())?;
                Ok(self.http.request(method, self.url(path)).header(AUTHORIZATION, auth))
            }

            /// Sends a request and deserializes a successful JSON response.
            $($async_kw)? fn send_json<Resp: serde::de::DeserializeOwned>(
                request: $req_type,
            ) -> Result<Resp> {
                let response: $resp_type = request.send() $( .$await_ext )? ?;
                let response = Self::check_status(response) $( .$await_ext )? ?;
                let body = response.text() $( .$await_ext )? ?;
                tracing::trace!(body_len = body.len(), "parsing response body");
                serde_json::from_str(&body).map_err(FinTrackError::from)
            }

            /// Passes successful responses through and turns the rest into
            /// [`FinTrackError::Api`].
            $($async_kw)? fn check_status(response: $resp_type) -> Result<$resp_type> {
                let status = response.status();
                tracing::debug!(status = %status, "received response");
                if status.is_success() {
                    return Ok(response);
                }
                let body = response
                    .text()
                    $( .$await_ext )?
                    .unwrap_or_else(|_| "unknown error".to_owned());
                tracing::debug!(status = status.as_u16(), body = %body, "API error");
                Err(api_error(status.as_u16(), body))
            }
        }

    };
}

#[cfg(feature = "async")]
mod async_client {
    //! Async HTTP client for the FinTrack backend.

    use reqwest::Method;
    use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
    use reqwest::multipart::{Form, Part};
    use secrecy::SecretString;

    use super::{
        DEFAULT_BASE_URL, FORM_CONTENT_TYPE, LOGIN_PATH, PDF_CONTENT_TYPE, USERS_PATH, api_error,
        bearer, check_pdf_name, login_form, transaction_path, transactions_path, upload_path,
    };
    use crate::error::{FinTrackError, Result};
    use crate::models::{
        LoginResponse, PdfUploadResponse, RawTransaction, TransactionId, TransactionInput, User,
        UserCreate, UserId,
    };

    define_client! {
        client_name: FinTrackClient,
        builder_name: FinTrackClientBuilder,
        http_type: reqwest::Client,
        request_type: reqwest::RequestBuilder,
        response_type: reqwest::Response,
        client_doc: "Async client for the FinTrack backend.\n\nUse [`FinTrackClient::builder()`] to construct an instance.",
        builder_doc: "Builder for constructing a [`FinTrackClient`].",
        async_kw: async,
        await_kw: await,
    }
}

#[cfg(feature = "blocking")]
mod blocking_client {
    //! Blocking (synchronous) HTTP client for the FinTrack backend.

    use reqwest::Method;
    use reqwest::blocking::multipart::{Form, Part};
    use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
    use secrecy::SecretString;

    use super::{
        DEFAULT_BASE_URL, FORM_CONTENT_TYPE, LOGIN_PATH, PDF_CONTENT_TYPE, USERS_PATH, api_error,
        bearer, check_pdf_name, login_form, transaction_path, transactions_path, upload_path,
    };
    use crate::error::{FinTrackError, Result};
    use crate::models::{
        LoginResponse, PdfUploadResponse, RawTransaction, TransactionId, TransactionInput, User,
        UserCreate, UserId,
    };

    define_client! {
        client_name: FinTrackBlockingClient,
        builder_name: FinTrackBlockingClientBuilder,
        http_type: reqwest::blocking::Client,
        request_type: reqwest::blocking::RequestBuilder,
        response_type: reqwest::blocking::Response,
        client_doc: "Blocking (synchronous) client for the FinTrack backend.\n\nUse [`FinTrackBlockingClient::builder()`] to construct an instance.",
        builder_doc: "Builder for constructing a [`FinTrackBlockingClient`].",
    }
}

#[cfg(feature = "async")]
pub use async_client::{FinTrackClient, FinTrackClientBuilder};
#[cfg(feature = "blocking")]
pub use blocking_client::{FinTrackBlockingClient, FinTrackBlockingClientBuilder};



#[cfg(all(test, feature = "blocking"))]
mod blocking_http_tests {
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::FinTrackBlockingClient;
    use crate::error::FinTrackError;
    use crate::models::{TransactionId, UserId};

    #[tokio::test(flavor = "multi_thread")]
    async fn delete_checks_status() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/usuarios/5/transacciones/9"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/usuarios/5/transacciones/10"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(serde_json::json!({"detail": "Transacción no encontrada"})),
            )
            .mount(&server)
            .await;

        let uri = server.uri();
        let (deleted, missing) = tokio::task::spawn_blocking(move || {
            let client = FinTrackBlockingClient::builder()
                .token("tok")
                .base_url(uri)
                .build()
                .unwrap();
            let user = UserId::new(5);
            (
                client.delete_transaction(user, TransactionId::new(9)),
                client.delete_transaction(user, TransactionId::new(10)),
            )
        })
        .await
        .unwrap();

        deleted.unwrap();
        assert!(matches!(
            missing,
            Err(FinTrackError::Api { status: 404, ref message }) if message == "Transacción no encontrada"
        ));
    }
}
