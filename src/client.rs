use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::marker::PhantomData;
use std::sync::Arc;

use itertools::Itertools;
use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::config::CloudConfig;
use crate::error::CloudError;
use crate::http::{HttpClientFactory, HttpMethod, HttpRequest, HttpResponse};
use crate::timers::RequestTimer;

/// Join URL segments with a single `/`, skipping empty segments.
pub fn url_path<S: AsRef<str>>(segments: &[S]) -> String {
    segments
        .iter()
        .map(|s| -> &str { s.as_ref() })
        .filter(|s| !s.is_empty())
        .enumerate()
        .map(|(i, s)| {
            if i == 0 {
                s.trim_end_matches('/')
            } else {
                s.trim_matches('/')
            }
        })
        .filter(|s| !s.is_empty())
        .join("/")
}

/// The handle every remote operation runs through. Cloneable and thread-safe.
///
/// It carries the application configuration, the transport, the caller's
/// bearer token, and optionally the Tokio runtime that callback-style
/// operations are scheduled on.
#[derive(Clone)]
pub struct CloudClient {
    config: Arc<CloudConfig>,
    factory: Arc<dyn HttpClientFactory>,
    access_token: Option<Arc<str>>,
    runtime: Option<Handle>,
}

impl Debug for CloudClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("CloudClient")
            .field("app_id", &self.config.app_id)
            .field("base_url", &self.config.base_url())
            .field("authenticated", &self.access_token.is_some())
            .finish()
    }
}

impl CloudClient {
    pub fn new(
        config: CloudConfig,
        factory: Arc<dyn HttpClientFactory>,
    ) -> Result<Self, CloudError> {
        config.validate()?;
        Ok(CloudClient {
            config: Arc::new(config),
            factory,
            access_token: None,
            runtime: None,
        })
    }

    /// Attach the caller's bearer credential. An empty token means anonymous.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        let token: String = token.into();
        self.access_token = (!token.is_empty()).then(|| Arc::from(token));
        self
    }

    /// Schedule callback-style operations on this runtime instead of the
    /// ambient one.
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn config(&self) -> &CloudConfig {
        &self.config
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    /// `<base>/apps/<app_id>`
    pub fn app_url(&self) -> String {
        url_path(&[self.config.base_url(), "apps", self.config.app_id.as_str()])
    }

    /// Create a request for `url` with the bearer credential attached.
    pub(crate) fn request(&self, url: &str, method: HttpMethod) -> Box<dyn HttpRequest> {
        let mut request =
            self.factory
                .create(url, &self.config.app_id, &self.config.app_key, method);
        self.authorize(request.as_mut());
        request
    }

    fn authorize(&self, request: &mut dyn HttpRequest) {
        if let Some(token) = &self.access_token {
            request.set_header("Authorization", &format!("Bearer {token}"));
        }
    }

    /// Send a request and classify non-2xx statuses.
    pub(crate) fn send(
        &self,
        request: Box<dyn HttpRequest>,
        method: HttpMethod,
        url: &str,
        body: Option<String>,
    ) -> Result<HttpResponse, CloudError> {
        debug!(event = "Http", phase = "Send", method = %method, url = url);

        let response = {
            let _timer = RequestTimer::new(method, url);
            request.send(body)?
        };

        if response.is_success() {
            Ok(response)
        } else {
            warn!(
                event = "Http",
                phase = "Response",
                method = %method,
                url = url,
                status = response.status()
            );
            Err(CloudError::from_status(
                response.status(),
                response.into_body(),
            ))
        }
    }

    /// Run `work` on a background context and hand its outcome to `callback`.
    ///
    /// The callback fires exactly once and never on the caller's stack. Work
    /// goes to the blocking pool of the configured runtime, or the ambient
    /// one; without any runtime a dedicated thread is used.
    pub(crate) fn spawn_completion<T, W, F>(&self, work: W, callback: F)
    where
        T: 'static,
        W: FnOnce() -> Result<T, CloudError> + Send + 'static,
        F: FnOnce(Result<T, CloudError>) + Send + 'static,
    {
        self.spawn_outcome(work, Err, callback);
    }

    /// Like [`CloudClient::spawn_completion`] for outcomes that are not a
    /// plain `Result`. If the work is dropped without running, for instance
    /// because the runtime has shut down, or panics, `abandoned` turns the
    /// failure into the value the callback receives.
    pub(crate) fn spawn_outcome<T, W, A, F>(&self, work: W, abandoned: A, callback: F)
    where
        T: 'static,
        W: FnOnce() -> T + Send + 'static,
        A: FnOnce(CloudError) -> T + Send + 'static,
        F: FnOnce(T) + Send + 'static,
    {
        let completion = Completion::new(abandoned, callback);
        let job = move || {
            let outcome = work();
            completion.complete(outcome);
        };
        match self.runtime.clone().or_else(|| Handle::try_current().ok()) {
            Some(runtime) => {
                runtime.spawn_blocking(job);
            }
            None => {
                std::thread::spawn(job);
            }
        }
    }
}

/// Single-fire callback holder. Dropping it uncompleted still fires the
/// callback, from a fresh thread, with an abandonment error.
struct Completion<T, A, F>
where
    A: FnOnce(CloudError) -> T + Send + 'static,
    F: FnOnce(T) + Send + 'static,
{
    pending: Option<(A, F)>,
    _outcome: PhantomData<fn() -> T>,
}

impl<T, A, F> Completion<T, A, F>
where
    A: FnOnce(CloudError) -> T + Send + 'static,
    F: FnOnce(T) + Send + 'static,
{
    fn new(abandoned: A, callback: F) -> Self {
        Completion {
            pending: Some((abandoned, callback)),
            _outcome: PhantomData,
        }
    }

    fn complete(mut self, outcome: T) {
        if let Some((_, callback)) = self.pending.take() {
            callback(outcome);
        }
    }
}

impl<T, A, F> Drop for Completion<T, A, F>
where
    A: FnOnce(CloudError) -> T + Send + 'static,
    F: FnOnce(T) + Send + 'static,
{
    fn drop(&mut self) {
        if let Some((abandoned, callback)) = self.pending.take() {
            warn!(event = "Completion", phase = "Abandoned");
            let error =
                CloudError::InvalidState("background task ended before completing".into());
            std::thread::spawn(move || callback(abandoned(error)));
        }
    }
}
