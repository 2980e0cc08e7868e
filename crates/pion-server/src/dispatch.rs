//! Path-prefix service dispatch.

use crate::service::HttpService;
use parking_lot::RwLock;
use std::sync::Arc;

/// Maps request path prefixes to services.
///
/// Registration happens at configuration time under a write lock;
/// lookup is read-mostly and works on a copy-on-write snapshot, so
/// request handling never contends with registration.
pub struct ServiceDispatcher {
    /// Sorted longest-prefix-first so the first match wins.
    routes: RwLock<Arc<Vec<(String, Arc<dyn HttpService>)>>>,
}

impl ServiceDispatcher {
    /// Creates an empty dispatcher.
    #[must_use]
    pub fn new() -> Self {
        Self {
            routes: RwLock::new(Arc::new(Vec::new())),
        }
    }

    /// Binds a service to a path prefix, replacing any previous binding
    /// for the same prefix.
    pub fn add_service(&self, prefix: impl Into<String>, service: Arc<dyn HttpService>) {
        let prefix = prefix.into();
        let mut guard = self.routes.write();
        let mut routes = (**guard).clone();
        routes.retain(|(existing, _)| *existing != prefix);
        routes.push((prefix, service));
        routes.sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()));
        *guard = Arc::new(routes);
    }

    /// Longest-prefix lookup.
    #[must_use]
    pub fn find(&self, path: &str) -> Option<Arc<dyn HttpService>> {
        let routes = self.routes.read().clone();
        routes
            .iter()
            .find(|(prefix, _)| path.starts_with(prefix.as_str()))
            .map(|(_, service)| service.clone())
    }

    /// Number of registered bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.read().len()
    }

    /// Returns whether no services are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.read().is_empty()
    }
}

impl Default for ServiceDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::request::HttpRequest;
    use crate::response::HttpResponse;
    use async_trait::async_trait;

    struct Tagged(&'static str);

    #[async_trait]
    impl HttpService for Tagged {
        async fn handle(&self, _request: &HttpRequest) -> Result<HttpResponse, ServiceError> {
            Ok(HttpResponse::ok(self.0))
        }
    }

    fn dispatcher() -> ServiceDispatcher {
        let dispatcher = ServiceDispatcher::new();
        dispatcher.add_service("/", Arc::new(Tagged("root")));
        dispatcher.add_service("/api", Arc::new(Tagged("api")));
        dispatcher.add_service("/api/events", Arc::new(Tagged("events")));
        dispatcher
    }

    async fn tag_of(dispatcher: &ServiceDispatcher, path: &str) -> &'static str {
        let service = dispatcher.find(path).expect("service bound");
        let request = HttpRequest::new("GET".into(), path, 1, Vec::new(), bytes::Bytes::new());
        let response = service.handle(&request).await.unwrap();
        std::str::from_utf8(response.body())
            .map(|s| match s {
                "root" => "root",
                "api" => "api",
                "events" => "events",
                _ => "?",
            })
            .unwrap()
    }

    #[tokio::test]
    async fn longest_prefix_wins() {
        let dispatcher = dispatcher();
        assert_eq!(tag_of(&dispatcher, "/api/events/new").await, "events");
        assert_eq!(tag_of(&dispatcher, "/api/other").await, "api");
        assert_eq!(tag_of(&dispatcher, "/index.html").await, "root");
    }

    #[test]
    fn miss_without_catch_all() {
        let dispatcher = ServiceDispatcher::new();
        dispatcher.add_service("/api", Arc::new(Tagged("api")));
        assert!(dispatcher.find("/other").is_none());
    }

    #[test]
    fn rebinding_replaces() {
        let dispatcher = ServiceDispatcher::new();
        dispatcher.add_service("/x", Arc::new(Tagged("a")));
        dispatcher.add_service("/x", Arc::new(Tagged("b")));
        assert_eq!(dispatcher.len(), 1);
    }
}
