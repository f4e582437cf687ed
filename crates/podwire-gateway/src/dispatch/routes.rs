//! Immutable route table.
//!
//! Built once with [`RouteTable::builder`] and shared read-only behind an
//! `Arc`. Routes are bucketed by method and tried in registration order; the
//! first match wins.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use podwire_core::error::Result;
use podwire_core::protocol::{Envelope, Method, Params};

use super::pattern::PathPattern;

/// What a matched handler gets to work with.
#[derive(Debug, Clone)]
pub struct RouteRequest {
    pub envelope: Envelope,
    pub params: Params,
}

/// Handler behind a route. Returns the JSON reply body.
#[async_trait]
pub trait RouteHandler: Send + Sync {
    fn name(&self) -> &'static str;
    async fn call(&self, req: RouteRequest) -> Result<Bytes>;
}

pub struct Route {
    pub method: Method,
    pub pattern: PathPattern,
    pub handler: Arc<dyn RouteHandler>,
}

pub struct Matched<'a> {
    pub route: &'a Route,
    pub params: Params,
}

#[derive(Default)]
pub struct RouteTable {
    buckets: HashMap<Method, Vec<Route>>,
}

impl RouteTable {
    pub fn builder() -> RouteTableBuilder {
        RouteTableBuilder::default()
    }

    /// Select the route for a command envelope.
    ///
    /// A route matches when the envelope carries params and the pattern matches
    /// the request path, or when the raw pattern equals the request URI.
    ///
    /// Handler params are the envelope's own `Params`. Pattern bindings only
    /// fill names the sender left unbound.
    pub fn find(&self, env: &Envelope) -> Option<Matched<'_>> {
        let method = env.method.as_ref()?;
        let bucket = self.buckets.get(method)?;

        for route in bucket {
            if let Some(sent) = &env.params {
                if let Some(bound) = route.pattern.match_path(env.path()) {
                    return Some(Matched {
                        route,
                        params: merge_params(sent, bound),
                    });
                }
            }
            if route.pattern.as_str() == env.uri {
                let params = env.params.clone().unwrap_or_default();
                return Some(Matched { route, params });
            }
        }
        None
    }

    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(method, pattern, handler)` for every route, bucket by bucket.
    pub fn describe(&self) -> Vec<(Method, &str, &'static str)> {
        let mut out: Vec<_> = self
            .buckets
            .iter()
            .flat_map(|(m, routes)| {
                routes
                    .iter()
                    .map(move |r| (m.clone(), r.pattern.as_str(), r.handler.name()))
            })
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }
}

#[derive(Default)]
pub struct RouteTableBuilder {
    routes: Vec<(Method, String, Arc<dyn RouteHandler>)>,
}

impl RouteTableBuilder {
    pub fn route(mut self, method: Method, pattern: &str, handler: Arc<dyn RouteHandler>) -> Self {
        self.routes.push((method, pattern.to_string(), handler));
        self
    }

    pub fn build(self) -> Result<RouteTable> {
        let mut buckets: HashMap<Method, Vec<Route>> = HashMap::new();
        for (method, raw, handler) in self.routes {
            let pattern = PathPattern::parse(&raw)?;
            buckets.entry(method.clone()).or_default().push(Route {
                method,
                pattern,
                handler,
            });
        }
        Ok(RouteTable { buckets })
    }
}

fn merge_params(sent: &Params, bound: Params) -> Params {
    let mut params = sent.clone();
    for p in bound.iter() {
        if params.get(&p.key).is_none() {
            params.push(p.key.as_str(), p.value.as_str());
        }
    }
    params
}
