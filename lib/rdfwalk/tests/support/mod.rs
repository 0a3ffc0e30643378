//! An [`oxhttp::Server`] on a free local port to test clients against.
#![allow(dead_code)]

use oxhttp::Server;
use oxhttp::model::header::CONTENT_TYPE;
use oxhttp::model::{Body, HeaderValue, Request, Response, StatusCode};
use std::io::{self, Read};
use std::net::{Ipv4Addr, SocketAddr, TcpListener};
use std::time::Duration;

/// Serves requests from background threads until the test process exits.
pub struct TestServer {
    address: SocketAddr,
}

impl TestServer {
    pub fn spawn(
        on_request: impl Fn(&mut Request<Body>) -> Response<Body> + Send + Sync + 'static,
    ) -> io::Result<Self> {
        // The listening server does not expose its bound address.
        let address = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))?.local_addr()?;
        Server::new(on_request)
            .bind(address)
            .with_global_timeout(Duration::from_secs(10))
            .spawn()?;
        Ok(Self { address })
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.address)
    }
}

pub fn content_type(request: &Request<Body>) -> Option<&str> {
    request.headers().get(CONTENT_TYPE)?.to_str().ok()
}

pub fn body_string(request: &mut Request<Body>) -> io::Result<String> {
    let mut body = String::new();
    request.body_mut().read_to_string(&mut body)?;
    Ok(body)
}

pub fn ok(content_type: &'static str, body: impl Into<Body>) -> Response<Body> {
    response(StatusCode::OK, Some(content_type), body.into())
}

pub fn no_content() -> Response<Body> {
    response(StatusCode::NO_CONTENT, None, Body::empty())
}

pub fn error(status: StatusCode, message: impl Into<String>) -> Response<Body> {
    response(
        status,
        Some("text/plain; charset=utf-8"),
        message.into().into(),
    )
}

fn response(status: StatusCode, content_type: Option<&'static str>, body: Body) -> Response<Body> {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    if let Some(content_type) = content_type {
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    }
    response
}
