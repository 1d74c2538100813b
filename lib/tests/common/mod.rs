//! Shared scaffolding for the HTTP-level tests: a small multi-thread tokio
//! runtime drives the wiremock server on background workers while the
//! blocking clients under test run on the test thread itself.

use ldsync::Transport;
use url::Url;
use wiremock::MockServer;

pub fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .unwrap()
}

pub fn transport(server: &MockServer) -> Transport {
    Transport::new(Url::parse(&server.uri()).unwrap(), None).unwrap()
}
