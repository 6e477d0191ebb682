// src/tasks/serve.rs

use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::BuildConfig;
use crate::dag::{action_fn, Task};
use crate::devserver::DevServer;
use crate::engine::{ServiceHandle, TaskContext};
use crate::errors::{BuildError, Result};
use crate::tasks::names;

pub fn task(cfg: Arc<BuildConfig>) -> Task {
    Task::new(names::DEV_SERVER).with_action(action_fn(move |ctx: TaskContext| {
        let cfg = Arc::clone(&cfg);
        async move {
            let addr = server_addr(&cfg).await?;
            let handle = DevServer::start(cfg.build_path(), addr, ctx.reload().clone()).await?;
            ctx.services().add(ServiceHandle::DevServer(handle));
            Ok(())
        }
    }))
}

async fn server_addr(cfg: &BuildConfig) -> Result<SocketAddr> {
    let host = cfg.server.host.as_str();
    tokio::net::lookup_host((host, cfg.server.port))
        .await
        .map_err(|e| BuildError::Server(format!("resolving {host}: {e}")))?
        .next()
        .ok_or_else(|| BuildError::Server(format!("{host} resolves to no address")))
}
