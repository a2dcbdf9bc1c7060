use async_trait::async_trait;
use bollard::Docker;
use bollard::container::{
    Config, CreateContainerOptions, InspectContainerOptions, LogsOptions, RemoveContainerOptions,
    StartContainerOptions, StopContainerOptions,
};
use bollard::errors::Error as BollardError;
use bollard::image::CreateImageOptions;
use bollard::models::{HostConfig, PortBinding};
use futures::StreamExt;
use futures::stream::BoxStream;
use std::collections::HashMap;

use super::transport::{self, EnvProbe, Platform, SocketTarget};
use super::{ContainerInfo, ContainerSpec, Engine, EngineError, PullProgress};
use crate::config::config::DockerConfig;
use crate::container::image::split_image_ref;
use crate::websocket::frame::LogFrame;

impl From<BollardError> for EngineError {
    fn from(err: BollardError) -> Self {
        match err {
            BollardError::DockerResponseServerError { status_code: 404, message } => {
                EngineError::NotFound(message)
            }
            BollardError::DockerResponseServerError { status_code, message } => EngineError::Api {
                status: status_code,
                message,
            },
            other => EngineError::Connectivity(other.to_string()),
        }
    }
}

/// `Engine` backed by the local Docker daemon.
#[derive(Clone)]
pub struct DockerEngine {
    docker: Docker,
    target: SocketTarget,
}

impl DockerEngine {
    pub fn connect(config: &DockerConfig) -> Result<Self, EngineError> {
        let target = transport::resolve_socket(
            config.socket_path.as_deref(),
            Platform::current(),
            &EnvProbe::from_env(),
            |p| p.exists(),
        );
        let docker = transport::connect(&target, config.timeout_secs)?;
        tracing::info!("Using container engine at {}", target);
        Ok(Self { docker, target })
    }

    pub fn target(&self) -> &SocketTarget {
        &self.target
    }
}

#[async_trait]
impl Engine for DockerEngine {
    async fn ping(&self) -> Result<(), EngineError> {
        self.docker.ping().await?;
        Ok(())
    }

    async fn inspect_image(&self, reference: &str) -> Result<(), EngineError> {
        self.docker.inspect_image(reference).await?;
        Ok(())
    }

    fn pull_image(&self, reference: &str) -> BoxStream<'static, Result<PullProgress, EngineError>> {
        let docker = self.docker.clone();
        let (from_image, tag) = split_image_ref(reference);
        let (from_image, tag) = (from_image.to_string(), tag.to_string());

        async_stream::stream! {
            let options = Some(CreateImageOptions {
                from_image: from_image.as_str(),
                tag: tag.as_str(),
                ..Default::default()
            });
            let mut pull = std::pin::pin!(docker.create_image(options, None, None));
            while let Some(item) = pull.next().await {
                yield item
                    .map(|info| PullProgress { status: info.status, progress: info.progress })
                    .map_err(EngineError::from);
            }
        }
        .boxed()
    }

    async fn inspect_container(&self, name: &str) -> Result<ContainerInfo, EngineError> {
        let info = self
            .docker
            .inspect_container(name, None::<InspectContainerOptions>)
            .await?;

        let (running, status) = match info.state {
            Some(state) => (
                state.running.unwrap_or(false),
                state.status.map(|s| s.to_string()).unwrap_or_default(),
            ),
            None => (false, String::new()),
        };

        Ok(ContainerInfo {
            id: info.id.unwrap_or_default(),
            running,
            status,
            env: info.config.and_then(|c| c.env).unwrap_or_default(),
        })
    }

    async fn create_container(&self, spec: &ContainerSpec) -> Result<String, EngineError> {
        let port_key = format!("{}/tcp", spec.port);

        let mut port_bindings = HashMap::new();
        port_bindings.insert(
            port_key.clone(),
            Some(vec![PortBinding {
                host_ip: None,
                host_port: Some(spec.port.to_string()),
            }]),
        );
        let mut exposed_ports = HashMap::new();
        exposed_ports.insert(port_key, HashMap::new());

        let config = Config {
            image: Some(spec.image.clone()),
            env: Some(spec.env.clone()),
            exposed_ports: Some(exposed_ports),
            host_config: Some(HostConfig {
                port_bindings: Some(port_bindings),
                ..Default::default()
            }),
            ..Default::default()
        };

        let options = CreateContainerOptions {
            name: spec.name.clone(),
            ..Default::default()
        };

        let created = self.docker.create_container(Some(options), config).await?;
        for warning in &created.warnings {
            tracing::warn!("Engine warning while creating {}: {}", spec.name, warning);
        }
        Ok(created.id)
    }

    async fn start_container(&self, name: &str) -> Result<(), EngineError> {
        self.docker
            .start_container(name, None::<StartContainerOptions<String>>)
            .await?;
        Ok(())
    }

    async fn stop_container(&self, name: &str) -> Result<(), EngineError> {
        self.docker
            .stop_container(name, None::<StopContainerOptions>)
            .await?;
        Ok(())
    }

    async fn remove_container(&self, name: &str, force: bool) -> Result<(), EngineError> {
        self.docker
            .remove_container(
                name,
                Some(RemoveContainerOptions {
                    force,
                    ..Default::default()
                }),
            )
            .await?;
        Ok(())
    }

    fn logs(&self, name: &str, tail: usize) -> BoxStream<'static, Result<LogFrame, EngineError>> {
        let docker = self.docker.clone();
        let name = name.to_string();

        async_stream::stream! {
            let options = LogsOptions::<String> {
                follow: true,
                stdout: true,
                stderr: true,
                tail: tail.to_string(),
                ..Default::default()
            };
            let mut logs = std::pin::pin!(docker.logs(&name, Some(options)));
            while let Some(item) = logs.next().await {
                yield item.map(LogFrame::from).map_err(EngineError::from);
            }
        }
        .boxed()
    }
}
