//! Engine backed by the `docker` command line.
//!
//! Every operation spawns the binary with `tokio::process::Command` and parses
//! its stdout. A non-zero exit is reported as `NotFound` when stderr says the
//! container does not exist and as `Backend` otherwise.

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

use podwire_core::error::{PodwireError, Result};

use super::{
    ContainerDetail, ContainerEngine, ContainerState, ContainerSummary, CreateRequest,
    CreateResponse,
};

pub struct DockerCli {
    bin: String,
}

impl DockerCli {
    pub fn new(bin: impl Into<String>) -> Self {
        Self { bin: bin.into() }
    }

    async fn run(&self, args: &[&str]) -> Result<String> {
        let out = Command::new(&self.bin)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| PodwireError::Backend(format!("failed to spawn {}: {e}", self.bin)))?;

        if out.status.success() {
            return String::from_utf8(out.stdout)
                .map_err(|e| PodwireError::Backend(format!("docker output is not utf-8: {e}")));
        }

        let stderr = String::from_utf8_lossy(&out.stderr).trim().to_string();
        tracing::debug!(cmd = ?args, code = ?out.status.code(), %stderr, "docker command failed");
        if stderr.contains("No such container") || stderr.contains("No such object") {
            return Err(PodwireError::NotFound(stderr));
        }
        Err(PodwireError::Backend(stderr))
    }
}

/// Refuse values that the CLI would read as a flag.
fn operand<'a>(what: &str, value: &'a str) -> Result<&'a str> {
    if value.starts_with('-') {
        return Err(PodwireError::BadRequest(format!("{what} must not start with '-': {value}")));
    }
    Ok(value)
}

/// One line of `docker ps --format '{{json .}}'`.
#[derive(Debug, Deserialize)]
struct PsRow {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "Names", default)]
    names: String,
    #[serde(rename = "Image", default)]
    image: String,
    #[serde(rename = "Command", default)]
    command: String,
    #[serde(rename = "State", default)]
    state: String,
    #[serde(rename = "Status", default)]
    status: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InspectDoc {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    created: String,
    #[serde(default)]
    config: InspectConfig,
    #[serde(default)]
    state: InspectState,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InspectConfig {
    #[serde(default)]
    image: String,
    #[serde(default)]
    cmd: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InspectState {
    #[serde(default)]
    status: String,
    #[serde(default)]
    running: bool,
}

/// Parse `docker ps -a --no-trunc --format '{{json .}}'` output.
pub fn parse_ps(stdout: &str) -> Result<Vec<ContainerSummary>> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|line| {
            let row: PsRow = serde_json::from_str(line)
                .map_err(|e| PodwireError::Backend(format!("unexpected docker ps output: {e}")))?;
            Ok(ContainerSummary {
                id: row.id,
                names: row
                    .names
                    .split(',')
                    .filter(|n| !n.is_empty())
                    .map(|n| format!("/{n}"))
                    .collect(),
                image: row.image,
                command: row.command,
                state: row.state,
                status: row.status,
            })
        })
        .collect()
}

/// Parse `docker inspect --type container` output (a JSON array).
pub fn parse_inspect(stdout: &str, id: &str) -> Result<ContainerDetail> {
    let docs: Vec<InspectDoc> = serde_json::from_str(stdout)
        .map_err(|e| PodwireError::Backend(format!("unexpected docker inspect output: {e}")))?;
    let doc = docs
        .into_iter()
        .next()
        .ok_or_else(|| PodwireError::NotFound(format!("no such container: {id}")))?;
    Ok(ContainerDetail {
        id: doc.id,
        name: doc.name,
        image: doc.config.image,
        cmd: doc.config.cmd.unwrap_or_default(),
        created: doc.created,
        state: ContainerState {
            status: doc.state.status,
            running: doc.state.running,
        },
    })
}

#[async_trait]
impl ContainerEngine for DockerCli {
    async fn list(&self) -> Result<Vec<ContainerSummary>> {
        let out = self
            .run(&["ps", "-a", "--no-trunc", "--format", "{{json .}}"])
            .await?;
        parse_ps(&out)
    }

    async fn create(&self, req: CreateRequest) -> Result<CreateResponse> {
        if req.image.trim().is_empty() {
            return Err(PodwireError::BadRequest("image is required".into()));
        }

        let image = operand("image", &req.image)?;
        let mut args: Vec<&str> = vec!["create"];
        if !req.name.is_empty() {
            args.extend(["--name", operand("name", &req.name)?]);
        }
        // Everything after `--` is the image and its command, never an option.
        args.extend(["--", image]);
        args.extend(req.cmd.iter().map(String::as_str));

        let out = self.run(&args).await?;
        let id = out.trim().to_string();
        tracing::info!(%id, image = %req.image, "container created");
        Ok(CreateResponse {
            id,
            warnings: Vec::new(),
        })
    }

    async fn inspect(&self, id: &str) -> Result<ContainerDetail> {
        let out = self
            .run(&["inspect", "--type", "container", "--", operand("container id", id)?])
            .await?;
        parse_inspect(&out, id)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.run(&["rm", "--", operand("container id", id)?]).await?;
        tracing::info!(%id, "container removed");
        Ok(())
    }
}
