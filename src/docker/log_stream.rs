use std::pin::Pin;
use std::task::{Context, Poll};

use bollard::container::LogOutput;
use bollard::query_parameters::LogsOptions;
use bollard::Docker;
use futures_util::stream::{self, BoxStream};
use futures_util::{Stream, StreamExt};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Child;
use tokio_stream::wrappers::LinesStream;

use crate::error::{Error, Result};

/// Fetch the last `tail` lines of a container's stdout and stderr, with
/// Docker timestamps.
pub async fn tail_logs(docker: &Docker, container: &str, tail: usize) -> Result<Vec<String>> {
    let options = LogsOptions {
        stdout: true,
        stderr: true,
        timestamps: true,
        tail: tail.to_string(),
        ..Default::default()
    };

    let mut stream = docker.logs(container, Some(options));
    let mut lines = Vec::new();
    while let Some(item) = stream.next().await {
        match item {
            Ok(output) => {
                let text = match &output {
                    LogOutput::StdOut { message } | LogOutput::StdErr { message } => {
                        String::from_utf8_lossy(message).into_owned()
                    }
                    _ => continue,
                };
                lines.extend(text.lines().map(str::to_string));
            }
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            }) => {
                return Err(Error::ContainerNotFound {
                    container: container.to_string(),
                })
            }
            Err(e) => return Err(Error::docker(format!("reading logs of {}", container), e)),
        }
    }
    Ok(lines)
}

/// A live stream of log lines. When it wraps a `docker compose logs -f`
/// child, dropping the stream kills the child.
pub struct LogStream {
    lines: BoxStream<'static, std::io::Result<String>>,
    child: Option<Child>,
}

impl LogStream {
    /// Merge the stdout and stderr lines of a spawned follower process.
    pub fn from_child(mut child: Child) -> Self {
        let stdout = child
            .stdout
            .take()
            .map(|out| LinesStream::new(BufReader::new(out).lines()).boxed());
        let stderr = child
            .stderr
            .take()
            .map(|err| LinesStream::new(BufReader::new(err).lines()).boxed());

        let lines = match (stdout, stderr) {
            (Some(out), Some(err)) => stream::select(out, err).boxed(),
            (Some(one), None) | (None, Some(one)) => one,
            (None, None) => stream::empty().boxed(),
        };

        Self {
            lines,
            child: Some(child),
        }
    }

    /// A finite stream over already-collected lines.
    pub fn from_lines(lines: Vec<String>) -> Self {
        Self {
            lines: stream::iter(lines.into_iter().map(Ok)).boxed(),
            child: None,
        }
    }

    /// Terminate the follower process, if any, and wait for it to exit.
    pub async fn close(mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill().await {
                tracing::debug!(error = %e, "log follower already exited");
            }
        }
    }
}

impl Stream for LogStream {
    type Item = std::io::Result<String>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().lines.poll_next_unpin(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn collected_lines_are_replayed_in_order() {
        let stream = LogStream::from_lines(vec!["one".into(), "two".into()]);
        let lines: Vec<String> = stream.map(|l| l.unwrap()).collect().await;
        assert_eq!(lines, vec!["one", "two"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn child_output_is_streamed_and_closed() {
        let child = tokio::process::Command::new("sh")
            .args(["-c", "echo out; echo err >&2; exec sleep 30"])
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .unwrap();

        let mut stream = LogStream::from_child(child);
        let mut seen = Vec::new();
        while seen.len() < 2 {
            let line = tokio::time::timeout(std::time::Duration::from_secs(5), stream.next())
                .await
                .expect("log line within timeout")
                .unwrap()
                .unwrap();
            seen.push(line);
        }
        seen.sort();
        assert_eq!(seen, vec!["err", "out"]);

        tokio::time::timeout(std::time::Duration::from_secs(5), stream.close())
            .await
            .expect("follower terminated");
    }
}
