use std::future::Future;
use std::io::Write;

use futures_util::StreamExt;

use crate::docker::{ContainerRuntime, LogStream};
use crate::environment::Environment;
use crate::lifecycle::ContainerController;
use crate::ui;
use crate::ui::logs::render_line;

/// Print an environment's logs. In follow mode this runs until the stream
/// ends or Ctrl+C, and the follower process is killed either way.
pub async fn run<R>(
    controller: &ContainerController<R>,
    env: Environment,
    follow: bool,
    tail: usize,
) -> anyhow::Result<()>
where
    R: ContainerRuntime + ?Sized,
{
    let mut stream = controller.stream_logs(env, follow, tail).await?;
    if follow {
        ui::info(format!("Following {} logs (Ctrl+C to stop)", env.title()));
    }

    let stop = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };
    let printed = pump(&mut stream, &mut std::io::stdout(), ui::use_color(), stop).await;
    stream.close().await;

    let printed = printed?;
    tracing::debug!(environment = %env, lines = printed, "log output finished");
    Ok(())
}

/// Copy lines from `stream` to `out` until the stream ends or `stop`
/// resolves. Returns the number of lines written.
pub async fn pump<W, F>(
    stream: &mut LogStream,
    out: &mut W,
    use_color: bool,
    stop: F,
) -> std::io::Result<usize>
where
    W: Write,
    F: Future<Output = ()>,
{
    tokio::pin!(stop);
    let mut written = 0;
    loop {
        tokio::select! {
            line = stream.next() => match line {
                Some(Ok(line)) => {
                    writeln!(out, "{}", render_line(&line, use_color))?;
                    written += 1;
                }
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "log stream read failed");
                    break;
                }
                None => break,
            },
            _ = &mut stop => {
                tracing::debug!("log follow interrupted");
                break;
            }
        }
    }
    out.flush()?;
    Ok(written)
}
