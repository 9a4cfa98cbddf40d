//! Link opener that hands repository links to the system browser.

use std::process::Stdio;

use async_trait::async_trait;
use dropzone_core::{ExternalNavigation, LinkOpener, OpenError};
use tokio::process::Command;

/// How an accepted navigation reaches the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LaunchMode {
    /// The command prints the link; nothing is launched.
    Print,
    /// The platform URL handler opens the link in a fresh browser context.
    Browser,
}

pub(crate) struct SystemOpener {
    mode: LaunchMode,
}

impl SystemOpener {
    pub(crate) const fn new(mode: LaunchMode) -> Self {
        Self { mode }
    }
}

#[async_trait]
impl LinkOpener for SystemOpener {
    async fn open(&self, navigation: &ExternalNavigation) -> Result<(), OpenError> {
        match self.mode {
            LaunchMode::Print => {
                tracing::debug!(url = %navigation.url, "link handed to terminal");
                Ok(())
            }
            LaunchMode::Browser => launch(navigation).await,
        }
    }
}

// The platform handler starts a separate browser process, so the page gets no
// opener handle and no referrer from this client.
async fn launch(navigation: &ExternalNavigation) -> Result<(), OpenError> {
    let (program, args) = browser_command();
    let status = Command::new(program)
        .args(args)
        .arg(navigation.url.as_str())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map_err(|err| OpenError::Failed {
            source: Box::new(err),
        })?;

    if status.success() {
        tracing::info!(url = %navigation.url, isolation = navigation.isolation.rel(), "link opened");
        Ok(())
    } else {
        Err(OpenError::Failed {
            source: format!("{program} exited with {status}").into(),
        })
    }
}

const fn browser_command() -> (&'static str, &'static [&'static str]) {
    if cfg!(target_os = "macos") {
        ("open", &[])
    } else if cfg!(target_os = "windows") {
        ("cmd", &["/C", "start", ""])
    } else {
        ("xdg-open", &[])
    }
}
