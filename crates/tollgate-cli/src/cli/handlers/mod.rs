//! Command handlers

pub mod request;
pub mod session;

use console::style;
use std::sync::Arc;
use tollgate_sdk::{
    AuthClient, ClientBuilder, ClientConfig, SessionTermination, TerminationReason,
    TerminationSink,
};

use crate::error::Result;

/// Prints a re-authentication hint when the session ends
#[derive(Debug, Default)]
pub struct TerminalSink;

impl TerminationSink for TerminalSink {
    fn on_terminated(&self, event: &SessionTermination) {
        let message = match event.reason {
            TerminationReason::RegistrationAuthError => {
                "Your new account could not be authenticated."
            }
            TerminationReason::SessionExpired => "Your session has expired.",
        };
        eprintln!(
            "{} {} Sign in again at {}",
            style("Session ended:").red().bold(),
            message,
            style(&event.redirect).cyan()
        );
    }
}

/// Build a client from configuration, reporting terminations on stderr
pub(crate) fn build_client(config: &ClientConfig) -> Result<AuthClient> {
    let client = ClientBuilder::from_config(config)
        .termination_sink(Arc::new(TerminalSink))
        .build()?;
    Ok(client)
}
