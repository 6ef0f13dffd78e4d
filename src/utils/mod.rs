pub mod serde;

use tokio::signal::unix::{signal, SignalKind};

/// Resolves once the process receives SIGINT or SIGTERM.
pub async fn shutdown_signal() {
    let (mut sig_int, mut sig_term) = match (
        signal(SignalKind::interrupt()),
        signal(SignalKind::terminate()),
    ) {
        (Ok(int), Ok(term)) => (int, term),
        (Err(e), _) | (_, Err(e)) => {
            tracing::error!(error = %e, "failed to install signal handlers");
            return std::future::pending().await;
        }
    };

    tokio::select! {
        _ = sig_int.recv() => {},
        _ = sig_term.recv() => {},
    };

    tracing::info!("shutdown signal received");
}

/// Returns the local part of an email address, if it is not empty.
pub fn get_email_local_part(addr: &str) -> Option<&str> {
    addr.split('@').next().filter(|p| !p.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_email_local_part() {
        assert_eq!(get_email_local_part("bob@example.com"), Some("bob"));
        assert_eq!(get_email_local_part("bob.smith+tag@example.com"), Some("bob.smith+tag"));
        assert_eq!(get_email_local_part("a@b@c"), Some("a"));
        assert_eq!(get_email_local_part("bob"), Some("bob"));
        assert_eq!(get_email_local_part("@example.com"), None);
        assert_eq!(get_email_local_part(""), None);
    }
}
