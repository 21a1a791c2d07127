//! Logging setup utilities for the PeerSend signaling broker.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Crates whose events are enabled at the default level.
const WORKSPACE_TARGETS: [&str; 3] = ["peersend_server", "peersend_shared", "tower_http"];

/// Build the default filter directive used when `RUST_LOG` is not set.
///
/// Every workspace crate and the binary itself get `default_log_level`.
/// Hyphens are normalised to underscores because tracing targets use
/// module paths.
pub fn default_filter_directive(binary_name: &str, default_log_level: &str) -> String {
    let binary_target = binary_name.replace('-', "_");

    let mut targets: Vec<&str> = WORKSPACE_TARGETS.to_vec();
    if !targets.contains(&binary_target.as_str()) {
        targets.push(binary_target.as_str());
    }

    targets
        .iter()
        .map(|target| format!("{}={}", target, default_log_level))
        .collect::<Vec<_>>()
        .join(",")
}

/// Initialize the tracing subscriber with the specified default log level.
///
/// The log level can be overridden using the `RUST_LOG` environment variable.
///
/// # Arguments
///
/// * `binary_name` - The name of the binary (e.g., "peersend-server")
/// * `default_log_level` - The default log level (e.g., "debug", "info", "warn", "error")
///
/// # Examples
///
/// ```no_run
/// use peersend_shared::logger::setup_logger;
///
/// setup_logger("peersend-server", "info");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                default_filter_directive(binary_name, default_log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_directive_includes_workspace_crates() {
        // テスト項目: ワークスペースのクレート全てにデフォルトのログレベルが設定される
        // given (前提条件):
        let binary_name = "peersend-server";

        // when (操作):
        let directive = default_filter_directive(binary_name, "debug");

        // then (期待する結果):
        assert!(directive.contains("peersend_server=debug"));
        assert!(directive.contains("peersend_shared=debug"));
        assert!(directive.contains("tower_http=debug"));
        // バイナリ名とライブラリ名が同じ場合は重複しない
        assert_eq!(directive.matches("peersend_server=").count(), 1);
    }

    #[test]
    fn test_default_filter_directive_adds_unknown_binary() {
        // テスト項目: ワークスペース外のバイナリ名はターゲットとして追加される
        // given (前提条件):
        let binary_name = "load-probe";

        // when (操作):
        let directive = default_filter_directive(binary_name, "warn");

        // then (期待する結果):
        assert!(directive.ends_with("load_probe=warn"));
    }
}
