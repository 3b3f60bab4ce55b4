//! Application execution logic.
//!
//! This module wires the validated configuration to the ICMP, table, CGI
//! and syslog monitors and runs them until a shutdown signal or a fatal
//! error.

use std::fmt::Write as _;

use thiserror::Error;
use tokio::signal;
use tokio_util::sync::CancellationToken;

use netmon::cgi::{CgiError, CgiMonitor};
use netmon::config::{TableScope, ValidatedConfig};
use netmon::device::DeviceIndex;
use netmon::error::MonitorError;
use netmon::events::{SharedSink, TracingSink};
use netmon::icmp::{IcmpError, IcmpMonitor};
use netmon::supervisor::Supervisor;
use netmon::syslog::{SyslogError, SyslogListener};
use netmon::table::{
    ARP_COMMAND, ArpEntry, ChangeMonitor, CommandSource, ROUTE_COMMAND, RouteEntry, Sampler,
    TableEntry,
};

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;

/// Error type for runtime execution failures.
#[derive(Debug, Error)]
pub enum RunError {
    /// Failed to start the ICMP monitor.
    #[error("Failed to start ICMP monitor: {0}")]
    IcmpStartup(#[source] IcmpError),

    /// Failed to start CGI polling.
    #[error("Failed to start CGI polling: {0}")]
    CgiStartup(#[source] CgiError),

    /// Failed to start the syslog receiver.
    #[error("Failed to start syslog receiver: {0}")]
    SyslogStartup(#[source] SyslogError),

    /// A monitor stopped with a fatal error.
    #[error("Monitor failed: {0}")]
    Monitor(#[from] MonitorError),
}

/// Executes the main application loop.
///
/// This function:
/// 1. Prints the plan and returns in dry-run mode
/// 2. Opens ICMP sockets and spawns one probe loop per device
/// 3. Spawns the ARP and routing table monitors
/// 4. Spawns one CGI poller per endpoint and binds the syslog receiver
/// 5. Runs until a shutdown signal (Ctrl+C, SIGTERM) or the first fatal error
///
/// # Errors
///
/// Returns an error if:
/// - An ICMP socket cannot be opened
/// - An HTTP client cannot be built or the syslog socket cannot be bound
/// - Any monitor fails while running
///
/// # Coverage Note
///
/// This function is excluded from coverage because it requires:
/// - ICMP sockets, system commands and privileged ports
/// - Real async runtime with signal handling
#[cfg(not(tarpaulin_include))]
pub async fn execute(config: ValidatedConfig) -> Result<(), RunError> {
    if config.dry_run {
        print!("{}", dry_run_report(&config));
        return Ok(());
    }

    let sink = TracingSink::shared();
    let mut supervisor = Supervisor::new(CancellationToken::new());

    if let Some(icmp) = config.icmp {
        tracing::info!("ICMP monitoring enabled for {} device(s)", icmp.devices.len());
        IcmpMonitor::new(icmp.devices, sink.clone())
            .spawn(&mut supervisor)
            .map_err(RunError::IcmpStartup)?;
    }

    if let Some(arp) = config.arp {
        spawn_table::<ArpEntry>(&mut supervisor, "arp monitor", ARP_COMMAND, &arp, &sink);
    }

    if let Some(routing) = config.routing {
        spawn_table::<RouteEntry>(
            &mut supervisor,
            "route monitor",
            ROUTE_COMMAND,
            &routing,
            &sink,
        );
    }

    if let Some(cgi) = config.cgi {
        tracing::info!("CGI polling enabled for {} endpoint(s)", cgi.targets.len());
        CgiMonitor::new(cgi.targets, sink.clone())
            .spawn(&mut supervisor)
            .map_err(RunError::CgiStartup)?;
    }

    if let Some(syslog) = config.syslog {
        let listener = SyslogListener::bind(
            syslog.listen,
            DeviceIndex::new(&config.devices),
            sink.clone(),
        )
        .await
        .map_err(RunError::SyslogStartup)?;
        tracing::info!("Syslog receiver listening on {}", syslog.listen);
        let cancel = supervisor.token();
        supervisor.spawn("syslog receiver", listener.run(cancel));
    }

    let shutdown = tokio::spawn(cancel_on_shutdown(supervisor.token()));
    let result = supervisor.wait().await;
    shutdown.abort();

    result?;
    tracing::info!("All monitors stopped");
    Ok(())
}

/// Spawns a change monitor for one table scope.
fn spawn_table<E: TableEntry>(
    supervisor: &mut Supervisor,
    name: &str,
    command: (&str, &[&str]),
    scope: &TableScope,
    sink: &SharedSink,
) {
    let source = CommandSource::from_command(command);
    tracing::info!(
        "{name} enabled for {} device(s) every {}s ({source})",
        scope.devices.len(),
        scope.interval.as_secs()
    );

    let sampler = Sampler::<E, _>::new(source, DeviceIndex::new(&scope.devices));
    let monitor = ChangeMonitor::new(sampler, scope.interval, sink.clone());
    let cancel = supervisor.token();
    supervisor.spawn(name, monitor.run(cancel));
}

/// Describes what a run with `config` would monitor.
fn dry_run_report(config: &ValidatedConfig) -> String {
    let mut report = String::from("Dry run: nothing will be monitored.\n");

    if let Some(ref icmp) = config.icmp {
        let _ = writeln!(report, "icmp:");
        for target in &icmp.devices {
            let _ = writeln!(
                report,
                "  {} {} interval={}s timeout={}s",
                target.device.name,
                target.device.ip,
                target.interval.as_secs(),
                target.timeout.as_secs()
            );
        }
    }

    for (label, scope) in [("arp", &config.arp), ("routing", &config.routing)] {
        if let Some(scope) = scope {
            let _ = writeln!(report, "{label}: every {}s", scope.interval.as_secs());
            for device in &scope.devices {
                let _ = writeln!(report, "  {} {}", device.name, device.ip);
            }
        }
    }

    if let Some(ref cgi) = config.cgi {
        let _ = writeln!(report, "cgi:");
        for target in &cgi.targets {
            let url = target
                .url()
                .map_or_else(|e| format!("<{e}>"), |url| url.to_string());
            let _ = writeln!(
                report,
                "  {} {url} interval={}s timeout={}s user={}{}",
                target.device.name,
                target.interval.as_secs(),
                target.timeout.as_secs(),
                target.credentials.user,
                if target.once_only { " once" } else { "" }
            );
        }
    }

    if let Some(ref syslog) = config.syslog {
        let _ = writeln!(report, "syslog: listen {}", syslog.listen);
    }

    report
}

/// Cancels `cancel` once a shutdown signal arrives.
///
/// Excluded from coverage - requires OS signal handling.
#[cfg(not(tarpaulin_include))]
async fn cancel_on_shutdown(cancel: CancellationToken) {
    tokio::select! {
        () = shutdown_signal() => {
            tracing::info!("Shutdown signal received, stopping...");
            cancel.cancel();
        }
        () = cancel.cancelled() => {}
    }
}

/// Returns a future that completes when a shutdown signal is received.
///
/// A handler that cannot be installed never fires.
///
/// Excluded from coverage - requires OS signal handling.
#[cfg(not(tarpaulin_include))]
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
