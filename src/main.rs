use clap::Parser;
use log::{error, info, warn};
use pingora::prelude::*;
use pingora::server::configuration::Opt;
use pingora_proxy::http_proxy_service;
use pingora_xss_guard::*;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/xss_guard.yaml")]
    config: String,

    /// Upstream backend host
    #[arg(short = 'u', long, default_value = "127.0.0.1")]
    upstream_host: String,

    /// Upstream backend port
    #[arg(short = 'p', long, default_value = "8080")]
    upstream_port: u16,

    /// Listening address
    #[arg(short = 'l', long, default_value = "0.0.0.0")]
    listen_addr: String,

    /// Listening port
    #[arg(short = 'P', long, default_value = "6188")]
    listen_port: u16,

    /// Metrics port
    #[arg(short = 'm', long, default_value = "6190")]
    metrics_port: u16,

    /// Reload the configuration file when it changes
    #[arg(short = 'w', long)]
    watch: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    info!("Starting XSS guard...");
    info!("Loading configuration from: {}", args.config);

    let config = GuardConfig::from_file(&args.config).unwrap_or_else(|e| {
        error!("Failed to load configuration from {}: {}", args.config, e);
        error!("Using default configuration");
        GuardConfig::default()
    });

    if !config.xss_armed() {
        warn!("XSS check is disabled; responses are forwarded untouched");
    }

    let store = Arc::new(ConfigStore::new(&config));

    // Kept alive for the lifetime of the process
    let mut watcher = ConfigWatcher::new(&args.config, config.hot_reload.debounce_secs);
    if args.watch || config.hot_reload.enabled {
        if let Err(e) = watcher.start_watching(store.clone()) {
            error!("Hot reload unavailable: {}", e);
        }
    }

    let metrics = Arc::new(MetricsCollector::new());
    let reporter: Arc<dyn RiskReporter> = Arc::new(LogRiskReporter::new(metrics.clone()));

    info!("Upstream backend: {}:{}", args.upstream_host, args.upstream_port);

    let guard_proxy = XssGuardProxy::new(
        (args.upstream_host.clone(), args.upstream_port),
        store,
        reporter,
        metrics,
    );

    let mut server = match Server::new(Some(Opt::default())) {
        Ok(server) => server,
        Err(e) => {
            error!("Failed to create server: {}", e);
            std::process::exit(1);
        }
    };
    server.bootstrap();

    let mut proxy_service = http_proxy_service(&server.configuration, guard_proxy);
    let listen_address = format!("{}:{}", args.listen_addr, args.listen_port);
    proxy_service.add_tcp(&listen_address);
    server.add_service(proxy_service);

    // Built-in Prometheus metrics service
    let metrics_address = format!("{}:{}", args.listen_addr, args.metrics_port);
    let mut prometheus_service_http =
        pingora::services::listening::Service::prometheus_http_service();
    prometheus_service_http.add_tcp(&metrics_address);
    server.add_service(prometheus_service_http);

    info!("Proxy:    http://{}", listen_address);
    info!("Metrics:  http://{}/metrics", metrics_address);
    info!("Upstream: {}:{}", args.upstream_host, args.upstream_port);
    if watcher.is_enabled() {
        info!("Hot reload: watching {}", watcher.config_path());
    } else {
        info!("Hot reload: disabled");
    }

    server.run_forever();
}
