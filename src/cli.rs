use crate::config::Config;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "kubescout")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Periodically inventories Kubernetes nodes and reports cluster snapshots", long_about = None)]
pub struct Cli {
    #[arg(short, long, help = "Path to a YAML config file")]
    pub config: Option<PathBuf>,

    #[arg(short, long, help = "Discovery interval in seconds")]
    pub interval: Option<u64>,

    #[arg(long, help = "Cluster name to report instead of discovering one")]
    pub cluster_name: Option<String>,

    #[arg(long, help = "Collector endpoint URL for discovery results")]
    pub endpoint: Option<String>,

    #[arg(long, help = "Run a single discovery cycle and exit")]
    pub once: bool,

    #[arg(short, long, help = "Enable verbose logging")]
    pub verbose: bool,
}

impl Cli {
    /// Flags take precedence over every other configuration source.
    pub fn apply(&self, config: &mut Config) {
        if let Some(interval) = self.interval.filter(|i| *i > 0) {
            config.discovery_interval = interval;
        }
        if let Some(name) = &self.cluster_name {
            config.cluster_name = name.clone();
        }
        if let Some(endpoint) = &self.endpoint {
            config.collector.api_endpoint = endpoint.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::parse_from([
            "kubescout",
            "--interval",
            "5",
            "--cluster-name",
            "prod-east",
            "--endpoint",
            "http://collector:8080/discovery",
            "--once",
        ]);
        let mut config = Config::default();

        cli.apply(&mut config);

        assert!(cli.once);
        assert_eq!(config.discovery_interval, 5);
        assert_eq!(config.cluster_name, "prod-east");
        assert_eq!(config.collector.api_endpoint, "http://collector:8080/discovery");
    }

    #[test]
    fn test_absent_flags_leave_config_alone() {
        let cli = Cli::parse_from(["kubescout", "--interval", "0"]);
        let mut config = Config {
            cluster_name: "from-file".to_string(),
            ..Default::default()
        };

        cli.apply(&mut config);

        assert_eq!(config.discovery_interval, 30);
        assert_eq!(config.cluster_name, "from-file");
        assert!(config.collector.api_endpoint.is_empty());
    }
}
