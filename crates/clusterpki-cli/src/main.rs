//! clusterpki CLI: provisions the certificate authority and node certificates
//! for a cluster plan.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use clusterpki_certgen::{build_node_request, compute_baseline_sans, CaRequest, Signer};
use clusterpki_provision::{setup, FileStore, LocalPki, Pki, CA_IDENTITY};

#[derive(Parser)]
#[command(
    name = "clusterpki",
    about = "Generate the TLS certificates of a cluster",
    version,
    propagate_version = true
)]
struct Cli {
    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the cluster CA and one certificate per node.
    Provision {
        /// Cluster plan (TOML).
        #[arg(short, long)]
        plan: PathBuf,

        /// Destination directory, overriding the configured one.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the SANs each node certificate would carry.
    Sans {
        /// Cluster plan (TOML).
        #[arg(short, long)]
        plan: PathBuf,
    },

    /// Generate only a CA key pair and certificate.
    GenerateCa {
        /// CA signing-request template (JSON), overriding the configured one.
        #[arg(short, long)]
        template: Option<PathBuf>,

        /// Common name used when no template is given.
        #[arg(long, default_value = "clusterpki")]
        name: String,

        /// Output directory for the CA files.
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = setup::load_config(cli.config.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log.level)),
        )
        .init();

    match cli.command {
        Commands::Provision { plan, output } => {
            let topology = setup::load_topology(&plan)?;
            let mut settings = config.pki;
            if let Some(output) = output {
                settings.destination_dir = output;
            }

            tracing::info!(
                cluster = %topology.cluster_name,
                dir = %settings.destination_dir.display(),
                "provisioning cluster certificates"
            );
            let report = LocalPki::from_settings(&settings)?.generate_cluster_certs(&topology)?;

            println!("CA certificate: {}", report.ca.cert_path.display());
            println!("CA fingerprint: {}", report.ca.fingerprint);
            for node in &report.nodes {
                println!("{}: {}", node.identity, node.cert_path.display());
            }
        }
        Commands::Sans { plan } => {
            let topology = setup::load_topology(&plan)?;
            let baseline = compute_baseline_sans(&topology.service_cidr).with_context(|| {
                format!("invalid service CIDR {:?}", topology.service_cidr)
            })?;

            for node in topology.node_groups.select(&config.pki.roles) {
                let request = build_node_request(
                    node,
                    &baseline,
                    &topology.cluster_name,
                    &topology.certificate_location,
                );
                println!("{}: {}", node.host, request.hosts.join(", "));
            }
        }
        Commands::GenerateCa {
            template,
            name,
            output,
        } => {
            let request = match template.or(config.pki.ca_csr) {
                Some(path) => CaRequest::from_file(&path)
                    .with_context(|| format!("failed to read CA template {}", path.display()))?,
                None => CaRequest::new(name),
            };

            tracing::info!(cn = %request.common_name, output = %output.display(), "generating CA");
            let material = clusterpki_certgen::LocalSigner.build_ca(&request)?;
            let files = FileStore::new(output).persist(
                CA_IDENTITY,
                material.key_pem().as_bytes(),
                material.cert_pem().as_bytes(),
            )?;

            println!("Certificate: {}", files.cert_path.display());
            println!("Private key: {}", files.key_path.display());
            println!("Fingerprint: {}", material.fingerprint());
        }
    }

    Ok(())
}
