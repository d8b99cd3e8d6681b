// CLI command definitions

use super::eks::{KubeconfigCommand, PlanCommand, StatusCommand};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "eks-provision",
    version,
    about = "Provisioning orchestrator for EKS clusters",
    long_about = "Resolves an EKS cluster specification, declares every resource it needs and reports the provisioned cluster"
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Resolve a cluster specification and provision it against the dry-run engine
    Plan(PlanCommand),

    /// Render the kubeconfig for a cluster specification
    Kubeconfig(KubeconfigCommand),

    /// Show nodes and storage classes of a running cluster
    Status(StatusCommand),
}
