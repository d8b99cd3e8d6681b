//! EKS provisioning commands

use crate::cli::display::TableRenderer;
use crate::domain::cluster::{ClusterOrchestrator, ConfigResolver, CoreData, ResultAssembler};
use crate::domain::config::{apply_to_cluster_args, parse_properties, ClusterArgs, ClusterSpec};
use crate::infrastructure::engine::{DryRunEngine, RetryingEngine};
use crate::infrastructure::kubernetes::{ClusterStatusClient, EksKubeClient, NodeSummary};
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Options shared by every command that reads a cluster specification.
#[derive(Parser, Debug, Clone)]
pub struct SpecArgs {
    /// Path to the cluster specification (YAML, or TOML when the extension is .toml)
    /// If not provided, the specification is built from -D properties alone
    #[arg(long, short = 'f', value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    /// Dynamic configuration properties overriding the specification file (-D key=value)
    ///
    /// Cluster: cluster.name, cluster.version, cluster.region, cluster.authentication-mode,
    ///          cluster.oidc-provider, cluster.endpoint-public-access, cluster.endpoint-private-access,
    ///          cluster.log-types, cluster.encryption-key-arn, cluster.ip-family, cluster.service-ip-range
    /// Network: vpc.id, vpc.subnet-ids, vpc.public-subnet-ids, vpc.private-subnet-ids (comma-separated)
    /// Security groups: security-groups.skip-default, security-groups.cluster, security-groups.node
    /// IAM: iam.service-role-arn, iam.instance-role-arns
    /// Node group: node-group.skip-default, node-group.instance-type, node-group.desired-capacity,
    ///             node-group.min-size, node-group.max-size, node-group.ami-id, node-group.kubelet-extra-args
    /// Fargate: fargate.enabled, fargate.namespaces
    /// VPC CNI: vpc-cni.use-default, vpc-cni.eni-mtu, vpc-cni.veth-prefix, vpc-cni.enable-ipv6,
    ///          vpc-cni.enable-prefix-delegation, vpc-cni.warm-eni-target, vpc-cni.warm-ip-target,
    ///          vpc-cni.external-snat, vpc-cni.log-level
    /// Storage: storage.class (EBS volume type of the default class)
    /// Kubeconfig: kubeconfig.role-arn, kubeconfig.profile
    /// Tags: tags.KEY
    ///
    /// Example: -Dvpc.id=vpc-123 -Dvpc.private-subnet-ids=subnet-a,subnet-b -Dnode-group.desired-capacity=3
    #[arg(short = 'D', value_name = "KEY=VALUE")]
    pub properties: Vec<String>,
}

impl SpecArgs {
    /// Load the file (if any) and apply -D overrides.
    pub fn load(&self) -> anyhow::Result<ClusterArgs> {
        let mut args = match &self.config_file {
            Some(path) => load_cluster_args(path)?,
            None => {
                println!("ℹ️  No specification file given, using -D properties only");
                ClusterArgs::default()
            }
        };

        if !self.properties.is_empty() {
            let properties = parse_properties(&self.properties)
                .map_err(|e| anyhow::anyhow!("Failed to parse dynamic configs: {}", e))?;
            apply_to_cluster_args(&properties, &mut args)
                .map_err(|e| anyhow::anyhow!("Failed to apply dynamic configs: {}", e))?;
        }
        Ok(args)
    }

    pub fn resolve(&self) -> anyhow::Result<ClusterSpec> {
        let args = self.load()?;
        ConfigResolver::resolve(args)
            .map_err(|e| anyhow::anyhow!("Invalid cluster specification: {}", e))
    }
}

fn load_cluster_args(path: &Path) -> anyhow::Result<ClusterArgs> {
    ClusterArgs::from_file(path)
        .map_err(|e| anyhow::anyhow!("Failed to load {}: {}", path.display(), e))
}

fn dry_run_orchestrator(spec: &ClusterSpec) -> ClusterOrchestrator {
    let mut engine = DryRunEngine::new();
    if let Some(region) = &spec.region {
        engine = engine.with_region(region.clone());
    }
    ClusterOrchestrator::new(Arc::new(RetryingEngine::new(Arc::new(engine))))
}

#[derive(Parser, Debug, Clone)]
pub struct PlanCommand {
    #[command(flatten)]
    pub spec: SpecArgs,

    /// Print the provisioned cluster record as JSON instead of tables
    #[arg(long)]
    pub json: bool,
}

impl PlanCommand {
    pub async fn execute(&self) -> anyhow::Result<()> {
        let spec = self.spec.resolve()?;
        let orchestrator = dry_run_orchestrator(&spec);

        let plan = orchestrator
            .declare(&spec)
            .map_err(|e| anyhow::anyhow!("Failed to declare cluster resources: {}", e))?;
        let data = ResultAssembler::assemble(&plan)
            .await
            .map_err(|e| anyhow::anyhow!("Provisioning failed: {}", e))?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&data)?);
            return Ok(());
        }

        let renderer = TableRenderer::new();
        println!("{}", renderer.render_plan_summary(&data, plan.graph()));
        println!("{}", renderer.render_resource_counts(plan.graph()));
        Ok(())
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum KubeconfigFormat {
    Json,
    Yaml,
}

#[derive(Parser, Debug, Clone)]
pub struct KubeconfigCommand {
    #[command(flatten)]
    pub spec: SpecArgs,

    /// Write the kubeconfig to this file instead of stdout
    #[arg(long, short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "json")]
    pub format: KubeconfigFormat,
}

impl KubeconfigCommand {
    pub async fn execute(&self) -> anyhow::Result<()> {
        let spec = self.spec.resolve()?;
        let data = dry_run_orchestrator(&spec)
            .provision(&spec)
            .await
            .map_err(|e| anyhow::anyhow!("Provisioning failed: {}", e))?;

        let rendered = render_kubeconfig(&data, self.format)?;
        match &self.output {
            Some(path) => {
                std::fs::write(path, &rendered)?;
                println!("✓ Kubeconfig written to {}", path.display());
            }
            None => println!("{}", rendered),
        }
        Ok(())
    }
}

pub fn render_kubeconfig(data: &CoreData, format: KubeconfigFormat) -> anyhow::Result<String> {
    Ok(match format {
        KubeconfigFormat::Json => data.kubeconfig_json.clone(),
        KubeconfigFormat::Yaml => serde_yaml::to_string(&data.kubeconfig)?,
    })
}

#[derive(Parser, Debug)]
pub struct StatusCommand {
    /// Kubeconfig file path
    /// If not specified, uses default kubeconfig resolution (KUBECONFIG env or ~/.kube/config)
    #[arg(long)]
    pub kubeconfig: Option<PathBuf>,

    /// Kubernetes context
    #[arg(long)]
    pub context: Option<String>,
}

impl StatusCommand {
    pub async fn execute(&self) -> anyhow::Result<()> {
        let client = match &self.kubeconfig {
            Some(path) => EksKubeClient::from_kubeconfig_file(path, self.context.clone()).await,
            None => EksKubeClient::try_default().await,
        }
        .map_err(|e| anyhow::anyhow!("Failed to connect to cluster: {}", e))?;

        let nodes: Vec<NodeSummary> = client
            .list_nodes()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to list nodes: {}", e))?
            .iter()
            .map(NodeSummary::from_node)
            .collect();
        let storage_classes: Vec<String> = client
            .list_storage_classes()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to list storage classes: {}", e))?
            .into_iter()
            .filter_map(|class| class.metadata.name)
            .collect();
        let aws_auth = client
            .get_aws_auth()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to read aws-auth: {}", e))?;

        let context = self.context.as_deref().unwrap_or("current context");
        let renderer = TableRenderer::new();
        println!(
            "{}",
            renderer.render_node_status(context, &nodes, &storage_classes, aws_auth.is_some())
        );
        Ok(())
    }
}
