//! Table rendering for CLI output

use super::{ColorTheme, Readiness, StatusIcon};
use crate::domain::cluster::CoreData;
use crate::infrastructure::engine::{DeclarationGraph, ResourceKind};
use crate::infrastructure::kubernetes::NodeSummary;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, ContentArrangement, Table};

/// Table renderer for formatted output
pub struct TableRenderer {
    theme: ColorTheme,
}

impl Default for TableRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TableRenderer {
    /// Create a new table renderer with default theme
    pub fn new() -> Self {
        Self {
            theme: ColorTheme::default(),
        }
    }

    /// Render the outcome of a provisioning run, one row per component
    pub fn render_plan_summary(&self, data: &CoreData, graph: &DeclarationGraph) -> String {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("COMPONENT").set_alignment(CellAlignment::Left),
                Cell::new("DETAILS").set_alignment(CellAlignment::Left),
                Cell::new("STATUS").set_alignment(CellAlignment::Center),
            ]);

        self.add_component(
            &mut table,
            "Control plane",
            Some(format!(
                "{} (v{}, {})\n{}",
                data.cluster.name, data.cluster.version, data.authentication_mode, data.endpoint
            )),
        );

        let groups = &data.security_groups;
        let mut sg_text = format!("cluster: {}", groups.cluster_security_group_id);
        if let Some(node_sg) = &groups.node_security_group_id {
            sg_text.push_str(&format!("\nnode: {}", node_sg));
        }
        if !groups.cluster_ingress_rule_id.is_empty() {
            sg_text.push_str(&format!("\ningress: {}", groups.cluster_ingress_rule_id));
        }
        self.add_component(&mut table, "Security groups", Some(sg_text));

        let mut roles_text = format!("service: {}", data.service_role_arn);
        for arn in &data.instance_role_arns {
            roles_text.push_str(&format!("\ninstance: {}", arn));
        }
        if let Some(arn) = &data.fargate_role_arn {
            roles_text.push_str(&format!("\npod execution: {}", arn));
        }
        self.add_component(&mut table, "IAM roles", Some(roles_text));

        self.add_component(
            &mut table,
            "Node group",
            data.default_node_group.as_ref().map(|group| {
                format!(
                    "{} x {} (min {}, max {})\n{}",
                    group.desired_capacity,
                    group.instance_type,
                    group.min_size,
                    group.max_size,
                    group.auto_scaling_group_name
                )
            }),
        );
        self.add_component(
            &mut table,
            "Fargate profile",
            data.fargate_profile.as_ref().map(|profile| {
                let namespaces: Vec<&str> = profile
                    .selectors
                    .iter()
                    .map(|s| s.namespace.as_str())
                    .collect();
                format!("{} [{}]", profile.name, namespaces.join(", "))
            }),
        );
        self.add_component(&mut table, "aws-auth", data.aws_auth.clone());
        self.add_component(
            &mut table,
            "Access entries",
            data.access_entries.as_ref().map(|entries| {
                entries
                    .iter()
                    .map(|e| format!("{} ({})", e.principal_arn, e.entry_type.as_str()))
                    .collect::<Vec<_>>()
                    .join("\n")
            }),
        );
        self.add_component(
            &mut table,
            "VPC CNI",
            data.vpc_cni.as_ref().map(|cni| {
                let mut text = format!("{} {} ({} env)", cni.addon_name, cni.addon_version, cni.env.len());
                if cni.daemonset_patched {
                    text.push_str("\naws-node patched");
                }
                text
            }),
        );
        self.add_component(
            &mut table,
            "Storage classes",
            (!data.storage_classes.is_empty()).then(|| {
                data.storage_classes
                    .values()
                    .map(|class| {
                        let marker = if class.default { " (default)" } else { "" };
                        format!("{} [{}]{}", class.name, class.volume_type, marker)
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            }),
        );
        self.add_component(
            &mut table,
            "OIDC provider",
            data.oidc_provider.as_ref().map(|oidc| oidc.arn.clone()),
        );

        let mut output = String::new();
        output.push_str(&format!(
            "╭─ EKS Cluster {} {} ─╮\n",
            data.cluster.name,
            format!("[{} resources]", graph.len()).bright_black()
        ));
        output.push_str(&table.to_string());
        output.push('\n');
        output.push_str(&format!(
            "Legend: {} Provisioned  {} Not requested\n",
            StatusIcon::SUCCESS.green(),
            StatusIcon::SKIPPED.bright_black()
        ));
        output
    }

    fn add_component(&self, table: &mut Table, name: &str, details: Option<String>) {
        let present = details.is_some();
        let (icon, color) = if present {
            (StatusIcon::SUCCESS, self.theme.success)
        } else {
            (StatusIcon::SKIPPED, self.theme.muted)
        };
        table.add_row(vec![
            Cell::new(name).fg(self.theme.presence_color(present)),
            Cell::new(details.unwrap_or_default()),
            Cell::new(icon).fg(color).set_alignment(CellAlignment::Center),
        ]);
    }

    /// Render declared resources grouped by kind
    pub fn render_resource_counts(&self, graph: &DeclarationGraph) -> String {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("RESOURCE TYPE").set_alignment(CellAlignment::Left),
                Cell::new("COUNT").set_alignment(CellAlignment::Right),
            ]);

        for kind in ResourceKind::all() {
            let count = graph.count(kind);
            if count == 0 {
                continue;
            }
            table.add_row(vec![
                Cell::new(kind.as_str()),
                Cell::new(count).set_alignment(CellAlignment::Right),
            ]);
        }
        table.to_string()
    }

    /// Render live node and storage status of a running cluster
    pub fn render_node_status(
        &self,
        context: &str,
        nodes: &[NodeSummary],
        storage_classes: &[String],
        has_aws_auth: bool,
    ) -> String {
        let ready = nodes.iter().filter(|n| n.ready).count();
        let readiness = Readiness::of(ready, nodes.len());

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("NODE").set_alignment(CellAlignment::Left),
                Cell::new("INSTANCE TYPE").set_alignment(CellAlignment::Left),
                Cell::new("KUBELET").set_alignment(CellAlignment::Left),
                Cell::new("STATUS").set_alignment(CellAlignment::Center),
            ]);

        for node in nodes {
            let state = if node.ready {
                Readiness::Ready
            } else {
                Readiness::NotReady
            };
            table.add_row(vec![
                Cell::new(&node.name),
                Cell::new(node.instance_type.as_deref().unwrap_or("-")),
                Cell::new(node.kubelet_version.as_deref().unwrap_or("-")),
                Cell::new(format!("{} {}", state.icon(), state.text()))
                    .fg(self.theme.readiness_color(state)),
            ]);
        }

        let mut output = String::new();
        output.push_str(&format!(
            "📊 Cluster status ({})\n",
            context.bright_black()
        ));
        output.push_str(&format!(
            "Nodes: {} {}/{} {}\n",
            readiness.icon(),
            ready,
            nodes.len(),
            readiness.text()
        ));
        if nodes.is_empty() {
            output.push_str("No nodes registered\n");
        } else {
            output.push_str(&table.to_string());
            output.push('\n');
        }

        let classes = if storage_classes.is_empty() {
            "none".to_string()
        } else {
            storage_classes.join(", ")
        };
        output.push_str(&format!("Storage classes: {}\n", classes));
        output.push_str(&format!(
            "aws-auth ConfigMap: {}\n",
            if has_aws_auth { "present" } else { "absent" }
        ));

        let summary = match readiness {
            Readiness::Ready => "cluster healthy".green(),
            Readiness::Degraded => "cluster degraded".yellow(),
            Readiness::NotReady => "no ready nodes".red(),
            Readiness::Unknown => "cluster state unknown".bright_black(),
        };
        output.push_str(&format!("{}\n", summary));
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(name: &str, ready: bool) -> NodeSummary {
        NodeSummary {
            name: name.to_string(),
            ready,
            instance_type: Some("t2.medium".to_string()),
            kubelet_version: Some("v1.30.2-eks".to_string()),
        }
    }

    #[test]
    fn test_render_node_status() {
        let renderer = TableRenderer::new();
        let output = renderer.render_node_status(
            "aws",
            &[node("ip-10-0-1-1", true), node("ip-10-0-1-2", false)],
            &["gp2".to_string()],
            true,
        );
        assert!(output.contains("ip-10-0-1-1"));
        assert!(output.contains("1/2"));
        assert!(output.contains("Degraded"));
        assert!(output.contains("Storage classes: gp2"));
        assert!(output.contains("present"));
    }

    #[test]
    fn test_render_empty_cluster() {
        let renderer = TableRenderer::new();
        let output = renderer.render_node_status("aws", &[], &[], false);
        assert!(output.contains("No nodes registered"));
        assert!(output.contains("Storage classes: none"));
        assert!(output.contains("absent"));
    }

    #[tokio::test]
    async fn test_render_plan_summary() {
        use crate::domain::cluster::test_support::spec;
        use crate::domain::cluster::{ClusterOrchestrator, ResultAssembler};

        let plan = ClusterOrchestrator::dry_run().declare(&spec()).unwrap();
        let data = ResultAssembler::assemble(&plan).await.unwrap();
        let renderer = TableRenderer::new();

        let summary = renderer.render_plan_summary(&data, plan.graph());
        assert!(summary.contains("EKS Cluster demo"));
        assert!(summary.contains("2 x t2.medium"));
        assert!(summary.contains("kube-system/aws-auth"));

        let counts = renderer.render_resource_counts(plan.graph());
        assert!(counts.contains("aws:eks/cluster:Cluster"));
    }
}
