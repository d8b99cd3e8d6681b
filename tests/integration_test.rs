// Copyright 2025 JiangLong.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#[cfg(test)]
mod tests {
    use eks_provision::domain::config::{FargateArgs, FargateProfileArgs, FargateSelector};
    use eks_provision::domain::config::{NodeGroupArgs, StorageClassesArgs};
    use eks_provision::domain::config::EbsVolumeType;
    use eks_provision::*;
    use std::io::Write;
    use std::sync::Arc;

    fn create_test_args() -> ClusterArgs {
        ClusterArgs {
            name: Some("demo".to_string()),
            vpc_id: Some("vpc-0a1b2c".to_string()),
            subnet_ids: Some(vec!["subnet-a".to_string(), "subnet-b".to_string()]),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_default_cluster() {
        let data = ClusterOrchestrator::dry_run()
            .deploy(create_test_args())
            .await
            .unwrap();

        let group = data.default_node_group.as_ref().unwrap();
        assert_eq!(group.desired_capacity, 2);
        assert_eq!(group.min_size, 2);
        assert_eq!(group.max_size, 2);
        assert_eq!(group.instance_type, "t2.medium");

        assert_eq!(data.authentication_mode, AuthenticationMode::ConfigMap);
        assert!(data.aws_auth.is_some());
        assert!(data.access_entries.is_none());
        assert!(data.fargate_profile.is_none());
        assert!(data.storage_classes.is_empty());
        assert!(data.security_groups.node_security_group_id.is_some());
        assert!(data.kubeconfig_json.contains(&data.endpoint));
    }

    #[tokio::test]
    async fn test_fargate_only_cluster() {
        let args = ClusterArgs {
            skip_default_node_group: Some(true),
            fargate: Some(FargateArgs::Profile(FargateProfileArgs {
                selectors: Some(vec![FargateSelector::namespace("default")]),
                ..Default::default()
            })),
            ..create_test_args()
        };
        let data = ClusterOrchestrator::dry_run().deploy(args).await.unwrap();

        assert!(data.default_node_group.is_none());
        let profile = data.fargate_profile.unwrap();
        assert_eq!(profile.selectors.len(), 1);
        assert_eq!(profile.selectors[0].namespace, "default");
        assert_eq!(profile.subnet_ids, vec!["subnet-a", "subnet-b"]);
        assert_eq!(data.fargate_role_arn.as_deref(), Some(profile.pod_execution_role_arn.as_str()));
    }

    #[tokio::test]
    async fn test_skipped_security_groups_must_be_supplied() {
        let engine = Arc::new(DryRunEngine::new());
        let orchestrator = ClusterOrchestrator::new(engine.clone());
        let args = ClusterArgs {
            skip_default_security_groups: Some(true),
            ..create_test_args()
        };

        let err = orchestrator.deploy(args).await.unwrap_err();
        match err.as_validation() {
            Some(ValidationError::MissingSecurityGroups { missing }) => {
                assert_eq!(missing, &vec!["clusterSecurityGroupId", "nodeSecurityGroupId"]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(engine.requests().await.is_empty());
    }

    #[tokio::test]
    async fn test_supplied_security_groups_are_used() {
        let args = ClusterArgs {
            skip_default_security_groups: Some(true),
            cluster_security_group_id: Some("sg-cluster".to_string()),
            node_security_group_id: Some("sg-node".to_string()),
            ..create_test_args()
        };
        let orchestrator = ClusterOrchestrator::dry_run();
        let spec = ConfigResolver::resolve(args).unwrap();
        let plan = orchestrator.declare(&spec).unwrap();
        assert_eq!(plan.graph().count(ResourceKind::SecurityGroup), 0);

        let data = ResultAssembler::assemble(&plan).await.unwrap();
        assert_eq!(data.security_groups.cluster_security_group_id, "sg-cluster");
        assert_eq!(data.security_groups.node_security_group_id.as_deref(), Some("sg-node"));
        assert_eq!(data.default_node_group.unwrap().node_security_group_id, "sg-node");
    }

    #[tokio::test]
    async fn test_supplied_node_security_group_gets_rules() {
        let args = ClusterArgs {
            node_security_group_id: Some("sg-mine".to_string()),
            ..create_test_args()
        };
        let engine = Arc::new(DryRunEngine::new());
        let data = ClusterOrchestrator::new(engine.clone())
            .deploy(args)
            .await
            .unwrap();

        assert_eq!(data.security_groups.node_security_group_id.as_deref(), Some("sg-mine"));
        assert_eq!(data.default_node_group.unwrap().node_security_group_id, "sg-mine");

        let requests = engine.requests().await;
        let groups = requests
            .iter()
            .filter(|r| r.kind == ResourceKind::SecurityGroup)
            .count();
        assert_eq!(groups, 1);
        let node_rule = engine.request("demo-eksNodeIngressRule").await.unwrap();
        assert_eq!(node_rule.inputs["securityGroupId"], "sg-mine");
    }

    #[tokio::test]
    async fn test_mixed_mode_declares_config_map_and_access_entries() {
        let yaml = r#"
name: demo
vpcId: vpc-0a1b2c
subnetIds: [subnet-a]
authenticationMode: API_AND_CONFIG_MAP
roleMappings:
  - roleArn: arn:aws:iam::123456789012:role/ops
    username: ops
    groups: [system:masters]
accessEntries:
  aws-auth:
    principalArn: arn:aws:iam::123456789012:role/admin
"#;
        let args: ClusterArgs = serde_yaml::from_str(yaml).unwrap();
        let engine = Arc::new(DryRunEngine::new());
        let data = ClusterOrchestrator::new(engine.clone())
            .deploy(args)
            .await
            .unwrap();

        assert!(data.aws_auth.is_some());
        let entries = data.access_entries.unwrap();
        assert!(entries.iter().any(|e| e.name == "demo-accessEntry-aws-auth"));

        let requests = engine.requests().await;
        assert!(requests.iter().any(|r| r.kind == ResourceKind::ConfigMap));
        assert!(requests.iter().any(|r| r.kind == ResourceKind::AccessEntry));
    }

    #[tokio::test]
    async fn test_cluster_options_reach_control_plane() {
        let yaml = r#"
name: demo
vpcId: vpc-0a1b2c
subnetIds: [subnet-a]
enabledClusterLogTypes: [audit, api]
encryptionConfigKeyArn: arn:aws:kms:us-west-2:123456789012:key/1234abcd
kubernetesServiceIpAddressRange: 10.100.0.0/16
"#;
        let args: ClusterArgs = serde_yaml::from_str(yaml).unwrap();
        let engine = Arc::new(DryRunEngine::new());
        ClusterOrchestrator::new(engine.clone())
            .deploy(args)
            .await
            .unwrap();

        let inputs = engine.request("demo-eksCluster").await.unwrap().inputs;
        assert_eq!(inputs["enabledClusterLogTypes"], serde_json::json!(["api", "audit"]));
        assert_eq!(inputs["kubernetesNetworkConfig"]["serviceIpv4Cidr"], "10.100.0.0/16");
        assert!(inputs["encryptionConfig"]["provider"]["keyArn"]
            .as_str()
            .unwrap()
            .contains(":kms:"));
    }

    #[tokio::test]
    async fn test_api_mode_uses_access_entries() {
        let yaml = r#"
name: demo
vpcId: vpc-0a1b2c
subnetIds: [subnet-a]
authenticationMode: API
accessEntries:
  admin:
    principalArn: arn:aws:iam::123456789012:role/admin
    accessPolicies:
      cluster-admin:
        policyArn: arn:aws:eks::aws:cluster-access-policy/AmazonEKSClusterAdminPolicy
        accessScope:
          type: cluster
"#;
        let args: ClusterArgs = serde_yaml::from_str(yaml).unwrap();
        let engine = Arc::new(DryRunEngine::new());
        let data = ClusterOrchestrator::new(engine.clone())
            .deploy(args)
            .await
            .unwrap();

        assert!(data.aws_auth.is_none());
        let entries = data.access_entries.unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["demo-nodeAccessEntry0", "demo-accessEntry-admin"]);
        assert_eq!(entries[1].access_policies.len(), 1);

        let requests = engine.requests().await;
        assert!(requests.iter().all(|r| r.kind != ResourceKind::ConfigMap));
    }

    #[tokio::test]
    async fn test_role_mappings_rejected_in_api_mode() {
        let yaml = r#"
vpcId: vpc-0a1b2c
subnetIds: [subnet-a]
authenticationMode: API
roleMappings:
  - roleArn: arn:aws:iam::123456789012:role/ops
    username: ops
    groups: [system:masters]
"#;
        let args: ClusterArgs = serde_yaml::from_str(yaml).unwrap();
        let err = ClusterOrchestrator::dry_run().deploy(args).await.unwrap_err();
        assert_eq!(err.as_validation().unwrap().field(), "roleMappings");
    }

    #[tokio::test]
    async fn test_storage_class_shorthand() {
        let args = ClusterArgs {
            storage_classes: Some(StorageClassesArgs::VolumeType(EbsVolumeType::Gp3)),
            ..create_test_args()
        };
        let data = ClusterOrchestrator::dry_run().deploy(args).await.unwrap();

        let class = data.default_storage_class().unwrap();
        assert_eq!(class.name, "gp3");
        assert_eq!(class.volume_type, EbsVolumeType::Gp3);
        assert_eq!(data.storage_classes.len(), 1);
    }

    #[tokio::test]
    async fn test_provider_failure_names_origin() {
        let engine = Arc::new(DryRunEngine::new().fail_on("demo-eksCluster", "UnsupportedAvailabilityZone"));
        let err = ClusterOrchestrator::new(engine)
            .deploy(create_test_args())
            .await
            .unwrap_err();

        let resolve = err.as_resolve().unwrap();
        assert_eq!(resolve.origin(), "demo-eksCluster");
        assert_eq!(resolve.message(), "UnsupportedAvailabilityZone");
    }

    #[tokio::test]
    async fn test_invalid_sizing_makes_no_requests() {
        let engine = Arc::new(DryRunEngine::new());
        let args = ClusterArgs {
            node_group: Some(NodeGroupArgs {
                desired_capacity: Some(5),
                max_size: Some(3),
                ..Default::default()
            }),
            ..create_test_args()
        };
        let err = ClusterOrchestrator::new(engine.clone())
            .deploy(args)
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_validation(),
            Some(ValidationError::InvalidNodeGroupSizing { .. })
        ));
        assert!(engine.requests().await.is_empty());
    }

    #[test]
    fn test_declaration_graph_is_repeatable() {
        let spec = ConfigResolver::resolve(create_test_args()).unwrap();
        let orchestrator = ClusterOrchestrator::dry_run();
        let first = orchestrator.declare(&spec).unwrap();
        let second = orchestrator.declare(&spec).unwrap();
        assert_eq!(first.graph(), second.graph());
        assert!(first
            .graph()
            .depends_transitively("demo-nodeGroup", "demo-eksCluster"));
    }

    #[tokio::test]
    async fn test_toml_specification_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
name = "toml-demo"
vpcId = "vpc-0a1b2c"
privateSubnetIds = ["subnet-a", "subnet-b"]
useDefaultVpcCni = true

[nodeGroup]
instanceType = "m5.large"
desiredCapacity = 3
"#
        )
        .unwrap();

        let args = ClusterArgs::from_file(file.path()).unwrap();
        let data = ClusterOrchestrator::dry_run().deploy(args).await.unwrap();
        assert_eq!(data.cluster.name, "toml-demo");
        assert!(data.vpc_cni.is_none());
        let group = data.default_node_group.unwrap();
        assert_eq!(group.instance_type, "m5.large");
        assert_eq!((group.min_size, group.desired_capacity, group.max_size), (2, 3, 3));
    }
}
