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

use super::cluster::{ClusterArgs, KubeconfigOptions};
use super::node_group::{FargateArgs, FargateProfileArgs, FargateSelector, NodeGroupArgs};
use super::storage::StorageClassesArgs;
use super::vpc_cni::VpcCniOptions;
use crate::shared::error::{ProvisionError, Result};
use std::collections::HashMap;
use std::str::FromStr;

/// Parse `-D key=value` properties into a map.
pub fn parse_properties(properties: &[String]) -> Result<HashMap<String, String>> {
    let mut map = HashMap::new();

    for property in properties {
        let parts: Vec<&str> = property.splitn(2, '=').collect();
        if parts.len() != 2 {
            return Err(ProvisionError::config_error(format!(
                "Invalid property format: '{}'. Expected 'key=value'",
                property
            )));
        }

        let key = parts[0].trim();
        let value = parts[1].trim();

        if key.is_empty() {
            return Err(ProvisionError::config_error(format!(
                "Empty key in property: '{}'",
                property
            )));
        }

        map.insert(key.to_string(), value.to_string());
    }

    Ok(map)
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value.parse::<T>().map_err(|_| {
        ProvisionError::config_error(format!("Invalid value '{}' for property {}", value, key))
    })
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn node_group(args: &mut ClusterArgs) -> &mut NodeGroupArgs {
    args.node_group.get_or_insert_with(NodeGroupArgs::default)
}

fn vpc_cni(args: &mut ClusterArgs) -> &mut VpcCniOptions {
    args.vpc_cni.get_or_insert_with(VpcCniOptions::default)
}

fn kubeconfig(args: &mut ClusterArgs) -> &mut KubeconfigOptions {
    args.provider_credential_opts
        .get_or_insert_with(KubeconfigOptions::default)
}

/// Apply dynamic properties on top of file-based arguments.
///
/// Unknown keys are rejected so typos do not silently fall back to defaults.
pub fn apply_to_cluster_args(
    properties: &HashMap<String, String>,
    args: &mut ClusterArgs,
) -> Result<()> {
    let mut keys: Vec<&String> = properties.keys().collect();
    keys.sort();

    for key in keys {
        let value = properties[key].as_str();
        let key = key.as_str();

        if let Some(tag) = key.strip_prefix("tags.") {
            args.tags
                .get_or_insert_with(Default::default)
                .insert(tag.to_string(), value.to_string());
            continue;
        }

        match key {
            "cluster.name" => args.name = Some(value.to_string()),
            "cluster.version" => args.version = Some(value.to_string()),
            "cluster.region" => args.region = Some(value.to_string()),
            "cluster.authentication-mode" => args.authentication_mode = Some(value.to_string()),
            "cluster.oidc-provider" => args.create_oidc_provider = Some(parse_value(key, value)?),
            "cluster.endpoint-public-access" => {
                args.endpoint_public_access = Some(parse_value(key, value)?)
            }
            "cluster.endpoint-private-access" => {
                args.endpoint_private_access = Some(parse_value(key, value)?)
            }
            "cluster.log-types" => args.enabled_cluster_log_types = Some(parse_list(value)),
            "cluster.encryption-key-arn" => {
                args.encryption_config_key_arn = Some(value.to_string())
            }
            "cluster.ip-family" => args.ip_family = Some(value.to_string()),
            "cluster.service-ip-range" => {
                args.kubernetes_service_ip_address_range = Some(value.to_string())
            }

            "vpc.id" => args.vpc_id = Some(value.to_string()),
            "vpc.subnet-ids" => args.subnet_ids = Some(parse_list(value)),
            "vpc.public-subnet-ids" => args.public_subnet_ids = Some(parse_list(value)),
            "vpc.private-subnet-ids" => args.private_subnet_ids = Some(parse_list(value)),

            "security-groups.skip-default" => {
                args.skip_default_security_groups = Some(parse_value(key, value)?)
            }
            "security-groups.cluster" => args.cluster_security_group_id = Some(value.to_string()),
            "security-groups.node" => args.node_security_group_id = Some(value.to_string()),

            "iam.service-role-arn" => args.service_role_arn = Some(value.to_string()),
            "iam.instance-role-arns" => args.instance_role_arns = Some(parse_list(value)),

            "node-group.skip-default" => {
                args.skip_default_node_group = Some(parse_value(key, value)?)
            }
            "node-group.instance-type" => {
                node_group(args).instance_type = Some(value.to_string())
            }
            "node-group.desired-capacity" => {
                node_group(args).desired_capacity = Some(parse_value(key, value)?)
            }
            "node-group.min-size" => node_group(args).min_size = Some(parse_value(key, value)?),
            "node-group.max-size" => node_group(args).max_size = Some(parse_value(key, value)?),
            "node-group.ami-id" => node_group(args).ami_id = Some(value.to_string()),
            "node-group.kubelet-extra-args" => {
                node_group(args).kubelet_extra_args = Some(value.to_string())
            }

            "fargate.enabled" => args.fargate = Some(FargateArgs::Enabled(parse_value(key, value)?)),
            "fargate.namespaces" => {
                let selectors = parse_list(value)
                    .into_iter()
                    .map(FargateSelector::namespace)
                    .collect();
                args.fargate = Some(FargateArgs::Profile(FargateProfileArgs {
                    selectors: Some(selectors),
                    ..Default::default()
                }));
            }

            "vpc-cni.use-default" => args.use_default_vpc_cni = Some(parse_value(key, value)?),
            "vpc-cni.eni-mtu" => vpc_cni(args).eni_mtu = Some(parse_value(key, value)?),
            "vpc-cni.veth-prefix" => vpc_cni(args).veth_prefix = Some(value.to_string()),
            "vpc-cni.enable-ipv6" => vpc_cni(args).enable_ipv6 = Some(parse_value(key, value)?),
            "vpc-cni.enable-prefix-delegation" => {
                vpc_cni(args).enable_prefix_delegation = Some(parse_value(key, value)?)
            }
            "vpc-cni.warm-eni-target" => {
                vpc_cni(args).warm_eni_target = Some(parse_value(key, value)?)
            }
            "vpc-cni.warm-ip-target" => {
                vpc_cni(args).warm_ip_target = Some(parse_value(key, value)?)
            }
            "vpc-cni.external-snat" => vpc_cni(args).external_snat = Some(parse_value(key, value)?),
            "vpc-cni.log-level" => vpc_cni(args).log_level = Some(value.to_string()),

            "storage.class" => {
                let volume_type = serde_yaml::from_str(value)?;
                args.storage_classes = Some(StorageClassesArgs::VolumeType(volume_type));
            }

            "kubeconfig.role-arn" => kubeconfig(args).role_arn = Some(value.to_string()),
            "kubeconfig.profile" => kubeconfig(args).profile_name = Some(value.to_string()),

            other => {
                return Err(ProvisionError::config_error(format!(
                    "Unknown property: {}",
                    other
                )))
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::storage::EbsVolumeType;

    fn props(pairs: &[&str]) -> HashMap<String, String> {
        let owned: Vec<String> = pairs.iter().map(|p| p.to_string()).collect();
        parse_properties(&owned).unwrap()
    }

    #[test]
    fn test_parse_properties() {
        let map = props(&["cluster.name=demo", "tags.team = infra=core"]);
        assert_eq!(map["cluster.name"], "demo");
        assert_eq!(map["tags.team"], "infra=core");

        assert!(parse_properties(&["novalue".to_string()]).is_err());
        assert!(parse_properties(&["=value".to_string()]).is_err());
    }

    #[test]
    fn test_apply_overrides() {
        let mut args = ClusterArgs::default();
        let map = props(&[
            "cluster.name=demo",
            "cluster.log-types=api,audit",
            "cluster.service-ip-range=10.100.0.0/16",
            "vpc.id=vpc-1",
            "vpc.private-subnet-ids=subnet-a, subnet-b",
            "node-group.desired-capacity=4",
            "vpc-cni.eni-mtu=1500",
            "storage.class=gp3",
            "tags.team=infra",
            "fargate.namespaces=default,apps",
        ]);
        apply_to_cluster_args(&map, &mut args).unwrap();

        assert_eq!(args.name.as_deref(), Some("demo"));
        assert_eq!(
            args.enabled_cluster_log_types,
            Some(vec!["api".to_string(), "audit".to_string()])
        );
        assert_eq!(
            args.kubernetes_service_ip_address_range.as_deref(),
            Some("10.100.0.0/16")
        );
        assert_eq!(
            args.private_subnet_ids,
            Some(vec!["subnet-a".to_string(), "subnet-b".to_string()])
        );
        assert_eq!(args.node_group.unwrap().desired_capacity, Some(4));
        assert_eq!(args.vpc_cni.unwrap().eni_mtu, Some(1500));
        assert_eq!(
            args.storage_classes,
            Some(StorageClassesArgs::VolumeType(EbsVolumeType::Gp3))
        );
        assert_eq!(args.tags.unwrap()["team"], "infra");
        match args.fargate {
            Some(FargateArgs::Profile(profile)) => {
                assert_eq!(profile.selectors.unwrap().len(), 2)
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_rejects_bad_values_and_unknown_keys() {
        let mut args = ClusterArgs::default();
        assert!(apply_to_cluster_args(&props(&["node-group.min-size=two"]), &mut args).is_err());
        assert!(apply_to_cluster_args(&props(&["cluster.nmae=typo"]), &mut args).is_err());
    }
}
