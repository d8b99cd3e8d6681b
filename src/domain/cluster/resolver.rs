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

//! Turns user-facing [`ClusterArgs`] into a validated [`ClusterSpec`].
//!
//! All checks run here, before a single resource is declared. Defaults are
//! filled in only after the raw values have been validated.

use crate::domain::config::node_group::{DEFAULT_CAPACITY, DEFAULT_INSTANCE_TYPE};
use crate::domain::config::{
    AccessEntry, AuthenticationMode, ClusterArgs, ClusterLogType, ClusterSpec, EndpointAccess,
    FargateArgs, FargateSpec, IpFamily, NodeGroupArgs, NodeGroupSpec, RoleMapping, UserMapping, VpcCniOptions,
    DEFAULT_CLUSTER_NAME,
};
use crate::shared::ValidationError;
use regex::Regex;
use std::collections::BTreeMap;
use tracing::debug;

const CLUSTER_NAME_PATTERN: &str = r"^[0-9A-Za-z][A-Za-z0-9_-]*$";
const MAX_CLUSTER_NAME_LEN: usize = 100;
const IAM_ROLE_ARN_PATTERN: &str = r"^arn:aws[a-z-]*:iam::\d{12}:role/.+$";
const IAM_PRINCIPAL_ARN_PATTERN: &str = r"^arn:aws[a-z-]*:(iam|sts)::\d{12}:(role|user|assumed-role)/.+$";
const KMS_KEY_ARN_PATTERN: &str = r"^arn:aws[a-z-]*:kms:[a-z0-9-]+:\d{12}:key/.+$";
const IPV4_CIDR_PATTERN: &str = r"^(\d{1,3})\.(\d{1,3})\.(\d{1,3})\.(\d{1,3})/(\d{1,2})$";

pub const MIN_ENI_MTU: i64 = 576;
pub const MAX_ENI_MTU: i64 = 9001;
const MAX_VETH_PREFIX_LEN: usize = 4;
const MIN_SERVICE_CIDR_PREFIX: u8 = 12;
const MAX_SERVICE_CIDR_PREFIX: u8 = 24;

type Resolved<T> = Result<T, ValidationError>;

pub struct ConfigResolver;

impl ConfigResolver {
    pub fn resolve(args: ClusterArgs) -> Resolved<ClusterSpec> {
        let name = args
            .name
            .clone()
            .unwrap_or_else(|| DEFAULT_CLUSTER_NAME.to_string());
        Self::validate_name(&name)?;

        let (vpc_id, subnet_ids, public_subnet_ids, private_subnet_ids) = Self::network(&args)?;

        let authentication_mode = match args.authentication_mode.as_deref() {
            Some(value) => value.parse::<AuthenticationMode>()?,
            None => AuthenticationMode::default(),
        };
        let role_mappings = args.role_mappings.clone().unwrap_or_default();
        let user_mappings = args.user_mappings.clone().unwrap_or_default();
        let access_entries = args.access_entries.clone().unwrap_or_default();
        Self::validate_identity(
            authentication_mode,
            &role_mappings,
            &user_mappings,
            &access_entries,
        )?;

        if let Some(arn) = &args.service_role_arn {
            validate_arn("serviceRoleArn", arn, IAM_ROLE_ARN_PATTERN)?;
        }
        let instance_role_arns = args.instance_role_arns.clone().unwrap_or_default();
        for arn in &instance_role_arns {
            validate_arn("instanceRoleArns", arn, IAM_ROLE_ARN_PATTERN)?;
        }

        let node_group = if args.skip_default_node_group.unwrap_or(false) {
            None
        } else {
            Some(Self::node_group(args.node_group.clone().unwrap_or_default())?)
        };

        let skip_default_security_groups = args.skip_default_security_groups.unwrap_or(false);
        if skip_default_security_groups {
            let mut missing = Vec::new();
            if args.cluster_security_group_id.is_none() {
                missing.push("clusterSecurityGroupId".to_string());
            }
            if node_group.is_some() && args.node_security_group_id.is_none() {
                missing.push("nodeSecurityGroupId".to_string());
            }
            if !missing.is_empty() {
                return Err(ValidationError::MissingSecurityGroups { missing });
            }
        }

        // Options are checked even when the default plugin is kept; they are
        // only applied to a customized one.
        let cni_options = Self::vpc_cni(args.vpc_cni.clone().unwrap_or_default())?;
        let use_default_vpc_cni = args.use_default_vpc_cni.unwrap_or(false);

        let ip_family = match args.ip_family.as_deref() {
            Some(value) => value.parse::<IpFamily>()?,
            None => IpFamily::default(),
        };
        Self::validate_ip_family(ip_family, cni_options.enable_ipv6, use_default_vpc_cni)?;
        let vpc_cni = if use_default_vpc_cni {
            None
        } else {
            Some(cni_options)
        };

        let enabled_cluster_log_types = Self::log_types(
            args.enabled_cluster_log_types.clone().unwrap_or_default(),
        )?;
        if let Some(arn) = &args.encryption_config_key_arn {
            validate_arn("encryptionConfigKeyArn", arn, KMS_KEY_ARN_PATTERN)?;
        }
        if let Some(cidr) = &args.kubernetes_service_ip_address_range {
            Self::validate_service_cidr(cidr, ip_family)?;
        }

        let fargate = match args.fargate.clone() {
            None | Some(FargateArgs::Enabled(false)) => None,
            Some(FargateArgs::Enabled(true)) => Some(FargateSpec::default_profile()),
            Some(FargateArgs::Profile(profile)) => {
                if let Some(arn) = &profile.pod_execution_role_arn {
                    validate_arn("fargate.podExecutionRoleArn", arn, IAM_ROLE_ARN_PATTERN)?;
                }
                let selectors = match profile.selectors {
                    None => FargateSpec::default_profile().selectors,
                    Some(selectors) if selectors.is_empty() => {
                        return Err(ValidationError::InvalidFargateSelector {
                            field: "fargate.selectors".to_string(),
                            constraint: "must not be empty".to_string(),
                        })
                    }
                    Some(selectors) => selectors,
                };
                if let Some(index) = selectors.iter().position(|s| s.namespace.is_empty()) {
                    return Err(ValidationError::InvalidFargateSelector {
                        field: format!("fargate.selectors[{}].namespace", index),
                        constraint: "is required".to_string(),
                    });
                }
                Some(FargateSpec {
                    pod_execution_role_arn: profile.pod_execution_role_arn,
                    selectors,
                    subnet_ids: profile.subnet_ids,
                })
            }
        };

        let storage_classes = args
            .storage_classes
            .clone()
            .map(|classes| classes.into_classes())
            .unwrap_or_default();

        let endpoint = EndpointAccess {
            public_access: args.endpoint_public_access.unwrap_or(true),
            private_access: args.endpoint_private_access.unwrap_or(false),
            public_access_cidrs: args.public_access_cidrs.clone().unwrap_or_default(),
        };

        debug!(
            cluster = %name,
            mode = %authentication_mode,
            node_group = node_group.is_some(),
            fargate = fargate.is_some(),
            "resolved cluster specification"
        );

        Ok(ClusterSpec {
            name,
            version: args.version,
            region: args.region,
            vpc_id,
            subnet_ids,
            public_subnet_ids,
            private_subnet_ids,
            authentication_mode,
            role_mappings,
            user_mappings,
            access_entries,
            skip_default_security_groups,
            cluster_security_group_id: args.cluster_security_group_id,
            node_security_group_id: args.node_security_group_id,
            service_role_arn: args.service_role_arn,
            instance_role_arns,
            node_group,
            fargate,
            vpc_cni,
            storage_classes,
            create_oidc_provider: args.create_oidc_provider.unwrap_or(false),
            enabled_cluster_log_types,
            encryption_config_key_arn: args.encryption_config_key_arn,
            kubernetes_service_ip_address_range: args.kubernetes_service_ip_address_range,
            ip_family,
            endpoint,
            kubeconfig: args.provider_credential_opts.unwrap_or_default(),
            tags: args.tags.unwrap_or_default(),
        })
    }

    fn validate_name(name: &str) -> Resolved<()> {
        let invalid = |constraint: &str| ValidationError::InvalidClusterName {
            name: name.to_string(),
            constraint: constraint.to_string(),
        };
        if name.len() > MAX_CLUSTER_NAME_LEN {
            return Err(invalid("must be at most 100 characters"));
        }
        if !matches_pattern(CLUSTER_NAME_PATTERN, name) {
            return Err(invalid(
                "must start with a letter or digit and contain only letters, digits, '-' and '_'",
            ));
        }
        Ok(())
    }

    /// VPC id plus the all/public/private subnet lists. When `subnetIds` is
    /// absent the union of public and private subnets is used.
    fn network(args: &ClusterArgs) -> Resolved<(String, Vec<String>, Vec<String>, Vec<String>)> {
        let vpc_id = args
            .vpc_id
            .clone()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ValidationError::MissingNetworkContext {
                field: "vpcId".to_string(),
            })?;

        let public = args.public_subnet_ids.clone().unwrap_or_default();
        let private = args.private_subnet_ids.clone().unwrap_or_default();
        let all = match &args.subnet_ids {
            Some(ids) if !ids.is_empty() => ids.clone(),
            _ => public.iter().chain(private.iter()).cloned().collect(),
        };
        if all.is_empty() {
            return Err(ValidationError::MissingNetworkContext {
                field: "subnetIds".to_string(),
            });
        }
        Ok((vpc_id, all, public, private))
    }

    fn validate_identity(
        mode: AuthenticationMode,
        role_mappings: &[RoleMapping],
        user_mappings: &[UserMapping],
        access_entries: &BTreeMap<String, AccessEntry>,
    ) -> Resolved<()> {
        if !mode.supports_config_map() {
            if !role_mappings.is_empty() {
                return Err(ValidationError::mode_mismatch("roleMappings", mode.as_str(), "CONFIG_MAP"));
            }
            if !user_mappings.is_empty() {
                return Err(ValidationError::mode_mismatch("userMappings", mode.as_str(), "CONFIG_MAP"));
            }
        }
        if !mode.supports_access_entries() && !access_entries.is_empty() {
            return Err(ValidationError::mode_mismatch("accessEntries", mode.as_str(), "API"));
        }

        for mapping in role_mappings {
            validate_arn("roleMappings.roleArn", &mapping.role_arn, IAM_ROLE_ARN_PATTERN)?;
        }
        for mapping in user_mappings {
            validate_arn("userMappings.userArn", &mapping.user_arn, IAM_PRINCIPAL_ARN_PATTERN)?;
        }
        for (key, entry) in access_entries {
            validate_arn(
                &format!("accessEntries.{}.principalArn", key),
                &entry.principal_arn,
                IAM_PRINCIPAL_ARN_PATTERN,
            )?;
        }
        Ok(())
    }

    /// Sizing defaults: desired 2, min `min(2, desired)`, max `max(2, desired)`.
    fn node_group(args: NodeGroupArgs) -> Resolved<NodeGroupSpec> {
        for (field, value) in [
            ("nodeGroup.desiredCapacity", args.desired_capacity),
            ("nodeGroup.minSize", args.min_size),
            ("nodeGroup.maxSize", args.max_size),
        ] {
            if let Some(value) = value {
                if value < 0 {
                    return Err(ValidationError::sizing(field, "must be >= 0"));
                }
            }
        }

        let desired_capacity = args.desired_capacity.unwrap_or(DEFAULT_CAPACITY);
        let min_size = args.min_size.unwrap_or(DEFAULT_CAPACITY.min(desired_capacity));
        let max_size = args.max_size.unwrap_or(DEFAULT_CAPACITY.max(desired_capacity));

        if min_size > max_size {
            return Err(ValidationError::sizing(
                "nodeGroup.minSize",
                format!("({}) must be <= maxSize ({})", min_size, max_size),
            ));
        }
        if desired_capacity < min_size {
            return Err(ValidationError::sizing(
                "nodeGroup.desiredCapacity",
                format!("({}) must be >= minSize ({})", desired_capacity, min_size),
            ));
        }
        if desired_capacity > max_size {
            return Err(ValidationError::sizing(
                "nodeGroup.desiredCapacity",
                format!("({}) must be <= maxSize ({})", desired_capacity, max_size),
            ));
        }

        Ok(NodeGroupSpec {
            instance_type: args
                .instance_type
                .unwrap_or_else(|| DEFAULT_INSTANCE_TYPE.to_string()),
            desired_capacity,
            min_size,
            max_size,
            ami_id: args.ami_id,
            key_name: args.key_name,
            node_root_volume_size: args.node_root_volume_size,
            kubelet_extra_args: args.kubelet_extra_args,
            bootstrap_extra_args: args.bootstrap_extra_args,
            extra_user_data: args.extra_user_data,
            labels: args.labels,
            associate_public_ip_address: args.node_associate_public_ip_address.unwrap_or(false),
        })
    }

    fn vpc_cni(mut options: VpcCniOptions) -> Resolved<VpcCniOptions> {
        if let Some(mtu) = options.eni_mtu {
            if !(MIN_ENI_MTU..=MAX_ENI_MTU).contains(&mtu) {
                return Err(ValidationError::InvalidMtu { value: mtu });
            }
        }
        if let Some(prefix) = &options.veth_prefix {
            if prefix.chars().count() > MAX_VETH_PREFIX_LEN {
                return Err(ValidationError::InvalidVethPrefix {
                    value: prefix.clone(),
                });
            }
        }
        if options.enable_ipv6 == Some(true) && options.enable_prefix_delegation != Some(true) {
            return Err(ValidationError::Ipv6RequiresPrefixDelegation);
        }
        if options.external_snat.is_some() && options.cni_external_snat.is_some() {
            return Err(ValidationError::ConflictingCniOptions {
                first: "vpcCni.externalSnat".to_string(),
                second: "vpcCni.cniExternalSnat".to_string(),
            });
        }
        if options.custom_network_config.is_some() && options.cni_custom_network_cfg.is_some() {
            return Err(ValidationError::ConflictingCniOptions {
                first: "vpcCni.customNetworkConfig".to_string(),
                second: "vpcCni.cniCustomNetworkCfg".to_string(),
            });
        }

        options.node_port_support.get_or_insert(true);
        options.warm_eni_target.get_or_insert(1);
        Ok(options)
    }

    /// The cluster's address family and the CNI's IPv6 switch must agree
    /// whenever the CNI is customized.
    fn validate_ip_family(
        family: IpFamily,
        cni_ipv6: Option<bool>,
        use_default_vpc_cni: bool,
    ) -> Resolved<()> {
        let cni_ipv6 = cni_ipv6.unwrap_or(false);
        if cni_ipv6 && family != IpFamily::Ipv6 {
            return Err(ValidationError::cluster_option(
                "ipFamily",
                family.as_str(),
                "must be ipv6 when vpcCni.enableIpv6 is set",
            ));
        }
        if family == IpFamily::Ipv6 && !use_default_vpc_cni && !cni_ipv6 {
            return Err(ValidationError::cluster_option(
                "ipFamily",
                family.as_str(),
                "requires vpcCni.enableIpv6",
            ));
        }
        Ok(())
    }

    /// Deduplicated, sorted log types.
    fn log_types(values: Vec<String>) -> Resolved<Vec<ClusterLogType>> {
        let mut types = values
            .iter()
            .map(|value| value.parse::<ClusterLogType>())
            .collect::<Resolved<Vec<_>>>()?;
        types.sort();
        types.dedup();
        Ok(types)
    }

    fn validate_service_cidr(cidr: &str, family: IpFamily) -> Resolved<()> {
        let invalid = |constraint: &str| {
            ValidationError::cluster_option("kubernetesServiceIpAddressRange", cidr, constraint)
        };
        if family != IpFamily::Ipv4 {
            return Err(invalid("only supported for ipv4 clusters"));
        }
        let captures = Regex::new(IPV4_CIDR_PATTERN)
            .ok()
            .and_then(|re| re.captures(cidr))
            .ok_or_else(|| invalid("must be an IPv4 CIDR block"))?;
        let mut octets = [0u8; 4];
        for (index, octet) in octets.iter_mut().enumerate() {
            *octet = captures[index + 1]
                .parse()
                .map_err(|_| invalid("must be an IPv4 CIDR block"))?;
        }
        let prefix: u8 = captures[5]
            .parse()
            .map_err(|_| invalid("must be an IPv4 CIDR block"))?;
        if !(MIN_SERVICE_CIDR_PREFIX..=MAX_SERVICE_CIDR_PREFIX).contains(&prefix) {
            return Err(invalid("prefix must be between /12 and /24"));
        }
        let private = match octets {
            [10, ..] => true,
            [172, second, ..] => (16..=31).contains(&second),
            [192, 168, ..] => prefix >= 16,
            _ => false,
        };
        if !private {
            return Err(invalid(
                "must lie within 10.0.0.0/8, 172.16.0.0/12 or 192.168.0.0/16",
            ));
        }
        Ok(())
    }
}

fn matches_pattern(pattern: &str, value: &str) -> bool {
    Regex::new(pattern)
        .map(|re| re.is_match(value))
        .unwrap_or(false)
}

fn validate_arn(field: &str, value: &str, pattern: &str) -> Resolved<()> {
    if matches_pattern(pattern, value) {
        Ok(())
    } else {
        Err(ValidationError::InvalidArn {
            field: field.to_string(),
            value: value.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::FargateProfileArgs;

    fn args() -> ClusterArgs {
        ClusterArgs {
            vpc_id: Some("vpc-1".into()),
            public_subnet_ids: Some(vec!["subnet-pub".into()]),
            private_subnet_ids: Some(vec!["subnet-a".into(), "subnet-b".into()]),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let spec = ConfigResolver::resolve(args()).unwrap();
        assert_eq!(spec.name, "eks-cluster");
        assert_eq!(spec.authentication_mode, AuthenticationMode::ConfigMap);
        assert_eq!(spec.subnet_ids, vec!["subnet-pub", "subnet-a", "subnet-b"]);

        let node_group = spec.node_group.unwrap();
        assert_eq!(node_group.instance_type, "t2.medium");
        assert_eq!(
            (node_group.min_size, node_group.desired_capacity, node_group.max_size),
            (2, 2, 2)
        );

        let cni = spec.vpc_cni.unwrap();
        assert_eq!(cni.node_port_support, Some(true));
        assert_eq!(cni.warm_eni_target, Some(1));
        assert!(spec.fargate.is_none());
        assert!(spec.storage_classes.is_empty());
    }

    #[test]
    fn test_sizing_follows_desired() {
        let mut input = args();
        input.node_group = Some(NodeGroupArgs {
            desired_capacity: Some(5),
            ..Default::default()
        });
        let node_group = ConfigResolver::resolve(input).unwrap().node_group.unwrap();
        assert_eq!((node_group.min_size, node_group.max_size), (2, 5));

        let mut input = args();
        input.node_group = Some(NodeGroupArgs {
            desired_capacity: Some(1),
            ..Default::default()
        });
        let node_group = ConfigResolver::resolve(input).unwrap().node_group.unwrap();
        assert_eq!((node_group.min_size, node_group.max_size), (1, 2));
    }

    #[test]
    fn test_sizing_violations() {
        let mut input = args();
        input.node_group = Some(NodeGroupArgs {
            desired_capacity: Some(5),
            max_size: Some(3),
            ..Default::default()
        });
        let err = ConfigResolver::resolve(input).unwrap_err();
        assert_eq!(err.field(), "nodeGroup.desiredCapacity");

        let mut input = args();
        input.node_group = Some(NodeGroupArgs {
            min_size: Some(-1),
            ..Default::default()
        });
        let err = ConfigResolver::resolve(input).unwrap_err();
        assert_eq!(err.field(), "nodeGroup.minSize");
    }

    #[test]
    fn test_missing_network_context() {
        let mut input = args();
        input.vpc_id = None;
        assert_eq!(
            ConfigResolver::resolve(input).unwrap_err(),
            ValidationError::MissingNetworkContext {
                field: "vpcId".into()
            }
        );

        let input = ClusterArgs {
            vpc_id: Some("vpc-1".into()),
            ..Default::default()
        };
        assert_eq!(ConfigResolver::resolve(input).unwrap_err().field(), "subnetIds");
    }

    #[test]
    fn test_cluster_name_rules() {
        let mut input = args();
        input.name = Some("-bad".into());
        assert!(matches!(
            ConfigResolver::resolve(input),
            Err(ValidationError::InvalidClusterName { .. })
        ));

        let mut input = args();
        input.name = Some("a".repeat(101));
        assert!(ConfigResolver::resolve(input).is_err());

        let mut input = args();
        input.name = Some("prod_cluster-01".into());
        assert!(ConfigResolver::resolve(input).is_ok());
    }

    #[test]
    fn test_skip_security_groups_lists_missing() {
        let mut input = args();
        input.skip_default_security_groups = Some(true);
        assert_eq!(
            ConfigResolver::resolve(input).unwrap_err(),
            ValidationError::MissingSecurityGroups {
                missing: vec![
                    "clusterSecurityGroupId".into(),
                    "nodeSecurityGroupId".into()
                ]
            }
        );

        let mut input = args();
        input.skip_default_security_groups = Some(true);
        input.skip_default_node_group = Some(true);
        input.cluster_security_group_id = Some("sg-1".into());
        assert!(ConfigResolver::resolve(input).is_ok());
    }

    #[test]
    fn test_cni_rules() {
        let cases = [
            (
                VpcCniOptions {
                    eni_mtu: Some(9002),
                    ..Default::default()
                },
                "vpcCni.eniMtu",
            ),
            (
                VpcCniOptions {
                    veth_prefix: Some("abcde".into()),
                    ..Default::default()
                },
                "vpcCni.vethPrefix",
            ),
            (
                VpcCniOptions {
                    enable_ipv6: Some(true),
                    ..Default::default()
                },
                "vpcCni.enableIpv6",
            ),
            (
                VpcCniOptions {
                    external_snat: Some(true),
                    cni_external_snat: Some(false),
                    ..Default::default()
                },
                "vpcCni.externalSnat",
            ),
        ];
        for (options, field) in cases {
            let mut input = args();
            input.vpc_cni = Some(options);
            assert_eq!(ConfigResolver::resolve(input).unwrap_err().field(), field);
        }

        let mut input = args();
        input.vpc_cni = Some(VpcCniOptions {
            eni_mtu: Some(576),
            veth_prefix: Some("eni".into()),
            enable_ipv6: Some(true),
            enable_prefix_delegation: Some(true),
            ..Default::default()
        });
        input.ip_family = Some("ipv6".into());
        assert!(ConfigResolver::resolve(input).is_ok());
    }

    #[test]
    fn test_mtu_and_veth_bounds() {
        for (mtu, ok) in [(575, false), (576, true), (9001, true), (9002, false)] {
            let mut input = args();
            input.vpc_cni = Some(VpcCniOptions {
                eni_mtu: Some(mtu),
                ..Default::default()
            });
            let result = ConfigResolver::resolve(input);
            assert_eq!(result.is_ok(), ok, "eniMtu {}", mtu);
            if !ok {
                assert_eq!(result.unwrap_err(), ValidationError::InvalidMtu { value: mtu });
            }
        }

        let mut input = args();
        input.vpc_cni = Some(VpcCniOptions {
            veth_prefix: Some("abcd".into()),
            ..Default::default()
        });
        let cni = ConfigResolver::resolve(input).unwrap().vpc_cni.unwrap();
        assert_eq!(cni.veth_prefix.as_deref(), Some("abcd"));
    }

    #[test]
    fn test_default_cni_still_validates_options() {
        let cases = [
            (
                VpcCniOptions {
                    eni_mtu: Some(1),
                    ..Default::default()
                },
                "vpcCni.eniMtu",
            ),
            (
                VpcCniOptions {
                    enable_ipv6: Some(true),
                    ..Default::default()
                },
                "vpcCni.enableIpv6",
            ),
            (
                VpcCniOptions {
                    veth_prefix: Some("toolong".into()),
                    ..Default::default()
                },
                "vpcCni.vethPrefix",
            ),
        ];
        for (options, field) in cases {
            let mut input = args();
            input.use_default_vpc_cni = Some(true);
            input.vpc_cni = Some(options);
            assert_eq!(ConfigResolver::resolve(input).unwrap_err().field(), field);
        }

        let mut input = args();
        input.use_default_vpc_cni = Some(true);
        input.vpc_cni = Some(VpcCniOptions {
            eni_mtu: Some(9001),
            ..Default::default()
        });
        assert!(ConfigResolver::resolve(input).unwrap().vpc_cni.is_none());
    }

    #[test]
    fn test_ip_family_rules() {
        let spec = ConfigResolver::resolve(args()).unwrap();
        assert_eq!(spec.ip_family, IpFamily::Ipv4);

        let mut input = args();
        input.ip_family = Some("ipv5".into());
        assert_eq!(ConfigResolver::resolve(input).unwrap_err().field(), "ipFamily");

        let mut input = args();
        input.ip_family = Some("ipv6".into());
        assert_eq!(ConfigResolver::resolve(input).unwrap_err().field(), "ipFamily");

        let mut input = args();
        input.vpc_cni = Some(VpcCniOptions {
            enable_ipv6: Some(true),
            enable_prefix_delegation: Some(true),
            ..Default::default()
        });
        assert_eq!(ConfigResolver::resolve(input).unwrap_err().field(), "ipFamily");

        let mut input = args();
        input.ip_family = Some("ipv6".into());
        input.use_default_vpc_cni = Some(true);
        assert_eq!(ConfigResolver::resolve(input).unwrap().ip_family, IpFamily::Ipv6);
    }

    #[test]
    fn test_cluster_logging_and_encryption() {
        let mut input = args();
        input.enabled_cluster_log_types =
            Some(vec!["scheduler".into(), "api".into(), "api".into()]);
        input.encryption_config_key_arn =
            Some("arn:aws:kms:us-west-2:123456789012:key/1234abcd".into());
        let spec = ConfigResolver::resolve(input).unwrap();
        assert_eq!(
            spec.enabled_cluster_log_types,
            vec![ClusterLogType::Api, ClusterLogType::Scheduler]
        );
        assert!(spec.encryption_config_key_arn.is_some());

        let mut input = args();
        input.enabled_cluster_log_types = Some(vec!["kubelet".into()]);
        assert_eq!(
            ConfigResolver::resolve(input).unwrap_err().field(),
            "enabledClusterLogTypes"
        );

        let mut input = args();
        input.encryption_config_key_arn =
            Some("arn:aws:iam::123456789012:role/not-a-key".into());
        assert!(matches!(
            ConfigResolver::resolve(input),
            Err(ValidationError::InvalidArn { field, .. }) if field == "encryptionConfigKeyArn"
        ));
    }

    #[test]
    fn test_service_cidr_rules() {
        for cidr in ["10.100.0.0/16", "172.20.0.0/12", "192.168.0.0/24"] {
            let mut input = args();
            input.kubernetes_service_ip_address_range = Some(cidr.into());
            assert!(ConfigResolver::resolve(input).is_ok(), "{}", cidr);
        }
        for cidr in [
            "10.100.0.0/11",
            "10.100.0.0/25",
            "100.64.0.0/16",
            "172.32.0.0/16",
            "192.168.0.0/12",
            "10.300.0.0/16",
            "not-a-cidr",
        ] {
            let mut input = args();
            input.kubernetes_service_ip_address_range = Some(cidr.into());
            assert_eq!(
                ConfigResolver::resolve(input).unwrap_err().field(),
                "kubernetesServiceIpAddressRange",
                "{}",
                cidr
            );
        }

        let mut input = args();
        input.ip_family = Some("ipv6".into());
        input.use_default_vpc_cni = Some(true);
        input.kubernetes_service_ip_address_range = Some("10.100.0.0/16".into());
        assert_eq!(
            ConfigResolver::resolve(input).unwrap_err().field(),
            "kubernetesServiceIpAddressRange"
        );
    }

    #[test]
    fn test_authentication_mode_rules() {
        let mut input = args();
        input.authentication_mode = Some("TOKEN".into());
        assert!(matches!(
            ConfigResolver::resolve(input),
            Err(ValidationError::UnknownAuthenticationMode { .. })
        ));

        let mut input = args();
        input.authentication_mode = Some("API".into());
        input.role_mappings = Some(vec![RoleMapping {
            role_arn: "arn:aws:iam::123456789012:role/admin".into(),
            username: "admin".into(),
            groups: vec!["system:masters".into()],
        }]);
        assert_eq!(
            ConfigResolver::resolve(input).unwrap_err(),
            ValidationError::mode_mismatch("roleMappings", "API", "CONFIG_MAP")
        );

        let entry = || AccessEntry {
            principal_arn: "arn:aws:iam::123456789012:role/ops".into(),
            kubernetes_groups: vec![],
            username: None,
            entry_type: Default::default(),
            access_policies: BTreeMap::new(),
        };
        let mut input = args();
        input.access_entries = Some(BTreeMap::from([("ops".to_string(), entry())]));
        assert_eq!(
            ConfigResolver::resolve(input).unwrap_err(),
            ValidationError::mode_mismatch("accessEntries", "CONFIG_MAP", "API")
        );

        let mut input = args();
        input.authentication_mode = Some("API_AND_CONFIG_MAP".into());
        input.role_mappings = Some(vec![RoleMapping {
            role_arn: "arn:aws:iam::123456789012:role/admin".into(),
            username: "admin".into(),
            groups: vec!["system:masters".into()],
        }]);
        input.access_entries = Some(BTreeMap::from([("ops".to_string(), entry())]));
        let spec = ConfigResolver::resolve(input).unwrap();
        assert_eq!(spec.authentication_mode, AuthenticationMode::ApiAndConfigMap);
        assert_eq!((spec.role_mappings.len(), spec.access_entries.len()), (1, 1));
    }

    #[test]
    fn test_arn_validation() {
        let mut input = args();
        input.instance_role_arns = Some(vec!["not-an-arn".into()]);
        assert_eq!(
            ConfigResolver::resolve(input).unwrap_err(),
            ValidationError::InvalidArn {
                field: "instanceRoleArns".into(),
                value: "not-an-arn".into()
            }
        );
    }

    #[test]
    fn test_fargate_forms() {
        let mut input = args();
        input.fargate = Some(FargateArgs::Enabled(true));
        let fargate = ConfigResolver::resolve(input).unwrap().fargate.unwrap();
        assert_eq!(fargate.selectors.len(), 2);

        let mut input = args();
        input.fargate = Some(FargateArgs::Profile(FargateProfileArgs {
            selectors: Some(vec![]),
            ..Default::default()
        }));
        assert!(matches!(
            ConfigResolver::resolve(input),
            Err(ValidationError::InvalidFargateSelector { .. })
        ));
    }
}
