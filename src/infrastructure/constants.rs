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

/// Managed IAM policies
pub const AWS_MANAGED_POLICY_PREFIX: &str = "arn:aws:iam::aws:policy/";
pub const EKS_CLUSTER_POLICY: &str = "AmazonEKSClusterPolicy";
pub const EKS_WORKER_NODE_POLICY: &str = "AmazonEKSWorkerNodePolicy";
pub const EKS_CNI_POLICY: &str = "AmazonEKS_CNI_Policy";
pub const ECR_READ_ONLY_POLICY: &str = "AmazonEC2ContainerRegistryReadOnly";
pub const EKS_FARGATE_POD_EXECUTION_POLICY: &str = "AmazonEKSFargatePodExecutionRolePolicy";

/// Service principals
pub const EKS_SERVICE_PRINCIPAL: &str = "eks.amazonaws.com";
pub const EC2_SERVICE_PRINCIPAL: &str = "ec2.amazonaws.com";
pub const FARGATE_SERVICE_PRINCIPAL: &str = "eks-fargate-pods.amazonaws.com";

/// OIDC federation
pub const STS_CLIENT_ID: &str = "sts.amazonaws.com";
pub const OIDC_ROOT_CA_THUMBPRINT: &str = "9e99a48a9960b14926bb7f3b02e22da2b0ab7280";

/// Node registration identities
pub const NODE_USERNAME: &str = "system:node:{{EC2PrivateDNSName}}";
pub const FARGATE_NODE_USERNAME: &str = "system:node:{{SessionName}}";
pub const GROUP_BOOTSTRAPPERS: &str = "system:bootstrappers";
pub const GROUP_NODES: &str = "system:nodes";
pub const GROUP_NODE_PROXIER: &str = "system:node-proxier";

/// aws-auth ConfigMap
pub const AWS_AUTH_NAME: &str = "aws-auth";
pub const KUBE_SYSTEM_NAMESPACE: &str = "kube-system";

/// VPC CNI
pub const VPC_CNI_ADDON_NAME: &str = "vpc-cni";
pub const AWS_NODE_DAEMONSET: &str = "aws-node";
pub const AWS_NODE_CONTAINER: &str = "aws-node";
pub const NODE_AGENT_CONTAINER: &str = "aws-eks-nodeagent";
pub const CNI_INIT_CONTAINER: &str = "aws-vpc-cni-init";

/// Storage
pub const EBS_PROVISIONER: &str = "kubernetes.io/aws-ebs";
pub const DEFAULT_CLASS_ANNOTATION: &str = "storageclass.kubernetes.io/is-default-class";

/// Networking
pub const INTERNET_CIDR: &str = "0.0.0.0/0";
pub const HTTPS_PORT: i64 = 443;
pub const KUBELET_PORT_MIN: i64 = 1025;
pub const KUBELET_PORT_MAX: i64 = 65535;

/// Kubeconfig
pub const KUBECONFIG_CLUSTER: &str = "kubernetes";
pub const KUBECONFIG_USER: &str = "aws";
pub const KUBECONFIG_CONTEXT: &str = "aws";
pub const EXEC_API_VERSION: &str = "client.authentication.k8s.io/v1beta1";

/// Resource labels
pub const LABEL_MANAGED_BY: &str = "app.kubernetes.io/managed-by";
pub const LABEL_MANAGED_BY_VALUE: &str = "eks-provision";
