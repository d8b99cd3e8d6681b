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

use serde::{Deserialize, Serialize};

/// Tuning knobs for the aws-node DaemonSet.
///
/// Every field is optional; unset fields are left to the addon's own
/// defaults. `eniMtu` and `vethPrefix` are the only values range-checked
/// locally.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VpcCniOptions {
    pub node_port_support: Option<bool>,
    pub custom_network_config: Option<bool>,
    pub cni_custom_network_cfg: Option<bool>,
    pub external_snat: Option<bool>,
    pub cni_external_snat: Option<bool>,
    pub warm_eni_target: Option<i64>,
    pub warm_ip_target: Option<i64>,
    pub warm_prefix_target: Option<i64>,
    pub enable_prefix_delegation: Option<bool>,
    pub enable_ipv6: Option<bool>,
    pub log_level: Option<String>,
    pub log_file: Option<String>,
    pub veth_prefix: Option<String>,
    pub eni_mtu: Option<i64>,
    pub eni_config_label_def: Option<String>,
    pub plugin_log_level: Option<String>,
    pub plugin_log_file: Option<String>,
    pub enable_pod_eni: Option<bool>,
    pub cni_configure_rpfilter: Option<bool>,
    pub disable_tcp_early_demux: Option<bool>,
    pub enable_network_policy: Option<bool>,

    // Not configurable through the addon, applied as a DaemonSet patch.
    pub image: Option<String>,
    pub init_image: Option<String>,
    pub node_agent_image: Option<String>,
    pub security_context_privileged: Option<bool>,

    pub addon_version: Option<String>,
}

impl VpcCniOptions {
    /// Whether any option requires patching the aws-node DaemonSet directly.
    pub fn needs_daemonset_patch(&self) -> bool {
        self.image.is_some()
            || self.init_image.is_some()
            || self.node_agent_image.is_some()
            || self.security_context_privileged == Some(true)
    }

    /// Custom network config, whichever alias was used.
    pub fn custom_network(&self) -> Option<bool> {
        self.custom_network_config.or(self.cni_custom_network_cfg)
    }

    /// External SNAT, whichever alias was used.
    pub fn external_snat(&self) -> Option<bool> {
        self.external_snat.or(self.cni_external_snat)
    }
}
