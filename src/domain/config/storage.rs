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
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EbsVolumeType {
    Gp2,
    Gp3,
    Io1,
    Io2,
    Sc1,
    St1,
}

impl EbsVolumeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gp2 => "gp2",
            Self::Gp3 => "gp3",
            Self::Io1 => "io1",
            Self::Io2 => "io2",
            Self::Sc1 => "sc1",
            Self::St1 => "st1",
        }
    }
}

impl fmt::Display for EbsVolumeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One EBS-backed StorageClass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageClassOptions {
    #[serde(rename = "type")]
    pub volume_type: EbsVolumeType,
    #[serde(default)]
    pub default: bool,
    pub encrypted: Option<bool>,
    pub iops_per_gb: Option<i64>,
    pub kms_key_id: Option<String>,
    #[serde(default)]
    pub zones: Vec<String>,
    pub reclaim_policy: Option<String>,
    pub volume_binding_mode: Option<String>,
    pub allow_volume_expansion: Option<bool>,
    #[serde(default)]
    pub mount_options: Vec<String>,
}

impl StorageClassOptions {
    pub fn default_for(volume_type: EbsVolumeType) -> Self {
        Self {
            volume_type,
            default: true,
            encrypted: None,
            iops_per_gb: None,
            kms_key_id: None,
            zones: Vec::new(),
            reclaim_policy: None,
            volume_binding_mode: None,
            allow_volume_expansion: None,
            mount_options: Vec::new(),
        }
    }
}

/// A bare volume type (one default class) or named classes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StorageClassesArgs {
    VolumeType(EbsVolumeType),
    Named(BTreeMap<String, StorageClassOptions>),
}

impl StorageClassesArgs {
    /// Normalize to a name → options map.
    pub fn into_classes(self) -> BTreeMap<String, StorageClassOptions> {
        match self {
            Self::VolumeType(volume_type) => {
                let mut classes = BTreeMap::new();
                classes.insert(
                    volume_type.as_str().to_string(),
                    StorageClassOptions::default_for(volume_type),
                );
                classes
            }
            Self::Named(classes) => classes,
        }
    }
}
