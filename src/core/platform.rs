//! Target platforms and SDKs
//!
//! A package declares the platforms it supports. Each platform maps to one
//! device SDK and, for platforms that have one, a simulator SDK. Every SDK
//! produces one slice of the final multi-platform bundle.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Platform a package can declare support for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[serde(rename = "ios")]
    IOS,
    #[serde(rename = "macos")]
    MacOS,
    #[serde(rename = "maccatalyst")]
    MacCatalyst,
    #[serde(rename = "tvos")]
    TvOS,
    #[serde(rename = "watchos")]
    WatchOS,
    #[serde(rename = "visionos")]
    VisionOS,
}

impl Platform {
    /// Device SDK for this platform
    pub fn device_sdk(self) -> Sdk {
        match self {
            Platform::IOS => Sdk::IOS,
            Platform::MacOS => Sdk::MacOS,
            Platform::MacCatalyst => Sdk::MacCatalyst,
            Platform::TvOS => Sdk::TvOS,
            Platform::WatchOS => Sdk::WatchOS,
            Platform::VisionOS => Sdk::VisionOS,
        }
    }

    /// Simulator SDK, if the platform has one
    pub fn simulator_sdk(self) -> Option<Sdk> {
        match self {
            Platform::IOS => Some(Sdk::IOSSimulator),
            Platform::TvOS => Some(Sdk::TvOSSimulator),
            Platform::WatchOS => Some(Sdk::WatchOSSimulator),
            Platform::VisionOS => Some(Sdk::VisionOSSimulator),
            Platform::MacOS | Platform::MacCatalyst => None,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Platform::IOS => "iOS",
            Platform::MacOS => "macOS",
            Platform::MacCatalyst => "Mac Catalyst",
            Platform::TvOS => "tvOS",
            Platform::WatchOS => "watchOS",
            Platform::VisionOS => "visionOS",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ios" => Ok(Platform::IOS),
            "macos" => Ok(Platform::MacOS),
            "maccatalyst" => Ok(Platform::MacCatalyst),
            "tvos" => Ok(Platform::TvOS),
            "watchos" => Ok(Platform::WatchOS),
            "visionos" => Ok(Platform::VisionOS),
            other => Err(format!(
                "unknown platform '{other}' (expected ios, macos, maccatalyst, tvos, watchos or visionos)"
            )),
        }
    }
}

/// SDK that one platform build step compiles against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Sdk {
    MacOS,
    MacCatalyst,
    IOS,
    IOSSimulator,
    TvOS,
    TvOSSimulator,
    WatchOS,
    WatchOSSimulator,
    VisionOS,
    VisionOSSimulator,
}

impl Sdk {
    /// SDK name as the build tool expects it
    pub fn settings_name(self) -> &'static str {
        match self {
            Sdk::MacOS | Sdk::MacCatalyst => "macosx",
            Sdk::IOS => "iphoneos",
            Sdk::IOSSimulator => "iphonesimulator",
            Sdk::TvOS => "appletvos",
            Sdk::TvOSSimulator => "appletvsimulator",
            Sdk::WatchOS => "watchos",
            Sdk::WatchOSSimulator => "watchsimulator",
            Sdk::VisionOS => "xros",
            Sdk::VisionOSSimulator => "xrsimulator",
        }
    }

    /// Generic build destination for this SDK
    pub fn destination(self) -> &'static str {
        match self {
            Sdk::MacOS => "generic/platform=macOS",
            Sdk::MacCatalyst => "generic/platform=macOS,variant=Mac Catalyst",
            Sdk::IOS => "generic/platform=iOS",
            Sdk::IOSSimulator => "generic/platform=iOS Simulator",
            Sdk::TvOS => "generic/platform=tvOS",
            Sdk::TvOSSimulator => "generic/platform=tvOS Simulator",
            Sdk::WatchOS => "generic/platform=watchOS",
            Sdk::WatchOSSimulator => "generic/platform=watchOS Simulator",
            Sdk::VisionOS => "generic/platform=visionOS",
            Sdk::VisionOSSimulator => "generic/platform=visionOS Simulator",
        }
    }

    /// Directory-safe identifier, unique per SDK
    pub fn slug(self) -> &'static str {
        match self {
            Sdk::MacCatalyst => "maccatalyst",
            other => other.settings_name(),
        }
    }

    /// Expand declared platforms to the SDKs to build, in declaration order
    pub fn for_platforms(platforms: &[Platform], include_simulators: bool) -> Vec<Sdk> {
        let mut sdks = Vec::new();
        for platform in platforms {
            let device = platform.device_sdk();
            if !sdks.contains(&device) {
                sdks.push(device);
            }
            if include_simulators {
                if let Some(simulator) = platform.simulator_sdk() {
                    if !sdks.contains(&simulator) {
                        sdks.push(simulator);
                    }
                }
            }
        }
        sdks
    }
}

impl fmt::Display for Sdk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Sdk::MacOS => "macOS",
            Sdk::MacCatalyst => "Mac Catalyst",
            Sdk::IOS => "iOS",
            Sdk::IOSSimulator => "iOS Simulator",
            Sdk::TvOS => "tvOS",
            Sdk::TvOSSimulator => "tvOS Simulator",
            Sdk::WatchOS => "watchOS",
            Sdk::WatchOSSimulator => "watchOS Simulator",
            Sdk::VisionOS => "visionOS",
            Sdk::VisionOSSimulator => "visionOS Simulator",
        };
        f.write_str(name)
    }
}
