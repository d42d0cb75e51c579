//! Anonymous client descriptor sent as the `x-telemetry` header.
//!
//! The descriptor names this package and the platform it runs on. It carries
//! nothing about the caller or the request.

use serde::Serialize;

/// Name of the header carrying the serialised [`Telemetry`].
pub const TELEMETRY_HEADER: &str = "x-telemetry";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Telemetry {
    pub package: PackageInfo,
    pub environment: EnvironmentInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageInfo {
    pub vendor: &'static str,
    pub name: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvironmentInfo {
    pub runtime: &'static str,
    pub arch: &'static str,
    pub platform: &'static str,
    /// Version of the `rustc` that compiled this package, or `unknown`.
    pub version: &'static str,
}

impl Telemetry {
    pub fn current() -> Self {
        Self {
            package: PackageInfo {
                vendor: "poncho",
                name: env!("CARGO_PKG_NAME"),
                version: env!("CARGO_PKG_VERSION"),
            },
            environment: EnvironmentInfo {
                runtime: "rust",
                arch: std::env::consts::ARCH,
                platform: std::env::consts::OS,
                version: env!("PONCHOPAY_RUSTC_VERSION"),
            },
        }
    }
}
