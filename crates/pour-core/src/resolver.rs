//! Variant selection.
//!
//! The descriptor's variants are a map keyed by [`Platform`]; resolution is a
//! single lookup and a miss is an explicit [`ResolveError::UnsupportedPlatform`].
//! Nothing here touches the network or the filesystem.

use thiserror::Error;

use pour_schema::{ArtifactFormat, ParseError, Platform, Sha256Digest};

use crate::descriptor::Descriptor;

/// A variant with its URL rendered for the descriptor's version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    /// Platform this variant was selected for.
    pub platform: Platform,
    /// Concrete download URL.
    pub url: String,
    /// Expected digest of the bytes at `url`.
    pub sha256: Sha256Digest,
    /// Archive format inferred from the URL.
    pub format: ArtifactFormat,
}

/// Why no variant could be selected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// The descriptor has no variant for this platform.
    #[error("Unsupported platform: {platform} (available: {})", join(.supported))]
    UnsupportedPlatform {
        /// The requested platform.
        platform: Platform,
        /// Platforms the descriptor does declare.
        supported: Vec<Platform>,
    },

    /// The host's OS or architecture has no platform key at all.
    #[error("Unsupported host platform: {0}")]
    UnknownHost(#[from] ParseError),
}

fn join(platforms: &[Platform]) -> String {
    platforms
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Select the variant declared for `platform`.
///
/// # Errors
///
/// Returns [`ResolveError::UnsupportedPlatform`] on a mapping miss.
pub fn resolve(descriptor: &Descriptor, platform: Platform) -> Result<Variant, ResolveError> {
    let spec = descriptor
        .variants
        .get(&platform)
        .ok_or_else(|| ResolveError::UnsupportedPlatform {
            platform,
            supported: descriptor.platforms(),
        })?;

    let url = descriptor.render_url(&spec.url);
    let format = ArtifactFormat::detect(&url);

    Ok(Variant {
        platform,
        url,
        sha256: spec.sha256.clone(),
        format,
    })
}

/// Select the variant for the machine we are running on.
///
/// # Errors
///
/// Fails with [`ResolveError::UnknownHost`] if the host platform has no key,
/// or [`ResolveError::UnsupportedPlatform`] if the descriptor lacks it.
pub fn resolve_host(descriptor: &Descriptor) -> Result<Variant, ResolveError> {
    let platform = Platform::current()?;
    resolve(descriptor, platform)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::tests::TD;
    use pour_schema::{Arch, Os};

    #[test]
    fn each_declared_platform_gets_its_own_variant() {
        let d = Descriptor::parse(TD).unwrap();
        let cases = [
            (Os::Darwin, Arch::Arm64, "darwin_arm64", '1'),
            (Os::Darwin, Arch::Amd64, "darwin_amd64", '2'),
            (Os::Linux, Arch::Arm64, "linux_arm64", '3'),
            (Os::Linux, Arch::Amd64, "linux_amd64", '4'),
        ];

        for (os, arch, suffix, digit) in cases {
            let platform = Platform::new(os, arch);
            let v = d.resolve(platform).unwrap();
            assert_eq!(v.platform, platform);
            assert_eq!(
                v.url,
                format!(
                    "https://github.com/appgram/td/releases/download/v1.0.0/td_1.0.0_{suffix}.tar.gz"
                )
            );
            assert_eq!(v.sha256.as_str(), digit.to_string().repeat(64));
            assert_eq!(v.format, ArtifactFormat::TarGz);
        }
    }

    #[test]
    fn undeclared_platform_is_an_explicit_miss() {
        let d = Descriptor::parse(TD).unwrap();
        let err = d
            .resolve(Platform::new(Os::Windows, Arch::Amd64))
            .unwrap_err();

        match &err {
            ResolveError::UnsupportedPlatform {
                platform,
                supported,
            } => {
                assert_eq!(*platform, Platform::new(Os::Windows, Arch::Amd64));
                assert_eq!(supported.len(), 4);
            }
            ResolveError::UnknownHost(_) => panic!("unexpected {err:?}"),
        }
        assert!(err.to_string().contains("windows-amd64"));
        assert!(err.to_string().contains("linux-arm64"));
    }

    #[test]
    fn partial_descriptor_misses_dropped_platform() {
        let mut d = Descriptor::parse(TD).unwrap();
        let dropped = Platform::new(Os::Linux, Arch::Arm64);
        d.variants.remove(&dropped);

        assert!(matches!(
            d.resolve(dropped),
            Err(ResolveError::UnsupportedPlatform { .. })
        ));
        assert!(d.resolve(Platform::new(Os::Linux, Arch::Amd64)).is_ok());
    }

    #[test]
    fn host_resolution_uses_current_platform() {
        let d = Descriptor::parse(TD).unwrap();
        match (Platform::current(), resolve_host(&d)) {
            (Ok(p), Ok(v)) => assert_eq!(v.platform, p),
            (Ok(p), Err(ResolveError::UnsupportedPlatform { platform, .. })) => {
                assert_eq!(platform, p);
            }
            (Err(_), Err(ResolveError::UnknownHost(_))) => {}
            (host, result) => panic!("inconsistent: {host:?} vs {result:?}"),
        }
    }
}
