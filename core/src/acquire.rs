//! Transport selection and default header injection.

use crate::config::{RequestConfig, REQUESTED_WITH_HEADER, REQUESTED_WITH_VALUE};
use crate::error::RequestError;
use crate::transport::{Transport, TransportFactory, TransportKind};

/// The handle type a factory hands out, of either variant.
pub type AcquiredTransport<F> =
    Transport<<F as TransportFactory>::SameDomain, <F as TransportFactory>::CrossDomain>;

/// Obtain the handle variant `config` calls for, then add the headers a
/// same-domain request carries by default.
pub fn acquire<F: TransportFactory>(
    factory: &F,
    config: &mut RequestConfig,
) -> Result<AcquiredTransport<F>, RequestError> {
    let transport = match TransportKind::for_cross_domain(config.cross_domain) {
        TransportKind::SameDomain => factory.same_domain().map(Transport::SameDomain),
        TransportKind::CrossDomain => factory.cross_domain().map(Transport::CrossDomain),
    }
    .map_err(RequestError::TransportCreation)?;

    inject_default_headers(config);
    Ok(transport)
}

/// Same-domain requests announce themselves with `X-Requested-With` unless
/// the caller already set it.
pub fn inject_default_headers(config: &mut RequestConfig) {
    if !config.cross_domain && config.header(REQUESTED_WITH_HEADER).is_none() {
        config.headers.insert(
            REQUESTED_WITH_HEADER.to_string(),
            REQUESTED_WITH_VALUE.to_string(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigOverrides;
    use crate::error::ErrorKind;
    use crate::fake::{FakeFactory, FakeTransport};

    #[test]
    fn same_domain_gets_requested_with_header() {
        let factory = FakeFactory::new().with_same_domain(FakeTransport::new());
        let mut config = RequestConfig::merge(ConfigOverrides::new("/x"));
        let transport = acquire(&factory, &mut config).unwrap();
        assert_eq!(transport.kind(), TransportKind::SameDomain);
        assert_eq!(config.header(REQUESTED_WITH_HEADER), Some(REQUESTED_WITH_VALUE));
        assert_eq!(factory.created(), vec![TransportKind::SameDomain]);
    }

    #[test]
    fn cross_domain_skips_requested_with_header() {
        let factory = FakeFactory::new().with_cross_domain(FakeTransport::new());
        let mut config = RequestConfig::merge(ConfigOverrides::new("/x").cross_domain(true));
        let transport = acquire(&factory, &mut config).unwrap();
        assert_eq!(transport.kind(), TransportKind::CrossDomain);
        assert!(config.header(REQUESTED_WITH_HEADER).is_none());
    }

    #[test]
    fn caller_header_is_kept() {
        let factory = FakeFactory::new().with_same_domain(FakeTransport::new());
        let mut config =
            RequestConfig::merge(ConfigOverrides::new("/x").header("x-requested-with", "Custom"));
        acquire(&factory, &mut config).unwrap();
        assert_eq!(config.headers.len(), 1);
        assert_eq!(config.header(REQUESTED_WITH_HEADER), Some("Custom"));
    }

    #[test]
    fn factory_failure_is_transport_creation_error() {
        let factory = FakeFactory::new();
        let mut config = RequestConfig::merge(ConfigOverrides::new("/x"));
        let err = acquire(&factory, &mut config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TransportCreation);
        assert!(config.headers.is_empty());
    }
}
