use std::{
    io::{self, Write},
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use crate::{
    cidr::{NetworkAddress, contains, equals},
    error::ClientIdError,
    net::{
        CacheEntry, IpNameCache, KeyValueStore, ReverseResolver, SockKey, SystemReverseResolver,
    },
    policy::ClientAccess,
};

use super::{args::Command, loader::Settings};

/// Run one subcommand, writing results to stdout.
///
/// Returns the process exit code: 0 when every check passed, 1 otherwise.
pub async fn execute(command: &Command, settings: &Settings) -> Result<i32, ClientIdError> {
    let mut out = io::stdout();

    match command {
        Command::Contains { big, little } => Ok(report_contains(big, little, &mut out)?),
        Command::Equals { one, two } => Ok(report_equals(one, two, &mut out)?),
        Command::Authorize { addrs } => Ok(report_authorize(&settings.access, addrs, &mut out)?),
        Command::Resolve { addrs } => {
            let resolver = SystemReverseResolver::new()?;
            let cache = Arc::new(IpNameCache::new(&settings.cache, resolver));
            if let Some(interval) = settings.cache.reap_interval {
                cache.spawn_reaper(interval);
            }

            let result = report_resolve(&cache, addrs, &mut out).await;

            if let Err(err) = cache.shutdown().await {
                log::error!("Failed to drain address cache: {err}");
            }
            result?;
            Ok(0)
        }
    }
}

fn report_contains(
    big: &NetworkAddress,
    little: &NetworkAddress,
    out: &mut impl Write,
) -> io::Result<i32> {
    match contains(big, little) {
        Ok(()) => {
            writeln!(out, "{big} contains {little}")?;
            Ok(0)
        }
        Err(err) => {
            writeln!(out, "{big} does not contain {little}: {err}")?;
            Ok(1)
        }
    }
}

fn report_equals(
    one: &NetworkAddress,
    two: &NetworkAddress,
    out: &mut impl Write,
) -> io::Result<i32> {
    let same = equals(one, two);
    writeln!(out, "{same}")?;
    Ok(if same { 0 } else { 1 })
}

fn report_authorize(
    access: &ClientAccess,
    addrs: &[IpAddr],
    out: &mut impl Write,
) -> io::Result<i32> {
    let mut code = 0;
    for ip in addrs {
        match access.authorize(*ip) {
            Some(block) => writeln!(out, "{ip} allowed by {block}")?,
            None => {
                writeln!(out, "{ip} denied")?;
                code = 1;
            }
        }
    }
    Ok(code)
}

/// Print `address hostname` per input, marking answers served from cache
async fn report_resolve<R, S>(
    cache: &IpNameCache<R, S>,
    addrs: &[IpAddr],
    out: &mut impl Write,
) -> io::Result<()>
where
    R: ReverseResolver,
    S: KeyValueStore<SockKey, Arc<CacheEntry>>,
{
    for ip in addrs {
        let addr = SocketAddr::new(*ip, 0);
        match cache.lookup(addr) {
            Ok(Some(hostname)) => {
                writeln!(out, "{ip} {hostname} (cached)")?;
                continue;
            }
            Ok(None) => {}
            Err(err) => log::error!("Cache lookup for {ip} failed: {err}"),
        }

        let resolved = cache.resolve_and_insert(addr).await;
        writeln!(out, "{ip} {}", resolved.hostname)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::{CacheSettings, resolver::MockReverseResolver};

    fn output(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn contains_reports_outcome() {
        let mut buf = Vec::new();
        let code = report_contains(
            &"192.168.0.0/16".parse().unwrap(),
            &"192.168.5.10".parse().unwrap(),
            &mut buf,
        )
        .unwrap();
        assert_eq!(code, 0);
        assert_eq!(output(buf), "192.168.0.0/16 contains 192.168.5.10/32\n");

        let mut buf = Vec::new();
        let code = report_contains(
            &"192.168.0.0/24".parse().unwrap(),
            &"192.168.5.10".parse().unwrap(),
            &mut buf,
        )
        .unwrap();
        assert_eq!(code, 1);
        assert!(output(buf).contains("does not contain"));
    }

    #[test]
    fn equals_prints_boolean() {
        let mut buf = Vec::new();
        let code = report_equals(
            &"10.0.0.0/8".parse().unwrap(),
            &"10.0.0.0/9".parse().unwrap(),
            &mut buf,
        )
        .unwrap();
        assert_eq!(code, 1);
        assert_eq!(output(buf), "false\n");
    }

    #[test]
    fn authorize_lists_each_address() {
        let access = ClientAccess::from_entries(&["10.0.0.0/8".to_string()]).unwrap();
        let addrs: Vec<IpAddr> = vec![
            "10.1.2.3".parse().unwrap(),
            "192.0.2.1".parse().unwrap(),
        ];

        let mut buf = Vec::new();
        let code = report_authorize(&access, &addrs, &mut buf).unwrap();
        assert_eq!(code, 1);
        assert_eq!(
            output(buf),
            "10.1.2.3 allowed by 10.0.0.0/8\n192.0.2.1 denied\n"
        );
    }

    #[tokio::test]
    async fn resolve_serves_repeats_from_cache() {
        let mut resolver = MockReverseResolver::new();
        resolver
            .expect_reverse_lookup()
            .times(1)
            .returning(|_| Ok("client.example".to_string()));
        let cache = IpNameCache::new(&CacheSettings::default(), resolver);
        let ip: IpAddr = "192.0.2.8".parse().unwrap();

        let mut buf = Vec::new();
        report_resolve(&cache, &[ip, ip], &mut buf).await.unwrap();
        assert_eq!(
            output(buf),
            "192.0.2.8 client.example\n192.0.2.8 client.example (cached)\n"
        );
    }
}
