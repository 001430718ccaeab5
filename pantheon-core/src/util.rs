use std::time::Duration;

use time::OffsetDateTime;

pub const NET_CONNECT_TIMEOUT: Duration = Duration::from_millis(8 * 1000);

pub const NET_IO_TIMEOUT: Duration = Duration::from_millis(16 * 1000);

pub fn default_ureq_agent_builder(
    proxy_url: Option<&str>,
) -> ureq::config::ConfigBuilder<ureq::typestate::AgentScope> {
    let mut agent = ureq::Agent::config_builder()
        .timeout_global(Some(Duration::from_secs(10)))
        .timeout_connect(Some(NET_CONNECT_TIMEOUT))
        .timeout_recv_response(Some(NET_IO_TIMEOUT))
        .timeout_send_request(Some(NET_IO_TIMEOUT));

    if let Some(proxy_url) = proxy_url {
        let proxy = ureq::Proxy::new(proxy_url).ok();
        agent = agent.proxy(proxy);
    }

    agent
}

pub fn default_agent(proxy_url: Option<&str>) -> ureq::Agent {
    default_ureq_agent_builder(proxy_url).build().into()
}

/// Seconds since the Unix epoch.
pub fn unix_timestamp() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

/// Prefixes `url` with a CORS proxy, e.g. `https://corsproxy.io/?`.  The
/// target URL is percent-encoded so that its own query survives.
pub fn via_cors_proxy(proxy: Option<&str>, url: &str) -> String {
    match proxy {
        Some(proxy) if !proxy.is_empty() => {
            let encoded: String = url::form_urlencoded::byte_serialize(url.as_bytes()).collect();
            format!("{proxy}{encoded}")
        }
        _ => url.to_string(),
    }
}
