// SPDX-License-Identifier: GPL-3.0-only
use url::Url;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use anyhow::{Result, Context};

/// Maximum allowed URL length
const MAX_URL_LENGTH: usize = 2048;

/// Validate a source URL received over the bridge
///
/// Checks:
/// - Validates URL length
/// - Only allows absolute http/https URLs with a host
/// - With `block_private_hosts`, rejects localhost and private/internal addresses
pub fn validate_url(url_str: &str, block_private_hosts: bool) -> Result<Url> {
    // Check URL length
    if url_str.len() > MAX_URL_LENGTH {
        return Err(anyhow::anyhow!("URL exceeds maximum length of {} characters", MAX_URL_LENGTH));
    }
    
    // Parse URL; relative references fail here
    let url = Url::parse(url_str)
        .context("Invalid URL format")?;
    
    // Check scheme - only allow http and https
    match url.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(anyhow::anyhow!(
                "Invalid URL scheme: {} (only http and https are allowed)",
                scheme
            ));
        }
    }
    
    let Some(host) = url.host_str() else {
        return Err(anyhow::anyhow!("URL must have a host"));
    };
    
    if block_private_hosts {
        // Check for localhost variants
        if is_localhost(host) {
            return Err(anyhow::anyhow!(
                "URL host is localhost (not allowed for security reasons)"
            ));
        }
        
        // Try to parse as IP address; IPv6 hosts come bracketed
        if let Ok(ip) = host.trim_start_matches('[').trim_end_matches(']').parse::<IpAddr>() {
            if is_private_ip(&ip) {
                return Err(anyhow::anyhow!(
                    "URL contains private/internal IP address (not allowed for security reasons)"
                ));
            }
        }
    }
    
    Ok(url)
}

/// Check if a hostname is a localhost variant
fn is_localhost(host: &str) -> bool {
    let host_lower = host.to_lowercase();
    matches!(
        host_lower.as_str(),
        "localhost"
        | "127.0.0.1"
        | "::1"
        | "0.0.0.0"
        | "[::1]"
        | "[::]"
    ) || host_lower.starts_with("127.")
}

/// Check if an IP address is private/internal
fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(ipv4) => is_private_ipv4(ipv4),
        IpAddr::V6(ipv6) => is_private_ipv6(ipv6),
    }
}

/// Check if an IPv4 address is loopback, private, link-local or unspecified
fn is_private_ipv4(ip: &Ipv4Addr) -> bool {
    ip.is_loopback() || ip.is_private() || ip.is_link_local() || ip.is_unspecified()
}

/// Check if an IPv6 address is loopback, unique local, link-local, or maps a private IPv4
fn is_private_ipv6(ip: &Ipv6Addr) -> bool {
    if ip.is_loopback() || ip.is_unspecified() {
        return true;
    }
    
    let first = ip.segments()[0];
    // fc00::/7 unique local, fe80::/10 link-local
    if (first & 0xfe00) == 0xfc00 || (first & 0xffc0) == 0xfe80 {
        return true;
    }
    
    ip.to_ipv4_mapped().is_some_and(|v4| is_private_ipv4(&v4))
}
