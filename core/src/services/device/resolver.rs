//! Derives [`DeviceInfo`] from the transport-level details of a request
//!
//! Browser and platform are classified from the user-agent with ordered
//! rules: the first matching rule wins, so more specific agents (Edge,
//! iOS, Android) are listed ahead of the ones they impersonate (Chrome,
//! macOS, Linux).

use once_cell::sync::Lazy;
use regex::Regex;
use std::net::IpAddr;

use crate::domain::entities::device::DeviceInfo;

/// Longest value stored for any device field, in characters
pub const MAX_FIELD_LENGTH: usize = 512;

/// Browser rules, most specific first
static BROWSER_RULES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    compile(&[
        (r"Edg(e|A|iOS)?/", "Edge"),
        (r"OPR/|Opera", "Opera"),
        (r"SamsungBrowser/", "Samsung Internet"),
        (r"Firefox/|FxiOS/", "Firefox"),
        (r"Chrome/|CriOS/|Chromium/", "Chrome"),
        (r"Version/[\d.]+.*Safari/", "Safari"),
    ])
});

/// Platform rules, most specific first
static PLATFORM_RULES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    compile(&[
        (r"iPhone|iPad|iPod", "iOS"),
        (r"Android", "Android"),
        (r"Windows", "Windows"),
        (r"CrOS", "ChromeOS"),
        (r"Macintosh|Mac OS X", "macOS"),
        (r"Linux", "Linux"),
    ])
});

fn compile(rules: &[(&str, &'static str)]) -> Vec<(Regex, &'static str)> {
    rules
        .iter()
        .filter_map(|(pattern, name)| Regex::new(pattern).ok().map(|re| (re, *name)))
        .collect()
}

fn classify(rules: &[(Regex, &'static str)], user_agent: &str) -> Option<&'static str> {
    rules
        .iter()
        .find(|(re, _)| re.is_match(user_agent))
        .map(|(_, name)| *name)
}

/// Transport details of an incoming request, as seen by the HTTP layer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// Raw `User-Agent` header
    pub user_agent: Option<String>,
    /// Peer address of the socket
    pub remote_addr: Option<String>,
    /// Raw `X-Forwarded-For` header
    pub forwarded_for: Option<String>,
    /// Name the client chose for itself, if any
    pub device_name: Option<String>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_remote_addr(mut self, addr: impl Into<String>) -> Self {
        self.remote_addr = Some(addr.into());
        self
    }

    pub fn with_forwarded_for(mut self, header: impl Into<String>) -> Self {
        self.forwarded_for = Some(header.into());
        self
    }

    pub fn with_device_name(mut self, name: impl Into<String>) -> Self {
        self.device_name = Some(name.into());
        self
    }
}

/// Turns a [`RequestContext`] into the metadata stored on a refresh token
#[derive(Debug, Clone)]
pub struct DeviceInfoResolver {
    max_field_length: usize,
}

impl Default for DeviceInfoResolver {
    fn default() -> Self {
        Self {
            max_field_length: MAX_FIELD_LENGTH,
        }
    }
}

impl DeviceInfoResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_field_length(mut self, max: usize) -> Self {
        self.max_field_length = max;
        self
    }

    /// Resolves device metadata; fields that cannot be determined stay `None`
    pub fn resolve(&self, ctx: &RequestContext) -> DeviceInfo {
        let user_agent = non_blank(ctx.user_agent.as_deref());
        let browser = user_agent.and_then(Self::browser);
        let platform = user_agent.and_then(Self::platform);

        let device_name = match non_blank(ctx.device_name.as_deref()) {
            Some(name) => Some(name.to_string()),
            None => match (browser, platform) {
                (Some(b), Some(p)) => Some(format!("{} on {}", b, p)),
                (Some(one), None) | (None, Some(one)) => Some(one.to_string()),
                (None, None) => None,
            },
        };

        DeviceInfo {
            device_name: device_name.map(|v| self.truncate(&v)),
            user_agent: user_agent.map(|v| self.truncate(v)),
            ip_address: Self::client_ip(ctx).map(|v| self.truncate(&v)),
            platform: platform.map(str::to_string),
            browser: browser.map(str::to_string),
        }
    }

    /// Browser family of a user-agent string
    pub fn browser(user_agent: &str) -> Option<&'static str> {
        classify(&BROWSER_RULES, user_agent)
    }

    /// Operating system of a user-agent string
    pub fn platform(user_agent: &str) -> Option<&'static str> {
        classify(&PLATFORM_RULES, user_agent)
    }

    /// First `X-Forwarded-For` hop when it is a valid address, else the peer address
    pub fn client_ip(ctx: &RequestContext) -> Option<String> {
        let forwarded = ctx
            .forwarded_for
            .as_deref()
            .and_then(|header| header.split(',').next())
            .map(str::trim)
            .filter(|hop| hop.parse::<IpAddr>().is_ok());

        forwarded
            .or_else(|| non_blank(ctx.remote_addr.as_deref()))
            .map(str::to_string)
    }

    fn truncate(&self, value: &str) -> String {
        value.chars().take(self.max_field_length).collect()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
