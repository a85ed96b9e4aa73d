//! Gateway configuration.

use crate::client::{BridgeOptions, BrowserOptions};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_AUTH_DIR: &str = ".wwebjs_auth";
pub const DEFAULT_BRIDGE: &str = "whatsapp-bridge";

/// Main configuration for the gateway process.
#[derive(Debug, Clone)]
pub struct Config {
    /// Listen address
    pub host: IpAddr,
    /// Listen port
    pub port: u16,
    /// Session directory handed to the messaging client
    pub auth_dir: PathBuf,
    /// Bridge executable and its arguments
    pub bridge_program: String,
    pub bridge_args: Vec<String>,
    pub browser: BrowserOptions,
    /// Print pairing codes as terminal QR codes
    pub render_qr: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            auth_dir: PathBuf::from(DEFAULT_AUTH_DIR),
            bridge_program: DEFAULT_BRIDGE.to_string(),
            bridge_args: Vec::new(),
            browser: BrowserOptions::default(),
            render_qr: true,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_host(mut self, host: IpAddr) -> Self {
        self.host = host;
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_auth_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.auth_dir = dir.into();
        self
    }

    pub fn with_bridge(mut self, program: impl Into<String>, args: Vec<String>) -> Self {
        self.bridge_program = program.into();
        self.bridge_args = args;
        self
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.browser.headless = headless;
        self
    }

    pub fn with_render_qr(mut self, render_qr: bool) -> Self {
        self.render_qr = render_qr;
        self
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn bridge_options(&self) -> BridgeOptions {
        BridgeOptions {
            program: self.bridge_program.clone(),
            args: self.bridge_args.clone(),
            auth_dir: self.auth_dir.clone(),
            browser: self.browser.clone(),
        }
    }
}
