//! Minimal client for the account REST API.
//!
//! The session core needs exactly two things from it: the opaque secure
//! blob replayed in the connect handshake, and the UDP address of the
//! region server. Everything else about accounts is out of scope.

use std::net::Ipv4Addr;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "https://simplicialsoftware.com/api/account";

/// Obfuscated endpoint name for the secure-ticket exchange.
const SECURE_TICKET_ENDPOINT: &str = "JDKaYIIScQ";

const GAME_NAME: &str = "Nebulous";

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Account API returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("Malformed ticket: {0:?}")]
    MalformedTicket(String),
    #[error("Invalid secure blob: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("Malformed server address: {0:?}")]
    BadAddress(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerRegion {
    UsWest,
    UsEast,
    Eu,
    EastAsia,
    SouthAmerica,
    Australia,
    SouthAsia,
    MiddleEast,
    India,
    SouthAfrica,
    Japan,
    Debug,
    DebugGlobal,
}

impl ServerRegion {
    pub fn as_str(self) -> &'static str {
        match self {
            ServerRegion::UsWest => "US_WEST",
            ServerRegion::UsEast => "US_EAST",
            ServerRegion::Eu => "EU",
            ServerRegion::EastAsia => "EAST_ASIA",
            ServerRegion::SouthAmerica => "SOUTH_AMERICA",
            ServerRegion::Australia => "AUSTRALIA",
            ServerRegion::SouthAsia => "SOUTH_ASIA",
            ServerRegion::MiddleEast => "MIDDLE_EAST",
            ServerRegion::India => "INDIA",
            ServerRegion::SouthAfrica => "SOUTH_AFRICA",
            ServerRegion::Japan => "JAPAN",
            ServerRegion::Debug => "DEBUG",
            ServerRegion::DebugGlobal => "DEBUG_GLOBAL",
        }
    }
}

/// An account ticket: `<account_id>,<creation_date>,<signature>` as one
/// string. A blank ticket plays anonymously.
#[derive(Debug, Clone)]
pub struct Ticket {
    raw: String,
    pub account_id: i32,
    pub creation_date: String,
    pub signature: String,
}

impl Ticket {
    pub fn anonymous() -> Self {
        Self {
            raw: String::new(),
            account_id: -1,
            creation_date: String::new(),
            signature: String::new(),
        }
    }

    pub fn parse(raw: &str) -> Result<Self, AccountError> {
        if raw.is_empty() {
            return Ok(Self::anonymous());
        }
        let mut parts = raw.splitn(3, ',');
        let account_id = parts
            .next()
            .and_then(|id| id.parse::<i32>().ok())
            .ok_or_else(|| AccountError::MalformedTicket(raw.to_owned()))?;
        let creation_date = parts
            .next()
            .ok_or_else(|| AccountError::MalformedTicket(raw.to_owned()))?
            .to_owned();
        let signature = parts
            .next()
            .ok_or_else(|| AccountError::MalformedTicket(raw.to_owned()))?
            .to_owned();
        Ok(Self {
            raw: raw.to_owned(),
            account_id,
            creation_date,
            signature,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn is_anonymous(&self) -> bool {
        self.raw.is_empty()
    }
}

/// What the session core consumes from the account service.
#[derive(Debug, Clone)]
pub struct SecureTicket {
    pub secure_bytes: Vec<u8>,
    pub server_ip: Ipv4Addr,
}

#[derive(Debug, Deserialize)]
struct SecureTicketResponse {
    #[serde(rename = "RezPlEVBeW")]
    secure_blob: String,
    #[serde(rename = "IP")]
    ip: String,
}

pub struct AccountClient {
    http: reqwest::Client,
    api_url: String,
    game_version: u16,
    ticket: Ticket,
}

impl AccountClient {
    pub fn new(ticket: Ticket, game_version: u16) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: DEFAULT_API_URL.to_owned(),
            game_version,
            ticket,
        }
    }

    /// Point at a different API host (test servers).
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn ticket(&self) -> &Ticket {
        &self.ticket
    }

    /// Exchange the ticket for the secure handshake blob and the region
    /// server's UDP address.
    pub async fn secure_ticket(&self, region: ServerRegion) -> Result<SecureTicket, AccountError> {
        let url = format!("{}/{}", self.api_url, SECURE_TICKET_ENDPOINT);
        let version = self.game_version.to_string();
        let form = [
            ("Game", GAME_NAME),
            ("Version", version.as_str()),
            ("Ticket", self.ticket.raw()),
            ("region", region.as_str()),
        ];
        let response = self.http.post(&url).form(&form).send().await?;
        if !response.status().is_success() {
            return Err(AccountError::Status(response.status()));
        }
        let body: SecureTicketResponse = response.json().await?;
        let secure_bytes = BASE64.decode(&body.secure_blob)?;
        let server_ip = body
            .ip
            .parse::<Ipv4Addr>()
            .map_err(|_| AccountError::BadAddress(body.ip.clone()))?;
        Ok(SecureTicket {
            secure_bytes,
            server_ip,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticket_parsing() {
        let ticket = Ticket::parse("12345,2024-01-01,c2lnbmF0dXJl").unwrap();
        assert_eq!(ticket.account_id, 12345);
        assert_eq!(ticket.creation_date, "2024-01-01");
        assert_eq!(ticket.signature, "c2lnbmF0dXJl");
        assert!(!ticket.is_anonymous());
    }

    #[test]
    fn test_blank_ticket_is_anonymous() {
        let ticket = Ticket::parse("").unwrap();
        assert!(ticket.is_anonymous());
        assert_eq!(ticket.account_id, -1);
    }

    #[test]
    fn test_malformed_tickets_rejected() {
        assert!(Ticket::parse("not-a-ticket").is_err());
        assert!(Ticket::parse("123,missing-signature").is_err());
        assert!(Ticket::parse("abc,2024,sig").is_err());
    }

    #[test]
    fn test_region_wire_names() {
        assert_eq!(ServerRegion::UsWest.as_str(), "US_WEST");
        assert_eq!(ServerRegion::DebugGlobal.as_str(), "DEBUG_GLOBAL");
    }
}
